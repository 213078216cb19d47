use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every generated roster business id
pub const ROSTER_ID_PREFIX: &str = "231FA04";

/// Number of sections produced by a default seed
pub const DEFAULT_SECTION_COUNT: u32 = 19;

/// Number of students placed in each seeded section
pub const DEFAULT_STUDENTS_PER_SECTION: u32 = 30;

/// Length of the client-side attendance history window, today included
pub const HISTORY_WINDOW_DAYS: usize = 31;

/// Current attendance state of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

impl AttendanceStatus {
    /// Wire representation ("present" / "absent")
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }

    /// Capitalized label used in exports and tables
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusParseError(pub String);

impl fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` is not a valid attendance status (expected present or absent)",
            self.0
        )
    }
}

impl std::error::Error for StatusParseError {}

/// A class/cohort grouping. `students` holds member storage ids in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "_id")]
    pub storage_id: String,
    pub name: String,
    #[serde(default)]
    pub students: Vec<String>,
}

/// A student as stored. `business_id` travels as `id` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub storage_id: String,
    #[serde(rename = "id")]
    pub business_id: String,
    pub name: String,
    /// Storage id of the owning section, which may no longer resolve
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub status: AttendanceStatus,
}

/// Student with its section reference resolved (null when unset or dangling)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentWithSection {
    #[serde(rename = "_id")]
    pub storage_id: String,
    #[serde(rename = "id")]
    pub business_id: String,
    pub name: String,
    #[serde(default)]
    pub section: Option<Section>,
    #[serde(default)]
    pub status: AttendanceStatus,
}

/// Section with its members resolved, in membership order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionWithStudents {
    #[serde(rename = "_id")]
    pub storage_id: String,
    pub name: String,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl SectionWithStudents {
    pub fn find_student(&self, business_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.business_id == business_id)
    }
}

/// Append-only message from a teacher to a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub storage_id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub teacher: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// Body of POST /api/students. Fields are optional so missing ones can be reported by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    /// Business id (roll number)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

/// Body of POST /api/attendance/mark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl MarkAttendanceRequest {
    pub fn new(student_id: &str, status: AttendanceStatus) -> Self {
        Self {
            student_id: Some(student_id.to_string()),
            status: Some(status.as_str().to_string()),
        }
    }
}

/// Body of POST /api/notifications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of POST /api/sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSectionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Plain acknowledgement, also used for 404 bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body returned for internal errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One section of the generated demo roster
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSection {
    /// 1-based section number
    pub number: u32,
    pub name: String,
    pub business_ids: Vec<String>,
}

/// Business id for the n-th generated student (1-based, zero-padded to 3 digits)
pub fn roster_business_id(counter: u32) -> String {
    format!("{}{:03}", ROSTER_ID_PREFIX, counter)
}

/// Display name derived from a generated business id
pub fn roster_display_name(business_id: &str) -> String {
    format!("Student {}", business_id)
}

/// Lay out a roster of `section_count` sections with `per_section` students each.
///
/// The id counter runs across all sections and never resets, so ids are
/// contiguous from `roster_business_id(1)`.
pub fn roster_layout(section_count: u32, per_section: u32) -> Vec<RosterSection> {
    let mut counter = 1;
    (1..=section_count)
        .map(|number| {
            let business_ids = (0..per_section)
                .map(|_| {
                    let id = roster_business_id(counter);
                    counter += 1;
                    id
                })
                .collect();
            RosterSection {
                number,
                name: format!("Section {}", number),
                business_ids,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!("present".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert_eq!("absent".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);
        assert!("late".parse::<AttendanceStatus>().is_err());
        assert!("Present".parse::<AttendanceStatus>().is_err());
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::Absent.label(), "Absent");
    }

    #[test]
    fn test_student_wire_names() {
        let student = Student {
            storage_id: "s-1".to_string(),
            business_id: "231FA04001".to_string(),
            name: "Student 231FA04001".to_string(),
            section: None,
            status: AttendanceStatus::Absent,
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["_id"], "s-1");
        assert_eq!(json["id"], "231FA04001");
        assert_eq!(json["status"], "absent");
        assert!(json["section"].is_null());
    }

    #[test]
    fn test_request_field_names() {
        let json = serde_json::to_value(MarkAttendanceRequest::new("A1", AttendanceStatus::Present)).unwrap();
        assert_eq!(json["studentId"], "A1");
        assert_eq!(json["status"], "present");

        let parsed: CreateStudentRequest =
            serde_json::from_str(r#"{"id":"Z1","name":"Zoe","sectionId":"abc"}"#).unwrap();
        assert_eq!(parsed.section_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_roster_business_id_padding() {
        assert_eq!(roster_business_id(1), "231FA04001");
        assert_eq!(roster_business_id(570), "231FA04570");
        assert_eq!(roster_display_name("231FA04042"), "Student 231FA04042");
    }

    #[test]
    fn test_roster_layout_is_contiguous() {
        let layout = roster_layout(19, 30);
        assert_eq!(layout.len(), 19);
        assert_eq!(layout[0].name, "Section 1");
        assert_eq!(layout[18].name, "Section 19");

        let ids: Vec<&String> = layout.iter().flat_map(|s| s.business_ids.iter()).collect();
        assert_eq!(ids.len(), 570);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(**id, roster_business_id(i as u32 + 1));
        }
        assert_eq!(layout[1].business_ids[0], "231FA04031");
    }
}
