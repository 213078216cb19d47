//! # Client State Reconciler
//!
//! `Dashboard` owns the client's view of the backend: a mirror of the section
//! list, the selected section, the notification list and the simulated
//! history cache. Every write is followed by a full re-fetch of the sections,
//! so the mirror never holds optimistic edits.
//!
//! Failures are returned and also recorded in `error()` for the banner. The
//! previous mirror is kept when a call fails.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    AttendanceStatus, CreateNotificationRequest, CreateStudentRequest, MarkAttendanceRequest,
    Notification, SectionWithStudents, Student,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::demo_roster::DemoRoster;
use crate::error::DashboardError;
use crate::export::{self, ExportFormat, ExportRow};
use crate::history::{HistoryCache, HistoryEntry, HistoryPolicy};
use crate::preferences::{Preferences, UserRole};
use crate::services::api::{AttendanceApi, ClientError};
use crate::storage::LocalStore;
use crate::views::{self, AttendanceStats, TrendPoint};

/// Message sent by "notify all"
pub const ATTENTION_MESSAGE: &str = "Your recent attendance needs attention.";

/// Sender recorded when no teacher name is stored
pub const UNKNOWN_TEACHER: &str = "Unknown";

/// A student found in live data or, failing that, in the demo roster
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStudent {
    pub business_id: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub section_name: String,
    /// Storage id of the owning section. None for demo roster students.
    pub section_id: Option<String>,
}

/// Aggregate result of a fan-out over a section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkOutcome {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

type MarkResult = (String, Result<(), ClientError>, Option<Result<Vec<SectionWithStudents>, ClientError>>);

pub struct Dashboard<A, S> {
    api: Arc<A>,
    store: S,
    sections: Vec<SectionWithStudents>,
    selected_section: Option<String>,
    loading: bool,
    error: Option<String>,
    notifications: Vec<Notification>,
    preferences: Preferences,
    history: HistoryCache,
    demo: DemoRoster,
    rng: StdRng,
}

impl<A, S> Dashboard<A, S>
where
    A: AttendanceApi + 'static,
    S: LocalStore,
{
    /// Build a dashboard, restoring preferences and history from `store`
    pub fn new(api: A, store: S, config: &DashboardConfig) -> Self {
        let preferences = Preferences::load(&store);
        let history = HistoryCache::load(&store, HistoryPolicy::from(config));
        Self {
            api: Arc::new(api),
            store,
            sections: Vec::new(),
            selected_section: None,
            loading: false,
            error: None,
            notifications: Vec::new(),
            preferences,
            history,
            demo: DemoRoster::generate(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the RNG used for history generation
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sections(&self) -> &[SectionWithStudents] {
        &self.sections
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Notifications sorted newest first
    pub fn notifications_latest_first(&self) -> Vec<&Notification> {
        let mut sorted: Vec<&Notification> = self.notifications.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    /// Fetch the full section list and replace the mirror.
    ///
    /// The first section is selected when nothing is selected yet. On failure
    /// the previous mirror stays in place.
    pub async fn load(&mut self) -> Result<(), DashboardError> {
        self.loading = true;
        let fetched = self.api.list_sections().await;
        self.loading = false;

        match fetched {
            Ok(sections) => {
                self.apply_sections(sections);
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to load sections", e.into())),
        }
    }

    pub fn selected_section_id(&self) -> Option<&str> {
        self.selected_section.as_deref()
    }

    pub fn current_section(&self) -> Option<&SectionWithStudents> {
        let selected = self.selected_section.as_deref()?;
        self.sections.iter().find(|s| s.storage_id == selected)
    }

    pub fn select_section(&mut self, section_id: &str) -> Result<(), DashboardError> {
        if !self.sections.iter().any(|s| s.storage_id == section_id) {
            return Err(DashboardError::UnknownSection(section_id.to_string()));
        }
        self.selected_section = Some(section_id.to_string());
        Ok(())
    }

    /// Find a student by business id. Live sections win over the demo roster.
    pub fn resolve_student(&self, business_id: &str) -> Option<ResolvedStudent> {
        let live = self.sections.iter().find_map(|section| {
            section.find_student(business_id).map(|student| ResolvedStudent {
                business_id: student.business_id.clone(),
                name: student.name.clone(),
                status: student.status,
                section_name: section.name.clone(),
                section_id: Some(section.storage_id.clone()),
            })
        });
        if live.is_some() {
            return live;
        }

        self.demo.find(business_id).map(|(section, student)| ResolvedStudent {
            business_id: student.business_id.clone(),
            name: student.name.clone(),
            status: student.status,
            section_name: section.name.clone(),
            section_id: None,
        })
    }

    /// The student named by the stored student id
    pub fn current_student(&self) -> Option<ResolvedStudent> {
        self.resolve_student(&self.preferences.student_id)
    }

    /// Simulated history for a student, newest first. Empty for unknown ids.
    pub async fn student_history(&mut self, business_id: &str) -> Result<Vec<HistoryEntry>, DashboardError> {
        let Some(student) = self.resolve_student(business_id) else {
            debug!("No student {} in live or demo data", business_id);
            return Ok(Vec::new());
        };

        let history = self.history.ensure(business_id, student.status, Utc::now(), &mut self.rng);
        self.history.save(&mut self.store)?;
        Ok(history)
    }

    pub async fn student_stats(&mut self, business_id: &str) -> Result<AttendanceStats, DashboardError> {
        let history = self.student_history(business_id).await?;
        Ok(AttendanceStats::from_history(&history))
    }

    pub async fn student_trend(&mut self, business_id: &str) -> Result<Vec<TrendPoint>, DashboardError> {
        let history = self.student_history(business_id).await?;
        Ok(views::trend(&history))
    }

    /// Mark one student, sync today's history entry, then refresh the mirror
    pub async fn mark_attendance(&mut self, business_id: &str, status: AttendanceStatus) -> Result<(), DashboardError> {
        self.error = None;
        info!("Marking {} as {}", business_id, status);

        if let Err(e) = self
            .api
            .mark_attendance(MarkAttendanceRequest::new(business_id, status))
            .await
        {
            return Err(self.fail("Mark failed", e.into()));
        }

        self.history.record_mark(business_id, status, Utc::now(), &mut self.rng);
        let saved = self.history.save(&mut self.store);

        // The server already holds the mark
        self.load().await?;
        saved.map_err(|e| self.fail("Saving history failed", e.into()))
    }

    /// Drop every cached history and persist the empty cache
    pub fn clear_history(&mut self) -> Result<(), DashboardError> {
        self.history.clear();
        self.history.save(&mut self.store)?;
        info!("Cleared attendance history");
        Ok(())
    }

    /// Create a student in a section, then refresh the mirror
    pub async fn add_student(&mut self, name: &str, business_id: &str, section_id: &str) -> Result<Student, DashboardError> {
        let (name, business_id, section_id) = (name.trim(), business_id.trim(), section_id.trim());
        if name.is_empty() || business_id.is_empty() || section_id.is_empty() {
            return Err(self.fail("Add student failed", DashboardError::MissingFields));
        }

        self.loading = true;
        self.error = None;
        let created = self
            .api
            .create_student(CreateStudentRequest {
                id: Some(business_id.to_string()),
                name: Some(name.to_string()),
                section_id: Some(section_id.to_string()),
            })
            .await;
        self.loading = false;

        let student = match created {
            Ok(student) => student,
            Err(e) => return Err(self.fail("Add student failed", e.into())),
        };
        info!("Added student {} to section {}", student.business_id, section_id);

        self.load().await?;
        Ok(student)
    }

    /// Mark every student in the current section.
    ///
    /// One request per student, all in flight at once. Each successful mark
    /// triggers its own refresh and the mirror keeps whichever refresh lands
    /// last. Only the aggregate outcome is reported.
    pub async fn mark_section(&mut self, status: AttendanceStatus) -> Result<BulkOutcome, DashboardError> {
        let Some(section) = self.current_section() else {
            return Ok(BulkOutcome::default());
        };
        let section_name = section.name.clone();
        let ids: Vec<String> = section.students.iter().map(|s| s.business_id.clone()).collect();

        self.loading = true;
        let mut tasks: JoinSet<MarkResult> = JoinSet::new();
        for business_id in ids {
            let api = Arc::clone(&self.api);
            tasks.spawn(async move {
                let marked = api
                    .mark_attendance(MarkAttendanceRequest::new(&business_id, status))
                    .await
                    .map(|_| ());
                let refreshed = match marked {
                    Ok(()) => Some(api.list_sections().await),
                    Err(_) => None,
                };
                (business_id, marked, refreshed)
            });
        }

        let now = Utc::now();
        let mut outcome = BulkOutcome::default();
        let mut latest = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((business_id, Ok(()), refreshed)) => {
                    outcome.succeeded += 1;
                    self.history.record_mark(&business_id, status, now, &mut self.rng);
                    match refreshed {
                        Some(Ok(sections)) => latest = Some(sections),
                        Some(Err(e)) => warn!("Refresh after marking {} failed: {}", business_id, e),
                        None => {}
                    }
                }
                Ok((business_id, Err(e), _)) => {
                    warn!("Failed to mark {}: {}", business_id, e);
                    outcome.failed += 1;
                }
                Err(e) => {
                    warn!("Mark task did not complete: {}", e);
                    outcome.failed += 1;
                }
            }
        }
        self.loading = false;

        if let Some(sections) = latest {
            self.apply_sections(sections);
        }
        self.history.save(&mut self.store)?;

        info!(
            "Marked {} as {}: {} succeeded, {} failed",
            section_name, status, outcome.succeeded, outcome.failed
        );
        self.report_bulk(&outcome, "updates");
        Ok(outcome)
    }

    /// Send one notification from the stored teacher name
    pub async fn notify_one(&mut self, business_id: &str, message: &str) -> Result<Notification, DashboardError> {
        let request = self.notification_request(business_id, message);

        let created = match self.api.create_notification(request).await {
            Ok(notification) => notification,
            Err(e) => return Err(self.fail("Notification failed", e.into())),
        };

        if self.is_session_student(business_id) {
            self.load_notifications(business_id).await;
        }
        Ok(created)
    }

    /// Notify every student in the current section
    pub async fn notify_section(&mut self, message: &str) -> BulkOutcome {
        let Some(section) = self.current_section() else {
            return BulkOutcome::default();
        };
        let section_name = section.name.clone();
        let requests: Vec<CreateNotificationRequest> = section
            .students
            .iter()
            .map(|s| self.notification_request(&s.business_id, message))
            .collect();
        let session_notified = requests
            .iter()
            .any(|r| r.student_id.as_deref().is_some_and(|id| self.is_session_student(id)));

        self.loading = true;
        let mut tasks = JoinSet::new();
        for request in requests {
            let api = Arc::clone(&self.api);
            tasks.spawn(async move { api.create_notification(request).await });
        }

        let mut outcome = BulkOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => outcome.succeeded += 1,
                Ok(Err(e)) => {
                    warn!("Notification failed: {}", e);
                    outcome.failed += 1;
                }
                Err(e) => {
                    warn!("Notification task did not complete: {}", e);
                    outcome.failed += 1;
                }
            }
        }
        self.loading = false;

        if session_notified {
            let student_id = self.preferences.student_id.clone();
            self.load_notifications(&student_id).await;
        }

        info!("Notified {}: {} sent, {} failed", section_name, outcome.succeeded, outcome.failed);
        self.report_bulk(&outcome, "notifications");
        outcome
    }

    /// Fetch notifications for a student. A failed fetch leaves the list empty.
    pub async fn load_notifications(&mut self, business_id: &str) {
        match self.api.list_notifications(business_id).await {
            Ok(list) => self.notifications = list,
            Err(e) => {
                warn!("Failed to load notifications for {}: {}", business_id, e);
                self.notifications.clear();
            }
        }
    }

    /// Today's row per student of a section, from history entry 0.
    ///
    /// `section_ref` is a live section's storage id or a demo section number.
    /// Unknown sections yield no rows.
    pub async fn section_today_rows(&mut self, section_ref: &str) -> Result<Vec<ExportRow>, DashboardError> {
        let members: Vec<(String, String, AttendanceStatus)> =
            match self.sections.iter().find(|s| s.storage_id == section_ref) {
                Some(section) => section
                    .students
                    .iter()
                    .map(|s| (s.business_id.clone(), s.name.clone(), s.status))
                    .collect(),
                None => section_ref
                    .parse::<u32>()
                    .ok()
                    .and_then(|number| self.demo.section(number))
                    .map(|section| {
                        section
                            .students
                            .iter()
                            .map(|s| (s.business_id.clone(), s.name.clone(), s.status))
                            .collect()
                    })
                    .unwrap_or_default(),
            };

        let now = Utc::now();
        let rows = members
            .into_iter()
            .map(|(business_id, display_name, live_status)| {
                let history = self.history.ensure(&business_id, live_status, now, &mut self.rng);
                let (date, status) = history
                    .first()
                    .map(|entry| (entry.date, entry.status))
                    .unwrap_or((now.date_naive(), live_status));
                ExportRow {
                    business_id,
                    display_name,
                    date,
                    status,
                }
            })
            .collect();
        self.history.save(&mut self.store)?;
        Ok(rows)
    }

    /// One row per history day for a single student
    pub async fn student_export_rows(&mut self, business_id: &str) -> Result<Vec<ExportRow>, DashboardError> {
        let Some(student) = self.resolve_student(business_id) else {
            return Ok(Vec::new());
        };
        let history = self.student_history(business_id).await?;
        Ok(history
            .into_iter()
            .map(|entry| ExportRow {
                business_id: student.business_id.clone(),
                display_name: student.name.clone(),
                date: entry.date,
                status: entry.status,
            })
            .collect())
    }

    /// Export today's rows for a section, named after the section
    pub async fn export_section(
        &mut self,
        section_ref: &str,
        format: ExportFormat,
    ) -> Result<(String, Vec<u8>), DashboardError> {
        let label = self
            .sections
            .iter()
            .find(|s| s.storage_id == section_ref)
            .map(|s| s.name.clone())
            .or_else(|| {
                section_ref
                    .parse::<u32>()
                    .ok()
                    .and_then(|n| self.demo.section(n))
                    .map(|s| s.name.clone())
            })
            .unwrap_or_else(|| section_ref.to_string());

        let rows = self.section_today_rows(section_ref).await?;
        let bytes = match format {
            ExportFormat::Csv => export::to_csv(&rows)?.into_bytes(),
            ExportFormat::Pdf => export::to_pdf(&label, &rows)?,
        };
        Ok((export::file_name(&label, format), bytes))
    }

    /// Demo login: any id found in live or demo data is accepted
    pub async fn login_student(&mut self, business_id: &str) -> Result<ResolvedStudent, DashboardError> {
        let business_id = business_id.trim();
        let Some(student) = self.resolve_student(business_id) else {
            return Err(self.fail("Login failed", DashboardError::UnknownStudent(business_id.to_string())));
        };

        self.preferences.student_id = student.business_id.clone();
        self.preferences.role = Some(UserRole::Student);
        self.preferences.save(&mut self.store)?;

        self.load_notifications(&student.business_id).await;
        Ok(student)
    }

    /// Demo login: any non-empty username and password are accepted
    pub fn login_teacher(&mut self, username: &str, password: &str) -> Result<(), DashboardError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(self.fail("Login failed", DashboardError::MissingCredentials));
        }

        self.preferences.teacher_name = username.to_string();
        self.preferences.role = Some(UserRole::Teacher);
        self.preferences.save(&mut self.store)?;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), DashboardError> {
        self.preferences.role = None;
        self.preferences.teacher_name.clear();
        self.notifications.clear();
        self.preferences.save(&mut self.store)?;
        Ok(())
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<(), DashboardError> {
        self.preferences.dark_mode = enabled;
        self.preferences.save(&mut self.store)?;
        Ok(())
    }

    fn apply_sections(&mut self, sections: Vec<SectionWithStudents>) {
        debug!("Mirror now holds {} sections", sections.len());
        self.sections = sections;
        if self.selected_section.is_none() {
            self.selected_section = self.sections.first().map(|s| s.storage_id.clone());
        }
    }

    fn notification_request(&self, business_id: &str, message: &str) -> CreateNotificationRequest {
        let teacher = if self.preferences.teacher_name.trim().is_empty() {
            UNKNOWN_TEACHER.to_string()
        } else {
            self.preferences.teacher_name.clone()
        };
        CreateNotificationRequest {
            student_id: Some(business_id.to_string()),
            teacher: Some(teacher),
            message: Some(message.to_string()),
        }
    }

    fn is_session_student(&self, business_id: &str) -> bool {
        self.preferences.role == Some(UserRole::Student) && self.preferences.student_id == business_id
    }

    fn report_bulk(&mut self, outcome: &BulkOutcome, what: &str) {
        if !outcome.all_succeeded() {
            self.error = Some(format!("{} of {} {} failed", outcome.failed, outcome.total(), what));
        }
    }

    fn fail(&mut self, context: &str, error: DashboardError) -> DashboardError {
        warn!("{}: {}", context, error);
        self.error = Some(format!("{}: {}", context, error));
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use async_trait::async_trait;
    use chrono::Duration;
    use shared::MessageResponse;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeState {
        sections: Vec<SectionWithStudents>,
        notifications: Vec<Notification>,
        failing_marks: HashSet<String>,
        fail_listing: bool,
        list_calls: usize,
        next_id: usize,
    }

    /// In-memory stand-in for the backend
    #[derive(Default)]
    struct FakeApi {
        state: Mutex<FakeState>,
    }

    impl FakeApi {
        fn with_sections(sections: Vec<SectionWithStudents>) -> Self {
            let api = Self::default();
            api.state.lock().unwrap().sections = sections;
            api
        }

        fn list_calls(&self) -> usize {
            self.state.lock().unwrap().list_calls
        }

        fn fail_listing(&self, fail: bool) {
            self.state.lock().unwrap().fail_listing = fail;
        }

        fn fail_marks_for(&self, business_id: &str) {
            self.state.lock().unwrap().failing_marks.insert(business_id.to_string());
        }

        fn notifications_sent(&self) -> usize {
            self.state.lock().unwrap().notifications.len()
        }
    }

    fn http(status: u16, body: &str) -> ClientError {
        ClientError::Http {
            status,
            body: body.to_string(),
        }
    }

    #[async_trait]
    impl AttendanceApi for FakeApi {
        async fn list_sections(&self) -> Result<Vec<SectionWithStudents>, ClientError> {
            let mut state = self.state.lock().unwrap();
            state.list_calls += 1;
            if state.fail_listing {
                return Err(http(500, "{\"error\":\"Storage unavailable\"}"));
            }
            Ok(state.sections.clone())
        }

        async fn create_student(&self, request: CreateStudentRequest) -> Result<Student, ClientError> {
            let mut state = self.state.lock().unwrap();
            let business_id = request.id.unwrap_or_default();
            let exists = state
                .sections
                .iter()
                .any(|s| s.find_student(&business_id).is_some());
            if exists {
                return Err(http(500, "{\"error\":\"Duplicate key\"}"));
            }
            state.next_id += 1;
            let student = Student {
                storage_id: format!("st-{}", state.next_id),
                business_id,
                name: request.name.unwrap_or_default(),
                section: request.section_id.clone(),
                status: AttendanceStatus::Present,
            };
            if let Some(section) = state
                .sections
                .iter_mut()
                .find(|s| Some(&s.storage_id) == request.section_id.as_ref())
            {
                section.students.push(student.clone());
            }
            Ok(student)
        }

        async fn mark_attendance(&self, request: MarkAttendanceRequest) -> Result<MessageResponse, ClientError> {
            let mut state = self.state.lock().unwrap();
            let business_id = request.student_id.unwrap_or_default();
            if state.failing_marks.contains(&business_id) {
                return Err(http(500, "{\"error\":\"boom\"}"));
            }
            let status: AttendanceStatus = request
                .status
                .unwrap_or_default()
                .parse()
                .map_err(|_| http(500, "{\"error\":\"bad status\"}"))?;
            let student = state
                .sections
                .iter_mut()
                .flat_map(|s| s.students.iter_mut())
                .find(|s| s.business_id == business_id)
                .ok_or_else(|| http(404, "{\"message\":\"Student not found\"}"))?;
            student.status = status;
            Ok(MessageResponse {
                message: "Attendance updated successfully".to_string(),
            })
        }

        async fn create_notification(&self, request: CreateNotificationRequest) -> Result<Notification, ClientError> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let notification = Notification {
                storage_id: format!("n-{}", state.next_id),
                student_id: request.student_id.unwrap_or_default(),
                teacher: request.teacher.unwrap_or_else(|| UNKNOWN_TEACHER.to_string()),
                message: request.message.unwrap_or_default(),
                date: Utc::now() + Duration::seconds(state.next_id as i64),
            };
            state.notifications.push(notification.clone());
            Ok(notification)
        }

        async fn list_notifications(&self, student_id: &str) -> Result<Vec<Notification>, ClientError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .notifications
                .iter()
                .filter(|n| n.student_id == student_id)
                .cloned()
                .collect())
        }
    }

    fn student(section_id: &str, business_id: &str, status: AttendanceStatus) -> Student {
        Student {
            storage_id: format!("st-{business_id}"),
            business_id: business_id.to_string(),
            name: format!("Student {business_id}"),
            section: Some(section_id.to_string()),
            status,
        }
    }

    fn section(storage_id: &str, name: &str, ids: &[&str]) -> SectionWithStudents {
        SectionWithStudents {
            storage_id: storage_id.to_string(),
            name: name.to_string(),
            students: ids
                .iter()
                .map(|id| student(storage_id, id, AttendanceStatus::Present))
                .collect(),
        }
    }

    fn dashboard(api: FakeApi) -> Dashboard<FakeApi, MemoryStore> {
        Dashboard::new(api, MemoryStore::new(), &DashboardConfig::default()).with_rng(StdRng::seed_from_u64(11))
    }

    fn two_sections() -> Vec<SectionWithStudents> {
        vec![
            section("sec-a", "Section A", &["A1", "A2", "A3"]),
            section("sec-b", "Section B", &["B1"]),
        ]
    }

    #[tokio::test]
    async fn test_load_selects_first_section() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();

        assert_eq!(dash.sections().len(), 2);
        assert_eq!(dash.current_section().unwrap().name, "Section A");

        dash.select_section("sec-b").unwrap();
        dash.load().await.unwrap();
        assert_eq!(dash.current_section().unwrap().name, "Section B", "reload keeps the selection");
        assert!(matches!(dash.select_section("nope"), Err(DashboardError::UnknownSection(_))));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_mirror() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();

        dash.api().fail_listing(true);
        assert!(dash.load().await.is_err());
        assert!(dash.error().unwrap().contains("Failed to load sections"));
        assert_eq!(dash.sections().len(), 2);
        assert!(!dash.is_loading());

        dash.api().fail_listing(false);
        dash.load().await.unwrap();
        assert!(dash.error().is_none());
    }

    #[tokio::test]
    async fn test_resolution_prefers_live_data() {
        let live = vec![section("sec-x", "Section 20", &["231FA04001", "Z1"])];
        let mut dash = dashboard(FakeApi::with_sections(live));

        // Before load only the demo roster exists
        let demo = dash.resolve_student("231FA04001").unwrap();
        assert_eq!(demo.section_name, "Section 1");
        assert!(demo.section_id.is_none());

        dash.load().await.unwrap();
        let live = dash.resolve_student("231FA04001").unwrap();
        assert_eq!(live.section_name, "Section 20");
        assert_eq!(live.section_id.as_deref(), Some("sec-x"));

        assert_eq!(dash.resolve_student("231FA04031").unwrap().section_name, "Section 2");
        assert!(dash.resolve_student("nobody").is_none());
    }

    #[tokio::test]
    async fn test_mark_syncs_history_and_refreshes() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();

        let before = dash.student_history("A1").await.unwrap();
        assert_eq!(before.len(), 31);
        assert_eq!(before[0].status, AttendanceStatus::Present);
        assert_eq!(dash.student_history("A1").await.unwrap(), before);

        let calls = dash.api().list_calls();
        dash.mark_attendance("A1", AttendanceStatus::Absent).await.unwrap();
        assert_eq!(dash.api().list_calls(), calls + 1, "one refresh per write");

        let after = dash.student_history("A1").await.unwrap();
        assert_eq!(after[0].status, AttendanceStatus::Absent);
        assert_eq!(&after[1..], &before[1..]);
        assert_eq!(dash.resolve_student("A1").unwrap().status, AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn test_failed_mark_leaves_state_untouched() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();
        let before = dash.student_history("A1").await.unwrap();
        let calls = dash.api().list_calls();

        let err = dash.mark_attendance("ghost", AttendanceStatus::Absent).await.unwrap_err();
        assert!(matches!(err, DashboardError::Api(ClientError::Http { status: 404, .. })));
        assert!(dash.error().unwrap().starts_with("Mark failed"));
        assert_eq!(dash.api().list_calls(), calls, "no refresh after a failed write");
        assert_eq!(dash.student_history("A1").await.unwrap(), before);
    }

    /// Reads nothing and refuses every write
    struct FailingStore;

    impl LocalStore for FailingStore {
        fn read(&self, _key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: serde_json::Value) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mark_refreshes_even_when_history_cannot_be_saved() {
        let api = FakeApi::with_sections(two_sections());
        let mut dash = Dashboard::new(api, FailingStore, &DashboardConfig::default());
        dash.load().await.unwrap();
        let calls = dash.api().list_calls();

        let err = dash.mark_attendance("A1", AttendanceStatus::Absent).await.unwrap_err();
        assert!(matches!(err, DashboardError::Storage(StorageError::Io(_))));
        assert_eq!(dash.api().list_calls(), calls + 1, "the write still refreshes");
        assert_eq!(dash.resolve_student("A1").unwrap().status, AttendanceStatus::Absent);
        assert!(dash.error().unwrap().starts_with("Saving history failed"));
    }

    #[tokio::test]
    async fn test_clear_history_persists_empty_cache() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();
        dash.student_history("A1").await.unwrap();
        dash.student_history("B1").await.unwrap();
        let policy = HistoryPolicy::from(&DashboardConfig::default());
        assert_eq!(HistoryCache::load(dash.store(), policy).len(), 2);

        dash.clear_history().unwrap();
        assert!(dash.history.is_empty());
        assert!(HistoryCache::load(dash.store(), policy).is_empty());

        let regenerated = dash.student_history("A1").await.unwrap();
        assert_eq!(regenerated.len(), 31);
        assert!(dash.history.contains("A1"));
    }

    #[tokio::test]
    async fn test_add_student_requires_all_fields_then_refreshes() {
        let mut dash = dashboard(FakeApi::with_sections(vec![section("sec-20", "Section 20", &[])]));
        dash.load().await.unwrap();

        let err = dash.add_student("Zoe", "", "sec-20").await.unwrap_err();
        assert!(matches!(err, DashboardError::MissingFields));
        assert_eq!(dash.error(), Some("Add student failed: Fill all fields"));

        let created = dash.add_student("Zoe", "Z1", "sec-20").await.unwrap();
        assert_eq!(created.business_id, "Z1");
        assert!(dash.error().is_none());
        assert_eq!(dash.current_section().unwrap().students[0].name, "Zoe");

        let err = dash.add_student("Zed", "Z1", "sec-20").await.unwrap_err();
        assert!(matches!(err, DashboardError::Api(ClientError::Http { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_mark_section_reports_aggregate() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();
        dash.api().fail_marks_for("A2");
        let calls = dash.api().list_calls();

        let outcome = dash.mark_section(AttendanceStatus::Absent).await.unwrap();
        assert_eq!(outcome, BulkOutcome { succeeded: 2, failed: 1 });
        assert_eq!(dash.api().list_calls(), calls + 2, "each successful mark refreshes");
        assert_eq!(dash.error(), Some("1 of 3 updates failed"));
        assert!(dash.current_section().unwrap().find_student("A1").is_some());

        // The last refresh to land may predate other marks; a fresh load settles it
        dash.load().await.unwrap();
        let section = dash.current_section().unwrap();
        assert_eq!(section.find_student("A1").unwrap().status, AttendanceStatus::Absent);
        assert_eq!(section.find_student("A2").unwrap().status, AttendanceStatus::Present);
        assert_eq!(section.find_student("A3").unwrap().status, AttendanceStatus::Absent);

        assert_eq!(dash.student_history("A1").await.unwrap()[0].status, AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn test_bulk_without_section_is_a_no_op() {
        let mut dash = dashboard(FakeApi::default());
        dash.load().await.unwrap();
        assert_eq!(dash.mark_section(AttendanceStatus::Present).await.unwrap(), BulkOutcome::default());
        assert_eq!(dash.notify_section(ATTENTION_MESSAGE).await.total(), 0);
    }

    #[tokio::test]
    async fn test_notifications_for_session_student() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();
        dash.login_student("A1").await.unwrap();
        assert!(dash.notifications().is_empty());

        let sent = dash.notify_one("A1", "Please see me").await.unwrap();
        assert_eq!(sent.teacher, "Unknown");
        assert_eq!(dash.notifications().len(), 1, "session student reloads its list");

        let outcome = dash.notify_section(ATTENTION_MESSAGE).await;
        assert_eq!(outcome, BulkOutcome { succeeded: 3, failed: 0 });
        assert_eq!(dash.api().notifications_sent(), 4);

        let latest = dash.notifications_latest_first();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].message, ATTENTION_MESSAGE);
        assert_eq!(latest[1].message, "Please see me");
    }

    #[tokio::test]
    async fn test_teacher_name_used_as_sender() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();
        assert!(matches!(dash.login_teacher("Ms. Rao", ""), Err(DashboardError::MissingCredentials)));

        dash.login_teacher("Ms. Rao", "secret").unwrap();
        let sent = dash.notify_one("B1", "Hello").await.unwrap();
        assert_eq!(sent.teacher, "Ms. Rao");
        assert!(dash.notifications().is_empty(), "teacher session does not reload");

        dash.logout().unwrap();
        assert!(dash.preferences().role.is_none());
        assert!(dash.preferences().teacher_name.is_empty());
    }

    #[tokio::test]
    async fn test_student_login_and_preferences_persist() {
        let mut dash = dashboard(FakeApi::default());
        assert!(matches!(
            dash.login_student("nobody").await,
            Err(DashboardError::UnknownStudent(_))
        ));

        let resolved = dash.login_student("231FA04042").await.unwrap();
        assert_eq!(resolved.section_name, "Section 2");
        dash.set_dark_mode(true).unwrap();

        let restored = Preferences::load(dash.store());
        assert_eq!(restored.student_id, "231FA04042");
        assert_eq!(restored.role, Some(UserRole::Student));
        assert!(restored.dark_mode);
        assert_eq!(dash.current_student().unwrap().business_id, "231FA04042");
    }

    #[tokio::test]
    async fn test_today_rows_and_export() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();
        let today = Utc::now().date_naive();
        dash.mark_attendance("A2", AttendanceStatus::Absent).await.unwrap();

        let rows = dash.section_today_rows("sec-a").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].business_id, "A2");
        assert_eq!(rows[1].status, AttendanceStatus::Absent);
        assert!(rows[0].date >= today && rows[0].date <= today + Duration::days(1));

        let demo_rows = dash.section_today_rows("19").await.unwrap();
        assert_eq!(demo_rows.len(), 30);
        assert_eq!(demo_rows[29].business_id, "231FA04570");
        assert!(dash.section_today_rows("missing").await.unwrap().is_empty());

        let (name, bytes) = dash.export_section("sec-a", ExportFormat::Csv).await.unwrap();
        assert_eq!(name, "Attendance_Section A.csv");
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Student ID,Student Name,Date,Status"));
        assert!(text.contains("A2,Student A2,"));

        let err = dash.export_section("missing", ExportFormat::Pdf).await.unwrap_err();
        assert!(matches!(err, DashboardError::Export(crate::export::ExportError::NoData)));
    }

    #[tokio::test]
    async fn test_stats_and_trend_follow_history() {
        let mut dash = dashboard(FakeApi::with_sections(two_sections()));
        dash.load().await.unwrap();

        let history = dash.student_history("B1").await.unwrap();
        let stats = dash.student_stats("B1").await.unwrap();
        assert_eq!(stats.total, 31);
        assert_eq!(stats.present, history.iter().filter(|e| e.status.is_present()).count());

        let trend = dash.student_trend("B1").await.unwrap();
        assert_eq!(trend.len(), 31);
        assert_eq!(trend[30].date, history[0].date, "trend ends today");

        let rows = dash.student_export_rows("B1").await.unwrap();
        assert_eq!(rows.len(), 31);
        assert!(dash.student_history("nobody").await.unwrap().is_empty());
    }
}
