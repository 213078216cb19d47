//! Offline demo roster.
//!
//! Same shape as the server seed (19 sections × 30 students, ids from
//! `231FA04001`) so the dashboard has something to show before the backend is
//! reachable or seeded. Statuses come from a fixed RNG seed, so the roster
//! is identical on every run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    roster_display_name, roster_layout, AttendanceStatus, DEFAULT_SECTION_COUNT,
    DEFAULT_STUDENTS_PER_SECTION,
};

const DEMO_SEED: u64 = 0x00A7_7E4D;
const DEMO_PRESENT_PROBABILITY: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoStudent {
    pub business_id: String,
    pub name: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoSection {
    pub number: u32,
    pub name: String,
    pub students: Vec<DemoStudent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoRoster {
    sections: Vec<DemoSection>,
}

impl DemoRoster {
    pub fn generate() -> Self {
        let mut rng = StdRng::seed_from_u64(DEMO_SEED);
        let sections = roster_layout(DEFAULT_SECTION_COUNT, DEFAULT_STUDENTS_PER_SECTION)
            .into_iter()
            .map(|planned| DemoSection {
                number: planned.number,
                name: planned.name,
                students: planned
                    .business_ids
                    .into_iter()
                    .map(|business_id| DemoStudent {
                        name: roster_display_name(&business_id),
                        status: if rng.gen_bool(DEMO_PRESENT_PROBABILITY) {
                            AttendanceStatus::Present
                        } else {
                            AttendanceStatus::Absent
                        },
                        business_id,
                    })
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    pub fn sections(&self) -> &[DemoSection] {
        &self.sections
    }

    /// The student and the section that lists it
    pub fn find(&self, business_id: &str) -> Option<(&DemoSection, &DemoStudent)> {
        self.sections.iter().find_map(|section| {
            section
                .students
                .iter()
                .find(|s| s.business_id == business_id)
                .map(|student| (section, student))
        })
    }

    pub fn section(&self, number: u32) -> Option<&DemoSection> {
        self.sections.iter().find(|s| s.number == number)
    }
}

impl Default for DemoRoster {
    fn default() -> Self {
        Self::generate()
    }
}
