//! Persisted dashboard preferences: theme, role, last student id and teacher
//! name. The role records who is looking at the dashboard. It is not an
//! access control.

use serde::{Deserialize, Serialize};
use shared::roster_business_id;

use crate::storage::{LocalStore, LocalStoreExt, StorageError};

pub const DARK_MODE_KEY: &str = "dark_mode";
pub const USER_ROLE_KEY: &str = "user_role";
pub const STUDENT_ID_KEY: &str = "student_id";
pub const TEACHER_NAME_KEY: &str = "teacher_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub dark_mode: bool,
    pub role: Option<UserRole>,
    pub student_id: String,
    pub teacher_name: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            role: None,
            student_id: roster_business_id(1),
            teacher_name: String::new(),
        }
    }
}

impl Preferences {
    pub fn load(store: &dyn LocalStore) -> Self {
        let defaults = Self::default();
        Self {
            dark_mode: store.get_or(DARK_MODE_KEY, defaults.dark_mode),
            role: store.get_or(USER_ROLE_KEY, defaults.role),
            student_id: store.get_or(STUDENT_ID_KEY, defaults.student_id),
            teacher_name: store.get_or(TEACHER_NAME_KEY, defaults.teacher_name),
        }
    }

    /// Persist every key. An absent role removes its key.
    pub fn save(&self, store: &mut dyn LocalStore) -> Result<(), StorageError> {
        store.set(DARK_MODE_KEY, &self.dark_mode)?;
        match self.role {
            Some(role) => store.set(USER_ROLE_KEY, &role)?,
            None => store.remove(USER_ROLE_KEY)?,
        }
        store.set(STUDENT_ID_KEY, &self.student_id)?;
        store.set(TEACHER_NAME_KEY, &self.teacher_name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_defaults_when_store_empty() {
        let store = MemoryStore::new();
        let prefs = Preferences::load(&store);
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.student_id, "231FA04001");
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let prefs = Preferences {
            dark_mode: true,
            role: Some(UserRole::Teacher),
            student_id: "231FA04042".to_string(),
            teacher_name: "Ms. Rao".to_string(),
        };
        prefs.save(&mut store).unwrap();
        assert_eq!(Preferences::load(&store), prefs);

        let logged_out = Preferences { role: None, ..prefs };
        logged_out.save(&mut store).unwrap();
        assert!(store.read(USER_ROLE_KEY).unwrap().is_none());
    }
}
