use crate::config::UserRecord;

/// In-memory registry of user accounts plus the anonymous-access policy.
///
/// Lookups are case-sensitive exact matches on the username. The registry is
/// loaded once at startup and shared read-only between sessions.
#[derive(Debug)]
pub struct UserDirectory {
    users: Vec<UserRecord>,
    allow_anonymous: bool,
}

impl UserDirectory {
    pub fn new(users: Vec<UserRecord>, allow_anonymous: bool) -> Self {
        UserDirectory {
            users,
            allow_anonymous,
        }
    }

    pub fn allow_anonymous(&self) -> bool {
        self.allow_anonymous
    }

    /// Returns true when a record with exactly this username carries exactly
    /// this password.
    pub fn check_password(&self, username: &str, password: &str) -> bool {
        self.users
            .iter()
            .any(|record| record.username == username && record.password == password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, password: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn exact_match_logs_in() {
        let directory = UserDirectory::new(vec![record("alice", "secret")], false);
        assert!(directory.check_password("alice", "secret"));
    }

    #[test]
    fn username_is_case_sensitive() {
        let directory = UserDirectory::new(vec![record("alice", "secret")], false);
        assert!(!directory.check_password("Alice", "secret"));
        assert!(!directory.check_password("ALICE", "secret"));
    }

    #[test]
    fn password_must_match_exactly() {
        let directory = UserDirectory::new(vec![record("alice", "secret")], false);
        assert!(!directory.check_password("alice", "Secret"));
        assert!(!directory.check_password("alice", "secret "));
        assert!(!directory.check_password("alice", ""));
    }

    #[test]
    fn empty_registry_rejects_everyone() {
        let directory = UserDirectory::new(Vec::new(), true);
        assert!(!directory.check_password("anyone", "anything"));
        assert!(directory.allow_anonymous());
    }
}
