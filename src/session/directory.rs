use crate::common::DirectoryUser;
use crate::error::ApiError;

/// Users an admin can chat with.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: Vec<DirectoryUser>,
    next_seq: u64,
    applied_seq: u64,
    loaded: bool,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[DirectoryUser] {
        &self.users
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: &str) -> Option<&DirectoryUser> {
        self.users.iter().find(|user| user.id == id)
    }

    /// Sequence number to tag the next directory fetch with.
    pub fn request(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Applies a completed fetch. Returns the first listed user when nobody
    /// is selected yet, so the admin lands in a conversation right away.
    pub fn apply(
        &mut self,
        seq: u64,
        result: Result<Vec<DirectoryUser>, ApiError>,
        has_selection: bool,
    ) -> Option<String> {
        if seq <= self.applied_seq {
            log::debug!("Discarding directory fetch #{seq}");
            return None;
        }
        let users = match result {
            Ok(users) => users,
            Err(err) => {
                log::warn!("Loading user directory failed: {err}");
                return None;
            }
        };

        self.applied_seq = seq;
        self.loaded = true;
        self.users = users;
        log::info!("User directory loaded ({} users)", self.users.len());

        if !has_selection {
            self.users.first().map(|user| user.id.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> DirectoryUser {
        DirectoryUser {
            id: id.into(),
            display_name: name.into(),
            username: name.to_lowercase(),
        }
    }

    #[test]
    fn first_load_auto_selects_first_user() {
        let mut directory = UserDirectory::new();
        let seq = directory.request();
        let selected = directory.apply(
            seq,
            Ok(vec![user("u1", "Alice"), user("u2", "Bob")]),
            false,
        );
        assert_eq!(selected.as_deref(), Some("u1"));
        assert_eq!(directory.users().len(), 2);
        assert_eq!(directory.find("u2").map(|u| u.label()), Some("Bob"));
    }

    #[test]
    fn existing_selection_is_kept() {
        let mut directory = UserDirectory::new();
        let seq = directory.request();
        assert_eq!(directory.apply(seq, Ok(vec![user("u1", "Alice")]), true), None);
    }

    #[test]
    fn failed_load_selects_nothing() {
        let mut directory = UserDirectory::new();
        let failed = directory.request();
        let err = ApiError::Status {
            status: 500,
            body: String::new(),
        };
        assert_eq!(directory.apply(failed, Err(err), false), None);
        assert!(!directory.is_loaded());

        let ok = directory.request();
        assert_eq!(
            directory.apply(ok, Ok(vec![user("u1", "Alice")]), false).as_deref(),
            Some("u1")
        );
        let again = directory.request();
        assert_eq!(directory.apply(again, Ok(vec![user("u2", "Bob")]), true), None);
        assert_eq!(directory.users()[0].id, "u2");
    }

    #[test]
    fn empty_directory_selects_nothing() {
        let mut directory = UserDirectory::new();
        let seq = directory.request();
        assert_eq!(directory.apply(seq, Ok(Vec::new()), false), None);
        assert!(directory.is_loaded());
    }

    #[test]
    fn failure_keeps_previous_users() {
        let mut directory = UserDirectory::new();
        let seq = directory.request();
        directory.apply(seq, Ok(vec![user("u1", "Alice")]), true);

        let seq = directory.request();
        let err = ApiError::Status {
            status: 502,
            body: String::new(),
        };
        directory.apply(seq, Err(err), true);
        assert_eq!(directory.users().len(), 1);
    }

    #[test]
    fn out_of_order_completion_is_dropped() {
        let mut directory = UserDirectory::new();
        let older = directory.request();
        let newer = directory.request();
        directory.apply(newer, Ok(vec![user("u2", "Bob")]), true);
        directory.apply(older, Ok(vec![user("u1", "Alice")]), true);
        assert_eq!(directory.users()[0].id, "u2");
    }
}
