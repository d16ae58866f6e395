use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::models::UserProfile;

/// Connected user profiles plus the human-readable join/leave history
/// shown in the client's activity panel.
#[derive(Debug)]
pub struct PresenceStore {
    users: HashMap<Uuid, UserProfile>,
    activity: VecDeque<String>,
    /// Retention limit for the activity log. 0 disables trimming.
    activity_limit: usize,
}

impl PresenceStore {
    pub fn new(activity_limit: usize) -> Self {
        Self {
            users: HashMap::new(),
            activity: VecDeque::new(),
            activity_limit,
        }
    }

    /// Insert or overwrite the profile for a session and record the join.
    pub fn set_user(&mut self, session_id: Uuid, username: &str) {
        self.users.insert(
            session_id,
            UserProfile {
                username: username.to_string(),
            },
        );
        self.push_activity(format!("{username} joined to edit the document"));
    }

    /// Drop the profile for a session and record the departure. Falls back
    /// to the raw session id when the client never sent a presence event.
    pub fn remove_user(&mut self, session_id: &Uuid) {
        let name = self
            .users
            .remove(session_id)
            .map(|profile| profile.username)
            .unwrap_or_else(|| session_id.to_string());
        self.push_activity(format!("{name} left the document"));
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn activity_len(&self) -> usize {
        self.activity.len()
    }

    /// Owned copies of the user mapping and the activity log, in order.
    pub fn snapshot(&self) -> (HashMap<Uuid, UserProfile>, Vec<String>) {
        (self.users.clone(), self.activity.iter().cloned().collect())
    }

    fn push_activity(&mut self, entry: String) {
        if self.activity_limit > 0 {
            while self.activity.len() >= self.activity_limit {
                self.activity.pop_front();
            }
        }
        self.activity.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_user_inserts_profile_and_records_join() {
        let mut presence = PresenceStore::new(0);
        let id = Uuid::new_v4();
        presence.set_user(id, "alice");

        let (users, activity) = presence.snapshot();
        assert_eq!(users.len(), 1);
        assert_eq!(users[&id].username, "alice");
        assert_eq!(activity, vec!["alice joined to edit the document"]);
    }

    #[test]
    fn set_user_overwrites_existing_profile() {
        let mut presence = PresenceStore::new(0);
        let id = Uuid::new_v4();
        presence.set_user(id, "alice");
        presence.set_user(id, "alicia");

        let (users, activity) = presence.snapshot();
        assert_eq!(users.len(), 1);
        assert_eq!(users[&id].username, "alicia");
        // Every presence event records a join entry, including renames.
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[1], "alicia joined to edit the document");
    }

    #[test]
    fn remove_user_uses_last_known_username() {
        let mut presence = PresenceStore::new(0);
        let id = Uuid::new_v4();
        presence.set_user(id, "alice");
        presence.remove_user(&id);

        let (users, activity) = presence.snapshot();
        assert!(users.is_empty());
        assert_eq!(activity.last().unwrap(), "alice left the document");
    }

    #[test]
    fn remove_user_falls_back_to_session_id() {
        let mut presence = PresenceStore::new(0);
        let id = Uuid::new_v4();
        presence.remove_user(&id);

        let (_, activity) = presence.snapshot();
        assert_eq!(activity, vec![format!("{id} left the document")]);
    }

    #[test]
    fn activity_log_keeps_most_recent_entries() {
        let mut presence = PresenceStore::new(3);
        for name in ["a", "b", "c", "d", "e"] {
            presence.set_user(Uuid::new_v4(), name);
        }

        let (_, activity) = presence.snapshot();
        assert_eq!(
            activity,
            vec![
                "c joined to edit the document",
                "d joined to edit the document",
                "e joined to edit the document",
            ]
        );
    }

    #[test]
    fn zero_limit_disables_trimming() {
        let mut presence = PresenceStore::new(0);
        for _ in 0..500 {
            presence.set_user(Uuid::new_v4(), "u");
        }
        assert_eq!(presence.activity_len(), 500);
    }
}
