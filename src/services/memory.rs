//! In-memory persistence backed by a JSON snapshot.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::fs;

use crate::{
    model::{Mention, Room, Subscription, User},
    services::{Membership, MembershipError, Store},
};

/// Content of a snapshot file.
///
/// ```json
/// {
///   "users": [{"_id": "u1", "username": "alice"}],
///   "rooms": [{"_id": "r1", "t": "c", "name": "general", "usernames": ["alice"]}],
///   "subscriptions": [{"rid": "r1", "u": {"_id": "u1", "username": "alice"}}]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl Snapshot {
    /// Reads a snapshot from a JSON file.
    pub async fn load(path: &str) -> Result<Self, anyhow::Error> {
        let serialized = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read snapshot {}", path))?;
        let snapshot: Snapshot = serde_json::from_str(&serialized)
            .with_context(|| format!("failed to parse snapshot {}", path))?;

        info!(
            "loaded snapshot with {} users, {} rooms and {} subscriptions",
            snapshot.users.len(),
            snapshot.rooms.len(),
            snapshot.subscriptions.len()
        );

        Ok(snapshot)
    }
}

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    rooms: HashMap<String, Room>,
    subscriptions: Vec<Subscription>,
}

/// [`Store`] and [`Membership`] kept in memory.
///
/// # Examples
///
/// ```
/// use chime::model::User;
/// use chime::services::{MemoryStore, Snapshot, Store};
///
/// let store = MemoryStore::new(Snapshot {
///     users: vec![User::new("u1", "alice")],
///     ..Snapshot::default()
/// });
/// assert!(store.find_user_by_id("u1").is_some());
/// ```
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let state = State {
            users: snapshot
                .users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
            rooms: snapshot
                .rooms
                .into_iter()
                .map(|room| (room.id.clone(), room))
                .collect(),
            subscriptions: snapshot.subscriptions,
        };

        MemoryStore {
            state: RwLock::new(state),
        }
    }

    /// Looks a room up by id.
    pub fn find_room(&self, id: &str) -> Option<Room> {
        self.state.read().rooms.get(id).cloned()
    }
}

impl Store for MemoryStore {
    fn find_user_by_id(&self, id: &str) -> Option<User> {
        self.state.read().users.get(id).cloned()
    }

    fn find_subscriptions_for_room(
        &self,
        room_id: &str,
        only_all_messages: bool,
    ) -> Vec<Subscription> {
        self.state
            .read()
            .subscriptions
            .iter()
            .filter(|subscription| subscription.rid == room_id)
            .filter(|subscription| !only_all_messages || subscription.wants_all_messages())
            .cloned()
            .collect()
    }

    fn find_subscription(&self, room_id: &str, user_id: &str) -> Option<Subscription> {
        self.state
            .read()
            .subscriptions
            .iter()
            .find(|subscription| subscription.rid == room_id && subscription.u.id == user_id)
            .cloned()
    }
}

#[async_trait]
impl Membership for MemoryStore {
    async fn join_room(&self, user: &Mention, room_id: &str) -> Result<(), MembershipError> {
        let mut state = self.state.write();

        let username = match state.users.get(&user.id) {
            Some(known) => known.username.clone(),
            None => return Err(MembershipError::UserNotFound(user.id.clone())),
        };

        let Some(room) = state.rooms.get_mut(room_id) else {
            return Err(MembershipError::RoomNotFound(room_id.to_owned()));
        };
        if !room.has_member(&username) {
            room.usernames.push(username.clone());
        }

        let subscribed = state
            .subscriptions
            .iter()
            .any(|subscription| subscription.rid == room_id && subscription.u.id == user.id);
        if !subscribed {
            let subscription = Subscription::new(room_id, &user.id, &username)
                .map_err(|e| MembershipError::Rejected(e.to_string()))?;
            state.subscriptions.push(subscription);
        }

        debug!("user {} joined room {}", user.id, room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Preference, RoomType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn snapshot() -> Snapshot {
        let mut all = Subscription::new("r1", "u2", "bob").unwrap();
        all.email_notifications = Preference::All;

        Snapshot {
            users: vec![
                User::new("u1", "alice"),
                User::new("u2", "bob"),
                User::new("u3", "carol"),
            ],
            rooms: vec![Room::new("r1", RoomType::Channel, "general", &["alice", "bob"])],
            subscriptions: vec![
                Subscription::new("r1", "u1", "alice").unwrap(),
                all,
                Subscription::new("r2", "u3", "carol").unwrap(),
            ],
        }
    }

    #[test]
    fn test_find_subscriptions_for_room() {
        let store = MemoryStore::new(snapshot());

        assert_eq!(store.find_subscriptions_for_room("r1", false).len(), 2);

        let all_messages = store.find_subscriptions_for_room("r1", true);
        assert_eq!(all_messages.len(), 1);
        assert_eq!(all_messages[0].u.id, "u2");

        assert!(store.find_subscriptions_for_room("r3", false).is_empty());
    }

    #[test]
    fn test_find_subscription() {
        let store = MemoryStore::new(snapshot());
        assert!(store.find_subscription("r1", "u1").is_some());
        assert!(store.find_subscription("r1", "u3").is_none());
    }

    #[tokio::test]
    async fn test_join_room_creates_subscription() {
        let store = MemoryStore::new(snapshot());
        let carol = Mention {
            id: "u3".to_string(),
            username: "carol".to_string(),
        };

        store.join_room(&carol, "r1").await.unwrap();
        assert!(store.find_subscription("r1", "u3").is_some());
        assert!(store.find_room("r1").unwrap().has_member("carol"));

        // joining twice keeps a single subscription
        store.join_room(&carol, "r1").await.unwrap();
        assert_eq!(store.find_subscriptions_for_room("r1", false).len(), 3);
    }

    #[tokio::test]
    async fn test_join_room_errors() {
        let store = MemoryStore::new(snapshot());
        let ghost = Mention {
            id: "u9".to_string(),
            username: "ghost".to_string(),
        };
        let carol = Mention {
            id: "u3".to_string(),
            username: "carol".to_string(),
        };

        assert!(matches!(
            store.join_room(&ghost, "r1").await,
            Err(MembershipError::UserNotFound(_))
        ));
        assert!(matches!(
            store.join_room(&carol, "r9").await,
            Err(MembershipError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "users": [{{"_id": "u1", "username": "alice"}}],
                "rooms": [{{"_id": "r1", "t": "c", "name": "general", "usernames": ["alice"]}}],
                "subscriptions": [{{"rid": "r1", "u": {{"_id": "u1", "username": "alice"}}, "desktopNotifications": "all"}}]
            }}"#
        )
        .unwrap();

        let snapshot = Snapshot::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.rooms[0].recognized_type(), Some(RoomType::Channel));
        assert_eq!(
            snapshot.subscriptions[0].desktop_notifications,
            Preference::All
        );
    }

    #[tokio::test]
    async fn test_load_missing_snapshot() {
        assert!(Snapshot::load("/nonexistent/snapshot.json").await.is_err());
    }
}
