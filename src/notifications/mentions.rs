//! Mention resolution.
//!
//! Turns the raw mention list of a message into the set of mentioned ids plus
//! the two broadcast flags.

use std::collections::HashSet;

use crate::model::{Mention, Room};

/// Mention token addressing every member of the room.
pub const ALL: &str = "all";
/// Mention token addressing every member currently online.
pub const HERE: &str = "here";

/// Mentions of one message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MentionSet {
    /// Mentioned ids, broadcast tokens included
    pub ids: HashSet<String>,
    /// `@all` was mentioned
    pub to_all: bool,
    /// `@here` was mentioned
    pub to_here: bool,
}

impl MentionSet {
    /// Whether `user_id` is explicitly mentioned.
    pub fn mentions(&self, user_id: &str) -> bool {
        self.ids.contains(user_id)
    }

    /// Whether the message addresses the room as a whole.
    pub fn is_group_mention(&self) -> bool {
        self.to_all || self.to_here
    }
}

/// Resolves the mentions of a message.
///
/// Duplicates collapse and an empty list yields an empty set with both
/// broadcast flags unset.
///
/// # Examples
///
/// ```
/// use chime::model::Mention;
/// use chime::notifications::resolve_mentions;
///
/// let mentions = vec![Mention { id: "all".to_string(), username: "all".to_string() }];
/// let set = resolve_mentions(&mentions);
/// assert!(set.to_all);
/// assert!(!set.to_here);
/// ```
pub fn resolve_mentions(mentions: &[Mention]) -> MentionSet {
    let ids: HashSet<String> = mentions.iter().map(|mention| mention.id.clone()).collect();
    let to_all = ids.contains(ALL);
    let to_here = ids.contains(HERE);

    MentionSet {
        ids,
        to_all,
        to_here,
    }
}

/// Returns the mentioned users that are not yet members of `room`.
///
/// Broadcast tokens are never returned, and each user appears once.
pub fn mentioned_non_members(mentions: &[Mention], room: &Room) -> Vec<Mention> {
    let mut seen = HashSet::new();

    mentions
        .iter()
        .filter(|mention| mention.id != ALL && mention.id != HERE)
        .filter(|mention| !room.has_member(&mention.username))
        .filter(|mention| seen.insert(mention.id.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoomType;

    fn mention(id: &str, username: &str) -> Mention {
        Mention {
            id: id.to_string(),
            username: username.to_string(),
        }
    }

    #[test]
    fn test_empty_mentions() {
        let set = resolve_mentions(&[]);
        assert!(set.ids.is_empty());
        assert!(!set.to_all);
        assert!(!set.to_here);
        assert!(!set.is_group_mention());
    }

    #[test]
    fn test_user_mentions() {
        let set = resolve_mentions(&[mention("u2", "bob"), mention("u3", "carol")]);
        assert_eq!(set.ids.len(), 2);
        assert!(set.mentions("u2"));
        assert!(set.mentions("u3"));
        assert!(!set.mentions("u1"));
        assert!(!set.is_group_mention());
    }

    #[test]
    fn test_duplicate_mentions_collapse() {
        let set = resolve_mentions(&[mention("u2", "bob"), mention("u2", "bob")]);
        assert_eq!(set.ids.len(), 1);
    }

    #[test]
    fn test_broadcast_mentions() {
        let set = resolve_mentions(&[mention("here", "here")]);
        assert!(!set.to_all);
        assert!(set.to_here);
        assert!(set.is_group_mention());

        let set = resolve_mentions(&[mention("all", "all"), mention("u2", "bob")]);
        assert!(set.to_all);
        assert!(!set.to_here);
        assert!(set.mentions("u2"));
    }

    #[test]
    fn test_mentioned_non_members() {
        let room = Room::new("r1", RoomType::Channel, "general", &["alice", "bob"]);
        let mentions = vec![
            mention("all", "all"),
            mention("here", "here"),
            mention("u2", "bob"),
            mention("u3", "carol"),
            mention("u3", "carol"),
        ];

        let non_members = mentioned_non_members(&mentions, &room);
        assert_eq!(non_members, vec![mention("u3", "carol")]);
    }
}
