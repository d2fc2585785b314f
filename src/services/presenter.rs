//! Plain text rendering of push bodies and room labels.

use crate::{
    model::{Message, Room, RoomType},
    services::Presenter,
};

/// [`Presenter`] rendering plain text.
///
/// Push bodies are the trimmed message text. Room labels are the room name;
/// unnamed direct rooms fall back to the usernames of their members.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextPresenter;

impl Presenter for TextPresenter {
    fn render_push_body(&self, message: &Message, _viewer_id: &str) -> String {
        message.msg.trim().to_string()
    }

    fn resolve_room_display_name(&self, room_type: RoomType, room: &Room) -> String {
        if room_type == RoomType::Direct && room.name.trim().is_empty() {
            return room.usernames.join(", ");
        }
        room.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sender;

    #[test]
    fn test_render_push_body() {
        let sender = Sender {
            id: "u1".to_string(),
            username: "alice".to_string(),
        };
        let message = Message::new("m1", "r1", sender, "  see you at noon \n");
        assert_eq!(
            TextPresenter.render_push_body(&message, "u2"),
            "see you at noon"
        );
    }

    #[test]
    fn test_resolve_room_display_name() {
        let channel = Room::new("r1", RoomType::Channel, "general", &["alice"]);
        assert_eq!(
            TextPresenter.resolve_room_display_name(RoomType::Channel, &channel),
            "general"
        );

        let direct = Room::new("r2", RoomType::Direct, "", &["alice", "bob"]);
        assert_eq!(
            TextPresenter.resolve_room_display_name(RoomType::Direct, &direct),
            "alice, bob"
        );

        let named_direct = Room::new("r3", RoomType::Direct, "alice-bob", &["alice", "bob"]);
        assert_eq!(
            TextPresenter.resolve_room_display_name(RoomType::Direct, &named_direct),
            "alice-bob"
        );
    }
}
