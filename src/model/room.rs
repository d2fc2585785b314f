//! Chat room as seen by the notification pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Sender;

/// Kind of room, serialized with its one-letter code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    /// Public channel (`c`)
    #[serde(rename = "c")]
    Channel,
    /// Private group (`p`)
    #[serde(rename = "p")]
    Private,
    /// Direct conversation (`d`)
    #[serde(rename = "d")]
    Direct,
    /// Livechat room with an external visitor (`l`)
    #[serde(rename = "l")]
    Livechat,
    /// Any code this crate does not know about
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = match self {
            RoomType::Channel => "c",
            RoomType::Private => "p",
            RoomType::Direct => "d",
            RoomType::Livechat => "l",
            RoomType::Unknown => "?",
        };
        write!(f, "{}", code)
    }
}

/// A chat room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Room type, absent for malformed records
    #[serde(rename = "t", default)]
    pub room_type: Option<RoomType>,
    /// Room name
    #[serde(default)]
    pub name: String,
    /// Usernames of the room members
    #[serde(default)]
    pub usernames: Vec<String>,
    /// Visitor of a livechat room, who is the sender of its messages
    #[serde(rename = "v", default)]
    pub visitor: Option<Sender>,
}

impl Room {
    /// Creates a room with the given members and no visitor.
    pub fn new(id: &str, room_type: RoomType, name: &str, usernames: &[&str]) -> Self {
        Room {
            id: id.to_owned(),
            room_type: Some(room_type),
            name: name.to_owned(),
            usernames: usernames.iter().map(|u| u.to_string()).collect(),
            visitor: None,
        }
    }

    /// Returns the room type when it is one the pipeline knows how to handle.
    pub fn recognized_type(&self) -> Option<RoomType> {
        match self.room_type {
            Some(RoomType::Unknown) | None => None,
            known => known,
        }
    }

    /// Whether `username` is already a member of the room.
    pub fn has_member(&self, username: &str) -> bool {
        self.usernames.iter().any(|u| u == username)
    }
}
