use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recipient that addresses everyone in the room.
pub const PUBLIC_RECIPIENT: &str = "Todos";

pub const JOIN_TEXT: &str = "entered the room";
pub const LEAVE_TEXT: &str = "left the room";

/// A registered display name and the last time it was seen (epoch ms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub last_status: i64,
}

impl Participant {
    pub fn new(name: impl Into<String>, last_status: i64) -> Self {
        Self {
            name: name.into(),
            last_status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    PrivateMessage,
    Status,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Message => "message",
            MessageType::PrivateMessage => "private_message",
            MessageType::Status => "status",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageType::Message),
            "private_message" => Ok(MessageType::PrivateMessage),
            "status" => Ok(MessageType::Status),
            other => Err(format!("unknown message type: {}", other)),
        }
    }
}

/// A chat or status entry in the log. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// `HH:MM:SS` label assigned by the server
    pub time: String,
}

impl Message {
    pub fn status(id: impl Into<String>, from: &str, text: &str, time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.to_string(),
            to: PUBLIC_RECIPIENT.to_string(),
            text: text.to_string(),
            message_type: MessageType::Status,
            time: time.into(),
        }
    }

    /// Whether `viewer` may see this entry in their feed.
    pub fn is_visible_to(&self, viewer: &str) -> bool {
        self.to == viewer
            || self.from == viewer
            || self.to == PUBLIC_RECIPIENT
            || self.message_type == MessageType::Message
    }
}

/// Body of `POST /participants`
#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipantInput {
    pub name: Option<String>,
}

/// Body of `POST /messages`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessageInput {
    pub to: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

/// Query string of `GET /messages`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<String>,
}
