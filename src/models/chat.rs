use serde::{Deserialize, Serialize};

/// Who sent a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Sender {
    /// The local participant.
    Me,
    /// The other side of the consultation.
    Remote(String),
}

impl Sender {
    pub fn is_me(&self) -> bool {
        matches!(self, Self::Me)
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Me => "You",
            Self::Remote(name) => name,
        }
    }
}

/// One entry in a session's conversation log. Position in the log is the
/// conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sequence number within the session, starting at 1.
    pub seq: u64,
    pub sender: Sender,
    pub body: String,
    /// Wall-clock label such as "10:31 AM".
    pub sent_at: String,
}
