//! Role-tagged messages passed to the LLM collaborator.

use serde::{Deserialize, Serialize};

/// One conversation message: system, user, or assistant.
///
/// The CoT node builds a `Vec<Message>` each round (system prompt + user
/// payload); the session collaborator's turns are folded into the user
/// payload as a history prefix rather than replayed as messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant(content.into())
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_content_accessors() {
        let m = Message::user("1+1=?");
        assert_eq!(m.role(), "user");
        assert_eq!(m.content(), "1+1=?");
        assert_eq!(Message::system("x").role(), "system");
        assert_eq!(Message::assistant("y").role(), "assistant");
    }

    #[test]
    fn serializes_with_role_tag() {
        let v = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(v["role"], "assistant");
        assert_eq!(v["content"], "hi");
    }
}
