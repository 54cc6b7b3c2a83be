//! Conversation state replayed to the oracle on every request.

use serde::{Deserialize, Serialize};

/// Author of a conversation message, serialized the way chat endpoints expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only message list owned by a single loop run.
///
/// The first message is always the system instruction and the second the
/// initial user prompt. After that, messages are only added in
/// assistant/user pairs (command, then its observation), so roles strictly
/// alternate once the first user message is in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of command/observation pairs recorded so far.
    pub fn exchanges(&self) -> usize {
        (self.messages.len() - 2) / 2
    }

    /// Append an executed command and the observation it produced.
    pub fn record_exchange(&mut self, command: impl Into<String>, observation: impl Into<String>) {
        self.messages.push(Message::assistant(command));
        self.messages.push(Message::user(observation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_starts_with_system_then_user() {
        let conversation = Conversation::new("rules", "build it");
        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(conversation.exchanges(), 0);
    }

    #[test]
    fn exchanges_alternate_assistant_and_user() {
        let mut conversation = Conversation::new("rules", "build it");
        conversation.record_exchange("npm ci", "exit_code: 0");
        conversation.record_exchange("npm run build", "exit_code: 1");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
            ]
        );
        assert_eq!(conversation.exchanges(), 2);
        assert_eq!(conversation.messages()[4].content, "npm run build");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ls")).expect("serialize");
        assert_eq!(json, r#"{"role":"assistant","content":"ls"}"#);
    }
}
