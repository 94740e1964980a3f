//! Role-tagged messages and the append-only log that carries them.

use serde::{Deserialize, Serialize};

use crate::decision::Decision;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The question asker.
    User,
    /// The reasoning stage. Content is a canonical decision encoding.
    Assistant,
    /// Tool results and stage diagnostics.
    Observation,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Observation => write!(f, "observation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
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

    pub fn observation(content: impl Into<String>) -> Self {
        Self {
            role: Role::Observation,
            content: content.into(),
        }
    }

    /// Assistant message holding the canonical JSON of `decision`.
    pub fn decision(decision: &Decision) -> Self {
        Self::assistant(decision.to_json())
    }

    /// Decode the decision stored in an assistant message.
    ///
    /// Stored content is canonical JSON and is parsed without model-output
    /// cleanup; fallback answers may embed fences or `</think>` verbatim.
    pub fn as_decision(&self) -> Option<Decision> {
        match self.role {
            Role::Assistant => serde_json::from_str(&self.content).ok(),
            _ => None,
        }
    }
}

/// Ordered message history. Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog(Vec<Message>);

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.0.extend(messages);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
