//! Turn and Conversation domain types.
//!
//! A conversation is the transcript replayed to the model on every round:
//! system prompt → user task → assistant turns (with action requests) →
//! one observation turn per request → next assistant turn, and so on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::observation::{Observation, Outcome};

/// Unique identifier for a conversation (one orchestration run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The human operator (or the loop speaking on their behalf)
    User,
    /// The model
    Assistant,
    /// The executor's reply to one action request
    Observation,
}

/// An action the model asked for, exactly as it arrived.
///
/// Arguments stay as the raw JSON text the model produced so that a
/// malformed payload can be answered with a protocol-error observation
/// instead of failing the whole round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Correlation id linking the request to its observation
    pub correlation_id: String,

    /// Name of the requested action
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

impl ActionRequest {
    pub fn new(
        correlation_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw arguments into a JSON object.
    ///
    /// Blank input is accepted as an empty object, since models commonly
    /// send `""` for parameterless actions.
    pub fn parse_arguments(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ProtocolError> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }

        match serde_json::from_str::<serde_json::Value>(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(ProtocolError::MalformedArguments {
                action: self.name.clone(),
                reason: format!("expected an object, got {other}"),
            }),
            Err(e) => Err(ProtocolError::MalformedArguments {
                action: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// A single entry in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Action requests made by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_requests: Vec<ActionRequest>,

    /// For observation turns, the request this answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// For observation turns, how the request went
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            action_requests: Vec::new(),
            correlation_id: None,
            outcome: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant turn without action requests.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant turn carrying action requests.
    pub fn assistant_with_actions(
        content: impl Into<String>,
        action_requests: Vec<ActionRequest>,
    ) -> Self {
        let mut turn = Self::with_role(Role::Assistant, content);
        turn.action_requests = action_requests;
        turn
    }

    /// Create an observation turn from an executor result.
    pub fn observation(observation: Observation) -> Self {
        let mut turn = Self::with_role(Role::Observation, observation.content);
        turn.correlation_id = Some(observation.correlation_id);
        turn.outcome = Some(observation.outcome);
        turn
    }

    pub fn has_actions(&self) -> bool {
        !self.action_requests.is_empty()
    }
}

/// The ordered, append-only transcript of one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    turns: Vec<Turn>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation seeded with the system prompt and the task.
    pub fn seeded(system_prompt: &str, task: &str, path: &str) -> Self {
        let mut conv = Self::new();
        conv.push(Turn::system(system_prompt));
        conv.push(Turn::user(format!("Your task is: {task} in project {path}")));
        conv
    }

    /// Append a turn to the transcript.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// All turns, in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Observation turns, in insertion order.
    pub fn observations(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.role == Role::Observation)
    }

    /// Action requests that have no observation yet.
    pub fn unanswered_requests(&self) -> Vec<&ActionRequest> {
        let answered: std::collections::HashSet<&str> = self
            .observations()
            .filter_map(|t| t.correlation_id.as_deref())
            .collect();

        self.turns
            .iter()
            .flat_map(|t| t.action_requests.iter())
            .filter(|r| !answered.contains(r.correlation_id.as_str()))
            .collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
