//! # opsloop core
//!
//! Domain types, traits, and error definitions for the opsloop
//! tool-dispatch agent. Every collaborator of the orchestration loop
//! (the model, the operator, the actions) is a trait here; concrete
//! implementations live in their own crates.

pub mod action;
pub mod error;
pub mod event;
pub mod message;
pub mod observation;
pub mod operator;
pub mod path;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use action::{
    Action, ActionDescriptor, ActionOutput, ActionRegistry, ActionRegistryBuilder, Arguments,
    ParamSchema, ParamSpec, ParamType, SideEffect, parse_args,
};
pub use error::{ActionError, OperatorError, PathError, ProtocolError, ProviderError};
pub use event::{DomainEvent, EventBus};
pub use message::{ActionRequest, Conversation, ConversationId, Role, Turn};
pub use observation::{FailureKind, Observation, Outcome};
pub use operator::{ApprovalRequest, AutoApprove, Operator};
pub use path::PathContext;
pub use provider::{ActionDefinition, Provider, ProviderRequest, ProviderResponse, Usage};
