//! Model provider implementations for opsloop.
//!
//! All providers implement the `opsloop_core::Provider` trait.
//! [`build_from_config`] picks one from the application config.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
