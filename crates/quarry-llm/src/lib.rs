//! Language-model and embedding provider abstraction.

pub mod command;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;

pub use command::CommandProvider;
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
