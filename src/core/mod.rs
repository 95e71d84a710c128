//! Core types shared across Drydock's subsystems.
//!
//! This module defines [`DrydockError`], the typed result value every
//! fallible operation in the Resolver, Retriever, `VersionFile` matcher, and
//! Build Orchestrator returns, plus [`ErrorContext`] for turning one into a
//! suggestion-bearing CLI message.

pub mod error;
pub mod session;

pub use error::{create_error_context, user_friendly_error, DrydockError, ErrorContext, IntoAnyhowWithContext};
pub use session::Session;
