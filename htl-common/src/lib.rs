//! # HTL Common Library
//!
//! Shared code for the Human Taste Lab service including:
//! - Database init, models, and the vote store
//! - Event types (LabEvent enum) and EventBus
//! - Session identity persistence
//! - Configuration loading
//! - The static round catalog
//! - SSE utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod identity;
pub mod rounds;
pub mod sse;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use identity::SessionIdentity;
pub use rounds::{Round, RoundPhoto};
