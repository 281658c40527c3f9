//! Database layer: initialization, models, settings, and the vote store

pub mod init;
pub mod models;
pub mod settings;
pub mod votes;

pub use init::init_database;
pub use models::{NewVote, VisitorMeta, VoteRow};
pub use votes::VoteStore;
