//! Reconciliation core of the nearby client: merges pending connection
//! requests, conversations, notifications and event attendance signals into
//! one deduplicated, chronologically ordered activity feed, repairing
//! drifted state along the way.

pub mod backend;
pub mod config;
pub mod engine;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod subscriber;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Backend, BackendError, HttpBackend, SchemaCapabilities};
pub use config::CoreConfig;
pub use engine::{FeedEngine, FeedState};
pub use models::ActivityItem;
pub use subscriber::{ChangeSignal, ChangeSubscriber, ChangeTable, RefreshRequested};
