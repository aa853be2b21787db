// Genie Core Library
// Databricks Genie conversational analytics client and space tooling

pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod poll;
pub mod rate_limit;
pub mod service;
pub mod templates;
pub mod tracker;
pub mod transform;
pub mod validate;
pub mod warehouse;

// Export core types
pub use client::{GenieApi, GenieClient, SpaceCreate, SpaceUpdate};
pub use config::GenieConfig;
pub use error::{GenieError, Result};
pub use model::{
    AskOutcome, ColumnMetadata, ConversationList, GenieMessage, MessageAttachment, MessageHandle,
    MessageStatus, OutcomeStatus, QueryResult, Space, SpaceConfig, SpaceList, TableMetadata,
    Warehouse,
};
pub use rate_limit::{RateLimitStatus, RateLimiter};
pub use service::{AskOptions, GenieService};
pub use tracker::ConversationTracker;
pub use validate::ValidationReport;
