//! MCP server exposing Databricks Genie over stdio.
//!
//! Speaks JSON-RPC 2.0 (newline-delimited) and surfaces the Genie API as
//! MCP tools plus guided prompt skills. All Genie access goes through
//! [`genie_core::GenieService`], which enforces rate limiting and tracks
//! conversations across calls.

pub mod error;
pub mod prompts;
pub mod protocol;
pub mod server;
pub mod skills;
pub mod tools;
pub mod transport;

pub use error::{McpError, McpResult};
pub use server::{McpServer, ServerState};
pub use transport::StdioTransport;
