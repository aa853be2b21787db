//! Wire protocol types: JSON-RPC 2.0 framing plus MCP payloads.

pub mod jsonrpc;
pub mod mcp;

pub use jsonrpc::*;
pub use mcp::*;
