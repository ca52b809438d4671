//! Model Context Protocol (MCP) server for the nominal calculator.
//!
//! Exposes the calculation and summary export as tools to AI assistants,
//! over the stdio transport with JSON-RPC 2.0 messages.
//!
//! ```text
//!   stdin ──▶ StdioTransport ──▶ McpServer ──▶ nominal::compute
//!   stdout ◀─────────────────────────┘    └──▶ ExportSession
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;
