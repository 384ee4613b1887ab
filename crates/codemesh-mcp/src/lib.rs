//! Agent-facing query layer: MCP tool catalog over the symbol graph.
//! `codemesh-server` mounts `McpServer` as a nested
//! Streamable-HTTP route; nothing here depends on the transport.

pub mod error;
pub mod ranking;
pub mod response;
pub mod server;
pub mod session;
pub mod tools;

pub use response::{Block, GraphEdgeCard, Hint, Meta, SymbolCard, ToolResponse};
pub use server::{McpContext, McpServer};
pub use session::{Session, SessionCache};
