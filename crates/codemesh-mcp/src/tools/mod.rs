//! One module per tool family; each exposes a `#[tool_router]` impl
//! block on `McpServer` that `server.rs` combines.

pub mod analytics;
pub mod ask;
pub mod common;
pub mod impact;
pub mod lineage;
pub mod project;
pub mod search;
pub mod subgraph;
pub mod symbol;
