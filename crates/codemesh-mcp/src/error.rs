//! Maps the shared error taxonomy onto `rmcp`'s tool error type.

use codemesh_core::CoreError;
use rmcp::ErrorData as McpError;

pub fn to_mcp_error(err: CoreError) -> McpError {
    match err {
        CoreError::Validation(msg) => McpError::invalid_params(msg, None),
        CoreError::NotFound(msg) => McpError::invalid_params(format!("not found: {msg}"), None),
        CoreError::Unauthorized(msg) => McpError::invalid_request(msg, None),
        CoreError::Forbidden(msg) => McpError::invalid_request(msg, None),
        CoreError::PreconditionFailed(msg) => McpError::invalid_request(msg, None),
        CoreError::ExternalDependency(msg) => McpError::internal_error(msg, None),
        CoreError::Internal(err) => McpError::internal_error(err.to_string(), None),
    }
}

pub fn store_err(err: codemesh_store::StoreError) -> McpError {
    to_mcp_error(err.into())
}

pub fn ai_err(err: codemesh_ai::AiError) -> McpError {
    to_mcp_error(err.into())
}
