//! Environment-driven configuration: a closed set of recognized
//! options read once at startup. Unset optional knobs fall back to
//! sane defaults rather than failing boot — only `DATABASE_URL` is
//! required.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,

    /// Graph Mirror is in-process in this implementation, so
    /// `GRAPH_*` has nothing to connect to; still parsed and carried so
    /// a deployment pointing it at a future external mirror doesn't
    /// need a code change, only a config one.
    pub graph_endpoint: Option<String>,
    pub graph_credentials: Option<String>,

    pub object_store_endpoint: Option<String>,
    pub object_store_bucket: Option<String>,
    pub queue_url: Option<String>,

    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_dimensions: Option<u32>,
    pub embedding_api_key: Option<String>,

    pub mcp_addr: String,
    pub mcp_base_url: String,

    pub auth_enabled: bool,
    pub auth_issuer_url: Option<String>,
    pub auth_audience: Option<String>,

    pub oracle_enabled: bool,
    pub oracle_model: Option<String>,

    pub gitlab_token: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let auth_enabled = env_bool("AUTH_ENABLED", false);
        if auth_enabled && env::var("AUTH_ISSUER_URL").is_err() {
            anyhow::bail!("AUTH_ISSUER_URL must be set when AUTH_ENABLED=true");
        }

        Ok(Self {
            database_url,
            database_max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 10),
            graph_endpoint: env::var("GRAPH_ENDPOINT").ok(),
            graph_credentials: env::var("GRAPH_CREDENTIALS").ok(),
            object_store_endpoint: env::var("OBJECT_STORE_ENDPOINT").ok(),
            object_store_bucket: env::var("OBJECT_STORE_BUCKET").ok(),
            queue_url: env::var("QUEUE_URL").ok(),
            embedding_provider: env::var("EMBEDDING_PROVIDER").ok(),
            embedding_model: env::var("EMBEDDING_MODEL").ok(),
            embedding_dimensions: env::var("EMBEDDING_DIMENSIONS").ok().and_then(|v| v.parse().ok()),
            embedding_api_key: env::var("EMBEDDING_API_KEY").ok(),
            mcp_addr: env::var("MCP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            mcp_base_url: env::var("MCP_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            auth_enabled,
            auth_issuer_url: env::var("AUTH_ISSUER_URL").ok(),
            auth_audience: env::var("AUTH_AUDIENCE").ok(),
            oracle_enabled: env_bool("ORACLE_ENABLED", false),
            oracle_model: env::var("ORACLE_MODEL").ok(),
            gitlab_token: env::var("GITLAB_TOKEN").ok(),
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_common_truthy_values() {
        std::env::set_var("CODEMESH_TEST_FLAG", "true");
        assert!(env_bool("CODEMESH_TEST_FLAG", false));
        std::env::set_var("CODEMESH_TEST_FLAG", "0");
        assert!(!env_bool("CODEMESH_TEST_FLAG", true));
        std::env::remove_var("CODEMESH_TEST_FLAG");
        assert!(env_bool("CODEMESH_TEST_FLAG", true));
    }
}
