//! Bearer JWT validation, gated by `AUTH_ENABLED`/`AUTH_ISSUER_URL`/`AUTH_AUDIENCE`.
//! Extracts `Authorization: Bearer <token>`, validates against the
//! issuer's JWKS, and injects a [`Principal`] into request extensions.
//! Disabled entirely (no middleware layer added) when `AUTH_ENABLED` is
//! false, matching a single-tenant local/dev deployment.

use std::collections::HashMap;
use std::sync::RwLock;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use codemesh_core::error::ErrorCode;
use codemesh_core::principal::Principal;

use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Lazily fetches and caches an issuer's JWKS by key id. One instance is
/// shared across the server; `AppState::auth` is `None` entirely when
/// `AUTH_ENABLED=false`.
pub struct JwksValidator {
    issuer_url: String,
    audience: Option<String>,
    http: reqwest::Client,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl JwksValidator {
    pub fn new(issuer_url: String, audience: Option<String>) -> Self {
        Self {
            issuer_url,
            audience,
            http: reqwest::Client::new(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, anyhow::Error> {
        if let Some(key) = self.keys.read().unwrap().get(kid) {
            return Ok(key.clone());
        }
        self.refresh_keys().await?;
        self.keys
            .read()
            .unwrap()
            .get(kid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown signing key {kid}"))
    }

    async fn refresh_keys(&self) -> Result<(), anyhow::Error> {
        let jwks_uri = format!(
            "{}/.well-known/jwks.json",
            self.issuer_url.trim_end_matches('/')
        );
        let body: JwksResponse = self.http.get(&jwks_uri).send().await?.json().await?;
        let mut keys = self.keys.write().unwrap();
        for jwk in body.keys {
            if let Ok(key) = DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                keys.insert(jwk.kid, key);
            }
        }
        Ok(())
    }

    pub async fn validate(&self, token: &str) -> Result<Principal, anyhow::Error> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or_else(|| anyhow::anyhow!("token has no kid"))?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer_url]);
        if let Some(audience) = &self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        let data = decode::<Claims>(token, &key, &validation)?;
        let scopes = data
            .claims
            .scope
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(Principal {
            tenant_id: codemesh_core::ids::TenantId::new(),
            subject: data.claims.sub,
            scopes,
            roles: data.claims.roles.into_iter().collect(),
        })
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(validator) = &state.auth else {
        return Ok(next.run(req).await);
    };

    let unauthorized = |message: &str| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": ErrorCode::Unauthorized, "message": message}})),
        )
            .into_response()
    };

    let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return Err(unauthorized("missing or malformed Authorization header"));
    };

    match validator.validate(token).await {
        Ok(mut principal) => {
            // This deployment serves one tenant; the
            // JWT only needs to authenticate the caller, not select a
            // tenant, so the resolved default overrides whatever
            // placeholder `validate` produced.
            principal.tenant_id = state.default_tenant;
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(err) => {
            tracing::warn!(error = %err, "bearer token rejected");
            Err(unauthorized("invalid token"))
        }
    }
}
