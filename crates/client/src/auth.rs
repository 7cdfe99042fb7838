//! Authentication
//!
//! Produces a usable credential for the next request. Three paths, in
//! precedence order: a configured basic-auth credential (no network I/O), a
//! cached session token (no network I/O, deprecated), or a fresh login via
//! `GET {base_path}/authenticate`. Only the login path retries, and only on
//! 503, with an explicit bounded loop and a local attempt counter so racing
//! calls cannot interfere with each other's budgets.

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::GrazeConfig;
use crate::error::GrazeError;
use crate::outcome::classify;
use crate::request::{header_value, RequestDescriptor};
use crate::session::SessionState;
use crate::transport::TransportAgent;

/// The credential a request goes out with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Per-request basic auth (current scheme).
    Basic(crate::config::BasicCredential),
    /// Session token issued by `/authenticate` (deprecated scheme).
    Token(String),
}

/// Ensure a valid credential exists: cached, reused, or freshly obtained.
pub async fn ensure_credential(
    config: &GrazeConfig,
    session: &Mutex<SessionState>,
    agent: &TransportAgent,
) -> Result<Credential, GrazeError> {
    if let Some(basic) = &config.basic_auth {
        debug!(username = %basic.username, "using configured basic auth");
        return Ok(Credential::Basic(basic.clone()));
    }

    // Lock is released before any login I/O: two racing unauthenticated
    // calls may both log in, which is redundant but harmless.
    let cached = session.lock().token().map(str::to_string);
    if let Some(token) = cached {
        warn!("session token authentication is deprecated since 6.1.0; configure basic auth instead");
        return Ok(Credential::Token(token));
    }

    let mut attempt: u32 = 0;
    loop {
        match issue_login(config, agent).await {
            Ok(token) => {
                session.lock().store_token(token.clone());
                debug!("login succeeded, token cached");
                return Ok(Credential::Token(token));
            }
            Err(err) => {
                if err.status() != Some(503) {
                    session.lock().record_login_attempts(attempt);
                    return Err(auth_failure(err));
                }
                if attempt >= config.retry {
                    warn!(attempts = attempt, budget = config.retry, "login retry budget exhausted");
                    session.lock().record_login_attempts(attempt);
                    return Err(auth_failure(err));
                }
                attempt += 1;
                warn!(attempt, budget = config.retry, "authenticate got 503, retrying");
                let delay = backoff_delay(config.login_backoff, attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// One login round trip. The call itself is anonymous: credentials travel in
/// the query string, per the legacy contract.
async fn issue_login(config: &GrazeConfig, agent: &TransportAgent) -> Result<String, GrazeError> {
    let descriptor = login_descriptor(config)?;
    let raw = agent.send(descriptor).await?;
    let body = classify(raw).into_result()?;

    body.get("auth_token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GrazeError::Authentication {
            status: 200,
            message: "login response carried no auth_token".into(),
        })
}

fn login_descriptor(config: &GrazeConfig) -> Result<RequestDescriptor, GrazeError> {
    let mut url = Url::parse(&format!("{}{}/authenticate", config.origin(), config.base_path))
        .map_err(|err| GrazeError::Config(format!("invalid login URL: {err}")))?;
    url.query_pairs_mut()
        .append_pair("username", &config.username)
        .append_pair("password", &config.password);

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(ACCEPT, header_value(&config.headers.accept)?);
    headers.insert(CONTENT_TYPE, header_value(&config.headers.content_type)?);

    Ok(RequestDescriptor { method: Method::GET, url, headers, body: None, basic_auth: None })
}

/// Fold a classified login error into the authentication-failure contract,
/// keeping the upstream status and message. Connection failures stay as
/// they are: no response was ever received.
fn auth_failure(err: GrazeError) -> GrazeError {
    match err {
        GrazeError::Application { status, message, .. } => {
            GrazeError::Authentication { status, message }
        }
        GrazeError::Transport { status, status_text } => {
            GrazeError::Authentication { status, message: status_text }
        }
        other => other,
    }
}

fn backoff_delay(base: Duration, retry_number: u32) -> Duration {
    let shift = retry_number.saturating_sub(1).min(8);
    base.saturating_mul(1u32 << shift)
}
