//! The client dispatcher
//!
//! [`GrazeClient`] is the single funnel every remote call passes through:
//! authenticate, build, transmit, classify. Endpoint wrappers are one-liners
//! over [`GrazeClient::invoke`].

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth;
use crate::config::{ConfigOverrides, GrazeConfig};
use crate::error::GrazeError;
use crate::outcome::classify;
use crate::request;
use crate::session::SessionState;
use crate::transport::TransportAgent;

/// Client for a session-authenticated JSON-over-HTTPS API.
///
/// Owns the connection configuration, the session state, and the transport
/// agent. Cheap to share behind an [`Arc`]; calls may overlap freely.
pub struct GrazeClient {
    config: Mutex<GrazeConfig>,
    session: Mutex<SessionState>,
    agent: Mutex<Arc<TransportAgent>>,
}

impl GrazeClient {
    /// Create a client bound to `config`.
    ///
    /// A legacy `auth_token` in the configuration seeds the session cache.
    pub fn new(config: GrazeConfig) -> Result<Self, GrazeError> {
        let agent = TransportAgent::new(&config)?;
        let session = SessionState::new(Some(config.auth_token.clone()));
        Ok(Self {
            config: Mutex::new(config),
            session: Mutex::new(session),
            agent: Mutex::new(Arc::new(agent)),
        })
    }

    /// Snapshot of the current configuration.
    pub fn get_ops(&self) -> GrazeConfig {
        self.config.lock().clone()
    }

    /// Merge a partial override set into the configuration, returning the
    /// number of fields updated.
    ///
    /// Overriding `auth_token` replaces (or, when empty, clears) the cached
    /// session token. The transport agent is rebuilt only if a TLS-relevant
    /// field changed.
    pub fn set_ops(&self, overrides: ConfigOverrides) -> Result<usize, GrazeError> {
        let token_override = overrides.auth_token.clone();

        let (updated, snapshot) = {
            let mut config = self.config.lock();
            let updated = overrides.apply(&mut config);
            (updated, config.clone())
        };
        debug!(updated, "configuration merged");

        if let Some(token) = token_override {
            let mut session = self.session.lock();
            if token.is_empty() {
                session.invalidate();
            } else {
                session.store_token(token);
            }
        }

        let mut agent = self.agent.lock();
        if !agent.matches(&snapshot) {
            debug!("transport parameters changed, rebuilding agent");
            *agent = Arc::new(TransportAgent::new(&snapshot)?);
        }

        Ok(updated)
    }

    /// Whether a session token is currently cached.
    pub fn has_session_token(&self) -> bool {
        self.session.lock().token().is_some()
    }

    /// Invoke a remote operation.
    ///
    /// `path` is the operation path relative to the configured base path,
    /// e.g. `/getAlertDetails?alert_id=7`. The credential is resolved first
    /// (cached, reused, or freshly obtained with login retry), the request
    /// is built fresh for this call, and the response is classified exactly
    /// once. Any classified error invalidates the cached session token so
    /// the next call re-authenticates from scratch.
    pub async fn invoke<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, GrazeError> {
        let config = self.get_ops();
        let agent = self.agent_for(&config)?;

        let credential = match auth::ensure_credential(&config, &self.session, &agent).await {
            Ok(credential) => credential,
            Err(err) => {
                self.note_failure(&err);
                return Err(err);
            }
        };

        let full_path = format!("{}{}", config.base_path, path);
        let descriptor = request::build(method, &full_path, body, &config, &credential)?;

        let result = match agent.send(descriptor).await {
            Ok(raw) => classify(raw).into_result(),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            self.note_failure(err);
        }
        result
    }

    /// GET-shaped invocation with no body.
    pub async fn get(&self, path: &str) -> Result<Value, GrazeError> {
        self.invoke::<Value>(Method::GET, path, None).await
    }

    /// POST-shaped invocation with a JSON body.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, GrazeError> {
        self.invoke(Method::POST, path, Some(body)).await
    }

    /// The long-lived agent for this configuration, rebuilt only when the
    /// TLS-relevant slice of the configuration has changed underneath it.
    fn agent_for(&self, config: &GrazeConfig) -> Result<Arc<TransportAgent>, GrazeError> {
        let mut agent = self.agent.lock();
        if !agent.matches(config) {
            *agent = Arc::new(TransportAgent::new(config)?);
        }
        Ok(Arc::clone(&agent))
    }

    fn note_failure(&self, err: &GrazeError) {
        if err.invalidates_session() {
            debug!("classified error, dropping cached session token");
            self.session.lock().invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::BasicCredential;

    fn config_for(server: &MockServer) -> GrazeConfig {
        let uri = url::Url::parse(&server.uri()).unwrap();
        GrazeConfig {
            hostname: uri.host_str().unwrap_or("127.0.0.1").to_string(),
            port: uri.port().unwrap_or(80),
            secure: false,
            login_backoff: std::time::Duration::from_millis(1),
            ..Default::default()
        }
    }

    async fn mount_login(server: &MockServer, token: &str) {
        Mock::given(method("GET"))
            .and(path("/graze/v1/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"auth_token": token})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn invoke_logs_in_then_sends_token_in_query() {
        let server = MockServer::start().await;
        mount_login(&server, "abc").await;
        Mock::given(method("GET"))
            .and(path("/graze/v1/getSystemStatus"))
            .and(query_param("auth_token", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "green"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GrazeClient::new(config_for(&server)).unwrap();
        let body = client.get("/getSystemStatus").await.unwrap();

        assert_eq!(body, json!({"status": "green"}));
        assert!(client.has_session_token());
    }

    #[tokio::test]
    async fn second_call_reuses_cached_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/graze/v1/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"auth_token": "abc"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/graze/v1/getSystemStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let client = GrazeClient::new(config_for(&server)).unwrap();
        client.get("/getSystemStatus").await.unwrap();
        client.get("/getSystemStatus").await.unwrap();
    }

    #[tokio::test]
    async fn basic_auth_rides_the_header_not_the_body() {
        let server = MockServer::start().await;
        // ops:secret
        Mock::given(method("POST"))
            .and(path("/graze/v1/closeAlert"))
            .and(header("Authorization", "Basic b3BzOnNlY3JldA=="))
            .and(body_json(json!({"alert_id": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"description": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.basic_auth = Some(BasicCredential::new("ops", "secret"));
        let client = GrazeClient::new(config).unwrap();

        let body = client.post("/closeAlert", &json!({"alert_id": 42})).await.unwrap();
        assert_eq!(body, json!({"description": "ok"}));
        // basic auth never caches a session token
        assert!(!client.has_session_token());
    }

    #[tokio::test]
    async fn application_error_clears_token_and_forces_relogin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/graze/v1/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"auth_token": "abc"})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/graze/v1/getAlertDetails"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"message": "Invalid alert_id", "statusMessage": "Bad Request"}),
            ))
            .mount(&server)
            .await;

        let client = GrazeClient::new(config_for(&server)).unwrap();

        let err = client.get("/getAlertDetails?alert_id=0").await.unwrap_err();
        match &err {
            GrazeError::Application { status, message, status_message } => {
                assert_eq!(*status, 400);
                assert_eq!(message, "Invalid alert_id");
                assert_eq!(status_message, "Bad Request");
            }
            other => panic!("expected application error, got {other:?}"),
        }
        assert!(!client.has_session_token());

        // next call must log in again (expect(2) on the login mock)
        let _ = client.get("/getAlertDetails?alert_id=0").await;
    }

    #[tokio::test]
    async fn transport_error_surfaces_status_and_text() {
        let server = MockServer::start().await;
        mount_login(&server, "abc").await;
        Mock::given(method("GET"))
            .and(path("/graze/v1/getSystemSummary"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = GrazeClient::new(config_for(&server)).unwrap();
        let err = client.get("/getSystemSummary").await.unwrap_err();

        match err {
            GrazeError::Transport { status, status_text } => {
                assert_eq!(status, 502);
                assert_eq!(status_text, "Bad Gateway");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_classified_and_clears_token() {
        // closed port: connection refused before any response
        let config = GrazeConfig {
            hostname: "127.0.0.1".into(),
            port: 1,
            secure: false,
            auth_token: "seeded".into(),
            ..Default::default()
        };
        let client = GrazeClient::new(config).unwrap();
        assert!(client.has_session_token());

        let err = client.get("/getSystemStatus").await.unwrap_err();
        assert!(matches!(err, GrazeError::Connection(_)));
        assert!(!client.has_session_token());
    }

    #[tokio::test]
    async fn serialization_failure_keeps_session_token() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.auth_token = "seeded".into();
        let client = GrazeClient::new(config).unwrap();

        let body: std::collections::HashMap<Vec<u8>, u8> =
            [(vec![1u8], 1u8)].into_iter().collect();
        let err = client.post("/closeAlert", &body).await.unwrap_err();

        assert!(matches!(err, GrazeError::Serialization(_)));
        assert!(client.has_session_token());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_ops_replaces_and_clears_session_token() {
        let server = MockServer::start().await;
        let client = GrazeClient::new(config_for(&server)).unwrap();
        assert!(!client.has_session_token());

        let updated = client
            .set_ops(ConfigOverrides { auth_token: Some("tok".into()), ..Default::default() })
            .unwrap();
        assert_eq!(updated, 1);
        assert!(client.has_session_token());

        client
            .set_ops(ConfigOverrides { auth_token: Some(String::new()), ..Default::default() })
            .unwrap();
        assert!(!client.has_session_token());
    }

    #[tokio::test]
    async fn get_ops_reflects_merged_configuration() {
        let server = MockServer::start().await;
        let client = GrazeClient::new(config_for(&server)).unwrap();

        client
            .set_ops(ConfigOverrides {
                retry: Some(7),
                base_path: Some("/graze/v2".into()),
                ..Default::default()
            })
            .unwrap();

        let ops = client.get_ops();
        assert_eq!(ops.retry, 7);
        assert_eq!(ops.base_path, "/graze/v2");
    }
}
