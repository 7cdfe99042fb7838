//! Connection configuration
//!
//! [`GrazeConfig`] is the per-client record of connection parameters. Each
//! call takes an owned snapshot of it, so a configuration change never
//! affects a request that is already in flight. Empty strings mean "unset"
//! for the optional PEM / proxy / token fields, mirroring the wire-level
//! configuration surface of older deployments.

use std::time::Duration;

/// Statically configured username/password pair sent with every request,
/// bypassing the login step entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredential {
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

impl BasicCredential {
    /// Build a credential from a username/password pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

/// Default headers attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrazeHeaders {
    /// `accept` header value.
    pub accept: String,
    /// `content-type` header value.
    pub content_type: String,
}

impl Default for GrazeHeaders {
    fn default() -> Self {
        Self { accept: "application/json".into(), content_type: "application/json".into() }
    }
}

/// Connection parameters for a [`GrazeClient`](crate::GrazeClient).
///
/// Exactly one of {basic auth, cached session token, anonymous login} is the
/// active authentication mode for any given call; `basic_auth`, when set,
/// always wins over a cached token.
#[derive(Debug, Clone, PartialEq)]
pub struct GrazeConfig {
    /// Server hostname.
    pub hostname: String,
    /// Server port.
    pub port: u16,
    /// Use HTTPS. Disable only for dev deployments behind a TLS terminator.
    pub secure: bool,
    /// Path prefix the API surface is rooted at.
    pub base_path: String,
    /// Login username for the legacy `/authenticate` flow.
    pub username: String,
    /// Login password for the legacy `/authenticate` flow.
    pub password: String,
    /// Extra login attempts permitted after a transient (503) failure.
    pub retry: u32,
    /// Base delay for login retry backoff; doubles per attempt.
    pub login_backoff: Duration,
    /// Verify the server certificate. When `false` any certificate is
    /// accepted, which disables the security guarantee of TLS.
    pub reject_unauthorized: bool,
    /// Trusted CA certificate, PEM. Empty = system roots.
    pub ca_cert: String,
    /// Client certificate, PEM. Empty = no client identity.
    pub cert: String,
    /// Client private key, PEM. Empty = no client identity.
    pub key: String,
    /// Tunnel all traffic through `proxy_host:proxy_port`.
    pub use_proxy: bool,
    /// Forward proxy hostname.
    pub proxy_host: String,
    /// Forward proxy port.
    pub proxy_port: u16,
    /// Default request headers.
    pub headers: GrazeHeaders,
    /// Current authentication scheme: per-request basic auth.
    pub basic_auth: Option<BasicCredential>,
    /// Legacy session token seed. Deprecated; prefer `basic_auth`.
    pub auth_token: String,
}

impl Default for GrazeConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".into(),
            port: 8080,
            secure: true,
            base_path: "/graze/v1".into(),
            username: "graze".into(),
            password: "graze".into(),
            retry: 3,
            login_backoff: Duration::from_millis(200),
            reject_unauthorized: false,
            ca_cert: String::new(),
            cert: String::new(),
            key: String::new(),
            use_proxy: false,
            proxy_host: String::new(),
            proxy_port: 0,
            headers: GrazeHeaders::default(),
            basic_auth: None,
            auth_token: String::new(),
        }
    }
}

impl GrazeConfig {
    /// Scheme + authority, e.g. `https://moog.example.com:8443`.
    pub fn origin(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.hostname, self.port)
    }

    /// Whether a client identity (cert + key) is configured.
    pub fn has_client_identity(&self) -> bool {
        !self.cert.is_empty() && !self.key.is_empty()
    }
}

/// Partial override set for [`GrazeConfig`], applied as a merge.
///
/// Unset fields leave the current value untouched. [`apply`](Self::apply)
/// reports how many fields changed so callers can log the merge.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// See [`GrazeConfig::hostname`].
    pub hostname: Option<String>,
    /// See [`GrazeConfig::port`].
    pub port: Option<u16>,
    /// See [`GrazeConfig::secure`].
    pub secure: Option<bool>,
    /// See [`GrazeConfig::base_path`].
    pub base_path: Option<String>,
    /// See [`GrazeConfig::username`].
    pub username: Option<String>,
    /// See [`GrazeConfig::password`].
    pub password: Option<String>,
    /// See [`GrazeConfig::retry`].
    pub retry: Option<u32>,
    /// See [`GrazeConfig::login_backoff`].
    pub login_backoff: Option<Duration>,
    /// See [`GrazeConfig::reject_unauthorized`].
    pub reject_unauthorized: Option<bool>,
    /// See [`GrazeConfig::ca_cert`].
    pub ca_cert: Option<String>,
    /// See [`GrazeConfig::cert`].
    pub cert: Option<String>,
    /// See [`GrazeConfig::key`].
    pub key: Option<String>,
    /// See [`GrazeConfig::use_proxy`].
    pub use_proxy: Option<bool>,
    /// See [`GrazeConfig::proxy_host`].
    pub proxy_host: Option<String>,
    /// See [`GrazeConfig::proxy_port`].
    pub proxy_port: Option<u16>,
    /// See [`GrazeConfig::headers`].
    pub headers: Option<GrazeHeaders>,
    /// See [`GrazeConfig::basic_auth`]. `Some(None)` clears basic auth.
    pub basic_auth: Option<Option<BasicCredential>>,
    /// See [`GrazeConfig::auth_token`].
    pub auth_token: Option<String>,
}

impl ConfigOverrides {
    /// Merge the set fields into `config`, returning the number updated.
    pub fn apply(self, config: &mut GrazeConfig) -> usize {
        let overrides = self;
        let mut updated = 0;
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = overrides.$field {
                        config.$field = value;
                        updated += 1;
                    }
                )*
            };
        }
        merge!(
            hostname,
            port,
            secure,
            base_path,
            username,
            password,
            retry,
            login_backoff,
            reject_unauthorized,
            ca_cert,
            cert,
            key,
            use_proxy,
            proxy_host,
            proxy_port,
            headers,
            basic_auth,
            auth_token,
        );
        updated
    }
}
