//! Transport agent
//!
//! Owns the TLS-configured HTTP client so repeated calls do not re-derive
//! trust settings. One agent is built per distinct TLS snapshot (trust mode,
//! CA, client identity, proxy) and retained for the lifetime of the client;
//! rebuilding it per call is a measurable regression.

use reqwest::{Certificate, Client, Identity, Proxy};
use tracing::{debug, warn};

use crate::config::GrazeConfig;
use crate::error::GrazeError;
use crate::outcome::{status_text, RawResponse};
use crate::request::RequestDescriptor;

/// The slice of the configuration that forces an agent rebuild when changed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TlsSnapshot {
    reject_unauthorized: bool,
    ca_cert: String,
    cert: String,
    key: String,
    use_proxy: bool,
    proxy_host: String,
    proxy_port: u16,
}

impl TlsSnapshot {
    fn of(config: &GrazeConfig) -> Self {
        Self {
            reject_unauthorized: config.reject_unauthorized,
            ca_cert: config.ca_cert.clone(),
            cert: config.cert.clone(),
            key: config.key.clone(),
            use_proxy: config.use_proxy,
            proxy_host: config.proxy_host.clone(),
            proxy_port: config.proxy_port,
        }
    }
}

/// Reusable TLS-aware connection object encapsulating trust and proxy
/// settings.
#[derive(Debug)]
pub struct TransportAgent {
    client: Client,
    snapshot: TlsSnapshot,
}

impl TransportAgent {
    /// Build an agent bound to the TLS parameters of `config`.
    pub fn new(config: &GrazeConfig) -> Result<Self, GrazeError> {
        let mut builder = Client::builder();

        if !config.reject_unauthorized {
            warn!(
                "certificate validation is disabled; any server certificate \
                 will be accepted"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        if !config.ca_cert.is_empty() {
            let ca = Certificate::from_pem(config.ca_cert.as_bytes())
                .map_err(|err| GrazeError::Config(format!("invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(ca);
        }

        if config.has_client_identity() {
            let mut pem = Vec::with_capacity(config.key.len() + config.cert.len() + 1);
            pem.extend_from_slice(config.key.as_bytes());
            pem.push(b'\n');
            pem.extend_from_slice(config.cert.as_bytes());
            let identity = Identity::from_pem(&pem)
                .map_err(|err| GrazeError::Config(format!("invalid client identity: {err}")))?;
            builder = builder.identity(identity);
        }

        if config.use_proxy && !config.proxy_host.is_empty() {
            let proxy_url = format!("http://{}:{}", config.proxy_host, config.proxy_port);
            debug!(proxy = %proxy_url, "tunneling through forward proxy");
            let proxy = Proxy::all(&proxy_url)
                .map_err(|err| GrazeError::Config(format!("invalid proxy {proxy_url}: {err}")))?;
            builder = builder.proxy(proxy);
        } else {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|err| GrazeError::Config(format!("failed to build transport: {err}")))?;

        Ok(Self { client, snapshot: TlsSnapshot::of(config) })
    }

    /// Whether this agent is still bound to the TLS parameters of `config`.
    pub fn matches(&self, config: &GrazeConfig) -> bool {
        self.snapshot == TlsSnapshot::of(config)
    }

    /// Transmit a built request and accumulate the response.
    ///
    /// A network-level failure before any response is received maps to
    /// [`GrazeError::Connection`]. Status classification happens upstream.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<RawResponse, GrazeError> {
        let RequestDescriptor { method, url, headers, body, basic_auth } = descriptor;

        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(basic) = basic_auth {
            request = request.basic_auth(basic.username, Some(basic.password));
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| GrazeError::Connection(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| GrazeError::Connection(format!("reading response body: {err}")))?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status_text(status),
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_matches_its_own_snapshot() {
        let config = GrazeConfig::default();
        let agent = TransportAgent::new(&config).unwrap();
        assert!(agent.matches(&config));
    }

    #[test]
    fn non_tls_change_keeps_agent() {
        let config = GrazeConfig::default();
        let agent = TransportAgent::new(&config).unwrap();
        let changed = GrazeConfig { retry: 9, hostname: "elsewhere".into(), ..config };
        assert!(agent.matches(&changed));
    }

    #[test]
    fn tls_change_invalidates_agent() {
        let config = GrazeConfig::default();
        let agent = TransportAgent::new(&config).unwrap();
        let changed = GrazeConfig { reject_unauthorized: true, ..config };
        assert!(!agent.matches(&changed));
    }

    struct LogWriter(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn disabled_certificate_validation_logs_a_warning() {
        let buffer = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let writer = std::sync::Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .without_time()
            .with_writer(move || LogWriter(std::sync::Arc::clone(&writer)))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            // default trust mode accepts any certificate
            TransportAgent::new(&GrazeConfig::default()).unwrap();
        });
        let permissive = String::from_utf8(buffer.lock().clone()).unwrap();
        assert!(
            permissive.contains("certificate validation is disabled"),
            "missing trust-mode warning in: {permissive}"
        );

        buffer.lock().clear();
        let writer = std::sync::Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .without_time()
            .with_writer(move || LogWriter(std::sync::Arc::clone(&writer)))
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let strict = GrazeConfig { reject_unauthorized: true, ..Default::default() };
            TransportAgent::new(&strict).unwrap();
        });
        let strict = String::from_utf8(buffer.lock().clone()).unwrap();
        assert!(strict.is_empty(), "unexpected warnings in strict mode: {strict}");
    }

    #[test]
    fn garbage_ca_pem_is_a_config_error() {
        let config = GrazeConfig { ca_cert: "not a pem".into(), ..Default::default() };
        let err = TransportAgent::new(&config).unwrap_err();
        assert!(matches!(err, GrazeError::Config(_)));
    }

    #[test]
    fn proxy_settings_are_part_of_the_snapshot() {
        let config = GrazeConfig::default();
        let agent = TransportAgent::new(&config).unwrap();
        let proxied = GrazeConfig {
            use_proxy: true,
            proxy_host: "proxy.example.com".into(),
            proxy_port: 3128,
            ..config
        };
        assert!(!agent.matches(&proxied));
        // and a proxied agent can actually be constructed
        assert!(TransportAgent::new(&proxied).is_ok());
    }
}
