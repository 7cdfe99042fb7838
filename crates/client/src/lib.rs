//! # graze-client
//!
//! Resilient client dispatcher for the Graze JSON-over-HTTPS API.
//!
//! Every remote call funnels through one path: the authenticator produces a
//! credential (configured basic auth, a cached session token, or a fresh
//! login with bounded 503 retry), the request builder turns the operation
//! into a call-scoped descriptor, the transport agent transmits it over its
//! reusable TLS connection parameters, and the response is classified into a
//! uniform success/error contract. Any classified error drops the cached
//! session token so the next call re-authenticates from scratch.
//!
//! ```no_run
//! use graze_client::{BasicCredential, GrazeClient, GrazeConfig};
//!
//! # async fn run() -> Result<(), graze_client::GrazeError> {
//! let client = GrazeClient::new(GrazeConfig {
//!     hostname: "moog.example.com".into(),
//!     port: 8443,
//!     basic_auth: Some(BasicCredential::new("graze", "graze")),
//!     ..Default::default()
//! })?;
//!
//! let details = client.get_alert_details(42).await?;
//! println!("{details}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod outcome;
pub mod request;
pub mod session;
pub mod transport;

// Re-export the public surface
pub use client::GrazeClient;
pub use config::{BasicCredential, ConfigOverrides, GrazeConfig, GrazeHeaders};
pub use endpoints::UserRef;
pub use error::GrazeError;
pub use outcome::ResponseOutcome;
pub use reqwest::Method;
