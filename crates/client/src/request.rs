//! Request building
//!
//! Turns a (method, path, body) tuple plus the current configuration and
//! credential into a ready-to-send [`RequestDescriptor`]. Descriptors are
//! built fresh per call and never shared: headers are call-scoped, so a
//! POST's `content-length` can never leak into a later GET.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::Credential;
use crate::config::{BasicCredential, GrazeConfig};
use crate::error::GrazeError;

/// A ready-to-send request: target, method, call-scoped headers, serialized
/// body, and the basic-auth credential when that scheme is active.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Call-scoped headers, including computed `content-length` for bodies.
    pub headers: HeaderMap,
    /// Serialized JSON body, present for POST-shaped requests.
    pub body: Option<Vec<u8>>,
    /// Basic-auth credential to attach, when configured.
    pub basic_auth: Option<BasicCredential>,
}

/// Build a descriptor for `method` on `path` (which already includes the
/// base path prefix).
///
/// In legacy-token mode the token is embedded in the JSON body (POST) or the
/// query string (GET) for compatibility with older deployments; under basic
/// auth the credential rides on the descriptor instead and no token is sent.
///
/// Fails with [`GrazeError::Serialization`] before any I/O if `body` cannot
/// be encoded.
pub fn build<B: Serialize>(
    method: Method,
    path: &str,
    body: Option<&B>,
    config: &GrazeConfig,
    credential: &Credential,
) -> Result<RequestDescriptor, GrazeError> {
    let mut url = Url::parse(&format!("{}{}", config.origin(), path))
        .map_err(|err| GrazeError::Config(format!("invalid request URL: {err}")))?;

    let body_value = body
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| GrazeError::Serialization(err.to_string()))?;

    let is_post = method == Method::POST;

    let body_bytes = if is_post {
        let mut effective = body_value.unwrap_or_else(|| Value::Object(Default::default()));
        if let Credential::Token(token) = credential {
            if let Value::Object(map) = &mut effective {
                map.insert("auth_token".into(), Value::String(token.clone()));
            }
        }
        Some(
            serde_json::to_vec(&effective)
                .map_err(|err| GrazeError::Serialization(err.to_string()))?,
        )
    } else {
        if let Credential::Token(token) = credential {
            url.query_pairs_mut().append_pair("auth_token", token);
        }
        None
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value(&config.headers.accept)?);
    headers.insert(CONTENT_TYPE, header_value(&config.headers.content_type)?);
    if let Some(bytes) = &body_bytes {
        // exact byte length of the serialized body
        headers.insert(CONTENT_LENGTH, header_value(&bytes.len().to_string())?);
    }

    let basic_auth = match credential {
        Credential::Basic(basic) => Some(basic.clone()),
        Credential::Token(_) => None,
    };

    Ok(RequestDescriptor { method, url, headers, body: body_bytes, basic_auth })
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue, GrazeError> {
    HeaderValue::from_str(value)
        .map_err(|err| GrazeError::Config(format!("invalid header value {value:?}: {err}")))
}
