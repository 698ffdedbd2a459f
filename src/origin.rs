//! Per-experiment CORS origin resolution
//!
//! Every participant-scoped request looks up its experiment just in time and
//! allows exactly one cross-origin caller: the scheme and host of the
//! experiment's declared url, or anyone (`*`) when no url is declared.
//!
//! ```text
//! "https://Lab.Example.org:8443/stroop?x=1"  →  "https://lab.example.org"
//! None                                       →  "*"
//! "lab.example.org"                          →  MalformedOrigin
//! ```

use std::sync::Arc;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Uri};

use crate::store::DocumentStore;
use crate::{Error, Result};

/// Methods participant endpoints accept cross-origin.
pub const ALLOW_METHODS: &str = "GET,POST";

/// Request headers participant endpoints accept cross-origin.
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Origin permitted to read cross-origin responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigin {
    /// Any origin (`*`).
    Any,
    /// Exactly `scheme://host`.
    Exact(String),
}

impl AllowedOrigin {
    /// Derive the allowed origin from an experiment's declared url.
    ///
    /// A missing or blank url allows any origin. Otherwise the url must be
    /// absolute; port, path, query and fragment are dropped and scheme and
    /// host are lowercased.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedOrigin` if the url does not parse or lacks a
    /// scheme or host.
    pub fn from_declared_url(url: Option<&str>) -> Result<Self> {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(Self::Any);
        };

        let malformed = |reason: String| Error::MalformedOrigin {
            url: url.to_string(),
            reason,
        };

        let uri: Uri = url.parse().map_err(|e| malformed(format!("{e}")))?;
        let scheme = uri
            .scheme_str()
            .ok_or_else(|| malformed("missing scheme".to_string()))?;
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| malformed("missing host".to_string()))?;

        Ok(Self::Exact(format!(
            "{}://{}",
            scheme.to_ascii_lowercase(),
            host.to_ascii_lowercase()
        )))
    }

    /// Header value form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "*",
            Self::Exact(origin) => origin,
        }
    }
}

impl std::fmt::Display for AllowedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CORS response headers for one participant-scoped request.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    origin: AllowedOrigin,
    origin_value: HeaderValue,
}

impl CorsHeaders {
    /// Build the header set for an allowed origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedOrigin` if the origin is not a valid header value.
    pub fn new(origin: AllowedOrigin) -> Result<Self> {
        let origin_value =
            HeaderValue::from_str(origin.as_str()).map_err(|e| Error::MalformedOrigin {
                url: origin.as_str().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            origin,
            origin_value,
        })
    }

    /// The origin these headers allow.
    #[must_use]
    pub const fn allowed_origin(&self) -> &AllowedOrigin {
        &self.origin
    }

    /// Write allow-origin, allow-methods, allow-headers and `Vary: Origin`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin_value.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Resolves the CORS policy of an experiment on demand.
pub struct OriginResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for OriginResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> OriginResolver<S> {
    /// Create a resolver reading experiments from `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch the experiment and derive its CORS headers.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the experiment doesn't exist
    /// - `Error::MalformedOrigin` if its declared url is unusable
    /// - any store error from the fetch
    pub async fn resolve(&self, experiment_id: &str) -> Result<CorsHeaders> {
        let experiment = self
            .store
            .get_experiment(experiment_id)
            .await?
            .ok_or_else(|| Error::experiment_not_found(experiment_id))?;

        let origin = AllowedOrigin::from_declared_url(experiment.url())?;
        tracing::debug!(experiment_id, origin = %origin, "resolved allowed origin");
        CorsHeaders::new(origin)
    }
}
