//! Upstream targets
//!
//! One [`UpstreamTarget`] per [`Upstream`], built once at startup. The
//! [`UpstreamSet`] lookup is total: every upstream identifier has a target.

use reqwest::Url;
use strangler_core::{Error as CoreError, Upstream};

/// Where an upstream lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Display name used in logs and error bodies
    pub name: String,
    /// Base URL (no trailing slash)
    base_url: String,
}

impl UpstreamTarget {
    /// Validate and normalize a base URL for `upstream`
    pub fn new(upstream: Upstream, base_url: &str) -> strangler_core::Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| CoreError::InvalidUpstreamUrl {
            upstream: upstream.name().to_string(),
            message: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CoreError::InvalidUpstreamUrl {
                upstream: upstream.name().to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(CoreError::InvalidUpstreamUrl {
                upstream: upstream.name().to_string(),
                message: "base URL must not carry a query or fragment".to_string(),
            });
        }

        Ok(Self {
            name: upstream.name().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the outbound URL: base URL + path + query, no rewriting
    pub fn build_url(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        }
    }
}

/// Lookup table from upstream identifier to target
#[derive(Debug, Clone)]
pub struct UpstreamSet {
    legacy: UpstreamTarget,
    movies: UpstreamTarget,
    events: UpstreamTarget,
}

impl UpstreamSet {
    pub fn new(monolith_url: &str, movies_url: &str, events_url: &str) -> strangler_core::Result<Self> {
        Ok(Self {
            legacy: UpstreamTarget::new(Upstream::Legacy, monolith_url)?,
            movies: UpstreamTarget::new(Upstream::MoviesNew, movies_url)?,
            events: UpstreamTarget::new(Upstream::Events, events_url)?,
        })
    }

    pub fn get(&self, upstream: Upstream) -> &UpstreamTarget {
        match upstream {
            Upstream::Legacy => &self.legacy,
            Upstream::MoviesNew => &self.movies,
            Upstream::Events => &self.events,
        }
    }
}
