//! Probabilistic proxy selection for outbound requests.
//!
//! [`ProxySelector::select`] flips a weighted coin: heads downloads a fresh
//! proxy list and picks one endpoint at random, tails routes directly. There
//! is no retry; an unreachable or empty list is returned as an error.

use crate::domain::error::{FetchError, FetchResult};
use crate::ports::proxy_port::ProxySource;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_PROBABILITY: f64 = 0.5;
pub const DEFAULT_SCHEME: &str = "http";

/// A single scheme-to-endpoint mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyRoute {
    pub scheme: String,
    pub endpoint: String,
}

impl ProxyRoute {
    pub fn new(scheme: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint as a URL, `http://` prefixed when the list gave `ip:port`.
    pub fn url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

pub struct ProxySelector {
    source: Option<Box<dyn ProxySource>>,
    probability: f64,
    scheme: String,
    rng: Mutex<StdRng>,
}

impl ProxySelector {
    pub fn new(source: Box<dyn ProxySource>, probability: f64) -> Self {
        Self {
            source: Some(source),
            probability: probability.clamp(0.0, 1.0),
            scheme: DEFAULT_SCHEME.to_string(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A selector that never routes through a proxy and never touches the network.
    pub fn disabled() -> Self {
        Self {
            source: None,
            probability: 0.0,
            scheme: DEFAULT_SCHEME.to_string(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Weighted coin flip: `Some(route)` with probability `p`, else `None`.
    pub fn select(&self) -> FetchResult<Option<ProxyRoute>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };

        let roll: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0.0..1.0);
        if roll >= self.probability {
            log::debug!("proxy coin flip {:.3} >= {:.3}: direct", roll, self.probability);
            return Ok(None);
        }

        log::debug!("proxy coin flip {:.3} < {:.3}: proxied", roll, self.probability);
        self.pick(source.as_ref(), true).map(Some)
    }

    /// Always obtains a fresh proxy when enabled: a random entry, or the
    /// first one when `random` is false.
    pub fn acquire(&self, random: bool) -> FetchResult<Option<ProxyRoute>> {
        match &self.source {
            Some(source) => self.pick(source.as_ref(), random).map(Some),
            None => Ok(None),
        }
    }

    fn pick(&self, source: &dyn ProxySource, random: bool) -> FetchResult<ProxyRoute> {
        let endpoints = source.fetch_proxies()?;
        let chosen = if random {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            endpoints.choose(&mut *rng).cloned()
        } else {
            endpoints.first().cloned()
        };

        chosen
            .map(|endpoint| ProxyRoute::new(self.scheme.clone(), endpoint))
            .ok_or_else(|| FetchError::Proxy {
                reason: "proxy list is empty".into(),
            })
    }
}
