use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;

use crate::types::constants::{HEALTH_PROBE_INTERVAL, HEALTH_PROBE_TIMEOUT};

/// Last-known reachability of the REST API, updated optimistically as
/// requests succeed or exhaust their retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    fn as_u8(self) -> u8 {
        match self {
            Self::Connected => 0,
            Self::Disconnected => 1,
            Self::Error => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connected,
            2 => Self::Error,
            _ => Self::Disconnected,
        }
    }
}

/// Response shape of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Owned, injectable connection-status context.
///
/// One instance per client (shareable between several), so parallel tests
/// never observe each other's state. Fields are individually synchronized
/// because callers may touch them from any runtime thread.
#[derive(Debug)]
pub struct HealthState {
    status: AtomicU8,
    last_probe: Mutex<Option<Instant>>,
    probe_in_flight: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(ConnectionStatus::Disconnected.as_u8()),
            last_probe: Mutex::new(None),
            probe_in_flight: AtomicBool::new(false),
        }
    }

    /// Current flag value.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status.load(Ordering::Relaxed))
    }

    pub(crate) fn mark(&self, status: ConnectionStatus) {
        self.status.store(status.as_u8(), Ordering::Relaxed);
    }

    /// Kicks off a detached health probe if one hasn't run recently.
    ///
    /// The probe refreshes the status flag in the background; it never delays
    /// the request that triggered it, and its failures stay its own.
    pub(crate) fn maybe_probe(health: &Arc<Self>, http: reqwest::Client, base_url: String) {
        {
            let Ok(mut last) = health.last_probe.lock() else {
                return;
            };
            if let Some(at) = *last
                && at.elapsed() < HEALTH_PROBE_INTERVAL
            {
                return;
            }
            *last = Some(Instant::now());
        }

        if health.probe_in_flight.swap(true, Ordering::AcqRel) {
            return;
        }

        let health = Arc::clone(health);
        tokio::spawn(async move {
            let url = format!("{}/health", base_url.trim_end_matches('/'));
            let outcome = http
                .get(&url)
                .timeout(HEALTH_PROBE_TIMEOUT)
                .send()
                .await;

            match outcome {
                Ok(response) if response.status().is_success() => {
                    health.mark(ConnectionStatus::Connected);
                }
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "health probe rejected");
                    health.mark(ConnectionStatus::Disconnected);
                }
                Err(error) => {
                    tracing::debug!("health probe failed: {error}");
                    health.mark(ConnectionStatus::Disconnected);
                }
            }
            health.probe_in_flight.store(false, Ordering::Release);
        });
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
