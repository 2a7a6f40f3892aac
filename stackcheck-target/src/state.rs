//! Mutable state owned by one target service instance.
//!
//! Handlers and the UDP receiver share it through `Arc<TargetState>`.
//! Its lifetime is the process, not the whole compliance run.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use crate::error::TargetError;

/// Shared handle passed to handlers.
pub type SharedState = std::sync::Arc<TargetState>;

/// UDP last value, scale-checker registrations, and forwarding client.
#[derive(Debug)]
pub struct TargetState {
    udp_value: RwLock<String>,
    /// Distinct ids in first-seen order.
    scale_ids: Mutex<Vec<String>>,
    volumes_dir: PathBuf,
    http: reqwest::Client,
}

impl TargetState {
    /// Create state for a process serving files from `volumes_dir`.
    pub fn new(
        volumes_dir: impl Into<PathBuf>,
        forward_timeout: Duration,
    ) -> Result<Self, TargetError> {
        let http = reqwest::Client::builder()
            .timeout(forward_timeout)
            .build()
            .map_err(|e| TargetError::Config {
                field: "forward_timeout_secs".to_owned(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            udp_value: RwLock::new(String::new()),
            scale_ids: Mutex::new(Vec::new()),
            volumes_dir: volumes_dir.into(),
            http,
        })
    }

    /// Last value received over UDP (empty until the first datagram).
    pub fn udp_value(&self) -> String {
        self.udp_value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the UDP value. Last writer wins.
    pub fn set_udp_value(&self, value: impl Into<String>) {
        *self
            .udp_value
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    /// Register `id` if not seen before and return the distinct count.
    ///
    /// The membership test and the insert happen under one lock so that
    /// concurrent replicas cannot double-register. An empty id is not stored.
    pub fn register_scale_id(&self, id: &str) -> usize {
        let mut ids = self
            .scale_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_owned());
        }
        ids.len()
    }

    /// Number of distinct registered ids.
    pub fn scale_count(&self) -> usize {
        self.scale_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Registered ids in first-seen order.
    pub fn scale_ids(&self) -> Vec<String> {
        self.scale_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Base directory for `/volumefile`.
    pub fn volumes_dir(&self) -> &Path {
        &self.volumes_dir
    }

    /// Client used for `/ping` forwarding.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
