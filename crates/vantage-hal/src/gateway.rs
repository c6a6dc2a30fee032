//! Gateway traits and link configuration for camera/FPGA sensors.
//!
//! Each physical sensor is an FPGA-backed smart camera reachable over one
//! network link. The FPGA tracks a marker in its own field of view and
//! exposes the result through named registers; the byte-level register
//! protocol lives behind [`SensorLink`] implementations and is of no
//! concern to the runtime.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vantage_types::VantageError;

/// A decoded register read: sub-key → pixel-pair payload.
///
/// A requested sub-key may legitimately be absent from the map (the FPGA
/// had nothing tracked that cycle); that is a transient condition, not an
/// error.
pub type RegisterMap = HashMap<String, Vec<(u32, u32)>>;

/// Default register holding the tracked marker's contour points.
pub const LOCATION_REGISTER: &str = "ACTUAL_LOCATION";

/// Default sub-key of the first (and currently only) tracker slot.
pub const LOCATION_KEY: &str = "1";

/// Connection settings for one sensor link, typically deserialized from a
/// per-sensor TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Stable identifier for this sensor, e.g. `"camera0"`. When loaded
    /// from a config file the file stem is used if the field is omitted.
    #[serde(default)]
    pub name: String,

    /// Hostname or IP address of the FPGA link.
    pub host: String,

    /// TCP port of the FPGA register server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Register polled each acquisition cycle.
    #[serde(default = "default_location_register")]
    pub location_register: String,

    /// Sub-key expected inside the polled register.
    #[serde(default = "default_location_key")]
    pub location_key: String,
}

fn default_port() -> u16 {
    36000
}

fn default_location_register() -> String {
    LOCATION_REGISTER.to_string()
}

fn default_location_key() -> String {
    LOCATION_KEY.to_string()
}

/// Factory half of the gateway: opens links from configuration.
///
/// Implementations decide what "open" means — a TCP connect plus FPGA
/// bring-up for real hardware, a script lookup for [`SimTransport`][crate::sim::SimTransport].
#[async_trait]
pub trait SensorTransport: Send + Sync {
    /// Open a link to the sensor described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Connection`] when the link cannot be
    /// established. The failure is fatal to the worker built on this
    /// link only, never to the rest of the fleet.
    async fn open(&self, config: &SensorConfig) -> Result<Box<dyn SensorLink>, VantageError>;
}

/// One open connection to a sensor. Owned exclusively by its worker; a
/// link is never shared across concurrent units.
#[async_trait]
pub trait SensorLink: Send {
    /// Stable identifier of the sensor behind this link.
    fn id(&self) -> &str;

    /// Poll a named register.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Hardware`] when the poll itself fails.
    /// A present map that lacks the expected sub-key is *not* an error.
    async fn get_register(&mut self, name: &str) -> Result<RegisterMap, VantageError>;

    /// One-time tracker calibration against a full-frame detection.
    /// Blocking from the caller's point of view; runs once before the
    /// acquisition loop starts.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Hardware`] when calibration fails; the
    /// worker must still close the link afterwards.
    async fn calibrate(&mut self) -> Result<(), VantageError>;

    /// Shut the link down. Idempotent-safe at the contract level; the
    /// runtime nonetheless calls it exactly once per link.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Hardware`] when teardown fails.
    async fn close(&mut self) -> Result<(), VantageError>;
}
