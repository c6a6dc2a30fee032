//! `vantage-hal` – Sensor hardware abstraction layer.
//!
//! Formalises the camera/FPGA gateway as a pair of capability traits so
//! the acquisition runtime never touches a transport directly and
//! alternate or simulated links can be substituted under test.
//!
//! # Modules
//!
//! - [`gateway`] – [`SensorTransport`][gateway::SensorTransport] /
//!   [`SensorLink`][gateway::SensorLink]: the open / get_register /
//!   calibrate / close contract, plus [`SensorConfig`][gateway::SensorConfig]
//!   describing one physical link.
//! - [`sim`] – [`SimTransport`][sim::SimTransport]: an in-process
//!   implementation of the gateway contract with scripted poll replies and
//!   failure injection, so the full stack runs headless in CI.

pub mod gateway;
pub mod sim;

pub use gateway::{RegisterMap, SensorConfig, SensorLink, SensorTransport};
pub use sim::{LinkStats, SimReply, SimScript, SimTransport};
