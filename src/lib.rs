//! SatAccess - satellite attitude geometry and ground station access
//!
//! Propagates a satellite over a time window and reports, at every step, the
//! direction of the Sun and the Earth in the satellite's local orbital frame
//! together with the subsolar angle. Alongside, it finds the windows during
//! which a ground station sees the satellite above a minimum elevation.

pub mod angles;
pub mod config;
pub mod ephemeris;
pub mod error;
pub mod frames;
pub mod output;
pub mod propagation;
pub mod simulation;
pub mod time;
pub mod visibility;

pub use config::{ScenarioConfig, Settings, SettingsProvider};
pub use error::{SimError, SimResult};
pub use simulation::{RunSummary, SampleSink, Simulation, SimulationOutput};
