//! Orbital propagation module
//!
//! Two analytic models map an epoch to a spacecraft state in the inertial
//! frame:
//!
//! ## Keplerian
//!
//! Closed-form two-body motion from classical elements.
//!
//! ## Zonal harmonic
//!
//! Closed-form motion including Earth oblateness (J2) and the J3 frozen
//! eccentricity, for near-circular non-equatorial orbits.
//!
//! Both are pure functions of the epoch once constructed. Orbit validity is
//! checked at construction, never per call.
//!
//! # Example
//!
//! ```ignore
//! use sataccess::propagation::*;
//!
//! let elements = OrbitElements::from_altitude_degrees(700e3, 0.0, 98.19, 0.0, 10.58, 0.0, epoch);
//! let propagator = PropagatorModel::default().build(&elements)?;
//! let state = propagator.propagate(&epoch);
//! ```

mod elements;
mod keplerian;
mod model;
mod state;
mod zonal;

pub use elements::{normalize_angle, solve_kepler, state_vectors, CircularElements, OrbitElements};
pub use keplerian::KeplerianPropagator;
pub use model::{Propagator, PropagatorModel};
pub use state::*;
pub use zonal::{ZonalHarmonics, ZonalPropagator};

use satkit::Instant;

/// Maps an epoch to a spacecraft state
pub trait OrbitPropagator {
    /// Inertial state at `epoch`
    fn propagate(&self, epoch: &Instant) -> SpacecraftState;

    /// Model name for logging
    fn name(&self) -> &'static str;

    /// Elements the propagator was built from
    fn initial_elements(&self) -> &OrbitElements;
}
