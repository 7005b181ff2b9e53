//! Two-body propagation from classical elements

use satkit::Instant;

use super::elements::{state_vectors, OrbitElements};
use super::state::{SpacecraftState, EARTH_EQUATORIAL_RADIUS_M, MU_EARTH};
use super::OrbitPropagator;
use crate::error::SimResult;
use crate::time::seconds_between;

/// Closed-form Keplerian propagator
///
/// Only the mean anomaly advances with time; every other element is fixed.
#[derive(Debug, Clone)]
pub struct KeplerianPropagator {
    elements: OrbitElements,
    mu: f64,
    mean_motion: f64,
}

impl KeplerianPropagator {
    /// Create a propagator around the Earth, validating the elements
    pub fn new(elements: OrbitElements) -> SimResult<Self> {
        Self::with_central_body(elements, MU_EARTH, EARTH_EQUATORIAL_RADIUS_M)
    }

    /// Create a propagator around an arbitrary central body
    pub fn with_central_body(elements: OrbitElements, mu: f64, body_radius: f64) -> SimResult<Self> {
        elements.validate(body_radius)?;
        let mean_motion = elements.mean_motion(mu);
        log::debug!(
            "Keplerian propagator: a = {:.1} m, e = {:.6}, period = {:.1} s",
            elements.semi_major_axis(),
            elements.eccentricity(),
            elements.period(mu)
        );
        Ok(Self {
            elements,
            mu,
            mean_motion,
        })
    }

    /// Mean motion in rad/s
    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }
}

impl OrbitPropagator for KeplerianPropagator {
    fn propagate(&self, epoch: &Instant) -> SpacecraftState {
        let el = &self.elements;
        let dt = seconds_between(epoch, &el.epoch());
        let mean_anomaly = el.mean_anomaly() + self.mean_motion * dt;

        let (position, velocity) = state_vectors(
            el.semi_major_axis(),
            el.eccentricity(),
            el.inclination(),
            el.arg_perigee(),
            el.raan(),
            mean_anomaly,
            self.mu,
        );

        SpacecraftState::new(*epoch, position, velocity)
    }

    fn name(&self) -> &'static str {
        "Keplerian"
    }

    fn initial_elements(&self) -> &OrbitElements {
        &self.elements
    }
}
