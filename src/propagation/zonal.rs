//! Analytic propagation with low-order zonal harmonics
//!
//! An Eckstein-Hechler style model for near-circular, non-equatorial orbits,
//! written in circular elements. Mean elements evolve with the secular drift
//! of the node and of the mean argument of latitude (J2, J2², J4 and J6),
//! while the eccentricity vector turns around the frozen point set by the odd
//! zonals J3 and J5. First-order J2 short-periodic terms are added back to
//! recover osculating elements.
//!
//! The given elements are treated as osculating at their epoch. The mean
//! elements that reproduce them are fitted once, at construction.

use std::f64::consts::PI;

use satkit::Instant;

use super::elements::{normalize_angle, CircularElements, OrbitElements};
use super::state::{
    SpacecraftState, EARTH_C20, EARTH_C30, EARTH_C40, EARTH_C50, EARTH_C60,
    EARTH_EQUATORIAL_RADIUS_M, MU_EARTH,
};
use super::OrbitPropagator;
use crate::error::{SimError, SimResult};
use crate::time::seconds_between;

/// Largest eccentricity the model accepts
const MAX_ECCENTRICITY: f64 = 0.1;

/// sin²(i) below this is treated as equatorial
const EQUATORIAL_LIMIT: f64 = 1e-10;

/// Distance of sin²(i) to 4/5 below which the orbit is critically inclined
const CRITICAL_INCLINATION_LIMIT: f64 = 1e-3;

/// Mean element fit: relative convergence threshold and iteration cap
const FIT_EPSILON: f64 = 1e-13;
const FIT_MAX_ITERATIONS: usize = 100;

/// Gravity constants used by the zonal model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonalHarmonics {
    /// Gravitational parameter (m³/s²)
    pub mu: f64,
    /// Equatorial radius (m)
    pub equatorial_radius: f64,
    /// Unnormalized C20
    pub c20: f64,
    /// Unnormalized C30
    pub c30: f64,
    /// Unnormalized C40
    pub c40: f64,
    /// Unnormalized C50
    pub c50: f64,
    /// Unnormalized C60
    pub c60: f64,
}

impl ZonalHarmonics {
    /// EIGEN-5C constants
    pub const EIGEN5C: Self = Self {
        mu: MU_EARTH,
        equatorial_radius: EARTH_EQUATORIAL_RADIUS_M,
        c20: EARTH_C20,
        c30: EARTH_C30,
        c40: EARTH_C40,
        c50: EARTH_C50,
        c60: EARTH_C60,
    };

    /// Coefficients scaled by (Re/a)^n, n = 2..=6
    fn scaled(&self, a: f64) -> [f64; 5] {
        let q = self.equatorial_radius / a;
        let q2 = q * q;
        [
            self.c20 * q2,
            self.c30 * q2 * q,
            self.c40 * q2 * q2,
            self.c50 * q2 * q2 * q,
            self.c60 * q2 * q2 * q2,
        ]
    }

    /// J2 scaled by (Re/a)²
    fn k2(&self, a: f64) -> f64 {
        let q = self.equatorial_radius / a;
        -self.c20 * q * q
    }

    /// Osculating elements from mean elements
    fn add_short_periodic(&self, mean: &CircularElements) -> CircularElements {
        let k = self.k2(mean.a);
        let s = mean.i.sin().powi(2);
        let u = mean.alpha_m;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_2u, cos_2u) = (2.0 * u).sin_cos();
        let (sin_3u, cos_3u) = (3.0 * u).sin_cos();

        CircularElements {
            a: mean.a * (1.0 + 1.5 * k * s * cos_2u),
            ex: mean.ex + k * ((1.5 - 15.0 * s / 8.0) * cos_u + (7.0 * s / 8.0) * cos_3u),
            ey: mean.ey + k * ((1.5 - 21.0 * s / 8.0) * sin_u + (7.0 * s / 8.0) * sin_3u),
            i: mean.i + 0.375 * k * (2.0 * mean.i).sin() * cos_2u,
            raan: mean.raan + 0.75 * k * mean.i.cos() * sin_2u,
            alpha_m: mean.alpha_m + k * (15.0 * s / 8.0 - 0.75) * sin_2u,
        }
    }
}

impl Default for ZonalHarmonics {
    fn default() -> Self {
        Self::EIGEN5C
    }
}

/// Secular and long-period rates of the mean elements
#[derive(Debug, Clone, Copy)]
struct MeanRates {
    /// Turning rate of the eccentricity vector (rad/s)
    perigee: f64,
    /// Node drift (rad/s)
    node: f64,
    /// Mean argument of latitude rate (rad/s)
    alpha: f64,
    /// Frozen eccentricity vector: ellipticity of the turn and ey offset
    eps1: f64,
    eps2: f64,
}

impl MeanRates {
    fn new(harmonics: &ZonalHarmonics, mean: &CircularElements) -> Self {
        let n = (harmonics.mu / mean.a.powi(3)).sqrt();
        let [g2, g3, g4, g5, g6] = harmonics.scaled(mean.a);
        let (sin_i, cos_i) = mean.i.sin_cos();
        let s2 = sin_i * sin_i;
        let s4 = s2 * s2;
        let s6 = s4 * s2;

        let rdpom = -0.75 * g2 * (4.0 - 5.0 * s2);
        let rdpomp = 7.5 * g4 * (1.0 - 31.0 / 8.0 * s2 + 49.0 / 16.0 * s4)
            - 13.125 * g6 * (1.0 - 8.0 * s2 + 129.0 / 8.0 * s4 - 297.0 / 32.0 * s6);

        let q = 3.0 / (32.0 * rdpom);
        let eps1 = q * g4 * s2 * (30.0 - 35.0 * s2)
            - 175.0 * q * g6 * s2 * (1.0 - 3.0 * s2 + 2.0625 * s4);
        let q = 3.0 * sin_i / (8.0 * rdpom);
        let eps2 = q * g3 * (4.0 - 5.0 * s2) - q * g5 * (10.0 - 35.0 * s2 + 26.25 * s4);

        let node = 1.5 * g2 - 2.25 * g2 * g2 * (2.5 - 19.0 / 6.0 * s2)
            + 0.9375 * g4 * (7.0 * s2 - 4.0)
            + 3.281_25 * g6 * (2.0 - 9.0 * s2 + 8.25 * s4);

        let alpha = 1.0 - 1.5 * g2 * (3.0 - 4.0 * s2)
            + 2.25 * g2 * g2 * (9.0 - 263.0 / 12.0 * s2 + 341.0 / 24.0 * s4)
            + 15.0 / 16.0 * g4 * (8.0 - 31.0 * s2 + 24.5 * s4)
            + 105.0 / 32.0 * g6 * (-10.0 / 3.0 + 25.0 * s2 - 48.75 * s4 + 27.5 * s6);

        Self {
            perigee: n * (rdpom + rdpomp),
            node: n * node * cos_i,
            alpha: n * alpha,
            eps1,
            eps2,
        }
    }
}

/// Zonal harmonic analytic propagator
#[derive(Debug, Clone)]
pub struct ZonalPropagator {
    elements: OrbitElements,
    harmonics: ZonalHarmonics,
    mean: CircularElements,
    rates: MeanRates,
}

impl ZonalPropagator {
    /// Create a propagator, fitting mean elements to the given osculating elements
    pub fn new(elements: OrbitElements, harmonics: ZonalHarmonics) -> SimResult<Self> {
        elements.validate(harmonics.equatorial_radius)?;

        let osculating = CircularElements::from_elements(&elements);
        check_domain(&osculating)?;

        let mean = fit_mean_elements(&harmonics, &osculating)?;
        check_domain(&mean)?;

        let rates = MeanRates::new(&harmonics, &mean);
        log::debug!(
            "Zonal propagator: mean a = {:.1} m, node drift = {:.6} deg/day",
            mean.a,
            rates.node.to_degrees() * 86_400.0
        );

        Ok(Self {
            elements,
            harmonics,
            mean,
            rates,
        })
    }

    /// Secular node drift in rad/s
    pub fn node_rate(&self) -> f64 {
        self.rates.node
    }

    fn mean_at(&self, dt: f64) -> CircularElements {
        let m = &self.mean;
        let (eps1, eps2) = (self.rates.eps1, self.rates.eps2);
        let (sin_x, cos_x) = (self.rates.perigee * dt).sin_cos();

        CircularElements {
            a: m.a,
            ex: m.ex * cos_x + (eps2 - (1.0 - eps1) * m.ey) * sin_x,
            ey: (1.0 + eps1) * m.ex * sin_x + (m.ey - eps2) * cos_x + eps2,
            i: m.i,
            raan: m.raan + self.rates.node * dt,
            alpha_m: m.alpha_m + self.rates.alpha * dt,
        }
    }
}

impl OrbitPropagator for ZonalPropagator {
    fn propagate(&self, epoch: &Instant) -> SpacecraftState {
        let dt = seconds_between(epoch, &self.elements.epoch());
        let osculating = self.harmonics.add_short_periodic(&self.mean_at(dt));
        let (position, velocity) = osculating.state_vectors(self.harmonics.mu);
        SpacecraftState::new(*epoch, position, velocity)
    }

    fn name(&self) -> &'static str {
        "Zonal harmonic"
    }

    fn initial_elements(&self) -> &OrbitElements {
        &self.elements
    }
}

fn check_domain(el: &CircularElements) -> SimResult<()> {
    let e = el.eccentricity();
    if e > MAX_ECCENTRICITY {
        return Err(SimError::degenerate_orbit(
            "eccentricity",
            e,
            format!("zonal model requires e <= {}", MAX_ECCENTRICITY),
        ));
    }

    let s = el.i.sin().powi(2);
    if s < EQUATORIAL_LIMIT {
        return Err(SimError::degenerate_orbit(
            "inclination",
            el.i.to_degrees(),
            "equatorial orbits are outside the zonal model",
        ));
    }
    if (s - 0.8).abs() < CRITICAL_INCLINATION_LIMIT {
        return Err(SimError::degenerate_orbit(
            "inclination",
            el.i.to_degrees(),
            "too close to the critical inclination",
        ));
    }

    Ok(())
}

/// Fixed-point search for the mean elements whose osculating image matches `target`
fn fit_mean_elements(
    harmonics: &ZonalHarmonics,
    target: &CircularElements,
) -> SimResult<CircularElements> {
    let threshold_a = FIT_EPSILON * (1.0 + target.a);
    let threshold_e = FIT_EPSILON * (1.0 + target.eccentricity());
    let threshold_angle = FIT_EPSILON * PI;

    let mut mean = *target;
    for iteration in 1..=FIT_MAX_ITERATIONS {
        let osc = harmonics.add_short_periodic(&mean);

        let da = target.a - osc.a;
        let dex = target.ex - osc.ex;
        let dey = target.ey - osc.ey;
        let di = target.i - osc.i;
        let draan = normalize_angle(target.raan - osc.raan, 0.0);
        let dalpha = normalize_angle(target.alpha_m - osc.alpha_m, 0.0);

        mean.a += da;
        mean.ex += dex;
        mean.ey += dey;
        mean.i += di;
        mean.raan += draan;
        mean.alpha_m += dalpha;

        if da.abs() < threshold_a
            && dex.abs() < threshold_e
            && dey.abs() < threshold_e
            && di.abs() < threshold_angle
            && draan.abs() < threshold_angle
            && dalpha.abs() < threshold_angle
        {
            log::debug!("Mean elements converged after {} iterations", iteration);
            return Ok(mean);
        }

        if !mean.a.is_finite() || mean.a <= 0.0 {
            break;
        }
    }

    Err(SimError::degenerate_orbit(
        "semi_major_axis",
        target.a,
        format!(
            "mean elements did not converge within {} iterations",
            FIT_MAX_ITERATIONS
        ),
    ))
}
