//! Classical and circular orbital elements
//!
//! Classical elements are what a scenario provides. Circular (non-singular)
//! elements are what the zonal model works in, since argument of perigee is
//! undefined for the near-circular orbits it targets.

use std::f64::consts::{PI, TAU};

use nalgebra::{Rotation3, Vector3};
use satkit::Instant;

use super::state::ALTITUDE_REFERENCE_RADIUS_M;
use crate::error::{SimError, SimResult};

/// Kepler equation convergence tolerance (radians)
const KEPLER_TOLERANCE: f64 = 1e-14;

/// Kepler equation iteration cap
const KEPLER_MAX_ITERATIONS: usize = 50;

/// Classical orbital elements at a reference epoch
///
/// Angles are stored in radians. Values are immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitElements {
    semi_major_axis: f64,
    eccentricity: f64,
    inclination: f64,
    arg_perigee: f64,
    raan: f64,
    mean_anomaly: f64,
    epoch: Instant,
}

impl OrbitElements {
    /// Create from semi-major axis (m) and angles in radians
    pub fn new(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: f64,
        arg_perigee: f64,
        raan: f64,
        mean_anomaly: f64,
        epoch: Instant,
    ) -> Self {
        Self {
            semi_major_axis,
            eccentricity,
            inclination,
            arg_perigee,
            raan,
            mean_anomaly,
            epoch,
        }
    }

    /// Create from semi-major axis (m) and angles in degrees
    pub fn from_degrees(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination_deg: f64,
        arg_perigee_deg: f64,
        raan_deg: f64,
        mean_anomaly_deg: f64,
        epoch: Instant,
    ) -> Self {
        Self::new(
            semi_major_axis,
            eccentricity,
            inclination_deg.to_radians(),
            arg_perigee_deg.to_radians(),
            raan_deg.to_radians(),
            mean_anomaly_deg.to_radians(),
            epoch,
        )
    }

    /// Create from an altitude above the reference radius (m) and angles in degrees
    pub fn from_altitude_degrees(
        altitude: f64,
        eccentricity: f64,
        inclination_deg: f64,
        arg_perigee_deg: f64,
        raan_deg: f64,
        mean_anomaly_deg: f64,
        epoch: Instant,
    ) -> Self {
        Self::from_degrees(
            altitude + ALTITUDE_REFERENCE_RADIUS_M,
            eccentricity,
            inclination_deg,
            arg_perigee_deg,
            raan_deg,
            mean_anomaly_deg,
            epoch,
        )
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    pub fn arg_perigee(&self) -> f64 {
        self.arg_perigee
    }

    pub fn raan(&self) -> f64 {
        self.raan
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.mean_anomaly
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Check the elements describe a closed orbit above the central body surface
    pub fn validate(&self, body_radius: f64) -> SimResult<()> {
        let e = self.eccentricity;
        if !e.is_finite() || !(0.0..1.0).contains(&e) {
            return Err(SimError::degenerate_orbit(
                "eccentricity",
                e,
                "must lie in [0, 1) for a closed orbit",
            ));
        }

        let a = self.semi_major_axis;
        if !a.is_finite() || a <= body_radius {
            return Err(SimError::degenerate_orbit(
                "semi_major_axis",
                a,
                format!("must exceed the planet radius of {} m", body_radius),
            ));
        }

        let angles = [
            ("inclination", self.inclination),
            ("arg_perigee", self.arg_perigee),
            ("raan", self.raan),
            ("mean_anomaly", self.mean_anomaly),
        ];
        for (name, value) in angles {
            if !value.is_finite() {
                return Err(SimError::degenerate_orbit(name, value, "must be finite"));
            }
        }

        Ok(())
    }

    /// Keplerian mean motion in rad/s
    pub fn mean_motion(&self, mu: f64) -> f64 {
        (mu / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Keplerian period in seconds
    pub fn period(&self, mu: f64) -> f64 {
        TAU / self.mean_motion(mu)
    }
}

/// Circular (non-singular) orbital elements
///
/// `ex = e cos ω`, `ey = e sin ω`, `alpha_m = ω + M` (mean argument of latitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularElements {
    pub a: f64,
    pub ex: f64,
    pub ey: f64,
    pub i: f64,
    pub raan: f64,
    pub alpha_m: f64,
}

impl CircularElements {
    pub fn from_elements(elements: &OrbitElements) -> Self {
        let (sin_w, cos_w) = elements.arg_perigee.sin_cos();
        Self {
            a: elements.semi_major_axis,
            ex: elements.eccentricity * cos_w,
            ey: elements.eccentricity * sin_w,
            i: elements.inclination,
            raan: elements.raan,
            alpha_m: elements.arg_perigee + elements.mean_anomaly,
        }
    }

    pub fn eccentricity(&self) -> f64 {
        self.ex.hypot(self.ey)
    }

    /// Inertial position and velocity for these elements under two-body motion
    pub fn state_vectors(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let arg_perigee = self.ey.atan2(self.ex);
        state_vectors(
            self.a,
            self.eccentricity(),
            self.i,
            arg_perigee,
            self.raan,
            self.alpha_m - arg_perigee,
            mu,
        )
    }
}

/// Normalize an angle into `[center - π, center + π)`
pub fn normalize_angle(angle: f64, center: f64) -> f64 {
    angle - TAU * ((angle + PI - center) / TAU).floor()
}

/// Solve Kepler's equation `E - e sin E = M` for the eccentric anomaly
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let m = normalize_angle(mean_anomaly, 0.0);
    let mut ecc_anomaly = if eccentricity < 0.8 {
        m + eccentricity * m.sin()
    } else {
        PI.copysign(m)
    };

    for _ in 0..KEPLER_MAX_ITERATIONS {
        let (sin_e, cos_e) = ecc_anomaly.sin_cos();
        let delta = (ecc_anomaly - eccentricity * sin_e - m) / (1.0 - eccentricity * cos_e);
        ecc_anomaly -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }

    ecc_anomaly
}

/// Inertial position and velocity from classical elements (angles in radians)
pub fn state_vectors(
    a: f64,
    e: f64,
    inclination: f64,
    arg_perigee: f64,
    raan: f64,
    mean_anomaly: f64,
    mu: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let ecc_anomaly = solve_kepler(mean_anomaly, e);
    let (sin_e, cos_e) = ecc_anomaly.sin_cos();
    let beta = (1.0 - e * e).sqrt();
    let r = a * (1.0 - e * cos_e);

    // Perifocal frame: x toward perigee, z along angular momentum
    let pos_pf = Vector3::new(a * (cos_e - e), a * beta * sin_e, 0.0);
    let vel_pf = ((mu * a).sqrt() / r) * Vector3::new(-sin_e, beta * cos_e, 0.0);

    let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), raan)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), inclination)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), arg_perigee);

    (rotation * pos_pf, rotation * vel_pf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::state::{EARTH_EQUATORIAL_RADIUS_M, MU_EARTH};

    fn epoch() -> Instant {
        Instant::from_datetime(2020, 1, 1, 0, 0, 0.0).unwrap()
    }

    #[test]
    fn test_kepler_solution_satisfies_equation() {
        for &e in &[0.0, 0.01, 0.3, 0.7, 0.95] {
            for k in 0..12 {
                let m = -PI + k as f64 * 0.5;
                let ecc = solve_kepler(m, e);
                let residual = normalize_angle(ecc - e * ecc.sin() - m, 0.0);
                assert!(residual.abs() < 1e-12, "e = {}, M = {}: {}", e, m, residual);
            }
        }
    }

    #[test]
    fn test_state_vectors_perigee_and_apogee() {
        let a = 8_000_000.0;
        let e = 0.1;
        let (r_p, v_p) = state_vectors(a, e, 0.3, 0.4, 0.5, 0.0, MU_EARTH);
        let (r_a, _) = state_vectors(a, e, 0.3, 0.4, 0.5, PI, MU_EARTH);

        assert!((r_p.norm() - a * (1.0 - e)).abs() < 1e-6);
        assert!((r_a.norm() - a * (1.0 + e)).abs() < 1e-6);
        // Velocity is perpendicular to position at perigee
        assert!(r_p.dot(&v_p).abs() / (r_p.norm() * v_p.norm()) < 1e-12);
        // Vis-viva
        let v_expected = (MU_EARTH * (2.0 / r_p.norm() - 1.0 / a)).sqrt();
        assert!((v_p.norm() - v_expected).abs() < 1e-6);
    }

    #[test]
    fn test_inclination_sets_angular_momentum_direction() {
        let inclination = 98.1929_f64.to_radians();
        let (r, v) = state_vectors(7_078_140.0, 0.0, inclination, 0.0, 0.0, 1.0, MU_EARTH);
        let h = r.cross(&v);
        let computed = (h.z / h.norm()).acos();
        assert!((computed - inclination).abs() < 1e-12);
    }

    #[test]
    fn test_circular_elements_round_trip_position() {
        let elements = OrbitElements::from_degrees(7_500_000.0, 0.05, 51.6, 30.0, 120.0, 45.0, epoch());
        let circular = CircularElements::from_elements(&elements);
        assert!((circular.eccentricity() - 0.05).abs() < 1e-15);

        let (r1, v1) = circular.state_vectors(MU_EARTH);
        let (r2, v2) = state_vectors(
            elements.semi_major_axis(),
            elements.eccentricity(),
            elements.inclination(),
            elements.arg_perigee(),
            elements.raan(),
            elements.mean_anomaly(),
            MU_EARTH,
        );
        assert!((r1 - r2).norm() < 1e-6);
        assert!((v1 - v2).norm() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_open_and_buried_orbits() {
        let open = OrbitElements::from_degrees(8_000_000.0, 1.0, 10.0, 0.0, 0.0, 0.0, epoch());
        assert!(matches!(
            open.validate(EARTH_EQUATORIAL_RADIUS_M),
            Err(SimError::OrbitDegenerate { parameter: "eccentricity", .. })
        ));

        let buried = OrbitElements::from_degrees(6_000_000.0, 0.0, 10.0, 0.0, 0.0, 0.0, epoch());
        assert!(matches!(
            buried.validate(EARTH_EQUATORIAL_RADIUS_M),
            Err(SimError::OrbitDegenerate { parameter: "semi_major_axis", .. })
        ));

        let ok = OrbitElements::from_altitude_degrees(700_000.0, 0.0, 98.1929, 0.0, 10.5834, 0.0, epoch());
        assert!(ok.validate(EARTH_EQUATORIAL_RADIUS_M).is_ok());
        assert!((ok.semi_major_axis() - 7_078_140.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI, 0.0) + PI).abs() < 1e-12);
        assert!((normalize_angle(-0.5, PI) - (TAU - 0.5)).abs() < 1e-12);
        assert!((normalize_angle(0.25, 0.0) - 0.25).abs() < 1e-15);
    }
}
