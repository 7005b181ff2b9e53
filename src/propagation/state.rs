//! Spacecraft state representation and Earth constants

use nalgebra::Vector3;
use satkit::Instant;

/// Spacecraft position and velocity at an epoch
///
/// Position and velocity are in the Geocentric Celestial Reference Frame (GCRF),
/// the Earth-centred inertial frame used throughout the simulation. A state is
/// produced fresh by every propagation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacecraftState {
    /// Epoch (time) of this state
    pub epoch: Instant,

    /// Position in GCRF frame (meters)
    pub position: Vector3<f64>,

    /// Velocity in GCRF frame (m/s)
    pub velocity: Vector3<f64>,
}

impl SpacecraftState {
    /// Create a new spacecraft state
    pub fn new(epoch: Instant, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            epoch,
            position,
            velocity,
        }
    }

    /// Distance from Earth center in meters
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Orbital speed in m/s
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Specific angular momentum vector (m²/s)
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.position.cross(&self.velocity)
    }

    /// Specific orbital energy (vis-viva) in J/kg
    pub fn specific_energy(&self, mu: f64) -> f64 {
        0.5 * self.velocity.norm_squared() - mu / self.radius()
    }

    /// Osculating semi-major axis in meters (negative for hyperbolic)
    pub fn semi_major_axis(&self, mu: f64) -> f64 {
        -mu / (2.0 * self.specific_energy(mu))
    }
}

// Physical constants (EIGEN-5C gravity field, as used by the zonal model)
/// Earth's gravitational parameter (GM) in m³/s²
pub const MU_EARTH: f64 = 3.986_004_415e14;

/// Earth's equatorial radius in meters
pub const EARTH_EQUATORIAL_RADIUS_M: f64 = 6_378_136.46;

/// Unnormalized C20 zonal coefficient (-J2)
pub const EARTH_C20: f64 = -1.082_626_683_55e-3;

/// Unnormalized C30 zonal coefficient (-J3)
pub const EARTH_C30: f64 = 2.532_656_485_33e-6;

/// Unnormalized C40 zonal coefficient (-J4)
pub const EARTH_C40: f64 = 1.619_621_591_37e-6;

/// Unnormalized C50 zonal coefficient (-J5)
pub const EARTH_C50: f64 = 2.272_960_828_69e-7;

/// Unnormalized C60 zonal coefficient (-J6)
pub const EARTH_C60: f64 = -5.406_812_391_07e-7;

/// Reference radius added to a configured altitude to obtain the semi-major axis
pub const ALTITUDE_REFERENCE_RADIUS_M: f64 = 6_378_140.0;
