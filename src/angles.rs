//! Azimuth, elevation and subsolar angles
//!
//! Azimuth is measured in the local x-y plane from +X toward +Y, elevation
//! from that plane toward +Z. Results are in degrees, azimuth in [0, 360)
//! and elevation in [-90, 90].

use nalgebra::Vector3;

use crate::error::{SimError, SimResult};

/// Horizontal projection shorter than this fraction of the vector counts as zero
const HORIZONTAL_TOLERANCE: f64 = 1e-12;

/// Direction of a vector in a local frame, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth: f64,
    pub elevation: f64,
}

impl LookAngles {
    /// Reported when the vector has no horizontal component
    pub const DEGENERATE: Self = Self {
        azimuth: 0.0,
        elevation: 90.0,
    };

    /// Angles of a vector already expressed in the local frame
    pub fn from_local(v: &Vector3<f64>) -> Self {
        if !v.iter().all(|c| c.is_finite()) {
            log::debug!("Non-finite direction {:?}, using vertical fallback", v);
            return Self::DEGENERATE;
        }

        let horizontal = v.x.hypot(v.y);
        if horizontal <= HORIZONTAL_TOLERANCE * v.norm() || horizontal == 0.0 {
            return Self::DEGENERATE;
        }

        let mut azimuth = v.y.abs().atan2(v.x).to_degrees();
        if v.y < 0.0 {
            azimuth = 360.0 - azimuth;
        }
        if azimuth >= 360.0 {
            azimuth = 0.0;
        }

        let mut elevation = v.z.abs().atan2(horizontal).to_degrees();
        if v.z < 0.0 {
            elevation = -elevation;
        }

        Self { azimuth, elevation }
    }

    /// Angles of an ephemeris lookup, with degenerate geometry mapped to the vertical fallback
    pub fn from_lookup(lookup: SimResult<Vector3<f64>>) -> SimResult<Self> {
        match lookup {
            Ok(v) => Ok(Self::from_local(&v)),
            Err(SimError::DegenerateGeometry { context }) => {
                log::debug!("{}, using vertical fallback", context);
                Ok(Self::DEGENERATE)
            }
            Err(e) => Err(e),
        }
    }
}

/// Angle between the Earth-to-Sun and Earth-to-satellite directions, in degrees
pub fn subsolar_angle(earth_to_sun: &Vector3<f64>, earth_to_satellite: &Vector3<f64>) -> f64 {
    let cross = earth_to_sun.cross(earth_to_satellite).norm();
    let dot = earth_to_sun.dot(earth_to_satellite);
    let angle = cross.atan2(dot).to_degrees();
    if angle.is_finite() {
        angle
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(x: f64, y: f64, z: f64) -> LookAngles {
        LookAngles::from_local(&Vector3::new(x, y, z))
    }

    #[test]
    fn test_axis_directions() {
        let forward = angles(1.0, 0.0, 0.0);
        assert_eq!(forward, LookAngles { azimuth: 0.0, elevation: 0.0 });

        assert!((angles(0.0, 2.0, 0.0).azimuth - 90.0).abs() < 1e-12);
        assert!((angles(-3.0, 0.0, 0.0).azimuth - 180.0).abs() < 1e-12);
        assert!((angles(0.0, -1.0, 0.0).azimuth - 270.0).abs() < 1e-12);
    }

    #[test]
    fn test_signed_elevation() {
        let up = angles(1.0, 0.0, 1.0);
        assert!((up.elevation - 45.0).abs() < 1e-12);
        let down = angles(1.0, 1.0, -2.0_f64.sqrt());
        assert!((down.elevation + 45.0).abs() < 1e-12);
        assert!((down.azimuth - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_y_wraps_azimuth() {
        let a = angles(1.0, -1.0, 0.0);
        assert!((a.azimuth - 315.0).abs() < 1e-12);
        let b = angles(-1.0, -1.0, 0.5);
        assert!((b.azimuth - 225.0).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_vector_is_degenerate() {
        assert_eq!(angles(0.0, 0.0, 5.0), LookAngles::DEGENERATE);
        assert_eq!(angles(0.0, 0.0, -5.0), LookAngles::DEGENERATE);
        assert_eq!(angles(0.0, 0.0, 0.0), LookAngles::DEGENERATE);
        assert_eq!(angles(1e-20, 0.0, 1.0e6), LookAngles::DEGENERATE);
        assert_eq!(angles(f64::NAN, 0.0, 1.0), LookAngles::DEGENERATE);
    }

    #[test]
    fn test_tiny_negative_y_does_not_reach_360() {
        let a = angles(1.0, -1e-300, 0.0);
        assert!(a.azimuth < 360.0 && a.azimuth >= 0.0);
    }

    #[test]
    fn test_ranges_over_sphere() {
        for i in 0..36 {
            for j in 0..19 {
                let lon = (i as f64 * 10.0).to_radians();
                let lat = (-90.0 + j as f64 * 10.0_f64).to_radians();
                let v = Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());
                let a = LookAngles::from_local(&(v * 4.2e7));
                assert!((0.0..360.0).contains(&a.azimuth), "{:?}", a);
                assert!((-90.0..=90.0).contains(&a.elevation), "{:?}", a);
            }
        }
    }

    #[test]
    fn test_degenerate_lookup_maps_to_fallback() {
        let lookup = Err(SimError::degenerate_geometry("Earth at origin"));
        assert_eq!(LookAngles::from_lookup(lookup).unwrap(), LookAngles::DEGENERATE);

        let mismatch = Err(SimError::FrameEpochMismatch { offset_seconds: 1.0 });
        assert!(LookAngles::from_lookup(mismatch).is_err());
    }

    #[test]
    fn test_subsolar_angle() {
        let sun = Vector3::new(1.5e11, 0.0, 0.0);
        assert!(subsolar_angle(&sun, &Vector3::new(7.0e6, 0.0, 0.0)).abs() < 1e-12);
        assert!((subsolar_angle(&sun, &Vector3::new(0.0, 7.0e6, 0.0)) - 90.0).abs() < 1e-12);
        assert!((subsolar_angle(&sun, &Vector3::new(-7.0e6, 0.0, 0.0)) - 180.0).abs() < 1e-12);
        assert_eq!(subsolar_angle(&sun, &Vector3::zeros()), 0.0);
    }
}
