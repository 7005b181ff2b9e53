//! Reference frames
//!
//! Everything is expressed relative to the Earth-centred inertial frame
//! (GCRF). The Earth-fixed frame is ITRF, reached through satkit's
//! approximate IAU-76/FK5 reduction (precession, nutation and Earth rotation,
//! polar motion neglected, about 1 arcsec).
//!
//! The local orbital frame is VVLH:
//! - +Z toward nadir (opposite the spacecraft position)
//! - +Y opposite the orbital angular momentum
//! - +X completes the right-handed triad (along velocity on a circular orbit)
//!
//! The topocentric frame is East-North-Up at a WGS-84 geodetic point.

use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use satkit::itrfcoord::ITRFCoord;
use satkit::Instant;

use crate::error::{SimError, SimResult};
use crate::propagation::SpacecraftState;
use crate::time::seconds_between;

/// Relative size below which a cross product is treated as zero
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Named coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    Inertial,
    EarthFixed,
    LocalOrbital,
    Topocentric,
}

impl Frame {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inertial => "Inertial (GCRF)",
            Self::EarthFixed => "Earth-fixed (ITRF)",
            Self::LocalOrbital => "Local orbital (VVLH)",
            Self::Topocentric => "Topocentric (ENU)",
        }
    }
}

/// Rotation taking inertial (GCRF) coordinates to Earth-fixed (ITRF) coordinates
pub fn inertial_to_earth_fixed(epoch: &Instant) -> UnitQuaternion<f64> {
    satkit::frametransform::qgcrf2itrf_approx(epoch)
}

/// Rotation taking Earth-fixed (ITRF) coordinates to inertial (GCRF) coordinates
pub fn earth_fixed_to_inertial(epoch: &Instant) -> UnitQuaternion<f64> {
    satkit::frametransform::qitrf2gcrf_approx(epoch)
}

/// VVLH frame attached to the spacecraft at one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalOrbitalFrame {
    epoch: Instant,
    origin: Vector3<f64>,
    to_local: Rotation3<f64>,
}

impl LocalOrbitalFrame {
    /// Build the frame from the spacecraft state at the epoch it will be used for
    pub fn from_state(state: &SpacecraftState) -> SimResult<Self> {
        let r = state.position;
        let h = state.angular_momentum();
        if r.norm() == 0.0 || h.norm() <= DEGENERATE_TOLERANCE * r.norm() * state.speed() {
            return Err(SimError::degenerate_geometry(
                "position and velocity are collinear, local orbital frame undefined",
            ));
        }

        let z = -r.normalize();
        let y = -h.normalize();
        let x = y.cross(&z);

        Ok(Self {
            epoch: state.epoch,
            origin: r,
            to_local: Rotation3::from_basis_unchecked(&[x, y, z]).inverse(),
        })
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Spacecraft position in the inertial frame
    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    /// Frame axes expressed in the inertial frame
    pub fn axes(&self) -> [Vector3<f64>; 3] {
        let to_inertial = self.to_local.inverse();
        [
            to_inertial * Vector3::x(),
            to_inertial * Vector3::y(),
            to_inertial * Vector3::z(),
        ]
    }

    fn check_epoch(&self, epoch: &Instant) -> SimResult<()> {
        if *epoch != self.epoch {
            return Err(SimError::FrameEpochMismatch {
                offset_seconds: seconds_between(epoch, &self.epoch),
            });
        }
        Ok(())
    }

    /// Inertial position to local coordinates (translated to the spacecraft, then rotated)
    pub fn position_from_inertial(&self, position: &Vector3<f64>, epoch: &Instant) -> SimResult<Vector3<f64>> {
        self.check_epoch(epoch)?;
        Ok(self.to_local * (position - self.origin))
    }

    /// Inertial direction to local coordinates (rotation only)
    pub fn direction_from_inertial(&self, direction: &Vector3<f64>, epoch: &Instant) -> SimResult<Vector3<f64>> {
        self.check_epoch(epoch)?;
        Ok(self.to_local * direction)
    }

    pub fn position_to_inertial(&self, local: &Vector3<f64>, epoch: &Instant) -> SimResult<Vector3<f64>> {
        self.check_epoch(epoch)?;
        Ok(self.to_local.inverse() * local + self.origin)
    }

    pub fn direction_to_inertial(&self, local: &Vector3<f64>, epoch: &Instant) -> SimResult<Vector3<f64>> {
        self.check_epoch(epoch)?;
        Ok(self.to_local.inverse() * local)
    }
}

/// Fixed geodetic site with its East-North-Up frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundStation {
    latitude: f64,
    longitude: f64,
    altitude: f64,
    coord: ITRFCoord,
    to_enu: UnitQuaternion<f64>,
}

impl GroundStation {
    /// Create a station from latitude/longitude in degrees and altitude in meters
    pub fn from_degrees(latitude: f64, longitude: f64, altitude: f64) -> SimResult<Self> {
        if !latitude.is_finite() || latitude.abs() > 90.0 {
            return Err(SimError::config(
                "TargetLat",
                format!("{} is outside [-90, 90] degrees", latitude),
            ));
        }
        if !longitude.is_finite() {
            return Err(SimError::config("TargetLon", format!("{} is not finite", longitude)));
        }
        if !altitude.is_finite() {
            return Err(SimError::config("TargetAlt", format!("{} is not finite", altitude)));
        }

        let coord = ITRFCoord::from_geodetic_deg(latitude, longitude, altitude);
        Ok(Self {
            latitude,
            longitude,
            altitude,
            coord,
            to_enu: coord.q_enu2itrf().conjugate(),
        })
    }

    /// Geodetic latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude above the ellipsoid in meters
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn position_earth_fixed(&self) -> &Vector3<f64> {
        &self.coord.itrf
    }

    pub fn position_inertial(&self, epoch: &Instant) -> Vector3<f64> {
        earth_fixed_to_inertial(epoch) * self.coord.itrf
    }

    /// Station-to-target vector in East-North-Up coordinates
    pub fn topocentric(&self, target_inertial: &Vector3<f64>, epoch: &Instant) -> Vector3<f64> {
        let target = inertial_to_earth_fixed(epoch) * target_inertial;
        self.topocentric_earth_fixed(&target)
    }

    pub fn topocentric_earth_fixed(&self, target: &Vector3<f64>) -> Vector3<f64> {
        self.to_enu * (target - self.coord.itrf)
    }

    /// Elevation of a target above the local horizon in degrees
    pub fn elevation(&self, target_inertial: &Vector3<f64>, epoch: &Instant) -> f64 {
        let enu = self.topocentric(target_inertial, epoch);
        let range = enu.norm();
        if range == 0.0 {
            return 90.0;
        }
        (enu.z / range).clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Azimuth of a target in degrees, north = 0, clockwise toward east
    pub fn azimuth(&self, target_inertial: &Vector3<f64>, epoch: &Instant) -> f64 {
        let enu = self.topocentric(target_inertial, epoch);
        let azimuth = enu.x.atan2(enu.y).to_degrees().rem_euclid(360.0);
        if azimuth >= 360.0 {
            0.0
        } else {
            azimuth
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{state_vectors, MU_EARTH};
    use satkit::consts::WGS84_A;

    fn epoch() -> Instant {
        Instant::from_datetime(2020, 1, 1, 0, 0, 0.0).unwrap()
    }

    fn circular_state(epoch: Instant) -> SpacecraftState {
        let (r, v) = state_vectors(7_078_140.0, 0.0, 98.1929_f64.to_radians(), 0.0, 0.3, 1.2, MU_EARTH);
        SpacecraftState::new(epoch, r, v)
    }

    #[test]
    fn test_earth_fixed_pole_includes_precession() {
        // Twenty years of precession tilt the ITRF pole away from the GCRF pole
        let pole = earth_fixed_to_inertial(&epoch()) * Vector3::z();
        let tilt = pole.angle(&Vector3::z()).to_degrees();
        assert!(tilt > 0.07 && tilt < 0.16, "{}", tilt);
    }

    #[test]
    fn test_earth_rotation_round_trip() {
        let v = Vector3::new(1.0e6, -2.0e6, 3.0e6);
        let back = earth_fixed_to_inertial(&epoch()) * (inertial_to_earth_fixed(&epoch()) * v);
        assert!((back - v).norm() < 1e-6);
    }

    #[test]
    fn test_local_frame_axes() {
        let state = circular_state(epoch());
        let frame = LocalOrbitalFrame::from_state(&state).unwrap();
        let [x, y, z] = frame.axes();

        assert!((x.cross(&y) - z).norm() < 1e-12);
        assert!((z + state.position.normalize()).norm() < 1e-12);
        // Circular orbit: +X along velocity
        assert!((x - state.velocity.normalize()).norm() < 1e-9);

        // Earth centre lies straight down at distance |r|
        let earth = frame.position_from_inertial(&Vector3::zeros(), &epoch()).unwrap();
        assert!(earth.x.abs() < 1e-6 && earth.y.abs() < 1e-6);
        assert!((earth.z - state.radius()).abs() < 1e-6);
    }

    #[test]
    fn test_local_frame_round_trip() {
        let state = circular_state(epoch());
        let frame = LocalOrbitalFrame::from_state(&state).unwrap();
        let t = epoch();

        let p = Vector3::new(1.5e11, -2.0e10, 7.0e9);
        let local = frame.position_from_inertial(&p, &t).unwrap();
        let back = frame.position_to_inertial(&local, &t).unwrap();
        assert!((back - p).norm() / p.norm() < 1e-12);

        let d = Vector3::new(0.3, 0.4, -0.5);
        let local_d = frame.direction_from_inertial(&d, &t).unwrap();
        assert!((local_d.norm() - d.norm()).abs() < 1e-12);
        let back_d = frame.direction_to_inertial(&local_d, &t).unwrap();
        assert!((back_d - d).norm() < 1e-12);
    }

    #[test]
    fn test_local_frame_rejects_other_epoch() {
        let frame = LocalOrbitalFrame::from_state(&circular_state(epoch())).unwrap();
        let later = crate::time::shifted(&epoch(), 60.0);
        match frame.position_from_inertial(&Vector3::zeros(), &later) {
            Err(SimError::FrameEpochMismatch { offset_seconds }) => {
                assert!((offset_seconds - 60.0).abs() < 1e-6)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_local_frame_rejects_radial_velocity() {
        let r = Vector3::new(7.0e6, 0.0, 0.0);
        let state = SpacecraftState::new(epoch(), r, Vector3::new(100.0, 0.0, 0.0));
        assert!(matches!(
            LocalOrbitalFrame::from_state(&state),
            Err(SimError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_station_on_equator() {
        let station = GroundStation::from_degrees(0.0, 0.0, 0.0).unwrap();
        assert!((station.position_earth_fixed() - Vector3::new(WGS84_A, 0.0, 0.0)).norm() < 1e-6);

        let to_inertial = earth_fixed_to_inertial(&epoch());
        let overhead = to_inertial * Vector3::new(WGS84_A + 500e3, 0.0, 0.0);
        assert!((station.elevation(&overhead, &epoch()) - 90.0).abs() < 1e-6);

        let north = to_inertial * Vector3::new(WGS84_A, 0.0, 1000.0);
        let az = station.azimuth(&north, &epoch());
        // Rounding may land just below 360
        assert!(az.min(360.0 - az) < 1e-6, "{}", az);
        assert!(station.elevation(&north, &epoch()).abs() < 1e-6);

        let east = to_inertial * Vector3::new(WGS84_A, 1000.0, 0.0);
        assert!((station.azimuth(&east, &epoch()) - 90.0).abs() < 1e-6);

        let west = to_inertial * Vector3::new(WGS84_A, -1000.0, 0.0);
        assert!((station.azimuth(&west, &epoch()) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_station_up_is_geodetic_normal() {
        let station = GroundStation::from_degrees(48.001081, 7.846619, 320.0).unwrap();
        let up = station.position_earth_fixed() + station.to_enu.inverse() * Vector3::new(0.0, 0.0, 1000.0);
        let enu = station.topocentric_earth_fixed(&up);
        assert!((enu - Vector3::new(0.0, 0.0, 1000.0)).norm() < 1e-6);
        // Geodetic and geocentric latitude differ for a non-equatorial site
        let geocentric = (station.position_earth_fixed().z / station.position_earth_fixed().norm()).asin();
        assert!(geocentric.to_degrees() < 48.001081);
    }

    #[test]
    fn test_station_elevation_matches_itrf_chain() {
        let station = GroundStation::from_degrees(48.001081, 7.846619, 320.0).unwrap();
        let site = ITRFCoord::from_geodetic_deg(48.001081, 7.846619, 320.0);

        for minutes in [0.0, 17.0, 43.0, 95.0, 600.0] {
            let t = crate::time::shifted(&epoch(), minutes * 60.0);
            let state = circular_state(t);

            let itrf = ITRFCoord::from_vector(&(satkit::frametransform::qgcrf2itrf_approx(&t) * state.position));
            let enu = itrf.to_enu(&site);
            let expected = (enu.z / enu.norm()).asin().to_degrees();

            let elevation = station.elevation(&state.position, &t);
            assert!((elevation - expected).abs() < 1e-6, "{} vs {}", elevation, expected);
        }
    }

    #[test]
    fn test_station_rejects_bad_latitude() {
        assert!(matches!(
            GroundStation::from_degrees(91.0, 0.0, 0.0),
            Err(SimError::Config { .. })
        ));
    }
}
