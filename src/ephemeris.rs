//! Celestial body positions
//!
//! Bodies are located in the inertial frame first, then carried into the
//! requested frame. The Sun uses satkit's low precision analytic model,
//! which needs no data files and is good to roughly 0.01 degrees.

use nalgebra::Vector3;
use satkit::Instant;

use crate::error::{SimError, SimResult};
use crate::frames::{inertial_to_earth_fixed, Frame, GroundStation, LocalOrbitalFrame};

/// Bodies whose positions can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Earth,
}

impl Body {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Earth => "Earth",
        }
    }
}

/// Target frame of an ephemeris request
///
/// Frames that need more than an epoch to be defined carry their definition.
#[derive(Debug, Clone, Copy)]
pub enum FrameRef<'a> {
    Inertial,
    EarthFixed,
    LocalOrbital(&'a LocalOrbitalFrame),
    Topocentric(&'a GroundStation),
}

impl FrameRef<'_> {
    pub fn frame(&self) -> Frame {
        match self {
            Self::Inertial => Frame::Inertial,
            Self::EarthFixed => Frame::EarthFixed,
            Self::LocalOrbital(_) => Frame::LocalOrbital,
            Self::Topocentric(_) => Frame::Topocentric,
        }
    }
}

/// Provides body positions in a requested frame
pub trait EphemerisProvider {
    /// Position of `body` at `epoch` relative to the origin of `frame`
    ///
    /// Fails with a degenerate geometry error when the body coincides with
    /// the frame origin.
    fn position(&self, body: Body, epoch: &Instant, frame: FrameRef<'_>) -> SimResult<Vector3<f64>>;

    fn name(&self) -> &'static str;
}

/// Analytic low precision ephemeris (meters)
#[derive(Debug, Clone, Copy, Default)]
pub struct LowPrecisionEphemeris;

impl LowPrecisionEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// Body position in the inertial frame; the Earth sits at the origin
    pub fn inertial(&self, body: Body, epoch: &Instant) -> Vector3<f64> {
        match body {
            Body::Sun => satkit::lpephem::sun::pos_gcrf(epoch),
            Body::Earth => Vector3::zeros(),
        }
    }
}

impl EphemerisProvider for LowPrecisionEphemeris {
    fn position(&self, body: Body, epoch: &Instant, frame: FrameRef<'_>) -> SimResult<Vector3<f64>> {
        let inertial = self.inertial(body, epoch);

        let position = match frame {
            FrameRef::Inertial => inertial,
            FrameRef::EarthFixed => inertial_to_earth_fixed(epoch) * inertial,
            FrameRef::LocalOrbital(lof) => lof.position_from_inertial(&inertial, epoch)?,
            FrameRef::Topocentric(station) => station.topocentric(&inertial, epoch),
        };

        if position.norm() == 0.0 {
            return Err(SimError::degenerate_geometry(format!(
                "{} coincides with the origin of the {} frame",
                body.name(),
                frame.frame().name()
            )));
        }

        Ok(position)
    }

    fn name(&self) -> &'static str {
        "Low precision analytic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{state_vectors, SpacecraftState, MU_EARTH};

    const AU: f64 = 1.495_978_707e11;

    fn epoch() -> Instant {
        Instant::from_datetime(2020, 1, 1, 0, 0, 0.0).unwrap()
    }

    #[test]
    fn test_sun_distance_and_direction() {
        let eph = LowPrecisionEphemeris::new();
        let sun = eph.position(Body::Sun, &epoch(), FrameRef::Inertial).unwrap();
        // Near perihelion in early January
        assert!((sun.norm() / AU - 0.983).abs() < 0.01, "{}", sun.norm() / AU);
        // Sun is south of the equator in January
        assert!(sun.z < 0.0);
        // Declination about -23 degrees
        let declination = (sun.z / sun.norm()).asin().to_degrees();
        assert!((declination + 23.0).abs() < 0.5, "{}", declination);
    }

    #[test]
    fn test_earth_at_inertial_origin_is_degenerate() {
        let eph = LowPrecisionEphemeris::new();
        assert!(matches!(
            eph.position(Body::Earth, &epoch(), FrameRef::Inertial),
            Err(SimError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_earth_in_local_orbital_frame_is_nadir() {
        let (r, v) = state_vectors(7_078_140.0, 0.0, 1.7, 0.0, 0.2, 0.4, MU_EARTH);
        let state = SpacecraftState::new(epoch(), r, v);
        let lof = LocalOrbitalFrame::from_state(&state).unwrap();

        let eph = LowPrecisionEphemeris::new();
        let earth = eph
            .position(Body::Earth, &epoch(), FrameRef::LocalOrbital(&lof))
            .unwrap();
        assert!((earth.normalize() - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_sun_seen_from_station_keeps_distance() {
        let eph = LowPrecisionEphemeris::new();
        let station = GroundStation::from_degrees(48.0, 7.8, 300.0).unwrap();
        let topo = eph
            .position(Body::Sun, &epoch(), FrameRef::Topocentric(&station))
            .unwrap();
        let inertial = eph.position(Body::Sun, &epoch(), FrameRef::Inertial).unwrap();
        assert!((topo.norm() - inertial.norm()).abs() < 7.0e6);
    }
}
