//! Fixed-step simulation driver
//!
//! Each step propagates the orbit, builds the local orbital frame for that
//! epoch, derives Sun and Earth angles and lets the visibility detector catch
//! up to the step. Results leave through a [`SampleSink`].

use satkit::Instant;

use crate::angles::{subsolar_angle, LookAngles};
use crate::config::ScenarioConfig;
use crate::ephemeris::{Body, EphemerisProvider, FrameRef, LowPrecisionEphemeris};
use crate::error::{SimError, SimResult};
use crate::frames::{GroundStation, LocalOrbitalFrame};
use crate::propagation::{OrbitPropagator, Propagator};
use crate::time::{format_utcg, shifted};
use crate::visibility::{AccessWindow, VisibilityDetector};

/// Sun direction seen from the spacecraft
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunSample {
    pub epoch: Instant,
    pub azimuth: f64,
    pub elevation: f64,
    pub subsolar: f64,
}

/// Earth direction seen from the spacecraft
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthSample {
    pub epoch: Instant,
    pub azimuth: f64,
    pub elevation: f64,
}

/// Receiver of simulation results
///
/// Failures are reported back to the driver, which logs and counts them
/// without stopping the run.
pub trait SampleSink {
    fn sun_sample(&mut self, sample: &SunSample) -> SimResult<()>;
    fn earth_sample(&mut self, sample: &EarthSample) -> SimResult<()>;
    fn access_window(&mut self, window: &AccessWindow) -> SimResult<()>;
}

/// In-memory collection of every result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOutput {
    pub sun: Vec<SunSample>,
    pub earth: Vec<EarthSample>,
    pub windows: Vec<AccessWindow>,
}

impl SampleSink for SimulationOutput {
    fn sun_sample(&mut self, sample: &SunSample) -> SimResult<()> {
        self.sun.push(*sample);
        Ok(())
    }

    fn earth_sample(&mut self, sample: &EarthSample) -> SimResult<()> {
        self.earth.push(*sample);
        Ok(())
    }

    fn access_window(&mut self, window: &AccessWindow) -> SimResult<()> {
        self.windows.push(*window);
        Ok(())
    }
}

/// What a run produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub windows: u32,
    pub sink_errors: usize,
    /// Start of an access window still open at the end of the run
    pub open_window: Option<Instant>,
}

/// A configured scenario ready to run
pub struct Simulation<E: EphemerisProvider = LowPrecisionEphemeris> {
    propagator: Propagator,
    station: GroundStation,
    ephemeris: E,
    start: Instant,
    step: f64,
    steps: usize,
    max_check: f64,
    convergence_threshold: f64,
    min_elevation: f64,
}

impl Simulation<LowPrecisionEphemeris> {
    pub fn new(config: &ScenarioConfig) -> SimResult<Self> {
        Self::with_ephemeris(config, LowPrecisionEphemeris::new())
    }
}

impl<E: EphemerisProvider> Simulation<E> {
    /// Build the propagator and check detector settings
    pub fn with_ephemeris(config: &ScenarioConfig, ephemeris: E) -> SimResult<Self> {
        let propagator = config.model.build(&config.elements)?;
        // Validates the detector settings up front
        VisibilityDetector::new(config.start, config.max_check, config.convergence_threshold)?;

        Ok(Self {
            propagator,
            station: config.station,
            ephemeris,
            start: config.start,
            step: config.step,
            steps: config.step_count(),
            max_check: config.max_check,
            convergence_threshold: config.convergence_threshold,
            min_elevation: config.min_elevation,
        })
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Epoch of step `index`
    pub fn epoch_at(&self, index: usize) -> Instant {
        shifted(&self.start, index as f64 * self.step)
    }

    /// Station elevation of the satellite minus the minimum elevation, in degrees
    pub fn elevation_margin(&self, epoch: &Instant) -> f64 {
        let state = self.propagator.propagate(epoch);
        self.station.elevation(&state.position, epoch) - self.min_elevation
    }

    /// Sun and Earth samples for one epoch
    pub fn sample(&self, epoch: &Instant) -> SimResult<(SunSample, EarthSample)> {
        let state = self.propagator.propagate(epoch);
        let sun_inertial = self.ephemeris.position(Body::Sun, epoch, FrameRef::Inertial)?;

        let (sun, earth) = match LocalOrbitalFrame::from_state(&state) {
            Ok(lof) => (
                LookAngles::from_lookup(self.ephemeris.position(
                    Body::Sun,
                    epoch,
                    FrameRef::LocalOrbital(&lof),
                ))?,
                LookAngles::from_lookup(self.ephemeris.position(
                    Body::Earth,
                    epoch,
                    FrameRef::LocalOrbital(&lof),
                ))?,
            ),
            Err(SimError::DegenerateGeometry { context }) => {
                log::warn!("{} at {}", context, format_utcg(epoch));
                (LookAngles::DEGENERATE, LookAngles::DEGENERATE)
            }
            Err(e) => return Err(e),
        };

        Ok((
            SunSample {
                epoch: *epoch,
                azimuth: sun.azimuth,
                elevation: sun.elevation,
                subsolar: subsolar_angle(&sun_inertial, &state.position),
            },
            EarthSample {
                epoch: *epoch,
                azimuth: earth.azimuth,
                elevation: earth.elevation,
            },
        ))
    }

    /// Run every step, reporting `(done, total)` through `progress`
    pub fn run(
        &self,
        sink: &mut dyn SampleSink,
        progress: &mut dyn FnMut(usize, usize),
    ) -> SimResult<RunSummary> {
        let mut detector = VisibilityDetector::new(self.start, self.max_check, self.convergence_threshold)?;
        let mut sink_errors = 0;
        let margin = |epoch: &Instant| self.elevation_margin(epoch);

        log::info!(
            "Simulating {} steps of {} s from {} with the {} propagator and {} ephemeris",
            self.steps,
            self.step,
            format_utcg(&self.start),
            self.propagator.name(),
            self.ephemeris.name()
        );

        let mut last = self.start;
        for index in 0..self.steps {
            let epoch = self.epoch_at(index);
            let (sun, earth) = self.sample(&epoch)?;

            record(sink.sun_sample(&sun), &mut sink_errors);
            record(sink.earth_sample(&earth), &mut sink_errors);
            for window in detector.advance_to(&epoch, margin) {
                report(&window);
                record(sink.access_window(&window), &mut sink_errors);
            }

            last = epoch;
            progress(index + 1, self.steps);
        }

        for window in detector.finish(&last, margin) {
            report(&window);
            record(sink.access_window(&window), &mut sink_errors);
        }

        let summary = RunSummary {
            steps: self.steps,
            windows: detector.windows_emitted(),
            sink_errors,
            open_window: detector.pending_begin(),
        };
        log::info!(
            "Simulation finished: {} access windows, {} output errors",
            summary.windows,
            summary.sink_errors
        );
        Ok(summary)
    }
}

fn report(window: &AccessWindow) {
    log::info!(
        "Access #{}: {} to {} ({:.3} s)",
        window.sequence,
        format_utcg(&window.start),
        format_utcg(&window.stop),
        window.duration()
    );
}

fn record(result: SimResult<()>, errors: &mut usize) {
    if let Err(e) = result {
        log::error!("{}", e);
        *errors += 1;
    }
}
