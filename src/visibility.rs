//! Ground station visibility detection
//!
//! The detector watches a margin function `g(t)` (satellite elevation seen
//! from the station minus the minimum elevation) on its own coarse grid,
//! `t0 + k * max_check`. When two consecutive samples fall on different sides
//! of zero, the crossing is refined inside the bracket until it is narrower
//! than the convergence threshold. `g >= 0` counts as visible.
//!
//! A window is emitted once both of its ends have been observed. A window
//! that is already open at the first sample, or still open at the end of
//! the horizon, is never emitted.

use satkit::Instant;

use crate::error::{SimError, SimResult};
use crate::time::{format_utcg, seconds_between, shifted};

/// Iteration cap for crossing refinement
const MAX_REFINE_ITERATIONS: usize = 100;

/// Visibility of the satellite from the station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    BelowHorizon,
    AboveHorizon,
}

impl VisibilityState {
    fn of(value: f64) -> Self {
        if value >= 0.0 {
            Self::AboveHorizon
        } else {
            Self::BelowHorizon
        }
    }
}

/// A completed access window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessWindow {
    /// Creation order, starting at 1
    pub sequence: u32,
    pub start: Instant,
    pub stop: Instant,
}

impl AccessWindow {
    /// Window length in seconds
    pub fn duration(&self) -> f64 {
        seconds_between(&self.stop, &self.start)
    }
}

/// Outcome of feeding one sample to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Continue,
    WindowClosed(AccessWindow),
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    offset: f64,
    value: f64,
}

/// Stateful access window detector
#[derive(Debug, Clone)]
pub struct VisibilityDetector {
    reference: Instant,
    max_check: f64,
    threshold: f64,
    next_grid_index: u64,
    last: Option<Sample>,
    state: Option<VisibilityState>,
    pending_begin: Option<Instant>,
    next_sequence: u32,
}

impl VisibilityDetector {
    /// Create a detector whose sampling grid starts at `reference`
    ///
    /// `max_check` is the sampling interval and `threshold` the bracket
    /// width at which refinement stops, both in seconds.
    pub fn new(reference: Instant, max_check: f64, threshold: f64) -> SimResult<Self> {
        if !max_check.is_finite() || max_check <= 0.0 {
            return Err(SimError::config(
                "SimMaxCheck",
                format!("{} must be a positive number of seconds", max_check),
            ));
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(SimError::config(
                "SimDivThreshold",
                format!("{} must be a positive number of seconds", threshold),
            ));
        }

        Ok(Self {
            reference,
            max_check,
            threshold,
            next_grid_index: 0,
            last: None,
            state: None,
            pending_begin: None,
            next_sequence: 1,
        })
    }

    /// Current state, `None` before the first sample
    pub fn state(&self) -> Option<VisibilityState> {
        self.state
    }

    /// Start of the window currently open, if its start was observed
    pub fn pending_begin(&self) -> Option<Instant> {
        self.pending_begin
    }

    /// Number of windows emitted so far
    pub fn windows_emitted(&self) -> u32 {
        self.next_sequence - 1
    }

    /// Sample every grid point up to and including `epoch`
    pub fn advance_to<G>(&mut self, epoch: &Instant, mut g: G) -> Vec<AccessWindow>
    where
        G: FnMut(&Instant) -> f64,
    {
        let end = seconds_between(epoch, &self.reference);
        let mut windows = Vec::new();

        loop {
            let offset = self.next_grid_index as f64 * self.max_check;
            if offset > end {
                break;
            }
            let sample_epoch = shifted(&self.reference, offset);
            if let Transition::WindowClosed(window) = self.sample(&sample_epoch, &mut g) {
                windows.push(window);
            }
            self.next_grid_index += 1;
        }

        windows
    }

    /// Sample up to the end of the horizon, including the end itself
    ///
    /// A window still open afterwards is left pending.
    pub fn finish<G>(&mut self, end: &Instant, mut g: G) -> Vec<AccessWindow>
    where
        G: FnMut(&Instant) -> f64,
    {
        let mut windows = self.advance_to(end, &mut g);

        let end_offset = seconds_between(end, &self.reference);
        if self.last.map_or(true, |s| s.offset < end_offset) {
            if let Transition::WindowClosed(window) = self.sample(end, &mut g) {
                windows.push(window);
            }
        }

        if self.state == Some(VisibilityState::AboveHorizon) {
            match self.pending_begin {
                Some(begin) => log::info!(
                    "Access opened at {} is still open at the end of the simulation",
                    format_utcg(&begin)
                ),
                None => log::info!("Station sees the satellite for the whole simulation"),
            }
        }

        windows
    }

    /// Feed one sample, refining any crossing since the previous one
    pub fn sample<G>(&mut self, epoch: &Instant, g: &mut G) -> Transition
    where
        G: FnMut(&Instant) -> f64,
    {
        let offset = seconds_between(epoch, &self.reference);
        let current = Sample {
            offset,
            value: g(epoch),
        };
        let now = VisibilityState::of(current.value);

        let (previous, state) = match (self.last, self.state) {
            (Some(previous), Some(state)) => (previous, state),
            _ => {
                self.last = Some(current);
                self.state = Some(now);
                if now == VisibilityState::AboveHorizon {
                    log::debug!("Satellite already visible at {}", format_utcg(epoch));
                }
                return Transition::Continue;
            }
        };

        if current.offset <= previous.offset {
            return Transition::Continue;
        }
        self.last = Some(current);

        if now == state {
            return Transition::Continue;
        }

        let crossing = shifted(&self.reference, self.refine(previous, current, g));
        self.state = Some(now);

        match now {
            VisibilityState::AboveHorizon => {
                log::debug!("Access begins at {}", format_utcg(&crossing));
                self.pending_begin = Some(crossing);
                Transition::Continue
            }
            VisibilityState::BelowHorizon => match self.pending_begin.take() {
                Some(start) => {
                    let window = AccessWindow {
                        sequence: self.next_sequence,
                        start,
                        stop: crossing,
                    };
                    self.next_sequence += 1;
                    log::debug!(
                        "Access #{} ends at {} after {:.3} s",
                        window.sequence,
                        format_utcg(&crossing),
                        window.duration()
                    );
                    Transition::WindowClosed(window)
                }
                None => {
                    log::info!(
                        "Access ending at {} started before the simulation, not recorded",
                        format_utcg(&crossing)
                    );
                    Transition::Continue
                }
            },
        }
    }

    /// Illinois regula falsi with a bisection fallback
    ///
    /// Returns the offset of the bracket end on the visible side.
    fn refine<G>(&self, a: Sample, b: Sample, g: &mut G) -> f64
    where
        G: FnMut(&Instant) -> f64,
    {
        let (mut ta, mut ga) = (a.offset, a.value);
        let (mut tb, mut gb) = (b.offset, b.value);
        let side_b = VisibilityState::of(gb);
        let mut last_replaced: Option<bool> = None;
        let mut last_width = f64::INFINITY;

        for _ in 0..MAX_REFINE_ITERATIONS {
            let width = tb - ta;
            if width < self.threshold {
                break;
            }

            let mut t = tb - gb * (tb - ta) / (gb - ga);
            if width > 0.5 * last_width || !t.is_finite() || t <= ta || t >= tb {
                t = 0.5 * (ta + tb);
            }
            last_width = width;

            let gt = g(&shifted(&self.reference, t));
            if VisibilityState::of(gt) == side_b {
                tb = t;
                gb = gt;
                if last_replaced == Some(true) {
                    ga *= 0.5;
                }
                last_replaced = Some(true);
            } else {
                ta = t;
                ga = gt;
                if last_replaced == Some(false) {
                    gb *= 0.5;
                }
                last_replaced = Some(false);
            }
        }

        match side_b {
            VisibilityState::AboveHorizon => tb,
            VisibilityState::BelowHorizon => ta,
        }
    }
}
