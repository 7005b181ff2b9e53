//! Propagator model selection
//!
//! The set of models is closed: a scenario picks one by name and the driver
//! only ever sees the resulting [`Propagator`].

use satkit::Instant;

use super::elements::OrbitElements;
use super::keplerian::KeplerianPropagator;
use super::state::SpacecraftState;
use super::zonal::{ZonalHarmonics, ZonalPropagator};
use super::OrbitPropagator;
use crate::error::{SimError, SimResult};

const ALL_MODELS: &[PropagatorModel] = &[
    PropagatorModel::Keplerian,
    PropagatorModel::ZonalHarmonic(ZonalHarmonics::EIGEN5C),
];

/// Propagation model chosen at configuration time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropagatorModel {
    /// Two-body motion, no perturbations
    Keplerian,
    /// Analytic J2/J3 model for near-circular orbits
    ZonalHarmonic(ZonalHarmonics),
}

impl PropagatorModel {
    /// Display name for the model
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keplerian => "Keplerian",
            Self::ZonalHarmonic(_) => "Zonal harmonic (Eckstein-Hechler)",
        }
    }

    /// Settings value selecting this model
    pub fn key(&self) -> &'static str {
        match self {
            Self::Keplerian => "keplerian",
            Self::ZonalHarmonic(_) => "zonal",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Keplerian => "Closed-form two-body propagation. Exact for an isolated point-mass Earth.",
            Self::ZonalHarmonic(_) => "Closed-form propagation with Earth oblateness. Near-circular, non-equatorial orbits only.",
        }
    }

    /// All available models
    pub fn all() -> &'static [PropagatorModel] {
        ALL_MODELS
    }

    /// Parse a settings value such as `keplerian` or `zonal`
    pub fn parse(text: &str) -> SimResult<Self> {
        let wanted = text.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "keplerian" | "kepler" | "twobody" => Ok(Self::Keplerian),
            "zonal" | "eckstein-hechler" | "ecksteinhechler" => {
                Ok(Self::ZonalHarmonic(ZonalHarmonics::EIGEN5C))
            }
            _ => Err(SimError::config(
                "PropagatorModel",
                format!(
                    "unknown model '{}', expected one of: {}",
                    text,
                    Self::all()
                        .iter()
                        .map(|m| m.key())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }

    /// Build a propagator for the given elements
    pub fn build(&self, elements: &OrbitElements) -> SimResult<Propagator> {
        let propagator = match self {
            Self::Keplerian => Propagator::Keplerian(KeplerianPropagator::new(*elements)?),
            Self::ZonalHarmonic(harmonics) => {
                Propagator::ZonalHarmonic(ZonalPropagator::new(*elements, *harmonics)?)
            }
        };
        log::info!("Using {} propagator", self.name());
        Ok(propagator)
    }
}

impl Default for PropagatorModel {
    fn default() -> Self {
        Self::ZonalHarmonic(ZonalHarmonics::EIGEN5C)
    }
}

/// A built propagator of one of the supported models
#[derive(Debug, Clone)]
pub enum Propagator {
    Keplerian(KeplerianPropagator),
    ZonalHarmonic(ZonalPropagator),
}

impl OrbitPropagator for Propagator {
    fn propagate(&self, epoch: &Instant) -> SpacecraftState {
        match self {
            Self::Keplerian(p) => p.propagate(epoch),
            Self::ZonalHarmonic(p) => p.propagate(epoch),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Keplerian(p) => p.name(),
            Self::ZonalHarmonic(p) => p.name(),
        }
    }

    fn initial_elements(&self) -> &OrbitElements {
        match self {
            Self::Keplerian(p) => p.initial_elements(),
            Self::ZonalHarmonic(p) => p.initial_elements(),
        }
    }
}
