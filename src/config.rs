//! Scenario configuration
//!
//! Settings arrive as string key/value pairs from a [`SettingsProvider`].
//! They are parsed and validated once into an immutable [`ScenarioConfig`]
//! that the simulation borrows.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use satkit::Instant;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::frames::GroundStation;
use crate::propagation::{OrbitElements, PropagatorModel, ALTITUDE_REFERENCE_RADIUS_M};
use crate::time::{epoch_from_calendar, TimeScale, SECONDS_PER_DAY};

/// Source of raw setting values
pub trait SettingsProvider {
    /// Raw value for `key`, if present
    fn value(&self, key: &str) -> Option<String>;
}

/// Ordered string settings, persisted as a flat JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Built-in scenario: 700 km sun-synchronous orbit over Freiburg
    pub fn defaults() -> Self {
        let name = "ERNST";
        let prefix = format!("{}_i98_a700", name);
        let pairs = [
            ("SatelliteName", name.to_string()),
            ("SatAltitude", "700000".to_string()),
            ("SatEccentricity", "0".to_string()),
            ("SatInclination", "98.1929".to_string()),
            ("SatOmega", "0".to_string()),
            ("SatRAAN", "10.5834".to_string()),
            ("SatMeanAnomaly", "0".to_string()),
            ("TargetLat", "48.001081".to_string()),
            ("TargetLon", "7.846619".to_string()),
            ("TargetAlt", "320".to_string()),
            ("SimStartYear", "2020".to_string()),
            ("SimStartMonth", "1".to_string()),
            ("SimStartDay", "1".to_string()),
            ("SimStartHour", "0".to_string()),
            ("SimStartMinute", "0".to_string()),
            ("SimStartSecond", "0.000".to_string()),
            ("SimTimeScale", "UTC".to_string()),
            ("SimDurationInDays", "1.0".to_string()),
            ("SimTimeStep", "60".to_string()),
            ("SimMaxCheck", "60".to_string()),
            ("SimDivThreshold", "0.001".to_string()),
            ("SimMinElevation", "0".to_string()),
            ("PropagatorModel", "zonal".to_string()),
            ("ExpFileSunAngles", format!("{}_SunAngles.csv", prefix)),
            ("ExpFileEarthAngles", format!("{}_EarthAngles.csv", prefix)),
            ("ExpFileAccessTimes", format!("{}_AccessTimes.csv", prefix)),
            ("ResultsDirectory", "results".to_string()),
        ];

        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load settings from a JSON object; numbers and booleans are kept as text
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open settings file: {:?}", path))?;

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse settings JSON: {:?}", path))?;

        let values = raw
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();

        Ok(Self { values })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let file = File::create(path).with_context(|| format!("Failed to create settings file: {:?}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    /// Load settings, falling back to (and writing out) the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded {} settings from {:?}", settings.len(), path);
                settings
            }
            Err(e) => {
                log::warn!("{:#}; using default settings", e);
                let defaults = Self::defaults();
                match defaults.save(path) {
                    Ok(()) => log::info!("Default settings written to {:?}", path),
                    Err(e) => log::warn!("Could not write default settings: {:#}", e),
                }
                defaults
            }
        }
    }
}

impl SettingsProvider for Settings {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl SettingsProvider for BTreeMap<String, String> {
    fn value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Names of the three result files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub directory: PathBuf,
    pub sun_angles: String,
    pub earth_angles: String,
    pub access_times: String,
}

impl OutputFiles {
    pub fn sun_angles_path(&self) -> PathBuf {
        self.directory.join(&self.sun_angles)
    }

    pub fn earth_angles_path(&self) -> PathBuf {
        self.directory.join(&self.earth_angles)
    }

    pub fn access_times_path(&self) -> PathBuf {
        self.directory.join(&self.access_times)
    }
}

/// Validated scenario description
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub satellite_name: String,
    pub elements: OrbitElements,
    pub model: PropagatorModel,
    pub station: GroundStation,
    pub start: Instant,
    /// Horizon length (s)
    pub duration: f64,
    /// Output step (s)
    pub step: f64,
    /// Visibility sampling interval (s)
    pub max_check: f64,
    /// Crossing refinement threshold (s)
    pub convergence_threshold: f64,
    /// Minimum station elevation (deg)
    pub min_elevation: f64,
    pub outputs: OutputFiles,
}

impl ScenarioConfig {
    /// Parse and validate every scenario setting
    pub fn from_provider(provider: &dyn SettingsProvider) -> SimResult<Self> {
        let scale = TimeScale::parse(&required::<String>(provider, "SimTimeScale")?)?;
        let start = epoch_from_calendar(
            required(provider, "SimStartYear")?,
            required(provider, "SimStartMonth")?,
            required(provider, "SimStartDay")?,
            required(provider, "SimStartHour")?,
            required(provider, "SimStartMinute")?,
            required(provider, "SimStartSecond")?,
            scale,
        )?;

        let semi_major_axis = match optional::<f64>(provider, "SatSemiMajorAxis")? {
            Some(a) => a,
            None => required::<f64>(provider, "SatAltitude")? + ALTITUDE_REFERENCE_RADIUS_M,
        };
        let elements = OrbitElements::from_degrees(
            semi_major_axis,
            required(provider, "SatEccentricity")?,
            required(provider, "SatInclination")?,
            required(provider, "SatOmega")?,
            required(provider, "SatRAAN")?,
            required(provider, "SatMeanAnomaly")?,
            start,
        );

        let model = PropagatorModel::parse(&required::<String>(provider, "PropagatorModel")?)?;

        let station = GroundStation::from_degrees(
            required(provider, "TargetLat")?,
            required(provider, "TargetLon")?,
            required(provider, "TargetAlt")?,
        )?;

        let duration = positive(provider, "SimDurationInDays")? * SECONDS_PER_DAY;
        let step = positive(provider, "SimTimeStep")?;
        let max_check = positive(provider, "SimMaxCheck")?;
        let convergence_threshold = positive(provider, "SimDivThreshold")?;

        let min_elevation: f64 = required(provider, "SimMinElevation")?;
        if !min_elevation.is_finite() || min_elevation.abs() > 90.0 {
            return Err(SimError::config(
                "SimMinElevation",
                format!("{} is outside [-90, 90] degrees", min_elevation),
            ));
        }

        let config = Self {
            satellite_name: required(provider, "SatelliteName")?,
            elements,
            model,
            station,
            start,
            duration,
            step,
            max_check,
            convergence_threshold,
            min_elevation,
            outputs: OutputFiles {
                directory: PathBuf::from(required::<String>(provider, "ResultsDirectory")?),
                sun_angles: required(provider, "ExpFileSunAngles")?,
                earth_angles: required(provider, "ExpFileEarthAngles")?,
                access_times: required(provider, "ExpFileAccessTimes")?,
            },
        };

        if config.step_count() < 1 {
            return Err(SimError::config(
                "SimTimeStep",
                format!(
                    "step of {} s leaves no sample in a {} s simulation",
                    step, duration
                ),
            ));
        }

        Ok(config)
    }

    /// Number of output samples, `round(duration / step)`
    pub fn step_count(&self) -> usize {
        (self.duration / self.step).round() as usize
    }
}

fn required<T: FromStr>(provider: &dyn SettingsProvider, key: &str) -> SimResult<T> {
    optional(provider, key)?.ok_or_else(|| SimError::config(key, "missing value"))
}

fn optional<T: FromStr>(provider: &dyn SettingsProvider, key: &str) -> SimResult<Option<T>> {
    match provider.value(key) {
        None => Ok(None),
        Some(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SimError::config(key, format!("cannot parse '{}'", text))),
    }
}

fn positive(provider: &dyn SettingsProvider, key: &str) -> SimResult<f64> {
    let value: f64 = required(provider, key)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::config(key, format!("{} must be positive", value)));
    }
    Ok(value)
}
