//! Error taxonomy for scenario setup, propagation and output

/// Errors raised by the simulation core
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Missing or unparseable scenario parameter
    Config { key: String, message: String },

    /// Orbital elements the selected model cannot propagate
    OrbitDegenerate {
        parameter: &'static str,
        value: f64,
        reason: String,
    },

    /// Body position coincides with the frame origin, or a frame cannot be built
    DegenerateGeometry { context: String },

    /// A local orbital frame was used at an epoch other than the one it was built for
    FrameEpochMismatch { offset_seconds: f64 },

    /// External writer failure
    OutputSink { target: String, message: String },
}

/// Convenience alias used across the crate
pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn degenerate_orbit(parameter: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Self::OrbitDegenerate {
            parameter,
            value,
            reason: reason.into(),
        }
    }

    pub fn degenerate_geometry(context: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            context: context.into(),
        }
    }

    pub fn sink(target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::OutputSink {
            target: target.into(),
            message: err.to_string(),
        }
    }

    /// Fatal errors abort before or during setup; the rest are recoverable
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::OrbitDegenerate { .. })
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config { key, message } => {
                write!(f, "Configuration error for <{}>: {}", key, message)
            }
            Self::OrbitDegenerate {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid orbit: {} = {} ({})", parameter, value, reason)
            }
            Self::DegenerateGeometry { context } => {
                write!(f, "Degenerate geometry: {}", context)
            }
            Self::FrameEpochMismatch { offset_seconds } => {
                write!(
                    f,
                    "Local orbital frame used {:.6} s away from its own epoch",
                    offset_seconds
                )
            }
            Self::OutputSink { target, message } => {
                write!(f, "Writing to {} failed: {}", target, message)
            }
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_value() {
        let err = SimError::degenerate_orbit("eccentricity", 1.2, "must be below 1");
        let text = err.to_string();
        assert!(text.contains("eccentricity"));
        assert!(text.contains("1.2"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_geometry_and_sink_errors_are_recoverable() {
        assert!(!SimError::degenerate_geometry("earth at origin").is_fatal());
        assert!(!SimError::sink("sun.csv", "disk full").is_fatal());
        assert!(SimError::config("SimTimeStep", "not a number").is_fatal());
    }
}
