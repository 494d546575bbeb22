use thiserror::Error;

/// Top-level error type for the stride crates.
#[derive(Debug, Error)]
pub enum StrideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Duplicate foot name: {0}")]
    DuplicateFoot(String),
}

/// Contract violations on the constraint terms, collections and engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("No evaluation point set: call set_current_state_and_control first")]
    NotConfigured,

    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),

    #[error("Duplicate constraint name: {0}")]
    DuplicateConstraint(String),

    #[error("Constraint {name} expects a {expected} payload, got {got}")]
    ConfigMismatch {
        name: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Constraint {name}: {what} has shape {got_rows}x{got_cols}, expected {expected}")]
    ShapeMismatch {
        name: String,
        what: &'static str,
        got_rows: usize,
        got_cols: usize,
        expected: String,
    },

    #[error("Foot count mismatch: configured {configured}, {source_name} reports {reported}")]
    FootCountMismatch {
        configured: usize,
        reported: usize,
        source_name: &'static str,
    },
}

/// Contact-schedule errors.
///
/// Copy + static messages for cheap propagation on the evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Contact mode {mode} out of range for {num_feet} feet")]
    InvalidMode { mode: u32, num_feet: usize },

    #[error("Length mismatch: {times} times, {values} values")]
    LengthMismatch { times: usize, values: usize },

    #[error("Times must be sorted in non-decreasing order (violation at index {index})")]
    UnsortedTimes { index: usize },

    #[error("Foot index {foot} out of range for {num_feet} feet")]
    FootOutOfRange { foot: usize, num_feet: usize },

    #[error("Time at index {index} is not finite")]
    NonFiniteTime { index: usize },

    #[error("Too many feet for a contact mode: {num_feet}")]
    TooManyFeet { num_feet: usize },

    #[error("Invalid gait parameter {parameter}: {reason}")]
    InvalidGait {
        parameter: &'static str,
        reason: &'static str,
    },
}

/// Malformed terrain geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("Polygon vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },

    #[error("Polygon is not convex at vertex {index}")]
    NonConvex { index: usize },
}
