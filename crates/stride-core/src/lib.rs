// stride-core: contact types, configuration and errors for the stride constraint engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConstraintOptions, MAX_FEET, PositionPolicy};
pub use error::{ConfigError, ConstraintError, GeometryError, ScheduleError, StrideError};
pub use types::{ContactFlags, ContactMode};
