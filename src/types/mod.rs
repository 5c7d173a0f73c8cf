pub mod error;

pub use error::{AttemptFailure, AttemptKind, ErrorCategory, ErrorClassifier, Result, SrsError};
