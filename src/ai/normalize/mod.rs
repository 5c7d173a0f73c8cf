//! Domain Response Normalizers
//!
//! Pure post-processing applied after schema validation. Each function either
//! returns the normalized value or a terminal
//! [`SrsError::DomainInvariantViolation`](crate::types::SrsError).
//!
//! - `confidence`: numeric coercion and clamping
//! - `classification`: allow-list and closed-enum checks
//! - `code_edit`: code-structure preservation for text edits
//! - `diagram`: Mermaid repair and structural check

mod classification;
mod code_edit;
mod confidence;
mod diagram;

pub use classification::{canonical_choice, match_allowed};
pub use code_edit::{
    check_code_preserved, contains_code, requests_code_change, strip_comments, strip_fenced_code,
    structural_text,
};
pub use confidence::{apply_confidence, clamp_number, normalize_confidence};
pub use diagram::{
    DiagramKind, check_mermaid, map_sql_type, normalize_diagram, repair_mermaid,
    strip_mermaid_fence,
};

pub(crate) use confidence::number;
