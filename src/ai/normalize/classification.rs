//! Enumerated-value checks
//!
//! Two flavors:
//! - [`match_allowed`]: containment against an allow-list, used for free-text
//!   classifications such as the recommended process model ("Agile (Scrum)")
//! - [`canonical_choice`]: case-insensitive exact match returning the
//!   canonical spelling, used for small closed enums (priority, severity)

use crate::types::{Result, SrsError};

/// Find the allow-list entry contained in `value`
///
/// Matching is case-sensitive substring containment, so "Agile (Scrum)" is
/// accepted as "Agile". The value itself is not rewritten by callers. The
/// first matching entry in allow-list order wins.
pub fn match_allowed(field: &str, value: &str, allowed: &[&'static str]) -> Result<&'static str> {
    allowed
        .iter()
        .copied()
        .find(|candidate| value.contains(candidate))
        .ok_or_else(|| {
            SrsError::domain(
                field,
                format!(
                    "Unrecognized {} '{}'; expected one of: {}",
                    field.replace('_', " "),
                    value,
                    allowed.join(", ")
                ),
            )
        })
}

/// Map `value` to its canonical spelling from `choices`, ignoring case
pub fn canonical_choice(field: &str, value: &str, choices: &[&'static str]) -> Result<&'static str> {
    let trimmed = value.trim();
    choices
        .iter()
        .copied()
        .find(|choice| choice.eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| {
            SrsError::domain(
                field,
                format!(
                    "Invalid {} '{}'; expected one of: {}",
                    field.replace('_', " "),
                    value,
                    choices.join(", ")
                ),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::normalize::{PRIORITIES, SDLC_MODELS};
    use crate::types::ErrorCategory;

    #[test]
    fn test_exact_and_contained_models() {
        assert_eq!(match_allowed("sdlc_model", "Agile", &SDLC_MODELS).unwrap(), "Agile");
        assert_eq!(
            match_allowed("sdlc_model", "Scrum (an Agile framework)", &SDLC_MODELS).unwrap(),
            "Agile"
        );
        assert_eq!(match_allowed("sdlc_model", "V-Model", &SDLC_MODELS).unwrap(), "V-Model");
    }

    #[test]
    fn test_containment_accepts_negated_name() {
        // Plain containment cannot see negation
        assert_eq!(match_allowed("sdlc_model", "Non-Agile", &SDLC_MODELS).unwrap(), "Agile");
    }

    #[test]
    fn test_unknown_model_is_domain_error() {
        let err = match_allowed("sdlc_model", "Cowboy coding", &SDLC_MODELS).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Domain);
        assert!(err.to_string().contains("Cowboy coding"));
    }

    #[test]
    fn test_case_sensitive_containment() {
        assert!(match_allowed("sdlc_model", "agile", &SDLC_MODELS).is_err());
    }

    #[test]
    fn test_canonical_choice() {
        assert_eq!(canonical_choice("priority", "high", &PRIORITIES).unwrap(), "High");
        assert_eq!(canonical_choice("priority", " MEDIUM ", &PRIORITIES).unwrap(), "Medium");
        assert!(canonical_choice("priority", "Urgent", &PRIORITIES).is_err());
    }
}
