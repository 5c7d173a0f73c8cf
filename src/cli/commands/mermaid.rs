//! Mermaid Command
//!
//! Offline diagram repair: reads Mermaid source (fenced or not), applies the
//! repairs for the given kind, checks the result, and prints it.
//!
//! Usage:
//!   srsmith mermaid schema.mmd --kind er
//!   srsmith mermaid flow.md --check-only

use std::path::Path;

use crate::ai::normalize::{check_mermaid, normalize_diagram, strip_mermaid_fence};
use crate::cli::commands::draft::parse_kind;
use crate::cli::ui::Output;
use crate::cli::util::read_file;
use crate::types::Result;

pub fn run(path: &Path, kind: Option<&str>, check_only: bool) -> Result<()> {
    let output = Output::new();
    let kind = parse_kind(kind)?;
    let source = read_file(path)?;

    if check_only {
        check_mermaid(strip_mermaid_fence(&source), kind)?;
        output.success(&format!("Valid {} diagram", kind));
        return Ok(());
    }

    let repaired = normalize_diagram(&source, kind)?;
    if repaired != strip_mermaid_fence(&source) {
        output.info("Diagram source was repaired");
    }
    println!("{}", repaired);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SrsError;
    use tempfile::TempDir;

    #[test]
    fn test_repairs_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("flow.mmd");
        std::fs::write(&path, "flowchart TD\nA & B --> C: go\n").unwrap();
        assert!(run(&path, Some("flowchart"), false).is_ok());
    }

    #[test]
    fn test_check_only_reports_unrepaired_problems() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.mmd");
        std::fs::write(&path, "sequenceDiagram\nAlice->>Bob: hi").unwrap();

        let err = run(&path, Some("er"), true).unwrap_err();
        assert!(matches!(err, SrsError::DomainInvariantViolation { .. }));
    }
}
