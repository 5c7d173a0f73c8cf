//! Mermaid Diagram Repair & Structural Check
//!
//! Models produce Mermaid that is almost right. The repairs here target the
//! mistakes that break rendering most often:
//!
//! | Problem                         | Repair                                  |
//! |---------------------------------|-----------------------------------------|
//! | wrapped in ```mermaid fences    | fences removed                          |
//! | non-breaking spaces             | replaced by plain spaces                |
//! | `A --> B: label` (flowchart)    | `A -->|label| B`                        |
//! | `A & C --> B` (flowchart)       | one edge per source/target pair         |
//! | `VARCHAR(255) name` (ER)        | `string name`                           |
//! | `name VARCHAR(255)` (ER)        | `string name`                           |
//! | `customer { ... }` (ER)         | `CUSTOMER { ... }`                      |
//!
//! After repair, [`check_mermaid`] verifies the header matches the requested
//! kind and that brackets and quotes balance.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::types::{Result, SrsError};

static FLOW_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<src>\S.*?)\s*(?P<arrow>-\.+->|={2,}>|-{2,}>|-{3,}|-\.+-)\s*(?P<rest>\S.*)$")
        .expect("valid flowchart edge regex")
});

static ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\.+->|={2,}>|-{2,}>|-{3,}|-\.+-").expect("valid arrow regex"));

static ER_RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<indent>\s*)(?P<left>[A-Za-z_][\w-]*)\s*(?P<card>[|}][o|](?:--|\.\.)[o|][|{])\s*(?P<right>[A-Za-z_][\w-]*)\s*:\s*(?P<label>.+)$",
    )
    .expect("valid ER relationship regex")
});

static ER_CARDINALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[|}][o|](?:--|\.\.)[o|][|{]").expect("valid ER cardinality regex")
});

static ER_ENTITY_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<name>[A-Za-z_][\w-]*)\s*\{\s*$").expect("valid ER entity regex")
});

static ER_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<type>[A-Za-z_][\w]*(?:\s*\([^)]*\))?)(?P<rest>\s+\S.*)$")
        .expect("valid ER attribute regex")
});

/// `name TYPE [keys]`, the column order SQL uses
static ER_ATTRIBUTE_SQL_ORDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<indent>\s*)(?P<name>[A-Za-z_][\w-]*)\s+(?P<type>[A-Za-z_]\w*(?:\s*\([^)]*\))?)(?P<rest>(?:\s.*)?)$",
    )
    .expect("valid ER SQL-order attribute regex")
});

/// Sequence arrows whose heads look like brackets (`-)`, `--)`, ...)
static SEQUENCE_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<-{1,2}>>|-{1,2}(?:>>|>|x|\))").expect("valid sequence arrow regex")
});

// =============================================================================
// Diagram Kind
// =============================================================================

/// Diagram kinds the drafting tool produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    Er,
}

impl DiagramKind {
    /// Parse a user-facing kind name ("er", "flowchart", "sequence", ...)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "flowchart" | "flow" | "graph" | "dfd" | "activity" => Some(Self::Flowchart),
            "sequence" | "sequencediagram" => Some(Self::Sequence),
            "class" | "classdiagram" => Some(Self::Class),
            "state" | "statediagram" => Some(Self::State),
            "er" | "erd" | "erdiagram" | "entity-relationship" => Some(Self::Er),
            _ => None,
        }
    }

    /// Detect the kind from a diagram's first line
    pub fn from_header(line: &str) -> Option<Self> {
        let lower = line.trim().to_lowercase();

        if lower.starts_with("graph") || lower.starts_with("flowchart") {
            Some(Self::Flowchart)
        } else if lower.starts_with("sequencediagram") {
            Some(Self::Sequence)
        } else if lower.starts_with("classdiagram") {
            Some(Self::Class)
        } else if lower.starts_with("statediagram") {
            Some(Self::State)
        } else if lower.starts_with("erdiagram") {
            Some(Self::Er)
        } else {
            None
        }
    }

    /// Header the model is asked to start with
    pub fn header(&self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart TD",
            Self::Sequence => "sequenceDiagram",
            Self::Class => "classDiagram",
            Self::State => "stateDiagram-v2",
            Self::Er => "erDiagram",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::State => "state",
            Self::Er => "er",
        }
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Repair
// =============================================================================

/// Repair, then check. The returned source is what callers should render.
pub fn normalize_diagram(source: &str, kind: DiagramKind) -> Result<String> {
    let repaired = repair_mermaid(source, kind);
    check_mermaid(&repaired, kind)?;
    Ok(repaired)
}

/// Apply all syntax repairs for `kind`
pub fn repair_mermaid(source: &str, kind: DiagramKind) -> String {
    let cleaned = strip_mermaid_fence(source).replace(['\u{00A0}', '\u{202F}', '\u{2007}'], " ");

    let lines: Vec<String> = match kind {
        DiagramKind::Flowchart => cleaned.lines().flat_map(repair_flowchart_line).collect(),
        DiagramKind::Er => repair_er_lines(&cleaned),
        _ => cleaned.lines().map(String::from).collect(),
    };

    let repaired = lines.join("\n").trim().to_string();
    if repaired != cleaned.trim() {
        debug!(%kind, "Diagram source repaired");
    }
    repaired
}

/// Remove a surrounding ```mermaid (or bare ```) fence
pub fn strip_mermaid_fence(source: &str) -> &str {
    let trimmed = source.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = after_open
        .strip_prefix("mermaid")
        .unwrap_or(after_open);
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim()
}

fn is_flowchart_directive(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.starts_with("%%")
        || trimmed.starts_with("graph")
        || trimmed.starts_with("flowchart")
        || trimmed.starts_with("subgraph")
        || trimmed == "end"
        || trimmed.starts_with("style")
        || trimmed.starts_with("classDef")
        || trimmed.starts_with("class ")
        || trimmed.starts_with("linkStyle")
        || trimmed.starts_with("click")
}

/// Rewrite one flowchart line into one or more edges
fn repair_flowchart_line(line: &str) -> Vec<String> {
    if is_flowchart_directive(line.trim()) {
        return vec![line.to_string()];
    }

    let Some(caps) = FLOW_EDGE.captures(line) else {
        return vec![line.to_string()];
    };

    let indent = &caps["indent"];
    let src = &caps["src"];
    let arrow = &caps["arrow"];
    let rest = &caps["rest"];

    // Chains (A --> B --> C) are left alone
    if ARROW.is_match(rest) {
        return vec![line.to_string()];
    }

    let (label, targets) = if let Some(piped) = rest.strip_prefix('|') {
        match piped.split_once('|') {
            Some((label, target)) => (Some(label.trim().to_string()), target.trim()),
            None => return vec![line.to_string()],
        }
    } else {
        match split_top_level(rest, ':') {
            Some((target, label)) if !label.trim().is_empty() => {
                (Some(label.trim().to_string()), target.trim())
            }
            _ => (None, rest.trim()),
        }
    };

    let label_part = label.map(|l| format!("|{}|", l)).unwrap_or_default();
    let sources = split_all_top_level(src, '&');
    let targets = split_all_top_level(targets, '&');

    let mut edges = Vec::with_capacity(sources.len() * targets.len());
    for source in &sources {
        for target in &targets {
            edges.push(format!("{indent}{source} {arrow}{label_part} {target}"));
        }
    }
    edges
}

/// Split at the first lone `sep` outside brackets and quotes.
/// Repeated separators (`B:::hot` class shorthand) never split.
fn split_top_level(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut depth: i32 = 0;
    let mut in_quote = false;

    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            '[' | '(' | '{' if !in_quote => depth += 1,
            ']' | ')' | '}' if !in_quote => depth -= 1,
            c if c == sep && !in_quote && depth == 0 => {
                let after = &text[idx + c.len_utf8()..];
                if !text[..idx].ends_with(sep) && !after.starts_with(sep) {
                    return Some((&text[..idx], after));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_all_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut remaining = text;
    while let Some((head, tail)) = split_top_level(remaining, sep) {
        parts.push(head.trim().to_string());
        remaining = tail;
    }
    parts.push(remaining.trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}

fn repair_er_lines(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_entity = false;

    for line in source.lines() {
        let trimmed = line.trim();

        if in_entity {
            if trimmed == "}" {
                in_entity = false;
                out.push(line.to_string());
            } else {
                out.push(repair_er_attribute(line).unwrap_or_else(|| line.to_string()));
            }
            continue;
        }

        if let Some(caps) = ER_ENTITY_OPEN.captures(line) {
            in_entity = true;
            out.push(format!(
                "{}{} {{",
                &caps["indent"],
                caps["name"].to_uppercase()
            ));
        } else if let Some(caps) = ER_RELATIONSHIP.captures(line) {
            out.push(format!(
                "{}{} {} {} : {}",
                &caps["indent"],
                caps["left"].to_uppercase(),
                &caps["card"],
                caps["right"].to_uppercase(),
                caps["label"].trim()
            ));
        } else {
            out.push(line.to_string());
        }
    }

    out
}

/// Rewrite one entity attribute to `type name [keys]` with a mapped type.
///
/// A known type in front wins (`VARCHAR(255) name`, `date created`); otherwise
/// a known type in second position is taken as SQL order (`name VARCHAR(255)`).
fn repair_er_attribute(line: &str) -> Option<String> {
    if let Some(caps) = ER_ATTRIBUTE.captures(line)
        && let Some(mapped) = known_sql_type(&caps["type"])
    {
        return Some(format!("{}{}{}", &caps["indent"], mapped, &caps["rest"]));
    }

    let caps = ER_ATTRIBUTE_SQL_ORDER.captures(line)?;
    let mapped = known_sql_type(&caps["type"])?;
    Some(format!(
        "{}{} {}{}",
        &caps["indent"],
        mapped,
        &caps["name"],
        &caps["rest"]
    ))
}

fn known_sql_type(sql_type: &str) -> Option<&'static str> {
    let base = sql_type
        .split('(')
        .next()
        .unwrap_or(sql_type)
        .trim()
        .to_uppercase();

    match base.as_str() {
        "VARCHAR" | "NVARCHAR" | "CHAR" | "NCHAR" | "TEXT" | "STRING" | "UUID" | "ENUM" => {
            Some("string")
        }
        "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "SERIAL" | "BIGSERIAL" => Some("int"),
        "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" | "MONEY" => Some("float"),
        "BOOLEAN" | "BOOL" | "BIT" => Some("boolean"),
        "DATE" | "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" | "TIME" => Some("datetime"),
        _ => None,
    }
}

/// Map an SQL column type to the small vocabulary Mermaid ER renders cleanly
pub fn map_sql_type(sql_type: &str) -> String {
    known_sql_type(sql_type)
        .map(String::from)
        .unwrap_or_else(|| sql_type.to_string())
}

// =============================================================================
// Structural Check
// =============================================================================

/// Verify header, bracket balance and quote balance
pub fn check_mermaid(source: &str, kind: DiagramKind) -> Result<()> {
    let first_line = source
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("%%"))
        .ok_or_else(|| SrsError::domain("diagram_syntax", "Generated diagram is empty"))?;

    match DiagramKind::from_header(first_line) {
        Some(found) if found == kind => {}
        Some(found) => {
            return Err(SrsError::domain(
                "diagram_syntax",
                format!("Expected a {} diagram but got a {} diagram", kind, found),
            ));
        }
        None => {
            return Err(SrsError::domain(
                "diagram_syntax",
                format!(
                    "Unknown diagram header '{}'; expected '{}'",
                    first_line.chars().take(30).collect::<String>(),
                    kind.header()
                ),
            ));
        }
    }

    // Arrow heads that look like brackets are not counted
    let body = match kind {
        DiagramKind::Er => ER_CARDINALITY.replace_all(source, "--").into_owned(),
        DiagramKind::Sequence => SEQUENCE_ARROW.replace_all(source, "->").into_owned(),
        _ => source.to_string(),
    };

    check_balanced_brackets(&body, kind == DiagramKind::Flowchart)?;
    check_quotes(&body)
}

/// `asymmetric_nodes` enables the flowchart `id>text]` shape, where `>`
/// right after a node id opens the `]`
fn check_balanced_brackets(content: &str, asymmetric_nodes: bool) -> Result<()> {
    let mut brace: i32 = 0;
    let mut bracket: i32 = 0;
    let mut paren: i32 = 0;
    let mut in_string = false;
    let mut in_edge_label = false;
    let mut prev: Option<char> = None;

    for ch in content.chars() {
        if in_string {
            if ch == '"' {
                in_string = false;
            }
            continue;
        }

        let top_level = brace == 0 && bracket == 0 && paren == 0;
        match ch {
            '"' => in_string = true,
            '{' => brace += 1,
            '}' => brace -= 1,
            '[' => bracket += 1,
            ']' => bracket -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            '|' if asymmetric_nodes && top_level => in_edge_label = !in_edge_label,
            '>' if asymmetric_nodes
                && top_level
                && !in_edge_label
                && prev.is_some_and(|p| p.is_alphanumeric() || p == '_') =>
            {
                bracket += 1
            }
            '\n' => in_edge_label = false,
            _ => {}
        }
        prev = Some(ch);

        if brace < 0 || bracket < 0 || paren < 0 {
            return Err(SrsError::domain(
                "diagram_syntax",
                "Diagram has a closing bracket without a matching opening",
            ));
        }
    }

    if brace != 0 || bracket != 0 || paren != 0 {
        return Err(SrsError::domain(
            "diagram_syntax",
            format!(
                "Diagram has unbalanced brackets: braces={}, brackets={}, parens={}",
                brace, bracket, paren
            ),
        ));
    }
    Ok(())
}

fn check_quotes(content: &str) -> Result<()> {
    if content.chars().filter(|&c| c == '"').count() % 2 != 0 {
        return Err(SrsError::domain(
            "diagram_syntax",
            "Diagram has unmatched double quotes",
        ));
    }
    Ok(())
}
