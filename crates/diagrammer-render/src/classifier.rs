// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fast, renderer-free classification of diagram descriptions.
//!
//! The diagram type comes from the leading keyword. Node counts are a
//! best-effort structural estimate (distinct identifiers referenced by
//! edges and declarations), not an exact parse: exotic syntax such as
//! arrows inside quoted labels can skew them.

use std::collections::HashSet;
use std::sync::LazyLock;

use diagrammer_core::{ClassificationResult, DiagramKind};
use regex::Regex;
use serde::Serialize;

static RE_LINK_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^-=.])(?:--|==|-\.)\s+[^-=|>\s][^-=|>]*?\s+(?:-->|==>|\.->|---|===)")
        .unwrap()
});
static RE_FLOW_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*<?(?:-{2,}|={2,}|-\.+-)(?:>|[xo]\s)?\s*(?:\|[^|]*\|)?\s*").unwrap()
});
static RE_NODE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+(?:-\w+)*)").unwrap());
static RE_STATE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^state\s+(?:"[^"]*"\s+as\s+)?(\w+)"#).unwrap()
});
static RE_SEQ_ACTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:participant|actor)\s+(\S+?)(?:\s+as\s+.+)?$").unwrap()
});
static RE_SEQ_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+?)\s*(?:-->>|->>|--\)|-\)|--x|-x|-->|->)\s*[+-]?(\S+?)\s*:").unwrap()
});
static RE_CLASS_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^class\s+(\w+)").unwrap());
static RE_CLASS_RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r#"^(\w+)\s*(?:"[^"]*"\s*)?"#,
            r"(?:<\|--|--\|>|\*--|--\*|o--|--o|<--|-->|\.\.\|>|<\|\.\.|\.\.>|<\.\.|--|\.\.)",
            r#"\s*(?:"[^"]*"\s*)?(\w+)"#,
        ),
    )
    .unwrap()
});
static RE_CLASS_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*:\s*\S").unwrap());
static RE_ER_RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w-]+)\s*[|}o]{2}(?:--|\.\.)[|{o]{2}\s*([\w-]+)").unwrap()
});
static RE_ER_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w-]+)\s*\{").unwrap());
static RE_PIE_SLICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"[^"]*"\s*:\s*-?[0-9.]+"#).unwrap());

/// Leading keywords accepted by [`classify`], in display order.
pub const KNOWN_KEYWORDS: &[&str] = &[
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "erDiagram",
    "stateDiagram",
    "gantt",
    "pie",
    "gitGraph",
];

const FLOW_SKIP: &[&str] = &[
    "subgraph", "end", "style", "classDef", "class", "click", "linkStyle", "direction",
];
const STATE_SKIP: &[&str] = &["note", "direction", "classDef", "class", "--", "}"];
const GANTT_SKIP: &[&str] = &[
    "title",
    "dateFormat",
    "axisFormat",
    "tickInterval",
    "section",
    "excludes",
    "includes",
    "todayMarker",
    "weekday",
    "accTitle",
    "accDescr",
];

/// Classifies a description without invoking the renderer.
///
/// A description whose first statement starts with a known keyword is
/// always `valid`; anything suspicious beyond that is reported as a warning.
pub fn classify(description: &str) -> ClassificationResult {
    let line_count = description.trim().lines().count();
    let body = strip_comments(&strip_frontmatter(description));

    let Some((header, rest)) = split_header(&body) else {
        return invalid(line_count, "diagram description is empty".to_string());
    };

    let Some(kind) = detect_kind(header) else {
        return invalid(
            line_count,
            format!(
                "unable to detect diagram type: description must start with one of: {}",
                KNOWN_KEYWORDS.join(", ")
            ),
        );
    };

    let statements = statements(kind, rest);
    let (node_count, edge_count) = count_nodes(kind, &statements);

    let mut warnings = Vec::new();
    if line_count < 2 {
        warnings.push("diagram has only one line and might be incomplete".to_string());
    }
    if kind == DiagramKind::Flowchart && edge_count == 0 {
        warnings.push("no connections found (--> or ---); the diagram might be empty".to_string());
    }
    if kind != DiagramKind::Er {
        warnings.extend(bracket_warnings(description));
    }

    ClassificationResult {
        valid: true,
        diagram_type: Some(kind),
        node_count,
        line_count,
        error: None,
        warnings,
    }
}

fn invalid(line_count: usize, error: String) -> ClassificationResult {
    ClassificationResult {
        valid: false,
        diagram_type: None,
        node_count: 0,
        line_count,
        error: Some(error),
        warnings: Vec::new(),
    }
}

/// Resolves the diagram kind from a header statement.
pub fn detect_kind(header: &str) -> Option<DiagramKind> {
    let keyword = header
        .split(|c: char| c.is_whitespace() || c == ':' || c == ';')
        .next()?
        .to_ascii_lowercase();
    let kind = match keyword.as_str() {
        "graph" | "flowchart" | "flowchart-elk" => DiagramKind::Flowchart,
        "sequencediagram" => DiagramKind::Sequence,
        "classdiagram" | "classdiagram-v2" => DiagramKind::Class,
        "erdiagram" => DiagramKind::Er,
        "statediagram" | "statediagram-v2" => DiagramKind::State,
        "gantt" => DiagramKind::Gantt,
        "pie" => DiagramKind::Pie,
        "gitgraph" => DiagramKind::GitGraph,
        _ => return None,
    };
    Some(kind)
}

fn strip_frontmatter(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    if lines[start].trim() != "---" {
        return text.to_string();
    }
    match lines[start + 1..].iter().position(|l| l.trim() == "---") {
        Some(offset) => lines[start + offset + 2..].join("\n"),
        None => text.to_string(),
    }
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|l| !l.trim_start().starts_with("%%"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits off the first non-empty statement. The header may be terminated
/// by a newline or a `;`.
fn split_header(body: &str) -> Option<(&str, &str)> {
    let trimmed = body.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(['\n', ';']).unwrap_or(trimmed.len());
    let header = trimmed[..end].trim();
    let rest = trimmed.get(end + 1..).unwrap_or("");
    Some((header, rest))
}

fn statements(kind: DiagramKind, rest: &str) -> Vec<&str> {
    let split_semicolons = !matches!(kind, DiagramKind::Gantt | DiagramKind::Pie);
    rest.lines()
        .flat_map(|line| {
            if split_semicolons {
                line.split(';').collect::<Vec<_>>()
            } else {
                vec![line]
            }
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn starts_with_any(statement: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| {
        statement
            .strip_prefix(k)
            .is_some_and(|after| after.is_empty() || after.starts_with(char::is_whitespace))
    })
}

fn node_id(segment: &str) -> Option<&str> {
    RE_NODE_ID
        .captures(segment.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Returns `(distinct nodes, edges)`.
fn count_nodes(kind: DiagramKind, statements: &[&str]) -> (usize, usize) {
    let mut nodes: HashSet<String> = HashSet::new();
    let mut edges = 0;

    for &stmt in statements {
        match kind {
            DiagramKind::Flowchart => {
                if starts_with_any(stmt, FLOW_SKIP) {
                    continue;
                }
                let normalized = RE_LINK_TEXT.replace_all(stmt, "${1} --> ");
                let segments: Vec<&str> = RE_FLOW_EDGE.split(&normalized).collect();
                edges += segments.len().saturating_sub(1);
                for segment in segments {
                    nodes.extend(segment.split('&').filter_map(node_id).map(String::from));
                }
            }
            DiagramKind::State => {
                if starts_with_any(stmt, STATE_SKIP) {
                    continue;
                }
                if let Some(caps) = RE_STATE_DECL.captures(stmt) {
                    nodes.insert(caps[1].to_string());
                    continue;
                }
                let transition = stmt.split(':').next().unwrap_or(stmt);
                let parts: Vec<&str> = transition.split("-->").collect();
                edges += parts.len().saturating_sub(1);
                for part in parts {
                    let part = part.trim();
                    if part == "[*]" {
                        nodes.insert(part.to_string());
                    } else if let Some(id) = node_id(part) {
                        nodes.insert(id.to_string());
                    }
                }
            }
            DiagramKind::Sequence => {
                if let Some(caps) = RE_SEQ_ACTOR.captures(stmt) {
                    nodes.insert(caps[1].to_string());
                } else if let Some(caps) = RE_SEQ_MESSAGE.captures(stmt) {
                    edges += 1;
                    nodes.insert(caps[1].to_string());
                    nodes.insert(caps[2].to_string());
                }
            }
            DiagramKind::Class => {
                if let Some(caps) = RE_CLASS_DECL.captures(stmt) {
                    nodes.insert(caps[1].to_string());
                } else if let Some(caps) = RE_CLASS_RELATION.captures(stmt) {
                    edges += 1;
                    nodes.insert(caps[1].to_string());
                    nodes.insert(caps[2].to_string());
                } else if let Some(caps) = RE_CLASS_MEMBER.captures(stmt) {
                    nodes.insert(caps[1].to_string());
                }
            }
            DiagramKind::Er => {
                if let Some(caps) = RE_ER_RELATION.captures(stmt) {
                    edges += 1;
                    nodes.insert(caps[1].to_string());
                    nodes.insert(caps[2].to_string());
                } else if let Some(caps) = RE_ER_ENTITY.captures(stmt) {
                    nodes.insert(caps[1].to_string());
                }
            }
            DiagramKind::Gantt => {
                if !starts_with_any(stmt, GANTT_SKIP) && stmt.contains(':') {
                    nodes.insert(stmt.to_string());
                }
            }
            DiagramKind::Pie => {
                if RE_PIE_SLICE.is_match(stmt) {
                    nodes.insert(stmt.to_string());
                }
            }
            DiagramKind::GitGraph => {
                if starts_with_any(stmt, &["commit", "merge", "cherry-pick"]) {
                    // Every commit is a node, even when two look identical.
                    nodes.insert(format!("{}#{stmt}", nodes.len()));
                }
            }
        }
    }

    (nodes.len(), edges)
}

fn bracket_warnings(text: &str) -> Vec<String> {
    [('[', ']'), ('(', ')'), ('{', '}')]
        .into_iter()
        .filter_map(|(open, close)| {
            let opened = text.chars().filter(|c| *c == open).count();
            let closed = text.chars().filter(|c| *c == close).count();
            (opened != closed).then(|| {
                format!("mismatched brackets: {opened} '{open}' but {closed} '{close}'")
            })
        })
        .collect()
}

/// One entry of the supported diagram catalog.
#[derive(Debug, Clone, Serialize)]
pub struct DiagramTypeInfo {
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    #[serde(skip)]
    pub kind: DiagramKind,
}

static CATALOG: &[DiagramTypeInfo] = &[
    DiagramTypeInfo {
        type_name: "flowchart",
        description: "Flowcharts and directional graphs (also `graph`)",
        example: "flowchart TD\n    A[Start] --> B{Decision}\
            \n    B -->|Yes| C[Do Something]\n    B -->|No| D[Do Something Else]",
        kind: DiagramKind::Flowchart,
    },
    DiagramTypeInfo {
        type_name: "sequenceDiagram",
        description: "Interactions between participants over time",
        example: "sequenceDiagram\n    Alice->>John: Hello John\n    John-->>Alice: Hi Alice",
        kind: DiagramKind::Sequence,
    },
    DiagramTypeInfo {
        type_name: "classDiagram",
        description: "UML class diagrams",
        example: "classDiagram\n    class Animal\n    Animal : +String name\
            \n    Animal : +makeSound()\n    Animal <|-- Dog",
        kind: DiagramKind::Class,
    },
    DiagramTypeInfo {
        type_name: "erDiagram",
        description: "Entity relationship diagrams for data models",
        example: "erDiagram\n    CUSTOMER ||--o{ ORDER : places\
            \n    ORDER ||--|{ LINE-ITEM : contains",
        kind: DiagramKind::Er,
    },
    DiagramTypeInfo {
        type_name: "stateDiagram",
        description: "State machines (also `stateDiagram-v2`)",
        example: "stateDiagram-v2\n    [*] --> Still\n    Still --> Moving\n    Moving --> [*]",
        kind: DiagramKind::State,
    },
    DiagramTypeInfo {
        type_name: "gantt",
        description: "Project timelines",
        example: "gantt\n    title Project Timeline\n    dateFormat YYYY-MM-DD\
            \n    section Planning\n    Task 1 :a1, 2024-01-01, 30d",
        kind: DiagramKind::Gantt,
    },
    DiagramTypeInfo {
        type_name: "pie",
        description: "Pie charts",
        example: "pie title Pets\n    \"Dogs\" : 386\n    \"Cats\" : 85\n    \"Rats\" : 15",
        kind: DiagramKind::Pie,
    },
    DiagramTypeInfo {
        type_name: "gitGraph",
        description: "Git commit graphs",
        example: "gitGraph\n    commit\n    branch develop\n    checkout develop\n    commit",
        kind: DiagramKind::GitGraph,
    },
];

/// Supported diagram types with a working example of each.
pub fn catalog() -> &'static [DiagramTypeInfo] {
    CATALOG
}
