// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Actionable hints attached to failed generations.

/// Where callers can read up on the description syntax.
pub const SYNTAX_DOCS_URL: &str = "https://mermaid.js.org/syntax/";

/// Maps a renderer message to a short hint for the caller.
pub fn suggestion_for(message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("syntax error") {
        "Syntax error detected. Check for missing semicolons, incorrect arrow syntax \
         (use --> or ---), and mismatched brackets."
            .to_string()
    } else if lower.contains("parse error") || lower.contains("lexical error") {
        "Parse error. Verify the diagram type declaration (graph TD, sequenceDiagram, ...) \
         and the node connections."
            .to_string()
    } else if lower.contains("unexpected") {
        "Unexpected token found. Check for typos in keywords or stray special characters."
            .to_string()
    } else if lower.contains("timed out") || lower.contains("timeout") {
        "Rendering timed out. The diagram might be too complex; try simplifying it.".to_string()
    } else if lower.contains("no diagram type") || lower.contains("unknown diagram") {
        "The renderer did not recognise the diagram type. Start with a keyword such as \
         `flowchart TD` or `sequenceDiagram`."
            .to_string()
    } else {
        format!("Check the diagram syntax at: {SYNTAX_DOCS_URL}")
    }
}
