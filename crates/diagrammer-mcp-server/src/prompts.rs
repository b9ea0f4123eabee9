// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static prompts offered to MCP clients.

/// A prompt with no arguments and a fixed user message.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompt {
    pub name: &'static str,
    pub description: &'static str,
    pub text: &'static str,
}

/// Guidance on picking a diagram type before calling `generate_diagram`.
pub const DIAGRAM_SELECTION_GUIDE: StaticPrompt = StaticPrompt {
    name: "diagram_selection_guide",
    description: "How to choose a Mermaid diagram type and when to suggest a different one",
    text: GUIDE_TEXT,
};

/// Every prompt the server lists, in listing order.
pub const PROMPTS: &[StaticPrompt] = &[DIAGRAM_SELECTION_GUIDE];

/// Looks up a prompt by name.
pub fn find(name: &str) -> Option<&'static StaticPrompt> {
    PROMPTS.iter().find(|p| p.name == name)
}

const GUIDE_TEXT: &str = "\
# Choosing a Mermaid diagram

## Ground rules
1. If the user names a diagram type, render that type straight away.
2. Offer an alternative only when it is clearly a better fit.
3. Once the user has chosen, do not argue. Render their choice.
4. When unsure, render what was asked for.

## Typical situations

### The user asks for a specific type
\"Make a flowchart of this: graph TD; User-->API\"
Call `generate_diagram` with the flowchart as given. Ask nothing.

### The code already fits the content
\"graph TD; Start-->Process-->Decision-->End\"
Flowchart syntax describing a process. Render it without comment.

### Another type would read much better
\"graph TD; User->>Server->>Database\"
Flowchart syntax, but the arrows describe messages between parties.
Reply with one sentence, for example: \"I can render this as a flowchart, \
or as a sequence diagram, which shows the exchange more clearly. Which \
would you like?\" Then render whatever the user picks.

## Diagram types
- flowchart / graph: processes, decisions, workflows
- sequenceDiagram: calls and messages between participants
- erDiagram: database tables and their relationships
- classDiagram: classes, fields and inheritance
- stateDiagram: states and the transitions between them
- gantt: schedules and project timelines
- pie: shares of a whole
- gitGraph: branches, commits and merges

Call `list_diagram_types` for the full list with examples, and \
`validate_syntax` to check code without rendering it.

## When to suggest an alternative
Suggest when:
- flowchart code really describes interactions (sequenceDiagram)
- a list of values is drawn as anything other than a chart (pie)
- a timeline is drawn with the wrong type (gantt)

Do not suggest when:
- the user named the type
- the syntax already matches the content
- several types would work equally well
- the gain would be minor

## Rendering options
Leave `format`, `theme`, `background`, `width` and `scale` unset to use the \
server defaults. Pass them only when the user asks for something specific, \
such as PNG output or the dark theme.
";
