//! Rendering of the fused context block.

use super::fusion::LongTermFacts;
use crate::models::{Fact, SourceGroup, SourceType, Turn};

pub const NO_HISTORY: &str = "No previous conversation history.";
pub const FACTS_HEADER: &str = "=== Relevant Facts from Long-term Memory ===";
pub const RECENT_HEADER: &str = "=== Recent Conversation ===";

const UNKNOWN_FILE: &str = "unknown file";

fn push_numbered(out: &mut String, facts: &[Fact], indent: &str) {
    for (index, fact) in facts.iter().enumerate() {
        out.push_str(&format!("{}{}. {}\n", indent, index + 1, fact.annotated()));
    }
}

/// File groups first, then conversation groups; service order within each.
fn render_groups(groups: &[SourceGroup]) -> String {
    let mut out = String::new();

    for group in groups.iter().filter(|g| g.source_type == SourceType::File) {
        let name = group.source_name.as_deref().unwrap_or(UNKNOWN_FILE);
        out.push_str(&format!("\n📄 From file: {}\n", name));
        push_numbered(&mut out, &group.facts, "  ");
    }

    for group in groups.iter().filter(|g| g.source_type == SourceType::Conversation) {
        out.push_str("\n💬 From conversation:\n");
        push_numbered(&mut out, &group.facts, "  ");
    }

    out
}

fn render_flat(hits: &[Fact]) -> String {
    if hits.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n");
    push_numbered(&mut out, hits, "");
    out
}

/// Body of the long-term section, empty when there is nothing to show
pub fn render_facts(facts: &LongTermFacts) -> String {
    match facts {
        LongTermFacts::Empty => String::new(),
        LongTermFacts::Grouped(groups) => render_groups(groups),
        LongTermFacts::Flat(hits) => render_flat(hits),
    }
}

/// `User: ...` / `Assistant: ...` lines joined by newlines
pub fn render_turns(turns: &[Turn]) -> String {
    turns.iter().map(Turn::to_line).collect::<Vec<_>>().join("\n")
}

/// Compose the long-term section and the recent-conversation section.
///
/// Each section appears only when non-empty; with neither, the result is
/// [`NO_HISTORY`]. Facts and turns are never interleaved.
pub fn compose(facts: &LongTermFacts, turns: &[Turn]) -> String {
    let mut out = String::new();

    let facts_body = render_facts(facts);
    if !facts_body.is_empty() {
        out.push_str(FACTS_HEADER);
        out.push('\n');
        out.push_str(&facts_body);
        out.push('\n');
    }

    if !turns.is_empty() {
        out.push_str(RECENT_HEADER);
        out.push('\n');
        out.push_str(&render_turns(turns));
    }

    if out.is_empty() {
        NO_HISTORY.to_string()
    } else {
        out
    }
}
