//! Terminal rendering of comparison boards and chat messages.

use colored::*;

use crate::binder::{self, Slot};
use crate::chat::{ChatMessage, Role};
use crate::compare::{ComparisonRun, Variant};
use crate::providers::{EmbeddingItem, SearchResult};

/// Full board: title, banner, then one block per variant.
pub fn render_board<V: Variant>(title: &str, run: &ComparisonRun<V>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", title.bright_cyan().bold()));
    out.push_str(&format!("{}\n", "=".repeat(50).bright_blue()));

    let banner = binder::banner(run);
    if let Some(err) = banner.error {
        out.push_str(&format!("{}\n", err.bright_red()));
    }
    if banner.loading {
        out.push_str(&format!("{}\n", binder::LOADING.yellow()));
    }

    for view in binder::bind(run) {
        out.push_str(&render_slot(&view.heading, view.slot));
    }
    out
}

/// One variant block: heading line, then the indented slot text.
pub fn render_slot(heading: &str, slot: Slot<'_>) -> String {
    let body = match slot {
        Slot::Response(text) => indent(text).normal(),
        Slot::Loading => indent(slot.text()).yellow(),
        Slot::Empty => indent(slot.text()).dimmed(),
    };
    format!("{}\n{}\n", format!("[{heading}]").bright_yellow().bold(), body)
}

pub fn render_message(msg: &ChatMessage) -> String {
    match msg.role {
        Role::User => format!("{} {}", "you>".bright_green().bold(), msg.content),
        Role::Assistant => format!("{} {}", "bot>".bright_cyan().bold(), msg.content),
        Role::Error => format!("{}", msg.content.bright_red()),
        Role::System => format!("{}", msg.content.bright_magenta()),
    }
}

/// Dimension count and the leading components of each vector.
pub fn render_embeddings(items: &[EmbeddingItem]) -> String {
    let mut out = String::new();
    for item in items {
        let head: Vec<String> = item.embedding.iter().take(PREVIEW_POINTS).map(|v| format!("{v:.4}")).collect();
        let more = if item.embedding.len() > PREVIEW_POINTS { ", ..." } else { "" };
        out.push_str(&format!(
            "{} {} dimensions: [{}{}]\n",
            format!("#{}", item.prompt_index).bright_yellow().bold(),
            item.embedding.len(),
            head.join(", "),
            more
        ));
    }
    out
}

/// One line per hit: score, then the point id.
pub fn render_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("{}\n", "no similar embeddings found".dimmed());
    }
    results
        .iter()
        .map(|r| format!("{} {}\n", format!("{:.4}", r.score).bright_green(), r.uuid))
        .collect()
}

const PREVIEW_POINTS: usize = 5;

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}
