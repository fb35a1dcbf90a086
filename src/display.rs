use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::fmt::Write;

use crate::config::config::IconConfig;
use crate::history::SessionHistory;
use crate::models::{AnswerResult, Confidence, HealthStatus, QueryOutcome};

const HISTORY_QUERY_WIDTH: usize = 60;

/// Turns client results into terminal text
pub struct Renderer {
    icons: IconConfig,
}

impl Renderer {
    pub fn new(icons: IconConfig) -> Self {
        Self { icons }
    }

    pub fn render_outcome(&self, outcome: &QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Skipped => String::new(),
            QueryOutcome::Success(result) => self.render_answer(result),
            QueryOutcome::BackendError(body) => {
                format!("{} {}", self.icons.error, format!("Error: {}", body).red())
            }
            QueryOutcome::TransportError(message) => format!(
                "{} {}",
                self.icons.error,
                format!("Connection error: {}", message).red()
            ),
        }
    }

    pub fn render_answer(&self, result: &AnswerResult) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{} {}", self.icons.answer, "Answer:".green().bold());
        let _ = writeln!(out, "{}", result.answer);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.confidence_line(result.confidence));

        if let Some(next_action) = &result.next_action {
            let _ = writeln!(
                out,
                "{} {} {}",
                self.icons.next_action,
                "Next action:".cyan().bold(),
                next_action
            );
        }

        if !result.risks.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{} {}", self.icons.risk, "Risks".yellow().bold());
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                Cell::new("Type").add_attribute(Attribute::Bold),
                Cell::new("Description").add_attribute(Attribute::Bold),
            ]);
            for risk in &result.risks {
                table.add_row(vec![risk.kind.as_str(), risk.description.as_str()]);
            }
            let _ = writeln!(out, "{table}");
        }

        if !result.citations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{} {}", self.icons.sources, "Sources".blue().bold());
            for citation in &result.citations {
                let _ = writeln!(
                    out,
                    "  {} - {}",
                    citation.policy_name.as_str().bold(),
                    citation.section_title
                );
            }
        }

        out
    }

    fn confidence_line(&self, confidence: Confidence) -> String {
        let label = format!("Confidence: {}", confidence);
        match confidence {
            Confidence::High => format!("{} {}", self.icons.confidence_high, label.green()),
            _ => format!("{} {}", self.icons.confidence_other, label.yellow()),
        }
    }

    pub fn render_health(&self, status: &HealthStatus) -> String {
        match status {
            HealthStatus::Online => format!("{} {}", self.icons.online, "System Online".green()),
            HealthStatus::Offline(code) => format!(
                "{} {}",
                self.icons.offline,
                format!("System Offline (HTTP {})", code).red()
            ),
            HealthStatus::Unreachable(reason) => format!(
                "{} {}",
                self.icons.offline,
                format!("Connection Failed: {}", reason).red()
            ),
        }
    }

    pub fn render_history(&self, history: &SessionHistory) -> String {
        if history.is_empty() {
            return format!("{}", "No queries yet.".yellow());
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Mode").add_attribute(Attribute::Bold),
            Cell::new("Query").add_attribute(Attribute::Bold),
            Cell::new("Confidence").add_attribute(Attribute::Bold),
        ]);

        for (index, entry) in history.entries().enumerate() {
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(entry.timestamp.format("%H:%M:%S")),
                Cell::new(entry.mode.label()),
                Cell::new(truncate(&entry.query, HISTORY_QUERY_WIDTH)),
                Cell::new(entry.result.confidence),
            ]);
        }

        format!(
            "{table}\n{}",
            format!("{} of {} recent queries", history.len(), history.capacity()).green()
        )
    }
}

/// Shorten to `width` characters, marking the cut with an ellipsis
fn truncate(text: &str, width: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() <= width {
        return text;
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

pub fn print_outcome(renderer: &Renderer, outcome: &QueryOutcome) {
    let rendered = renderer.render_outcome(outcome);
    if rendered.is_empty() {
        return;
    }
    if outcome.is_error() {
        eprintln!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
}
