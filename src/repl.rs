use anyhow::Result;
use crossterm::style::Stylize;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Completer, Emacs, KeyCode, KeyModifiers, MenuBuilder,
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, Span, Suggestion,
};
use std::borrow::Cow;
use std::io::Write;

use crate::display::{print_outcome, Renderer};
use crate::logging::LogRingBuffer;
use crate::models::{QueryMode, QueryRequest, QuerySubtype};
use crate::query_client::QueryClient;

const DEFAULT_LOG_LINES: usize = 20;

const COMMANDS: &[(&str, &str)] = &[
    ("\\help", "show commands"),
    ("\\mode", "general | policy | complaint"),
    ("\\type", "both | policy | complaint"),
    ("\\health", "check backend status"),
    ("\\history", "recent answered queries"),
    ("\\clear-history", "forget recent queries"),
    ("\\logs", "recent log lines"),
    ("\\clear", "clear screen"),
    ("\\quit", "exit"),
];

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Query(String),
    Help,
    SetMode(QueryMode),
    SetType(QuerySubtype),
    Health,
    History,
    ClearHistory,
    Logs(usize),
    ClearScreen,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    if !trimmed.starts_with('\\') {
        return ReplCommand::Query(trimmed.to_string());
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument = parts.next();

    match (command, argument) {
        ("\\help" | "\\?", _) => ReplCommand::Help,
        ("\\mode", Some(value)) => match value.parse() {
            Ok(mode) => ReplCommand::SetMode(mode),
            Err(e) => ReplCommand::Invalid(e.to_string()),
        },
        ("\\mode", None) => ReplCommand::Invalid("Usage: \\mode <general|policy|complaint>".into()),
        ("\\type", Some(value)) => match value.parse() {
            Ok(subtype) => ReplCommand::SetType(subtype),
            Err(e) => ReplCommand::Invalid(e.to_string()),
        },
        ("\\type", None) => ReplCommand::Invalid("Usage: \\type <both|policy|complaint>".into()),
        ("\\health" | "\\status", _) => ReplCommand::Health,
        ("\\history", _) => ReplCommand::History,
        ("\\clear-history", _) => ReplCommand::ClearHistory,
        ("\\logs", None) => ReplCommand::Logs(DEFAULT_LOG_LINES),
        ("\\logs", Some(value)) => match value.parse() {
            Ok(count) => ReplCommand::Logs(count),
            Err(_) => ReplCommand::Invalid(format!("Not a line count: {}", value)),
        },
        ("\\clear", _) => ReplCommand::ClearScreen,
        ("\\quit" | "\\exit" | "\\q", _) => ReplCommand::Quit,
        (other, _) => ReplCommand::Invalid(format!("Unknown command: {} (try \\help)", other)),
    }
}

struct CxPrompt {
    mode: QueryMode,
    subtype: QuerySubtype,
}

impl Prompt for CxPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match self.mode {
            QueryMode::General => Cow::Owned(format!("cx[{}:{}]", self.mode, self.subtype)),
            _ => Cow::Owned(format!("cx[{}]", self.mode)),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

/// Tab completion for backslash commands and their arguments
pub struct CommandCompleter;

impl CommandCompleter {
    fn candidates(input: &str) -> Vec<(String, Option<String>, usize)> {
        if !input.starts_with('\\') {
            return Vec::new();
        }

        match input.split_once(' ') {
            None => COMMANDS
                .iter()
                .filter(|(name, _)| name.starts_with(input))
                .map(|(name, help)| (name.to_string(), Some(help.to_string()), 0))
                .collect(),
            Some((command, partial)) => {
                let values: Vec<&str> = match command {
                    "\\mode" => QueryMode::ALL.iter().map(|m| m.as_str()).collect(),
                    "\\type" => QuerySubtype::ALL.iter().map(|s| s.as_str()).collect(),
                    _ => Vec::new(),
                };
                let start = input.len() - partial.len();
                values
                    .into_iter()
                    .filter(|value| value.starts_with(partial.trim_start()))
                    .map(|value| (value.to_string(), None, start))
                    .collect()
            }
        }
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        Self::candidates(input)
            .into_iter()
            .map(|(value, description, start)| Suggestion {
                value,
                description,
                extra: None,
                span: Span { start, end: pos },
                style: None,
                append_whitespace: true,
            })
            .collect()
    }
}

/// Whether the loop should keep reading lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive session bound to one `QueryClient`
pub struct Repl {
    client: QueryClient,
    renderer: Renderer,
    mode: QueryMode,
    subtype: QuerySubtype,
    logs: Option<LogRingBuffer>,
}

impl Repl {
    pub fn new(client: QueryClient, renderer: Renderer) -> Self {
        Self {
            client,
            renderer,
            mode: QueryMode::default(),
            subtype: QuerySubtype::default(),
            logs: None,
        }
    }

    pub fn with_defaults(mut self, mode: QueryMode, subtype: QuerySubtype) -> Self {
        self.mode = mode;
        self.subtype = subtype;
        self
    }

    pub fn with_logs(mut self, logs: LogRingBuffer) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn subtype(&self) -> QuerySubtype {
        self.subtype
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub async fn run(&mut self) -> Result<()> {
        print_help();
        println!(
            "{}",
            format!("Answer service: {}", self.client.api().base_url()).cyan()
        );

        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("command_completion")
                .with_columns(1)
                .with_column_width(None)
                .with_column_padding(2),
        );

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::Menu("command_completion".to_string()),
        );

        // Default in-memory recall only; queries are never written to disk
        let mut line_editor = Reedline::create()
            .with_completer(Box::new(CommandCompleter))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        loop {
            let prompt = CxPrompt {
                mode: self.mode,
                subtype: self.subtype,
            };
            match line_editor.read_line(&prompt)? {
                Signal::Success(buffer) => {
                    if self.handle(parse_command(&buffer)).await == Flow::Exit {
                        break;
                    }
                }
                Signal::CtrlD | Signal::CtrlC => break,
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    pub async fn handle(&mut self, command: ReplCommand) -> Flow {
        tracing::debug!(target: "repl", "Command: {:?}", command);

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Query(text) => {
                let request = QueryRequest::new(text, self.mode, self.subtype);
                print!("{}", "Processing...".dark_grey());
                let _ = std::io::stdout().flush();
                let outcome = self.client.submit_query(request).await;
                print!("\r{}\r", " ".repeat(16));
                print_outcome(&self.renderer, &outcome);
            }
            ReplCommand::Help => print_help(),
            ReplCommand::SetMode(mode) => {
                self.mode = mode;
                println!("{}", format!("Mode: {}", mode.label()).green());
            }
            ReplCommand::SetType(subtype) => {
                self.subtype = subtype;
                println!("{}", format!("Type: {}", subtype).green());
                if self.mode != QueryMode::General {
                    println!(
                        "{}",
                        "Type only applies in general mode (\\mode general)".yellow()
                    );
                }
            }
            ReplCommand::Health => {
                let status = self.client.check_health().await;
                println!("{}", self.renderer.render_health(&status));
            }
            ReplCommand::History => {
                println!("{}", self.renderer.render_history(self.client.history()));
            }
            ReplCommand::ClearHistory => {
                self.client.clear_history();
                println!("{}", "History cleared.".green());
            }
            ReplCommand::Logs(count) => match &self.logs {
                Some(buffer) if !buffer.is_empty() => {
                    for entry in buffer.get_recent(count) {
                        println!("{}", entry.format_for_display().dark_grey());
                    }
                }
                _ => println!("{}", "No log entries.".yellow()),
            },
            ReplCommand::ClearScreen => {
                print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
                let _ = std::io::stdout().flush();
            }
            ReplCommand::Quit => return Flow::Exit,
            ReplCommand::Invalid(message) => eprintln!("{}", message.red()),
        }

        Flow::Continue
    }
}

pub fn print_help() {
    println!("{}", "CX Query - customer experience answer client".blue().bold());
    println!();
    println!("{}", "Type a question and press Enter to ask it.".yellow());
    println!();
    println!("{}", "Commands:".yellow());
    for (name, help) in COMMANDS {
        println!("  {} - {}", format!("{:<16}", name).green(), help);
    }
    println!("  {} - complete commands", format!("{:<16}", "Tab").green());
    println!("  {} - exit", format!("{:<16}", "Ctrl+D").green());
    println!();
}
