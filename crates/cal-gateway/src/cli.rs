//! CLI (Command Line Interface) mode
//!
//! Interactive chat REPL: natural-language requests go through the
//! translator and the intent machine; pending bookings are parked in the
//! checkpoint store and resolved with /confirm or /cancel.

use std::sync::Arc;

use cal_core::credentials::CredentialRef;
use cal_core::intent::{CheckpointStore, Intent, IntentMachine, IntentOp, IntentStatus};
use cal_core::TranslatorClient;
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, Reedline, ReedlineEvent, ReedlineMenu, Signal, Suggestion,
};
use tracing::info;

/// Session identifier used for the local REPL
const CLI_SESSION: &str = "cli";

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show help"),
    ("/events", "List upcoming events"),
    ("/pending", "Show the booking awaiting confirmation"),
    ("/confirm", "Confirm the pending booking"),
    ("/cancel", "Cancel the pending booking"),
    ("/exit", "Quit"),
    ("/quit", "Quit"),
];

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if !line.starts_with('/') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

/// Custom prompt with colored styling
struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Owned(self.style.paint("> ").to_string())
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_indicator(
        &self,
        _prompt_mode: reedline::PromptEditMode,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }
}

/// Run CLI interactive mode
pub async fn run_cli(
    translator: TranslatorClient,
    machine: Arc<IntentMachine>,
    checkpoint: Arc<CheckpointStore>,
) -> anyhow::Result<()> {
    info!("Starting CLI mode");

    print_welcome();

    // Setup keybindings
    let mut keybindings = default_keybindings();

    // Trigger completion on '/' key
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = ColoredPrompt::new();

    loop {
        let signal = line_editor.read_line(&prompt);

        match signal {
            Ok(Signal::Success(line)) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }

                match input {
                    "/exit" | "/quit" => break,
                    "/help" => print_commands(),
                    "/events" => list_events(&machine).await,
                    "/pending" => show_pending(&checkpoint),
                    "/confirm" => confirm_pending(&machine, &checkpoint).await,
                    "/cancel" => cancel_pending(&checkpoint),
                    other if other.starts_with('/') => {
                        println!("\nUnknown command: {} (try /help)\n", other);
                    }
                    text => chat_turn(&translator, &machine, &checkpoint, text).await,
                }
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("\nBye!\n");
                break;
            }
            Err(err) => {
                eprintln!("\nError: {}\n", err);
                break;
            }
        }
    }

    Ok(())
}

/// One natural-language request through the full pipeline
async fn chat_turn(
    translator: &TranslatorClient,
    machine: &IntentMachine,
    checkpoint: &CheckpointStore,
    text: &str,
) {
    let mut intent = match translator.translate(CLI_SESSION, text).await {
        Ok(intent) => intent,
        Err(e) => {
            eprintln!("\nError: {}\n", e);
            return;
        }
    };
    intent.credential_ref = Some(CredentialRef::from_env());

    let outcome = machine.handle(intent).await;
    print_outcome(&outcome);

    if outcome.status == IntentStatus::Pending {
        if let Err(e) = checkpoint.put(&outcome) {
            eprintln!("Could not save the pending booking: {}", e);
        } else {
            println!("Use /confirm to book it or /cancel to drop it.\n");
        }
    }
}

async fn list_events(machine: &IntentMachine) {
    let mut intent = Intent::proposal(CLI_SESSION, IntentOp::Read);
    intent.credential_ref = Some(CredentialRef::from_env());

    let outcome = machine.handle(intent).await;
    print_outcome(&outcome);
}

fn show_pending(checkpoint: &CheckpointStore) {
    match checkpoint.get(CLI_SESSION) {
        Ok(Some(intent)) => {
            println!(
                "\nPending: \"{}\" from {} to {}\n",
                intent.title.as_deref().unwrap_or("(untitled)"),
                intent
                    .start_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                intent.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            );
        }
        Ok(None) => println!("\nNothing awaiting confirmation.\n"),
        Err(e) => eprintln!("\nError: {}\n", e),
    }
}

async fn confirm_pending(machine: &IntentMachine, checkpoint: &CheckpointStore) {
    let mut intent = match checkpoint.get(CLI_SESSION) {
        Ok(Some(intent)) => intent,
        Ok(None) => {
            println!("\nNothing awaiting confirmation.\n");
            return;
        }
        Err(e) => {
            eprintln!("\nError: {}\n", e);
            return;
        }
    };

    intent.status = IntentStatus::Confirmed;
    intent.credential_ref = Some(CredentialRef::from_env());

    let outcome = machine.handle(intent).await;
    print_outcome(&outcome);

    if let Err(e) = checkpoint.delete(CLI_SESSION) {
        eprintln!("Could not clear the pending booking: {}", e);
    }
}

fn cancel_pending(checkpoint: &CheckpointStore) {
    match checkpoint.delete(CLI_SESSION) {
        Ok(true) => println!("\nBooking cancelled. What would you like to do instead?\n"),
        Ok(false) => println!("\nNothing awaiting confirmation.\n"),
        Err(e) => eprintln!("\nError: {}\n", e),
    }
}

fn print_outcome(outcome: &Intent) {
    println!("\n{}\n", outcome.message.as_deref().unwrap_or(""));
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    // Tab key triggers completion
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    // Esc key clears/closes menus
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('c'),
        ReedlineEvent::CtrlC,
    );
    keybindings.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('d'),
        ReedlineEvent::CtrlD,
    );
    keybindings
}

fn print_welcome() {
    println!();
    println!("cal-gateway chat mode");
    println!("Describe what you want, e.g. \"schedule a meeting tomorrow at 3pm\".");
    println!("Type /help for commands, /exit to quit.");
    println!();
}

fn print_commands() {
    println!();
    for (cmd, desc) in COMMANDS {
        println!("  {:<10} {}", cmd, desc);
    }
    println!();
}
