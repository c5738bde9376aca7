use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use env_logger::{Env, Target};
use flowtype::{
    app::App,
    app_dirs::AppDirs,
    catalog::{PromptLength, QuestionBank},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    typing_policy::InputMode,
};
use log::info;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

const FRAME_RATE_MS: u64 = 100;

/// typing practice tui with kana, english and code-copy modes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type shuffled prompts against a countdown. Clean prompts in a row build a flow streak that buys bonus seconds and skill points."
)]
pub struct Cli {
    /// input mode to preselect
    #[clap(short = 'l', long, value_enum)]
    language: Option<InputMode>,

    /// prompt length to preselect
    #[clap(short = 'n', long, value_enum)]
    length: Option<PromptLength>,

    /// theme id to preselect
    #[clap(short = 't', long)]
    theme: Option<String>,

    /// question catalog json to use instead of the bundled one
    #[clap(short = 'c', long)]
    catalog: Option<PathBuf>,

    /// countdown length in seconds
    #[clap(short = 's', long)]
    duration: Option<u32>,

    /// print the available themes and exit
    #[clap(long)]
    list_themes: bool,
}

impl Cli {
    /// Flags given on the command line win over the saved config.
    fn apply(&self, config: &mut Config) {
        if let Some(language) = self.language {
            config.language = language;
        }
        if let Some(length) = self.length {
            config.length = length;
        }
        if let Some(theme) = &self.theme {
            config.theme_id = Some(theme.clone());
        }
        if let Some(catalog) = &self.catalog {
            config.catalog_path = Some(catalog.clone());
        }
        if let Some(duration) = self.duration {
            config.policy.duration_secs = duration.max(1);
        }
    }
}

fn print_themes(config: &Config) -> Result<(), Box<dyn Error>> {
    let bank = QuestionBank::load(config.catalog_path.as_deref())?;
    for theme in &bank.themes {
        let modes: Vec<String> = theme
            .available_languages
            .iter()
            .map(|m| m.to_string())
            .collect();
        println!(
            "{:<12} {:<24} [{}]",
            theme.id,
            theme.label_for(config.language),
            modes.join(", ")
        );
    }
    Ok(())
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    if cli.list_themes {
        return print_themes(&config);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    info!("starting with config from {}", store.path().display());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    // a paste then arrives as a single event instead of a burst of keys
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let app = App::new(config, Box::new(store)).with_countdown_sender(events.sender());
    let outcome = start_tui(&mut terminal, app, events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    events: CrosstermEventSource,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(FRAME_RATE_MS)));

    terminal.draw(|f| f.render_widget(&app, f.area()))?;
    while !app.should_quit() {
        let event = runner.step();
        let redraw = !matches!(event, AppEvent::Frame);
        app.handle_event(event);
        if redraw {
            terminal.draw(|f| f.render_widget(&app, f.area()))?;
        }
    }
    info!("bye");
    Ok(())
}
