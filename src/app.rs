use std::sync::mpsc::Sender;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::{GameOptions, PromptLength, QuestionBank, ThemeDefinition};
use crate::config::{Config, ConfigStore};
use crate::input_field::InputField;
use crate::result::{GameResult, Rank};
use crate::romaji::RomajiComposer;
use crate::runtime::{AppEvent, IntervalTimer};
use crate::session::{InputOutcome, Keystroke, PromptCompletion, Session, TickOutcome};
use crate::typing_policy::InputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Selecting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionField {
    Mode,
    Theme,
    Length,
}

impl SelectionField {
    pub const ALL: [SelectionField; 3] = [Self::Mode, Self::Theme, Self::Length];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn step(self, forward: bool) -> Self {
        let len = Self::ALL.len();
        let idx = self.index();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ALL[next]
    }
}

/// What the selection screen currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub language: InputMode,
    pub length: PromptLength,
    pub theme_id: Option<String>,
    pub focus: SelectionField,
}

impl Selection {
    fn from_config(config: &Config) -> Self {
        Self {
            language: config.language,
            length: config.length,
            theme_id: config.theme_id.clone(),
            focus: SelectionField::Mode,
        }
    }

    /// Points the theme at one the current mode supports, keeping the
    /// current one when possible.
    fn snap_theme(&mut self, bank: &QuestionBank) {
        let keep = self.theme_id.as_deref().is_some_and(|id| {
            bank.theme(id)
                .map(|theme| theme.supports(self.language))
                .unwrap_or(false)
        });
        if !keep {
            self.theme_id = bank
                .themes_for(self.language)
                .next()
                .map(|theme| theme.id.clone());
        }
    }

    fn cycle_mode(&mut self, forward: bool) {
        let modes = InputMode::ALL;
        let idx = modes.iter().position(|m| *m == self.language).unwrap_or(0);
        let next = if forward {
            (idx + 1) % modes.len()
        } else {
            (idx + modes.len() - 1) % modes.len()
        };
        self.language = modes[next];
    }

    fn cycle_length(&mut self) {
        self.length = match self.length {
            PromptLength::Short => PromptLength::Long,
            PromptLength::Long => PromptLength::Short,
        };
    }

    fn cycle_theme(&mut self, bank: &QuestionBank, forward: bool) {
        let themes: Vec<&ThemeDefinition> = bank.themes_for(self.language).collect();
        if themes.is_empty() {
            self.theme_id = None;
            return;
        }
        let idx = self
            .theme_id
            .as_deref()
            .and_then(|id| themes.iter().position(|t| t.id == id));
        let next = match (idx, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % themes.len(),
            (Some(i), false) => (i + themes.len() - 1) % themes.len(),
        };
        self.theme_id = Some(themes[next].id.clone());
    }

    pub fn options(&self) -> Option<GameOptions> {
        self.theme_id.as_ref().map(|theme_id| GameOptions {
            language: self.language,
            length: self.length,
            theme_id: theme_id.clone(),
        })
    }
}

/// Screen router plus the front-end state around a `Session`: the input
/// field, the romaji composer and the countdown generation.
pub struct App {
    pub state: AppState,
    pub selection: Selection,
    config: Config,
    store: Box<dyn ConfigStore>,
    bank: Option<QuestionBank>,
    catalog_error: Option<String>,
    notice: Option<String>,
    session: Option<Session>,
    input: InputField,
    composer: RomajiComposer,
    last_completion: Option<PromptCompletion>,
    result: Option<GameResult>,
    generation: u64,
    countdown_tx: Option<Sender<AppEvent>>,
    rng: StdRng,
    // keys typed in the same burst that ended the game do not leave results
    results_locked: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: Box<dyn ConfigStore>) -> Self {
        let mut app = Self {
            state: AppState::Selecting,
            selection: Selection::from_config(&config),
            config,
            store,
            bank: None,
            catalog_error: None,
            notice: None,
            session: None,
            input: InputField::new(),
            composer: RomajiComposer::new(),
            last_completion: None,
            result: None,
            generation: 0,
            countdown_tx: None,
            rng: StdRng::from_entropy(),
            results_locked: false,
            should_quit: false,
        };
        app.reload_catalog();
        app
    }

    /// Countdown ticks arrive on this channel instead of being driven by hand.
    pub fn with_countdown_sender(mut self, tx: Sender<AppEvent>) -> Self {
        self.countdown_tx = Some(tx);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn reload_catalog(&mut self) {
        match QuestionBank::load(self.config.catalog_path.as_deref()) {
            Ok(bank) => {
                info!("catalog loaded: {} themes", bank.themes.len());
                self.selection.snap_theme(&bank);
                self.bank = Some(bank);
                self.catalog_error = None;
            }
            Err(err) => {
                warn!("catalog unavailable: {}", err);
                self.bank = None;
                self.catalog_error = Some(err.to_string());
            }
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Countdown(generation) => self.on_countdown(generation),
            AppEvent::Frame => self.results_locked = false,
            AppEvent::Resize => {}
        }
    }

    fn on_countdown(&mut self, generation: u64) {
        if generation != self.generation || self.state != AppState::Playing {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let TickOutcome::Finished(result) = session.tick() {
            self.show_results(result);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.state {
            AppState::Selecting => self.on_selection_key(key),
            AppState::Playing => self.on_play_key(key),
            AppState::Finished if self.results_locked => {}
            AppState::Finished => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.reset(),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn on_selection_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::F(5) => self.reload_catalog(),
            KeyCode::Up => self.selection.focus = self.selection.focus.step(false),
            KeyCode::Down | KeyCode::Tab => self.selection.focus = self.selection.focus.step(true),
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                match self.selection.focus {
                    SelectionField::Mode => {
                        self.selection.cycle_mode(forward);
                        if let Some(bank) = &self.bank {
                            self.selection.snap_theme(bank);
                        }
                    }
                    SelectionField::Theme => {
                        if let Some(bank) = &self.bank {
                            self.selection.cycle_theme(bank, forward);
                        }
                    }
                    SelectionField::Length => self.selection.cycle_length(),
                }
            }
            KeyCode::Enter => self.start_game(),
            _ => {}
        }
    }

    pub fn start_game(&mut self) {
        let Some(options) = self.selection.options() else {
            return;
        };
        let Some(bank) = &self.bank else {
            return;
        };
        let session =
            match Session::from_catalog(bank, &options, self.config.policy.clone(), &mut self.rng)
            {
                Ok(session) => session,
                Err(err) => {
                    warn!("cannot start {}: {}", options.theme_id, err);
                    if err.is_catalog_unavailable() {
                        self.catalog_error = Some(err.to_string());
                    } else {
                        self.notice = Some(err.to_string());
                    }
                    return;
                }
            };

        self.generation += 1;
        let session = match &self.countdown_tx {
            Some(tx) => session.with_timer(IntervalTimer::new(tx.clone(), self.generation)),
            None => session,
        };

        self.config.remember(&options);
        if let Err(err) = self.store.save(&self.config) {
            warn!("could not save config: {}", err);
        }

        self.session = Some(session);
        self.input.clear();
        self.composer.clear();
        self.last_completion = None;
        self.result = None;
        self.notice = None;
        self.state = AppState::Playing;
    }

    /// Back to the selection screen; a running session is dropped with its timer.
    pub fn reset(&mut self) {
        self.session = None;
        self.input.clear();
        self.composer.clear();
        self.last_completion = None;
        self.result = None;
        self.state = AppState::Selecting;
    }

    fn on_play_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.reset();
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let has_modifier = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if has_modifier {
            session.record_keystroke(Keystroke::Other, true);
            return;
        }

        let outcome = match session.mode() {
            InputMode::Japanese => {
                Self::kana_key(session, &mut self.input, &mut self.composer, key.code)
            }
            mode => Self::text_key(session, &mut self.input, mode, key.code),
        };
        if let Some(outcome) = outcome {
            self.apply_outcome(outcome);
        }
    }

    fn text_key(
        session: &mut Session,
        input: &mut InputField,
        mode: InputMode,
        code: KeyCode,
    ) -> Option<InputOutcome> {
        let keystroke = match code {
            KeyCode::Char(c) => {
                input.insert_char(c);
                Keystroke::Char(c)
            }
            KeyCode::Backspace => {
                input.backspace();
                Keystroke::Backspace
            }
            KeyCode::Delete => {
                input.delete();
                Keystroke::Delete
            }
            KeyCode::Enter => {
                if mode == InputMode::Copy {
                    input.insert_char('\n');
                }
                Keystroke::Enter
            }
            KeyCode::Tab => {
                if let Some(indent) = mode.indent() {
                    input.insert_str(indent);
                }
                Keystroke::Tab
            }
            KeyCode::Left => {
                input.move_left();
                return None;
            }
            KeyCode::Right => {
                input.move_right();
                return None;
            }
            _ => return None,
        };
        session.record_keystroke(keystroke, false);
        Some(session.update_snapshot(input.value()))
    }

    fn kana_key(
        session: &mut Session,
        input: &mut InputField,
        composer: &mut RomajiComposer,
        code: KeyCode,
    ) -> Option<InputOutcome> {
        match code {
            KeyCode::Char(c) => {
                let keystroke = if composer.is_composing() {
                    Keystroke::Composing
                } else {
                    Keystroke::Char(c)
                };
                session.record_keystroke(keystroke, false);
                let committed = composer.push(c);
                Some(Self::sync_composition(session, input, composer, &committed))
            }
            KeyCode::Backspace => {
                session.record_keystroke(Keystroke::Backspace, false);
                if composer.backspace() {
                    return Some(Self::sync_composition(session, input, composer, ""));
                }
                input.backspace();
                Some(session.update_snapshot(input.value()))
            }
            KeyCode::Delete if !composer.is_composing() => {
                session.record_keystroke(Keystroke::Delete, false);
                input.delete();
                Some(session.update_snapshot(input.value()))
            }
            KeyCode::Enter if composer.is_composing() => {
                session.record_keystroke(Keystroke::Enter, false);
                let flushed = composer.flush();
                Some(Self::sync_composition(session, input, composer, &flushed))
            }
            KeyCode::Left if !composer.is_composing() => {
                input.move_left();
                None
            }
            KeyCode::Right if !composer.is_composing() => {
                input.move_right();
                None
            }
            _ => None,
        }
    }

    /// Pushes committed kana into the field and mirrors the composer's
    /// pending romaji as an open composition.
    fn sync_composition(
        session: &mut Session,
        input: &mut InputField,
        composer: &RomajiComposer,
        committed: &str,
    ) -> InputOutcome {
        let mut outcome = InputOutcome::Buffered;
        if !committed.is_empty() || (session.is_composing() && !composer.is_composing()) {
            input.insert_str(committed);
            outcome = if session.is_composing() {
                session.end_composition(input.value())
            } else {
                session.update_snapshot(input.value())
            };
            if matches!(
                outcome,
                InputOutcome::PromptCompleted(_) | InputOutcome::Finished { .. }
            ) {
                input.clear();
            }
        }
        if composer.is_composing() && !session.is_finished() {
            session.begin_composition();
            let shown = input.display_with(composer.pending());
            let buffered = session.update_snapshot(&shown);
            if matches!(outcome, InputOutcome::Buffered) {
                outcome = buffered;
            }
        }
        outcome
    }

    fn apply_outcome(&mut self, outcome: InputOutcome) {
        match outcome {
            InputOutcome::PromptCompleted(completion) => {
                self.input.clear();
                self.last_completion = Some(completion);
            }
            InputOutcome::Finished { completion, result } => {
                self.input.clear();
                self.composer.clear();
                self.last_completion = Some(completion);
                self.show_results(result);
            }
            InputOutcome::Buffered | InputOutcome::Ignored | InputOutcome::Progress { .. } => {}
        }
    }

    fn show_results(&mut self, result: GameResult) {
        info!("rank {} ({} cpm)", Rank::evaluate(&result), result.cpm);
        self.result = Some(result);
        self.state = AppState::Finished;
        self.results_locked = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bank(&self) -> Option<&QuestionBank> {
        self.bank.as_ref()
    }

    pub fn catalog_error(&self) -> Option<&str> {
        self.catalog_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn composer(&self) -> &RomajiComposer {
        &self.composer
    }

    pub fn last_completion(&self) -> Option<&PromptCompletion> {
        self.last_completion.as_ref()
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selected_theme(&self) -> Option<&ThemeDefinition> {
        let id = self.selection.theme_id.as_deref()?;
        self.bank.as_ref()?.theme(id).ok()
    }
}
