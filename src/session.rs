use log::{debug, info};
use rand::Rng;

use crate::catalog::{GameOptions, Prompt, QuestionBank};
use crate::error::{Error, Result};
use crate::flow::{FlowAward, FlowTracker};
use crate::result::{self, FlowSummary, GameResult, ResultInputs};
use crate::sequencer::PromptSequencer;
use crate::timer::{Clock, Countdown, ManualTimer, SystemClock, TimerService};
use crate::typing_policy::{
    char_len, normalize_line_endings, FlowThreshold, InputMode, SessionPolicy, SpeedUnit,
};
use crate::util::per_minute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// waiting for the first keystroke
    Idle,
    Running,
    Finished,
}

/// A key press as far as speed accounting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Backspace,
    Delete,
    Enter,
    Tab,
    /// a key consumed by an open composition
    Composing,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total_typed: u32,
    pub scoring_typed: u32,
    pub correct: u32,
    pub keystrokes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCompletion {
    /// index of the completed prompt in the session queue
    pub index: usize,
    pub scoring_len: u32,
    pub base_points: u32,
    pub precision_bonus: u32,
    pub had_mistake: bool,
    pub flow: FlowAward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// recorded for display only, a composition is open
    Buffered,
    /// recorded for display only, the session is over or has no prompt
    Ignored,
    Progress { mistake: bool },
    PromptCompleted(PromptCompletion),
    /// the completed prompt was the last one
    Finished {
        completion: PromptCompletion,
        result: GameResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ignored,
    Running { remaining_secs: u32 },
    Finished(GameResult),
}

/// Figures for the heads-up display while playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub remaining_secs: u32,
    pub cpm: u32,
    pub accuracy: u32,
    pub flow_streak: u32,
    pub max_flow_streak: u32,
    pub skill_points: u32,
    pub bonus_secs: u32,
}

/// One play-through: prompt queue, input reconciliation, countdown and flow.
pub struct Session {
    mode: InputMode,
    policy: SessionPolicy,
    thresholds: Vec<FlowThreshold>,
    sequencer: PromptSequencer,
    typed: String,
    processed: String,
    composing: bool,
    has_mistake: bool,
    counters: Counters,
    flow: FlowTracker,
    countdown: Countdown,
    started_at_ms: Option<u64>,
    phase: SessionPhase,
    result: Option<GameResult>,
    clock: Box<dyn Clock>,
    timer: Box<dyn TimerService>,
}

impl Session {
    pub fn new(mode: InputMode, sequencer: PromptSequencer, policy: SessionPolicy) -> Result<Self> {
        if sequencer.is_empty() {
            return Err(Error::EmptyPromptQueue);
        }
        Ok(Self {
            mode,
            thresholds: policy.sorted_thresholds(),
            countdown: Countdown::new(policy.duration_secs),
            policy,
            sequencer,
            typed: String::new(),
            processed: String::new(),
            composing: false,
            has_mistake: false,
            counters: Counters::default(),
            flow: FlowTracker::new(),
            started_at_ms: None,
            phase: SessionPhase::Idle,
            result: None,
            clock: Box::new(SystemClock::new()),
            timer: Box::new(ManualTimer::new()),
        })
    }

    /// Shuffled prompts for a catalog selection.
    pub fn from_catalog<R: Rng + ?Sized>(
        bank: &QuestionBank,
        options: &GameOptions,
        policy: SessionPolicy,
        rng: &mut R,
    ) -> Result<Self> {
        let prompts = bank.prompts(options)?;
        info!(
            "new session: theme {} {} {} ({} prompts)",
            options.theme_id,
            options.language,
            options.length,
            prompts.len()
        );
        Self::new(
            options.language,
            PromptSequencer::shuffled(prompts, rng),
            policy,
        )
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_timer(mut self, timer: impl TimerService + 'static) -> Self {
        self.timer = Box::new(timer);
        self
    }

    /// Counts a key press toward the keystroke total. Modified keys
    /// (shortcuts) and anything after the end are not counted.
    pub fn record_keystroke(&mut self, key: Keystroke, has_modifier: bool) -> bool {
        if self.is_finished() || has_modifier || key == Keystroke::Other {
            return false;
        }
        self.counters.keystrokes += 1;
        true
    }

    pub fn begin_composition(&mut self) {
        self.composing = true;
    }

    /// Commits a composition; the committed value is always reconciled.
    pub fn end_composition(&mut self, raw: &str) -> InputOutcome {
        self.composing = false;
        self.process(raw, true)
    }

    /// Full current value of the input field.
    pub fn update_snapshot(&mut self, raw: &str) -> InputOutcome {
        self.process(raw, false)
    }

    fn process(&mut self, raw: &str, force: bool) -> InputOutcome {
        let normalized = normalize_line_endings(raw).into_owned();
        self.typed.clone_from(&normalized);

        if self.composing && !force {
            return InputOutcome::Buffered;
        }

        if self.is_finished() {
            self.processed = normalized;
            return InputOutcome::Ignored;
        }

        if self.phase == SessionPhase::Idle && !normalized.is_empty() {
            self.start();
        }

        let target = match self.sequencer.current() {
            Some(prompt) => self.mode.scoring_text(&prompt.text).into_owned(),
            None => {
                self.processed = normalized;
                return InputOutcome::Ignored;
            }
        };

        let previous_len = char_len(&self.processed);
        let current_len = char_len(&normalized);
        if current_len > previous_len {
            self.counters.total_typed += current_len - previous_len;
        }

        let previous_scoring_len = char_len(&self.mode.scoring_text(&self.processed));
        let scoring = self.mode.scoring_text(&normalized).into_owned();
        let scoring_len = char_len(&scoring);
        if scoring_len > previous_scoring_len {
            // scoring chars are a subset of typed chars
            let headroom = self.counters.total_typed - self.counters.scoring_typed;
            self.counters.scoring_typed += (scoring_len - previous_scoring_len).min(headroom);
        }

        if !target.starts_with(scoring.as_str()) && !self.has_mistake {
            debug!(
                "mistake in prompt {}: {:?} diverged from target",
                self.sequencer.position(),
                scoring
            );
            self.has_mistake = true;
        }

        self.processed = normalized;

        if scoring == target {
            return self.complete_prompt(char_len(&target));
        }

        InputOutcome::Progress {
            mistake: self.has_mistake,
        }
    }

    fn start(&mut self) {
        self.phase = SessionPhase::Running;
        self.started_at_ms = Some(self.clock.now_ms());
        self.timer.start();
        info!(
            "session started: mode {}, {} prompts, {}s on the clock",
            self.mode,
            self.sequencer.len(),
            self.countdown.remaining_secs()
        );
    }

    fn complete_prompt(&mut self, scoring_len: u32) -> InputOutcome {
        let had_mistake = self.has_mistake;
        self.counters.correct += scoring_len;

        let (base_points, precision_bonus) = self.policy.prompt_points(scoring_len, had_mistake);
        self.flow.add_skill_points(base_points + precision_bonus);

        let award = self.flow.complete_prompt(
            had_mistake,
            &self.thresholds,
            self.policy.flow_skill_multiplier,
        );
        if award.bonus_secs > 0 {
            self.countdown.add(award.bonus_secs);
        }

        let completion = PromptCompletion {
            index: self.sequencer.position(),
            scoring_len,
            base_points,
            precision_bonus,
            had_mistake,
            flow: award,
        };
        debug!(
            "prompt {} complete: +{} points, streak {}",
            completion.index,
            base_points + precision_bonus,
            completion.flow.streak
        );

        self.has_mistake = false;
        self.processed.clear();
        self.typed.clear();
        self.sequencer.advance();

        if self.sequencer.is_exhausted() {
            let result = self.finish();
            return InputOutcome::Finished { completion, result };
        }
        InputOutcome::PromptCompleted(completion)
    }

    /// One second of real time passed.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Running {
            return TickOutcome::Ignored;
        }
        if self.countdown.tick() {
            return TickOutcome::Finished(self.finish());
        }
        TickOutcome::Running {
            remaining_secs: self.countdown.remaining_secs(),
        }
    }

    /// Finalizes the session. Calling it again returns the same result.
    pub fn finish(&mut self) -> GameResult {
        if let Some(result) = self.result {
            return result;
        }

        let result = result::compile(ResultInputs {
            correct: self.counters.correct,
            accuracy_base: self.accuracy_base(),
            speed_count: self.speed_count(),
            elapsed_secs: self.elapsed_secs(),
            flow: self.flow_summary(),
        });

        self.phase = SessionPhase::Finished;
        self.composing = false;
        self.timer.stop();
        self.result = Some(result);
        info!(
            "session finished: {} cpm, {}% accuracy, {}s, {} skill points",
            result.cpm, result.accuracy, result.elapsed_seconds, result.flow.skill_points
        );
        result
    }

    fn elapsed_secs(&self) -> u32 {
        match self.started_at_ms {
            Some(start) => {
                let elapsed_ms = self.clock.now_ms().saturating_sub(start);
                ((elapsed_ms / 1000) as u32).max(1)
            }
            None => match self.countdown.consumed_secs() {
                0 => self.countdown.duration_secs().max(1),
                consumed => consumed,
            },
        }
    }

    fn speed_count(&self) -> u32 {
        match self.mode.speed_unit() {
            SpeedUnit::Keystrokes => self.counters.keystrokes,
            SpeedUnit::TypedChars => self.counters.total_typed,
            SpeedUnit::ScoringChars => self.counters.scoring_typed,
        }
    }

    fn accuracy_base(&self) -> u32 {
        if self.mode.accuracy_uses_scoring_count() {
            self.counters.scoring_typed
        } else {
            self.counters.total_typed
        }
    }

    fn flow_summary(&self) -> FlowSummary {
        FlowSummary {
            skill_points: self.flow.skill_points(),
            max_flow_streak: self.flow.max_streak(),
            bonus_time_earned: self.flow.bonus_secs_earned(),
        }
    }

    pub fn live_stats(&self) -> LiveStats {
        let (cpm, accuracy) = match (&self.result, self.started_at_ms) {
            (Some(result), _) => (result.cpm, result.accuracy),
            (None, Some(_)) => (
                per_minute(self.speed_count(), self.elapsed_secs()),
                result::accuracy(self.counters.correct, self.accuracy_base()),
            ),
            (None, None) => (0, 100),
        };
        LiveStats {
            remaining_secs: self.countdown.remaining_secs(),
            cpm,
            accuracy,
            flow_streak: self.flow.streak(),
            max_flow_streak: self.flow.max_streak(),
            skill_points: self.flow.skill_points(),
            bonus_secs: self.flow.bonus_secs_earned(),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn current_prompt(&self) -> Option<&Prompt> {
        self.sequencer.current()
    }

    pub fn prompt_position(&self) -> usize {
        self.sequencer.position()
    }

    pub fn prompt_count(&self) -> usize {
        self.sequencer.len()
    }

    /// Raw input of the active prompt, uncommitted composition included.
    pub fn typed_text(&self) -> &str {
        &self.typed
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn has_mistake(&self) -> bool {
        self.has_mistake
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn flow(&self) -> &FlowTracker {
        &self.flow
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.timer.stop();
    }
}
