use std::borrow::Cow;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Indentation inserted for a Tab keystroke in copy mode.
pub const INDENT: &str = "  ";

/// How the player enters text; decides the scoring text and the speed unit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InputMode {
    /// kana entered through a composing input method (romaji)
    Japanese,
    /// literal latin text
    English,
    /// code transcription, indentation insensitive
    Copy,
}

/// What the characters-per-minute figure counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    Keystrokes,
    TypedChars,
    ScoringChars,
}

impl InputMode {
    pub const ALL: [InputMode; 3] = [InputMode::Japanese, InputMode::English, InputMode::Copy];

    pub fn strips_horizontal_whitespace(self) -> bool {
        matches!(self, InputMode::Copy)
    }

    pub fn speed_unit(self) -> SpeedUnit {
        match self {
            InputMode::Japanese => SpeedUnit::Keystrokes,
            InputMode::English => SpeedUnit::TypedChars,
            InputMode::Copy => SpeedUnit::ScoringChars,
        }
    }

    /// Copy mode judges accuracy against whitespace-free counts.
    pub fn accuracy_uses_scoring_count(self) -> bool {
        matches!(self, InputMode::Copy)
    }

    /// Indentation unit a Tab keystroke inserts, if the mode takes one.
    pub fn indent(self) -> Option<&'static str> {
        match self {
            InputMode::Copy => Some(INDENT),
            _ => None,
        }
    }

    /// Text used for comparison and for scoring counts.
    pub fn scoring_text(self, text: &str) -> Cow<'_, str> {
        if self.strips_horizontal_whitespace() && text.contains([' ', '\t']) {
            Cow::Owned(text.chars().filter(|c| !matches!(c, ' ' | '\t')).collect())
        } else {
            Cow::Borrowed(text)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputMode::Japanese => "Japanese (romaji -> kana)",
            InputMode::English => "English",
            InputMode::Copy => "Copy (code transcription)",
        }
    }
}

pub fn normalize_line_endings(raw: &str) -> Cow<'_, str> {
    if raw.contains("\r\n") {
        Cow::Owned(raw.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

pub fn char_len(text: &str) -> u32 {
    text.chars().count() as u32
}

/// One rung of the flow bonus ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowThreshold {
    pub streak: u32,
    pub bonus_secs: u32,
    pub label: String,
}

impl FlowThreshold {
    pub fn new(streak: u32, bonus_secs: u32, label: &str) -> Self {
        Self {
            streak,
            bonus_secs,
            label: label.to_string(),
        }
    }
}

/// Tunable numbers of a session. Defaults reproduce the classic game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    pub duration_secs: u32,
    pub flow_thresholds: Vec<FlowThreshold>,
    /// skill points per bonus second awarded by a threshold
    pub flow_skill_multiplier: u32,
    pub precision_ratio: f64,
    pub min_precision_bonus: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            duration_secs: 180,
            flow_thresholds: vec![
                FlowThreshold::new(3, 5, "warm-up"),
                FlowThreshold::new(6, 8, "focus"),
                FlowThreshold::new(10, 12, "deep flow"),
            ],
            flow_skill_multiplier: 5,
            precision_ratio: 0.4,
            min_precision_bonus: 5,
        }
    }
}

impl SessionPolicy {
    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Thresholds sorted by streak; the config file may list them in any order.
    pub fn sorted_thresholds(&self) -> Vec<FlowThreshold> {
        let mut thresholds = self.flow_thresholds.clone();
        thresholds.sort_by_key(|t| t.streak);
        thresholds
    }

    /// Base points plus the precision bonus for a completed prompt.
    pub fn prompt_points(&self, scoring_len: u32, had_mistake: bool) -> (u32, u32) {
        let precision = if had_mistake {
            0
        } else {
            let scaled = (scoring_len as f64 * self.precision_ratio).round() as u32;
            scaled.max(self.min_precision_bonus)
        };
        (scoring_len, precision)
    }
}
