use serde::{Deserialize, Serialize};

use crate::util::{per_minute, percentage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub skill_points: u32,
    pub max_flow_streak: u32,
    pub bonus_time_earned: u32,
}

/// Final record of a session, handed to the results screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub correct_count: u32,
    pub total_typed: u32,
    pub cpm: u32,
    pub accuracy: u32,
    pub elapsed_seconds: u32,
    pub flow: FlowSummary,
}

/// Raw counts the compiler turns into a `GameResult`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultInputs {
    pub correct: u32,
    /// typed count accuracy is judged against
    pub accuracy_base: u32,
    /// count the speed figure is made of
    pub speed_count: u32,
    pub elapsed_secs: u32,
    pub flow: FlowSummary,
}

pub fn compile(inputs: ResultInputs) -> GameResult {
    let elapsed_secs = inputs.elapsed_secs.max(1);
    GameResult {
        correct_count: inputs.correct,
        total_typed: inputs.accuracy_base,
        cpm: per_minute(inputs.speed_count, elapsed_secs),
        accuracy: accuracy(inputs.correct, inputs.accuracy_base),
        elapsed_seconds: elapsed_secs,
        flow: inputs.flow,
    }
}

/// Percentage of correct characters; 100 until something is typed.
pub fn accuracy(correct: u32, typed: u32) -> u32 {
    percentage(correct, typed).map_or(100, |p| p.min(100))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
}

impl Rank {
    pub fn evaluate(result: &GameResult) -> Rank {
        let (cpm, accuracy) = (result.cpm, result.accuracy);
        if cpm > 300 && accuracy > 98 {
            Rank::S
        } else if cpm > 250 && accuracy > 95 {
            Rank::A
        } else if cpm > 150 && accuracy > 90 {
            Rank::B
        } else if cpm > 100 {
            Rank::C
        } else {
            Rank::D
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rank::S => "Outstanding! Godlike speed and precision.",
            Rank::A => "Excellent. You are an advanced typist.",
            Rank::B => "Good result. Everyday typing is no problem for you.",
            Rank::C => "Not bad. A little more practice will take you further.",
            Rank::D => "Keep going. Practice is the only way!",
        }
    }
}
