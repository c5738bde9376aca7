use std::collections::BTreeSet;

use log::info;

use crate::typing_policy::FlowThreshold;

/// What a single prompt completion added through the flow ladder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowAward {
    pub streak: u32,
    pub bonus_secs: u32,
    pub skill_points: u32,
    /// streak values of the thresholds claimed by this completion
    pub claimed: Vec<u32>,
}

/// Streak bookkeeping across prompt completions.
#[derive(Debug, Clone, Default)]
pub struct FlowTracker {
    streak: u32,
    max_streak: u32,
    claimed: BTreeSet<u32>,
    bonus_secs_earned: u32,
    skill_points: u32,
}

impl FlowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a finished prompt. A prompt with any mistake breaks the
    /// streak and releases every claimed threshold.
    pub fn complete_prompt(
        &mut self,
        had_mistake: bool,
        thresholds: &[FlowThreshold],
        skill_multiplier: u32,
    ) -> FlowAward {
        let mut award = FlowAward::default();

        if had_mistake {
            self.streak = 0;
            self.claimed.clear();
        } else {
            self.streak += 1;
            for threshold in thresholds {
                if self.streak >= threshold.streak && self.claimed.insert(threshold.streak) {
                    award.bonus_secs += threshold.bonus_secs;
                    award.skill_points += threshold.bonus_secs * skill_multiplier;
                    award.claimed.push(threshold.streak);
                    info!(
                        "flow threshold {} ({}) reached: +{}s",
                        threshold.streak, threshold.label, threshold.bonus_secs
                    );
                }
            }
        }

        self.max_streak = self.max_streak.max(self.streak);
        self.bonus_secs_earned += award.bonus_secs;
        self.skill_points += award.skill_points;
        award.streak = self.streak;
        award
    }

    pub fn add_skill_points(&mut self, points: u32) {
        self.skill_points += points;
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn bonus_secs_earned(&self) -> u32 {
        self.bonus_secs_earned
    }

    pub fn skill_points(&self) -> u32 {
        self.skill_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing_policy::SessionPolicy;

    fn run(tracker: &mut FlowTracker, mistakes: &[bool]) -> Vec<FlowAward> {
        let policy = SessionPolicy::default();
        mistakes
            .iter()
            .map(|m| tracker.complete_prompt(*m, &policy.flow_thresholds, policy.flow_skill_multiplier))
            .collect()
    }

    #[test]
    fn clean_prompts_grow_the_streak() {
        let mut tracker = FlowTracker::new();
        let awards = run(&mut tracker, &[false, false]);
        assert_eq!(awards[1].streak, 2);
        assert_eq!(tracker.streak(), 2);
        assert_eq!(tracker.max_streak(), 2);
        assert_eq!(tracker.bonus_secs_earned(), 0);
    }

    #[test]
    fn third_clean_prompt_claims_first_threshold() {
        let mut tracker = FlowTracker::new();
        let awards = run(&mut tracker, &[false, false, false]);
        assert_eq!(awards[2].bonus_secs, 5);
        assert_eq!(awards[2].skill_points, 25);
        assert_eq!(awards[2].claimed, vec![3]);
        assert_eq!(tracker.skill_points(), 25);
    }

    #[test]
    fn threshold_is_not_reclaimed_while_streak_holds() {
        let mut tracker = FlowTracker::new();
        run(&mut tracker, &[false; 5]);
        assert_eq!(tracker.bonus_secs_earned(), 5);
        run(&mut tracker, &[false; 5]);
        // 6 and 10 claimed once each on top of 3
        assert_eq!(tracker.bonus_secs_earned(), 5 + 8 + 12);
        assert_eq!(tracker.max_streak(), 10);
    }

    #[test]
    fn mistake_resets_streak_and_claims() {
        let mut tracker = FlowTracker::new();
        run(&mut tracker, &[false, false, false, true]);
        assert_eq!(tracker.streak(), 0);
        assert_eq!(tracker.max_streak(), 3);

        let awards = run(&mut tracker, &[false, false, false]);
        assert_eq!(awards[2].bonus_secs, 5);
        assert_eq!(tracker.bonus_secs_earned(), 10);
    }

    #[test]
    fn unsorted_thresholds_still_fire_on_reach() {
        let thresholds = vec![
            FlowThreshold::new(2, 4, "b"),
            FlowThreshold::new(1, 1, "a"),
        ];
        let mut tracker = FlowTracker::new();
        let first = tracker.complete_prompt(false, &thresholds, 5);
        assert_eq!(first.claimed, vec![1]);
        let second = tracker.complete_prompt(false, &thresholds, 5);
        assert_eq!(second.claimed, vec![2]);
        assert_eq!(tracker.skill_points(), 25);
    }
}
