use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Prompt;

/// A finite, one-way run through the prompts of a session.
#[derive(Debug, Clone)]
pub struct PromptSequencer {
    prompts: Vec<Prompt>,
    cursor: usize,
}

impl PromptSequencer {
    /// Keeps the given order.
    pub fn new(prompts: Vec<Prompt>) -> Self {
        Self { prompts, cursor: 0 }
    }

    /// Shuffles once up front; the order is fixed for the rest of the session.
    pub fn shuffled<R: Rng + ?Sized>(mut prompts: Vec<Prompt>, rng: &mut R) -> Self {
        prompts.shuffle(rng);
        Self::new(prompts)
    }

    pub fn current(&self) -> Option<&Prompt> {
        self.prompts.get(self.cursor)
    }

    /// Moves to the next prompt. The cursor never moves back.
    pub fn advance(&mut self) {
        if self.cursor < self.prompts.len() {
            self.cursor += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Zero-based index of the current prompt.
    pub fn position(&self) -> usize {
        self.cursor
    }
}
