//! Deterministic helpers for tests.

use crate::casino::RandomSource;
use std::collections::VecDeque;
use wager_types::casino::Card;

/// Replays a fixed script of draws.
///
/// Each scripted value is reduced modulo the requested bound. Once the script
/// runs dry every draw returns the top of its range, which makes
/// [RandomSource::shuffle] leave a slice in its original order.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    script: VecDeque<u32>,
}

impl ScriptedRng {
    pub fn new(script: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Queue more draws behind the remaining script.
    pub fn push(&mut self, values: impl IntoIterator<Item = u32>) {
        self.script.extend(values);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRng {
    fn next_bounded(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        match self.script.pop_front() {
            Some(value) => value % max,
            None => max - 1,
        }
    }
}

/// Arrange a deck so that dealing yields `order` front to back.
pub fn stacked_deck(order: &[Card]) -> Vec<Card> {
    order.iter().rev().copied().collect()
}
