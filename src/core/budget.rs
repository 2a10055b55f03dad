//! Decides when exploring has to stop and the agent must head for the exit.

use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::{Category, Cell, Direction, Position, TypeCode};
use crate::memory::SpatialMemory;
use crate::prng::Prng;
use crate::search::{RandomPriority, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeBudgetMonitor {
    budget: u32,
    /// Length of the last known exit route including the final `U`.
    cost_to_exit: Option<u32>,
    last_check: u32,
    escaping: bool,
}

impl TimeBudgetMonitor {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            cost_to_exit: None,
            last_check: 0,
            escaping: false,
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn cost_to_exit(&self) -> Option<u32> {
        self.cost_to_exit
    }

    pub fn last_check(&self) -> u32 {
        self.last_check
    }

    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// `cost_to_exit + 2 * turns_since_last_check + 1 >= budget`, with an
    /// unknown cost counting as infinite.
    pub fn under_pressure(&self, turn: u32) -> bool {
        match self.cost_to_exit {
            None => true,
            Some(cost) => {
                let elapsed = u64::from(turn.saturating_sub(self.last_check));
                u64::from(cost) + 2 * elapsed + 1 >= u64::from(self.budget)
            }
        }
    }

    /// Re-measure the exit route when the inequality fires and, if it still
    /// holds with the fresh cost, switch to escaping for good and return the
    /// route (ending in `U`) as the new plan.
    ///
    /// Does nothing while already escaping or when no exit is known. The
    /// traversal is a full search, so it only runs under pressure.
    pub fn check(
        &mut self,
        memory: &SpatialMemory,
        at: Position,
        turn: u32,
        rng: &mut Prng,
    ) -> Option<Route> {
        if self.escaping || memory.landmark(TypeCode::EXIT).is_none() {
            return None;
        }
        if !self.under_pressure(turn) {
            return None;
        }

        let route = memory.search(
            at,
            |c: &Cell| c.category() == Category::Exit,
            &mut RandomPriority,
            rng,
        );
        if route.is_fallback() {
            debug!(turn, "exit known but not reachable through known cells");
            return None;
        }

        let route = route.then(Direction::U);
        self.cost_to_exit = Some(route.len() as u32);
        self.last_check = turn;
        debug!(turn, cost = route.len(), "time check");

        if self.under_pressure(turn) {
            self.escaping = true;
            info!(turn, cost = route.len(), budget = self.budget, "escaping");
            return Some(route);
        }
        None
    }
}
