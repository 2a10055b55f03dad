//! Breadth-first frontier search over the known adjacency graph.
//!
//! The frontier is FIFO, so cells come off it in non-decreasing hop count and
//! the first one satisfying the goal is a nearest one. The caller-supplied
//! [`Priority`] only decides the order in which same-level neighbours are
//! queued, which picks among equally short routes.

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::cell::{Cell, CellId, Direction, Position};
use crate::memory::SpatialMemory;
use crate::prng::Prng;

/// Orders neighbours before they join the frontier. Higher scores are
/// queued first.
pub trait Priority {
    fn score(&mut self, dir: Direction, cell: &Cell, rng: &mut Prng) -> f64;
}

impl<F> Priority for F
where
    F: FnMut(Direction, &Cell, &mut Prng) -> f64,
{
    fn score(&mut self, dir: Direction, cell: &Cell, rng: &mut Prng) -> f64 {
        self(dir, cell, rng)
    }
}

/// Pure noise: a uniformly shuffled expansion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPriority;

impl Priority for RandomPriority {
    fn score(&mut self, _dir: Direction, _cell: &Cell, rng: &mut Prng) -> f64 {
        rng.next_f64_01()
    }
}

/// `noise * r + unknown_weight * unknowns + distance(cell, anchor)`.
///
/// Favours cells that would reveal more of the map and keeps away from the
/// anchor, usually where the other agent is heading.
#[derive(Debug, Clone, Copy)]
pub struct ExplorationPriority {
    pub noise: f64,
    pub unknown_weight: f64,
    pub anchor: Option<Position>,
}

impl ExplorationPriority {
    pub fn new(noise: f64, unknown_weight: f64) -> Self {
        Self {
            noise,
            unknown_weight,
            anchor: None,
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: Position) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

impl Default for ExplorationPriority {
    fn default() -> Self {
        Self::new(3.0, 0.5)
    }
}

impl Priority for ExplorationPriority {
    fn score(&mut self, _dir: Direction, cell: &Cell, rng: &mut Prng) -> f64 {
        let distance = self
            .anchor
            .map(|a| cell.position().distance(a))
            .unwrap_or(0.0);
        self.noise * rng.next_f64_01() + self.unknown_weight * cell.unknown_count() as f64
            + distance
    }
}

/// Result of a search: the moves to a matching cell, or a single random
/// cardinal step when nothing matching is reachable through known territory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    moves: Vec<Direction>,
    target: Option<CellId>,
}

impl Route {
    pub fn fallback(rng: &mut Prng) -> Self {
        let dir = rng
            .choose(&Direction::CARDINALS)
            .copied()
            .unwrap_or(Direction::N);
        Self {
            moves: vec![dir],
            target: None,
        }
    }

    pub fn moves(&self) -> &[Direction] {
        &self.moves
    }

    pub fn into_moves(self) -> Vec<Direction> {
        self.moves
    }

    /// The matching cell, or `None` for a fallback route.
    pub fn target(&self) -> Option<CellId> {
        self.target
    }

    pub fn is_fallback(&self) -> bool {
        self.target.is_none()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Append a trailing action, e.g. `U` to use whatever the route reaches.
    #[must_use]
    pub fn then(mut self, dir: Direction) -> Self {
        self.moves.push(dir);
        self
    }
}

/// Search configuration over one memory.
#[derive(Debug, Clone, Copy)]
pub struct FrontierSearch<'m> {
    memory: &'m SpatialMemory,
    max_hops: Option<usize>,
}

impl<'m> FrontierSearch<'m> {
    pub fn new(memory: &'m SpatialMemory) -> Self {
        Self {
            memory,
            max_hops: None,
        }
    }

    /// Do not expand beyond this many moves from the start.
    #[must_use]
    pub fn max_hops(mut self, hops: usize) -> Self {
        self.max_hops = Some(hops);
        self
    }

    pub fn run<G, P>(&self, start: Position, mut goal: G, priority: &mut P, rng: &mut Prng) -> Route
    where
        G: FnMut(&Cell) -> bool,
        P: Priority + ?Sized,
    {
        let memory = self.memory;
        let start = memory.canonical(start);
        let Some(start_id) = memory.lookup(start) else {
            return Route::fallback(rng);
        };

        // position -> (came from, move taken)
        let mut parents: HashMap<Position, Option<(Position, Direction)>> = HashMap::new();
        parents.insert(start, None);

        let mut frontier: VecDeque<(CellId, usize)> = VecDeque::new();
        frontier.push_back((start_id, 0));

        let mut candidates: Vec<(f64, Direction, CellId)> = Vec::with_capacity(5);

        while let Some((id, hops)) = frontier.pop_front() {
            let cell = &memory[id];
            if goal(cell) {
                return Route {
                    moves: reconstruct(&parents, cell.position()),
                    target: Some(id),
                };
            }
            if self.max_hops.is_some_and(|max| hops >= max) {
                continue;
            }

            candidates.clear();
            for (dir, next) in cell.relations() {
                let Some(next) = next else { continue };
                let neighbor = &memory[next];
                // Walls block; so does anything no longer stored where it claims to be.
                if neighbor.is_wall() || memory.lookup(neighbor.position()) != Some(next) {
                    continue;
                }
                candidates.push((priority.score(dir, neighbor, rng), dir, next));
            }
            candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

            for &(_, dir, next) in &candidates {
                let pos = memory[next].position();
                if parents.contains_key(&pos) {
                    continue;
                }
                parents.insert(pos, Some((cell.position(), dir)));
                frontier.push_back((next, hops + 1));
            }
        }

        Route::fallback(rng)
    }
}

fn reconstruct(
    parents: &HashMap<Position, Option<(Position, Direction)>>,
    mut at: Position,
) -> Vec<Direction> {
    let mut moves = Vec::new();
    while let Some(Some((from, dir))) = parents.get(&at) {
        moves.push(*dir);
        at = *from;
    }
    moves.reverse();
    moves
}

impl SpatialMemory {
    /// Shortest known route from `start` to the nearest cell matching `goal`.
    pub fn search<G, P>(&self, start: Position, goal: G, priority: &mut P, rng: &mut Prng) -> Route
    where
        G: FnMut(&Cell) -> bool,
        P: Priority + ?Sized,
    {
        FrontierSearch::new(self).run(start, goal, priority, rng)
    }
}
