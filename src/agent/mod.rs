//! The per-tick driver built on spatial memory and frontier search.
//!
//! An agent ingests percepts, keeps a plan of moves, and re-plans when the
//! plan runs out or the periodic re-plan interval fires. Two roles share the
//! machinery: the Scout explores and hands its memory to the Collector on the
//! first tick; the Collector heads for known goals and explores otherwise.
//! Both switch to escaping once the time-budget monitor says so.

pub mod percept;

use std::collections::VecDeque;

use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::budget::TimeBudgetMonitor;
use crate::cell::{Category, Cell, CellId, Direction, Position, TypeCode};
use crate::memory::SpatialMemory;
use crate::prng::Prng;
use crate::search::{ExplorationPriority, RandomPriority, Route};

pub use percept::{Heading, Percepts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Role {
    Scout,
    Collector,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Scout => "scout",
            Role::Collector => "collector",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    FollowPlan,
    FindExplorationTarget,
    FindGoal,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentConfig {
    pub role: Role,
    /// Total turn budget handed to the time-budget monitor.
    pub max_turns: u32,
    /// Re-plan every this many turns even if the plan is not exhausted.
    pub replan_every: u32,
    /// Weight of the random term in the exploration priority.
    pub noise: f64,
    /// Weight of a candidate's unknown-neighbour count.
    pub unknown_weight: f64,
    pub seed: u64,
}

impl AgentConfig {
    pub fn scout() -> Self {
        Self {
            role: Role::Scout,
            max_turns: 400,
            replan_every: 9,
            noise: 3.0,
            unknown_weight: 0.5,
            seed: 0x5C0_u64,
        }
    }

    pub fn collector() -> Self {
        Self {
            role: Role::Collector,
            replan_every: 5,
            seed: 0xC011_u64,
            ..Self::scout()
        }
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    #[must_use]
    pub fn with_replan_every(mut self, turns: u32) -> Self {
        self.replan_every = turns.max(1);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::scout()
    }
}

/// Payload handed to the cooperating agent for its next tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Message {
    /// Full memory; sent once, on the Scout's first tick.
    Memory(Box<SpatialMemory>),
    /// Where the sender stands and what it still means to do.
    Intent {
        position: Position,
        plan: Vec<Direction>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub action: Direction,
    pub message: Message,
}

#[derive(Debug, Clone)]
pub struct Agent {
    config: AgentConfig,
    next_turn: u32,
    location: CellId,
    memory: SpatialMemory,
    monitor: TimeBudgetMonitor,
    plan: VecDeque<Direction>,
    mode: Mode,
    /// Where the peer was last heading, projected through our memory.
    peer_target: Option<Position>,
    rng: Prng,
    collected: Vec<TypeCode>,
    exited: bool,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        let mut memory = SpatialMemory::new();
        let location = memory.insert(Cell::new(Position::default(), TypeCode::EMPTY), false);
        Self {
            monitor: TimeBudgetMonitor::new(config.max_turns),
            rng: Prng::new(config.seed),
            config,
            next_turn: 0,
            location,
            memory,
            plan: VecDeque::new(),
            mode: Mode::FollowPlan,
            peer_target: None,
            collected: Vec::new(),
            exited: false,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    /// Turns processed so far.
    pub fn turns(&self) -> u32 {
        self.next_turn
    }

    pub fn memory(&self) -> &SpatialMemory {
        &self.memory
    }

    pub fn location(&self) -> CellId {
        self.location
    }

    pub fn position(&self) -> Position {
        self.memory[self.location].position()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn plan(&self) -> impl Iterator<Item = Direction> + '_ {
        self.plan.iter().copied()
    }

    pub fn peer_target(&self) -> Option<Position> {
        self.peer_target
    }

    pub fn monitor(&self) -> &TimeBudgetMonitor {
        &self.monitor
    }

    pub fn is_escaping(&self) -> bool {
        self.monitor.is_escaping()
    }

    /// Goal codes this agent picked up.
    pub fn collected(&self) -> &[TypeCode] {
        &self.collected
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// One tick: absorb the peer's message and the percepts, maybe re-plan,
    /// and choose a move.
    pub fn update(&mut self, percepts: &Percepts, incoming: Option<Message>) -> Turn {
        let turn = self.next_turn;
        self.next_turn += 1;
        if self.mode != Mode::Escape {
            self.mode = Mode::FollowPlan;
        }

        self.reanchor();

        match incoming {
            Some(Message::Memory(memory)) => self.adopt(*memory),
            Some(Message::Intent { position, plan }) => {
                self.peer_target = Some(self.project(position, &plan));
            }
            None => {}
        }

        // A remembered goal underfoot may already have been taken by the peer.
        if percepts.here() == TypeCode::EMPTY
            && self.memory[self.location].category() == Category::Goal
        {
            self.memory.consume_goal(self.location);
        }

        // Standing on a goal: always take it.
        if percepts.here().category() == Category::Goal {
            self.memory.consume_goal(self.location);
            self.collected.push(percepts.here());
            if self.plan.front() == Some(&Direction::U) {
                self.plan.pop_front();
            }
            return self.finish(turn, Direction::U);
        }

        self.ingest(percepts);

        if !self.monitor.is_escaping() {
            let at = self.position();
            if let Some(route) = self.monitor.check(&self.memory, at, turn, &mut self.rng) {
                self.plan = route.into_moves().into();
                self.mode = Mode::Escape;
            }
        }

        let periodic = turn % self.config.replan_every == 0;
        if !self.monitor.is_escaping() && (self.plan.is_empty() || periodic) {
            self.replan();
        }

        let standing_on_floor = self.memory[self.location].code() == TypeCode::EMPTY;
        let slack = u64::from(turn) + (self.plan.len() as u64) < u64::from(self.config.max_turns);
        let action = if self.monitor.is_escaping() && slack && standing_on_floor {
            // Nothing to gain by arriving early; burn a turn in place.
            Direction::U
        } else {
            match self.plan.pop_front() {
                Some(action) => action,
                None => Route::fallback(&mut self.rng).moves()[0],
            }
        };

        self.apply(action);
        self.finish(turn, action)
    }

    fn finish(&self, turn: u32, action: Direction) -> Turn {
        let message = if turn == 0 && self.config.role == Role::Scout {
            Message::Memory(Box::new(self.memory.clone()))
        } else {
            Message::Intent {
                position: self.position(),
                plan: self.plan.iter().copied().collect(),
            }
        };
        Turn { action, message }
    }

    /// Re-resolve our own cell by position; merges and overwrites may have
    /// replaced it.
    fn reanchor(&mut self) {
        let pos = self.position();
        match self.memory.resolve(pos) {
            Some(id) => self.location = id,
            None => {
                warn!(role = self.config.role.name(), at = %pos, "lost own cell, re-anchoring");
                self.location = self
                    .memory
                    .insert(Cell::new(self.memory.canonical(pos), TypeCode::EMPTY), false);
            }
        }
    }

    fn adopt(&mut self, memory: SpatialMemory) {
        let pos = self.position();
        debug!(role = self.config.role.name(), cells = memory.len(), "adopting peer memory");
        self.memory = memory;
        self.location = match self.memory.resolve(pos) {
            Some(id) => id,
            None => self
                .memory
                .insert(Cell::new(self.memory.canonical(pos), TypeCode::EMPTY), false),
        };
    }

    /// Where the peer ends up if it follows `plan` through our memory.
    fn project(&self, position: Position, plan: &[Direction]) -> Position {
        let Some(mut at) = self.memory.resolve(position) else {
            return self.memory.canonical(position);
        };
        for &step in plan {
            let cell = &self.memory[at];
            if !cell.has_relation(step) {
                continue;
            }
            if let Some(next) = cell.relation(step) {
                if !self.memory[next].is_wall() {
                    at = next;
                }
            }
        }
        self.memory[at].position()
    }

    fn ingest(&mut self, percepts: &Percepts) {
        let origin = self.position();
        for (pos, code) in percepts.observations(origin) {
            // Floor always overrides what was remembered there.
            self.memory
                .insert(Cell::new(pos, code), code == TypeCode::EMPTY);
        }
        self.reanchor();
    }

    /// Collectors head for the nearest reachable goal; everyone else, and a
    /// collector with no reachable goal, heads for the nearest frontier.
    fn replan(&mut self) {
        let at = self.position();

        if self.config.role == Role::Collector && self.memory.has_goals() {
            self.mode = Mode::FindGoal;
            let route = self.memory.search(
                at,
                |c: &Cell| c.category() == Category::Goal,
                &mut RandomPriority,
                &mut self.rng,
            );
            if !route.is_fallback() {
                self.set_plan(route.then(Direction::U));
                return;
            }
        }

        self.mode = Mode::FindExplorationTarget;
        let mut priority = self.exploration_priority(at);
        let route = self
            .memory
            .search(at, Cell::has_unknowns, &mut priority, &mut self.rng);
        self.set_plan(route);
    }

    /// Keep away from the peer's destination or, without word from the
    /// peer, from where we stand.
    fn exploration_priority(&self, at: Position) -> ExplorationPriority {
        ExplorationPriority::new(self.config.noise, self.config.unknown_weight)
            .with_anchor(self.peer_target.unwrap_or(at))
    }

    fn set_plan(&mut self, route: Route) {
        debug!(
            role = self.config.role.name(),
            mode = ?self.mode,
            moves = route.len(),
            fallback = route.is_fallback(),
            "re-planned"
        );
        self.plan = route.into_moves().into();
    }

    /// Mirror the move in our own model of the world.
    fn apply(&mut self, action: Direction) {
        let here = &self.memory[self.location];
        match (action, here.category()) {
            (Direction::U, Category::Exit) => self.exited = true,
            _ => {
                if !here.has_relation(action) {
                    return;
                }
                if let Some(next) = here.relation(action) {
                    if !self.memory[next].is_wall() {
                        self.location = next;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: char) -> TypeCode {
        TypeCode::try_from(c).unwrap()
    }

    fn percepts(here: char, rays: &[(Heading, &str)]) -> Percepts {
        let mut p = Percepts::new(code(here));
        for heading in Heading::ALL {
            p = p.with_ray(heading, vec![TypeCode::WALL]);
        }
        for (heading, codes) in rays {
            p = p.with_ray(*heading, codes.chars().map(code).collect());
        }
        p
    }

    #[test]
    fn new_agent_remembers_its_start() {
        let agent = Agent::new(AgentConfig::scout());
        assert_eq!(agent.position(), Position::new(0, 0, 0));
        assert_eq!(agent.memory().len(), 1);
        assert_eq!(agent.mode(), Mode::FollowPlan);
    }

    #[test]
    fn scout_hands_over_memory_once() {
        let mut scout = Agent::new(AgentConfig::scout());
        let view = percepts('g', &[(Heading::E, "ggw")]);

        let first = scout.update(&view, None);
        assert!(matches!(first.message, Message::Memory(_)));

        let second = scout.update(&view, None);
        assert!(matches!(second.message, Message::Intent { .. }));
    }

    #[test]
    fn collector_walks_to_goal_and_uses_it() {
        let mut agent = Agent::new(AgentConfig::collector());

        let t0 = agent.update(&percepts('g', &[(Heading::E, "3w")]), None);
        assert!(matches!(t0.message, Message::Intent { .. }));
        assert_eq!(agent.mode(), Mode::FindGoal);
        assert_eq!(t0.action, Direction::E);
        assert_eq!(agent.position(), Position::new(1, 0, 0));

        let t1 = agent.update(&percepts('3', &[(Heading::W, "gw")]), None);
        assert_eq!(t1.action, Direction::U);
        assert_eq!(agent.collected(), &[code('3')]);
        assert!(!agent.memory().has_goals());
        assert_eq!(agent.memory()[agent.location()].category(), Category::Empty);
        assert_eq!(agent.plan().count(), 0);
    }

    #[test]
    fn scout_explores_towards_unknowns() {
        let mut agent = Agent::new(AgentConfig::scout());
        // Corridor open to the east, the far end not yet bounded.
        let mut view = percepts('g', &[(Heading::E, "ggg")]);
        view = view.with_ray(Heading::NE, vec![]).with_ray(Heading::SE, vec![]);
        let turn = agent.update(&view, None);
        assert_eq!(agent.mode(), Mode::FindExplorationTarget);
        assert_eq!(turn.action, Direction::E);
    }

    #[test]
    fn walls_do_not_move_the_agent() {
        let mut agent = Agent::new(AgentConfig::scout().with_seed(3));
        // Boxed in on every side: any move is a bump.
        let turn = agent.update(&percepts('g', &[]), None);
        assert!(Direction::CARDINALS.contains(&turn.action));
        assert_eq!(agent.position(), Position::new(0, 0, 0));
    }

    #[test]
    fn tight_budget_forces_escape() {
        let mut agent = Agent::new(AgentConfig::scout().with_max_turns(3));
        let turn = agent.update(&percepts('g', &[(Heading::E, "grw")]), None);
        assert!(agent.is_escaping());
        assert_eq!(agent.mode(), Mode::Escape);
        assert_eq!(turn.action, Direction::E);
        assert_eq!(agent.plan().collect::<Vec<_>>(), vec![Direction::E, Direction::U]);

        // Escape is sticky: no re-planning on the periodic tick.
        let _ = agent.update(&percepts('g', &[(Heading::E, "rw"), (Heading::W, "gw")]), None);
        assert_eq!(agent.mode(), Mode::Escape);
        let last = agent.update(&percepts('r', &[(Heading::W, "ggw")]), None);
        assert_eq!(last.action, Direction::U);
        assert!(agent.has_exited());
    }

    #[test]
    fn adopted_memory_keeps_own_position() {
        let mut scout = Agent::new(AgentConfig::scout());
        let view = percepts('g', &[(Heading::E, "g0w")]);
        let handoff = scout.update(&view, None).message;

        let mut collector = Agent::new(AgentConfig::collector());
        let turn = collector.update(&view, Some(handoff));
        assert!(collector.memory().has_goals());
        assert_eq!(turn.action, Direction::E);
    }

    #[test]
    fn peer_intent_is_projected_through_memory() {
        let mut agent = Agent::new(AgentConfig::scout());
        agent.update(&percepts('g', &[(Heading::E, "gggw")]), None);
        let projected = agent.project(
            Position::new(0, 0, 0),
            &[Direction::E, Direction::E, Direction::N, Direction::U],
        );
        // North of (2, 0) is unobserved and U is not a relation on floor.
        assert_eq!(projected, Position::new(2, 0, 0));
    }

    #[test]
    fn intent_updates_peer_target() {
        let mut agent = Agent::new(AgentConfig::scout());
        let view = percepts('g', &[(Heading::E, "gggw")]);
        agent.update(&view, None);
        assert_eq!(agent.peer_target(), None);

        let intent = Message::Intent {
            position: Position::new(1, 0, 0),
            plan: vec![Direction::E, Direction::E],
        };
        agent.update(&percepts('g', &[(Heading::E, "ggw"), (Heading::W, "gw")]), Some(intent));
        assert_eq!(agent.peer_target(), Some(Position::new(3, 0, 0)));
    }

    #[test]
    fn goal_underfoot_is_taken_even_if_unseen() {
        let mut agent = Agent::new(AgentConfig::scout());
        let turn = agent.update(&percepts('7', &[]), None);
        assert_eq!(turn.action, Direction::U);
        assert_eq!(agent.collected(), &[code('7')]);
        assert_eq!(agent.memory()[agent.location()].code(), TypeCode::EMPTY);
    }

    #[test]
    fn exploration_anchor_falls_back_to_own_position() {
        let mut agent = Agent::new(AgentConfig::scout());
        let here = Position::new(4, -2, 0);
        assert_eq!(agent.exploration_priority(here).anchor, Some(here));

        agent.peer_target = Some(Position::new(1, 1, 0));
        assert_eq!(
            agent.exploration_priority(here).anchor,
            Some(Position::new(1, 1, 0))
        );
    }
}
