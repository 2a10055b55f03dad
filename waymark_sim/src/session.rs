use serde::Serialize;
use tracing::{debug, info};
use waymark::agent::{Agent, AgentConfig, Message, Role};
use waymark::observer::AgentAdapter;

use crate::world::{Event, World};

/// Per-agent bookkeeping held by the simulator, in world coordinates.
#[derive(Debug)]
struct Runner {
    agent: Agent,
    at: (i32, i32),
    inbox: Option<Message>,
    exited: bool,
    collected: Vec<char>,
    bumps: u32,
    teleports: u32,
}

impl Runner {
    fn new(config: AgentConfig, at: (i32, i32)) -> Self {
        Self {
            agent: Agent::new(config),
            at,
            inbox: None,
            exited: false,
            collected: Vec::new(),
            bumps: 0,
            teleports: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub role: &'static str,
    pub at: (i32, i32),
    pub exited: bool,
    pub collected: String,
    pub bumps: u32,
    pub teleports: u32,
    pub remembered_cells: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub turns: u32,
    pub goals_collected: usize,
    pub goals_left: usize,
    pub agents: Vec<AgentSummary>,
}

/// A Scout and a Collector sharing one world. Messages sent on one tick are
/// delivered on the next.
pub struct Session {
    world: World,
    runners: Vec<Runner>,
    turn: u32,
    max_turns: u32,
}

impl Session {
    pub fn new(world: World, start: (usize, usize), max_turns: u32, seed: u64) -> Self {
        let at = (start.0 as i32, start.1 as i32);
        let scout = AgentConfig::scout().with_max_turns(max_turns).with_seed(seed);
        let collector = AgentConfig::collector()
            .with_max_turns(max_turns)
            .with_seed(seed.rotate_left(17) ^ 0xC011);
        Self {
            world,
            runners: vec![Runner::new(scout, at), Runner::new(collector, at)],
            turn: 0,
            max_turns,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.runners.iter().map(|r| &r.agent)
    }

    pub fn is_finished(&self) -> bool {
        self.turn >= self.max_turns || self.runners.iter().all(|r| r.exited)
    }

    /// Advance every agent still in the world by one tick.
    pub fn step(&mut self) {
        let turn = self.turn;
        let mut outbox: Vec<Option<Message>> = Vec::with_capacity(self.runners.len());

        for runner in &mut self.runners {
            if runner.exited {
                outbox.push(None);
                continue;
            }
            let percepts = self.world.percepts(runner.at.0, runner.at.1);
            let decided = runner.agent.update(&percepts, runner.inbox.take());
            let (to, event) = self.world.apply(runner.at, decided.action);
            runner.at = to;

            match event {
                Event::Bump => runner.bumps += 1,
                Event::Teleported => runner.teleports += 1,
                Event::Collected(code) => {
                    runner.collected.push(code.as_char());
                    info!(turn, role = runner.agent.role().name(), %code, "goal collected");
                }
                Event::Exited => {
                    runner.exited = true;
                    info!(turn, role = runner.agent.role().name(), "left through the exit");
                }
                Event::Moved | Event::Waited => {}
            }
            debug!(
                turn,
                role = runner.agent.role().name(),
                action = %decided.action,
                event = event.as_str(),
                x = to.0,
                y = to.1,
                "tick"
            );
            outbox.push(Some(decided.message));
        }

        // Two agents: each one's message goes to the other.
        let n = self.runners.len();
        for (i, message) in outbox.into_iter().enumerate() {
            if let Some(message) = message {
                self.runners[(i + 1) % n].inbox = Some(message);
            }
        }
        self.turn += 1;
    }

    pub fn run(&mut self) -> Summary {
        while !self.is_finished() {
            self.step();
        }
        self.summary()
    }

    pub fn summary(&self) -> Summary {
        let agents: Vec<AgentSummary> = self
            .runners
            .iter()
            .map(|r| AgentSummary {
                role: r.agent.role().name(),
                at: r.at,
                exited: r.exited,
                collected: r.collected.iter().collect(),
                bumps: r.bumps,
                teleports: r.teleports,
                remembered_cells: r.agent.memory().len(),
            })
            .collect();
        Summary {
            turns: self.turn,
            goals_collected: agents.iter().map(|a| a.collected.chars().count()).sum(),
            goals_left: self.world.goals_left(),
            agents,
        }
    }

    /// Terminal dump of one agent's memory.
    pub fn render(&self, role: Role) -> Option<String> {
        self.runners
            .iter()
            .find(|r| r.agent.role() == role)
            .map(|r| AgentAdapter::new(&r.agent).render())
    }
}
