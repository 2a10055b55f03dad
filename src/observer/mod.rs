use core::fmt::Write as _;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::agent::{Agent, Mode, Role};
use crate::cell::{Category, Cell, Direction, LayerId, Position};
use crate::memory::SpatialMemory;
use crate::window::Bounds;

/// A read-only snapshot of what an agent remembers.
///
/// Design intent:
/// - Observers cannot mutate or steer the agent.
/// - Snapshotting is *on-demand* and can allocate; the tick loop stays unchanged.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MemorySnapshot {
    pub cells: usize,
    pub layers: Vec<LayerSnapshot>,
    /// `(code, position)` sorted by code.
    pub landmarks: Vec<(char, Position)>,
    pub goals: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LayerSnapshot {
    pub layer: LayerId,
    pub bounds: Option<Bounds>,
    pub occupied: usize,
}

pub struct MemoryAdapter<'a> {
    memory: &'a SpatialMemory,
}

impl<'a> MemoryAdapter<'a> {
    pub fn new(memory: &'a SpatialMemory) -> Self {
        Self { memory }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let memory = self.memory;
        let layers = memory
            .active_layers()
            .map(|layer| LayerSnapshot {
                layer,
                bounds: memory.layer_bounds(layer),
                occupied: memory.cells_on(layer).count(),
            })
            .collect();

        let mut landmarks: Vec<(char, Position)> = memory
            .landmarks()
            .map(|(code, id)| (code.as_char(), memory[id].position()))
            .collect();
        landmarks.sort_unstable();

        MemorySnapshot {
            cells: memory.iter().count(),
            layers,
            landmarks,
            goals: memory.goals().count(),
        }
    }

    /// Text grid of every active layer, one 4-character tile per cell.
    ///
    /// Floor and transporter tiles spell out their unknown directions,
    /// unobserved slots print `?`. `marker` draws `@@@@` over one position.
    pub fn render(&self, marker: Option<Position>) -> String {
        let memory = self.memory;
        let mut out = String::new();

        for layer in memory.active_layers() {
            let Some(b) = memory.layer_bounds(layer) else {
                continue;
            };
            let rule = format!("-----------+-{}", "-".repeat(5 * b.width()));

            let _ = write!(out, "layer: {layer:3} |");
            for x in b.min_x..=b.max_x {
                let _ = write!(out, " {x:4}");
            }
            out.push('\n');
            out.push_str(&rule);
            out.push('\n');

            for y in b.min_y..=b.max_y {
                let _ = write!(out, "       {y:3} |");
                for x in b.min_x..=b.max_x {
                    let pos = Position::new(x, y, layer);
                    let tile = if marker == Some(pos) {
                        "@@@@".to_string()
                    } else {
                        memory.cell_at(pos).map_or_else(|| "  ? ".to_string(), tile_text)
                    };
                    out.push(' ');
                    out.push_str(&tile);
                }
                out.push('\n');
            }
            out.push_str(&rule);
            out.push_str("\n\n");
        }

        let landmarks: Vec<String> = self
            .snapshot()
            .landmarks
            .iter()
            .map(|(code, pos)| format!("{code}{pos}"))
            .collect();
        let _ = writeln!(out, "landmarks: [{}]", landmarks.join(", "));
        out
    }
}

fn tile_text(cell: &Cell) -> String {
    let unknowns = || -> String {
        [Direction::N, Direction::S, Direction::E, Direction::W]
            .into_iter()
            .map(|d| if cell.relation(d).is_none() { d.as_char() } else { ' ' })
            .collect()
    };
    match cell.category() {
        Category::Empty => unknowns(),
        Category::Wall => "xxxx".to_string(),
        Category::Exit => " :D ".to_string(),
        Category::Transporter if cell.has_unknowns() => unknowns(),
        Category::Transporter => {
            let glyph = match cell.code().as_char() {
                'b' => "<<>>",
                'o' => ">><<",
                'y' => "(())",
                _ => "))((",
            };
            glyph.to_string()
        }
        Category::Goal => format!("{:>4}", cell.code().as_char()),
    }
}

/// What one agent is doing right now, plus its memory summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AgentSnapshot {
    pub role: Role,
    pub turns: u32,
    pub position: Position,
    pub mode: Mode,
    pub plan: String,
    pub escaping: bool,
    pub cost_to_exit: Option<u32>,
    pub collected: String,
    pub exited: bool,
    pub memory: MemorySnapshot,
}

pub struct AgentAdapter<'a> {
    agent: &'a Agent,
}

impl<'a> AgentAdapter<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Self { agent }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let agent = self.agent;
        AgentSnapshot {
            role: agent.role(),
            turns: agent.turns(),
            position: agent.position(),
            mode: agent.mode(),
            plan: agent.plan().map(Direction::as_char).collect(),
            escaping: agent.is_escaping(),
            cost_to_exit: agent.monitor().cost_to_exit(),
            collected: agent.collected().iter().map(|c| c.as_char()).collect(),
            exited: agent.has_exited(),
            memory: MemoryAdapter::new(agent.memory()).snapshot(),
        }
    }

    pub fn render(&self) -> String {
        let snap = self.snapshot();
        let mut out = format!(
            "{} turn {} at {} mode {:?} plan [{}]{}\n",
            snap.role.name(),
            snap.turns,
            snap.position,
            snap.mode,
            snap.plan,
            if snap.escaping { " escaping" } else { "" },
        );
        out.push_str(&MemoryAdapter::new(self.agent.memory()).render(Some(snap.position)));
        out
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::cell::TypeCode;

    fn memory(rows: &[&str]) -> SpatialMemory {
        let mut mem = SpatialMemory::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '?' {
                    continue;
                }
                let code = TypeCode::try_from(c).unwrap();
                mem.insert(Cell::new(Position::new(x as i32, y as i32, 0), code), false);
            }
        }
        mem
    }

    #[test]
    fn snapshot_counts_cells_and_landmarks() {
        let mem = memory(&["wwww", "wg3r", "wwww"]);
        let snap = MemoryAdapter::new(&mem).snapshot();
        assert_eq!(snap.cells, 12);
        assert_eq!(snap.goals, 1);
        assert_eq!(snap.layers.len(), 1);
        assert_eq!(snap.layers[0].occupied, 12);
        assert_eq!(
            snap.landmarks,
            vec![('3', Position::new(2, 1, 0)), ('r', Position::new(3, 1, 0))]
        );
    }

    #[test]
    fn render_draws_tiles_and_unknowns() {
        let mem = memory(&["ww", "g?"]);
        let text = MemoryAdapter::new(&mem).render(None);
        assert!(text.starts_with("layer:   0 |    0    1\n"));
        assert!(text.contains("         0 | xxxx xxxx\n"));
        // Floor at (0,1): north is a wall, east is unobserved.
        assert!(text.contains("         1 |  SEW   ? \n"));
        assert!(text.ends_with("landmarks: []\n"));
    }

    #[test]
    fn render_marks_agent() {
        let mem = memory(&["gg"]);
        let text = MemoryAdapter::new(&mem).render(Some(Position::new(1, 0, 0)));
        assert!(text.contains("@@@@"));
    }

    #[test]
    fn agent_snapshot_reflects_state() {
        let agent = Agent::new(AgentConfig::collector());
        let snap = AgentAdapter::new(&agent).snapshot();
        assert_eq!(snap.role, Role::Collector);
        assert_eq!(snap.turns, 0);
        assert_eq!(snap.position, Position::new(0, 0, 0));
        assert_eq!(snap.memory.cells, 1);
        assert!(snap.plan.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn agent_snapshot_serializes() {
        let agent = Agent::new(AgentConfig::scout());
        let json = AgentAdapter::new(&agent).to_json().unwrap();
        assert!(json.contains("\"role\": \"Scout\""));
    }
}
