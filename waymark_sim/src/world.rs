use std::path::Path;

use serde::{Deserialize, Serialize};
use waymark::agent::{Heading, Percepts};
use waymark::cell::{Category, Direction, TypeCode};

use crate::error::SimError;

/// On-disk description of a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSpec {
    /// One string per row, one type code per tile.
    pub rows: Vec<String>,
    /// `[x, y]` of the tile both agents start on.
    pub start: (usize, usize),
    #[serde(default = "default_view_distance")]
    pub view_distance: usize,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_view_distance() -> usize {
    5
}

fn default_max_turns() -> u32 {
    400
}

impl WorldSpec {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Two rooms split by a wall, joined only by the `b/o` and `y/p` pads.
    pub fn builtin() -> Self {
        Self {
            rows: [
                "wwwwwwwwwwwwwww",
                "wggg1gwgggggp2w",
                "wgwwwgwgwwwwwgw",
                "wggbggwgggogggw",
                "wwwwwgwwwwwgwww",
                "wyg0ggwgggrgggw",
                "wwwwwwwwwwwwwww",
            ]
            .iter()
            .map(|r| r.to_string())
            .collect(),
            start: (1, 1),
            view_distance: default_view_distance(),
            max_turns: default_max_turns(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Moved,
    Bump,
    Teleported,
    Collected(TypeCode),
    Exited,
    Waited,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Moved => "moved",
            Event::Bump => "bump",
            Event::Teleported => "teleported",
            Event::Collected(_) => "collected",
            Event::Exited => "exited",
            Event::Waited => "waited",
        }
    }
}

#[derive(Debug, Clone)]
pub struct World {
    w: usize,
    h: usize,
    tiles: Vec<TypeCode>,
    view_distance: usize,
}

impl World {
    pub fn from_spec(spec: &WorldSpec) -> Result<Self, SimError> {
        let h = spec.rows.len();
        let w = spec.rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if h == 0 || w == 0 {
            return Err(SimError::EmptyWorld);
        }

        let mut tiles = Vec::with_capacity(w * h);
        for (row, text) in spec.rows.iter().enumerate() {
            let found = text.chars().count();
            if found != w {
                return Err(SimError::Ragged {
                    row,
                    expected: w,
                    found,
                });
            }
            for c in text.chars() {
                tiles.push(TypeCode::try_from(c)?);
            }
        }

        let world = Self {
            w,
            h,
            tiles,
            view_distance: spec.view_distance.max(1),
        };

        let (sx, sy) = spec.start;
        match world.tile(sx as i32, sy as i32) {
            Some(code) if code.category() != Category::Wall => {}
            _ => return Err(SimError::BadStart { x: sx, y: sy }),
        }
        for code in &world.tiles {
            if let Some(partner) = code.partner() {
                if world.find(partner).is_none() {
                    return Err(SimError::Unpaired(code.as_char()));
                }
            }
        }
        Ok(world)
    }

    pub fn w(&self) -> usize {
        self.w
    }

    pub fn h(&self) -> usize {
        self.h
    }

    /// `None` outside the world.
    pub fn tile(&self, x: i32, y: i32) -> Option<TypeCode> {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return None;
        }
        Some(self.tiles[self.idx(x as usize, y as usize)])
    }

    /// First tile (row-major) carrying `code`.
    pub fn find(&self, code: TypeCode) -> Option<(i32, i32)> {
        self.tiles
            .iter()
            .position(|t| *t == code)
            .map(|i| ((i % self.w) as i32, (i / self.w) as i32))
    }

    pub fn goals_left(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.category() == Category::Goal)
            .count()
    }

    /// What an agent standing on `(x, y)` sees. Each ray stops after the
    /// first wall, at the world edge, or at the view distance.
    pub fn percepts(&self, x: i32, y: i32) -> Percepts {
        let here = self.tile(x, y).unwrap_or(TypeCode::WALL);
        let mut percepts = Percepts::new(here);
        for heading in Heading::ALL {
            let (dx, dy) = heading.vector();
            let mut ray = Vec::new();
            for k in 1..=self.view_distance as i32 {
                let Some(code) = self.tile(x + dx * k, y + dy * k) else {
                    break;
                };
                ray.push(code);
                if code == TypeCode::WALL {
                    break;
                }
            }
            percepts = percepts.with_ray(heading, ray);
        }
        percepts
    }

    /// Carry out `action` for an agent on `(x, y)`; returns where it ends up.
    pub fn apply(&mut self, (x, y): (i32, i32), action: Direction) -> ((i32, i32), Event) {
        let Some(here) = self.tile(x, y) else {
            return ((x, y), Event::Bump);
        };

        let Some((dx, dy)) = action.vector() else {
            return match here.category() {
                Category::Goal => {
                    let i = self.idx(x as usize, y as usize);
                    self.tiles[i] = TypeCode::EMPTY;
                    ((x, y), Event::Collected(here))
                }
                Category::Exit => ((x, y), Event::Exited),
                Category::Transporter => match here.partner().and_then(|p| self.find(p)) {
                    Some(to) => (to, Event::Teleported),
                    None => ((x, y), Event::Waited),
                },
                _ => ((x, y), Event::Waited),
            };
        };

        let to = (x + dx, y + dy);
        match self.tile(to.0, to.1) {
            Some(code) if code != TypeCode::WALL => (to, Event::Moved),
            _ => ((x, y), Event::Bump),
        }
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(rows: &[&str], start: (usize, usize)) -> Result<World, SimError> {
        World::from_spec(&WorldSpec {
            rows: rows.iter().map(|r| r.to_string()).collect(),
            start,
            view_distance: 3,
            max_turns: 50,
        })
    }

    fn code(c: char) -> TypeCode {
        TypeCode::try_from(c).unwrap()
    }

    #[test]
    fn builtin_world_is_valid() {
        let world = World::from_spec(&WorldSpec::builtin()).unwrap();
        assert_eq!(world.w(), 15);
        assert_eq!(world.h(), 7);
        assert_eq!(world.goals_left(), 3);
    }

    #[test]
    fn malformed_worlds_are_rejected() {
        assert!(matches!(world(&[], (0, 0)), Err(SimError::EmptyWorld)));
        assert!(matches!(
            world(&["www", "wg"], (1, 1)),
            Err(SimError::Ragged { row: 1, expected: 3, found: 2 })
        ));
        assert!(matches!(world(&["www"], (0, 0)), Err(SimError::BadStart { .. })));
        assert!(matches!(world(&["gbg"], (0, 0)), Err(SimError::Unpaired('b'))));
        assert!(matches!(world(&["gzg"], (0, 0)), Err(SimError::Tile(_))));
    }

    #[test]
    fn rays_stop_at_walls_edges_and_range() {
        let world = world(&["gggggg", "gwgggg", "gggggg"], (0, 1)).unwrap();
        let p = world.percepts(0, 1);
        assert_eq!(p.here(), TypeCode::EMPTY);
        assert_eq!(p.ray(Heading::E), &[TypeCode::WALL]);
        assert_eq!(p.ray(Heading::N), &[TypeCode::EMPTY]);
        assert!(p.ray(Heading::W).is_empty());
        assert_eq!(p.ray(Heading::NE).len(), 1);

        let p = world.percepts(2, 1);
        // View distance 3 caps the eastward ray.
        assert_eq!(p.ray(Heading::E).len(), 3);
    }

    #[test]
    fn moves_bump_into_walls_and_edges() {
        let mut world = world(&["gw"], (0, 0)).unwrap();
        assert_eq!(world.apply((0, 0), Direction::E), ((0, 0), Event::Bump));
        assert_eq!(world.apply((0, 0), Direction::N), ((0, 0), Event::Bump));
        assert_eq!(world.apply((0, 0), Direction::U), ((0, 0), Event::Waited));
    }

    #[test]
    fn pads_teleport_goals_vanish_exit_leaves() {
        let mut world = world(&["b3go", "gggr"], (0, 1)).unwrap();
        assert_eq!(world.apply((0, 0), Direction::U), ((3, 0), Event::Teleported));
        assert_eq!(world.apply((3, 0), Direction::U), ((0, 0), Event::Teleported));

        assert_eq!(
            world.apply((1, 0), Direction::U),
            ((1, 0), Event::Collected(code('3')))
        );
        assert_eq!(world.tile(1, 0), Some(TypeCode::EMPTY));
        assert_eq!(world.goals_left(), 0);

        assert_eq!(world.apply((3, 1), Direction::U), ((3, 1), Event::Exited));
    }
}
