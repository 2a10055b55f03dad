//! Spatial memory: every cell an agent has ever observed, indexed by position.
//!
//! Cells live in an arena and are addressed by `CellId`; relations and
//! landmarks store ids, so the mutual neighbour references never need shared
//! ownership. Each layer is an independent coordinate plane backed by a
//! [`Window`]. When the same landmark code shows up on two layers the layers
//! are the same place seen from two frames, and [`SpatialMemory::merge`]
//! folds the higher-numbered one into the lower.

use core::ops::Index;

use hashbrown::HashMap;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::{Category, Cell, CellId, Direction, LayerId, Position, TypeCode};
use crate::window::{Bounds, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LayerStatus {
    #[default]
    Active,
    /// Folded into `into`; old coordinates translate by `(dx, dy)`.
    Retired { into: LayerId, dx: i32, dy: i32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Layer {
    window: Window,
    status: LayerStatus,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialMemory {
    cells: Vec<Cell>,
    layers: Vec<Layer>,
    landmarks: HashMap<TypeCode, CellId>,
}

impl Default for SpatialMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialMemory {
    /// An empty memory with layer 0 ready.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            layers: vec![Layer::default()],
            landmarks: HashMap::new(),
        }
    }

    /// Number of cells ever created, including ones since overwritten.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    /// The cell stored at `pos`, or `None` for "unknown": out of the layer's
    /// window, never observed, or on a retired layer.
    pub fn lookup(&self, pos: Position) -> Option<CellId> {
        let layer = self.layers.get(pos.layer as usize)?;
        if layer.status != LayerStatus::Active {
            return None;
        }
        layer.window.get(pos.x, pos.y)
    }

    pub fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.lookup(pos).and_then(|id| self.get(id))
    }

    /// Translate a position through retirement records until it lands on an
    /// active layer.
    pub fn canonical(&self, mut pos: Position) -> Position {
        // Each hop strictly lowers the layer id, so this terminates.
        for _ in 0..self.layers.len() {
            match self.layer_status(pos.layer) {
                Some(LayerStatus::Retired { into, dx, dy }) => {
                    pos = Position::new(pos.x + dx, pos.y + dy, into);
                }
                _ => break,
            }
        }
        pos
    }

    /// `lookup` after canonicalising `pos`.
    pub fn resolve(&self, pos: Position) -> Option<CellId> {
        self.lookup(self.canonical(pos))
    }

    pub fn layer_status(&self, layer: LayerId) -> Option<LayerStatus> {
        self.layers.get(layer as usize).map(|l| l.status)
    }

    pub fn is_retired(&self, layer: LayerId) -> bool {
        matches!(
            self.layer_status(layer),
            Some(LayerStatus::Retired { .. })
        )
    }

    pub fn layer_bounds(&self, layer: LayerId) -> Option<Bounds> {
        self.layers.get(layer as usize)?.window.bounds()
    }

    pub fn active_layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.status == LayerStatus::Active)
            .map(|(i, _)| i as LayerId)
    }

    /// Cells currently stored on `layer`; empty for retired layers.
    pub fn cells_on(&self, layer: LayerId) -> impl Iterator<Item = CellId> + '_ {
        self.layers
            .get(layer as usize)
            .filter(|l| l.status == LayerStatus::Active)
            .into_iter()
            .flat_map(|l| l.window.occupied().map(|(_, _, id)| id))
    }

    /// Every cell reachable by coordinate.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.active_layers()
            .flat_map(move |layer| self.cells_on(layer))
            .map(move |id| (id, &self.cells[id.index()]))
    }

    pub fn landmark(&self, code: TypeCode) -> Option<CellId> {
        self.landmarks.get(&code).copied()
    }

    pub fn landmarks(&self) -> impl Iterator<Item = (TypeCode, CellId)> + '_ {
        self.landmarks.iter().map(|(code, id)| (*code, *id))
    }

    pub fn goals(&self) -> impl Iterator<Item = CellId> + '_ {
        self.landmarks
            .iter()
            .filter(|(code, _)| code.category() == Category::Goal)
            .map(|(_, id)| *id)
    }

    pub fn has_goals(&self) -> bool {
        self.goals().next().is_some()
    }

    /// Remember an observed cell and return the id now canonical for it.
    ///
    /// An already-known slot keeps its cell unless `force_overwrite` is set.
    /// Landmarks are registered, a second occurrence of a landmark code on a
    /// different layer triggers a merge, and adjacency is relinked either way.
    pub fn insert(&mut self, mut cell: Cell, force_overwrite: bool) -> CellId {
        let pos = self.canonical(cell.position());
        cell.set_position(pos);
        self.ensure_layer(pos.layer);

        let mut id = match self.lookup(pos) {
            Some(existing) if !force_overwrite => existing,
            // Same code: refresh in place, the relink below does the rest.
            Some(existing) if self.cells[existing.index()].code() == cell.code() => existing,
            previous => {
                let id = self.push(cell);
                self.layers[pos.layer as usize].window.put(pos.x, pos.y, id);
                if let Some(old) = previous {
                    debug!(at = %pos, ?old, new = ?id, "overwrote remembered cell");
                    self.hand_over(old, id);
                }
                id
            }
        };

        let code = self.cells[id.index()].code();
        if code.category().is_landmark() {
            match self.landmark(code) {
                None => {
                    self.landmarks.insert(code, id);
                }
                Some(known) => {
                    let known_pos = self.cells[known.index()].position();
                    if known_pos.layer != pos.layer {
                        self.merge(pos, known_pos);
                        if let Some(canonical) = self.landmark(code) {
                            id = canonical;
                        }
                    }
                }
            }
        }

        self.link(id);
        id
    }

    /// Refresh the relations of `id` with its current neighbours, writing
    /// both sides of every link. Transporters also get their `U` link to the
    /// paired code, creating a placeholder on a fresh layer when the partner
    /// has never been seen.
    pub fn link(&mut self, id: CellId) {
        let pos = self.cells[id.index()].position();

        for dir in Direction::CARDINALS {
            let neighbor = self.lookup(pos.step(dir));
            self.cells[id.index()].set_relation(dir, neighbor);
            if let Some(n) = neighbor {
                self.cells[n.index()].set_relation(dir.opposite(), Some(id));
            }
        }

        let code = self.cells[id.index()].code();
        let Some(partner_code) = code.partner() else {
            return;
        };

        let own = *self.landmarks.entry(code).or_insert(id);
        let partner = match self.landmark(partner_code) {
            Some(partner) => partner,
            None => {
                let layer = self.layers.len() as LayerId;
                debug!(%code, %partner_code, layer, "placeholder for unseen transporter partner");
                self.insert(Cell::new(Position::new(0, 0, layer), partner_code), false)
            }
        };

        self.cells[id.index()].set_relation(Direction::U, Some(partner));
        self.cells[partner.index()].set_relation(Direction::U, Some(own));
    }

    /// Unify the layers of `a` and `b`, which hold the same landmark.
    ///
    /// The lower layer survives. Every cell of the other layer is translated
    /// so that `b` (or `a`) lands on its twin, stored over whatever occupied
    /// the target slot, and relinked. Same-layer calls are no-ops.
    pub fn merge(&mut self, a: Position, b: Position) {
        let a = self.canonical(a);
        let b = self.canonical(b);
        if a.layer == b.layer {
            return;
        }

        let (keep, gone) = if a.layer < b.layer { (a, b) } else { (b, a) };
        let dx = keep.x - gone.x;
        let dy = keep.y - gone.y;

        let moved: Vec<CellId> = self.cells_on(gone.layer).collect();
        debug!(
            keep = keep.layer,
            gone = gone.layer,
            dx,
            dy,
            cells = moved.len(),
            "merging layers"
        );

        self.ensure_layer(keep.layer);
        self.layers[gone.layer as usize].status = LayerStatus::Retired {
            into: keep.layer,
            dx,
            dy,
        };

        let mut displaced = Vec::new();
        for &id in &moved {
            let p = self.cells[id.index()].position();
            let target = Position::new(p.x + dx, p.y + dy, keep.layer);
            self.cells[id.index()].set_position(target);
            let window = &mut self.layers[keep.layer as usize].window;
            if let Some(old) = window.put(target.x, target.y, id) {
                displaced.push((old, id));
            }
        }

        for (old, new) in displaced {
            self.hand_over(old, new);
        }
        for id in moved {
            self.link(id);
        }
    }

    /// Collect the goal at `id`: it becomes plain floor and its code leaves
    /// the landmark index. Returns whether anything was collected.
    pub fn consume_goal(&mut self, id: CellId) -> bool {
        let Some(cell) = self.cells.get_mut(id.index()) else {
            return false;
        };
        if cell.category() != Category::Goal {
            return false;
        }
        let code = cell.code();
        cell.clear_to_empty();
        self.landmarks.remove(&code);
        debug!(%code, at = %cell.position(), "goal collected");
        true
    }

    fn ensure_layer(&mut self, layer: LayerId) {
        while self.layers.len() <= layer as usize {
            self.layers.push(Layer::default());
        }
    }

    fn push(&mut self, cell: Cell) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(cell);
        id
    }

    /// `new` took the slot of `old`. Landmark entries follow when the code
    /// is unchanged; otherwise they are dropped, along with any `U` link that
    /// still targets the stale cell.
    fn hand_over(&mut self, old: CellId, new: CellId) {
        let old_code = self.cells[old.index()].code();
        if self.landmark(old_code) != Some(old) {
            return;
        }
        if self.cells[new.index()].code() == old_code {
            self.landmarks.insert(old_code, new);
            return;
        }

        self.landmarks.remove(&old_code);
        if let Some(partner) = self.cells[old.index()].relation(Direction::U) {
            let partner = &mut self.cells[partner.index()];
            if partner.relation(Direction::U) == Some(old) {
                partner.set_relation(Direction::U, None);
            }
        }
    }
}

impl Index<CellId> for SpatialMemory {
    type Output = Cell;

    fn index(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }
}
