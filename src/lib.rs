//! Incremental spatial memory and frontier search for grid-world agents that
//! only know their own relative frame.

#[path = "core/error.rs"]
pub mod error;

#[path = "core/cell.rs"]
pub mod cell;

#[path = "core/window.rs"]
pub mod window;

#[path = "core/memory.rs"]
pub mod memory;

#[path = "core/search.rs"]
pub mod search;

#[path = "core/budget.rs"]
pub mod budget;

#[path = "core/prng.rs"]
pub mod prng;

pub mod agent;
pub mod observer;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::agent::{Agent, AgentConfig, Heading, Message, Mode, Percepts, Role, Turn};
    pub use crate::budget::TimeBudgetMonitor;
    pub use crate::cell::{Category, Cell, CellId, Direction, LayerId, Position, TypeCode};
    pub use crate::memory::{LayerStatus, SpatialMemory};
    pub use crate::prng::Prng;
    pub use crate::search::{ExplorationPriority, FrontierSearch, Priority, RandomPriority, Route};
}
