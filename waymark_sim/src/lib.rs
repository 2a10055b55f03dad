//! Tile-world simulator that drives a pair of waymark agents.

pub mod error;
pub mod session;
pub mod world;

pub use error::SimError;
pub use session::{AgentSummary, Session, Summary};
pub use world::{Event, World, WorldSpec};
