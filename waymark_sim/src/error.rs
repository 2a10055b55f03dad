use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("reading world file: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding world file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad tile: {0}")]
    Tile(#[from] waymark::Error),

    #[error("world has no rows")]
    EmptyWorld,

    #[error("row {row} is {found} tiles wide, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("start ({x}, {y}) is outside the world or on a wall")]
    BadStart { x: usize, y: usize },

    #[error("transporter {0:?} has no partner pad")]
    Unpaired(char),

    #[error("{0}")]
    Args(String),
}
