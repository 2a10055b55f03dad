use thiserror::Error;

/// Errors raised while decoding observations or driving an agent.
///
/// Lookups, searches and merges never fail; everything here points at a
/// broken upstream decoder or caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unrecognized type code {0:?}")]
    UnknownTypeCode(char),

    #[error("unrecognized move token {0:?}")]
    UnknownMove(String),

    #[error("unrecognized percept key {0:?}")]
    UnknownPerceptKey(String),

    #[error("percept key {0} given more than once")]
    DuplicatePercept(String),

    #[error("percept key {0} missing")]
    MissingPercept(&'static str),

    #[error("percept X must hold exactly one code, got {0:?}")]
    MalformedHere(String),
}

pub type Result<T> = std::result::Result<T, Error>;
