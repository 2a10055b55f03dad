//! Per-tick observations: the code under the agent plus one ray of codes in
//! each of the eight compass headings.

use core::fmt;

use crate::cell::{Position, TypeCode};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading::N,
        Heading::NE,
        Heading::E,
        Heading::SE,
        Heading::S,
        Heading::SW,
        Heading::W,
        Heading::NW,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Heading::N => "N",
            Heading::NE => "NE",
            Heading::E => "E",
            Heading::SE => "SE",
            Heading::S => "S",
            Heading::SW => "SW",
            Heading::W => "W",
            Heading::NW => "NW",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.key() == key)
    }

    pub fn vector(self) -> (i32, i32) {
        match self {
            Heading::N => (0, -1),
            Heading::NE => (1, -1),
            Heading::E => (1, 0),
            Heading::SE => (1, 1),
            Heading::S => (0, 1),
            Heading::SW => (-1, 1),
            Heading::W => (-1, 0),
            Heading::NW => (-1, -1),
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percepts {
    here: TypeCode,
    rays: [Vec<TypeCode>; 8],
}

impl Percepts {
    pub fn new(here: TypeCode) -> Self {
        Self {
            here,
            rays: Default::default(),
        }
    }

    /// Decode a `(key, codes)` listing with exactly the keys
    /// `X, N, NE, E, SE, S, SW, W, NW`.
    pub fn parse<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut here = None;
        let mut rays: [Option<Vec<TypeCode>>; 8] = Default::default();

        for (key, codes) in entries {
            if key == "X" {
                if here.is_some() {
                    return Err(Error::DuplicatePercept(key.to_string()));
                }
                let mut chars = codes.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => here = Some(TypeCode::try_from(c)?),
                    _ => return Err(Error::MalformedHere(codes.to_string())),
                }
                continue;
            }
            let heading =
                Heading::from_key(key).ok_or_else(|| Error::UnknownPerceptKey(key.to_string()))?;
            let slot = &mut rays[heading.slot()];
            if slot.is_some() {
                return Err(Error::DuplicatePercept(key.to_string()));
            }
            *slot = Some(decode(codes)?);
        }

        let here = here.ok_or(Error::MissingPercept("X"))?;
        let mut percepts = Self::new(here);
        for heading in Heading::ALL {
            percepts.rays[heading.slot()] = rays[heading.slot()]
                .take()
                .ok_or(Error::MissingPercept(heading.key()))?;
        }
        Ok(percepts)
    }

    /// Builder used by drivers that already hold decoded codes.
    #[must_use]
    pub fn with_ray(mut self, heading: Heading, codes: Vec<TypeCode>) -> Self {
        self.rays[heading.slot()] = codes;
        self
    }

    pub fn here(&self) -> TypeCode {
        self.here
    }

    pub fn ray(&self, heading: Heading) -> &[TypeCode] {
        &self.rays[heading.slot()]
    }

    /// Absolute `(position, code)` pairs for every ray entry, anchored at
    /// `origin`. The code under the agent is not included.
    pub fn observations(
        &self,
        origin: Position,
    ) -> impl Iterator<Item = (Position, TypeCode)> + '_ {
        Heading::ALL.into_iter().flat_map(move |heading| {
            let (dx, dy) = heading.vector();
            self.ray(heading)
                .iter()
                .enumerate()
                .map(move |(i, code)| {
                    let k = i as i32 + 1;
                    (origin.offset(dx * k, dy * k), *code)
                })
        })
    }
}

fn decode(codes: &str) -> Result<Vec<TypeCode>> {
    codes.chars().map(TypeCode::try_from).collect()
}
