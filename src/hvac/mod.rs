pub mod adjust;
pub mod push;
pub mod resolver;
pub mod sampler;
pub mod schedule;

use serde::{Deserialize, Serialize};

/// Store phase, derived from store hours and exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Occupied,
    Unoccupied,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Occupied => "occupied",
            Phase::Unoccupied => "unoccupied",
        }
    }
}
