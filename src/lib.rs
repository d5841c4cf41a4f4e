//! A turn-based hexagonal tactics simulation core.
//!
//! The crate owns the game state only: the hex grid with its occupancy,
//! the pathfinder, the per-unit action state machine and the round/phase
//! scheduler. Rendering, input devices and UI are external collaborators
//! that feed picks and ticks in (see [`Battle`]) and drain [`Notice`]s out.

use serde::{Deserialize, Serialize};

pub use crate::{
    battle::{Battle, FightResult, InputAction, Notice},
    scenario::Scenario,
    unit::Prototypes,
};

pub mod battle;
pub mod geom;
pub mod grid;
pub mod map;
pub mod pathfinder;
pub mod roster;
pub mod scenario;
pub mod unit;
pub mod utils;


#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub i32);

/// An initiative tier. A round is divided into phases and units take
/// turns, team by team, according to their initiative.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Initiative(pub i32);

/// Movement budget in cells per action.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MoveRange(pub i32);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) i32);
