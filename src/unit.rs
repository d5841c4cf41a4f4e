use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{geom::Point, map::Hex, Initiative, MoveRange, TeamId, UnitId};

/// Speed of the continuous motion interpolation, in layout units per second.
pub const MOVE_SPEED: f32 = 10.0;

/// Arrival tolerance: a mover within this distance of a cell center is
/// considered to have entered the cell.
pub const MOVE_PRECISION: f32 = 0.2;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitType(pub String);

impl From<&str> for UnitType {
    fn from(s: &str) -> Self {
        UnitType(s.into())
    }
}

/// Fixed at spawn, immutable thereafter.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub move_range: MoveRange,
    pub initiative: Initiative,
}

/// The data-driven unit stats table.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Prototypes(pub HashMap<UnitType, Stats>);

impl Prototypes {
    pub fn from_string(s: &str) -> Self {
        ron::de::from_str(s).expect("Can't parse the prototypes")
    }

    pub fn get(&self, typ: &UnitType) -> Option<Stats> {
        self.0.get(typ).copied()
    }

    /// One kind per initiative tier: a fast scout, a line soldier and a
    /// slow but far-ranging juggernaut.
    pub fn defaults() -> Self {
        let map = vec![
            ("scout", Stats { move_range: MoveRange(4), initiative: Initiative(0) }),
            ("soldier", Stats { move_range: MoveRange(4), initiative: Initiative(1) }),
            ("juggernaut", Stats { move_range: MoveRange(9), initiative: Initiative(2) }),
        ]
        .into_iter()
        .map(|(name, stats)| (name.into(), stats))
        .collect();
        Prototypes(map)
    }
}

/// In-flight movement: the path being walked, the index of the next path
/// cell and the interpolated position between cell centers. Resumable
/// across ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    pub path: Vec<Hex>,
    pub index: usize,
    pub pos: Point,
    pub target: Option<UnitId>,
}

/// A pending strike, entered instead of stepping into the final path cell
/// while the target still occupies it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    pub target: UnitId,
    pub cell: Hex,
}

#[derive(Clone, Debug, PartialEq, derive_more::From)]
pub enum Action {
    Idle,
    #[from]
    Moving(Move),
    #[from]
    Attacking(Strike),
    Dead,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub typ: UnitType,
    pub team: TeamId,
    pub stats: Stats,
    pub hex: Hex,
    pub can_act: bool,
    pub can_be_activated: bool,
    pub action: Action,
}

impl Unit {
    pub fn new(typ: UnitType, team: TeamId, stats: Stats, hex: Hex) -> Self {
        Self {
            typ,
            team,
            stats,
            hex,
            can_act: true,
            can_be_activated: false,
            action: Action::Idle,
        }
    }

    /// Moving or attacking: the unit can't be commanded or targeted.
    pub fn is_busy(&self) -> bool {
        !matches!(self.action, Action::Idle)
    }
}

/// Explicit lifecycle methods instead of dispatch-by-name broadcasts.
pub trait Lifecycle {
    fn on_round_starts(&mut self);
    fn on_round_ends(&mut self);
    fn on_activate(&mut self);
    fn on_deactivate(&mut self);
}

impl Lifecycle for Unit {
    fn on_round_starts(&mut self) {
        self.can_act = true;
    }

    fn on_round_ends(&mut self) {
        self.can_be_activated = false;
    }

    fn on_activate(&mut self) {
        self.can_be_activated = true;
    }

    fn on_deactivate(&mut self) {
        self.can_be_activated = false;
    }
}
