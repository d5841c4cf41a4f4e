//! Battle setup data, usually deserialized from RON.

use serde::{Deserialize, Serialize};

use crate::{
    map::Hex,
    unit::{Prototypes, UnitType},
    Initiative, TeamId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    BadFieldSize,
    NoTeams,
    DuplicateTeam(TeamId),
    NoInitiatives,
    DuplicateInitiative(Initiative),
    BadSwitchingDelay,
    UnknownTeam(TeamId),
    UnknownUnitType(UnitType),
    TierNotScheduled(UnitType),
    PositionOffField(Hex),
    DuplicatePosition(Hex),
    BadGroupCount(i32),
}

/// A unit placed on a fixed cell.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExactObject {
    pub team: TeamId,
    pub typ: UnitType,
    pub hex: Hex,
}

/// A batch of units spawned on random free cells.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ObjectsGroup {
    pub team: TeamId,
    pub typ: UnitType,
    pub count: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Scenario {
    #[serde(default = "default_width")]
    pub width: i32,

    #[serde(default = "default_height")]
    pub height: i32,

    /// The order in which teams act inside a phase.
    pub teams: Vec<TeamId>,

    /// The phase order of a round, lowest tier first.
    pub initiatives: Vec<Initiative>,

    /// Pause between a round ending and the next one starting, in
    /// seconds of tick time.
    #[serde(default = "default_switching_delay")]
    pub switching_rounds_delay: f32,

    #[serde(default)]
    pub exact_objects: Vec<ExactObject>,

    #[serde(default)]
    pub random_objects: Vec<ObjectsGroup>,
}

fn default_width() -> i32 {
    12
}

fn default_height() -> i32 {
    8
}

fn default_switching_delay() -> f32 {
    2.0
}

impl Scenario {
    pub fn from_string(s: &str) -> Self {
        ron::de::from_str(s).expect("Can't parse the scenario")
    }

    pub fn check(&self, prototypes: &Prototypes) -> Result<(), Error> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::BadFieldSize);
        }
        if self.teams.is_empty() {
            return Err(Error::NoTeams);
        }
        for (i, &team) in self.teams.iter().enumerate() {
            if self.teams[..i].contains(&team) {
                return Err(Error::DuplicateTeam(team));
            }
        }
        if self.initiatives.is_empty() {
            return Err(Error::NoInitiatives);
        }
        for (i, &tier) in self.initiatives.iter().enumerate() {
            if self.initiatives[..i].contains(&tier) {
                return Err(Error::DuplicateInitiative(tier));
            }
        }
        if self.switching_rounds_delay < 0.0 {
            return Err(Error::BadSwitchingDelay);
        }
        let placements = self
            .exact_objects
            .iter()
            .map(|o| (o.team, &o.typ))
            .chain(self.random_objects.iter().map(|g| (g.team, &g.typ)));
        for (team, typ) in placements {
            if !self.teams.contains(&team) {
                return Err(Error::UnknownTeam(team));
            }
            let stats = match prototypes.get(typ) {
                Some(stats) => stats,
                None => return Err(Error::UnknownUnitType(typ.clone())),
            };
            // A unit whose tier never comes up would simply never act.
            if !self.initiatives.contains(&stats.initiative) {
                return Err(Error::TierNotScheduled(typ.clone()));
            }
        }
        for (i, object) in self.exact_objects.iter().enumerate() {
            if !self.contains(object.hex) {
                return Err(Error::PositionOffField(object.hex));
            }
            if self.exact_objects[..i].iter().any(|o| o.hex == object.hex) {
                return Err(Error::DuplicatePosition(object.hex));
            }
        }
        for group in &self.random_objects {
            if group.count <= 0 {
                return Err(Error::BadGroupCount(group.count));
            }
        }
        Ok(())
    }

    /// Mirrors the row-offset rectangle the grid is generated as.
    fn contains(&self, hex: Hex) -> bool {
        let top = -(self.height / 2);
        let left = -(self.width / 2);
        if hex.r < top || hex.r >= top + self.height {
            return false;
        }
        let r_offset = hex.r >> 1;
        hex.q >= left - r_offset && hex.q < left - r_offset + self.width
    }
}

/// Two mirrored trios on a 12x8 field, one unit per initiative tier.
impl Default for Scenario {
    fn default() -> Self {
        let trio = [("scout", 2), ("soldier", 0), ("juggernaut", -2)];
        let mut exact_objects = Vec::new();
        for &(typ, r) in &trio {
            exact_objects.push(ExactObject {
                team: TeamId(0),
                typ: typ.into(),
                hex: Hex::new(-4, r),
            });
            exact_objects.push(ExactObject {
                team: TeamId(1),
                typ: typ.into(),
                hex: Hex::new(4, -r),
            });
        }
        Self {
            width: default_width(),
            height: default_height(),
            teams: vec![TeamId(0), TeamId(1)],
            initiatives: vec![Initiative(0), Initiative(1), Initiative(2)],
            switching_rounds_delay: default_switching_delay(),
            exact_objects,
            random_objects: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ObjectsGroup, Scenario};
    use crate::{map::Hex, unit::Prototypes, Initiative, TeamId};

    #[test]
    fn default_scenario_is_valid() {
        let scenario = Scenario::default();
        assert_eq!(scenario.check(&Prototypes::defaults()), Ok(()));
        assert_eq!(scenario.exact_objects.len(), 6);
    }

    #[test]
    fn check_catches_bad_setups() {
        let prototypes = Prototypes::defaults();
        let base = Scenario::default();

        let mut s = base.clone();
        s.width = 0;
        assert_eq!(s.check(&prototypes), Err(Error::BadFieldSize));

        let mut s = base.clone();
        s.teams.push(TeamId(0));
        assert_eq!(s.check(&prototypes), Err(Error::DuplicateTeam(TeamId(0))));

        let mut s = base.clone();
        s.initiatives.clear();
        assert_eq!(s.check(&prototypes), Err(Error::NoInitiatives));

        let mut s = base.clone();
        s.exact_objects[0].typ = "dragon".into();
        assert_eq!(
            s.check(&prototypes),
            Err(Error::UnknownUnitType("dragon".into()))
        );

        let mut s = base.clone();
        s.initiatives = vec![Initiative(0), Initiative(1)];
        assert_eq!(
            s.check(&prototypes),
            Err(Error::TierNotScheduled("juggernaut".into()))
        );

        let mut s = base.clone();
        s.exact_objects[0].hex = Hex::new(40, 0);
        assert_eq!(
            s.check(&prototypes),
            Err(Error::PositionOffField(Hex::new(40, 0)))
        );

        let mut s = base.clone();
        s.exact_objects[1].hex = s.exact_objects[0].hex;
        let hex = s.exact_objects[0].hex;
        assert_eq!(s.check(&prototypes), Err(Error::DuplicatePosition(hex)));

        let mut s = base.clone();
        s.random_objects.push(ObjectsGroup {
            team: TeamId(0),
            typ: "scout".into(),
            count: 0,
        });
        assert_eq!(s.check(&prototypes), Err(Error::BadGroupCount(0)));
    }

    #[test]
    fn scenario_parses_from_ron() {
        let scenario = Scenario::from_string(
            r#"(
                teams: [(0), (1)],
                initiatives: [(0), (1)],
                exact_objects: [
                    (team: (0), typ: ("scout"), hex: (q: -2, r: 0, s: 2)),
                ],
            )"#,
        );
        assert_eq!(scenario.width, 12);
        assert_eq!(scenario.switching_rounds_delay, 2.0);
        assert_eq!(scenario.exact_objects.len(), 1);
        assert_eq!(scenario.exact_objects[0].team, TeamId(0));
    }
}
