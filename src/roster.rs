//! The unit registry: an id arena plus per-team, per-tier buckets.
//!
//! Units are owned here and referred to everywhere else by [`UnitId`].
//! A removed unit's id simply stops resolving, so stale ids held across
//! a death are harmless.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::{
    unit::{Lifecycle, Unit},
    utils,
    Initiative, TeamId, UnitId,
};

#[derive(Clone, Debug, Default)]
pub struct Roster {
    next_id: i32,
    units: HashMap<UnitId, Unit>,
    buckets: HashMap<TeamId, BTreeMap<Initiative, Vec<UnitId>>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: Unit) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        debug!("roster: add {:?} as {:?}", unit.typ, id);
        self.buckets
            .entry(unit.team)
            .or_insert_with(BTreeMap::new)
            .entry(unit.stats.initiative)
            .or_insert_with(Vec::new)
            .push(id);
        self.units.insert(id, unit);
        id
    }

    /// Drops empty buckets on the way out so team and tier queries see
    /// only teams that still field someone.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        debug!("roster: remove {:?} ({:?})", id, unit.typ);
        let team = unit.team;
        let tier = unit.stats.initiative;
        if let Some(tiers) = self.buckets.get_mut(&team) {
            if let Some(ids) = tiers.get_mut(&tier) {
                utils::try_remove_item(ids, &id);
                if ids.is_empty() {
                    tiers.remove(&tier);
                }
            }
            if tiers.is_empty() {
                self.buckets.remove(&team);
            }
        }
        Some(unit)
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.keys().copied()
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.units.iter().map(|(&id, unit)| (id, unit))
    }

    pub fn bucket(&self, team: TeamId, tier: Initiative) -> &[UnitId] {
        self.buckets
            .get(&team)
            .and_then(|tiers| tiers.get(&tier))
            .map_or(&[], Vec::as_slice)
    }

    pub fn has_bucket(&self, team: TeamId, tier: Initiative) -> bool {
        !self.bucket(team, tier).is_empty()
    }

    /// True once every unit of the team's tier has spent its action.
    /// An empty bucket counts as done.
    pub fn all_acted(&self, team: TeamId, tier: Initiative) -> bool {
        self.bucket(team, tier)
            .iter()
            .all(|&id| !self.units[&id].can_act)
    }

    pub fn no_teams_remain(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn only_single_team_remains(&self) -> bool {
        self.buckets.len() == 1
    }

    pub fn remaining_team(&self) -> Option<TeamId> {
        if self.only_single_team_remains() {
            self.buckets.keys().next().copied()
        } else {
            None
        }
    }

    pub(crate) fn round_starts(&mut self) {
        for unit in self.units.values_mut() {
            unit.on_round_starts();
        }
    }

    pub(crate) fn round_ends(&mut self) {
        for unit in self.units.values_mut() {
            unit.on_round_ends();
        }
    }

    /// Marks the tier's units as the ones whose turn it is. Returns the
    /// touched ids so the caller can refresh their cells.
    pub(crate) fn activate(&mut self, team: TeamId, tier: Initiative) -> Vec<UnitId> {
        let ids = self.bucket(team, tier).to_vec();
        for &id in &ids {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.on_activate();
            }
        }
        ids
    }

    pub(crate) fn deactivate(&mut self, team: TeamId, tier: Initiative) -> Vec<UnitId> {
        let ids = self.bucket(team, tier).to_vec();
        for &id in &ids {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.on_deactivate();
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::Roster;
    use crate::{
        map::Hex,
        unit::{Stats, Unit},
        Initiative, MoveRange, TeamId,
    };

    fn unit(team: i32, tier: i32) -> Unit {
        let stats = Stats {
            move_range: MoveRange(3),
            initiative: Initiative(tier),
        };
        Unit::new("soldier".into(), TeamId(team), stats, Hex::new(0, 0))
    }

    #[test]
    fn buckets_group_by_team_and_tier() {
        let mut roster = Roster::new();
        let a = roster.add(unit(0, 0));
        let b = roster.add(unit(0, 0));
        let c = roster.add(unit(1, 2));
        assert_eq!(roster.bucket(TeamId(0), Initiative(0)), &[a, b]);
        assert_eq!(roster.bucket(TeamId(1), Initiative(2)), &[c]);
        assert!(roster.bucket(TeamId(1), Initiative(0)).is_empty());
    }

    #[test]
    fn remove_collapses_empty_buckets() {
        let mut roster = Roster::new();
        let a = roster.add(unit(0, 1));
        let b = roster.add(unit(1, 0));
        assert!(!roster.only_single_team_remains());
        assert!(roster.remove(a).is_some());
        assert!(!roster.has_bucket(TeamId(0), Initiative(1)));
        assert!(roster.only_single_team_remains());
        assert_eq!(roster.remaining_team(), Some(TeamId(1)));
        roster.remove(b);
        assert!(roster.no_teams_remain());
        // A stale id no longer resolves.
        assert!(roster.get(a).is_none());
        assert!(roster.remove(a).is_none());
    }

    #[test]
    fn all_acted_tracks_spent_actions() {
        let mut roster = Roster::new();
        let a = roster.add(unit(0, 0));
        let b = roster.add(unit(0, 0));
        assert!(!roster.all_acted(TeamId(0), Initiative(0)));
        roster.get_mut(a).unwrap().can_act = false;
        assert!(!roster.all_acted(TeamId(0), Initiative(0)));
        roster.get_mut(b).unwrap().can_act = false;
        assert!(roster.all_acted(TeamId(0), Initiative(0)));
        // An empty bucket has nothing left to wait for.
        assert!(roster.all_acted(TeamId(0), Initiative(5)));
        roster.round_starts();
        assert!(!roster.all_acted(TeamId(0), Initiative(0)));
    }

    #[test]
    fn activate_flags_only_the_bucket() {
        let mut roster = Roster::new();
        let a = roster.add(unit(0, 0));
        let b = roster.add(unit(0, 1));
        let ids = roster.activate(TeamId(0), Initiative(0));
        assert_eq!(ids, vec![a]);
        assert!(roster.get(a).unwrap().can_be_activated);
        assert!(!roster.get(b).unwrap().can_be_activated);
        roster.deactivate(TeamId(0), Initiative(0));
        assert!(!roster.get(a).unwrap().can_be_activated);
    }
}
