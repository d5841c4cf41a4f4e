//! The battle driver: input handling, continuous motion and the
//! round/phase/team scheduler.
//!
//! A battle is advanced from outside by two calls: [`Battle::handle_input`]
//! for picks and commands and [`Battle::tick`] for the passage of time.
//! Everything observable that happens in between is queued as a
//! [`Notice`] and drained by the caller.

use std::collections::VecDeque;

use log::{debug, error, trace};

use crate::{
    geom::{Layout, Point},
    grid::Grid,
    map::{distance_hex, Distance, Hex},
    pathfinder::{self, Path},
    roster::Roster,
    scenario::{self, Scenario},
    unit::{Action, Move, Prototypes, Strike, Unit, UnitType, MOVE_PRECISION, MOVE_SPEED},
    utils, Initiative, TeamId, UnitId,
};

#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum Error {
    #[from]
    Scenario(scenario::Error),
    FightIsOver,
    SwitchingRounds,
    ActionInProcess,
    NoCell,
    NoUnitSelected,
    NotYourTurn,
    UnitHasActed,
    OutOfRange,
    NoPath,
    CantSpawn,
    UnknownUnitType,
}

/// External input, already translated to field coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// The cursor moved over the field.
    Hover(Point),
    /// Primary pick: select or deselect a unit.
    Select(Point),
    /// Secondary pick: command the selected unit towards a cell.
    Command(Point),
    /// Drop a reinforcement of the given kind on the selected cell.
    Spawn(UnitType),
    /// Forfeit the rest of the round.
    EndTurn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FightResult {
    /// `None` when no team is left standing.
    pub winner: Option<TeamId>,
}

/// Something observable happened. Drained by the caller after every
/// input or tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    RoundStarted(i32),
    RoundEnded(i32),
    PhaseStarted { team: TeamId, initiative: Initiative },
    UnitSpawned(UnitId),
    UnitSelected(UnitId),
    UnitDeselected,
    UnitMoved(UnitId),
    UnitKilled { id: UnitId, unit: Unit },
    FightEnded(FightResult),
}

#[derive(Debug)]
pub struct Battle {
    grid: Grid,
    roster: Roster,
    prototypes: Prototypes,
    teams: Vec<TeamId>,
    initiatives: Vec<Initiative>,
    round: i32,
    round_phase: usize,
    acting_team: usize,
    switching_rounds: bool,
    switching_timer: f32,
    switching_delay: f32,
    action_in_process: Option<UnitId>,
    selected_unit: Option<UnitId>,
    result: Option<FightResult>,
    notices: VecDeque<Notice>,
}

impl Battle {
    /// Sets the field up and plays the zeroth round: the armies are
    /// spawned and the first real round is scheduled after the
    /// switching delay.
    pub fn new(scenario: Scenario, prototypes: Prototypes, layout: Layout) -> Result<Self, Error> {
        scenario.check(&prototypes)?;
        let grid = Grid::generate(scenario.width, scenario.height, layout);
        let mut battle = Self {
            grid,
            roster: Roster::new(),
            prototypes,
            teams: scenario.teams.clone(),
            initiatives: scenario.initiatives.clone(),
            round: 0,
            round_phase: scenario.initiatives.len(),
            acting_team: 0,
            switching_rounds: false,
            switching_timer: 0.0,
            switching_delay: scenario.switching_rounds_delay,
            action_in_process: None,
            selected_unit: None,
            result: None,
            notices: VecDeque::new(),
        };
        battle.spawn_armies(&scenario)?;
        battle.end_round();
        Ok(battle)
    }

    fn spawn_armies(&mut self, scenario: &Scenario) -> Result<(), Error> {
        for object in &scenario.exact_objects {
            self.spawn_at(object.team, &object.typ, object.hex)?;
        }
        for group in &scenario.random_objects {
            let free: Vec<Hex> = self
                .grid
                .cells()
                .filter(|cell| !cell.is_occupied())
                .map(|cell| cell.hex())
                .collect();
            let mut free = utils::shuffle_vec(free);
            for _ in 0..group.count {
                let hex = free.pop().ok_or(Error::CantSpawn)?;
                self.spawn_at(group.team, &group.typ, hex)?;
            }
        }
        Ok(())
    }

    /// Puts a new unit on a free cell. A unit dropped into the phase its
    /// tier and team are currently acting in gets its turn right away.
    pub fn spawn_at(&mut self, team: TeamId, typ: &UnitType, hex: Hex) -> Result<UnitId, Error> {
        let stats = match self.prototypes.get(typ) {
            Some(stats) => stats,
            None => {
                error!("battle: no prototype for {:?}", typ);
                return Err(Error::UnknownUnitType);
            }
        };
        if !self.grid.can_spawn_at(hex) {
            return Err(Error::CantSpawn);
        }
        let id = self.roster.add(Unit::new(typ.clone(), team, stats, hex));
        self.grid.occupy(hex, id);
        self.notices.push_back(Notice::UnitSpawned(id));
        let in_acting_bucket = !self.switching_rounds
            && self.result.is_none()
            && self.initiatives.get(self.round_phase) == Some(&stats.initiative)
            && self.teams.get(self.acting_team) == Some(&team);
        if in_acting_bucket {
            self.roster.activate(team, stats.initiative);
        }
        self.grid.manage_highlight_activated(&[id], &self.roster);
        Ok(id)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn round(&self) -> i32 {
        self.round
    }

    pub fn phase(&self) -> Option<Initiative> {
        if self.switching_rounds || self.result.is_some() {
            return None;
        }
        self.initiatives.get(self.round_phase).copied()
    }

    pub fn acting_team(&self) -> Option<TeamId> {
        self.phase()?;
        self.teams.get(self.acting_team).copied()
    }

    pub fn selected_unit(&self) -> Option<UnitId> {
        self.selected_unit
    }

    pub fn is_switching_rounds(&self) -> bool {
        self.switching_rounds
    }

    pub fn result(&self) -> Option<FightResult> {
        self.result
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Illegal input is rejected without any state change.
    pub fn handle_input(&mut self, input: InputAction) -> Result<(), Error> {
        let result = match input {
            InputAction::Hover(point) => {
                self.hover(point);
                Ok(())
            }
            InputAction::Select(point) => self.select(point),
            InputAction::Command(point) => self.command(point),
            InputAction::Spawn(typ) => self.spawn_input(typ),
            InputAction::EndTurn => self.end_turn(),
        };
        if let Err(err) = &result {
            debug!("battle: input rejected: {:?}", err);
        }
        result
    }

    /// Advances time: counts the round-switching pause down and drives
    /// the unit whose action is in process.
    pub fn tick(&mut self, dt: f32) {
        if self.result.is_some() {
            return;
        }
        if self.switching_rounds {
            self.switching_timer -= dt;
            if self.switching_timer <= 0.0 {
                self.switching_rounds = false;
                self.next_round();
            }
            return;
        }
        if let Some(id) = self.action_in_process {
            match self.roster.get(id).map(|unit| unit.action.clone()) {
                Some(Action::Moving(_)) => self.advance_motion(id, dt),
                Some(Action::Attacking(_)) => self.resolve_strike(id),
                _ => self.action_in_process = None,
            }
        }
    }

    fn hover(&mut self, point: Point) {
        if self.result.is_some() || self.switching_rounds {
            return;
        }
        match self.grid.find_cell(point).map(|cell| cell.hex()) {
            Some(hex) => self.grid.highlight_cell(hex, &self.roster),
            None => self.grid.clear_highlighting(&self.roster),
        }
    }

    /// Any cell can be selected; an occupier is surfaced as a notice.
    /// Whether the occupier may actually act is checked on `command`.
    fn select(&mut self, point: Point) -> Result<(), Error> {
        self.ensure_commands_allowed()?;
        let cell = self.grid.find_cell(point).ok_or(Error::NoCell)?;
        let hex = cell.hex();
        let occupier = cell.occupier();
        self.grid.select_cell(hex, &self.roster);
        match occupier {
            Some(id) => {
                debug!("battle: select {:?} at {:?}", id, hex);
                self.selected_unit = Some(id);
                self.notices.push_back(Notice::UnitSelected(id));
            }
            None => {
                if self.selected_unit.take().is_some() {
                    self.notices.push_back(Notice::UnitDeselected);
                }
            }
        }
        Ok(())
    }

    fn deselect(&mut self) {
        if self.selected_unit.take().is_some() {
            self.notices.push_back(Notice::UnitDeselected);
        }
        self.grid.clear_highlighting(&self.roster);
        self.grid.clear_selection(&self.roster);
    }

    /// Reinforcement by input: the selected cell takes a new unit of
    /// the acting team.
    fn spawn_input(&mut self, typ: UnitType) -> Result<(), Error> {
        self.ensure_commands_allowed()?;
        let team = self.acting_team().ok_or(Error::NotYourTurn)?;
        let hex = self.grid.selected().ok_or(Error::NoCell)?;
        self.spawn_at(team, &typ, hex)?;
        Ok(())
    }

    /// Reuses the previewed path when the command targets the cell the
    /// preview already ends at and the route is still clear. A preview
    /// can go stale (a unit spawned onto it since the hover), so every
    /// cell short of the goal is re-checked. Otherwise a fresh search
    /// is run.
    fn path_to(&self, mover: &Unit, goal: Hex) -> Option<Path> {
        let preview = self.grid.highlighted_path();
        if preview.len() >= 2
            && preview.first() == Some(&mover.hex)
            && preview.last() == Some(&goal)
        {
            let middle_clear = preview[1..preview.len() - 1]
                .iter()
                .all(|&hex| self.grid.cell(hex).map_or(false, |cell| !cell.is_occupied()));
            if middle_clear {
                return Some(Path::new(preview.to_vec()));
            }
        }
        pathfinder::find_path(&self.grid, mover.hex, goal)
    }

    fn command(&mut self, point: Point) -> Result<(), Error> {
        self.ensure_commands_allowed()?;
        let id = self.selected_unit.ok_or(Error::NoUnitSelected)?;
        let mover = self.roster.get(id).cloned().ok_or(Error::NoUnitSelected)?;
        let acting = self.acting_team().ok_or(Error::NotYourTurn)?;
        let tier = self.initiatives[self.round_phase];
        if mover.team != acting || mover.stats.initiative != tier {
            return Err(Error::NotYourTurn);
        }
        if !mover.can_act {
            return Err(Error::UnitHasActed);
        }
        let goal = self.grid.find_cell(point).ok_or(Error::NoCell)?.hex();
        if goal == mover.hex {
            return Err(Error::NoPath);
        }
        // Any occupier other than the mover is a legal strike target.
        let target = self.grid.cell(goal).and_then(|cell| cell.occupier());
        if target.is_some() && distance_hex(mover.hex, goal) > Distance(mover.stats.move_range.0) {
            return Err(Error::OutOfRange);
        }
        let path = self.path_to(&mover, goal).ok_or(Error::NoPath)?;
        let reaches_goal = path.tiles().len() <= (mover.stats.move_range.0 + 1) as usize;
        let path = path.clip(mover.stats.move_range);
        if path.tiles().len() < 2 {
            return Err(Error::NoPath);
        }
        // An attack the budget no longer reaches degrades to a walk.
        let target = if reaches_goal { target } else { None };
        let start = match self.grid.cell(mover.hex) {
            Some(cell) => cell.center(),
            None => return Err(Error::NoCell),
        };
        debug!(
            "battle: {:?} marches {:?} -> {:?} (target: {:?})",
            id,
            mover.hex,
            path.to(),
            target,
        );
        if let Some(unit) = self.roster.get_mut(id) {
            unit.action = Action::Moving(Move {
                path: path.tiles().to_vec(),
                index: 1,
                pos: start,
                target,
            });
            unit.can_act = false;
        }
        self.action_in_process = Some(id);
        self.deselect();
        Ok(())
    }

    /// Forfeits everything left in the round and closes it.
    fn end_turn(&mut self) -> Result<(), Error> {
        self.ensure_commands_allowed()?;
        debug!("battle: round {} forfeited", self.round);
        self.end_round();
        Ok(())
    }

    fn ensure_commands_allowed(&self) -> Result<(), Error> {
        if self.result.is_some() {
            return Err(Error::FightIsOver);
        }
        if self.switching_rounds {
            return Err(Error::SwitchingRounds);
        }
        if self.action_in_process.is_some() {
            return Err(Error::ActionInProcess);
        }
        Ok(())
    }

    /// Walks the mover along its path by `MOVE_SPEED * dt`. Occupancy
    /// follows the body cell by cell. When the last tile is still held
    /// by the move's target the mover stops short and raises its arm
    /// instead of entering.
    fn advance_motion(&mut self, id: UnitId, dt: f32) {
        let (mut mv, mut hex) = match self.roster.get(id) {
            Some(unit) => match &unit.action {
                Action::Moving(mv) => (mv.clone(), unit.hex),
                _ => return,
            },
            None => {
                self.action_in_process = None;
                return;
            }
        };
        let mut travel = MOVE_SPEED * dt;
        let mut strike = None;
        while mv.index < mv.path.len() {
            let next_hex = mv.path[mv.index];
            if mv.index == mv.path.len() - 1 {
                if let Some(target) = mv.target {
                    let occupier = self.grid.cell(next_hex).and_then(|cell| cell.occupier());
                    if occupier == Some(target) {
                        strike = Some(Strike {
                            target,
                            cell: next_hex,
                        });
                        break;
                    }
                }
            }
            let (blocked, center) = match self.grid.cell(next_hex) {
                Some(cell) => (cell.is_occupied(), cell.center()),
                None => break,
            };
            if blocked {
                // The road got blocked after planning; the march ends
                // on the last cell reached.
                trace!("battle: {:?} is blocked at {:?}", id, next_hex);
                mv.path.truncate(mv.index);
                break;
            }
            let d = mv.pos.distance_to(center);
            if d > travel + MOVE_PRECISION {
                if travel > 0.0 && d > 0.0 {
                    let k = travel / d;
                    mv.pos = Point::new(
                        mv.pos.x + (center.x - mv.pos.x) * k,
                        mv.pos.y + (center.y - mv.pos.y) * k,
                    );
                }
                break;
            }
            mv.pos = center;
            travel = (travel - d).max(0.0);
            self.grid.hand_off(hex, next_hex, id);
            hex = next_hex;
            mv.index += 1;
            trace!("battle: {:?} enters {:?}", id, hex);
            if travel <= 0.0 {
                break;
            }
        }
        let arrived = strike.is_none() && mv.index >= mv.path.len();
        if let Some(unit) = self.roster.get_mut(id) {
            unit.hex = hex;
            unit.action = match strike {
                Some(strike) => Action::Attacking(strike),
                None if arrived => Action::Idle,
                None => Action::Moving(mv),
            };
        }
        if arrived {
            self.notices.push_back(Notice::UnitMoved(id));
            self.finish_action(id);
        }
    }

    /// The strike lands: the defender is removed and, when its cell is
    /// left free, the attacker steps in.
    fn resolve_strike(&mut self, id: UnitId) {
        let strike = match self.roster.get(id) {
            Some(unit) => match unit.action {
                Action::Attacking(strike) => strike,
                _ => return,
            },
            None => {
                self.action_in_process = None;
                return;
            }
        };
        if let Some(mut corpse) = self.roster.remove(strike.target) {
            debug!("battle: {:?} strikes down {:?}", id, strike.target);
            self.grid.release(corpse.hex);
            corpse.action = Action::Dead;
            self.notices.push_back(Notice::UnitKilled {
                id: strike.target,
                unit: corpse,
            });
        }
        let from = match self.roster.get(id) {
            Some(unit) => unit.hex,
            None => return,
        };
        let steps_in = self.grid.can_spawn_at(strike.cell);
        if steps_in {
            self.grid.hand_off(from, strike.cell, id);
        }
        if let Some(unit) = self.roster.get_mut(id) {
            if steps_in {
                unit.hex = strike.cell;
            }
            unit.action = Action::Idle;
        }
        self.notices.push_back(Notice::UnitMoved(id));
        self.finish_action(id);
    }

    /// An action just completed. Every successful move or strike passes
    /// the turn, so teams alternate unit by unit within a tier.
    fn finish_action(&mut self, id: UnitId) {
        self.action_in_process = None;
        self.grid.manage_highlight_activated(&[id], &self.roster);
        self.pass_to_next_team();
    }

    /// A team is done with the phase exactly when every unit of its
    /// bucket has spent its action; no extra bookkeeping.
    fn all_teams_acted(&self) -> bool {
        let tier = match self.initiatives.get(self.round_phase) {
            Some(&tier) => tier,
            None => return true,
        };
        self.teams.iter().all(|&team| self.roster.all_acted(team, tier))
    }

    /// Retires the acting team and seats the next one that still has an
    /// unspent unit in the tier. Exhausted teams and tiers are skipped
    /// without a pause, cascading into the next phase or round end.
    fn pass_to_next_team(&mut self) {
        if let (Some(&team), Some(&tier)) = (
            self.teams.get(self.acting_team),
            self.initiatives.get(self.round_phase),
        ) {
            let ids = self.roster.deactivate(team, tier);
            self.grid.manage_highlight_activated(&ids, &self.roster);
        }
        self.acting_team = (self.acting_team + 1) % self.teams.len();
        self.seat_acting_team();
    }

    fn seat_acting_team(&mut self) {
        loop {
            if self.all_teams_acted() {
                self.next_phase();
                return;
            }
            let team = self.teams[self.acting_team];
            let tier = self.initiatives[self.round_phase];
            if self.roster.all_acted(team, tier) {
                self.acting_team = (self.acting_team + 1) % self.teams.len();
                continue;
            }
            let ids = self.roster.activate(team, tier);
            self.grid.manage_highlight_activated(&ids, &self.roster);
            self.notices.push_back(Notice::PhaseStarted {
                team,
                initiative: tier,
            });
            trace!("battle: team {:?} acts in tier {:?}", team, tier);
            return;
        }
    }

    fn next_phase(&mut self) {
        self.round_phase += 1;
        if self.round_phase >= self.initiatives.len() {
            self.end_round();
            return;
        }
        self.acting_team = 0;
        self.seat_acting_team();
    }

    fn next_round(&mut self) {
        self.round += 1;
        debug!("battle: round {} starts", self.round);
        self.roster.round_starts();
        let ids: Vec<UnitId> = self.roster.ids().collect();
        self.grid.manage_highlight_activated(&ids, &self.roster);
        self.notices.push_back(Notice::RoundStarted(self.round));
        self.round_phase = 0;
        self.acting_team = 0;
        self.seat_acting_team();
    }

    /// Closes the round. If more than one team still stands, the next
    /// round is scheduled after the switching pause; otherwise the
    /// fight is over.
    fn end_round(&mut self) {
        debug!("battle: round {} ends", self.round);
        self.deselect();
        self.roster.round_ends();
        let ids: Vec<UnitId> = self.roster.ids().collect();
        self.grid.manage_highlight_activated(&ids, &self.roster);
        self.notices.push_back(Notice::RoundEnded(self.round));
        if let Some(result) = self.check_fight_end() {
            debug!("battle: fight ended: {:?}", result);
            self.result = Some(result);
            self.notices.push_back(Notice::FightEnded(result));
            return;
        }
        self.switching_rounds = true;
        self.switching_timer = self.switching_delay;
    }

    fn check_fight_end(&self) -> Option<FightResult> {
        if self.roster.no_teams_remain() {
            Some(FightResult { winner: None })
        } else {
            self.roster
                .remaining_team()
                .map(|team| FightResult { winner: Some(team) })
        }
    }
}
