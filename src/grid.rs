//! The cell storage: occupancy, selection and highlight state.

use std::collections::HashMap;

use log::trace;

use crate::{
    geom::{Layout, Point},
    map::Hex,
    pathfinder,
    roster::Roster,
    UnitId,
};

/// How a cell should currently be shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellVis {
    Normal,
    Selected,
    Highlighted,
    Activated,
    AttackTarget,
}

#[derive(Clone, Debug)]
pub struct Cell {
    hex: Hex,
    center: Point,
    cost: f32,
    occupier: Option<UnitId>,
    vis: CellVis,
}

impl Cell {
    fn new(hex: Hex, center: Point) -> Self {
        Self {
            hex,
            center,
            cost: 1.0,
            occupier: None,
            vis: CellVis::Normal,
        }
    }

    pub fn hex(&self) -> Hex {
        self.hex
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn occupier(&self) -> Option<UnitId> {
        self.occupier
    }

    pub fn is_occupied(&self) -> bool {
        self.occupier.is_some()
    }

    pub fn vis(&self) -> CellVis {
        self.vis
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    layout: Layout,
    cells: HashMap<Hex, Cell>,
    selected: Option<Hex>,
    highlighted: Option<Hex>,
    highlighted_path: Vec<Hex>,
}

impl Grid {
    /// Builds a roughly rectangular field of `width * height` cells
    /// centered on the origin hex. Odd rows are offset to keep the
    /// outline straight.
    pub fn generate(width: i32, height: i32, layout: Layout) -> Self {
        let mut cells = HashMap::new();
        let top = -(height / 2);
        let left = -(width / 2);
        for r in top..top + height {
            let r_offset = r >> 1;
            for q in left - r_offset..left - r_offset + width {
                let hex = Hex::new(q, r);
                let center = layout.hex_to_point(hex);
                cells.insert(hex, Cell::new(hex, center));
            }
        }
        Self {
            layout,
            cells,
            selected: None,
            highlighted: None,
            highlighted_path: Vec::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cell(&self, hex: Hex) -> Option<&Cell> {
        self.cells.get(&hex)
    }

    pub(crate) fn cell_mut(&mut self, hex: Hex) -> Option<&mut Cell> {
        self.cells.get_mut(&hex)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Maps a continuous pick position back to the cell under it.
    pub fn find_cell(&self, point: Point) -> Option<&Cell> {
        let hex = self.layout.point_to_hex(point);
        self.cell(hex)
    }

    pub fn selected(&self) -> Option<Hex> {
        self.selected
    }

    pub fn highlighted(&self) -> Option<Hex> {
        self.highlighted
    }

    pub fn highlighted_path(&self) -> &[Hex] {
        &self.highlighted_path
    }

    pub fn can_spawn_at(&self, hex: Hex) -> bool {
        match self.cell(hex) {
            Some(cell) => !cell.is_occupied(),
            None => false,
        }
    }

    pub(crate) fn occupy(&mut self, hex: Hex, id: UnitId) {
        if let Some(cell) = self.cells.get_mut(&hex) {
            assert!(cell.occupier.is_none(), "cell {:?} is already occupied", hex);
            cell.occupier = Some(id);
        }
    }

    pub(crate) fn release(&mut self, hex: Hex) {
        if let Some(cell) = self.cells.get_mut(&hex) {
            cell.occupier = None;
        }
    }

    /// Moves the occupancy marker one step. The destination is claimed
    /// before the source is freed, so at no instant during a march does
    /// the mover hold zero cells.
    pub(crate) fn hand_off(&mut self, from: Hex, to: Hex, id: UnitId) {
        trace!("grid: hand_off: {:?} -> {:?}", from, to);
        self.occupy(to, id);
        self.release(from);
    }

    /// What a cell looks like when nothing transient is drawn over it.
    /// The activated marker is only for units that can still do
    /// something with their turn.
    fn resting_vis(&self, hex: Hex, roster: &Roster) -> CellVis {
        if self.selected == Some(hex) {
            return CellVis::Selected;
        }
        let occupier = self.cell(hex).and_then(|cell| cell.occupier);
        if let Some(id) = occupier {
            if let Some(unit) = roster.get(id) {
                if unit.can_be_activated && unit.can_act && !unit.is_busy() {
                    return CellVis::Activated;
                }
            }
        }
        CellVis::Normal
    }

    fn reset_vis(&mut self, hex: Hex, roster: &Roster) {
        let vis = self.resting_vis(hex, roster);
        if let Some(cell) = self.cells.get_mut(&hex) {
            cell.vis = vis;
        }
    }

    pub(crate) fn select_cell(&mut self, hex: Hex, roster: &Roster) {
        self.clear_selection(roster);
        if self.cells.contains_key(&hex) {
            self.selected = Some(hex);
            self.reset_vis(hex, roster);
        }
    }

    pub(crate) fn clear_selection(&mut self, roster: &Roster) {
        if let Some(prev) = self.selected.take() {
            self.reset_vis(prev, roster);
        }
    }

    /// Shows the cell under the cursor. With a mover selected this also
    /// previews the walk: the path is searched, clipped to the mover's
    /// budget and painted over the field. A reachable enemy on the target
    /// cell is marked as an attack target.
    pub(crate) fn highlight_cell(&mut self, hex: Hex, roster: &Roster) {
        self.clear_highlighting(roster);
        if !self.cells.contains_key(&hex) {
            return;
        }
        self.highlighted = Some(hex);
        let mover = self
            .selected
            .and_then(|sel| self.cell(sel))
            .and_then(|cell| cell.occupier)
            .and_then(|id| roster.get(id).map(|unit| (id, unit.clone())));
        let (mover_id, mover) = match mover {
            Some((id, unit)) if !unit.is_busy() && unit.can_act => (id, unit),
            _ => {
                self.paint(hex, CellVis::Highlighted);
                return;
            }
        };
        let path = match pathfinder::find_path(self, mover.hex, hex) {
            Some(path) => path,
            None => {
                self.paint(hex, CellVis::Highlighted);
                return;
            }
        };
        let reaches_target = path.tiles().len() <= (mover.stats.move_range.0 + 1) as usize;
        let clipped = path.clip(mover.stats.move_range);
        self.highlighted_path = clipped.tiles().to_vec();
        for tile in self.highlighted_path.clone() {
            self.paint(tile, CellVis::Highlighted);
        }
        // Any occupier but the mover itself can be struck.
        let target_is_other = self
            .cell(hex)
            .and_then(|cell| cell.occupier)
            .map_or(false, |id| id != mover_id);
        if reaches_target && target_is_other {
            self.paint(hex, CellVis::AttackTarget);
        }
    }

    /// Restores the painted-over cells. The remembered path itself is
    /// kept so a click can still pick it up. Idempotent.
    pub(crate) fn clear_highlighting(&mut self, roster: &Roster) {
        for tile in self.highlighted_path.clone() {
            self.reset_vis(tile, roster);
        }
        if let Some(prev) = self.highlighted.take() {
            self.reset_vis(prev, roster);
        }
    }

    /// Repaints the cells of the given units after their activation
    /// flags changed.
    pub(crate) fn manage_highlight_activated(&mut self, ids: &[UnitId], roster: &Roster) {
        for &id in ids {
            if let Some(unit) = roster.get(id) {
                self.reset_vis(unit.hex, roster);
            }
        }
    }

    fn paint(&mut self, hex: Hex, vis: CellVis) {
        if let Some(cell) = self.cells.get_mut(&hex) {
            cell.vis = vis;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellVis, Grid};
    use crate::{
        geom::{Layout, Point, POINTY},
        map::Hex,
        roster::Roster,
        unit::{Stats, Unit},
        Initiative, MoveRange, TeamId,
    };

    fn layout() -> Layout {
        Layout::new(POINTY, Point::new(1.0, 1.0), Point::new(0.0, 0.0))
    }

    fn stats() -> Stats {
        Stats {
            move_range: MoveRange(4),
            initiative: Initiative(0),
        }
    }

    #[test]
    fn generate_makes_width_times_height_cells() {
        let grid = Grid::generate(6, 4, layout());
        assert_eq!(grid.cells().count(), 24);
        assert!(grid.cell(Hex::new(0, 0)).is_some());
    }

    #[test]
    fn find_cell_matches_cell_centers() {
        let grid = Grid::generate(6, 6, layout());
        let hex = Hex::new(1, -2);
        let center = grid.cell(hex).unwrap().center();
        assert_eq!(grid.find_cell(center).unwrap().hex(), hex);
        let far = Point::new(1_000.0, 1_000.0);
        assert!(grid.find_cell(far).is_none());
    }

    #[test]
    fn hand_off_moves_the_occupancy_marker() {
        let mut grid = Grid::generate(6, 6, layout());
        let mut roster = Roster::new();
        let a = Hex::new(0, 0);
        let b = Hex::new(1, 0);
        let id = roster.add(Unit::new("scout".into(), TeamId(0), stats(), a));
        grid.occupy(a, id);
        assert!(!grid.can_spawn_at(a));
        grid.hand_off(a, b, id);
        assert!(grid.can_spawn_at(a));
        assert_eq!(grid.cell(b).unwrap().occupier(), Some(id));
    }

    #[test]
    fn highlight_previews_a_clipped_path() {
        let mut grid = Grid::generate(10, 10, layout());
        let mut roster = Roster::new();
        let start = Hex::new(-3, 0);
        let id = roster.add(Unit::new("scout".into(), TeamId(0), stats(), start));
        grid.occupy(start, id);
        grid.select_cell(start, &roster);
        grid.highlight_cell(Hex::new(3, 0), &roster);
        // Budget of 4 steps: the start plus four more cells.
        assert_eq!(grid.highlighted_path().len(), 5);
        assert_eq!(grid.highlighted_path()[0], start);
        for &tile in &grid.highlighted_path()[1..] {
            assert_eq!(grid.cell(tile).unwrap().vis(), CellVis::Highlighted);
        }
    }

    #[test]
    fn activated_marker_needs_an_unspent_action() {
        let mut grid = Grid::generate(6, 6, layout());
        let mut roster = Roster::new();
        let hex = Hex::new(0, 0);
        let id = roster.add(Unit::new("scout".into(), TeamId(0), stats(), hex));
        grid.occupy(hex, id);
        roster.get_mut(id).unwrap().can_be_activated = true;
        grid.manage_highlight_activated(&[id], &roster);
        assert_eq!(grid.cell(hex).unwrap().vis(), CellVis::Activated);
        // Once the action is spent the marker goes away, even while the
        // unit is still formally activated.
        roster.get_mut(id).unwrap().can_act = false;
        grid.manage_highlight_activated(&[id], &roster);
        assert_eq!(grid.cell(hex).unwrap().vis(), CellVis::Normal);
    }

    #[test]
    fn clear_highlighting_is_idempotent_and_keeps_selection() {
        let mut grid = Grid::generate(10, 10, layout());
        let mut roster = Roster::new();
        let start = Hex::new(0, 0);
        let id = roster.add(Unit::new("scout".into(), TeamId(0), stats(), start));
        grid.occupy(start, id);
        grid.select_cell(start, &roster);
        grid.highlight_cell(Hex::new(2, 0), &roster);
        grid.clear_highlighting(&roster);
        grid.clear_highlighting(&roster);
        assert_eq!(grid.cell(start).unwrap().vis(), CellVis::Selected);
        assert_eq!(grid.cell(Hex::new(2, 0)).unwrap().vis(), CellVis::Normal);
        // The remembered path survives for a later click.
        assert!(!grid.highlighted_path().is_empty());
    }
}
