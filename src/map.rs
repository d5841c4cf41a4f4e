//! Cube coordinates
//! <http://www.redblobgames.com/grids/hexagons/#coordinates-cube>

use std::ops::{Add, Sub};

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance(pub i32);

/// A hex with the `q + r + s == 0` invariant.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

/// The six unit directions, clockwise starting from the top-right corner.
/// The order is significant: neighbour enumeration follows it.
pub const DIRECTIONS: [Hex; 6] = [
    Hex { q: 1, r: 0, s: -1 },
    Hex { q: 1, r: -1, s: 0 },
    Hex { q: 0, r: -1, s: 1 },
    Hex { q: -1, r: 0, s: 1 },
    Hex { q: -1, r: 1, s: 0 },
    Hex { q: 0, r: 1, s: -1 },
];

impl Hex {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    pub fn from_cube(q: i32, r: i32, s: i32) -> Self {
        let hex = Self { q, r, s };
        hex.validate();
        hex
    }

    /// Rounds fractional coordinates to the nearest valid hex.
    ///
    /// The axis with the largest rounding residual is recomputed from the
    /// other two, restoring the cube invariant.
    /// <http://www.redblobgames.com/grids/hexagons/#rounding>
    pub fn from_fractional(qf: f32, rf: f32, sf: f32) -> Self {
        let mut q = qf.round();
        let mut r = rf.round();
        let mut s = sf.round();
        let q_diff = (q - qf).abs();
        let r_diff = (r - rf).abs();
        let s_diff = (s - sf).abs();
        if q_diff > r_diff && q_diff > s_diff {
            q = -r - s;
        } else if r_diff > s_diff {
            r = -q - s;
        } else {
            s = -q - r;
        }
        Self::from_cube(q as i32, r as i32, s as i32)
    }

    /// Diagnostic check, not an error path.
    fn validate(self) {
        if self.q + self.r + self.s != 0 {
            warn!("invalid hex: {:?}", self);
        }
    }

    pub fn length(self) -> Distance {
        Distance((self.q.abs() + self.r.abs() + self.s.abs()) / 2)
    }

    pub fn multiply_by(self, k: i32) -> Self {
        Self::new(self.q * k, self.r * k)
    }

    pub fn neighbours(self) -> [Hex; 6] {
        let mut neighbours = [self; 6];
        for (neighbour, dir) in neighbours.iter_mut().zip(&DIRECTIONS) {
            *neighbour = self + *dir;
        }
        neighbours
    }
}

impl Add for Hex {
    type Output = Hex;

    fn add(self, other: Hex) -> Hex {
        Hex::new(self.q + other.q, self.r + other.r)
    }
}

impl Sub for Hex {
    type Output = Hex;

    fn sub(self, other: Hex) -> Hex {
        Hex::new(self.q - other.q, self.r - other.r)
    }
}

pub fn distance_hex(a: Hex, b: Hex) -> Distance {
    (a - b).length()
}
