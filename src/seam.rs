// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seams, and backtracking one out of an energy map

use crate::twodmap::{Boundary, EnergyMap};
use std::ops::Deref;

/// One column index per row, top to bottom.  Consecutive entries
/// differ by at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seam(Vec<u32>);

impl Seam {
    /// Walk the energy map from `start` in the bottom row up to the
    /// top.  At each row the cell straight up is the default; the
    /// up-left cell replaces it only if strictly cheaper, and then the
    /// up-right cell replaces whichever won only if strictly cheaper
    /// still.  So straight up wins ties over up-left, and up-left
    /// wins ties over up-right.  Keep that order: it is what makes a
    /// run reproducible.
    pub fn extract(energy: &EnergyMap, start: u32) -> Seam {
        let height = energy.height();
        let mut path = vec![0; height as usize];
        // Off-image neighbors read as i64::MAX and so never win.
        let cost = |x: i64, y: u32| -> i64 {
            if x < 0 || x >= i64::from(energy.width()) {
                i64::MAX
            } else {
                energy.get(x, i64::from(y), Boundary::None)
            }
        };
        let mut x = i64::from(start);
        for y in (0..height).rev() {
            let mut best = x;
            if cost(x - 1, y) < cost(best, y) {
                best = x - 1;
            }
            if cost(x + 1, y) < cost(best, y) {
                best = x + 1;
            }
            path[y as usize] = best as u32;
            x = best;
        }
        Seam(path)
    }

    /// True when every column lies inside `width` and no step moves
    /// more than one column.
    pub fn is_valid(&self, width: u32) -> bool {
        self.0.iter().all(|&x| x < width)
            && self.0.windows(2).all(|w| (i64::from(w[0]) - i64::from(w[1])).abs() <= 1)
    }
}

impl Deref for Seam {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for Seam {
    fn from(path: Vec<u32>) -> Self {
        Seam(path)
    }
}
