// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Luma projection of the color map

use crate::twodmap::{ColorMap, GrayMap};
use crate::workers::Workers;

/// floor(0.299·R + 0.587·G + 0.114·B); alpha plays no part.
#[inline]
pub fn luma(pixel: [u8; 4]) -> u8 {
    (0.299 * f64::from(pixel[0]) + 0.587 * f64::from(pixel[1]) + 0.114 * f64::from(pixel[2]))
        .floor() as u8
}

/// Convert the whole color map, one worker per quadrant.  The split
/// is at (width/2, height/2), the midpoint column and row going to the
/// upper-left quadrant.
pub fn grayscale(workers: &Workers, color: &ColorMap) -> GrayMap {
    let (width, height) = color.dimensions();
    let mut gray = GrayMap::new(width, height);
    let quadrants = gray.quadrants_mut(width / 2 + 1, height / 2 + 1);
    workers.run(quadrants, |quadrant| {
        for (dy, row) in quadrant.rows.into_iter().enumerate() {
            let y = quadrant.y + dy as u32;
            for (dx, cell) in row.iter_mut().enumerate() {
                *cell = luma(color[(quadrant.x + dx as u32, y)]);
            }
        }
    });
    gray
}
