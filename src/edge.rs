// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Prewitt edge detection on the grayscale cache
//!
//! The gradient magnitude is |Gx| + |Gy|, where Gx is the right
//! column of the 3×3 neighborhood minus the left column and Gy is the
//! bottom row minus the top row:
//!
//! ```text
//!        -1  0 +1            -1 -1 -1
//!   Gx = -1  0 +1       Gy =  0  0  0
//!        -1  0 +1            +1 +1 +1
//! ```
//!
//! There is no good answer at the border.  Padding with zeros (or
//! 255s) darkens (or lightens) the edge; dropping the ring shrinks the
//! image.  Re-reading the nearest border pixel rings a little, but is
//! the least bad, so that is what the ring gets.

use crate::twodmap::{Boundary, EdgeMap, GrayMap};
use crate::workers::Workers;

/// Gradient magnitude at (x, y), reading neighbors under `boundary`.
#[inline]
pub fn prewitt(gray: &GrayMap, x: u32, y: u32, boundary: Boundary) -> i32 {
    let (x, y) = (i64::from(x), i64::from(y));
    let p = |dx: i64, dy: i64| i32::from(gray.get(x + dx, y + dy, boundary));
    let horizontal = p(1, -1) + p(1, 0) + p(1, 1) - p(-1, -1) - p(-1, 0) - p(-1, 1);
    let vertical = p(-1, 1) + p(0, 1) + p(1, 1) - p(-1, -1) - p(0, -1) - p(1, -1);
    horizontal.abs() + vertical.abs()
}

// The outer ring, top row, bottom row, left column, right column.
// Corners turn up twice; computing them twice is harmless.
fn ring(gray: &GrayMap) -> Vec<(u32, u32, i32)> {
    let (width, height) = gray.dimensions();
    let (mw, mh) = (width - 1, height - 1);
    let top = (0..width).map(|x| (x, 0));
    let bottom = (0..width).map(|x| (x, mh));
    let left = (0..height).map(|y| (0, y));
    let right = (0..height).map(|y| (mw, y));
    top.chain(bottom)
        .chain(left)
        .chain(right)
        .map(|(x, y)| (x, y, prewitt(gray, x, y, Boundary::ClampToEdge)))
        .collect()
}

/// Edge field of `gray`.  Four quadrant workers take the interior
/// with direct, unchecked reads while the ring is computed beside
/// them with clamped reads; the field is complete only once both are.
pub fn edge_detect(workers: &Workers, gray: &GrayMap) -> EdgeMap {
    let (width, height) = gray.dimensions();
    let mut edge = EdgeMap::new(width, height);
    if edge.is_empty() {
        return edge;
    }
    let (mw, mh) = (width - 1, height - 1);

    let quadrants = edge.quadrants_mut(width / 2 + 1, height / 2 + 1);
    let border = workers.run_alongside(
        quadrants,
        |quadrant| {
            for (dy, row) in quadrant.rows.into_iter().enumerate() {
                let y = quadrant.y + dy as u32;
                if y == 0 || y == mh {
                    continue;
                }
                for (dx, cell) in row.iter_mut().enumerate() {
                    let x = quadrant.x + dx as u32;
                    if x != 0 && x != mw {
                        *cell = prewitt(gray, x, y, Boundary::None);
                    }
                }
            }
        },
        || ring(gray),
    );

    for (x, y, magnitude) in border {
        edge[(x, y)] = magnitude;
    }
    edge
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(gray: &GrayMap) -> EdgeMap {
        EdgeMap::from_fn(gray.width(), gray.height(), |x, y| {
            prewitt(gray, x, y, Boundary::ClampToEdge)
        })
    }

    #[test]
    fn flat_fields_have_no_edges() {
        let workers = Workers::new(2).unwrap();
        let gray = GrayMap::filled(9, 6, 120);
        let edge = edge_detect(&workers, &gray);
        assert!(edge.rows().all(|row| row.iter().all(|e| *e == 0)));
    }

    #[test]
    fn vertical_step_lights_up_both_sides() {
        // Columns 0..3 dark, 3..6 bright.
        let gray = GrayMap::from_fn(6, 4, |x, _| if x < 3 { 0 } else { 100 });
        let workers = Workers::new(2).unwrap();
        let edge = edge_detect(&workers, &gray);
        assert_eq!(edge[(2, 1)], 300);
        assert_eq!(edge[(3, 1)], 300);
        assert_eq!(edge[(1, 1)], 0);
        assert_eq!(edge[(4, 2)], 0);
        // The ring clamps: the top row sees its own pixels above it.
        assert_eq!(edge[(2, 0)], 300);
    }

    #[test]
    fn ring_and_interior_agree_with_clamped_scan() {
        let workers = Workers::new(4).unwrap();
        for &(width, height) in &[(1, 1), (1, 4), (3, 1), (2, 2), (3, 3), (11, 7), (32, 17)] {
            let gray = GrayMap::from_fn(width, height, |x, y| ((x * 53 + y * 29) % 251) as u8);
            assert_eq!(edge_detect(&workers, &gray), reference(&gray));
        }
    }
}
