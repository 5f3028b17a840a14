// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Taking a seam out, and putting one in
//!
//! The color map, the grayscale cache, the edge field and the weights
//! move together: after every removal or insertion all four are the
//! same size again, and the grayscale and edge values along the seam
//! are patched up in place instead of being recomputed from scratch.
//!
//! Each row only ever touches itself, so both transforms hand four
//! strips of rows to the worker pool.

use crate::edge::edge_detect;
use crate::grayscale::grayscale;
use crate::seam::Seam;
use crate::twodmap::{ColorMap, EdgeMap, GrayMap, WeightMap};
use crate::workers::{strips, Workers};
use itertools::izip;

#[inline]
fn blend(a: [u8; 4], b: [u8; 4]) -> [u8; 4] {
    let mut out = [0; 4];
    for (c, o) in out.iter_mut().enumerate() {
        *o = ((u16::from(a[c]) + u16::from(b[c])) / 2) as u8;
    }
    out
}

#[inline]
fn mean_gray(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b)) / 2) as u8
}

#[inline]
fn mean(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}

// Fold the seam cell at `x` into the neighbors that will survive it.
// A seam in the first column has no left neighbor; one in the last
// column has no right neighbor.
fn merge_into_neighbors<P: Copy>(row: &mut [P], x: usize, merge: fn(P, P) -> P) {
    let seam = row[x];
    if x > 0 {
        row[x - 1] = merge(seam, row[x - 1]);
    }
    if x + 1 < row.len() {
        row[x + 1] = merge(seam, row[x + 1]);
    }
}

// Slide everything right of `x` one to the left.  The last cell is
// left stale for resize_width to drop.
fn close_gap<P: Copy>(row: &mut [P], x: usize) {
    row.copy_within(x + 1.., x);
}

// Slide `x` and everything right of it one to the right, over the
// freshly grown last cell.  `x` itself still holds the seam value.
fn open_gap<P: Copy>(row: &mut [P], x: usize) {
    let end = row.len() - 1;
    row.copy_within(x..end, x + 1);
}

// The column left of `x`, or `x` itself in the first column.
#[inline]
fn left_of<P: Copy>(row: &[P], x: usize) -> P {
    row[x.saturating_sub(1)]
}

/// The fields a seam operation keeps consistent.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub color: ColorMap,
    pub gray: GrayMap,
    pub edge: EdgeMap,
    pub weights: WeightMap,
}

impl Canvas {
    /// Take over a color map and its weights, deriving the grayscale
    /// cache and the edge field from the color.
    pub fn new(workers: &Workers, color: ColorMap, weights: WeightMap) -> Self {
        let gray = grayscale(workers, &color);
        let edge = edge_detect(workers, &gray);
        Canvas {
            color,
            gray,
            edge,
            weights,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    /// True when all four fields agree on width and height.
    pub fn in_lockstep(&self) -> bool {
        let dims = self.color.dimensions();
        self.gray.dimensions() == dims
            && self.edge.dimensions() == dims
            && self.weights.dimensions() == dims
    }

    /// Recompute the edge field from the current grayscale cache.
    pub fn refresh_edges(&mut self, workers: &Workers) {
        self.edge = edge_detect(workers, &self.gray);
    }

    pub fn into_parts(self) -> (ColorMap, WeightMap) {
        (self.color, self.weights)
    }

    /// Remove `seam`, one column narrower afterwards.
    ///
    /// Where the weight under the seam is negative the area has been
    /// marked for deletion, and the seam pixel is simply dropped:
    /// blending it back in would leave a smear of the very thing the
    /// caller asked to get rid of.  Elsewhere the seam pixel is
    /// averaged into its left and right neighbors.  The grayscale and
    /// edge values are averaged the same way in every row.  Weights
    /// are directives, not pixels, and are never blended.
    pub fn remove_path(&mut self, workers: &Workers, seam: &Seam) {
        let width = self.color.width();
        debug_assert!(seam.is_valid(width) && seam.len() == self.color.height() as usize);
        let rows: Vec<_> = izip!(
            seam.iter().map(|&x| x as usize),
            self.color.rows_mut(),
            self.gray.rows_mut(),
            self.edge.rows_mut(),
            self.weights.rows_mut()
        )
        .collect();

        workers.run(strips(rows), |strip| {
            for (x, color, gray, edge, weights) in strip {
                if weights[x] >= 0 {
                    merge_into_neighbors(color, x, blend);
                }
                merge_into_neighbors(gray, x, mean_gray);
                merge_into_neighbors(edge, x, mean);
                close_gap(color, x);
                close_gap(gray, x);
                close_gap(edge, x);
                close_gap(weights, x);
            }
        });

        let narrower = width - 1;
        self.color.resize_width(narrower);
        self.gray.resize_width(narrower);
        self.edge.resize_width(narrower);
        self.weights.resize_width(narrower);
    }

    /// Insert a new column along `seam`, one column wider afterwards.
    ///
    /// The new pixel at each seam position is the average of the
    /// original seam pixel, which now sits one to its right, and its
    /// left neighbor; grayscale, edge and weight values likewise.
    /// `art` is grown with the rest, and `add_weight` is laid on both
    /// the new column and the original seam column beside it, so the
    /// next insertion looks somewhere else instead of widening the
    /// same spot over and over.
    pub fn insert_path(&mut self, workers: &Workers, seam: &Seam, art: &mut WeightMap, add_weight: i32) {
        let width = self.color.width();
        debug_assert!(seam.is_valid(width) && seam.len() == self.color.height() as usize);
        let wider = width + 1;
        self.color.resize_width(wider);
        self.gray.resize_width(wider);
        self.edge.resize_width(wider);
        self.weights.resize_width(wider);
        art.resize_width(wider);

        let rows: Vec<_> = izip!(
            seam.iter().map(|&x| x as usize),
            self.color.rows_mut(),
            self.gray.rows_mut(),
            self.edge.rows_mut(),
            self.weights.rows_mut(),
            art.rows_mut()
        )
        .collect();

        workers.run(strips(rows), |strip| {
            for (x, color, gray, edge, weights, art) in strip {
                open_gap(color, x);
                open_gap(gray, x);
                open_gap(edge, x);
                open_gap(weights, x);
                open_gap(art, x);
                color[x] = blend(color[x], left_of(color, x));
                gray[x] = mean_gray(gray[x], left_of(gray, x));
                edge[x] = mean(edge[x], left_of(edge, x));
                weights[x] = mean(weights[x], left_of(weights, x));
                art[x] = art[x].saturating_add(add_weight);
                art[x + 1] = art[x + 1].saturating_add(add_weight);
            }
        });
    }
}
