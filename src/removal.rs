// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Automatic object removal
//!
//! Paint the thing you want gone with negative weights, and the
//! carver shrinks the image along whichever axis needs fewer seams to
//! swallow it, re-counting after every pass, since clearing one axis
//! can leave stragglers in the other.  Once nothing negative is left
//! the image is grown back to its original size.
//!
//! Nothing bounds the number of passes.  A weight field negative in
//! every row and every column at once would ask for a zero-sized
//! image, which is refused with `InvalidTarget`; any other stubborn
//! case is what the cancel token is for.

use crate::error::Result;
use crate::progress::{CancelToken, Carved, Outcome};
use crate::seamcarver::{validate, Carver};
use crate::twodmap::WeightMap;
use image::RgbaImage;
use itertools::Itertools;
use log::debug;

/// Count the columns, and the rows, holding at least one negative
/// weight.
pub fn marked_lines(weights: &WeightMap) -> (u32, u32) {
    let (width, height) = weights.dimensions();
    let rows = weights
        .rows()
        .filter(|row| row.iter().any(|w| *w < 0))
        .count() as u32;
    let columns = (0..width)
        .filter(|&x| (0..height).any(|y| weights[(x, y)] < 0))
        .count() as u32;
    (columns, rows)
}

impl Carver {
    /// Carve away every pixel with a negative weight, then restore the
    /// original dimensions.
    pub fn auto_remove(&self, source: &RgbaImage, weights: &WeightMap, cancel: &CancelToken) -> Result<Outcome> {
        let (width, height) = source.dimensions();
        validate(source, weights, width, height)?;

        let mut carved = Carved {
            image: source.clone(),
            weights: weights.clone(),
        };
        for pass in 1.. {
            let (columns, rows) = marked_lines(&carved.weights);
            if columns == 0 {
                break;
            }
            let (current_width, current_height) = carved.image.dimensions();
            let (target_width, target_height) = if rows < columns {
                (current_width, current_height - rows)
            } else {
                (current_width - columns, current_height)
            };
            debug!(
                "removal pass {}: marks span {} columns and {} rows, shrinking {}x{} to {}x{}",
                pass, columns, rows, current_width, current_height, target_width, target_height
            );
            match self.resize_with(&carved.image, &carved.weights, target_width, target_height, cancel, |_| ())? {
                Outcome::Completed(next) => carved = next,
                cancelled => return Ok(cancelled),
            }
        }

        let (cleared_width, cleared_height) = carved.image.dimensions();
        debug!(
            "marks cleared at {}x{}, growing back to {}x{}",
            cleared_width, cleared_height, width, height
        );
        self.resize_with(&carved.image, &carved.weights, width, height, cancel, |_| ())
    }
}

/// Positions, in row-major order, of every negative weight.
pub fn marked_cells(weights: &WeightMap) -> Vec<(u32, u32)> {
    weights
        .rows()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .positions(|w| *w < 0)
                .map(move |x| (x as u32, y as u32))
        })
        .collect()
}
