// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The rectangular fields the carver works on
//!
//! Every buffer in the engine, the color image, the grayscale cache,
//! the edge field, the weights and the energy table, is one of these:
//! a row-major field of `Copy` values that can lose or gain a column
//! in place, be transposed, and be read past its borders under an
//! explicit [`Boundary`] policy.

use crate::cq;
use image::{Rgba, RgbaImage};
use itertools::iproduct;
use num_traits::clamp;
use std::ops::{Index, IndexMut};

/// What a read outside the field returns.  The policy is chosen per
/// call; the field itself has no opinion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// No policy at all.  The caller guarantees the coordinate is
    /// inside the field; an out-of-range coordinate panics.
    None,
    /// Out-of-range coordinates read the nearest valid cell.
    ClampToEdge,
    /// Out-of-range coordinates read `P::default()`.
    ZeroFill,
}

/// Defines the basic two-dimensional map: an addressable field of
/// pixels, luma values, gradient magnitudes, weights or cumulative
/// energies.  The content type must implement Default, which is also
/// what freshly grown columns hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoDimensionalMap<P: Default + Copy> {
    width: u32,
    height: u32,
    data: Vec<P>,
}

/// RGBA, eight bits a channel.
pub type ColorMap = TwoDimensionalMap<[u8; 4]>;
/// Luma, kept in lockstep with the color map.
pub type GrayMap = TwoDimensionalMap<u8>;
/// Gradient magnitude.
pub type EdgeMap = TwoDimensionalMap<i32>;
/// Caller-supplied bias: positive protects, negative marks for removal.
pub type WeightMap = TwoDimensionalMap<i32>;
/// The cumulative minimum-path-cost table.
pub type EnergyMap = TwoDimensionalMap<i64>;

/// One quarter of a field, handed to a single worker.  `x` and `y`
/// are the field coordinates of the quadrant's upper-left cell; each
/// entry of `rows` is that quadrant's slice of one field row.
#[derive(Debug)]
pub struct Quadrant<'a, P> {
    pub x: u32,
    pub y: u32,
    pub rows: Vec<&'a mut [P]>,
}

impl<P: Default + Copy> TwoDimensionalMap<P> {
    /// A field of `P::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, P::default())
    }

    pub fn filled(width: u32, height: u32, value: P) -> Self {
        TwoDimensionalMap {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Build a field by asking `f` for the value at every (x, y).
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> P,
    {
        TwoDimensionalMap {
            width,
            height,
            data: iproduct!(0..height, 0..width).map(|(y, x)| f(x, y)).collect(),
        }
    }

    // Absolutely, the number one name of this game is keep the index
    // math in a singular location and never, ever mess with it.  Even
    // resize_width below only ever moves whole rows of it.
    fn get_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Read a value, resolving out-of-range coordinates with
    /// `boundary`.  Under `Boundary::None` an out-of-range coordinate
    /// panics.
    pub fn get(&self, x: i64, y: i64, boundary: Boundary) -> P {
        match boundary {
            Boundary::None => {
                debug_assert!(self.contains(x, y), "({}, {}) is outside the map", x, y);
                self[(x as u32, y as u32)]
            }
            Boundary::ClampToEdge => {
                let cx = clamp(x, 0, i64::from(self.width) - 1);
                let cy = clamp(y, 0, i64::from(self.height) - 1);
                self[(cx as u32, cy as u32)]
            }
            Boundary::ZeroFill => cq!(
                self.contains(x, y),
                self[(x as u32, y as u32)],
                P::default()
            ),
        }
    }

    /// Set a value at a single address
    pub fn set(&mut self, x: u32, y: u32, value: P) {
        self[(x, y)] = value;
    }

    pub fn fill(&mut self, value: P) {
        self.data.iter_mut().for_each(|c| *c = value);
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Change the width in place.  Columns `0..min(old, new)` keep
    /// their contents; grown columns hold `P::default()`.
    pub fn resize_width(&mut self, new_width: u32) {
        let (old, new) = (self.width as usize, new_width as usize);
        let height = self.height as usize;
        if new < old {
            // Rows only ever move toward the front, so go top down.
            for y in 1..height {
                self.data.copy_within(y * old..y * old + new, y * new);
            }
            self.data.truncate(new * height);
        } else if new > old {
            self.data.resize(new * height, P::default());
            // And toward the back here, so bottom up.
            for y in (0..height).rev() {
                self.data.copy_within(y * old..y * old + old, y * new);
                self.data[y * new + old..(y + 1) * new]
                    .iter_mut()
                    .for_each(|c| *c = P::default());
            }
        }
        self.width = new_width;
    }

    /// A new field with width and height, and every x and y, swapped.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.height, self.width, |x, y| self[(y, x)])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[P]> {
        self.data.chunks(self.width.max(1) as usize)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [P]> {
        self.data.chunks_mut(self.width.max(1) as usize)
    }

    /// Split the field into four disjoint mutable views: columns
    /// before and after `split_x`, rows before and after `split_y`,
    /// in the order top-left, top-right, bottom-left, bottom-right.
    /// Views may be empty when a split sits on the field's border.
    pub fn quadrants_mut(&mut self, split_x: u32, split_y: u32) -> Vec<Quadrant<'_, P>> {
        let (sx, sy) = (split_x.min(self.width), split_y.min(self.height));
        let mut quadrants: Vec<Quadrant<'_, P>> = vec![(0, 0), (sx, 0), (0, sy), (sx, sy)]
            .into_iter()
            .map(|(x, y)| Quadrant { x, y, rows: Vec::new() })
            .collect();
        if self.is_empty() {
            return quadrants;
        }
        for (y, row) in self.rows_mut().enumerate() {
            let (left, right) = row.split_at_mut(sx as usize);
            let band = cq!((y as u32) < sy, 0, 2);
            quadrants[band].rows.push(left);
            quadrants[band + 1].rows.push(right);
        }
        quadrants
    }
}

impl<P: Default + Copy> Index<(u32, u32)> for TwoDimensionalMap<P> {
    type Output = P;

    /// A convenience addressing mode for getting values.
    fn index(&self, (x, y): (u32, u32)) -> &P {
        let index = self.get_index(x, y);
        &self.data[index]
    }
}

impl<P: Default + Copy> IndexMut<(u32, u32)> for TwoDimensionalMap<P> {
    /// A convenience addressing mode for setting values.
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut P {
        let index = self.get_index(x, y);
        &mut self.data[index]
    }
}

impl TwoDimensionalMap<[u8; 4]> {
    pub fn from_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        TwoDimensionalMap {
            width,
            height,
            data: image.pixels().map(|p| p.0).collect(),
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| Rgba(self[(x, y)]))
    }
}
