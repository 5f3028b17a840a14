// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Diagnostic views
//!
//! Renderings of the carver's intermediate fields as ordinary images,
//! for looking at what the seam finder is looking at.  All of them are
//! gray, opaque, and the size of the source.

use crate::edge::edge_detect;
use crate::energy::energy_map;
use crate::error::Result;
use crate::grayscale::grayscale;
use crate::seamcarver::Carver;
use crate::twodmap::{ColorMap, EnergyMap, GrayMap, WeightMap};
use image::{Rgba, RgbaImage};
use num_traits::clamp;

fn gray_pixel(value: u8) -> Rgba<u8> {
    Rgba([value, value, value, 255])
}

fn gray_to_image(gray: &GrayMap) -> RgbaImage {
    RgbaImage::from_fn(gray.width(), gray.height(), |x, y| gray_pixel(gray[(x, y)]))
}

/// Scale an energy map into 0..=255 by its largest value.  Negative
/// cells render black, and a map with nothing above zero is black
/// throughout.
pub fn energy_to_image(energy: &EnergyMap) -> RgbaImage {
    let factor = energy.rows().flat_map(|row| row.iter()).copied().max().unwrap_or(0);
    RgbaImage::from_fn(energy.width(), energy.height(), |x, y| {
        if factor <= 0 {
            return gray_pixel(0);
        }
        let c = clamp(energy[(x, y)], 0, factor);
        gray_pixel((c * 255 / factor) as u8)
    })
}

impl Carver {
    pub fn grayscale_view(&self, source: &RgbaImage) -> RgbaImage {
        gray_to_image(&grayscale(&self.workers, &ColorMap::from_image(source)))
    }

    /// Edge magnitudes, saturating at white.
    pub fn edge_view(&self, source: &RgbaImage) -> RgbaImage {
        let gray = grayscale(&self.workers, &ColorMap::from_image(source));
        let edge = edge_detect(&self.workers, &gray);
        RgbaImage::from_fn(edge.width(), edge.height(), |x, y| {
            gray_pixel(clamp(edge[(x, y)], 0, 255) as u8)
        })
    }

    /// The cumulative energy the vertical seam finder would see, with
    /// no weights applied.
    pub fn vertical_energy_view(&self, source: &RgbaImage) -> Result<RgbaImage> {
        self.energy_view(&ColorMap::from_image(source))
    }

    /// The same, for horizontal seams.
    pub fn horizontal_energy_view(&self, source: &RgbaImage) -> Result<RgbaImage> {
        let flipped = self.energy_view(&ColorMap::from_image(source).transpose())?;
        Ok(ColorMap::from_image(&flipped).transpose().to_image())
    }

    fn energy_view(&self, color: &ColorMap) -> Result<RgbaImage> {
        let (width, height) = color.dimensions();
        let gray = grayscale(&self.workers, color);
        let edge = edge_detect(&self.workers, &gray);
        let energy = energy_map(&self.workers, &edge, &WeightMap::new(width, height), None)?;
        Ok(energy_to_image(&energy))
    }
}
