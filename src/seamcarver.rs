// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - The main entry point
//!
//! A resize runs up to four phases, always in this order, each one
//! skipped when that axis is already where it needs to be:
//!
//! 1. remove vertical seams until the width is small enough,
//! 2. transpose, remove until the height is small enough, transpose back,
//! 3. insert vertical seams until the width is large enough,
//! 4. transpose, insert until the height is large enough, transpose back.
//!
//! Only vertical seams are ever carved.  Horizontal ones are vertical
//! seams of the transposed image, which keeps exactly one copy of
//! every piece of seam logic.

use crate::carve::Canvas;
use crate::cq;
use crate::energy::{energy_map, min_column};
use crate::error::{CarveError, Result};
use crate::options::CarveOptions;
use crate::progress::{CancelToken, Carved, Outcome, Phase, Step};
use crate::seam::Seam;
use crate::twodmap::{ColorMap, WeightMap};
use crate::workers::Workers;
use image::RgbaImage;
use log::{debug, trace};
use std::mem;

/// The seam carver.  Owns its worker pool, so build one and keep it
/// around for as many resizes as there are.
#[derive(Debug)]
pub struct Carver {
    pub(crate) options: CarveOptions,
    pub(crate) workers: Workers,
}

// An image and its weights partway through a resize.
struct Stage {
    color: ColorMap,
    weights: WeightMap,
}

impl Stage {
    fn transpose(&mut self) {
        self.color = self.color.transpose();
        self.weights = self.weights.transpose();
    }

    fn into_carved(self) -> Carved {
        Carved {
            image: self.color.to_image(),
            weights: self.weights,
        }
    }
}

enum Flow {
    Finished,
    Halted,
}

/// Check the caller's side of the bargain before touching anything.
pub(crate) fn validate(source: &RgbaImage, weights: &WeightMap, width: u32, height: u32) -> Result<()> {
    let (image_width, image_height) = source.dimensions();
    if image_width == 0 || image_height == 0 {
        return Err(CarveError::EmptyImage);
    }
    if weights.dimensions() != (image_width, image_height) {
        return Err(CarveError::DimensionMismatch {
            image_width,
            image_height,
            weights_width: weights.width(),
            weights_height: weights.height(),
        });
    }
    if width == 0 || height == 0 {
        return Err(CarveError::InvalidTarget { width, height });
    }
    Ok(())
}

impl Carver {
    pub fn new(options: CarveOptions) -> Result<Self> {
        let workers = Workers::new(options.threads)?;
        debug!("carver ready with {} worker threads", workers.threads());
        Ok(Carver { options, workers })
    }

    pub fn options(&self) -> &CarveOptions {
        &self.options
    }

    /// Resize `source` to `width`×`height`, running to completion.
    pub fn resize(&self, source: &RgbaImage, weights: &WeightMap, width: u32, height: u32) -> Result<Outcome> {
        self.resize_with(source, weights, width, height, &CancelToken::new(), |_| ())
    }

    /// Resize `source` to `width`×`height`.
    ///
    /// `weights` must match the image: positive values protect a
    /// pixel, negative values invite seams through it.  `observer`
    /// hears about every seam just before it is carved, and `cancel`
    /// is checked right after; once it is set the resize stops and
    /// hands back whatever it has, completed phases and all.
    pub fn resize_with<F>(
        &self,
        source: &RgbaImage,
        weights: &WeightMap,
        width: u32,
        height: u32,
        cancel: &CancelToken,
        mut observer: F,
    ) -> Result<Outcome>
    where
        F: FnMut(Step),
    {
        validate(source, weights, width, height)?;
        let (source_width, source_height) = source.dimensions();
        debug!(
            "resizing {}x{} to {}x{}",
            source_width, source_height, width, height
        );

        let plan = [
            (Phase::RemoveColumns, source_width.saturating_sub(width)),
            (Phase::RemoveRows, source_height.saturating_sub(height)),
            (Phase::InsertColumns, width.saturating_sub(source_width)),
            (Phase::InsertRows, height.saturating_sub(source_height)),
        ];

        let mut stage = Stage {
            color: ColorMap::from_image(source),
            weights: weights.clone(),
        };
        for &(phase, seams) in plan.iter().filter(|(_, seams)| *seams > 0) {
            if phase.is_transposed() {
                stage.transpose();
            }
            let flow = self.carve_phase(&mut stage, phase, seams, cancel, &mut observer)?;
            if phase.is_transposed() {
                stage.transpose();
            }
            if let Flow::Halted = flow {
                debug!("{:?} cancelled", phase);
                return Ok(Outcome::Cancelled(stage.into_carved()));
            }
        }
        Ok(Outcome::Completed(stage.into_carved()))
    }

    // Carve `total` vertical seams out of, or into, the stage.  The
    // edge field is computed once up front and then only every
    // `cadence` seams; in between, the blended values the seam
    // transforms leave behind stand in for it.
    fn carve_phase<F>(
        &self,
        stage: &mut Stage,
        phase: Phase,
        total: u32,
        cancel: &CancelToken,
        observer: &mut F,
    ) -> Result<Flow>
    where
        F: FnMut(Step),
    {
        let cadence = self.options.cadence();
        let color = mem::take(&mut stage.color);
        let weights = mem::take(&mut stage.weights);
        let mut canvas = Canvas::new(&self.workers, color, weights);
        let (width, height) = canvas.dimensions();
        let mut art = cq!(phase.inserts(), Some(WeightMap::new(width, height)), None);
        debug!(
            "{:?}: {} seams on {}x{}, edges refreshed every {}",
            phase, total, width, height, cadence
        );

        let mut flow = Flow::Finished;
        for index in 0..total {
            observer(Step { phase, index, total });
            if cancel.is_cancelled() {
                flow = Flow::Halted;
                break;
            }

            let energy = energy_map(&self.workers, &canvas.edge, &canvas.weights, art.as_ref())?;
            let seam = Seam::extract(&energy, min_column(&energy));
            trace!(
                "{:?} seam {} of {}: column {} to {}",
                phase,
                index + 1,
                total,
                seam.first().copied().unwrap_or(0),
                seam.last().copied().unwrap_or(0)
            );
            match art.as_mut() {
                Some(art) => canvas.insert_path(&self.workers, &seam, art, self.options.add_weight),
                None => canvas.remove_path(&self.workers, &seam),
            }

            if (index + 1) % cadence == 0 {
                canvas.refresh_edges(&self.workers);
            }
        }

        let (color, weights) = canvas.into_parts();
        stage.color = color;
        stage.weights = weights;
        Ok(flow)
    }
}
