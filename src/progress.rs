// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Progress reporting, cooperative cancellation, and what a resize
//! hands back.

use crate::twodmap::WeightMap;
use image::RgbaImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation flag shared between the caller and a running
/// resize.  The resize looks at it once per seam, never in the middle
/// of one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The four passes of a resize, in the order they run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    RemoveColumns,
    RemoveRows,
    InsertColumns,
    InsertRows,
}

impl Phase {
    /// Row phases run on the transposed image.
    pub fn is_transposed(self) -> bool {
        self == Phase::RemoveRows || self == Phase::InsertRows
    }

    pub fn inserts(self) -> bool {
        self == Phase::InsertColumns || self == Phase::InsertRows
    }
}

/// Reported to the observer just before seam `index` (counting from
/// zero) of `total` in `phase` is processed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Step {
    pub phase: Phase,
    pub index: u32,
    pub total: u32,
}

/// An image together with its weights, which were shifted and
/// stretched right along with it.
#[derive(Debug, Clone)]
pub struct Carved {
    pub image: RgbaImage,
    pub weights: WeightMap,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(Carved),
    /// Stopped early.  Holds every finished phase plus the seams the
    /// interrupted phase had already applied.
    Cancelled(Carved),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        match self {
            Outcome::Completed(_) => true,
            Outcome::Cancelled(_) => false,
        }
    }

    pub fn carved(&self) -> &Carved {
        match self {
            Outcome::Completed(c) | Outcome::Cancelled(c) => c,
        }
    }

    pub fn into_carved(self) -> Carved {
        match self {
            Outcome::Completed(c) | Outcome::Cancelled(c) => c,
        }
    }
}
