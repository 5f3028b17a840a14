// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong while carving.
//!
//! Out-of-range reads are not errors here; they are settled by a
//! [`Boundary`](crate::twodmap::Boundary) policy at the call site.

use failure::Fail;

#[derive(Debug, Fail)]
pub enum CarveError {
    #[fail(display = "unable to start worker threads: {}", reason)]
    ThreadSpawn { reason: String },

    #[fail(display = "a {} worker panicked", stage)]
    WorkerPanicked { stage: &'static str },

    #[fail(display = "the {} workers lost contact with each other", stage)]
    Handshake { stage: &'static str },

    #[fail(
        display = "weights are {}x{} but the image is {}x{}",
        weights_width, weights_height, image_width, image_height
    )]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        weights_width: u32,
        weights_height: u32,
    },

    #[fail(display = "cannot carve an empty image")]
    EmptyImage,

    #[fail(display = "cannot resize to {}x{}", width, height)]
    InvalidTarget { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, CarveError>;
