// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content-aware image resizing.
//!
//! Seam carving shrinks an image by repeatedly removing the connected
//! path of least "importance" from top to bottom (or left to right),
//! and grows it by duplicating such paths.  Importance is edge
//! strength plus a caller-supplied weight per pixel: positive weights
//! protect, negative weights mark pixels for removal.
//!
//! ```no_run
//! use seamresize::{Carver, CarveOptions, WeightMap};
//!
//! # fn main() -> Result<(), failure::Error> {
//! let image = image::open("in.png")?.to_rgba();
//! let (width, height) = image.dimensions();
//! let carver = Carver::new(CarveOptions::default())?;
//! let carved = carver
//!     .resize(&image, &WeightMap::new(width, height), width - 40, height)?
//!     .into_carved();
//! carved.image.save("out.png")?;
//! # Ok(())
//! # }
//! ```

mod ternary;

pub mod twodmap;
pub use twodmap::{Boundary, ColorMap, EdgeMap, EnergyMap, GrayMap, TwoDimensionalMap, WeightMap};

pub mod error;
pub use error::{CarveError, Result};

pub mod options;
pub use options::CarveOptions;

pub mod progress;
pub use progress::{CancelToken, Carved, Outcome, Phase, Step};

pub mod workers;
pub use workers::Workers;

pub mod grayscale;
pub mod edge;

pub mod energy;
pub use energy::{energy_map, energy_map_serial, min_column};

pub mod seam;
pub use seam::Seam;

pub mod carve;
pub use carve::Canvas;

pub mod seamcarver;
pub use seamcarver::Carver;

pub mod removal;
pub use removal::{marked_cells, marked_lines};

pub mod dump;
pub use dump::energy_to_image;
