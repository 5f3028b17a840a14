// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use seamresize::{CancelToken, CarveOptions, Carver, Outcome, Phase, WeightMap};

#[macro_use]
extern crate clap;

use clap::{App, Arg, ArgMatches};
use failure::{bail, Error};
use image::RgbaImage;
use log::{info, warn};
use std::str::FromStr;

// Mask colors: red pixels are to be carved away, green ones kept.
const REMOVE: i32 = -100_000;
const PROTECT: i32 = 100_000;

fn weights_from_mask(mask: &RgbaImage) -> WeightMap {
    let (width, height) = mask.dimensions();
    WeightMap::from_fn(width, height, |x, y| {
        let [r, g, _, _] = mask.get_pixel(x, y).0;
        match (r > 127, g > 127) {
            (true, false) => REMOVE,
            (false, true) => PROTECT,
            _ => 0,
        }
    })
}

fn numeric<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> Result<T, clap::Error> {
    if matches.is_present(name) {
        value_t!(matches, name, T)
    } else {
        Ok(default)
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("seamresize: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let matches = App::new("seamresize")
        .version(crate_version!())
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Content-aware image resizing")
        .arg(
            Arg::with_name("INPUT")
                .help("The image to resize")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("Where to write the result")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .takes_value(true)
                .help("Target width (default: unchanged)"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .takes_value(true)
                .help("Target height (default: unchanged)"),
        )
        .arg(
            Arg::with_name("quality")
                .long("quality")
                .takes_value(true)
                .help("Edge refresh rate in (0, 1]; 1 refreshes after every seam"),
        )
        .arg(
            Arg::with_name("add-weight")
                .long("add-weight")
                .takes_value(true)
                .help("Artificial weight laid on inserted seams"),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .takes_value(true)
                .help("Worker threads (default: one per CPU)"),
        )
        .arg(
            Arg::with_name("mask")
                .long("mask")
                .takes_value(true)
                .help("Weight mask: red marks pixels to remove, green pixels to protect"),
        )
        .arg(
            Arg::with_name("remove")
                .long("remove")
                .requires("mask")
                .conflicts_with_all(&["width", "height", "view"])
                .help("Remove the red areas of the mask, keeping the image size"),
        )
        .arg(
            Arg::with_name("view")
                .long("view")
                .takes_value(true)
                .possible_values(&["gray", "edge", "vertical", "horizontal"])
                .help("Write a diagnostic view instead of resizing"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap_or_default();
    let output = matches.value_of("OUTPUT").unwrap_or_default();
    let source = image::open(input)?.to_rgba();
    let (source_width, source_height) = source.dimensions();

    let defaults = CarveOptions::default();
    let options = CarveOptions {
        quality: numeric(&matches, "quality", defaults.quality)?,
        add_weight: numeric(&matches, "add-weight", defaults.add_weight)?,
        threads: numeric(&matches, "threads", defaults.threads)?,
    };
    let carver = Carver::new(options)?;

    if let Some(view) = matches.value_of("view") {
        let rendered = match view {
            "gray" => carver.grayscale_view(&source),
            "edge" => carver.edge_view(&source),
            "vertical" => carver.vertical_energy_view(&source)?,
            _ => carver.horizontal_energy_view(&source)?,
        };
        rendered.save(output)?;
        return Ok(());
    }

    let weights = match matches.value_of("mask") {
        Some(path) => {
            let mask = image::open(path)?.to_rgba();
            if mask.dimensions() != source.dimensions() {
                bail!(
                    "mask is {}x{} but {} is {}x{}",
                    mask.width(),
                    mask.height(),
                    input,
                    source_width,
                    source_height
                );
            }
            weights_from_mask(&mask)
        }
        None => WeightMap::new(source_width, source_height),
    };

    let cancel = CancelToken::new();
    let outcome = if matches.is_present("remove") {
        info!("removing {} marked pixels", seamresize::marked_cells(&weights).len());
        carver.auto_remove(&source, &weights, &cancel)?
    } else {
        let width = numeric(&matches, "width", source_width)?;
        let height = numeric(&matches, "height", source_height)?;
        carver.resize_with(&source, &weights, width, height, &cancel, |step| {
            if step.index == 0 {
                let what = match step.phase {
                    Phase::RemoveColumns => "removing columns",
                    Phase::RemoveRows => "removing rows",
                    Phase::InsertColumns => "inserting columns",
                    Phase::InsertRows => "inserting rows",
                };
                info!("{}: {} seams", what, step.total);
            }
        })?
    };

    let carved = match outcome {
        Outcome::Completed(carved) => carved,
        Outcome::Cancelled(carved) => {
            warn!("stopped early; writing the partial result");
            carved
        }
    };
    carved.image.save(output)?;
    Ok(())
}
