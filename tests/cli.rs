// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_picture(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8, 255])
    })
    .save(path)
    .unwrap();
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::open(path).unwrap().to_rgba().dimensions()
}

#[test]
fn resizes_both_axes() {
    let dir = TempDir::new().unwrap();
    let (input, output) = (dir.path().join("in.png"), dir.path().join("out.png"));
    write_picture(&input, 32, 24);
    Command::cargo_bin("seamresize")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .args(&["--width", "26", "--height", "30", "--threads", "2"])
        .assert()
        .success();
    assert_eq!(dimensions(&output), (26, 30));
}

#[test]
fn views_keep_the_input_size() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_picture(&input, 20, 12);
    for view in &["gray", "edge", "vertical", "horizontal"] {
        let output = dir.path().join(format!("{}.png", view));
        Command::cargo_bin("seamresize")
            .unwrap()
            .arg(&input)
            .arg(&output)
            .args(&["--view", view])
            .assert()
            .success();
        assert_eq!(dimensions(&output), (20, 12));
    }
}

#[test]
fn removes_the_masked_area() {
    let dir = TempDir::new().unwrap();
    let (input, mask, output) = (
        dir.path().join("in.png"),
        dir.path().join("mask.png"),
        dir.path().join("out.png"),
    );
    write_picture(&input, 24, 16);
    RgbaImage::from_fn(24, 16, |x, y| {
        if x >= 6 && x < 9 && y >= 4 && y < 10 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
    .save(&mask)
    .unwrap();
    Command::cargo_bin("seamresize")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .arg("--mask")
        .arg(&mask)
        .arg("--remove")
        .assert()
        .success();
    assert_eq!(dimensions(&output), (24, 16));
}

#[test]
fn a_mismatched_mask_is_refused() {
    let dir = TempDir::new().unwrap();
    let (input, mask, output) = (
        dir.path().join("in.png"),
        dir.path().join("mask.png"),
        dir.path().join("out.png"),
    );
    write_picture(&input, 10, 10);
    write_picture(&mask, 9, 10);
    Command::cargo_bin("seamresize")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .arg("--mask")
        .arg(&mask)
        .args(&["--width", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mask is 9x10"));
}

#[test]
fn a_zero_target_is_refused() {
    let dir = TempDir::new().unwrap();
    let (input, output) = (dir.path().join("in.png"), dir.path().join("out.png"));
    write_picture(&input, 10, 10);
    Command::cargo_bin("seamresize")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .args(&["--width", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot resize to 0x10"));
    assert!(!output.exists());
}

#[test]
fn a_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("seamresize")
        .unwrap()
        .arg(dir.path().join("nothing-here.png"))
        .arg(dir.path().join("out.png"))
        .assert()
        .failure();
}
