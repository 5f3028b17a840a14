// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The cumulative energy map
//!
//! Row 0 is the cost of each pixel: its edge magnitude plus its
//! weight (plus, while seams are being inserted, its artificial
//! weight).  Every later cell adds its own cost to the cheapest of
//! the three cells above it:
//!
//! ```text
//!              ⎧ E(x−1,y−1)
//! E(x,y) = min ⎨ E(x,  y−1)  + cost(x,y)
//!              ⎩ E(x+1,y−1)
//! ```
//!
//! where a neighbor past either side of the image is +∞, so the two
//! outer columns have only two candidates.
//!
//! Rows must be done in order, but the cells of a row are independent
//! of each other.  The map is therefore split into a left half
//! `[0, w/2]` and a right half `[w/2+1, w−1]`, each owned outright by
//! one worker.  Only the two cells touching the split need anything
//! from the other side: one value from the other half's previous row.
//! After finishing that boundary cell each worker publishes it down a
//! channel, and before computing its own boundary cell for row y each
//! worker waits for the other half's row y−1.  Contention is confined
//! to that one column; a barrier per row would serialize the halves.
//!
//! Those waits block, so the halves cannot share the data-parallel
//! pool; they run on the two pipeline threads kept by [`Workers`].

use crate::cq;
use crate::error::{CarveError, Result};
use crate::twodmap::{EdgeMap, EnergyMap, WeightMap};
use crate::workers::Workers;
use crossbeam::channel::{self, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};

const STAGE: &str = "energy map";

fn lost<E>(_: E) -> CarveError {
    CarveError::Handshake { stage: STAGE }
}

/// Cost of entering a single pixel.
#[derive(Debug, Copy, Clone)]
struct Costs<'a> {
    edge: &'a EdgeMap,
    weights: &'a WeightMap,
    bias: Option<&'a WeightMap>,
}

impl<'a> Costs<'a> {
    #[inline]
    fn at(&self, x: u32, y: u32) -> i64 {
        let base = i64::from(self.edge[(x, y)]) + i64::from(self.weights[(x, y)]);
        self.bias.map_or(base, |bias| base + i64::from(bias[(x, y)]))
    }
}

/// The same recurrence, one cell at a time on the calling thread.
/// Used for images too narrow to split, and as the yardstick the
/// concurrent version is tested against.
pub fn energy_map_serial(edge: &EdgeMap, weights: &WeightMap, bias: Option<&WeightMap>) -> EnergyMap {
    let (width, height) = edge.dimensions();
    let costs = Costs { edge, weights, bias };
    let mut energy = EnergyMap::new(width, height);
    if energy.is_empty() {
        return energy;
    }
    let mw = width - 1;
    for x in 0..width {
        energy[(x, 0)] = costs.at(x, 0);
    }
    for y in 1..height {
        for x in 0..width {
            let range = cq!(x == 0, 0, x - 1)..=cq!(x == mw, mw, x + 1);
            let best = range
                .map(|nx| energy[(nx, y - 1)])
                .fold(i64::MAX, i64::min);
            energy[(x, y)] = best + costs.at(x, y);
        }
    }
    energy
}

// Called by each half before it starts on a row.  Tests use it to
// hold one half back.
type Pace = fn(Side, usize);

fn steady(_: Side, _: usize) {}

// None when the work panicked.
fn guarded(work: impl FnOnce() -> Result<()>) -> Option<Result<()>> {
    panic::catch_unwind(AssertUnwindSafe(work)).ok()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// One worker's share of the map: every row's slice of the columns
/// starting at `first`.
struct Half<'a> {
    side: Side,
    first: u32,
    rows: Vec<&'a mut [i64]>,
}

/// A worker's connections: where it publishes its boundary cell,
/// where the other half's arrive, and the startup handshake.
struct Wires {
    publish: Sender<i64>,
    subscribe: Receiver<i64>,
    ready: Sender<Side>,
    go: Receiver<()>,
}

// Cheapest of the three cells above column `x`.  `prev` holds this
// half's previous row; `halo`, when given, is the other half's cell
// at that column.  Anything else is off the image.
#[inline]
fn cheapest_above(prev: &[i64], first: u32, width: u32, x: u32, halo: Option<(u32, i64)>) -> i64 {
    let lookup = |nx: i64| -> i64 {
        if nx < 0 || nx >= i64::from(width) {
            return i64::MAX;
        }
        let nx = nx as u32;
        match halo {
            Some((hx, value)) if hx == nx => value,
            _ => nx
                .checked_sub(first)
                .and_then(|i| prev.get(i as usize))
                .copied()
                .unwrap_or(i64::MAX),
        }
    };
    let x = i64::from(x);
    lookup(x - 1).min(lookup(x)).min(lookup(x + 1))
}

fn run_half(mut half: Half<'_>, width: u32, costs: &Costs<'_>, wires: Wires, pace: Pace) -> Result<()> {
    // Everything this worker writes is already its own, so "ready"
    // only has to say the worker is up and its wires are live.
    wires.ready.send(half.side).map_err(lost)?;
    wires.go.recv().map_err(lost)?;

    let height = half.rows.len();
    let cells = half.rows.first().map_or(0, |row| row.len());
    if cells == 0 {
        return Ok(());
    }
    let first = half.first;
    let last = height - 1;
    // The boundary cell is the one beside the split, and the halo is
    // the other half's cell on the far side of it.
    let (boundary, halo) = match half.side {
        Side::Left => (cells - 1, first + cells as u32),
        Side::Right => (0, first - 1),
    };

    for y in 0..height {
        pace(half.side, y);
        let (done, rest) = half.rows.split_at_mut(y);
        let row: &mut [i64] = &mut rest[0];
        let yy = y as u32;

        if y == 0 {
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = costs.at(first + i as u32, 0);
            }
        } else {
            let prev: &[i64] = &done[y - 1];
            let relax = |i: usize, halo: Option<(u32, i64)>| -> i64 {
                let x = first + i as u32;
                cheapest_above(prev, first, width, x, halo) + costs.at(x, yy)
            };
            let others = (0..cells).filter(|&i| i != boundary);

            match half.side {
                Side::Right => {
                    let value = wires.subscribe.recv().map_err(lost)?;
                    row[boundary] = relax(boundary, Some((halo, value)));
                    if y != last {
                        wires.publish.send(row[boundary]).map_err(lost)?;
                    }
                    others.for_each(|i| row[i] = relax(i, None));
                    continue;
                }
                Side::Left => {
                    others.for_each(|i| row[i] = relax(i, None));
                    let value = wires.subscribe.recv().map_err(lost)?;
                    row[boundary] = relax(boundary, Some((halo, value)));
                }
            }
        }

        if y != last {
            wires.publish.send(row[boundary]).map_err(lost)?;
        }
    }
    Ok(())
}

/// Build the cumulative energy map from the edge field, the weights,
/// and optionally a second, artificial, weight field.  All three must
/// have the same dimensions.
pub fn energy_map(
    workers: &Workers,
    edge: &EdgeMap,
    weights: &WeightMap,
    bias: Option<&WeightMap>,
) -> Result<EnergyMap> {
    energy_map_paced(workers, edge, weights, bias, steady)
}

fn energy_map_paced(
    workers: &Workers,
    edge: &EdgeMap,
    weights: &WeightMap,
    bias: Option<&WeightMap>,
    pace: Pace,
) -> Result<EnergyMap> {
    let (width, height) = edge.dimensions();
    // Below three columns there is no right half to speak of.
    if width < 3 || height == 0 {
        return Ok(energy_map_serial(edge, weights, bias));
    }

    let costs = Costs { edge, weights, bias };
    let costs = &costs;
    let split = width / 2 + 1;
    let mut energy = EnergyMap::new(width, height);

    let mut left_rows = Vec::with_capacity(height as usize);
    let mut right_rows = Vec::with_capacity(height as usize);
    for row in energy.rows_mut() {
        let (left, right) = row.split_at_mut(split as usize);
        left_rows.push(left);
        right_rows.push(right);
    }
    let left = Half {
        side: Side::Left,
        first: 0,
        rows: left_rows,
    };
    let right = Half {
        side: Side::Right,
        first: split,
        rows: right_rows,
    };

    let (to_right, from_left) = channel::unbounded();
    let (to_left, from_right) = channel::unbounded();
    let (ready, readied) = channel::unbounded();
    let (go_left, left_go) = channel::bounded(1);
    let (go_right, right_go) = channel::bounded(1);
    let left_wires = Wires {
        publish: to_right,
        subscribe: from_right,
        ready: ready.clone(),
        go: left_go,
    };
    let right_wires = Wires {
        publish: to_left,
        subscribe: from_left,
        ready,
        go: right_go,
    };

    let mut left_done = None;
    let mut right_done = None;
    let (left_slot, right_slot) = (&mut left_done, &mut right_done);

    // The driver runs on the calling thread and owns both "go"
    // senders.  If it bails out early they are dropped with it, and a
    // half parked on "go" wakes up to a disconnected channel instead
    // of waiting forever.
    let released = workers.pipeline(move |scope| -> Result<()> {
        scope.spawn(move |_| *left_slot = guarded(|| run_half(left, width, costs, left_wires, pace)));
        scope.spawn(move |_| *right_slot = guarded(|| run_half(right, width, costs, right_wires, pace)));

        for _ in 0..2 {
            readied.recv().map_err(lost)?;
        }
        go_left.send(()).map_err(lost)?;
        go_right.send(()).map_err(lost)?;
        Ok(())
    });

    match (left_done, right_done) {
        (Some(left), Some(right)) => {
            released?;
            left.and(right)?;
        }
        _ => return Err(CarveError::WorkerPanicked { stage: STAGE }),
    }
    Ok(energy)
}

/// Column of the cheapest cell in the bottom row.  Ties go to the
/// leftmost.
pub fn min_column(energy: &EnergyMap) -> u32 {
    if energy.is_empty() {
        return 0;
    }
    let y = energy.height() - 1;
    (1..energy.width()).fold(0, |best, x| cq!(energy[(x, y)] < energy[(best, y)], x, best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn workers() -> Workers {
        Workers::new(2).unwrap()
    }

    fn field(width: u32, values: &[i64]) -> EnergyMap {
        let height = values.len() as u32 / width;
        EnergyMap::from_fn(width, height, |x, y| values[(y * width + x) as usize])
    }

    fn ints(width: u32, values: &[i32]) -> WeightMap {
        let height = values.len() as u32 / width;
        WeightMap::from_fn(width, height, |x, y| values[(y * width + x) as usize])
    }

    // A small xorshift; the tests want many different fields, not
    // good randomness.
    struct Noise(u64);

    impl Noise {
        fn next(&mut self, modulus: i32) -> i32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 % modulus as u64) as i32
        }
    }

    #[test]
    fn hand_built_three_by_three() {
        let edge = ints(3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let zero = WeightMap::new(3, 3);
        let expected = field(3, &[1, 2, 3, 5, 6, 8, 12, 13, 15]);
        assert_eq!(energy_map_serial(&edge, &zero, None), expected);
        assert_eq!(energy_map(&workers(), &edge, &zero, None).unwrap(), expected);
    }

    #[test]
    fn weights_steer_the_three_by_three() {
        let edge = ints(3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let weights = ints(3, &[0, -5, 0, 0, 0, 10, 3, 0, 0]);
        let expected = field(3, &[1, -3, 3, 1, 2, 13, 11, 9, 11]);
        assert_eq!(energy_map_serial(&edge, &weights, None), expected);
        assert_eq!(energy_map(&workers(), &edge, &weights, None).unwrap(), expected);
    }

    #[test]
    fn bias_adds_to_the_weights() {
        let edge = ints(3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let zero = WeightMap::new(3, 3);
        let bias = ints(3, &[0, -5, 0, 0, 0, 10, 3, 0, 0]);
        let expected = field(3, &[1, -3, 3, 1, 2, 13, 11, 9, 11]);
        assert_eq!(energy_map(&workers(), &edge, &zero, Some(&bias)).unwrap(), expected);
    }

    #[test]
    fn concurrent_map_matches_serial_reference() {
        let workers = workers();
        let mut noise = Noise(0x2545_f491_4f6c_dd1d);
        for round in 0..40 {
            for width in 1..=19 {
                let height = 1 + (round % 9) as u32;
                let edge = EdgeMap::from_fn(width, height, |_, _| noise.next(1531));
                let weights = WeightMap::from_fn(width, height, |_, _| noise.next(4001) - 2000);
                let bias = WeightMap::from_fn(width, height, |_, _| noise.next(50));
                assert_eq!(
                    energy_map(&workers, &edge, &weights, None).unwrap(),
                    energy_map_serial(&edge, &weights, None),
                    "{}x{} round {}",
                    width,
                    height,
                    round
                );
                assert_eq!(
                    energy_map(&workers, &edge, &weights, Some(&bias)).unwrap(),
                    energy_map_serial(&edge, &weights, Some(&bias)),
                );
            }
        }
    }

    #[test]
    fn tall_maps_survive_the_pipeline() {
        let mut noise = Noise(7);
        let edge = EdgeMap::from_fn(64, 600, |_, _| noise.next(1531));
        let weights = WeightMap::new(64, 600);
        assert_eq!(
            energy_map(&workers(), &edge, &weights, None).unwrap(),
            energy_map_serial(&edge, &weights, None)
        );
    }

    // Build one field per width and map each of them again and again
    // under `pace`, checking every result against the serial map.
    fn hammer(pace: Pace, rounds: usize, widths: std::ops::Range<u32>) {
        let workers = workers();
        let mut noise = Noise(0x9e37_79b9_7f4a_7c15);
        let fields: Vec<_> = widths
            .map(|width| {
                let height = 2 + width % 11;
                let edge = EdgeMap::from_fn(width, height, |_, _| noise.next(1531));
                let weights = WeightMap::from_fn(width, height, |_, _| noise.next(4001) - 2000);
                let expected = energy_map_serial(&edge, &weights, None);
                (edge, weights, expected)
            })
            .collect();
        for round in 0..rounds {
            for (edge, weights, expected) in &fields {
                assert_eq!(
                    &energy_map_paced(&workers, edge, weights, None, pace).unwrap(),
                    expected,
                    "width {} round {}",
                    edge.width(),
                    round
                );
            }
        }
    }

    fn left_lags(side: Side, y: usize) {
        if side == Side::Left && y % 2 == 0 {
            thread::sleep(Duration::from_micros(50));
        }
    }

    fn right_lags(side: Side, y: usize) {
        if side == Side::Right && y % 3 == 1 {
            thread::sleep(Duration::from_micros(50));
        }
    }

    fn both_stutter(side: Side, y: usize) {
        match (side, y % 4) {
            (Side::Left, 1) | (Side::Right, 3) => thread::yield_now(),
            (Side::Left, 2) => thread::sleep(Duration::from_micros(20)),
            _ => (),
        }
    }

    #[test]
    fn repeated_maps_always_match_the_serial_map() {
        hammer(steady, 200, 3..40);
    }

    #[test]
    fn a_lagging_left_half_changes_nothing() {
        hammer(left_lags, 5, 3..40);
    }

    #[test]
    fn a_lagging_right_half_changes_nothing() {
        hammer(right_lags, 5, 3..40);
    }

    #[test]
    fn stuttering_halves_change_nothing() {
        hammer(both_stutter, 5, 3..40);
    }

    #[test]
    fn maps_from_many_callers_take_turns() {
        let workers = workers();
        let mut noise = Noise(11);
        let edge = EdgeMap::from_fn(31, 40, |_, _| noise.next(1531));
        let weights = WeightMap::from_fn(31, 40, |_, _| noise.next(300));
        let expected = energy_map_serial(&edge, &weights, None);
        crossbeam::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|_| {
                    for _ in 0..25 {
                        assert_eq!(energy_map(&workers, &edge, &weights, None).unwrap(), expected);
                    }
                });
            }
        })
        .unwrap();
    }

    #[test]
    fn min_column_prefers_the_leftmost_tie() {
        let energy = field(5, &[0, 0, 0, 0, 0, 9, 4, 7, 4, 4]);
        assert_eq!(min_column(&energy), 1);
        let energy = field(3, &[3, 3, 3]);
        assert_eq!(min_column(&energy), 0);
    }
}
