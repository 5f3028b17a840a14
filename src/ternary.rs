// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// My ternary expression handler.  Rust's ifs are already
/// expressions, but `cargo fmt` spreads them over five lines, and the
/// border rules of the edge detector and the seam transforms (clamp
/// here, skip there, zero-fill somewhere else) read much better as a
/// table of one-liners.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition {
            $_true
        } else {
            $_false
        }
    };
}
