// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Knobs for a [`Carver`](crate::Carver).
#[derive(Debug, Clone, PartialEq)]
pub struct CarveOptions {
    /// How fresh the edge field stays during a run of seams, in
    /// (0, 1].  At 1 the edges are recomputed after every seam; at 0.1
    /// after every tenth.  Anything outside (0, 1] behaves as 1.
    pub quality: f64,

    /// Artificial weight laid on each inserted seam and on the seam it
    /// was split from, so the next insertion goes somewhere else.
    /// Large values approach a uniform linear stretch; small values
    /// let one low-energy region take most of the new columns.
    /// Above about 25 stretching stops, but enough of it will push
    /// seams into protected areas.
    pub add_weight: i32,

    /// Threads in the data-parallel worker pool.
    pub threads: usize,
}

impl Default for CarveOptions {
    fn default() -> Self {
        CarveOptions {
            quality: 1.0,
            add_weight: 10,
            threads: num_cpus::get(),
        }
    }
}

impl CarveOptions {
    /// Number of seams processed between edge field recomputations.
    pub fn cadence(&self) -> u32 {
        if self.quality > 0.0 && self.quality <= 1.0 {
            (1.0 / self.quality).ceil() as u32
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_quality(quality: f64) -> CarveOptions {
        CarveOptions {
            quality,
            ..Default::default()
        }
    }

    #[test]
    fn cadence_follows_quality() {
        assert_eq!(with_quality(1.0).cadence(), 1);
        assert_eq!(with_quality(0.5).cadence(), 2);
        assert_eq!(with_quality(0.3).cadence(), 4);
        assert_eq!(with_quality(0.01).cadence(), 100);
    }

    #[test]
    fn out_of_range_quality_recomputes_every_seam() {
        assert_eq!(with_quality(0.0).cadence(), 1);
        assert_eq!(with_quality(-2.0).cadence(), 1);
        assert_eq!(with_quality(7.5).cadence(), 1);
        assert_eq!(with_quality(std::f64::NAN).cadence(), 1);
    }
}
