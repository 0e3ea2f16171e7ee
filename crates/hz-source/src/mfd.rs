//! Magnitude-frequency distributions.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of bins a Gutenberg-Richter MFD expands into.
pub const MAX_MAGNITUDE_BINS: usize = 10_000;

/// One magnitude bin: central magnitude and annual occurrence rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeBin {
    pub magnitude: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Mfd {
    /// Doubly-truncated Gutenberg-Richter: `log10 N(>=m) = a - b m` between
    /// `min_mag` and `max_mag`, discretized in bins of `bin_width`.
    TruncatedGutenbergRichter {
        a_val: f64,
        b_val: f64,
        min_mag: f64,
        max_mag: f64,
        bin_width: f64,
    },
    /// Explicit annual rates for bins centred at `min_mag + i * bin_width`.
    EvenlyDiscretized {
        min_mag: f64,
        bin_width: f64,
        occurrence_rates: Vec<f64>,
    },
}

impl Mfd {
    /// Returns a reason string describing the first problem found.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Mfd::TruncatedGutenbergRichter {
                a_val,
                b_val,
                min_mag,
                max_mag,
                bin_width,
            } => {
                if !a_val.is_finite() {
                    return Err(format!("a value {a_val} is not finite"));
                }
                if !b_val.is_finite() || *b_val <= 0.0 {
                    return Err(format!("b value {b_val} must be positive"));
                }
                if !bin_width.is_finite() || *bin_width <= 0.0 {
                    return Err(format!("bin width {bin_width} must be positive"));
                }
                if !min_mag.is_finite() || !max_mag.is_finite() || min_mag >= max_mag {
                    return Err(format!("min_mag {min_mag} must be below max_mag {max_mag}"));
                }
                let bins = ((max_mag - min_mag) / bin_width).round();
                if !bins.is_finite() || bins > MAX_MAGNITUDE_BINS as f64 {
                    return Err(format!(
                        "bin width {bin_width} gives {bins} bins, more than {MAX_MAGNITUDE_BINS}"
                    ));
                }
                Ok(())
            }
            Mfd::EvenlyDiscretized {
                min_mag,
                bin_width,
                occurrence_rates,
            } => {
                if !min_mag.is_finite() {
                    return Err(format!("min_mag {min_mag} is not finite"));
                }
                if !bin_width.is_finite() || *bin_width <= 0.0 {
                    return Err(format!("bin width {bin_width} must be positive"));
                }
                if occurrence_rates.is_empty() {
                    return Err("no occurrence rates".to_string());
                }
                if let Some(bad) = occurrence_rates
                    .iter()
                    .find(|r| !r.is_finite() || **r < 0.0)
                {
                    return Err(format!("occurrence rate {bad} must be finite and non-negative"));
                }
                Ok(())
            }
        }
    }

    /// Magnitude bins with their annual rates. Assumes [`Mfd::check`] passed.
    pub fn bins(&self) -> Vec<MagnitudeBin> {
        match self {
            Mfd::TruncatedGutenbergRichter {
                a_val,
                b_val,
                min_mag,
                max_mag,
                bin_width,
            } => {
                let n = ((max_mag - min_mag) / bin_width).round().max(1.0) as usize;
                (0..n)
                    .map(|i| {
                        let lo = min_mag + i as f64 * bin_width;
                        let hi = lo + bin_width;
                        MagnitudeBin {
                            magnitude: lo + bin_width / 2.0,
                            rate: 10_f64.powf(a_val - b_val * lo) - 10_f64.powf(a_val - b_val * hi),
                        }
                    })
                    .collect()
            }
            Mfd::EvenlyDiscretized {
                min_mag,
                bin_width,
                occurrence_rates,
            } => occurrence_rates
                .iter()
                .enumerate()
                .map(|(i, &rate)| MagnitudeBin {
                    magnitude: min_mag + i as f64 * bin_width,
                    rate,
                })
                .collect(),
        }
    }

    /// Total annual rate of events above the lower magnitude.
    pub fn total_rate(&self) -> f64 {
        self.bins().iter().map(|b| b.rate).sum()
    }

    pub fn max_magnitude(&self) -> f64 {
        match self {
            Mfd::TruncatedGutenbergRichter { max_mag, .. } => *max_mag,
            Mfd::EvenlyDiscretized {
                min_mag,
                bin_width,
                occurrence_rates,
            } => min_mag + occurrence_rates.len().saturating_sub(1) as f64 * bin_width,
        }
    }

    pub fn increment_max_mag(&mut self, delta: f64) -> Result<(), String> {
        match self {
            Mfd::TruncatedGutenbergRichter { max_mag, .. } => {
                *max_mag += delta;
                self.check()
            }
            Mfd::EvenlyDiscretized { .. } => Err(gr_only("maximum magnitude")),
        }
    }

    pub fn increment_b(&mut self, delta: f64) -> Result<(), String> {
        match self {
            Mfd::TruncatedGutenbergRichter { b_val, .. } => {
                *b_val += delta;
                self.check()
            }
            Mfd::EvenlyDiscretized { .. } => Err(gr_only("b value")),
        }
    }

    pub fn set_ab(&mut self, a: f64, b: f64) -> Result<(), String> {
        match self {
            Mfd::TruncatedGutenbergRichter { a_val, b_val, .. } => {
                *a_val = a;
                *b_val = b;
                self.check()
            }
            Mfd::EvenlyDiscretized { .. } => Err(gr_only("a/b values")),
        }
    }
}

fn gr_only(what: &str) -> String {
    format!("{what} uncertainty requires a Gutenberg-Richter distribution")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gr() -> Mfd {
        Mfd::TruncatedGutenbergRichter {
            a_val: 3.0,
            b_val: 1.0,
            min_mag: 5.0,
            max_mag: 7.0,
            bin_width: 0.5,
        }
    }

    #[test]
    fn gr_bins_telescope_to_cumulative_rate() {
        let mfd = gr();
        let bins = mfd.bins();
        assert_eq!(bins.len(), 4);
        assert!((bins[0].magnitude - 5.25).abs() < 1e-12);
        let expected = 10_f64.powf(3.0 - 5.0) - 10_f64.powf(3.0 - 7.0);
        assert!((mfd.total_rate() - expected).abs() < 1e-12);
        assert!(bins.windows(2).all(|w| w[0].rate > w[1].rate));
    }

    #[test]
    fn evenly_discretized_bins() {
        let mfd = Mfd::EvenlyDiscretized {
            min_mag: 5.0,
            bin_width: 0.1,
            occurrence_rates: vec![0.01, 0.005, 0.0],
        };
        mfd.check().unwrap();
        let bins = mfd.bins();
        assert_eq!(bins.len(), 3);
        assert!((bins[2].magnitude - 5.2).abs() < 1e-12);
        assert!((mfd.total_rate() - 0.015).abs() < 1e-15);
    }

    #[test]
    fn invalid_distributions_are_reported() {
        let mut bad = gr();
        if let Mfd::TruncatedGutenbergRichter { min_mag, .. } = &mut bad {
            *min_mag = 7.5;
        }
        assert!(bad.check().is_err());

        let negative = Mfd::EvenlyDiscretized {
            min_mag: 5.0,
            bin_width: 0.1,
            occurrence_rates: vec![0.1, -0.1],
        };
        assert!(negative.check().is_err());

        let empty = Mfd::EvenlyDiscretized {
            min_mag: 5.0,
            bin_width: 0.1,
            occurrence_rates: vec![],
        };
        assert!(empty.check().is_err());
    }

    #[test]
    fn bin_count_is_bounded() {
        let fine = Mfd::TruncatedGutenbergRichter {
            a_val: 3.0,
            b_val: 1.0,
            min_mag: 5.0,
            max_mag: 7.0,
            bin_width: 1e-12,
        };
        let reason = fine.check().unwrap_err();
        assert!(reason.contains("bins"), "{reason}");

        let at_limit = Mfd::TruncatedGutenbergRichter {
            a_val: 3.0,
            b_val: 1.0,
            min_mag: 5.0,
            max_mag: 6.0,
            bin_width: 1.0 / MAX_MAGNITUDE_BINS as f64,
        };
        at_limit.check().unwrap();
        assert_eq!(at_limit.bins().len(), MAX_MAGNITUDE_BINS);
    }

    #[test]
    fn perturbations_apply_to_gr_only() {
        let mut mfd = gr();
        mfd.increment_max_mag(0.5).unwrap();
        assert_eq!(mfd.max_magnitude(), 7.5);
        mfd.increment_b(-0.2).unwrap();
        assert!(mfd.increment_b(-1.0).is_err());

        let mut even = Mfd::EvenlyDiscretized {
            min_mag: 5.0,
            bin_width: 0.1,
            occurrence_rates: vec![0.1],
        };
        assert!(even.set_ab(4.0, 1.0).is_err());
    }
}
