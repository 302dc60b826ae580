//! Target locator module
//!
//! Scores classified flower candidates and selects the single best
//! pollination target: large and horizontally centred wins, with lateral
//! offset penalised more heavily than area is rewarded.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use ordered_float::OrderedFloat;

// Internal
use super::{FlowerCandidate, FlowerType};
pub use params::Params;
use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Target locator module state
#[derive(Default)]
pub struct TargetLocator {
    pub(crate) params: Params,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl TargetLocator {
    /// Initialise the target locator from its parameter file.
    pub fn init(&mut self, params_path: &str) -> Result<(), LoadError> {
        self.params = util::params::load(params_path)?;
        Ok(())
    }

    /// Build a locator directly from parameter values.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Select the best pollination target from the candidates, or `None` if
    /// no candidate of the target category is present.
    ///
    /// Score: `area - lateral_offset_weight * |centroid_x - width/2|`. The
    /// comparison is strictly-greater, so equal-score candidates resolve to
    /// the first one seen, deterministically.
    pub fn locate<'a>(
        &self,
        candidates: &'a [FlowerCandidate],
        frame_width_px: u32,
    ) -> Option<&'a FlowerCandidate> {
        let centre_x = frame_width_px as f64 / 2.0;

        let mut best: Option<(&FlowerCandidate, OrderedFloat<f64>)> = None;

        for candidate in candidates
            .iter()
            .filter(|c| c.flower_type == FlowerType::Female)
        {
            let lateral = (candidate.centroid_px.x - centre_x).abs();
            let score = OrderedFloat(
                candidate.area_px as f64 - self.params.lateral_offset_weight * lateral,
            );

            match best {
                Some((_, best_score)) if score <= best_score => (),
                _ => best = Some((candidate, score)),
            }
        }

        best.map(|(c, _)| c)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point2;

    fn candidate(flower_type: FlowerType, x: f64, area_px: u32) -> FlowerCandidate {
        FlowerCandidate {
            flower_type,
            centroid_px: Point2::new(x, 240.0),
            area_px,
            boundary_px: Vec::new(),
        }
    }

    fn locator() -> TargetLocator {
        TargetLocator::with_params(Params {
            lateral_offset_weight: 2.0,
        })
    }

    #[test]
    fn test_empty_input() {
        assert!(locator().locate(&[], 640).is_none());
    }

    #[test]
    fn test_males_are_not_targets() {
        let candidates = vec![candidate(FlowerType::Male, 320.0, 4000)];
        assert!(locator().locate(&candidates, 640).is_none());
    }

    #[test]
    fn test_centred_beats_larger_offset() {
        // Candidate 0: area 2000, centred -> score 2000
        // Candidate 1: area 2400, 250 px off centre -> score 1900
        let candidates = vec![
            candidate(FlowerType::Female, 320.0, 2000),
            candidate(FlowerType::Female, 570.0, 2400),
        ];

        let best = locator().locate(&candidates, 640).unwrap();
        assert_eq!(best.area_px, 2000);
    }

    #[test]
    fn test_tie_break_is_first_seen() {
        // Identical score either way round: the first in input order wins
        let a = candidate(FlowerType::Female, 300.0, 2000);
        let b = candidate(FlowerType::Female, 340.0, 2000);

        let fwd = vec![a.clone(), b.clone()];
        let rev = vec![b, a];

        let best_fwd = locator().locate(&fwd, 640).unwrap();
        let best_rev = locator().locate(&rev, 640).unwrap();

        assert_eq!(best_fwd.centroid_px.x, 300.0);
        assert_eq!(best_rev.centroid_px.x, 340.0);
    }

    #[test]
    fn test_selected_area_within_band() {
        // Candidates reaching the locator have already passed the area band;
        // the selection must preserve that
        let candidates = vec![
            candidate(FlowerType::Female, 100.0, 600),
            candidate(FlowerType::Female, 320.0, 4900),
        ];

        let best = locator().locate(&candidates, 640).unwrap();
        assert!(best.area_px >= 500 && best.area_px <= 5000);
    }
}
