//! Property checks on the scoring primitives.

use narrative_intel::analysis::readiness::weighted_overall;
use narrative_intel::config::ReadinessWeights;
use narrative_intel::models::{COMPETITION_OPPOSITIONS, CORE_OPPOSITIONS, Frame, opposes};
use narrative_intel::scoring::{self, Boundary, STANDARD_BANDS};
use proptest::prelude::*;

fn any_frame() -> impl Strategy<Value = Frame> {
    prop_oneof![
        Just(Frame::Opportunity),
        Just(Frame::Threat),
        Just(Frame::Tool),
        Just(Frame::Replacement),
        Just(Frame::Partnership),
        Just(Frame::Experiment),
        Just(Frame::Mandate),
        Just(Frame::Neutral),
        Just(Frame::Unknown),
        "[a-z]{3,8}".prop_map(Frame::Other),
    ]
}

proptest! {
    #[test]
    fn polarity_ratio_stays_in_unit_range(positive in 0usize..500, negative in 0usize..500) {
        let ratio = scoring::polarity_ratio(positive, negative);
        prop_assert!((0.0..=1.0).contains(&ratio));
        if positive + negative == 0 {
            prop_assert_eq!(ratio, scoring::NEUTRAL);
        }
    }

    #[test]
    fn classify_is_monotone(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let labels = [0usize, 1, 2, 3];
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_band = scoring::classify(low, &STANDARD_BANDS, &labels, Boundary::AtLeast);
        let high_band = scoring::classify(high, &STANDARD_BANDS, &labels, Boundary::AtLeast);
        // Lower index means a higher band.
        prop_assert!(high_band <= low_band);
    }

    #[test]
    fn clamp_unit_never_escapes(value in proptest::num::f64::ANY) {
        let clamped = scoring::clamp_unit(value);
        prop_assert!((0.0..=1.0).contains(&clamped));
    }

    #[test]
    fn oppositions_are_symmetric(a in any_frame(), b in any_frame()) {
        for table in [&CORE_OPPOSITIONS[..], &COMPETITION_OPPOSITIONS[..]] {
            prop_assert_eq!(opposes(&a, &b, table), opposes(&b, &a, table));
        }
        prop_assert!(!opposes(&a, &a, &COMPETITION_OPPOSITIONS));
    }

    #[test]
    fn readiness_overall_is_bounded_and_monotone(
        scores in proptest::array::uniform6(0.0f64..=1.0),
        dimension in 0usize..6,
        bump in 0.0f64..=1.0,
    ) {
        let weights = ReadinessWeights::default();
        let overall = weighted_overall(&weights, &scores);
        prop_assert!((-1e-9..=1.0 + 1e-9).contains(&overall));

        let mut raised = scores;
        raised[dimension] = (raised[dimension] + bump).min(1.0);
        prop_assert!(weighted_overall(&weights, &raised) >= overall - 1e-12);
    }

    #[test]
    fn uniform_scores_reproduce_themselves(score in 0.0f64..=1.0) {
        let overall = weighted_overall(&ReadinessWeights::default(), &[score; 6]);
        prop_assert!((overall - score).abs() < 1e-9);
    }
}
