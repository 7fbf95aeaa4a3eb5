//! Property-based tests for runlens
//!
//! - Downsampling length, endpoints and determinism
//! - Step-union combination with null gaps
//! - Order-preserving alias resolution
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use runlens::downsample::{reduce, sample_indices};
use runlens::reconcile::{choose_richer, combine, DatasetChoice, MetricSeries};
use runlens::schema::{resolve_tag, TagMatch};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Generate a series with unique steps and arbitrary values
fn arb_series(name: &'static str) -> impl Strategy<Value = MetricSeries> {
    proptest::collection::btree_map(0u64..2_000, -100.0f64..100.0, 0..60)
        .prop_map(move |samples| MetricSeries::new(name, samples))
}

/// Generate a list of distinct tag names
fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[A-Za-z]{1,8}/[A-Za-z]{1,12}", 2..12)
        .prop_map(|set| set.into_iter().collect())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Downsampling Properties
    // ========================================================================

    /// Property: output length is min(L, M)
    #[test]
    fn prop_downsample_length(len in 0usize..3_000, max_points in 0usize..600) {
        prop_assert_eq!(sample_indices(len, max_points).len(), len.min(max_points));
    }

    /// Property: first and last original points survive
    #[test]
    fn prop_downsample_keeps_endpoints(len in 1usize..3_000, max_points in 2usize..600) {
        let xs: Vec<usize> = (0..len).collect();
        let ys: Vec<f64> = xs.iter().map(|x| *x as f64 * 0.5).collect();
        let (rx, ry) = reduce(&xs, &ys, max_points);

        prop_assert_eq!(rx.first(), Some(&0));
        prop_assert_eq!(rx.last(), Some(&(len - 1)));
        prop_assert_eq!(ry.len(), rx.len());
    }

    /// Property: indices are strictly increasing and in range
    #[test]
    fn prop_downsample_indices_increasing(len in 1usize..5_000, max_points in 1usize..800) {
        let indices = sample_indices(len, max_points);
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(indices.iter().all(|i| *i < len));
    }

    /// Property: same input, same output
    #[test]
    fn prop_downsample_deterministic(ys in proptest::collection::vec(-1e6f64..1e6, 0..1_000), max_points in 1usize..200) {
        let xs: Vec<usize> = (0..ys.len()).collect();
        prop_assert_eq!(reduce(&xs, &ys, max_points), reduce(&xs, &ys, max_points));
    }

    // ========================================================================
    // Combination Properties
    // ========================================================================

    /// Property: combined steps are exactly the union of member steps
    #[test]
    fn prop_combine_step_union(a in arb_series("a"), b in arb_series("b"), c in arb_series("c")) {
        let combined = combine(&[("a", Some(&a)), ("b", Some(&b)), ("missing", None), ("c", Some(&c))]);

        let expected: BTreeSet<u64> = a.steps().chain(b.steps()).chain(c.steps()).collect();
        let actual: Vec<u64> = combined.records().iter().map(|r| r.step).collect();
        prop_assert_eq!(actual, expected.into_iter().collect::<Vec<_>>());
    }

    /// Property: a slot holds the member's own sample or null, never a filler
    #[test]
    fn prop_combine_null_where_unsampled(a in arb_series("a"), b in arb_series("b")) {
        let combined = combine(&[("a", Some(&a)), ("b", Some(&b))]);
        let a_samples: BTreeMap<u64, f64> = a.points().iter().map(|p| (p.step, p.value)).collect();
        let b_samples: BTreeMap<u64, f64> = b.points().iter().map(|p| (p.step, p.value)).collect();

        for record in combined.records() {
            prop_assert_eq!(record.values[0], a_samples.get(&record.step).copied());
            prop_assert_eq!(record.values[1], b_samples.get(&record.step).copied());
        }
        for row in 0..combined.len() {
            prop_assert_eq!(combined.value(row, "missing"), None);
        }
    }

    /// Property: the richer dataset is chosen, ties keep the existing one
    #[test]
    fn prop_choose_richer(existing in 0usize..1_000, fresh in 0usize..1_000) {
        let choice = choose_richer(Some(existing), fresh);
        if fresh > existing {
            prop_assert_eq!(choice, DatasetChoice::UseFresh);
        } else {
            prop_assert_eq!(choice, DatasetChoice::KeepExisting);
        }
    }

    // ========================================================================
    // Alias Resolution Properties
    // ========================================================================

    /// Property: of two available aliases, the earlier-listed one wins
    #[test]
    fn prop_alias_order_preserved(tags in arb_tags(), i in any::<prop::sample::Index>(), j in any::<prop::sample::Index>()) {
        let first = i.get(&tags).clone();
        let second = j.get(&tags).clone();
        prop_assume!(first != second);

        let available: BTreeSet<String> = tags.iter().cloned().collect();
        let candidates = vec!["Not/Present".to_string(), first.clone(), second.clone()];
        prop_assert_eq!(resolve_tag(&candidates, None, &available), TagMatch::Exact(first));
    }

    /// Property: without a fallback, unknown candidates never match
    #[test]
    fn prop_alias_no_match(tags in arb_tags()) {
        let available: BTreeSet<String> = tags.into_iter().collect();
        prop_assert_eq!(resolve_tag(&["0/none"], None, &available), TagMatch::NoMatch);
    }
}
