//! Property-based tests for artifact scoring.
//!
//! These tests verify the behavioral contracts of the scoring engine:
//! - Shape: one output per input, in input order
//! - Determinism: same inputs always produce the same scores
//! - Monotonicity: adding a satisfied criterion never lowers a score
//! - Extension classes: key files earn 40, unknown extensions earn nothing

use binfetch_core::{ScoreOptions, rank, score};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("linux".to_string()),
        Just("darwin".to_string()),
        Just("windows".to_string()),
        Just("amd64".to_string()),
        Just("arm64".to_string()),
        "[a-z]{2,8}".prop_map(String::from),
    ]
}

fn extension_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("gz".to_string()),
        Just("zip".to_string()),
        Just("txt".to_string()),
        Just("sig".to_string()),
        Just("pem".to_string()),
        Just("pub".to_string()),
        Just("unknown".to_string()),
        "[a-z]{1,4}".prop_map(String::from),
    ]
}

/// Release-style filenames: `name-os-arch[.ext]`.
fn filename_strategy() -> impl Strategy<Value = String> {
    (
        "[a-z]{2,10}",
        token_strategy(),
        token_strategy(),
        prop::option::of(extension_strategy()),
    )
        .prop_map(|(name, os, arch, ext)| match ext {
            Some(ext) => format!("{name}-{os}-{arch}.{ext}"),
            None => format!("{name}-{os}-{arch}"),
        })
}

fn options_strategy() -> impl Strategy<Value = ScoreOptions> {
    (
        prop::collection::vec(token_strategy(), 0..3),
        prop::collection::vec(token_strategy(), 0..3),
        prop::collection::vec(extension_strategy(), 0..4),
        prop::collection::vec("[a-z]{2,6}".prop_map(String::from), 0..2),
    )
        .prop_map(|(os, arch, extensions, names)| {
            ScoreOptions::new()
                .with_os(os)
                .with_arch(arch)
                .with_extensions(extensions)
                .with_names(names)
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn output_matches_input_length_and_order(
        names in prop::collection::vec(filename_strategy(), 0..12),
        opts in options_strategy(),
    ) {
        let scored = score(&names, &opts);
        prop_assert_eq!(scored.len(), names.len());
        for (candidate, name) in scored.iter().zip(&names) {
            prop_assert_eq!(&candidate.key, name);
        }
    }

    #[test]
    fn scoring_is_deterministic(
        names in prop::collection::vec(filename_strategy(), 0..12),
        opts in options_strategy(),
    ) {
        prop_assert_eq!(score(&names, &opts), score(&names, &opts));
    }

    #[test]
    fn scores_stay_within_bounds(
        name in filename_strategy(),
        opts in options_strategy(),
    ) {
        let value = score(&[name], &opts)[0].value;
        prop_assert!(value <= 35 + 35 + 40 + 10);
    }

    #[test]
    fn adding_a_criterion_never_lowers_a_score(
        name in filename_strategy(),
        opts in options_strategy(),
        extra in token_strategy(),
        extra_ext in extension_strategy(),
    ) {
        let before = score(&[name.clone()], &opts)[0].value;

        let mut os = opts.os.clone();
        os.push(extra.clone());
        let mut arch = opts.arch.clone();
        arch.push(extra.clone());
        let mut extensions = opts.extensions.clone();
        extensions.push(extra_ext);
        let mut names = opts.names.clone();
        names.push(extra);

        let widened = opts
            .clone()
            .with_os(os)
            .with_arch(arch)
            .with_extensions(extensions)
            .with_names(names);
        let after = score(&[name], &widened)[0].value;
        prop_assert!(after >= before, "{after} < {before}");
    }

    #[test]
    fn key_files_earn_exactly_forty_for_extension(
        stem in "[a-z]{2,10}",
        ext in prop_oneof![Just("pem"), Just("pub")],
    ) {
        let name = format!("{stem}.{ext}");
        let with = ScoreOptions::new().with_extensions(["pem", "pub"]);
        prop_assert_eq!(score(&[name.clone()], &with)[0].value, 40);

        let without = ScoreOptions::new().with_extensions(["gz"]);
        prop_assert_eq!(score(&[name], &without)[0].value, 0);
    }

    #[test]
    fn extensionless_names_earn_nothing_for_extension(
        stem in "[a-z]{2,10}",
        extensions in prop::collection::vec(extension_strategy(), 0..6),
    ) {
        let opts = ScoreOptions::new().with_extensions(extensions);
        prop_assert_eq!(score(&[stem], &opts)[0].value, 0);
    }

    #[test]
    fn rank_is_a_stable_descending_permutation(
        names in prop::collection::vec(filename_strategy(), 0..12),
        opts in options_strategy(),
    ) {
        let scored = score(&names, &opts);
        let ranked = rank(scored.clone());
        prop_assert_eq!(ranked.len(), scored.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
        // Equal scores keep input order.
        for value in ranked.iter().map(|c| c.value) {
            let in_input: Vec<_> = scored.iter().filter(|c| c.value == value).collect();
            let in_ranked: Vec<_> = ranked.iter().filter(|c| c.value == value).collect();
            prop_assert_eq!(in_input, in_ranked);
        }
    }
}
