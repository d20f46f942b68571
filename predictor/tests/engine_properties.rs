//! Behavioural properties of the predictor engine.
//!
//! Every engine here is seeded so the random fallbacks are reproducible.

use bigroad_predictor::{EngineConfig, MajorityStrictness, PredictorEngine, Profile};
use bigroad_types::{parse_history, Outcome};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn engine(seed: u64) -> PredictorEngine {
    PredictorEngine::with_config(EngineConfig::default().with_seed(seed))
        .expect("default config is valid")
}

fn history(s: &str) -> Vec<Outcome> {
    parse_history(s).expect("valid history")
}

fn random_history(rng: &mut impl Rng, len: usize) -> Vec<Outcome> {
    (0..len)
        .map(|_| match rng.gen_range(0..100) {
            0..=44 => Outcome::Banker,
            45..=89 => Outcome::Player,
            _ => Outcome::Tie,
        })
        .collect()
}

#[test]
fn test_empty_history_is_random_side() {
    for seed in 0..16 {
        let prediction = engine(seed).predict(&[], None);
        assert!(!prediction.outcome.is_tie());
        assert_eq!(prediction.confidence.percent(), 50);
        assert_eq!(prediction.pattern, "Random(EmptyHistory)");
    }
}

#[test]
fn test_first_hand_tie() {
    let prediction = engine(1).predict(&history("T"), None);
    assert_eq!(prediction.outcome, Outcome::Tie);
    assert_eq!(prediction.confidence.percent(), 70);
    assert!(prediction.pattern.contains("FirstHandTie"));
}

#[test]
fn test_first_hand_banker_switches() {
    let prediction = engine(1).predict(&history("B"), None);
    assert_eq!(prediction.outcome, Outcome::Player);
    assert_eq!(prediction.confidence.percent(), 68);
}

#[test]
fn test_anti_streak_after_unrelated_prediction() {
    let mut engine = engine(5);
    // Two bankers: bias call for Banker.
    assert_eq!(engine.predict(&history("BB"), None).outcome, Outcome::Banker);

    let prediction = engine.predict(&history("PPBBBB"), None);
    assert_eq!(prediction.outcome, Outcome::Player);
    assert_eq!(prediction.confidence.percent(), 72);
    assert_eq!(prediction.pattern, "AntiStreak(4)");
}

#[test]
fn test_majority_bias_isolated() {
    let mut engine = engine(6);
    assert_eq!(engine.predict(&history("B"), None).outcome, Outcome::Player);

    // Last 7 non-tie hands are B B B B B P B.
    let prediction = engine.predict(&history("PBBBBBPB"), None);
    assert_eq!(prediction.outcome, Outcome::Banker);
    assert_eq!(prediction.confidence.percent(), 67);
}

#[test]
fn test_forgotten_tie_after_failures() {
    let mut engine = engine(7);
    for _ in 0..3 {
        engine.record_correctness(false);
    }
    let prediction = engine.predict(&history("BPPBBPBPBB"), None);
    assert_eq!(prediction.outcome, Outcome::Tie);
    assert!((64..=65).contains(&prediction.confidence.percent()));
}

#[test]
fn test_failures_reported_through_predict() {
    let mut engine = engine(8);
    let shoe = history("BPPBBPBPBB");
    engine.predict(&shoe[..8], None);
    engine.predict(&shoe[..9], Some(false));
    engine.predict(&shoe[..9], Some(false));
    let prediction = engine.predict(&shoe, Some(false));
    assert_eq!(prediction.outcome, Outcome::Tie);
    assert_eq!(prediction.pattern, "ForgottenRecovery(AfterMistakes)");
    assert_eq!(engine.stats().reported, 3);
    assert_eq!(engine.stats().accuracy_percent(), Some(0));
}

#[test]
fn test_loose_majority_accepts_four_of_seven() {
    // Banker holds 4 of the last 7 and 3 of the last 5: enough only when loose.
    let shoe = history("PBBPBPB");
    let predict = |majority| {
        let config = EngineConfig {
            majority,
            seed: Some(1),
            ..Default::default()
        };
        let mut engine: PredictorEngine = PredictorEngine::with_config(config).unwrap();
        assert_eq!(engine.predict(&history("B"), None).outcome, Outcome::Player);
        engine.predict(&shoe, None)
    };

    let loose = predict(MajorityStrictness::Loose);
    assert_eq!(loose.outcome, Outcome::Banker);
    assert_eq!(loose.confidence.percent(), 67);
    assert_eq!(loose.pattern, "UltimateBiasMajority(B)");

    let strict = predict(MajorityStrictness::Strict);
    assert_eq!(strict.outcome, Outcome::Tie);
    assert_eq!(strict.confidence.percent(), 60);
    assert_eq!(strict.pattern, "ForgottenRecovery");
}

#[test]
fn test_reset_matches_fresh_engine() {
    let mut used = engine(11);
    let mut rng = StdRng::seed_from_u64(11);
    for len in 0..30 {
        let shoe = random_history(&mut rng, len);
        used.predict(&shoe, Some(len % 3 == 0));
    }
    used.reset();

    let mut fresh = engine(11);
    assert_eq!(used.predict(&[], None), fresh.predict(&[], None));
    assert_eq!(used.stats(), fresh.stats());
}

#[test]
fn test_same_seed_same_calls_agree() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let shoe = random_history(&mut rng, 80);
    for profile in [Profile::Cascade, Profile::Consensus] {
        let config = EngineConfig::default().with_seed(21).with_profile(profile);
        let mut b: PredictorEngine<ChaCha8Rng> = PredictorEngine::with_config(config.clone()).unwrap();
        let mut c: PredictorEngine<ChaCha8Rng> = PredictorEngine::with_config(config).unwrap();
        for end in 0..=shoe.len() {
            let correct = end % 2 == 0;
            assert_eq!(
                b.predict(&shoe[..end], Some(correct)),
                c.predict(&shoe[..end], Some(correct)),
                "diverged at {end} under {profile}"
            );
        }
    }
}

#[test]
fn test_session_never_repeats_three_times() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let shoe = random_history(&mut rng, 200);
    let mut engine = engine(5);
    for end in 0..=shoe.len() {
        engine.predict(&shoe[..end], None);
        if end < shoe.len() {
            engine.record_result(shoe[end]);
        }
        let recent = engine.memory().recent_predictions().last_n(3);
        assert!(
            recent.len() < 3 || !(recent[0] == recent[1] && recent[1] == recent[2]),
            "three identical predictions at hand {end}: {recent:?}"
        );
    }
    assert_eq!(engine.stats().predictions, shoe.len() as u64 + 1);
    assert_eq!(engine.stats().reported, shoe.len() as u64);
}

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Banker),
        Just(Outcome::Player),
        Just(Outcome::Tie),
    ]
}

proptest! {
    #[test]
    fn prop_prediction_is_well_formed(
        shoe in prop::collection::vec(outcome_strategy(), 0..120),
        seed in any::<u64>(),
        consensus in any::<bool>(),
    ) {
        let profile = if consensus { Profile::Consensus } else { Profile::Cascade };
        let config = EngineConfig::default().with_seed(seed).with_profile(profile);
        let mut engine: PredictorEngine = PredictorEngine::with_config(config).unwrap();
        for end in 0..=shoe.len() {
            let prediction = engine.predict(&shoe[..end], None);
            prop_assert!(prediction.confidence.percent() <= 100);
            prop_assert!(!prediction.pattern.is_empty());
            prop_assert!(!prediction.methods.is_empty());
        }
    }

    #[test]
    fn prop_no_three_identical_predictions(
        shoe in prop::collection::vec(outcome_strategy(), 1..80),
        reports in prop::collection::vec(any::<bool>(), 80),
        seed in any::<u64>(),
    ) {
        let mut engine = engine(seed);
        for end in 1..=shoe.len() {
            engine.predict(&shoe[..end], Some(reports[end - 1]));
            let recent = engine.memory().recent_predictions().last_n(3);
            prop_assert!(recent.len() < 3 || recent[0] != recent[1] || recent[1] != recent[2]);
        }
    }

    #[test]
    fn prop_bounded_logs_respect_capacity(
        shoe in prop::collection::vec(outcome_strategy(), 0..60),
        capacity in 3usize..8,
    ) {
        let config = EngineConfig {
            prediction_capacity: capacity,
            correctness_capacity: capacity,
            seed: Some(0),
            ..Default::default()
        };
        let mut engine: PredictorEngine = PredictorEngine::with_config(config).unwrap();
        for end in 0..=shoe.len() {
            engine.predict(&shoe[..end], Some(end % 2 == 1));
            prop_assert!(engine.memory().recent_predictions().len() <= capacity);
            prop_assert!(engine.memory().recent_correctness().len() <= capacity);
        }
    }
}
