//! Strict-priority rule cascade.
//!
//! Rules are evaluated in [`CASCADE`] order and the first one that produces a
//! [`Prediction`] wins. Every rule reads the history through the pure detectors in
//! [`crate::signals`] and the engine memory through [`Context`]; only the random
//! source is mutated.

use crate::{
    config::{EngineConfig, ANTI_REPEAT_WINDOW},
    memory::EngineMemory,
    signals::{
        alternating_tie, anti_streak, cluster_tie, forgotten, irregular_tie, local_bias,
        long_run_switch, loose_tie, majority_bias, overall_bias, soft_bias,
        strictly_alternating, ultra_local_bias,
    },
};
use bigroad_types::{Confidence, Method, Outcome, Prediction};
use rand::Rng;

/// Everything a rule may look at while deciding.
pub(crate) struct Context<'a, R> {
    pub history: &'a [Outcome],
    /// `history` with ties removed.
    pub non_tie: Vec<Outcome>,
    pub memory: &'a EngineMemory,
    pub config: &'a EngineConfig,
    pub rng: &'a mut R,
    /// Most recent predictions, oldest first (at most [`ANTI_REPEAT_WINDOW`]).
    pub last3: Vec<Outcome>,
}

impl<'a, R: Rng> Context<'a, R> {
    pub fn new(
        history: &'a [Outcome],
        memory: &'a EngineMemory,
        config: &'a EngineConfig,
        rng: &'a mut R,
    ) -> Self {
        Self {
            history,
            non_tie: crate::signals::non_tie(history),
            memory,
            config,
            rng,
            last3: memory.recent_predictions().last_n(ANTI_REPEAT_WINDOW),
        }
    }

    /// Last `n` correctness reports were all misses.
    fn failing(&self, n: usize) -> bool {
        self.memory.recent_failures(n)
    }

    fn recently_predicted(&self, outcome: Outcome) -> bool {
        self.last3.contains(&outcome)
    }

    /// The full anti-repeat window holds a single outcome.
    fn repeating(&self) -> Option<Outcome> {
        match self.last3.as_slice() {
            [a, b, c] if a == b && b == c => Some(*a),
            _ => None,
        }
    }

    pub fn random_side(&mut self) -> Outcome {
        if self.rng.gen_bool(0.5) {
            Outcome::Banker
        } else {
            Outcome::Player
        }
    }

    /// `(last, previous)` non-tie hands.
    fn last_two_sides(&self) -> Option<(Outcome, Outcome)> {
        match self.non_tie.as_slice() {
            [.., prev, last] => Some((*last, *prev)),
            _ => None,
        }
    }
}

/// A single cascade stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rule {
    EmptyHistory,
    Bootstrap,
    FailureAdaptive,
    LongRunReversal { min_run: usize, min_hands: usize },
    AlternatingTie,
    LooseTie,
    PatternVoting,
    AntiStreak { min_run: usize },
    UltraEarlyAlternation,
    IrregularTie,
    ClusterTie,
    MajorityBias,
    ForgottenRecovery,
    AdaptiveFallback,
}

/// Canonical evaluation order.
pub(crate) const CASCADE: &[Rule] = &[
    Rule::EmptyHistory,
    Rule::Bootstrap,
    Rule::FailureAdaptive,
    Rule::LongRunReversal {
        min_run: 5,
        min_hands: 8,
    },
    Rule::AlternatingTie,
    Rule::LooseTie,
    Rule::PatternVoting,
    Rule::AntiStreak { min_run: 4 },
    Rule::UltraEarlyAlternation,
    Rule::IrregularTie,
    Rule::ClusterTie,
    Rule::MajorityBias,
    Rule::ForgottenRecovery,
    Rule::AdaptiveFallback,
];

/// Rules shared by every profile before any voting takes place.
pub(crate) const OPENING: &[Rule] = &[Rule::EmptyHistory, Rule::Bootstrap];

/// Evaluate `rules` in order and return the first match with the rule that made it.
pub(crate) fn first_match<R: Rng>(
    rules: &[Rule],
    ctx: &mut Context<'_, R>,
) -> Option<(Rule, Prediction)> {
    rules
        .iter()
        .find_map(|rule| rule.evaluate(ctx).map(|prediction| (*rule, prediction)))
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Self::EmptyHistory => "empty_history",
            Self::Bootstrap => "bootstrap",
            Self::FailureAdaptive => "failure_adaptive",
            Self::LongRunReversal { .. } => "long_run_reversal",
            Self::AlternatingTie => "alternating_tie",
            Self::LooseTie => "loose_tie",
            Self::PatternVoting => "pattern_voting",
            Self::AntiStreak { .. } => "anti_streak",
            Self::UltraEarlyAlternation => "ultra_early_alternation",
            Self::IrregularTie => "irregular_tie",
            Self::ClusterTie => "cluster_tie",
            Self::MajorityBias => "majority_bias",
            Self::ForgottenRecovery => "forgotten_recovery",
            Self::AdaptiveFallback => "adaptive_fallback",
        }
    }

    pub fn evaluate<R: Rng>(self, ctx: &mut Context<'_, R>) -> Option<Prediction> {
        match self {
            Self::EmptyHistory => empty_history(ctx),
            Self::Bootstrap => bootstrap(ctx.history),
            Self::FailureAdaptive => failure_adaptive(ctx),
            Self::LongRunReversal { min_run, min_hands } => {
                long_run_reversal(ctx, min_run, min_hands)
            }
            Self::AlternatingTie => alternating_tie(ctx.history).then(|| {
                Prediction::new(Outcome::Tie, 67, "AlternatingTie", &[Method::AlternatingTie])
            }),
            Self::LooseTie => loose_tie(ctx.history).then(|| {
                Prediction::new(Outcome::Tie, 63, "LooseTiePattern", &[Method::LooseTie])
            }),
            Self::PatternVoting => pattern_voting(ctx),
            Self::AntiStreak { min_run } => {
                let (pick, run) = anti_streak(ctx.history, min_run)?;
                (!ctx.recently_predicted(pick)).then(|| {
                    Prediction::new(
                        pick,
                        72,
                        format!("AntiStreak({run})"),
                        &[Method::AntiStreak, Method::StrongPattern],
                    )
                })
            }
            Self::UltraEarlyAlternation => {
                if !strictly_alternating(&ctx.non_tie, 3) {
                    return None;
                }
                let pick = ctx.non_tie.last()?.flip();
                (!ctx.recently_predicted(pick)).then(|| {
                    Prediction::new(
                        pick,
                        67,
                        "UltraEarlyAlternating",
                        &[Method::Alternating, Method::UltraEarlyPattern],
                    )
                })
            }
            Self::IrregularTie => irregular_tie(ctx.history).then(|| {
                Prediction::new(Outcome::Tie, 64, "IrregularTie", &[Method::IrregularTie])
            }),
            Self::ClusterTie => cluster_tie(ctx.history).map(|trailing| {
                Prediction::new(
                    Outcome::Tie,
                    66,
                    format!("UltraEarlyClusterTie({trailing})"),
                    &[Method::ClusterTie, Method::UltraEarlyPattern],
                )
            }),
            Self::MajorityBias => majority(ctx),
            Self::ForgottenRecovery => forgotten(ctx.history).map(|outcome| {
                Prediction::new(outcome, 60, "ForgottenRecovery", &[Method::Forgotten])
            }),
            Self::AdaptiveFallback => Some(adaptive_fallback(ctx)),
        }
    }
}

fn empty_history<R: Rng>(ctx: &mut Context<'_, R>) -> Option<Prediction> {
    if !ctx.history.is_empty() {
        return None;
    }
    Some(Prediction::new(
        ctx.random_side(),
        50,
        "Random(EmptyHistory)",
        &[Method::Random],
    ))
}

/// Fixed responses for the first three hands of a shoe.
fn bootstrap(history: &[Outcome]) -> Option<Prediction> {
    match *history {
        [Outcome::Tie] => Some(Prediction::new(
            Outcome::Tie,
            70,
            "ProactiveFirstHandTie",
            &[Method::Proactive, Method::FirstHandTie],
        )),
        [first] => Some(Prediction::new(
            first.flip(),
            68,
            "ProactiveFirstHandAlternating",
            &[Method::Proactive, Method::FirstHandAlternating],
        )),
        [a, b] => Some(two_hand(a, b)),
        [a, b, c] => Some(three_hand(a, b, c)),
        _ => None,
    }
}

fn two_hand(a: Outcome, b: Outcome) -> Prediction {
    use Outcome::Tie;
    match (a, b) {
        (Tie, Tie) => Prediction::new(
            Tie,
            72,
            "Proactive2Tie",
            &[Method::Proactive, Method::TwoTie],
        ),
        (a, b) if !a.is_tie() && !b.is_tie() && a != b => Prediction::new(
            b.flip(),
            71,
            "Proactive2HandAlternating",
            &[Method::Proactive, Method::TwoHandAlternating],
        ),
        (a, b) if a == b => Prediction::new(
            b,
            70,
            "Proactive2HandBias",
            &[Method::Proactive, Method::TwoHandBias],
        ),
        _ => Prediction::new(
            Tie,
            69,
            "Proactive2HandTie",
            &[Method::Proactive, Method::TwoHandTie],
        ),
    }
}

fn three_hand(a: Outcome, b: Outcome, c: Outcome) -> Prediction {
    let hands = [a, b, c];
    let ties = hands.iter().filter(|o| o.is_tie()).count();
    if ties >= 2 {
        return Prediction::new(
            Outcome::Tie,
            69,
            "Proactive3HandClusterTie",
            &[Method::Proactive, Method::ThreeHandClusterTie],
        );
    }
    // A tie among the latest two hands is answered by the two-hand rules.
    if b.is_tie() || c.is_tie() {
        return two_hand(b, c);
    }
    if ties == 0 && a != b && b != c && a == c {
        return Prediction::new(
            a.flip(),
            70,
            "Proactive3HandAlternating",
            &[Method::Proactive, Method::ThreeHandAlternating],
        );
    }
    for side in Outcome::SIDES {
        if hands.iter().filter(|o| **o == side).count() >= 2 {
            return Prediction::new(
                side,
                68,
                format!("Proactive3HandBias{}", side.code()),
                &[Method::Proactive, Method::ThreeHandBias, Method::Bias],
            );
        }
    }
    two_hand(b, c)
}

fn failure_adaptive<R: Rng>(ctx: &mut Context<'_, R>) -> Option<Prediction> {
    if !ctx.failing(ctx.config.emergency_failures) {
        return None;
    }
    if let Some(outcome) = forgotten(ctx.history) {
        return Some(Prediction::new(
            outcome,
            64,
            "ForgottenRecovery(AfterMistakes)",
            &[Method::Forgotten, Method::MistakeAdaptive],
        ));
    }
    let mut pick = ctx.random_side();
    if let Some(repeated) = ctx.repeating() {
        pick = repeated.flip();
    } else if ctx.recently_predicted(pick) {
        pick = pick.flip();
    }
    Some(Prediction::new(
        pick,
        56,
        "MistakeAdaptiveAntiRepeat",
        &[Method::MistakeAdaptive, Method::NoRepeat, Method::Diversity],
    ))
}

fn long_run_reversal<R: Rng>(
    ctx: &mut Context<'_, R>,
    min_run: usize,
    min_hands: usize,
) -> Option<Prediction> {
    let switch = long_run_switch(ctx.history, min_run, min_hands)?;
    if let Some(side) = ultra_local_bias(ctx.history) {
        return Some(Prediction::new(
            side,
            73,
            format!("LongRunSwitchUltraLocalBias({})", side.code()),
            &[Method::LongRunSwitch, Method::UltraLocalBias],
        ));
    }
    let failing = ctx.failing(2);
    if failing {
        if let Some(outcome) = forgotten(ctx.history) {
            return Some(Prediction::new(
                outcome,
                65,
                "ForgottenRecovery(AfterRunSwitchFail)",
                &[Method::Forgotten, Method::RunSwitchFallback, Method::Diversity],
            ));
        }
    }
    let (last, prev) = ctx.last_two_sides()?;
    let mut pick = last.flip();
    if failing && ctx.recently_predicted(pick) {
        pick = pick.flip();
    }
    let prediction = if last != prev {
        Prediction::new(
            pick,
            66,
            format!("LongRunSwitchAlternating({})", switch.run),
            &[Method::LongRunSwitch, Method::Alternating],
        )
    } else {
        Prediction::new(
            pick,
            64,
            format!("LongRunSwitchAnti({})", switch.run),
            &[Method::LongRunSwitch, Method::AntiSwitch],
        )
    };
    Some(prediction)
}

/// Short patterns are trusted more than long ones.
fn pattern_weight(len: usize) -> f64 {
    let boost = if len <= 4 { 3.5 } else { 1.0 };
    boost * (len + 1) as f64
}

fn pattern_voting<R: Rng>(ctx: &Context<'_, R>) -> Option<Prediction> {
    let mut scores = [0.0f64; 3];
    let mut matches = 0usize;
    for (len, counts) in ctx.memory.pattern_table().suffix_matches(ctx.history) {
        let seen = counts.total();
        let eligible = if len <= 4 { seen >= 1 } else { seen > 1 };
        if !eligible {
            continue;
        }
        matches += 1;
        let weight = pattern_weight(len);
        for outcome in Outcome::ALL {
            scores[outcome.index()] += counts.get(outcome) as f64 * weight;
        }
    }
    if matches == 0 {
        return None;
    }

    // Stable sort keeps canonical order between equal scores.
    let mut ranked = Outcome::ALL;
    ranked.sort_by(|a, b| scores[b.index()].total_cmp(&scores[a.index()]));
    let pick = ranked
        .iter()
        .copied()
        .find(|o| !ctx.recently_predicted(*o))
        .unwrap_or(ranked[0]);
    let score = scores[pick.index()];
    if score <= 0.0 {
        return None;
    }
    Some(Prediction::scored(
        pick,
        Confidence::from_score(72.0 + score.min(28.0)),
        format!("PatternVoting(matches={matches})"),
        &[
            Method::PatternMemory,
            Method::Voting,
            Method::UltraEarlyShortPattern,
        ],
    ))
}

/// Bias detectors in the order the majority rule consults them.
#[derive(Clone, Copy, Debug)]
enum BiasCheck {
    Overall(usize),
    Local(usize),
    Soft(usize),
}

const BIAS_BATTERY: &[BiasCheck] = &[
    BiasCheck::Overall(10),
    BiasCheck::Overall(20),
    BiasCheck::Overall(30),
    BiasCheck::Overall(50),
    BiasCheck::Local(4),
    BiasCheck::Local(6),
    BiasCheck::Local(8),
    BiasCheck::Local(12),
    BiasCheck::Soft(12),
    BiasCheck::Soft(16),
    BiasCheck::Soft(20),
];

impl BiasCheck {
    fn detect(self, history: &[Outcome]) -> Option<Outcome> {
        match self {
            Self::Overall(window) => overall_bias(history, window),
            Self::Local(window) => local_bias(history, window),
            Self::Soft(window) => soft_bias(history, window),
        }
    }
}

fn majority<R: Rng>(ctx: &Context<'_, R>) -> Option<Prediction> {
    let side = BIAS_BATTERY.iter().find_map(|check| {
        check
            .detect(ctx.history)
            .filter(|side| majority_bias(ctx.history, *side, ctx.config.majority))
    })?;
    Some(Prediction::new(
        side,
        67,
        format!("UltimateBiasMajority({})", side.code()),
        &[
            Method::Bias,
            Method::MajorityBias,
            Method::UltimateBias,
            Method::LocalBias,
        ],
    ))
}

/// Which step of the fallback produced the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FallbackStep {
    Forgotten,
    LocalBias,
    ShortAlternation,
    SwitchingContinuation,
    FailureReversal,
    Diversity,
}

impl FallbackStep {
    fn as_str(self) -> &'static str {
        match self {
            Self::Forgotten => "Forgotten",
            Self::LocalBias => "LocalBias",
            Self::ShortAlternation => "ShortAlternation",
            Self::SwitchingContinuation => "SwitchingContinuation",
            Self::FailureReversal => "FailureReversal",
            Self::Diversity => "Diversity",
        }
    }
}

fn fallback_pick<R: Rng>(ctx: &mut Context<'_, R>) -> (FallbackStep, Outcome) {
    let fresh = |o: &Outcome| !ctx.last3.contains(o);
    let absent = forgotten(ctx.history);

    if let Some(outcome) = absent.filter(fresh) {
        return (FallbackStep::Forgotten, outcome);
    }
    if let Some(side) = local_bias(ctx.history, 4)
        .or_else(|| local_bias(ctx.history, 6))
        .filter(fresh)
    {
        return (FallbackStep::LocalBias, side);
    }
    if strictly_alternating(&ctx.non_tie, 3) {
        if let Some(alt) = ctx.non_tie.last().map(|o| o.flip()).filter(fresh) {
            return (FallbackStep::ShortAlternation, alt);
        }
    }
    if let [.., fourth, third, prev, last] = *ctx.non_tie.as_slice() {
        let switching = last != prev && (prev != third || fourth == last);
        if ctx.non_tie.len() >= 6 && switching && fresh(&last.flip()) {
            return (FallbackStep::SwitchingContinuation, last.flip());
        }
    }
    if ctx.failing(2) {
        if let Some(outcome) = absent {
            return (FallbackStep::FailureReversal, outcome);
        }
        if let Some(alt) = ctx.non_tie.last().map(|o| o.flip()).filter(fresh) {
            return (FallbackStep::FailureReversal, alt);
        }
    }

    let previous = (ctx.last3.len() >= 2).then(|| ctx.last3.last().copied()).flatten();
    let pool: Vec<Outcome> = Outcome::ALL
        .into_iter()
        .filter(|o| Some(*o) != previous)
        .collect();
    let outcome = pool[ctx.rng.gen_range(0..pool.len())];
    (FallbackStep::Diversity, outcome)
}

fn adaptive_fallback<R: Rng>(ctx: &mut Context<'_, R>) -> Prediction {
    let (step, mut outcome) = fallback_pick(ctx);
    if let Some(repeated) = ctx.repeating() {
        outcome = repeated.flip();
    }
    Prediction::new(
        outcome,
        60,
        format!("AdaptiveFallback({})", step.as_str()),
        &[
            Method::ProactiveSwitching,
            Method::NoRepeat,
            Method::Diversity,
        ],
    )
}
