//! Weighted-voting profile.
//!
//! After the shared opening rules, every signal casts a weighted vote instead of
//! short-circuiting. The winner's share of all votes becomes the confidence.

use crate::{
    cascade::Context,
    signals::{
        alternating_deep, outcome_cluster, overall_bias, repeating_cycle, run_switch,
        streak_reversal, tie_cadence,
    },
};
use bigroad_types::{Confidence, Method, Outcome, Prediction};
use rand::Rng;

/// Points shared out by the pattern-memory signal.
const PATTERN_SHARE: f64 = 35.0;
const STREAK_MIN_STRENGTH: u32 = 70;
const STREAK_WEIGHT: f64 = 0.25;
const CYCLE_MIN_STRENGTH: u32 = 60;
const CYCLE_WEIGHT: f64 = 0.20;
const BIAS_WINDOW: usize = 30;
const BIAS_VOTE: f64 = 20.0;
const RUN_SWITCH_VOTE: f64 = 15.0;
const ALTERNATING_VOTE: f64 = 20.0;
const TIE_CADENCE_VOTE: f64 = 25.0;
const CLUSTER_VOTE: f64 = 10.0;

#[derive(Default)]
struct Ballot {
    scores: [f64; 3],
    voters: [Vec<Method>; 3],
}

impl Ballot {
    fn cast(&mut self, outcome: Outcome, weight: f64, method: Method) {
        if weight <= 0.0 {
            return;
        }
        self.scores[outcome.index()] += weight;
        self.voters[outcome.index()].push(method);
    }

    fn total(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// Highest score, earliest in canonical order on ties.
    fn winner(&self) -> Outcome {
        let mut best = Outcome::Banker;
        for outcome in Outcome::ALL {
            if self.scores[outcome.index()] > self.scores[best.index()] {
                best = outcome;
            }
        }
        best
    }
}

/// Pattern-memory share: every trailing match counts `count × (len + 1)`.
fn pattern_votes<R: Rng>(ctx: &Context<'_, R>, ballot: &mut Ballot) {
    let mut raw = [0.0f64; 3];
    for (len, counts) in ctx.memory.pattern_table().suffix_matches(ctx.history) {
        for outcome in Outcome::ALL {
            raw[outcome.index()] += counts.get(outcome) as f64 * (len + 1) as f64;
        }
    }
    let sum: f64 = raw.iter().sum();
    if sum <= 0.0 {
        return;
    }
    for outcome in Outcome::ALL {
        ballot.cast(
            outcome,
            raw[outcome.index()] / sum * PATTERN_SHARE,
            Method::PatternMemory,
        );
    }
}

fn collect<R: Rng>(ctx: &Context<'_, R>) -> Ballot {
    let history = ctx.history;
    let mut ballot = Ballot::default();

    pattern_votes(ctx, &mut ballot);

    if let Some((outcome, strength, _)) = streak_reversal(history) {
        if strength > STREAK_MIN_STRENGTH {
            ballot.cast(outcome, strength as f64 * STREAK_WEIGHT, Method::StreakReversal);
        }
    }
    if let Some(cycle) = repeating_cycle(history) {
        if cycle.strength > CYCLE_MIN_STRENGTH {
            ballot.cast(
                cycle.prediction,
                cycle.strength as f64 * CYCLE_WEIGHT,
                Method::Cycle,
            );
        }
    }
    if let Some(side) = overall_bias(history, BIAS_WINDOW) {
        ballot.cast(side, BIAS_VOTE, Method::Bias);
    }
    if let Some(switch) = run_switch(history) {
        ballot.cast(switch.to.flip(), RUN_SWITCH_VOTE, Method::RunSwitch);
    }
    if alternating_deep(history) {
        if let Some(last) = ctx.non_tie.last() {
            ballot.cast(last.flip(), ALTERNATING_VOTE, Method::AlternatingDeep);
        }
    }
    if let Some(cadence) = tie_cadence(history) {
        if cadence.next_index == history.len() {
            ballot.cast(Outcome::Tie, TIE_CADENCE_VOTE, Method::TieCadence);
        }
    }
    if let Some((outcome, _)) = outcome_cluster(history) {
        ballot.cast(outcome, CLUSTER_VOTE, Method::Cluster);
    }
    ballot
}

/// Tally every signal and turn the winner's share into a prediction.
pub(crate) fn vote<R: Rng>(ctx: &mut Context<'_, R>) -> Prediction {
    let ballot = collect(ctx);
    let total = ballot.total();
    if total <= 0.0 {
        return Prediction::new(ctx.random_side(), 50, "Random(NoSignal)", &[Method::Random]);
    }

    let winner = ballot.winner();
    let share = ballot.scores[winner.index()] / total;
    let confidence = Confidence::from_score(share * 100.0);
    let confidence = if winner.is_tie() {
        confidence.clamp_to(45, 85)
    } else {
        confidence.clamp_to(55, 95)
    };

    let voters = &ballot.voters[winner.index()];
    let mut methods = Vec::with_capacity(voters.len() + 1);
    methods.push(Method::Consensus);
    methods.extend(voters.iter().copied());
    Prediction::scored(
        winner,
        confidence,
        format!("Consensus(signals={})", voters.len()),
        &methods,
    )
}
