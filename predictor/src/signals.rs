//! Pure detectors over an outcome history.
//!
//! Nothing in here touches engine memory. Windows are taken from the end of the
//! history; when the history is shorter than the window the whole history is used.

use crate::config::MajorityStrictness;
use bigroad_types::Outcome;

/// Hands inspected by the "forgotten outcome" rules.
pub const FORGOTTEN_WINDOW: usize = 8;

/// Last `n` entries of `seq` (all of it when shorter).
pub fn tail<T>(seq: &[T], n: usize) -> &[T] {
    &seq[seq.len().saturating_sub(n)..]
}

/// History with ties removed.
pub fn non_tie(history: &[Outcome]) -> Vec<Outcome> {
    history.iter().copied().filter(|o| !o.is_tie()).collect()
}

/// Length of the run of identical values at the end of `seq`.
pub fn trailing_run(seq: &[Outcome]) -> usize {
    match seq.last() {
        Some(last) => seq.iter().rev().take_while(|o| *o == last).count(),
        None => 0,
    }
}

/// Run-length encoding, oldest run first.
pub fn runs(seq: &[Outcome]) -> Vec<(Outcome, usize)> {
    let mut out: Vec<(Outcome, usize)> = Vec::new();
    for &outcome in seq {
        match out.last_mut() {
            Some((side, len)) if *side == outcome => *len += 1,
            _ => out.push((outcome, 1)),
        }
    }
    out
}

/// Count of `target` in `seq`.
pub fn count(seq: &[Outcome], target: Outcome) -> usize {
    seq.iter().filter(|o| **o == target).count()
}

/// True when the last `len` entries of `seq` strictly alternate.
pub fn strictly_alternating(seq: &[Outcome], len: usize) -> bool {
    seq.len() >= len && tail(seq, len).windows(2).all(|pair| pair[0] != pair[1])
}

/// Every outcome missing from the last `window` hands, in canonical order.
pub fn absent_outcomes(history: &[Outcome], window: usize) -> Vec<Outcome> {
    let recent = tail(history, window);
    Outcome::ALL
        .into_iter()
        .filter(|o| !recent.contains(o))
        .collect()
}

/// First outcome missing from the last [`FORGOTTEN_WINDOW`] hands.
pub fn forgotten(history: &[Outcome]) -> Option<Outcome> {
    absent_outcomes(history, FORGOTTEN_WINDOW).into_iter().next()
}

/// Side whose non-tie share over the last `window` hands passes `accept`.
///
/// `accept(side_count, total)` is only called once the window holds at least
/// `min_total` non-tie hands. Banker is checked first.
fn side_bias(
    history: &[Outcome],
    window: usize,
    min_total: usize,
    accept: impl Fn(usize, usize) -> bool,
) -> Option<Outcome> {
    let recent = tail(history, window);
    let banker = count(recent, Outcome::Banker);
    let player = count(recent, Outcome::Player);
    let total = banker + player;
    if total < min_total {
        return None;
    }
    if accept(banker, total) {
        return Some(Outcome::Banker);
    }
    if accept(player, total) {
        return Some(Outcome::Player);
    }
    None
}

/// `count / total > percent / 100` without floating point.
fn share_above(count: usize, total: usize, percent: usize) -> bool {
    count * 100 > total * percent
}

/// Very short-window bias: windows of 4, 5 and 6 hands, share above 66%.
pub fn ultra_local_bias(history: &[Outcome]) -> Option<Outcome> {
    [4, 5, 6]
        .into_iter()
        .find_map(|window| side_bias(history, window, 3, |c, t| share_above(c, t, 66)))
}

/// Local bias: at least 6 non-tie hands in the window, share above 62%.
pub fn local_bias(history: &[Outcome], window: usize) -> Option<Outcome> {
    side_bias(history, window, 6, |c, t| share_above(c, t, 62))
}

/// Soft bias: at least 8 non-tie hands, share in (54%, 58%].
pub fn soft_bias(history: &[Outcome], window: usize) -> Option<Outcome> {
    side_bias(history, window, 8, |c, t| {
        share_above(c, t, 54) && !share_above(c, t, 58)
    })
}

/// Overall bias: at least 10 non-tie hands, share above 58%.
pub fn overall_bias(history: &[Outcome], window: usize) -> Option<Outcome> {
    side_bias(history, window, 10, |c, t| share_above(c, t, 58))
}

/// Whether `side` dominates the last 5 or 7 non-tie hands.
pub fn majority_bias(history: &[Outcome], side: Outcome, strictness: MajorityStrictness) -> bool {
    let sides = non_tie(history);
    let in_seven = count(tail(&sides, 7), side);
    let in_five = count(tail(&sides, 5), side);
    match strictness {
        MajorityStrictness::Strict => in_seven >= 5 || in_five >= 4,
        MajorityStrictness::Loose => in_seven >= 4 || in_five >= 3,
    }
}

/// A long run on the non-tie road together with the switch around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongRunSwitch {
    /// Length of the long run.
    pub run: usize,
    /// Side before the switch.
    pub from: Outcome,
    /// Side after the switch.
    pub to: Outcome,
}

/// Long run (at least `min_run`) that is either still running after a different
/// side, or has just been broken by the trailing run.
///
/// Requires `min_hands` non-tie hands.
pub fn long_run_switch(history: &[Outcome], min_run: usize, min_hands: usize) -> Option<LongRunSwitch> {
    let sides = non_tie(history);
    if sides.len() < min_hands {
        return None;
    }
    let road = runs(&sides);
    let [.., (before, before_len), (last, last_len)] = road.as_slice() else {
        return None;
    };
    if *last_len >= min_run {
        return Some(LongRunSwitch {
            run: *last_len,
            from: *before,
            to: *last,
        });
    }
    if *before_len >= min_run {
        return Some(LongRunSwitch {
            run: *before_len,
            from: *before,
            to: *last,
        });
    }
    None
}

/// Ties alternating with non-ties over the last 6 hands (`XTXTXT` or `TXTXTX`).
pub fn alternating_tie(history: &[Outcome]) -> bool {
    if history.len() < 6 {
        return false;
    }
    let recent = tail(history, 6);
    let phase = |tie_on_even: bool| {
        recent
            .iter()
            .enumerate()
            .all(|(i, o)| o.is_tie() == ((i % 2 == 0) == tie_on_even))
    };
    phase(true) || phase(false)
}

/// Offsets of ties inside the last `window` hands.
fn tie_offsets(history: &[Outcome], window: usize) -> Vec<usize> {
    tail(history, window)
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.is_tie().then_some(i))
        .collect()
}

/// At least two ties in the last 7 hands, every gap exactly 2 or 3.
pub fn loose_tie(history: &[Outcome]) -> bool {
    let ties = tie_offsets(history, 7);
    ties.len() >= 2 && ties.windows(2).all(|w| matches!(w[1] - w[0], 2 | 3))
}

/// Two to four ties in the last 7 hands that are not one contiguous block.
pub fn irregular_tie(history: &[Outcome]) -> bool {
    let ties = tie_offsets(history, 7);
    (2..=4).contains(&ties.len()) && ties.windows(2).any(|w| w[1] - w[0] > 1)
}

/// Ties at the very end of the history.
pub fn trailing_ties(history: &[Outcome]) -> usize {
    history.iter().rev().take_while(|o| o.is_tie()).count()
}

/// Tie cluster: two or more trailing ties, or two ties among the last 3 hands.
///
/// Returns the trailing tie count when it fires.
pub fn cluster_tie(history: &[Outcome]) -> Option<usize> {
    let trailing = trailing_ties(history);
    if trailing >= 2 || count(tail(history, 3), Outcome::Tie) >= 2 {
        return Some(trailing);
    }
    None
}

/// Trailing non-tie streak of at least `min_run`, with the side that breaks it.
pub fn anti_streak(history: &[Outcome], min_run: usize) -> Option<(Outcome, usize)> {
    let sides = non_tie(history);
    let last = *sides.last()?;
    let run = trailing_run(&sides);
    (sides.len() >= min_run && run >= min_run).then_some((last.flip(), run))
}

// ----------------------------------------------------------------------------
// Signals used by the consensus profile.
// ----------------------------------------------------------------------------

/// Run of at least 4 on the non-tie road that replaced a different side.
///
/// Only fires when the latest hand is not a tie.
pub fn run_switch(history: &[Outcome]) -> Option<LongRunSwitch> {
    let last = *history.last()?;
    if last.is_tie() {
        return None;
    }
    let sides = non_tie(history);
    let run = trailing_run(&sides);
    if run < 4 {
        return None;
    }
    let before = *sides.len().checked_sub(run + 1).and_then(|i| sides.get(i))?;
    (before != last).then_some(LongRunSwitch {
        run,
        from: before,
        to: last,
    })
}

/// Last 6 non-tie hands alternate.
pub fn alternating_deep(history: &[Outcome]) -> bool {
    strictly_alternating(&non_tie(history), 6)
}

/// Regular tie spacing across the whole history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TieCadence {
    /// Mean distance between ties.
    pub average: f64,
    /// Index at which the next tie is expected.
    pub next_index: usize,
}

/// At least three ties whose gaps stay within one hand of their mean (mean 2..=5).
pub fn tie_cadence(history: &[Outcome]) -> Option<TieCadence> {
    let ties: Vec<usize> = history
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.is_tie().then_some(i))
        .collect();
    if ties.len() < 3 {
        return None;
    }
    let gaps: Vec<f64> = ties.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let average = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let consistent = gaps.iter().all(|gap| (gap - average).abs() <= 1.0);
    if !consistent || !(2.0..=5.0).contains(&average) {
        return None;
    }
    let last_tie = *ties.last()?;
    Some(TieCadence {
        average,
        next_index: last_tie + average.round() as usize,
    })
}

/// Cluster at the end of the raw history: 3–4 identical hands, or 2+ trailing ties.
pub fn outcome_cluster(history: &[Outcome]) -> Option<(Outcome, usize)> {
    let last = *history.last()?;
    let run = trailing_run(history);
    if (3..=4).contains(&run) || (last.is_tie() && run >= 2) {
        return Some((last, run));
    }
    None
}

/// Streak-reversal strength on the raw history.
///
/// Returns `(reversal side, strength 0..=90, streak length)`.
pub fn streak_reversal(history: &[Outcome]) -> Option<(Outcome, u32, usize)> {
    let last = *history.last()?;
    let streak = trailing_run(history);
    let strength = match streak {
        s if s >= 5 => (60 + (s as u32 - 5) * 5).min(90),
        s if s >= 3 => 45 + (s as u32 - 3) * 10,
        _ => 0,
    };
    Some((last.flip(), strength, streak))
}

/// A block that repeats back-to-back somewhere in the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycle {
    pub block: Vec<Outcome>,
    /// How many times the block was immediately repeated.
    pub frequency: usize,
    /// `min(85, 20 × frequency)`.
    pub strength: u32,
    /// Block entry aligned with the next hand index.
    pub prediction: Outcome,
}

/// Most frequent immediately-repeated block of length 2..=min(8, n/3).
///
/// Ties in frequency keep the first block found (shorter blocks, earlier start).
pub fn repeating_cycle(history: &[Outcome]) -> Option<Cycle> {
    let max_len = (history.len() / 3).min(8);
    let mut seen: Vec<(&[Outcome], usize)> = Vec::new();
    for len in 2..=max_len {
        for start in 0..=(history.len() - len * 2) {
            let block = &history[start..start + len];
            if block != &history[start + len..start + len * 2] {
                continue;
            }
            match seen.iter_mut().find(|(b, _)| *b == block) {
                Some((_, freq)) => *freq += 1,
                None => seen.push((block, 1)),
            }
        }
    }
    let mut best: Option<(&[Outcome], usize)> = None;
    for (block, freq) in seen {
        if best.map_or(true, |(_, top)| freq > top) {
            best = Some((block, freq));
        }
    }
    let (block, frequency) = best?;
    Some(Cycle {
        block: block.to_vec(),
        frequency,
        strength: (frequency as u32 * 20).min(85),
        prediction: block[history.len() % block.len()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigroad_types::parse_history;

    fn h(s: &str) -> Vec<Outcome> {
        parse_history(s).unwrap()
    }

    #[test]
    fn test_trailing_run_and_runs() {
        assert_eq!(trailing_run(&[]), 0);
        assert_eq!(trailing_run(&h("PBBB")), 3);
        assert_eq!(
            runs(&h("BBPTT")),
            vec![(Outcome::Banker, 2), (Outcome::Player, 1), (Outcome::Tie, 2)]
        );
    }

    #[test]
    fn test_absent_outcomes() {
        assert_eq!(absent_outcomes(&h("BPBPBPBP"), 8), vec![Outcome::Tie]);
        // Tie outside the 8-hand window does not count.
        assert_eq!(forgotten(&h("TBPBPBPBP")), Some(Outcome::Tie));
        assert_eq!(forgotten(&h("BPTBPBPB")), None);
        assert_eq!(forgotten(&[]), Some(Outcome::Banker));
    }

    #[test]
    fn test_biases() {
        assert_eq!(ultra_local_bias(&h("PPBBB")), Some(Outcome::Banker));
        assert_eq!(ultra_local_bias(&h("BPBP")), None);
        // 5 of 6 banker passes local 62%.
        assert_eq!(local_bias(&h("BBBBPB"), 6), Some(Outcome::Banker));
        // Too few non-tie hands.
        assert_eq!(local_bias(&h("BBBB"), 4), None);
        // 6 of 10 banker is exactly 60%: overall > 58% passes.
        assert_eq!(overall_bias(&h("BBBBBBPPPP"), 10), Some(Outcome::Banker));
        // 9 of 16 = 56.25% is inside the soft band.
        assert_eq!(soft_bias(&h("BBBBBBBBBPPPPPPP"), 16), Some(Outcome::Banker));
        // 10 of 16 = 62.5% is above it.
        assert_eq!(soft_bias(&h("BBBBBBBBBBPPPPPP"), 16), None);
    }

    #[test]
    fn test_majority_bias() {
        let history = h("BBBBBPB");
        assert!(majority_bias(&history, Outcome::Banker, MajorityStrictness::Strict));
        assert!(!majority_bias(&history, Outcome::Player, MajorityStrictness::Strict));
        let loose = h("BBPPBPB");
        assert!(!majority_bias(&loose, Outcome::Banker, MajorityStrictness::Strict));
        assert!(majority_bias(&loose, Outcome::Banker, MajorityStrictness::Loose));
    }

    #[test]
    fn test_long_run_switch() {
        // Long run still running after a different side.
        assert_eq!(
            long_run_switch(&h("PPPBBBBB"), 5, 8),
            Some(LongRunSwitch {
                run: 5,
                from: Outcome::Player,
                to: Outcome::Banker
            })
        );
        // Long run just broken.
        assert_eq!(
            long_run_switch(&h("PPBBBBBBP"), 5, 8),
            Some(LongRunSwitch {
                run: 6,
                from: Outcome::Banker,
                to: Outcome::Player
            })
        );
        // Not enough non-tie hands.
        assert_eq!(long_run_switch(&h("PBBBBBT"), 5, 8), None);
        // One side only: nothing switched.
        assert_eq!(long_run_switch(&h("BBBBBBBB"), 5, 8), None);
        assert_eq!(long_run_switch(&h("PBPBPBPB"), 5, 8), None);
    }

    #[test]
    fn test_tie_shapes() {
        assert!(alternating_tie(&h("BTPTBT")));
        assert!(alternating_tie(&h("TBTPTB")));
        assert!(!alternating_tie(&h("BTPTBB")));
        assert!(!alternating_tie(&h("TBTPT")));

        assert!(loose_tie(&h("BTBBTBB")));
        assert!(!loose_tie(&h("BTTBBBB")));

        assert!(irregular_tie(&h("TBBTBBB")));
        assert!(!irregular_tie(&h("BBTTBBB")));
        assert!(!irregular_tie(&h("BBBBBBT")));

        assert_eq!(cluster_tie(&h("BPTT")), Some(2));
        assert_eq!(cluster_tie(&h("BTPT")), Some(1));
        assert_eq!(cluster_tie(&h("TPBT")), None);
        assert_eq!(cluster_tie(&h("BTTP")), Some(0));
    }

    #[test]
    fn test_anti_streak() {
        assert_eq!(anti_streak(&h("PBTBBTB"), 4), Some((Outcome::Player, 4)));
        assert_eq!(anti_streak(&h("PBBB"), 4), None);
        assert_eq!(anti_streak(&h("TTTT"), 4), None);
    }

    #[test]
    fn test_run_switch() {
        assert_eq!(
            run_switch(&h("PBTBBB")),
            Some(LongRunSwitch {
                run: 4,
                from: Outcome::Player,
                to: Outcome::Banker
            })
        );
        assert_eq!(run_switch(&h("BBBB")), None);
        assert_eq!(run_switch(&h("PBBBBT")), None);
    }

    #[test]
    fn test_tie_cadence() {
        let cadence = tie_cadence(&h("BTBBTBBTB")).unwrap();
        assert_eq!(cadence.average, 3.0);
        assert_eq!(cadence.next_index, 10);
        assert!(tie_cadence(&h("TTTB")).is_none());
        assert!(tie_cadence(&h("TBBBBBBTBT")).is_none());
    }

    #[test]
    fn test_streak_reversal_strength() {
        assert_eq!(streak_reversal(&h("PBBBBB")), Some((Outcome::Player, 60, 5)));
        assert_eq!(streak_reversal(&h("BPPPP")), Some((Outcome::Banker, 55, 4)));
        assert_eq!(streak_reversal(&h("BBBBBBBBBBBB")).map(|r| r.1), Some(90));
        assert_eq!(streak_reversal(&h("BP")).map(|r| r.1), Some(0));
        assert_eq!(streak_reversal(&[]), None);
    }

    #[test]
    fn test_repeating_cycle() {
        let history = h("BPBPBPBPB");
        let cycle = repeating_cycle(&history).unwrap();
        assert_eq!(cycle.block, h("BP"));
        assert_eq!(cycle.frequency, 3);
        assert_eq!(cycle.strength, 60);
        assert_eq!(cycle.prediction, Outcome::Player);
        assert!(repeating_cycle(&h("BPT")).is_none());
    }

    #[test]
    fn test_outcome_cluster() {
        assert_eq!(outcome_cluster(&h("PBBB")), Some((Outcome::Banker, 3)));
        assert_eq!(outcome_cluster(&h("PBBBBB")), None);
        assert_eq!(outcome_cluster(&h("BTT")), Some((Outcome::Tie, 2)));
    }
}
