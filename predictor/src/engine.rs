use crate::{
    cascade::{first_match, Context, CASCADE, OPENING},
    config::{ConfigError, EngineConfig, Profile},
    consensus,
    memory::{EngineMemory, EngineStats},
};
use bigroad_types::{Method, Outcome, Prediction};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, trace};

/// Stateful next-outcome predictor.
///
/// The engine never owns the history: callers pass the full shoe on every call.
/// All randomness comes from `R`, seeded from [`EngineConfig::seed`], so two engines
/// built from the same configuration and fed the same calls agree exactly.
#[derive(Debug)]
pub struct PredictorEngine<R = StdRng> {
    config: EngineConfig,
    seed: u64,
    rng: R,
    memory: EngineMemory,
    /// Outcome of the last issued prediction that has not been scored yet.
    pending: Option<Outcome>,
}

impl PredictorEngine<StdRng> {
    /// Engine with the default configuration and an entropy seed.
    pub fn new() -> Self {
        Self::from_valid(EngineConfig::default())
    }
}

impl Default for PredictorEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + SeedableRng> PredictorEngine<R> {
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: EngineConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            rng: R::seed_from_u64(seed),
            memory: EngineMemory::new(config.prediction_capacity, config.correctness_capacity),
            seed,
            config,
            pending: None,
        }
    }

    /// Predict the hand after `history`.
    ///
    /// `last_outcome_was_correct` scores the previous prediction before anything else
    /// happens. Never fails: short or unremarkable histories route to fallbacks.
    pub fn predict(
        &mut self,
        history: &[Outcome],
        last_outcome_was_correct: Option<bool>,
    ) -> Prediction {
        if let Some(correct) = last_outcome_was_correct {
            self.record_correctness(correct);
        }

        self.memory.pattern_table.rebuild(history);
        trace!(
            hands = history.len(),
            patterns = self.memory.pattern_table.len(),
            "rebuilt pattern table"
        );

        let (rule, prediction) = {
            let mut ctx = Context::new(history, &self.memory, &self.config, &mut self.rng);
            match self.config.profile {
                Profile::Cascade => match first_match(CASCADE, &mut ctx) {
                    Some((rule, prediction)) => (rule.name(), prediction),
                    None => ("random", random(&mut ctx)),
                },
                Profile::Consensus => match first_match(OPENING, &mut ctx) {
                    Some((rule, prediction)) => (rule.name(), prediction),
                    None => ("consensus", consensus::vote(&mut ctx)),
                },
            }
        };

        let prediction = self.finish(prediction);
        debug!(
            rule,
            outcome = %prediction.outcome,
            confidence = prediction.confidence.percent(),
            pattern = %prediction.pattern,
            hands = history.len(),
            "prediction"
        );
        prediction
    }

    /// Anti-repeat postprocess shared by every profile.
    fn finish(&mut self, mut prediction: Prediction) -> Prediction {
        if self.memory.would_triple(prediction.outcome) {
            prediction.outcome = prediction.outcome.flip();
            prediction.methods.push(Method::AntiRepeatOverride);
        }
        self.memory.record_prediction(prediction.outcome);
        self.pending = Some(prediction.outcome);
        prediction
    }

    /// Report whether the previous prediction was correct.
    pub fn record_correctness(&mut self, correct: bool) {
        self.memory.record_correctness(correct);
        self.pending = None;
    }

    /// Score the outstanding prediction against the hand that was actually dealt.
    ///
    /// Returns `None` (and records nothing) when no prediction is outstanding.
    pub fn record_result(&mut self, actual: Outcome) -> Option<bool> {
        let predicted = self.pending.take()?;
        let correct = predicted == actual;
        self.memory.record_correctness(correct);
        Some(correct)
    }

    /// Forget everything and reseed, as if freshly constructed.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.rng = R::seed_from_u64(self.seed);
        self.pending = None;
        info!(seed = self.seed, "predictor reset");
    }

    pub fn memory(&self) -> &EngineMemory {
        &self.memory
    }

    pub fn stats(&self) -> EngineStats {
        self.memory.stats()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seed actually in use (drawn from entropy when the config left it unset).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn last_prediction(&self) -> Option<Outcome> {
        self.memory.recent_predictions().last()
    }
}

fn random<R: Rng>(ctx: &mut Context<'_, R>) -> Prediction {
    Prediction::new(ctx.random_side(), 50, "Random(NoSignal)", &[Method::Random])
}
