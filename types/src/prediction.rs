use crate::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer confidence percentage.
///
/// Not a calibrated probability. Every constructor clamps into `0..=100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    pub fn new(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    /// Round a fractional score to the nearest percent.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return Self::MIN;
        }
        Self(score.round().clamp(0.0, 100.0) as u8)
    }

    /// Clamp into an inclusive sub-range of `0..=100`.
    #[must_use]
    pub fn clamp_to(self, min: u8, max: u8) -> Self {
        Self(self.0.clamp(min, max.min(100)))
    }

    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl From<u8> for Confidence {
    fn from(value: u8) -> Self {
        Self::new(value as i64)
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Heuristic-category tags attached to a prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Proactive,
    FirstHandTie,
    FirstHandAlternating,
    #[serde(rename = "2Tie")]
    TwoTie,
    #[serde(rename = "2HandAlternating")]
    TwoHandAlternating,
    #[serde(rename = "2HandBias")]
    TwoHandBias,
    #[serde(rename = "2HandTie")]
    TwoHandTie,
    #[serde(rename = "3HandBias")]
    ThreeHandBias,
    #[serde(rename = "3HandAlternating")]
    ThreeHandAlternating,
    #[serde(rename = "3HandClusterTie")]
    ThreeHandClusterTie,
    Random,
    Forgotten,
    MistakeAdaptive,
    NoRepeat,
    Diversity,
    LongRunSwitch,
    UltraLocalBias,
    RunSwitchFallback,
    Alternating,
    AntiSwitch,
    AlternatingTie,
    LooseTie,
    PatternMemory,
    Voting,
    UltraEarlyShortPattern,
    AntiStreak,
    StrongPattern,
    UltraEarlyPattern,
    IrregularTie,
    ClusterTie,
    Bias,
    MajorityBias,
    UltimateBias,
    LocalBias,
    ProactiveSwitching,
    StreakReversal,
    Cycle,
    RunSwitch,
    AlternatingDeep,
    TieCadence,
    Cluster,
    Consensus,
    AntiRepeatOverride,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proactive => "Proactive",
            Self::FirstHandTie => "FirstHandTie",
            Self::FirstHandAlternating => "FirstHandAlternating",
            Self::TwoTie => "2Tie",
            Self::TwoHandAlternating => "2HandAlternating",
            Self::TwoHandBias => "2HandBias",
            Self::TwoHandTie => "2HandTie",
            Self::ThreeHandBias => "3HandBias",
            Self::ThreeHandAlternating => "3HandAlternating",
            Self::ThreeHandClusterTie => "3HandClusterTie",
            Self::Random => "Random",
            Self::Forgotten => "Forgotten",
            Self::MistakeAdaptive => "MistakeAdaptive",
            Self::NoRepeat => "NoRepeat",
            Self::Diversity => "Diversity",
            Self::LongRunSwitch => "LongRunSwitch",
            Self::UltraLocalBias => "UltraLocalBias",
            Self::RunSwitchFallback => "RunSwitchFallback",
            Self::Alternating => "Alternating",
            Self::AntiSwitch => "AntiSwitch",
            Self::AlternatingTie => "AlternatingTie",
            Self::LooseTie => "LooseTie",
            Self::PatternMemory => "PatternMemory",
            Self::Voting => "Voting",
            Self::UltraEarlyShortPattern => "UltraEarlyShortPattern",
            Self::AntiStreak => "AntiStreak",
            Self::StrongPattern => "StrongPattern",
            Self::UltraEarlyPattern => "UltraEarlyPattern",
            Self::IrregularTie => "IrregularTie",
            Self::ClusterTie => "ClusterTie",
            Self::Bias => "Bias",
            Self::MajorityBias => "MajorityBias",
            Self::UltimateBias => "UltimateBias",
            Self::LocalBias => "LocalBias",
            Self::ProactiveSwitching => "ProactiveSwitching",
            Self::StreakReversal => "StreakReversal",
            Self::Cycle => "Cycle",
            Self::RunSwitch => "RunSwitch",
            Self::AlternatingDeep => "AlternatingDeep",
            Self::TieCadence => "TieCadence",
            Self::Cluster => "Cluster",
            Self::Consensus => "Consensus",
            Self::AntiRepeatOverride => "AntiRepeatOverride",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single next-hand call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub outcome: Outcome,
    pub confidence: Confidence,
    /// Which detector fired, including its parameters (e.g. `AntiStreak(4)`).
    pub pattern: String,
    /// Heuristic categories that contributed, in order.
    pub methods: Vec<Method>,
}

impl Prediction {
    pub fn new(outcome: Outcome, confidence: u8, pattern: impl Into<String>, methods: &[Method]) -> Self {
        Self::scored(outcome, Confidence::from(confidence), pattern, methods)
    }

    pub fn scored(
        outcome: Outcome,
        confidence: Confidence,
        pattern: impl Into<String>,
        methods: &[Method],
    ) -> Self {
        Self {
            outcome,
            confidence,
            pattern: pattern.into(),
            methods: methods.to_vec(),
        }
    }

    /// Render the method tags as a comma-separated list.
    pub fn methods_label(&self) -> String {
        self.methods
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) [{}]",
            self.outcome, self.confidence, self.pattern
        )
    }
}
