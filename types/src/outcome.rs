use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Errors produced when decoding a textual hand history.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid outcome {found:?} at position {position} (expected B, P or T)")]
    InvalidOutcome { found: char, position: usize },
    #[error("empty outcome")]
    Empty,
}

/// Result of a single baccarat hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Outcome {
    Banker = 0,
    Player = 1,
    Tie = 2,
}

impl Outcome {
    /// Canonical order. Every tie-break in the predictor walks outcomes in this order.
    pub const ALL: [Self; 3] = [Self::Banker, Self::Player, Self::Tie];

    /// The two non-tie sides.
    pub const SIDES: [Self; 2] = [Self::Banker, Self::Player];

    /// Switch side: Banker and Player swap, Tie falls back to Banker.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Banker => Self::Player,
            Self::Player | Self::Tie => Self::Banker,
        }
    }

    #[must_use]
    pub const fn is_tie(self) -> bool {
        matches!(self, Self::Tie)
    }

    /// Single-letter code (`B`, `P`, `T`).
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Banker => 'B',
            Self::Player => 'P',
            Self::Tie => 'T',
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Banker => "Banker",
            Self::Player => "Player",
            Self::Tie => "Tie",
        }
    }

    /// Dense index matching [`Outcome::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<char> for Outcome {
    type Error = ParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            'B' => Ok(Self::Banker),
            'P' => Ok(Self::Player),
            'T' => Ok(Self::Tie),
            found => Err(ParseError::InvalidOutcome { found, position: 0 }),
        }
    }
}

impl FromStr for Outcome {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "banker" => return Ok(Self::Banker),
            "player" => return Ok(Self::Player),
            "tie" => return Ok(Self::Tie),
            _ => {}
        }
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::try_from(c),
            (None, _) => Err(ParseError::Empty),
            (Some(_), Some(found)) => Err(ParseError::InvalidOutcome { found, position: 1 }),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strictly parse a history string such as `"BPBBT"`.
///
/// Whitespace and commas are accepted as separators; any other character is an error.
pub fn parse_history(input: &str) -> Result<Vec<Outcome>, ParseError> {
    let mut out = Vec::with_capacity(input.len());
    for (position, c) in input.chars().enumerate() {
        if c.is_whitespace() || c == ',' {
            continue;
        }
        let outcome = Outcome::try_from(c)
            .map_err(|_| ParseError::InvalidOutcome { found: c, position })?;
        out.push(outcome);
    }
    Ok(out)
}

/// Parse a history string, silently dropping anything that is not `B`, `P` or `T`
/// (case-insensitive).
pub fn parse_history_lenient(input: &str) -> Vec<Outcome> {
    input
        .chars()
        .filter_map(|c| Outcome::try_from(c).ok())
        .collect()
}

/// Render a history back into its compact letter form.
pub fn format_history(history: &[Outcome]) -> String {
    history.iter().map(|o| o.code()).collect()
}
