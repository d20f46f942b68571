//! Common types shared by the bigroad predictor and its front-ends.
//!
//! A baccarat shoe is recorded as an ordered [`Outcome`] history (index 0 is the
//! earliest hand). The predictor reads that history and answers with a
//! [`Prediction`].

mod outcome;
mod prediction;

pub use outcome::{format_history, parse_history, parse_history_lenient, Outcome, ParseError};
pub use prediction::{Confidence, Method, Prediction};
