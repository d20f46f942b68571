//! Heuristic next-outcome predictor for baccarat hand histories.
//!
//! The primary entrypoint is [`PredictorEngine`]. Callers keep the shoe history
//! themselves, append each dealt hand, and ask the engine for the next call:
//!
//! ```rust
//! use bigroad_predictor::{EngineConfig, PredictorEngine};
//! use bigroad_types::parse_history;
//!
//! let mut engine: PredictorEngine =
//!     PredictorEngine::with_config(EngineConfig::default().with_seed(42)).unwrap();
//! let history = parse_history("BPBBT").unwrap();
//! let prediction = engine.predict(&history, None);
//! assert!(prediction.confidence.percent() <= 100);
//! ```
//!
//! ## Determinism requirements
//! - All randomness comes from the engine's seeded source; reset reseeds it.
//! - Iteration order of collections must not influence outputs. The pattern table is a
//!   `BTreeMap` and every tie-break walks [`bigroad_types::Outcome::ALL`].
//!
//! Two profiles are available: the strict-priority [`Profile::Cascade`] (default) and
//! the weighted-voting [`Profile::Consensus`]. Both share the bootstrap rules and the
//! anti-repeat postprocess.

mod cascade;
pub mod config;
mod consensus;
mod engine;
pub mod memory;
pub mod pattern_table;
pub mod signals;

pub use config::{ConfigError, EngineConfig, MajorityStrictness, Profile};
pub use engine::PredictorEngine;
pub use memory::{BoundedLog, EngineMemory, EngineStats};
pub use pattern_table::{FollowCounts, PatternTable};
