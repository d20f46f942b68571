//! Line-oriented interactive session.

use anyhow::{Context, Result};
use bigroad_predictor::{EngineStats, PredictorEngine};
use bigroad_types::{format_history, parse_history, Outcome, ParseError, Prediction};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{debug, warn};

/// One line of session input.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionCommand {
    /// Newly dealt hands, oldest first.
    Hands(Vec<Outcome>),
    Reset,
    Stats,
    Quit,
    Blank,
}

impl FromStr for SessionCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let trimmed = line.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => return Ok(Self::Blank),
            "reset" => return Ok(Self::Reset),
            "stats" => return Ok(Self::Stats),
            "quit" | "exit" => return Ok(Self::Quit),
            _ => {}
        }
        parse_history(trimmed).map(Self::Hands)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Serialize)]
struct PredictionEvent<'a> {
    hands: usize,
    correct: Option<bool>,
    prediction: &'a Prediction,
}

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: EngineStats,
    accuracy: Option<u8>,
}

/// Single-line text rendering shared with the one-shot command.
pub fn render(prediction: &Prediction) -> String {
    format!("{prediction} via {}", prediction.methods_label())
}

pub struct Session {
    engine: PredictorEngine,
    history: Vec<Outcome>,
    json: bool,
}

impl Session {
    pub fn new(engine: PredictorEngine, json: bool) -> Self {
        Self {
            engine,
            history: Vec::new(),
            json,
        }
    }

    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    /// Process lines until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read session input")?;
            if self.handle(&line, out)? == Flow::Quit {
                break;
            }
        }
        out.flush().context("failed to flush output")?;
        Ok(())
    }

    pub fn handle(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(err) => {
                warn!(%err, "rejected session line");
                writeln!(out, "error: {err}")?;
                return Ok(Flow::Continue);
            }
        };
        match command {
            SessionCommand::Blank => {}
            SessionCommand::Quit => return Ok(Flow::Quit),
            SessionCommand::Reset => {
                self.history.clear();
                self.engine.reset();
                writeln!(out, "reset")?;
            }
            SessionCommand::Stats => self.write_stats(out)?,
            SessionCommand::Hands(hands) => {
                let Some(&first) = hands.first() else {
                    return Ok(Flow::Continue);
                };
                let correct = self.engine.record_result(first);
                self.history.extend(hands);
                debug!(history = %format_history(&self.history), "hands appended");
                let prediction = self.engine.predict(&self.history, None);
                self.write_prediction(correct, &prediction, out)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn write_prediction(
        &self,
        correct: Option<bool>,
        prediction: &Prediction,
        out: &mut impl Write,
    ) -> Result<()> {
        if self.json {
            let event = PredictionEvent {
                hands: self.history.len(),
                correct,
                prediction,
            };
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
            return Ok(());
        }
        let last = match correct {
            Some(true) => " last=hit",
            Some(false) => " last=miss",
            None => "",
        };
        writeln!(
            out,
            "hands={}{last} next={}",
            self.history.len(),
            render(prediction)
        )?;
        Ok(())
    }

    fn write_stats(&self, out: &mut impl Write) -> Result<()> {
        let stats = self.engine.stats();
        if self.json {
            let report = StatsReport {
                stats,
                accuracy: stats.accuracy_percent(),
            };
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
            return Ok(());
        }
        let accuracy = stats
            .accuracy_percent()
            .map_or_else(|| "n/a".to_string(), |pct| format!("{pct}%"));
        writeln!(
            out,
            "predictions={} reported={} correct={} accuracy={accuracy}",
            stats.predictions, stats.reported, stats.correct
        )?;
        Ok(())
    }
}
