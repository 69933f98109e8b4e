//! Text-driven controller over a single [`Chain`].
//!
//! Each input line is one user action (`add`, `tamper`, `repair`, `mine`,
//! `validate`, `show`). The session applies it to the chain and renders the
//! result as text, the way the visual block explorer re-renders after every
//! click.

use crate::chain::Chain;
use crate::config::SimulatorConfig;
use crate::error::{ChainError, Result};
use crate::mining::MiningConfig;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// A parsed session line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Tamper { index: u64, payload: String },
    /// `None` repairs from the earliest tampered block.
    Repair(Option<u64>),
    Mine(String),
    Validate { json: bool },
    Show { index: Option<u64>, json: bool },
}

impl FromStr for Command {
    type Err = ChainError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "add" => Ok(Command::Add(required_payload("add", rest)?)),
            "mine" => Ok(Command::Mine(required_payload("mine", rest)?)),
            "tamper" => {
                let (index, payload) = match rest.split_once(char::is_whitespace) {
                    Some((index, payload)) => (index, payload.trim()),
                    None => (rest, ""),
                };
                Ok(Command::Tamper {
                    index: parse_index(index)?,
                    payload: payload.into(),
                })
            }
            "repair" | "fix" => Ok(Command::Repair(optional_index(rest)?)),
            "validate" | "verify" => {
                let (rest, json) = take_json_flag(rest);
                if !rest.is_empty() {
                    return Err(ChainError::Command(format!(
                        "validate takes no arguments: {:?}",
                        rest
                    )));
                }
                Ok(Command::Validate { json })
            }
            "show" => {
                let (rest, json) = take_json_flag(rest);
                Ok(Command::Show {
                    index: optional_index(&rest)?,
                    json,
                })
            }
            "" => Err(ChainError::Command("empty command".into())),
            other => Err(ChainError::Command(format!("unknown command: {}", other))),
        }
    }
}

/// Renders the command back in script syntax.
impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Add(payload) => write!(f, "add {}", payload),
            Command::Mine(payload) => write!(f, "mine {}", payload),
            Command::Tamper { index, payload } if payload.is_empty() => {
                write!(f, "tamper {}", index)
            }
            Command::Tamper { index, payload } => write!(f, "tamper {} {}", index, payload),
            Command::Repair(None) => write!(f, "repair"),
            Command::Repair(Some(from)) => write!(f, "repair {}", from),
            Command::Validate { json } => {
                write!(f, "validate")?;
                if *json {
                    write!(f, " --json")?;
                }
                Ok(())
            }
            Command::Show { index, json } => {
                write!(f, "show")?;
                if let Some(index) = index {
                    write!(f, " {}", index)?;
                }
                if *json {
                    write!(f, " --json")?;
                }
                Ok(())
            }
        }
    }
}

/// Strip a `--json` token from the arguments.
fn take_json_flag(rest: &str) -> (String, bool) {
    let mut json = false;
    let mut kept = Vec::new();
    for token in rest.split_whitespace() {
        if token == "--json" {
            json = true;
        } else {
            kept.push(token);
        }
    }
    (kept.join(" "), json)
}

fn required_payload(verb: &str, rest: &str) -> Result<String> {
    if rest.is_empty() {
        Err(ChainError::Command(format!("{} needs a payload", verb)))
    } else {
        Ok(rest.into())
    }
}

fn parse_index(s: &str) -> Result<u64> {
    s.parse()
        .map_err(|_| ChainError::Command(format!("not a block index: {:?}", s)))
}

fn optional_index(rest: &str) -> Result<Option<u64>> {
    if rest.is_empty() {
        Ok(None)
    } else {
        parse_index(rest).map(Some)
    }
}

/// Counters for a completed session run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub commands: usize,
    pub failures: usize,
    pub final_length: usize,
    pub final_valid: bool,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Commands: {}", self.commands)?;
        writeln!(f, "Failures: {}", self.failures)?;
        writeln!(f, "Blocks:   {}", self.final_length)?;
        writeln!(
            f,
            "Chain:    {}",
            if self.final_valid { "valid" } else { "invalid" }
        )?;
        Ok(())
    }
}

/// Owns one chain and turns commands into chain operations.
pub struct Session {
    chain: Chain,
    mining: MiningConfig,
    mining_delay: Option<Duration>,
}

impl Session {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            chain: Chain::with_algorithm(config.algorithm),
            mining: config.mining.clone(),
            mining_delay: None,
        }
    }

    /// Pause before blocks are appended. Cosmetic only.
    pub fn with_mining_delay(mut self, delay: Duration) -> Self {
        self.mining_delay = Some(delay).filter(|d| !d.is_zero());
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Apply one command and return the text to display.
    pub fn apply(&mut self, command: &Command) -> Result<String> {
        match command {
            Command::Add(payload) => {
                self.pause();
                let block = self.chain.add_block(payload.clone());
                Ok(format!("Added block #{} {}", block.index, short(&block.digest)))
            }
            Command::Mine(payload) => {
                self.pause();
                let report = self.chain.mine_block(payload.clone(), &self.mining)?;
                Ok(report.to_string())
            }
            Command::Tamper { index, payload } => {
                self.chain.tamper(*index, payload.clone())?;
                match self.chain.validate().first_invalid_index {
                    Some(i) => Ok(format!(
                        "Tampered with block #{}: chain integrity compromised (chain invalid from block #{})",
                        index, i
                    )),
                    // tail block: no successor holds its old digest
                    None => Ok(format!(
                        "Tampered with block #{}: no later block links to it yet (chain valid)",
                        index
                    )),
                }
            }
            Command::Repair(Some(from)) => {
                self.chain.repair(*from)?;
                Ok(format!(
                    "Re-linked blocks #{}..#{} ({})",
                    from,
                    self.chain.len() - 1,
                    self.validity_line()
                ))
            }
            Command::Repair(None) => {
                let relinked = self.chain.repair_tampered();
                Ok(format!(
                    "Re-linked {} block(s) ({})",
                    relinked,
                    self.validity_line()
                ))
            }
            Command::Validate { json: true } => {
                Ok(serde_json::to_string_pretty(&self.chain.validate())?)
            }
            Command::Validate { json: false } => {
                Ok(self.chain.validate().to_string().trim_end().into())
            }
            Command::Show {
                index: Some(index),
                json,
            } => match self.chain.get(*index) {
                Some(block) if *json => Ok(serde_json::to_string_pretty(block)?),
                Some(block) => Ok(block.to_string().trim_end().into()),
                None => Err(ChainError::InvalidIndex {
                    index: *index,
                    len: self.chain.len(),
                }),
            },
            Command::Show {
                index: None,
                json: true,
            } => Ok(serde_json::to_string_pretty(self.chain.blocks())?),
            Command::Show {
                index: None,
                json: false,
            } => {
                let cards: Vec<String> = self
                    .chain
                    .blocks()
                    .iter()
                    .map(|b| b.to_string())
                    .collect();
                Ok(cards.join("\n").trim_end().into())
            }
        }
    }

    /// Parse and apply one line. Blank lines and `#` comments yield `None`.
    pub fn apply_line(&mut self, line: &str) -> Option<Result<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        Some(trimmed.parse::<Command>().and_then(|cmd| self.apply(&cmd)))
    }

    /// Run every line of `input`, writing results to `out`. Command failures
    /// are reported inline and counted; only I/O errors abort the run.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        for line in input.lines() {
            let line = line?;
            let Some(result) = self.apply_line(&line) else {
                continue;
            };
            summary.commands += 1;
            match result {
                Ok(text) => writeln!(out, "{}", text)?,
                Err(e) => {
                    summary.failures += 1;
                    writeln!(out, "error: {}", e)?;
                }
            }
        }
        summary.final_length = self.chain.len();
        summary.final_valid = self.chain.is_valid();
        info!(
            commands = summary.commands,
            failures = summary.failures,
            blocks = summary.final_length,
            valid = summary.final_valid,
            "session finished"
        );
        Ok(summary)
    }

    fn validity_line(&self) -> String {
        let report = self.chain.validate();
        match report.first_invalid_index {
            None => "chain valid".into(),
            Some(i) => format!("chain invalid from block #{}", i),
        }
    }

    fn pause(&self) {
        if let Some(delay) = self.mining_delay {
            std::thread::sleep(delay);
        }
    }
}

fn short(digest: &str) -> &str {
    &digest[..digest.len().min(16)]
}
