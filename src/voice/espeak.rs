use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};

use super::VoiceSink;

pub const DEFAULT_PROGRAM: &str = "espeak-ng";
/// Words per minute.
pub const DEFAULT_RATE: u32 = 160;

/// Speaks through an espeak-compatible command line synthesizer.
///
/// Each call runs the program to completion, so `speak` blocks for the
/// length of the utterance.
pub struct EspeakSink {
    program: String,
    rate: u32,
}

impl EspeakSink {
    /// Check that `program` runs before committing to it.
    pub fn probe(program: &str, rate: u32) -> Result<Self> {
        let status = Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to run {}", program))?;
        if !status.success() {
            return Err(anyhow!("{} --version exited with {}", program, status));
        }
        Ok(Self {
            program: program.to_string(),
            rate,
        })
    }
}

impl VoiceSink for EspeakSink {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn speak(&mut self, utterance: &str) -> Result<()> {
        let text: String = utterance.chars().filter(|c| !c.is_control()).collect();
        if text.trim().is_empty() {
            return Err(anyhow!("utterance is empty"));
        }
        let status = Command::new(&self.program)
            .arg("-s")
            .arg(self.rate.to_string())
            .arg("--")
            .arg(&text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to run {}", self.program))?;
        if !status.success() {
            return Err(anyhow!("{} exited with {}", self.program, status));
        }
        Ok(())
    }
}
