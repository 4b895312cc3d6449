//! Terminal bell audio sink.
//!
//! The closest thing a terminal has to a speaker: each tone rings the BEL
//! character on stderr, so stdout stays clean for JSON output.

use std::io::{IsTerminal, Write};

use examroom_core::{AudioError, AudioSink, Tone};

pub struct TerminalBell {
    out: std::io::Stderr,
}

/// Open the bell, failing when stderr is not a terminal.
pub fn open() -> Result<Box<dyn AudioSink>, AudioError> {
    let out = std::io::stderr();
    if !out.is_terminal() {
        return Err(AudioError::Unavailable("stderr is not a terminal".into()));
    }
    Ok(Box::new(TerminalBell { out }))
}

impl AudioSink for TerminalBell {
    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError> {
        let bells = "\x07".repeat(tones.len());
        self.out
            .write_all(bells.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|e| AudioError::Playback(e.to_string()))
    }
}
