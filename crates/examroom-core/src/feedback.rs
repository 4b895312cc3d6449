//! Audio cues for timer lifecycle events.
//!
//! [`cue_tones`] is a pure mapping from a cue and a style to a short tone
//! sequence. [`Feedback`] owns the output device, if one could be opened,
//! and applies the mute flag. Audio never fails loudly: a missing device
//! or a playback error just means silence.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Start,
    Pause,
    Break,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStyle {
    #[default]
    Classic,
    Soft,
    None,
}

impl AudioStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioStyle::Classic => "classic",
            AudioStyle::Soft => "soft",
            AudioStyle::None => "none",
        }
    }
}

impl std::str::FromStr for AudioStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "classic" => Ok(AudioStyle::Classic),
            "soft" => Ok(AudioStyle::Soft),
            "none" => Ok(AudioStyle::None),
            other => Err(format!("unknown audio style: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u32,
    /// 0.0 ..= 1.0
    pub gain: f32,
    pub waveform: Waveform,
}

const fn tone(frequency_hz: f32, duration_ms: u32, gain: f32, waveform: Waveform) -> Tone {
    Tone {
        frequency_hz,
        duration_ms,
        gain,
        waveform,
    }
}

/// The tone sequence for `cue` in `style`. Empty for [`AudioStyle::None`].
pub fn cue_tones(cue: Cue, style: AudioStyle) -> Vec<Tone> {
    use Waveform::*;
    match style {
        AudioStyle::None => Vec::new(),
        AudioStyle::Classic => match cue {
            Cue::Start => vec![tone(880.0, 150, 0.3, Square)],
            Cue::Pause => vec![tone(440.0, 150, 0.3, Square)],
            Cue::Break => vec![
                tone(660.0, 120, 0.3, Square),
                tone(880.0, 120, 0.3, Square),
                tone(1100.0, 200, 0.3, Square),
            ],
            Cue::Done => vec![
                tone(523.25, 140, 0.3, Square),
                tone(659.25, 140, 0.3, Square),
                tone(783.99, 140, 0.3, Square),
                tone(1046.5, 300, 0.3, Square),
            ],
        },
        AudioStyle::Soft => match cue {
            Cue::Start => vec![tone(523.25, 250, 0.12, Sine)],
            Cue::Pause => vec![tone(392.0, 250, 0.12, Sine)],
            Cue::Break => vec![tone(440.0, 300, 0.12, Triangle), tone(587.33, 400, 0.1, Triangle)],
            Cue::Done => vec![
                tone(392.0, 250, 0.12, Sine),
                tone(523.25, 250, 0.12, Sine),
                tone(659.25, 500, 0.1, Sine),
            ],
        },
    }
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    Unavailable(String),
    #[error("playback failed: {0}")]
    Playback(String),
}

/// An output device that can render a tone sequence.
pub trait AudioSink: Send {
    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError>;

    /// Release the device. Called once on shutdown.
    fn close(&mut self) {}
}

/// Cue emitter honoring the global mute flag and style.
pub struct Feedback {
    sink: Option<Box<dyn AudioSink>>,
    muted: bool,
    style: AudioStyle,
}

impl std::fmt::Debug for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feedback")
            .field("has_sink", &self.sink.is_some())
            .field("muted", &self.muted)
            .field("style", &self.style)
            .finish()
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::silent()
    }
}

impl Feedback {
    /// No device at all.
    pub fn silent() -> Self {
        Self {
            sink: None,
            muted: false,
            style: AudioStyle::default(),
        }
    }

    /// Open the device once through `open`. Failure degrades to silence.
    pub fn acquire<F>(open: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn AudioSink>, AudioError>,
    {
        let sink = match open() {
            Ok(sink) => Some(sink),
            Err(e) => {
                debug!(error = %e, "audio unavailable, cues disabled");
                None
            }
        };
        Self {
            sink,
            ..Self::silent()
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn style(&self) -> AudioStyle {
        self.style
    }

    pub fn set_style(&mut self, style: AudioStyle) {
        self.style = style;
    }

    /// Sound `cue`. Returns whether anything was played.
    pub fn emit(&mut self, cue: Cue) -> bool {
        if self.muted {
            return false;
        }
        let tones = cue_tones(cue, self.style);
        if tones.is_empty() {
            return false;
        }
        let Some(sink) = self.sink.as_mut() else {
            return false;
        };
        match sink.play(&tones) {
            Ok(()) => true,
            Err(e) => {
                debug!(?cue, error = %e, "audio cue dropped");
                false
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
    }
}
