use clap::Subcommand;
use examroom_core::AudioStyle;

use crate::common::{open_board, CliResult, StdinConfirm};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Silence all audio cues
    Mute,
    /// Re-enable audio cues
    Unmute,
    /// Choose the cue style: classic, soft or none
    Style { style: AudioStyle },
    /// Print the current preferences
    Show,
}

pub fn run(action: PrefsAction, yes: bool) -> CliResult {
    let mut confirm = StdinConfirm::new(yes);
    let mut board = open_board(&mut confirm)?;

    match action {
        PrefsAction::Mute => board.set_muted(true)?,
        PrefsAction::Unmute => board.set_muted(false)?,
        PrefsAction::Style { style } => board.set_style(style)?,
        PrefsAction::Show => {}
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "muted": board.muted(),
            "style": board.style(),
        }))?
    );

    board.shutdown();
    Ok(())
}
