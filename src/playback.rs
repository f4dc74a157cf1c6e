//! Output side of the deck: what front ends implement to present cards.

use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};

/// Onset text shown when the dataset could not be loaded.
pub const LOAD_ERROR_MESSAGE: &str = "Error Loading Data";

/// Onset text shown when the dataset loaded but holds no words.
pub const NO_WORDS_MESSAGE: &str = "Error: No words loaded.";

/// Which spoken-output mechanism a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpokenOutput {
    /// Text-to-speech of the composed word.
    #[default]
    Speech,
    /// Recorded audio file, falling back to speech when an entry has none.
    Audio,
}

/// Renders resolved words. Implemented by each front end.
pub trait PlaybackAdapter {
    /// Show the onset text and image for the current card.
    fn display(&mut self, onset: &str, image_ref: &str);

    fn speak(&mut self, word: &str);

    fn play_audio(&mut self, audio_ref: &str);

    /// Fire-and-forget hint that `image_ref` will be shown soon.
    fn warm_image(&mut self, image_ref: &str);

    /// Toggle the cosmetic "flipping" state of the onset box.
    fn set_flipping(&mut self, flipping: bool);

    /// Show `message` in place of the onset text.
    fn show_error(&mut self, message: &str);
}

/// Runs an external program with one trailing argument, without waiting.
///
/// Used for `espeak`-style speech and `aplay`-style audio playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Build from `[program, args...]`. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Spawn the program with `arg` appended. Failures are logged and dropped.
    pub fn spawn_with(&self, arg: &str) {
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(arg)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match result {
            Ok(mut child) => {
                log::debug!("spawned {} (pid {}) for {:?}", self.program, child.id(), arg);
                // Reap without blocking the caller.
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => log::warn!("failed to run {}: {}", self.program, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_from_argv() {
        let argv = vec!["espeak".to_string(), "-v".to_string(), "en-us".to_string()];
        let cmd = ExternalCommand::from_argv(&argv).unwrap();
        assert_eq!(cmd.program(), "espeak");
        assert_eq!(cmd.args, vec!["-v", "en-us"]);
    }

    #[test]
    fn empty_argv_has_no_command() {
        assert!(ExternalCommand::from_argv(&[]).is_none());
        assert!(ExternalCommand::from_argv(&[" ".to_string()]).is_none());
    }

    #[test]
    fn missing_program_is_not_fatal() {
        let cmd = ExternalCommand::from_argv(&["wordflip-no-such-program".to_string()]).unwrap();
        cmd.spawn_with("CAT");
    }
}
