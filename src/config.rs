//! User configuration, stored as JSON under the platform config directory.

use crate::cursor::PolicyKind;
use crate::dataset::DEFAULT_DATASET_FILE;
use crate::flip::FlipTiming;
use crate::media::MediaSource;
use crate::playback::{ExternalCommand, SpokenOutput};
use crate::prefetch::{PrefetchMode, DEFAULT_LOOKAHEAD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordflip")
}

pub fn config_file() -> PathBuf {
    config_dir().join("config.json")
}

pub fn log_file() -> PathBuf {
    config_dir().join("wordflip.log")
}

pub fn ensure_config_dir() -> io::Result<()> {
    fs::create_dir_all(config_dir())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub policy: PolicyKind,
    /// Seed for game mode; fresh entropy when absent.
    pub seed: Option<u64>,
    pub lookahead: usize,
    pub prefetch_mode: PrefetchMode,
    pub midpoint_ms: u64,
    pub end_ms: u64,
    pub media: MediaSource,
    pub spoken_output: SpokenOutput,
    pub speech_command: Vec<String>,
    pub audio_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let timing = FlipTiming::default();
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_FILE),
            policy: PolicyKind::Sequential,
            seed: None,
            lookahead: DEFAULT_LOOKAHEAD,
            prefetch_mode: PrefetchMode::FollowPolicy,
            midpoint_ms: timing.midpoint_ms,
            end_ms: timing.end_ms,
            media: MediaSource::default(),
            spoken_output: SpokenOutput::Speech,
            speech_command: vec!["espeak".into(), "-v".into(), "en-us".into()],
            audio_command: vec!["aplay".into(), "-q".into()],
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file())
    }

    /// Load from `path`. A missing file is silent; a broken one is logged.
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("cannot read {}: {}; using defaults", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Config>(&content) {
            Ok(config) => config.normalized(),
            Err(e) => {
                log::warn!("invalid config {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    fn normalized(mut self) -> Self {
        let timing = self.timing();
        self.midpoint_ms = timing.midpoint_ms;
        self.end_ms = timing.end_ms;
        self
    }

    pub fn timing(&self) -> FlipTiming {
        FlipTiming {
            midpoint_ms: self.midpoint_ms,
            end_ms: self.end_ms,
        }
        .normalized()
    }

    pub fn speech(&self) -> Option<ExternalCommand> {
        ExternalCommand::from_argv(&self.speech_command)
    }

    pub fn audio(&self) -> Option<ExternalCommand> {
        ExternalCommand::from_argv(&self.audio_command)
    }

    /// Apply `[DATASET] [--random|--sequential] [--seed N]` arguments.
    pub fn apply_args<I, S>(&mut self, args: I) -> Result<(), String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--random" | "--game" => self.policy = PolicyKind::Random,
                "--sequential" => self.policy = PolicyKind::Sequential,
                "--seed" => {
                    let value = args
                        .next()
                        .ok_or_else(|| "--seed flag requires an argument.".to_string())?;
                    let seed = value
                        .as_ref()
                        .parse()
                        .map_err(|_| format!("Invalid seed: {}", value.as_ref()))?;
                    self.seed = Some(seed);
                }
                flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
                path => self.dataset_path = PathBuf::from(path),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timing() {
        let config = Config::default();
        assert_eq!(config.midpoint_ms, 250);
        assert_eq!(config.end_ms, 500);
        assert_eq!(config.lookahead, 5);
        assert_eq!(config.dataset_path, PathBuf::from("word-families.json"));
        assert_eq!(config.speech().unwrap().program(), "espeak");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("none.json")), Config::default());
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"policy": "random", "lookahead": 2, "midpoint_ms": 300, "end_ms": 100,
                "media": {"source": "query", "endpoint": "http://img/?q={word}"}}"#,
        )
        .unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.policy, PolicyKind::Random);
        assert_eq!(config.lookahead, 2);
        assert_eq!(config.end_ms, 300);
        assert_eq!(
            config.media,
            MediaSource::Query {
                endpoint: "http://img/?q={word}".to_string()
            }
        );
        assert_eq!(config.spoken_output, SpokenOutput::Speech);
    }

    #[test]
    fn reads_playback_and_prefetch_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"prefetch_mode": "random", "spoken_output": "audio", "seed": 11}"#,
        )
        .unwrap();
        let config = Config::load_from(&path);
        assert_eq!(
            config,
            Config {
                prefetch_mode: PrefetchMode::Random,
                spoken_output: SpokenOutput::Audio,
                seed: Some(11),
                ..Config::default()
            }
        );
    }

    #[test]
    fn args_override_config() {
        let mut config = Config::default();
        config
            .apply_args(["decks/short.json", "--random", "--seed", "42"])
            .unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("decks/short.json"));
        assert_eq!(config.policy, PolicyKind::Random);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn bad_args_are_reported() {
        let mut config = Config::default();
        assert!(config.apply_args(["--seed"]).is_err());
        assert!(config.apply_args(["--seed", "x"]).is_err());
        assert!(config.apply_args(["--bogus"]).is_err());
    }
}
