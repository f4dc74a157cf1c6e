//! Resolves a deck position into the word, image and audio to present.

use crate::cursor::Cursor;
use crate::dataset::{WordDataset, WordEntry, WordFamily};
use crate::error::WordFlipError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default query endpoint; `{word}` is replaced with the resolved word.
pub const DEFAULT_QUERY_ENDPOINT: &str = "https://source.unsplash.com/300x200/?{word}";

/// Word shown in a placeholder result.
pub const PLACEHOLDER_WORD: &str = "Error";

/// Where media references point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum MediaSource {
    /// Files on disk, composed from the entry's `imageFile`/`audioFile`.
    Local { image_dir: String, audio_dir: String },
    /// A remote image search endpoint keyed by the word itself.
    Query { endpoint: String },
}

impl Default for MediaSource {
    fn default() -> Self {
        MediaSource::Local {
            image_dir: "images".to_string(),
            audio_dir: "audio".to_string(),
        }
    }
}

/// A card ready to present. Derived on demand, never stored in the dataset.
#[derive(Debug)]
pub struct ResolvedWord {
    pub onset: String,
    pub word: String,
    pub image_ref: String,
    pub audio_ref: Option<String>,
    /// Set when the cursor did not point at a card.
    pub error: Option<WordFlipError>,
}

impl ResolvedWord {
    fn placeholder(cursor: Cursor) -> Self {
        Self {
            onset: String::new(),
            word: PLACEHOLDER_WORD.to_string(),
            image_ref: String::new(),
            audio_ref: None,
            error: Some(WordFlipError::IndexOutOfRange {
                family_index: cursor.family_index,
                entry_index: cursor.entry_index,
            }),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Maps (family, entry) pairs to presentable words.
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    source: MediaSource,
}

impl MediaResolver {
    pub fn new(source: MediaSource) -> Self {
        Self { source }
    }

    /// Resolve the card under `cursor`.
    ///
    /// An out-of-range cursor is logged and yields a placeholder instead of
    /// an error so the caller can still render something.
    pub fn resolve(&self, dataset: &WordDataset, cursor: Cursor) -> ResolvedWord {
        let found = dataset
            .family_at(cursor.family_index)
            .and_then(|family| family.entry(cursor.entry_index).map(|entry| (family, entry)));

        match found {
            Some((family, entry)) => self.compose(family, entry),
            None => {
                let word = ResolvedWord::placeholder(cursor);
                if let Some(err) = &word.error {
                    log::error!("{}", err);
                }
                word
            }
        }
    }

    fn compose(&self, family: &WordFamily, entry: &WordEntry) -> ResolvedWord {
        let word = format!("{}{}", entry.onset, family.rime());
        let (image_ref, audio_ref) = match &self.source {
            MediaSource::Local {
                image_dir,
                audio_dir,
            } => {
                let image = match &entry.image_file {
                    Some(file) => join(image_dir, file),
                    None => join(image_dir, &format!("{}.png", word.to_lowercase())),
                };
                let audio = entry.audio_file.as_deref().map(|file| join(audio_dir, file));
                (image, audio)
            }
            MediaSource::Query { endpoint } => (endpoint.replace("{word}", &word), None),
        };

        ResolvedWord {
            onset: entry.onset.clone(),
            word,
            image_ref,
            audio_ref,
            error: None,
        }
    }
}

fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        return file.to_string();
    }
    Path::new(dir).join(file).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> WordDataset {
        WordDataset::from_json_str(
            r#"{
                "-AKE": [
                    {"onset": "C", "imageFile": "cake.jpg", "audioFile": "cake.mp3"},
                    {"onset": "T"}
                ],
                "-AT": [{"onset": "B"}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn composes_onset_and_rime() {
        let resolver = MediaResolver::default();
        let ds = dataset();
        assert_eq!(resolver.resolve(&ds, Cursor::new(0, 0)).word, "CAKE");
        assert_eq!(resolver.resolve(&ds, Cursor::new(0, 1)).word, "TAKE");
        assert_eq!(resolver.resolve(&ds, Cursor::new(1, 0)).word, "BAT");
    }

    #[test]
    fn local_source_joins_directories() {
        let resolver = MediaResolver::new(MediaSource::Local {
            image_dir: "img".to_string(),
            audio_dir: "snd".to_string(),
        });
        let word = resolver.resolve(&dataset(), Cursor::new(0, 0));
        assert_eq!(word.onset, "C");
        assert_eq!(word.image_ref, Path::new("img").join("cake.jpg").to_string_lossy());
        assert_eq!(
            word.audio_ref,
            Some(Path::new("snd").join("cake.mp3").to_string_lossy().into_owned())
        );
    }

    #[test]
    fn missing_image_falls_back_to_word_name() {
        let resolver = MediaResolver::new(MediaSource::Local {
            image_dir: String::new(),
            audio_dir: String::new(),
        });
        let word = resolver.resolve(&dataset(), Cursor::new(0, 1));
        assert_eq!(word.image_ref, "take.png");
        assert_eq!(word.audio_ref, None);
    }

    #[test]
    fn query_source_substitutes_word() {
        let resolver = MediaResolver::new(MediaSource::Query {
            endpoint: DEFAULT_QUERY_ENDPOINT.to_string(),
        });
        let word = resolver.resolve(&dataset(), Cursor::new(1, 0));
        assert_eq!(word.image_ref, "https://source.unsplash.com/300x200/?BAT");
        assert_eq!(word.audio_ref, None);
    }

    #[test]
    fn out_of_range_yields_placeholder() {
        let resolver = MediaResolver::default();
        let ds = dataset();
        for cursor in [Cursor::new(5, 0), Cursor::new(1, 3)] {
            let word = resolver.resolve(&ds, cursor);
            assert!(word.is_placeholder());
            match word.error {
                Some(WordFlipError::IndexOutOfRange {
                    family_index,
                    entry_index,
                }) => {
                    assert_eq!(family_index, cursor.family_index);
                    assert_eq!(entry_index, cursor.entry_index);
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(word.word, PLACEHOLDER_WORD);
            assert!(word.onset.is_empty());
        }
    }
}
