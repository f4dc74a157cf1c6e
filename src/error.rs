//! Error types for the wordflip crate.

use thiserror::Error;

/// The error type for dataset loading and deck navigation.
#[derive(Debug, Error)]
pub enum WordFlipError {
    /// The dataset document could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The dataset document is not valid JSON.
    #[error("Failed to parse word families: {0}")]
    Parse(#[from] serde_json::Error),

    /// The dataset contains no word families at all.
    #[error("Dataset contains no word families")]
    EmptyDataset,

    /// A family's entries are not a well-formed list of entries.
    #[error("Malformed entry in family {family}: {reason}")]
    MalformedEntry { family: String, reason: String },

    /// A family is present but lists no entries.
    #[error("Word family {0} has no entries")]
    EmptyFamily(String),

    /// A requested family key does not exist in the dataset.
    #[error("Unknown word family: {0}")]
    UnknownFamily(String),

    /// A cursor points outside the dataset.
    #[error("Cursor ({family_index}, {entry_index}) is out of range")]
    IndexOutOfRange {
        family_index: usize,
        entry_index: usize,
    },
}

impl WordFlipError {
    /// True for errors that mean the dataset could not be used at all.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            WordFlipError::Io(_)
                | WordFlipError::Parse(_)
                | WordFlipError::EmptyDataset
                | WordFlipError::MalformedEntry { .. }
                | WordFlipError::EmptyFamily(_)
        )
    }
}

/// A convenience `Result` alias using [`WordFlipError`].
pub type Result<T> = std::result::Result<T, WordFlipError>;
