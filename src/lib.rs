//! Word family flashcards.
//!
//! A deck of word families (`-AT`, `-AKE`, ...) is shown one onset at a time.
//! Flipping the card advances the deck either in order or at random, warms
//! the images of upcoming cards, and swaps the shown word halfway through
//! the flip animation.

pub mod config;
pub mod cursor;
pub mod dataset;
pub mod error;
pub mod flip;
pub mod media;
pub mod playback;
pub mod prefetch;
pub mod session;

pub use config::Config;
pub use cursor::{AdvancePolicy, Cursor, PolicyKind, RandomOrder, Sampling, Sequential};
pub use dataset::{WordDataset, WordEntry, WordFamily};
pub use error::{Result, WordFlipError};
pub use flip::{Clock, FlipPhase, FlipState, FlipTiming, ManualClock, SystemClock};
pub use media::{MediaResolver, MediaSource, ResolvedWord};
pub use playback::{PlaybackAdapter, SpokenOutput};
pub use prefetch::{PrefetchMode, Prefetcher};
pub use session::{report_load_failure, FlashcardSession, FlipOutcome, SessionSettings};
