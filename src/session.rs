//! A running deck: owns all state and drives the adapter.

use crate::config::Config;
use crate::cursor::{self, AdvancePolicy, Cursor, PolicyKind};
use crate::dataset::WordDataset;
use crate::error::{Result, WordFlipError};
use crate::flip::{Clock, FlipController, FlipState, FlipStep, FlipTiming, TimerQueue};
use crate::media::{MediaResolver, MediaSource, ResolvedWord};
use crate::playback::{PlaybackAdapter, SpokenOutput, LOAD_ERROR_MESSAGE, NO_WORDS_MESSAGE};
use crate::prefetch::{PrefetchMode, Prefetcher, DEFAULT_LOOKAHEAD};

/// Result of a flip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Started,
    /// A flip was already running; nothing changed.
    Ignored,
}

/// Behavioural knobs of a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub policy: PolicyKind,
    pub seed: Option<u64>,
    pub lookahead: usize,
    pub prefetch_mode: PrefetchMode,
    pub timing: FlipTiming,
    pub media: MediaSource,
    pub spoken_output: SpokenOutput,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Sequential,
            seed: None,
            lookahead: DEFAULT_LOOKAHEAD,
            prefetch_mode: PrefetchMode::FollowPolicy,
            timing: FlipTiming::default(),
            media: MediaSource::default(),
            spoken_output: SpokenOutput::Speech,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            policy: config.policy,
            seed: config.seed,
            lookahead: config.lookahead,
            prefetch_mode: config.prefetch_mode,
            timing: config.timing(),
            media: config.media.clone(),
            spoken_output: config.spoken_output,
        }
    }
}

/// Show the fixed load-failure banner for `err`. No retry is attempted.
pub fn report_load_failure(adapter: &mut dyn PlaybackAdapter, err: &WordFlipError) {
    log::error!("failed to load word families: {}", err);
    let message = match err {
        WordFlipError::EmptyDataset => NO_WORDS_MESSAGE,
        _ => LOAD_ERROR_MESSAGE,
    };
    adapter.show_error(message);
}

pub struct FlashcardSession<P: PlaybackAdapter, C: Clock> {
    dataset: WordDataset,
    cursor: Cursor,
    // Card the adapter last rendered; trails `cursor` until the midpoint.
    shown: Cursor,
    policy: Box<dyn AdvancePolicy>,
    resolver: MediaResolver,
    prefetcher: Prefetcher,
    flip: FlipController,
    timers: TimerQueue,
    spoken_output: SpokenOutput,
    clock: C,
    adapter: P,
}

impl<P: PlaybackAdapter, C: Clock> FlashcardSession<P, C> {
    pub fn new(dataset: WordDataset, settings: SessionSettings, adapter: P, clock: C) -> Self {
        let policy = settings.policy.build(settings.seed);
        Self::with_policy(dataset, settings, policy, adapter, clock)
    }

    /// Like [`FlashcardSession::new`] but with an explicit advance policy.
    pub fn with_policy(
        dataset: WordDataset,
        settings: SessionSettings,
        mut policy: Box<dyn AdvancePolicy>,
        adapter: P,
        clock: C,
    ) -> Self {
        let cursor = policy.init(&dataset);
        log::debug!(
            "{} deck of {} families starting at ({}, {})",
            policy.kind().label(),
            dataset.family_count(),
            cursor.family_index,
            cursor.entry_index
        );
        Self {
            dataset,
            cursor,
            shown: cursor,
            policy,
            resolver: MediaResolver::new(settings.media),
            prefetcher: Prefetcher::new(settings.lookahead, settings.prefetch_mode)
                .with_seed(settings.seed),
            flip: FlipController::new(settings.timing),
            timers: TimerQueue::new(),
            spoken_output: settings.spoken_output,
            clock,
            adapter,
        }
    }

    /// Present the first card and warm the ones after it.
    pub fn start(&mut self) {
        self.present();
        self.prefetch();
    }

    /// Handle a flip input.
    ///
    /// The cursor advances immediately; the adapter sees the new card only
    /// once the midpoint timer fires in [`FlashcardSession::tick`].
    pub fn flip(&mut self) -> FlipOutcome {
        let now = self.clock.now();
        if !self.flip.begin(now, &mut self.timers) {
            log::debug!("flip ignored, animation in progress");
            return FlipOutcome::Ignored;
        }
        self.adapter.set_flipping(true);
        self.cursor = self.policy.advance(self.cursor, &self.dataset);
        log::debug!(
            "flip to ({}, {})",
            self.cursor.family_index,
            self.cursor.entry_index
        );
        self.prefetch();
        FlipOutcome::Started
    }

    /// Fire every timer due by now. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let due = self.timers.drain_due(self.clock.now());
        let mut changed = false;
        for event in due {
            match self.flip.on_timer(event) {
                Some(FlipStep::Reveal) => {
                    self.present();
                    changed = true;
                }
                Some(FlipStep::Settle) => {
                    self.adapter.set_flipping(false);
                    changed = true;
                }
                None => {}
            }
        }
        changed
    }

    /// Jump to the first card of `key`, presenting it right away.
    ///
    /// The cursor is left untouched when `key` is unknown.
    pub fn select_family(&mut self, key: &str) -> Result<()> {
        self.cursor = cursor::select_family(self.cursor, &self.dataset, key)?;
        log::debug!("selected family {}", key);
        self.present();
        self.prefetch();
        Ok(())
    }

    pub fn current_word(&self) -> ResolvedWord {
        self.resolver.resolve(&self.dataset, self.cursor)
    }

    /// Cards the next prefetch pass would warm. Random decks draw fresh
    /// samples on every call.
    pub fn upcoming(&mut self) -> Vec<ResolvedWord> {
        self.prefetcher.upcoming(
            &self.dataset,
            &self.resolver,
            self.cursor,
            self.policy.as_mut(),
        )
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn dataset(&self) -> &WordDataset {
        &self.dataset
    }

    pub fn family_keys(&self) -> Vec<String> {
        self.dataset.family_keys().map(str::to_string).collect()
    }

    pub fn current_family_key(&self) -> Option<&str> {
        self.dataset
            .family_at(self.cursor.family_index)
            .map(|f| f.key())
    }

    /// The card on screen. Lags [`FlashcardSession::cursor`] during the first
    /// half of a flip.
    pub fn shown_cursor(&self) -> Cursor {
        self.shown
    }

    pub fn shown_family_key(&self) -> Option<&str> {
        self.dataset
            .family_at(self.shown.family_index)
            .map(|f| f.key())
    }

    pub fn shown_rime(&self) -> &str {
        self.dataset
            .family_at(self.shown.family_index)
            .map_or("", |f| f.rime())
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn flip_state(&self) -> FlipState {
        self.flip.state()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn adapter(&self) -> &P {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut P {
        &mut self.adapter
    }

    fn present(&mut self) {
        self.shown = self.cursor;
        let word = self.resolver.resolve(&self.dataset, self.cursor);
        if word.is_placeholder() {
            self.adapter.show_error(&word.word);
            return;
        }
        self.adapter.display(&word.onset, &word.image_ref);
        match (self.spoken_output, word.audio_ref.as_deref()) {
            (SpokenOutput::Audio, Some(audio)) => self.adapter.play_audio(audio),
            _ => self.adapter.speak(&word.word),
        }
    }

    fn prefetch(&mut self) {
        self.prefetcher.prefetch(
            &self.dataset,
            &self.resolver,
            self.cursor,
            self.policy.as_mut(),
            &mut self.adapter,
        );
    }
}
