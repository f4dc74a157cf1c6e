//! Warms the media of upcoming cards so a flip doesn't stall on loading.

use crate::cursor::{AdvancePolicy, Cursor, RandomOrder, Sampling, Sequential};
use crate::dataset::WordDataset;
use crate::media::{MediaResolver, ResolvedWord};
use crate::playback::PlaybackAdapter;
use serde::{Deserialize, Serialize};

/// Default number of cards to warm ahead of the current one.
pub const DEFAULT_LOOKAHEAD: usize = 5;

/// How upcoming cards are chosen for warming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchMode {
    /// Walk for sequential decks, sample for random decks.
    #[default]
    FollowPolicy,
    /// Always walk forward in deck order.
    Sequential,
    /// Always draw independent random cards.
    Random,
}

#[derive(Debug, Clone)]
pub struct Prefetcher {
    lookahead: usize,
    mode: PrefetchMode,
    /// Draws for [`PrefetchMode::Random`] when the deck itself walks.
    sampler: RandomOrder,
}

impl Default for Prefetcher {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD, PrefetchMode::FollowPolicy)
    }
}

impl Prefetcher {
    pub fn new(lookahead: usize, mode: PrefetchMode) -> Self {
        Self {
            lookahead,
            mode,
            sampler: RandomOrder::new(),
        }
    }

    /// Seed the sampler used when random warming runs over a sequential deck.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.sampler = RandomOrder::seeded(seed);
        }
        self
    }

    /// Resolve upcoming cards and hand their images to the adapter to warm.
    pub fn prefetch(
        &mut self,
        dataset: &WordDataset,
        resolver: &MediaResolver,
        cursor: Cursor,
        policy: &mut dyn AdvancePolicy,
        adapter: &mut dyn PlaybackAdapter,
    ) -> Vec<ResolvedWord> {
        let upcoming = self.upcoming(dataset, resolver, cursor, policy);
        for word in &upcoming {
            if !word.image_ref.is_empty() {
                adapter.warm_image(&word.image_ref);
            }
        }
        log::debug!(
            "prefetched {} cards after ({}, {})",
            upcoming.len(),
            cursor.family_index,
            cursor.entry_index
        );
        upcoming
    }

    /// The cards that would be warmed, without touching the adapter.
    pub fn upcoming(
        &mut self,
        dataset: &WordDataset,
        resolver: &MediaResolver,
        cursor: Cursor,
        policy: &mut dyn AdvancePolicy,
    ) -> Vec<ResolvedWord> {
        let count = self.lookahead;
        match self.mode {
            PrefetchMode::FollowPolicy => match policy.sampling() {
                Sampling::Walk => walk(dataset, resolver, cursor, policy, count),
                Sampling::Independent => sample(dataset, resolver, cursor, policy, count),
            },
            PrefetchMode::Sequential => walk(dataset, resolver, cursor, &mut Sequential, count),
            PrefetchMode::Random => {
                // Random decks sample from their own generator.
                if policy.sampling() == Sampling::Independent {
                    sample(dataset, resolver, cursor, policy, count)
                } else {
                    sample(dataset, resolver, cursor, &mut self.sampler, count)
                }
            }
        }
    }
}

/// Step forward from `start`, stopping before the walk comes back around.
fn walk(
    dataset: &WordDataset,
    resolver: &MediaResolver,
    start: Cursor,
    policy: &mut dyn AdvancePolicy,
    count: usize,
) -> Vec<ResolvedWord> {
    let mut words = Vec::with_capacity(count);
    let mut cursor = start;
    while words.len() < count {
        cursor = policy.advance(cursor, dataset);
        if cursor == start {
            break;
        }
        words.push(resolver.resolve(dataset, cursor));
    }
    words
}

/// Draw `count` independent cards without moving the real cursor.
fn sample(
    dataset: &WordDataset,
    resolver: &MediaResolver,
    start: Cursor,
    policy: &mut dyn AdvancePolicy,
    count: usize,
) -> Vec<ResolvedWord> {
    (0..count)
        .map(|_| resolver.resolve(dataset, policy.advance(start, dataset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Warmed(Vec<String>);

    impl PlaybackAdapter for Warmed {
        fn display(&mut self, _onset: &str, _image_ref: &str) {}
        fn speak(&mut self, _word: &str) {}
        fn play_audio(&mut self, _audio_ref: &str) {}
        fn warm_image(&mut self, image_ref: &str) {
            self.0.push(image_ref.to_string());
        }
        fn set_flipping(&mut self, _flipping: bool) {}
        fn show_error(&mut self, _message: &str) {}
    }

    fn deck() -> WordDataset {
        WordDataset::from_json_str(
            r#"{
                "-AT": [{"onset": "C"}, {"onset": "B"}, {"onset": "H"}],
                "-IG": [{"onset": "P"}, {"onset": "W"}]
            }"#,
        )
        .unwrap()
    }

    fn words(list: &[ResolvedWord]) -> Vec<&str> {
        list.iter().map(|w| w.word.as_str()).collect()
    }

    #[test]
    fn sequential_walk_starts_after_current() {
        let ds = deck();
        let resolver = MediaResolver::default();
        let mut adapter = Warmed::default();
        let got = Prefetcher::new(4, PrefetchMode::FollowPolicy).prefetch(
            &ds,
            &resolver,
            Cursor::new(0, 1),
            &mut Sequential,
            &mut adapter,
        );
        assert_eq!(words(&got), vec!["HAT", "PIG", "WIG", "CAT"]);
        assert_eq!(adapter.0.len(), 4);
        assert_eq!(adapter.0[0], got[0].image_ref);
    }

    #[test]
    fn walk_stops_before_returning_to_start() {
        let ds = deck();
        let resolver = MediaResolver::default();
        let got = Prefetcher::new(50, PrefetchMode::FollowPolicy).upcoming(
            &ds,
            &resolver,
            Cursor::new(1, 0),
            &mut Sequential,
        );
        assert_eq!(got.len(), 4);
        assert!(!words(&got).contains(&"PIG"));
    }

    #[test]
    fn single_card_deck_prefetches_nothing() {
        let ds = WordDataset::from_json_str(r#"{"-OP": [{"onset": "M"}]}"#).unwrap();
        let resolver = MediaResolver::default();
        let mut adapter = Warmed::default();
        let got = Prefetcher::new(5, PrefetchMode::FollowPolicy).prefetch(
            &ds,
            &resolver,
            Cursor::new(0, 0),
            &mut Sequential,
            &mut adapter,
        );
        assert!(got.is_empty());
        assert!(adapter.0.is_empty());
    }

    #[test]
    fn zero_lookahead_is_empty() {
        let ds = deck();
        let resolver = MediaResolver::default();
        let got = Prefetcher::new(0, PrefetchMode::FollowPolicy).upcoming(
            &ds,
            &resolver,
            Cursor::default(),
            &mut RandomOrder::seeded(1),
        );
        assert!(got.is_empty());
    }

    #[test]
    fn random_policy_samples_full_batch() {
        let ds = WordDataset::from_json_str(r#"{"-OP": [{"onset": "M"}]}"#).unwrap();
        let resolver = MediaResolver::default();
        let got = Prefetcher::new(5, PrefetchMode::FollowPolicy).upcoming(
            &ds,
            &resolver,
            Cursor::default(),
            &mut RandomOrder::seeded(9),
        );
        // Duplicates are allowed for independent draws.
        assert_eq!(words(&got), vec!["MOP"; 5]);
    }

    #[test]
    fn sequential_mode_overrides_random_policy() {
        let ds = deck();
        let resolver = MediaResolver::default();
        let got = Prefetcher::new(2, PrefetchMode::Sequential).upcoming(
            &ds,
            &resolver,
            Cursor::new(0, 2),
            &mut RandomOrder::seeded(4),
        );
        assert_eq!(words(&got), vec!["PIG", "WIG"]);
    }

    #[test]
    fn random_mode_samples_for_sequential_policy() {
        let ds = deck();
        let resolver = MediaResolver::default();
        let got = Prefetcher::new(8, PrefetchMode::Random).upcoming(
            &ds,
            &resolver,
            Cursor::new(0, 0),
            &mut Sequential,
        );
        assert_eq!(got.len(), 8);
        assert!(got.iter().all(|w| !w.is_placeholder()));
    }

    #[test]
    fn seeded_random_mode_is_reproducible() {
        let ds = deck();
        let resolver = MediaResolver::default();
        let draw = || {
            let mut prefetcher = Prefetcher::new(6, PrefetchMode::Random).with_seed(Some(11));
            let first = prefetcher.upcoming(&ds, &resolver, Cursor::new(0, 0), &mut Sequential);
            let second = prefetcher.upcoming(&ds, &resolver, Cursor::new(0, 0), &mut Sequential);
            (
                words(&first).iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                words(&second).iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            )
        };
        assert_eq!(draw(), draw());
    }
}
