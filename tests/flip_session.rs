use std::collections::HashSet;
use std::io::Write;
use wordflip::flip::FlipPhase;
use wordflip::media::DEFAULT_QUERY_ENDPOINT;
use wordflip::{
    Cursor, FlashcardSession, FlipOutcome, FlipState, ManualClock, MediaSource, PlaybackAdapter,
    PolicyKind, PrefetchMode, SessionSettings, WordDataset, WordFlipError,
};

#[derive(Debug, Default)]
struct Recorder {
    shown: Vec<(String, String)>,
    spoken: Vec<String>,
    warmed: Vec<String>,
    flipping: bool,
    errors: Vec<String>,
}

impl PlaybackAdapter for Recorder {
    fn display(&mut self, onset: &str, image_ref: &str) {
        self.shown.push((onset.to_string(), image_ref.to_string()));
    }

    fn speak(&mut self, word: &str) {
        self.spoken.push(word.to_string());
    }

    fn play_audio(&mut self, audio_ref: &str) {
        self.spoken.push(audio_ref.to_string());
    }

    fn warm_image(&mut self, image_ref: &str) {
        self.warmed.push(image_ref.to_string());
    }

    fn set_flipping(&mut self, flipping: bool) {
        self.flipping = flipping;
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

const WORD_FAMILIES: &str = r#"{
    "-AT":  [{"onset": "C"}, {"onset": "B"}, {"onset": "H"}, {"onset": "M"}, {"onset": "R"}, {"onset": "S"}],
    "-AKE": [{"onset": "C"}, {"onset": "T"}, {"onset": "L"}, {"onset": "R"}, {"onset": "SN"}, {"onset": "SH"}],
    "-ASH": [{"onset": "C"}, {"onset": "D"}, {"onset": "R"}, {"onset": "M"}, {"onset": "CR"}, {"onset": "TR"}]
}"#;

fn query_settings(policy: PolicyKind) -> SessionSettings {
    SessionSettings {
        policy,
        seed: Some(2024),
        media: MediaSource::Query {
            endpoint: DEFAULT_QUERY_ENDPOINT.to_string(),
        },
        ..SessionSettings::default()
    }
}

fn session(policy: PolicyKind) -> (FlashcardSession<Recorder, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let dataset = WordDataset::from_json_str(WORD_FAMILIES).unwrap();
    let session = FlashcardSession::new(
        dataset,
        query_settings(policy),
        Recorder::default(),
        clock.clone(),
    );
    (session, clock)
}

/// Flip and run the animation to completion.
fn flip_through(session: &mut FlashcardSession<Recorder, ManualClock>, clock: &ManualClock) {
    assert_eq!(session.flip(), FlipOutcome::Started);
    clock.advance_ms(500);
    session.tick();
    assert_eq!(session.flip_state(), FlipState::Idle);
}

#[test]
fn eighteen_flips_cover_the_deck_once() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();

    let mut seen = HashSet::new();
    for _ in 0..18 {
        assert!(seen.insert(s.cursor()));
        flip_through(&mut s, &clock);
    }
    assert_eq!(seen.len(), 18);
    assert_eq!(s.cursor(), Cursor::new(0, 0));
    assert_eq!(s.adapter().spoken.last().unwrap(), "CAT");
    assert_eq!(s.adapter().spoken.len(), 19);
}

#[test]
fn words_compose_from_onset_and_rime() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.select_family("-AKE").unwrap();
    assert_eq!(s.current_word().word, "CAKE");
    flip_through(&mut s, &clock);
    assert_eq!(s.current_word().word, "TAKE");
    assert_eq!(
        s.adapter().spoken,
        vec!["CAKE".to_string(), "TAKE".to_string()]
    );
    assert_eq!(
        s.adapter().shown.last().unwrap().1,
        "https://source.unsplash.com/300x200/?TAKE"
    );
}

#[test]
fn midpoint_reveals_and_end_settles() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();
    assert_eq!(s.adapter().shown.len(), 1);

    s.flip();
    assert!(s.adapter().flipping);
    assert_eq!(s.cursor(), Cursor::new(0, 1));
    // The cursor has moved but the card still shows the old word.
    assert_eq!(s.adapter().shown.len(), 1);

    clock.advance_ms(250);
    s.tick();
    assert_eq!(s.flip_state(), FlipState::Animating(FlipPhase::PostMidpoint));
    assert_eq!(s.adapter().shown.last().unwrap().0, "B");
    assert!(s.adapter().flipping);

    clock.advance_ms(250);
    s.tick();
    assert!(!s.adapter().flipping);
    assert_eq!(s.flip_state(), FlipState::Idle);
    assert_eq!(s.pending_timers(), 0);
}

#[test]
fn reentrant_flip_changes_nothing() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();
    s.flip();
    let cursor = s.cursor();
    let warmed = s.adapter().warmed.len();

    for step in [0, 100, 200, 300, 400] {
        clock.set(std::time::Duration::from_millis(step));
        s.tick();
        assert_eq!(s.flip(), FlipOutcome::Ignored);
        assert_eq!(s.cursor(), cursor);
    }
    assert_eq!(s.adapter().warmed.len(), warmed);
    assert_eq!(s.pending_timers(), 1);

    clock.advance_ms(100);
    s.tick();
    assert_eq!(s.flip(), FlipOutcome::Started);
}

#[test]
fn late_tick_fires_both_timers_in_order() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();
    s.flip();
    clock.advance_ms(2_000);
    assert!(s.tick());
    assert_eq!(s.adapter().shown.len(), 2);
    assert!(!s.adapter().flipping);
}

#[test]
fn select_family_always_resets_entry() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();
    for _ in 0..4 {
        flip_through(&mut s, &clock);
    }
    assert_eq!(s.cursor(), Cursor::new(0, 4));

    for key in s.family_keys() {
        s.select_family(&key).unwrap();
        assert_eq!(s.cursor().entry_index, 0);
        assert_eq!(s.current_family_key(), Some(key.as_str()));
    }

    let before = s.cursor();
    assert!(matches!(
        s.select_family("-IG"),
        Err(WordFlipError::UnknownFamily(_))
    ));
    assert_eq!(s.cursor(), before);
}

#[test]
fn selecting_a_family_mid_flip_lands_on_its_first_card() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();
    assert_eq!(s.flip(), FlipOutcome::Started);
    assert!(s.adapter().flipping);

    clock.advance_ms(100);
    s.select_family("-ASH").unwrap();
    assert_eq!(s.cursor(), Cursor::new(2, 0));
    assert_eq!(s.shown_family_key(), Some("-ASH"));

    clock.advance_ms(150);
    assert!(s.tick());
    assert_eq!(s.adapter().shown.last().unwrap().0, "C");
    assert_eq!(s.adapter().spoken.last().unwrap(), "CASH");
    assert_eq!(s.cursor(), Cursor::new(2, 0));
    assert!(s.adapter().flipping);

    clock.advance_ms(250);
    assert!(s.tick());
    assert!(!s.adapter().flipping);
    assert_eq!(s.flip_state(), FlipState::Idle);
    assert_eq!(s.shown_cursor(), Cursor::new(2, 0));
}

#[test]
fn prefetch_warms_upcoming_images() {
    let (mut s, clock) = session(PolicyKind::Sequential);
    s.start();
    assert_eq!(
        s.adapter().warmed,
        ["BAT", "HAT", "MAT", "RAT", "SAT"]
            .iter()
            .map(|w| format!("https://source.unsplash.com/300x200/?{w}"))
            .collect::<Vec<_>>()
    );

    flip_through(&mut s, &clock);
    assert_eq!(s.adapter().warmed.len(), 10);
    assert!(s.adapter().warmed[5].ends_with("HAT"));
}

#[test]
fn tiny_deck_prefetches_nothing() {
    let dataset = WordDataset::from_json_str(r#"{"-UN": [{"onset": "S"}]}"#).unwrap();
    let clock = ManualClock::new();
    let mut s = FlashcardSession::new(
        dataset,
        query_settings(PolicyKind::Sequential),
        Recorder::default(),
        clock.clone(),
    );
    s.start();
    assert!(s.adapter().warmed.is_empty());
    assert!(s.upcoming().is_empty());

    flip_through(&mut s, &clock);
    assert_eq!(s.cursor(), Cursor::new(0, 0));
    assert_eq!(s.adapter().spoken, vec!["SUN".to_string(), "SUN".to_string()]);
}

#[test]
fn game_mode_stays_in_bounds() {
    let (mut s, clock) = session(PolicyKind::Random);
    s.start();
    assert!(s.cursor().is_valid(s.dataset()));
    for _ in 0..200 {
        flip_through(&mut s, &clock);
        assert!(s.cursor().is_valid(s.dataset()));
        assert!(!s.current_word().is_placeholder());
    }
    assert!(s.adapter().errors.is_empty());
}

#[test]
fn game_mode_can_prefetch_in_order() {
    let clock = ManualClock::new();
    let settings = SessionSettings {
        prefetch_mode: PrefetchMode::Sequential,
        lookahead: 3,
        ..query_settings(PolicyKind::Random)
    };
    let dataset = WordDataset::from_json_str(WORD_FAMILIES).unwrap();
    let mut s = FlashcardSession::new(dataset, settings, Recorder::default(), clock);
    s.select_family("-ASH").unwrap();
    let words: Vec<String> = s.upcoming().into_iter().map(|w| w.word).collect();
    assert_eq!(words, vec!["DASH", "RASH", "MASH"]);
}

#[test]
fn loads_dataset_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(WORD_FAMILIES.as_bytes()).unwrap();
    let dataset = WordDataset::from_path(file.path()).unwrap();
    let keys: Vec<&str> = dataset.family_keys().collect();
    assert_eq!(keys, vec!["-AT", "-AKE", "-ASH"]);
}
