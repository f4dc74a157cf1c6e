//! Word Flip - Desktop word family flashcards
//!
//! Keyboard shortcuts:
//!   Space/Enter - Flip to the next word (or click the onset)
//!   G           - Toggle game mode
//!   S           - Say the word again
//!   O           - Open a dataset file
//!   Escape      - Quit

use iced::keyboard::{self, Key};
use iced::theme::{self, Theme};
use iced::time;
use iced::widget::{button, column, container, image, pick_list, row, text, Space};
use iced::{executor, Application, Color, Command, Element, Length, Settings, Subscription};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wordflip::{
    playback::ExternalCommand, report_load_failure, Config, FlashcardSession, PlaybackAdapter,
    PolicyKind, SessionSettings, SystemClock, WordDataset,
};

// ============================================================================
// Playback
// ============================================================================

#[derive(Default)]
struct GuiCard {
    onset: String,
    image_ref: String,
    flipping: bool,
    error: Option<String>,
    // Drained by the app after every update and turned into async loads
    pending_warm: Vec<String>,
    speech: Option<ExternalCommand>,
    audio: Option<ExternalCommand>,
}

impl GuiCard {
    fn new(config: &Config) -> Self {
        Self {
            speech: config.speech(),
            audio: config.audio(),
            ..Default::default()
        }
    }
}

impl PlaybackAdapter for GuiCard {
    fn display(&mut self, onset: &str, image_ref: &str) {
        self.onset = onset.to_string();
        self.image_ref = image_ref.to_string();
        self.error = None;
    }

    fn speak(&mut self, word: &str) {
        if let Some(cmd) = &self.speech {
            cmd.spawn_with(&word.to_lowercase());
        }
    }

    fn play_audio(&mut self, audio_ref: &str) {
        if let Some(cmd) = &self.audio {
            cmd.spawn_with(audio_ref);
        }
    }

    fn warm_image(&mut self, image_ref: &str) {
        self.pending_warm.push(image_ref.to_string());
    }

    fn set_flipping(&mut self, flipping: bool) {
        self.flipping = flipping;
    }

    fn show_error(&mut self, message: &str) {
        self.onset = message.to_string();
        self.image_ref.clear();
        self.error = Some(message.to_string());
    }
}

fn is_remote(image_ref: &str) -> bool {
    image_ref.starts_with("http://") || image_ref.starts_with("https://")
}

// ============================================================================
// Application
// ============================================================================

pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut config = Config::load();
    if let Err(msg) = config.apply_args(std::env::args().skip(1)) {
        eprintln!("ERROR: {}", msg);
        eprintln!("Usage: wordflip [DATASET] [--random|--sequential] [--seed N]");
        std::process::exit(1);
    }

    WordFlipApp::run(Settings {
        flags: config,
        window: iced::window::Settings {
            size: iced::Size::new(640.0, 560.0),
            min_size: Some(iced::Size::new(480.0, 420.0)),
            ..Default::default()
        },
        antialiasing: true,
        ..Default::default()
    })
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    Flip,
    SayAgain,
    ToggleGameMode,
    FamilySelected(String),
    OpenFile,
    FileOpened(Option<PathBuf>),
    ImageLoaded(String, Option<Vec<u8>>),
    KeyPressed(Key),
}

type Session = FlashcardSession<GuiCard, SystemClock>;

enum Deck {
    Loaded(Box<Session>),
    Failed(GuiCard),
}

struct WordFlipApp {
    config: Config,
    deck: Deck,
    dataset_path: PathBuf,
    families: Vec<String>,
    images: HashMap<String, image::Handle>,
    requested: HashSet<String>,
    status_message: Option<String>,
}

fn open_deck(config: &Config, path: &Path) -> Deck {
    match WordDataset::from_path(path) {
        Ok(dataset) => {
            let mut session = FlashcardSession::new(
                dataset,
                SessionSettings::from(config),
                GuiCard::new(config),
                SystemClock::new(),
            );
            session.start();
            Deck::Loaded(Box::new(session))
        }
        Err(e) => {
            let mut card = GuiCard::new(config);
            report_load_failure(&mut card, &e);
            Deck::Failed(card)
        }
    }
}

impl Application for WordFlipApp {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = Config;

    fn new(config: Config) -> (Self, Command<Message>) {
        let dataset_path = config.dataset_path.clone();
        let deck = open_deck(&config, &dataset_path);

        let mut app = Self {
            config,
            deck,
            dataset_path,
            families: Vec::new(),
            images: HashMap::new(),
            requested: HashSet::new(),
            status_message: Some("Click the card or press Space to flip".to_string()),
        };
        app.deck_changed();
        let warm = app.warm_pending();
        (app, warm)
    }

    fn title(&self) -> String {
        match self.session().and_then(|s| s.shown_family_key()) {
            Some(key) => format!("Word Flip - {}", key),
            None => "Word Flip".to_string(),
        }
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::Tick => {
                if let Some(session) = self.session_mut() {
                    session.tick();
                }
            }
            Message::Flip => {
                if let Some(session) = self.session_mut() {
                    session.flip();
                } else {
                    self.status_message = Some("No words loaded. Press O to open a dataset.".into());
                }
            }
            Message::SayAgain => {
                if let Some(session) = self.session_mut() {
                    let word = session.current_word();
                    if !word.is_placeholder() {
                        session.adapter_mut().speak(&word.word);
                    }
                }
            }
            Message::ToggleGameMode => {
                self.config.policy = match self.config.policy {
                    PolicyKind::Sequential => PolicyKind::Random,
                    PolicyKind::Random => PolicyKind::Sequential,
                };
                self.deck = open_deck(&self.config, &self.dataset_path);
                self.deck_changed();
                self.status_message = Some(format!("Mode: {}", self.config.policy.label()));
            }
            Message::FamilySelected(key) => {
                if let Some(session) = self.session_mut() {
                    if let Err(e) = session.select_family(&key) {
                        log::warn!("{}", e);
                    }
                }
            }
            Message::OpenFile => {
                return Command::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .add_filter("Word families", &["json"])
                            .pick_file()
                            .await
                            .map(|f| f.path().to_path_buf())
                    },
                    Message::FileOpened,
                );
            }
            Message::FileOpened(path) => {
                if let Some(path) = path {
                    let deck = open_deck(&self.config, &path);
                    if let Deck::Failed(card) = &deck {
                        self.status_message = card.error.clone();
                    } else {
                        self.deck = deck;
                        self.dataset_path = path;
                        self.deck_changed();
                        self.status_message = Some(format!("Loaded {} word families", self.families.len()));
                    }
                }
            }
            Message::ImageLoaded(image_ref, bytes) => match bytes {
                Some(bytes) => {
                    self.images.insert(image_ref, image::Handle::from_memory(bytes));
                }
                None => log::debug!("could not warm {}", image_ref),
            },
            Message::KeyPressed(key) => match key.as_ref() {
                Key::Named(keyboard::key::Named::Space) | Key::Named(keyboard::key::Named::Enter) => {
                    return self.update(Message::Flip);
                }
                Key::Named(keyboard::key::Named::Escape) => {
                    std::process::exit(0);
                }
                Key::Character(c) => {
                    let s: &str = c.as_ref();
                    match s {
                        "g" | "G" => return self.update(Message::ToggleGameMode),
                        "s" | "S" => return self.update(Message::SayAgain),
                        "o" | "O" => return self.update(Message::OpenFile),
                        " " => return self.update(Message::Flip),
                        _ => {}
                    }
                }
                _ => {}
            },
        }
        self.warm_pending()
    }

    fn view(&self) -> Element<Message> {
        let card = self.card();

        let family_picker = pick_list(
            self.families.clone(),
            self.session()
                .and_then(|s| s.shown_family_key())
                .map(str::to_string),
            Message::FamilySelected,
        )
        .placeholder("Word family");

        let header = row![
            family_picker,
            Space::with_width(Length::Fill),
            button(text(self.config.policy.label()).size(16))
                .on_press(Message::ToggleGameMode)
                .padding(8),
            button(text("Open").size(16)).on_press(Message::OpenFile).padding(8),
        ]
        .spacing(10)
        .align_items(iced::Alignment::Center);

        let word_display: Element<Message> = if let Some(error) = &card.error {
            container(text(error).size(32).style(Color::from_rgb(0.9, 0.3, 0.3)))
                .width(Length::Fill)
                .center_x()
                .into()
        } else {
            let onset_color = if card.flipping {
                Color::from_rgb(0.4, 0.4, 0.4)
            } else {
                Color::from_rgb(0.95, 0.8, 0.2)
            };
            // Input stays disabled until the flip has settled.
            let mut onset_box = button(text(&card.onset).size(88).style(onset_color))
                .padding([10, 24])
                .style(if card.flipping {
                    theme::Button::Secondary
                } else {
                    theme::Button::Primary
                });
            if !card.flipping {
                onset_box = onset_box.on_press(Message::Flip);
            }

            let word_row = row![
                onset_box,
                text(self.session().map_or("", |s| s.shown_rime()))
                    .size(88)
                    .style(Color::from_rgb(0.9, 0.9, 0.9)),
            ]
            .spacing(6)
            .align_items(iced::Alignment::Center);

            container(word_row).width(Length::Fill).center_x().into()
        };

        let picture: Element<Message> = if card.image_ref.is_empty() {
            Space::with_height(200).into()
        } else if let Some(handle) = self.images.get(&card.image_ref) {
            image(handle.clone()).width(300).height(200).into()
        } else if !is_remote(&card.image_ref) {
            image(image::Handle::from_path(&card.image_ref))
                .width(300)
                .height(200)
                .into()
        } else {
            container(
                text(&card.image_ref)
                    .size(14)
                    .style(Color::from_rgb(0.5, 0.5, 0.5)),
            )
            .height(200)
            .center_y()
            .into()
        };

        let picture = container(picture).width(Length::Fill).center_x();

        let status_bar = if let Some(msg) = &self.status_message {
            container(text(msg).size(14).style(Color::from_rgb(0.7, 0.7, 0.3)))
                .width(Length::Fill)
                .padding(5)
                .center_x()
        } else {
            container(text("").size(14)).width(Length::Fill).padding(5)
        };

        let content = column![
            container(header).width(Length::Fill).padding(15),
            picture,
            container(word_display)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_y(),
            status_bar,
        ]
        .spacing(0);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::Container::Custom(Box::new(DarkContainer)))
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let flipping = self
            .session()
            .map_or(false, |s| s.flip_state().is_flipping());
        let tick = if flipping {
            time::every(Duration::from_millis(10)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let keys = keyboard::on_key_press(|key, _modifiers| Some(Message::KeyPressed(key)));

        Subscription::batch([tick, keys])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl WordFlipApp {
    fn session(&self) -> Option<&Session> {
        match &self.deck {
            Deck::Loaded(session) => Some(&**session),
            Deck::Failed(_) => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.deck {
            Deck::Loaded(session) => Some(&mut **session),
            Deck::Failed(_) => None,
        }
    }

    fn card(&self) -> &GuiCard {
        match &self.deck {
            Deck::Loaded(session) => session.adapter(),
            Deck::Failed(card) => card,
        }
    }

    fn deck_changed(&mut self) {
        self.families = self.session().map(|s| s.family_keys()).unwrap_or_default();
    }

    /// Turn the adapter's warm requests into background file reads.
    fn warm_pending(&mut self) -> Command<Message> {
        let pending = match self.session_mut() {
            Some(session) => std::mem::take(&mut session.adapter_mut().pending_warm),
            None => return Command::none(),
        };

        let mut loads = Vec::new();
        for image_ref in pending {
            if is_remote(&image_ref) || !self.requested.insert(image_ref.clone()) {
                continue;
            }
            let path = image_ref.clone();
            loads.push(Command::perform(
                async move { fs::read(&path).ok() },
                move |bytes| Message::ImageLoaded(image_ref, bytes),
            ));
        }
        Command::batch(loads)
    }
}

// Custom dark container style
struct DarkContainer;

impl container::StyleSheet for DarkContainer {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            background: Some(iced::Background::Color(Color::from_rgb(0.1, 0.1, 0.12))),
            text_color: Some(Color::WHITE),
            ..Default::default()
        }
    }
}
