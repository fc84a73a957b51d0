use cgmath::Vector2;
use clap::Parser;
use iced::time::{self, Instant};
use iced::widget::image::Handle;
use iced::{keyboard, Element, Subscription, Task, Theme};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod config;
mod error;
mod state;
mod ui;

use backend::{LocalBackend, Library, PersistenceGateway};
use config::{Args, Config};
use error::Result;
use state::controller::{Controller, Effect, Mode};
use state::data::{Destination, MediaContent, MediaItem, SessionState, SortResult};
use state::input::KeyPress;
use state::viewer::ScrollDirection;
use ui::dialogs::{self, NativeConfirm};
use ui::views::{self, SetupForm};

/// How often expired feedback is cleared
const FEEDBACK_TICK: Duration = Duration::from_millis(250);

/// Main application state
struct MediaSorter {
    controller: Controller,
    gateway: PersistenceGateway,
    config: Config,
    form: SetupForm,
    /// Decoded handle for the displayed item, keyed by path
    image: Option<(String, Handle)>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    // Setup screen
    SourceChanged(String),
    BrowseSource,
    LoadSource,
    NameChanged(String),
    KeyChanged(String),
    PathChanged(String),
    BrowseDestination,
    AddDestination,
    RemoveDestination(char),
    StartSorting,

    // Sorting screen
    Classify(String),
    Previous,
    Skip,
    Save,
    Finalize,
    ResetSession,
    OpenCurrent,
    ResetZoom,
    KeyPressed(KeyPress),
    ViewerWheel {
        direction: ScrollDirection,
        pointer: Vector2<f32>,
        area: Vector2<f32>,
    },
    ViewerPress(Vector2<f32>),
    ViewerDrag(Vector2<f32>),
    ViewerRelease,

    // Timers
    AutosaveTick,
    Tick(Instant),

    // Backend results
    DestinationsLoaded(Result<Vec<Destination>>),
    DestinationsSaved(Result<()>),
    ItemsLoaded(String, Result<Vec<MediaItem>>),
    SessionLoaded(String, Result<Option<SessionState>>),
    SessionSaved(u64, Result<u64>),
    SessionDeleted(Result<()>),
    ContentLoaded(String, Result<MediaContent>),
    Opened(Result<()>),
    FinalizeDone(Result<SortResult>),
}

impl MediaSorter {
    fn new(args: Args, config: Config, gateway: PersistenceGateway) -> (Self, Task<Message>) {
        let mut app = MediaSorter {
            controller: Controller::new(&config),
            gateway,
            config,
            form: SetupForm::default(),
            image: None,
        };

        let mut effects = app.controller.startup();
        if let Some(source) = args.source {
            app.form.source = source.to_string_lossy().to_string();
            effects.extend(app.controller.load_source(&app.form.source));
        }

        let task = app.run_all(effects);
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::SourceChanged(value) => {
                self.form.source = value;
                Task::none()
            }
            Message::BrowseSource => {
                match dialogs::pick_folder("Select Source Folder") {
                    Some(folder) => {
                        self.form.source = folder.to_string_lossy().to_string();
                        let effect = self.controller.load_source(&self.form.source);
                        self.run_all(effect)
                    }
                    None => Task::none(),
                }
            }
            Message::LoadSource => {
                let effect = self.controller.load_source(&self.form.source);
                self.run_all(effect)
            }
            Message::NameChanged(value) => {
                self.form.name = value;
                Task::none()
            }
            Message::KeyChanged(value) => {
                self.form.key = value;
                Task::none()
            }
            Message::PathChanged(value) => {
                self.form.path = value;
                Task::none()
            }
            Message::BrowseDestination => {
                if let Some(folder) = dialogs::pick_folder("Select Destination Folder") {
                    self.form.path = folder.to_string_lossy().to_string();
                }
                Task::none()
            }
            Message::AddDestination => {
                match self
                    .controller
                    .add_destination(&self.form.name, &self.form.key, &self.form.path)
                {
                    Ok(effect) => {
                        self.form.name.clear();
                        self.form.key.clear();
                        self.form.path.clear();
                        self.run(effect)
                    }
                    Err(_) => Task::none(),
                }
            }
            Message::RemoveDestination(key) => {
                let effect = self.controller.remove_destination(key, &NativeConfirm);
                self.run_all(effect)
            }
            Message::StartSorting => {
                let effects = self.controller.start_sorting();
                if self.controller.mode() == Mode::Sorting {
                    info!("▶️  Sorting started");
                }
                self.run_all(effects)
            }

            Message::Classify(name) => {
                let effects = self.controller.classify(&name);
                self.run_all(effects)
            }
            Message::Previous => {
                let effects = self.controller.previous();
                self.run_all(effects)
            }
            Message::Skip => {
                let effects = self.controller.skip();
                self.run_all(effects)
            }
            Message::Save => {
                let effect = self.controller.save();
                self.run_all(effect)
            }
            Message::Finalize => {
                let effect = self.controller.request_finalize(&NativeConfirm);
                self.run_all(effect)
            }
            Message::ResetSession => {
                self.controller.reset_session();
                Task::none()
            }
            Message::OpenCurrent => {
                let effect = self.controller.open_current();
                self.run_all(effect)
            }
            Message::ResetZoom => {
                self.controller.reset_zoom();
                Task::none()
            }
            Message::KeyPressed(press) => {
                let effects = self.controller.handle_key(press);
                self.run_all(effects)
            }
            Message::ViewerWheel {
                direction,
                pointer,
                area,
            } => {
                self.controller.viewer_wheel(direction, pointer, area);
                Task::none()
            }
            Message::ViewerPress(pointer) => {
                self.controller.viewer_press(pointer);
                Task::none()
            }
            Message::ViewerDrag(pointer) => {
                self.controller.viewer_drag(pointer);
                Task::none()
            }
            Message::ViewerRelease => {
                self.controller.viewer_release();
                Task::none()
            }

            Message::AutosaveTick => {
                let effect = self.controller.autosave_tick();
                self.run_all(effect)
            }
            Message::Tick(now) => {
                self.controller.tick(now);
                Task::none()
            }

            Message::DestinationsLoaded(result) => {
                self.controller.on_destinations_loaded(result);
                Task::none()
            }
            Message::DestinationsSaved(result) => {
                self.controller.on_destinations_saved(result);
                Task::none()
            }
            Message::ItemsLoaded(source_path, result) => {
                let effects = self.controller.on_items_loaded(source_path, result);
                self.run_all(effects)
            }
            Message::SessionLoaded(source_path, result) => {
                self.controller.on_session_loaded(&source_path, result);
                Task::none()
            }
            Message::SessionSaved(generation, result) => {
                self.controller.on_session_saved(generation, result);
                Task::none()
            }
            Message::SessionDeleted(result) => {
                self.controller.on_session_deleted(result);
                Task::none()
            }
            Message::ContentLoaded(path, result) => {
                self.controller.on_content_loaded(result, &path);
                Task::none()
            }
            Message::Opened(result) => {
                self.controller.on_opened(result);
                Task::none()
            }
            Message::FinalizeDone(result) => {
                let effects = self.controller.on_finalize_result(result);
                self.run_all(effects)
            }
        };

        self.sync_image();
        task
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match self.controller.mode() {
            Mode::Setup => views::setup(&self.controller, &self.form),
            Mode::Sorting => views::sorting(
                &self.controller,
                self.image.as_ref().map(|(_, handle)| handle),
            ),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = Vec::new();

        // Shortcuts only exist while sorting and not processing
        if self.controller.keyboard_active() {
            subscriptions.push(keyboard::on_key_press(|key, modifiers| {
                Some(Message::KeyPressed(ui::to_key_press(&key, modifiers)))
            }));
        }
        if self.controller.mode() == Mode::Sorting {
            subscriptions
                .push(time::every(self.config.autosave_interval()).map(|_| Message::AutosaveTick));
        }
        if self.controller.feedback().is_some() {
            subscriptions.push(time::every(FEEDBACK_TICK).map(Message::Tick));
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Keep the decoded handle in step with the controller's content
    fn sync_image(&mut self) {
        match self.controller.content() {
            Some(content) => {
                let current = self.image.as_ref().map(|(path, _)| path.as_str());
                if current != Some(content.path.as_str()) {
                    self.image = Some((
                        content.path.clone(),
                        Handle::from_bytes(content.bytes.clone()),
                    ));
                }
            }
            None => self.image = None,
        }
    }

    fn run_all(&self, effects: impl IntoIterator<Item = Effect>) -> Task<Message> {
        Task::batch(effects.into_iter().map(|effect| self.run(effect)))
    }

    /// Launch the async work an effect asks for
    fn run(&self, effect: Effect) -> Task<Message> {
        let gateway = self.gateway.clone();
        match effect {
            Effect::LoadDestinations => Task::perform(
                async move { gateway.load_destinations().await },
                Message::DestinationsLoaded,
            ),
            Effect::SaveDestinations(destinations) => Task::perform(
                async move { gateway.save_destinations(destinations).await },
                Message::DestinationsSaved,
            ),
            Effect::LoadItems(source_path) => {
                let source = source_path.clone();
                Task::perform(
                    async move { gateway.list_items(source_path).await },
                    move |result| Message::ItemsLoaded(source.clone(), result),
                )
            }
            Effect::LoadSession(source_path) => {
                let source = source_path.clone();
                Task::perform(
                    async move { gateway.load_session(source_path).await },
                    move |result| Message::SessionLoaded(source.clone(), result),
                )
            }
            Effect::SaveSession(snapshot) => {
                let generation = snapshot.generation;
                Task::perform(
                    async move { gateway.save_session(snapshot).await },
                    move |result| Message::SessionSaved(generation, result),
                )
            }
            Effect::DeleteSession(source_path) => Task::perform(
                async move { gateway.delete_session(source_path).await },
                Message::SessionDeleted,
            ),
            Effect::FetchContent(item_path) => {
                let path = item_path.clone();
                Task::perform(
                    async move { gateway.fetch_content(item_path).await },
                    move |result| Message::ContentLoaded(path.clone(), result),
                )
            }
            Effect::OpenExternally(item_path) => Task::perform(
                async move { gateway.open_externally(item_path).await },
                Message::Opened,
            ),
            Effect::Finalize(request) => Task::perform(
                async move { gateway.finalize(request).await },
                Message::FinalizeDone,
            ),
            Effect::Alert { title, message } => {
                dialogs::alert(&title, &message);
                Task::none()
            }
        }
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());

    // The app cannot function without its catalog
    let library = match &args.data_dir {
        Some(dir) => Library::open(&Library::db_path_in(dir)),
        None => Library::new(),
    };
    let library = match library {
        Ok(library) => library,
        Err(e) => {
            error!("❌ Failed to open catalog: {}", e);
            std::process::exit(1);
        }
    };
    info!("🗂️  Media Sorter catalog at {}", library.path().display());

    let gateway = PersistenceGateway::new(Arc::new(LocalBackend::new(library)));

    iced::application("Media Sorter", MediaSorter::update, MediaSorter::view)
        .subscription(MediaSorter::subscription)
        .theme(MediaSorter::theme)
        .centered()
        .run_with(move || MediaSorter::new(args, config, gateway))
}
