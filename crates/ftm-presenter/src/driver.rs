//! The presenter's single-task event loop.
//!
//! The loop owns the [`Session`] and is the only code that touches it.
//! It waits on fired timers, clip ends, fetch results, observer
//! commands, and stdin input, applies each event to the session, then
//! publishes the view model if it changed. Fetches requested by the
//! session run concurrently in a [`FuturesUnordered`] set so a slow
//! backend never blocks playback.

use std::sync::Arc;

use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ftm_audio::OutputBackend;
use ftm_core::audio::AudioHandle;
use ftm_core::session::{Effect, Session};
use ftm_core::timer::{FiredTimer, TokioTimers};
use ftm_observer::{AppState, Command};
use ftm_source::{InvestigationSource, SourceError, find_publication};
use ftm_types::{Investigation, InvestigationId, Publication, ViewModel};

use crate::console;
use crate::input::{HELP, Input};

/// The session type driven by the presenter.
pub type PresenterSession = Session<TokioTimers, OutputBackend>;

/// Result of an I/O effect, tagged with the investigation it belongs to.
enum Fetched {
    Demo(InvestigationId, Result<Option<Investigation>, SourceError>),
    Live(InvestigationId, Result<Investigation, SourceError>),
}

/// Event loop state.
pub struct Driver {
    session: PresenterSession,
    timers: mpsc::UnboundedReceiver<FiredTimer>,
    ended: mpsc::UnboundedReceiver<AudioHandle>,
    source: Arc<InvestigationSource>,
    catalog: Vec<Publication>,
    observer: Option<Arc<AppState>>,
    fetches: FuturesUnordered<BoxFuture<'static, Fetched>>,
    last_view: ViewModel,
    echo: bool,
}

impl Driver {
    /// Assemble the loop.
    ///
    /// `timers` and `ended` are the receiving ends of the session's timer
    /// service and audio backend. With `echo` set, view changes are
    /// printed to stdout.
    pub fn new(
        session: PresenterSession,
        timers: mpsc::UnboundedReceiver<FiredTimer>,
        ended: mpsc::UnboundedReceiver<AudioHandle>,
        source: Arc<InvestigationSource>,
        catalog: Vec<Publication>,
        observer: Option<Arc<AppState>>,
        echo: bool,
    ) -> Self {
        Self {
            session,
            timers,
            ended,
            source,
            catalog,
            observer,
            fetches: FuturesUnordered::new(),
            last_view: ViewModel::default(),
            echo,
        }
    }

    /// Run until `quit`, `Ctrl-C`, or every input source is closed.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut input: mpsc::Receiver<Input>,
    ) {
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut commands_open = true;
        let mut input_open = true;

        self.publish().await;

        loop {
            tokio::select! {
                Some(fired) = self.timers.recv() => {
                    if let Some(fired) = self.session.timers_mut().accept(fired) {
                        self.session.on_timer(fired);
                    }
                }
                Some(handle) = self.ended.recv() => {
                    self.session.clip_ended(handle);
                }
                Some(fetched) = self.fetches.next(), if !self.fetches.is_empty() => {
                    self.on_fetched(fetched);
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.apply(command),
                    None => commands_open = false,
                },
                line = input.recv(), if input_open => match line {
                    Some(Input::Quit) => break,
                    Some(other) => self.on_input(other),
                    None => input_open = false,
                },
                _ = &mut shutdown => {
                    info!("Ctrl-C received");
                    break;
                }
            }
            if !commands_open && !input_open && self.observer.is_none() {
                info!("no input sources left");
                break;
            }
            self.publish().await;
        }

        self.session.stop();
        self.publish().await;
        info!("event loop stopped");
    }

    fn apply(&mut self, command: Command) {
        debug!(?command, "applying command");
        match command {
            Command::Investigate(publication) => {
                let effect = self.session.investigate(publication);
                self.spawn(effect);
            }
            Command::PlayOne(index) => self.session.play_one(index),
            Command::PlayAll => self.session.play_all(),
            Command::Stop => self.session.stop(),
            Command::Toggle(index) => self.session.toggle(index),
            Command::Back => self.session.back_to_selector(),
        }
    }

    fn on_input(&mut self, input: Input) {
        match input {
            Input::List => {
                if self.catalog.is_empty() {
                    println!("no publications available");
                }
                for publication in &self.catalog {
                    println!(
                        "{:<24} {} ({}) [{}]",
                        publication.id, publication.name, publication.owner, publication.bias
                    );
                }
            }
            Input::Investigate(id) => match find_publication(&self.catalog, &id) {
                Ok(publication) => self.apply(Command::Investigate(publication.clone())),
                Err(e) => println!("{e}. {HELP}"),
            },
            Input::Session(command) => self.apply(command),
            Input::Quit => {}
        }
    }

    fn spawn(&mut self, effect: Effect) {
        let source = Arc::clone(&self.source);
        let fetch = match effect {
            Effect::LookupDemo { id, publication_id } => {
                debug!(investigation = %id, publication = %publication_id, "looking up demo");
                async move { Fetched::Demo(id, source.demo(&publication_id).await) }.boxed()
            }
            Effect::StartLive { id, publication_id } => {
                debug!(
                    investigation = %id,
                    publication = %publication_id,
                    "starting live investigation"
                );
                async move { Fetched::Live(id, source.start(&publication_id).await) }.boxed()
            }
        };
        self.fetches.push(fetch);
    }

    fn on_fetched(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Demo(id, result) => {
                let demo = result.unwrap_or_else(|e| {
                    warn!(
                        investigation = %id,
                        error = %e,
                        "demo lookup failed, treating as no demo"
                    );
                    None
                });
                if let Some(effect) = self.session.demo_lookup_finished(id, demo) {
                    self.spawn(effect);
                }
            }
            Fetched::Live(id, result) => {
                self.session
                    .live_finished(id, result.map_err(|e| e.to_string()));
            }
        }
    }

    async fn publish(&mut self) {
        let view = self.session.view();
        if view == self.last_view {
            return;
        }
        if self.echo {
            for line in console::changes(&self.last_view, &view) {
                println!("{line}");
            }
        }
        if let Some(observer) = &self.observer {
            let clients = observer.publish(&view).await;
            debug!(clients, "view published");
        }
        self.last_view = view;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use ftm_audio::SilentAudio;
    use ftm_core::config::{PresenterConfig, SourceConfig, SourceMode};
    use ftm_types::{PlaybackMode, Stage};
    use tokio::sync::broadcast;

    use super::*;

    fn data_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ftm-presenter-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("demo")).unwrap();
        std::fs::write(
            dir.join("publications.json"),
            r#"{"publications": [
                {"id": "wp", "name": "The Washington Post", "owner": "Jeff Bezos"},
                {"id": "indie", "name": "Indie Weekly", "owner": "Staff"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("demo").join("wp_conversation.json"),
            r#"{"turns": [
                {"agent": "Street Reporter", "text": "Who bought it?", "audio_path": "wp/0.wav"},
                {"agent": "Insider", "text": "A rocket company founder.", "audio_path": "wp/1.wav"}
            ]}"#,
        )
        .unwrap();
        dir
    }

    async fn wait_for(
        rx: &mut broadcast::Receiver<ViewModel>,
        what: impl Fn(&ViewModel) -> bool,
    ) -> ViewModel {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let view = rx.recv().await.unwrap();
                if what(&view) {
                    return view;
                }
            }
        })
        .await
        .unwrap()
    }

    struct Harness {
        commands: mpsc::Sender<Command>,
        input: mpsc::Sender<Input>,
        views: broadcast::Receiver<ViewModel>,
        task: tokio::task::JoinHandle<()>,
        dir: PathBuf,
    }

    async fn start() -> Harness {
        let dir = data_dir();
        let mut config = PresenterConfig::instant();
        config.seed = Some(3);
        let source = InvestigationSource::from_config(&SourceConfig {
            mode: SourceMode::Files,
            data_dir: dir.display().to_string(),
            ..SourceConfig::default()
        })
        .unwrap();
        let catalog = source.publications().await.unwrap();

        let (timers, timer_rx) = TokioTimers::new();
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();
        let audio = OutputBackend::Silent(SilentAudio::new(Duration::from_millis(20), ended_tx));
        let session = Session::new(&config, timers, audio);

        let (commands, commands_rx) = mpsc::channel(8);
        let (input, input_rx) = mpsc::channel(8);
        let state = Arc::new(AppState::new(commands.clone()));
        state.set_publications(catalog.clone()).await;
        let views = state.subscribe();

        let driver = Driver::new(
            session,
            timer_rx,
            ended_rx,
            Arc::new(source),
            catalog,
            Some(state),
            false,
        );
        let task = tokio::spawn(driver.run(commands_rx, input_rx));
        Harness {
            commands,
            input,
            views,
            task,
            dir,
        }
    }

    #[tokio::test]
    async fn demo_reveals_and_plays_through() {
        let mut h = start().await;
        h.input
            .send(Input::Investigate("wp".to_owned()))
            .await
            .unwrap();

        let view = wait_for(&mut h.views, |v| v.play_all_visible).await;
        assert_eq!(view.stage, Stage::Conversation);
        assert_eq!(view.turns.len(), 2);

        h.commands.send(Command::PlayAll).await.unwrap();
        wait_for(&mut h.views, |v| v.highlighted_turn() == Some(1)).await;
        let done = wait_for(&mut h.views, |v| v.playback.mode == PlaybackMode::Idle).await;
        assert!(done.turns.iter().all(|t| t.expanded));

        h.input.send(Input::Quit).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), h.task)
            .await
            .unwrap()
            .unwrap();
        std::fs::remove_dir_all(&h.dir).unwrap();
    }

    #[tokio::test]
    async fn missing_demo_in_files_mode_fails_the_investigation() {
        let mut h = start().await;
        h.input
            .send(Input::Investigate("indie".to_owned()))
            .await
            .unwrap();

        let view = wait_for(&mut h.views, |v| v.stage == Stage::Failed).await;
        assert!(
            view.failure
                .as_deref()
                .unwrap()
                .starts_with("Investigation failed: ")
        );

        h.input
            .send(Input::Session(Command::Back))
            .await
            .unwrap();
        wait_for(&mut h.views, |v| v.stage == Stage::Selector).await;
        h.input.send(Input::Quit).await.unwrap();
        h.task.await.unwrap();
        std::fs::remove_dir_all(&h.dir).unwrap();
    }
}
