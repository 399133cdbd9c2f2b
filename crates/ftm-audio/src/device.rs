//! `rodio` device backend.
//!
//! The output stream lives on a dedicated thread because
//! [`rodio::OutputStream`] is not `Send`. The backend talks to it over a
//! command channel and waits for a reply where the caller needs a result.
//! That wait is bounded by [`REPLY_TIMEOUT`] so a slow open cannot stall
//! the caller's runtime thread indefinitely.
//! Between commands the thread polls its sinks and reports every sink that
//! has drained on the clip-ended channel.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use ftm_core::audio::{AudioBackend, AudioError, AudioHandle};
use ftm_core::config::AudioConfig;

/// How often the audio thread checks for drained sinks.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Longest the caller waits for the audio thread to answer a request.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

type Reply = Sender<Result<(), AudioError>>;

enum Command {
    Open(AudioHandle, String, Reply),
    Play(AudioHandle, Reply),
    Pause(AudioHandle),
    Close(AudioHandle),
    Shutdown,
}

/// Plays clips on the default output device.
pub struct DeviceAudio {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
    next: u64,
}

impl DeviceAudio {
    /// Open the default output device on a new audio thread.
    ///
    /// Natural clip ends are delivered on `ended`.
    pub fn spawn(
        config: &AudioConfig,
        ended: UnboundedSender<AudioHandle>,
    ) -> Result<Self, AudioError> {
        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let worker = Worker {
            base_dir: PathBuf::from(&config.base_dir),
            volume: config.volume.clamp(0.0, 1.0),
            ended,
            sinks: HashMap::new(),
        };
        let thread = thread::Builder::new()
            .name("ftm-audio".to_owned())
            .spawn(move || worker.run(&rx, &ready_tx))
            .map_err(|e| AudioError::Device {
                message: format!("failed to spawn audio thread: {e}"),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(base_dir = %config.base_dir, "audio device opened");
                Ok(Self {
                    commands,
                    thread: Some(thread),
                    next: 0,
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(AudioError::Device {
                message: "audio thread exited during startup".to_owned(),
            }),
        }
    }

    /// Send a command and block until the audio thread answers, for at
    /// most [`REPLY_TIMEOUT`].
    fn request(&self, build: impl FnOnce(Reply) -> Command) -> Result<(), AudioError> {
        let (reply, rx) = mpsc::channel();
        self.commands.send(build(reply)).map_err(|e| thread_gone(&e))?;
        await_reply(&rx, REPLY_TIMEOUT)
    }
}

impl AudioBackend for DeviceAudio {
    fn open(&mut self, path: &str) -> Result<AudioHandle, AudioError> {
        self.next = self.next.wrapping_add(1);
        let handle = AudioHandle(self.next);
        let opened = self.request(|reply| Command::Open(handle, path.to_owned(), reply));
        if let Err(AudioError::Timeout { .. }) = &opened {
            // The open may still complete; the close queued behind it drops
            // the sink nobody holds a handle to.
            warn!(%handle, path, "clip open timed out");
            let _ = self.commands.send(Command::Close(handle));
        }
        opened.map(|()| handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), AudioError> {
        self.request(|reply| Command::Play(handle, reply))
    }

    fn pause(&mut self, handle: AudioHandle) {
        let _ = self.commands.send(Command::Pause(handle));
    }

    fn close(&mut self, handle: AudioHandle) {
        let _ = self.commands.send(Command::Close(handle));
    }
}

impl Drop for DeviceAudio {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Wait for one reply from the audio thread.
fn await_reply(
    rx: &Receiver<Result<(), AudioError>>,
    timeout: Duration,
) -> Result<(), AudioError> {
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(AudioError::Timeout {
            waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
        Err(e @ RecvTimeoutError::Disconnected) => Err(thread_gone(&e)),
    }
}

fn thread_gone(cause: &dyn std::fmt::Display) -> AudioError {
    AudioError::Device {
        message: format!("audio thread is not running: {cause}"),
    }
}

/// Resolve a clip path against the base directory. Absolute paths are
/// kept as they are.
pub fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}

// ---------------------------------------------------------------------------
// Audio thread
// ---------------------------------------------------------------------------

struct Worker {
    base_dir: PathBuf,
    volume: f32,
    ended: UnboundedSender<AudioHandle>,
    sinks: HashMap<AudioHandle, Sink>,
}

impl Worker {
    fn run(mut self, rx: &Receiver<Command>, ready: &Sender<Result<(), AudioError>>) {
        let (_stream, output) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = ready.send(Err(AudioError::Device {
                    message: e.to_string(),
                }));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Command::Open(handle, path, reply)) => {
                    let _ = reply.send(self.open(&output, handle, &path));
                }
                Ok(Command::Play(handle, reply)) => {
                    let result = self
                        .sinks
                        .get(&handle)
                        .map(Sink::play)
                        .ok_or(AudioError::UnknownHandle { handle });
                    let _ = reply.send(result);
                }
                Ok(Command::Pause(handle)) => {
                    if let Some(sink) = self.sinks.get(&handle) {
                        sink.pause();
                    }
                }
                Ok(Command::Close(handle)) => {
                    if let Some(sink) = self.sinks.remove(&handle) {
                        sink.stop();
                        debug!(%handle, "clip closed");
                    }
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.reap();
        }

        for (_, sink) in self.sinks.drain() {
            sink.stop();
        }
        debug!("audio thread exited");
    }

    fn open(
        &mut self,
        output: &OutputStreamHandle,
        handle: AudioHandle,
        path: &str,
    ) -> Result<(), AudioError> {
        let resolved = resolve(&self.base_dir, path);
        let file = File::open(&resolved).map_err(|e| {
            debug!(path = %resolved.display(), error = %e, "clip file unreadable");
            AudioError::NotFound {
                path: path.to_owned(),
            }
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
        let sink = Sink::try_new(output).map_err(|e| AudioError::Device {
            message: e.to_string(),
        })?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(source);
        debug!(%handle, path = %resolved.display(), "clip opened");
        self.sinks.insert(handle, sink);
        Ok(())
    }

    /// Report and drop every sink that has played to the end.
    fn reap(&mut self) {
        let drained: Vec<AudioHandle> = self
            .sinks
            .iter()
            .filter(|(_, sink)| sink.empty())
            .map(|(handle, _)| *handle)
            .collect();
        for handle in drained {
            self.sinks.remove(&handle);
            if self.ended.send(handle).is_err() {
                warn!(%handle, "clip ended but nobody is listening");
            }
        }
    }
}
