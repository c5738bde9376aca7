use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use log::debug;

use crate::timer::TimerService;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// one countdown second elapsed for the session with this generation
    Countdown(u64),
    /// nothing arrived within the frame interval
    Frame,
}

/// Source of app events (keyboard, resize, countdown)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. Countdown timers feed the same
/// channel through `sender()`.
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(ev) => match translate(ev) {
                    Some(app_event) => key_tx.send(app_event),
                    None => Ok(()),
                },
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Maps a terminal event to an app event. Bracketed paste arrives as one
/// `Paste` event and is dropped: pasted text is not typing.
pub fn translate(event: CtEvent) -> Option<AppEvent> {
    match event {
        CtEvent::Key(key) => Some(AppEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the frame interval and returns the next event, or Frame on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                AppEvent::Frame
            }
        }
    }
}

/// Background countdown: sends `AppEvent::Countdown(generation)` once per
/// interval while running. Every start gets a fresh cancel flag so a stopped
/// thread can never tick again.
pub struct IntervalTimer {
    tx: Sender<AppEvent>,
    interval: Duration,
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTimer {
    pub fn new(tx: Sender<AppEvent>, generation: u64) -> Self {
        Self::with_interval(tx, generation, Duration::from_secs(1))
    }

    pub fn with_interval(tx: Sender<AppEvent>, generation: u64, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            generation,
            cancel: None,
            handle: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl TimerService for IntervalTimer {
    fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let interval = self.interval;
        let generation = self.generation;

        debug!("countdown {} started", generation);
        self.handle = Some(std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            if thread_cancel.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(AppEvent::Countdown(generation)).is_err() {
                break;
            }
        }));
        self.cancel = Some(cancel);
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
            debug!("countdown {} stopped", self.generation);
        }
        // the thread notices the flag after its current sleep
        self.handle.take();
    }

    fn is_running(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
