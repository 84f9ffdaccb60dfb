//! The runtime drives a single app: terminal events, timer ticks,
//! pending async commands, and event bus deliveries all become
//! messages fed through update().

use anyhow::Result;
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::tui::bus::{BusEvent, event_bus};
use crate::tui::{App, Command, KeyBinding, Subscription};

/// How long the loop blocks on terminal input before polling timers,
/// pending futures, and the bus.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

pub struct Runtime<A: App> {
    state: A::State,

    /// Futures spawned by Command::Perform, polled each tick
    pending_futures: Vec<Pin<Box<dyn Future<Output = A::Msg> + Send>>>,

    /// Keyboard subscriptions: (binding, msg, description)
    keyboard: Vec<(KeyBinding, A::Msg, String)>,

    /// Timer subscriptions: (interval, last_tick, msg)
    timers: Vec<(Duration, Instant, A::Msg)>,

    /// Event bus subscriptions by topic
    bus_handlers: HashMap<String, Vec<Box<dyn Fn(Value) -> Option<A::Msg> + Send>>>,

    bus_rx: broadcast::Receiver<BusEvent>,
    should_quit: bool,
}

impl<A: App> Runtime<A> {
    pub fn new(params: A::InitParams) -> Self {
        let (state, command) = A::init(params);
        let mut runtime = Self {
            state,
            pending_futures: Vec::new(),
            keyboard: Vec::new(),
            timers: Vec::new(),
            bus_handlers: HashMap::new(),
            bus_rx: event_bus().subscribe(),
            should_quit: false,
        };
        runtime.execute(command);
        runtime.rebuild_subscriptions();
        runtime
    }

    pub fn state(&self) -> &A::State {
        &self.state
    }

    fn execute(&mut self, command: Command<A::Msg>) {
        match command {
            Command::None => {}
            Command::Batch(commands) => {
                for command in commands {
                    self.execute(command);
                }
            }
            Command::Perform(future) => self.pending_futures.push(future),
            Command::Publish { topic, data } => event_bus().publish(topic, data),
            Command::Quit => self.should_quit = true,
        }
    }

    fn process_msg(&mut self, msg: A::Msg) {
        let command = A::update(&mut self.state, msg);
        self.execute(command);
        self.rebuild_subscriptions();
    }

    /// Recompute subscriptions from the current state. Timers keep
    /// their phase across rebuilds so frequent messages cannot starve
    /// a periodic tick.
    fn rebuild_subscriptions(&mut self) {
        let previous_timers: Vec<(Duration, Instant)> =
            self.timers.iter().map(|(d, t, _)| (*d, *t)).collect();

        self.keyboard.clear();
        self.timers.clear();
        self.bus_handlers.clear();

        for subscription in A::subscriptions(&self.state) {
            match subscription {
                Subscription::Keyboard {
                    key,
                    msg,
                    description,
                } => self.keyboard.push((key, msg, description)),
                Subscription::Timer { interval, msg } => {
                    let last_tick = previous_timers
                        .iter()
                        .find(|(d, _)| *d == interval)
                        .map(|(_, t)| *t)
                        .unwrap_or_else(Instant::now);
                    self.timers.push((interval, last_tick, msg));
                }
                Subscription::Subscribe { topic, handler } => {
                    self.bus_handlers.entry(topic).or_default().push(handler);
                }
            }
        }
    }

    fn handle_key(&self, event: &KeyEvent) -> Option<A::Msg> {
        self.keyboard
            .iter()
            .find(|(binding, _, _)| binding.matches(event))
            .map(|(_, msg, _)| msg.clone())
    }

    /// Key bindings with their descriptions, for the help line.
    pub fn key_bindings(&self) -> Vec<(KeyBinding, String)> {
        self.keyboard
            .iter()
            .map(|(binding, _, description)| (*binding, description.clone()))
            .collect()
    }

    fn poll_timers(&mut self) -> Vec<A::Msg> {
        let now = Instant::now();
        let mut due = Vec::new();
        for (interval, last_tick, msg) in &mut self.timers {
            if now.duration_since(*last_tick) >= *interval {
                *last_tick = now;
                due.push(msg.clone());
            }
        }
        due
    }

    fn poll_async(&mut self) -> Vec<A::Msg> {
        let waker = futures::task::noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);

        let mut ready = Vec::new();
        let mut i = 0;
        while i < self.pending_futures.len() {
            match self.pending_futures[i].as_mut().poll(&mut cx) {
                Poll::Ready(msg) => {
                    self.pending_futures.swap_remove(i);
                    ready.push(msg);
                }
                Poll::Pending => i += 1,
            }
        }
        ready
    }

    fn drain_bus(&mut self) -> Vec<A::Msg> {
        let mut messages = Vec::new();
        loop {
            match self.bus_rx.try_recv() {
                Ok(event) => {
                    if let Some(handlers) = self.bus_handlers.get(&event.topic) {
                        for handler in handlers {
                            if let Some(msg) = handler(event.data.clone()) {
                                messages.push(msg);
                            }
                        }
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Event bus receiver lagged, skipped {} events", skipped);
                }
            }
        }
        messages
    }

    /// Run the event loop until the app quits.
    pub async fn run(mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        log::info!("Runtime started: {}", A::title());

        let result = loop {
            let theme = crate::global_runtime_config().theme.clone();
            if let Err(e) = terminal.draw(|frame| A::view(&self.state, frame, &theme)) {
                break Err(e.into());
            }

            match crossterm::event::poll(TICK_INTERVAL) {
                Ok(true) => match crossterm::event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if let Some(msg) = self.handle_key(&key) {
                            self.process_msg(msg);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e.into()),
                },
                Ok(false) => {}
                Err(e) => break Err(e.into()),
            }

            for msg in self.poll_timers() {
                self.process_msg(msg);
            }
            for msg in self.poll_async() {
                self.process_msg(msg);
            }
            for msg in self.drain_bus() {
                self.process_msg(msg);
            }

            if self.should_quit {
                break Ok(());
            }
        };

        ratatui::restore();
        log::info!("Runtime stopped: {}", A::title());
        result
    }
}
