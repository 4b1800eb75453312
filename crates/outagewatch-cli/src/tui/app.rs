//! TUI application: terminal setup, timers, and the effect runner.
//!
//! All state lives in [`Monitor`]. This loop turns key presses, timer
//! deadlines and finished fetches into [`Msg`]s, feeds them to
//! [`Monitor::update`] one at a time, and carries out the [`Effect`]s.
//! Fetches run on a tokio runtime and report back over a channel, so a slow
//! feed never blocks drawing.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use outagewatch_core::{Effect, FeedClient, Key, Monitor, MonitorConfig, Msg, SeriesStore};

use super::ui::Theme;

/// Map a terminal key event onto a monitor key.
pub fn map_key(key: KeyEvent) -> Key {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Key::Quit,
        KeyCode::Char('r') => Key::Refresh,
        KeyCode::Char('c') => Key::ToggleChart,
        _ => Key::Other,
    }
}

pub struct App {
    /// Only `None` while a message is being applied.
    monitor: Option<Monitor>,
    client: FeedClient,
    history_path: PathBuf,
    theme: Theme,
    runtime: tokio::runtime::Runtime,
    tx: Sender<Msg>,
    rx: Receiver<Msg>,
    next_tick: Option<Instant>,
    next_blink: Option<Instant>,
    running: bool,
}

impl App {
    pub fn new(store: SeriesStore, client: FeedClient, config: &MonitorConfig) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();

        Ok(Self {
            monitor: Some(Monitor::new(store, config.poll_period, config.blink_period)),
            client,
            history_path: config.history_path.clone(),
            theme: Theme::default(),
            runtime,
            tx,
            rx,
            next_tick: None,
            next_blink: None,
            running: true,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before a panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        if let Some(monitor) = &self.monitor {
            let effects = monitor.init();
            self.apply_all(effects);
        }

        while self.running {
            if let Some(monitor) = &self.monitor {
                let theme = &self.theme;
                terminal.draw(|f| super::ui::draw(f, monitor, theme))?;
            }

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.dispatch(Msg::Key(map_key(key)));
            }

            while let Ok(msg) = self.rx.try_recv() {
                self.dispatch(msg);
            }

            let now = Instant::now();
            if self.next_tick.is_some_and(|at| now >= at) {
                self.next_tick = None;
                self.dispatch(Msg::Tick);
            }
            if self.next_blink.is_some_and(|at| now >= at) {
                self.next_blink = None;
                self.dispatch(Msg::BlinkTick);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, msg: Msg) {
        let Some(monitor) = self.monitor.take() else {
            return;
        };
        let (monitor, effects) = monitor.update(msg);
        self.monitor = Some(monitor);
        self.apply_all(effects);
    }

    fn apply_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Fetch => self.spawn_fetch(),
            Effect::ScheduleTick(delay) => self.next_tick = Some(Instant::now() + delay),
            Effect::ScheduleBlink(delay) => self.next_blink = Some(Instant::now() + delay),
            Effect::Persist => {
                if let Some(monitor) = &self.monitor
                    && let Err(e) = monitor.store().persist(&self.history_path)
                {
                    log::warn!(
                        "could not write history to {}: {e}",
                        self.history_path.display()
                    );
                }
            }
            Effect::Quit => self.running = false,
        }
    }

    fn spawn_fetch(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = client.fetch_summary().await;
            // The receiver is gone once the app has quit.
            let _ = tx.send(Msg::FetchResult {
                fetched_at: Utc::now(),
                result,
            });
        });
    }
}
