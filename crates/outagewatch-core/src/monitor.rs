//! Monitor state and its transition function.
//!
//! Front-ends own the clock, the network and the terminal. They feed every
//! event to [`Monitor::update`] one at a time and carry out the returned
//! [`Effect`]s. The history store is only mutated while handling
//! [`Msg::FetchResult`], so a redraw always sees a completed mutation.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::feed::FeedSummary;
use crate::store::{Ingested, SeriesStore};

/// Keys the monitor reacts to. Front-ends map their key events onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Quit,
    Refresh,
    ToggleChart,
    Other,
}

/// Events delivered to the monitor.
#[derive(Debug)]
pub enum Msg {
    /// Poll timer fired.
    Tick,
    /// Status blink timer fired.
    BlinkTick,
    /// A fetch issued earlier completed.
    FetchResult {
        fetched_at: DateTime<Utc>,
        result: Result<FeedSummary, FetchError>,
    },
    Key(Key),
}

/// Work the front-end must schedule after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start a feed fetch; its completion comes back as `Msg::FetchResult`.
    Fetch,
    /// Deliver `Msg::Tick` after the delay.
    ScheduleTick(Duration),
    /// Deliver `Msg::BlinkTick` after the delay.
    ScheduleBlink(Duration),
    /// Rewrite the history file from `Monitor::store`.
    Persist,
    Quit,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    store: SeriesStore,
    summary: Option<FeedSummary>,
    loading: bool,
    last_error: Option<String>,
    last_checked: Option<DateTime<Utc>>,
    blink_on: bool,
    show_chart: bool,
    poll_period: Duration,
    blink_period: Duration,
}

impl Monitor {
    pub fn new(store: SeriesStore, poll_period: Duration, blink_period: Duration) -> Self {
        Self {
            store,
            summary: None,
            loading: true,
            last_error: None,
            last_checked: None,
            blink_on: true,
            show_chart: false,
            poll_period,
            blink_period,
        }
    }

    /// Effects to run at startup: fetch right away and start both timers.
    pub fn init(&self) -> Vec<Effect> {
        vec![
            Effect::Fetch,
            Effect::ScheduleTick(self.poll_period),
            Effect::ScheduleBlink(self.blink_period),
        ]
    }

    pub fn update(mut self, msg: Msg) -> (Self, Vec<Effect>) {
        let effects = match msg {
            Msg::Tick => {
                self.loading = true;
                vec![Effect::Fetch, Effect::ScheduleTick(self.poll_period)]
            }
            Msg::BlinkTick => {
                self.blink_on = !self.blink_on;
                vec![Effect::ScheduleBlink(self.blink_period)]
            }
            Msg::FetchResult { fetched_at, result } => self.on_fetch(fetched_at, result),
            Msg::Key(key) => self.on_key(key),
        };
        (self, effects)
    }

    fn on_fetch(
        &mut self,
        fetched_at: DateTime<Utc>,
        result: Result<FeedSummary, FetchError>,
    ) -> Vec<Effect> {
        self.loading = false;
        self.last_checked = Some(fetched_at);

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("fetch failed: {e}");
                self.last_error = Some(e.to_string());
                return Vec::new();
            }
        };

        self.last_error = None;
        self.summary = Some(summary);

        match self.store.accept(summary.sample_at(fetched_at), fetched_at) {
            Some(outcome) => {
                log::debug!(
                    "{} bucket with {} affected ({} buckets kept)",
                    match outcome {
                        Ingested::Inserted => "new",
                        Ingested::Replaced => "updated",
                    },
                    summary.total_affected,
                    self.store.len()
                );
                vec![Effect::Persist]
            }
            None => {
                log::debug!("sample at {fetched_at} predates the last accepted bucket");
                Vec::new()
            }
        }
    }

    fn on_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Quit => vec![Effect::Quit],
            Key::Refresh => {
                self.loading = true;
                vec![Effect::Fetch]
            }
            Key::ToggleChart => {
                self.show_chart = !self.show_chart;
                Vec::new()
            }
            Key::Other => Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn summary(&self) -> Option<&FeedSummary> {
        self.summary.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    pub fn blink_on(&self) -> bool {
        self.blink_on
    }

    pub fn show_chart(&self) -> bool {
        self.show_chart
    }

    pub fn poll_period(&self) -> Duration {
        self.poll_period
    }

    /// Whether the "waiting for crew" count should be drawn highlighted now.
    pub fn highlight_waiting(&self) -> bool {
        self.blink_on && self.summary.is_some_and(|s| s.waiting_for_crew > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Bucket, RetentionPolicy};
    use chrono::TimeZone;

    const POLL: Duration = Duration::from_secs(30);
    const BLINK: Duration = Duration::from_millis(500);

    fn monitor() -> Monitor {
        Monitor::new(SeriesStore::new(RetentionPolicy::default()), POLL, BLINK)
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    fn fetched(h: u32, m: u32, total: i64) -> Msg {
        Msg::FetchResult {
            fetched_at: at(h, m),
            result: Ok(FeedSummary {
                total_affected: total,
                event_count: 2,
                waiting_for_crew: 1,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_init_fetches_and_starts_timers() {
        assert_eq!(
            monitor().init(),
            vec![
                Effect::Fetch,
                Effect::ScheduleTick(POLL),
                Effect::ScheduleBlink(BLINK)
            ]
        );
    }

    #[test]
    fn test_tick_fetches_and_reschedules() {
        let (m, effects) = monitor().update(Msg::Tick);
        assert!(m.is_loading());
        assert_eq!(effects, vec![Effect::Fetch, Effect::ScheduleTick(POLL)]);
    }

    #[test]
    fn test_blink_toggles() {
        let m = monitor();
        assert!(m.blink_on());
        let (m, effects) = m.update(Msg::BlinkTick);
        assert!(!m.blink_on());
        assert_eq!(effects, vec![Effect::ScheduleBlink(BLINK)]);
        let (m, _) = m.update(Msg::BlinkTick);
        assert!(m.blink_on());
    }

    #[test]
    fn test_fetch_success_ingests_and_persists() {
        let (m, effects) = monitor().update(fetched(10, 3, 5));
        assert_eq!(effects, vec![Effect::Persist]);
        assert!(!m.is_loading());
        assert_eq!(m.last_checked(), Some(at(10, 3)));
        assert_eq!(m.summary().unwrap().total_affected, 5);
        assert_eq!(
            m.store().snapshot(),
            &[Bucket {
                timestamp: at(10, 0),
                value: 5
            }]
        );
    }

    #[test]
    fn test_same_interval_overwrites() {
        let (m, _) = monitor().update(fetched(10, 3, 5));
        let (m, effects) = m.update(fetched(10, 7, 9));
        assert_eq!(effects, vec![Effect::Persist]);
        assert_eq!(
            m.store().snapshot(),
            &[Bucket {
                timestamp: at(10, 0),
                value: 9
            }]
        );
    }

    #[test]
    fn test_late_result_does_not_rewrite_history() {
        let (m, _) = monitor().update(fetched(10, 12, 5));
        let (m, effects) = m.update(fetched(10, 8, 1));
        assert!(effects.is_empty());
        assert_eq!(m.store().len(), 1);
        assert_eq!(m.store().latest().unwrap().value, 5);
        // The summary follows arrival order, not fetch time.
        assert_eq!(m.summary().unwrap().total_affected, 1);
    }

    #[test]
    fn test_fetch_error_keeps_previous_state() {
        let (m, _) = monitor().update(fetched(10, 3, 5));
        let (m, effects) = m.update(Msg::FetchResult {
            fetched_at: at(10, 20),
            result: Err(FetchError::Status(502)),
        });
        assert!(effects.is_empty());
        assert_eq!(m.last_error(), Some("feed returned status 502"));
        assert_eq!(m.summary().unwrap().total_affected, 5);
        assert_eq!(m.store().len(), 1);
        assert!(!m.is_loading());

        // A later success clears the error.
        let (m, _) = m.update(fetched(10, 30, 6));
        assert_eq!(m.last_error(), None);
    }

    #[test]
    fn test_keys() {
        let (m, effects) = monitor().update(Msg::Key(Key::ToggleChart));
        assert!(m.show_chart());
        assert!(effects.is_empty());

        let (m, effects) = m.update(Msg::Key(Key::Refresh));
        assert!(m.is_loading());
        assert_eq!(effects, vec![Effect::Fetch]);

        let (m, effects) = m.update(Msg::Key(Key::Other));
        assert!(effects.is_empty());

        let (_, effects) = m.update(Msg::Key(Key::Quit));
        assert_eq!(effects, vec![Effect::Quit]);
    }

    #[test]
    fn test_highlight_waiting_follows_blink() {
        let m = monitor();
        assert!(!m.highlight_waiting());
        let (m, _) = m.update(fetched(10, 3, 5));
        assert!(m.highlight_waiting());
        let (m, _) = m.update(Msg::BlinkTick);
        assert!(!m.highlight_waiting());
    }
}
