//! Debounced saving of the free-text note.
//!
//! Every edit restarts a quiet timer; only the text present when the timer
//! runs out is written. Per selected date the committer moves through:
//!
//! ```text
//! select_date ──> PendingInitial ──(first value settles, no write)──> Idle
//!                       │                                             │
//!                   on_change <───────────────────────────────── on_change
//!                                                                     │
//!            Idle <── write settles ── Committing <── timer ── Debouncing
//! ```
//!
//! The first value to settle after a date is selected is the note that was
//! loaded for it, so it never produces a write.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::models::EntryPatch;
use crate::store::DiaryStore;

/// Where the committer stands for the selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending.
    Idle,
    /// Waiting for the loaded note to settle; nothing will be written.
    PendingInitial,
    /// An edit is waiting out the quiet period.
    Debouncing,
    /// The settled text is being written.
    Committing,
}

struct State {
    date: Option<NaiveDate>,
    phase: Phase,
    text: Option<String>,
    /// Bumped on every edit and date switch; a timer or write that finds a
    /// different value has been superseded.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    /// Writes started but not yet settled, for any date.
    writes_in_flight: usize,
    last_error: Option<String>,
}

struct Inner {
    store: Arc<dyn DiaryStore>,
    quiet_period: Duration,
    state: Mutex<State>,
    /// Woken whenever a write finishes.
    written: Notify,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Coalesces note edits into one write per pause in typing.
///
/// Cloning yields another handle to the same committer. Must be used from
/// within a tokio runtime.
#[derive(Clone)]
pub struct NoteCommitter {
    inner: Arc<Inner>,
}

impl NoteCommitter {
    pub fn new(store: Arc<dyn DiaryStore>, quiet_period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                quiet_period,
                state: Mutex::new(State {
                    date: None,
                    phase: Phase::Idle,
                    text: None,
                    generation: 0,
                    timer: None,
                    writes_in_flight: 0,
                    last_error: None,
                }),
                written: Notify::new(),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.inner.lock().date
    }

    /// The text to display: the latest edit, or the last stored note.
    pub fn text(&self) -> Option<String> {
        self.inner.lock().text.clone()
    }

    /// Takes the error of the last failed write, if it has not been shown yet.
    pub fn take_error(&self) -> Option<String> {
        self.inner.lock().last_error.take()
    }

    /// Switches to `date`, waiting for its loaded note before writing anything.
    ///
    /// An edit still waiting out its quiet period is written to the date it
    /// was typed for.
    pub fn select_date(&self, date: NaiveDate) {
        let mut state = self.inner.lock();
        if state.date == Some(date) {
            return;
        }

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        let pending = match (state.phase, state.date, state.text.take()) {
            (Phase::Debouncing, Some(previous), Some(text)) => Some((previous, text)),
            _ => None,
        };

        state.date = Some(date);
        state.phase = Phase::PendingInitial;
        state.generation += 1;

        if let Some((previous, text)) = pending {
            tracing::debug!("Flushing pending note for {} on date switch", previous);
            state.writes_in_flight += 1;
            let inner = self.inner.clone();
            tokio::spawn(Self::save(inner, previous, text, None));
        }
    }

    /// Records an edit and restarts the quiet timer.
    pub fn on_change(&self, text: impl Into<String>) {
        let mut state = self.inner.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        state.text = Some(text.into());
        state.generation += 1;
        if state.phase != Phase::PendingInitial {
            state.phase = Phase::Debouncing;
        }

        let generation = state.generation;
        let inner = self.inner.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.quiet_period).await;
            Self::elapse(inner, generation).await;
        }));
    }

    /// Feeds a note read from the store.
    ///
    /// Before the first value has settled this counts as that value. When
    /// idle it refreshes the displayed text without writing. While an edit
    /// is pending the edit wins and the stored value is ignored.
    pub fn observe_stored(&self, text: &str) {
        let phase = {
            let mut state = self.inner.lock();
            match state.phase {
                Phase::Idle => {
                    state.text = Some(text.to_string());
                    return;
                }
                phase => phase,
            }
        };
        if phase == Phase::PendingInitial {
            self.on_change(text);
        }
    }

    /// Takes `text` as the loaded note without waiting for it to settle.
    ///
    /// Only has an effect before the first value has settled.
    pub fn settle_initial(&self, text: &str) {
        let mut state = self.inner.lock();
        if state.phase != Phase::PendingInitial {
            return;
        }
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.text = Some(text.to_string());
        state.generation += 1;
        state.phase = Phase::Idle;
    }

    /// Writes a pending edit now instead of waiting for the timer, then
    /// waits until every write in progress has settled.
    pub async fn flush(&self) {
        let pending = {
            let mut state = self.inner.lock();
            if state.phase == Phase::Debouncing {
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }
                Some(state.generation)
            } else {
                None
            }
        };
        if let Some(generation) = pending {
            Self::elapse(self.inner.clone(), generation).await;
        }

        loop {
            let written = self.inner.written.notified();
            if self.inner.lock().writes_in_flight == 0 {
                return;
            }
            written.await;
        }
    }

    /// Runs when the quiet period for edit `generation` has passed.
    async fn elapse(inner: Arc<Inner>, generation: u64) {
        let (date, text) = {
            let mut state = inner.lock();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            match state.phase {
                Phase::PendingInitial => {
                    tracing::debug!("Initial note settled; not saving");
                    state.phase = Phase::Idle;
                    return;
                }
                Phase::Debouncing => {}
                Phase::Idle | Phase::Committing => return,
            }
            let (Some(date), Some(text)) = (state.date, state.text.clone()) else {
                state.phase = Phase::Idle;
                return;
            };
            state.phase = Phase::Committing;
            state.writes_in_flight += 1;
            (date, text)
        };

        Self::save(inner, date, text, Some(generation)).await;
    }

    /// Writes `text` as the note of `date`. The caller has counted the write
    /// in `writes_in_flight`.
    ///
    /// `generation` is the edit being committed for the selected date; it is
    /// `None` for a write flushed on a date switch, which never touches the
    /// displayed state.
    async fn save(inner: Arc<Inner>, date: NaiveDate, text: String, generation: Option<u64>) {
        tracing::debug!("Saving note for {}", date);
        let result = inner.store.update(date, EntryPatch::note(text)).await;

        {
            let mut state = inner.lock();
            state.writes_in_flight -= 1;
            if let Err(e) = &result {
                tracing::warn!("Failed to save note for {}: {}", date, e);
                state.last_error = Some(e.to_string());
            }
            // Otherwise a newer edit or a date switch owns the state now.
            if generation == Some(state.generation) {
                state.phase = Phase::Idle;
                if result.is_err() {
                    state.text = Some(inner.store.peek(date).entry.note);
                }
            }
        }
        inner.written.notify_waiters();
    }
}
