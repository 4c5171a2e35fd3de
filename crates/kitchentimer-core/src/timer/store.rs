//! Observable, thread-safe holders for published timer state.
//!
//! Every store wraps a `tokio::sync::watch` channel: a write replaces the
//! whole value in one step and readers either borrow the latest value or
//! subscribe for change notifications. Readers never see a half-written
//! `TimerState` or a half-updated extra-timer collection.
//!
//! Writes are `pub(crate)`: only the engine and the lifecycle manager
//! publish, and both do so while holding the [`TimerStores`] write gate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tokio::sync::watch;

use super::state::{ExtraTimerId, Snapshot, TimerCountdownEntry, TimerState};

/// Immutable view of the extra-timer countdowns, in insertion order.
pub type Countdowns = Arc<IndexMap<ExtraTimerId, TimerState>>;

/// Generic atomic observable value.
#[derive(Debug)]
pub struct Store<T> {
    tx: watch::Sender<T>,
}

impl<T> Store<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub(crate) fn replace(&self, value: T) -> T {
        self.tx.send_replace(value)
    }

    /// Publish `value` only when it differs, so derived observers are not
    /// woken on every tick.
    pub(crate) fn set_if_changed(&self, value: T)
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Whole-seconds-remaining and completed-flag views of one countdown.
#[derive(Debug, Default)]
pub struct DerivedObservables {
    seconds_remaining: Store<u64>,
    completed: Store<bool>,
}

impl DerivedObservables {
    fn from_state(state: Option<&TimerState>) -> Self {
        let derived = Self::default();
        derived.update(state);
        derived
    }

    fn update(&self, state: Option<&TimerState>) {
        self.seconds_remaining
            .set_if_changed(state.map(TimerState::display_seconds).unwrap_or(0));
        self.completed
            .set_if_changed(state.is_some_and(|s| s.is_finished));
    }

    pub fn seconds_remaining(&self) -> watch::Receiver<u64> {
        self.seconds_remaining.subscribe()
    }

    pub fn completed(&self) -> watch::Receiver<bool> {
        self.completed.subscribe()
    }
}

/// Holder for the main timer. `None` means no timer is running.
#[derive(Debug, Default)]
pub struct MainTimerStore {
    state: Store<Option<TimerState>>,
    derived: DerivedObservables,
}

impl MainTimerStore {
    pub fn get(&self) -> Option<TimerState> {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TimerState>> {
        self.state.subscribe()
    }

    /// Whole seconds remaining; zero while absent.
    pub fn seconds_remaining(&self) -> watch::Receiver<u64> {
        self.derived.seconds_remaining()
    }

    /// Finished flag; `false` while absent.
    pub fn completed(&self) -> watch::Receiver<bool> {
        self.derived.completed()
    }

    pub(crate) fn publish(&self, state: Option<TimerState>) {
        self.state.replace(state);
        self.derived.update(state.as_ref());
    }
}

/// Holder for the extra-timer countdown collection.
///
/// Per-id derived observables are created the first time an id is
/// published and dropped when it disappears; subscribers of a dropped id
/// see their channel close.
#[derive(Debug)]
pub struct ExtraTimerStore {
    entries: Store<Countdowns>,
    derived: Mutex<HashMap<ExtraTimerId, DerivedObservables>>,
}

impl Default for ExtraTimerStore {
    fn default() -> Self {
        Self {
            entries: Store::new(Arc::new(IndexMap::new())),
            derived: Mutex::new(HashMap::new()),
        }
    }
}

impl ExtraTimerStore {
    pub fn snapshot(&self) -> Countdowns {
        self.entries.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdowns> {
        self.entries.subscribe()
    }

    pub fn get(&self, id: &ExtraTimerId) -> Option<TimerState> {
        self.snapshot().get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn seconds_remaining(&self, id: &ExtraTimerId) -> Option<watch::Receiver<u64>> {
        self.derived().get(id).map(DerivedObservables::seconds_remaining)
    }

    pub fn completed(&self, id: &ExtraTimerId) -> Option<watch::Receiver<bool>> {
        self.derived().get(id).map(DerivedObservables::completed)
    }

    pub fn entries(&self) -> Vec<TimerCountdownEntry> {
        self.snapshot()
            .iter()
            .map(|(id, state)| TimerCountdownEntry { id: *id, state: *state })
            .collect()
    }

    /// Replace the whole collection in one publish.
    pub(crate) fn publish(&self, countdowns: IndexMap<ExtraTimerId, TimerState>) {
        let countdowns = Arc::new(countdowns);
        self.entries.replace(Arc::clone(&countdowns));

        let mut derived = self.derived();
        derived.retain(|id, _| countdowns.contains_key(id));
        for (id, state) in countdowns.iter() {
            match derived.get(id) {
                Some(observables) => observables.update(Some(state)),
                None => {
                    derived.insert(*id, DerivedObservables::from_state(Some(state)));
                }
            }
        }
    }

    /// Ids that currently have derived observables, i.e. ids observers
    /// were told about.
    pub(crate) fn tracked_ids(&self) -> Vec<ExtraTimerId> {
        self.derived().keys().copied().collect()
    }

    /// Swap the collection without touching the derived observables.
    #[cfg(test)]
    pub(crate) fn replace_entries_only(&self, countdowns: IndexMap<ExtraTimerId, TimerState>) {
        self.entries.replace(Arc::new(countdowns));
    }

    fn derived(&self) -> MutexGuard<'_, HashMap<ExtraTimerId, DerivedObservables>> {
        self.derived.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Both stores plus the gate that serializes every writer.
#[derive(Debug, Default)]
pub struct TimerStores {
    pub main: MainTimerStore,
    pub extras: ExtraTimerStore,
    write_gate: Mutex<()>,
}

impl TimerStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            main: self.main.get(),
            extras: self.extras.entries(),
        }
    }

    /// Held for the full read-modify-publish of a tick or lifecycle call.
    pub(crate) fn write(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
