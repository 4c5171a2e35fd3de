//! Start/pause/resume/reset orchestration.
//!
//! The lifecycle manager owns the extra-timer input collection and is the
//! only component that adds, removes, or resets countdown entries. All
//! validation happens in [`TimerLifecycleManager::start`] before any store
//! is touched: either every timer is (re)initialized or none is.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::input::{DurationInputParser, DurationLimit, ExtraTimerInput, WholeNumberParser};
use super::state::{ExtraTimerId, TimerState};
use super::store::TimerStores;
use crate::error::{IllegalStateError, InputField, ValidationError, ValidationErrors};
use crate::events::Event;

/// Units and bounds applied to the main and extra inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerLimits {
    pub main: DurationLimit,
    pub extra: DurationLimit,
}

impl Default for TimerLimits {
    fn default() -> Self {
        Self {
            main: DurationLimit::minutes(999),
            extra: DurationLimit::minutes(999),
        }
    }
}

pub struct TimerLifecycleManager<P = WholeNumberParser> {
    stores: Arc<TimerStores>,
    parser: P,
    limits: TimerLimits,
    inputs: Mutex<IndexMap<ExtraTimerId, ExtraTimerInput>>,
}

impl TimerLifecycleManager<WholeNumberParser> {
    pub fn new(stores: Arc<TimerStores>, limits: TimerLimits) -> Self {
        Self::with_parser(stores, limits, WholeNumberParser)
    }
}

impl<P: DurationInputParser> TimerLifecycleManager<P> {
    pub fn with_parser(stores: Arc<TimerStores>, limits: TimerLimits, parser: P) -> Self {
        Self {
            stores,
            parser,
            limits,
            inputs: Mutex::new(IndexMap::new()),
        }
    }

    pub fn stores(&self) -> &Arc<TimerStores> {
        &self.stores
    }

    pub fn limits(&self) -> TimerLimits {
        self.limits
    }

    /// Main timer present and not paused.
    pub fn is_running(&self) -> bool {
        self.stores.main.get().is_some_and(|s| !s.is_paused)
    }

    // ── Extra timer inputs ───────────────────────────────────────────

    /// Register a new extra timer and create its countdown entry.
    ///
    /// With no main timer the entry stays idle and `duration_text` is only
    /// checked by the next `start()`. Once a main timer exists the entry
    /// joins the running batch, so the text is validated here and seeds
    /// `remaining`; nothing is registered when it is invalid.
    pub fn add_extra_timer(
        &self,
        label: impl Into<String>,
        duration_text: impl Into<String>,
    ) -> Result<(ExtraTimerId, Event), ValidationError> {
        let _gate = self.stores.write();
        let input = ExtraTimerInput::new(label, duration_text);
        let id = input.id;

        let state = match self.stores.main.get() {
            Some(_) => {
                let remaining = self
                    .parser
                    .parse(&input.duration_text, self.limits.extra)
                    .map_err(|reason| ValidationError {
                        field: InputField::Extra(id),
                        reason,
                    })?;
                TimerState::running(remaining)
            }
            None => TimerState::default(),
        };

        let label = input.label.clone();
        self.inputs().insert(id, input);
        let mut countdowns = (*self.stores.extras.snapshot()).clone();
        countdowns.insert(id, state);
        self.stores.extras.publish(countdowns);

        tracing::debug!(%id, %label, remaining_ms = state.remaining.as_millis() as u64, "extra timer added");
        Ok((id, Event::ExtraTimerAdded { id, label, at: Utc::now() }))
    }

    /// Drop an extra timer's input and countdown together.
    pub fn remove_extra_timer(&self, id: ExtraTimerId) -> Result<Event, IllegalStateError> {
        let _gate = self.stores.write();
        self.inputs()
            .shift_remove(&id)
            .ok_or(IllegalStateError::UnknownExtraTimer(id))?;

        let mut countdowns = (*self.stores.extras.snapshot()).clone();
        countdowns.shift_remove(&id);
        self.stores.extras.publish(countdowns);

        tracing::debug!(%id, "extra timer removed");
        Ok(Event::ExtraTimerRemoved { id, at: Utc::now() })
    }

    /// Edit an extra timer's input. Takes effect on the next `start()`.
    pub fn update_extra_timer(
        &self,
        id: ExtraTimerId,
        label: Option<String>,
        duration_text: Option<String>,
    ) -> Result<(), IllegalStateError> {
        let mut inputs = self.inputs();
        let input = inputs
            .get_mut(&id)
            .ok_or(IllegalStateError::UnknownExtraTimer(id))?;
        if let Some(label) = label {
            input.label = label;
        }
        if let Some(text) = duration_text {
            input.duration_text = text;
        }
        Ok(())
    }

    pub fn extra_inputs(&self) -> Vec<ExtraTimerInput> {
        self.inputs().values().cloned().collect()
    }

    pub fn extra_input(&self, id: &ExtraTimerId) -> Option<ExtraTimerInput> {
        self.inputs().get(id).cloned()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// `start()` with the registered extra-timer inputs, read under the
    /// same gate as the reconcile.
    pub fn start_with_inputs(&self, main_text: &str) -> Result<Event, ValidationErrors> {
        let _gate = self.stores.write();
        let extras = self.extra_inputs();
        self.start_gated(main_text, &extras)
    }

    /// Validate every input, then seed the main timer and reconcile the
    /// extra countdowns with `extras`.
    ///
    /// Only inputs whose id is still registered take part; an input removed
    /// since the caller read it is ignored. Reconciliation drops countdowns
    /// whose id is not in `extras`, creates default entries for new ids,
    /// and refreshes only `remaining` for ids that persist.
    pub fn start(
        &self,
        main_text: &str,
        extras: &[ExtraTimerInput],
    ) -> Result<Event, ValidationErrors> {
        let _gate = self.stores.write();
        self.start_gated(main_text, extras)
    }

    fn start_gated(
        &self,
        main_text: &str,
        extras: &[ExtraTimerInput],
    ) -> Result<Event, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let main = self
            .parser
            .parse(main_text, self.limits.main)
            .map_err(|reason| errors.push(ValidationError { field: InputField::Main, reason }));

        let registered = self.inputs();
        let mut seeds: IndexMap<ExtraTimerId, Duration> = IndexMap::with_capacity(extras.len());
        for input in extras {
            if !registered.contains_key(&input.id) {
                tracing::debug!(id = %input.id, "ignoring input for unregistered extra timer");
                continue;
            }
            match self.parser.parse(&input.duration_text, self.limits.extra) {
                Ok(duration) => {
                    seeds.insert(input.id, duration);
                }
                Err(reason) => errors.push(ValidationError {
                    field: InputField::Extra(input.id),
                    reason,
                }),
            }
        }
        drop(registered);

        let main = match main {
            Ok(duration) if errors.is_empty() => duration,
            _ => {
                tracing::debug!(%errors, "start rejected");
                return Err(errors);
            }
        };

        self.stores.main.publish(Some(TimerState::running(main)));

        let current = self.stores.extras.snapshot();
        let reconciled: IndexMap<_, _> = seeds
            .iter()
            .map(|(id, duration)| {
                let state = current.get(id).copied().unwrap_or_default();
                (*id, state.with_remaining(*duration))
            })
            .collect();
        self.stores.extras.publish(reconciled);

        tracing::debug!(main_ms = main.as_millis() as u64, extras = seeds.len(), "timers started");
        Ok(Event::TimerStarted {
            main,
            extras: seeds.len(),
            at: Utc::now(),
        })
    }

    /// Pause every timer.
    ///
    /// Callers must gate this: pausing with no main timer or while already
    /// paused is an error.
    pub fn pause(&self) -> Result<Event, IllegalStateError> {
        let _gate = self.stores.write();
        let main = self.stores.main.get().ok_or(IllegalStateError::NotRunning)?;
        if main.is_paused {
            return Err(IllegalStateError::AlreadyPaused);
        }
        self.stores.main.publish(Some(main.with_paused(true)));

        tracing::debug!(remaining_ms = main.remaining.as_millis() as u64, "timers paused");
        Ok(Event::TimerPaused {
            remaining: main.remaining,
            at: Utc::now(),
        })
    }

    /// Resume after [`pause`](Self::pause).
    pub fn resume(&self) -> Result<Event, IllegalStateError> {
        let _gate = self.stores.write();
        let main = self.stores.main.get().ok_or(IllegalStateError::NotRunning)?;
        if !main.is_paused {
            return Err(IllegalStateError::NotPaused);
        }
        self.stores.main.publish(Some(main.with_paused(false)));

        tracing::debug!(remaining_ms = main.remaining.as_millis() as u64, "timers resumed");
        Ok(Event::TimerResumed {
            remaining: main.remaining,
            at: Utc::now(),
        })
    }

    /// Clear all runtime progress. Extra timer ids survive.
    pub fn reset(&self) -> Event {
        let _gate = self.stores.write();
        self.stores.main.publish(None);

        let cleared = self
            .stores
            .extras
            .snapshot()
            .keys()
            .map(|id| (*id, TimerState::default()))
            .collect();
        self.stores.extras.publish(cleared);

        tracing::debug!("timers reset");
        Event::TimerReset { at: Utc::now() }
    }

    fn inputs(&self) -> MutexGuard<'_, IndexMap<ExtraTimerId, ExtraTimerInput>> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationReason;

    fn manager() -> TimerLifecycleManager {
        TimerLifecycleManager::new(Arc::new(TimerStores::new()), TimerLimits::default())
    }

    #[test]
    fn start_seeds_main_and_extras() {
        let lifecycle = manager();
        let (rice, _) = lifecycle.add_extra_timer("Rice", "15").unwrap();
        let (eggs, _) = lifecycle.add_extra_timer("Eggs", "7").unwrap();

        lifecycle.start_with_inputs("20").unwrap();

        let stores = lifecycle.stores();
        assert_eq!(stores.main.get(), Some(TimerState::running(Duration::from_secs(1_200))));
        let extras = stores.extras.snapshot();
        assert_eq!(extras.keys().copied().collect::<Vec<_>>(), vec![rice, eggs]);
        assert_eq!(extras[&eggs].remaining, Duration::from_secs(420));
    }

    #[test]
    fn invalid_extra_blocks_whole_start() {
        let lifecycle = manager();
        let (bad, _) = lifecycle.add_extra_timer("Pasta", "soon").unwrap();

        let errors = lifecycle.start_with_inputs("10").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.for_field(InputField::Extra(bad)).map(|e| &e.reason),
            Some(&ValidationReason::NotANumber("soon".into()))
        );
        assert!(lifecycle.stores().main.get().is_none());
        assert_eq!(lifecycle.stores().extras.get(&bad), Some(TimerState::default()));
    }

    #[test]
    fn every_bad_field_is_reported() {
        let lifecycle = manager();
        let (bad, _) = lifecycle.add_extra_timer("Pasta", "0").unwrap();
        let errors = lifecycle.start_with_inputs("").unwrap_err();
        assert!(errors.for_field(InputField::Main).is_some());
        assert!(errors.for_field(InputField::Extra(bad)).is_some());
    }

    #[test]
    fn restart_refreshes_only_remaining() {
        let lifecycle = manager();
        let (id, _) = lifecycle.add_extra_timer("Bread", "5").unwrap();
        lifecycle.start_with_inputs("10").unwrap();

        let finished = TimerState {
            remaining: Duration::from_millis(300),
            is_finished: true,
            alert_triggered: true,
            ..TimerState::default()
        };
        lifecycle
            .stores()
            .extras
            .publish(IndexMap::from([(id, finished)]));

        lifecycle.update_extra_timer(id, None, Some("8".into())).unwrap();
        lifecycle.start_with_inputs("10").unwrap();

        let state = lifecycle.stores().extras.get(&id).unwrap();
        assert_eq!(state.remaining, Duration::from_secs(480));
        assert!(state.is_finished && state.alert_triggered);
    }

    #[test]
    fn start_drops_vanished_ids() {
        let lifecycle = manager();
        let (keep, _) = lifecycle.add_extra_timer("Keep", "1").unwrap();
        lifecycle.add_extra_timer("Drop", "1").unwrap();

        let inputs: Vec<_> = lifecycle
            .extra_inputs()
            .into_iter()
            .filter(|i| i.id == keep)
            .collect();
        lifecycle.start("3", &inputs).unwrap();

        assert_eq!(lifecycle.stores().extras.len(), 1);
        assert!(lifecycle.stores().extras.get(&keep).is_some());
    }

    #[test]
    fn add_while_running_validates_and_seeds_remaining() {
        let lifecycle = manager();
        lifecycle.start("10", &[]).unwrap();

        let error = lifecycle.add_extra_timer("Soup", "later").unwrap_err();
        assert_eq!(error.reason, ValidationReason::NotANumber("later".into()));
        assert!(lifecycle.extra_inputs().is_empty());
        assert!(lifecycle.stores().extras.is_empty());

        let (soup, _) = lifecycle.add_extra_timer("Soup", "3").unwrap();
        assert_eq!(
            lifecycle.stores().extras.get(&soup),
            Some(TimerState::running(Duration::from_secs(180)))
        );
    }

    #[test]
    fn add_before_start_defers_validation() {
        let lifecycle = manager();
        let (id, _) = lifecycle.add_extra_timer("Soup", "later").unwrap();
        assert_eq!(lifecycle.stores().extras.get(&id), Some(TimerState::default()));
    }

    #[test]
    fn start_skips_unregistered_inputs() {
        let lifecycle = manager();
        let (kept, _) = lifecycle.add_extra_timer("Kept", "2").unwrap();
        let (gone, _) = lifecycle.add_extra_timer("Gone", "4").unwrap();
        let stale = lifecycle.extra_inputs();
        lifecycle.remove_extra_timer(gone).unwrap();

        let event = lifecycle.start("5", &stale).unwrap();

        assert!(matches!(event, Event::TimerStarted { extras: 1, .. }));
        let extras = lifecycle.stores().extras.snapshot();
        assert_eq!(extras.keys().copied().collect::<Vec<_>>(), vec![kept]);
    }

    #[test]
    fn remove_drops_input_and_countdown() {
        let lifecycle = manager();
        let (id, _) = lifecycle.add_extra_timer("Sauce", "4").unwrap();
        assert!(lifecycle.stores().extras.completed(&id).is_some());

        lifecycle.remove_extra_timer(id).unwrap();

        assert!(lifecycle.extra_inputs().is_empty());
        assert!(lifecycle.stores().extras.is_empty());
        assert!(lifecycle.stores().extras.completed(&id).is_none());
        assert_eq!(
            lifecycle.remove_extra_timer(id),
            Err(IllegalStateError::UnknownExtraTimer(id))
        );
    }

    #[test]
    fn pause_and_resume_require_matching_state() {
        let lifecycle = manager();
        assert_eq!(lifecycle.pause(), Err(IllegalStateError::NotRunning));
        assert_eq!(lifecycle.resume(), Err(IllegalStateError::NotRunning));

        lifecycle.start("1", &[]).unwrap();
        assert_eq!(lifecycle.resume(), Err(IllegalStateError::NotPaused));
        lifecycle.pause().unwrap();
        assert!(!lifecycle.is_running());
        assert_eq!(lifecycle.pause(), Err(IllegalStateError::AlreadyPaused));
        lifecycle.resume().unwrap();
        assert!(lifecycle.is_running());
    }

    #[test]
    fn reset_keeps_keys_and_clears_progress() {
        let lifecycle = manager();
        let (a, _) = lifecycle.add_extra_timer("A", "2").unwrap();
        let (b, _) = lifecycle.add_extra_timer("B", "3").unwrap();
        lifecycle.start_with_inputs("5").unwrap();

        lifecycle.reset();

        let stores = lifecycle.stores();
        assert!(stores.main.get().is_none());
        let extras = stores.extras.snapshot();
        assert_eq!(extras.keys().copied().collect::<Vec<_>>(), vec![a, b]);
        assert!(extras.values().all(|s| *s == TimerState::default()));
        assert_eq!(lifecycle.extra_inputs().len(), 2);
    }
}
