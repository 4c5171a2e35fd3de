//! Property tests for countdown state invariants.

mod common;

use std::time::Duration;

use common::Harness;
use kitchentimer_core::timer::{advance, Advance, TimerState, END_THRESHOLD};
use proptest::prelude::*;

fn elapsed_steps() -> impl Strategy<Value = Vec<Duration>> {
    prop::collection::vec((0u64..3_000).prop_map(Duration::from_millis), 1..80)
}

proptest! {
    #[test]
    fn advance_keeps_flags_monotonic(
        start_ms in 0u64..600_000,
        steps in elapsed_steps(),
    ) {
        let mut state = TimerState::running(Duration::from_millis(start_ms));
        let mut alerts = 0;

        for elapsed in steps {
            let before = state;
            let outcome = advance(&mut state, elapsed);

            prop_assert!(state.remaining <= before.remaining);
            prop_assert!(!state.alert_triggered || state.is_finished);
            prop_assert!(!before.is_finished || state.is_finished);
            if !state.is_finished {
                prop_assert!(state.remaining >= END_THRESHOLD);
            }

            match outcome {
                Advance::Skipped => prop_assert_eq!(state, before),
                Advance::Finished { alert } => {
                    prop_assert!(!before.is_finished);
                    prop_assert!(state.remaining < END_THRESHOLD);
                    if alert {
                        alerts += 1;
                    }
                }
                Advance::Counting => prop_assert!(!state.is_finished),
            }
        }

        prop_assert!(alerts <= 1);
    }

    #[test]
    fn every_timer_alerts_exactly_once_when_run_to_completion(
        main_secs in 1u64..30,
        extra_secs in prop::collection::vec(1u64..30, 0..6),
        step_ms in 50u64..400,
    ) {
        let h = Harness::new();
        for (i, secs) in extra_secs.iter().enumerate() {
            h.lifecycle.add_extra_timer(format!("extra {i}"), secs.to_string()).unwrap();
        }
        h.lifecycle.start_with_inputs(&main_secs.to_string()).unwrap();

        let longest = extra_secs.iter().copied().chain([main_secs]).max().unwrap_or(main_secs);
        let mut elapsed = Duration::ZERO;
        let mut finished_events = 0;
        while elapsed <= Duration::from_secs(longest) {
            let step = Duration::from_millis(step_ms);
            finished_events += h.engine.tick(step).unwrap().len();
            elapsed += step;
        }

        // Finishing the main timer stops the batch, so only extras shorter
        // than or tied with it are guaranteed to be done.
        let main = h.stores.main.get().unwrap();
        prop_assert!(main.is_finished);
        let done = h
            .stores
            .extras
            .snapshot()
            .values()
            .filter(|s| s.is_finished)
            .count();
        prop_assert_eq!(finished_events, done + 1);
        prop_assert_eq!(h.alerts.count(), done + 1);
        prop_assert_eq!(h.haptics.count(), done + 1);
    }
}
