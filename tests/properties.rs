//! Property tests for reducer determinism and notification accounting.

use flux_store::actions::{self, AppAction};
use flux_store::slices::{self, selectors, Profile, UserData};
use flux_store::{create_store, replay, Reducer, SliceMap};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counter_action() -> impl Strategy<Value = AppAction> {
    prop_oneof![
        4 => Just(actions::increment()),
        4 => Just(actions::decrement()),
        1 => Just(actions::reset()),
        1 => (-50i64..50).prop_map(actions::set_value),
    ]
}

fn user_action() -> impl Strategy<Value = AppAction> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|name| actions::login(UserData {
            email: format!("{}@example.com", name),
            name,
            profile: None,
        })),
        Just(actions::logout()),
        proptest::option::of("[a-z ]{0,12}").prop_map(|bio| actions::update_profile(Profile {
            avatar: None,
            bio,
        })),
    ]
}

fn any_action() -> impl Strategy<Value = AppAction> {
    prop_oneof![counter_action(), user_action(), Just(AppAction::Init)]
}

fn as_json(state: &SliceMap) -> serde_json::Value {
    serde_json::to_value(state).unwrap()
}

proptest! {
    #[test]
    fn dispatch_matches_replay(actions in prop::collection::vec(any_action(), 0..40)) {
        let store = create_store(slices::root_reducer(), slices::initial_state(), None);
        for action in &actions {
            store.dispatch(action.clone()).unwrap();
        }

        let replayed = replay(
            &slices::root_reducer(),
            Arc::new(slices::initial_state()),
            &actions,
        )
        .unwrap();

        prop_assert_eq!(as_json(&store.get_state()), as_json(&replayed));
    }

    #[test]
    fn listeners_run_once_per_change(actions in prop::collection::vec(any_action(), 0..40)) {
        let store = create_store(slices::root_reducer(), slices::initial_state(), None);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut changes = 0u64;
        for action in actions {
            let before = store.get_state();
            store.dispatch(action).unwrap();
            if !Arc::ptr_eq(&before, &store.get_state()) {
                changes += 1;
            }
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst) as u64, changes);
        prop_assert_eq!(store.version().0, changes);
    }

    #[test]
    fn count_tracks_model(actions in prop::collection::vec(counter_action(), 0..60)) {
        let store = create_store(slices::root_reducer(), slices::initial_state(), None);
        let mut model = 0i64;

        for action in actions {
            model = match &action {
                AppAction::Increment => model + 1,
                AppAction::Decrement => (model - 1).max(0),
                AppAction::Reset => 0,
                AppAction::SetValue { value } => *value,
                _ => model,
            };
            store.dispatch(action).unwrap();
            prop_assert_eq!(selectors::count(&store.get_state()), model);
        }
    }

    #[test]
    fn user_actions_leave_counter_reference(
        setup in prop::collection::vec(counter_action(), 0..10),
        action in user_action(),
    ) {
        let reducer = slices::root_reducer();
        let state = replay(&reducer, Arc::new(slices::initial_state()), &setup).unwrap();
        let next = reducer.reduce(&state, &action).unwrap();

        prop_assert!(next.shares_slice(&state, slices::COUNTER));
    }

    #[test]
    fn init_is_idempotent(setup in prop::collection::vec(any_action(), 0..20)) {
        let reducer = slices::root_reducer();
        let state = replay(&reducer, Arc::new(slices::initial_state()), &setup).unwrap();
        let next = reducer.reduce(&state, &AppAction::Init).unwrap();

        prop_assert!(Arc::ptr_eq(&state, &next));
    }
}
