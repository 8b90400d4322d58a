//! Property tests for the unlock gate and mode toggles.

use std::sync::Arc;

use habitdeck_core::clock::ManualClock;
use habitdeck_core::modes::{Mode, ModeToggle};
use habitdeck_core::storage::{keys, MemoryStore, PreferenceStore};
use habitdeck_core::surface::DocumentState;
use habitdeck_core::unlock::{UnlockGate, UNLOCK_DURATION_MS};
use proptest::prelude::*;

const MINUTE_MS: u64 = 60 * 1000;

fn gate(store: &MemoryStore, clock: &ManualClock) -> UnlockGate<MemoryStore> {
    UnlockGate::new(store.clone(), Arc::new(clock.clone()))
}

proptest! {
    #[test]
    fn locked_iff_no_expiry_or_past_it(
        now in 0u64..4_000_000_000_000,
        expiry in proptest::option::of(0u64..4_000_000_000_000),
    ) {
        let store = MemoryStore::new();
        if let Some(expiry) = expiry {
            store.set(keys::UNLOCK_EXPIRY, &expiry.to_string()).unwrap();
        }
        let clock = ManualClock::new(now);
        let expected = match expiry {
            Some(expiry) => now >= expiry,
            None => true,
        };
        prop_assert_eq!(gate(&store, &clock).is_locked(), expected);
    }

    #[test]
    fn unlock_opens_for_exactly_the_window(
        t in 0u64..4_000_000_000_000,
        previous in proptest::option::of(any::<u64>()),
    ) {
        let store = MemoryStore::new();
        if let Some(previous) = previous {
            store.set(keys::UNLOCK_EXPIRY, &previous.to_string()).unwrap();
        }
        let clock = ManualClock::new(t);
        let mut g = gate(&store, &clock);
        let mut doc = DocumentState::new();

        let expiry = g.unlock(&mut doc).unwrap();
        prop_assert_eq!(expiry, t + UNLOCK_DURATION_MS);
        let stored = store.get(keys::UNLOCK_EXPIRY).unwrap();
        prop_assert_eq!(stored, Some(expiry.to_string()));

        clock.set(t + UNLOCK_DURATION_MS - MINUTE_MS);
        prop_assert!(!g.is_locked());
        clock.set(t + UNLOCK_DURATION_MS + MINUTE_MS);
        prop_assert!(g.is_locked());
    }

    #[test]
    fn garbage_expiry_reads_as_locked(raw in "[^0-9]*|-[0-9]+|[0-9]+\\.[0-9]+") {
        let store = MemoryStore::new();
        store.set(keys::UNLOCK_EXPIRY, &raw).unwrap();
        let clock = ManualClock::new(0);
        prop_assert!(gate(&store, &clock).is_locked());
    }

    #[test]
    fn double_toggle_restores_value_and_presentation(
        theme in any::<bool>(),
        initially_on in proptest::option::of(any::<bool>()),
    ) {
        let mode = if theme { Mode::Theme } else { Mode::Focus };
        let store = MemoryStore::new();
        if let Some(on) = initially_on {
            store.set(mode.key(), mode.encode(on)).unwrap();
        }
        let mut doc = DocumentState::new();
        let mut toggle = ModeToggle::new(mode, &store);
        let restored = toggle.restore(&mut doc);
        let before = format!("{:?}", doc.classes(habitdeck_core::Element::Body));

        toggle.toggle(&mut doc).unwrap();
        toggle.toggle(&mut doc).unwrap();

        prop_assert_eq!(toggle.is_on(), restored);
        prop_assert_eq!(store.get(mode.key()).unwrap(), Some(mode.encode(restored).to_string()));
        prop_assert_eq!(format!("{:?}", doc.classes(habitdeck_core::Element::Body)), before);
    }
}

#[test]
fn restore_then_toggle_equals_toggle_from_unset() {
    for mode in [Mode::Focus, Mode::Theme] {
        let a = MemoryStore::new();
        let mut doc_a = DocumentState::new();
        let mut toggle_a = ModeToggle::new(mode, &a);
        toggle_a.restore(&mut doc_a);
        toggle_a.toggle(&mut doc_a).unwrap();

        let b = MemoryStore::new();
        let mut doc_b = DocumentState::new();
        let mut toggle_b = ModeToggle::new(mode, &b);
        toggle_b.toggle(&mut doc_b).unwrap();

        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(toggle_a.is_on(), toggle_b.is_on());
    }
}
