//! # Store Properties
//!
//! The shared document under sequences of writes from one or several
//! contexts: left-fold, corruption recovery, shallow merge, reset, and
//! duplicate-free appends.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{record, RawContext, Via};
    use lt_01_state_store::DEFAULT_STATE_KEY;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use serde_json::{json, Map, Value};
    use shared_bus::BroadcastHub;
    use shared_types::{
        append_unique, ContextKind, GameMessage, GameState, OriginStorage, StorageArea, TabId,
    };

    // =============================================================================
    // LEFT-FOLD
    // =============================================================================

    #[derive(Debug, Clone)]
    enum Op {
        Unlock(u8),
        Fragment(String),
        Flag(u8, String),
        Narrate(String),
    }

    impl Op {
        fn apply(&self, mut state: GameState) -> GameState {
            match self {
                Op::Unlock(tab) => state.meta.unlock(TabId(*tab)),
                Op::Fragment(id) => {
                    append_unique(&mut state.player.code_fragments, id);
                }
                Op::Flag(tab, flag) => state.tab_mut(TabId(*tab)).set_flag(flag, true),
                Op::Narrate(line) => {
                    append_unique(&mut state.narrative.shown, line);
                }
            }
            state
        }
    }

    fn random_ops(rng: &mut StdRng, count: usize) -> Vec<Op> {
        (0..count)
            .map(|_| match rng.gen_range(0..4) {
                0 => Op::Unlock(rng.gen_range(1..=5)),
                1 => Op::Fragment(format!("f{}", rng.gen_range(0..6))),
                2 => Op::Flag(rng.gen_range(1..=5), format!("flag{}", rng.gen_range(0..3))),
                _ => Op::Narrate(format!("line{}", rng.gen_range(0..4))),
            })
            .collect()
    }

    #[test]
    fn test_sets_from_one_context_left_fold() {
        for seed in 0..8 {
            let origin = OriginStorage::new();
            let hub = BroadcastHub::new("lantern");
            let ctx = RawContext::tab(&origin, &hub, Via::Broadcast, 2);
            let mut rng = StdRng::seed_from_u64(seed);
            let ops = random_ops(&mut rng, 40);

            let mut last = GameState::default();
            for op in &ops {
                let op = op.clone();
                last = ctx.store.set(move |state| op.apply(state));
            }

            let expected = ops
                .iter()
                .fold(GameState::default(), |state, op| op.apply(state));
            assert_eq!(ctx.store.get(), expected, "seed {seed}");
            assert_eq!(last, expected, "seed {seed}");
        }
    }

    // =============================================================================
    // CORRUPTION
    // =============================================================================

    #[test]
    fn test_corrupt_value_resets_to_default() {
        for garbage in ["{not json", r#"{"tabs":3}"#, "[]", ""] {
            let origin = OriginStorage::new();
            let hub = BroadcastHub::new("lantern");
            let ctx = RawContext::tab(&origin, &hub, Via::Broadcast, 1);
            ctx.storage.set_item(DEFAULT_STATE_KEY, garbage).unwrap();

            assert_eq!(ctx.store.get(), GameState::default(), "{garbage:?}");
            let stored = ctx.storage.get_item(DEFAULT_STATE_KEY).unwrap();
            assert_eq!(GameState::from_json(&stored).unwrap(), GameState::default());
            assert_eq!(ctx.store.stats().recoveries, 1);
        }
    }

    // =============================================================================
    // MERGE
    // =============================================================================

    fn partial(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_field_accumulates_across_contexts() {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let a = RawContext::tab(&origin, &hub, Via::Broadcast, 4);
        let b = RawContext::tab(&origin, &hub, Via::Broadcast, 4);

        a.store.merge_field(TabId(4), &partial(json!({ "a": 1 })));
        b.store.merge_field(TabId(4), &partial(json!({ "b": 2 })));

        let record = a.store.get_field(TabId(4));
        assert_eq!(record.extra.get("a"), Some(&json!(1)));
        assert_eq!(record.extra.get("b"), Some(&json!(2)));
        assert_eq!(b.store.get_field(TabId(4)), record);
    }

    // =============================================================================
    // RESET
    // =============================================================================

    fn reset_is_announced_once(via: Via) {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let player = RawContext::tab(&origin, &hub, via, 3);
        let admin = RawContext::open(&origin, &hub, via, ContextKind::System);

        player.store.set(|mut state| {
            state.player.has_flashlight = true;
            state
        });
        player.bus.poll();
        let (_sub, seen) = record(&player.bus);

        admin.store.reset();
        player.bus.poll();

        assert_eq!(player.store.get(), GameState::default());
        let seen = seen.lock();
        let changes: Vec<_> = seen
            .iter()
            .filter(|e| matches!(e.message, GameMessage::StateChange(_)))
            .collect();
        assert_eq!(changes.len(), 1, "{via:?}");
        assert_eq!(changes[0].from_tab, None);
        assert_eq!(
            changes[0].message,
            GameMessage::StateChange(Box::new(GameState::default()))
        );
    }

    #[test]
    fn test_reset_broadcast() {
        reset_is_announced_once(Via::Broadcast);
    }

    #[test]
    fn test_reset_storage_fallback() {
        reset_is_announced_once(Via::Storage);
    }

    // =============================================================================
    // APPEND-ONLY COLLECTIONS
    // =============================================================================

    #[test]
    fn test_interleaved_appends_keep_each_fragment_once() {
        let fragments = ["alpha", "beta", "gamma", "delta", "epsilon"];

        for seed in 0..16 {
            let origin = OriginStorage::new();
            let hub = BroadcastHub::new("lantern");
            let contexts: Vec<RawContext> = (1..=5)
                .map(|tab| RawContext::tab(&origin, &hub, Via::Broadcast, tab))
                .collect();

            let mut rng = StdRng::seed_from_u64(seed);
            let mut writes: Vec<(usize, &str)> = fragments
                .iter()
                .map(|f| (rng.gen_range(0..contexts.len()), *f))
                .collect();
            // One context repeats an append another already made.
            writes.push((rng.gen_range(0..contexts.len()), fragments[seed as usize % 5]));
            writes.shuffle(&mut rng);

            for (index, fragment) in writes {
                contexts[index].store.set(|mut state| {
                    append_unique(&mut state.player.code_fragments, fragment);
                    state
                });
            }

            let mut held = contexts[0].store.get().player.code_fragments;
            held.sort();
            let mut expected: Vec<String> = fragments.iter().map(|f| f.to_string()).collect();
            expected.sort();
            assert_eq!(held, expected, "seed {seed}");
        }
    }
}
