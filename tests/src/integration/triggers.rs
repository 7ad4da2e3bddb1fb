//! # Trigger Scenarios
//!
//! One-shot transitions under duplicate delivery, and the backtrack flow
//! from tab 3 to both a live and a late-loading tab 1.

#[cfg(test)]
mod tests {
    use context_runtime::{ExecutionContext, Host, RecordingSink, RuntimeConfig};
    use lt_01_state_store::StateStore;
    use lt_03_trigger_automaton::levels::DARK_ROOM_EDGE_TILE;
    use lt_03_trigger_automaton::{ContextPhase, Milestone, SideEffect};
    use serde_json::json;
    use shared_bus::{select_transport, MessageBus, TransportKind};
    use shared_types::{ContextId, ContextKind, GameMessage, TabId, TabPhase};
    use std::sync::Arc;

    fn host(broadcast: bool) -> Host {
        let mut config = RuntimeConfig::default();
        config.transport.broadcast_available = broadcast;
        Host::new(config).unwrap()
    }

    fn open(host: &Host, tab: u8) -> (ExecutionContext, RecordingSink) {
        let sink = RecordingSink::new();
        let ctx = host.open_with(TabId(tab), Box::new(sink.clone())).unwrap();
        (ctx, sink)
    }

    /// Tab 3 as bare components: a store and a bus, no automaton.
    struct Backtracker {
        store: StateStore,
        bus: Arc<MessageBus>,
    }

    impl Backtracker {
        fn new(host: &Host) -> Self {
            let id = ContextId::new();
            let storage = host.origin().handle(id);
            let config = host.config();
            let transport = select_transport(
                id,
                config.transport.preference,
                host.hub(),
                &storage,
                &config.storage.bus_key,
            );
            let bus = Arc::new(MessageBus::new(id, transport));
            let store = StateStore::new(
                Arc::new(storage),
                config.storage.state_key.clone(),
                ContextKind::Tab(TabId(3)),
                Some(bus.clone()),
            );
            Self { store, bus }
        }

        fn carry_light_back(&self) {
            let partial = json!({ "backtrackedTo1": true });
            self.store
                .merge_field(TabId(3), partial.as_object().unwrap());
            self.trigger();
        }

        fn trigger(&self) {
            self.bus.send(
                GameMessage::BacktrackTrigger {
                    target_tab: TabId(1),
                },
                Some(TabId(3)),
            );
        }
    }

    fn bonus() -> SideEffect {
        SideEffect::PlaceObject("bonus-shard".into())
    }

    // =============================================================================
    // BACKTRACK END TO END
    // =============================================================================

    fn backtrack_reaches_live_and_late_tabs(broadcast: bool) {
        let host = host(broadcast);
        let (mut live, live_sink) = open(&host, 1);
        let expected = if broadcast {
            TransportKind::Broadcast
        } else {
            TransportKind::StorageEvents
        };
        assert_eq!(live.transport_kind(), expected);
        assert_eq!(live.phase(), ContextPhase::FirstVisitActive);

        Backtracker::new(&host).carry_light_back();
        live.pump();

        assert_eq!(live.phase(), ContextPhase::Illuminated);
        assert_eq!(live.state().phase(TabId(1)), TabPhase::Illuminated);
        assert_eq!(live_sink.count(&bonus()), 1);

        let (late, late_sink) = open(&host, 1);
        assert_eq!(late.phase(), ContextPhase::Illuminated);
        // The late context rebuilds the world; it does not place anew.
        assert!(late.state().tab(TabId(1)).unwrap().flag("bonusPlaced"));
        assert_eq!(late_sink.count(&bonus()), 1);
    }

    #[test]
    fn test_backtrack_broadcast() {
        backtrack_reaches_live_and_late_tabs(true);
    }

    #[test]
    fn test_backtrack_storage_fallback() {
        backtrack_reaches_live_and_late_tabs(false);
    }

    // =============================================================================
    // ONE-SHOT UNDER DUPLICATES
    // =============================================================================

    fn duplicate_triggers_place_once(broadcast: bool) {
        let host = host(broadcast);
        let (mut first, first_sink) = open(&host, 1);
        let (mut second, second_sink) = open(&host, 1);
        let tab_three = Backtracker::new(&host);

        tab_three.carry_light_back();
        first.pump();
        tab_three.trigger();
        tab_three.trigger();
        first.pump();
        second.pump();
        first.pump();

        let placed = first_sink.count(&bonus()) + second_sink.count(&bonus());
        assert_eq!(placed, 1);
        assert_eq!(first.phase(), ContextPhase::Illuminated);
        assert_eq!(second.phase(), ContextPhase::Illuminated);
    }

    #[test]
    fn test_duplicates_broadcast() {
        duplicate_triggers_place_once(true);
    }

    #[test]
    fn test_duplicates_storage_fallback() {
        duplicate_triggers_place_once(false);
    }

    // =============================================================================
    // NARRATION
    // =============================================================================

    fn edge_line() -> SideEffect {
        SideEffect::Narrate("a-light-elsewhere".into())
    }

    #[test]
    fn test_focused_tab_narrates_its_own_announcement() {
        let host = host(true);
        let (mut two, two_sink) = open(&host, 2);
        let (mut one, one_sink) = open(&host, 1);
        assert_eq!(host.state().meta.current_tab, TabId(1));

        one.milestone(&Milestone::TileReached(DARK_ROOM_EDGE_TILE));
        two.pump();
        one.pump();
        two.show();
        two.pump();

        assert_eq!(one_sink.count(&edge_line()), 1);
        assert_eq!(two_sink.count(&edge_line()), 0);
        assert!(host.state().narrative.has_shown("a-light-elsewhere"));
    }

    #[test]
    fn test_untargeted_narration_plays_once_in_focused_tab() {
        let host = host(false);
        let (mut one, one_sink) = open(&host, 1);
        let (mut two, two_sink) = open(&host, 2);
        assert_eq!(host.state().meta.current_tab, TabId(2));

        one.milestone(&Milestone::TileReached(DARK_ROOM_EDGE_TILE));
        two.pump();
        one.pump();
        two.pump();

        assert_eq!(one_sink.count(&edge_line()), 0);
        assert_eq!(two_sink.count(&edge_line()), 1);
        assert!(host.state().narrative.has_shown("a-light-elsewhere"));
    }

    #[test]
    fn test_hidden_tab_hears_narration_on_show() {
        let host = host(false);
        let (mut three, sink) = open(&host, 3);
        let (two, _) = open(&host, 2);
        three.hide();

        two.bus().send(
            GameMessage::NarratorTrigger {
                line_id: "for-three".into(),
                target_tab: Some(TabId(3)),
            },
            Some(TabId(2)),
        );
        three.pump();
        let line = SideEffect::Narrate("for-three".into());
        assert_eq!(sink.count(&line), 0);
        assert!(!host.state().narrative.has_shown("for-three"));

        three.show();
        three.pump();
        assert_eq!(sink.count(&line), 1);
        assert!(host.state().narrative.has_shown("for-three"));
    }

    #[test]
    fn test_hidden_tab_catches_up_on_show() {
        let host = host(true);
        let (mut one, sink) = open(&host, 1);
        one.hide();

        Backtracker::new(&host).carry_light_back();
        one.pump();
        assert_eq!(one.phase(), ContextPhase::FirstVisitActive);
        assert_eq!(sink.count(&bonus()), 0);

        one.show();
        assert_eq!(one.phase(), ContextPhase::Illuminated);
        assert_eq!(sink.count(&bonus()), 1);
        assert_eq!(host.state().meta.current_tab, TabId(1));
    }
}
