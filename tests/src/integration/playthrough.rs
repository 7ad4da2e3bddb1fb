//! # Full Playthrough
//!
//! The scripted game from first tab to finale, on each transport, with
//! ownership enforced, and resumed from a snapshot.

#[cfg(test)]
mod tests {
    use context_runtime::{
        run_playthrough_with, CollaboratorSink, Host, PlaythroughReport, RecordingSink,
        RuntimeConfig,
    };
    use lt_02_ownership::OwnershipMode;
    use lt_03_trigger_automaton::{ContextPhase, SideEffect};
    use shared_bus::TransportKind;
    use shared_types::{TabId, TabPhase};

    async fn play(config: RuntimeConfig) -> (Host, PlaythroughReport, RecordingSink) {
        let host = Host::new(config).unwrap();
        let sink = RecordingSink::new();
        let factory = {
            let sink = sink.clone();
            move |_: TabId| -> Box<dyn CollaboratorSink> { Box::new(sink.clone()) }
        };
        let report = run_playthrough_with(&host, &factory).await.unwrap();
        (host, report, sink)
    }

    fn assert_completed(report: &PlaythroughReport, sink: &RecordingSink) {
        let state = &report.state;
        assert!(state.meta.game_complete);
        assert!(state.meta.act_two_complete);
        assert!(state.player.has_flashlight);
        assert_eq!(state.meta.highest_tab_unlocked, 5);
        for tab in TabId::all() {
            assert_eq!(state.phase(tab), TabPhase::PostCompletion, "tab {tab}");
            assert!(state.tab(tab).unwrap().flag("finaleShown"), "tab {tab}");
        }

        let mut fragments = state.player.code_fragments.clone();
        fragments.sort();
        assert_eq!(fragments, ["bonus-shard", "c1", "c2", "c3"]);
        assert_eq!(state.player.mind_fragments, ["m1", "m2", "m3"]);

        assert_eq!(report.statuses.len(), 5);
        assert!(report
            .statuses
            .iter()
            .all(|s| s.phase == ContextPhase::PostCompletion));

        assert_eq!(
            sink.count(&SideEffect::PlaceObject("bonus-shard".into())),
            1
        );
        assert_eq!(sink.count(&SideEffect::OpenOverlay("finale".into())), 5);
        for tab in TabId::all() {
            assert!(sink
                .for_tab(tab)
                .contains(&SideEffect::OpenOverlay("finale".into())));
        }
    }

    #[tokio::test]
    async fn test_playthrough_broadcast() {
        let (_host, report, sink) = play(RuntimeConfig::default()).await;
        assert_completed(&report, &sink);
        assert!(report
            .contexts
            .iter()
            .all(|c| c.transport == TransportKind::Broadcast));

        let dark_room = report
            .contexts
            .iter()
            .find(|c| c.tab == TabId(1))
            .unwrap();
        assert!(dark_room.missed_while_hidden > 0);
    }

    #[tokio::test]
    async fn test_playthrough_storage_fallback() {
        let mut config = RuntimeConfig::default();
        config.transport.broadcast_available = false;
        let (_host, report, sink) = play(config).await;
        assert_completed(&report, &sink);
        assert!(report
            .contexts
            .iter()
            .all(|c| c.transport == TransportKind::StorageEvents));
    }

    #[tokio::test]
    async fn test_playthrough_under_enforced_ownership() {
        let mut config = RuntimeConfig::default();
        config.ownership = OwnershipMode::Enforce;
        let (_host, report, sink) = play(config).await;
        assert_completed(&report, &sink);
        assert!(report.contexts.iter().all(|c| c.store.dropped_writes == 0));
    }

    #[tokio::test]
    async fn test_resume_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RuntimeConfig::default();
        config.storage.snapshot_path = Some(dir.path().join("origin.json"));

        let (host, report, _sink) = play(config.clone()).await;
        host.save_snapshot().unwrap();

        let resumed = Host::new(config).unwrap();
        assert!(resumed.restore_snapshot().unwrap());
        assert_eq!(resumed.state(), report.state);

        let sink = RecordingSink::new();
        let ctx = resumed
            .open_with(TabId(3), Box::new(sink.clone()))
            .unwrap();
        assert_eq!(ctx.phase(), ContextPhase::PostCompletion);
        assert_eq!(sink.count(&SideEffect::OpenOverlay("finale".into())), 0);
    }
}
