//! # Write Refusals
//!
//! Writes the store turns away: paths owned by another tab when ownership
//! is enforced, and documents that no longer fit the origin quota. A
//! refused write changes nothing and announces nothing.

#[cfg(test)]
mod tests {
    use context_runtime::{Host, RuntimeConfig};
    use lt_02_ownership::OwnershipMode;
    use shared_types::{GameState, TabId};

    fn host(mode: OwnershipMode) -> Host {
        let mut config = RuntimeConfig::default();
        config.ownership = mode;
        Host::new(config).unwrap()
    }

    fn touch_tab_three(state: GameState) -> GameState {
        let mut state = state;
        state.tab_mut(TabId(3)).set_flag("backtrackedTo1", true);
        state
    }

    #[test]
    fn test_enforce_drops_foreign_write() {
        let host = host(OwnershipMode::Enforce);
        let two = host.open(TabId(2)).unwrap();
        let mut three = host.open(TabId(3)).unwrap();
        three.pump();
        let received = three.bus().stats().received;

        let after = two.store().set(touch_tab_three);

        assert!(!after.tab(TabId(3)).unwrap().flag("backtrackedTo1"));
        assert!(!host.state().tab(TabId(3)).unwrap().flag("backtrackedTo1"));
        assert_eq!(two.store().stats().dropped_writes, 1);
        three.pump();
        assert_eq!(three.bus().stats().received, received);
    }

    #[test]
    fn test_audit_lets_foreign_write_through() {
        let host = host(OwnershipMode::Audit);
        let two = host.open(TabId(2)).unwrap();

        let after = two.store().set(touch_tab_three);

        assert!(after.tab(TabId(3)).unwrap().flag("backtrackedTo1"));
        assert_eq!(two.store().stats().dropped_writes, 0);
    }

    #[test]
    fn test_enforce_still_allows_shared_and_system_writes() {
        let host = host(OwnershipMode::Enforce);
        let two = host.open(TabId(2)).unwrap();

        let after = two.store().set(|mut state| {
            state.narrative.shown.push("shared-line".into());
            state.meta.unlock(TabId(3));
            state
        });
        assert!(after.narrative.has_shown("shared-line"));
        assert_eq!(two.store().stats().dropped_writes, 0);

        assert_eq!(host.reset(), GameState::default());
    }

    #[test]
    fn test_quota_refusal_is_silent() {
        let mut config = RuntimeConfig::default();
        config.storage.quota_bytes = Some(2048);
        let host = Host::new(config).unwrap();
        let one = host.open(TabId(1)).unwrap();
        let mut two = host.open(TabId(2)).unwrap();
        two.pump();
        let before = host.state();
        let received = two.bus().stats().received;

        let after = one.store().set(|mut state| {
            state.narrative.shown.push("x".repeat(4096));
            state
        });

        assert_eq!(after, before);
        assert_eq!(host.state(), before);
        assert_eq!(one.store().stats().dropped_writes, 1);
        two.pump();
        assert_eq!(two.bus().stats().received, received);
    }
}
