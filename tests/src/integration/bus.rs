//! # Bus Properties
//!
//! Delivery between contexts on both transports: identical payloads,
//! self-suppression, no coalescing of identical fallback sends, and
//! forward compatibility with message types this build does not know.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{record, RawContext, Via};
    use serde_json::json;
    use shared_bus::{BroadcastHub, MessageBus, DEFAULT_BUS_KEY};
    use shared_types::{
        ContextId, GameMessage, GameState, OriginStorage, StorageArea, TabId, WireEnvelope,
    };

    fn messages() -> Vec<GameMessage> {
        vec![
            GameMessage::BacktrackTrigger {
                target_tab: TabId(1),
            },
            GameMessage::PuzzleSolved {
                tab: TabId(2),
                puzzle: "flashlight".into(),
            },
            GameMessage::NarratorTrigger {
                line_id: "a-light-elsewhere".into(),
                target_tab: None,
            },
            GameMessage::NewSymbolFound {
                symbol_id: "moon".into(),
                total: 1,
            },
            GameMessage::MindFragmentsCollected { count: 3 },
            GameMessage::GameCompleteFinal,
            GameMessage::StateChange(Box::new(GameState::default())),
        ]
    }

    fn delivery_is_faithful(via: Via) {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let sender = RawContext::tab(&origin, &hub, via, 3);
        let receiver = RawContext::tab(&origin, &hub, via, 1);
        let (_own, own_seen) = record(&sender.bus);
        let (_peer, peer_seen) = record(&receiver.bus);

        for message in messages() {
            sender.bus.send(message, Some(TabId(3)));
            // Poll after each send: the fallback slot only holds the latest.
            receiver.bus.poll();
            sender.bus.poll();
        }

        let got: Vec<GameMessage> = peer_seen.lock().iter().map(|e| e.message.clone()).collect();
        assert_eq!(got, messages(), "{via:?}");
        assert!(peer_seen.lock().iter().all(|e| e.from_tab == Some(TabId(3))));
        assert!(own_seen.lock().is_empty(), "sender heard itself over {via:?}");
    }

    #[test]
    fn test_delivery_broadcast() {
        delivery_is_faithful(Via::Broadcast);
    }

    #[test]
    fn test_delivery_storage_fallback() {
        delivery_is_faithful(Via::Storage);
    }

    #[test]
    fn test_identical_fallback_sends_both_delivered() {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let sender = RawContext::tab(&origin, &hub, Via::Storage, 3);
        let receiver = RawContext::tab(&origin, &hub, Via::Storage, 1);
        let (_sub, seen) = record(&receiver.bus);

        let message = GameMessage::BacktrackTrigger {
            target_tab: TabId(1),
        };
        sender.bus.send(message.clone(), Some(TabId(3)));
        sender.bus.send(message.clone(), Some(TabId(3)));
        receiver.bus.poll();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|e| e.message == message));
    }

    #[test]
    fn test_unknown_type_survives_the_wire() {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let receiver = RawContext::tab(&origin, &hub, Via::Storage, 1);
        let (_sub, seen) = record(&receiver.bus);

        // A newer build writes a type this one has never heard of.
        let wire = WireEnvelope {
            kind: "LANTERN_FLICKER".into(),
            from_tab: Some(TabId(6)),
            payload: json!({ "intensity": 0.5 }),
            nonce: Some("n-1".into()),
        };
        origin
            .handle(ContextId::new())
            .set_item(DEFAULT_BUS_KEY, &serde_json::to_string(&wire).unwrap())
            .unwrap();
        receiver.bus.poll();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            &seen[0].message,
            GameMessage::Unknown { kind, .. } if kind == "LANTERN_FLICKER"
        ));
    }

    #[test]
    fn test_malformed_fallback_entry_is_dropped() {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let receiver = RawContext::tab(&origin, &hub, Via::Storage, 1);
        let (_sub, seen) = record(&receiver.bus);

        origin
            .handle(ContextId::new())
            .set_item(DEFAULT_BUS_KEY, "{{{{")
            .unwrap();

        assert!(receiver.bus.poll().is_empty());
        assert!(seen.lock().is_empty());
        assert_eq!(receiver.bus.stats().dropped, 1);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let origin = OriginStorage::new();
        let hub = BroadcastHub::new("lantern");
        let sender = RawContext::tab(&origin, &hub, Via::Broadcast, 2);
        let receiver = RawContext::tab(&origin, &hub, Via::Broadcast, 1);
        let (subscription, seen) = record(&receiver.bus);

        sender.bus.send(GameMessage::GameCompleteFinal, Some(TabId(2)));
        receiver.bus.poll();
        drop(subscription);
        sender.bus.send(GameMessage::GameCompleteFinal, Some(TabId(2)));
        let delivered = receiver.bus.poll();

        assert_eq!(delivered.len(), 1);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(receiver.bus.listener_count(), 0);
    }

    #[test]
    fn test_local_only_bus_drops_sends() {
        let bus = MessageBus::new(ContextId::new(), None);
        let (_sub, seen) = record(&bus);
        bus.send(GameMessage::GameCompleteFinal, Some(TabId(5)));
        assert!(bus.poll().is_empty());
        assert!(seen.lock().is_empty());
        assert_eq!(bus.stats().dropped, 1);
    }
}
