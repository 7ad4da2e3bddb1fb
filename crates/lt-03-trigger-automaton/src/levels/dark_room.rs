//! Tab 1: a room too dark to play until light is carried back from tab 3.

use super::DARK_ROOM_EDGE_TILE;
use crate::domain::{
    AudioCue, ContextPhase, Milestone, Mutation, RenderCue, SideEffect, Transition,
};
use crate::ports::LevelScript;
use shared_types::{GameMessage, GameState, TabId, TabPhase};

const TAB: TabId = TabId(1);
const BONUS: &str = "bonus-shard";

#[derive(Debug, Default, Clone, Copy)]
pub struct DarkRoom;

impl DarkRoom {
    fn bonus_pending(state: &GameState) -> bool {
        let own = state.tab(TAB);
        own.is_some_and(|r| r.flag("bonusPlaced") && !r.flag("collectedBonus"))
            && !state.tab(TabId(4)).is_some_and(|r| r.flag("bonusAbsorbed"))
    }
}

impl LevelScript for DarkRoom {
    fn tab(&self) -> TabId {
        TAB
    }

    fn name(&self) -> &'static str {
        "dark-room"
    }

    fn wants(&self, message: &GameMessage) -> bool {
        matches!(message, GameMessage::BacktrackTrigger { .. })
    }

    fn derive(&self, state: &GameState) -> Vec<Transition> {
        let mut out = Vec::new();
        let own = state.tab(TAB);
        let lit_from_three = state.tab(TabId(3)).is_some_and(|r| r.flag("backtrackedTo1"));

        if lit_from_three && state.phase(TAB) != TabPhase::PostCompletion {
            out.push(
                Transition::once("illuminated")
                    .mutate(Mutation::AdvanceTab {
                        tab: TAB,
                        phase: TabPhase::Illuminated,
                    })
                    .effect(SideEffect::Render(RenderCue::Phase(ContextPhase::Illuminated)))
                    .effect(SideEffect::Audio(AudioCue::Chime))
                    .effect(SideEffect::Narrate("the-room-remembers-light".into())),
            );
        }

        let lit = own.is_some_and(|r| r.flag("illuminated"));
        let absorbed = state.tab(TabId(4)).is_some_and(|r| r.flag("bonusAbsorbed"));
        if lit && !absorbed && state.phase(TAB) == TabPhase::Illuminated {
            out.push(Transition::once("bonusPlaced").effect(SideEffect::PlaceObject(BONUS.into())));
        }
        out
    }

    fn on_milestone(&self, milestone: &Milestone, state: &GameState) -> Option<Transition> {
        let phase = state.phase(TAB);
        match milestone {
            Milestone::TileReached(tile)
                if *tile >= DARK_ROOM_EDGE_TILE && phase == TabPhase::Visited =>
            {
                Some(
                    Transition::once("edgeReached")
                        .mutate(Mutation::UnlockTab(TabId(2)))
                        .announce(GameMessage::NarratorTrigger {
                            line_id: "a-light-elsewhere".into(),
                            target_tab: None,
                        })
                        .effect(SideEffect::Narrate("too-dark-to-see".into())),
                )
            }
            Milestone::ItemCollected(item) if item == BONUS && Self::bonus_pending(state) => Some(
                Transition::new()
                    .mutate(Mutation::SetTabFlag {
                        tab: TAB,
                        flag: "collectedBonus".into(),
                    })
                    .effect(SideEffect::Audio(AudioCue::Chime)),
            ),
            Milestone::ExitReached if phase == TabPhase::Illuminated => Some(
                Transition::new()
                    .mutate(Mutation::AdvanceTab {
                        tab: TAB,
                        phase: TabPhase::PostCompletion,
                    })
                    .announce(GameMessage::TabCompleted { tab: TAB })
                    .effect(SideEffect::Render(RenderCue::Phase(
                        ContextPhase::PostCompletion,
                    ))),
            ),
            _ => None,
        }
    }

    fn present(&self, state: &GameState) -> Vec<SideEffect> {
        if Self::bonus_pending(state) {
            vec![SideEffect::PlaceObject(BONUS.into())]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backtracked() -> GameState {
        let mut state = GameState::default();
        state.tab_mut(TAB).advance(TabPhase::Visited);
        state.tab_mut(TabId(3)).set_flag("backtrackedTo1", true);
        state
    }

    #[test]
    fn test_dark_until_backtrack() {
        let mut state = GameState::default();
        state.tab_mut(TAB).advance(TabPhase::Visited);
        assert!(DarkRoom.derive(&state).is_empty());

        let derived = DarkRoom.derive(&backtracked());
        assert_eq!(derived.len(), 1);
        assert!(derived[0].mutations.contains(&Mutation::AdvanceTab {
            tab: TAB,
            phase: TabPhase::Illuminated
        }));
    }

    #[test]
    fn test_bonus_follows_illumination() {
        let mut state = backtracked();
        for m in &DarkRoom.derive(&state)[0].mutations {
            m.apply(&mut state);
        }
        state.tab_mut(TAB).set_flag("illuminated", true);

        let derived = DarkRoom.derive(&state);
        assert!(derived
            .iter()
            .any(|t| t.effects == vec![SideEffect::PlaceObject(BONUS.into())]));
    }

    #[test]
    fn test_exit_only_when_lit() {
        let mut state = GameState::default();
        state.tab_mut(TAB).advance(TabPhase::Visited);
        assert!(DarkRoom.on_milestone(&Milestone::ExitReached, &state).is_none());

        state.tab_mut(TAB).advance(TabPhase::Illuminated);
        let t = DarkRoom.on_milestone(&Milestone::ExitReached, &state).unwrap();
        assert_eq!(t.announce, vec![GameMessage::TabCompleted { tab: TAB }]);
    }

    #[test]
    fn test_edge_unlocks_tab_two() {
        let mut state = GameState::default();
        state.tab_mut(TAB).advance(TabPhase::Visited);
        assert!(DarkRoom
            .on_milestone(&Milestone::TileReached(3), &state)
            .is_none());
        let t = DarkRoom
            .on_milestone(&Milestone::TileReached(DARK_ROOM_EDGE_TILE), &state)
            .unwrap();
        assert!(t.mutations.contains(&Mutation::UnlockTab(TabId(2))));
    }

    #[test]
    fn test_present_places_pending_bonus() {
        let mut state = GameState::default();
        assert!(DarkRoom.present(&state).is_empty());
        state.tab_mut(TAB).set_flag("bonusPlaced", true);
        assert_eq!(DarkRoom.present(&state), vec![SideEffect::PlaceObject(BONUS.into())]);
        state.tab_mut(TAB).set_flag("collectedBonus", true);
        assert!(DarkRoom.present(&state).is_empty());
    }
}
