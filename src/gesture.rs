use crate::cards::{CardCandidate, CardKind};

pub const DISMISS_OFFSET_PX: f32 = 100.0;
pub const DISMISS_VELOCITY_PX_S: f32 = 500.0;

/// Live horizontal drag state for the top card. Only the front card is
/// interactive; cards behind it never receive events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureState {
    pub dragging: bool,
    pub offset_x: f32,
    pub velocity_x: f32,
}

/// Horizontal pointer events. Vertical motion never reaches the reducer;
/// the host keeps it for scrolling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    Begin,
    Move { offset_x: f32, velocity_x: f32 },
    Release,
    Tap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Re-render with the live offset; nothing else to do.
    Continue,
    /// Released below both thresholds: animate the offset back to zero.
    SnapBack,
    /// Threshold crossed on release: remove the card from the filtered view.
    Dismiss { card_id: String },
    /// Tap on a Prompt or Missed top card: the host opens the log editor.
    OpenEditor,
}

/// Pure gesture reducer. The decision is applied by the host; the reducer
/// itself never touches the stack or the dismissal store.
pub fn reduce(
    state: GestureState,
    event: DragEvent,
    top: Option<&CardCandidate>,
) -> (GestureState, Decision) {
    let Some(top) = top else {
        return (GestureState::default(), Decision::Continue);
    };

    match event {
        DragEvent::Begin => (
            GestureState {
                dragging: true,
                offset_x: 0.0,
                velocity_x: 0.0,
            },
            Decision::Continue,
        ),
        DragEvent::Move { offset_x, velocity_x } => (
            GestureState {
                dragging: true,
                offset_x,
                velocity_x,
            },
            Decision::Continue,
        ),
        DragEvent::Release => {
            let decision = if state.offset_x.abs() > DISMISS_OFFSET_PX
                || state.velocity_x.abs() > DISMISS_VELOCITY_PX_S
            {
                Decision::Dismiss {
                    card_id: top.id.clone(),
                }
            } else {
                Decision::SnapBack
            };
            (GestureState::default(), decision)
        }
        DragEvent::Tap => {
            let decision = match top.kind {
                CardKind::Prompt | CardKind::Missed => Decision::OpenEditor,
                _ => Decision::Continue,
            };
            (GestureState::default(), decision)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cards::{CardCandidate, CardKind, Z_DATE_STATE, Z_STATS};

    use super::{Decision, DragEvent, GestureState, reduce};

    fn prompt_card() -> CardCandidate {
        CardCandidate {
            id: "prompt".to_string(),
            z_index: Z_DATE_STATE,
            kind: CardKind::Prompt,
        }
    }

    fn stats_card() -> CardCandidate {
        CardCandidate {
            id: "stats".to_string(),
            z_index: Z_STATS,
            kind: CardKind::Stats {
                mood: Some(4),
                rating: None,
                sleep_hours: None,
                highlight: None,
                week_spend: 0.0,
            },
        }
    }

    fn drag_to(offset_x: f32, velocity_x: f32, top: &CardCandidate) -> (GestureState, Decision) {
        let (state, _) = reduce(GestureState::default(), DragEvent::Begin, Some(top));
        let (state, decision) = reduce(
            state,
            DragEvent::Move {
                offset_x,
                velocity_x,
            },
            Some(top),
        );
        assert_eq!(decision, Decision::Continue);
        reduce(state, DragEvent::Release, Some(top))
    }

    #[test]
    fn slow_short_drag_snaps_back() {
        let card = prompt_card();
        let (state, decision) = drag_to(60.0, 200.0, &card);
        assert_eq!(decision, Decision::SnapBack);
        assert_eq!(state, GestureState::default());
    }

    #[test]
    fn offset_past_threshold_dismisses_regardless_of_velocity() {
        let card = prompt_card();
        let (_, decision) = drag_to(120.0, 0.0, &card);
        assert_eq!(
            decision,
            Decision::Dismiss {
                card_id: "prompt".to_string()
            }
        );
    }

    #[test]
    fn fast_flick_dismisses_despite_small_offset() {
        let card = stats_card();
        let (_, decision) = drag_to(-20.0, -650.0, &card);
        assert_eq!(
            decision,
            Decision::Dismiss {
                card_id: "stats".to_string()
            }
        );
    }

    #[test]
    fn exact_thresholds_snap_back() {
        let card = prompt_card();
        let (_, decision) = drag_to(100.0, 500.0, &card);
        assert_eq!(decision, Decision::SnapBack);
    }

    #[test]
    fn move_keeps_live_offset_for_rendering() {
        let card = prompt_card();
        let (state, _) = reduce(GestureState::default(), DragEvent::Begin, Some(&card));
        let (state, decision) = reduce(
            state,
            DragEvent::Move {
                offset_x: 42.0,
                velocity_x: 10.0,
            },
            Some(&card),
        );
        assert_eq!(decision, Decision::Continue);
        assert!(state.dragging);
        assert_eq!(state.offset_x, 42.0);
    }

    #[test]
    fn tap_opens_editor_only_for_prompt_and_missed() {
        let prompt = prompt_card();
        let (_, decision) = reduce(GestureState::default(), DragEvent::Tap, Some(&prompt));
        assert_eq!(decision, Decision::OpenEditor);

        let missed = CardCandidate {
            id: "missed".to_string(),
            z_index: Z_DATE_STATE,
            kind: CardKind::Missed,
        };
        let (_, decision) = reduce(GestureState::default(), DragEvent::Tap, Some(&missed));
        assert_eq!(decision, Decision::OpenEditor);

        let stats = stats_card();
        let (_, decision) = reduce(GestureState::default(), DragEvent::Tap, Some(&stats));
        assert_eq!(decision, Decision::Continue);
    }

    #[test]
    fn events_without_a_top_card_are_ignored() {
        let (state, decision) = reduce(
            GestureState {
                dragging: true,
                offset_x: 300.0,
                velocity_x: 0.0,
            },
            DragEvent::Release,
            None,
        );
        assert_eq!(decision, Decision::Continue);
        assert_eq!(state, GestureState::default());
    }
}
