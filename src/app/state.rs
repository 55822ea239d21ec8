//! Pointer gesture state machine
//!
//! Transitions are pure: the canvas controller hit-tests the pointer, feeds
//! the result in as a `GestureEvent`, and applies the returned
//! `GestureAction` to the diagram. Only transient gesture data lives here.

use crate::domain::core::Point;
use crate::domain::model::ActorId;

/// Pointer travel (px) separating a click from a drag
pub const DRAG_THRESHOLD: f32 = 6.0;

/// What the pointer landed on when the button went down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    /// An actor box; `grab_offset` is pointer x minus actor centre
    Actor { id: ActorId, grab_offset: i32 },
    /// An interaction arrow by order index
    Interaction(usize),
    Empty,
}

/// Current gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Button down on an actor, not yet moved past the threshold
    Pressed(PressState),
    DraggingActor(DragState),
    /// Drawing a new interaction from `source`
    Drafting(DraftState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressState {
    pub origin: Point,
    pub actor: ActorId,
    pub grab_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub actor: ActorId,
    pub grab_offset: i32,
}

impl DragState {
    /// Actor centre for a pointer at `point`
    pub fn actor_x(&self, point: Point) -> i32 {
        point.x - self.grab_offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftState {
    pub source: ActorId,
    /// Latest pointer position, the free end of the preview line
    pub pointer: Point,
}

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Press {
        point: Point,
        target: PressTarget,
        /// New-interaction mode is on
        drafting: bool,
    },
    Move(Point),
    Release {
        point: Point,
        /// Actor under the pointer on release, if any
        actor: Option<ActorId>,
    },
    Cancel,
}

/// Why a draft ended without creating an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DraftRejection {
    #[error("an interaction cannot start and end on the same actor")]
    SameActor,
    #[error("release over a second actor to create an interaction")]
    NoTarget,
}

/// Model change requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    None,
    ClearSelection,
    SelectActor(ActorId),
    SelectInteraction(usize),
    /// Live position update while dragging
    MoveActor { actor: ActorId, x: i32 },
    /// Final position on release
    CommitMove { actor: ActorId, x: i32 },
    StartDraft(ActorId),
    UpdateDraft(Point),
    CommitDraft { source: ActorId, target: ActorId },
    DiscardDraft(DraftRejection),
    Cancelled,
}

/// State machine for pointer gestures
pub struct StateMachine;

impl StateMachine {
    /// Processes an event and returns the next state plus the model change
    pub fn process_event(current: GestureState, event: GestureEvent) -> (GestureState, GestureAction) {
        match (current, event) {
            // A press always starts a fresh gesture, even if a release was lost
            (_, GestureEvent::Press { point, target, drafting }) => Self::press(point, target, drafting),

            (GestureState::Pressed(press), GestureEvent::Move(point)) => {
                if press.origin.distance_to(point) < DRAG_THRESHOLD {
                    return (GestureState::Pressed(press), GestureAction::None);
                }
                let drag = DragState {
                    actor: press.actor,
                    grab_offset: press.grab_offset,
                };
                (
                    GestureState::DraggingActor(drag),
                    GestureAction::MoveActor {
                        actor: drag.actor,
                        x: drag.actor_x(point),
                    },
                )
            }

            (GestureState::Pressed(press), GestureEvent::Release { .. }) => {
                (GestureState::Idle, GestureAction::SelectActor(press.actor))
            }

            (GestureState::DraggingActor(drag), GestureEvent::Move(point)) => (
                GestureState::DraggingActor(drag),
                GestureAction::MoveActor {
                    actor: drag.actor,
                    x: drag.actor_x(point),
                },
            ),

            (GestureState::DraggingActor(drag), GestureEvent::Release { point, .. }) => (
                GestureState::Idle,
                GestureAction::CommitMove {
                    actor: drag.actor,
                    x: drag.actor_x(point),
                },
            ),

            (GestureState::Drafting(mut draft), GestureEvent::Move(point)) => {
                draft.pointer = point;
                (GestureState::Drafting(draft), GestureAction::UpdateDraft(point))
            }

            (GestureState::Drafting(draft), GestureEvent::Release { actor, .. }) => {
                let action = match actor {
                    Some(target) if target != draft.source => GestureAction::CommitDraft {
                        source: draft.source,
                        target,
                    },
                    Some(_) => GestureAction::DiscardDraft(DraftRejection::SameActor),
                    None => GestureAction::DiscardDraft(DraftRejection::NoTarget),
                };
                (GestureState::Idle, action)
            }

            (GestureState::Idle, GestureEvent::Cancel) => (GestureState::Idle, GestureAction::None),
            (_, GestureEvent::Cancel) => (GestureState::Idle, GestureAction::Cancelled),

            // Moves and releases with no gesture in progress
            (state, _) => (state, GestureAction::None),
        }
    }

    fn press(point: Point, target: PressTarget, drafting: bool) -> (GestureState, GestureAction) {
        match target {
            PressTarget::Actor { id, .. } if drafting => (
                GestureState::Drafting(DraftState {
                    source: id,
                    pointer: point,
                }),
                GestureAction::StartDraft(id),
            ),
            PressTarget::Actor { id, grab_offset } => (
                GestureState::Pressed(PressState {
                    origin: point,
                    actor: id,
                    grab_offset,
                }),
                GestureAction::None,
            ),
            PressTarget::Interaction(index) => (GestureState::Idle, GestureAction::SelectInteraction(index)),
            PressTarget::Empty => (GestureState::Idle, GestureAction::ClearSelection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ActorId = ActorId(1);
    const B: ActorId = ActorId(2);

    fn press_actor(x: i32, drafting: bool) -> GestureEvent {
        GestureEvent::Press {
            point: Point::new(x, 30),
            target: PressTarget::Actor {
                id: A,
                grab_offset: 5,
            },
            drafting,
        }
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(GestureState::default(), GestureState::Idle);
    }

    #[test]
    fn click_on_actor_selects_it() {
        let (state, action) = StateMachine::process_event(GestureState::Idle, press_actor(100, false));
        assert!(matches!(state, GestureState::Pressed(_)));
        assert_eq!(action, GestureAction::None);

        // small jitter stays a click
        let (state, action) = StateMachine::process_event(state, GestureEvent::Move(Point::new(103, 32)));
        assert!(matches!(state, GestureState::Pressed(_)));
        assert_eq!(action, GestureAction::None);

        let (state, action) = StateMachine::process_event(
            state,
            GestureEvent::Release {
                point: Point::new(103, 32),
                actor: Some(A),
            },
        );
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::SelectActor(A));
    }

    #[test]
    fn drag_moves_actor_keeping_grab_offset() {
        let (state, _) = StateMachine::process_event(GestureState::Idle, press_actor(100, false));
        let (state, action) = StateMachine::process_event(state, GestureEvent::Move(Point::new(150, 30)));
        assert!(matches!(state, GestureState::DraggingActor(_)));
        assert_eq!(action, GestureAction::MoveActor { actor: A, x: 145 });

        let (state, action) = StateMachine::process_event(
            state,
            GestureEvent::Release {
                point: Point::new(200, 90),
                actor: None,
            },
        );
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::CommitMove { actor: A, x: 195 });
    }

    #[test]
    fn drafting_commits_on_distinct_actor() {
        let (state, action) = StateMachine::process_event(GestureState::Idle, press_actor(100, true));
        assert_eq!(action, GestureAction::StartDraft(A));

        let (state, action) = StateMachine::process_event(state, GestureEvent::Move(Point::new(240, 60)));
        assert_eq!(action, GestureAction::UpdateDraft(Point::new(240, 60)));
        match state {
            GestureState::Drafting(draft) => assert_eq!(draft.pointer, Point::new(240, 60)),
            other => panic!("expected drafting, got {other:?}"),
        }

        let (state, action) = StateMachine::process_event(
            state,
            GestureEvent::Release {
                point: Point::new(260, 30),
                actor: Some(B),
            },
        );
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::CommitDraft { source: A, target: B });
    }

    #[test]
    fn drafting_to_same_actor_is_discarded() {
        let (state, _) = StateMachine::process_event(GestureState::Idle, press_actor(100, true));
        let (state, action) = StateMachine::process_event(
            state,
            GestureEvent::Release {
                point: Point::new(110, 30),
                actor: Some(A),
            },
        );
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::DiscardDraft(DraftRejection::SameActor));
    }

    #[test]
    fn drafting_to_empty_canvas_is_discarded() {
        let (state, _) = StateMachine::process_event(GestureState::Idle, press_actor(100, true));
        let (_, action) = StateMachine::process_event(
            state,
            GestureEvent::Release {
                point: Point::new(500, 500),
                actor: None,
            },
        );
        assert_eq!(action, GestureAction::DiscardDraft(DraftRejection::NoTarget));
    }

    #[test]
    fn press_on_interaction_or_empty_canvas() {
        let (state, action) = StateMachine::process_event(
            GestureState::Idle,
            GestureEvent::Press {
                point: Point::new(10, 10),
                target: PressTarget::Interaction(3),
                drafting: true,
            },
        );
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::SelectInteraction(3));

        let (_, action) = StateMachine::process_event(
            GestureState::Idle,
            GestureEvent::Press {
                point: Point::new(10, 10),
                target: PressTarget::Empty,
                drafting: false,
            },
        );
        assert_eq!(action, GestureAction::ClearSelection);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let (state, _) = StateMachine::process_event(GestureState::Idle, press_actor(100, true));
        let (state, action) = StateMachine::process_event(state, GestureEvent::Cancel);
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::Cancelled);

        let (_, action) = StateMachine::process_event(GestureState::Idle, GestureEvent::Cancel);
        assert_eq!(action, GestureAction::None);
    }

    #[test]
    fn stray_release_is_ignored() {
        let (state, action) = StateMachine::process_event(
            GestureState::Idle,
            GestureEvent::Release {
                point: Point::new(1, 1),
                actor: Some(B),
            },
        );
        assert_eq!(state, GestureState::Idle);
        assert_eq!(action, GestureAction::None);
    }
}
