//! Canvas controller
//!
//! Turns pointer input into diagram mutations and the diagram into a
//! [`Scene`]. The controller owns only gesture state and the
//! new-interaction settings; the diagram is passed in for each event.

use crate::app::state::{
    DraftRejection, DraftState, GestureAction, GestureEvent, GestureState, PressTarget,
    StateMachine,
};
use crate::domain::core::Point;
use crate::domain::diagram::{Diagram, DiagramError};
use crate::domain::model::{
    ActorId, INDEX_COLUMN_X, INTERACTION_START_Y, LIFELINE_BOTTOM_MARGIN, LineStyle, interaction_y,
};
use crate::ui::scene::{Scene, Shape, TextAnchor};
use crate::ui::theme::Palette;

/// Maximum distance (px) from an arrow that still selects it
pub const INTERACTION_HIT_TOLERANCE: f32 = 6.0;

const ACTOR_NAME_SIZE: f32 = 13.0;
const LABEL_SIZE: f32 = 12.0;
const INDEX_SIZE: f32 = 11.0;
const LABEL_OFFSET: f32 = 10.0;
const SELECTION_MARGIN: i32 = 3;
const SELECTION_WIDTH: f32 = 3.0;
const HALO_WIDTH: f32 = 6.0;
const ARROW_WIDTH: f32 = 2.0;
const LIFELINE_DASH: [f32; 2] = [4.0, 4.0];

/// Result of a pointer event, for the host to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Nothing changed
    Nothing,
    /// Transient state changed; repaint
    Redraw,
    ActorSelected(ActorId),
    /// Drag finished; `touching` lists interactions whose endpoints moved
    ActorMoved {
        actor: ActorId,
        x: i32,
        touching: Vec<usize>,
    },
    InteractionSelected(usize),
    /// A new interaction was appended at this order index
    InteractionCreated(usize),
    /// The gesture ended without a change
    Rejected(DraftRejection),
}

impl GestureOutcome {
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, GestureOutcome::Nothing)
    }
}

#[derive(Debug, Default)]
pub struct CanvasController {
    gesture: GestureState,
    new_interaction_mode: bool,
    new_interaction_style: LineStyle,
}

impl CanvasController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_interaction_mode(&self) -> bool {
        self.new_interaction_mode
    }

    /// Turns new-interaction mode on or off; any draft in progress is dropped
    pub fn set_new_interaction_mode(&mut self, enabled: bool) {
        self.new_interaction_mode = enabled;
        if matches!(self.gesture, GestureState::Drafting(_)) {
            self.gesture = GestureState::Idle;
        }
    }

    pub fn new_interaction_style(&self) -> LineStyle {
        self.new_interaction_style
    }

    pub fn set_new_interaction_style(&mut self, style: LineStyle) {
        self.new_interaction_style = style;
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// Draft in progress, if any
    pub fn draft(&self) -> Option<&DraftState> {
        match &self.gesture {
            GestureState::Drafting(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn press(&mut self, diagram: &mut Diagram, point: Point) -> Result<GestureOutcome, DiagramError> {
        let target = hit_test(diagram, point);
        self.dispatch(
            diagram,
            GestureEvent::Press {
                point,
                target,
                drafting: self.new_interaction_mode,
            },
        )
    }

    pub fn drag(&mut self, diagram: &mut Diagram, point: Point) -> Result<GestureOutcome, DiagramError> {
        self.dispatch(diagram, GestureEvent::Move(point))
    }

    pub fn release(&mut self, diagram: &mut Diagram, point: Point) -> Result<GestureOutcome, DiagramError> {
        let actor = diagram.actor_at(point);
        self.dispatch(diagram, GestureEvent::Release { point, actor })
    }

    pub fn cancel(&mut self, diagram: &mut Diagram) -> Result<GestureOutcome, DiagramError> {
        self.dispatch(diagram, GestureEvent::Cancel)
    }

    fn dispatch(&mut self, diagram: &mut Diagram, event: GestureEvent) -> Result<GestureOutcome, DiagramError> {
        let (next, action) = StateMachine::process_event(self.gesture, event);
        self.gesture = next;
        self.apply(diagram, action)
    }

    fn apply(&mut self, diagram: &mut Diagram, action: GestureAction) -> Result<GestureOutcome, DiagramError> {
        let outcome = match action {
            GestureAction::None => GestureOutcome::Nothing,
            GestureAction::ClearSelection => {
                let had_selection =
                    diagram.selected_actor().is_some() || diagram.interactions().selected().is_some();
                diagram.select_actor(None);
                diagram.interactions_mut().clear_selection();
                if had_selection {
                    GestureOutcome::Redraw
                } else {
                    GestureOutcome::Nothing
                }
            }
            GestureAction::SelectActor(actor) => {
                diagram.select_actor(Some(actor));
                diagram.interactions_mut().clear_selection();
                GestureOutcome::ActorSelected(actor)
            }
            GestureAction::SelectInteraction(index) => {
                diagram.interactions_mut().select(index)?;
                diagram.select_actor(None);
                GestureOutcome::InteractionSelected(index)
            }
            GestureAction::MoveActor { actor, x } => {
                diagram.move_actor(actor, x)?;
                GestureOutcome::Redraw
            }
            GestureAction::CommitMove { actor, x } => {
                let x = diagram.move_actor(actor, x)?;
                let touching = diagram.interactions().touching(actor);
                tracing::debug!(%actor, x, touching = touching.len(), "actor moved");
                GestureOutcome::ActorMoved { actor, x, touching }
            }
            GestureAction::StartDraft(_) | GestureAction::UpdateDraft(_) | GestureAction::Cancelled => {
                GestureOutcome::Redraw
            }
            GestureAction::CommitDraft { source, target } => {
                let index = diagram.add_interaction(source, target, "", self.new_interaction_style)?;
                GestureOutcome::InteractionCreated(index)
            }
            GestureAction::DiscardDraft(reason) => {
                tracing::debug!(%reason, "interaction draft discarded");
                GestureOutcome::Rejected(reason)
            }
        };
        Ok(outcome)
    }

    /// Builds the full display list for the current diagram and gesture
    pub fn build_scene(&self, diagram: &Diagram, palette: &Palette) -> Scene {
        let mut scene = Scene::new(
            diagram.width().max(1) as u32,
            diagram.height().max(1) as u32,
            palette.canvas_bg,
        );
        let lifeline_end = (diagram.height() - LIFELINE_BOTTOM_MARGIN) as f32;

        for actor in diagram.actors() {
            let bounds = actor.bounds();
            if diagram.selected_actor() == Some(actor.id) {
                let outline = bounds.inflate(SELECTION_MARGIN);
                scene.push(Shape::Rect {
                    x: outline.x as f32,
                    y: outline.y as f32,
                    w: outline.w as f32,
                    h: outline.h as f32,
                    fill: None,
                    stroke: Some(palette.accent),
                    stroke_width: SELECTION_WIDTH,
                });
            }

            scene.push(Shape::Rect {
                x: bounds.x as f32,
                y: bounds.y as f32,
                w: bounds.w as f32,
                h: bounds.h as f32,
                fill: Some(palette.actor_fill),
                stroke: Some(palette.actor_outline),
                stroke_width: 1.0,
            });

            let cx = actor.x as f32;
            scene.text(
                cx,
                (bounds.y + bounds.h / 2) as f32,
                actor.name.as_str(),
                palette.actor_text,
                ACTOR_NAME_SIZE,
                TextAnchor::Middle,
            );
            scene
                .line((cx, bounds.bottom() as f32), (cx, lifeline_end), palette.lifeline, 1.0)
                .dashed(Some(LIFELINE_DASH));
        }

        let selected = diagram.interactions().selected();
        for (index, interaction) in diagram.interactions().iter() {
            let (Some(source), Some(target)) = (
                diagram.actor(interaction.source),
                diagram.actor(interaction.target),
            ) else {
                continue;
            };

            let y = interaction_y(index) as f32;
            let (sx, tx) = (source.x as f32, target.x as f32);

            if selected == Some(index) {
                scene.line((sx, y), (tx, y), palette.accent, HALO_WIDTH);
            }
            scene
                .line((sx, y), (tx, y), palette.label_fg, ARROW_WIDTH)
                .dashed(interaction.style.dash_pattern())
                .with_arrow();

            if !interaction.label.is_empty() {
                scene.text(
                    (sx + tx) / 2.0,
                    y - LABEL_OFFSET,
                    interaction.label.as_str(),
                    palette.label_fg,
                    LABEL_SIZE,
                    TextAnchor::Middle,
                );
            }
            scene.text(
                INDEX_COLUMN_X as f32,
                y,
                (index + 1).to_string(),
                palette.index_fg,
                INDEX_SIZE,
                TextAnchor::Middle,
            );
        }

        if let Some(draft) = self.draft() {
            if let Some(source) = diagram.actor(draft.source) {
                scene
                    .line(
                        (source.x as f32, INTERACTION_START_Y as f32),
                        (draft.pointer.x as f32, draft.pointer.y as f32),
                        palette.preview_line,
                        1.0,
                    )
                    .dashed(self.new_interaction_style.dash_pattern())
                    .with_arrow();
            }
        }

        scene
    }
}

/// What a press at `point` lands on: actors first, then arrows
pub fn hit_test(diagram: &Diagram, point: Point) -> PressTarget {
    if let Some(id) = diagram.actor_at(point) {
        let grab_offset = diagram.actor(id).map_or(0, |actor| point.x - actor.x);
        return PressTarget::Actor { id, grab_offset };
    }
    match interaction_at(diagram, point) {
        Some(index) => PressTarget::Interaction(index),
        None => PressTarget::Empty,
    }
}

/// Order index of the arrow within the hit tolerance of `point`
///
/// A labelled arrow also owns the band its label is drawn in. When several
/// arrows qualify the highest index (drawn last) wins.
pub fn interaction_at(diagram: &Diagram, point: Point) -> Option<usize> {
    let interactions = diagram.interactions();
    (0..interactions.len()).rev().find(|&index| {
        let Some(interaction) = interactions.get(index) else {
            return false;
        };
        let (Some(source), Some(target)) = (
            diagram.actor(interaction.source),
            diagram.actor(interaction.target),
        ) else {
            return false;
        };
        let y = interaction_y(index);
        distance_to_segment(point, (source.x, y), (target.x, y)) <= INTERACTION_HIT_TOLERANCE
            || (!interaction.label.is_empty() && in_label_band(point, source.x, target.x, y))
    })
}

/// Label text is centred between the actors, `LABEL_OFFSET` above the arrow
fn in_label_band(point: Point, source_x: i32, target_x: i32, arrow_y: i32) -> bool {
    let (left, right) = (source_x.min(target_x), source_x.max(target_x));
    let top = arrow_y - (LABEL_OFFSET + LABEL_SIZE) as i32;
    (left..=right).contains(&point.x) && (top..=arrow_y).contains(&point.y)
}

fn distance_to_segment(point: Point, a: (i32, i32), b: (i32, i32)) -> f32 {
    let (px, py) = (point.x as f32, point.y as f32);
    let (ax, ay) = (a.0 as f32, a.1 as f32);
    let (bx, by) = (b.0 as f32, b.1 as f32);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (px - cx).hypot(py - cy)
}
