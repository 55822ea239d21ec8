//! Diagram state
//!
//! `Diagram` is the single owner of actors and interactions. Controllers
//! receive it by mutable reference for the duration of one event instead of
//! holding a handle to the application.

use crate::domain::core::Point;
use crate::domain::model::{
    ACTOR_EDGE_MARGIN, ACTOR_WIDTH, Actor, ActorId, CANVAS_HEIGHT, CANVAS_WIDTH, Interaction,
    LineStyle, default_actor_x,
};
use crate::domain::sequence::{InteractionSequence, SequenceError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("actor name must not be empty")]
    EmptyActorName,
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),
    #[error("an interaction needs two distinct actors")]
    SameActor,
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    actors: Vec<Actor>,
    interactions: InteractionSequence,
    next_actor_id: u32,
    selected_actor: Option<ActorId>,
    width: i32,
    height: i32,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl Diagram {
    /// Creates an empty diagram for a canvas of the given size
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            actors: Vec::new(),
            interactions: InteractionSequence::new(),
            next_actor_id: 1,
            selected_actor: None,
            width,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Updates the canvas size and pulls actors back inside the new bounds
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        for index in 0..self.actors.len() {
            let x = self.clamp_actor_x(self.actors[index].x);
            self.actors[index].x = x;
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    /// Topmost actor whose box contains `point`
    pub fn actor_at(&self, point: Point) -> Option<ActorId> {
        self.actors
            .iter()
            .rev()
            .find(|actor| actor.bounds().contains(point))
            .map(|actor| actor.id)
    }

    /// Adds an actor at the next free slot on the actor lane
    pub fn add_actor(&mut self, name: &str) -> Result<ActorId, DiagramError> {
        let x = default_actor_x(self.actors.len());
        self.add_actor_at(name, x)
    }

    /// Adds an actor centred at `x` (clamped into the canvas)
    pub fn add_actor_at(&mut self, name: &str, x: i32) -> Result<ActorId, DiagramError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DiagramError::EmptyActorName);
        }

        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        let x = self.clamp_actor_x(x);
        self.actors.push(Actor::new(id, name, x));
        tracing::debug!(actor = %id, name, x, "actor added");
        Ok(id)
    }

    /// Moves an actor horizontally; returns the clamped position
    pub fn move_actor(&mut self, id: ActorId, x: i32) -> Result<i32, DiagramError> {
        let clamped = self.clamp_actor_x(x);
        let actor = self
            .actors
            .iter_mut()
            .find(|actor| actor.id == id)
            .ok_or(DiagramError::UnknownActor(id))?;
        actor.x = clamped;
        Ok(clamped)
    }

    /// Keeps an actor box fully inside the canvas with a small margin
    ///
    /// A canvas narrower than one actor pins actors to the left limit.
    pub fn clamp_actor_x(&self, x: i32) -> i32 {
        let min = ACTOR_WIDTH / 2 + ACTOR_EDGE_MARGIN;
        let max = (self.width - ACTOR_WIDTH / 2 - ACTOR_EDGE_MARGIN).max(min);
        x.clamp(min, max)
    }

    pub fn selected_actor(&self) -> Option<ActorId> {
        self.selected_actor
    }

    pub fn select_actor(&mut self, id: Option<ActorId>) {
        self.selected_actor = id.filter(|id| self.actor(*id).is_some());
    }

    pub fn interactions(&self) -> &InteractionSequence {
        &self.interactions
    }

    pub fn interactions_mut(&mut self) -> &mut InteractionSequence {
        &mut self.interactions
    }

    /// Appends an interaction between two distinct, existing actors
    ///
    /// Returns the new interaction's order index, which equals the number of
    /// interactions before the call.
    pub fn add_interaction(
        &mut self,
        source: ActorId,
        target: ActorId,
        label: &str,
        style: LineStyle,
    ) -> Result<usize, DiagramError> {
        if source == target {
            return Err(DiagramError::SameActor);
        }
        for id in [source, target] {
            if self.actor(id).is_none() {
                return Err(DiagramError::UnknownActor(id));
            }
        }

        let index = self
            .interactions
            .push(Interaction::new(source, target, label, style));
        tracing::debug!(%source, %target, index, "interaction added");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ACTOR_TOP_Y, FIRST_ACTOR_X};

    fn two_actor_diagram() -> (Diagram, ActorId, ActorId) {
        let mut diagram = Diagram::default();
        let a = diagram.add_actor("Client").unwrap();
        let b = diagram.add_actor("Server").unwrap();
        (diagram, a, b)
    }

    #[test]
    fn actors_get_increasing_ids_and_slots() {
        let (diagram, a, b) = two_actor_diagram();
        assert_eq!(a, ActorId(1));
        assert_eq!(b, ActorId(2));
        assert_eq!(diagram.actor(a).unwrap().x, FIRST_ACTOR_X);
        assert_eq!(diagram.actor(b).unwrap().x, 260);
    }

    #[test]
    fn blank_actor_names_are_rejected() {
        let mut diagram = Diagram::default();
        assert_eq!(diagram.add_actor(""), Err(DiagramError::EmptyActorName));
        assert_eq!(diagram.add_actor("   "), Err(DiagramError::EmptyActorName));
        assert!(diagram.actors().is_empty());
    }

    #[test]
    fn actor_names_are_trimmed() {
        let mut diagram = Diagram::default();
        let id = diagram.add_actor("  Browser ").unwrap();
        assert_eq!(diagram.actor(id).unwrap().name, "Browser");
    }

    #[test]
    fn move_actor_clamps_into_canvas() {
        let (mut diagram, a, _) = two_actor_diagram();
        assert_eq!(diagram.move_actor(a, -500).unwrap(), 70);
        assert_eq!(diagram.move_actor(a, 5000).unwrap(), 930);
        assert_eq!(diagram.move_actor(a, 400).unwrap(), 400);
        assert_eq!(
            diagram.move_actor(ActorId(99), 10),
            Err(DiagramError::UnknownActor(ActorId(99)))
        );
    }

    #[test]
    fn resize_pulls_actors_back_inside() {
        let (mut diagram, _, b) = two_actor_diagram();
        diagram.resize(300, 400);
        assert_eq!(diagram.actor(b).unwrap().x, 230);
        assert_eq!(diagram.height(), 400);
    }

    #[test]
    fn actor_hit_testing() {
        let (diagram, a, b) = two_actor_diagram();
        assert_eq!(diagram.actor_at(Point::new(100, ACTOR_TOP_Y + 5)), Some(a));
        assert_eq!(diagram.actor_at(Point::new(260, ACTOR_TOP_Y + 5)), Some(b));
        assert_eq!(diagram.actor_at(Point::new(180, ACTOR_TOP_Y + 5)), None);
        assert_eq!(diagram.actor_at(Point::new(100, 300)), None);
    }

    #[test]
    fn interaction_order_index_is_previous_count() {
        let (mut diagram, a, b) = two_actor_diagram();
        assert_eq!(diagram.add_interaction(a, b, "call", LineStyle::Solid), Ok(0));
        assert_eq!(diagram.add_interaction(b, a, "reply", LineStyle::Dashed), Ok(1));
        assert_eq!(diagram.interactions().len(), 2);
    }

    #[test]
    fn self_interactions_are_rejected_without_mutation() {
        let (mut diagram, a, _) = two_actor_diagram();
        let before = diagram.clone();
        assert_eq!(
            diagram.add_interaction(a, a, "", LineStyle::Solid),
            Err(DiagramError::SameActor)
        );
        assert_eq!(diagram, before);
    }

    #[test]
    fn unknown_actor_is_rejected() {
        let (mut diagram, a, _) = two_actor_diagram();
        assert_eq!(
            diagram.add_interaction(a, ActorId(42), "", LineStyle::Solid),
            Err(DiagramError::UnknownActor(ActorId(42)))
        );
    }

    #[test]
    fn selecting_unknown_actor_clears_selection() {
        let (mut diagram, a, _) = two_actor_diagram();
        diagram.select_actor(Some(a));
        assert_eq!(diagram.selected_actor(), Some(a));
        diagram.select_actor(Some(ActorId(77)));
        assert_eq!(diagram.selected_actor(), None);
    }
}
