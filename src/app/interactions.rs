//! Interaction manager
//!
//! A short-lived view over the diagram's interaction list used by the list
//! panel and the keyboard commands: formatting entries, selecting, moving,
//! editing and deleting. Ordering invariants are enforced by
//! [`InteractionSequence`](crate::domain::sequence::InteractionSequence).

use crate::domain::diagram::{Diagram, DiagramError};
use crate::domain::model::{ActorId, Interaction, LineStyle};
use crate::domain::sequence::MoveDirection;

pub struct InteractionManager<'a> {
    diagram: &'a mut Diagram,
}

impl<'a> InteractionManager<'a> {
    pub fn new(diagram: &'a mut Diagram) -> Self {
        Self { diagram }
    }

    /// One display line per interaction, in order
    pub fn entries(&self) -> Vec<String> {
        list_entries(&*self.diagram)
    }

    pub fn selected(&self) -> Option<usize> {
        self.diagram.interactions().selected()
    }

    pub fn selected_interaction(&self) -> Option<&Interaction> {
        self.selected()
            .and_then(|index| self.diagram.interactions().get(index))
    }

    /// Selects an interaction; the actor selection is cleared
    pub fn select(&mut self, index: usize) -> Result<(), DiagramError> {
        self.diagram.interactions_mut().select(index)?;
        self.diagram.select_actor(None);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.diagram.interactions_mut().clear_selection();
    }

    /// Moves the selected interaction one step; `None` at either end or
    /// without a selection
    pub fn move_selected(&mut self, direction: MoveDirection) -> Option<usize> {
        let index = self.selected()?;
        let moved = self.diagram.interactions_mut().move_item(index, direction);
        if let Some(to) = moved {
            tracing::debug!(from = index, to, "interaction reordered");
        }
        moved
    }

    pub fn set_label(&mut self, index: usize, label: &str) -> Result<(), DiagramError> {
        self.diagram.interactions_mut().set_label(index, label)?;
        Ok(())
    }

    pub fn set_style(&mut self, index: usize, style: LineStyle) -> Result<(), DiagramError> {
        self.diagram.interactions_mut().set_style(index, style)?;
        Ok(())
    }

    /// Flips the selected interaction between solid and dashed
    pub fn toggle_selected_style(&mut self) -> Result<Option<LineStyle>, DiagramError> {
        let Some(index) = self.selected() else {
            return Ok(None);
        };
        let Some(current) = self.diagram.interactions().get(index).map(|i| i.style) else {
            return Ok(None);
        };
        let style = current.toggled();
        self.set_style(index, style)?;
        Ok(Some(style))
    }

    /// Deletes the selected interaction, if any
    ///
    /// Later interactions move up one place; the selection moves to the
    /// interaction now at the same index, or clears when there is none.
    pub fn delete_selected(&mut self) -> Result<Option<Interaction>, DiagramError> {
        let Some(index) = self.selected() else {
            return Ok(None);
        };
        let removed = self.diagram.interactions_mut().remove(index)?;
        tracing::debug!(index, label = %removed.label, "interaction deleted");
        Ok(Some(removed))
    }
}

/// Formats every interaction as `"{n}. {source} -> {target} [{style}]: {label}"`
pub fn list_entries(diagram: &Diagram) -> Vec<String> {
    diagram
        .interactions()
        .iter()
        .map(|(index, interaction)| {
            format!(
                "{}. {} -> {} [{}]: {}",
                index + 1,
                actor_label(diagram, interaction.source),
                actor_label(diagram, interaction.target),
                interaction.style,
                interaction.label
            )
        })
        .collect()
}

fn actor_label(diagram: &Diagram, id: ActorId) -> String {
    diagram
        .actor(id)
        .map_or_else(|| format!("id:{id}"), |actor| actor.name.clone())
}
