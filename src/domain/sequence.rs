//! Ordered interaction list with single selection
//!
//! The order index of an interaction is its position in the backing vector,
//! so indices are dense, zero-based and contiguous after any insert, swap or
//! removal. Selection is tracked by index and is kept pointing at the same
//! interaction across moves; after a removal it advances to the interaction
//! that took the removed one's place, or clears if there is none.

use crate::domain::model::{ActorId, Interaction, LineStyle};

/// Errors raised by sequence operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("interaction index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Direction of a reorder step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionSequence {
    items: Vec<Interaction>,
    selected: Option<usize>,
}

impl InteractionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Interaction> {
        self.items.get(index)
    }

    /// Iterates interactions with their order index, ascending
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Interaction)> {
        self.items.iter().enumerate()
    }

    /// Order indices of every interaction with an endpoint on `actor`
    pub fn touching(&self, actor: ActorId) -> Vec<usize> {
        self.iter()
            .filter(|(_, interaction)| interaction.touches(actor))
            .map(|(index, _)| index)
            .collect()
    }

    /// Appends an interaction and returns its order index (the previous count)
    pub fn push(&mut self, interaction: Interaction) -> usize {
        self.items.push(interaction);
        self.items.len() - 1
    }

    /// Currently selected order index, if any
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selects the interaction at `index`; selecting it again is a no-op
    pub fn select(&mut self, index: usize) -> Result<(), SequenceError> {
        self.check_index(index)?;
        self.selected = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Swaps the interaction at `index` with its neighbour
    ///
    /// Returns the new index of the moved interaction, or `None` when the move
    /// would cross either end of the list (the list is left untouched).
    pub fn move_item(&mut self, index: usize, direction: MoveDirection) -> Option<usize> {
        if index >= self.items.len() {
            return None;
        }

        let other = match direction {
            MoveDirection::Up => index.checked_sub(1)?,
            MoveDirection::Down => {
                let next = index + 1;
                if next >= self.items.len() {
                    return None;
                }
                next
            }
        };

        self.items.swap(index, other);
        self.selected = match self.selected {
            Some(sel) if sel == index => Some(other),
            Some(sel) if sel == other => Some(index),
            sel => sel,
        };
        Some(other)
    }

    pub fn set_label(&mut self, index: usize, label: impl Into<String>) -> Result<(), SequenceError> {
        self.check_index(index)?;
        self.items[index].label = label.into();
        Ok(())
    }

    pub fn set_style(&mut self, index: usize, style: LineStyle) -> Result<(), SequenceError> {
        self.check_index(index)?;
        self.items[index].style = style;
        Ok(())
    }

    /// Removes the interaction at `index`, re-packing later indices down by one
    pub fn remove(&mut self, index: usize) -> Result<Interaction, SequenceError> {
        self.check_index(index)?;
        let removed = self.items.remove(index);
        let len = self.items.len();

        self.selected = match self.selected {
            Some(sel) if sel == index => (index < len).then_some(index),
            Some(sel) if sel > index => Some(sel - 1),
            sel => sel,
        };

        Ok(removed)
    }

    fn check_index(&self, index: usize) -> Result<(), SequenceError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(SequenceError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}
