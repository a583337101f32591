// src/core/selector.rs

//! Renders one menu level and turns a key press into a selection.
//!
//! ```text
//! *     Main menu
//! 1 System  2 Mode
//! ```
//!
//! Choices are numbered from `1` and laid out over the lines below the title,
//! in two columns (more when the display is too short for them).

use crate::{
    CancellationToken,
    constants::CANCEL_GLYPH,
    core::commons,
    models::{Key, KeySet},
    system::panel::{Panel, PanelError, WaitOptions},
};

/// Outcome of a key wait on a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based position of the chosen entry.
    Choice(usize),
    Cancel,
}

#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
    title: &'a str,
    labels: &'a [String],
    cancelable: bool,
}

impl<'a> Selector<'a> {
    pub fn new(title: &'a str, labels: &'a [String], cancelable: bool) -> Self {
        Self {
            title,
            labels,
            cancelable,
        }
    }

    pub fn display(&self, panel: &mut dyn Panel) -> Result<(), PanelError> {
        panel.clear()?;
        panel.center_text_at(self.title, 1)?;
        if self.cancelable {
            panel.write_at(&CANCEL_GLYPH.to_string(), 1, 1)?;
        }

        let rows = panel.height().saturating_sub(1).max(1);
        let columns = self.labels.len().div_ceil(rows).max(2);
        let column_width = panel.width() / columns;
        if column_width == 0 {
            return Ok(());
        }

        for (i, label) in self.labels.iter().enumerate() {
            let line = 2 + i / columns;
            let col = 1 + (i % columns) * column_width;
            // Entries keep one blank column before their right neighbour.
            let room = if i % columns == columns - 1 {
                panel.width() + 1 - col
            } else {
                column_width - 1
            };
            let text = commons::clip(&format!("{} {}", i + 1, label), room);
            panel.write_at(&text, line, col)?;
        }
        Ok(())
    }

    /// Keys accepted by [`Selector::handle_choice`]: one digit per entry,
    /// plus `Esc` when the level can be left.
    pub fn accepted_keys(&self) -> KeySet {
        let mut keys: KeySet = (0..self.labels.len()).filter_map(Key::for_position).collect();
        if self.cancelable {
            keys.insert(Key::Esc);
        }
        keys
    }

    /// Blocks until a valid key is pressed. Other keys are ignored.
    pub fn handle_choice(
        &self,
        panel: &mut dyn Panel,
        token: &CancellationToken,
    ) -> Result<Selection, PanelError> {
        let keys = self.accepted_keys();
        loop {
            match panel.wait_for_key(&keys, WaitOptions::default(), token)? {
                Some(Key::Esc) => return Ok(Selection::Cancel),
                Some(key) => {
                    if let Some(position) = key.position() {
                        return Ok(Selection::Choice(position));
                    }
                }
                // Only reachable with a timeout, which a level never sets.
                None => {}
            }
        }
    }
}
