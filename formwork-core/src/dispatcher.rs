//! Form-scoped interaction dispatcher.
//!
//! Hosts forward global gestures (click-away, escape) to one dispatcher per
//! form instance. Open cells register themselves and receive the gesture as
//! a close instruction; the dispatcher never reaches outside its own form,
//! so two forms side by side cannot close each other's editors.

use uuid::Uuid;

use crate::schema::FieldPath;

/// A global gesture routed to open cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    /// Pointer interaction outside any registered cell.
    ClickAway,
    /// Escape key.
    Escape,
}

/// Registry of currently open cells within one form.
#[derive(Debug, Default)]
pub struct InteractionDispatcher {
    open: Vec<(Uuid, FieldPath)>,
}

impl InteractionDispatcher {
    /// Register a cell as open; the returned token deregisters it.
    pub fn register(&mut self, path: FieldPath) -> Uuid {
        let token = Uuid::new_v4();
        self.open.push((token, path));
        token
    }

    /// Deregister a previously registered cell. Unknown tokens are ignored.
    pub fn unregister(&mut self, token: Uuid) {
        self.open.retain(|(t, _)| *t != token);
    }

    /// Paths of all registered open cells, oldest first, and clear the
    /// registry. The caller closes each cell per the gesture.
    pub fn drain(&mut self, event: InteractionEvent) -> Vec<FieldPath> {
        if !self.open.is_empty() {
            tracing::debug!(?event, open = self.open.len(), "dispatching interaction");
        }
        self.open.drain(..).map(|(_, path)| path).collect()
    }

    /// Whether any cell is registered as open.
    #[must_use]
    pub fn has_open(&self) -> bool {
        !self.open.is_empty()
    }
}
