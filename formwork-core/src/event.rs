//! Events and host callbacks for form interaction.

use serde_json::Value;

use crate::schema::FieldPath;
use crate::validation::Severity;

/// The gesture that asked a cell to open for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenGesture {
    /// An explicit user gesture (double-click, Enter on the cell).
    User,
    /// A programmatic open, e.g. from a value assignment routed through
    /// the commit path.
    Programmatic,
}

/// Why an open cell is closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Focus moved elsewhere; the pending editor value is committed.
    Blur,
    /// Explicit confirmation (Enter); the pending editor value is committed.
    Confirm,
    /// Explicit cancellation (Escape); the pending editor value is dropped.
    Cancel,
}

/// Notifications fanned out to the host as the form changes.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// A cell entered its editing state.
    CellOpened {
        /// Path of the cell.
        path: FieldPath,
    },
    /// A cell left its editing state.
    CellClosed {
        /// Path of the cell.
        path: FieldPath,
    },
    /// A committed value changed after coercion.
    ValueCommitted {
        /// Path of the cell.
        path: FieldPath,
        /// The new committed value.
        value: Value,
    },
    /// A dependent field switched between active and inactive.
    ActivationChanged {
        /// Path of the dependent field.
        path: FieldPath,
        /// New activation state.
        active: bool,
    },
    /// A validation run (sync or async) attached a result to a cell.
    ValidationResolved {
        /// Path of the validated field.
        path: FieldPath,
        /// Merged severity of the result.
        severity: Severity,
    },
}

/// Callback invoked after every committed and validated change.
pub type OnUpdate = Box<dyn FnMut(&FieldPath, &Value)>;

/// Callback invoked when the host validator aborts the workflow.
pub type OnThrow = Box<dyn FnMut(&str)>;

/// Sink for [`FormEvent`] fan-out.
pub type OnEvent = Box<dyn FnMut(&FormEvent)>;
