//! The atomic editing unit: one cell owning its value, renderer, editor,
//! open/close transition, and coercion.
//!
//! A cell is either `Closed` (renderer active) or `Open` (editor active);
//! both always represent the same value. All `CellState` mutation goes
//! through the cell's own commit operation — the form controller never
//! writes cell fields directly.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::event::{CloseReason, OpenGesture};
use crate::graph::ActivationChange;
use crate::schema::{FieldDescriptor, FieldKind};
use crate::validation::ValidationResult;

/// The editing side of a cell: a buffer the user types into.
pub trait CellEditor {
    /// Load a committed value into the editor buffer.
    fn begin(&mut self, value: &Value);
    /// Apply raw user input to the buffer.
    fn input(&mut self, text: &str);
    /// The raw value the buffer currently represents.
    fn output(&self) -> Value;
    /// The raw text currently held. Preserved verbatim when coercion fails
    /// so no user input is lost.
    fn buffer(&self) -> String;
    /// Downcast support for lifecycle hooks that target a concrete editor.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// The display side of a cell: committed value → display text.
pub trait CellRenderer {
    /// Render a committed value for display.
    fn render(&self, value: &Value) -> String;
}

/// Lifecycle hook run when a cell opens or closes its editor.
pub type EditHook = fn(&mut dyn CellEditor);

/// Processes raw editor output before coercion (e.g. comma-splitting for
/// array cells).
pub type ValueAccessor = fn(&FieldDescriptor, Value) -> Value;

/// Resolved editor/renderer bundle a cell is bound with.
pub struct CellBinding {
    /// The editing half.
    pub editor: Box<dyn CellEditor>,
    /// The display half.
    pub renderer: Box<dyn CellRenderer>,
    /// Hook run when the editor opens.
    pub on_edit_start: Option<EditHook>,
    /// Hook run when the editor closes.
    pub on_edit_end: Option<EditHook>,
    /// Raw editor output processor run before coercion.
    pub accessor: Option<ValueAccessor>,
}

/// Observable state of one cell.
#[derive(Debug, Clone, Default)]
pub struct CellState {
    /// Committed value after coercion.
    pub value: Value,
    /// Snapshot taken when the field was last deactivated, restored on
    /// reactivation. Single-slot memory, deliberately separate from undo.
    pub cached_value: Option<Value>,
    /// Whether the user has interacted with this cell.
    pub interacted: bool,
    /// Whether the editor is currently open.
    pub editing: bool,
    /// Last attached validation outcome.
    pub validation: ValidationResult,
}

/// Outcome of one committed transition.
#[derive(Debug, Clone)]
pub struct CellCommit {
    /// The committed value after coercion.
    pub value: Value,
    /// Whether the coerced value differs from the prior committed value
    /// (always `true` for array/object kinds).
    pub changed: bool,
    /// Present when the raw input could not convert to the declared kind.
    /// The raw text stays in the editor buffer.
    pub coercion_error: Option<String>,
}

/// Where a commit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitSource {
    Editor,
    Programmatic,
}

/// An editable cell bound to one field descriptor.
pub struct EditableCell {
    descriptor: FieldDescriptor,
    state: CellState,
    editor: Box<dyn CellEditor>,
    renderer: Box<dyn CellRenderer>,
    on_edit_start: Option<EditHook>,
    on_edit_end: Option<EditHook>,
    accessor: Option<ValueAccessor>,
    editable: bool,
    had_initial: bool,
    free_edit_used: bool,
    required: bool,
    attributes: BTreeSet<String>,
}

impl std::fmt::Debug for EditableCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableCell")
            .field("path", &self.descriptor.path)
            .field("state", &self.state)
            .field("editable", &self.editable)
            .field("required", &self.required)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl EditableCell {
    /// Bind a cell to a descriptor with its resolved editor/renderer bundle.
    ///
    /// `initial` is the value already present in the host's results for this
    /// path; a cell without one is a "new row" and may be edited once even
    /// when `editable` is false.
    pub fn new(
        descriptor: FieldDescriptor,
        initial: Option<Value>,
        binding: CellBinding,
        editable: bool,
    ) -> Self {
        let had_initial = initial.as_ref().is_some_and(|v| !v.is_null());
        let value = match initial {
            Some(v) if !v.is_null() => v,
            _ => descriptor.default.clone(),
        };
        let required = descriptor.required;
        Self {
            state: CellState {
                value,
                ..CellState::default()
            },
            editor: binding.editor,
            renderer: binding.renderer,
            on_edit_start: binding.on_edit_start,
            on_edit_end: binding.on_edit_end,
            accessor: binding.accessor,
            editable,
            had_initial,
            free_edit_used: false,
            required,
            attributes: BTreeSet::new(),
            descriptor,
        }
    }

    /// The bound descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Observable cell state.
    #[must_use]
    pub fn state(&self) -> &CellState {
        &self.state
    }

    /// Current committed value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.state.value
    }

    /// Whether the field is currently required.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Whether a visibility attribute with this name is currently set.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Whether any visibility attribute is set (the field is inactive).
    #[must_use]
    pub fn hidden(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Display text for the committed value via the renderer.
    #[must_use]
    pub fn display(&self) -> String {
        self.renderer.render(&self.state.value)
    }

    /// Attach a validation outcome to the cell.
    pub fn set_validation(&mut self, validation: ValidationResult) {
        self.state.validation = validation;
    }

    /// Open the editor.
    ///
    /// Requires an explicit gesture on an editable cell. A cell that never
    /// held a committed value opens once regardless of editability (new
    /// rows). Returns whether the cell is now open.
    pub fn open(&mut self, gesture: OpenGesture) -> bool {
        if self.state.editing {
            return true;
        }
        if !self.editable && (self.had_initial || self.free_edit_used) {
            return false;
        }
        if gesture == OpenGesture::User && self.hidden() {
            return false;
        }

        self.state.editing = true;
        self.editor.begin(&self.state.value);
        if let Some(hook) = self.on_edit_start {
            hook(self.editor.as_mut());
        }
        true
    }

    /// Apply raw user input to the open editor.
    ///
    /// No-op while closed: input cannot bypass the open gesture.
    pub fn input(&mut self, text: &str) {
        if !self.state.editing {
            return;
        }
        self.state.interacted = true;
        self.editor.input(text);
    }

    /// Close the editor.
    ///
    /// Runs on focus loss or confirmation and always applies coercion before
    /// leaving the open state; `Cancel` drops the pending editor value
    /// instead. Returns the commit outcome, or `None` when the cell was not
    /// open or the close was a cancellation.
    pub fn close(&mut self, reason: CloseReason) -> Option<CellCommit> {
        if !self.state.editing {
            return None;
        }
        self.state.editing = false;
        if !self.editable {
            self.free_edit_used = true;
        }
        if let Some(hook) = self.on_edit_end {
            hook(self.editor.as_mut());
        }
        if reason == CloseReason::Cancel {
            return None;
        }
        let raw = self.editor.output();
        Some(self.commit_raw(raw, CommitSource::Editor))
    }

    /// Programmatic value assignment.
    ///
    /// Routes through the editor buffer and the same commit path a manual
    /// edit takes, so change notifications and undo entries are identical to
    /// a keystroke-driven commit.
    pub fn set(&mut self, value: &Value) -> CellCommit {
        if self.state.editing {
            // A later synchronous edit supersedes the open session.
            self.state.editing = false;
        }
        self.editor.begin(value);
        let raw = self.editor.output();
        self.commit_raw(raw, CommitSource::Programmatic)
    }

    /// Apply a planned activation change from dependency propagation.
    ///
    /// Deactivation snapshots the current value into the cache and forces
    /// the edge's fallback; reactivation restores the cached value and the
    /// edge's requiredness. Returns the commit produced by the forced value
    /// change, if any.
    pub fn apply_activation(&mut self, change: &ActivationChange) -> Option<CellCommit> {
        if change.active {
            self.attributes.remove(&change.spec.attribute);
            if let Some(required) = change.spec.required_when_active {
                self.required = required;
            }
            self.state.cached_value.take().map(|cached| self.set(&cached))
        } else {
            if !self.state.value.is_null() {
                self.state.cached_value = Some(self.state.value.clone());
            }
            self.attributes.insert(change.spec.attribute.clone());
            if change.spec.required_when_active.is_some() {
                self.required = false;
            }
            let fallback = change.spec.fallback.clone();
            Some(self.set(&fallback))
        }
    }

    /// Carry observable state forward from a previous bind of the same path,
    /// e.g. across a schema replacement. The editor is always closed.
    pub(crate) fn adopt_state(&mut self, mut state: CellState) {
        state.editing = false;
        self.had_initial = self.had_initial || !state.value.is_null();
        self.state = state;
    }

    /// Shared commit path: accessor, coercion, diff, state mutation.
    fn commit_raw(&mut self, raw: Value, source: CommitSource) -> CellCommit {
        let processed = match self.accessor {
            Some(accessor) => accessor(&self.descriptor, raw),
            None => raw,
        };

        if source == CommitSource::Editor {
            self.state.interacted = true;
        }

        // Array/object values pass through structurally; no equality is
        // attempted, so they always re-notify.
        if self.descriptor.kind.is_structural() {
            self.state.value = processed.clone();
            return CellCommit {
                value: processed,
                changed: true,
                coercion_error: None,
            };
        }

        let string_form = stringify(&processed);
        match coerce_typed(self.descriptor.kind, &string_form) {
            Ok(typed) => {
                let changed = stringify(&typed) != stringify(&self.state.value);
                self.state.value = typed.clone();
                CellCommit {
                    value: typed,
                    changed,
                    coercion_error: None,
                }
            }
            Err(message) => CellCommit {
                value: self.state.value.clone(),
                changed: false,
                coercion_error: Some(message),
            },
        }
    }
}

/// Stable string form used for change diffing of non-structural values.
///
/// Independent of the concrete editor widget: two editors producing `5` and
/// `"5"` commit identically.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert the stable string form into the declared kind.
fn coerce_typed(kind: FieldKind, text: &str) -> Result<Value, String> {
    match kind {
        FieldKind::String => Ok(Value::String(text.to_string())),
        FieldKind::Number => {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            let parsed: f64 = text
                .parse()
                .map_err(|_| format!("{text:?} is not a valid number"))?;
            serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| format!("{text:?} is not a finite number"))
        }
        FieldKind::Integer => {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            text.parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("{text:?} is not a valid integer"))
        }
        FieldKind::Boolean => match text {
            "" => Ok(Value::Null),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(format!("{other:?} is not a valid boolean")),
        },
        // Structural kinds never reach typed coercion.
        FieldKind::Array | FieldKind::Object => Ok(Value::String(text.to_string())),
    }
}
