//! Cell type registry: maps a field's (kind, format) to its editor and
//! renderer.
//!
//! Cell types are plain records of factories and optional lifecycle hooks —
//! no runtime class hierarchy. [`EditableCell`] operates uniformly across
//! every registered type; the registry is the only place that knows which
//! concrete editor a field gets.
//!
//! Built-ins: plain text (the catch-all), comma-delimited arrays with
//! optional uniqueness, enumerated dropdowns with blur-deferred commit, and
//! timezone-aware date-time strings.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde_json::Value;

use crate::cell::{
    stringify, CellBinding, CellEditor, CellRenderer, EditHook, EditableCell, ValueAccessor,
};
use crate::schema::{FieldDescriptor, FieldKind};

/// Creates the editing half of a cell for a descriptor.
pub type EditorFactory = fn(&FieldDescriptor) -> Box<dyn CellEditor>;

/// Creates the display half of a cell for a descriptor.
pub type RendererFactory = fn(&FieldDescriptor) -> Box<dyn CellRenderer>;

/// One registered cell type: a plain record keyed by (kind, format).
#[derive(Clone, Copy)]
pub struct CellType {
    /// Editor factory.
    pub editor: EditorFactory,
    /// Renderer factory.
    pub renderer: RendererFactory,
    /// Hook run when the editor opens.
    pub on_edit_start: Option<EditHook>,
    /// Hook run when the editor closes.
    pub on_edit_end: Option<EditHook>,
    /// Raw editor output processor run before coercion.
    pub accessor: Option<ValueAccessor>,
}

/// Registry of cell types keyed by (kind, format).
///
/// Resolution order: enumerated fields always get the dropdown type; then an
/// exact (kind, format) match; then (kind, no format); then plain text.
pub struct CellTypeRegistry {
    entries: Vec<(FieldKind, Option<String>, CellType)>,
    enum_type: CellType,
    text_type: CellType,
}

impl Default for CellTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CellTypeRegistry {
    /// A registry with only the plain-text catch-all and the dropdown type
    /// for enumerated fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            enum_type: CellType {
                editor: |descriptor| Box::new(EnumEditor::new(descriptor)),
                renderer: |descriptor| Box::new(EnumRenderer::new(descriptor)),
                on_edit_start: Some(enum_dropdown_open),
                on_edit_end: Some(enum_dropdown_close),
                accessor: None,
            },
            text_type: CellType {
                editor: |_| Box::new(TextEditor::default()),
                renderer: |_| Box::new(TextRenderer),
                on_edit_start: None,
                on_edit_end: None,
                accessor: None,
            },
        }
    }

    /// A registry with all built-in cell types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            FieldKind::Array,
            None,
            CellType {
                editor: |_| Box::new(ArrayEditor::default()),
                renderer: |_| Box::new(ArrayRenderer),
                on_edit_start: None,
                on_edit_end: None,
                accessor: Some(array_accessor),
            },
        );
        registry.register(
            FieldKind::String,
            Some("date-time"),
            CellType {
                editor: |_| Box::new(DateTimeEditor::default()),
                renderer: |_| Box::new(TextRenderer),
                on_edit_start: None,
                on_edit_end: None,
                accessor: None,
            },
        );
        registry
    }

    /// Register (or override) the cell type for a (kind, format) pair.
    pub fn register(&mut self, kind: FieldKind, format: Option<&str>, cell_type: CellType) {
        let format = format.map(str::to_string);
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(k, f, _)| *k == kind && *f == format)
        {
            entry.2 = cell_type;
        } else {
            self.entries.push((kind, format, cell_type));
        }
    }

    /// Resolve the cell type for a descriptor.
    #[must_use]
    pub fn resolve(&self, descriptor: &FieldDescriptor) -> CellType {
        if descriptor.enum_values.is_some() {
            return self.enum_type;
        }
        let exact = self.entries.iter().find(|(kind, format, _)| {
            *kind == descriptor.kind && format.as_deref() == descriptor.format.as_deref()
        });
        if let Some((_, _, cell_type)) = exact {
            return *cell_type;
        }
        if descriptor.format.is_some() {
            let by_kind = self
                .entries
                .iter()
                .find(|(kind, format, _)| *kind == descriptor.kind && format.is_none());
            if let Some((_, _, cell_type)) = by_kind {
                return *cell_type;
            }
        }
        self.text_type
    }

    /// Resolve and construct a bound cell for a descriptor.
    #[must_use]
    pub fn bind(
        &self,
        descriptor: FieldDescriptor,
        initial: Option<Value>,
        editable: bool,
    ) -> EditableCell {
        let cell_type = self.resolve(&descriptor);
        let binding = CellBinding {
            editor: (cell_type.editor)(&descriptor),
            renderer: (cell_type.renderer)(&descriptor),
            on_edit_start: cell_type.on_edit_start,
            on_edit_end: cell_type.on_edit_end,
            accessor: cell_type.accessor,
        };
        EditableCell::new(descriptor, initial, binding, editable)
    }
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// Free-text editor: a single string buffer.
#[derive(Debug, Default)]
pub struct TextEditor {
    buffer: String,
}

impl CellEditor for TextEditor {
    fn begin(&mut self, value: &Value) {
        self.buffer = stringify(value);
    }

    fn input(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    fn output(&self) -> Value {
        Value::String(self.buffer.clone())
    }

    fn buffer(&self) -> String {
        self.buffer.clone()
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Renders any scalar as its stable string form.
#[derive(Debug)]
pub struct TextRenderer;

impl CellRenderer for TextRenderer {
    fn render(&self, value: &Value) -> String {
        stringify(value)
    }
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

/// Array editor: a comma-delimited text buffer.
#[derive(Debug, Default)]
pub struct ArrayEditor {
    buffer: String,
}

impl CellEditor for ArrayEditor {
    fn begin(&mut self, value: &Value) {
        self.buffer = match value {
            Value::Array(items) => items
                .iter()
                .map(stringify)
                .collect::<Vec<_>>()
                .join(","),
            other => stringify(other),
        };
    }

    fn input(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    fn output(&self) -> Value {
        Value::String(self.buffer.clone())
    }

    fn buffer(&self) -> String {
        self.buffer.clone()
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Renders an array as a comma-joined string.
#[derive(Debug)]
pub struct ArrayRenderer;

impl CellRenderer for ArrayRenderer {
    fn render(&self, value: &Value) -> String {
        match value {
            Value::Array(items) => items
                .iter()
                .map(stringify)
                .collect::<Vec<_>>()
                .join(","),
            other => stringify(other),
        }
    }
}

/// Parse raw editor output into an ordered sequence.
///
/// Strings split on commas with trimming; empty segments are dropped.
/// Duplicates are removed (first occurrence wins) when the descriptor
/// declares `uniqueItems`.
fn array_accessor(descriptor: &FieldDescriptor, raw: Value) -> Value {
    let items: Vec<Value> = match raw {
        Value::Null => Vec::new(),
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
        Value::Array(items) => items,
        other => vec![other],
    };

    if descriptor.unique_items {
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Array(unique)
    } else {
        Value::Array(items)
    }
}

// ---------------------------------------------------------------------------
// Enumerated / dropdown
// ---------------------------------------------------------------------------

/// Dropdown editor: click-to-select from the declared choices.
///
/// Commits are blur-deferred: input that does not match a choice leaves the
/// pending selection untouched, so focus wandering into the dropdown (or
/// stray keystrokes) cannot clobber the value. Closing without a selection
/// retains the prior committed value.
#[derive(Debug, Default)]
pub struct EnumEditor {
    committed: Value,
    pending: Option<Value>,
    choices: Vec<Value>,
    /// Whether the selection list is currently presented.
    pub dropdown_open: bool,
}

impl EnumEditor {
    /// Build an editor over the descriptor's choices.
    #[must_use]
    pub fn new(descriptor: &FieldDescriptor) -> Self {
        Self {
            choices: descriptor.enum_values.clone().unwrap_or_default(),
            ..Self::default()
        }
    }
}

impl CellEditor for EnumEditor {
    fn begin(&mut self, value: &Value) {
        self.committed = value.clone();
        self.pending = None;
    }

    fn input(&mut self, text: &str) {
        let selected = self
            .choices
            .iter()
            .find(|choice| stringify(choice) == text);
        if let Some(choice) = selected {
            self.pending = Some(choice.clone());
        }
    }

    fn output(&self) -> Value {
        self.pending.clone().unwrap_or_else(|| self.committed.clone())
    }

    fn buffer(&self) -> String {
        stringify(&self.output())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn enum_dropdown_open(editor: &mut dyn CellEditor) {
    if let Some(editor) = editor.as_any_mut().downcast_mut::<EnumEditor>() {
        editor.dropdown_open = true;
    }
}

fn enum_dropdown_close(editor: &mut dyn CellEditor) {
    if let Some(editor) = editor.as_any_mut().downcast_mut::<EnumEditor>() {
        editor.dropdown_open = false;
    }
}

/// Renders an enumerated value through its display label when one exists.
#[derive(Debug)]
pub struct EnumRenderer {
    labels: HashMap<String, String>,
}

impl EnumRenderer {
    fn new(descriptor: &FieldDescriptor) -> Self {
        Self {
            labels: descriptor.enum_labels.clone(),
        }
    }
}

impl CellRenderer for EnumRenderer {
    fn render(&self, value: &Value) -> String {
        let key = stringify(value);
        self.labels.get(&key).cloned().unwrap_or(key)
    }
}

// ---------------------------------------------------------------------------
// Date-time
// ---------------------------------------------------------------------------

/// The transport format for date-time commits: local wall-clock plus a
/// signed, zero-padded UTC offset.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Date-time editor: normalizes picker-style input to the transport format.
#[derive(Debug, Default)]
pub struct DateTimeEditor {
    buffer: String,
}

impl CellEditor for DateTimeEditor {
    fn begin(&mut self, value: &Value) {
        self.buffer = stringify(value);
    }

    fn input(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    fn output(&self) -> Value {
        match normalize_date_time(&self.buffer) {
            Some(normalized) => Value::String(normalized),
            None if self.buffer.is_empty() => Value::String(String::new()),
            // Unparseable input commits as-is; pattern or host validation
            // flags it without losing what the user typed.
            None => Value::String(self.buffer.clone()),
        }
    }

    fn buffer(&self) -> String {
        self.buffer.clone()
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Normalize a date-time string to `YYYY-MM-DDTHH:mm:ss±HH:MM`.
///
/// Accepts the transport format itself, RFC 3339 (including `Z`, which
/// becomes `+00:00`), and offset-less picker input (`YYYY-MM-DDTHH:mm[:ss]`)
/// which gets the local UTC offset attached. Returns `None` for anything
/// unparseable.
#[must_use]
pub fn normalize_date_time(text: &str) -> Option<String> {
    if let Ok(parsed) = DateTime::parse_from_str(text, DATE_TIME_FORMAT) {
        return Some(parsed.format(DATE_TIME_FORMAT).to_string());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.format(DATE_TIME_FORMAT).to_string());
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.format(DATE_TIME_FORMAT).to_string())
}
