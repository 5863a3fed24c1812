//! The form controller: owns the cells, the dependency graph, the
//! validation pipeline, the undo history, and the interaction dispatcher
//! for one form instance.
//!
//! Hosts drive it with paths and gestures; the controller routes every
//! mutation through the cell commit path so typed edits, programmatic
//! assignments, dependency fallbacks, and undo replays all produce the same
//! notifications.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::cell::{CellCommit, EditableCell};
use crate::condition::{Condition, Predicate};
use crate::dispatcher::{InteractionDispatcher, InteractionEvent};
use crate::error::{FormError, FormResult};
use crate::event::{CloseReason, FormEvent, OnEvent, OnThrow, OnUpdate, OpenGesture};
use crate::graph::DependencyGraph;
use crate::registry::CellTypeRegistry;
use crate::schema::{FieldPath, FormSchema};
use crate::undo::{UndoEntry, UndoStack};
use crate::validation::{
    HostError, PendingValidation, Severity, ValidationMessage, ValidationPipeline,
    ValidationRequest, ValidationResult, ValidationTicket, ValidatorFn, ValidatorReply,
};

/// Options for binding a form.
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Raw schema tree.
    pub schema: Value,
    /// Values already present for this form, keyed by nested field name.
    pub results: Value,
    /// Whether cells holding a committed value may be reopened.
    pub editable: bool,
    /// Whether `validate()` checks fields that are empty and untouched.
    pub validate_empty_values: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            schema: Value::Object(serde_json::Map::new()),
            results: Value::Object(serde_json::Map::new()),
            editable: true,
            validate_empty_values: true,
        }
    }
}

/// Aggregate validation standing across a whole form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormStatus {
    /// Cells whose latest validation ended at warning severity.
    pub warnings: usize,
    /// Cells whose latest validation ended at error severity.
    pub errors: usize,
}

/// Outcome of one committed change through the controller.
#[derive(Debug)]
pub struct CommitReceipt {
    /// Path of the committed field.
    pub path: FieldPath,
    /// The committed value after coercion.
    pub value: Value,
    /// Whether the committed value differs from the prior one.
    pub changed: bool,
    /// Synchronous validation outcome already attached to the cell.
    pub validation: ValidationResult,
    /// Async validation the host must drive, when the validator deferred.
    pub pending: Option<PendingValidation>,
}

/// One bound form: schema, cells, dependencies, validation, history.
pub struct FormController {
    schema: FormSchema,
    cells: Vec<EditableCell>,
    graph: DependencyGraph,
    pipeline: ValidationPipeline,
    registry: CellTypeRegistry,
    undo_stack: UndoStack,
    dispatcher: InteractionDispatcher,
    open_tokens: HashMap<FieldPath, Uuid>,
    validator: Option<ValidatorFn>,
    on_update: Option<OnUpdate>,
    on_throw: Option<OnThrow>,
    on_event: Option<OnEvent>,
    editable: bool,
    validate_empty_values: bool,
    warnings: Vec<String>,
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("cells", &self.cells.len())
            .field("editable", &self.editable)
            .field("warnings", &self.warnings.len())
            .finish_non_exhaustive()
    }
}

impl FormController {
    /// Bind a form with the built-in cell types.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Schema`] when the schema root is not an object.
    pub fn bind(options: FormOptions) -> FormResult<Self> {
        Self::bind_with(options, CellTypeRegistry::with_builtins())
    }

    /// Bind a form with a host-extended cell type registry.
    ///
    /// Normalizes the schema, builds the dependency graph and validation
    /// pipeline, constructs one cell per descriptor seeded from `results`,
    /// and runs an initial dependency propagation so fields whose
    /// controllers start falsy begin inactive.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Schema`] when the schema root is not an object.
    pub fn bind_with(options: FormOptions, registry: CellTypeRegistry) -> FormResult<Self> {
        let schema = FormSchema::normalize(&options.schema).map_err(FormError::Schema)?;
        let mut warnings = schema.warnings.clone();
        let graph = DependencyGraph::build(&schema.descriptors, &mut warnings);
        let pipeline = ValidationPipeline::for_schema(&schema, &mut warnings);

        let cells = schema
            .descriptors
            .iter()
            .map(|descriptor| {
                let initial = lookup_path(&options.results, &descriptor.path);
                registry.bind(descriptor.clone(), initial, options.editable)
            })
            .collect();

        let mut controller = Self {
            schema,
            cells,
            graph,
            pipeline,
            registry,
            undo_stack: UndoStack::default(),
            dispatcher: InteractionDispatcher::default(),
            open_tokens: HashMap::new(),
            validator: None,
            on_update: None,
            on_throw: None,
            on_event: None,
            editable: options.editable,
            validate_empty_values: options.validate_empty_values,
            warnings,
        };
        controller.seed_activation();
        tracing::info!(fields = controller.cells.len(), "form bound");
        Ok(controller)
    }

    /// Install the host change validator.
    pub fn set_validator(&mut self, validator: ValidatorFn) {
        self.validator = Some(validator);
    }

    /// Install the per-change update callback.
    pub fn set_on_update(&mut self, on_update: OnUpdate) {
        self.on_update = Some(on_update);
    }

    /// Install the host-abort callback.
    pub fn set_on_throw(&mut self, on_throw: OnThrow) {
        self.on_throw = Some(on_throw);
    }

    /// Install the event sink.
    pub fn set_on_event(&mut self, on_event: OnEvent) {
        self.on_event = Some(on_event);
    }

    /// The normalized schema.
    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Authoring warnings collected during bind.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// All cells in render order.
    #[must_use]
    pub fn cells(&self) -> &[EditableCell] {
        &self.cells
    }

    /// Look up one cell by path.
    #[must_use]
    pub fn cell(&self, path: &FieldPath) -> Option<&EditableCell> {
        self.cells.iter().find(|c| c.descriptor().path == *path)
    }

    /// Whether a field is currently active (no visibility attribute set).
    #[must_use]
    pub fn is_active(&self, path: &FieldPath) -> bool {
        self.cell(path).is_some_and(|c| !c.hidden())
    }

    /// Whether any cell is currently open for editing.
    #[must_use]
    pub fn has_open(&self) -> bool {
        self.dispatcher.has_open()
    }

    /// Whether any committed change can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    /// Whether any undone change can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    /// Display text for one cell via its renderer.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unbound path.
    pub fn display(&self, path: &FieldPath) -> FormResult<String> {
        self.cell(path)
            .map(EditableCell::display)
            .ok_or_else(|| FormError::UnknownField(path.to_string()))
    }

    /// Highest validation severity across all cells.
    #[must_use]
    pub fn status(&self) -> Severity {
        self.cells
            .iter()
            .map(|c| c.state().validation.severity)
            .max()
            .unwrap_or(Severity::None)
    }

    /// Per-severity cell counts, for progress indicators.
    #[must_use]
    pub fn status_counts(&self) -> FormStatus {
        let mut status = FormStatus::default();
        for cell in &self.cells {
            match cell.state().validation.severity {
                Severity::Warning => status.warnings += 1,
                Severity::Error => status.errors += 1,
                Severity::None => {}
            }
        }
        status
    }

    /// Nested snapshot of all committed values. Null values are omitted;
    /// ignored fields contribute their defaults like any other.
    #[must_use]
    pub fn results(&self) -> Value {
        let mut root = serde_json::Map::new();
        for cell in &self.cells {
            let value = cell.value();
            if value.is_null() {
                continue;
            }
            insert_path(&mut root, cell.descriptor().path.segments(), value.clone());
        }
        Value::Object(root)
    }

    /// Open a cell for editing.
    ///
    /// Returns whether the cell is now open; registers it with the
    /// interaction dispatcher when it is.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unbound path.
    pub fn open(&mut self, path: &FieldPath, gesture: OpenGesture) -> FormResult<bool> {
        let idx = self.index_of(path)?;
        let opened = self.cells[idx].open(gesture);
        if opened && !self.open_tokens.contains_key(path) {
            let token = self.dispatcher.register(path.clone());
            self.open_tokens.insert(path.clone(), token);
            self.emit(FormEvent::CellOpened { path: path.clone() });
        }
        Ok(opened)
    }

    /// Apply raw user input to an open cell. No-op while the cell is closed.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unbound path.
    pub fn input(&mut self, path: &FieldPath, text: &str) -> FormResult<()> {
        let idx = self.index_of(path)?;
        self.cells[idx].input(text);
        Ok(())
    }

    /// Close an open cell, committing (or cancelling) its pending value.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unbound path and
    /// [`FormError::HostThrow`] when the validator aborts.
    pub fn close(
        &mut self,
        path: &FieldPath,
        reason: CloseReason,
    ) -> FormResult<Option<CommitReceipt>> {
        let idx = self.index_of(path)?;
        let was_open = self.cells[idx].state().editing;
        let previous = self.cells[idx].value().clone();
        let commit = self.cells[idx].close(reason);
        if was_open {
            if let Some(token) = self.open_tokens.remove(path) {
                self.dispatcher.unregister(token);
            }
            self.emit(FormEvent::CellClosed { path: path.clone() });
        }
        match commit {
            Some(commit) => Ok(Some(self.finish_commit(path, previous, commit, true)?)),
            None => Ok(None),
        }
    }

    /// Programmatic value assignment.
    ///
    /// Routes through the same commit path as a typed edit: dependency
    /// propagation, validation, events, and an undo entry all follow.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unbound path and
    /// [`FormError::HostThrow`] when the validator aborts.
    pub fn set_value(&mut self, path: &FieldPath, value: &Value) -> FormResult<CommitReceipt> {
        self.assign(path, value, true)
    }

    /// Route a global gesture to the form's open cells.
    ///
    /// Click-away closes with commit, escape closes with cancel. Only cells
    /// registered with this form's dispatcher are touched.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::HostThrow`] when the validator aborts a commit.
    pub fn dispatch(&mut self, event: InteractionEvent) -> FormResult<Vec<CommitReceipt>> {
        let reason = match event {
            InteractionEvent::ClickAway => CloseReason::Blur,
            InteractionEvent::Escape => CloseReason::Cancel,
        };
        let open = self.dispatcher.drain(event);
        let mut receipts = Vec::new();
        for path in open {
            self.open_tokens.remove(&path);
            if let Some(receipt) = self.close(&path, reason)? {
                receipts.push(receipt);
            }
        }
        Ok(receipts)
    }

    /// Hand a resolved async validation back to the controller.
    ///
    /// Applies the stale-response rule: the result only attaches when the
    /// ticket is still the field's in-flight run and the field's value has
    /// not moved on. Returns whether the result was attached.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unbound path and
    /// [`FormError::HostThrow`] when the validator resolved with an abort.
    pub fn apply_validation(
        &mut self,
        ticket: &ValidationTicket,
        outcome: Result<Vec<ValidationMessage>, HostError>,
    ) -> FormResult<bool> {
        let messages = match outcome {
            Ok(messages) => messages,
            Err(e) => {
                self.pipeline.forget(&ticket.path);
                if let Some(on_throw) = &mut self.on_throw {
                    on_throw(&e.0);
                }
                return Err(FormError::HostThrow(e.0));
            }
        };
        let idx = self.index_of(&ticket.path)?;
        let current = self.cells[idx].value().clone();
        if !self.pipeline.accept(ticket, &current) {
            return Ok(false);
        }
        let descriptor = self.cells[idx].descriptor().clone();
        let mut all = self.pipeline.pattern_messages(&descriptor, &current);
        all.extend(messages);
        self.attach_validation(idx, ValidationResult::from_messages(all));
        Ok(true)
    }

    /// Run the whole-form check used before workflow advancement.
    ///
    /// Open editors are committed first (a blur close through the
    /// dispatcher), so text the user typed but never blurred still counts.
    /// Required active fields must hold non-empty values; non-empty values
    /// must pass their pattern and the host validator (pending replies are
    /// awaited inline). Ignored and inactive fields are skipped, and empty
    /// untouched fields are skipped when `validate_empty_values` is off.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::ValidationFailed`] when any field ends at error
    /// severity and [`FormError::HostThrow`] when the validator aborts.
    pub async fn validate(&mut self) -> FormResult<()> {
        self.dispatch(InteractionEvent::ClickAway)?;
        let paths: Vec<FieldPath> = self
            .cells
            .iter()
            .map(|c| c.descriptor().path.clone())
            .collect();

        let mut failed = 0usize;
        for path in paths {
            let idx = self.index_of(&path)?;
            let cell = &self.cells[idx];
            let descriptor = cell.descriptor().clone();
            let value = cell.value().clone();
            let hidden = cell.hidden();
            let interacted = cell.state().interacted;
            let required = cell.required();

            if descriptor.ignore || hidden {
                continue;
            }
            let empty = is_empty_value(&value);
            if empty && !self.validate_empty_values && !interacted {
                continue;
            }

            let mut messages = Vec::new();
            if required && empty {
                messages.push(ValidationMessage::error(format!(
                    "{} is a required property",
                    descriptor.path.key()
                )));
            }
            if !empty {
                messages.extend(self.pipeline.pattern_messages(&descriptor, &value));
                if let Some(validator) = self.validator.clone() {
                    let request = ValidationRequest {
                        name: path.key().to_string(),
                        parent: self.parent_values(&path),
                        path: path.clone(),
                        value: value.clone(),
                    };
                    let outcome = match validator(request) {
                        ValidatorReply::Ready(outcome) => outcome,
                        ValidatorReply::Pending(future) => future.await,
                    };
                    match outcome {
                        Ok(more) => messages.extend(more),
                        Err(e) => {
                            if let Some(on_throw) = &mut self.on_throw {
                                on_throw(&e.0);
                            }
                            return Err(FormError::HostThrow(e.0));
                        }
                    }
                }
            }

            let validation = ValidationResult::from_messages(messages);
            if validation.severity == Severity::Error {
                failed += 1;
            }
            self.attach_validation(idx, validation);
        }

        if failed > 0 {
            Err(FormError::ValidationFailed { failed })
        } else {
            Ok(())
        }
    }

    /// Undo the most recent committed change.
    ///
    /// The previous value replays through the normal commit path so
    /// dependency propagation and validation fire, without recording a new
    /// history entry. Returns `None` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::HostThrow`] when the validator aborts the
    /// replayed commit.
    pub fn undo(&mut self) -> FormResult<Option<CommitReceipt>> {
        let Some(entry) = self.undo_stack.undo() else {
            return Ok(None);
        };
        self.assign(&entry.field_path, &entry.previous, false).map(Some)
    }

    /// Redo the most recently undone change.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::HostThrow`] when the validator aborts the
    /// replayed commit.
    pub fn redo(&mut self) -> FormResult<Option<CommitReceipt>> {
        let Some(entry) = self.undo_stack.redo() else {
            return Ok(None);
        };
        self.assign(&entry.field_path, &entry.new, false).map(Some)
    }

    /// Install a custom predicate on one dependency edge and re-propagate.
    ///
    /// `controller_name` resolves as a sibling of the dependent, matching
    /// how authored dependencies resolve.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] when no such edge exists.
    pub fn set_dependency_predicate(
        &mut self,
        dependent: &FieldPath,
        controller_name: &str,
        predicate: Predicate,
    ) -> FormResult<()> {
        let controller = dependent.sibling(controller_name);
        if !self
            .graph
            .set_condition(&controller, dependent, Condition::Predicate(predicate))
        {
            return Err(FormError::UnknownField(format!("{controller} -> {dependent}")));
        }
        self.propagate_from(controller, true);
        Ok(())
    }

    /// Rebind the form to a new schema.
    ///
    /// Cells whose paths survive carry their committed value, interaction
    /// flag, and validation state forward; everything else (history, open
    /// editors, in-flight validations) resets, and initial propagation runs
    /// against the new dependency graph.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Schema`] when the new root is not an object.
    pub fn replace_schema(&mut self, root: &Value) -> FormResult<()> {
        let schema = FormSchema::normalize(root).map_err(FormError::Schema)?;
        let mut warnings = schema.warnings.clone();
        let graph = DependencyGraph::build(&schema.descriptors, &mut warnings);
        let pipeline = ValidationPipeline::for_schema(&schema, &mut warnings);

        let mut old: HashMap<FieldPath, EditableCell> = std::mem::take(&mut self.cells)
            .into_iter()
            .map(|c| (c.descriptor().path.clone(), c))
            .collect();
        for descriptor in &schema.descriptors {
            let mut cell = self.registry.bind(descriptor.clone(), None, self.editable);
            if let Some(previous) = old.remove(&descriptor.path) {
                cell.adopt_state(previous.state().clone());
            }
            self.cells.push(cell);
        }

        self.schema = schema;
        self.graph = graph;
        self.pipeline = pipeline;
        self.warnings = warnings;
        self.undo_stack.clear();
        self.open_tokens.clear();
        self.dispatcher = InteractionDispatcher::default();
        self.seed_activation();
        tracing::info!(fields = self.cells.len(), "schema replaced");
        Ok(())
    }

    fn index_of(&self, path: &FieldPath) -> FormResult<usize> {
        self.cells
            .iter()
            .position(|c| c.descriptor().path == *path)
            .ok_or_else(|| FormError::UnknownField(path.to_string()))
    }

    fn emit(&mut self, event: FormEvent) {
        if let Some(on_event) = &mut self.on_event {
            on_event(&event);
        }
    }

    /// Record a value change: history, event fan-out, update callback.
    fn record_commit(&mut self, path: &FieldPath, previous: Value, value: &Value, record: bool) {
        if record {
            self.undo_stack.push(UndoEntry {
                field_path: path.clone(),
                previous,
                new: value.clone(),
            });
        }
        tracing::debug!(path = %path, "value committed");
        self.emit(FormEvent::ValueCommitted {
            path: path.clone(),
            value: value.clone(),
        });
        if let Some(on_update) = &mut self.on_update {
            on_update(path, value);
        }
    }

    /// Run initial propagation for every controller so dependents whose
    /// controllers start falsy begin inactive. Never recorded in history.
    fn seed_activation(&mut self) {
        for controller in self.graph.controllers().to_vec() {
            self.propagate_from(controller, false);
        }
    }

    /// Cascade dependency propagation from a changed controller.
    ///
    /// Forced fallback commits on dependents may themselves control further
    /// fields, so changed dependents join the worklist.
    fn propagate_from(&mut self, root: FieldPath, record: bool) {
        let mut worklist = vec![root];
        while let Some(current) = worklist.pop() {
            let changes = {
                let cells = &self.cells;
                self.graph.propagate(&current, &|path| {
                    cells
                        .iter()
                        .find(|c| c.descriptor().path == *path)
                        .map(|c| c.value().clone())
                })
            };
            for change in changes {
                let Ok(idx) = self.index_of(&change.dependent) else {
                    continue;
                };
                let previous = self.cells[idx].value().clone();
                let was_editing = self.cells[idx].state().editing;
                let commit = self.cells[idx].apply_activation(&change);
                if was_editing && !self.cells[idx].state().editing {
                    if let Some(token) = self.open_tokens.remove(&change.dependent) {
                        self.dispatcher.unregister(token);
                    }
                    self.emit(FormEvent::CellClosed {
                        path: change.dependent.clone(),
                    });
                }
                self.emit(FormEvent::ActivationChanged {
                    path: change.dependent.clone(),
                    active: change.active,
                });
                if let Some(commit) = commit {
                    if commit.changed {
                        self.record_commit(&change.dependent, previous, &commit.value, record);
                        worklist.push(change.dependent.clone());
                    }
                }
            }
        }
    }

    fn assign(&mut self, path: &FieldPath, value: &Value, record: bool) -> FormResult<CommitReceipt> {
        let idx = self.index_of(path)?;
        if self.cells[idx].state().editing {
            if let Some(token) = self.open_tokens.remove(path) {
                self.dispatcher.unregister(token);
            }
            self.emit(FormEvent::CellClosed { path: path.clone() });
        }
        let previous = self.cells[idx].value().clone();
        let commit = self.cells[idx].set(value);
        self.finish_commit(path, previous, commit, record)
    }

    /// Shared tail of every commit: history, propagation, validation.
    fn finish_commit(
        &mut self,
        path: &FieldPath,
        previous: Value,
        commit: CellCommit,
        record: bool,
    ) -> FormResult<CommitReceipt> {
        let idx = self.index_of(path)?;
        if let Some(message) = commit.coercion_error {
            let validation = ValidationResult::from_messages(vec![ValidationMessage::error(message)]);
            self.attach_validation(idx, validation.clone());
            return Ok(CommitReceipt {
                path: path.clone(),
                value: commit.value,
                changed: false,
                validation,
                pending: None,
            });
        }

        if commit.changed {
            self.record_commit(path, previous, &commit.value, record);
            self.propagate_from(path.clone(), record);
        }

        let descriptor = self.cells[idx].descriptor().clone();
        let mut messages = Vec::new();
        let mut pending = None;
        if !descriptor.ignore {
            messages = self.pipeline.pattern_messages(&descriptor, &commit.value);
            if let Some(validator) = self.validator.clone() {
                let request = ValidationRequest {
                    name: path.key().to_string(),
                    parent: self.parent_values(path),
                    path: path.clone(),
                    value: commit.value.clone(),
                };
                match validator(request) {
                    ValidatorReply::Ready(Ok(more)) => messages.extend(more),
                    ValidatorReply::Ready(Err(e)) => {
                        if let Some(on_throw) = &mut self.on_throw {
                            on_throw(&e.0);
                        }
                        return Err(FormError::HostThrow(e.0));
                    }
                    ValidatorReply::Pending(future) => {
                        let ticket = self.pipeline.issue(path, &commit.value);
                        pending = Some(PendingValidation { ticket, future });
                    }
                }
            }
        }

        let validation = ValidationResult::from_messages(messages);
        self.attach_validation(idx, validation.clone());
        Ok(CommitReceipt {
            path: path.clone(),
            value: commit.value,
            changed: commit.changed,
            validation,
            pending,
        })
    }

    fn attach_validation(&mut self, idx: usize, validation: ValidationResult) {
        let path = self.cells[idx].descriptor().path.clone();
        let severity = validation.severity;
        self.cells[idx].set_validation(validation);
        self.emit(FormEvent::ValidationResolved { path, severity });
    }

    /// Snapshot of the values surrounding a field, for cross-field rules.
    fn parent_values(&self, path: &FieldPath) -> Value {
        let results = self.results();
        match path.parent() {
            Some(parent) => lookup_path(&results, &parent)
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            None => results,
        }
    }
}

/// Walk a nested value tree by path segments.
fn lookup_path(root: &Value, path: &FieldPath) -> Option<Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.get(segment)?;
    }
    Some(current.clone())
}

/// Insert a value into a nested map, creating intermediate objects.
fn insert_path(root: &mut serde_json::Map<String, Value>, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [key] => {
            root.insert(key.clone(), value);
        }
        [key, rest @ ..] => {
            let nested = root
                .entry(key.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Value::Object(map) = nested {
                insert_path(map, rest, value);
            }
        }
    }
}

/// Whether a value counts as unspecified for the required check.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
