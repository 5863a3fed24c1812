//! Per-field validation: declared pattern checks, host-supplied async
//! validators, severity merging, and the stale-response rule.
//!
//! Validators may be asynchronous and must not block: a commit returns any
//! pending work as a future the host drives, and a later synchronous edit
//! supersedes an in-flight result through ticket + value matching rather
//! than cancellation. A hung validator simply leaves its field pending.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::cell::stringify;
use crate::schema::{FieldDescriptor, FieldPath, FormSchema};

/// Ordered validation severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No findings.
    #[default]
    None,
    /// Non-blocking finding.
    Warning,
    /// Blocks `validate()`.
    Error,
}

/// One validation finding, in the host wire shape `{type, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Severity of the finding.
    #[serde(rename = "type")]
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl ValidationMessage {
    /// Build a warning message.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Build an error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Merged validation outcome attached to a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Highest severity across all messages.
    pub severity: Severity,
    /// Findings in the order they were produced.
    pub messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    /// Merge a batch of messages: severity is the maximum present.
    #[must_use]
    pub fn from_messages(messages: Vec<ValidationMessage>) -> Self {
        let severity = messages
            .iter()
            .map(|m| m.severity)
            .max()
            .unwrap_or(Severity::None);
        Self { severity, messages }
    }

    /// Fold further messages into this result.
    pub fn extend(&mut self, messages: Vec<ValidationMessage>) {
        for message in messages {
            self.severity = self.severity.max(message.severity);
            self.messages.push(message);
        }
    }
}

/// The host validator aborted the surrounding workflow.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HostError(pub String);

/// Everything a host validator sees for one committed change.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Field name (final path key).
    pub name: String,
    /// The full sibling value set; cross-field rules are common.
    pub parent: Value,
    /// Full path of the field.
    pub path: FieldPath,
    /// The committed value that triggered validation.
    pub value: Value,
}

/// Future resolving a host validator call.
pub type ValidatorFuture = BoxFuture<'static, Result<Vec<ValidationMessage>, HostError>>;

/// A host validator's reply: immediate or deferred.
pub enum ValidatorReply {
    /// The validator answered synchronously.
    Ready(Result<Vec<ValidationMessage>, HostError>),
    /// The validator is asynchronous; the host drives the future and hands
    /// the outcome back through the controller.
    Pending(ValidatorFuture),
}

/// Host-supplied change validator.
pub type ValidatorFn = Arc<dyn Fn(ValidationRequest) -> ValidatorReply + Send + Sync>;

/// Identity of one validation run: which field, and which value triggered it.
#[derive(Debug, Clone)]
pub struct ValidationTicket {
    /// Unique id of this run.
    pub id: Uuid,
    /// Field under validation.
    pub path: FieldPath,
    /// The value that triggered the run.
    pub value: Value,
}

/// An in-flight async validation the host must drive to completion.
pub struct PendingValidation {
    /// Identity for the stale-response check on resolution.
    pub ticket: ValidationTicket,
    /// The validator's future.
    pub future: ValidatorFuture,
}

impl std::fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingValidation")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Per-field validation pipeline: compiled patterns plus in-flight tickets.
#[derive(Debug, Default)]
pub struct ValidationPipeline {
    patterns: HashMap<FieldPath, Regex>,
    in_flight: HashMap<FieldPath, Uuid>,
}

impl ValidationPipeline {
    /// Compile the declared patterns of a normalized schema.
    ///
    /// Invalid patterns are an authoring problem: warned and skipped, never
    /// fatal.
    pub fn for_schema(schema: &FormSchema, warnings: &mut Vec<String>) -> Self {
        let mut patterns = HashMap::new();
        for descriptor in &schema.descriptors {
            if let Some(pattern) = &descriptor.pattern {
                match Regex::new(pattern) {
                    Ok(regex) => {
                        patterns.insert(descriptor.path.clone(), regex);
                    }
                    Err(e) => {
                        warnings.push(format!("{}: invalid pattern: {e}", descriptor.path));
                    }
                }
            }
        }
        Self {
            patterns,
            in_flight: HashMap::new(),
        }
    }

    /// Run the declared pattern check for one committed value.
    ///
    /// Empty values are the required check's concern, not the pattern's.
    #[must_use]
    pub fn pattern_messages(
        &self,
        descriptor: &FieldDescriptor,
        value: &Value,
    ) -> Vec<ValidationMessage> {
        let Some(regex) = self.patterns.get(&descriptor.path) else {
            return Vec::new();
        };
        let text = stringify(value);
        if text.is_empty() || regex.is_match(&text) {
            Vec::new()
        } else {
            vec![ValidationMessage::error(format!(
                "{} does not match the required pattern",
                descriptor.path.key()
            ))]
        }
    }

    /// Issue a ticket for a new validation run, superseding any run already
    /// in flight for the field.
    pub fn issue(&mut self, path: &FieldPath, value: &Value) -> ValidationTicket {
        let id = Uuid::new_v4();
        self.in_flight.insert(path.clone(), id);
        ValidationTicket {
            id,
            path: path.clone(),
            value: value.clone(),
        }
    }

    /// Decide whether a resolved run may attach its result.
    ///
    /// Stale-response rule: the run must still be the field's in-flight run
    /// and the field's current value must match the value that triggered it.
    /// Accepted runs are cleared from the in-flight table.
    pub fn accept(&mut self, ticket: &ValidationTicket, current_value: &Value) -> bool {
        if self.in_flight.get(&ticket.path) != Some(&ticket.id) {
            tracing::debug!(path = %ticket.path, "discarding superseded validation result");
            return false;
        }
        if current_value != &ticket.value {
            tracing::debug!(path = %ticket.path, "discarding stale validation result");
            return false;
        }
        self.in_flight.remove(&ticket.path);
        true
    }

    /// Drop any in-flight run for a field (e.g. when the field leaves the
    /// schema on replacement).
    pub fn forget(&mut self, path: &FieldPath) {
        self.in_flight.remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pipeline_for(schema: serde_json::Value) -> (ValidationPipeline, FormSchema, Vec<String>) {
        let schema = FormSchema::normalize(&schema).expect("normalize");
        let mut warnings = Vec::new();
        let pipeline = ValidationPipeline::for_schema(&schema, &mut warnings);
        (pipeline, schema, warnings)
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::None);
    }

    #[test]
    fn test_merge_takes_highest_severity() {
        let result = ValidationResult::from_messages(vec![
            ValidationMessage::warning("w"),
            ValidationMessage::error("e"),
        ]);
        assert_eq!(result.severity, Severity::Error);
        assert_eq!(result.messages.len(), 2);

        let result = ValidationResult::from_messages(vec![ValidationMessage::warning("w")]);
        assert_eq!(result.severity, Severity::Warning);

        assert_eq!(ValidationResult::from_messages(Vec::new()).severity, Severity::None);
    }

    #[test]
    fn test_message_wire_shape() {
        let message = ValidationMessage::error("broken");
        let wire = serde_json::to_value(&message).expect("serialize");
        assert_eq!(wire, json!({"type": "error", "message": "broken"}));
    }

    #[test]
    fn test_pattern_check() {
        let (pipeline, schema, warnings) = pipeline_for(json!({
            "id": { "type": "string", "pattern": "^[a-z]+$" },
        }));
        assert!(warnings.is_empty());
        let descriptor = &schema.descriptors[0];

        assert!(pipeline.pattern_messages(descriptor, &json!("abc")).is_empty());
        let messages = pipeline.pattern_messages(descriptor, &json!("ABC"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Error);
    }

    #[test]
    fn test_empty_value_skips_pattern() {
        let (pipeline, schema, _) = pipeline_for(json!({
            "id": { "type": "string", "pattern": "^[a-z]+$" },
        }));
        assert!(pipeline.pattern_messages(&schema.descriptors[0], &json!("")).is_empty());
        assert!(pipeline.pattern_messages(&schema.descriptors[0], &json!(null)).is_empty());
    }

    #[test]
    fn test_invalid_pattern_warns() {
        let (pipeline, schema, warnings) = pipeline_for(json!({
            "id": { "type": "string", "pattern": "([unclosed" },
        }));
        assert_eq!(warnings.len(), 1);
        assert!(pipeline.pattern_messages(&schema.descriptors[0], &json!("x")).is_empty());
    }

    #[test]
    fn test_stale_ticket_rejected_after_supersede() {
        let mut pipeline = ValidationPipeline::default();
        let path: FieldPath = "field".into();

        let first = pipeline.issue(&path, &json!("A"));
        let second = pipeline.issue(&path, &json!("B"));

        assert!(!pipeline.accept(&first, &json!("B")), "superseded run is discarded");
        assert!(pipeline.accept(&second, &json!("B")));
    }

    #[test]
    fn test_ticket_rejected_when_value_moved_on() {
        let mut pipeline = ValidationPipeline::default();
        let path: FieldPath = "field".into();
        let ticket = pipeline.issue(&path, &json!("A"));
        assert!(!pipeline.accept(&ticket, &json!("B")));
    }

    #[test]
    fn test_accept_clears_in_flight() {
        let mut pipeline = ValidationPipeline::default();
        let path: FieldPath = "field".into();
        let ticket = pipeline.issue(&path, &json!("A"));
        assert!(pipeline.accept(&ticket, &json!("A")));
        assert!(!pipeline.accept(&ticket, &json!("A")), "a run resolves once");
    }
}
