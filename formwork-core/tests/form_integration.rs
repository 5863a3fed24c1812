//! Form Engine Integration Tests
//!
//! Tests complete editing sessions through the public API:
//! - Conditional activation driven by typed edits
//! - Cell editing lifecycle (open, input, close, dispatch)
//! - Async validation with stale-response handling
//! - Whole-form validation before workflow advancement
//! - Undo/redo through the commit path

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};

use formwork_core::{
    CloseReason, FieldPath, FormController, FormEvent, FormOptions, InteractionEvent, OpenGesture,
    Severity, ValidationMessage, ValidatorReply,
};

/// A session-setup schema in the shape dataset conversion tools use: a
/// boolean controller hides the per-subject fields once multiple sessions
/// are requested.
fn session_schema() -> Value {
    json!({
        "multiple_sessions": {
            "type": "boolean",
            "default": false,
        },
        "subject_id": {
            "type": "string",
            "dependencies": {
                "multiple_sessions": {
                    "condition": [false, null],
                    "default": "",
                    "required": true,
                },
            },
        },
        "session_id": {
            "type": "string",
            "dependencies": {
                "multiple_sessions": {
                    "condition": [false, null],
                    "default": "",
                    "required": true,
                },
            },
        },
    })
}

fn bind(schema: Value) -> FormController {
    FormController::bind(FormOptions {
        schema,
        ..FormOptions::default()
    })
    .expect("bind")
}

fn type_into(form: &mut FormController, path: &FieldPath, text: &str) {
    assert!(form.open(path, OpenGesture::User).expect("open"));
    form.input(path, text).expect("input");
    form.close(path, CloseReason::Confirm).expect("close");
}

// ============================================================================
// Conditional Activation Workflow Tests
// ============================================================================

#[test]
fn test_single_session_workflow_fills_subject_fields() {
    let mut form = bind(session_schema());

    assert!(form.is_active(&"subject_id".into()));
    assert!(form.cell(&"subject_id".into()).expect("cell").required());

    type_into(&mut form, &"subject_id".into(), "mouse-001");
    type_into(&mut form, &"session_id".into(), "ses-01");

    assert_eq!(
        form.results(),
        json!({
            "multiple_sessions": false,
            "subject_id": "mouse-001",
            "session_id": "ses-01",
        })
    );
}

#[test]
fn test_toggling_controller_hides_and_restores_dependents() {
    let mut form = bind(session_schema());
    type_into(&mut form, &"subject_id".into(), "mouse-001");

    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");
    let subject = form.cell(&"subject_id".into()).expect("cell");
    assert!(subject.hidden());
    assert!(!subject.required(), "hidden fields stop being required");
    assert_eq!(subject.value(), &json!(""), "fallback replaces the value");

    form.set_value(&"multiple_sessions".into(), &json!(false)).expect("set");
    let subject = form.cell(&"subject_id".into()).expect("cell");
    assert!(!subject.hidden());
    assert!(subject.required());
    assert_eq!(subject.value(), &json!("mouse-001"), "cached value restored");
}

#[test]
fn test_repeated_commits_propagate_once() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    let mut form = bind(session_schema());
    form.set_on_event(Box::new(move |event| sink.borrow_mut().push(event.clone())));

    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");
    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");
    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");

    let activations = events
        .borrow()
        .iter()
        .filter(|e| {
            matches!(
                e,
                FormEvent::ActivationChanged { path, .. } if path.to_string() == "subject_id"
            )
        })
        .count();
    assert_eq!(activations, 1, "unchanged activation produces no duplicates");
}

#[test]
fn test_hidden_cell_rejects_user_open_but_accepts_programmatic() {
    let mut form = bind(session_schema());
    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");

    let path: FieldPath = "subject_id".into();
    assert!(!form.open(&path, OpenGesture::User).expect("open"));
    assert!(form.open(&path, OpenGesture::Programmatic).expect("open"));
    form.close(&path, CloseReason::Cancel).expect("close");
}

// ============================================================================
// Cell Editing Lifecycle Tests
// ============================================================================

#[test]
fn test_array_field_parses_commas_and_dedupes() {
    let mut form = bind(json!({
        "keywords": { "type": "array", "uniqueItems": true },
    }));
    let path: FieldPath = "keywords".into();

    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "ephys, behavior, ephys, ").expect("input");
    form.close(&path, CloseReason::Blur).expect("close");

    assert_eq!(form.results(), json!({ "keywords": ["ephys", "behavior"] }));
    assert_eq!(form.display(&path).expect("display"), "ephys,behavior");
}

#[test]
fn test_dropdown_ignores_stray_input_until_a_choice_lands() {
    let mut form = bind(json!({
        "species": {
            "type": "string",
            "enum": ["Mus musculus", "Rattus norvegicus"],
            "default": "Mus musculus",
        },
    }));
    let path: FieldPath = "species".into();

    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "something the dropdown never offered").expect("input");
    let receipt = form.close(&path, CloseReason::Blur).expect("close").expect("receipt");
    assert!(!receipt.changed, "blur without a selection keeps the prior value");
    assert_eq!(receipt.value, json!("Mus musculus"));

    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "Rattus norvegicus").expect("input");
    let receipt = form.close(&path, CloseReason::Blur).expect("close").expect("receipt");
    assert!(receipt.changed);
    assert_eq!(receipt.value, json!("Rattus norvegicus"));
}

#[test]
fn test_date_time_commits_in_transport_format() {
    let mut form = bind(json!({
        "session_start_time": { "type": "string", "format": "date-time" },
    }));
    let path: FieldPath = "session_start_time".into();

    type_into(&mut form, &path, "2024-03-01T10:30:00+05:30");
    assert_eq!(
        form.results(),
        json!({ "session_start_time": "2024-03-01T10:30:00+05:30" })
    );

    // Picker-style input without an offset gains the local one.
    type_into(&mut form, &path, "2024-03-01T09:15");
    let committed = form.cell(&path).expect("cell").value().as_str().expect("string");
    assert!(committed.starts_with("2024-03-01T09:15:00"));
    assert_eq!(committed.len(), "2024-03-01T09:15:00+00:00".len());
}

#[test]
fn test_number_coercion_failure_keeps_committed_value() {
    let mut form = bind(json!({
        "weight": { "type": "number", "default": 20.5 },
    }));
    let path: FieldPath = "weight".into();

    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "twenty grams").expect("input");
    let receipt = form.close(&path, CloseReason::Blur).expect("close").expect("receipt");

    assert!(!receipt.changed);
    assert_eq!(receipt.validation.severity, Severity::Error);
    assert_eq!(form.cell(&path).expect("cell").value(), &json!(20.5));
}

#[test]
fn test_dispatchers_are_scoped_per_form() {
    let schema = json!({ "name": { "type": "string" } });
    let mut left = bind(schema.clone());
    let mut right = bind(schema);
    let path: FieldPath = "name".into();

    left.open(&path, OpenGesture::User).expect("open");
    right.open(&path, OpenGesture::User).expect("open");

    left.dispatch(InteractionEvent::ClickAway).expect("dispatch");
    assert!(!left.has_open());
    assert!(right.has_open(), "a gesture in one form leaves the other alone");
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_stale_async_result_never_lands() {
    let mut form = bind(json!({ "subject_id": { "type": "string" } }));
    form.set_validator(Arc::new(|request| {
        let value = request.value;
        ValidatorReply::Pending(
            async move {
                if value == json!("taken") {
                    Ok(vec![ValidationMessage::error("subject_id already in use")])
                } else {
                    Ok(Vec::new())
                }
            }
            .boxed(),
        )
    }));

    let path: FieldPath = "subject_id".into();
    let slow = form
        .set_value(&path, &json!("taken"))
        .expect("set")
        .pending
        .expect("pending");

    // The user fixes the value before the first run resolves.
    let fast = form
        .set_value(&path, &json!("fresh"))
        .expect("set")
        .pending
        .expect("pending");

    let fast_outcome = fast.future.await;
    assert!(form.apply_validation(&fast.ticket, fast_outcome).expect("apply"));
    assert_eq!(form.status(), Severity::None);

    // The slow run resolves last but must not clobber the clean result.
    let slow_outcome = slow.future.await;
    assert!(!form.apply_validation(&slow.ticket, slow_outcome).expect("apply"));
    assert_eq!(form.status(), Severity::None);
}

#[tokio::test]
async fn test_validate_rejects_then_passes() {
    let mut form = bind(session_schema());

    let err = form.validate().await.expect_err("missing required fields");
    assert_eq!(err.to_string(), "2 required inputs are not specified properly");
    assert_eq!(form.status(), Severity::Error);
    assert_eq!(
        form.cell(&"subject_id".into()).expect("cell").state().validation.messages[0].message,
        "subject_id is a required property"
    );

    type_into(&mut form, &"subject_id".into(), "mouse-001");
    type_into(&mut form, &"session_id".into(), "ses-01");
    form.validate().await.expect("all required fields hold values");
}

#[tokio::test]
async fn test_validate_honors_pattern_and_hidden_fields() {
    let mut form = bind(json!({
        "multiple_sessions": { "type": "boolean", "default": false },
        "subject_id": {
            "type": "string",
            "pattern": "^[a-z0-9-]+$",
            "dependencies": {
                "multiple_sessions": { "condition": [false, null], "default": "" },
            },
        },
    }));

    form.set_value(&"subject_id".into(), &json!("Mouse 1")).expect("set");
    assert!(form.validate().await.is_err(), "pattern violation blocks");

    // Hiding the field exempts it without fixing the value.
    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");
    form.validate().await.expect("hidden fields are exempt");
}

#[tokio::test]
async fn test_validate_commits_open_editor_text() {
    let mut form = bind(json!({
        "name": { "type": "string", "required": true },
    }));
    let path: FieldPath = "name".into();

    // The user types but never blurs before asking to advance.
    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "typed but never blurred").expect("input");

    form.validate().await.expect("open editor text is committed first");
    assert_eq!(form.results(), json!({ "name": "typed but never blurred" }));
    assert!(!form.has_open());
}

#[tokio::test]
async fn test_ignored_field_keeps_default_and_skips_validation() {
    let mut form = bind(json!({
        "schema_version": {
            "type": "string",
            "default": "v1",
            "required": true,
            "ignore": true,
        },
        "name": { "type": "string" },
    }));

    form.validate().await.expect("ignored fields never block");
    assert_eq!(form.results(), json!({ "schema_version": "v1" }));
}

#[tokio::test]
async fn test_untouched_empty_fields_skipped_when_configured() {
    let mut form = FormController::bind(FormOptions {
        schema: json!({
            "notes": { "type": "string", "required": true },
        }),
        validate_empty_values: false,
        ..FormOptions::default()
    })
    .expect("bind");

    form.validate().await.expect("untouched empty field is skipped");

    let path: FieldPath = "notes".into();
    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "").expect("input");
    form.close(&path, CloseReason::Blur).expect("close");
    assert!(
        form.validate().await.is_err(),
        "once touched, the empty required field is flagged"
    );
}

// ============================================================================
// History Tests
// ============================================================================

#[test]
fn test_undo_rolls_back_forced_fallbacks_too() {
    let mut form = bind(session_schema());
    type_into(&mut form, &"subject_id".into(), "mouse-001");
    form.set_value(&"multiple_sessions".into(), &json!(true)).expect("set");
    assert_eq!(form.cell(&"subject_id".into()).expect("cell").value(), &json!(""));

    // Last recorded change is the fallback synthesized by propagation.
    form.undo().expect("undo");
    assert_eq!(
        form.cell(&"subject_id".into()).expect("cell").value(),
        &json!("mouse-001")
    );

    // Next one rolls the controller itself back and re-propagates.
    form.undo().expect("undo");
    assert!(form.is_active(&"subject_id".into()));
    assert_eq!(
        form.cell(&"multiple_sessions".into()).expect("cell").value(),
        &json!(false)
    );
}

#[test]
fn test_escape_leaves_history_untouched() {
    let mut form = bind(json!({ "name": { "type": "string" } }));
    let path: FieldPath = "name".into();

    form.open(&path, OpenGesture::User).expect("open");
    form.input(&path, "never committed").expect("input");
    form.dispatch(InteractionEvent::Escape).expect("dispatch");

    assert!(!form.can_undo());
    assert_eq!(form.results(), json!({}));
}
