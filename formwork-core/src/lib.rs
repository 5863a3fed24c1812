//! # Formwork Core
//!
//! Headless schema-driven form and table editing engine: conditional
//! field activation, typed cell editing, and async-safe validation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               formwork-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Schema          │  Dependency Graph        │
//! │  - Descriptors   │  - Controller edges      │
//! │  - Normalization │  - Activation cascade    │
//! ├─────────────────────────────────────────────┤
//! │  Cells           │  Validation              │
//! │  - Editors       │  - Pattern checks        │
//! │  - Coercion      │  - Async tickets         │
//! ├─────────────────────────────────────────────┤
//! │  Form Controller │  Undo · Dispatcher       │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cell;
pub mod condition;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod graph;
pub mod registry;
pub mod schema;
pub mod undo;
pub mod validation;

pub use cell::{CellBinding, CellCommit, CellEditor, CellRenderer, CellState, EditableCell};
pub use condition::{Condition, Predicate};
pub use controller::{CommitReceipt, FormController, FormOptions, FormStatus};
pub use dispatcher::{InteractionDispatcher, InteractionEvent};
pub use error::{FormError, FormResult};
pub use event::{CloseReason, FormEvent, OnEvent, OnThrow, OnUpdate, OpenGesture};
pub use graph::{ActivationChange, DependencyEdge, DependencyGraph};
pub use registry::{CellType, CellTypeRegistry, DATE_TIME_FORMAT};
pub use schema::{DependencySpec, FieldDescriptor, FieldKind, FieldPath, FormSchema};
pub use undo::{UndoEntry, UndoStack};
pub use validation::{
    HostError, PendingValidation, Severity, ValidationMessage, ValidationPipeline,
    ValidationRequest, ValidationResult, ValidationTicket, ValidatorFn, ValidatorReply,
};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
