//! Dependency graph between controller and dependent fields.
//!
//! The graph is a fixed, author-declared adjacency structure built once per
//! schema bind: controller path → ordered list of dependency edges. It is
//! rebuilt only when the schema identity changes. `propagate` is a pure
//! planning step; applying activation changes to cells is the form
//! controller's job.

use std::collections::HashMap;

use serde_json::Value;

use crate::condition::Condition;
use crate::schema::{DependencySpec, FieldDescriptor, FieldPath};

/// One adjacency entry: a dependent reacting to a controller.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    /// Path of the dependent field.
    pub dependent: FieldPath,
    /// Authored behavior for this edge.
    pub spec: DependencySpec,
}

/// Planned activation transition for one dependent field.
#[derive(Debug, Clone)]
pub struct ActivationChange {
    /// Path of the dependent field.
    pub dependent: FieldPath,
    /// New activation state.
    pub active: bool,
    /// The edge spec that drives the transition (fallback value, visibility
    /// attribute, requiredness while active).
    pub spec: DependencySpec,
}

/// Controller → ordered dependents adjacency, plus recorded activation for
/// idempotent propagation.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list keyed by controller path.
    edges: HashMap<FieldPath, Vec<DependencyEdge>>,
    /// Reverse view: dependent path → its controller edges in declaration
    /// order. Activation is the AND over these.
    controllers: HashMap<FieldPath, Vec<(FieldPath, DependencySpec)>>,
    /// Last activation applied per dependent. Absent until first propagation.
    recorded: HashMap<FieldPath, bool>,
    /// Controller paths in first-seen declaration order.
    controller_order: Vec<FieldPath>,
}

impl DependencyGraph {
    /// Build the adjacency from normalized descriptors.
    ///
    /// A dependency naming a controller with no descriptor is dropped with a
    /// warning; the dependent then degrades toward always-active.
    pub fn build(descriptors: &[FieldDescriptor], warnings: &mut Vec<String>) -> Self {
        let mut graph = Self::default();

        for descriptor in descriptors {
            for (controller_name, spec) in &descriptor.dependencies {
                let controller = descriptor.path.sibling(controller_name);
                if descriptors.iter().all(|d| d.path != controller) {
                    warnings.push(format!(
                        "{}: dependency on unknown controller {controller_name}; treating as always active",
                        descriptor.path
                    ));
                    continue;
                }

                if !graph.edges.contains_key(&controller) {
                    graph.controller_order.push(controller.clone());
                }
                graph
                    .edges
                    .entry(controller.clone())
                    .or_default()
                    .push(DependencyEdge {
                        dependent: descriptor.path.clone(),
                        spec: spec.clone(),
                    });
                graph
                    .controllers
                    .entry(descriptor.path.clone())
                    .or_default()
                    .push((controller, spec.clone()));
            }
        }

        graph
    }

    /// Ordered dependents of one controller.
    #[must_use]
    pub fn dependents_of(&self, controller: &FieldPath) -> &[DependencyEdge] {
        self.edges.get(controller).map_or(&[], Vec::as_slice)
    }

    /// All controller paths, in declaration order.
    #[must_use]
    pub fn controllers(&self) -> &[FieldPath] {
        &self.controller_order
    }

    /// Whether a dependent is currently recorded as active.
    ///
    /// Fields without dependencies (or whose activation has never been
    /// computed) report active.
    #[must_use]
    pub fn is_active(&self, path: &FieldPath) -> bool {
        self.recorded.get(path).copied().unwrap_or(true)
    }

    /// Compute activation for one dependent: logical AND across all of its
    /// controller edges, each evaluated against its own controller value.
    fn compute(&self, dependent: &FieldPath, values: &dyn Fn(&FieldPath) -> Option<Value>) -> bool {
        let Some(edges) = self.controllers.get(dependent) else {
            return true;
        };
        edges.iter().all(|(controller, spec)| {
            let value = values(controller);
            spec.condition.evaluate(value.as_ref())
        })
    }

    /// Replace the condition on the `controller → dependent` edge.
    ///
    /// Hosts use this to install custom predicates after bind. Returns
    /// whether the edge exists; the caller re-propagates afterwards.
    pub fn set_condition(
        &mut self,
        controller: &FieldPath,
        dependent: &FieldPath,
        condition: Condition,
    ) -> bool {
        let mut found = false;
        if let Some(edges) = self.edges.get_mut(controller) {
            for edge in edges.iter_mut().filter(|e| &e.dependent == dependent) {
                edge.spec.condition = condition.clone();
                found = true;
            }
        }
        if let Some(list) = self.controllers.get_mut(dependent) {
            for (_, spec) in list.iter_mut().filter(|(c, _)| c == controller) {
                spec.condition = condition.clone();
            }
        }
        found
    }

    /// Plan activation changes for the dependents of `controller`.
    ///
    /// Idempotent: a dependent whose computed activation matches the
    /// recorded one produces no entry, so repeated calls with unchanged
    /// inputs yield no duplicate change notifications. The entry carries the
    /// spec of the triggering edge.
    pub fn propagate(
        &mut self,
        controller: &FieldPath,
        values: &dyn Fn(&FieldPath) -> Option<Value>,
    ) -> Vec<ActivationChange> {
        let Some(edges) = self.edges.get(controller) else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        for edge in edges.clone() {
            let active = self.compute(&edge.dependent, values);
            if self.recorded.get(&edge.dependent) == Some(&active) {
                continue;
            }
            tracing::debug!(
                dependent = %edge.dependent,
                active,
                "dependency propagation"
            );
            self.recorded.insert(edge.dependent.clone(), active);
            changes.push(ActivationChange {
                dependent: edge.dependent,
                active,
                spec: edge.spec,
            });
        }
        changes
    }
}
