//! Schema normalization.
//!
//! Raw schemas arrive as untyped `serde_json::Value` trees: an object keyed
//! by field name whose nodes optionally declare `type`, `default`,
//! `required`, `enum`, `enumLabels`, `pattern`, `format`, `uniqueItems`,
//! `ignore`, and `dependencies`. Normalization turns each node into a
//! canonical [`FieldDescriptor`] and collects authoring problems as
//! non-fatal warnings rather than failing the bind.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::condition::Condition;

/// Ordered key sequence addressing one field, supporting nesting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Build a path from its segments.
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a dot-separated path such as `"subject.weight"`.
    #[must_use]
    pub fn from_dotted(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    /// Append a key, producing a child path.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    /// The final key of the path (the field's own name).
    #[must_use]
    pub fn key(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// The enclosing path, or `None` for top-level fields.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Resolve a sibling field by name (same parent, different key).
    #[must_use]
    pub fn sibling(&self, name: &str) -> Self {
        self.parent()
            .map_or_else(|| Self(vec![name.to_string()]), |p| p.child(name))
    }

    /// The path's segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::from_dotted(path)
    }
}

/// Declared value shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// Free text (also the fail-closed fallback for unknown types).
    #[default]
    String,
    /// Floating point number.
    Number,
    /// Whole number.
    Integer,
    /// True/false flag.
    Boolean,
    /// Ordered sequence.
    Array,
    /// Free-form nested object (no declared properties).
    Object,
}

impl FieldKind {
    /// Parse the schema `type` keyword.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// Whether committed values pass through coercion structurally intact.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

/// One dependency edge's behavior, as authored in the schema.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// When the dependent is active given the controller value.
    pub condition: Condition,
    /// Value forced onto the dependent while inactive.
    pub fallback: Value,
    /// Requiredness applied while active (`None` leaves it untouched).
    pub required_when_active: Option<bool>,
    /// Name of the visibility flag set while inactive.
    pub attribute: String,
}

impl Default for DependencySpec {
    fn default() -> Self {
        Self {
            condition: Condition::Truthy,
            fallback: Value::Null,
            required_when_active: None,
            attribute: "hidden".to_string(),
        }
    }
}

impl DependencySpec {
    fn from_schema(raw: &Value, warnings: &mut Vec<String>) -> Self {
        let mut spec = Self::default();
        let Some(map) = raw.as_object() else {
            warnings.push(format!("dependency spec is not an object: {raw}"));
            return spec;
        };
        if let Some(condition) = map.get("condition") {
            spec.condition = Condition::from_schema(condition, warnings);
        }
        if let Some(fallback) = map.get("default") {
            spec.fallback = fallback.clone();
        }
        if let Some(required) = map.get("required") {
            spec.required_when_active = required.as_bool();
        }
        if let Some(attribute) = map.get("attribute").and_then(Value::as_str) {
            spec.attribute = attribute.to_string();
        }
        spec
    }
}

/// Canonical description of one editable field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Unique path of the field within the form.
    pub path: FieldPath,
    /// Declared value shape.
    pub kind: FieldKind,
    /// Default value (`Null` when none is declared).
    pub default: Value,
    /// Whether the field must hold a value for `validate()` to pass.
    pub required: bool,
    /// Enumerated choices, when the field is a dropdown.
    pub enum_values: Option<Vec<Value>>,
    /// Display labels for enumerated choices, keyed by choice.
    pub enum_labels: HashMap<String, String>,
    /// Declared regular expression the committed value must match.
    pub pattern: Option<String>,
    /// Format refinement of the type, e.g. `date-time`.
    pub format: Option<String>,
    /// Whether array commits drop duplicate entries.
    pub unique_items: bool,
    /// Suppress rendering and validation while keeping the default.
    pub ignore: bool,
    /// Controller name → dependency behavior, in declaration order.
    pub dependencies: Vec<(String, DependencySpec)>,
}

impl FieldDescriptor {
    /// Normalize one raw schema node into a descriptor.
    ///
    /// Authoring problems (unknown `type`, malformed `dependencies`) degrade
    /// to safe defaults and push a warning; they never fail the bind.
    pub fn normalize(path: FieldPath, node: &Value, warnings: &mut Vec<String>) -> Self {
        let map = node.as_object();

        let kind = match map.and_then(|m| m.get("type")) {
            None => FieldKind::String,
            Some(raw) => raw
                .as_str()
                .and_then(FieldKind::parse)
                .unwrap_or_else(|| {
                    warnings.push(format!("{path}: unknown type {raw}, treating as string"));
                    FieldKind::String
                }),
        };

        let field = |key: &str| map.and_then(|m| m.get(key));

        let enum_values = field("enum").and_then(Value::as_array).cloned();
        let enum_labels = field("enumLabels")
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let dependencies = field("dependencies")
            .map(|deps| Self::normalize_dependencies(&path, deps, warnings))
            .unwrap_or_default();

        Self {
            kind,
            default: field("default").cloned().unwrap_or(Value::Null),
            required: field("required").and_then(Value::as_bool).unwrap_or(false),
            enum_values,
            enum_labels,
            pattern: field("pattern").and_then(Value::as_str).map(str::to_string),
            format: field("format").and_then(Value::as_str).map(str::to_string),
            unique_items: field("uniqueItems").and_then(Value::as_bool).unwrap_or(false),
            ignore: field("ignore").and_then(Value::as_bool).unwrap_or(false),
            dependencies,
            path,
        }
    }

    /// Parse the two wire forms of `dependencies`: an ordered list of
    /// controller names (condition = truthy) or a map of controller name to
    /// dependency spec.
    fn normalize_dependencies(
        path: &FieldPath,
        raw: &Value,
        warnings: &mut Vec<String>,
    ) -> Vec<(String, DependencySpec)> {
        match raw {
            Value::Array(names) => names
                .iter()
                .filter_map(|name| match name.as_str() {
                    Some(name) => Some((name.to_string(), DependencySpec::default())),
                    None => {
                        warnings.push(format!("{path}: dependency name is not a string: {name}"));
                        None
                    }
                })
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(name, spec)| (name.clone(), DependencySpec::from_schema(spec, warnings)))
                .collect(),
            other => {
                warnings.push(format!("{path}: malformed dependencies: {other}"));
                Vec::new()
            }
        }
    }
}

/// A normalized form schema: ordered descriptors plus authoring warnings.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    /// Field descriptors in render order.
    pub descriptors: Vec<FieldDescriptor>,
    /// Non-fatal authoring problems found during normalization.
    pub warnings: Vec<String>,
}

impl FormSchema {
    /// Normalize a whole raw schema.
    ///
    /// The root is an object keyed by field name, either directly or under a
    /// `properties` key. An optional `order` array reorders the fields named
    /// in it; unnamed fields keep their declaration order afterwards. Nested
    /// objects with their own `properties` recurse into nested paths.
    ///
    /// # Errors
    ///
    /// Returns the offending value's description if the root is not a JSON
    /// object; every node-level problem degrades to a warning instead.
    pub fn normalize(root: &Value) -> Result<Self, String> {
        let Some(object) = root.as_object() else {
            return Err(format!("schema root must be an object, got {root}"));
        };
        let properties = object
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(object);

        let mut schema = Self::default();
        Self::walk(&mut schema, None, properties, object.get("order"));
        for warning in &schema.warnings {
            tracing::warn!("schema authoring: {warning}");
        }
        Ok(schema)
    }

    fn walk(
        schema: &mut Self,
        parent: Option<&FieldPath>,
        properties: &serde_json::Map<String, Value>,
        order: Option<&Value>,
    ) {
        let mut names: Vec<&String> = properties.keys().collect();
        if let Some(order) = order.and_then(Value::as_array) {
            let explicit: Vec<&str> = order.iter().filter_map(Value::as_str).collect();
            names.sort_by_key(|name| {
                explicit
                    .iter()
                    .position(|o| *o == name.as_str())
                    .unwrap_or(usize::MAX)
            });
        }

        for name in names {
            // Schema keywords living beside inline property maps.
            if matches!(name.as_str(), "type" | "order" | "required" | "additionalProperties") {
                continue;
            }
            let node = &properties[name];
            let path = parent.map_or_else(|| FieldPath::from_dotted(name), |p| p.child(name));

            let nested = node.get("properties").and_then(Value::as_object);
            if let Some(nested) = nested {
                Self::walk(schema, Some(&path), nested, node.get("order"));
            } else {
                schema
                    .descriptors
                    .push(FieldDescriptor::normalize(path, node, &mut schema.warnings));
            }
        }
    }

    /// Look up a descriptor by path.
    #[must_use]
    pub fn descriptor(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| &d.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_display_and_parents() {
        let path = FieldPath::from_dotted("subject.weight");
        assert_eq!(path.to_string(), "subject.weight");
        assert_eq!(path.key(), "weight");
        assert_eq!(path.parent(), Some(FieldPath::from_dotted("subject")));
        assert_eq!(path.sibling("species"), FieldPath::from_dotted("subject.species"));
        assert_eq!(FieldPath::from_dotted("top").parent(), None);
    }

    #[test]
    fn test_normalize_basic_fields() {
        let schema = FormSchema::normalize(&json!({
            "name": { "type": "string", "required": true, "pattern": "^[a-z]+$" },
            "age": { "type": "integer", "default": 0 },
        }))
        .expect("normalize");

        assert_eq!(schema.descriptors.len(), 2);
        let name = schema.descriptor(&"name".into()).expect("name");
        assert_eq!(name.kind, FieldKind::String);
        assert!(name.required);
        assert_eq!(name.pattern.as_deref(), Some("^[a-z]+$"));
        let age = schema.descriptor(&"age".into()).expect("age");
        assert_eq!(age.kind, FieldKind::Integer);
        assert_eq!(age.default, json!(0));
    }

    #[test]
    fn test_unknown_type_degrades_to_string() {
        let schema = FormSchema::normalize(&json!({
            "weird": { "type": "blob" },
        }))
        .expect("normalize");
        assert_eq!(schema.descriptors[0].kind, FieldKind::String);
        assert_eq!(schema.warnings.len(), 1);
    }

    #[test]
    fn test_dependencies_list_form() {
        let schema = FormSchema::normalize(&json!({
            "locate_data": { "type": "boolean", "dependencies": ["multiple_sessions"] },
        }))
        .expect("normalize");
        let deps = &schema.descriptors[0].dependencies;
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].0, "multiple_sessions");
        assert!(matches!(deps[0].1.condition, Condition::Truthy));
    }

    #[test]
    fn test_dependencies_map_form() {
        let schema = FormSchema::normalize(&json!({
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
        }))
        .expect("normalize");
        let (name, spec) = &schema.descriptors[0].dependencies[0];
        assert_eq!(name, "multiple_sessions");
        assert!(matches!(spec.condition, Condition::AnyOf(_)));
        assert_eq!(spec.fallback, json!(""));
        assert_eq!(spec.required_when_active, Some(true));
        assert_eq!(spec.attribute, "hidden");
    }

    #[test]
    fn test_order_key_reorders_fields() {
        let schema = FormSchema::normalize(&json!({
            "type": "object",
            "properties": {
                "b": { "type": "string" },
                "a": { "type": "string" },
            },
            "order": ["a", "b"],
        }))
        .expect("normalize");
        let names: Vec<_> = schema.descriptors.iter().map(|d| d.path.key().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_nested_properties_build_nested_paths() {
        let schema = FormSchema::normalize(&json!({
            "subject": {
                "type": "object",
                "properties": {
                    "species": { "type": "string" },
                },
            },
        }))
        .expect("normalize");
        assert_eq!(schema.descriptors.len(), 1);
        assert_eq!(schema.descriptors[0].path, FieldPath::from_dotted("subject.species"));
    }

    #[test]
    fn test_enum_labels() {
        let schema = FormSchema::normalize(&json!({
            "timezone": {
                "type": "string",
                "enum": ["UTC", "America/New_York"],
                "enumLabels": { "America/New_York": "America/New_York (-05:00)" },
            },
        }))
        .expect("normalize");
        let tz = &schema.descriptors[0];
        assert_eq!(tz.enum_values.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            tz.enum_labels.get("America/New_York").map(String::as_str),
            Some("America/New_York (-05:00)")
        );
    }

    #[test]
    fn test_non_object_root_fails() {
        assert!(FormSchema::normalize(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_malformed_dependencies_warn_and_clear() {
        let schema = FormSchema::normalize(&json!({
            "field": { "type": "string", "dependencies": 42 },
        }))
        .expect("normalize");
        assert!(schema.descriptors[0].dependencies.is_empty());
        assert_eq!(schema.warnings.len(), 1);
    }
}
