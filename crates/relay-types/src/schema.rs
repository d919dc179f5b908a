use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::ValidationError;
use crate::event::{CommitEvent, EventName};

/// A payload validator for one event kind. Implementations decide what
/// "conforms to schema[name]" means for their event; `name` is the event
/// kind being validated, so a mismatch can be reported as a fully-formed
/// [`ValidationError::SchemaMismatch`] rather than a bare string.
pub trait PayloadSchema: fmt::Debug + Send + Sync {
    fn validate(&self, name: &EventName, payload: &Value) -> Result<(), ValidationError>;
}

/// The JSON primitive kinds a [`JsonSchema`] can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Null => value.is_null(),
            JsonType::Bool => value.is_boolean(),
            JsonType::Number => value.is_number(),
            JsonType::String => value.is_string(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JsonType::Null => "null",
            JsonType::Bool => "bool",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        };
        f.write_str(s)
    }
}

/// A small, dependency-free JSON payload schema: a required primitive type,
/// plus (for objects) a list of required keys. Covers the common case
/// directly; application code with richer validation needs can implement
/// [`PayloadSchema`] itself instead.
#[derive(Debug, Clone)]
pub enum JsonSchema {
    /// Accepts any JSON value.
    Any,
    /// Requires the payload to be of the given JSON type.
    Type(JsonType),
    /// Requires the payload to be a JSON object containing at least the
    /// given keys (values of those keys are not further validated).
    Object { required: Vec<String> },
}

impl PayloadSchema for JsonSchema {
    fn validate(&self, name: &EventName, payload: &Value) -> Result<(), ValidationError> {
        let mismatch = |reason: String| ValidationError::SchemaMismatch {
            name: name.clone(),
            reason,
        };
        match self {
            JsonSchema::Any => Ok(()),
            JsonSchema::Type(expected) => {
                if expected.matches(payload) {
                    Ok(())
                } else {
                    Err(mismatch(format!("expected JSON {expected}, got {payload}")))
                }
            }
            JsonSchema::Object { required } => {
                let Some(obj) = payload.as_object() else {
                    return Err(mismatch(format!("expected a JSON object, got {payload}")));
                };
                let missing: Vec<&str> = required
                    .iter()
                    .map(String::as_str)
                    .filter(|key| !obj.contains_key(*key))
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(mismatch(format!("missing required field(s): {}", missing.join(", "))))
                }
            }
        }
    }
}

/// The immutable `events: Name -> PayloadSchema` mapping declared at
/// replica construction.
#[derive(Debug, Default)]
pub struct EventSchemas {
    schemas: HashMap<EventName, Box<dyn PayloadSchema>>,
}

impl EventSchemas {
    pub fn builder() -> EventSchemasBuilder {
        EventSchemasBuilder::default()
    }

    pub fn names(&self) -> impl Iterator<Item = &EventName> {
        self.schemas.keys()
    }

    pub fn contains(&self, name: &EventName) -> bool {
        self.schemas.contains_key(name)
    }

    /// Validates a submitted event against its declared schema. Fails with
    /// [`ValidationError::UnknownEventKind`] if `name` is not declared, or
    /// [`ValidationError::SchemaMismatch`] if the payload doesn't conform.
    pub fn validate(&self, event: &CommitEvent) -> Result<(), ValidationError> {
        let schema =
            self.schemas
                .get(&event.name)
                .ok_or_else(|| ValidationError::UnknownEventKind {
                    name: event.name.clone(),
                })?;
        schema.validate(&event.name, &event.payload)
    }
}

/// Builder for [`EventSchemas`]: accumulate event kinds and their schemas
/// incrementally, then validate the whole table at once in `build()`.
#[derive(Debug, Default)]
pub struct EventSchemasBuilder {
    schemas: HashMap<EventName, Box<dyn PayloadSchema>>,
}

impl EventSchemasBuilder {
    #[must_use]
    pub fn event(mut self, name: impl Into<EventName>, schema: impl PayloadSchema + 'static) -> Self {
        self.schemas.insert(name.into(), Box::new(schema));
        self
    }

    pub fn build(self) -> Result<EventSchemas, crate::error::ConfigError> {
        for name in self.schemas.keys() {
            if name.is_empty() {
                return Err(crate::error::ConfigError::EmptyEventName);
            }
        }
        Ok(EventSchemas {
            schemas: self.schemas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(JsonType::Null, json!(null) => true; "null accepts null")]
    #[test_case(JsonType::Null, json!(0) => false; "null rejects number")]
    #[test_case(JsonType::Bool, json!(true) => true; "bool accepts bool")]
    #[test_case(JsonType::Bool, json!(1) => false; "bool rejects number")]
    #[test_case(JsonType::Number, json!(5) => true; "number accepts number")]
    #[test_case(JsonType::Number, json!("5") => false; "number rejects string")]
    #[test_case(JsonType::String, json!("x") => true; "string accepts string")]
    #[test_case(JsonType::String, json!(5) => false; "string rejects number")]
    #[test_case(JsonType::Array, json!([1, 2]) => true; "array accepts array")]
    #[test_case(JsonType::Array, json!({"a": 1}) => false; "array rejects object")]
    #[test_case(JsonType::Object, json!({"a": 1}) => true; "object accepts object")]
    #[test_case(JsonType::Object, json!([1]) => false; "object rejects array")]
    fn json_type_schema_matches_expected_shape(kind: JsonType, payload: Value) -> bool {
        JsonSchema::Type(kind).validate(&EventName::new("op"), &payload).is_ok()
    }

    #[test]
    fn unknown_event_kind_is_rejected() {
        let schemas = EventSchemas::builder()
            .event("increment", JsonSchema::Type(JsonType::Number))
            .build()
            .unwrap();
        let event = CommitEvent::new("decrement", json!(5));
        assert!(matches!(
            schemas.validate(&event),
            Err(ValidationError::UnknownEventKind { .. })
        ));
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let schemas = EventSchemas::builder()
            .event("increment", JsonSchema::Type(JsonType::Number))
            .build()
            .unwrap();
        let event = CommitEvent::new("increment", json!("not a number"));
        assert!(matches!(
            schemas.validate(&event),
            Err(ValidationError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn conforming_payload_is_accepted() {
        let schemas = EventSchemas::builder()
            .event("increment", JsonSchema::Type(JsonType::Number))
            .build()
            .unwrap();
        let event = CommitEvent::new("increment", json!(5));
        assert!(schemas.validate(&event).is_ok());
    }

    #[test]
    fn object_schema_checks_required_fields() {
        let schemas = EventSchemas::builder()
            .event(
                "transfer",
                JsonSchema::Object {
                    required: vec!["to".to_string(), "amount".to_string()],
                },
            )
            .build()
            .unwrap();
        let missing = CommitEvent::new("transfer", json!({"to": "alice"}));
        assert!(matches!(
            schemas.validate(&missing),
            Err(ValidationError::SchemaMismatch { .. })
        ));
        let complete = CommitEvent::new("transfer", json!({"to": "alice", "amount": 5}));
        assert!(schemas.validate(&complete).is_ok());
    }

    #[test]
    fn empty_event_name_is_rejected_at_build() {
        let err = EventSchemas::builder()
            .event("", JsonSchema::Any)
            .build()
            .unwrap_err();
        assert_eq!(err, crate::error::ConfigError::EmptyEventName);
    }

    proptest! {
        /// Spec §8 property 5: an event whose `name` is not a declared key,
        /// or whose payload does not conform to `schema[name]`, is rejected
        /// by `validate` — and only one of those two reasons ever fires,
        /// never both, never neither, for any declared-or-not name paired
        /// with any JSON value.
        #[test]
        fn unknown_name_or_mismatched_payload_always_rejects(
            declared_name in "[a-z]{1,8}",
            other_name in "[a-z]{1,8}",
            payload in proptest::collection::vec(0i64..1000, 0..4),
        ) {
            prop_assume!(declared_name != other_name);

            let schemas = EventSchemas::builder()
                .event(declared_name.clone(), JsonSchema::Type(JsonType::Number))
                .build()
                .unwrap();

            // `other_name` was never declared: always rejected, regardless
            // of payload shape.
            let foreign = CommitEvent::new(other_name, json!(payload));
            prop_assert!(matches!(
                schemas.validate(&foreign),
                Err(ValidationError::UnknownEventKind { .. })
            ));

            // The declared name requires a JSON number; an array payload
            // never conforms.
            let mismatched = CommitEvent::new(declared_name.clone(), json!(payload));
            prop_assert!(matches!(
                schemas.validate(&mismatched),
                Err(ValidationError::SchemaMismatch { .. })
            ));

            // The declared name with a conforming number payload passes.
            let conforming = CommitEvent::new(declared_name, json!(payload.len() as i64));
            prop_assert!(schemas.validate(&conforming).is_ok());
        }
    }
}
