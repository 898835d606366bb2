//! Section merging for parsed sources.

use serde_json::{Map, Value};

/// Section every environment inherits from.
pub const DEFAULT_SECTION: &str = "default";

/// Collapse a parsed source into the value for `environment`.
///
/// Keys of the environment section replace keys of the `default` section;
/// nested mappings are replaced whole, not merged. Sections of other
/// environments never leak through: a document with neither section, or one
/// that is not a mapping at all, yields an empty mapping.
pub fn merge_sections(document: Value, environment: &str) -> Value {
    let Value::Object(mut sections) = document else {
        return Value::Object(Map::new());
    };

    let defaults = sections.remove(DEFAULT_SECTION);
    let overrides = sections.remove(environment);

    match (defaults, overrides) {
        (Some(Value::Object(mut base)), Some(Value::Object(env))) => {
            base.extend(env);
            Value::Object(base)
        }
        (_, Some(env)) => env,
        (Some(base), None) => base,
        (None, None) => Value::Object(Map::new()),
    }
}
