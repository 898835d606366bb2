//! Dotted-path lookups (`db.replicas.0.host`).

use serde_json::Value;

pub const SEPARATOR: char = '.';

/// Descend through `segments`, by key into mappings and by index into sequences.
///
/// Returns `None` on a missing key, an out-of-range or non-numeric index, or
/// a scalar in the middle of the path.
pub fn dig<'a, 'p>(value: &'a Value, segments: impl IntoIterator<Item = &'p str>) -> Option<&'a Value> {
    segments.into_iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Split a dotted path into the entry name and the remaining segments.
pub fn split(path: &str) -> Option<(&str, impl Iterator<Item = &str>)> {
    let mut segments = path.split(SEPARATOR);
    let name = segments.next().filter(|name| !name.is_empty())?;
    Some((name, segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dig_mapping_and_sequence() {
        let value = json!({"replicas": [{"host": "a"}, {"host": "b"}], "port": 5432});
        assert_eq!(dig(&value, ["replicas", "1", "host"]), Some(&json!("b")));
        assert_eq!(dig(&value, ["port"]), Some(&json!(5432)));
        assert_eq!(dig(&value, std::iter::empty()), Some(&value));
    }

    #[test]
    fn test_dig_stops_on_mismatch() {
        let value = json!({"replicas": [{"host": "a"}], "port": 5432});
        assert_eq!(dig(&value, ["missing", "x"]), None);
        assert_eq!(dig(&value, ["replicas", "first"]), None);
        assert_eq!(dig(&value, ["replicas", "9"]), None);
        assert_eq!(dig(&value, ["port", "x"]), None);
    }

    #[test]
    fn test_split() {
        let (name, rest) = split("db.host.name").unwrap();
        assert_eq!(name, "db");
        assert_eq!(rest.collect::<Vec<_>>(), vec!["host", "name"]);
        assert!(split("").is_none());
        assert!(split(".host").is_none());
    }
}
