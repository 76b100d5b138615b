use std::fmt;

use dashboard_result::{create_error, Result};
use serde::Serialize;
use serde_json::Value;

/// Stable identity of a logical operation, used to detect duplicate
/// in-flight calls.
///
/// Built from an endpoint name and its parameters. Objects are written with
/// their keys in lexicographic order so structurally equal parameters always
/// produce byte-identical keys. Optional parameters must be defaulted by the
/// caller beforehand, the key does not guess defaults.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct OperationKey(String);

impl OperationKey {
    /// Derive a key from an endpoint name and its normalised parameters
    pub fn build<P: Serialize + ?Sized>(endpoint: &str, params: &P) -> Result<OperationKey> {
        let value = serde_json::to_value(params).map_err(|error| {
            create_error!(ProgrammerError {
                error: format!("parameters for `{endpoint}` are not serializable: {error}"),
            })
        })?;

        let mut key = String::with_capacity(endpoint.len() + 32);
        key.push_str(endpoint);
        key.push(':');
        write_canonical(&value, &mut key);

        Ok(OperationKey(key))
    }

    /// Derive a key from plain string pairs
    pub fn from_parts(endpoint: &str, parts: &[(&str, &str)]) -> OperationKey {
        let mut parts = parts.to_vec();
        parts.sort_unstable();

        let value = Value::Object(
            parts
                .into_iter()
                .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
                .collect(),
        );

        let mut key = format!("{endpoint}:");
        write_canonical(&value, &mut key);
        OperationKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }

                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }

                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OperationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use dashboard_result::ErrorType;
    use serde::Serialize;
    use serde_json::json;

    use super::OperationKey;

    #[test]
    fn insertion_order_does_not_matter() {
        let a = json!({ "page": 3, "size": 20, "filters": { "level": "warn", "user": "alice" } });

        let mut filters = serde_json::Map::new();
        filters.insert("user".into(), json!("alice"));
        filters.insert("level".into(), json!("warn"));

        let mut b = serde_json::Map::new();
        b.insert("size".into(), json!(20));
        b.insert("filters".into(), filters.into());
        b.insert("page".into(), json!(3));

        assert_eq!(
            OperationKey::build("logs", &a).unwrap(),
            OperationKey::build("logs", &b).unwrap()
        );
    }

    #[test]
    fn hash_map_and_struct_agree() {
        #[derive(Serialize)]
        struct Params {
            size: u32,
            page: u32,
        }

        let mut map = HashMap::new();
        map.insert("page", 1);
        map.insert("size", 10);

        let from_struct = OperationKey::build("logs", &Params { size: 10, page: 1 }).unwrap();
        let from_map = OperationKey::build("logs", &map).unwrap();

        assert_eq!(from_struct, from_map);
        assert_eq!(from_struct.as_str(), r#"logs:{"page":1,"size":10}"#);
    }

    #[test]
    fn endpoint_and_values_distinguish_keys() {
        let params = json!({ "page": 1 });

        assert_ne!(
            OperationKey::build("logs", &params).unwrap(),
            OperationKey::build("users", &params).unwrap()
        );
        assert_ne!(
            OperationKey::build("logs", &params).unwrap(),
            OperationKey::build("logs", &json!({ "page": 2 })).unwrap()
        );
        assert_ne!(
            OperationKey::build("logs", &json!({ "page": "1" })).unwrap(),
            OperationKey::build("logs", &params).unwrap()
        );
    }

    #[test]
    fn from_parts_matches_build() {
        let mut map = BTreeMap::new();
        map.insert("url", "https://youtu.be/dQw4w9WgXcQ");

        assert_eq!(
            OperationKey::from_parts("embed", &[("url", "https://youtu.be/dQw4w9WgXcQ")]),
            OperationKey::build("embed", &map).unwrap()
        );
    }

    #[test]
    fn non_serializable_input_is_a_programmer_error() {
        let mut map = HashMap::new();
        map.insert((1u8, 2u8), 3u8);

        let error = OperationKey::build("logs", &map).unwrap_err();
        assert!(matches!(error.error_type, ErrorType::ProgrammerError { .. }));
    }
}
