use std::fmt;

use serde_json::Value;

use super::events::FeedEvent;

/// Display string derived from exactly one feed event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayEntry(String);

impl DisplayEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DisplayEntry {
    fn from(s: &str) -> Self {
        DisplayEntry(s.to_string())
    }
}

impl From<String> for DisplayEntry {
    fn from(s: String) -> Self {
        DisplayEntry(s)
    }
}

impl PartialEq<&str> for DisplayEntry {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Turn a feed event into its display line. Total: every input yields a line.
///
/// Rules, first match wins:
/// 1. text is shown verbatim
/// 2. an object with a truthy `type` shows as `"<type>: <json(payload or whole value)>"`
/// 3. anything else shows as compact JSON
pub fn normalize(event: &FeedEvent) -> DisplayEntry {
    match event {
        FeedEvent::Raw(text) => DisplayEntry(text.clone()),
        FeedEvent::Json(value) => DisplayEntry(normalize_value(value)),
    }
}

fn normalize_value(value: &Value) -> String {
    if let Value::String(text) = value {
        return text.clone();
    }
    if let Some(kind) = value.get("type").and_then(type_label) {
        // A null payload counts as missing.
        let payload = match value.get("payload") {
            None | Some(Value::Null) => value,
            Some(payload) => payload,
        };
        return format!("{}: {}", kind, to_compact(payload));
    }
    to_compact(value)
}

/// Label for a `type` field, or `None` when the field is falsy.
fn type_label(kind: &Value) -> Option<String> {
    match kind {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(to_compact(kind)),
    }
}

fn to_compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::{json, Map};

    fn norm(value: Value) -> String {
        normalize(&FeedEvent::Json(value)).into_string()
    }

    #[test]
    fn test_plain_text_verbatim() {
        assert_eq!(normalize(&FeedEvent::Raw("hello".into())), "hello");
        assert_eq!(norm(json!("hello")), "hello");
    }

    #[test]
    fn test_type_with_payload() {
        assert_eq!(
            norm(json!({"type": "alert", "payload": {"level": "high"}})),
            r#"alert: {"level":"high"}"#
        );
    }

    #[test]
    fn test_type_without_payload_uses_whole_value() {
        assert_eq!(norm(json!({"type": "ping"})), r#"ping: {"type":"ping"}"#);
    }

    #[test]
    fn test_null_payload_uses_whole_value() {
        assert_eq!(
            norm(json!({"type": "ping", "payload": null})),
            r#"ping: {"type":"ping","payload":null}"#
        );
    }

    #[test]
    fn test_no_type_serializes_value() {
        assert_eq!(norm(json!({"foo": 1})), r#"{"foo":1}"#);
    }

    #[test]
    fn test_falsy_type_serializes_value() {
        assert_eq!(norm(json!({"type": ""})), r#"{"type":""}"#);
        assert_eq!(norm(json!({"type": 0})), r#"{"type":0}"#);
        assert_eq!(norm(json!({"type": false})), r#"{"type":false}"#);
        assert_eq!(norm(json!({"type": null})), r#"{"type":null}"#);
    }

    #[test]
    fn test_non_string_type_labels() {
        assert_eq!(norm(json!({"type": 3, "payload": "x"})), r#"3: "x""#);
        assert_eq!(norm(json!({"type": true, "payload": 1})), "true: 1");
        assert_eq!(norm(json!({"type": ["a"], "payload": 1})), r#"["a"]: 1"#);
    }

    #[test]
    fn test_primitives_and_arrays() {
        assert_eq!(norm(json!(42)), "42");
        assert_eq!(norm(json!(true)), "true");
        assert_eq!(norm(Value::Null), "null");
        assert_eq!(norm(json!([1, "two"])), r#"[1,"two"]"#);
    }

    #[test]
    fn test_keys_keep_frame_order() {
        let event = FeedEvent::decode(r#"{"type":"alert","payload":{"zeta":1,"alpha":2,"mid":3}}"#);
        assert_eq!(normalize(&event), r#"alert: {"zeta":1,"alpha":2,"mid":3}"#);

        let event = FeedEvent::decode(r#"{"b":1,"a":2}"#);
        assert_eq!(normalize(&event), r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn test_payload_string_is_json_quoted() {
        assert_eq!(
            norm(json!({"type": "message", "payload": "hi"})),
            r#"message: "hi""#
        );
    }

    fn random_string(rng: &mut StdRng) -> String {
        const ALPHABET: &[char] = &['a', 'Z', '{', '}', '"', ':', ',', '[', ']', ' ', '\\', 'é', '0', '\n'];
        let len = rng.gen_range(0..12);
        (0..len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())]).collect()
    }

    fn random_value(rng: &mut StdRng, depth: u32) -> Value {
        let pick = if depth == 0 { rng.gen_range(0..4) } else { rng.gen_range(0..7) };
        match pick {
            0 => Value::Null,
            1 => Value::Bool(rng.gen()),
            2 => json!(rng.gen_range(-1000i64..1000)),
            3 => Value::String(random_string(rng)),
            4 => Value::Array((0..rng.gen_range(0..4)).map(|_| random_value(rng, depth - 1)).collect()),
            5 => {
                let mut map = Map::new();
                for _ in 0..rng.gen_range(0..4) {
                    map.insert(random_string(rng), random_value(rng, depth - 1));
                }
                Value::Object(map)
            }
            _ => {
                let mut map = Map::new();
                map.insert("type".to_string(), random_value(rng, depth - 1));
                if rng.gen_bool(0.5) {
                    map.insert("payload".to_string(), random_value(rng, depth - 1));
                }
                Value::Object(map)
            }
        }
    }

    #[test]
    fn test_normalize_is_total_over_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0xBE11A);
        for _ in 0..2_000 {
            let value = random_value(&mut rng, 3);
            let line = norm(value.clone());
            if let Value::String(s) = &value {
                assert_eq!(&line, s);
            }

            let frame = random_string(&mut rng);
            let event = FeedEvent::decode(&frame);
            let entry = normalize(&event);
            if let FeedEvent::Raw(raw) = &event {
                assert_eq!(entry.as_str(), raw);
            }
        }
    }
}
