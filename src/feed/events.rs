use serde_json::Value;

/// One inbound frame from the backend event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The frame parsed as JSON.
    Json(Value),
    /// The frame was not JSON; kept as opaque text.
    Raw(String),
}

impl FeedEvent {
    /// Parse a text frame, falling back to the raw text when it is not JSON.
    pub fn decode(frame: &str) -> Self {
        match serde_json::from_str::<Value>(frame) {
            Ok(value) => FeedEvent::Json(value),
            Err(_) => FeedEvent::Raw(frame.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let ev = FeedEvent::decode(r#"{"type":"message","payload":{"user":"kai"}}"#);
        assert_eq!(ev, FeedEvent::Json(json!({"type": "message", "payload": {"user": "kai"}})));
    }

    #[test]
    fn test_decode_json_string_unwraps_quotes() {
        assert_eq!(FeedEvent::decode(r#""hello""#), FeedEvent::Json(json!("hello")));
    }

    #[test]
    fn test_decode_malformed_falls_back_to_raw() {
        assert_eq!(FeedEvent::decode("{not json"), FeedEvent::Raw("{not json".to_string()));
        assert_eq!(FeedEvent::decode(""), FeedEvent::Raw(String::new()));
        assert_eq!(FeedEvent::decode("hello"), FeedEvent::Raw("hello".to_string()));
    }

    #[test]
    fn test_decode_primitives() {
        assert_eq!(FeedEvent::decode("42"), FeedEvent::Json(json!(42)));
        assert_eq!(FeedEvent::decode(" null "), FeedEvent::Json(Value::Null));
    }
}
