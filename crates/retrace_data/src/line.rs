use crate::lenient;
use crate::snapshot::EntitySnapshot;
use crate::Viewport;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// First line of every log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, deserialize_with = "lenient::number")]
    pub t: u64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub width: u32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub height: u32,
}

impl Header {
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

/// A key that went down during the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(default, deserialize_with = "lenient::number")]
    pub t: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub key: u32,
}

/// Sampled state of every tracked entity at `t`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyframe {
    #[serde(default, deserialize_with = "lenient::number")]
    pub t: u64,
    #[serde(default, deserialize_with = "lenient::snapshots")]
    pub objects: Vec<EntitySnapshot>,
}

/// One record of a `.jsonl` session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogLine {
    Header(Header),
    Input(InputEvent),
    Keyframe(Keyframe),
}

impl LogLine {
    /// Serialises to a single line without the terminator.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes one line.
    ///
    /// Returns `Ok(None)` for well-formed records of a kind this version does
    /// not know, so newer logs stay readable. Errors are reserved for text that
    /// is not a JSON object at all.
    pub fn decode(line: &str) -> Result<Option<LogLine>, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_owned(),
            None => return Ok(None),
        };
        let decoded = match kind.as_str() {
            "header" => LogLine::Header(serde_json::from_value(value)?),
            "input" => LogLine::Input(serde_json::from_value(value)?),
            "keyframe" => LogLine::Keyframe(serde_json::from_value(value)?),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec2;

    #[test]
    fn test_header_shape() {
        let line = LogLine::Header(Header {
            t: 0,
            version: "v1".into(),
            width: 1600,
            height: 900,
        });
        assert_eq!(
            line.encode().unwrap(),
            r#"{"type":"header","t":0,"version":"v1","width":1600,"height":900}"#
        );
    }

    #[test]
    fn test_input_and_keyframe_shape() {
        let input = LogLine::Input(InputEvent { t: 120, key: 32 });
        assert_eq!(input.encode().unwrap(), r#"{"type":"input","t":120,"key":32}"#);

        let frame = LogLine::Keyframe(Keyframe {
            t: 600,
            objects: vec![EntitySnapshot::new("Player", Vec2::new(10.0, 20.5))],
        });
        assert_eq!(
            frame.encode().unwrap(),
            r#"{"type":"keyframe","t":600,"objects":[{"name":"Player","x":10.0,"y":20.5}]}"#
        );
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        assert_eq!(LogLine::decode(r#"{"type":"marker","t":5}"#).unwrap(), None);
        assert_eq!(LogLine::decode(r#"{"t":5}"#).unwrap(), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(LogLine::decode("not json").is_err());
        assert!(LogLine::decode(r#"{"type":"keyframe","t":1,"objects":["#).is_err());
    }

    #[test]
    fn test_field_order_is_irrelevant() {
        let line = LogLine::decode(r#"{"height":600,"width":800,"version":"v1","t":0,"type":"header"}"#)
            .unwrap()
            .unwrap();
        match line {
            LogLine::Header(h) => assert_eq!(h.viewport(), Viewport::new(800, 600)),
            other => panic!("unexpected line {other:?}"),
        }
    }

    #[test]
    fn test_keyframe_with_bad_objects_field() {
        let line = LogLine::decode(r#"{"type":"keyframe","t":"x","objects":{"a":1}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(line, LogLine::Keyframe(Keyframe::default()));
    }
}
