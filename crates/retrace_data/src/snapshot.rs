use crate::geometry::Vec2;
use crate::lenient;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

/// Shape used to draw an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RenderKind {
    #[default]
    Rectangle,
    Circle,
    Line,
    Text,
    Image,
}

impl RenderKind {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RECTANGLE" => Some(Self::Rectangle),
            "CIRCLE" => Some(Self::Circle),
            "LINE" => Some(Self::Line),
            "TEXT" => Some(Self::Text),
            "IMAGE" => Some(Self::Image),
            _ => None,
        }
    }
}

/// RGBA color with channels in `[0, 1]`, stored on the wire as `[r,g,b,a]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f32; 4]")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(4)?;
        tup.serialize_element(&self.r)?;
        tup.serialize_element(&self.g)?;
        tup.serialize_element(&self.b)?;
        tup.serialize_element(&self.a)?;
        tup.end()
    }
}

/// Render hints for an entity name, written once per session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Appearance {
    pub kind: RenderKind,
    pub width: f32,
    pub height: f32,
    pub color: Option<Rgba>,
    pub image: Option<String>,
}

impl Appearance {
    #[must_use]
    pub fn new(kind: RenderKind, width: f32, height: f32, color: Rgba) -> Self {
        Self {
            kind,
            width,
            height,
            color: Some(color),
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// One entity inside a keyframe.
///
/// `name` is a group label shared by every entity of the same sort. The
/// appearance fields (`rt`, `w`, `h`, `color`, `img`) are only present on the
/// first snapshot of a name in a log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub y: f32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::render_kind"
    )]
    pub rt: Option<RenderKind>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_number"
    )]
    pub w: Option<f32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_number"
    )]
    pub h: Option<f32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::color"
    )]
    pub color: Option<Rgba>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_string"
    )]
    pub img: Option<String>,
    /// Stable per-entity ordinal; absent unless the recorder opted in.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_id"
    )]
    pub id: Option<u64>,
}

impl EntitySnapshot {
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self {
            name: name.into(),
            x: position.x,
            y: position.y,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_appearance(mut self, appearance: &Appearance) -> Self {
        self.rt = Some(appearance.kind);
        self.w = Some(appearance.width);
        self.h = Some(appearance.height);
        self.color = appearance.color;
        self.img = appearance.image.clone().filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[must_use]
    pub fn has_appearance(&self) -> bool {
        self.rt.is_some()
    }

    /// Appearance carried by this snapshot; missing size fields read as zero.
    #[must_use]
    pub fn appearance(&self) -> Option<Appearance> {
        let kind = self.rt?;
        Some(Appearance {
            kind,
            width: self.w.unwrap_or(0.0),
            height: self.h.unwrap_or(0.0),
            color: self.color,
            image: self.img.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_snapshot_omits_appearance_fields() {
        let snap = EntitySnapshot::new("Enemy", Vec2::new(1.5, 2.0));
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(json, r#"{"name":"Enemy","x":1.5,"y":2.0}"#);
    }

    #[test]
    fn test_appearance_field_order_and_escaping() {
        let look = Appearance::new(RenderKind::Circle, 10.0, 12.0, Rgba::new(1.0, 0.5, 0.0, 1.0))
            .with_image(r"assets\enemy.png");
        let snap = EntitySnapshot::new("Enemy", Vec2::new(0.0, 0.0)).with_appearance(&look);
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Enemy","x":0.0,"y":0.0,"rt":"CIRCLE","w":10.0,"h":12.0,"color":[1.0,0.5,0.0,1.0],"img":"assets\\enemy.png"}"#
        );
        let back: EntitySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.appearance(), Some(look));
    }

    #[test]
    fn test_missing_height_reads_as_zero() {
        let snap: EntitySnapshot =
            serde_json::from_str(r#"{"name":"Enemy","x":3,"y":4,"rt":"RECTANGLE","w":20}"#)
                .unwrap();
        let look = snap.appearance().unwrap();
        assert_eq!(look.width, 20.0);
        assert_eq!(look.height, 0.0);
        assert_eq!(look.color, None);
    }

    #[test]
    fn test_unknown_kind_and_bad_color() {
        let snap: EntitySnapshot =
            serde_json::from_str(r#"{"name":"E","x":"oops","y":1,"rt":"HEXAGON","color":[1,2]}"#)
                .unwrap();
        assert_eq!(snap.x, 0.0);
        assert_eq!(snap.rt, Some(RenderKind::Rectangle));
        assert_eq!(snap.color, None);
    }
}
