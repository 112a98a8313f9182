//! Core types shared by the player and region modules.
//!
//! - [`EventArg`] - normalized engine event payload value
//! - [`AudioSource`], [`MediaSource`], [`Blob`], [`MediaElement`], [`Peaks`] - what can be loaded
//! - [`RegionDescriptor`], [`RegionSet`] - declarative region descriptions keyed by id

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Event payloads
// =============================================================================

/// One value of an engine event payload.
///
/// Engines emit heterogeneous arguments (positions, error messages, region
/// handles). They are normalized into this enum before reaching callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum EventArg {
    Number(f64),
    Text(String),
    Flag(bool),
    /// Id of the region the event concerns.
    Region(String),
    Json(serde_json::Value),
}

impl EventArg {
    /// Numeric value, if this argument is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EventArg::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EventArg::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for EventArg {
    fn from(value: f64) -> Self {
        EventArg::Number(value)
    }
}

impl From<bool> for EventArg {
    fn from(value: bool) -> Self {
        EventArg::Flag(value)
    }
}

impl From<&str> for EventArg {
    fn from(value: &str) -> Self {
        EventArg::Text(value.to_string())
    }
}

impl From<String> for EventArg {
    fn from(value: String) -> Self {
        EventArg::Text(value)
    }
}

impl From<serde_json::Value> for EventArg {
    fn from(value: serde_json::Value) -> Self {
        EventArg::Json(value)
    }
}

// =============================================================================
// Handles
// =============================================================================

/// Opaque handle to the surface the engine draws into.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerHandle(pub String);

/// Opaque handle to a media element owned by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaElement {
    pub id: String,
}

impl MediaElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// In-memory binary audio object.
///
/// Compared by reference: two blobs are the same source only if they share
/// the same allocation.
#[derive(Clone, Debug)]
pub struct Blob {
    pub data: Rc<[u8]>,
    pub mime: Option<String>,
}

impl Blob {
    pub fn new(data: impl Into<Rc<[u8]>>, mime: Option<String>) -> Self {
        Self {
            data: data.into(),
            mime,
        }
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

/// Audio source for the standard loaders.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioSource {
    /// Path or URL, loaded by the engine itself.
    Url(String),
    /// Binary object already in memory.
    Blob(Blob),
}

impl AudioSource {
    /// Interpret a loosely typed configuration value as a source.
    ///
    /// Only strings are representable in JSON; anything else is rejected.
    pub fn from_value(value: &serde_json::Value) -> crate::Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(AudioSource::Url(s.clone())),
            other => Err(crate::WaveError::UnsupportedSource {
                kind: json_kind(other).to_string(),
            }),
        }
    }
}

impl From<&str> for AudioSource {
    fn from(value: &str) -> Self {
        AudioSource::Url(value.to_string())
    }
}

impl From<String> for AudioSource {
    fn from(value: String) -> Self {
        AudioSource::Url(value)
    }
}

impl From<Blob> for AudioSource {
    fn from(value: Blob) -> Self {
        AudioSource::Blob(value)
    }
}

/// Media element reference, either direct or through a selector.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaSource {
    Element(MediaElement),
    Selector(String),
}

impl From<MediaElement> for MediaSource {
    fn from(value: MediaElement) -> Self {
        MediaSource::Element(value)
    }
}

impl From<&str> for MediaSource {
    fn from(value: &str) -> Self {
        MediaSource::Selector(value.to_string())
    }
}

/// Precomputed peak data. Compared by reference like [`Blob`].
#[derive(Clone, Debug)]
pub struct Peaks(pub Rc<[f32]>);

impl PartialEq for Peaks {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<f32>> for Peaks {
    fn from(value: Vec<f32>) -> Self {
        Peaks(value.into())
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// Regions
// =============================================================================

/// Start/end pair sent to a live region's `update`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub start: f64,
    pub end: f64,
}

/// Style attributes forwarded untouched to `addRegion`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<bool>,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub looped: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Declarative description of one region. Identity is `id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    #[serde(default)]
    pub id: String,
    pub start: f64,
    pub end: f64,
    #[serde(flatten)]
    pub style: RegionStyle,
}

impl RegionDescriptor {
    pub fn new(id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            style: RegionStyle::default(),
        }
    }

    pub fn bounds(&self) -> RegionBounds {
        RegionBounds {
            start: self.start,
            end: self.end,
        }
    }

    /// True when start or end differ. Style changes are not diffed.
    pub fn bounds_differ(&self, other: &RegionDescriptor) -> bool {
        self.start != other.start || self.end != other.end
    }
}

/// Ordered mapping of region id to descriptor.
///
/// Iteration follows insertion order. Inserting an id that already exists
/// replaces the descriptor in place, keeping its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionSet {
    entries: Vec<RegionDescriptor>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: RegionDescriptor) {
        match self.entries.iter_mut().find(|d| d.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => self.entries.push(descriptor),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, descriptor: RegionDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    pub fn get(&self, id: &str) -> Option<&RegionDescriptor> {
        self.entries.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionDescriptor> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RegionDescriptor> for RegionSet {
    fn from_iter<I: IntoIterator<Item = RegionDescriptor>>(iter: I) -> Self {
        let mut set = RegionSet::new();
        for descriptor in iter {
            set.insert(descriptor);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a RegionDescriptor;
    type IntoIter = std::slice::Iter<'a, RegionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for RegionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for descriptor in &self.entries {
            map.serialize_entry(&descriptor.id, descriptor)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RegionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegionSetVisitor;

        impl<'de> Visitor<'de> for RegionSetVisitor {
            type Value = RegionSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of region id to region descriptor")
            }

            // Keys arrive in document order, which becomes the set order.
            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RegionSet, A::Error> {
                let mut set = RegionSet::new();
                while let Some((id, mut descriptor)) =
                    access.next_entry::<String, RegionDescriptor>()?
                {
                    descriptor.id = id;
                    set.insert(descriptor);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(RegionSetVisitor)
    }
}

// =============================================================================
// Tests
// =============================================================================
