//! Response Batch - the ordered body of a `sink` submission
//!
//! A JSON object whose keys are caller-assigned labels and whose values are
//! opaque payloads. Key order is meaningful, so the object is decoded
//! straight into a list instead of a hash map. A repeated key keeps its
//! first position and takes the last payload, the way `JSON.parse` does.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered `(key, payload)` pairs as they arrived on the wire. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBatch {
    entries: Vec<(String, serde_json::Value)>,
}

/// Accumulates entries, replacing the payload of a key seen before.
#[derive(Default)]
struct Collector {
    entries: Vec<(String, serde_json::Value)>,
    positions: HashMap<String, usize>,
}

impl Collector {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    fn insert(&mut self, key: String, payload: serde_json::Value) {
        if let Some(&at) = self.positions.get(&key) {
            self.entries[at].1 = payload;
        } else {
            self.positions.insert(key.clone(), self.entries.len());
            self.entries.push((key, payload));
        }
    }

    fn finish(self) -> ResponseBatch {
        ResponseBatch {
            entries: self.entries,
        }
    }
}

impl ResponseBatch {
    /// Create an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a record, keeping insertion order. Reusing a key replaces
    /// its payload in place.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, payload: serde_json::Value) -> Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = payload,
            None => self.entries.push((key, payload)),
        }
        self
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the batch holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in arrival order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Split into keys and payloads, both in arrival order.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<serde_json::Value>) {
        self.entries.into_iter().unzip()
    }
}

impl FromIterator<(String, serde_json::Value)> for ResponseBatch {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        let mut collector = Collector::default();
        for (key, payload) in iter {
            collector.insert(key, payload);
        }
        collector.finish()
    }
}

impl Serialize for ResponseBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, payload) in &self.entries {
            map.serialize_entry(key, payload)?;
        }
        map.end()
    }
}

struct BatchVisitor;

impl<'de> Visitor<'de> for BatchVisitor {
    type Value = ResponseBatch;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of response records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut collector = Collector::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, payload)) = access.next_entry::<String, serde_json::Value>()? {
            collector.insert(key, payload);
        }
        Ok(collector.finish())
    }
}

impl<'de> Deserialize<'de> for ResponseBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BatchVisitor)
    }
}
