use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static PROCESS_EDGE_IDS: Lazy<IdAllocator> = Lazy::new(IdAllocator::new);

/// Surrogate identity of an edge, rendered as `edge<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(u64);

impl EdgeId {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid edge id `{0}`")]
pub struct ParseEdgeIdError(String);

impl FromStr for EdgeId {
    type Err = ParseEdgeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("edge")
            .and_then(|digits| digits.parse::<u64>().ok())
            .map(EdgeId)
            .ok_or_else(|| ParseEdgeIdError(s.to_string()))
    }
}

impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Monotonic edge id sequence.
///
/// Clones share the same counter, so every graph built from one allocator
/// (or from [`IdAllocator::process`]) hands out ids that never collide, even
/// after edges are removed and re-added. The counter is never reset.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    /// A fresh sequence starting at `edge0`, independent of every other.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide sequence used by [`crate::graph::Graph::new`].
    pub fn process() -> Self {
        PROCESS_EDGE_IDS.clone()
    }

    pub fn next_edge_id(&self) -> EdgeId {
        EdgeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn shares_sequence_with(&self, other: &IdAllocator) -> bool {
        Arc::ptr_eq(&self.next, &other.next)
    }
}
