// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stream delimiters and the items that travel over scalar ports.

use super::network::PortId;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Bos,
    Eos,
}

/// One opened instance of a stream: the stream port that opened it plus a
/// per-port sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId {
    pub source: PortId,
    pub seq: u64,
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.seq)
    }
}

/// Begin or end of one stream instance.
///
/// `depth` counts stream levels between the port that opened the instance
/// and the port currently carrying the marker. It grows by one each time the
/// marker descends into a stream's element port and shrinks by one each time
/// a pull hands it back up. A stream port owns exactly the markers that
/// reach its element port at depth 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker {
    kind: MarkerKind,
    stream: StreamId,
    depth: u32,
}

impl Marker {
    pub(crate) fn new(kind: MarkerKind, stream: StreamId) -> Self {
        Marker {
            kind,
            stream,
            depth: 0,
        }
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_bos(&self) -> bool {
        self.kind == MarkerKind::Bos
    }

    pub fn is_eos(&self) -> bool {
        self.kind == MarkerKind::Eos
    }

    /// True when both markers delimit the same stream instance.
    pub fn same_instance(&self, other: &Marker) -> bool {
        self.stream == other.stream
    }

    pub(crate) fn descend(self) -> Self {
        Marker {
            depth: self.depth + 1,
            ..self
        }
    }

    pub(crate) fn ascend(self) -> Self {
        Marker {
            depth: self.depth.saturating_sub(1),
            ..self
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MarkerKind::Bos => "BOS",
            MarkerKind::Eos => "EOS",
        };
        write!(f, "{}({}, depth {})", kind, self.stream, self.depth)
    }
}

/// What a scalar port carries: a data value or a stream marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),
    Marker(Marker),
}

impl Item {
    pub fn is_marker(&self) -> bool {
        matches!(self, Item::Marker(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(v) => Some(v),
            Item::Marker(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Item::Value(v) => Some(v),
            Item::Marker(_) => None,
        }
    }

    pub fn as_marker(&self) -> Option<&Marker> {
        match self {
            Item::Marker(m) => Some(m),
            Item::Value(_) => None,
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Value(value)
    }
}

impl From<Marker> for Item {
    fn from(marker: Marker) -> Self {
        Item::Marker(marker)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Value(v) => write!(f, "{v}"),
            Item::Marker(m) => write!(f, "{m}"),
        }
    }
}
