//! Event types shared by the parser and the emitter.

use std::fmt;

use crate::{Mark, ScalarStyle};

/// The kind of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Alias,
    Scalar,
    SequenceStart,
    SequenceEnd,
    MappingStart,
    MappingEnd,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StreamStart => "StreamStartEvent",
            EventKind::StreamEnd => "StreamEndEvent",
            EventKind::DocumentStart => "DocumentStartEvent",
            EventKind::DocumentEnd => "DocumentEndEvent",
            EventKind::Alias => "AliasEvent",
            EventKind::Scalar => "ScalarEvent",
            EventKind::SequenceStart => "SequenceStartEvent",
            EventKind::SequenceEnd => "SequenceEndEvent",
            EventKind::MappingStart => "MappingStartEvent",
            EventKind::MappingEnd => "MappingEndEvent",
        };
        f.write_str(name)
    }
}

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventData {
    StreamStart,
    StreamEnd,
    DocumentStart {
        /// Whether the document began with `---`.
        explicit: bool,
        /// `%YAML` directive, as `(major, minor)`.
        version: Option<(u32, u32)>,
        /// `%TAG` directives, as `(handle, prefix)` in source order.
        tags: Option<Vec<(String, String)>>,
    },
    DocumentEnd {
        /// Whether the document ended with `...`.
        explicit: bool,
    },
    Alias {
        anchor: String,
    },
    Scalar {
        anchor: Option<String>,
        tag: Option<String>,
        /// Whether the tag may be omitted when the scalar is written plain,
        /// and when it is written in any other style.
        implicit: (bool, bool),
        value: String,
        /// `None` lets the emitter choose.
        style: Option<ScalarStyle>,
    },
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: bool,
        /// `None` lets the emitter choose.
        flow_style: Option<bool>,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: bool,
        /// `None` lets the emitter choose.
        flow_style: Option<bool>,
    },
    MappingEnd,
}

/// A parse event with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub data: EventData,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

impl Event {
    /// Create an event spanning `start_mark..end_mark`.
    #[inline]
    pub fn new(data: EventData, start_mark: Mark, end_mark: Mark) -> Self {
        Self {
            data,
            start_mark,
            end_mark,
        }
    }

    /// Create an event without a source position.
    #[inline]
    pub fn unmarked(data: EventData) -> Self {
        Self::new(data, Mark::default(), Mark::default())
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match &self.data {
            EventData::StreamStart => EventKind::StreamStart,
            EventData::StreamEnd => EventKind::StreamEnd,
            EventData::DocumentStart { .. } => EventKind::DocumentStart,
            EventData::DocumentEnd { .. } => EventKind::DocumentEnd,
            EventData::Alias { .. } => EventKind::Alias,
            EventData::Scalar { .. } => EventKind::Scalar,
            EventData::SequenceStart { .. } => EventKind::SequenceStart,
            EventData::SequenceEnd => EventKind::SequenceEnd,
            EventData::MappingStart { .. } => EventKind::MappingStart,
            EventData::MappingEnd => EventKind::MappingEnd,
        }
    }

    /// The anchor of a node event, or the target of an alias.
    pub fn anchor(&self) -> Option<&str> {
        match &self.data {
            EventData::Alias { anchor } => Some(anchor),
            EventData::Scalar { anchor, .. }
            | EventData::SequenceStart { anchor, .. }
            | EventData::MappingStart { anchor, .. } => anchor.as_deref(),
            _ => None,
        }
    }

    // ─── Builders for hand-written event streams ───

    pub fn stream_start() -> Self {
        Self::unmarked(EventData::StreamStart)
    }

    pub fn stream_end() -> Self {
        Self::unmarked(EventData::StreamEnd)
    }

    pub fn document_start(explicit: bool) -> Self {
        Self::unmarked(EventData::DocumentStart {
            explicit,
            version: None,
            tags: None,
        })
    }

    pub fn document_end(explicit: bool) -> Self {
        Self::unmarked(EventData::DocumentEnd { explicit })
    }

    pub fn alias(anchor: impl Into<String>) -> Self {
        Self::unmarked(EventData::Alias {
            anchor: anchor.into(),
        })
    }

    /// A plain, untagged scalar.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::unmarked(EventData::Scalar {
            anchor: None,
            tag: None,
            implicit: (true, false),
            value: value.into(),
            style: None,
        })
    }

    pub fn sequence_start(flow_style: Option<bool>) -> Self {
        Self::unmarked(EventData::SequenceStart {
            anchor: None,
            tag: None,
            implicit: true,
            flow_style,
        })
    }

    pub fn sequence_end() -> Self {
        Self::unmarked(EventData::SequenceEnd)
    }

    pub fn mapping_start(flow_style: Option<bool>) -> Self {
        Self::unmarked(EventData::MappingStart {
            anchor: None,
            tag: None,
            implicit: true,
            flow_style,
        })
    }

    pub fn mapping_end() -> Self {
        Self::unmarked(EventData::MappingEnd)
    }
}
