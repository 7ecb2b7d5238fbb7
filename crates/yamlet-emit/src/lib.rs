//! YAML text output.
//!
//! A [`Serializer`] walks node graphs and produces events, assigning anchors
//! to nodes reached more than once. An [`Emitter`] turns events into text in
//! any [`std::fmt::Write`] sink. Both read their settings from
//! [`EmitOptions`].

pub use yamlet_tree::{Error, ErrorKind, Event, EventData, EventKind, Result, ScalarStyle};

mod emitter;
pub use emitter::{Emitter, EventSink};

mod options;
pub use options::{EmitOptions, LineBreak};

mod serializer;
pub use serializer::Serializer;
