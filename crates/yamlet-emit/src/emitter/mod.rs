//! Event stream to YAML text.
//!
//! The emitter is a state machine driven one event at a time. Before acting
//! on a node start it buffers a little lookahead (one event for a document
//! start, two for a sequence, three for a mapping) so it can tell empty
//! collections and single-line keys apart.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use tracing::{debug, trace};
use yamlet_tree::{Error, ErrorKind, Event, EventData, EventKind, Result, ScalarStyle};

use crate::EmitOptions;

mod scalar;
use scalar::ScalarAnalysis;


/// Consumer side of the event protocol.
pub trait EventSink {
    fn emit(&mut self, event: Event) -> Result<()>;
}

/// Tag prefixes every document starts with, as `(prefix, handle)`.
const DEFAULT_TAG_PREFIXES: [(&str, &str); 2] = [("!", "!"), ("tag:yaml.org,2002:", "!!")];

/// Longest anchor plus tag plus scalar text written as a simple key.
const MAX_SIMPLE_KEY_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StreamStart,
    FirstDocumentStart,
    DocumentStart,
    DocumentRoot,
    DocumentEnd,
    FirstFlowSequenceItem,
    FlowSequenceItem,
    FirstFlowMappingKey,
    FlowMappingKey,
    FlowMappingSimpleValue,
    FlowMappingValue,
    FirstBlockSequenceItem,
    BlockSequenceItem,
    FirstBlockMappingKey,
    BlockMappingKey,
    BlockMappingSimpleValue,
    BlockMappingValue,
    Nothing,
}

/// Where a node sits, which decides the styles open to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeContext {
    Root,
    Sequence,
    Mapping,
    SimpleKey,
}

/// Writes events as YAML text into a [`fmt::Write`] sink.
pub struct Emitter<W> {
    sink: W,

    canonical: bool,
    allow_unicode: bool,
    best_indent: usize,
    best_width: usize,
    best_line_break: &'static str,

    state: State,
    states: Vec<State>,
    events: VecDeque<Event>,

    indent: Option<usize>,
    indents: Vec<Option<usize>>,
    flow_level: usize,

    root_context: bool,
    mapping_context: bool,
    simple_key_context: bool,

    column: usize,
    /// The last character written was whitespace.
    whitespace: bool,
    /// Only indentation and indicators are on the current line.
    indention: bool,
    /// A `...` is needed before the next directive.
    open_ended: bool,

    /// Prefix to handle, for shortening tags.
    tag_prefixes: BTreeMap<String, String>,

    prepared_anchor: Option<String>,
    prepared_tag: Option<String>,
    analysis: Option<ScalarAnalysis>,
    style: Option<ScalarStyle>,
}

impl<W: fmt::Write> Emitter<W> {
    pub fn new(sink: W, options: &EmitOptions) -> Self {
        Self {
            sink,
            canonical: options.canonical,
            allow_unicode: options.allow_unicode,
            best_indent: options.effective_indent(),
            best_width: options.effective_width(),
            best_line_break: options.line_break.as_str(),
            state: State::StreamStart,
            states: Vec::new(),
            events: VecDeque::new(),
            indent: None,
            indents: Vec::new(),
            flow_level: 0,
            root_context: false,
            mapping_context: false,
            simple_key_context: false,
            column: 0,
            whitespace: true,
            indention: true,
            open_ended: false,
            tag_prefixes: BTreeMap::new(),
            prepared_anchor: None,
            prepared_tag: None,
            analysis: None,
            style: None,
        }
    }

    /// Return the sink. Buffered events that were never acted on are dropped.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn need_more_events(&self) -> bool {
        let Some(front) = self.events.front() else {
            return true;
        };
        match front.kind() {
            EventKind::DocumentStart => self.need_events(1),
            EventKind::SequenceStart => self.need_events(2),
            EventKind::MappingStart => self.need_events(3),
            _ => false,
        }
    }

    fn need_events(&self, count: usize) -> bool {
        let mut level: i32 = 0;
        for event in self.events.iter().skip(1) {
            match event.kind() {
                EventKind::DocumentStart | EventKind::SequenceStart | EventKind::MappingStart => {
                    level += 1
                }
                EventKind::DocumentEnd | EventKind::SequenceEnd | EventKind::MappingEnd => {
                    level -= 1
                }
                EventKind::StreamEnd => level = -1,
                _ => {}
            }
            if level < 0 {
                return false;
            }
        }
        self.events.len() < count + 1
    }

    fn dispatch(&mut self, event: &Event) -> Result<()> {
        match self.state {
            State::StreamStart => self.expect_stream_start(event),
            State::FirstDocumentStart => self.expect_document_start(event, true),
            State::DocumentStart => self.expect_document_start(event, false),
            State::DocumentRoot => {
                self.states.push(State::DocumentEnd);
                self.expect_node(event, NodeContext::Root)
            }
            State::DocumentEnd => self.expect_document_end(event),
            State::FirstFlowSequenceItem => self.expect_flow_sequence_item(event, true),
            State::FlowSequenceItem => self.expect_flow_sequence_item(event, false),
            State::FirstFlowMappingKey => self.expect_flow_mapping_key(event, true),
            State::FlowMappingKey => self.expect_flow_mapping_key(event, false),
            State::FlowMappingSimpleValue => {
                self.write_indicator(":", false, false, false)?;
                self.states.push(State::FlowMappingKey);
                self.expect_node(event, NodeContext::Mapping)
            }
            State::FlowMappingValue => {
                if self.canonical || self.column > self.best_width {
                    self.write_indent()?;
                }
                self.write_indicator(":", true, false, false)?;
                self.states.push(State::FlowMappingKey);
                self.expect_node(event, NodeContext::Mapping)
            }
            State::FirstBlockSequenceItem => self.expect_block_sequence_item(event, true),
            State::BlockSequenceItem => self.expect_block_sequence_item(event, false),
            State::FirstBlockMappingKey => self.expect_block_mapping_key(event, true),
            State::BlockMappingKey => self.expect_block_mapping_key(event, false),
            State::BlockMappingSimpleValue => {
                self.write_indicator(":", false, false, false)?;
                self.states.push(State::BlockMappingKey);
                self.expect_node(event, NodeContext::Mapping)
            }
            State::BlockMappingValue => {
                self.write_indent()?;
                self.write_indicator(":", true, false, true)?;
                self.states.push(State::BlockMappingKey);
                self.expect_node(event, NodeContext::Mapping)
            }
            State::Nothing => Err(unexpected("nothing", event)),
        }
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::Nothing);
    }

    fn pop_indent(&mut self) {
        self.indent = self.indents.pop().flatten();
    }

    fn increase_indent(&mut self, flow: bool, indentless: bool) {
        self.indents.push(self.indent);
        self.indent = match self.indent {
            None if flow => Some(self.best_indent),
            None => Some(0),
            Some(indent) if !indentless => Some(indent + self.best_indent),
            Some(indent) => Some(indent),
        };
    }

    // ─── Stream and documents ───

    fn expect_stream_start(&mut self, event: &Event) -> Result<()> {
        if event.kind() != EventKind::StreamStart {
            return Err(unexpected("StreamStartEvent", event));
        }
        debug!("emitter stream start");
        self.state = State::FirstDocumentStart;
        Ok(())
    }

    fn expect_document_start(&mut self, event: &Event, first: bool) -> Result<()> {
        match &event.data {
            EventData::DocumentStart {
                explicit,
                version,
                tags,
            } => {
                let has_tags = tags.as_ref().is_some_and(|tags| !tags.is_empty());
                if (version.is_some() || has_tags) && self.open_ended {
                    self.write_indicator("...", true, false, false)?;
                    self.write_indent()?;
                }
                if let Some(version) = version {
                    let text = prepare_version(*version)?;
                    self.write_raw(&format!("%YAML {text}"))?;
                    self.write_line_break(None)?;
                }
                self.tag_prefixes = DEFAULT_TAG_PREFIXES
                    .iter()
                    .map(|(prefix, handle)| (prefix.to_string(), handle.to_string()))
                    .collect();
                if let Some(tags) = tags {
                    let mut tags = tags.clone();
                    tags.sort_by(|a, b| a.0.cmp(&b.0));
                    for (handle, prefix) in tags {
                        let handle_text = prepare_tag_handle(&handle)?;
                        let prefix_text = prepare_tag_prefix(&prefix);
                        self.write_raw(&format!("%TAG {handle_text} {prefix_text}"))?;
                        self.write_line_break(None)?;
                        self.tag_prefixes.insert(prefix, handle);
                    }
                }
                let implicit = first
                    && !explicit
                    && !self.canonical
                    && version.is_none()
                    && !has_tags
                    && !self.check_empty_document();
                if !implicit {
                    self.write_indent()?;
                    self.write_indicator("---", true, false, false)?;
                    if self.canonical {
                        self.write_indent()?;
                    }
                }
                self.state = State::DocumentRoot;
                Ok(())
            }
            EventData::StreamEnd => {
                if self.open_ended {
                    self.write_indicator("...", true, false, false)?;
                    self.write_indent()?;
                }
                debug!("emitter stream end");
                self.state = State::Nothing;
                Ok(())
            }
            _ => Err(unexpected("DocumentStartEvent", event)),
        }
    }

    fn expect_document_end(&mut self, event: &Event) -> Result<()> {
        let EventData::DocumentEnd { explicit } = &event.data else {
            return Err(unexpected("DocumentEndEvent", event));
        };
        self.write_indent()?;
        if *explicit {
            self.write_indicator("...", true, false, false)?;
            self.write_indent()?;
        }
        self.state = State::DocumentStart;
        Ok(())
    }

    // ─── Nodes ───

    fn expect_node(&mut self, event: &Event, context: NodeContext) -> Result<()> {
        self.root_context = context == NodeContext::Root;
        self.mapping_context = matches!(context, NodeContext::Mapping | NodeContext::SimpleKey);
        self.simple_key_context = context == NodeContext::SimpleKey;
        match &event.data {
            EventData::Alias { .. } => {
                self.process_anchor(event, "*")?;
                self.pop_state();
            }
            EventData::Scalar { .. } => {
                self.process_anchor(event, "&")?;
                self.process_tag(event)?;
                self.increase_indent(true, false);
                self.process_scalar(event)?;
                self.pop_indent();
                self.pop_state();
            }
            EventData::SequenceStart { flow_style, .. } => {
                self.process_anchor(event, "&")?;
                self.process_tag(event)?;
                if self.flow_level > 0
                    || self.canonical
                    || *flow_style == Some(true)
                    || self.check_empty_collection(EventKind::SequenceEnd)
                {
                    self.write_indicator("[", true, true, false)?;
                    self.flow_level += 1;
                    self.increase_indent(true, false);
                    self.state = State::FirstFlowSequenceItem;
                } else {
                    let indentless = self.mapping_context && !self.indention;
                    self.increase_indent(false, indentless);
                    self.state = State::FirstBlockSequenceItem;
                }
            }
            EventData::MappingStart { flow_style, .. } => {
                self.process_anchor(event, "&")?;
                self.process_tag(event)?;
                if self.flow_level > 0
                    || self.canonical
                    || *flow_style == Some(true)
                    || self.check_empty_collection(EventKind::MappingEnd)
                {
                    self.write_indicator("{", true, true, false)?;
                    self.flow_level += 1;
                    self.increase_indent(true, false);
                    self.state = State::FirstFlowMappingKey;
                } else {
                    self.increase_indent(false, false);
                    self.state = State::FirstBlockMappingKey;
                }
            }
            _ => return Err(unexpected("NodeEvent", event)),
        }
        Ok(())
    }

    fn expect_flow_sequence_item(&mut self, event: &Event, first: bool) -> Result<()> {
        if event.kind() == EventKind::SequenceEnd {
            self.pop_indent();
            self.flow_level -= 1;
            if self.canonical && !first {
                self.write_indicator(",", false, false, false)?;
                self.write_indent()?;
            }
            self.write_indicator("]", false, false, false)?;
            self.pop_state();
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
        }
        if self.canonical || self.column > self.best_width {
            self.write_indent()?;
        }
        self.states.push(State::FlowSequenceItem);
        self.expect_node(event, NodeContext::Sequence)
    }

    fn expect_flow_mapping_key(&mut self, event: &Event, first: bool) -> Result<()> {
        if event.kind() == EventKind::MappingEnd {
            self.pop_indent();
            self.flow_level -= 1;
            if self.canonical && !first {
                self.write_indicator(",", false, false, false)?;
                self.write_indent()?;
            }
            self.write_indicator("}", false, false, false)?;
            self.pop_state();
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
        }
        if self.canonical || self.column > self.best_width {
            self.write_indent()?;
        }
        if !self.canonical && self.check_simple_key(event)? {
            self.states.push(State::FlowMappingSimpleValue);
            self.expect_node(event, NodeContext::SimpleKey)
        } else {
            self.write_indicator("?", true, false, false)?;
            self.states.push(State::FlowMappingValue);
            self.expect_node(event, NodeContext::Mapping)
        }
    }

    fn expect_block_sequence_item(&mut self, event: &Event, first: bool) -> Result<()> {
        if !first && event.kind() == EventKind::SequenceEnd {
            self.pop_indent();
            self.pop_state();
            return Ok(());
        }
        self.write_indent()?;
        self.write_indicator("-", true, false, true)?;
        self.states.push(State::BlockSequenceItem);
        self.expect_node(event, NodeContext::Sequence)
    }

    fn expect_block_mapping_key(&mut self, event: &Event, first: bool) -> Result<()> {
        if !first && event.kind() == EventKind::MappingEnd {
            self.pop_indent();
            self.pop_state();
            return Ok(());
        }
        self.write_indent()?;
        if self.check_simple_key(event)? {
            self.states.push(State::BlockMappingSimpleValue);
            self.expect_node(event, NodeContext::SimpleKey)
        } else {
            self.write_indicator("?", true, false, true)?;
            self.states.push(State::BlockMappingValue);
            self.expect_node(event, NodeContext::Mapping)
        }
    }

    // ─── Lookahead checks ───

    /// The buffered event right after the current collection start closes it.
    fn check_empty_collection(&self, end: EventKind) -> bool {
        self.events.front().is_some_and(|next| next.kind() == end)
    }

    /// The document about to start holds nothing but an empty plain scalar.
    fn check_empty_document(&self) -> bool {
        matches!(
            self.events.front().map(|event| &event.data),
            Some(EventData::Scalar {
                anchor: None,
                tag: None,
                implicit: (true, _),
                value,
                ..
            }) if value.is_empty()
        )
    }

    fn check_simple_key(&mut self, event: &Event) -> Result<bool> {
        let mut length = 0;
        if let Some(anchor) = event.anchor() {
            let prepared = match self.prepared_anchor.take() {
                Some(prepared) => prepared,
                None => prepare_anchor(anchor)?,
            };
            length += prepared.chars().count();
            self.prepared_anchor = Some(prepared);
        }
        if let Some(tag) = node_tag(event) {
            let prepared = match self.prepared_tag.take() {
                Some(prepared) => prepared,
                None => self.prepare_tag(tag)?,
            };
            length += prepared.chars().count();
            self.prepared_tag = Some(prepared);
        }
        let simple = match &event.data {
            EventData::Scalar { value, .. } => {
                let analysis = self.analysis_for(value);
                length += value.chars().count();
                !analysis.empty && !analysis.multiline
            }
            EventData::Alias { .. } => true,
            EventData::SequenceStart { .. } => self.check_empty_collection(EventKind::SequenceEnd),
            EventData::MappingStart { .. } => self.check_empty_collection(EventKind::MappingEnd),
            _ => false,
        };
        Ok(length < MAX_SIMPLE_KEY_LENGTH && simple)
    }

    // ─── Node properties ───

    fn process_anchor(&mut self, event: &Event, indicator: &str) -> Result<()> {
        let Some(anchor) = event.anchor() else {
            self.prepared_anchor = None;
            return Ok(());
        };
        let prepared = match self.prepared_anchor.take() {
            Some(prepared) => prepared,
            None => prepare_anchor(anchor)?,
        };
        if !prepared.is_empty() {
            self.write_indicator(&format!("{indicator}{prepared}"), true, false, false)?;
        }
        Ok(())
    }

    fn process_tag(&mut self, event: &Event) -> Result<()> {
        let tag = match &event.data {
            EventData::Scalar {
                tag,
                implicit,
                value,
                style,
                ..
            } => {
                let chosen = self.scalar_style(value, *style, *implicit);
                let plain = chosen == ScalarStyle::Plain;
                if (!self.canonical || tag.is_none())
                    && ((plain && implicit.0) || (!plain && implicit.1))
                {
                    self.prepared_tag = None;
                    return Ok(());
                }
                if implicit.0 && tag.is_none() {
                    self.prepared_tag = None;
                    Some("!")
                } else {
                    tag.as_deref()
                }
            }
            EventData::SequenceStart { tag, implicit, .. }
            | EventData::MappingStart { tag, implicit, .. } => {
                if (!self.canonical || tag.is_none()) && *implicit {
                    self.prepared_tag = None;
                    return Ok(());
                }
                tag.as_deref()
            }
            _ => return Ok(()),
        };
        let Some(tag) = tag else {
            return Err(Error::new(ErrorKind::Emitter, "tag is not specified"));
        };
        let prepared = match self.prepared_tag.take() {
            Some(prepared) => prepared,
            None => self.prepare_tag(tag)?,
        };
        if !prepared.is_empty() {
            self.write_indicator(&prepared, true, false, false)?;
        }
        Ok(())
    }

    fn analysis_for(&mut self, value: &str) -> ScalarAnalysis {
        let allow_unicode = self.allow_unicode;
        *self
            .analysis
            .get_or_insert_with(|| ScalarAnalysis::analyze(value, allow_unicode))
    }

    /// The style the current scalar will be written in, chosen once.
    fn scalar_style(
        &mut self,
        value: &str,
        requested: Option<ScalarStyle>,
        implicit: (bool, bool),
    ) -> ScalarStyle {
        if let Some(style) = self.style {
            return style;
        }
        let style = self.choose_scalar_style(value, requested, implicit);
        self.style = Some(style);
        style
    }

    fn choose_scalar_style(
        &mut self,
        value: &str,
        requested: Option<ScalarStyle>,
        implicit: (bool, bool),
    ) -> ScalarStyle {
        let analysis = self.analysis_for(value);
        if requested == Some(ScalarStyle::DoubleQuoted) || self.canonical {
            return ScalarStyle::DoubleQuoted;
        }
        let unstyled = matches!(requested, None | Some(ScalarStyle::Plain));
        if unstyled
            && implicit.0
            && !(self.simple_key_context && (analysis.empty || analysis.multiline))
            && ((self.flow_level > 0 && analysis.allow_flow_plain)
                || (self.flow_level == 0 && analysis.allow_block_plain))
        {
            return ScalarStyle::Plain;
        }
        if let Some(block @ (ScalarStyle::Literal | ScalarStyle::Folded)) = requested {
            if self.flow_level == 0 && !self.simple_key_context && analysis.allow_block {
                return block;
            }
        }
        if (unstyled || requested == Some(ScalarStyle::SingleQuoted))
            && analysis.allow_single_quoted
            && !(self.simple_key_context && analysis.multiline)
        {
            return ScalarStyle::SingleQuoted;
        }
        ScalarStyle::DoubleQuoted
    }

    fn process_scalar(&mut self, event: &Event) -> Result<()> {
        let EventData::Scalar {
            value,
            style,
            implicit,
            ..
        } = &event.data
        else {
            return Ok(());
        };
        let chosen = self.scalar_style(value, *style, *implicit);
        let split = !self.simple_key_context;
        let text: Vec<char> = value.chars().collect();
        match chosen {
            ScalarStyle::DoubleQuoted => self.write_double_quoted(&text, split)?,
            ScalarStyle::SingleQuoted => self.write_single_quoted(&text, split)?,
            ScalarStyle::Folded => self.write_folded(&text)?,
            ScalarStyle::Literal => self.write_literal(&text)?,
            ScalarStyle::Plain => self.write_plain(&text, split)?,
        }
        self.analysis = None;
        self.style = None;
        Ok(())
    }

    /// Shorten `tag` with the longest-sorting matching prefix, or write it
    /// verbatim as `!<...>`.
    fn prepare_tag(&self, tag: &str) -> Result<String> {
        if tag.is_empty() {
            return Err(Error::new(ErrorKind::Emitter, "tag must not be empty"));
        }
        if tag == "!" {
            return Ok(tag.to_string());
        }
        let mut handle = None;
        let mut suffix = tag;
        for (prefix, candidate) in &self.tag_prefixes {
            if tag.starts_with(prefix.as_str()) && (prefix == "!" || prefix.len() < tag.len()) {
                handle = Some(candidate.as_str());
                suffix = &tag[prefix.len()..];
            }
        }
        let mut text = String::with_capacity(suffix.len());
        for ch in suffix.chars() {
            if ch.is_ascii_alphanumeric()
                || "-;/?:@&=+$,_.~*'()[]".contains(ch)
                || (ch == '!' && handle != Some("!"))
            {
                text.push(ch);
            } else {
                percent_encode(ch, &mut text);
            }
        }
        Ok(match handle {
            Some(handle) => format!("{handle}{text}"),
            None => format!("!<{text}>"),
        })
    }

    // ─── Low-level writing ───

    fn write_raw(&mut self, data: &str) -> Result<()> {
        self.sink
            .write_str(data)
            .map_err(|_| Error::new(ErrorKind::Emitter, "failed to write to the output"))
    }

    fn write_chunk(&mut self, chunk: &[char]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let data: String = chunk.iter().collect();
        self.column += chunk.len();
        self.write_raw(&data)
    }

    fn write_indicator(
        &mut self,
        indicator: &str,
        need_whitespace: bool,
        whitespace: bool,
        indention: bool,
    ) -> Result<()> {
        let data = if self.whitespace || !need_whitespace {
            indicator.to_string()
        } else {
            format!(" {indicator}")
        };
        self.whitespace = whitespace;
        self.indention = self.indention && indention;
        self.column += data.chars().count();
        self.open_ended = false;
        self.write_raw(&data)
    }

    fn write_indent(&mut self) -> Result<()> {
        let indent = self.indent.unwrap_or(0);
        if !self.indention || self.column > indent || (self.column == indent && !self.whitespace) {
            self.write_line_break(None)?;
        }
        if self.column < indent {
            self.whitespace = true;
            let data = " ".repeat(indent - self.column);
            self.column = indent;
            self.write_raw(&data)?;
        }
        Ok(())
    }

    /// Write `brk`, or the configured line break when `None`.
    fn write_line_break(&mut self, brk: Option<char>) -> Result<()> {
        self.whitespace = true;
        self.indention = true;
        self.column = 0;
        match brk {
            Some(ch) => {
                let mut buf = [0; 4];
                self.write_raw(ch.encode_utf8(&mut buf))
            }
            None => {
                let brk = self.best_line_break;
                self.write_raw(brk)
            }
        }
    }
}

impl<W: fmt::Write> EventSink for Emitter<W> {
    fn emit(&mut self, event: Event) -> Result<()> {
        trace!(kind = %event.kind(), "emit");
        self.events.push_back(event);
        while !self.need_more_events() {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            self.dispatch(&event)?;
        }
        Ok(())
    }
}

impl<W> fmt::Debug for Emitter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("state", &self.state)
            .field("buffered", &self.events.len())
            .field("indent", &self.indent)
            .field("flow_level", &self.flow_level)
            .finish_non_exhaustive()
    }
}

fn unexpected(expected: &str, event: &Event) -> Error {
    Error::new(
        ErrorKind::Emitter,
        format!("expected {expected}, but got {}", event.kind()),
    )
}

fn node_tag(event: &Event) -> Option<&str> {
    match &event.data {
        EventData::Scalar { tag, .. }
        | EventData::SequenceStart { tag, .. }
        | EventData::MappingStart { tag, .. } => tag.as_deref(),
        _ => None,
    }
}

fn prepare_version((major, minor): (u32, u32)) -> Result<String> {
    if major != 1 {
        return Err(Error::new(
            ErrorKind::Emitter,
            format!("unsupported YAML version: {major}.{minor}"),
        ));
    }
    Ok(format!("{major}.{minor}"))
}

fn prepare_tag_handle(handle: &str) -> Result<String> {
    if handle.is_empty() {
        return Err(Error::new(ErrorKind::Emitter, "tag handle must not be empty"));
    }
    if !handle.starts_with('!') || !handle.ends_with('!') {
        return Err(Error::new(
            ErrorKind::Emitter,
            format!("tag handle must start and end with '!': {handle:?}"),
        ));
    }
    let inner = handle
        .strip_prefix('!')
        .and_then(|rest| rest.strip_suffix('!'))
        .unwrap_or_default();
    if let Some(ch) = inner.chars().find(|&ch| !is_word_char(ch)) {
        return Err(Error::new(
            ErrorKind::Emitter,
            format!("invalid character {ch:?} in the tag handle: {handle:?}"),
        ));
    }
    Ok(handle.to_string())
}

fn prepare_tag_prefix(prefix: &str) -> String {
    let mut text = String::with_capacity(prefix.len());
    let rest = match prefix.strip_prefix('!') {
        Some(rest) => {
            text.push('!');
            rest
        }
        None => prefix,
    };
    for ch in rest.chars() {
        if ch.is_ascii_alphanumeric() || "-;/?!:@&=+$,_.~*'()[]".contains(ch) {
            text.push(ch);
        } else {
            percent_encode(ch, &mut text);
        }
    }
    text
}

fn prepare_anchor(anchor: &str) -> Result<String> {
    if anchor.is_empty() {
        return Err(Error::new(ErrorKind::Emitter, "anchor must not be empty"));
    }
    if let Some(ch) = anchor.chars().find(|&ch| !is_word_char(ch)) {
        return Err(Error::new(
            ErrorKind::Emitter,
            format!("invalid character {ch:?} in the anchor: {anchor:?}"),
        ));
    }
    Ok(anchor.to_string())
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Append the UTF-8 bytes of `ch` as `%XX` escapes.
fn percent_encode(ch: char, out: &mut String) {
    use std::fmt::Write as _;
    let mut buf = [0; 4];
    for byte in ch.encode_utf8(&mut buf).bytes() {
        let _ = write!(out, "%{byte:02X}");
    }
}
