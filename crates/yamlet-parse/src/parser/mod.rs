//! Pull-based event parser for YAML.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::{
    Error, ErrorKind, Event, EventData, EventKind, Mark, Result, Scanner, Token, TokenData,
    TokenKind, TokenSource,
};

#[cfg(test)]
mod tests;

/// Tag handles every document knows without a `%TAG` directive.
pub const DEFAULT_TAG_HANDLES: [(&str, &str); 2] = [("!", "!"), ("!!", "tag:yaml.org,2002:")];

/// Pull protocol over an event stream.
pub trait EventSource {
    /// Whether the next event is one of `kinds`. An empty slice matches any event.
    fn check_event(&mut self, kinds: &[EventKind]) -> Result<bool>;

    /// The next event without consuming it.
    fn peek_event(&mut self) -> Result<Option<&Event>>;

    /// Consume and return the next event.
    fn get_event(&mut self) -> Result<Option<Event>>;
}

/// Parser state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentEnd,
    DocumentContent,
    BlockNode,
    BlockSequenceFirstEntry,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingFirstKey,
    BlockMappingKey,
    BlockMappingValue,
    FlowSequenceFirstEntry,
    FlowSequenceEntry,
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingValue,
    FlowMappingEmptyValue,
}

/// Pull-based event parser.
///
/// Generic over its token source so tests and alternate front ends can feed
/// it tokens without a [`Scanner`].
pub struct Parser<S = Scanner> {
    scanner: S,
    current_event: Option<Event>,
    /// `None` once STREAM-END has been produced.
    state: Option<ParserState>,
    states: Vec<ParserState>,
    /// Start marks of the open collections, for error context.
    marks: Vec<Mark>,
    tag_handles: HashMap<String, String>,
}

impl Parser<Scanner> {
    /// Create a parser over source text.
    pub fn from_source(source: &str) -> Result<Self> {
        debug!(len = source.len(), "parsing");
        Ok(Self::new(Scanner::from_source(source)?))
    }
}

impl<S: TokenSource> Parser<S> {
    /// Create a parser pulling tokens from `scanner`.
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            current_event: None,
            state: Some(ParserState::StreamStart),
            states: Vec::new(),
            marks: Vec::new(),
            tag_handles: HashMap::new(),
        }
    }

    /// Parse all events into a vector.
    pub fn parse_to_vec(mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(event) = self.get_event()? {
            events.push(event);
        }
        Ok(events)
    }

    fn fill(&mut self) -> Result<()> {
        if self.current_event.is_none()
            && let Some(state) = self.state
        {
            let event = self.advance(state)?;
            trace!("Event {:?}", event.data);
            self.current_event = Some(event);
        }
        Ok(())
    }

    /// Run the state machine for one event.
    fn advance(&mut self, state: ParserState) -> Result<Event> {
        match state {
            ParserState::StreamStart => self.parse_stream_start(),
            ParserState::ImplicitDocumentStart => self.parse_implicit_document_start(),
            ParserState::DocumentStart => self.parse_document_start(),
            ParserState::DocumentEnd => self.parse_document_end(),
            ParserState::DocumentContent => self.parse_document_content(),
            ParserState::BlockNode => self.parse_node(true, false),
            ParserState::BlockSequenceFirstEntry => self.parse_block_sequence_first_entry(),
            ParserState::BlockSequenceEntry => self.parse_block_sequence_entry(),
            ParserState::IndentlessSequenceEntry => self.parse_indentless_sequence_entry(),
            ParserState::BlockMappingFirstKey => self.parse_block_mapping_first_key(),
            ParserState::BlockMappingKey => self.parse_block_mapping_key(),
            ParserState::BlockMappingValue => self.parse_block_mapping_value(),
            ParserState::FlowSequenceFirstEntry => self.parse_flow_sequence_first_entry(),
            ParserState::FlowSequenceEntry => self.parse_flow_sequence_entry(false),
            ParserState::FlowSequenceEntryMappingKey => {
                self.parse_flow_sequence_entry_mapping_key()
            }
            ParserState::FlowSequenceEntryMappingValue => {
                self.parse_flow_sequence_entry_mapping_value()
            }
            ParserState::FlowSequenceEntryMappingEnd => {
                self.parse_flow_sequence_entry_mapping_end()
            }
            ParserState::FlowMappingFirstKey => self.parse_flow_mapping_first_key(),
            ParserState::FlowMappingKey => self.parse_flow_mapping_key(false),
            ParserState::FlowMappingValue => self.parse_flow_mapping_value(),
            ParserState::FlowMappingEmptyValue => self.parse_flow_mapping_empty_value(),
        }
    }

    // ─── Token helpers ───

    fn check(&mut self, kinds: &[TokenKind]) -> Result<bool> {
        self.scanner.check_token(kinds)
    }

    fn next_token(&mut self) -> Result<Token> {
        self.scanner.get_token()?.ok_or_else(|| {
            Error::new(ErrorKind::Parser, "unexpected end of the token stream")
        })
    }

    /// Kind and marks of the next token.
    fn peek(&mut self) -> Result<(TokenKind, Mark, Mark)> {
        match self.scanner.peek_token()? {
            Some(token) => Ok((
                token.kind(),
                token.start_mark.clone(),
                token.end_mark.clone(),
            )),
            None => Err(Error::new(
                ErrorKind::Parser,
                "unexpected end of the token stream",
            )),
        }
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop();
    }

    fn last_mark(&self) -> Mark {
        self.marks.last().cloned().unwrap_or_default()
    }

    // ─── Stream and documents ───

    fn parse_stream_start(&mut self) -> Result<Event> {
        let token = self.next_token()?;
        self.state = Some(ParserState::ImplicitDocumentStart);
        Ok(Event::new(
            EventData::StreamStart,
            token.start_mark,
            token.end_mark,
        ))
    }

    fn parse_implicit_document_start(&mut self) -> Result<Event> {
        if self.check(&[
            TokenKind::Directive,
            TokenKind::DocumentStart,
            TokenKind::StreamEnd,
        ])? {
            return self.parse_document_start();
        }
        self.tag_handles = default_tag_handles();
        let (_, mark, _) = self.peek()?;
        self.states.push(ParserState::DocumentEnd);
        self.state = Some(ParserState::BlockNode);
        debug!("implicit document start");
        Ok(Event::new(
            EventData::DocumentStart {
                explicit: false,
                version: None,
                tags: None,
            },
            mark.clone(),
            mark,
        ))
    }

    fn parse_document_start(&mut self) -> Result<Event> {
        while self.check(&[TokenKind::DocumentEnd])? {
            self.next_token()?;
        }

        if self.check(&[TokenKind::StreamEnd])? {
            let token = self.next_token()?;
            self.state = None;
            return Ok(Event::new(
                EventData::StreamEnd,
                token.start_mark,
                token.end_mark,
            ));
        }

        let (_, start_mark, _) = self.peek()?;
        let (version, tags) = self.process_directives()?;
        let (kind, mark, _) = self.peek()?;
        if kind != TokenKind::DocumentStart {
            return Err(Error::new(
                ErrorKind::Parser,
                format!("expected '<document start>', but found {kind}"),
            )
            .with_mark(mark));
        }
        let token = self.next_token()?;
        self.states.push(ParserState::DocumentEnd);
        self.state = Some(ParserState::DocumentContent);
        debug!(?version, "explicit document start");
        Ok(Event::new(
            EventData::DocumentStart {
                explicit: true,
                version,
                tags,
            },
            start_mark,
            token.end_mark,
        ))
    }

    fn parse_document_end(&mut self) -> Result<Event> {
        let (_, start_mark, _) = self.peek()?;
        let mut end_mark = start_mark.clone();
        let mut explicit = false;
        if self.check(&[TokenKind::DocumentEnd])? {
            let token = self.next_token()?;
            end_mark = token.end_mark;
            explicit = true;
        }
        self.state = Some(ParserState::DocumentStart);
        Ok(Event::new(
            EventData::DocumentEnd { explicit },
            start_mark,
            end_mark,
        ))
    }

    fn parse_document_content(&mut self) -> Result<Event> {
        if self.check(&[
            TokenKind::Directive,
            TokenKind::DocumentStart,
            TokenKind::DocumentEnd,
            TokenKind::StreamEnd,
        ])? {
            let (_, mark, _) = self.peek()?;
            self.pop_state();
            Ok(empty_scalar(mark))
        } else {
            self.parse_node(true, false)
        }
    }

    /// Collect `%YAML` and `%TAG` directives for the next document.
    #[allow(clippy::type_complexity)]
    fn process_directives(
        &mut self,
    ) -> Result<(Option<(u32, u32)>, Option<Vec<(String, String)>>)> {
        let mut version = None;
        let mut tags: Vec<(String, String)> = Vec::new();
        self.tag_handles.clear();

        while self.check(&[TokenKind::Directive])? {
            let token = self.next_token()?;
            match token.data {
                TokenData::VersionDirective { major, minor } => {
                    if version.is_some() {
                        return Err(Error::new(ErrorKind::Parser, "found duplicate YAML directive")
                            .with_mark(token.start_mark));
                    }
                    if major != 1 {
                        return Err(Error::new(
                            ErrorKind::Parser,
                            "found incompatible YAML document (version 1.* is required)",
                        )
                        .with_mark(token.start_mark));
                    }
                    if minor > 1 {
                        warn!(major, minor, "document declares a newer YAML 1.x version");
                    }
                    version = Some((major, minor));
                }
                TokenData::TagDirective { handle, prefix } => {
                    if self.tag_handles.contains_key(&handle) {
                        return Err(Error::new(
                            ErrorKind::Parser,
                            format!("duplicate tag handle {handle:?}"),
                        )
                        .with_mark(token.start_mark));
                    }
                    self.tag_handles.insert(handle.clone(), prefix.clone());
                    tags.push((handle, prefix));
                }
                TokenData::ReservedDirective { name } => {
                    warn!(%name, "ignoring unknown directive");
                }
                _ => {}
            }
        }

        let tags = (!tags.is_empty()).then_some(tags);
        for (handle, prefix) in DEFAULT_TAG_HANDLES {
            self.tag_handles
                .entry(handle.to_string())
                .or_insert_with(|| prefix.to_string());
        }
        Ok((version, tags))
    }

    // ─── Nodes ───

    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> Result<Event> {
        if self.check(&[TokenKind::Alias])? {
            let token = self.next_token()?;
            let TokenData::Alias(anchor) = token.data else {
                unreachable!("checked alias token");
            };
            self.pop_state();
            return Ok(Event::new(
                EventData::Alias { anchor },
                token.start_mark,
                token.end_mark,
            ));
        }

        let mut anchor = None;
        let mut raw_tag = None;
        let mut start_mark = None;
        let mut end_mark = None;
        let mut tag_mark = None;

        if self.check(&[TokenKind::Anchor])? {
            let token = self.next_token()?;
            start_mark = Some(token.start_mark);
            end_mark = Some(token.end_mark);
            anchor = anchor_name(token.data);
            if self.check(&[TokenKind::Tag])? {
                let token = self.next_token()?;
                tag_mark = Some(token.start_mark);
                end_mark = Some(token.end_mark);
                raw_tag = tag_parts(token.data);
            }
        } else if self.check(&[TokenKind::Tag])? {
            let token = self.next_token()?;
            start_mark = Some(token.start_mark.clone());
            tag_mark = Some(token.start_mark);
            end_mark = Some(token.end_mark);
            raw_tag = tag_parts(token.data);
            if self.check(&[TokenKind::Anchor])? {
                let token = self.next_token()?;
                end_mark = Some(token.end_mark);
                anchor = anchor_name(token.data);
            }
        }

        let tag = match raw_tag {
            Some((Some(handle), suffix)) => match self.tag_handles.get(&handle) {
                Some(prefix) => Some(format!("{prefix}{suffix}")),
                None => {
                    return Err(Error::new(
                        ErrorKind::Parser,
                        format!("found undefined tag handle {handle:?}"),
                    )
                    .with_context("while parsing a node", start_mark.unwrap_or_default())
                    .with_mark(tag_mark.unwrap_or_default()));
                }
            },
            Some((None, suffix)) => Some(suffix),
            None => None,
        };

        let (next_kind, next_start, next_end) = self.peek()?;
        let start_mark = start_mark.unwrap_or_else(|| next_start.clone());
        let end_mark = end_mark.unwrap_or_else(|| next_start.clone());
        let implicit = tag.is_none() || tag.as_deref() == Some("!");

        if indentless_sequence && next_kind == TokenKind::BlockEntry {
            self.state = Some(ParserState::IndentlessSequenceEntry);
            return Ok(Event::new(
                EventData::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    flow_style: Some(false),
                },
                start_mark,
                next_end,
            ));
        }

        match next_kind {
            TokenKind::Scalar => {
                let token = self.next_token()?;
                let TokenData::Scalar {
                    value,
                    plain,
                    style,
                } = token.data
                else {
                    unreachable!("checked scalar token");
                };
                let implicit = if (plain && tag.is_none()) || tag.as_deref() == Some("!") {
                    (true, false)
                } else if tag.is_none() {
                    (false, true)
                } else {
                    (false, false)
                };
                self.pop_state();
                Ok(Event::new(
                    EventData::Scalar {
                        anchor,
                        tag,
                        implicit,
                        value,
                        style: Some(style),
                    },
                    start_mark,
                    token.end_mark,
                ))
            }
            TokenKind::FlowSequenceStart => {
                self.state = Some(ParserState::FlowSequenceFirstEntry);
                Ok(Event::new(
                    EventData::SequenceStart {
                        anchor,
                        tag,
                        implicit,
                        flow_style: Some(true),
                    },
                    start_mark,
                    next_end,
                ))
            }
            TokenKind::FlowMappingStart => {
                self.state = Some(ParserState::FlowMappingFirstKey);
                Ok(Event::new(
                    EventData::MappingStart {
                        anchor,
                        tag,
                        implicit,
                        flow_style: Some(true),
                    },
                    start_mark,
                    next_end,
                ))
            }
            TokenKind::BlockSequenceStart if block => {
                self.state = Some(ParserState::BlockSequenceFirstEntry);
                Ok(Event::new(
                    EventData::SequenceStart {
                        anchor,
                        tag,
                        implicit,
                        flow_style: Some(false),
                    },
                    start_mark,
                    next_start,
                ))
            }
            TokenKind::BlockMappingStart if block => {
                self.state = Some(ParserState::BlockMappingFirstKey);
                Ok(Event::new(
                    EventData::MappingStart {
                        anchor,
                        tag,
                        implicit,
                        flow_style: Some(false),
                    },
                    start_mark,
                    next_start,
                ))
            }
            // An anchor or a tag alone stands for an empty scalar.
            _ if anchor.is_some() || tag.is_some() => {
                self.pop_state();
                Ok(Event::new(
                    EventData::Scalar {
                        anchor,
                        tag,
                        implicit: (implicit, false),
                        value: String::new(),
                        style: None,
                    },
                    start_mark,
                    end_mark,
                ))
            }
            _ => {
                let context = if block {
                    "while parsing a block node"
                } else {
                    "while parsing a flow node"
                };
                Err(Error::new(
                    ErrorKind::Parser,
                    format!("expected the node content, but found {next_kind}"),
                )
                .with_context(context, start_mark)
                .with_mark(next_start))
            }
        }
    }

    // ─── Block collections ───

    fn parse_block_sequence_first_entry(&mut self) -> Result<Event> {
        let token = self.next_token()?;
        self.marks.push(token.start_mark);
        self.parse_block_sequence_entry()
    }

    fn parse_block_sequence_entry(&mut self) -> Result<Event> {
        if self.check(&[TokenKind::BlockEntry])? {
            let token = self.next_token()?;
            if !self.check(&[TokenKind::BlockEntry, TokenKind::BlockEnd])? {
                self.states.push(ParserState::BlockSequenceEntry);
                return self.parse_node(true, false);
            }
            self.state = Some(ParserState::BlockSequenceEntry);
            return Ok(empty_scalar(token.end_mark));
        }
        let (kind, mark, _) = self.peek()?;
        if kind != TokenKind::BlockEnd {
            return Err(Error::new(
                ErrorKind::Parser,
                format!("expected <block end>, but found {kind}"),
            )
            .with_context("while parsing a block collection", self.last_mark())
            .with_mark(mark));
        }
        let token = self.next_token()?;
        self.pop_state();
        self.marks.pop();
        Ok(Event::new(
            EventData::SequenceEnd,
            token.start_mark,
            token.end_mark,
        ))
    }

    fn parse_indentless_sequence_entry(&mut self) -> Result<Event> {
        if self.check(&[TokenKind::BlockEntry])? {
            let token = self.next_token()?;
            if !self.check(&[
                TokenKind::BlockEntry,
                TokenKind::Key,
                TokenKind::Value,
                TokenKind::BlockEnd,
            ])? {
                self.states.push(ParserState::IndentlessSequenceEntry);
                return self.parse_node(true, false);
            }
            self.state = Some(ParserState::IndentlessSequenceEntry);
            return Ok(empty_scalar(token.end_mark));
        }
        let (_, mark, _) = self.peek()?;
        self.pop_state();
        Ok(Event::new(EventData::SequenceEnd, mark.clone(), mark))
    }

    fn parse_block_mapping_first_key(&mut self) -> Result<Event> {
        let token = self.next_token()?;
        self.marks.push(token.start_mark);
        self.parse_block_mapping_key()
    }

    fn parse_block_mapping_key(&mut self) -> Result<Event> {
        if self.check(&[TokenKind::Key])? {
            let token = self.next_token()?;
            if !self.check(&[TokenKind::Key, TokenKind::Value, TokenKind::BlockEnd])? {
                self.states.push(ParserState::BlockMappingValue);
                return self.parse_node(true, true);
            }
            self.state = Some(ParserState::BlockMappingValue);
            return Ok(empty_scalar(token.end_mark));
        }
        let (kind, mark, _) = self.peek()?;
        if kind != TokenKind::BlockEnd {
            return Err(Error::new(
                ErrorKind::Parser,
                format!("expected <block end>, but found {kind}"),
            )
            .with_context("while parsing a block mapping", self.last_mark())
            .with_mark(mark));
        }
        let token = self.next_token()?;
        self.pop_state();
        self.marks.pop();
        Ok(Event::new(
            EventData::MappingEnd,
            token.start_mark,
            token.end_mark,
        ))
    }

    fn parse_block_mapping_value(&mut self) -> Result<Event> {
        if self.check(&[TokenKind::Value])? {
            let token = self.next_token()?;
            if !self.check(&[TokenKind::Key, TokenKind::Value, TokenKind::BlockEnd])? {
                self.states.push(ParserState::BlockMappingKey);
                return self.parse_node(true, true);
            }
            self.state = Some(ParserState::BlockMappingKey);
            return Ok(empty_scalar(token.end_mark));
        }
        self.state = Some(ParserState::BlockMappingKey);
        let (_, mark, _) = self.peek()?;
        Ok(empty_scalar(mark))
    }

    // ─── Flow collections ───

    fn parse_flow_sequence_first_entry(&mut self) -> Result<Event> {
        let token = self.next_token()?;
        self.marks.push(token.start_mark);
        self.parse_flow_sequence_entry(true)
    }

    fn parse_flow_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if !self.check(&[TokenKind::FlowSequenceEnd])? {
            if !first {
                if self.check(&[TokenKind::FlowEntry])? {
                    self.next_token()?;
                } else {
                    let (kind, mark, _) = self.peek()?;
                    return Err(Error::new(
                        ErrorKind::Parser,
                        format!("expected ',' or ']', but got {kind}"),
                    )
                    .with_context("while parsing a flow sequence", self.last_mark())
                    .with_mark(mark));
                }
            }
            if self.check(&[TokenKind::Key])? {
                // `[a: b]` is a sequence holding a single-pair mapping.
                let (_, start, end) = self.peek()?;
                self.state = Some(ParserState::FlowSequenceEntryMappingKey);
                return Ok(Event::new(
                    EventData::MappingStart {
                        anchor: None,
                        tag: None,
                        implicit: true,
                        flow_style: Some(true),
                    },
                    start,
                    end,
                ));
            }
            if !self.check(&[TokenKind::FlowSequenceEnd])? {
                self.states.push(ParserState::FlowSequenceEntry);
                return self.parse_node(false, false);
            }
        }
        let token = self.next_token()?;
        self.pop_state();
        self.marks.pop();
        Ok(Event::new(
            EventData::SequenceEnd,
            token.start_mark,
            token.end_mark,
        ))
    }

    fn parse_flow_sequence_entry_mapping_key(&mut self) -> Result<Event> {
        let token = self.next_token()?;
        if !self.check(&[
            TokenKind::Value,
            TokenKind::FlowEntry,
            TokenKind::FlowSequenceEnd,
        ])? {
            self.states.push(ParserState::FlowSequenceEntryMappingValue);
            return self.parse_node(false, false);
        }
        self.state = Some(ParserState::FlowSequenceEntryMappingValue);
        Ok(empty_scalar(token.end_mark))
    }

    fn parse_flow_sequence_entry_mapping_value(&mut self) -> Result<Event> {
        if self.check(&[TokenKind::Value])? {
            let token = self.next_token()?;
            if !self.check(&[TokenKind::FlowEntry, TokenKind::FlowSequenceEnd])? {
                self.states.push(ParserState::FlowSequenceEntryMappingEnd);
                return self.parse_node(false, false);
            }
            self.state = Some(ParserState::FlowSequenceEntryMappingEnd);
            return Ok(empty_scalar(token.end_mark));
        }
        self.state = Some(ParserState::FlowSequenceEntryMappingEnd);
        let (_, mark, _) = self.peek()?;
        Ok(empty_scalar(mark))
    }

    fn parse_flow_sequence_entry_mapping_end(&mut self) -> Result<Event> {
        self.state = Some(ParserState::FlowSequenceEntry);
        let (_, mark, _) = self.peek()?;
        Ok(Event::new(EventData::MappingEnd, mark.clone(), mark))
    }

    fn parse_flow_mapping_first_key(&mut self) -> Result<Event> {
        let token = self.next_token()?;
        self.marks.push(token.start_mark);
        self.parse_flow_mapping_key(true)
    }

    fn parse_flow_mapping_key(&mut self, first: bool) -> Result<Event> {
        if !self.check(&[TokenKind::FlowMappingEnd])? {
            if !first {
                if self.check(&[TokenKind::FlowEntry])? {
                    self.next_token()?;
                } else {
                    let (kind, mark, _) = self.peek()?;
                    return Err(Error::new(
                        ErrorKind::Parser,
                        format!("expected ',' or '}}', but got {kind}"),
                    )
                    .with_context("while parsing a flow mapping", self.last_mark())
                    .with_mark(mark));
                }
            }
            if self.check(&[TokenKind::Key])? {
                let token = self.next_token()?;
                if !self.check(&[
                    TokenKind::Value,
                    TokenKind::FlowEntry,
                    TokenKind::FlowMappingEnd,
                ])? {
                    self.states.push(ParserState::FlowMappingValue);
                    return self.parse_node(false, false);
                }
                self.state = Some(ParserState::FlowMappingValue);
                return Ok(empty_scalar(token.end_mark));
            }
            if !self.check(&[TokenKind::FlowMappingEnd])? {
                self.states.push(ParserState::FlowMappingEmptyValue);
                return self.parse_node(false, false);
            }
        }
        let token = self.next_token()?;
        self.pop_state();
        self.marks.pop();
        Ok(Event::new(
            EventData::MappingEnd,
            token.start_mark,
            token.end_mark,
        ))
    }

    fn parse_flow_mapping_value(&mut self) -> Result<Event> {
        if self.check(&[TokenKind::Value])? {
            let token = self.next_token()?;
            if !self.check(&[TokenKind::FlowEntry, TokenKind::FlowMappingEnd])? {
                self.states.push(ParserState::FlowMappingKey);
                return self.parse_node(false, false);
            }
            self.state = Some(ParserState::FlowMappingKey);
            return Ok(empty_scalar(token.end_mark));
        }
        self.state = Some(ParserState::FlowMappingKey);
        let (_, mark, _) = self.peek()?;
        Ok(empty_scalar(mark))
    }

    fn parse_flow_mapping_empty_value(&mut self) -> Result<Event> {
        self.state = Some(ParserState::FlowMappingKey);
        let (_, mark, _) = self.peek()?;
        Ok(empty_scalar(mark))
    }
}

impl<S: TokenSource> EventSource for Parser<S> {
    fn check_event(&mut self, kinds: &[EventKind]) -> Result<bool> {
        self.fill()?;
        Ok(match &self.current_event {
            Some(event) => kinds.is_empty() || kinds.contains(&event.kind()),
            None => false,
        })
    }

    fn peek_event(&mut self) -> Result<Option<&Event>> {
        self.fill()?;
        Ok(self.current_event.as_ref())
    }

    fn get_event(&mut self) -> Result<Option<Event>> {
        self.fill()?;
        Ok(self.current_event.take())
    }
}

impl<S: TokenSource> Iterator for Parser<S> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.get_event() {
            Ok(event) => event.map(Ok),
            Err(err) => {
                self.state = None;
                Some(Err(err))
            }
        }
    }
}

fn default_tag_handles() -> HashMap<String, String> {
    DEFAULT_TAG_HANDLES
        .iter()
        .map(|(handle, prefix)| (handle.to_string(), prefix.to_string()))
        .collect()
}

fn empty_scalar(mark: Mark) -> Event {
    Event::new(
        EventData::Scalar {
            anchor: None,
            tag: None,
            implicit: (true, false),
            value: String::new(),
            style: None,
        },
        mark.clone(),
        mark,
    )
}

fn anchor_name(data: TokenData) -> Option<String> {
    match data {
        TokenData::Anchor(name) => Some(name),
        _ => None,
    }
}

fn tag_parts(data: TokenData) -> Option<(Option<String>, String)> {
    match data {
        TokenData::Tag { handle, suffix } => Some((handle, suffix)),
        _ => None,
    }
}
