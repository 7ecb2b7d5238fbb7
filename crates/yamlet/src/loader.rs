//! Text to native values.

use std::cell::RefCell;

use tracing::debug;
use yamlet_parse::Parser;
use yamlet_tree::{Composer, NodeGraph, NodeSource, Resolver};
use yamlet_value::{Constructor, Document, Error, ErrorKind, Result};

/// The load pipeline: parser, composer with its resolver, and constructor.
///
/// Each call builds a fresh parser and composer over the given text. The
/// constructor is shared between calls, so a constructor function that tries
/// to load through the same loader while it is running gets an error.
#[derive(Debug, Default)]
pub struct Loader {
    resolver: Resolver,
    constructor: RefCell<Constructor>,
}

impl Loader {
    /// A loader with the default implicit resolvers and the safe constructors.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(resolver: Resolver, constructor: Constructor) -> Self {
        Self {
            resolver,
            constructor: RefCell::new(constructor),
        }
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    pub fn constructor_mut(&mut self) -> &mut Constructor {
        self.constructor.get_mut()
    }

    fn composer(&self, text: &str) -> Result<Composer<Parser>> {
        Ok(Composer::new(Parser::from_source(text)?, self.resolver.clone()))
    }

    /// The node graph of the only document in `text`.
    pub fn compose(&self, text: &str) -> Result<Option<NodeGraph>> {
        self.composer(text)?.get_single_node()
    }

    /// The node graphs of every document in `text`.
    pub fn compose_all(&self, text: &str) -> Result<Vec<NodeGraph>> {
        self.composer(text)?.compose_to_vec()
    }

    /// The only document in `text`, or `None` for an empty stream.
    pub fn load(&self, text: &str) -> Result<Option<Document>> {
        debug!(len = text.len(), "load");
        let mut constructor = self.constructor_in_use()?;
        let mut composer = self.composer(text)?;
        constructor.get_single_data(&mut composer)
    }

    /// Every document in `text`.
    pub fn load_all(&self, text: &str) -> Result<Vec<Document>> {
        debug!(len = text.len(), "load_all");
        let mut constructor = self.constructor_in_use()?;
        let mut composer = self.composer(text)?;
        let mut documents = Vec::new();
        while constructor.check_data(&mut composer)? {
            match constructor.get_data(&mut composer)? {
                Some(document) => documents.push(document),
                None => break,
            }
        }
        Ok(documents)
    }

    fn constructor_in_use(&self) -> Result<std::cell::RefMut<'_, Constructor>> {
        self.constructor
            .try_borrow_mut()
            .map_err(|_| Error::new(ErrorKind::Constructor, "loader is already in use"))
    }
}
