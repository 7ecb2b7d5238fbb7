//! Output configuration shared by the serializer, emitter and representer.

use yamlet_tree::ScalarStyle;

/// Line terminator written by the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreak {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl LineBreak {
    pub fn as_str(self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::Cr => "\r",
            LineBreak::CrLf => "\r\n",
        }
    }
}

/// Options for dumping and emitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Fully explicit output: every tag written, every collection in flow
    /// style, every scalar double quoted (default: false)
    pub canonical: bool,

    /// Write printable non-ASCII characters as-is instead of escaping them
    /// (default: true)
    pub allow_unicode: bool,

    /// Spaces per indentation level. Values outside 2..=9 fall back to 2.
    pub indent: usize,

    /// Preferred line width. Values not above twice the indent fall back to 80.
    pub width: usize,

    pub line_break: LineBreak,

    /// Always write `---` before a document (default: false)
    pub explicit_start: bool,

    /// Always write `...` after a document (default: false)
    pub explicit_end: bool,

    /// `%YAML` directive for every document.
    pub version: Option<(u32, u32)>,

    /// `%TAG` directives for every document, as `(handle, prefix)`.
    pub tags: Option<Vec<(String, String)>>,

    /// Scalar style when the representer does not pick one.
    pub default_style: Option<ScalarStyle>,

    /// Collection layout when the representer does not pick one. `None`
    /// means flow for collections of plain scalars and block otherwise.
    pub default_flow_style: Option<bool>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            canonical: false,
            allow_unicode: true,
            indent: 2,
            width: 80,
            line_break: LineBreak::Lf,
            explicit_start: false,
            explicit_end: false,
            version: None,
            tags: None,
            default_style: None,
            default_flow_style: None,
        }
    }
}

impl EmitOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonical(mut self, canonical: bool) -> Self {
        self.canonical = canonical;
        self
    }

    pub fn allow_unicode(mut self, allow_unicode: bool) -> Self {
        self.allow_unicode = allow_unicode;
        self
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn line_break(mut self, line_break: LineBreak) -> Self {
        self.line_break = line_break;
        self
    }

    pub fn explicit_start(mut self, explicit_start: bool) -> Self {
        self.explicit_start = explicit_start;
        self
    }

    pub fn explicit_end(mut self, explicit_end: bool) -> Self {
        self.explicit_end = explicit_end;
        self
    }

    pub fn version(mut self, major: u32, minor: u32) -> Self {
        self.version = Some((major, minor));
        self
    }

    /// Add a `%TAG` directive.
    pub fn tag(mut self, handle: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(Vec::new)
            .push((handle.into(), prefix.into()));
        self
    }

    pub fn default_style(mut self, style: ScalarStyle) -> Self {
        self.default_style = Some(style);
        self
    }

    pub fn default_flow_style(mut self, flow_style: bool) -> Self {
        self.default_flow_style = Some(flow_style);
        self
    }

    /// Indentation the emitter actually uses.
    pub fn effective_indent(&self) -> usize {
        if (2..=9).contains(&self.indent) {
            self.indent
        } else {
            2
        }
    }

    /// Line width the emitter actually uses.
    pub fn effective_width(&self) -> usize {
        if self.width > self.effective_indent() * 2 {
            self.width
        } else {
            80
        }
    }
}
