//! Design file import
//!
//! An [`ImportSession`] receives start tag, text and end tag events and keeps
//! one [`Element`] handler per open XML element on an explicit stack. The
//! active handler (top of the stack) decides whether a start tag opens a
//! nested handler or is a leaf whose text it interprets when it closes.
//!
//! [`import_str`] drives a session from a `quick-xml` event loop, tracking
//! the line of every event for diagnostics and error locations.

mod assembly;
mod component;
pub mod element;
mod finset;

pub use element::{Attributes, Children, Element, ElementKind};

use crate::archive;
use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::error::{Error, ErrorContext, Result};
use crate::model::{HostDocument, ObjectHandle};
use crate::units::{SiUnits, UnitConverter};
use element::{Context, normalize};
use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

/// Default limit on element nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Import configuration
///
/// # Example
///
/// ```
/// use rocket_ork::importer::ImportConfig;
///
/// let config = ImportConfig::new()
///     .with_max_depth(64)
///     .with_strict_values(true);
/// assert_eq!(config.max_depth(), 64);
/// ```
#[derive(Clone)]
pub struct ImportConfig {
    units: Arc<dyn UnitConverter>,
    max_depth: usize,
    strict_values: bool,
}

impl ImportConfig {
    /// SI units, default nesting limit, lenient value conversion
    pub fn new() -> Self {
        Self {
            units: Arc::new(SiUnits),
            max_depth: DEFAULT_MAX_DEPTH,
            strict_values: false,
        }
    }

    /// Use a host-provided unit converter
    pub fn with_units(mut self, units: Arc<dyn UnitConverter>) -> Self {
        self.units = units;
        self
    }

    /// Fail the import when elements nest deeper than `depth`
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Make conversions that normally keep the previous value fail instead
    pub fn with_strict_values(mut self, strict: bool) -> Self {
        self.strict_values = strict;
        self
    }

    /// The configured unit converter
    pub fn units(&self) -> &dyn UnitConverter {
        self.units.as_ref()
    }

    /// Nesting limit
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether guarded conversions propagate their failure
    pub fn strict_values(&self) -> bool {
        self.strict_values
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("max_depth", &self.max_depth)
            .field("strict_values", &self.strict_values)
            .finish_non_exhaustive()
    }
}

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// `version` attribute of the `<openrocket>` element
    pub format_version: Option<String>,
    /// `creator` attribute of the `<openrocket>` element
    pub creator: Option<String>,
    /// Host objects created, in document order
    pub objects: Vec<ObjectHandle>,
    /// Diagnostics reported during the import
    pub diagnostics: usize,
    /// Elements still open when the input ended
    pub unclosed_elements: usize,
}

/// Open handlers above the virtual document root
struct Frames {
    root: Element,
    open: Vec<Element>,
}

impl Frames {
    fn top(&self) -> &Element {
        self.open.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut Element {
        match self.open.last_mut() {
            Some(element) => element,
            None => &mut self.root,
        }
    }
}

/// Leaf start tag waiting for its end tag
struct OpenLeaf {
    tag: String,
    /// `handle_tag` already reported it as unknown
    reported: bool,
}

/// State of one design file import
///
/// The session is the only writer to `doc` while it lives. Events are fed
/// through [`start_element`](Self::start_element),
/// [`characters`](Self::characters) and [`end_element`](Self::end_element);
/// [`finish`](Self::finish) returns the summary.
pub struct ImportSession<'a> {
    doc: &'a mut dyn HostDocument,
    diagnostics: &'a mut dyn Diagnostics,
    config: ImportConfig,
    filename: String,
    line: usize,
    frames: Frames,
    leaf: Option<OpenLeaf>,
    content: String,
    summary: ImportSummary,
}

impl<'a> ImportSession<'a> {
    /// Start an import of `filename` into `doc`
    pub fn new(
        filename: &str,
        doc: &'a mut dyn HostDocument,
        diagnostics: &'a mut dyn Diagnostics,
        config: ImportConfig,
    ) -> Self {
        Self {
            doc,
            diagnostics,
            config,
            filename: filename.to_string(),
            line: 1,
            frames: Frames {
                root: Element::document(),
                open: Vec::new(),
            },
            leaf: None,
            content: String::new(),
            summary: ImportSummary::default(),
        }
    }

    /// Line reported for the next event
    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    /// Current line
    pub fn line(&self) -> usize {
        self.line
    }

    /// The handler receiving events
    pub fn active(&self) -> &Element {
        self.frames.top()
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.frames.open.len()
    }

    fn location(&self) -> ErrorContext {
        ErrorContext::new().file(&self.filename).line(self.line)
    }

    fn dispatch<T>(
        &mut self,
        f: impl FnOnce(&mut Frames, &mut Context<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut ctx = Context {
            doc: &mut *self.doc,
            diagnostics: &mut *self.diagnostics,
            units: self.config.units.as_ref(),
            strict_values: self.config.strict_values,
            summary: &mut self.summary,
            filename: &self.filename,
            line: self.line,
        };
        f(&mut self.frames, &mut ctx)
    }

    /// A start tag
    pub fn start_element(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        let tag = local_name(name);
        self.content.clear();
        let pending = self.leaf.take();

        // A pending leaf turns into a null frame that takes every child
        let pushes = match pending {
            Some(_) => 2,
            None => usize::from(self.frames.top().is_child_element(tag)),
        };
        if pushes > 0 && self.frames.open.len() + pushes > self.config.max_depth {
            return Err(Error::invalid_xml_element(
                tag,
                &format!("nesting exceeds {} elements", self.config.max_depth),
            )
            .at(&self.location()));
        }

        let reported = self.dispatch(|frames, ctx| {
            // A leaf with children becomes an unknown subtree
            if let Some(pending) = pending {
                let parent = frames.top().inherited_object();
                let sink =
                    Element::new(ElementKind::Null, &pending.tag, Attributes::new(), parent, ctx)?;
                frames.open.push(sink);
            }

            let top = frames.top();
            if !top.is_child_element(tag) {
                return Ok(Some(top.handle_tag(tag, &attributes, ctx)));
            }

            let parent = top.inherited_object();
            let child = match top.create_child(tag, attributes, ctx)? {
                Some(child) => child,
                None => Element::new(ElementKind::Null, tag, Attributes::new(), parent, ctx)?,
            };
            log::debug!("{}:{}: push <{}> as {:?}", ctx.filename, ctx.line, tag, child.kind());
            frames.open.push(child);
            Ok(None)
        })?;

        if let Some(reported) = reported {
            self.leaf = Some(OpenLeaf {
                tag: tag.to_string(),
                reported,
            });
        }
        Ok(())
    }

    /// Text between tags
    pub fn characters(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// An end tag
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        let tag = local_name(name);
        let content = std::mem::take(&mut self.content);
        let leaf = self
            .leaf
            .take()
            .filter(|leaf| normalize(&leaf.tag) == normalize(tag));

        self.dispatch(|frames, ctx| {
            if let Some(leaf) = leaf {
                return frames
                    .top_mut()
                    .close_leaf(tag, content.trim(), leaf.reported, ctx);
            }

            if frames.top().is_tag(tag) {
                if let Some(mut element) = frames.open.pop() {
                    element.end(ctx)?;
                    log::debug!("{}:{}: pop <{}>", ctx.filename, ctx.line, element.tag());
                    return Ok(());
                }
            }
            frames.top_mut().handle_end_tag(tag, content.trim(), ctx)
        })
    }

    /// Close the session
    ///
    /// Elements still open are left as they are; their host objects stay in
    /// the document without end-of-element finalization.
    pub fn finish(mut self) -> ImportSummary {
        self.summary.unclosed_elements = self.frames.open.len();
        if self.summary.unclosed_elements > 0 {
            log::warn!(
                "{}: input ended with {} open elements",
                self.filename,
                self.summary.unclosed_elements
            );
        }
        log::info!(
            "Imported {}: {} objects, {} diagnostics",
            self.filename,
            self.summary.objects.len(),
            self.summary.diagnostics
        );
        self.summary
    }
}

/// Strip a namespace prefix (`or:rocket` → `rocket`)
fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Line numbers for byte offsets, counted forward as the reader advances
struct LineCounter<'x> {
    bytes: &'x [u8],
    offset: usize,
    line: usize,
}

impl<'x> LineCounter<'x> {
    fn new(text: &'x str) -> Self {
        Self {
            bytes: text.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, position: usize) -> usize {
        let end = position.min(self.bytes.len());
        if end > self.offset {
            let newlines = self.bytes[self.offset..end]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line += newlines;
            self.offset = end;
        }
        self.line
    }
}

fn start_tag(e: &BytesStart<'_>) -> Result<(String, Attributes)> {
    let name = e.name();
    let name = std::str::from_utf8(name.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;

    let mut attributes = Attributes::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        attributes.push(local_name(key), value);
    }
    Ok((name.to_string(), attributes))
}

fn resolve_reference(e: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = e
        .resolve_char_ref()
        .map_err(|e| Error::InvalidXml(e.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = e.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidXml(format!("Unknown entity reference &{};", name)))
}

fn reject_dtd(xml: &str) -> Result<()> {
    let check_len = xml.len().min(2000);
    let head = xml.as_bytes()[..check_len].to_ascii_lowercase();
    if head.windows(9).any(|w| w == b"<!doctype") {
        return Err(Error::InvalidXml(
            "DTD declarations are not allowed in design files".to_string(),
        ));
    }
    Ok(())
}

/// Import a design held as XML text
///
/// # Example
///
/// ```
/// use rocket_ork::diagnostics::DiagnosticLog;
/// use rocket_ork::importer::{import_str, ImportConfig};
/// use rocket_ork::model::{MemoryDocument, ObjectKind};
///
/// let xml = r#"<openrocket version="1.9" creator="OpenRocket 23.09">
///   <rocket><name>Alpha</name><subcomponents><stage><subcomponents>
///     <bodytube><length>0.3</length><radius>0.0125</radius></bodytube>
///   </subcomponents></stage></subcomponents></rocket>
/// </openrocket>"#;
///
/// let mut doc = MemoryDocument::new();
/// let mut log = DiagnosticLog::new();
/// let summary = import_str(xml, "alpha.ork", &mut doc, &mut log, &ImportConfig::new())?;
///
/// assert_eq!(summary.format_version.as_deref(), Some("1.9"));
/// assert_eq!(doc.objects_of_kind(ObjectKind::BodyTube).len(), 1);
/// assert!(log.is_empty());
/// # Ok::<(), rocket_ork::Error>(())
/// ```
pub fn import_str(
    xml: &str,
    filename: &str,
    doc: &mut dyn HostDocument,
    diagnostics: &mut dyn Diagnostics,
    config: &ImportConfig,
) -> Result<ImportSummary> {
    reject_dtd(xml)?;

    let mut session = ImportSession::new(filename, doc, diagnostics, config.clone());
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut lines = LineCounter::new(xml);

    loop {
        let position = reader.buffer_position() as usize;
        session.set_line(lines.line_at(position));

        match reader.read_event_into(&mut buf) {
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in design files".to_string(),
                )
                .at(&session.location()));
            }
            Ok(Event::Start(ref e)) => {
                let (name, attributes) = start_tag(e)?;
                session.start_element(&name, attributes)?;
            }
            Ok(Event::Empty(ref e)) => {
                let (name, attributes) = start_tag(e)?;
                session.start_element(&name, attributes)?;
                session.end_element(&name)?;
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                session.end_element(name)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                session.characters(&text);
            }
            Ok(Event::CData(ref e)) => {
                let text =
                    std::str::from_utf8(e).map_err(|e| Error::InvalidXml(e.to_string()))?;
                session.characters(text);
            }
            Ok(Event::GeneralRef(ref e)) => {
                session.characters(&resolve_reference(e)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(session.finish())
}

/// Import a design file in any supported container
pub fn import_reader<R: Read + Seek>(
    reader: R,
    filename: &str,
    doc: &mut dyn HostDocument,
    diagnostics: &mut dyn Diagnostics,
    config: &ImportConfig,
) -> Result<ImportSummary> {
    let xml = archive::open_design(reader)?;
    import_str(&xml, filename, doc, diagnostics, config)
}

/// Import a design file from disk, reporting diagnostics through `log`
pub fn import_file<P: AsRef<Path>>(
    path: P,
    doc: &mut dyn HostDocument,
    config: &ImportConfig,
) -> Result<ImportSummary> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let filename = path.display().to_string();
    import_reader(file, &filename, doc, &mut LogDiagnostics, config)
}
