//! Tag handlers
//!
//! Every open XML element is represented by one [`Element`] on the import
//! session's stack. An element knows which leaf tags it interprets, which it
//! deliberately ignores, and which child tags open a nested handler. The
//! behaviour specific to a component type lives in the `assembly`,
//! `component` and `finset` modules and is selected by [`ElementKind`].

use super::{assembly, component, finset};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, ErrorContext, Result};
use crate::model::{AttributeValue, HostDocument, ObjectHandle, ObjectKind};
use crate::units::{self, UnitConverter};

use super::ImportSummary;

/// Normalized form used for every tag comparison
pub(crate) fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Attributes of a start tag, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Create an empty attribute list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Value of the first attribute with this name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Everything a handler may touch while processing one event
pub struct Context<'a> {
    pub(crate) doc: &'a mut dyn HostDocument,
    pub(crate) diagnostics: &'a mut dyn Diagnostics,
    pub(crate) units: &'a dyn UnitConverter,
    pub(crate) strict_values: bool,
    pub(crate) summary: &'a mut ImportSummary,
    pub(crate) filename: &'a str,
    pub(crate) line: usize,
}

impl<'a> Context<'a> {
    /// Bundle the collaborators of an import
    pub fn new(
        doc: &'a mut dyn HostDocument,
        diagnostics: &'a mut dyn Diagnostics,
        units: &'a dyn UnitConverter,
        summary: &'a mut ImportSummary,
        filename: &'a str,
    ) -> Self {
        Self {
            doc,
            diagnostics,
            units,
            strict_values: false,
            summary,
            filename,
            line: 1,
        }
    }

    /// Move the reported location to `line`
    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    pub(crate) fn warn(&mut self, message: String) {
        let d = Diagnostic::warning(message, self.filename, self.line);
        self.summary.diagnostics += 1;
        self.diagnostics.report(d);
    }

    pub(crate) fn error(&mut self, message: String) {
        let d = Diagnostic::error(message, self.filename, self.line);
        self.summary.diagnostics += 1;
        self.diagnostics.report(d);
    }

    pub(crate) fn location(&self) -> ErrorContext {
        ErrorContext::new().file(self.filename).line(self.line)
    }
}

/// The closed set of tag handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Virtual root below the first XML element
    Document,
    /// `<openrocket>`
    OpenRocket,
    /// `<rocket>`
    Rocket,
    /// `<subcomponents>` directly under a rocket; holds stages
    Stages,
    /// `<subcomponents>` under a stage or component
    Subcomponents,
    /// `<stage>`
    Stage,
    /// `<nosecone>`
    NoseCone,
    /// `<transition>`
    Transition,
    /// `<bodytube>`
    BodyTube,
    /// `<innertube>`
    InnerTube,
    /// `<centeringring>`
    CenteringRing,
    /// `<bulkhead>`
    Bulkhead,
    /// `<launchlug>`
    LaunchLug,
    /// `<trapezoidfinset>`
    TrapezoidFinSet,
    /// `<ellipticalfinset>`
    EllipticalFinSet,
    /// `<tubefinset>`
    TubeFinSet,
    /// Absorbs an unrecognized subtree
    Null,
}

impl ElementKind {
    fn tag_sets(&self) -> TagSets {
        match self {
            ElementKind::Document => assembly::document_tags(),
            ElementKind::OpenRocket => assembly::openrocket_tags(),
            ElementKind::Rocket => assembly::rocket_tags(),
            ElementKind::Stages => assembly::stages_tags(),
            ElementKind::Subcomponents => assembly::subcomponents_tags(),
            ElementKind::Stage => assembly::stage_tags(),
            ElementKind::NoseCone => component::nose_cone_tags(),
            ElementKind::Transition => component::transition_tags(),
            ElementKind::BodyTube => component::body_tube_tags(),
            ElementKind::InnerTube => component::inner_tube_tags(),
            ElementKind::CenteringRing => component::centering_ring_tags(),
            ElementKind::Bulkhead => component::bulkhead_tags(),
            ElementKind::LaunchLug => component::launch_lug_tags(),
            ElementKind::TrapezoidFinSet => finset::trapezoid_tags(),
            ElementKind::EllipticalFinSet => finset::elliptical_tags(),
            ElementKind::TubeFinSet => finset::tube_tags(),
            ElementKind::Null => TagSets {
                known: &[],
                component: &[],
                extra: &[],
                children: Children::Any,
            },
        }
    }
}

/// Which child tags open a nested handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    /// Tag name to handler kind
    Table(&'static [(&'static str, ElementKind)]),
    /// Every child becomes a [`ElementKind::Null`] handler
    Any,
}

impl Children {
    fn lookup(&self, tag: &str) -> Option<ElementKind> {
        match self {
            Children::Table(table) => table
                .iter()
                .find(|(name, _)| *name == tag)
                .map(|(_, kind)| *kind),
            Children::Any => Some(ElementKind::Null),
        }
    }
}

/// Tag tables of one handler kind
pub(crate) struct TagSets {
    pub(crate) known: &'static [&'static str],
    /// Ignorable tags shared by a handler family
    pub(crate) component: &'static [&'static str],
    /// Ignorable tags of this handler only
    pub(crate) extra: &'static [&'static str],
    pub(crate) children: Children,
}

/// Handler bound to one open XML element
#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    tag: String,
    known_tags: &'static [&'static str],
    component_tags: &'static [&'static str],
    extra_tags: &'static [&'static str],
    children: Children,
    pub(crate) attributes: Attributes,
    pub(crate) object: Option<ObjectHandle>,
    pub(crate) parent_object: Option<ObjectHandle>,
}

impl Element {
    /// Create the handler for `tag` and let it create its host object
    pub fn new(
        kind: ElementKind,
        tag: &str,
        attributes: Attributes,
        parent_object: Option<ObjectHandle>,
        ctx: &mut Context<'_>,
    ) -> Result<Self> {
        let mut element = Self::bare(kind, tag, attributes, parent_object);
        element.make_object(ctx)?;
        Ok(element)
    }

    /// The virtual root that accepts the document element
    pub fn document() -> Self {
        Self::bare(ElementKind::Document, "document", Attributes::new(), None)
    }

    fn bare(
        kind: ElementKind,
        tag: &str,
        attributes: Attributes,
        parent_object: Option<ObjectHandle>,
    ) -> Self {
        let sets = kind.tag_sets();
        Self {
            kind,
            tag: tag.to_string(),
            known_tags: sets.known,
            component_tags: sets.component,
            extra_tags: sets.extra,
            children: sets.children,
            attributes,
            object: None,
            parent_object,
        }
    }

    /// Handler kind
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Tag as it appeared in the document
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Host object created by this handler
    pub fn object(&self) -> Option<ObjectHandle> {
        self.object
    }

    /// Object new children are attached to: our own, else the inherited one
    pub fn inherited_object(&self) -> Option<ObjectHandle> {
        self.object.or(self.parent_object)
    }

    fn make_object(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        match self.kind {
            ElementKind::Document
            | ElementKind::Stages
            | ElementKind::Subcomponents
            | ElementKind::Null => Ok(()),
            ElementKind::OpenRocket => {
                assembly::record_format(self, ctx);
                Ok(())
            }
            ElementKind::Rocket => self.create_object(ObjectKind::Rocket, ctx),
            ElementKind::Stage => self.create_object(ObjectKind::Stage, ctx),
            ElementKind::NoseCone => self.create_object(ObjectKind::NoseCone, ctx),
            ElementKind::Transition => self.create_object(ObjectKind::Transition, ctx),
            ElementKind::BodyTube => self.create_object(ObjectKind::BodyTube, ctx),
            ElementKind::InnerTube => self.create_object(ObjectKind::InnerTube, ctx),
            ElementKind::CenteringRing => self.create_object(ObjectKind::CenteringRing, ctx),
            ElementKind::Bulkhead => self.create_object(ObjectKind::Bulkhead, ctx),
            ElementKind::LaunchLug => self.create_object(ObjectKind::LaunchLug, ctx),
            ElementKind::TrapezoidFinSet
            | ElementKind::EllipticalFinSet
            | ElementKind::TubeFinSet => finset::make_fin(self, ctx),
        }
    }

    /// Create a host object and register it under the parent object
    pub(crate) fn create_object(&mut self, kind: ObjectKind, ctx: &mut Context<'_>) -> Result<()> {
        let handle = ctx.doc.create_object(kind)?;
        self.object = Some(handle);
        ctx.summary.objects.push(handle);

        if let Some(parent) = self.parent_object {
            ctx.doc.add_child(parent, handle)?;
        }
        log::debug!("Created {} {} for <{}>", kind.name(), handle, self.tag);
        Ok(())
    }

    /// Whether `tag` opens a nested handler
    pub fn is_child_element(&self, tag: &str) -> bool {
        self.children.lookup(&normalize(tag)).is_some()
    }

    /// Whether `tag` is the tag this handler was opened for
    pub fn is_tag(&self, tag: &str) -> bool {
        normalize(tag) == normalize(&self.tag)
    }

    /// Whether `tag` is a leaf tag interpreted by this handler
    pub fn is_known_tag(&self, tag: &str) -> bool {
        self.known_tags.contains(&normalize(tag).as_str())
    }

    /// Whether `tag` is acknowledged but intentionally not consumed
    pub fn is_component_tag(&self, tag: &str) -> bool {
        let name = normalize(tag);
        self.component_tags.contains(&name.as_str()) || self.extra_tags.contains(&name.as_str())
    }

    /// A leaf tag opened directly under this element
    ///
    /// Returns whether the tag was reported as unknown.
    pub fn handle_tag(&self, tag: &str, _attributes: &Attributes, ctx: &mut Context<'_>) -> bool {
        if self.kind == ElementKind::Null || self.is_known_tag(tag) || self.is_component_tag(tag) {
            return false;
        }
        ctx.warn(format!("Unknown tag {} in {}", tag, self.tag));
        true
    }

    /// A leaf tag closed with its accumulated text
    ///
    /// An unknown tag is reported on every call. Use
    /// [`close_leaf`](Self::close_leaf) to pair it with a preceding
    /// [`handle_tag`](Self::handle_tag).
    pub fn handle_end_tag(&mut self, tag: &str, content: &str, ctx: &mut Context<'_>) -> Result<()> {
        self.end_tag(tag, content, true, ctx)
    }

    /// Close a leaf whose start tag went through [`handle_tag`](Self::handle_tag)
    ///
    /// `reported` is what `handle_tag` returned; an unknown leaf is not
    /// reported a second time.
    pub fn close_leaf(
        &mut self,
        tag: &str,
        content: &str,
        reported: bool,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        self.end_tag(tag, content, !reported, ctx)
    }

    fn end_tag(
        &mut self,
        tag: &str,
        content: &str,
        report_unknown: bool,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        let name = normalize(tag);
        let consumed = match self.kind {
            ElementKind::Null => return Ok(()),
            ElementKind::Document | ElementKind::Stages | ElementKind::Subcomponents => false,
            ElementKind::OpenRocket => false,
            ElementKind::Rocket | ElementKind::Stage => {
                assembly::end_tag(self, &name, content, ctx)?
            }
            ElementKind::NoseCone => component::nose_cone_end_tag(self, &name, content, ctx)?,
            ElementKind::Transition => component::transition_end_tag(self, &name, content, ctx)?,
            ElementKind::BodyTube => component::body_tube_end_tag(self, &name, content, ctx)?,
            ElementKind::InnerTube => component::inner_tube_end_tag(self, &name, content, ctx)?,
            ElementKind::CenteringRing => {
                component::centering_ring_end_tag(self, &name, content, ctx)?
            }
            ElementKind::Bulkhead => component::bulkhead_end_tag(self, &name, content, ctx)?,
            ElementKind::LaunchLug => component::launch_lug_end_tag(self, &name, content, ctx)?,
            ElementKind::TrapezoidFinSet => finset::trapezoid_end_tag(self, &name, content, ctx)?,
            ElementKind::EllipticalFinSet => {
                finset::elliptical_end_tag(self, &name, content, ctx)?
            }
            ElementKind::TubeFinSet => finset::tube_end_tag(self, &name, content, ctx)?,
        };

        if report_unknown && !consumed && !self.is_known_tag(tag) && !self.is_component_tag(tag) {
            ctx.warn(format!("Unknown tag /{} in {}", tag, self.tag));
        }
        Ok(())
    }

    /// Open the handler for a child element
    ///
    /// Returns `None` after reporting an error when `tag` has no registered
    /// handler; the caller pushes a [`ElementKind::Null`] handler instead.
    pub fn create_child(
        &self,
        tag: &str,
        attributes: Attributes,
        ctx: &mut Context<'_>,
    ) -> Result<Option<Element>> {
        let Some(kind) = self.children.lookup(&normalize(tag)) else {
            ctx.error(format!("Invalid element {}", tag));
            return Ok(None);
        };
        Element::new(kind, tag, attributes, self.inherited_object(), ctx).map(Some)
    }

    /// Finish the element after all of its children were consumed
    pub fn end(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        match self.kind {
            ElementKind::NoseCone => component::nose_cone_end(self, ctx),
            ElementKind::Transition => component::transition_end(self, ctx),
            ElementKind::BodyTube => component::body_tube_end(self, ctx),
            ElementKind::TrapezoidFinSet => finset::trapezoid_end(self, ctx),
            _ => Ok(()),
        }
    }

    pub(crate) fn set(
        &self,
        ctx: &mut Context<'_>,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        match self.object {
            Some(handle) => ctx.doc.set_attribute(handle, name, value.into()),
            None => Ok(()),
        }
    }

    pub(crate) fn get_f64(&self, ctx: &Context<'_>, name: &str) -> Option<f64> {
        self.object
            .and_then(|handle| ctx.doc.attribute(handle, name))
            .and_then(|value| value.as_f64())
    }

    pub(crate) fn get_bool(&self, ctx: &Context<'_>, name: &str) -> Option<bool> {
        self.object
            .and_then(|handle| ctx.doc.attribute(handle, name))
            .and_then(|value| value.as_bool())
    }

    /// Convert a length, failing the import on bad content
    pub(crate) fn length(&self, ctx: &Context<'_>, tag: &str, content: &str) -> Result<f64> {
        units::length(ctx.units, content).map_err(|_| {
            Error::parse_error_with_context(tag, content, "length in meters")
                .at(&ctx.location().hint("Lengths are plain numbers in meters, e.g. 0.025"))
        })
    }

    /// Convert an angle, failing the import on bad content
    pub(crate) fn angle(&self, ctx: &Context<'_>, tag: &str, content: &str) -> Result<f64> {
        units::angle(ctx.units, content).map_err(|_| {
            Error::parse_error_with_context(tag, content, "angle in degrees")
                .at(&ctx.location().hint("Angles are plain numbers in degrees, e.g. 2.5"))
        })
    }

    /// Run a conversion whose failure keeps the previous value
    ///
    /// On failure a warning is reported and `Ok(None)` returned, unless the
    /// import runs with strict values.
    pub(crate) fn guarded<T>(
        &self,
        ctx: &mut Context<'_>,
        tag: &str,
        content: &str,
        convert: impl FnOnce(&Self, &Context<'_>) -> Result<T>,
    ) -> Result<Option<T>> {
        match convert(self, ctx) {
            Ok(value) => Ok(Some(value)),
            Err(err) if ctx.strict_values => Err(err),
            Err(_) => {
                ctx.warn(format!(
                    "Invalid value '{}' for {} in {}, keeping previous value",
                    content, tag, self.tag
                ));
                Ok(None)
            }
        }
    }

    /// Assign `2 * radius`, or the auto flag when the content is `auto`
    ///
    /// The auto flag is cleared whenever a numeric radius is assigned.
    pub(crate) fn set_radius(
        &self,
        ctx: &mut Context<'_>,
        tag: &str,
        content: &str,
        diameter: &str,
        auto: Option<&str>,
        guard: bool,
    ) -> Result<()> {
        if let Some(auto) = auto {
            if content == "auto" {
                return self.set(ctx, auto, true);
            }
        }

        let radius = if guard {
            match self.guarded(ctx, tag, content, |el, ctx| el.length(ctx, tag, content))? {
                Some(radius) => radius,
                None => return Ok(()),
            }
        } else {
            self.length(ctx, tag, content)?
        };

        if let Some(auto) = auto {
            self.set(ctx, auto, false)?;
        }
        self.set(ctx, diameter, 2.0 * radius)
    }

    /// Assign a length attribute, keeping the previous value on bad content
    pub(crate) fn set_length_guarded(
        &self,
        ctx: &mut Context<'_>,
        tag: &str,
        content: &str,
        name: &str,
    ) -> Result<()> {
        if let Some(value) = self.guarded(ctx, tag, content, |el, ctx| el.length(ctx, tag, content))? {
            self.set(ctx, name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLog;
    use crate::model::MemoryDocument;
    use crate::units::SiUnits;

    struct Fixture {
        doc: MemoryDocument,
        log: DiagnosticLog,
        summary: ImportSummary,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                doc: MemoryDocument::new(),
                log: DiagnosticLog::new(),
                summary: ImportSummary::default(),
            }
        }

        fn ctx(&mut self) -> Context<'_> {
            Context::new(
                &mut self.doc,
                &mut self.log,
                &SiUnits,
                &mut self.summary,
                "test.ork",
            )
        }
    }

    #[test]
    fn test_is_tag_ignores_case_and_whitespace() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let el = Element::new(
            ElementKind::Null,
            "rootchord",
            Attributes::new(),
            None,
            &mut ctx,
        )
        .unwrap();
        assert!(el.is_tag("  ROOTCHORD "));
        assert!(el.is_tag("rootchord"));
        assert!(!el.is_tag("tipchord"));
    }

    #[test]
    fn test_is_child_element_ignores_case_and_whitespace() {
        let root = Element::document();
        assert!(root.is_child_element("openrocket"));
        assert!(root.is_child_element("  OpenRocket\t"));
        assert!(!root.is_child_element("rocket"));
    }

    #[test]
    fn test_create_child_unknown_tag_reports_one_error() {
        let mut fx = Fixture::new();
        let doc_el = Element::document();
        let child = doc_el
            .create_child("spaceship", Attributes::new(), &mut fx.ctx())
            .unwrap();
        assert!(child.is_none());
        assert_eq!(fx.log.errors().count(), 1);
        assert_eq!(fx.log.warnings().count(), 0);
        assert!(fx.log.entries()[0].message.contains("Invalid element spaceship"));
    }

    #[test]
    fn test_create_child_inherits_parent_object() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let stage =
            Element::new(ElementKind::Stage, "stage", Attributes::new(), None, &mut ctx).unwrap();
        let subs = stage
            .create_child("subcomponents", Attributes::new(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(subs.object(), None);
        assert_eq!(subs.inherited_object(), stage.object());

        let tube = subs
            .create_child("BodyTube", Attributes::new(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(tube.kind(), ElementKind::BodyTube);
        let stage_obj = stage.object().unwrap();
        let tube_obj = tube.object().unwrap();
        assert_eq!(fx.doc.object(stage_obj).unwrap().children, vec![tube_obj]);
    }

    #[test]
    fn test_null_element_is_silent() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let mut null =
            Element::new(ElementKind::Null, "gizmo", Attributes::new(), None, &mut ctx).unwrap();
        assert!(null.is_child_element("anything"));
        null.handle_tag("whatever", &Attributes::new(), &mut ctx);
        null.handle_end_tag("whatever", "1.0", &mut ctx).unwrap();
        let nested = null
            .create_child("deeper", Attributes::new(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(nested.kind(), ElementKind::Null);
        assert!(fx.log.is_empty());
        assert!(fx.doc.is_empty());
    }

    #[test]
    fn test_unknown_leaf_reports_once_per_call() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let mut tube =
            Element::new(ElementKind::BodyTube, "bodytube", Attributes::new(), None, &mut ctx)
                .unwrap();
        tube.handle_tag("wobble", &Attributes::new(), &mut ctx);
        tube.handle_end_tag("wobble", "3", &mut ctx).unwrap();
        // component tags stay silent
        tube.handle_tag("finish", &Attributes::new(), &mut ctx);
        tube.handle_end_tag("finish", "smooth", &mut ctx).unwrap();

        assert_eq!(fx.log.warnings().count(), 2);
        assert_eq!(fx.log.entries()[0].message, "Unknown tag wobble in bodytube");
        assert_eq!(fx.log.entries()[1].message, "Unknown tag /wobble in bodytube");
    }

    #[test]
    fn test_close_leaf_reports_unknown_once() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let mut tube =
            Element::new(ElementKind::BodyTube, "bodytube", Attributes::new(), None, &mut ctx)
                .unwrap();
        let reported = tube.handle_tag("wobble", &Attributes::new(), &mut ctx);
        assert!(reported);
        tube.close_leaf("wobble", "3", reported, &mut ctx).unwrap();

        let reported = tube.handle_tag("length", &Attributes::new(), &mut ctx);
        assert!(!reported);
        tube.close_leaf("length", "0.3", reported, &mut ctx).unwrap();

        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log.entries()[0].message, "Unknown tag wobble in bodytube");
        let handle = tube.object().unwrap();
        assert_eq!(fx.doc.object(handle).unwrap().get_f64(crate::model::attr::LENGTH), Some(0.3));
    }

    #[test]
    fn test_attributes_lookup() {
        let attrs: Attributes = [("Version", "1.4"), ("creator", "OpenRocket")]
            .into_iter()
            .collect();
        assert_eq!(attrs.get("version"), Some("1.4"));
        assert_eq!(attrs.get("CREATOR"), Some("OpenRocket"));
        assert_eq!(attrs.get("missing"), None);
        assert_eq!(attrs.len(), 2);
    }
}
