//! Airframe component handlers
//!
//! Nose cones, transitions, tubes, rings, bulkheads and launch lugs. All
//! length conversions here are guarded: bad content is reported and the
//! attribute keeps its previous value.

use super::element::{Children, Context, Element, ElementKind, TagSets};
use crate::error::Result;
use crate::model::{ShapeType, attr};

/// Components that may appear in a `<subcomponents>` list
pub(crate) const COMPONENTS: &[(&str, ElementKind)] = &[
    ("nosecone", ElementKind::NoseCone),
    ("transition", ElementKind::Transition),
    ("bodytube", ElementKind::BodyTube),
    ("innertube", ElementKind::InnerTube),
    ("centeringring", ElementKind::CenteringRing),
    ("bulkhead", ElementKind::Bulkhead),
    ("launchlug", ElementKind::LaunchLug),
    ("trapezoidfinset", ElementKind::TrapezoidFinSet),
    ("ellipticalfinset", ElementKind::EllipticalFinSet),
    ("tubefinset", ElementKind::TubeFinSet),
];

/// Tags every component carries but the importer does not model
pub(crate) const COMPONENT_TAGS: &[&str] = &[
    "id",
    "color",
    "linestyle",
    "finish",
    "material",
    "position",
    "axialoffset",
    "overridemass",
    "overridecg",
    "overridecd",
    "overridesubcomponentsmass",
    "comment",
    "preset",
    "appearance",
    "insideappearance",
    "componentpreset",
    "massoverride",
    "cgoverride",
];

const SUBCOMPONENTS: Children =
    Children::Table(&[("subcomponents", ElementKind::Subcomponents)]);

/// Leaves specific to tubes that can carry a motor
const MOTOR_MOUNT_TAGS: &[&str] = &[
    "motormount",
    "motor",
    "ignitionevent",
    "ignitiondelay",
    "overhang",
    "radialposition",
    "radialdirection",
    "clusterconfiguration",
    "clusterscale",
    "clusterrotation",
];

pub(crate) fn nose_cone_tags() -> TagSets {
    TagSets {
        known: &[
            "name",
            "length",
            "thickness",
            "shape",
            "shapeparameter",
            "aftradius",
            "aftshoulderradius",
            "aftshoulderlength",
            "aftshoulderthickness",
        ],
        component: COMPONENT_TAGS,
        extra: &["shapeclipped", "aftshouldercapped", "isflipped"],
        children: SUBCOMPONENTS,
    }
}

pub(crate) fn transition_tags() -> TagSets {
    TagSets {
        known: &[
            "name",
            "length",
            "thickness",
            "shape",
            "shapeclipped",
            "shapeparameter",
            "foreradius",
            "aftradius",
            "foreshoulderradius",
            "foreshoulderlength",
            "foreshoulderthickness",
            "aftshoulderradius",
            "aftshoulderlength",
            "aftshoulderthickness",
        ],
        component: COMPONENT_TAGS,
        extra: &["foreshouldercapped", "aftshouldercapped"],
        children: SUBCOMPONENTS,
    }
}

pub(crate) fn body_tube_tags() -> TagSets {
    TagSets {
        known: &["name", "length", "thickness", "radius", "outerradius"],
        component: COMPONENT_TAGS,
        extra: MOTOR_MOUNT_TAGS,
        children: SUBCOMPONENTS,
    }
}

pub(crate) fn inner_tube_tags() -> TagSets {
    TagSets {
        known: &["name", "length", "thickness", "outerradius"],
        component: COMPONENT_TAGS,
        extra: MOTOR_MOUNT_TAGS,
        children: SUBCOMPONENTS,
    }
}

pub(crate) fn centering_ring_tags() -> TagSets {
    TagSets {
        known: &["name", "length", "outerradius", "innerradius"],
        component: COMPONENT_TAGS,
        extra: &[],
        children: Children::Table(&[]),
    }
}

pub(crate) fn bulkhead_tags() -> TagSets {
    TagSets {
        known: &["name", "length", "outerradius"],
        component: COMPONENT_TAGS,
        extra: &[],
        children: Children::Table(&[]),
    }
}

pub(crate) fn launch_lug_tags() -> TagSets {
    TagSets {
        known: &[
            "name",
            "length",
            "thickness",
            "radius",
            "radialdirection",
            "angleoffset",
            "instancecount",
            "instanceseparation",
        ],
        component: COMPONENT_TAGS,
        extra: &[],
        children: Children::Table(&[]),
    }
}

/// `<name>` sets the object label
fn name_end_tag(element: &Element, tag: &str, content: &str, ctx: &mut Context<'_>) -> Result<bool> {
    if tag == "name" {
        element.set(ctx, attr::LABEL, content)?;
        return Ok(true);
    }
    Ok(false)
}

fn set_shape(
    element: &Element,
    tag: &str,
    content: &str,
    name: &str,
    ctx: &mut Context<'_>,
) -> Result<()> {
    match ShapeType::from_design_name(content) {
        Some(shape) => element.set(ctx, name, shape.as_str()),
        None => {
            ctx.warn(format!(
                "Unknown {} '{}' in {}, keeping previous value",
                tag,
                content,
                element.tag()
            ));
            Ok(())
        }
    }
}

fn set_coefficient(element: &Element, tag: &str, content: &str, ctx: &mut Context<'_>) -> Result<()> {
    let value = element.guarded(ctx, tag, content, |_, ctx| ctx.units.quantity(content))?;
    if let Some(value) = value {
        element.set(ctx, attr::COEFFICIENT, value)?;
    }
    Ok(())
}

fn set_flag(element: &Element, tag: &str, content: &str, name: &str, ctx: &mut Context<'_>) -> Result<()> {
    match content.trim().to_lowercase().as_str() {
        "true" => element.set(ctx, name, true),
        "false" => element.set(ctx, name, false),
        _ => {
            ctx.warn(format!(
                "Invalid value '{}' for {} in {}, keeping previous value",
                content,
                tag,
                element.tag()
            ));
            Ok(())
        }
    }
}

pub(crate) fn nose_cone_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::LENGTH)?,
        "thickness" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "shape" => set_shape(element, tag, content, attr::NOSE_TYPE, ctx)?,
        "shapeparameter" => set_coefficient(element, tag, content, ctx)?,
        "aftradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::DIAMETER,
            Some(attr::AUTO_DIAMETER),
            true,
        )?,
        "aftshoulderradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::SHOULDER_DIAMETER,
            Some(attr::SHOULDER_AUTO_DIAMETER),
            true,
        )?,
        "aftshoulderlength" => {
            element.set_length_guarded(ctx, tag, content, attr::SHOULDER_LENGTH)?
        }
        "aftshoulderthickness" => {
            element.set_length_guarded(ctx, tag, content, attr::SHOULDER_THICKNESS)?
        }
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

/// A shoulder exists once its length is known to be positive
pub(crate) fn nose_cone_end(element: &mut Element, ctx: &mut Context<'_>) -> Result<()> {
    if let Some(length) = element.get_f64(ctx, attr::SHOULDER_LENGTH) {
        element.set(ctx, attr::SHOULDER, length > 0.0)?;
    }
    Ok(())
}

pub(crate) fn transition_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::LENGTH)?,
        "thickness" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "shape" => set_shape(element, tag, content, attr::TRANSITION_TYPE, ctx)?,
        "shapeclipped" => set_flag(element, tag, content, attr::CLIPPED, ctx)?,
        "shapeparameter" => set_coefficient(element, tag, content, ctx)?,
        "foreradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::FORE_DIAMETER,
            Some(attr::FORE_AUTO_DIAMETER),
            true,
        )?,
        "aftradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::AFT_DIAMETER,
            Some(attr::AFT_AUTO_DIAMETER),
            true,
        )?,
        "foreshoulderradius" => {
            element.set_radius(ctx, tag, content, attr::FORE_SHOULDER_DIAMETER, None, true)?
        }
        "foreshoulderlength" => {
            element.set_length_guarded(ctx, tag, content, attr::FORE_SHOULDER_LENGTH)?
        }
        "foreshoulderthickness" => {
            element.set_length_guarded(ctx, tag, content, attr::FORE_SHOULDER_THICKNESS)?
        }
        "aftshoulderradius" => {
            element.set_radius(ctx, tag, content, attr::AFT_SHOULDER_DIAMETER, None, true)?
        }
        "aftshoulderlength" => {
            element.set_length_guarded(ctx, tag, content, attr::AFT_SHOULDER_LENGTH)?
        }
        "aftshoulderthickness" => {
            element.set_length_guarded(ctx, tag, content, attr::AFT_SHOULDER_THICKNESS)?
        }
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

pub(crate) fn transition_end(element: &mut Element, ctx: &mut Context<'_>) -> Result<()> {
    if let Some(length) = element.get_f64(ctx, attr::FORE_SHOULDER_LENGTH) {
        element.set(ctx, attr::FORE_SHOULDER, length > 0.0)?;
    }
    if let Some(length) = element.get_f64(ctx, attr::AFT_SHOULDER_LENGTH) {
        element.set(ctx, attr::AFT_SHOULDER, length > 0.0)?;
    }
    Ok(())
}

pub(crate) fn body_tube_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::LENGTH)?,
        "thickness" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "radius" | "outerradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::OUTER_DIAMETER,
            Some(attr::AUTO_DIAMETER),
            true,
        )?,
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

/// Inner diameter follows from the wall once the outer diameter is explicit
pub(crate) fn body_tube_end(element: &mut Element, ctx: &mut Context<'_>) -> Result<()> {
    if element.get_bool(ctx, attr::AUTO_DIAMETER) == Some(true) {
        return Ok(());
    }
    let outer = element.get_f64(ctx, attr::OUTER_DIAMETER);
    let thickness = element.get_f64(ctx, attr::THICKNESS);
    if let (Some(outer), Some(thickness)) = (outer, thickness) {
        element.set(ctx, attr::INNER_DIAMETER, (outer - 2.0 * thickness).max(0.0))?;
    }
    Ok(())
}

pub(crate) fn inner_tube_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::LENGTH)?,
        "thickness" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "outerradius" => {
            element.set_radius(ctx, tag, content, attr::OUTER_DIAMETER, None, true)?
        }
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

pub(crate) fn centering_ring_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "outerradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::DIAMETER,
            Some(attr::AUTO_DIAMETER),
            true,
        )?,
        "innerradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::CENTER_DIAMETER,
            Some(attr::CENTER_AUTO_DIAMETER),
            true,
        )?,
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

pub(crate) fn bulkhead_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "outerradius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::DIAMETER,
            Some(attr::AUTO_DIAMETER),
            true,
        )?,
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

pub(crate) fn launch_lug_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "length" => element.set_length_guarded(ctx, tag, content, attr::LENGTH)?,
        "thickness" => element.set_length_guarded(ctx, tag, content, attr::THICKNESS)?,
        "radius" => element.set_radius(ctx, tag, content, attr::DIAMETER, None, true)?,
        // Placement around the tube is left to the host
        "radialdirection" | "angleoffset" | "instancecount" | "instanceseparation" => {}
        _ => return name_end_tag(element, tag, content, ctx),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLog;
    use crate::importer::element::Attributes;
    use crate::importer::ImportSummary;
    use crate::model::{HostDocument, MemoryDocument};
    use crate::units::SiUnits;

    fn run(kind: ElementKind, tag: &str, leaves: &[(&str, &str)]) -> (MemoryDocument, DiagnosticLog) {
        let mut doc = MemoryDocument::new();
        let mut log = DiagnosticLog::new();
        let mut summary = ImportSummary::default();
        {
            let mut ctx = Context::new(&mut doc, &mut log, &SiUnits, &mut summary, "c.ork");
            let mut el = Element::new(kind, tag, Attributes::new(), None, &mut ctx).unwrap();
            for (leaf, content) in leaves {
                let reported = el.handle_tag(leaf, &Attributes::new(), &mut ctx);
                el.close_leaf(leaf, content, reported, &mut ctx).unwrap();
            }
            el.end(&mut ctx).unwrap();
        }
        (doc, log)
    }

    #[test]
    fn test_nose_cone_leaves() {
        let (doc, log) = run(
            ElementKind::NoseCone,
            "nosecone",
            &[
                ("name", "Ogive nose"),
                ("length", "0.12"),
                ("thickness", "0.002"),
                ("shape", "ogive"),
                ("shapeparameter", "1.0"),
                ("aftradius", "0.0125"),
                ("aftshoulderradius", "0.012"),
                ("aftshoulderlength", "0.02"),
                ("finish", "normal"),
            ],
        );
        assert!(log.is_empty());
        let nose = doc.object(doc.objects_of_kind(crate::model::ObjectKind::NoseCone)[0]).unwrap();
        assert_eq!(nose.get_str(attr::LABEL), Some("Ogive nose"));
        assert_eq!(nose.get_f64(attr::LENGTH), Some(0.12));
        assert_eq!(nose.get_str(attr::NOSE_TYPE), Some("ogive"));
        assert_eq!(nose.get_f64(attr::DIAMETER), Some(0.025));
        assert_eq!(nose.get_bool(attr::AUTO_DIAMETER), Some(false));
        assert_eq!(nose.get_f64(attr::SHOULDER_DIAMETER), Some(0.024));
        assert_eq!(nose.get_bool(attr::SHOULDER), Some(true));
    }

    #[test]
    fn test_nose_cone_keeps_last_good_value() {
        let (doc, log) = run(
            ElementKind::NoseCone,
            "nosecone",
            &[("length", "0.1"), ("length", "ten centimeters"), ("aftradius", "auto")],
        );
        let handle = doc.objects_of_kind(crate::model::ObjectKind::NoseCone)[0];
        assert_eq!(doc.attribute(handle, attr::LENGTH).unwrap().as_f64(), Some(0.1));
        assert_eq!(doc.attribute(handle, attr::AUTO_DIAMETER).unwrap().as_bool(), Some(true));
        assert_eq!(log.warnings().count(), 1);
        assert!(log.entries()[0].message.contains("keeping previous value"));
    }

    #[test]
    fn test_transition_shoulders_and_clip() {
        let (doc, log) = run(
            ElementKind::Transition,
            "transition",
            &[
                ("shape", "conical"),
                ("shapeclipped", "true"),
                ("foreradius", "auto"),
                ("aftradius", "0.02"),
                ("aftshoulderlength", "0.03"),
                ("foreshoulderlength", "0"),
            ],
        );
        assert!(log.is_empty());
        let t = doc.object(doc.objects_of_kind(crate::model::ObjectKind::Transition)[0]).unwrap();
        assert_eq!(t.get_str(attr::TRANSITION_TYPE), Some("cone"));
        assert_eq!(t.get_bool(attr::CLIPPED), Some(true));
        assert_eq!(t.get_bool(attr::FORE_AUTO_DIAMETER), Some(true));
        assert_eq!(t.get_f64(attr::AFT_DIAMETER), Some(0.04));
        assert_eq!(t.get_bool(attr::AFT_SHOULDER), Some(true));
        assert_eq!(t.get_bool(attr::FORE_SHOULDER), Some(false));
    }

    #[test]
    fn test_body_tube_inner_diameter() {
        let (doc, _) = run(
            ElementKind::BodyTube,
            "bodytube",
            &[("thickness", "0.001"), ("radius", "0.02"), ("length", "0.3")],
        );
        let tube = doc.object(doc.objects_of_kind(crate::model::ObjectKind::BodyTube)[0]).unwrap();
        assert_eq!(tube.get_f64(attr::OUTER_DIAMETER), Some(0.04));
        let inner = tube.get_f64(attr::INNER_DIAMETER).unwrap();
        assert!((inner - 0.038).abs() < 1e-12);
    }

    #[test]
    fn test_body_tube_auto_radius_skips_inner_diameter() {
        let (doc, _) = run(
            ElementKind::BodyTube,
            "bodytube",
            &[("radius", "auto"), ("thickness", "0.001")],
        );
        let tube = doc.object(doc.objects_of_kind(crate::model::ObjectKind::BodyTube)[0]).unwrap();
        assert_eq!(tube.get_bool(attr::AUTO_DIAMETER), Some(true));
        assert_eq!(tube.get_f64(attr::INNER_DIAMETER), None);
    }

    #[test]
    fn test_centering_ring_and_bulkhead() {
        let (doc, log) = run(
            ElementKind::CenteringRing,
            "centeringring",
            &[("length", "0.005"), ("outerradius", "auto"), ("innerradius", "0.009")],
        );
        assert!(log.is_empty());
        let ring = doc.object(doc.objects_of_kind(crate::model::ObjectKind::CenteringRing)[0]).unwrap();
        assert_eq!(ring.get_f64(attr::THICKNESS), Some(0.005));
        assert_eq!(ring.get_bool(attr::AUTO_DIAMETER), Some(true));
        assert_eq!(ring.get_f64(attr::CENTER_DIAMETER), Some(0.018));
        assert_eq!(ring.get_bool(attr::CENTER_AUTO_DIAMETER), Some(false));

        let (doc, _) = run(
            ElementKind::Bulkhead,
            "bulkhead",
            &[("length", "0.003"), ("outerradius", "0.02")],
        );
        let bulkhead = doc.object(doc.objects_of_kind(crate::model::ObjectKind::Bulkhead)[0]).unwrap();
        assert_eq!(bulkhead.get_f64(attr::THICKNESS), Some(0.003));
        assert_eq!(bulkhead.get_f64(attr::DIAMETER), Some(0.04));
    }

    #[test]
    fn test_launch_lug_reserved_tags_are_silent() {
        let (doc, log) = run(
            ElementKind::LaunchLug,
            "launchlug",
            &[
                ("radius", "0.003"),
                ("radialdirection", "90"),
                ("instancecount", "2"),
                ("angleoffset", "0"),
            ],
        );
        assert!(log.is_empty());
        let lug = doc.object(doc.objects_of_kind(crate::model::ObjectKind::LaunchLug)[0]).unwrap();
        assert_eq!(lug.get_f64(attr::DIAMETER), Some(0.006));
    }

    #[test]
    fn test_unknown_shape_warns() {
        let (_, log) = run(ElementKind::NoseCone, "nosecone", &[("shape", "blob")]);
        assert_eq!(log.warnings().count(), 1);
    }

    #[test]
    fn test_component_tags_are_silent_everywhere() {
        let leaves: Vec<(&str, &str)> = COMPONENT_TAGS.iter().map(|tag| (*tag, "x")).collect();
        for (tag, kind) in COMPONENTS {
            let (_, log) = run(*kind, tag, &leaves);
            assert!(log.is_empty(), "<{}> reported {:?}", tag, log.entries());
        }
    }
}
