//! Fin set handlers
//!
//! Trapezoidal and elliptical fin sets share the fin count, thickness, cross
//! section and cant leaves. Tube fins carry their own leaf list. Unlike the
//! airframe components, a fin value that fails to convert aborts the import.

use super::component::COMPONENT_TAGS;
use super::element::{Children, Context, Element, ElementKind, TagSets};
use crate::error::{Error, Result};
use crate::model::{FinType, ObjectKind, attr};

/// Leaves acknowledged on planar fin sets without modelling them
const PLANAR_FIN_TAGS: &[&str] = &[
    "angleoffset",
    "radiusoffset",
    "tabheight",
    "tablength",
    "tabposition",
    "filletradius",
    "filletmaterial",
];

pub(crate) fn trapezoid_tags() -> TagSets {
    TagSets {
        known: &[
            "name",
            "fincount",
            "rotation",
            "thickness",
            "crosssection",
            "cant",
            "rootchord",
            "tipchord",
            "sweeplength",
            "height",
        ],
        component: COMPONENT_TAGS,
        extra: PLANAR_FIN_TAGS,
        children: Children::Table(&[("subcomponents", ElementKind::Subcomponents)]),
    }
}

pub(crate) fn elliptical_tags() -> TagSets {
    TagSets {
        known: &[
            "name",
            "fincount",
            "rotation",
            "thickness",
            "crosssection",
            "cant",
            "rootchord",
            "height",
        ],
        component: COMPONENT_TAGS,
        extra: PLANAR_FIN_TAGS,
        children: Children::Table(&[("subcomponents", ElementKind::Subcomponents)]),
    }
}

pub(crate) fn tube_tags() -> TagSets {
    TagSets {
        known: &[
            "name",
            "fincount",
            "rotation",
            "thickness",
            "length",
            "radius",
            "instancecount",
            "angleoffset",
            "radiusoffset",
        ],
        component: COMPONENT_TAGS,
        extra: &[],
        children: Children::Table(&[]),
    }
}

/// Create the fin object and stamp its shape discriminant
pub(crate) fn make_fin(element: &mut Element, ctx: &mut Context<'_>) -> Result<()> {
    let fin_type = match element.kind() {
        ElementKind::TrapezoidFinSet => FinType::Trapezoid,
        ElementKind::EllipticalFinSet => FinType::Ellipse,
        _ => FinType::Tube,
    };
    element.create_object(ObjectKind::Fin, ctx)?;
    element.set(ctx, attr::FIN_TYPE, fin_type.as_str())
}

/// A count above one makes a fin set with even angular spacing
fn set_fin_count(element: &Element, tag: &str, content: &str, ctx: &mut Context<'_>) -> Result<()> {
    let count = content.trim().parse::<i64>().map_err(|_| {
        Error::parse_error_with_context(tag, content, "integer")
            .at(&ctx.location().hint("Fin counts are whole numbers, e.g. 4"))
    })?;

    if count > 1 {
        element.set(ctx, attr::FIN_SET, true)?;
        element.set(ctx, attr::FIN_COUNT, count)?;
        element.set(ctx, attr::FIN_SPACING, 360.0 / count as f64)
    } else {
        element.set(ctx, attr::FIN_SET, false)
    }
}

fn set_cross_section(element: &Element, content: &str, ctx: &mut Context<'_>) -> Result<()> {
    let section = match content.trim().to_lowercase().as_str() {
        "square" => "square",
        "rounded" | "round" => "round",
        "airfoil" => "airfoil",
        _ => {
            ctx.warn(format!(
                "Unknown crosssection '{}' in {}",
                content,
                element.tag()
            ));
            return Ok(());
        }
    };
    element.set(ctx, attr::ROOT_CROSS_SECTION, section)
}

/// Leaves shared by trapezoidal and elliptical fin sets
fn finset_end_tag(
    element: &Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "fincount" => set_fin_count(element, tag, content, ctx)?,
        // Reserved: the host positions fins itself
        "rotation" => {}
        "thickness" => {
            let thickness = element.length(ctx, tag, content)?;
            element.set(ctx, attr::ROOT_THICKNESS, thickness)?;
            element.set(ctx, attr::TIP_THICKNESS, thickness)?;
        }
        "crosssection" => set_cross_section(element, content, ctx)?,
        "cant" => {
            let cant = element.angle(ctx, tag, content)?;
            element.set(ctx, attr::CANT, cant)?;
        }
        "name" => element.set(ctx, attr::LABEL, content)?,
        _ => return Ok(false),
    }
    Ok(true)
}

pub(crate) fn trapezoid_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    let name = match tag {
        "rootchord" => attr::ROOT_CHORD,
        "tipchord" => attr::TIP_CHORD,
        "sweeplength" => attr::SWEEP_LENGTH,
        "height" => attr::HEIGHT,
        _ => return finset_end_tag(element, tag, content, ctx),
    };
    let value = element.length(ctx, tag, content)?;
    element.set(ctx, name, value)?;
    Ok(true)
}

/// Sweep angle follows from sweep length and height, whichever came first
pub(crate) fn trapezoid_end(element: &mut Element, ctx: &mut Context<'_>) -> Result<()> {
    let sweep = element.get_f64(ctx, attr::SWEEP_LENGTH);
    let height = element.get_f64(ctx, attr::HEIGHT);
    if let (Some(sweep), Some(height)) = (sweep, height) {
        if height > 0.0 {
            element.set(ctx, attr::SWEEP_ANGLE, sweep_angle(sweep, height))?;
        }
    }
    Ok(())
}

/// Angle of the leading edge from the body normal, in degrees
pub(crate) fn sweep_angle(sweep_length: f64, height: f64) -> f64 {
    sweep_length.atan2(height).to_degrees()
}

pub(crate) fn elliptical_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    let name = match tag {
        "rootchord" => attr::ROOT_CHORD,
        "height" => attr::HEIGHT,
        _ => return finset_end_tag(element, tag, content, ctx),
    };
    let value = element.length(ctx, tag, content)?;
    element.set(ctx, name, value)?;
    Ok(true)
}

pub(crate) fn tube_end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "fincount" => set_fin_count(element, tag, content, ctx)?,
        "thickness" => {
            let thickness = element.length(ctx, tag, content)?;
            element.set(ctx, attr::TUBE_THICKNESS, thickness)?;
        }
        "length" => {
            let length = element.length(ctx, tag, content)?;
            element.set(ctx, attr::ROOT_CHORD, length)?;
        }
        "radius" => element.set_radius(
            ctx,
            tag,
            content,
            attr::TUBE_OUTER_DIAMETER,
            Some(attr::TUBE_AUTO_OUTER_DIAMETER),
            false,
        )?,
        "name" => element.set(ctx, attr::LABEL, content)?,
        // Recognized but not modelled
        "rotation" | "instancecount" | "angleoffset" | "radiusoffset" => {}
        _ => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLog;
    use crate::importer::element::Attributes;
    use crate::importer::ImportSummary;
    use crate::model::{HostObject, MemoryDocument};
    use crate::units::SiUnits;

    struct Outcome {
        doc: MemoryDocument,
        log: DiagnosticLog,
        result: Result<()>,
    }

    impl Outcome {
        fn fin(&self) -> &HostObject {
            self.doc
                .object(self.doc.objects_of_kind(ObjectKind::Fin)[0])
                .unwrap()
        }
    }

    fn run(kind: ElementKind, tag: &str, leaves: &[(&str, &str)]) -> Outcome {
        let mut doc = MemoryDocument::new();
        let mut log = DiagnosticLog::new();
        let mut summary = ImportSummary::default();
        let result = {
            let mut ctx = Context::new(&mut doc, &mut log, &SiUnits, &mut summary, "f.ork");
            let mut el = Element::new(kind, tag, Attributes::new(), None, &mut ctx).unwrap();
            leaves
                .iter()
                .try_for_each(|(leaf, content)| {
                    let reported = el.handle_tag(leaf, &Attributes::new(), &mut ctx);
                    el.close_leaf(leaf, content, reported, &mut ctx)
                })
                .and_then(|_| el.end(&mut ctx))
        };
        Outcome { doc, log, result }
    }

    #[test]
    fn test_fin_type_discriminant() {
        let out = run(ElementKind::TrapezoidFinSet, "trapezoidfinset", &[]);
        assert_eq!(out.fin().get_str(attr::FIN_TYPE), Some("trapezoid"));
        let out = run(ElementKind::TubeFinSet, "tubefinset", &[]);
        assert_eq!(out.fin().get_str(attr::FIN_TYPE), Some("tube"));
        let out = run(ElementKind::EllipticalFinSet, "ellipticalfinset", &[]);
        assert_eq!(out.fin().get_str(attr::FIN_TYPE), Some("ellipse"));
    }

    #[test]
    fn test_tube_fin_count() {
        let out = run(ElementKind::TubeFinSet, "tubefinset", &[("fincount", "4")]);
        assert!(out.log.is_empty());
        assert_eq!(out.fin().get(attr::FIN_COUNT).unwrap().as_i64(), Some(4));
        assert_eq!(out.fin().get_f64(attr::FIN_SPACING), Some(90.0));
        assert_eq!(out.fin().get_bool(attr::FIN_SET), Some(true));

        let out = run(ElementKind::TubeFinSet, "tubefinset", &[("fincount", "1")]);
        assert_eq!(out.fin().get_bool(attr::FIN_SET), Some(false));
        assert_eq!(out.fin().get(attr::FIN_COUNT), None);
    }

    #[test]
    fn test_tube_fin_radius() {
        let out = run(ElementKind::TubeFinSet, "tubefinset", &[("radius", "auto")]);
        assert_eq!(out.fin().get_bool(attr::TUBE_AUTO_OUTER_DIAMETER), Some(true));
        assert_eq!(out.fin().get(attr::TUBE_OUTER_DIAMETER), None);

        let out = run(ElementKind::TubeFinSet, "tubefinset", &[("radius", "0.05")]);
        assert_eq!(out.fin().get_bool(attr::TUBE_AUTO_OUTER_DIAMETER), Some(false));
        assert_eq!(out.fin().get_f64(attr::TUBE_OUTER_DIAMETER), Some(0.10));
    }

    #[test]
    fn test_tube_fin_reserved_tags_are_silent_no_ops() {
        let out = run(
            ElementKind::TubeFinSet,
            "tubefinset",
            &[
                ("rotation", "12"),
                ("instancecount", "3"),
                ("angleoffset", "0"),
                ("radiusoffset", "0.01"),
            ],
        );
        assert!(out.log.is_empty());
        // only the discriminant was assigned
        assert_eq!(out.doc.assignment_count(), 1);
    }

    #[test]
    fn test_tube_fin_has_own_tag_list() {
        let out = run(
            ElementKind::TubeFinSet,
            "tubefinset",
            &[("thickness", "0.001"), ("length", "0.05"), ("crosssection", "square")],
        );
        assert_eq!(out.fin().get_f64(attr::TUBE_THICKNESS), Some(0.001));
        assert_eq!(out.fin().get_f64(attr::ROOT_CHORD), Some(0.05));
        // crosssection is not a tube fin leaf
        assert_eq!(out.log.warnings().count(), 1);
        assert_eq!(out.log.entries()[0].message, "Unknown tag crosssection in tubefinset");
    }

    #[test]
    fn test_trapezoid_sweep_angle() {
        let out = run(
            ElementKind::TrapezoidFinSet,
            "trapezoidfinset",
            &[
                ("rootchord", "0.1"),
                ("tipchord", "0.05"),
                ("sweeplength", "0.08"),
                ("height", "0.12"),
            ],
        );
        out.result.as_ref().unwrap();
        let fin = out.fin();
        assert_eq!(fin.get_f64(attr::ROOT_CHORD), Some(0.1));
        assert_eq!(fin.get_f64(attr::TIP_CHORD), Some(0.05));
        let angle = fin.get_f64(attr::SWEEP_ANGLE).unwrap();
        assert!((angle - (0.08f64 / 0.12).atan().to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_trapezoid_without_height_has_no_sweep_angle() {
        let out = run(
            ElementKind::TrapezoidFinSet,
            "trapezoidfinset",
            &[("sweeplength", "0.08")],
        );
        assert_eq!(out.fin().get(attr::SWEEP_ANGLE), None);
    }

    #[test]
    fn test_shared_finset_leaves() {
        let out = run(
            ElementKind::EllipticalFinSet,
            "ellipticalfinset",
            &[
                ("fincount", "3"),
                ("thickness", "0.003"),
                ("crosssection", "airfoil"),
                ("cant", "1.5"),
                ("rootchord", "0.07"),
                ("height", "0.04"),
                ("tabheight", "0.01"),
            ],
        );
        assert!(out.log.is_empty());
        let fin = out.fin();
        assert_eq!(fin.get_f64(attr::FIN_SPACING), Some(120.0));
        assert_eq!(fin.get_f64(attr::ROOT_THICKNESS), Some(0.003));
        assert_eq!(fin.get_f64(attr::TIP_THICKNESS), Some(0.003));
        assert_eq!(fin.get_str(attr::ROOT_CROSS_SECTION), Some("airfoil"));
        assert_eq!(fin.get_f64(attr::CANT), Some(1.5));
        assert_eq!(fin.get_f64(attr::HEIGHT), Some(0.04));
    }

    #[test]
    fn test_bad_fin_value_aborts_with_location() {
        let out = run(
            ElementKind::TrapezoidFinSet,
            "trapezoidfinset",
            &[("rootchord", "wide")],
        );
        let err = out.result.unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert!(err.to_string().contains("rootchord"));
        assert!(err.to_string().contains("f.ork"));
    }

    #[test]
    fn test_bad_fin_count_aborts() {
        let out = run(ElementKind::TubeFinSet, "tubefinset", &[("fincount", "many")]);
        assert!(out.result.is_err());
    }

    #[test]
    fn test_sweep_angle_helper() {
        assert!((sweep_angle(1.0, 1.0) - 45.0).abs() < 1e-12);
        assert_eq!(sweep_angle(0.0, 0.1), 0.0);
    }
}
