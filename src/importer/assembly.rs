//! Document structure handlers: `<openrocket>`, `<rocket>`, `<stage>` and
//! the `<subcomponents>` lists between them

use super::component::COMPONENTS;
use super::element::{Children, Context, Element, ElementKind, TagSets};
use crate::error::Result;
use crate::model::attr;

pub(crate) fn document_tags() -> TagSets {
    TagSets {
        known: &[],
        component: &[],
        extra: &[],
        children: Children::Table(&[("openrocket", ElementKind::OpenRocket)]),
    }
}

pub(crate) fn openrocket_tags() -> TagSets {
    TagSets {
        known: &[],
        component: &["datafiles", "simulations", "photostudio", "decals"],
        extra: &[],
        children: Children::Table(&[("rocket", ElementKind::Rocket)]),
    }
}

pub(crate) fn rocket_tags() -> TagSets {
    TagSets {
        known: &["name"],
        component: &[
            "id",
            "designer",
            "revision",
            "comment",
            "appearance",
            "motorconfiguration",
            "flightconfiguration",
            "referencetype",
            "customreference",
            "axialoffset",
            "position",
        ],
        extra: &[],
        children: Children::Table(&[("subcomponents", ElementKind::Stages)]),
    }
}

pub(crate) fn stages_tags() -> TagSets {
    TagSets {
        known: &[],
        component: &[],
        extra: &[],
        children: Children::Table(&[("stage", ElementKind::Stage)]),
    }
}

pub(crate) fn subcomponents_tags() -> TagSets {
    TagSets {
        known: &[],
        component: &[],
        extra: &[],
        children: Children::Table(COMPONENTS),
    }
}

pub(crate) fn stage_tags() -> TagSets {
    TagSets {
        known: &["name"],
        component: &[
            "id",
            "comment",
            "color",
            "linestyle",
            "appearance",
            "separationevent",
            "separationdelay",
            "separationconfiguration",
            "overridemass",
            "overridecg",
            "overridecd",
            "overridesubcomponentsmass",
        ],
        extra: &[],
        children: Children::Table(&[("subcomponents", ElementKind::Subcomponents)]),
    }
}

/// Remember which program wrote the file
pub(crate) fn record_format(element: &Element, ctx: &mut Context<'_>) {
    let version = element.attributes.get("version").map(str::to_string);
    let creator = element.attributes.get("creator").map(str::to_string);
    log::debug!(
        "Design file version {} written by {}",
        version.as_deref().unwrap_or("?"),
        creator.as_deref().unwrap_or("?")
    );
    ctx.summary.format_version = version;
    ctx.summary.creator = creator;
}

/// `<name>` is the only leaf a rocket or stage interprets
pub(crate) fn end_tag(
    element: &mut Element,
    tag: &str,
    content: &str,
    ctx: &mut Context<'_>,
) -> Result<bool> {
    match tag {
        "name" => {
            element.set(ctx, attr::LABEL, content)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}
