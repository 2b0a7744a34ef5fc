//! Host document interface
//!
//! The importer never touches a CAD kernel directly. It creates and
//! configures objects through the narrow [`HostDocument`] trait, so the same
//! element handlers drive a real modeler or the in-memory [`MemoryDocument`].

mod document;

pub use document::{HostObject, MemoryDocument};

use crate::error::Result;
use std::fmt;

/// Opaque reference to an object owned by a [`HostDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub usize);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of parametric object the importer asks the host to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Top-level rocket assembly
    Rocket,
    /// Stage assembly within a rocket
    Stage,
    /// Nose cone
    NoseCone,
    /// Diameter transition (shoulder/boattail)
    Transition,
    /// Airframe body tube
    BodyTube,
    /// Inner tube (motor mount)
    InnerTube,
    /// Centering ring
    CenteringRing,
    /// Bulkhead
    Bulkhead,
    /// Launch lug
    LaunchLug,
    /// Fin or fin set; the shape lives in [`attr::FIN_TYPE`]
    Fin,
}

impl ObjectKind {
    /// Default label for a freshly created object
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Rocket => "Rocket",
            ObjectKind::Stage => "Stage",
            ObjectKind::NoseCone => "NoseCone",
            ObjectKind::Transition => "Transition",
            ObjectKind::BodyTube => "BodyTube",
            ObjectKind::InnerTube => "InnerTube",
            ObjectKind::CenteringRing => "CenteringRing",
            ObjectKind::Bulkhead => "Bulkhead",
            ObjectKind::LaunchLug => "LaunchLug",
            ObjectKind::Fin => "Fin",
        }
    }
}

/// Value stored in an object attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Length (meters), angle (degrees) or ratio
    Float(f64),
    /// Count
    Int(i64),
    /// Flag
    Bool(bool),
    /// Label or enumeration value
    Text(String),
}

impl AttributeValue {
    /// The value as a float, if it is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The value as an integer, if it is a count
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a flag
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// Attribute names set on host objects
#[allow(missing_docs)]
pub mod attr {
    pub const LABEL: &str = "Label";

    pub const LENGTH: &str = "Length";
    pub const THICKNESS: &str = "Thickness";
    pub const DIAMETER: &str = "Diameter";
    pub const AUTO_DIAMETER: &str = "AutoDiameter";
    pub const OUTER_DIAMETER: &str = "OuterDiameter";
    pub const INNER_DIAMETER: &str = "InnerDiameter";
    pub const CENTER_DIAMETER: &str = "CenterDiameter";
    pub const CENTER_AUTO_DIAMETER: &str = "CenterAutoDiameter";
    pub const COEFFICIENT: &str = "Coefficient";

    pub const NOSE_TYPE: &str = "NoseType";
    pub const SHOULDER: &str = "Shoulder";
    pub const SHOULDER_DIAMETER: &str = "ShoulderDiameter";
    pub const SHOULDER_AUTO_DIAMETER: &str = "ShoulderAutoDiameter";
    pub const SHOULDER_LENGTH: &str = "ShoulderLength";
    pub const SHOULDER_THICKNESS: &str = "ShoulderThickness";

    pub const TRANSITION_TYPE: &str = "TransitionType";
    pub const CLIPPED: &str = "Clipped";
    pub const FORE_DIAMETER: &str = "ForeDiameter";
    pub const FORE_AUTO_DIAMETER: &str = "ForeAutoDiameter";
    pub const AFT_DIAMETER: &str = "AftDiameter";
    pub const AFT_AUTO_DIAMETER: &str = "AftAutoDiameter";
    pub const FORE_SHOULDER: &str = "ForeShoulder";
    pub const FORE_SHOULDER_DIAMETER: &str = "ForeShoulderDiameter";
    pub const FORE_SHOULDER_LENGTH: &str = "ForeShoulderLength";
    pub const FORE_SHOULDER_THICKNESS: &str = "ForeShoulderThickness";
    pub const AFT_SHOULDER: &str = "AftShoulder";
    pub const AFT_SHOULDER_DIAMETER: &str = "AftShoulderDiameter";
    pub const AFT_SHOULDER_LENGTH: &str = "AftShoulderLength";
    pub const AFT_SHOULDER_THICKNESS: &str = "AftShoulderThickness";

    pub const FIN_TYPE: &str = "FinType";
    pub const FIN_SET: &str = "FinSet";
    pub const FIN_COUNT: &str = "FinCount";
    pub const FIN_SPACING: &str = "FinSpacing";
    pub const ROOT_CHORD: &str = "RootChord";
    pub const TIP_CHORD: &str = "TipChord";
    pub const SWEEP_LENGTH: &str = "SweepLength";
    pub const SWEEP_ANGLE: &str = "SweepAngle";
    pub const HEIGHT: &str = "Height";
    pub const ROOT_THICKNESS: &str = "RootThickness";
    pub const TIP_THICKNESS: &str = "TipThickness";
    pub const ROOT_CROSS_SECTION: &str = "RootCrossSection";
    pub const CANT: &str = "Cant";
    pub const TUBE_THICKNESS: &str = "TubeThickness";
    pub const TUBE_OUTER_DIAMETER: &str = "TubeOuterDiameter";
    pub const TUBE_AUTO_OUTER_DIAMETER: &str = "TubeAutoOuterDiameter";
}

/// Fin shape discriminant stored in [`attr::FIN_TYPE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinType {
    /// Straight-edged fin with root, tip and sweep
    Trapezoid,
    /// Elliptical planform
    Ellipse,
    /// Tube fins arranged around the body
    Tube,
}

impl FinType {
    /// Attribute value for this fin shape
    pub fn as_str(&self) -> &'static str {
        match self {
            FinType::Trapezoid => "trapezoid",
            FinType::Ellipse => "ellipse",
            FinType::Tube => "tube",
        }
    }
}

/// Profile of a nose cone or transition, stored in [`attr::NOSE_TYPE`] or
/// [`attr::TRANSITION_TYPE`]
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Cone,
    Ogive,
    Ellipse,
    Power,
    Parabolic,
    Haack,
}

impl ShapeType {
    /// Map a design file shape name onto a profile
    pub fn from_design_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "conical" | "cone" => Some(ShapeType::Cone),
            "ogive" => Some(ShapeType::Ogive),
            "ellipsoid" | "elliptical" => Some(ShapeType::Ellipse),
            "power" => Some(ShapeType::Power),
            "parabolic" => Some(ShapeType::Parabolic),
            "haack" => Some(ShapeType::Haack),
            _ => None,
        }
    }

    /// Attribute value for this profile
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Cone => "cone",
            ShapeType::Ogive => "ogive",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Power => "power",
            ShapeType::Parabolic => "parabolic",
            ShapeType::Haack => "haack",
        }
    }
}

/// The host CAD document the importer populates
///
/// Implementations own every object they create. The importer is the only
/// writer while an import runs; callers serialize imports into one document.
pub trait HostDocument {
    /// Create a new object of the given kind and return its handle
    fn create_object(&mut self, kind: ObjectKind) -> Result<ObjectHandle>;

    /// Assign an attribute on an object, replacing any previous value
    fn set_attribute(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<()>;

    /// Read back an attribute, if it has been assigned
    fn attribute(&self, handle: ObjectHandle, name: &str) -> Option<AttributeValue>;

    /// Register `child` as a child of `parent`
    fn add_child(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()>;
}
