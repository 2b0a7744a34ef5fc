//! In-memory host document

use super::{AttributeValue, HostDocument, ObjectHandle, ObjectKind};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// An object created in a [`MemoryDocument`]
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    /// Kind requested at creation
    pub kind: ObjectKind,
    /// Assigned attributes, keyed by attribute name
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Registered children, in registration order
    pub children: Vec<ObjectHandle>,
    /// Parent the object was registered under, if any
    pub parent: Option<ObjectHandle>,
}

impl HostObject {
    fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Attribute value, if assigned
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Numeric attribute value, if assigned
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_f64)
    }

    /// Flag attribute value, if assigned
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttributeValue::as_bool)
    }

    /// Text attribute value, if assigned
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }
}

/// A host document that keeps every object in memory
///
/// Handles are indices into creation order. Besides serving as the test
/// double for the importer, it lets callers without a CAD kernel inspect an
/// imported design.
///
/// # Example
///
/// ```
/// use rocket_ork::model::{attr, HostDocument, MemoryDocument, ObjectKind};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut doc = MemoryDocument::new();
/// let tube = doc.create_object(ObjectKind::BodyTube)?;
/// doc.set_attribute(tube, attr::LENGTH, 0.3.into())?;
/// assert_eq!(doc.object(tube).unwrap().get_f64(attr::LENGTH), Some(0.3));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    objects: Vec<HostObject>,
    /// Number of attribute assignments performed, for change tracking
    assignments: usize,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object by handle
    pub fn object(&self, handle: ObjectHandle) -> Option<&HostObject> {
        self.objects.get(handle.0)
    }

    /// All objects, in creation order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &HostObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (ObjectHandle(i), obj))
    }

    /// Objects that were never registered under a parent
    pub fn roots(&self) -> Vec<ObjectHandle> {
        self.objects()
            .filter(|(_, obj)| obj.parent.is_none())
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Objects of the given kind, in creation order
    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<ObjectHandle> {
        self.objects()
            .filter(|(_, obj)| obj.kind == kind)
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Number of objects in the document
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the document has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total number of `set_attribute` calls that succeeded
    pub fn assignment_count(&self) -> usize {
        self.assignments
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> Result<&mut HostObject> {
        self.objects
            .get_mut(handle.0)
            .ok_or_else(|| Error::InvalidObject(format!("No object with handle {}", handle)))
    }
}

impl HostDocument for MemoryDocument {
    fn create_object(&mut self, kind: ObjectKind) -> Result<ObjectHandle> {
        let handle = ObjectHandle(self.objects.len());
        let mut object = HostObject::new(kind);
        object
            .attributes
            .insert(super::attr::LABEL.to_string(), kind.name().into());
        self.objects.push(object);
        Ok(handle)
    }

    fn set_attribute(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<()> {
        self.object_mut(handle)?
            .attributes
            .insert(name.to_string(), value);
        self.assignments += 1;
        Ok(())
    }

    fn attribute(&self, handle: ObjectHandle, name: &str) -> Option<AttributeValue> {
        self.object(handle)
            .and_then(|obj| obj.attributes.get(name))
            .cloned()
    }

    fn add_child(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()> {
        if parent == child {
            return Err(Error::InvalidObject(format!(
                "Object {} cannot be its own child",
                parent
            )));
        }
        // Validate both handles before mutating either side
        self.object_mut(child)?;
        self.object_mut(parent)?.children.push(child);
        self.object_mut(child)?.parent = Some(parent);
        Ok(())
    }
}
