//! # rocket-ork
//!
//! Import of OpenRocket design files (`.ork`) into a parametric CAD document.
//!
//! A design file is an XML document, usually packaged in a ZIP archive or
//! gzip-compressed. The importer walks it with a stack of tag handlers, one
//! per open element, that create host objects and convert unit-bearing text
//! into attribute values. Unknown tags never abort an import: they are
//! reported through a [`Diagnostics`](diagnostics::Diagnostics) sink and the
//! rest of the file is still read.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Plain, ZIP-packaged and gzip-compressed design files
//! - Rockets, stages, nose cones, transitions, tubes, rings, bulkheads,
//!   launch lugs and trapezoidal, elliptical and tube fin sets
//! - Host document behind a narrow trait, with an in-memory implementation
//!
//! ## Example
//!
//! ```no_run
//! use rocket_ork::model::{MemoryDocument, ObjectKind};
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("rocket.ork")?;
//! let doc = MemoryDocument::from_reader(file)?;
//!
//! println!("Design contains {} fin sets", doc.objects_of_kind(ObjectKind::Fin).len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod diagnostics;
pub mod error;
pub mod importer;
pub mod model;
pub mod units;

pub use diagnostics::{Diagnostic, DiagnosticLog, Diagnostics, LogDiagnostics, Severity};
pub use error::{Error, Result};
pub use importer::{
    ImportConfig, ImportSession, ImportSummary, import_file, import_reader, import_str,
};
pub use model::{
    AttributeValue, FinType, HostDocument, HostObject, MemoryDocument, ObjectHandle, ObjectKind,
    ShapeType,
};
pub use units::{SiUnits, UnitConverter};

use std::io::{Read, Seek};

impl MemoryDocument {
    /// Import a design file into a new in-memory document
    ///
    /// Uses the default configuration and reports diagnostics through the
    /// `log` crate.
    ///
    /// # Arguments
    ///
    /// * `reader` - A reader containing the design file, in any container
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_reader_with_config(reader, &ImportConfig::new())
    }

    /// Import a design file with a custom configuration
    pub fn from_reader_with_config<R: Read + Seek>(
        reader: R,
        config: &ImportConfig,
    ) -> Result<Self> {
        let mut doc = MemoryDocument::new();
        import_reader(reader, "<reader>", &mut doc, &mut LogDiagnostics, config)?;
        Ok(doc)
    }
}
