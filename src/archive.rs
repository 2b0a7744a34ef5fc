//! Design file containers
//!
//! A design file is stored in one of three ways: as plain XML, as a ZIP
//! archive holding a single `.ork` XML entry, or as a gzip-compressed XML
//! stream. [`open_design`] sniffs the leading bytes and returns the XML text.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::io::{Cursor, Read, Seek, SeekFrom};
use zip::ZipArchive;

/// Extension of the XML entry inside a ZIP-packaged design
pub const DESIGN_ENTRY_EXTENSION: &str = ".ork";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Container format detected from the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Uncompressed XML text
    Xml,
    /// ZIP archive with a design entry
    Zip,
    /// gzip-compressed XML
    Gzip,
}

impl Container {
    /// Identify a container from its first bytes
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(ZIP_MAGIC) {
            Container::Zip
        } else if head.starts_with(GZIP_MAGIC) {
            Container::Gzip
        } else {
            Container::Xml
        }
    }
}

/// Read a design file and return its XML text
pub fn open_design<R: Read + Seek>(mut reader: R) -> Result<String> {
    let mut head = [0u8; 4];
    let n = read_head(&mut reader, &mut head)?;
    if n == 0 {
        return Err(Error::InvalidFormat("Design file is empty".to_string()));
    }
    reader.seek(SeekFrom::Start(0))?;

    match Container::sniff(&head[..n]) {
        Container::Zip => read_zip_entry(reader),
        Container::Gzip => {
            let mut xml = String::new();
            GzDecoder::new(reader).read_to_string(&mut xml)?;
            Ok(xml)
        }
        Container::Xml => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            String::from_utf8(bytes).map_err(|e| {
                Error::InvalidFormat(format!("Design file is not UTF-8 text: {}", e))
            })
        }
    }
}

/// Read a design held entirely in memory
pub fn open_design_bytes(bytes: &[u8]) -> Result<String> {
    open_design(Cursor::new(bytes))
}

fn read_head<R: Read>(reader: &mut R, head: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < head.len() {
        let n = reader.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn read_zip_entry<R: Read + Seek>(reader: R) -> Result<String> {
    let mut archive = ZipArchive::new(reader)?;

    let entry_name = {
        let names: Vec<&str> = archive.file_names().collect();
        names
            .iter()
            .find(|name| name.to_lowercase().ends_with(DESIGN_ENTRY_EXTENSION))
            .or_else(|| if names.len() == 1 { names.first() } else { None })
            .map(|name| name.to_string())
    };

    let entry_name = entry_name.ok_or_else(|| {
        Error::MissingFile(format!(
            "No '*{}' entry in design archive",
            DESIGN_ENTRY_EXTENSION
        ))
    })?;

    let mut file = archive
        .by_name(&entry_name)
        .map_err(|_| Error::MissingFile(entry_name.clone()))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}
