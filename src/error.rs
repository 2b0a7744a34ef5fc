//! Error types for design file import
//!
//! Only failures that abort an import are represented here. Recoverable
//! problems (unknown tags, unregistered child elements) go through the
//! [`Diagnostics`](crate::diagnostics::Diagnostics) channel instead and never
//! surface as an [`Error`].
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and container errors
//! - **E2xxx**: XML parsing and structure errors
//! - **E3xxx**: Host object and value errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading file
//! - `E1002`: ZIP archive format error
//! - `E1003`: Design entry missing from archive
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E2003`: Invalid XML structure
//! - `E2004`: Input is not a design file
//! - `E3001`: Invalid host object
//! - `E3002`: Value conversion error

use std::io;
use thiserror::Error;

/// Result type for import operations
pub type Result<T> = std::result::Result<T, Error>;

/// Additional context for errors
///
/// Carries the location of the XML event that triggered the failure, plus an
/// optional hint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// The design file being imported
    pub file: Option<String>,

    /// 1-based line number of the offending event
    pub line: Option<usize>,

    /// A helpful hint for resolving the error
    pub hint: Option<String>,
}

impl ErrorContext {
    /// Create a new empty error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file location
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the line number
    pub fn line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the hint
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        match (&self.file, self.line) {
            (Some(file), Some(line)) => parts.push(format!("Location: {}:{}", file, line)),
            (Some(file), None) => parts.push(format!("File: {}", file)),
            (None, Some(line)) => parts.push(format!("Line: {}", line)),
            (None, None) => {}
        }

        if let Some(ref hint) = self.hint {
            parts.push(format!("Hint: {}", hint));
        }

        if !parts.is_empty() {
            write!(f, "\n{}", parts.join("\n"))
        } else {
            Ok(())
        }
    }
}

/// Errors that abort a design file import
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading the file
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted or truncated `.ork` archive
    /// - Unsupported compression method
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive does not contain a design entry
    ///
    /// **Error Code**: E1003
    #[error("[E1003] Missing design file: {0}")]
    MissingFile(String),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Mismatched or unclosed tags
    /// - Invalid character encoding
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - DTD declarations in the document
    /// - Element names that are not valid UTF-8
    /// - Nesting deeper than the configured limit
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Input is not a recognizable design file
    ///
    /// **Error Code**: E2004
    #[error("[E2004] Invalid design file: {0}")]
    InvalidFormat(String),

    /// The host document rejected an object operation
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - A handle that does not belong to the document
    /// - Registering an object as its own child
    #[error("[E3001] Invalid object: {0}")]
    InvalidObject(String),

    /// Value conversion failure
    ///
    /// **Error Code**: E3002
    ///
    /// **Common Causes**:
    /// - Non-numeric text where a quantity is expected
    /// - Unknown unit suffix
    ///
    /// **Suggestions**:
    /// - Verify numeric values use proper format (e.g., "1.5" not "1,5")
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error with element context
    pub fn invalid_xml_element(element: &str, message: &str) -> Self {
        Error::InvalidXml(format!("Element '<{}>': {}", element, message))
    }

    /// Create a ParseError with context about what was being parsed
    ///
    /// # Arguments
    /// * `field_name` - The leaf tag being converted (e.g., "rootchord")
    /// * `value` - The text that failed to convert
    /// * `expected_type` - The expected type (e.g., "length")
    pub fn parse_error_with_context(field_name: &str, value: &str, expected_type: &str) -> Self {
        Error::ParseError(format!(
            "Failed to parse '{}': expected {}, got '{}'. \
             Verify the value is properly formatted.",
            field_name, expected_type, value
        ))
    }

    /// Attach location context to a ParseError or InvalidXml error
    ///
    /// Other variants already carry their own context and are returned as is.
    pub fn at(self, context: &ErrorContext) -> Self {
        match self {
            Error::ParseError(msg) => Error::ParseError(format!("{}{}", msg, context)),
            Error::InvalidXml(msg) => Error::InvalidXml(format!("{}{}", msg, context)),
            other => other,
        }
    }
}
