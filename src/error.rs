//! Structured error types for the Quire composition engine.
//!
//! Structural errors are found before layout starts, measurement errors
//! abort layout when the metrics provider cannot answer, and the remaining
//! variants cover the JSON, font-loading and rendering layers. Content that
//! overflows a page is not an error; it is recorded on the layout plan.

use thiserror::Error;

/// The unified error type returned by all public Quire API functions.
#[derive(Debug, Error)]
pub enum QuireError {
    /// JSON input failed to parse as a valid Quire document.
    #[error("Failed to parse document: {source}{}", hint_suffix(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// The document tree is malformed.
    #[error(transparent)]
    Structure(#[from] StructuralError),
    /// The metrics provider could not measure some text.
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    /// A font could not be loaded or parsed.
    #[error("Font error: {0}")]
    FontError(String),
    /// The renderer adapter failed.
    #[error("Render error: {0}")]
    RenderError(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for QuireError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the Quire document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        QuireError::ParseError { source: e, hint }
    }
}

fn codepoint(ch: &char) -> u32 {
    *ch as u32
}

/// Where a table sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    pub section: usize,
    pub block: usize,
}

/// A malformed document tree, reported before layout begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("table {loc:?}: has {rows} rows but no columns")]
    NoColumns { loc: TableLocation, rows: usize },
    #[error(
        "table {loc:?}: row {row} has {found} cells but the table has {expected} columns"
    )]
    ColumnCountMismatch {
        loc: TableLocation,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error(
        "table {loc:?}: cell ({row}, {column}) merges right {merge_right} / down {merge_down} past the table bounds"
    )]
    MergeOutOfBounds {
        loc: TableLocation,
        row: usize,
        column: usize,
        merge_right: usize,
        merge_down: usize,
    },
    #[error(
        "table {loc:?}: cell ({row}, {column}) is claimed by merges from ({first_row}, {first_column}) and ({second_row}, {second_column})"
    )]
    OverlappingMerge {
        loc: TableLocation,
        row: usize,
        column: usize,
        first_row: usize,
        first_column: usize,
        second_row: usize,
        second_column: usize,
    },
    #[error(
        "table {loc:?}: cell ({row}, {column}) is absorbed by the merge from ({origin_row}, {origin_column}) but declares its own content or style"
    )]
    AbsorbedCellDeclared {
        loc: TableLocation,
        row: usize,
        column: usize,
        origin_row: usize,
        origin_column: usize,
    },
    #[error("table {loc:?}: heading row {row} follows a body row")]
    MisplacedHeadingRow { loc: TableLocation, row: usize },
    #[error(
        "table {loc:?}: heading cell ({row}, {column}) merges down into body rows"
    )]
    HeadingMergeIntoBody {
        loc: TableLocation,
        row: usize,
        column: usize,
    },
}

/// The metrics provider could not resolve a font or glyph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasurementError {
    #[error("unknown font `{family}` (bold: {bold}, italic: {italic})")]
    UnknownFont {
        family: String,
        bold: bool,
        italic: bool,
    },
    #[error("font `{family}` has no glyph for {ch:?} (U+{:04X})", codepoint(.ch))]
    MissingGlyph { family: String, ch: char },
    #[error("invalid font size {0}")]
    InvalidFontSize(f64),
}
