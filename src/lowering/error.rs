use crate::ast::Location;

/// A fatal diagnostic raised during lowering. Warnings (implicit numeric
/// coercions) are not represented here — they're printed immediately via
/// [`warn`] and never halt lowering.
#[derive(Debug, Clone)]
pub struct LowerError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl LowerError {
    pub(super) fn fatal(loc: Location, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: loc.first_line,
            column: loc.first_column,
        }
    }
}

impl std::fmt::Display for LowerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "E:L{}:C{}:{}", self.line, self.column, self.message)
    }
}

impl std::error::Error for LowerError {}

impl From<inkwell::builder::BuilderError> for LowerError {
    fn from(err: inkwell::builder::BuilderError) -> Self {
        Self {
            message: format!("internal code generation error: {:?}", err),
            line: 0,
            column: 0,
        }
    }
}

/// Print an implicit-coercion warning to stderr. Does not halt lowering.
pub(super) fn warn(loc: Location, message: impl std::fmt::Display) {
    eprintln!("W:L{}:C{}:{}", loc.first_line, loc.first_column, message);
}
