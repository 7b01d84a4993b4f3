use std::fmt;

use swc_common::{SourceMap, Span};
use thiserror::Error;

/// Line/column of the node a diagnostic is attributed to. Both are 1-based,
/// matching the `file:line:col` format editors navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn from_span(source_map: &SourceMap, span: Span) -> Self {
        let loc = source_map.lookup_char_pos(span.lo);
        Self {
            line: loc.line,
            column: loc.col_display + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while extracting messages from a single file.
///
/// Every variant carries the position of the originating node; the file path
/// is attached by the per-file driver. Under `errorsAsWarnings` each of these
/// is logged and the offending message is skipped instead of aborting the
/// file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{pos}: messages must be statically evaluate-able for extraction")]
    NotStaticallyEvaluable { pos: Position },

    #[error("{pos}: message extraction requires an `id`")]
    MissingId { pos: Position },

    #[error("{pos}: message extraction requires a `defaultMessage`")]
    MissingDefaultMessage { pos: Position },

    #[error("{pos}: message must have a `description`")]
    MissingDescription { pos: Position },

    #[error("{pos}: duplicate message id \"{id}\" with conflicting description or defaultMessage")]
    DuplicateId { id: String, pos: Position },

    #[error("{pos}: defaultMessage failed to parse: {detail} (offset {offset}){hint}")]
    IcuSyntax {
        detail: String,
        offset: usize,
        hint: &'static str,
        pos: Position,
    },

    #[error("{pos}: defineMessages() expects an object literal of message descriptors")]
    InvalidShape { pos: Position },
}

impl ExtractError {
    pub fn position(&self) -> Position {
        match self {
            Self::NotStaticallyEvaluable { pos }
            | Self::MissingId { pos }
            | Self::MissingDefaultMessage { pos }
            | Self::MissingDescription { pos }
            | Self::DuplicateId { pos, .. }
            | Self::IcuSyntax { pos, .. }
            | Self::InvalidShape { pos } => *pos,
        }
    }
}

/// Remediation hint appended to `IcuSyntax` when the message came from a JSX
/// string-literal attribute containing a backslash: JSX and the message
/// grammar disagree over escaping there.
pub const JSX_ESCAPE_HINT: &str =
    "; JSX strings do not process backslash escapes, wrap the message in a {} expression container or remove the backslashes";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_display_is_line_colon_column() {
        let pos = Position { line: 4, column: 11 };
        assert_eq!(pos.to_string(), "4:11");
    }

    #[test]
    fn duplicate_id_names_the_id() {
        let err = ExtractError::DuplicateId {
            id: "home.title".to_string(),
            pos: Position { line: 1, column: 1 },
        };
        assert!(err.to_string().contains("home.title"));
    }
}
