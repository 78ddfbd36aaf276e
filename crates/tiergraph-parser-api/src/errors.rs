use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting one source file
#[derive(Error, Debug)]
pub enum ParserError {
    /// Failed to read file
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    /// None of the configured encodings decoded the file
    #[error("No supported encoding for {0} (tried: {})", .1.join(", "))]
    UnsupportedEncoding(PathBuf, Vec<String>),

    /// Syntax error in source code
    #[error("Syntax error in {0}:{1}:{2}: {3}")]
    SyntaxError(PathBuf, usize, usize, String),

    /// File too large
    #[error("File {0} exceeds maximum size ({1} bytes)")]
    FileTooLarge(PathBuf, usize),

    /// Parsing timeout
    #[error("Parsing {0} exceeded timeout")]
    Timeout(PathBuf),

    /// Generic parsing error
    #[error("Parse error in {0}: {1}")]
    ParseError(PathBuf, String),
}

impl ParserError {
    /// Path of the file this error belongs to
    pub fn path(&self) -> &PathBuf {
        match self {
            ParserError::IoError(p, _)
            | ParserError::UnsupportedEncoding(p, _)
            | ParserError::SyntaxError(p, _, _, _)
            | ParserError::FileTooLarge(p, _)
            | ParserError::Timeout(p)
            | ParserError::ParseError(p, _) => p,
        }
    }

    /// Whether the regex fallback scanner may still recover something
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParserError::SyntaxError(..) | ParserError::Timeout(_) | ParserError::ParseError(..)
        )
    }
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_encoding_message() {
        let err = ParserError::UnsupportedEncoding(
            PathBuf::from("A.java"),
            vec!["utf-8".to_string(), "euc-kr".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "No supported encoding for A.java (tried: utf-8, euc-kr)"
        );
    }

    #[test]
    fn test_syntax_error_message_and_recoverability() {
        let err = ParserError::SyntaxError(PathBuf::from("B.java"), 3, 7, "unexpected".into());
        assert_eq!(err.to_string(), "Syntax error in B.java:3:7: unexpected");
        assert!(err.is_recoverable());
        assert_eq!(err.path(), &PathBuf::from("B.java"));

        let io = ParserError::IoError(
            PathBuf::from("C.java"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!io.is_recoverable());
    }
}
