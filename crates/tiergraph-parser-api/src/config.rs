use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Text encodings the extractor may try when reading a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "euc-kr")]
    EucKr,
    #[serde(rename = "cp949")]
    Cp949,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "iso-8859-1")]
    Iso8859_1,
}

impl SourceEncoding {
    /// Label as used in configuration files and error messages
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::EucKr => "euc-kr",
            SourceEncoding::Cp949 => "cp949",
            SourceEncoding::Latin1 => "latin-1",
            SourceEncoding::Iso8859_1 => "iso-8859-1",
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for extractor behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Skip test sources (files under a `test` directory or named `*Test.*`)
    pub skip_tests: bool,

    /// Maximum file size to parse (in bytes)
    /// Files larger than this will be skipped
    pub max_file_size: usize,

    /// Timeout per file (None = no timeout)
    #[serde(with = "duration_option")]
    pub timeout_per_file: Option<Duration>,

    /// Enable parallel parsing (for `parse_files`)
    pub parallel: bool,

    /// Number of parallel workers (None = one per CPU)
    pub parallel_workers: Option<usize>,

    /// Encodings tried in order until one decodes the file
    pub encodings: Vec<SourceEncoding>,

    /// Run the pattern scanner when structural parsing fails
    pub fallback_on_error: bool,

    /// Accept trees that contain error nodes instead of reporting a syntax error
    pub tolerate_syntax_errors: bool,
}

// Helper module for serializing Duration
mod duration_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_tests: false,
            max_file_size: 10 * 1024 * 1024, // 10 MB
            timeout_per_file: Some(Duration::from_secs(30)),
            parallel: false,
            parallel_workers: None,
            encodings: vec![
                SourceEncoding::Utf8,
                SourceEncoding::EucKr,
                SourceEncoding::Cp949,
                SourceEncoding::Latin1,
                SourceEncoding::Iso8859_1,
            ],
            fallback_on_error: true,
            tolerate_syntax_errors: false,
        }
    }
}

impl ParserConfig {
    /// Create config for fast batch runs (parallel, skips tests, no fallback)
    pub fn fast() -> Self {
        Self {
            skip_tests: true,
            parallel: true,
            fallback_on_error: false,
            ..Default::default()
        }
    }

    /// Enable parallel parsing
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set maximum file size
    pub fn with_max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Replace the ordered encoding list
    pub fn with_encodings(mut self, encodings: Vec<SourceEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Enable or disable the pattern fallback scanner
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback_on_error = fallback;
        self
    }
}
