use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// A required semantic field has no matching header in its dataset.
    SchemaFieldMissing { field: String, aliases: Vec<String> },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (unknown field, empty suffix, etc.).
    ConfigValidation(String),
    /// Malformed CSV input or output.
    Csv(String),
}

impl MatchError {
    /// Friendly field name for `SchemaFieldMissing`, if that's what this is.
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            Self::SchemaFieldMissing { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaFieldMissing { field, aliases } => {
                write!(f, "{field} column not found. Tried: {}", aliases.join(", "))
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<csv::Error> for MatchError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
