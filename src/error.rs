use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },

    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("unterminated attribute value starting at byte {offset}")]
    UnterminatedAttribute { offset: usize },

    #[error("missing tag name at byte {offset}")]
    MissingTagName { offset: usize },

    #[error("closing tag </{tag}> at byte {offset} has no matching open element")]
    UnexpectedClosingTag { tag: String, offset: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse editor config: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("invalid editor config: {0}")]
    Invalid(String),
}
