pub type ImagecatResult<T> = Result<T, ImagecatError>;

#[derive(thiserror::Error, Debug)]
pub enum ImagecatError {
    /// An image or layer invariant was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A length expression or other textual parameter could not be parsed.
    #[error("format error: {0}")]
    Format(String),

    /// A named input, task, or Cryptomatte could not be found (or was ambiguous).
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Input data was present but unusable for the requested operation.
    #[error("data error: {0}")]
    Data(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImagecatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ImagecatError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ImagecatError::format("x")
                .to_string()
                .contains("format error:")
        );
        assert!(
            ImagecatError::lookup("x")
                .to_string()
                .contains("lookup error:")
        );
        assert!(ImagecatError::data("x").to_string().contains("data error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ImagecatError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
