use crate::foundation::core::Dimensions;

pub type CoverlapResult<T> = Result<T, CoverlapError>;

#[derive(thiserror::Error, Debug)]
pub enum CoverlapError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("dimension mismatch in group '{group}': expected {expected}, found {found}")]
    DimensionMismatch {
        group: String,
        expected: Dimensions,
        found: Dimensions,
    },

    #[error("placemark parse error: {0}")]
    PlacemarkParse(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("output key collision: {0}")]
    KeyCollision(String),

    #[error("invalid output key: {0}")]
    InvalidKey(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoverlapError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn dimension_mismatch(
        group: impl Into<String>,
        expected: Dimensions,
        found: Dimensions,
    ) -> Self {
        Self::DimensionMismatch {
            group: group.into(),
            expected,
            found,
        }
    }

    pub fn placemark_parse(msg: impl Into<String>) -> Self {
        Self::PlacemarkParse(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn key_collision(msg: impl Into<String>) -> Self {
        Self::KeyCollision(msg.into())
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CoverlapError::decode("x")
                .to_string()
                .contains("decode error:")
        );
        assert!(
            CoverlapError::placemark_parse("x")
                .to_string()
                .contains("placemark parse error:")
        );
        assert!(
            CoverlapError::archive("x")
                .to_string()
                .contains("archive error:")
        );
        assert!(
            CoverlapError::key_collision("x")
                .to_string()
                .contains("output key collision:")
        );
        assert!(
            CoverlapError::invalid_key("x")
                .to_string()
                .contains("invalid output key:")
        );
        assert!(
            CoverlapError::config("x")
                .to_string()
                .contains("config error:")
        );
    }

    #[test]
    fn dimension_mismatch_names_group_and_sizes() {
        let err = CoverlapError::dimension_mismatch(
            "cloakpA.png",
            Dimensions::new(2, 2),
            Dimensions::new(3, 1),
        );
        let msg = err.to_string();
        assert!(msg.contains("cloakpA.png"));
        assert!(msg.contains("2x2"));
        assert!(msg.contains("3x1"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CoverlapError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
