use std::fmt;

/// Problems found while loading or validating a [`super::TerrainConfig`].
#[derive(Debug)]
pub enum TerrainConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration file is not valid TOML for a terrain config.
    Parse(toml::de::Error),
    ZeroChunkSize,
    InvalidUnitSize(f32),
    InvalidSeedRange(i32),
    NoLayers,
    DuplicateLayer(String),
    /// A layer with a non-zero wave speed divides by `wave_subspeed^i`.
    InvalidWaveSubspeed { layer: String, value: f32 },
    NonFinite { layer: String, field: &'static str },
}

impl fmt::Display for TerrainConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainConfigError::Io(e) => write!(f, "I/O error: {e}"),
            TerrainConfigError::Parse(e) => write!(f, "Parse error: {e}"),
            TerrainConfigError::ZeroChunkSize => write!(f, "Chunk size must be at least 1"),
            TerrainConfigError::InvalidUnitSize(value) => {
                write!(f, "Unit size must be positive and finite, got {value}")
            }
            TerrainConfigError::InvalidSeedRange(value) => {
                write!(f, "Seed range must not be negative, got {value}")
            }
            TerrainConfigError::NoLayers => write!(f, "At least one terrain layer is required"),
            TerrainConfigError::DuplicateLayer(name) => {
                write!(f, "Duplicate terrain layer name: {name}")
            }
            TerrainConfigError::InvalidWaveSubspeed { layer, value } => write!(
                f,
                "Layer {layer}: wave_subspeed must be positive, got {value}"
            ),
            TerrainConfigError::NonFinite { layer, field } => {
                write!(f, "Layer {layer}: {field} must be finite")
            }
        }
    }
}

impl std::error::Error for TerrainConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerrainConfigError::Io(e) => Some(e),
            TerrainConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TerrainConfigError {
    fn from(e: std::io::Error) -> Self {
        TerrainConfigError::Io(e)
    }
}

impl From<toml::de::Error> for TerrainConfigError {
    fn from(e: toml::de::Error) -> Self {
        TerrainConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_io() {
        let err = TerrainConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "terrain.toml",
        ));
        let msg = format!("{err}");
        assert!(msg.contains("I/O error"), "got: {msg}");
        assert!(msg.contains("terrain.toml"), "got: {msg}");
    }

    #[test]
    fn test_display_wave_subspeed() {
        let err = TerrainConfigError::InvalidWaveSubspeed {
            layer: "fluid".to_string(),
            value: 0.0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("fluid"), "got: {msg}");
        assert!(msg.contains("wave_subspeed"), "got: {msg}");
    }

    #[test]
    fn test_from_parse_error() {
        let parse_err = toml::from_str::<toml::Table>("chunk_size = = 3").unwrap_err();
        let err: TerrainConfigError = parse_err.into();
        assert!(matches!(err, TerrainConfigError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
