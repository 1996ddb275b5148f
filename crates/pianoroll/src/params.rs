//! Conversion parameters and their TOML form.
//!
//! ```toml
//! quantization = 8
//! pitch_range = 128
//! discard_grace = false
//! horizon = 4
//! ```
//!
//! Every field is optional in the file; missing fields take the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};

/// Parameters for one conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertParams {
    /// Pianoroll steps per quarter note.
    /// Default: 8
    #[serde(default = "ConvertParams::default_quantization")]
    pub quantization: u32,

    /// Number of pitch columns.
    /// Default: 128
    #[serde(default = "ConvertParams::default_pitch_range")]
    pub pitch_range: usize,

    /// Drop grace notes instead of writing them one step early.
    /// Default: false
    #[serde(default)]
    pub discard_grace: bool,

    /// Quarter notes covered by a written "cresc."/"dim.", also passed to
    /// the smoother.
    /// Default: 4
    #[serde(default = "ConvertParams::default_horizon")]
    pub horizon: u32,
}

impl ConvertParams {
    fn default_quantization() -> u32 {
        8
    }

    fn default_pitch_range() -> usize {
        128
    }

    fn default_horizon() -> u32 {
        4
    }

    pub fn with_quantization(mut self, quantization: u32) -> Self {
        self.quantization = quantization;
        self
    }

    pub fn with_discard_grace(mut self, discard_grace: bool) -> Self {
        self.discard_grace = discard_grace;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.quantization == 0 {
            return Err(Error::InvalidParams("quantization must be positive".into()));
        }
        if self.pitch_range == 0 {
            return Err(Error::InvalidParams("pitch_range must be positive".into()));
        }
        if self.horizon == 0 {
            return Err(Error::InvalidParams("horizon must be positive".into()));
        }
        if self.horizon.checked_mul(self.quantization).is_none() {
            return Err(Error::InvalidParams(
                "horizon * quantization does not fit in 32 bits".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate parameters from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, Path::new("<string>"))
    }

    /// Load and validate parameters from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let params: ConvertParams = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for ConvertParams {
    fn default() -> Self {
        ConvertParams {
            quantization: Self::default_quantization(),
            pitch_range: Self::default_pitch_range(),
            discard_grace: false,
            horizon: Self::default_horizon(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let params = ConvertParams::default();
        assert_eq!(params.quantization, 8);
        assert_eq!(params.pitch_range, 128);
        assert!(!params.discard_grace);
        assert_eq!(params.horizon, 4);
    }

    #[test]
    fn test_partial_toml() {
        let text = "quantization = 4\ndiscard_grace = true\n";
        let params = ConvertParams::from_toml_str(text).unwrap();
        assert_eq!(params.quantization, 4);
        assert!(params.discard_grace);
        assert_eq!(params.pitch_range, 128);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ConvertParams::from_toml_str("").unwrap(), ConvertParams::default());
    }

    #[test]
    fn test_zero_quantization_rejected() {
        let err = ConvertParams::from_toml_str("quantization = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(Error::InvalidParams(_))));
    }

    #[test]
    fn test_horizon_steps_must_fit() {
        let params = ConvertParams {
            horizon: u32::MAX,
            ..ConvertParams::default()
        };
        assert!(matches!(params.validate(), Err(Error::InvalidParams(_))));

        let text = "quantization = 65536\nhorizon = 65536\n";
        let err = ConvertParams::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(Error::InvalidParams(_))));
    }

    #[test]
    fn test_bad_toml() {
        let err = ConvertParams::from_toml_str("quantization = \"eight\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let params = ConvertParams::default().with_quantization(12);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(params.to_toml().as_bytes()).unwrap();

        let loaded = ConvertParams::load(file.path()).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_missing_file() {
        let err = ConvertParams::load(Path::new("/nonexistent/pianoroll.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
