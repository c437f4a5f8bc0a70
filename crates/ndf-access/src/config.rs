//! Library configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use ndf_core::{StorageForm, MAX_DIMS};

// ── LibraryConfig ──────────────────────────────────────────────────

/// Tunables for a [`Library`](crate::Library).
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryConfig {
    /// Maximum dimensionality accepted for new objects and sections.
    /// Default: 7. Must be in `1..=MAX_DIMS`.
    pub max_dims: usize,
    /// Mask Data and Variance against Quality when they are mapped for
    /// read or update. Default: `true`.
    pub auto_quality_masking: bool,
    /// Storage form for arrays created with no recorded form hint.
    /// Default: [`StorageForm::Simple`].
    pub default_form: StorageForm,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            max_dims: MAX_DIMS,
            auto_quality_masking: true,
            default_form: StorageForm::Simple,
        }
    }
}

impl LibraryConfig {
    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidMaxDims`] if `max_dims` is zero or exceeds
    /// [`MAX_DIMS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dims == 0 || self.max_dims > MAX_DIMS {
            return Err(ConfigError::InvalidMaxDims {
                value: self.max_dims,
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`LibraryConfig::validate()`].
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_dims` is outside `1..=MAX_DIMS`.
    InvalidMaxDims {
        /// The configured value.
        value: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxDims { value } => {
                write!(f, "max_dims must be in 1..={MAX_DIMS}, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = LibraryConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_dims, 7);
        assert!(cfg.auto_quality_masking);
    }

    #[test]
    fn zero_dims_rejected() {
        let cfg = LibraryConfig {
            max_dims: 0,
            ..LibraryConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidMaxDims { value: 0 }));
    }

    #[test]
    fn too_many_dims_rejected() {
        let cfg = LibraryConfig {
            max_dims: MAX_DIMS + 1,
            ..LibraryConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidMaxDims { value: 8 }) => {}
            other => panic!("expected InvalidMaxDims, got {other:?}"),
        }
    }
}
