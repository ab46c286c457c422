// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

use crate::BandError;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BandOptions {
    /// Bits per row. Rows start at multiples of 8, so this is a multiple of 8.
    #[serde(default = "BandOptions::default_width")]
    #[validate(range(min = 8, max = 4096), custom(function = BandOptions::validate_width))]
    pub width: u32,
    /// Table cells per stored pair, not counting the `width` cells of slack.
    #[serde(default = "BandOptions::default_expansion")]
    #[validate(range(min = 1.0, max = 16.0))]
    pub expansion: f64,
    #[serde(default = "BandOptions::default_seed")]
    pub seed: u64,
}

impl BandOptions {
    fn default_width() -> u32 {
        256
    }
    fn validate_width(width: u32) -> Result<(), ValidationError> {
        if width % 8 != 0 {
            return Err(ValidationError::new("`width` should be a multiple of 8"));
        }
        Ok(())
    }
    fn default_expansion() -> f64 {
        1.03
    }
    fn default_seed() -> u64 {
        0
    }

    /// Reads options from TOML, for example `width = 128`.
    pub fn parse(s: &str) -> Result<Self, BandError> {
        let options = toml::from_str::<Self>(s)?;
        options.validate()?;
        Ok(options)
    }

    /// Number of table cells for `n` pairs.
    pub fn cells(&self, n: usize) -> usize {
        (n as f64 * self.expansion).ceil() as usize + self.width as usize
    }
}

impl Default for BandOptions {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            expansion: Self::default_expansion(),
            seed: Self::default_seed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = BandOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.width, 256);
        assert_eq!(options.cells(0), 256);
        assert_eq!(options.cells(100), 103 + 256);
    }

    #[test]
    fn parse_fills_defaults() {
        let options = BandOptions::parse("width = 128\nseed = 7").unwrap();
        assert_eq!(options.width, 128);
        assert_eq!(options.seed, 7);
        assert_eq!(options.expansion, 1.03);
        let options = BandOptions::parse("").unwrap();
        assert_eq!(options.width, 256);
    }

    #[test]
    fn parse_rejects_bad_options() {
        assert!(matches!(
            BandOptions::parse("width = 100"),
            Err(BandError::InvalidOptions(_))
        ));
        assert!(matches!(
            BandOptions::parse("width = 0"),
            Err(BandError::InvalidOptions(_))
        ));
        assert!(matches!(
            BandOptions::parse("expansion = 0.5"),
            Err(BandError::InvalidOptions(_))
        ));
        assert!(matches!(
            BandOptions::parse("lists = [1]"),
            Err(BandError::Parse(_))
        ));
        assert!(matches!(
            BandOptions::parse("width = \"wide\""),
            Err(BandError::Parse(_))
        ));
    }
}
