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

#[derive(Debug, thiserror::Error)]
pub enum BandError {
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] validator::ValidationErrors),
    #[error("failed to parse options: {0}")]
    Parse(#[from] toml::de::Error),
    /// The row of the pair at `index` became all-zero during elimination.
    /// Retry with another seed or a larger expansion.
    #[error("the system is singular at pair {index}")]
    Singular { index: usize },
    #[error("malformed table: {reason}")]
    Malformed { reason: &'static str },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
