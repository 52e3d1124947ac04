//! Predictor model-size selector.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Speed/accuracy selector, ordered smallest (fastest) to largest (most accurate).
///
/// Parsing never fails: unrecognised names fall back to `Xlarge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ModelSize {
    Xxsmall,
    Xsmall,
    Small,
    Medium,
    Large,
    #[default]
    Xlarge,
    Xxlarge,
    Xxxlarge,
}

impl ModelSize {
    pub const ALL: [ModelSize; 8] = [
        ModelSize::Xxsmall,
        ModelSize::Xsmall,
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::Large,
        ModelSize::Xlarge,
        ModelSize::Xxlarge,
        ModelSize::Xxxlarge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xxsmall => "xxsmall",
            Self::Xsmall => "xsmall",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::Xxlarge => "xxlarge",
            Self::Xxxlarge => "xxxlarge",
        }
    }

    pub fn parse_lossy(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .unwrap_or_default()
    }
}

impl FromStr for ModelSize {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lossy(s))
    }
}

impl From<String> for ModelSize {
    fn from(s: String) -> Self {
        Self::parse_lossy(&s)
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
