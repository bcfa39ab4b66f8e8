use serde::{Deserialize, Serialize};

use super::super::note::DEFAULT_DECIMAL_CREDIT_THRESHOLD;

/// Tunables for the validation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Courses weighing at least this many credits accept fractional scores.
    pub decimal_credit_threshold: f32,
}

impl EncodingConfig {
    /// Threshold applied by the pipeline; never below the default, which stored records rely on.
    pub fn decimal_threshold(&self) -> f32 {
        self.decimal_credit_threshold.max(DEFAULT_DECIMAL_CREDIT_THRESHOLD)
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            decimal_credit_threshold: DEFAULT_DECIMAL_CREDIT_THRESHOLD,
        }
    }
}
