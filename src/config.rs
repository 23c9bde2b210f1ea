//! Runtime settings.

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const ENV_PREFIX: &str = "MERCHANT_TARIFFS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Decimal places every system fee amount is rounded to.
    pub fee_precision: u32,
    /// Payment method group alias that marks bank card methods.
    pub bank_card_group: String,
    /// Whether materialization ends by asking for the agreement document.
    pub generate_agreement: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fee_precision: 4,
            bank_card_group: "BANKCARD".to_string(),
            generate_agreement: true,
        }
    }
}

impl Settings {
    /// Defaults, overridden by `file` (if any), overridden by `MERCHANT_TARIFFS_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
