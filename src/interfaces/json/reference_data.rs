use crate::application::system_fees::{AddSystemFeesRequest, SystemFeeService};
use crate::domain::fees::{FeeTier, PaymentMethod};
use crate::domain::ports::Backends;
use crate::domain::tariff::TariffRate;
use crate::error::{BillingError, Result};
use serde::Deserialize;
use std::io::Read;
use tracing::debug;

/// A fee set as found in a reference data file.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemFeeSet {
    pub method_id: String,
    pub region: String,
    #[serde(default)]
    pub card_brand: Option<String>,
    pub fees: Vec<FeeTier>,
}

/// Tariff templates, payment methods and system fee sets loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub tariffs: Vec<TariffRate>,
    pub payment_methods: Vec<PaymentMethod>,
    pub system_fees: Vec<SystemFeeSet>,
}

impl ReferenceData {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    /// Loads the data into the backends. Fee sets go through the same
    /// validation and normalization as any other write.
    pub async fn seed(self, backends: &Backends, fees: &SystemFeeService) -> Result<()> {
        for template in self.tariffs {
            backends.tariffs.insert(template).await?;
        }
        for method in self.payment_methods {
            backends.payment_methods.store(method).await?;
        }
        for set in self.system_fees {
            let rsp = fees
                .add_system_fees(AddSystemFeesRequest {
                    method_id: set.method_id.clone(),
                    region: set.region.clone(),
                    card_brand: set.card_brand.clone(),
                    fees: set.fees,
                    user_id: None,
                })
                .await;
            if let Some(message) = rsp.message {
                return Err(BillingError::ValidationError(format!(
                    "fee set {}/{}/{}: {} ({})",
                    set.method_id,
                    set.region,
                    set.card_brand.as_deref().unwrap_or("-"),
                    message.message,
                    message.code
                )));
            }
            debug!(method_id = %set.method_id, region = %set.region, "fee set seeded");
        }
        Ok(())
    }
}
