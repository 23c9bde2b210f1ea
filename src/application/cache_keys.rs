//! Cache key shapes shared with every other reader/writer of the cache.

use crate::domain::fees::FeeSetKey;
use crate::domain::merchant::MerchantId;
use crate::domain::tariff::TariffFilter;
use crate::error::Result;
use sha2::{Digest, Sha256};

pub const TARIFF_RATES_PREFIX: &str = "merchant_tariff_rates:";
pub const SYSTEM_FEES_PREFIX: &str = "system_fees:";
pub const PAYOUT_COST_SYSTEM: &str = "payout_cost_system";
pub const PAYMENT_CHANNEL_COSTS_ALL_PREFIX: &str = "cost_payment_channel:merchant:all:";
pub const MONEY_BACK_COSTS_ALL_PREFIX: &str = "cost_money_back:merchant:all:";

/// Prefix + hex SHA-256 of the normalized filter, so equivalent requests share a slot.
pub fn tariff_rates(filter: &TariffFilter) -> Result<String> {
    let payload = serde_json::to_vec(filter)?;
    let digest = Sha256::digest(&payload);
    Ok(format!("{TARIFF_RATES_PREFIX}{digest:x}"))
}

pub fn system_fees(key: &FeeSetKey) -> String {
    format!(
        "{SYSTEM_FEES_PREFIX}{}:{}:{}",
        key.method_id,
        key.region,
        key.card_brand.map(|b| b.as_str()).unwrap_or_default()
    )
}

pub fn payment_channel_costs_all(merchant_id: &MerchantId) -> String {
    format!("{PAYMENT_CHANNEL_COSTS_ALL_PREFIX}{merchant_id}")
}

pub fn money_back_costs_all(merchant_id: &MerchantId) -> String {
    format!("{MONEY_BACK_COSTS_ALL_PREFIX}{merchant_id}")
}
