use crate::domain::merchant::MerchantId;
use crate::domain::tariff::{FixedCost, MoneyBackTier, PaymentTier, UndoReason};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Merchant-owned copy of a tariff payment tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantPaymentChannelCost {
    pub id: Uuid,
    pub merchant_id: MerchantId,
    pub method_name: String,
    pub payout_currency: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub region: String,
    pub country: String,
    pub method_percent_fee: Decimal,
    pub method_fixed_fee: Decimal,
    pub method_fixed_fee_currency: String,
    pub ps_percent_fee: Decimal,
    pub ps_fixed_fee: Decimal,
    pub ps_fixed_fee_currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl MerchantPaymentChannelCost {
    pub fn from_tier(merchant_id: MerchantId, tier: &PaymentTier, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            merchant_id,
            method_name: tier.method_name.clone(),
            payout_currency: tier.payout_currency.clone(),
            min_amount: tier.min_amount,
            max_amount: tier.max_amount,
            region: tier.payer_region.clone(),
            country: tier.country.clone(),
            method_percent_fee: tier.method_percent_fee,
            method_fixed_fee: tier.method_fixed_fee,
            method_fixed_fee_currency: tier.method_fixed_fee_currency.clone(),
            ps_percent_fee: tier.ps_percent_fee,
            ps_fixed_fee: tier.ps_fixed_fee,
            ps_fixed_fee_currency: tier.ps_fixed_fee_currency.clone(),
            is_active: true,
            created_at: at,
        }
    }
}

/// Merchant-owned copy of a tariff money-back tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantMoneyBackCost {
    pub id: Uuid,
    pub merchant_id: MerchantId,
    pub method_name: String,
    pub payout_currency: String,
    pub undo_reason: UndoReason,
    pub region: String,
    pub country: String,
    pub days_from: u32,
    pub days_to: u32,
    pub payment_stage: u32,
    pub percent_fee: Decimal,
    pub fixed_fee: Decimal,
    pub fixed_fee_currency: String,
    pub is_paid_by_merchant: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl MerchantMoneyBackCost {
    /// One record per payer: the cost applies whoever ends up paying it.
    pub fn pair_from_tier(
        merchant_id: MerchantId,
        tier: &MoneyBackTier,
        payout_currency: &str,
        at: DateTime<Utc>,
    ) -> [Self; 2] {
        [true, false].map(|is_paid_by_merchant| Self {
            id: Uuid::new_v4(),
            merchant_id,
            method_name: tier.method_name.clone(),
            payout_currency: payout_currency.to_string(),
            undo_reason: tier.undo_reason,
            region: tier.payer_region.clone(),
            country: tier.country.clone(),
            days_from: tier.days_from,
            days_to: tier.days_to,
            payment_stage: tier.payment_stage,
            percent_fee: tier.percent_fee,
            fixed_fee: tier.fixed_fee,
            fixed_fee_currency: tier.fixed_fee_currency.clone(),
            is_paid_by_merchant,
            is_active: true,
            created_at: at,
        })
    }
}

/// Platform-wide payout cost. Soft-versioned: only one record is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutCostSystem {
    pub id: Uuid,
    pub cost: FixedCost,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PayoutCostSystem {
    pub fn new(cost: FixedCost) -> Self {
        Self {
            id: Uuid::new_v4(),
            cost,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
