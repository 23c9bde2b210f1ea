use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    pub group_alias: String,
}

impl PaymentMethod {
    pub fn is_bank_card(&self, bank_card_group: &str) -> bool {
        self.group_alias.eq_ignore_ascii_case(bank_card_group)
    }
}

/// Card brands system fees can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Maestro,
    Jcb,
    Amex,
    Unionpay,
    Diners,
}

impl CardBrand {
    pub const ALL: [CardBrand; 7] = [
        Self::Visa,
        Self::Mastercard,
        Self::Maestro,
        Self::Jcb,
        Self::Amex,
        Self::Unionpay,
        Self::Diners,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "VISA",
            Self::Mastercard => "MASTERCARD",
            Self::Maestro => "MAESTRO",
            Self::Jcb => "JCB",
            Self::Amex => "AMEX",
            Self::Unionpay => "UNIONPAY",
            Self::Diners => "DINERS",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown card brand `{0}`")]
pub struct UnknownCardBrand(pub String);

impl FromStr for CardBrand {
    type Err = UnknownCardBrand;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|brand| brand.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCardBrand(value.to_string()))
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percent plus fixed part of a fee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAmount {
    pub percent_fee: Decimal,
    pub percent_currency: String,
    pub fix_amount: Decimal,
    pub fix_currency: String,
}

impl FeeAmount {
    fn round(&mut self, precision: u32) {
        self.percent_fee = round_to(self.percent_fee, precision);
        self.fix_amount = round_to(self.fix_amount, precision);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    /// Currency -> minimum payment amount for the tier to apply.
    pub min_amounts: BTreeMap<String, Decimal>,
    pub transaction_cost: FeeAmount,
    pub authorization_fee: FeeAmount,
}

impl FeeTier {
    /// Rounds every percent/fixed field to the canonical precision and
    /// upper-cases the threshold currencies, matching how lookups are keyed.
    ///
    /// Thresholds themselves are kept as given. When two keys collapse into
    /// the same currency the later one (in key order) wins.
    pub fn normalize(&mut self, precision: u32) {
        self.min_amounts = std::mem::take(&mut self.min_amounts)
            .into_iter()
            .map(|(currency, min)| (currency.trim().to_uppercase(), min))
            .collect();
        self.transaction_cost.round(precision);
        self.authorization_fee.round(precision);
    }
}

pub fn round_to(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

/// The tuple a system fee set is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeSetKey {
    pub method_id: String,
    pub region: String,
    pub card_brand: Option<CardBrand>,
}

/// Tiered fee schedule applied at payment authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemFees {
    pub id: Uuid,
    pub key: FeeSetKey,
    /// Ordinal tier index -> tier.
    pub fees: BTreeMap<u32, FeeTier>,
    pub user_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SystemFees {
    pub fn new(key: FeeSetKey, tiers: Vec<FeeTier>, user_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            fees: (0u32..).zip(tiers).collect(),
            user_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn matching_tier(&self, currency: &str, amount: Decimal) -> Option<(u32, &FeeTier)> {
        match_tier(&self.fees, currency, amount)
    }
}

/// Picks the tier with the highest `min_amounts[currency]` that is `<= amount`.
///
/// Tiers without a threshold for `currency` never match. Equal thresholds
/// resolve to the lowest tier index.
pub fn match_tier<'a>(
    fees: &'a BTreeMap<u32, FeeTier>,
    currency: &str,
    amount: Decimal,
) -> Option<(u32, &'a FeeTier)> {
    let mut matched: Vec<(u32, Decimal)> = fees
        .iter()
        .filter_map(|(index, tier)| {
            tier.min_amounts
                .get(currency)
                .filter(|min| **min <= amount)
                .map(|min| (*index, *min))
        })
        .collect();

    // stable: ties keep ascending index order
    matched.sort_by(|a, b| b.1.cmp(&a.1));

    matched
        .first()
        .and_then(|(index, _)| fees.get(index).map(|tier| (*index, tier)))
}
