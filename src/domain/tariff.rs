use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Half-open amount interval `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    from: Decimal,
    to: Decimal,
}

impl AmountRange {
    /// Returns `None` unless `from >= 0` and `to > from`.
    pub fn new(from: Decimal, to: Decimal) -> Option<Self> {
        (from >= Decimal::ZERO && to > from).then(|| Self {
            from: from.normalize(),
            to: to.normalize(),
        })
    }

    pub fn from(&self) -> Decimal {
        self.from
    }

    pub fn to(&self) -> Decimal {
        self.to
    }

    pub fn intersects(&self, from: Decimal, to: Decimal) -> bool {
        from < self.to && self.from < to
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedCost {
    pub amount: Decimal,
    pub currency: String,
}

/// A payment tier of a tariff template.
///
/// The `method_*` fields are what the payment method provider charges, the
/// `ps_*` fields are the platform's own fee on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTier {
    pub method_name: String,
    pub payout_currency: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub payer_region: String,
    #[serde(default)]
    pub country: String,
    pub method_percent_fee: Decimal,
    pub method_fixed_fee: Decimal,
    pub method_fixed_fee_currency: String,
    pub ps_percent_fee: Decimal,
    pub ps_fixed_fee: Decimal,
    pub ps_fixed_fee_currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoReason {
    Refund,
    Reversal,
    Chargeback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyBackTier {
    pub method_name: String,
    pub undo_reason: UndoReason,
    pub payer_region: String,
    #[serde(default)]
    pub country: String,
    pub days_from: u32,
    pub days_to: u32,
    pub payment_stage: u32,
    pub percent_fee: Decimal,
    pub fixed_fee: Decimal,
    pub fixed_fee_currency: String,
    #[serde(default)]
    pub is_paid_by_merchant: bool,
}

/// Region-scoped generic fee schedule. Reference data, never edited by onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRate {
    pub region: String,
    pub payment: Vec<PaymentTier>,
    pub money_back: Vec<MoneyBackTier>,
    pub payout: FixedCost,
    pub chargeback: FixedCost,
}

/// Typed tariff lookup filter. Build it with [`TariffFilter::builder`].
///
/// Its serialized form is the normalized request the cache key is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TariffFilter {
    region: String,
    payout_currency: Option<String>,
    amount_range: Option<AmountRange>,
}

impl TariffFilter {
    pub fn builder(region: impl Into<String>) -> TariffFilterBuilder {
        TariffFilterBuilder {
            region: region.into(),
            payout_currency: None,
            amount_from: None,
            amount_to: None,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn payout_currency(&self) -> Option<&str> {
        self.payout_currency.as_deref()
    }

    pub fn amount_range(&self) -> Option<AmountRange> {
        self.amount_range
    }

    pub fn matches_tier(&self, tier: &PaymentTier) -> bool {
        let currency_ok = self
            .payout_currency
            .as_deref()
            .is_none_or(|c| tier.payout_currency.eq_ignore_ascii_case(c));
        let range_ok = self
            .amount_range
            .is_none_or(|r| r.intersects(tier.min_amount, tier.max_amount));
        currency_ok && range_ok
    }

    /// Narrows a template to this filter, or `None` if it does not apply.
    pub fn apply(&self, template: &TariffRate) -> Option<TariffRate> {
        if template.region != self.region {
            return None;
        }

        let payment: Vec<PaymentTier> = template
            .payment
            .iter()
            .filter(|tier| self.matches_tier(tier))
            .cloned()
            .collect();

        let narrowed = self.payout_currency.is_some() || self.amount_range.is_some();
        if narrowed && payment.is_empty() {
            return None;
        }

        Some(TariffRate {
            payment,
            ..template.clone()
        })
    }
}

pub struct TariffFilterBuilder {
    region: String,
    payout_currency: Option<String>,
    amount_from: Option<Decimal>,
    amount_to: Option<Decimal>,
}

impl TariffFilterBuilder {
    /// Blank currencies are treated as absent.
    pub fn payout_currency(mut self, currency: Option<&str>) -> Self {
        self.payout_currency = currency
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);
        self
    }

    /// The range filter only applies when both bounds are present and form a
    /// valid `[from, to)` interval; anything else skips it entirely.
    pub fn amount_bounds(mut self, from: Option<Decimal>, to: Option<Decimal>) -> Self {
        self.amount_from = from;
        self.amount_to = to;
        self
    }

    pub fn build(self) -> TariffFilter {
        let amount_range = match (self.amount_from, self.amount_to) {
            (Some(from), Some(to)) => AmountRange::new(from, to),
            _ => None,
        };
        TariffFilter {
            region: self.region,
            payout_currency: self.payout_currency,
            amount_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tier(currency: &str, min: Decimal, max: Decimal) -> PaymentTier {
        PaymentTier {
            method_name: "VISA".into(),
            payout_currency: currency.into(),
            min_amount: min,
            max_amount: max,
            payer_region: "CIS".into(),
            country: String::new(),
            method_percent_fee: dec!(0.018),
            method_fixed_fee: dec!(0.2),
            method_fixed_fee_currency: "USD".into(),
            ps_percent_fee: dec!(0.05),
            ps_fixed_fee: dec!(0.05),
            ps_fixed_fee_currency: "USD".into(),
        }
    }

    fn template() -> TariffRate {
        TariffRate {
            region: "CIS".into(),
            payment: vec![
                tier("USD", dec!(0.75), dec!(5)),
                tier("USD", dec!(5), dec!(100)),
                tier("RUB", dec!(0.75), dec!(5)),
            ],
            money_back: vec![],
            payout: FixedCost {
                amount: dec!(25),
                currency: "USD".into(),
            },
            chargeback: FixedCost {
                amount: dec!(10),
                currency: "USD".into(),
            },
        }
    }

    #[test]
    fn test_range_requires_both_valid_bounds() {
        let only_from = TariffFilter::builder("CIS")
            .amount_bounds(Some(dec!(1)), None)
            .build();
        assert_eq!(only_from.amount_range(), None);

        let inverted = TariffFilter::builder("CIS")
            .amount_bounds(Some(dec!(5)), Some(dec!(1)))
            .build();
        assert_eq!(inverted.amount_range(), None);

        let negative = TariffFilter::builder("CIS")
            .amount_bounds(Some(dec!(-1)), Some(dec!(1)))
            .build();
        assert_eq!(negative.amount_range(), None);

        let valid = TariffFilter::builder("CIS")
            .amount_bounds(Some(dec!(0)), Some(dec!(1)))
            .build();
        assert!(valid.amount_range().is_some());
    }

    #[test]
    fn test_range_is_half_open() {
        let range = AmountRange::new(dec!(0.75), dec!(5)).unwrap();
        assert!(range.intersects(dec!(0.75), dec!(5)));
        assert!(!range.intersects(dec!(5), dec!(100)));
        assert!(range.intersects(dec!(4.99), dec!(100)));
        assert!(!range.intersects(dec!(0), dec!(0.75)));
    }

    #[test]
    fn test_apply_filters_currency_and_range() {
        let filter = TariffFilter::builder("CIS")
            .payout_currency(Some("usd"))
            .amount_bounds(Some(dec!(0.75)), Some(dec!(5)))
            .build();
        let narrowed = filter.apply(&template()).unwrap();
        assert_eq!(narrowed.payment.len(), 1);
        assert_eq!(narrowed.payment[0].max_amount, dec!(5));
    }

    #[test]
    fn test_apply_without_optional_filters_keeps_everything() {
        let filter = TariffFilter::builder("CIS").build();
        assert_eq!(filter.apply(&template()).unwrap().payment.len(), 3);
    }

    #[test]
    fn test_apply_drops_other_regions_and_emptied_templates() {
        assert!(TariffFilter::builder("EU").build().apply(&template()).is_none());

        let filter = TariffFilter::builder("CIS")
            .payout_currency(Some("EUR"))
            .build();
        assert!(filter.apply(&template()).is_none());
    }

    #[test]
    fn test_blank_currency_is_absent() {
        let filter = TariffFilter::builder("CIS").payout_currency(Some("  ")).build();
        assert_eq!(filter.payout_currency(), None);
    }
}
