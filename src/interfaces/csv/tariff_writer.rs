use crate::application::system_fees::MatchedFee;
use crate::domain::tariff::TariffRate;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PaymentTierRow<'a> {
    region: &'a str,
    method_name: &'a str,
    payout_currency: &'a str,
    min_amount: Decimal,
    max_amount: Decimal,
    payer_region: &'a str,
    country: &'a str,
    method_percent_fee: Decimal,
    method_fixed_fee: Decimal,
    method_fixed_fee_currency: &'a str,
    ps_percent_fee: Decimal,
    ps_fixed_fee: Decimal,
    ps_fixed_fee_currency: &'a str,
}

#[derive(Serialize)]
struct MatchedFeeRow<'a> {
    tier_index: u32,
    transaction_percent_fee: Decimal,
    transaction_percent_currency: &'a str,
    transaction_fix_amount: Decimal,
    transaction_fix_currency: &'a str,
    authorization_percent_fee: Decimal,
    authorization_percent_currency: &'a str,
    authorization_fix_amount: Decimal,
    authorization_fix_currency: &'a str,
}

/// Writes resolved tariffs and matched fees as CSV reports.
pub struct TariffWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TariffWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per payment tier, templates in resolution order.
    pub fn write_payment_tiers(&mut self, templates: &[TariffRate]) -> Result<()> {
        for template in templates {
            for tier in &template.payment {
                self.writer.serialize(PaymentTierRow {
                    region: &template.region,
                    method_name: &tier.method_name,
                    payout_currency: &tier.payout_currency,
                    min_amount: tier.min_amount,
                    max_amount: tier.max_amount,
                    payer_region: &tier.payer_region,
                    country: &tier.country,
                    method_percent_fee: tier.method_percent_fee,
                    method_fixed_fee: tier.method_fixed_fee,
                    method_fixed_fee_currency: &tier.method_fixed_fee_currency,
                    ps_percent_fee: tier.ps_percent_fee,
                    ps_fixed_fee: tier.ps_fixed_fee,
                    ps_fixed_fee_currency: &tier.ps_fixed_fee_currency,
                })?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_matched_fee(&mut self, fee: &MatchedFee) -> Result<()> {
        let tx = &fee.transaction_cost;
        let auth = &fee.authorization_fee;
        self.writer.serialize(MatchedFeeRow {
            tier_index: fee.tier_index,
            transaction_percent_fee: tx.percent_fee,
            transaction_percent_currency: &tx.percent_currency,
            transaction_fix_amount: tx.fix_amount,
            transaction_fix_currency: &tx.fix_currency,
            authorization_percent_fee: auth.percent_fee,
            authorization_percent_currency: &auth.percent_currency,
            authorization_fix_amount: auth.fix_amount,
            authorization_fix_currency: &auth.fix_currency,
        })?;
        self.writer.flush()?;
        Ok(())
    }
}
