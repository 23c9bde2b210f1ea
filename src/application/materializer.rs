//! One-time conversion of a resolved tariff into merchant-owned cost records.
//!
//! The sequence spans several independent writes without a transaction or a
//! compensating rollback. Every committed write is appended to a step log that
//! is reported back on success and on failure alike, so a caller can tell a
//! partial application apart from a clean rejection. Re-running after a
//! partial failure is blocked by the idempotency guard.

use super::cache::WriteThroughCache;
use super::cache_keys;
use super::messages::MessageCode;
use super::notifications::parse_merchant_id;
use super::response::Failure;
use super::tariffs::TariffResolver;
use crate::domain::cost::{MerchantMoneyBackCost, MerchantPaymentChannelCost};
use crate::domain::merchant::{Merchant, MerchantTariff};
use crate::domain::ports::{
    AgreementGeneratorHandle, AgreementOutcome, MerchantCostStoreHandle, MerchantStoreHandle,
};
use crate::domain::tariff::TariffFilter;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct SetTariffRatesRequest {
    pub merchant_id: String,
    pub region: String,
    pub payout_currency: String,
    pub amount_from: Decimal,
    pub amount_to: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationStep {
    PaymentChannelCostsSaved,
    MoneyBackCostsSaved,
    CostCacheInvalidated,
    MerchantUpdated,
    AgreementGenerated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializationReport {
    pub payment_channel_costs: usize,
    pub money_back_costs: usize,
    pub completed_steps: Vec<MaterializationStep>,
}

impl MaterializationReport {
    fn record(&mut self, step: MaterializationStep) {
        self.completed_steps.push(step);
    }

    /// Whether anything was written before the sequence stopped.
    pub fn is_partial(&self) -> bool {
        !self.completed_steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializationFailure {
    pub failure: Failure,
    pub report: MaterializationReport,
}

#[derive(Clone)]
pub struct CostMaterializer {
    merchants: MerchantStoreHandle,
    costs: MerchantCostStoreHandle,
    resolver: TariffResolver,
    cache: WriteThroughCache,
    agreements: Option<AgreementGeneratorHandle>,
}

impl CostMaterializer {
    /// Creates a materializer over the merchant and cost stores.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Resolves the tariff templates the costs are copied from.
    /// * `cache` - Holds the cost listings invalidated after every insert.
    /// * `agreements` - When present, asked for the agreement document as the last step.
    pub fn new(
        merchants: MerchantStoreHandle,
        costs: MerchantCostStoreHandle,
        resolver: TariffResolver,
        cache: WriteThroughCache,
        agreements: Option<AgreementGeneratorHandle>,
    ) -> Self {
        Self {
            merchants,
            costs,
            resolver,
            cache,
            agreements,
        }
    }

    pub async fn materialize(
        &self,
        req: &SetTariffRatesRequest,
    ) -> Result<MaterializationReport, MaterializationFailure> {
        let mut report = MaterializationReport::default();
        let abort = |failure: Failure, report: &MaterializationReport| MaterializationFailure {
            failure,
            report: report.clone(),
        };

        let mut merchant = self
            .load_and_guard(&req.merchant_id)
            .await
            .map_err(|f| abort(f, &report))?;

        let filter = TariffFilter::builder(req.region.as_str())
            .payout_currency(Some(req.payout_currency.as_str()))
            .amount_bounds(Some(req.amount_from), Some(req.amount_to))
            .build();

        let templates = match self.resolver.resolve(&filter).await {
            Ok(templates) if !templates.is_empty() => templates,
            Ok(_) => {
                return Err(abort(Failure::not_found(MessageCode::TariffNotFound), &report));
            }
            Err(e) => {
                error!(collection = "tariff_rates", query = ?filter, error = %e, "tariff resolution failed");
                return Err(abort(Failure::not_found(MessageCode::TariffNotFound), &report));
            }
        };

        let now = Utc::now();
        let payout_currency = req.payout_currency.trim().to_uppercase();

        let payment_costs: Vec<MerchantPaymentChannelCost> = templates
            .iter()
            .flat_map(|t| t.payment.iter())
            .map(|tier| MerchantPaymentChannelCost::from_tier(merchant.id, tier, now))
            .collect();
        let money_back_costs: Vec<MerchantMoneyBackCost> = templates
            .iter()
            .flat_map(|t| t.money_back.iter())
            .flat_map(|tier| {
                MerchantMoneyBackCost::pair_from_tier(merchant.id, tier, &payout_currency, now)
            })
            .collect();

        report.payment_channel_costs = payment_costs.len();
        report.money_back_costs = money_back_costs.len();

        if let Err(e) = self.costs.insert_payment_channel_costs(payment_costs).await {
            error!(collection = "merchant_payment_channel_costs", merchant_id = %merchant.id, error = %e, "cost insert failed");
            return Err(abort(Failure::system(MessageCode::CostSaveFailed), &report));
        }
        report.record(MaterializationStep::PaymentChannelCostsSaved);

        if let Err(e) = self.costs.insert_money_back_costs(money_back_costs).await {
            error!(collection = "merchant_money_back_costs", merchant_id = %merchant.id, completed = ?report.completed_steps, error = %e, "cost insert failed");
            return Err(abort(Failure::system(MessageCode::CostSaveFailed), &report));
        }
        report.record(MaterializationStep::MoneyBackCostsSaved);

        for key in [
            cache_keys::payment_channel_costs_all(&merchant.id),
            cache_keys::money_back_costs_all(&merchant.id),
        ] {
            if let Err(e) = self.cache.invalidate(&key).await {
                error!(%key, merchant_id = %merchant.id, completed = ?report.completed_steps, error = %e, "cost cache invalidation failed");
                return Err(abort(
                    Failure::system(MessageCode::CacheInvalidationFailed),
                    &report,
                ));
            }
        }
        report.record(MaterializationStep::CostCacheInvalidated);

        // every resolved template shares the region, the first one carries the fixed costs
        let template = &templates[0];
        merchant.banking.currency = payout_currency;
        merchant.tariff = Some(MerchantTariff {
            region: template.region.clone(),
            payout: template.payout.clone(),
            chargeback: template.chargeback.clone(),
        });
        merchant.updated_at = now;

        if let Err(e) = self.merchants.store(merchant.clone()).await {
            error!(collection = "merchants", merchant_id = %merchant.id, completed = ?report.completed_steps, error = %e, "merchant update failed");
            return Err(abort(Failure::system(MessageCode::MerchantSaveFailed), &report));
        }
        report.record(MaterializationStep::MerchantUpdated);

        if let Some(generator) = &self.agreements {
            let rejection = match generator.generate(&merchant).await {
                Ok(AgreementOutcome::Generated { file }) => {
                    info!(merchant_id = %merchant.id, %file, "agreement generated");
                    None
                }
                Ok(AgreementOutcome::Rejected { message }) => Some(message),
                Err(e) => Some(e.to_string()),
            };
            if let Some(message) = rejection {
                error!(merchant_id = %merchant.id, completed = ?report.completed_steps, %message, "agreement generation failed after costs were committed");
                return Err(abort(
                    Failure::system(MessageCode::AgreementGenerationFailed).with_details(message),
                    &report,
                ));
            }
            report.record(MaterializationStep::AgreementGenerated);
        }

        info!(
            merchant_id = %merchant.id,
            payment_channel_costs = report.payment_channel_costs,
            money_back_costs = report.money_back_costs,
            "merchant tariff materialized"
        );
        Ok(report)
    }

    async fn load_and_guard(&self, merchant_id: &str) -> Result<Merchant, Failure> {
        let merchant_id = parse_merchant_id(merchant_id)?;

        let merchant = self
            .merchants
            .get(&merchant_id)
            .await
            .map_err(|e| {
                error!(collection = "merchants", %merchant_id, error = %e, "merchant lookup failed");
                Failure::system(MessageCode::UnknownError)
            })?
            .ok_or_else(|| Failure::not_found(MessageCode::MerchantNotFound))?;

        let has_costs = merchant.tariff.is_some()
            || !self
                .costs
                .payment_channel_costs(&merchant_id)
                .await
                .map_err(|e| {
                    error!(collection = "merchant_payment_channel_costs", %merchant_id, error = %e, "cost lookup failed");
                    Failure::system(MessageCode::UnknownError)
                })?
                .is_empty();
        if has_costs {
            return Err(Failure::bad_data(MessageCode::TariffAlreadyExists));
        }

        if !merchant.changes_allowed() {
            return Err(Failure::bad_data(MessageCode::ChangeNotAllowed));
        }

        Ok(merchant)
    }
}
