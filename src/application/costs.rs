use super::cache::WriteThroughCache;
use super::cache_keys;
use super::messages::{MessageCode, MessageRegistry};
use super::notifications::parse_merchant_id;
use super::response::{Failure, ServiceResponse};
use crate::domain::cost::{MerchantMoneyBackCost, MerchantPaymentChannelCost, PayoutCostSystem};
use crate::domain::merchant::MerchantId;
use crate::domain::ports::{MerchantCostStoreHandle, PayoutCostStoreHandle};
use crate::domain::tariff::FixedCost;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

type Outcome<T> = std::result::Result<T, Failure>;

/// Read side of the merchant cost collections plus the platform payout cost.
#[derive(Clone)]
pub struct CostService {
    costs: MerchantCostStoreHandle,
    payout_costs: PayoutCostStoreHandle,
    cache: WriteThroughCache,
    messages: Arc<MessageRegistry>,
}

impl CostService {
    /// Creates a cost service. Listings are read through `cache`.
    pub fn new(
        costs: MerchantCostStoreHandle,
        payout_costs: PayoutCostStoreHandle,
        cache: WriteThroughCache,
        messages: Arc<MessageRegistry>,
    ) -> Self {
        Self {
            costs,
            payout_costs,
            cache,
            messages,
        }
    }

    pub async fn list_merchant_payment_channel_costs(
        &self,
        merchant_id: &str,
    ) -> ServiceResponse<Vec<MerchantPaymentChannelCost>> {
        let result: Outcome<_> = async {
            let merchant_id = parse_merchant_id(merchant_id)?;
            let key = cache_keys::payment_channel_costs_all(&merchant_id);
            self.cached_listing(&key, &merchant_id, "merchant_payment_channel_costs", || {
                self.costs.payment_channel_costs(&merchant_id)
            })
            .await
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    pub async fn list_merchant_money_back_costs(
        &self,
        merchant_id: &str,
    ) -> ServiceResponse<Vec<MerchantMoneyBackCost>> {
        let result: Outcome<_> = async {
            let merchant_id = parse_merchant_id(merchant_id)?;
            let key = cache_keys::money_back_costs_all(&merchant_id);
            self.cached_listing(&key, &merchant_id, "merchant_money_back_costs", || {
                self.costs.money_back_costs(&merchant_id)
            })
            .await
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    /// Replaces the active payout cost and refreshes its cache entry.
    pub async fn set_payout_cost_system(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> ServiceResponse<PayoutCostSystem> {
        let result: Outcome<PayoutCostSystem> = async {
            let currency = currency.trim().to_uppercase();
            if amount < Decimal::ZERO || currency.is_empty() {
                return Err(Failure::bad_data(MessageCode::PayoutCostInvalid));
            }

            let previous = self.payout_costs.find_active().await.map_err(|e| {
                error!(collection = "payout_costs", error = %e, "active payout cost lookup failed");
                Failure::system(MessageCode::PayoutCostSaveFailed)
            })?;
            if let Some(mut previous) = previous {
                previous.is_active = false;
                self.save_payout_cost(previous).await?;
            }

            let cost = PayoutCostSystem::new(FixedCost { amount, currency });
            self.save_payout_cost(cost.clone()).await?;

            self.cache
                .refresh(cache_keys::PAYOUT_COST_SYSTEM, &cost)
                .await
                .map_err(|e| {
                    error!(key = cache_keys::PAYOUT_COST_SYSTEM, error = %e, "payout cost cache refresh failed");
                    Failure::system(MessageCode::CacheInvalidationFailed)
                })?;

            info!(amount = %cost.cost.amount, currency = %cost.cost.currency, "payout cost replaced");
            Ok(cost)
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    pub async fn get_payout_cost_system(&self) -> ServiceResponse<PayoutCostSystem> {
        let result: Outcome<PayoutCostSystem> = async {
            if let Some(cost) = self.cache.get(cache_keys::PAYOUT_COST_SYSTEM).await {
                return Ok(cost);
            }

            let cost = self
                .payout_costs
                .find_active()
                .await
                .map_err(|e| {
                    error!(collection = "payout_costs", error = %e, "payout cost lookup failed");
                    Failure::system(MessageCode::UnknownError)
                })?
                .ok_or_else(|| Failure::not_found(MessageCode::PayoutCostNotFound))?;

            if let Err(e) = self.cache.refresh(cache_keys::PAYOUT_COST_SYSTEM, &cost).await {
                warn!(key = cache_keys::PAYOUT_COST_SYSTEM, error = %e, "failed to cache payout cost");
            }
            Ok(cost)
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    async fn save_payout_cost(&self, cost: PayoutCostSystem) -> Outcome<()> {
        let id = cost.id;
        self.payout_costs.store(cost).await.map_err(|e| {
            error!(collection = "payout_costs", %id, error = %e, "payout cost save failed");
            Failure::system(MessageCode::PayoutCostSaveFailed)
        })
    }

    async fn cached_listing<T, F, Fut>(
        &self,
        key: &str,
        merchant_id: &MerchantId,
        collection: &'static str,
        load: F,
    ) -> Outcome<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if let Some(hit) = self.cache.get(key).await {
            return Ok(hit);
        }

        let costs = load().await.map_err(|e| {
            error!(collection, %merchant_id, error = %e, "cost listing failed");
            Failure::system(MessageCode::UnknownError)
        })?;

        if let Err(e) = self.cache.refresh(key, &costs).await {
            warn!(%key, error = %e, "failed to cache cost listing");
        }
        Ok(costs)
    }
}
