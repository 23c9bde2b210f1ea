//! Merchant onboarding operations: status changes, signature data and tariffs.

use super::materializer::{
    CostMaterializer, MaterializationFailure, MaterializationReport, SetTariffRatesRequest,
};
use super::messages::{MessageCode, MessageRegistry, ResponseMessage, ResponseStatus};
use super::notifications::{NotificationLog, parse_merchant_id};
use super::response::{Failure, ServiceResponse};
use super::tariffs::TariffResolver;
use crate::domain::merchant::{AgreementType, Merchant, MerchantStatus};
use crate::domain::notification::StatusTitles;
use crate::domain::ports::MerchantStoreHandle;
use crate::domain::status::{StatusChange, TransitionError};
use crate::domain::tariff::{TariffFilter, TariffRate};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

type Outcome<T> = std::result::Result<T, Failure>;

const SIGNATURE_DATA_UPDATED: &str = "Signature data updated";

#[derive(Debug, Clone)]
pub struct ChangeStatusRequest {
    pub merchant_id: String,
    pub status: MerchantStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChangeDataRequest {
    pub merchant_id: String,
    pub has_psp_signature: bool,
    pub has_merchant_signature: bool,
    pub agreement_type: Option<AgreementType>,
}

#[derive(Debug, Clone, Default)]
pub struct TariffRatesQuery {
    pub region: String,
    pub payout_currency: Option<String>,
    pub amount_from: Option<Decimal>,
    pub amount_to: Option<Decimal>,
}

/// Result of `set_merchant_tariff_rates`. The report is filled on failure too.
#[derive(Debug, Clone, Serialize)]
pub struct TariffRatesResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
    pub report: MaterializationReport,
}

impl TariffRatesResponse {
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.code.as_str())
    }
}

#[derive(Clone)]
pub struct OnboardingService {
    merchants: MerchantStoreHandle,
    notifications: NotificationLog,
    titles: Arc<StatusTitles>,
    resolver: TariffResolver,
    materializer: CostMaterializer,
    messages: Arc<MessageRegistry>,
}

impl OnboardingService {
    pub fn new(
        merchants: MerchantStoreHandle,
        notifications: NotificationLog,
        titles: Arc<StatusTitles>,
        resolver: TariffResolver,
        materializer: CostMaterializer,
        messages: Arc<MessageRegistry>,
    ) -> Self {
        Self {
            merchants,
            notifications,
            titles,
            resolver,
            materializer,
            messages,
        }
    }

    /// Validates and commits an explicit status change.
    ///
    /// The notification is written before the merchant. If it cannot be
    /// written the merchant keeps its previous status.
    pub async fn change_merchant_status(&self, req: ChangeStatusRequest) -> ServiceResponse<Merchant> {
        let result: Outcome<Merchant> = async {
            let mut merchant = self.load(&req.merchant_id).await?;
            let change = merchant
                .plan_transition(req.status)
                .map_err(transition_failure)?;

            self.notify(&merchant, change.to, req.message.as_deref(), Some(change))
                .await?;

            merchant.apply(change, Utc::now());
            self.persist(&merchant).await?;

            info!(merchant_id = %merchant.id, from = %change.from, to = %change.to, "merchant status changed");
            Ok(merchant)
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    /// Overwrites signature data. Completing both signatures while in
    /// `AgreementSigning` advances the merchant to `AgreementSigned`.
    pub async fn change_merchant_data(&self, req: ChangeDataRequest) -> ServiceResponse<Merchant> {
        let result: Outcome<Merchant> = async {
            let mut merchant = self.load(&req.merchant_id).await?;
            let auto = merchant.update_signatures(
                req.has_merchant_signature,
                req.has_psp_signature,
                req.agreement_type,
            );

            // every data change is logged under the title of the resulting status;
            // a plain data update carries a `{from: s, to: s}` marker
            let marker = auto.unwrap_or(StatusChange {
                from: merchant.status,
                to: merchant.status,
            });
            let message = auto.is_none().then_some(SIGNATURE_DATA_UPDATED);
            self.notify(&merchant, marker.to, message, Some(marker)).await?;

            let now = Utc::now();
            match auto {
                Some(change) => merchant.apply(change, now),
                None => merchant.updated_at = now,
            }
            self.persist(&merchant).await?;

            if let Some(change) = auto {
                info!(merchant_id = %merchant.id, from = %change.from, to = %change.to, "signatures completed");
            }
            Ok(merchant)
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    pub async fn get_merchant_tariff_rates(
        &self,
        query: TariffRatesQuery,
    ) -> ServiceResponse<Vec<TariffRate>> {
        let result: Outcome<Vec<TariffRate>> = async {
            if query.region.trim().is_empty() {
                return Err(Failure::bad_data(MessageCode::TariffRegionRequired));
            }
            let filter = TariffFilter::builder(query.region.trim())
                .payout_currency(query.payout_currency.as_deref())
                .amount_bounds(query.amount_from, query.amount_to)
                .build();

            self.resolver.resolve(&filter).await.map_err(|e| {
                error!(collection = "tariff_rates", query = ?filter, error = %e, "tariff lookup failed");
                Failure::system(MessageCode::TariffLookupFailed)
            })
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    pub async fn set_merchant_tariff_rates(&self, req: SetTariffRatesRequest) -> TariffRatesResponse {
        let outcome = if req.region.trim().is_empty() {
            Err(MaterializationFailure {
                failure: Failure::bad_data(MessageCode::TariffRegionRequired),
                report: MaterializationReport::default(),
            })
        } else {
            self.materializer.materialize(&req).await
        };

        match outcome {
            Ok(report) => TariffRatesResponse {
                status: ResponseStatus::Ok,
                message: None,
                report,
            },
            Err(MaterializationFailure { failure, report }) => TariffRatesResponse {
                status: failure.status,
                message: Some(failure.render(&self.messages)),
                report,
            },
        }
    }

    async fn load(&self, merchant_id: &str) -> Outcome<Merchant> {
        let merchant_id = parse_merchant_id(merchant_id)?;
        self.merchants
            .get(&merchant_id)
            .await
            .map_err(|e| {
                error!(collection = "merchants", %merchant_id, error = %e, "merchant lookup failed");
                Failure::system(MessageCode::UnknownError)
            })?
            .ok_or_else(|| Failure::not_found(MessageCode::MerchantNotFound))
    }

    async fn persist(&self, merchant: &Merchant) -> Outcome<()> {
        self.merchants.store(merchant.clone()).await.map_err(|e| {
            error!(collection = "merchants", merchant_id = %merchant.id, error = %e, "merchant save failed");
            Failure::system(MessageCode::MerchantSaveFailed)
        })
    }

    async fn notify(
        &self,
        merchant: &Merchant,
        status: MerchantStatus,
        message: Option<&str>,
        change: Option<StatusChange>,
    ) -> Outcome<()> {
        let title = self
            .titles
            .title(status)
            .ok_or_else(|| Failure::system(MessageCode::NotificationSettingNotFound))?;

        self.notifications
            .append_system(merchant.id, title, message, change)
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(collection = "notifications", merchant_id = %merchant.id, %status, error = %e, "status notification failed");
                Failure::system(MessageCode::NotificationSaveFailed)
            })
    }
}

fn transition_failure(e: TransitionError) -> Failure {
    let code = match e {
        TransitionError::AgreementRequestNotAllowed => MessageCode::AgreementRequestNotAllowed,
        TransitionError::OnReviewNotAllowed => MessageCode::OnReviewNotAllowed,
        TransitionError::SigningImpossible => MessageCode::SigningImpossible,
        TransitionError::CannotMarkSigned => MessageCode::CannotMarkSigned,
        TransitionError::StatusChangeNotPossible => MessageCode::StatusChangeNotPossible,
    };
    Failure::bad_data(code)
}
