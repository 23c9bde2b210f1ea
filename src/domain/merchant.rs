use crate::domain::status::{self, SignatureFlags, StatusChange};
use crate::domain::tariff::FixedCost;
use crate::error::BillingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a merchant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(Uuid);

impl MerchantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for MerchantId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for MerchantId {
    type Err = BillingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|e| BillingError::ValidationError(format!("malformed merchant id: {e}")))
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Onboarding lifecycle state of a merchant.
///
/// Serialized as its numeric code. Codes outside the known set are kept as
/// `Unrecognized` so that stored records never fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum MerchantStatus {
    Draft,
    AgreementRequested,
    OnReview,
    AgreementSigning,
    AgreementSigned,
    Deleted,
    Rejected,
    Unrecognized(i32),
}

impl MerchantStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Draft => 0,
            Self::AgreementRequested => 3,
            Self::OnReview => 4,
            Self::AgreementSigning => 5,
            Self::AgreementSigned => 6,
            Self::Deleted => 7,
            Self::Rejected => 8,
            Self::Unrecognized(code) => code,
        }
    }

    /// States from which onboarding can no longer progress towards signing.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Deleted | Self::Rejected | Self::AgreementSigned)
    }
}

impl From<i32> for MerchantStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Draft,
            3 => Self::AgreementRequested,
            4 => Self::OnReview,
            5 => Self::AgreementSigning,
            6 => Self::AgreementSigned,
            7 => Self::Deleted,
            8 => Self::Rejected,
            other => Self::Unrecognized(other),
        }
    }
}

impl From<MerchantStatus> for i32 {
    fn from(status: MerchantStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for MerchantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "unrecognized({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementType {
    Paper,
    Electronic,
}

/// Bank account the merchant is paid out to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banking {
    pub currency: String,
    pub name: String,
    pub address: String,
    pub account_number: String,
    pub swift: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodCommission {
    pub fee: rust_decimal::Decimal,
    pub per_transaction_fee: rust_decimal::Decimal,
    pub per_transaction_currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodIntegration {
    pub terminal_id: String,
    pub is_integrated: bool,
}

/// Per payment method settings the merchant negotiated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantPaymentMethod {
    pub method_name: String,
    pub commission: MethodCommission,
    pub integration: MethodIntegration,
    pub is_active: bool,
}

/// Fixed costs copied onto the merchant when its tariff is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantTariff {
    pub region: String,
    pub payout: FixedCost,
    pub chargeback: FixedCost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    pub status: MerchantStatus,
    pub status_last_updated_at: Option<DateTime<Utc>>,
    pub agreement_type: Option<AgreementType>,
    pub has_merchant_signature: bool,
    pub has_psp_signature: bool,
    pub is_signed: bool,
    pub banking: Banking,
    #[serde(default)]
    pub payment_methods: BTreeMap<String, MerchantPaymentMethod>,
    pub tariff: Option<MerchantTariff>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Merchant {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MerchantId::new(),
            name: name.into(),
            status: MerchantStatus::Draft,
            status_last_updated_at: None,
            agreement_type: None,
            has_merchant_signature: false,
            has_psp_signature: false,
            is_signed: false,
            banking: Banking::default(),
            payment_methods: BTreeMap::new(),
            tariff: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn signatures(&self) -> SignatureFlags {
        SignatureFlags {
            merchant: self.has_merchant_signature,
            psp: self.has_psp_signature,
        }
    }

    /// Tariffs and other onboarding data may only be edited while in draft.
    pub fn changes_allowed(&self) -> bool {
        self.status == MerchantStatus::Draft
    }

    pub fn can_change_status_to_signing(&self) -> bool {
        self.agreement_type.is_some() && !self.signatures().complete() && !self.status.is_closed()
    }

    /// Validates the requested transition against the current state.
    pub fn plan_transition(&self, to: MerchantStatus) -> Result<StatusChange, status::TransitionError> {
        status::transition(self.status, to, self.transition_guard())
    }

    /// Commits a previously validated transition.
    pub fn apply(&mut self, change: StatusChange, at: DateTime<Utc>) {
        if change.to == MerchantStatus::Draft {
            self.agreement_type = None;
            self.has_merchant_signature = false;
            self.has_psp_signature = false;
            self.is_signed = false;
        }
        self.status = change.to;
        self.status_last_updated_at = Some(at);
        self.updated_at = at;
    }

    /// Overwrites the signature data and returns the automatic transition
    /// that the new signature state triggers, if any.
    pub fn update_signatures(
        &mut self,
        has_merchant_signature: bool,
        has_psp_signature: bool,
        agreement_type: Option<AgreementType>,
    ) -> Option<StatusChange> {
        self.has_merchant_signature = has_merchant_signature;
        self.has_psp_signature = has_psp_signature;
        if agreement_type.is_some() {
            self.agreement_type = agreement_type;
        }
        self.is_signed = self.signatures().complete();
        status::signatures_completed(self.status, self.signatures())
    }

    fn transition_guard(&self) -> status::TransitionGuard {
        status::TransitionGuard {
            signatures: self.signatures(),
            can_change_to_signing: self.can_change_status_to_signing(),
        }
    }
}
