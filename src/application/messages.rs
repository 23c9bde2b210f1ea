//! Message codes returned to callers and the registry that renders them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome category of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    BadData,
    NotFound,
    Forbidden,
    SystemError,
}

impl ResponseStatus {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadData => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::SystemError => 500,
        }
    }
}

macro_rules! message_codes {
    ($($variant:ident => ($id:literal, $text:literal),)+) => {
        /// Structured reason attached to a non-OK response.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum MessageCode {
            $($variant,)+
        }

        impl MessageCode {
            pub const ALL: &'static [MessageCode] = &[$(MessageCode::$variant,)+];

            /// Stable wire identifier, independent of the registry in use.
            pub fn id(self) -> &'static str {
                match self {
                    $(MessageCode::$variant => $id,)+
                }
            }

            fn default_text(self) -> &'static str {
                match self {
                    $(MessageCode::$variant => $text,)+
                }
            }
        }
    };
}

message_codes! {
    UnknownError => ("ma000001", "unknown error"),
    MerchantIdMalformed => ("ma000002", "merchant identifier is malformed"),
    MerchantNotFound => ("ma000003", "merchant not found"),
    MerchantSaveFailed => ("ma000004", "merchant can't be saved"),
    AgreementRequestNotAllowed => ("ma000005", "agreement can be requested only for a merchant in draft"),
    OnReviewNotAllowed => ("ma000006", "merchant can be sent to review only after the agreement was requested"),
    SigningImpossible => ("ma000007", "agreement signing is impossible for the merchant"),
    CannotMarkSigned => ("ma000008", "document can't be marked signed"),
    StatusChangeNotPossible => ("ma000009", "status change is not possible"),
    NotificationSettingNotFound => ("ma000010", "notification setting for the status not found"),
    TariffAlreadyExists => ("ma000011", "merchant tariff already exists"),
    ChangeNotAllowed => ("ma000012", "merchant data can't be changed in the current status"),
    TariffNotFound => ("ma000013", "tariff rates not found"),
    TariffRegionRequired => ("ma000014", "tariff region is required"),
    TariffLookupFailed => ("ma000015", "tariff rates lookup failed"),
    CostSaveFailed => ("ma000016", "merchant costs can't be saved"),
    CacheInvalidationFailed => ("ma000017", "cache invalidation failed"),
    AgreementGenerationFailed => ("ma000018", "agreement document generation failed"),
    NotificationIdMalformed => ("nt000001", "notification identifier is malformed"),
    NotificationNotFound => ("nt000002", "notification not found"),
    NotificationSaveFailed => ("nt000003", "notification can't be saved"),
    NotificationUserIdEmpty => ("nt000004", "notification author is required"),
    NotificationTitleEmpty => ("nt000005", "notification title is required"),
    NotificationMessageEmpty => ("nt000006", "notification message is required"),
    PaymentMethodNotFound => ("sf000001", "payment method not found"),
    CardBrandRequired => ("sf000002", "card brand is required for bank card methods"),
    CardBrandNotAllowed => ("sf000003", "card brand is allowed for bank card methods only"),
    CardBrandInvalid => ("sf000004", "card brand is not supported"),
    FeeSetRequired => ("sf000005", "at least one fee tier is required"),
    SystemFeesNotFound => ("sf000006", "system fees not found"),
    MatchedMinAmountNotFound => ("sf000007", "no fee tier matched the minimum amount"),
    SystemFeesSaveFailed => ("sf000008", "system fees can't be saved"),
    PayoutCostInvalid => ("pc000001", "payout cost amount and currency are required"),
    PayoutCostNotFound => ("pc000002", "payout cost not found"),
    PayoutCostSaveFailed => ("pc000003", "payout cost can't be saved"),
}

/// Rendered message carried by a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Immutable code -> text table.
///
/// Built once and shared; alternate (e.g. localized) registries are created
/// with [`MessageRegistry::with_text`].
#[derive(Debug, Clone)]
pub struct MessageRegistry {
    texts: HashMap<MessageCode, String>,
}

impl MessageRegistry {
    pub fn english() -> Self {
        Self {
            texts: MessageCode::ALL
                .iter()
                .map(|code| (*code, code.default_text().to_string()))
                .collect(),
        }
    }

    pub fn with_text(mut self, code: MessageCode, text: impl Into<String>) -> Self {
        self.texts.insert(code, text.into());
        self
    }

    pub fn text(&self, code: MessageCode) -> &str {
        self.texts
            .get(&code)
            .map(String::as_str)
            .unwrap_or_else(|| code.default_text())
    }

    pub fn render(&self, code: MessageCode, details: Option<String>) -> ResponseMessage {
        ResponseMessage {
            code: code.id().to_string(),
            message: self.text(code).to_string(),
            details,
        }
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::english()
    }
}
