use super::messages::{MessageCode, MessageRegistry, ResponseMessage, ResponseStatus};
use serde::Serialize;
use thiserror::Error;

/// A categorized operation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status:?} ({}): {}", .code.id(), .details.as_deref().unwrap_or("-"))]
pub struct Failure {
    pub status: ResponseStatus,
    pub code: MessageCode,
    pub details: Option<String>,
}

impl Failure {
    pub fn new(status: ResponseStatus, code: MessageCode) -> Self {
        Self {
            status,
            code,
            details: None,
        }
    }

    pub fn bad_data(code: MessageCode) -> Self {
        Self::new(ResponseStatus::BadData, code)
    }

    pub fn not_found(code: MessageCode) -> Self {
        Self::new(ResponseStatus::NotFound, code)
    }

    pub fn system(code: MessageCode) -> Self {
        Self::new(ResponseStatus::SystemError, code)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn render(&self, messages: &MessageRegistry) -> ResponseMessage {
        messages.render(self.code, self.details.clone())
    }
}

/// Envelope of the structured operations: failures travel as data.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse<T> {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(item: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            item: Some(item),
            message: None,
        }
    }

    pub fn failed(failure: &Failure, messages: &MessageRegistry) -> Self {
        Self {
            status: failure.status,
            item: None,
            message: Some(failure.render(messages)),
        }
    }

    pub fn from_result(result: Result<T, Failure>, messages: &MessageRegistry) -> Self {
        match result {
            Ok(item) => Self::ok(item),
            Err(failure) => Self::failed(&failure, messages),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// Wire id of the attached message, if any.
    pub fn message_id(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.code.as_str())
    }
}
