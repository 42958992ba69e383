//! Withdrawal record and the validated input used to create one

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::{Amount, AmountError};
use crate::payout::{DocumentType, PayoutMethod};
use crate::status::WithdrawalStatus;

/// Version of the persisted withdrawal shape
pub const SCHEMA_VERSION: u16 = 1;

/// Reasons a submission is refused before anything is stored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid amount")]
    InvalidAmount(#[source] AmountError),
}

/// A persisted withdrawal request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: String,
    pub user_id: String,
    pub amount: Amount,
    pub payout_method: PayoutMethod,
    pub account_number: String,
    pub id_document_type: DocumentType,
    pub id_document_number: String,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub schema_version: u16,
}

impl WithdrawalRequest {
    /// Materialize a new record. Every record starts out pending.
    pub fn create(id: impl Into<String>, new: NewWithdrawal, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: new.user_id,
            amount: new.amount,
            payout_method: new.payout_method,
            account_number: new.account_number,
            id_document_type: new.id_document_type,
            id_document_number: new.id_document_number,
            status: WithdrawalStatus::Pending,
            created_at,
            schema_version: SCHEMA_VERSION,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WithdrawalStatus::Pending
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Validated input for a new withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub user_id: String,
    pub amount: Amount,
    pub payout_method: PayoutMethod,
    pub account_number: String,
    pub id_document_type: DocumentType,
    pub id_document_number: String,
}

/// Raw submission as it arrives from a client.
///
/// Every field is optional so that a missing field is reported as such
/// rather than as a generic decode error. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WithdrawalDraft {
    pub user_id: Option<String>,
    /// JSON number only; `"100"` is a decode error
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub payout_method: Option<PayoutMethod>,
    pub account_number: Option<String>,
    pub id_document_type: Option<DocumentType>,
    pub id_document_number: Option<String>,
}

impl WithdrawalDraft {
    /// Check presence first, then the amount.
    pub fn validate(self) -> Result<NewWithdrawal, ValidationError> {
        let mut missing = Vec::new();

        let user_id = non_blank(self.user_id, "userId", &mut missing);
        let account_number = non_blank(self.account_number, "accountNumber", &mut missing);
        let id_document_number =
            non_blank(self.id_document_number, "idDocumentNumber", &mut missing);
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.payout_method.is_none() {
            missing.push("payoutMethod");
        }
        if self.id_document_type.is_none() {
            missing.push("idDocumentType");
        }

        match (
            user_id,
            self.amount,
            self.payout_method,
            account_number,
            self.id_document_type,
            id_document_number,
        ) {
            (
                Some(user_id),
                Some(amount),
                Some(payout_method),
                Some(account_number),
                Some(id_document_type),
                Some(id_document_number),
            ) if missing.is_empty() => {
                let amount = Amount::new(amount).map_err(ValidationError::InvalidAmount)?;
                Ok(NewWithdrawal {
                    user_id,
                    amount,
                    payout_method,
                    account_number,
                    id_document_type,
                    id_document_number,
                })
            }
            _ => {
                missing.sort_by_key(|field| FIELD_ORDER.iter().position(|f| f == field));
                Err(ValidationError::MissingFields(missing))
            }
        }
    }
}

const FIELD_ORDER: [&str; 6] = [
    "userId",
    "amount",
    "payoutMethod",
    "accountNumber",
    "idDocumentType",
    "idDocumentNumber",
];

fn non_blank(
    value: Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            missing.push(field);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn complete_draft() -> WithdrawalDraft {
        WithdrawalDraft {
            user_id: Some("u1".to_string()),
            amount: Some(dec!(100)),
            payout_method: Some(PayoutMethod::Nequi),
            account_number: Some("3001234567".to_string()),
            id_document_type: Some(DocumentType::NationalId),
            id_document_number: Some("111".to_string()),
        }
    }

    #[test]
    fn test_complete_draft_validates() {
        let new = complete_draft().validate().unwrap();
        assert_eq!(new.user_id, "u1");
        assert_eq!(new.amount.value(), dec!(100));
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let draft = WithdrawalDraft {
            amount: None,
            id_document_number: Some("   ".to_string()),
            ..complete_draft()
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["amount", "idDocumentNumber"])
        );
        assert_eq!(
            err.to_string(),
            "missing required fields: amount, idDocumentNumber"
        );
    }

    #[test]
    fn test_missing_fields_checked_before_amount() {
        let draft = WithdrawalDraft {
            amount: Some(dec!(-1)),
            account_number: None,
            ..complete_draft()
        };
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::MissingFields(_))
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in [dec!(0), dec!(-10)] {
            let draft = WithdrawalDraft {
                amount: Some(amount),
                ..complete_draft()
            };
            let err = draft.validate().unwrap_err();
            assert!(matches!(err, ValidationError::InvalidAmount(_)));
            assert_eq!(err.to_string(), "invalid amount");
        }
    }

    #[test]
    fn test_draft_rejects_unknown_fields() {
        let json = r#"{"userId":"u1","amount":10,"bonus":true}"#;
        let parsed: Result<WithdrawalDraft, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_draft_amount_must_be_a_number() {
        let parsed: WithdrawalDraft = serde_json::from_str(r#"{"amount":100}"#).unwrap();
        assert_eq!(parsed.amount, Some(dec!(100)));

        let parsed: WithdrawalDraft = serde_json::from_str(r#"{"userId":"u1"}"#).unwrap();
        assert_eq!(parsed.amount, None);

        for json in [r#"{"amount":"100"}"#, r#"{"amount":"abc"}"#] {
            let parsed: Result<WithdrawalDraft, _> = serde_json::from_str(json);
            assert!(parsed.is_err(), "{json} should not decode");
        }
    }

    #[test]
    fn test_draft_rejects_unknown_method() {
        let json = r#"{"payoutMethod":"Paypal"}"#;
        let parsed: Result<WithdrawalDraft, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_created_record_is_pending() {
        let new = complete_draft().validate().unwrap();
        let record = WithdrawalRequest::create("w-1", new, Utc::now());
        assert_eq!(record.status, WithdrawalStatus::Pending);
        assert_eq!(record.schema_version, SCHEMA_VERSION);
        assert!(record.is_owned_by("u1"));
    }

    #[test]
    fn test_record_json_shape() {
        let new = complete_draft().validate().unwrap();
        let record = WithdrawalRequest::create("w-1", new, Utc::now());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["userId"], "u1");
        assert_eq!(json["amount"], serde_json::json!(100.0));
        assert_eq!(json["payoutMethod"], "Nequi");
        assert_eq!(json["idDocumentType"], "CC");
        assert_eq!(json["status"], "pending");
        assert!(json.get("createdAt").is_some());
    }
}
