//! Payout destinations and identity documents accepted from clients

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string that does not name any variant of a closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// How the money leaves the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutMethod {
    /// Mobile wallet; `accountNumber` is a phone number
    Nequi,
    /// Bank transfer
    Bancolombia,
    /// Bank-issued wallet
    Daviplata,
}

impl PayoutMethod {
    pub const ALL: [PayoutMethod; 3] = [
        PayoutMethod::Nequi,
        PayoutMethod::Bancolombia,
        PayoutMethod::Daviplata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMethod::Nequi => "Nequi",
            PayoutMethod::Bancolombia => "Bancolombia",
            PayoutMethod::Daviplata => "Daviplata",
        }
    }
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PayoutMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("payout method", s))
    }
}

/// Identity document presented by the account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Cédula de ciudadanía (national ID)
    #[serde(rename = "CC")]
    NationalId,
    /// Tarjeta de identidad (minor ID)
    #[serde(rename = "TI")]
    MinorId,
    /// Cédula de extranjería (foreign ID)
    #[serde(rename = "CE")]
    ForeignId,
}

impl DocumentType {
    /// Code sent over the wire and to the gateway
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::NationalId => "CC",
            DocumentType::MinorId => "TI",
            DocumentType::ForeignId => "CE",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CC" => Ok(DocumentType::NationalId),
            "TI" => Ok(DocumentType::MinorId),
            "CE" => Ok(DocumentType::ForeignId),
            other => Err(UnknownVariant::new("document type", other)),
        }
    }
}
