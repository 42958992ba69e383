//! Deployment policies for the workflow

use cashout_gateway::{BankCodeTable, MerchantProfile};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} '{value}', expected one of: {expected}")]
pub struct ParsePolicyError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Which withdrawals `list` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Only the authenticated caller's
    #[default]
    Caller,
    /// Every withdrawal in the store
    All,
}

impl FromStr for ListScope {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caller" => Ok(ListScope::Caller),
            "all" => Ok(ListScope::All),
            other => Err(ParsePolicyError {
                kind: "list scope",
                value: other.to_string(),
                expected: "caller, all",
            }),
        }
    }
}

impl fmt::Display for ListScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListScope::Caller => "caller",
            ListScope::All => "all",
        })
    }
}

/// What happens to a withdrawal whose payout the gateway declines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave it pending so it can be processed again
    #[default]
    KeepPending,
    /// Move it to the terminal `failed` status
    MarkFailed,
}

impl FromStr for FailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-pending" => Ok(FailurePolicy::KeepPending),
            "mark-failed" => Ok(FailurePolicy::MarkFailed),
            other => Err(ParsePolicyError {
                kind: "gateway failure policy",
                value: other.to_string(),
                expected: "keep-pending, mark-failed",
            }),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailurePolicy::KeepPending => "keep-pending",
            FailurePolicy::MarkFailed => "mark-failed",
        })
    }
}

/// Configuration for the withdrawal workflow
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub merchant: MerchantProfile,
    pub bank_codes: BankCodeTable,
    pub list_scope: ListScope,
    pub failure_policy: FailurePolicy,
    /// How long an unrenewed processing claim blocks other processors.
    ///
    /// A claim is renewed every third of the lease while its payout is in
    /// flight, so the lease only runs out when the processor stops renewing.
    pub claim_lease: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            merchant: MerchantProfile::default(),
            bank_codes: BankCodeTable::default(),
            list_scope: ListScope::default(),
            failure_policy: FailurePolicy::default(),
            claim_lease: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("ALL".parse::<ListScope>(), Ok(ListScope::All));
        assert_eq!(" caller ".parse::<ListScope>(), Ok(ListScope::Caller));
        assert!("everyone".parse::<ListScope>().is_err());

        assert_eq!(
            "mark-failed".parse::<FailurePolicy>(),
            Ok(FailurePolicy::MarkFailed)
        );
        let err = "retry".parse::<FailurePolicy>().unwrap_err();
        assert!(err.to_string().contains("keep-pending, mark-failed"));
    }

    #[test]
    fn test_display_round_trip() {
        for scope in [ListScope::Caller, ListScope::All] {
            assert_eq!(scope.to_string().parse::<ListScope>(), Ok(scope));
        }
        for policy in [FailurePolicy::KeepPending, FailurePolicy::MarkFailed] {
            assert_eq!(policy.to_string().parse::<FailurePolicy>(), Ok(policy));
        }
    }
}
