//! Human-readable requisition codes (`REQ-000042`).

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, ValueObject};

/// Sequence code: prefix + zero-padded counter.
///
/// `width` is the rendered digit count, never less than the counter's own, so
/// a code read back from its string form equals the one that was written.
///
/// Codes are unique and monotonic per prefix; the counter is allocated by
/// infrastructure. Ordering compares prefix first, then counter, so within a
/// prefix later submissions sort later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequisitionCode {
    prefix: String,
    counter: u64,
    width: usize,
}

impl ValueObject for RequisitionCode {}

impl RequisitionCode {
    pub fn new(prefix: impl Into<String>, counter: u64, width: usize) -> Result<Self, DomainError> {
        let prefix = prefix.into();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_id(format!(
                "requisition code prefix must be non-empty ASCII alphanumeric, got '{prefix}'"
            )));
        }
        if counter == 0 {
            return Err(DomainError::invalid_id("requisition code counter starts at 1"));
        }
        let digits = counter.ilog10() as usize + 1;
        Ok(Self {
            prefix,
            counter,
            width: width.max(digits),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl core::fmt::Display for RequisitionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{:0width$}", self.prefix, self.counter, width = self.width)
    }
}

impl FromStr for RequisitionCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, digits) = s
            .rsplit_once('-')
            .ok_or_else(|| DomainError::invalid_id(format!("RequisitionCode: missing '-' in '{s}'")))?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::invalid_id(format!(
                "RequisitionCode: counter must be digits in '{s}'"
            )));
        }
        let counter = digits
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("RequisitionCode: {e}")))?;
        Self::new(prefix, counter, digits.len())
    }
}

impl TryFrom<String> for RequisitionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequisitionCode> for String {
    fn from(value: RequisitionCode) -> Self {
        value.to_string()
    }
}
