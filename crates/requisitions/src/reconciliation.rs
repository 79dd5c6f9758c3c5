//! Line items, receipts and fulfillment reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, DomainResult, UserId, ValueObject};

/// Urgency tag of a line item.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Derived per-line reception state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionStatus {
    Pending,
    Partial,
    Complete,
    OverDelivered,
}

/// A line item as submitted, before it gets a line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDraft {
    pub description: String,
    pub requested_quantity: i64,
    /// Minor currency units.
    pub unit_price: i64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl LineItemDraft {
    pub fn new(description: impl Into<String>, requested_quantity: i64, unit_price: i64) -> Self {
        Self {
            description: description.into(),
            requested_quantity,
            unit_price,
            priority: Priority::default(),
            image_ref: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("line item description is required"));
        }
        if self.requested_quantity <= 0 {
            return Err(DomainError::validation(format!(
                "requested quantity must be positive (got {})",
                self.requested_quantity
            )));
        }
        if self.unit_price < 0 {
            return Err(DomainError::validation(format!(
                "unit price cannot be negative (got {})",
                self.unit_price
            )));
        }
        Ok(())
    }
}

/// One delivery against a line item. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub quantity: i64,
    pub recorded_by: UserId,
    pub recorded_at: DateTime<Utc>,
    pub source_document: Option<String>,
}

impl ValueObject for Receipt {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_no: u32,
    pub description: String,
    pub requested_quantity: i64,
    pub unit_price: i64,
    pub priority: Priority,
    pub image_ref: Option<String>,
    pub receipts: Vec<Receipt>,
}

impl LineItem {
    pub fn from_draft(line_no: u32, draft: &LineItemDraft) -> Self {
        Self {
            line_no,
            description: draft.description.clone(),
            requested_quantity: draft.requested_quantity,
            unit_price: draft.unit_price,
            priority: draft.priority,
            image_ref: draft.image_ref.clone(),
            receipts: Vec::new(),
        }
    }

    /// Cumulative received quantity (sum of all receipts).
    pub fn received_quantity(&self) -> i64 {
        self.receipts.iter().map(|r| r.quantity).sum()
    }

    pub fn is_satisfied(&self) -> bool {
        self.received_quantity() >= self.requested_quantity
    }

    pub fn reception_status(&self) -> ReceptionStatus {
        let received = self.received_quantity();
        if received == 0 {
            ReceptionStatus::Pending
        } else if received < self.requested_quantity {
            ReceptionStatus::Partial
        } else if received == self.requested_quantity {
            ReceptionStatus::Complete
        } else {
            ReceptionStatus::OverDelivered
        }
    }

    /// received / requested; may exceed 1.0 on over-delivery.
    pub fn fulfillment_ratio(&self) -> f64 {
        if self.requested_quantity <= 0 {
            return 1.0;
        }
        self.received_quantity() as f64 / self.requested_quantity as f64
    }

    pub fn line_total(&self) -> i64 {
        self.requested_quantity.saturating_mul(self.unit_price)
    }
}

/// True when every line is satisfied. Vacuously true with no lines.
pub fn all_lines_satisfied(lines: &[LineItem]) -> bool {
    lines.iter().all(LineItem::is_satisfied)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineFulfillment {
    pub line_no: u32,
    pub description: String,
    pub requested: i64,
    pub received: i64,
    pub ratio: f64,
    pub status: ReceptionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    pub lines: Vec<LineFulfillment>,
    pub fully_received: bool,
}

pub fn summarize(lines: &[LineItem]) -> FulfillmentSummary {
    FulfillmentSummary {
        lines: lines
            .iter()
            .map(|line| LineFulfillment {
                line_no: line.line_no,
                description: line.description.clone(),
                requested: line.requested_quantity,
                received: line.received_quantity(),
                ratio: line.fulfillment_ratio(),
                status: line.reception_status(),
            })
            .collect(),
        fully_received: all_lines_satisfied(lines),
    }
}
