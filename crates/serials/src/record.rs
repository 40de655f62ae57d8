//! The per-unit serial record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use serialforge_codec::{CodeFields, ModelCode, SupplierCode};
use serialforge_core::{CustomerId, DocumentId, ItemType, OrderId, StockId};

use crate::status::{LifecycleError, SerialStatus, Transition};

/// Warranty window attached to a sold unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyPeriod {
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl WarrantyPeriod {
    pub fn new(starts_on: NaiveDate, ends_on: NaiveDate) -> Result<Self, LifecycleError> {
        if ends_on < starts_on {
            return Err(LifecycleError::InvalidWarranty { starts_on, ends_on });
        }
        Ok(Self { starts_on, ends_on })
    }
}

/// Inputs for minting one record; the orchestrator fills this per code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSerial {
    pub barcode: String,
    pub fields: CodeFields,
    pub model_code: ModelCode,
    pub item_type: ItemType,
    pub supplier_code: SupplierCode,
    pub issuing_document_id: DocumentId,
    pub product_ref: Option<String>,
}

/// One row per physically issued unit identifier.
///
/// Created once in `Generated`; the reference fields populate as the unit
/// progresses and are never cleared. The rendered barcode and the decomposed
/// fields must always agree (round-trip invariant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialRecord {
    pub barcode: String,
    pub fields: CodeFields,
    pub model_code: ModelCode,
    pub item_type: ItemType,
    pub supplier_code: SupplierCode,
    pub status: SerialStatus,
    pub issuing_document_id: DocumentId,
    pub product_ref: Option<String>,
    pub receiving_document_id: Option<DocumentId>,
    pub stock_id: Option<StockId>,
    pub selling_order_id: Option<OrderId>,
    pub customer_id: Option<CustomerId>,
    pub warranty: Option<WarrantyPeriod>,
    pub closed_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
    pub sold_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SerialRecord {
    /// Mint a fresh record in `Generated`.
    pub fn generated(new: NewSerial, created_at: DateTime<Utc>) -> Self {
        Self {
            barcode: new.barcode,
            fields: new.fields,
            model_code: new.model_code,
            item_type: new.item_type,
            supplier_code: new.supplier_code,
            status: SerialStatus::Generated,
            issuing_document_id: new.issuing_document_id,
            product_ref: new.product_ref,
            receiving_document_id: None,
            stock_id: None,
            selling_order_id: None,
            customer_id: None,
            warranty: None,
            closed_reason: None,
            created_at,
            received_at: None,
            sold_at: None,
            updated_at: created_at,
        }
    }

    /// Advance the lifecycle, populating the context the transition carries.
    ///
    /// A rejected transition leaves the record exactly as it was.
    pub fn apply(
        &mut self,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        let target = transition.target_status();
        if !self.status.allows(target) {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        // Validate context before touching state.
        let warranty = transition.warranty()?;

        match transition {
            Transition::Printed | Transition::SentToVendor | Transition::Returned => {}
            Transition::Received {
                receiving_document_id,
            } => {
                self.receiving_document_id = Some(*receiving_document_id);
                self.received_at = Some(occurred_at);
            }
            Transition::Assigned { stock_id } => {
                self.stock_id = Some(*stock_id);
            }
            Transition::Sold {
                order_id,
                customer_id,
                ..
            } => {
                self.selling_order_id = Some(*order_id);
                self.customer_id = Some(*customer_id);
                self.warranty = warranty;
                self.sold_at = Some(occurred_at);
            }
            Transition::Cancelled { reason } | Transition::Damaged { reason } => {
                self.closed_reason = Some(reason.clone());
            }
        }

        self.status = target;
        self.updated_at = occurred_at;
        Ok(())
    }
}
