//! Issuance orchestration: the only entry point collaborators call to mint
//! new codes.
//!
//! The pipeline per line is: resolve channel (spare-part layouts only) →
//! reserve a contiguous range → render every serial in the range → persist
//! one record per code. Each line's reservation-and-materialization is its
//! own atomic step: a failure on line N leaves lines 1..N committed and
//! issues nothing for N and beyond. Cross-line atomicity is deliberately
//! out of scope; overflow is a rare, operator-visible condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use serialforge_codec::{
    encode, CodeFields, CodecConfig, CodecError, IssueDate, ModelCode, SerialNumber, SupplierCode,
};
use serialforge_core::{CodeLayout, DocumentId, ItemType};
use serialforge_sequences::SerialRange;
use serialforge_serials::{NewSerial, SerialRecord, Transition};

use crate::registry::{RegistryError, SupplierRegistry};
use crate::sequence_store::{SequenceStatus, SequenceStore, SequenceStoreError};
use crate::serial_store::{SerialRecordStore, SerialStoreError, StatusCounts};

/// One line of an issuance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLine {
    pub model_code: ModelCode,
    pub item_type: ItemType,
    pub quantity: u64,
    pub product_ref: Option<String>,
}

/// A batch request: "issue N codes for each of these lines against document D".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub document_id: DocumentId,
    pub supplier_code: SupplierCode,
    /// Explicit "as of" date context; the codec never reads the wall clock.
    pub issued_on: IssueDate,
    pub lines: Vec<IssueLine>,
}

/// Per-line summary: enough to print a contiguous label run without
/// re-querying every individual code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineResult {
    pub model_code: ModelCode,
    pub item_type: ItemType,
    pub quantity: u64,
    pub start: u64,
    pub end: u64,
    pub first_barcode: String,
    pub last_barcode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub document_id: DocumentId,
    pub lines: Vec<LineResult>,
    pub total_issued: u64,
}

/// Issuance failure.
///
/// `Line` pinpoints which line aborted the batch; lines before it are
/// committed and stay committed.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("request contains no lines")]
    EmptyRequest,

    #[error("line {index} ({model_code}): {source}")]
    Line {
        index: usize,
        model_code: ModelCode,
        #[source]
        source: Box<IssueError>,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Sequence(#[from] SequenceStoreError),

    #[error(transparent)]
    Store(#[from] SerialStoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Coordinates codec + allocator + record store for batch requests, and
/// hosts the document-level bulk operations built on the same stores.
pub struct IssuanceService<Q, S, R> {
    sequences: Q,
    serials: S,
    registry: R,
    codec: CodecConfig,
}

impl<Q, S, R> IssuanceService<Q, S, R>
where
    Q: SequenceStore,
    S: SerialRecordStore,
    R: SupplierRegistry,
{
    pub fn new(sequences: Q, serials: S, registry: R, codec: CodecConfig) -> Self {
        Self {
            sequences,
            serials,
            registry,
            codec,
        }
    }

    pub fn codec(&self) -> &CodecConfig {
        &self.codec
    }

    /// Mint codes for every line of the request, in submission order.
    #[instrument(skip(self, request), fields(document_id = %request.document_id, lines = request.lines.len()), err)]
    pub fn issue(
        &self,
        request: &IssueRequest,
        now: DateTime<Utc>,
    ) -> Result<BatchResult, IssueError> {
        if request.lines.is_empty() {
            return Err(IssueError::EmptyRequest);
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        let mut total_issued = 0u64;

        for (index, line) in request.lines.iter().enumerate() {
            let result = self
                .issue_line(request, line, now)
                .map_err(|source| IssueError::Line {
                    index,
                    model_code: line.model_code.clone(),
                    source: Box::new(source),
                })?;
            total_issued += result.quantity;
            lines.push(result);
        }

        info!(
            document_id = %request.document_id,
            total_issued,
            "issued serial batch"
        );

        Ok(BatchResult {
            document_id: request.document_id,
            lines,
            total_issued,
        })
    }

    fn issue_line(
        &self,
        request: &IssueRequest,
        line: &IssueLine,
        now: DateTime<Utc>,
    ) -> Result<LineResult, IssueError> {
        let channel = match line.item_type.code_layout() {
            CodeLayout::FinishedGoods => None,
            CodeLayout::SparePart => {
                Some(self.registry.channel_for_supplier(&request.supplier_code)?)
            }
        };

        let range = self
            .sequences
            .reserve(&line.model_code, line.item_type, line.quantity)?;

        let records = self.render_range(request, line, channel.as_ref(), &range, now)?;
        let first_barcode = records[0].barcode.clone();
        let last_barcode = records[records.len() - 1].barcode.clone();

        // The range is already burned if this fails; see module docs.
        if let Err(e) = self.serials.create_batch(records) {
            warn!(
                model = %line.model_code,
                start = range.start,
                end = range.end,
                "serial range burned: records were not materialized"
            );
            return Err(e.into());
        }

        Ok(LineResult {
            model_code: line.model_code.clone(),
            item_type: line.item_type,
            quantity: line.quantity,
            start: range.start,
            end: range.end,
            first_barcode,
            last_barcode,
        })
    }

    fn render_range(
        &self,
        request: &IssueRequest,
        line: &IssueLine,
        channel: Option<&serialforge_codec::ChannelCode>,
        range: &SerialRange,
        now: DateTime<Utc>,
    ) -> Result<Vec<SerialRecord>, IssueError> {
        let mut records = Vec::with_capacity(range.len() as usize);
        for serial in range.iter() {
            let serial = SerialNumber::new(serial)?;
            let fields = match line.item_type.code_layout() {
                CodeLayout::FinishedGoods => CodeFields::FinishedGood {
                    brand: self.codec.brand_prefix.clone(),
                    date: request.issued_on,
                    model: line.model_code.clone(),
                    serial,
                },
                CodeLayout::SparePart => CodeFields::SparePart {
                    brand: self.codec.brand_prefix.clone(),
                    supplier: request.supplier_code.clone(),
                    date: request.issued_on,
                    // Channel was resolved for every spare-part layout line.
                    channel: channel
                        .cloned()
                        .ok_or_else(|| CodecError::invalid_field("missing channel code"))?,
                    serial,
                },
            };
            let barcode = encode(&self.codec, &fields)?;
            records.push(SerialRecord::generated(
                NewSerial {
                    barcode,
                    fields,
                    model_code: line.model_code.clone(),
                    item_type: line.item_type,
                    supplier_code: request.supplier_code.clone(),
                    issuing_document_id: request.document_id,
                    product_ref: line.product_ref.clone(),
                },
                now,
            ));
        }
        Ok(records)
    }

    /// Render what the next `quantity` codes would be without committing any
    /// increment.
    pub fn preview_codes(
        &self,
        supplier_code: &SupplierCode,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
        issued_on: IssueDate,
    ) -> Result<Vec<String>, IssueError> {
        let channel = match item_type.code_layout() {
            CodeLayout::FinishedGoods => None,
            CodeLayout::SparePart => Some(self.registry.channel_for_supplier(supplier_code)?),
        };

        let range = self.sequences.preview(model_code, item_type, quantity)?;

        let mut codes = Vec::with_capacity(range.len() as usize);
        for serial in range.iter() {
            let serial = SerialNumber::new(serial)?;
            let fields = match item_type.code_layout() {
                CodeLayout::FinishedGoods => CodeFields::FinishedGood {
                    brand: self.codec.brand_prefix.clone(),
                    date: issued_on,
                    model: model_code.clone(),
                    serial,
                },
                CodeLayout::SparePart => CodeFields::SparePart {
                    brand: self.codec.brand_prefix.clone(),
                    supplier: supplier_code.clone(),
                    date: issued_on,
                    channel: channel
                        .clone()
                        .ok_or_else(|| CodecError::invalid_field("missing channel code"))?,
                    serial,
                },
            };
            codes.push(encode(&self.codec, &fields)?);
        }
        Ok(codes)
    }

    pub fn sequence_status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, IssueError> {
        Ok(self.sequences.status(model_code, item_type)?)
    }

    pub fn lookup(&self, barcode: &str) -> Result<SerialRecord, IssueError> {
        Ok(self.serials.lookup(barcode)?)
    }

    pub fn counts_by_status(&self, document_id: DocumentId) -> Result<StatusCounts, IssueError> {
        Ok(self.serials.counts_by_status(document_id)?)
    }

    /// Mark every record of the document that can take it as sent to vendor.
    #[instrument(skip(self), fields(document_id = %document_id), err)]
    pub fn mark_sent_to_vendor(
        &self,
        document_id: DocumentId,
        now: DateTime<Utc>,
    ) -> Result<u64, IssueError> {
        // Labels may not have been individually confirmed as printed; walk
        // Generated records through Printed first so the whole document moves.
        self.serials
            .transition_for_document(document_id, &Transition::Printed, now)?;
        Ok(self
            .serials
            .transition_for_document(document_id, &Transition::SentToVendor, now)?)
    }

    /// Cancel every non-terminal record of the document.
    #[instrument(skip(self, reason), fields(document_id = %document_id), err)]
    pub fn cancel_serials(
        &self,
        document_id: DocumentId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, IssueError> {
        Ok(self.serials.transition_for_document(
            document_id,
            &Transition::Cancelled {
                reason: reason.to_string(),
            },
            now,
        )?)
    }
}
