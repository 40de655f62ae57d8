//! Integration tests for the full issuance pipeline.
//!
//! Wiring: registry + sequence store + record store → IssuanceService and
//! ScanGateway, all in-memory, the same composition the API layer uses.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use serialforge_codec::{ChannelCode, CodecConfig, IssueDate, ModelCode, SupplierCode};
    use serialforge_core::{DocumentId, ItemType, VendorId};
    use serialforge_sequences::SequenceError;
    use serialforge_serials::SerialStatus;

    use crate::issuance::{IssuanceService, IssueError, IssueLine, IssueRequest};
    use crate::registry::{InMemorySupplierRegistry, SupplierEntry, SupplierRegistry};
    use crate::scan::ScanGateway;
    use crate::sequence_store::{InMemorySequenceStore, SequenceStore, SequenceStoreError};
    use crate::serial_store::InMemorySerialStore;

    type Service = IssuanceService<
        Arc<InMemorySequenceStore>,
        Arc<InMemorySerialStore>,
        Arc<InMemorySupplierRegistry>,
    >;

    struct Harness {
        sequences: Arc<InMemorySequenceStore>,
        registry: Arc<InMemorySupplierRegistry>,
        service: Service,
        gateway: ScanGateway<Arc<InMemorySerialStore>>,
    }

    fn harness() -> Harness {
        let sequences = Arc::new(InMemorySequenceStore::new());
        let serials = Arc::new(InMemorySerialStore::new());
        let registry = Arc::new(InMemorySupplierRegistry::new(
            ChannelCode::new("KA").unwrap(),
        ));
        let codec = CodecConfig::default();
        let service = IssuanceService::new(
            sequences.clone(),
            serials.clone(),
            registry.clone(),
            codec.clone(),
        );
        let gateway = ScanGateway::new(serials.clone(), codec);
        Harness {
            sequences,
            registry,
            service,
            gateway,
        }
    }

    fn model() -> ModelCode {
        ModelCode::new("IEL").unwrap()
    }

    fn supplier() -> SupplierCode {
        SupplierCode::new("TN").unwrap()
    }

    fn issued_on() -> IssueDate {
        IssueDate::new(2026, 1).unwrap()
    }

    fn request(quantity: u64, item_type: ItemType) -> IssueRequest {
        IssueRequest {
            document_id: DocumentId::new(),
            supplier_code: supplier(),
            issued_on: issued_on(),
            lines: vec![IssueLine {
                model_code: model(),
                item_type,
                quantity,
                product_ref: None,
            }],
        }
    }

    #[test]
    fn issuing_finished_goods_renders_the_documented_first_code() {
        let h = harness();
        let batch = h
            .service
            .issue(&request(3, ItemType::FinishedGood), Utc::now())
            .unwrap();

        assert_eq!(batch.total_issued, 3);
        let line = &batch.lines[0];
        assert_eq!((line.start, line.end), (1, 3));
        assert_eq!(line.first_barcode, "APAAAIEL00000001");
        assert_eq!(line.last_barcode, "APAAAIEL00000003");

        let record = h.service.lookup("APAAAIEL00000002").unwrap();
        assert_eq!(record.status, SerialStatus::Generated);
        assert_eq!(record.issuing_document_id, batch.document_id);
    }

    #[test]
    fn spare_parts_use_the_default_channel_when_none_is_configured() {
        let h = harness();
        // Vendor registered without a channel mapping: issuance still works.
        h.registry
            .register(SupplierEntry {
                code: supplier(),
                vendor_id: VendorId::new(),
                channel: None,
            })
            .unwrap();

        let batch = h
            .service
            .issue(&request(1, ItemType::SparePart), Utc::now())
            .unwrap();
        // brand + supplier + year A + month A + default channel KA + serial.
        assert_eq!(batch.lines[0].first_barcode, "APTNAAKA00000001");
    }

    #[test]
    fn sequences_are_shared_across_batches_but_not_across_item_types() {
        let h = harness();
        h.service
            .issue(&request(150, ItemType::FinishedGood), Utc::now())
            .unwrap();
        let second = h
            .service
            .issue(&request(50, ItemType::FinishedGood), Utc::now())
            .unwrap();
        assert_eq!(
            (second.lines[0].start, second.lines[0].end),
            (151, 200)
        );

        let spare = h
            .service
            .issue(&request(5, ItemType::SparePart), Utc::now())
            .unwrap();
        assert_eq!(spare.lines[0].start, 1);
    }

    #[test]
    fn overflow_aborts_the_line_but_keeps_prior_lines_committed() {
        let h = harness();
        let small = ModelCode::new("XSM").unwrap();
        h.sequences
            .set_max_serial(&small, ItemType::FinishedGood, 10);

        let document_id = DocumentId::new();
        let request = IssueRequest {
            document_id,
            supplier_code: supplier(),
            issued_on: issued_on(),
            lines: vec![
                IssueLine {
                    model_code: model(),
                    item_type: ItemType::FinishedGood,
                    quantity: 5,
                    product_ref: None,
                },
                IssueLine {
                    model_code: small.clone(),
                    item_type: ItemType::FinishedGood,
                    quantity: 50,
                    product_ref: None,
                },
            ],
        };

        let err = h.service.issue(&request, Utc::now()).unwrap_err();
        match err {
            IssueError::Line { index: 1, source, .. } => {
                assert!(matches!(
                    *source,
                    IssueError::Sequence(SequenceStoreError::Sequence(
                        SequenceError::Overflow { .. }
                    ))
                ));
            }
            other => panic!("expected line error, got {other:?}"),
        }

        // Line 0 stays committed; the overflowing counter is untouched.
        let counts = h.service.counts_by_status(document_id).unwrap();
        assert_eq!(counts.get(&SerialStatus::Generated), Some(&5));
        let status = h
            .sequences
            .status(&small, ItemType::FinishedGood)
            .unwrap();
        assert_eq!(status.last_serial, 0);
    }

    #[test]
    fn scan_receives_a_sent_code_and_rejects_the_second_attempt() {
        let h = harness();
        let batch = h
            .service
            .issue(&request(1, ItemType::FinishedGood), Utc::now())
            .unwrap();
        let barcode = batch.lines[0].first_barcode.clone();

        h.service
            .mark_sent_to_vendor(batch.document_id, Utc::now())
            .unwrap();

        let receiving = DocumentId::new();
        let outcome = h.gateway.scan(&barcode, receiving, Utc::now());
        let received_at = match outcome {
            crate::scan::ScanOutcome::Accepted { ref record } => {
                assert_eq!(record.status, SerialStatus::Received);
                assert_eq!(record.receiving_document_id, Some(receiving));
                record.received_at
            }
            ref other => panic!("expected accepted scan, got {other:?}"),
        };

        // Second scan: same rejection every time, no state change.
        for _ in 0..3 {
            let outcome = h.gateway.scan(&barcode, DocumentId::new(), Utc::now());
            match outcome {
                crate::scan::ScanOutcome::Rejected { ref reason, .. } => {
                    assert_eq!(reason, "already processed, current status received");
                }
                ref other => panic!("expected rejected scan, got {other:?}"),
            }
        }
        let record = h.service.lookup(&barcode).unwrap();
        assert_eq!(record.received_at, received_at);
        assert_eq!(record.receiving_document_id, Some(receiving));
    }

    #[test]
    fn scan_accepts_lower_case_and_padded_input() {
        let h = harness();
        let batch = h
            .service
            .issue(&request(1, ItemType::FinishedGood), Utc::now())
            .unwrap();
        let barcode = batch.lines[0].first_barcode.clone();

        h.service
            .mark_sent_to_vendor(batch.document_id, Utc::now())
            .unwrap();

        // Hand-keyed entry arrives lower case with stray whitespace; the
        // stored record is keyed by the rendered upper-case code.
        let keyed = format!("  {}  ", barcode.to_ascii_lowercase());
        let outcome = h.gateway.scan(&keyed, DocumentId::new(), Utc::now());
        match outcome {
            crate::scan::ScanOutcome::Accepted { ref record } => {
                assert_eq!(record.barcode, barcode);
                assert_eq!(record.status, SerialStatus::Received);
            }
            ref other => panic!("expected accepted scan, got {other:?}"),
        }
        assert_eq!(
            h.service.lookup(&barcode).unwrap().status,
            SerialStatus::Received
        );
    }

    #[test]
    fn scan_rejects_codes_not_yet_sent_without_mutating_them() {
        let h = harness();
        let batch = h
            .service
            .issue(&request(1, ItemType::FinishedGood), Utc::now())
            .unwrap();
        let barcode = batch.lines[0].first_barcode.clone();

        let outcome = h.gateway.scan(&barcode, DocumentId::new(), Utc::now());
        assert!(!outcome.is_accepted());
        assert_eq!(
            h.service.lookup(&barcode).unwrap().status,
            SerialStatus::Generated
        );
    }

    #[test]
    fn bulk_scan_returns_one_outcome_per_input_in_order() {
        let h = harness();
        let batch = h
            .service
            .issue(&request(2, ItemType::FinishedGood), Utc::now())
            .unwrap();
        h.service
            .mark_sent_to_vendor(batch.document_id, Utc::now())
            .unwrap();

        let inputs = vec![
            batch.lines[0].first_barcode.clone(),
            "not-a-code".to_string(),
            "APAAAZZZ00000009".to_string(), // well-formed but never issued
            batch.lines[0].last_barcode.clone(),
        ];
        let outcomes = h
            .gateway
            .bulk_scan(&inputs, DocumentId::new(), Utc::now());

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_accepted());
        assert!(!outcomes[1].is_accepted());
        assert!(!outcomes[2].is_accepted());
        assert!(outcomes[3].is_accepted());
    }

    #[test]
    fn preview_codes_never_consume_serial_numbers() {
        let h = harness();
        let first = h
            .service
            .preview_codes(&supplier(), &model(), ItemType::FinishedGood, 3, issued_on())
            .unwrap();
        let second = h
            .service
            .preview_codes(&supplier(), &model(), ItemType::FinishedGood, 3, issued_on())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0], "APAAAIEL00000001");

        // Issuing afterwards starts exactly where the preview said.
        let batch = h
            .service
            .issue(&request(3, ItemType::FinishedGood), Utc::now())
            .unwrap();
        assert_eq!(batch.lines[0].first_barcode, first[0]);
    }

    #[test]
    fn cancel_serials_terminates_every_non_terminal_record() {
        let h = harness();
        let batch = h
            .service
            .issue(&request(3, ItemType::FinishedGood), Utc::now())
            .unwrap();
        let document_id = batch.document_id;

        let cancelled = h
            .service
            .cancel_serials(document_id, "po voided", Utc::now())
            .unwrap();
        assert_eq!(cancelled, 3);

        let counts = h.service.counts_by_status(document_id).unwrap();
        assert_eq!(counts.get(&SerialStatus::Cancelled), Some(&3));

        // Cancelling again finds nothing left to cancel.
        let again = h
            .service
            .cancel_serials(document_id, "po voided", Utc::now())
            .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn concurrent_issuance_for_one_model_yields_distinct_gapless_serials() {
        let h = Arc::new(harness());
        let quantities = [7u64, 13, 5, 11, 3, 17, 9, 2];

        let mut handles = Vec::new();
        for quantity in quantities {
            let h = Arc::clone(&h);
            handles.push(std::thread::spawn(move || {
                h.service
                    .issue(&request(quantity, ItemType::FinishedGood), Utc::now())
                    .unwrap()
            }));
        }

        let mut ranges: Vec<(u64, u64)> = handles
            .into_iter()
            .map(|handle| {
                let batch = handle.join().unwrap();
                (batch.lines[0].start, batch.lines[0].end)
            })
            .collect();
        ranges.sort();

        let total: u64 = quantities.iter().sum();
        let mut expected_start = 1;
        for (start, end) in ranges {
            assert_eq!(start, expected_start, "gap or overlap at {start}..{end}");
            expected_start = end + 1;
        }
        assert_eq!(expected_start, total + 1);

        // Every rendered barcode exists and is distinct: lookup each serial.
        for serial in 1..=total {
            let barcode = format!("APAAAIEL{serial:08}");
            assert!(h.service.lookup(&barcode).is_ok(), "missing {barcode}");
        }
    }
}
