//! Backend wiring: stores + issuance service + scan gateway.
//!
//! Default wiring is in-memory (dev/test). With the `postgres` feature and
//! `USE_PERSISTENT_STORES=true`, everything runs against Postgres instead.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use serialforge_codec::{
    BrandPrefix, ChannelCode, CodecConfig, IssueDate, ModelCode, SupplierCode,
};
use serialforge_core::{DocumentId, ItemType, VendorId};
use serialforge_infra::issuance::{BatchResult, IssuanceService, IssueError, IssueRequest};
use serialforge_infra::registry::{
    InMemorySupplierRegistry, RegistryError, SupplierEntry, SupplierRegistry,
};
use serialforge_infra::scan::{ScanGateway, ScanOutcome};
use serialforge_infra::sequence_store::{InMemorySequenceStore, SequenceStatus};
use serialforge_infra::serial_store::{InMemorySerialStore, StatusCounts};
use serialforge_serials::SerialRecord;

#[cfg(feature = "postgres")]
use serialforge_infra::{
    registry::PostgresSupplierRegistry, sequence_store::PostgresSequenceStore,
    serial_store::PostgresSerialStore,
};
#[cfg(feature = "postgres")]
use sqlx::PgPool;

type InMemoryIssuance = IssuanceService<
    Arc<InMemorySequenceStore>,
    Arc<InMemorySerialStore>,
    Arc<InMemorySupplierRegistry>,
>;

#[cfg(feature = "postgres")]
type PostgresIssuance = IssuanceService<
    Arc<PostgresSequenceStore>,
    Arc<PostgresSerialStore>,
    Arc<PostgresSupplierRegistry>,
>;

pub enum AppServices {
    InMemory {
        service: InMemoryIssuance,
        gateway: ScanGateway<Arc<InMemorySerialStore>>,
        registry: Arc<InMemorySupplierRegistry>,
    },
    #[cfg(feature = "postgres")]
    Postgres {
        service: PostgresIssuance,
        gateway: ScanGateway<Arc<PostgresSerialStore>>,
        registry: Arc<PostgresSupplierRegistry>,
    },
}

/// Codec constants come from the environment; the defaults match the
/// production deployment.
fn codec_from_env() -> CodecConfig {
    let mut codec = CodecConfig::default();
    if let Ok(brand) = std::env::var("SERIALFORGE_BRAND_PREFIX") {
        match BrandPrefix::new(&brand) {
            Ok(brand) => codec.brand_prefix = brand,
            Err(e) => tracing::warn!("ignoring SERIALFORGE_BRAND_PREFIX: {e}"),
        }
    }
    if let Ok(year) = std::env::var("SERIALFORGE_BASE_YEAR") {
        match year.parse::<i32>() {
            Ok(year) => codec.base_year = year,
            Err(e) => tracing::warn!("ignoring SERIALFORGE_BASE_YEAR: {e}"),
        }
    }
    codec
}

fn default_channel_from_env() -> ChannelCode {
    let value =
        std::env::var("SERIALFORGE_DEFAULT_CHANNEL").unwrap_or_else(|_| "KA".to_string());
    ChannelCode::new(&value).unwrap_or_else(|e| {
        tracing::warn!("ignoring SERIALFORGE_DEFAULT_CHANNEL: {e}");
        ChannelCode::new("KA").unwrap_or_else(|_| unreachable!())
    })
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_services().await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
        }
    }

    build_in_memory_services()
}

pub fn build_in_memory_services() -> AppServices {
    let codec = codec_from_env();
    let sequences = Arc::new(InMemorySequenceStore::new());
    let serials = Arc::new(InMemorySerialStore::new());
    let registry = Arc::new(InMemorySupplierRegistry::new(default_channel_from_env()));

    let service = IssuanceService::new(
        sequences,
        serials.clone(),
        registry.clone(),
        codec.clone(),
    );
    let gateway = ScanGateway::new(serials, codec);
    AppServices::InMemory {
        service,
        gateway,
        registry,
    }
}

#[cfg(feature = "postgres")]
async fn build_postgres_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");

    let codec = codec_from_env();
    let sequences = Arc::new(PostgresSequenceStore::new(pool.clone()));
    let serials = Arc::new(PostgresSerialStore::new(pool.clone()));
    let registry = Arc::new(PostgresSupplierRegistry::new(
        pool,
        default_channel_from_env(),
    ));

    let service = IssuanceService::new(
        sequences,
        serials.clone(),
        registry.clone(),
        codec.clone(),
    );
    let gateway = ScanGateway::new(serials, codec);
    AppServices::Postgres {
        service,
        gateway,
        registry,
    }
}

impl AppServices {
    pub fn issue(
        &self,
        request: &IssueRequest,
        now: DateTime<Utc>,
    ) -> Result<BatchResult, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => service.issue(request, now),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => service.issue(request, now),
        }
    }

    pub fn preview_codes(
        &self,
        supplier_code: &SupplierCode,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
        issued_on: IssueDate,
    ) -> Result<Vec<String>, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => {
                service.preview_codes(supplier_code, model_code, item_type, quantity, issued_on)
            }
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => {
                service.preview_codes(supplier_code, model_code, item_type, quantity, issued_on)
            }
        }
    }

    pub fn sequence_status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => service.sequence_status(model_code, item_type),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => service.sequence_status(model_code, item_type),
        }
    }

    pub fn lookup(&self, barcode: &str) -> Result<SerialRecord, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => service.lookup(barcode),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => service.lookup(barcode),
        }
    }

    pub fn counts_by_status(&self, document_id: DocumentId) -> Result<StatusCounts, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => service.counts_by_status(document_id),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => service.counts_by_status(document_id),
        }
    }

    pub fn mark_sent_to_vendor(
        &self,
        document_id: DocumentId,
        now: DateTime<Utc>,
    ) -> Result<u64, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => service.mark_sent_to_vendor(document_id, now),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => service.mark_sent_to_vendor(document_id, now),
        }
    }

    pub fn cancel_serials(
        &self,
        document_id: DocumentId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, IssueError> {
        match self {
            AppServices::InMemory { service, .. } => {
                service.cancel_serials(document_id, reason, now)
            }
            #[cfg(feature = "postgres")]
            AppServices::Postgres { service, .. } => {
                service.cancel_serials(document_id, reason, now)
            }
        }
    }

    pub fn scan(
        &self,
        barcode: &str,
        receiving_document_id: DocumentId,
        occurred_at: DateTime<Utc>,
    ) -> ScanOutcome {
        match self {
            AppServices::InMemory { gateway, .. } => {
                gateway.scan(barcode, receiving_document_id, occurred_at)
            }
            #[cfg(feature = "postgres")]
            AppServices::Postgres { gateway, .. } => {
                gateway.scan(barcode, receiving_document_id, occurred_at)
            }
        }
    }

    pub fn bulk_scan(
        &self,
        barcodes: &[String],
        receiving_document_id: DocumentId,
        occurred_at: DateTime<Utc>,
    ) -> Vec<ScanOutcome> {
        match self {
            AppServices::InMemory { gateway, .. } => {
                gateway.bulk_scan(barcodes, receiving_document_id, occurred_at)
            }
            #[cfg(feature = "postgres")]
            AppServices::Postgres { gateway, .. } => {
                gateway.bulk_scan(barcodes, receiving_document_id, occurred_at)
            }
        }
    }

    pub fn register_supplier(&self, entry: SupplierEntry) -> Result<(), RegistryError> {
        match self {
            AppServices::InMemory { registry, .. } => registry.register(entry),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { registry, .. } => registry.register(entry),
        }
    }

    pub fn code_for_vendor(&self, vendor_id: VendorId) -> Result<SupplierCode, RegistryError> {
        match self {
            AppServices::InMemory { registry, .. } => registry.code_for_vendor(vendor_id),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { registry, .. } => registry.code_for_vendor(vendor_id),
        }
    }
}
