use serde::{Deserialize, Serialize};
use thiserror::Error;

use serialforge_codec::{ChannelCode, SupplierCode};
use serialforge_core::VendorId;

/// Registry error surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The 2-letter code is already bound to a different vendor.
    #[error("supplier code {code} is already bound to vendor {vendor_id}")]
    CodeTaken {
        code: SupplierCode,
        vendor_id: VendorId,
    },

    /// No active code exists for this vendor.
    #[error("no supplier code registered for vendor {0}")]
    VendorNotFound(VendorId),

    /// The backing store failed.
    #[error("registry backend error: {0}")]
    Backend(String),
}

/// One registry row: a vendor, its unique 2-letter code and (optionally) the
/// spare-part sales channel it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierEntry {
    pub code: SupplierCode,
    pub vendor_id: VendorId,
    pub channel: Option<ChannelCode>,
}

/// Vendor/code/channel resolution.
///
/// Channel resolution is a fallback policy, not an error path: suppliers
/// without a configured channel resolve to the registry's default channel so
/// that newly onboarded suppliers never block issuance.
pub trait SupplierRegistry: Send + Sync {
    /// Create a mapping. Codes are unique across active rows; re-registering
    /// an identical vendor/code pair is idempotent.
    fn register(&self, entry: SupplierEntry) -> Result<(), RegistryError>;

    fn code_for_vendor(&self, vendor_id: VendorId) -> Result<SupplierCode, RegistryError>;

    /// Channel for a supplier code, falling back to the default channel when
    /// no mapping is configured.
    fn channel_for_supplier(&self, code: &SupplierCode) -> Result<ChannelCode, RegistryError>;
}

impl<T: SupplierRegistry + ?Sized> SupplierRegistry for std::sync::Arc<T> {
    fn register(&self, entry: SupplierEntry) -> Result<(), RegistryError> {
        (**self).register(entry)
    }

    fn code_for_vendor(&self, vendor_id: VendorId) -> Result<SupplierCode, RegistryError> {
        (**self).code_for_vendor(vendor_id)
    }

    fn channel_for_supplier(&self, code: &SupplierCode) -> Result<ChannelCode, RegistryError> {
        (**self).channel_for_supplier(code)
    }
}
