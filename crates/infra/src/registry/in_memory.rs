use std::collections::HashMap;
use std::sync::RwLock;

use serialforge_codec::{ChannelCode, SupplierCode};
use serialforge_core::VendorId;

use super::r#trait::{RegistryError, SupplierEntry, SupplierRegistry};

/// In-memory supplier registry with an explicit default channel.
#[derive(Debug)]
pub struct InMemorySupplierRegistry {
    entries: RwLock<HashMap<SupplierCode, SupplierEntry>>,
    default_channel: ChannelCode,
}

impl InMemorySupplierRegistry {
    pub fn new(default_channel: ChannelCode) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_channel,
        }
    }
}

impl SupplierRegistry for InMemorySupplierRegistry {
    fn register(&self, entry: SupplierEntry) -> Result<(), RegistryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RegistryError::Backend("lock poisoned".to_string()))?;

        if let Some(existing) = entries.get(&entry.code) {
            if existing.vendor_id != entry.vendor_id {
                return Err(RegistryError::CodeTaken {
                    code: entry.code,
                    vendor_id: existing.vendor_id,
                });
            }
        }
        entries.insert(entry.code.clone(), entry);
        Ok(())
    }

    fn code_for_vendor(&self, vendor_id: VendorId) -> Result<SupplierCode, RegistryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::Backend("lock poisoned".to_string()))?;

        entries
            .values()
            .find(|entry| entry.vendor_id == vendor_id)
            .map(|entry| entry.code.clone())
            .ok_or(RegistryError::VendorNotFound(vendor_id))
    }

    fn channel_for_supplier(&self, code: &SupplierCode) -> Result<ChannelCode, RegistryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::Backend("lock poisoned".to_string()))?;

        Ok(entries
            .get(code)
            .and_then(|entry| entry.channel.clone())
            .unwrap_or_else(|| self.default_channel.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InMemorySupplierRegistry {
        InMemorySupplierRegistry::new(ChannelCode::new("KA").unwrap())
    }

    fn entry(code: &str, vendor_id: VendorId, channel: Option<&str>) -> SupplierEntry {
        SupplierEntry {
            code: SupplierCode::new(code).unwrap(),
            vendor_id,
            channel: channel.map(|c| ChannelCode::new(c).unwrap()),
        }
    }

    #[test]
    fn resolves_vendor_to_its_code() {
        let registry = registry();
        let vendor = VendorId::new();
        registry.register(entry("TN", vendor, Some("KB"))).unwrap();
        assert_eq!(
            registry.code_for_vendor(vendor).unwrap(),
            SupplierCode::new("TN").unwrap()
        );
    }

    #[test]
    fn unknown_vendor_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.code_for_vendor(VendorId::new()).unwrap_err(),
            RegistryError::VendorNotFound(_)
        ));
    }

    #[test]
    fn code_bound_to_another_vendor_is_rejected() {
        let registry = registry();
        let first = VendorId::new();
        registry.register(entry("TN", first, None)).unwrap();
        let err = registry
            .register(entry("TN", VendorId::new(), None))
            .unwrap_err();
        assert!(matches!(err, RegistryError::CodeTaken { .. }));
        // Same vendor, same code: idempotent re-registration.
        registry.register(entry("TN", first, Some("KB"))).unwrap();
    }

    #[test]
    fn unmapped_supplier_falls_back_to_the_default_channel() {
        let registry = registry();
        let vendor = VendorId::new();
        registry.register(entry("TN", vendor, None)).unwrap();
        assert_eq!(
            registry
                .channel_for_supplier(&SupplierCode::new("TN").unwrap())
                .unwrap(),
            ChannelCode::new("KA").unwrap()
        );
        // Even a code never registered resolves to the default.
        assert_eq!(
            registry
                .channel_for_supplier(&SupplierCode::new("ZZ").unwrap())
                .unwrap(),
            ChannelCode::new("KA").unwrap()
        );
    }

    #[test]
    fn configured_channel_wins_over_the_default() {
        let registry = registry();
        registry
            .register(entry("TN", VendorId::new(), Some("KB")))
            .unwrap();
        assert_eq!(
            registry
                .channel_for_supplier(&SupplierCode::new("TN").unwrap())
                .unwrap(),
            ChannelCode::new("KB").unwrap()
        );
    }
}
