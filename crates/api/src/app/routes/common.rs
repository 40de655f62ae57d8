use std::sync::Arc;

use crate::app::services::AppServices;

/// Run a store-touching closure off the async runtime.
///
/// Every backend call is synchronous (the Postgres wiring blocks on its own
/// futures), so handlers must not run them on a runtime worker thread.
pub async fn run_blocking<T, F>(services: Arc<AppServices>, f: F) -> T
where
    F: FnOnce(&AppServices) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&services))
        .await
        .expect("blocking handler task panicked")
}
