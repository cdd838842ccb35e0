use log::{debug, error};
use qr_core::qr_code::{dto::ScanEvent, storage::QrStorage};
use tokio::task::JoinHandle;

/// Record an allowed scan in the background.
///
/// The redirect has already been answered when this runs. Failures are only
/// logged and nothing is retried.
pub fn spawn_scan_record(storage: QrStorage, event: ScanEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        let short_code = event.short_code.clone();
        let result = tokio::task::spawn_blocking(move || storage.record_scan(&event)).await;

        match result {
            Ok(Ok(count)) => debug!("Scan recorded for {} (total {})", short_code, count),
            Ok(Err(e)) => error!("Failed to record scan for {}: {}", short_code, e),
            Err(e) => error!("Scan recording task for {} panicked: {}", short_code, e),
        }
    })
}
