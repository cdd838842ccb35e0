use std::fs;
use std::path::Path;

use log::{debug, warn};
use ron::extensions::Extensions;
use ron::value::RawValue;
use sled::{Db, Tree};

use super::dto::{QrCodeRecord, ScanEvent, ScanSummary};
use crate::error::{QrError, QrResult};
use crate::helpers::utils::normalize_short_code;

const QR_CODES_TREE: &str = "qr_codes";
const SCAN_EVENTS_TREE: &str = "scan_events";

/// sled-backed store for QR code records and their scan events.
#[derive(Clone)]
pub struct QrStorage {
    db: Db,
    qr_codes: Tree,
    scan_events: Tree,
}

impl QrStorage {
    pub fn new(db: Db) -> QrResult<Self> {
        let qr_codes = db.open_tree(QR_CODES_TREE)?;
        let scan_events = db.open_tree(SCAN_EVENTS_TREE)?;
        Ok(Self {
            db,
            qr_codes,
            scan_events,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> QrResult<Self> {
        Self::new(sled::open(path)?)
    }

    /// Insert or replace a record. Counters already stored for the code are
    /// kept, since the scan count never goes backwards.
    pub fn put_qr_code(&self, record: &QrCodeRecord) -> QrResult<()> {
        let mut failure: Option<serde_json::Error> = None;

        self.qr_codes
            .update_and_fetch(record.short_code.as_bytes(), |old| {
                failure = None;
                let mut merged = record.clone();
                if let Some(existing) = old.and_then(|b| serde_json::from_slice::<QrCodeRecord>(b).ok()) {
                    merged.scan_count = merged.scan_count.max(existing.scan_count);
                    merged.last_scanned_at = merged.last_scanned_at.max(existing.last_scanned_at);
                    merged.created_at = existing.created_at;
                    merged.id = existing.id;
                }
                match serde_json::to_vec(&merged) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        failure = Some(e);
                        old.map(|b| b.to_vec())
                    }
                }
            })?;

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn get_qr_code(&self, short_code: &str) -> QrResult<Option<QrCodeRecord>> {
        match self.qr_codes.get(short_code.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_qr_codes(&self) -> QrResult<Vec<QrCodeRecord>> {
        let mut records = Vec::new();
        for entry in self.qr_codes.iter() {
            let (_key, bytes) = entry?;
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }

    pub fn count_qr_codes(&self) -> usize {
        self.qr_codes.len()
    }

    /// Count one scan against the event's code and store the event.
    ///
    /// The increment is a compare-and-swap on the record, so concurrent scans
    /// of the same code never lose updates. Returns the new count.
    pub fn record_scan(&self, event: &ScanEvent) -> QrResult<u64> {
        let mut failure: Option<serde_json::Error> = None;

        let updated = self
            .qr_codes
            .update_and_fetch(event.short_code.as_bytes(), |old| {
                failure = None;
                let bytes = old?;
                let mut record = match serde_json::from_slice::<QrCodeRecord>(bytes) {
                    Ok(record) => record,
                    Err(e) => {
                        failure = Some(e);
                        return Some(bytes.to_vec());
                    }
                };

                record.scan_count = record.scan_count.saturating_add(1);
                record.last_scanned_at = record.last_scanned_at.max(Some(event.scanned_at));

                match serde_json::to_vec(&record) {
                    Ok(updated) => Some(updated),
                    Err(e) => {
                        failure = Some(e);
                        Some(bytes.to_vec())
                    }
                }
            })?;

        if let Some(e) = failure {
            return Err(e.into());
        }
        let bytes = updated.ok_or_else(|| QrError::NotFound(event.short_code.clone()))?;
        let record: QrCodeRecord = serde_json::from_slice(&bytes)?;

        self.scan_events
            .insert(event_key(event), serde_json::to_vec(event)?)?;

        debug!(
            "Recorded scan {} for {} (count {})",
            event.id, event.short_code, record.scan_count
        );

        Ok(record.scan_count)
    }

    /// Scan events for a code, oldest first.
    pub fn scan_events(&self, short_code: &str) -> QrResult<Vec<ScanEvent>> {
        let mut events = Vec::new();
        for entry in self.scan_events.scan_prefix(event_prefix(short_code)) {
            let (_key, bytes) = entry?;
            events.push(serde_json::from_slice(&bytes)?);
        }
        Ok(events)
    }

    pub fn scan_summary(&self, short_code: &str) -> QrResult<ScanSummary> {
        let mut summary = ScanSummary::new(short_code);
        for event in self.scan_events(short_code)? {
            summary.add(&event);
        }
        Ok(summary)
    }

    /// Upsert the records listed in a RON file. Returns how many were stored.
    pub fn seed_from_file(&self, path: impl AsRef<Path>) -> QrResult<usize> {
        let contents = fs::read_to_string(path.as_ref())?;
        self.seed_from_str(&contents)
    }

    /// Records are parsed one at a time. A record that does not describe a
    /// valid QR code is skipped with a warning; a file that is not a RON list
    /// fails as a whole.
    pub fn seed_from_str(&self, contents: &str) -> QrResult<usize> {
        let entries: Vec<Box<RawValue>> =
            ron::from_str(contents).map_err(|e| QrError::Seed(e.to_string()))?;
        let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);

        let mut stored = 0;
        for (index, entry) in entries.iter().enumerate() {
            let mut record: QrCodeRecord = match options.from_str(entry.get_ron()) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping seed record {}: {}", index, e);
                    continue;
                }
            };
            let Some(code) = normalize_short_code(&record.short_code) else {
                warn!("Skipping seed record with invalid short code {:?}", record.short_code);
                continue;
            };
            record.short_code = code;
            if !record.is_redirectable() {
                warn!(
                    "Seed record {} will not redirect (dynamic: {}, active: {}, target: {:?})",
                    record.short_code, record.is_dynamic, record.is_active, record.target_url
                );
            }
            self.put_qr_code(&record)?;
            stored += 1;
        }

        Ok(stored)
    }

    pub async fn flush(&self) -> QrResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

fn event_prefix(short_code: &str) -> String {
    format!("{short_code}:")
}

// Keys sort by scan time within a code.
fn event_key(event: &ScanEvent) -> String {
    let nanos = event.scanned_at.timestamp_nanos_opt().unwrap_or(i64::MAX).max(0);
    format!("{}{:020}:{}", event_prefix(&event.short_code), nanos, event.id)
}
