// src/io/reporting.rs

use std::path::Path;

use tracing::info;

use crate::io::events::EventLog;

/// Writes the event log to a CSV file, one row per record.
pub fn write_event_log(file_path: impl AsRef<Path>, log: &EventLog) -> Result<(), csv::Error> {
    let path = file_path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    for record in log.records() {
        wtr.serialize(record)?;
    }

    wtr.flush()?;
    info!(rows = log.len(), path = %path.display(), "event log exported");
    Ok(())
}
