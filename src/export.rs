use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::EnrichedRecord;
use crate::error::Result;

/// Persist the enriched dataset to a JSON file.
///
/// Output is pretty-printed with fields in declaration order and dates as
/// ISO-8601 strings, so identical runs write byte-identical files.
pub fn write_enriched_json(path: &Path, records: &[EnrichedRecord]) -> Result<()> {
    // Ensure output directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Serialize and write
    let json_content = serde_json::to_string_pretty(records)?;
    fs::write(path, json_content)?;

    info!(records = records.len(), path = %path.display(), "enriched output written");
    Ok(())
}
