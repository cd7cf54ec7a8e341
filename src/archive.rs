use crate::constants::{AMOUNT_COLUMN, LABEL_COLUMN};
use crate::error::Result;
use crate::types::RawLineItem;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use zip::ZipArchive;

/// Extract every `.csv` entry of a filing archive into a scratch directory
/// named after the archive.
///
/// A corrupt or unreadable archive yields zero entries with a logged error;
/// it never errors to the caller, so one bad download cannot abort the rest
/// of a company's batch.
pub fn extract_csv_entries(zip_path: &Path, scratch_dir: &Path) -> Vec<PathBuf> {
    let stem = zip_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let extract_dir = scratch_dir.join(format!("{stem}_extracted"));

    if let Err(e) = fs::create_dir_all(&extract_dir) {
        error!("Failed to create scratch dir {}: {}", extract_dir.display(), e);
        return Vec::new();
    }

    let file = match File::open(zip_path) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to open archive {}: {}", zip_path.display(), e);
            return Vec::new();
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(e) => {
            error!("Bad ZIP file {}: {}", zip_path.display(), e);
            return Vec::new();
        }
    };

    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                error!("Unreadable entry {} in {}: {}", index, zip_path.display(), e);
                continue;
            }
        };
        if !entry.is_file() || !entry.name().ends_with(".csv") {
            continue;
        }
        // enclosed_name rejects entries that would escape the scratch dir
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            continue;
        };
        let destination = extract_dir.join(relative);
        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create {}: {}", parent.display(), e);
                continue;
            }
        }
        match File::create(&destination).and_then(|mut out| io::copy(&mut entry, &mut out)) {
            Ok(_) => {
                debug!("Extracted: {}", entry.name());
                extracted.push(destination);
            }
            Err(e) => error!("Failed to extract {}: {}", entry.name(), e),
        }
    }

    info!(
        "Extracted {} CSV files from {}",
        extracted.len(),
        zip_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    extracted
}

/// Read one extracted tabular document into raw line items.
///
/// EDINET CSVs are cp932 (Shift_JIS) encoded; the decoded rows are keyed by
/// the 要素名 and 金額 columns. A file without the label column yields no
/// line items; empty amount cells become `None`.
pub fn read_line_items(csv_path: &Path) -> Result<Vec<RawLineItem>> {
    let bytes = fs::read(csv_path)?;
    let (text, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let Some(label_index) = headers.iter().position(|h| h == LABEL_COLUMN) else {
        debug!("No {} column in {}", LABEL_COLUMN, csv_path.display());
        return Ok(Vec::new());
    };
    let amount_index = headers.iter().position(|h| h == AMOUNT_COLUMN);

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record?;
        let label = record.get(label_index).unwrap_or("").trim().to_string();
        let amount = amount_index
            .and_then(|index| record.get(index))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string);
        items.push(RawLineItem { label, amount });
    }
    Ok(items)
}
