use anyhow::{Context, Result};
use jimage_storage::ImageReader;
use std::path::Path;

pub fn handle(image: &Path, json: bool) -> Result<()> {
    let reader = ImageReader::open(image)
        .with_context(|| format!("Failed to open image {}", image.display()))?;
    let report = reader
        .verify()
        .with_context(|| format!("Verification of {} failed", image.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Verified {} resources ({} compressed, {} bytes stored, {} bytes uncompressed)",
            report.resources, report.compressed, report.stored_bytes, report.uncompressed_bytes
        );
    }
    Ok(())
}
