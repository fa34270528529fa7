use anyhow::{Context, Result};
use jimage_storage::ImageReader;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub fn handle(image: &Path, sorted: bool) -> Result<()> {
    let reader = ImageReader::open(image)
        .with_context(|| format!("Failed to open image {}", image.display()))?;
    let names = reader.list_names(sorted)?;

    let mut out = BufWriter::new(io::stdout().lock());
    for name in names {
        writeln!(out, "{name}")?;
    }
    out.flush()?;
    Ok(())
}
