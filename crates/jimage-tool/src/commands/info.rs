use anyhow::{Context, Result};
use jimage_formats::{ByteOrder, ImageHeader};
use jimage_storage::ImageReader;
use serde::Serialize;
use std::path::Path;

/// Layout summary printed by `info`
#[derive(Debug, Serialize)]
struct ImageInfo<'a> {
    path: String,
    byte_order: ByteOrder,
    header: &'a ImageHeader,
    resources: usize,
    index_size: u64,
    content_size: u64,
    file_size: u64,
    compressed_resources: usize,
}

pub fn handle(image: &Path, json: bool) -> Result<()> {
    let reader = ImageReader::open(image)
        .with_context(|| format!("Failed to open image {}", image.display()))?;
    let compressed_resources = reader
        .locations()?
        .iter()
        .filter(|location| location.is_compressed())
        .count();

    let info = ImageInfo {
        path: image.display().to_string(),
        byte_order: reader.byte_order(),
        header: reader.header(),
        resources: reader.len(),
        index_size: reader.index_size(),
        content_size: reader.content_size(),
        file_size: reader.file_size(),
        compressed_resources,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let header = info.header;
    println!("Image:       {}", info.path);
    println!("Magic:       0x{:08X}", header.magic);
    println!(
        "Version:     {}.{}",
        header.major_version, header.minor_version
    );
    println!("Byte order:  {}", info.byte_order);
    println!("Resources:   {}", info.resources);
    println!("Slots:       {}", header.location_count);
    println!("Compressed:  {}", info.compressed_resources);
    println!("Redirect:    {} bytes", header.redirect_table_size);
    println!(
        "Offsets:     {} bytes",
        header.locations_offset() - header.offsets_offset()
    );
    println!("Locations:   {} bytes", header.location_table_size);
    println!("Strings:     {} bytes", header.strings_table_size);
    println!("Index size:  {} bytes", info.index_size);
    println!("Content:     {} bytes", info.content_size);
    println!("File size:   {} bytes", info.file_size);
    Ok(())
}
