use crate::BuildArgs;
use anyhow::{Context, Result};
use jimage_storage::{DirectoryExternalFiles, ImageWriter, WriterConfig};

pub fn handle(args: BuildArgs) -> Result<()> {
    let config = WriterConfig::new()
        .with_compression(args.compress)
        .with_compression_level(args.compression_level)
        .with_byte_order(args.byte_order.into())
        .with_retry_limit(args.retry_limit)
        .with_growth_limit(args.growth_limit);

    let mut writer = ImageWriter::new(config);
    if let Some(dir) = &args.external_dir {
        writer = writer.with_external_files(DirectoryExternalFiles::new(dir));
    }
    for module in args.modules {
        writer.add_archive(module);
    }

    let summary = writer
        .build(&args.output)
        .with_context(|| format!("Failed to build image {}", args.output.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Wrote {} resources to {} ({} bytes index, {} bytes content)",
            summary.resources,
            args.output.display(),
            summary.index_size,
            summary.content_size
        );
        if summary.duplicates > 0 {
            println!("Dropped {} duplicate resources", summary.duplicates);
        }
        if summary.external_files > 0 {
            println!("Routed {} external files", summary.external_files);
        }
    }
    Ok(())
}
