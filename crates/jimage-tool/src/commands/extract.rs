use anyhow::{Context, Result, bail};
use jimage_storage::ImageReader;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub fn handle(image: &Path, dir: &Path, include: Option<&str>) -> Result<()> {
    let reader = ImageReader::open(image)
        .with_context(|| format!("Failed to open image {}", image.display()))?;

    let mut extracted = 0usize;
    for location in reader.locations()? {
        let name = location.full_name();
        if include.is_some_and(|prefix| !name.starts_with(prefix)) {
            continue;
        }

        let target = target_path(dir, &name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let data = reader
            .get_resource(&location)
            .with_context(|| format!("Failed to read {name}"))?;
        fs::write(&target, data)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        debug!("Extracted {} to {}", name, target.display());
        extracted += 1;
    }

    info!("Extracted {} resources to {}", extracted, dir.display());
    println!("Extracted {extracted} resources");
    Ok(())
}

/// Place `name` under `dir`, refusing names that would escape it
fn target_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name.trim_start_matches('/'));
    if relative.as_os_str().is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        bail!("Refusing to extract resource {name:?} outside the output directory");
    }
    Ok(dir.join(relative))
}
