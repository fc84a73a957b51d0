/// Source folder access: listing images, reading them for display and
/// handing them to the system viewer.
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, SorterError};
use crate::state::data::{MediaItem, MediaMetadata};

/// Image extensions offered for sorting (compared lowercase)
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

/// List the images directly inside `source`, sorted by file name.
///
/// Subfolders are not descended into: recovered-file tools write one flat
/// folder per batch.
pub fn list_items(source: &Path) -> Result<Vec<MediaItem>> {
    if !source.is_dir() {
        return Err(SorterError::InvalidSource(source.display().to_string()));
    }

    let mut items: Vec<MediaItem> = WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
        .map(|entry| {
            let path = entry.path();
            MediaItem {
                path: path.to_string_lossy().to_string(),
                name: path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            }
        })
        .collect();

    items.sort_by(|a, b| a.name.cmp(&b.name));

    info!("🔍 Found {} images in {}", items.len(), source.display());
    Ok(items)
}

/// Check if this is an image file by extension
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Raw bytes of an item for display
pub fn read_content(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(SorterError::Io(format!("File not found: {}", path.display())));
    }
    Ok(fs::read(path)?)
}

/// Size and, when the format can be probed, pixel dimensions
pub fn metadata(path: &Path) -> Result<MediaMetadata> {
    let size = fs::metadata(path)?.len();

    // Dimensions are optional: a truncated recovered file still has a size
    let (width, height) = match image::image_dimensions(path) {
        Ok((w, h)) => (Some(w), Some(h)),
        Err(e) => {
            debug!("⚠️  Could not read dimensions of {}: {}", path.display(), e);
            (None, None)
        }
    };

    Ok(MediaMetadata { size, width, height })
}

/// Open an item in the system default application.
pub fn open_externally(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SorterError::Io(format!("File not found: {}", path.display())));
    }
    open::that(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_items_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.JPG"), b"b").unwrap();
        fs::write(dir.path().join("a.png"), b"aa").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("noext"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.jpg"), b"c").unwrap();

        let items = list_items(dir.path()).unwrap();

        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.JPG"]);
        assert_eq!(items[0].size, 2);
        assert!(items[0].path.ends_with("a.png"));
    }

    #[test]
    fn test_list_items_rejects_missing_folder() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        assert!(matches!(
            list_items(&missing),
            Err(SorterError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("/x/photo.JPEG")));
        assert!(is_image(Path::new("/x/scan.tif")));
        assert!(!is_image(Path::new("/x/movie.mp4")));
        assert!(!is_image(Path::new("/x/README")));
    }

    #[test]
    fn test_metadata_without_decodable_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        let meta = metadata(&path).unwrap();
        assert_eq!(meta.size, 17);
        assert_eq!(meta.width, None);
    }

    #[test]
    fn test_read_content_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_content(&dir.path().join("gone.jpg")).is_err());
    }
}
