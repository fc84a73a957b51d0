/// Commit classifications to disk: copy, verify, deduplicate, delete.
///
/// Each entry is handled independently; a failure is recorded and the run
/// continues with the next file.
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::state::data::{SortRequest, SortResult};

/// What happened to one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Copied,
    /// An identical file already sat in the destination; source removed
    Duplicate,
}

/// Run a finalize request against the local filesystem.
pub fn sort_media(request: &SortRequest) -> SortResult {
    let mut copied = 0;
    let mut skipped = 0;
    let mut errors = Vec::new();

    for (source_path, destination_name) in &request.classifications {
        let Some(destination) = request
            .destinations
            .iter()
            .find(|d| &d.name == destination_name)
        else {
            errors.push(format!("Destination folder not found: {destination_name}"));
            continue;
        };

        match process_entry(Path::new(source_path), Path::new(&destination.path)) {
            Ok(EntryOutcome::Copied) => copied += 1,
            Ok(EntryOutcome::Duplicate) => skipped += 1,
            Err(e) => {
                warn!("⚠️  Error processing {}: {}", source_path, e);
                errors.push(format!("Error processing {source_path}: {e}"));
            }
        }
    }

    let failed = errors.len();
    let mut message = format!("Copied: {copied}, Skipped (duplicates): {skipped}, Failed: {failed}");
    if !errors.is_empty() {
        message.push_str("\nErrors:\n");
        message.push_str(&errors.join("\n"));
    }

    info!("📦 Sort finished: {} copied, {} duplicates, {} failed", copied, skipped, failed);

    SortResult {
        success: failed == 0,
        message,
        copied,
        skipped,
        failed,
    }
}

fn process_entry(source: &Path, destination_dir: &Path) -> std::result::Result<EntryOutcome, String> {
    let file_name = source
        .file_name()
        .ok_or_else(|| format!("not a file path: {}", source.display()))?;

    fs::create_dir_all(destination_dir).map_err(|e| e.to_string())?;

    let mut target = destination_dir.join(file_name);
    if target.exists() {
        let source_hash = file_hash(source).map_err(|e| e.to_string())?;
        let target_hash = file_hash(&target).map_err(|e| e.to_string())?;

        if source_hash == target_hash {
            fs::remove_file(source).map_err(|e| e.to_string())?;
            return Ok(EntryOutcome::Duplicate);
        }
        target = unique_destination(destination_dir, &file_name.to_string_lossy());
    }

    fs::copy(source, &target).map_err(|e| e.to_string())?;

    let source_hash = file_hash(source).map_err(|e| e.to_string())?;
    let target_hash = file_hash(&target).map_err(|e| e.to_string())?;
    if source_hash != target_hash {
        // Keep the source; the copy is not trustworthy
        let _ = fs::remove_file(&target);
        return Err(format!(
            "Hash verification failed for: {}",
            file_name.to_string_lossy()
        ));
    }

    fs::remove_file(source).map_err(|e| e.to_string())?;
    Ok(EntryOutcome::Copied)
}

/// Hex SHA-256 of a file, streamed in 8KB chunks
pub fn file_hash(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// First free `stem_N.ext` in `directory`, counting from 1
fn unique_destination(directory: &Path, file_name: &str) -> PathBuf {
    let (stem, ext) = match file_name.rfind('.') {
        Some(dot) if dot > 0 => (&file_name[..dot], &file_name[dot..]),
        _ => (file_name, ""),
    };

    let mut counter = 1;
    loop {
        let candidate = directory.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{ClassificationMap, Destination};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        family: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in");
        let family = dir.path().join("sorted").join("family");
        fs::create_dir_all(&source).unwrap();
        Fixture {
            _dir: dir,
            source,
            family,
        }
    }

    fn request(fx: &Fixture, entries: &[(&str, &str)]) -> SortRequest {
        let classifications: ClassificationMap = entries
            .iter()
            .map(|(file, dest)| {
                (
                    fx.source.join(file).to_string_lossy().to_string(),
                    dest.to_string(),
                )
            })
            .collect();
        SortRequest {
            source_path: fx.source.to_string_lossy().to_string(),
            destinations: vec![Destination {
                name: "Family".to_string(),
                key: 'f',
                path: fx.family.to_string_lossy().to_string(),
            }],
            classifications,
        }
    }

    #[test]
    fn test_copies_verifies_and_deletes_source() {
        let fx = fixture();
        fs::write(fx.source.join("a.jpg"), b"alpha").unwrap();
        fs::write(fx.source.join("b.jpg"), b"beta").unwrap();

        let result = sort_media(&request(&fx, &[("a.jpg", "Family"), ("b.jpg", "Family")]));

        assert!(result.success);
        assert_eq!((result.copied, result.skipped, result.failed), (2, 0, 0));
        assert_eq!(fs::read(fx.family.join("a.jpg")).unwrap(), b"alpha");
        assert!(!fx.source.join("a.jpg").exists());
        assert!(result.message.starts_with("Copied: 2, Skipped (duplicates): 0, Failed: 0"));
    }

    #[test]
    fn test_identical_file_is_skipped_as_duplicate() {
        let fx = fixture();
        fs::create_dir_all(&fx.family).unwrap();
        fs::write(fx.family.join("a.jpg"), b"alpha").unwrap();
        fs::write(fx.source.join("a.jpg"), b"alpha").unwrap();

        let result = sort_media(&request(&fx, &[("a.jpg", "Family")]));

        assert!(result.success);
        assert_eq!(result.skipped, 1);
        assert!(!fx.source.join("a.jpg").exists());
        assert!(!fx.family.join("a_1.jpg").exists());
    }

    #[test]
    fn test_name_clash_gets_unique_name() {
        let fx = fixture();
        fs::create_dir_all(&fx.family).unwrap();
        fs::write(fx.family.join("a.jpg"), b"other").unwrap();
        fs::write(fx.family.join("a_1.jpg"), b"other too").unwrap();
        fs::write(fx.source.join("a.jpg"), b"alpha").unwrap();

        let result = sort_media(&request(&fx, &[("a.jpg", "Family")]));

        assert_eq!(result.copied, 1);
        assert_eq!(fs::read(fx.family.join("a_2.jpg")).unwrap(), b"alpha");
        assert_eq!(fs::read(fx.family.join("a.jpg")).unwrap(), b"other");
    }

    #[test]
    fn test_unknown_destination_and_missing_source_fail() {
        let fx = fixture();

        let result = sort_media(&request(&fx, &[("gone.jpg", "Family"), ("x.jpg", "Pets")]));

        assert!(!result.success);
        assert_eq!(result.failed, 2);
        assert!(result.message.contains("Destination folder not found: Pets"));
        assert!(result.message.contains("Errors:"));
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            unique_destination(dir.path(), "README"),
            dir.path().join("README_1")
        );
        assert_eq!(
            unique_destination(dir.path(), ".hidden"),
            dir.path().join(".hidden_1")
        );
    }

    #[test]
    fn test_file_hash_is_sha256_hex() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            file_hash(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
