//! Image discovery under the image root

use super::has_extension;
use std::path::{Path, PathBuf};

/// Recognized image extensions (lowercase, no dot)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

pub fn is_image(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// All image files under `root`, recursively, sorted by path
///
/// Unreadable directory entries are skipped; a missing root yields nothing.
pub fn list_images(root: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_image(p))
        .collect();

    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_images_recursive_and_filtered() -> std::io::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        std::fs::create_dir_all(root.join("trips/2024"))?;
        std::fs::write(root.join("cat.jpg"), b"")?;
        std::fs::write(root.join("dog.PNG"), b"")?;
        std::fs::write(root.join("trips/2024/beach.webp"), b"")?;
        std::fs::write(root.join("trips/scan.bmp"), b"")?;
        std::fs::write(root.join("trips/notes.txt"), b"")?;
        std::fs::write(root.join("anim.gif"), b"")?;

        let found: Vec<String> = list_images(root)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            found,
            vec!["cat.jpg", "dog.PNG", "trips/2024/beach.webp", "trips/scan.bmp"]
        );
        Ok(())
    }

    #[test]
    fn test_list_images_missing_root() {
        assert!(list_images(Path::new("/nonexistent/papyrus/images")).is_empty());
    }
}
