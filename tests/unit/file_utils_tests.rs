/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use subclip::file_utils::FileManager;
use crate::common;

/// Test file existence checking
#[test]
fn test_file_exists_withFileAndDirectory_shouldOnlyAcceptFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.txt", "a")?;

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.txt")));
    Ok(())
}

/// Test writing into a directory that does not exist yet
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("dir").join("list.txt");

    FileManager::write_to_file(&path, "file 'part-0.mp4'")?;
    assert_eq!(FileManager::read_to_string(&path)?, "file 'part-0.mp4'");
    Ok(())
}

#[test]
fn test_remove_quietly_withMissingFile_shouldReportGone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "part-0.mp4", "clip")?;

    assert!(FileManager::remove_quietly(&file));
    assert!(!file.exists());
    assert!(FileManager::remove_quietly(&file));
    Ok(())
}

#[test]
fn test_find_files_with_prefix_shouldMatchPrefixAndExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "123-captions.pt.vtt", "WEBVTT")?;
    common::create_test_file(temp_dir.path(), "123-captions.info.json", "{}")?;
    common::create_test_file(temp_dir.path(), "456-captions.pt.vtt", "WEBVTT")?;
    std::fs::create_dir(temp_dir.path().join("123-captions.dir.vtt"))?;

    let found = FileManager::find_files_with_prefix(temp_dir.path(), "123-captions", ".vtt")?;
    assert_eq!(found, vec![temp_dir.path().join("123-captions.pt.vtt")]);
    Ok(())
}

#[test]
fn test_stamped_path_shouldStayInDirectoryWithSuffix() {
    let dir = std::env::temp_dir();
    let path = FileManager::stamped_path(&dir, "-captions");
    assert_eq!(path.parent(), Some(dir.as_path()));
    assert!(path.file_name().unwrap().to_string_lossy().ends_with("-captions"));
}
