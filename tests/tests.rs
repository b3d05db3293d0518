use std::fs;
use std::path::Path;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use tempfile::TempDir;
use layman::*;

/// Writes a gzipped tarball holding `overlay/profiles/repo_name`.
fn write_tarball(path: &Path, repo_name: &str) {
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let content = format!("{repo_name}\n");
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "overlay/profiles/repo_name", content.as_bytes())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

fn tar_overlay(name: &str, archive: &Path) -> serde_json::Value {
    json!({
        "name": name,
        "description": format!("The {name} overlay"),
        "owner_email": "overlays@example.org",
        "sources": [{"type": "tar", "src": archive.display().to_string(), "subpath": "overlay"}],
        "official": true
    })
}

fn setup_tests() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("kde.tar.gz");
    write_tarball(&archive, "kde");

    let first = temp_dir.path().join("first.json");
    fs::write(
        &first,
        json!({"overlay": [tar_overlay("kde", &archive), tar_overlay("wrobel", &archive)]}).to_string(),
    )
    .unwrap();
    let mut replacement = tar_overlay("wrobel", &archive);
    replacement["description"] = json!("Moved");
    let second = temp_dir.path().join("second.json");
    fs::write(&second, json!({"overlay": [replacement]}).to_string()).unwrap();

    let mut config = Config::rooted(temp_dir.path());
    config.overlays = vec![
        format!("file://{}", first.display()),
        second.display().to_string(),
    ];
    (temp_dir, config)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use layman::*;
    use crate::setup_tests;

    #[test]
    fn test_remote_db_is_empty_before_fetch() {
        let (_dir, config) = setup_tests();
        let remote = RemoteDb::open(&config).unwrap();
        assert!(remote.names().is_empty());
    }

    #[test]
    fn test_cache_merges_lists_in_order() {
        let (_dir, config) = setup_tests();
        let mut remote = RemoteDb::open(&config).unwrap();
        remote.cache().unwrap();
        assert_eq!(remote.names(), vec!["kde", "wrobel"]);
        assert_eq!(remote.select("wrobel").unwrap().description, "Moved");
        for url in &config.overlays {
            assert!(remote.path(url).exists());
        }

        let reopened = RemoteDb::open(&config).unwrap();
        assert_eq!(reopened.names(), vec!["kde", "wrobel"]);
    }

    #[test]
    fn test_cache_fails_on_missing_list() {
        let (dir, mut config) = setup_tests();
        config.overlays.push(dir.path().join("missing.json").display().to_string());
        let mut remote = RemoteDb::open(&config).unwrap();
        assert!(matches!(remote.cache(), Err(CatalogError::Fetch { .. })));
    }

    #[test]
    fn test_add_sync_delete_tar_overlay() {
        let (_dir, mut config) = setup_tests();
        config.priority = Some(7);
        let mut remote = RemoteDb::open(&config).unwrap();
        remote.cache().unwrap();
        let kde = remote.select("kde").unwrap().clone();

        let mut local = LocalDb::open(&config).unwrap();
        local.add(&kde, true).unwrap();
        let repo_name = config.storage.join("kde").join("profiles").join("repo_name");
        assert_eq!(fs::read_to_string(&repo_name).unwrap(), "kde\n");
        assert!(matches!(local.add(&kde, true), Err(CatalogError::AlreadyInstalled(_))));

        let reopened = LocalDb::open(&config).unwrap();
        assert_eq!(reopened.names(), vec!["kde"]);
        assert_eq!(reopened.select("kde").unwrap().priority, 7);

        fs::write(&repo_name, "changed\n").unwrap();
        local.sync("kde", true).unwrap();
        assert_eq!(fs::read_to_string(&repo_name).unwrap(), "kde\n");
        assert!(matches!(local.sync("ghost", true), Err(CatalogError::UnknownOverlay(_))));

        local.delete(&kde).unwrap();
        assert!(!config.storage.join("kde").exists());
        assert!(LocalDb::open(&config).unwrap().names().is_empty());
    }

    #[test]
    fn test_failed_add_leaves_no_directory() {
        let (dir, config) = setup_tests();
        let broken = Overlay::new(
            "broken",
            OverlayKind::Tar,
            &dir.path().join("nope.tar.gz").display().to_string(),
        );
        let mut local = LocalDb::open(&config).unwrap();
        assert!(local.add(&broken, true).is_err());
        assert!(!config.storage.join("broken").exists());
        assert!(local.names().is_empty());
    }

    #[test]
    fn test_listing_is_ordered_and_compact() {
        let (_dir, config) = setup_tests();
        let mut remote = RemoteDb::open(&config).unwrap();
        remote.cache().unwrap();
        let entries: Vec<_> = remote.list(false, 80).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].text.starts_with("kde "));
        assert!(entries[0].text.contains(" [Tar       ] ("));
        assert!(entries.iter().all(|entry| entry.supported && entry.official));
    }
}
