use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use tempfile::{tempdir, TempDir};

/// A scratch layman installation: config file, one manifest, one tarball.
struct Setup {
    dir: TempDir,
    config: PathBuf,
}

impl Setup {
    fn new(umask: &str) -> Setup {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("kde.tgz");
        write_tarball(&archive);

        let manifest = dir.path().join("repositories.json");
        let overlays = json!({"overlay": [
            {
                "name": "kde",
                "description": "KDE ebuilds",
                "owner_email": "kde@example.org",
                "sources": [{"type": "tar", "src": format!("file://{}", archive.display()), "subpath": "overlay"}],
                "official": true
            },
            {
                "name": "needs-git",
                "description": "Requires a git binary",
                "owner_email": "git@example.org",
                "sources": [{"type": "git", "src": "https://example.org/needs-git.git"}],
                "official": true
            },
            {
                "name": "wild",
                "description": "Not curated",
                "owner_email": "wild@example.org",
                "sources": [{"type": "tar", "src": archive.display().to_string()}]
            }
        ]});
        fs::write(&manifest, overlays.to_string()).unwrap();

        let config = dir.path().join("layman.toml");
        fs::write(
            &config,
            format!(
                "storage = '{}'\ncache = '{}'\noverlays = ['file://{}']\numask = '{}'\n\n[commands]\ngit = '{}'\n",
                dir.path().join("storage").display(),
                dir.path().join("cache").join("remote").display(),
                manifest.display(),
                umask,
                dir.path().join("no-such-git").display(),
            ),
        )
        .unwrap();
        Setup { dir, config }
    }

    fn storage(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    fn layman(&self) -> Command {
        let mut cmd = Command::cargo_bin("layman").unwrap();
        cmd.current_dir(self.dir.path())
            .env("RUST_LOG", "off")
            .arg("--config")
            .arg(&self.config)
            .args(["--nocolor", "--width", "80"]);
        cmd
    }
}

fn write_tarball(path: &Path) {
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let content = b"kde\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "overlay/profiles/repo_name", &content[..])
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8_lossy(&output).to_string()
}

#[test]
fn test_list_shows_only_official_supported_overlays() {
    let setup = Setup::new("0022");
    let out = stdout_of(setup.layman().arg("--list"));
    assert!(out.contains("* kde "));
    assert!(!out.contains("wild"));
    assert!(!out.contains("needs-git"));
}

#[test]
fn test_list_nocheck_shows_flagged_overlays() {
    let setup = Setup::new("0022");
    let assert = setup.layman().args(["--list", "--nocheck"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stdout.contains("* wild "));
    assert!(stderr.contains("* needs-git "));
}

#[test]
fn test_info_unknown_overlay_fails() {
    let setup = Setup::new("0022");
    let assert = setup.layman().args(["--fetch", "--info", "ghost"]).assert().failure();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("Overlay \"ghost\" does not exist."));
}

#[test]
fn test_info_unofficial_overlay_succeeds() {
    let setup = Setup::new("0022");
    let out = stdout_of(setup.layman().args(["--fetch", "--info", "wild"]));
    assert!(out.contains("* wild\n* ~~~~\n"));
    assert!(out.contains("This is no official overlay"));
}

#[test]
fn test_fetch_failure_is_fatal() {
    let setup = Setup::new("0022");
    let missing = setup.dir.path().join("missing.json");
    let assert = setup
        .layman()
        .args(["--list", "--overlays"])
        .arg(&missing)
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("Failed to fetch overlay list!"));
}

#[test]
fn test_bad_umask_is_fatal() {
    let setup = Setup::new("99x");
    let assert = setup.layman().arg("--list-local").assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("Failed setting to umask \"99x\""));
}

#[test]
fn test_add_without_fetch_cannot_find_overlay() {
    let setup = Setup::new("0022");
    setup.layman().args(["--add", "kde"]).assert().failure();
    assert!(!setup.storage().join("kde").exists());
}

#[test]
fn test_add_sync_delete_round() {
    let setup = Setup::new("0022");
    let repo_name = setup.storage().join("kde").join("profiles").join("repo_name");

    let out = stdout_of(setup.layman().args(["--fetch", "--add", "kde"]));
    assert!(out.contains("Successfully added overlay \"kde\"."));
    assert_eq!(fs::read_to_string(&repo_name).unwrap(), "kde\n");

    let out = stdout_of(setup.layman().arg("--list-local"));
    assert!(out.contains("* kde "));

    let out = stdout_of(setup.layman().args(["--sync", "ALL"]));
    assert!(out.contains("Successfully synchronized overlay \"kde\"."));
    assert!(repo_name.exists());

    let out = stdout_of(setup.layman().args(["--delete", "kde"]));
    assert!(out.contains("Successfully deleted overlay \"kde\"."));
    assert!(!setup.storage().join("kde").exists());

    let out = stdout_of(setup.layman().arg("--list-local"));
    assert!(!out.contains("kde"));
}

#[test]
fn test_quiet_suppresses_output() {
    let setup = Setup::new("0022");
    let out = stdout_of(setup.layman().args(["--quiet", "--list"]));
    assert!(out.is_empty());
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("layman")
        .unwrap()
        .args(["--config"])
        .arg(dir.path().join("nope.toml"))
        .arg("--list")
        .assert()
        .failure();
}

#[test]
fn test_no_arguments_prints_help() {
    let output = Command::cargo_bin("layman")
        .unwrap()
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output_str = String::from_utf8_lossy(&output);
    assert!(output_str.contains("Usage:"));
    assert!(output_str.contains("--list-local"));
}
