//! Integration tests for the s3t CLI
//!
//! These tests require a running S3-compatible server and an existing bucket.
//!
//! Run with:
//! ```bash
//! docker run -d --name rustfs -p 9000:9000 \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:latest
//!
//! TEST_S3_ENDPOINT=http://localhost:9000 \
//! TEST_S3_ACCESS_KEY=accesskey \
//! TEST_S3_SECRET_KEY=secretkey \
//! TEST_S3_BUCKET=s3t-test \
//! cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

struct TestStore {
    endpoint: String,
    access_key: String,
    secret_key: String,
    bucket: String,
}

/// Get S3 test configuration from environment
fn get_test_config() -> Option<TestStore> {
    Some(TestStore {
        endpoint: std::env::var("TEST_S3_ENDPOINT").ok()?,
        access_key: std::env::var("TEST_S3_ACCESS_KEY").ok()?,
        secret_key: std::env::var("TEST_S3_SECRET_KEY").ok()?,
        bucket: std::env::var("TEST_S3_BUCKET").ok()?,
    })
}

/// Run s3t against the test store with an isolated config directory
fn run_s3t(store: &TestStore, args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_s3t"))
        .args(args)
        .env("S3T_CONFIG_DIR", config_dir)
        .env("AWS_ENDPOINT", &store.endpoint)
        .env("AWS_ACCESS_KEY_ID", &store.access_key)
        .env("AWS_SECRET_ACCESS_KEY", &store.secret_key)
        .env("AWS_REGION", "us-east-1")
        .output()
        .expect("Failed to execute s3t")
}

/// Generate unique suffix for test resources
fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

mod object_operations {
    use super::*;

    #[test]
    fn test_put_info_get_rm() {
        let Some(store) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let url = format!("s3://{}/single-{}/hello.txt", store.bucket, uuid_suffix());

        let source = work.path().join("hello.txt");
        std::fs::write(&source, b"hello s3t").unwrap();

        let output = run_s3t(
            &store,
            &["put", source.to_str().unwrap(), &url],
            config_dir.path(),
        );
        assert_success(&output, "put");

        let output = run_s3t(&store, &["info", &url, "--json"], config_dir.path());
        assert_success(&output, "info");
        let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(info["size_bytes"], 9);

        let target = work.path().join("out/hello.txt");
        let output = run_s3t(
            &store,
            &["get", &url, target.to_str().unwrap()],
            config_dir.path(),
        );
        assert_success(&output, "get");
        assert_eq!(std::fs::read(&target).unwrap(), b"hello s3t");

        let output = run_s3t(&store, &["rm", &url], config_dir.path());
        assert_success(&output, "rm");

        let output = run_s3t(&store, &["info", &url], config_dir.path());
        assert_eq!(output.status.code(), Some(5));
    }
}

mod sync_operations {
    use super::*;

    #[test]
    fn test_push_then_pull_round_trip() {
        let Some(store) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let restore = TempDir::new().unwrap();
        let prefix = format!("s3://{}/sync-{}", store.bucket, uuid_suffix());

        std::fs::write(source.path().join("a.txt"), b"alpha").unwrap();
        std::fs::create_dir_all(source.path().join("sub/deeper")).unwrap();
        std::fs::write(source.path().join("sub/b.txt"), b"beta").unwrap();
        std::fs::write(source.path().join("sub/deeper/c.txt"), b"gamma").unwrap();

        let output = run_s3t(
            &store,
            &["--json", "sync", source.path().to_str().unwrap(), &prefix],
            config_dir.path(),
        );
        assert_success(&output, "push");
        let stdout = String::from_utf8_lossy(&output.stdout);
        let summary: serde_json::Value =
            serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
        assert_eq!(summary["transferred"], 3);
        assert_eq!(summary["failed"], 0);

        let output = run_s3t(
            &store,
            &["sync", &prefix, restore.path().to_str().unwrap()],
            config_dir.path(),
        );
        assert_success(&output, "pull");

        assert_eq!(std::fs::read(restore.path().join("a.txt")).unwrap(), b"alpha");
        assert_eq!(std::fs::read(restore.path().join("sub/b.txt")).unwrap(), b"beta");
        assert_eq!(
            std::fs::read(restore.path().join("sub/deeper/c.txt")).unwrap(),
            b"gamma"
        );

        let output = run_s3t(&store, &["ls", "-r", &prefix, "--json"], config_dir.path());
        assert_success(&output, "ls");
        let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(listing["items"].as_array().unwrap().len(), 3);
    }
}

mod multipart_operations {
    use super::*;

    #[test]
    fn test_list_uploads_in_bucket() {
        let Some(store) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = TempDir::new().unwrap();

        let output = run_s3t(
            &store,
            &["mp", "list", &format!("s3://{}", store.bucket), "--json"],
            config_dir.path(),
        );
        assert_success(&output, "mp list");
        let uploads: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(uploads.is_array());
    }

    #[test]
    fn test_abort_unknown_upload_is_not_found() {
        let Some(store) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = TempDir::new().unwrap();

        let output = run_s3t(
            &store,
            &[
                "mp",
                "abort",
                &format!("s3://{}/missing.bin", store.bucket),
                "no-such-upload",
            ],
            config_dir.path(),
        );
        assert_eq!(output.status.code(), Some(5));
    }
}
