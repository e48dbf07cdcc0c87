#[path = "../src/backup.rs"]
mod backup;

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn zip_export_and_import_roundtrip() {
    let workspace = temp_dir("courseview-backup-src");
    let workspace2 = temp_dir("courseview-backup-dst");
    let out_dir = temp_dir("courseview-backup-out");

    let db_src = workspace.join("courseview.sqlite3");
    let bytes = b"sqlite-test-payload";
    std::fs::write(&db_src, bytes).expect("write source db");

    let bundle_path = out_dir.join("workspace.cvbackup.zip");
    let export = backup::export_workspace_bundle(&workspace, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 3);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains("checksums"));
    archive
        .by_name("db/courseview.sqlite3")
        .expect("database entry in bundle");

    let import = backup::import_workspace_bundle(&bundle_path, &workspace2).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);

    let db_dst = workspace2.join("courseview.sqlite3");
    let restored = std::fs::read(&db_dst).expect("read restored db");
    assert_eq!(restored, bytes);

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(workspace2);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn bare_sqlite_files_import_as_whole_workspace() {
    let workspace = temp_dir("courseview-backup-bare");
    let src_dir = temp_dir("courseview-backup-bare-src");

    let src = src_dir.join("old-workspace.sqlite3");
    std::fs::write(&src, b"not-a-zip").expect("write bare file");

    let import = backup::import_workspace_bundle(&src, &workspace).expect("import bare sqlite");
    assert_eq!(import.bundle_format_detected, "bare-sqlite3");
    let restored = std::fs::read(workspace.join("courseview.sqlite3")).expect("read restored db");
    assert_eq!(restored, b"not-a-zip");

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(src_dir);
}

#[test]
fn tampered_database_entry_fails_checksum() {
    let workspace = temp_dir("courseview-backup-tamper-src");
    let workspace2 = temp_dir("courseview-backup-tamper-dst");
    let out_dir = temp_dir("courseview-backup-tamper-out");

    let db_src = workspace.join("courseview.sqlite3");
    std::fs::write(&db_src, b"original-payload").expect("write source db");

    let bundle_path = out_dir.join("workspace.cvbackup.zip");
    let _ = backup::export_workspace_bundle(&workspace, &bundle_path).expect("export bundle");

    // Rebuild the archive with the same manifest but a different database.
    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    drop(archive);

    let tampered_path = out_dir.join("tampered.cvbackup.zip");
    let out = File::create(&tampered_path).expect("create tampered bundle");
    let mut writer = zip::ZipWriter::new(out);
    let opts = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    use std::io::Write;
    writer
        .start_file("manifest.json", opts)
        .expect("start manifest");
    writer
        .write_all(manifest.as_bytes())
        .expect("write manifest");
    writer
        .start_file("db/courseview.sqlite3", opts)
        .expect("start db entry");
    writer
        .write_all(b"tampered-payload")
        .expect("write db entry");
    writer.finish().expect("finish tampered bundle");

    let err = backup::import_workspace_bundle(&tampered_path, &workspace2)
        .expect_err("checksum mismatch must fail");
    assert!(err.to_string().contains("checksum"));

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(workspace2);
    let _ = std::fs::remove_dir_all(out_dir);
}
