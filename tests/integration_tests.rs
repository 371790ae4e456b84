use phototidy::cli::{OrganizeCommand, RunOptions, build_plan, run_cli};
/// Integration tests for phototidy
///
/// These tests run the whole pipeline against a temporary directory:
/// 1. Preview mode leaves files alone
/// 2. Grouping of sidecars and edits with their primary file
/// 3. Move mode and re-running on an organized tree
/// 4. Exclusions
/// 5. Failure handling
use phototidy::metadata::ExifReader;
use phototidy::progress::{CancellationToken, SilentReporter};
use phototidy::{Category, OrganizeError, OrganizerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary working directory with helpers to populate and inspect it.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with content and a fixed modification time (UTC).
    fn create_file(&self, name: &str, content: &[u8], mtime: &str) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
        file.set_modified(utc(mtime))
            .expect("Failed to set modification time");
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// Names of the plain files directly in the working directory.
    fn root_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| {
                let entry = entry.ok()?;
                entry
                    .metadata()
                    .ok()?
                    .is_file()
                    .then(|| entry.file_name().to_string_lossy().to_string())
            })
            .collect();
        names.sort();
        names
    }

    fn preview(&self, options: &RunOptions) -> phototidy::DestinationPlan {
        run_cli(OrganizeCommand::Preview, self.path(), options)
            .expect("preview failed")
            .plan
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
fn utc(timestamp: &str) -> SystemTime {
    let naive = chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .expect("bad timestamp");
    SystemTime::from(naive.and_utc())
}

/// A JPEG with no metadata segment.
const BARE_JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xd9];

/// A TIFF whose EXIF carries only DateTimeOriginal (`YYYY:MM:DD HH:MM:SS`).
fn tiff_with_capture_date(value: &str) -> Vec<u8> {
    assert_eq!(value.len(), 19);
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08");
    tiff.extend_from_slice(&[0x00, 0x01, 0x87, 0x69, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01]);
    tiff.extend_from_slice(&26u32.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&[0x00, 0x01, 0x90, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00, 0x14]);
    tiff.extend_from_slice(&44u32.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(value.as_bytes());
    tiff.push(0);
    tiff
}

/// The same EXIF block inside a JPEG APP1 segment.
fn jpeg_with_capture_date(value: &str) -> Vec<u8> {
    let tiff = tiff_with_capture_date(value);
    let mut jpeg = vec![0xff, 0xd8, 0xff, 0xe1];
    jpeg.extend_from_slice(&((8 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\x00\x00");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xff, 0xd9]);
    jpeg
}

fn destination_of(plan: &phototidy::DestinationPlan, file_name: &str) -> PathBuf {
    plan.entries
        .iter()
        .find(|e| e.file_name == file_name)
        .unwrap_or_else(|| panic!("{} not in plan", file_name))
        .destination_dir
        .clone()
}

/// A small shoot: a photo with RAW and edit, a clip with subtitles, a voice memo.
fn populate_shoot(fixture: &TestFixture) {
    fixture.create_file(
        "DSC0001.jpg",
        &jpeg_with_capture_date("2023:05:01 12:00:00"),
        "2023-05-03 12:00:00",
    );
    fixture.create_file("DSC0001.dng", b"raw", "2023-04-20 12:00:00");
    fixture.create_file("DSC0001.edited.jpg", BARE_JPEG, "2023-06-01 12:00:00");
    fixture.create_file("clip.srt", b"1\n00:00:01,000 --> 00:00:02,000\nhi\n", "2022-08-09 12:00:00");
    fixture.create_file("clip.mov", b"moov", "2022-08-10 12:00:00");
    fixture.create_file("memo.mp3", b"ID3", "2021-01-15 12:00:00");
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_preview_plans_without_moving() {
    let fixture = TestFixture::new();
    populate_shoot(&fixture);
    let before = fixture.root_files();

    let plan = fixture.preview(&RunOptions::default());

    assert_eq!(plan.len(), 6);
    assert_eq!(fixture.root_files(), before);
    fixture.assert_not_exists("Image");
    fixture.assert_not_exists("Video");
}

#[test]
fn test_sidecars_follow_primary_type_and_earliest_date() {
    let fixture = TestFixture::new();
    populate_shoot(&fixture);

    let plan = fixture.preview(&RunOptions::default());
    let photo_dir = fixture.path().join("Image").join("2023-04-20");

    assert_eq!(destination_of(&plan, "DSC0001.jpg"), photo_dir);
    assert_eq!(destination_of(&plan, "DSC0001.dng"), photo_dir);
    assert_eq!(destination_of(&plan, "DSC0001.edited.jpg"), photo_dir);

    // Subtitles are not media, so the clip decides the type; the date is the
    // older subtitle mtime.
    let clip_dir = fixture.path().join("Video").join("2022-08-09");
    assert_eq!(destination_of(&plan, "clip.mov"), clip_dir);
    assert_eq!(destination_of(&plan, "clip.srt"), clip_dir);

    assert_eq!(
        destination_of(&plan, "memo.mp3"),
        fixture.path().join("Audio").join("2021-01-15")
    );
}

#[test]
fn test_capture_date_overrides_later_mtime() {
    let fixture = TestFixture::new();
    fixture.create_file(
        "IMG_0042.jpg",
        &jpeg_with_capture_date("2015:07:14 12:00:00"),
        "2024-02-02 12:00:00",
    );

    let plan = fixture.preview(&RunOptions::default());
    assert_eq!(
        destination_of(&plan, "IMG_0042.jpg"),
        fixture.path().join("Image").join("2015-07-14")
    );
    assert_eq!(plan.entries[0].resolved_type, Category::Image);
}

#[test]
fn test_tiff_capture_date_is_used() {
    let fixture = TestFixture::new();
    fixture.create_file(
        "scan_0001.tif",
        &tiff_with_capture_date("2009:09:09 12:00:00"),
        "2024-02-02 12:00:00",
    );

    let plan = fixture.preview(&RunOptions::default());
    assert_eq!(
        destination_of(&plan, "scan_0001.tif"),
        fixture.path().join("Image").join("2009-09-09")
    );
}

#[test]
fn test_unknown_and_document_files_go_to_other() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.txt", b"hello", "2020-03-03 12:00:00");
    fixture.create_file("blob.zzqq", b"?", "2020-03-04 12:00:00");
    fixture.create_file("Makefile", b"all:", "2020-03-05 12:00:00");

    let plan = fixture.preview(&RunOptions::default());
    let other = fixture.path().join("Other");
    assert_eq!(destination_of(&plan, "notes.txt"), other.join("2020-03-03"));
    assert_eq!(destination_of(&plan, "blob.zzqq"), other.join("2020-03-04"));
    assert_eq!(destination_of(&plan, "Makefile"), other.join("2020-03-05"));
}

#[test]
fn test_preview_twice_gives_identical_plans() {
    let fixture = TestFixture::new();
    populate_shoot(&fixture);

    let first = fixture.preview(&RunOptions::default());
    let second = fixture.preview(&RunOptions::default());
    assert_eq!(first, second);
}

#[test]
fn test_thread_count_does_not_change_the_plan() {
    let fixture = TestFixture::new();
    populate_shoot(&fixture);

    let single = RunOptions {
        config: OrganizerConfig {
            jobs: Some(1),
            ..Default::default()
        },
        ..Default::default()
    };
    let many = RunOptions {
        config: OrganizerConfig {
            jobs: Some(4),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(fixture.preview(&single), fixture.preview(&many));
}

#[test]
fn test_empty_directory_has_empty_plan() {
    let fixture = TestFixture::new();
    let plan = fixture.preview(&RunOptions::default());
    assert!(plan.is_empty());
}

// ============================================================================
// Exclusions
// ============================================================================

#[test]
fn test_ds_store_and_apple_double_files_are_ignored() {
    let fixture = TestFixture::new();
    fixture.create_file("IMG_1.jpg", BARE_JPEG, "2020-01-01 12:00:00");
    fixture.create_file(".DS_Store", b"\0\0\0\x01Bud1", "2020-01-01 12:00:00");
    // Not a valid JPEG; would fail extraction if it were scanned.
    fixture.create_file("._IMG_1.jpg", b"AppleDouble", "2020-01-01 12:00:00");

    let summary = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default())
        .expect("move failed");

    assert_eq!(summary.moved, 1);
    assert!(summary.plan.entries.iter().all(|e| e.file_name == "IMG_1.jpg"));
    fixture.assert_file_exists(".DS_Store");
    fixture.assert_file_exists("._IMG_1.jpg");
    fixture.assert_file_exists("Image/2020-01-01/IMG_1.jpg");
}

#[test]
fn test_configured_ignored_names() {
    let fixture = TestFixture::new();
    fixture.create_file("Thumbs.db", b"x", "2020-01-01 12:00:00");
    fixture.create_file("a.mp4", b"x", "2020-01-01 12:00:00");

    let mut config = OrganizerConfig::default();
    config.filters.ignored_names.push("Thumbs.db".to_string());
    let options = RunOptions {
        config,
        ..Default::default()
    };

    let plan = fixture.preview(&options);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.entries[0].file_name, "a.mp4");
}

#[test]
fn test_subdirectories_are_not_scanned() {
    let fixture = TestFixture::new();
    fs::create_dir(fixture.path().join("holiday")).unwrap();
    fs::write(fixture.path().join("holiday").join("beach.jpg"), BARE_JPEG).unwrap();

    let plan = fixture.preview(&RunOptions::default());
    assert!(plan.is_empty());
}

// ============================================================================
// Move
// ============================================================================

#[test]
fn test_move_organizes_and_reaches_terminal_state() {
    let fixture = TestFixture::new();
    populate_shoot(&fixture);

    let summary = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default())
        .expect("move failed");
    assert_eq!(summary.moved, 6);

    fixture.assert_file_exists("Image/2023-04-20/DSC0001.jpg");
    fixture.assert_file_exists("Image/2023-04-20/DSC0001.dng");
    fixture.assert_file_exists("Image/2023-04-20/DSC0001.edited.jpg");
    fixture.assert_file_exists("Video/2022-08-09/clip.mov");
    fixture.assert_file_exists("Video/2022-08-09/clip.srt");
    fixture.assert_file_exists("Audio/2021-01-15/memo.mp3");
    assert!(fixture.root_files().is_empty());

    // Organized folders are never rescanned.
    let plan = fixture.preview(&RunOptions::default());
    assert!(plan.is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_move_keeps_non_utf8_file_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let raw_names: [&[u8]; 2] = [b"caf\xe9.mp4", b"caf\xe8.mp4"];
    for raw in raw_names {
        let path = fixture.path().join(OsStr::from_bytes(raw));
        let file = File::create(&path).expect("Failed to create file");
        file.set_modified(utc("2020-01-01 12:00:00"))
            .expect("Failed to set modification time");
    }

    let summary = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default())
        .expect("move failed");
    assert_eq!(summary.moved, 2);

    let mut moved: Vec<Vec<u8>> = fs::read_dir(fixture.path().join("Video/2020-01-01"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().as_bytes().to_vec())
        .collect();
    moved.sort();
    assert_eq!(moved, vec![b"caf\xe8.mp4".to_vec(), b"caf\xe9.mp4".to_vec()]);
}

#[test]
fn test_second_move_adds_to_existing_directories() {
    let fixture = TestFixture::new();
    fixture.create_file("a.mp4", b"a", "2020-01-01 12:00:00");
    run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default()).unwrap();

    fixture.create_file("b.mp4", b"b", "2020-01-01 12:00:00");
    let summary = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default()).unwrap();

    assert_eq!(summary.moved, 1);
    fixture.assert_file_exists("Video/2020-01-01/a.mp4");
    fixture.assert_file_exists("Video/2020-01-01/b.mp4");
}

#[test]
fn test_existing_destination_is_reported_and_left_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("a.mp4", b"old", "2020-01-01 12:00:00");
    run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default()).unwrap();

    fixture.create_file("a.mp4", b"new", "2020-01-01 12:00:00");
    fixture.create_file("b.mp4", b"b", "2020-01-01 12:00:00");
    let result = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default());

    match result {
        Err(OrganizeError::MoveFailed { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].source_path(), &fixture.path().join("a.mp4"));
        }
        other => panic!("expected MoveFailed, got {:?}", other),
    }
    fixture.assert_file_exists("a.mp4");
    fixture.assert_file_exists("Video/2020-01-01/b.mp4");
    assert_eq!(
        fs::read(fixture.path().join("Video/2020-01-01/a.mp4")).unwrap(),
        b"old"
    );
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn test_blocked_type_directory_does_not_stop_other_moves() {
    let fixture = TestFixture::new();
    fixture.create_file("clip.mp4", b"c", "2020-01-01 12:00:00");
    fixture.create_file("song.mp3", b"s", "2020-01-01 12:00:00");
    // Extensionless, so it is planned into Other/ and blocks Video/.
    fixture.create_file("Video", b"in the way", "2020-01-01 12:00:00");

    let result = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default());

    match result {
        Err(OrganizeError::MoveFailed { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].source_path(), &fixture.path().join("clip.mp4"));
        }
        other => panic!("expected MoveFailed, got {:?}", other),
    }
    fixture.assert_file_exists("clip.mp4");
    fixture.assert_file_exists("Audio/2020-01-01/song.mp3");
    fixture.assert_file_exists("Other/2020-01-01/Video");
}

#[test]
fn test_corrupt_jpeg_aborts_before_any_move() {
    let fixture = TestFixture::new();
    fixture.create_file("good.mp4", b"x", "2020-01-01 12:00:00");
    fixture.create_file("bad.jpg", b"this is not a jpeg", "2020-01-01 12:00:00");
    fixture.create_file("worse.tif", b"nor is this a tiff", "2020-01-01 12:00:00");

    let result = run_cli(OrganizeCommand::Move, fixture.path(), &RunOptions::default());

    match result {
        Err(OrganizeError::Extraction { failures }) => {
            let mut names: Vec<String> = failures
                .iter()
                .map(|f| f.path().file_name().unwrap().to_string_lossy().to_string())
                .collect();
            names.sort();
            assert_eq!(names, ["bad.jpg", "worse.tif"]);
        }
        other => panic!("expected Extraction, got {:?}", other),
    }
    assert_eq!(fixture.root_files(), ["bad.jpg", "good.mp4", "worse.tif"]);
    fixture.assert_not_exists("Video");
}

#[test]
fn test_skip_errors_moves_the_rest() {
    let fixture = TestFixture::new();
    fixture.create_file("good.mp4", b"x", "2020-01-01 12:00:00");
    fixture.create_file("bad.jpg", b"this is not a jpeg", "2020-01-01 12:00:00");

    let options = RunOptions {
        config: OrganizerConfig {
            skip_errors: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let summary = run_cli(OrganizeCommand::Move, fixture.path(), &options).unwrap();

    assert_eq!(summary.moved, 1);
    fixture.assert_file_exists("bad.jpg");
    fixture.assert_file_exists("Video/2020-01-01/good.mp4");
}

#[test]
fn test_build_plan_reports_skipped_files() {
    let fixture = TestFixture::new();
    fixture.create_file("bad.jpg", b"nope", "2020-01-01 12:00:00");
    fixture.create_file("ok.png", b"png", "2020-01-01 12:00:00");

    let options = RunOptions {
        config: OrganizerConfig {
            skip_errors: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let outcome = build_plan(fixture.path(), &options, &ExifReader, &SilentReporter).unwrap();

    assert_eq!(outcome.scanned, 2);
    assert_eq!(outcome.groups, 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.plan.len(), 1);
}

#[test]
fn test_cancelled_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("a.mp4", b"x", "2020-01-01 12:00:00");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let options = RunOptions {
        cancel,
        ..Default::default()
    };

    let result = run_cli(OrganizeCommand::Move, fixture.path(), &options);
    assert!(matches!(result, Err(OrganizeError::Cancelled)));
    fixture.assert_file_exists("a.mp4");
}

#[test]
fn test_missing_directory_is_an_error() {
    let result = run_cli(
        OrganizeCommand::Preview,
        Path::new("/non/existent/path"),
        &RunOptions::default(),
    );
    assert!(matches!(result, Err(OrganizeError::ReadDir { .. })));
}
