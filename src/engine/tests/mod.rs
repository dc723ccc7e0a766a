use super::*;
use crate::config::{ExtractionConfig, FileCollisionAction};
use crate::selection::FixedSelection;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use tempfile::TempDir;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ::zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = ::zip::write::FileOptions::default();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ::tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Every path below `root`, relative and sorted, directories with a trailing `/`
fn tree(root: &Path) -> Vec<String> {
    let mut entries: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            if e.file_type().is_dir() { format!("{rel}/") } else { rel }
        })
        .collect();
    entries.sort();
    entries
}

fn engine_with(extraction: ExtractionConfig) -> Engine {
    Engine::new(Config {
        extraction,
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn nested_tar_inside_zip_is_fully_unwound() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("report.zip");
    let inner = tar_bytes(&[("values.csv", b"1,2,3"), ("chart/plot.svg", b"<svg/>")]);
    fs::write(&input, zip_bytes(&[("data.tar", &inner), ("summary.txt", b"ok")])).unwrap();

    let out = temp_dir.path().join("out");
    let state = Engine::default().decompress_file(&input, &out);

    let destination = out.join("report");
    assert_eq!(
        state,
        TaskState::Done(format!("Decompressed ZIP to {}", destination.display()))
    );
    assert_eq!(
        tree(&destination),
        vec![
            "data/",
            "data/chart/",
            "data/chart/plot.svg",
            "data/values.csv",
            "summary.txt"
        ]
    );
}

#[test]
fn unknown_extension_is_compressed() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("notes.txt");
    fs::write(&input, "hello").unwrap();

    let state = Engine::default().decompress_file(&input, temp_dir.path());

    let archive = temp_dir.path().join("notes.txt.zip");
    assert_eq!(state, TaskState::Done(format!("Compressed to {}", archive.display())));
    assert!(archive.is_file());
}

#[test]
fn unknown_extension_matches_compress_exactly() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    for dir in [&first, &second] {
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    }

    let engine = Engine::default();
    let via_decompress = engine.decompress_file(&first.path().join("notes.txt"), first.path());
    let via_compress = engine.compress(&second.path().join("notes.txt"), second.path());

    let normalize = |state: &TaskState, root: &Path| {
        state
            .message()
            .unwrap()
            .replace(&root.display().to_string(), "<root>")
    };
    assert_eq!(
        normalize(&via_decompress, first.path()),
        normalize(&via_compress, second.path())
    );
    assert_eq!(tree(first.path()), tree(second.path()));
}

#[test]
fn unknown_missing_input_fails_like_compress() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("missing.txt");

    let engine = Engine::default();
    let state = engine.decompress_file(&input, temp_dir.path());
    assert_eq!(state, engine.compress(&input, temp_dir.path()));
    assert!(state.message().unwrap().starts_with("Compression failed:"));
}

#[test]
fn existing_destination_gets_a_suffix() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("archive.zip");
    fs::write(&input, zip_bytes(&[("new.txt", b"new")])).unwrap();
    fs::create_dir(temp_dir.path().join("archive")).unwrap();
    fs::write(temp_dir.path().join("archive/old.txt"), "old").unwrap();

    let state = Engine::default().decompress_file(&input, temp_dir.path());

    let destination = temp_dir.path().join("archive (1)");
    assert_eq!(
        state,
        TaskState::Done(format!("Decompressed ZIP to {}", destination.display()))
    );
    assert_eq!(tree(&temp_dir.path().join("archive")), vec!["old.txt"]);
    assert_eq!(tree(&destination), vec!["new.txt"]);
}

#[test]
fn repeated_decompression_counts_up() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("a.zip");
    fs::write(&input, zip_bytes(&[("x.txt", b"x")])).unwrap();

    let engine = Engine::default();
    for expected in ["a", "a (1)", "a (2)"] {
        let outcome = engine.try_decompress_file(&input, temp_dir.path()).unwrap();
        assert_eq!(outcome.path(), temp_dir.path().join(expected));
    }
}

#[test]
fn skip_policy_refuses_existing_destination() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("a.zip");
    fs::write(&input, zip_bytes(&[("x.txt", b"x")])).unwrap();
    fs::create_dir(temp_dir.path().join("a")).unwrap();

    let engine = engine_with(ExtractionConfig {
        file_collision: FileCollisionAction::Skip,
        ..Default::default()
    });
    let state = engine.decompress_file(&input, temp_dir.path());

    let TaskState::Error(message) = &state else {
        panic!("expected error, got {state:?}");
    };
    assert!(message.starts_with("Decompression failed:"));
    assert!(tree(&temp_dir.path().join("a")).is_empty());
}

#[test]
fn corrupt_archive_reports_error() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("broken.zip");
    fs::write(&input, "garbage").unwrap();

    let state = Engine::default().decompress_file(&input, temp_dir.path());
    assert!(matches!(&state, TaskState::Error(m) if m.starts_with("Decompression failed:")));
    assert!(state.is_terminal());
}

#[test]
fn missing_archive_reports_error_without_creating_destination() {
    let temp_dir = TempDir::new().unwrap();
    let state = Engine::default().decompress_file(&temp_dir.path().join("gone.zip"), temp_dir.path());

    assert!(matches!(state, TaskState::Error(_)));
    assert!(!temp_dir.path().join("gone").exists());
}

#[test]
fn round_trip_restores_folder() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    fs::create_dir_all(source.join("src/bin")).unwrap();
    fs::write(source.join("README.md"), "# project\n").unwrap();
    fs::write(source.join("src/lib.rs"), "pub fn f() {}\n").unwrap();
    fs::write(source.join("src/bin/main.rs"), vec![0u8, 159, 146, 150, 255]).unwrap();

    let engine = Engine::default();
    let packed = temp_dir.path().join("packed");
    let Outcome::Compressed { archive } = engine.try_compress(&source, &packed).unwrap() else {
        panic!("expected a compressed outcome");
    };

    let unpacked = temp_dir.path().join("unpacked");
    let outcome = engine.try_decompress_file(&archive, &unpacked).unwrap();
    let restored = outcome.path().join("project");

    assert_eq!(tree(&restored), tree(&source));
    for rel in ["README.md", "src/lib.rs", "src/bin/main.rs"] {
        assert_eq!(fs::read(restored.join(rel)).unwrap(), fs::read(source.join(rel)).unwrap());
    }
}

#[test]
fn junk_entries_are_removed_after_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("mac.zip");
    fs::write(
        &input,
        zip_bytes(&[
            ("photo.jpg", b"jpg"),
            ("__MACOSX/._photo.jpg", b"meta"),
            ("album/.DS_Store", b"meta"),
            ("album/cover.png", b"png"),
        ]),
    )
    .unwrap();

    let outcome = Engine::default().try_decompress_file(&input, temp_dir.path()).unwrap();
    assert_eq!(tree(outcome.path()), vec!["album/", "album/cover.png", "photo.jpg"]);
}

#[test]
fn cleanup_can_be_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("mac.zip");
    fs::write(&input, zip_bytes(&[("__MACOSX/._a", b"meta"), ("a", b"a")])).unwrap();

    let mut config = Config::default();
    config.cleanup.enabled = false;
    let outcome = Engine::new(config).try_decompress_file(&input, temp_dir.path()).unwrap();
    assert!(outcome.path().join("__MACOSX/._a").exists());
}

#[test]
fn gzip_input_is_decoded_into_folder() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("log.txt.gz");
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(b"log line").unwrap();
    fs::write(&input, encoder.finish().unwrap()).unwrap();

    let state = Engine::default().decompress_file(&input, temp_dir.path());

    let destination = temp_dir.path().join("log.txt");
    assert_eq!(
        state,
        TaskState::Done(format!("Decompressed GZIP to {}", destination.display()))
    );
    assert_eq!(fs::read_to_string(destination.join("log.txt")).unwrap(), "log line");
}

// ---------------------------------------------------------------------------
// Unwinding
// ---------------------------------------------------------------------------

#[test]
fn multi_level_nesting_is_resolved() {
    let temp_dir = TempDir::new().unwrap();
    let level3 = zip_bytes(&[("deep.txt", b"deep")]);
    let level2 = tar_bytes(&[("inner/level3.zip", &level3)]);
    let level1 = zip_bytes(&[("level2.tar", &level2)]);
    let input = temp_dir.path().join("level1.zip");
    fs::write(&input, level1).unwrap();

    let Outcome::Extracted {
        destination,
        unwind,
        ..
    } = Engine::default().try_decompress_file(&input, temp_dir.path()).unwrap()
    else {
        panic!("expected an extracted outcome");
    };

    assert_eq!(
        tree(&destination),
        vec![
            "level2/",
            "level2/inner/",
            "level2/inner/level3/",
            "level2/inner/level3/deep.txt"
        ]
    );
    let depths: Vec<_> = unwind.expanded.iter().map(|n| n.depth).collect();
    assert_eq!(depths, vec![1, 2]);
    assert!(unwind.failed.is_empty());
}

#[test]
fn depth_limit_leaves_deeper_archives_alone() {
    let temp_dir = TempDir::new().unwrap();
    let level3 = zip_bytes(&[("deep.txt", b"deep")]);
    let level2 = zip_bytes(&[("level3.zip", &level3)]);
    let input = temp_dir.path().join("level1.zip");
    fs::write(&input, zip_bytes(&[("level2.zip", &level2)])).unwrap();

    let engine = engine_with(ExtractionConfig {
        max_recursion_depth: 1,
        ..Default::default()
    });
    let Outcome::Extracted {
        destination,
        unwind,
        ..
    } = engine.try_decompress_file(&input, temp_dir.path()).unwrap()
    else {
        panic!("expected an extracted outcome");
    };

    assert_eq!(unwind.expanded.len(), 1);
    assert_eq!(unwind.depth_limited, vec![destination.join("level2/level3.zip")]);
    assert!(destination.join("level2/level3.zip").is_file());
}

#[test]
fn zero_depth_disables_unwinding() {
    let temp_dir = TempDir::new().unwrap();
    let inner = zip_bytes(&[("x.txt", b"x")]);
    let input = temp_dir.path().join("outer.zip");
    fs::write(&input, zip_bytes(&[("inner.zip", &inner)])).unwrap();

    let engine = engine_with(ExtractionConfig {
        max_recursion_depth: 0,
        ..Default::default()
    });
    let outcome = engine.try_decompress_file(&input, temp_dir.path()).unwrap();
    assert_eq!(tree(outcome.path()), vec!["inner.zip"]);
}

#[test]
fn self_named_nesting_terminates() {
    let temp_dir = TempDir::new().unwrap();

    // a.zip -> a.zip -> a.zip -> ... ten levels deep
    let mut bytes = zip_bytes(&[("end.txt", b"end")]);
    for _ in 0..10 {
        bytes = zip_bytes(&[("a.zip", &bytes)]);
    }
    let input = temp_dir.path().join("a.zip");
    fs::write(&input, bytes).unwrap();

    let engine = engine_with(ExtractionConfig {
        max_recursion_depth: 3,
        ..Default::default()
    });
    let Outcome::Extracted {
        destination,
        unwind,
        ..
    } = engine.try_decompress_file(&input, temp_dir.path()).unwrap()
    else {
        panic!("expected an extracted outcome");
    };

    assert_eq!(unwind.expanded.len(), 3);
    assert_eq!(unwind.depth_limited, vec![destination.join("a/a/a/a.zip")]);
}

#[test]
fn nested_archive_keeps_original_when_configured() {
    let temp_dir = TempDir::new().unwrap();
    let inner = zip_bytes(&[("x.txt", b"x")]);
    let input = temp_dir.path().join("outer.zip");
    fs::write(&input, zip_bytes(&[("inner.zip", &inner)])).unwrap();

    let engine = engine_with(ExtractionConfig {
        delete_nested_archives: false,
        ..Default::default()
    });
    let outcome = engine.try_decompress_file(&input, temp_dir.path()).unwrap();
    assert_eq!(tree(outcome.path()), vec!["inner.zip", "inner/", "inner/x.txt"]);
}

#[test]
fn broken_nested_archive_does_not_fail_the_task() {
    let temp_dir = TempDir::new().unwrap();
    let good = zip_bytes(&[("good.txt", b"good")]);
    let input = temp_dir.path().join("outer.zip");
    fs::write(
        &input,
        zip_bytes(&[("bad.zip", b"not a zip"), ("good.zip", &good)]),
    )
    .unwrap();

    let state = Engine::default().decompress_file(&input, temp_dir.path());

    let destination = temp_dir.path().join("outer");
    let TaskState::Done(message) = &state else {
        panic!("expected done, got {state:?}");
    };
    assert_eq!(
        message,
        &format!(
            "Decompressed ZIP to {} (1 nested archive(s) could not be expanded)",
            destination.display()
        )
    );
    assert!(destination.join("bad.zip").is_file());
    assert!(destination.join("good/good.txt").is_file());
    assert!(!destination.join("good.zip").exists());
}

#[test]
fn overwrite_into_populated_folder_leaves_existing_archives_alone() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path();
    let keep = zip_bytes(&[("k.txt", b"mine")]);
    fs::create_dir(out.join("a")).unwrap();
    fs::write(out.join("a/keep.zip"), &keep).unwrap();

    let inner = zip_bytes(&[("x.txt", b"x")]);
    let input = out.join("a.zip");
    fs::write(&input, zip_bytes(&[("new.txt", b"new"), ("inner.zip", &inner)])).unwrap();

    let engine = engine_with(ExtractionConfig {
        file_collision: FileCollisionAction::Overwrite,
        ..Default::default()
    });
    let state = engine.decompress_file(&input, out);

    assert!(matches!(state, TaskState::Done(_)), "{state:?}");
    assert_eq!(
        tree(&out.join("a")),
        vec!["inner/", "inner/x.txt", "keep.zip", "new.txt"]
    );
    assert_eq!(fs::read(out.join("a/keep.zip")).unwrap(), keep);
    assert!(input.is_file());
}

#[test]
fn overwrite_never_expands_or_deletes_the_input_itself() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path();
    fs::create_dir(out.join("a")).unwrap();
    let input = out.join("a/a.zip");
    let bytes = zip_bytes(&[("new.txt", b"new")]);
    fs::write(&input, &bytes).unwrap();

    let engine = engine_with(ExtractionConfig {
        file_collision: FileCollisionAction::Overwrite,
        ..Default::default()
    });
    let state = engine.decompress_file(&input, out);

    assert_eq!(
        state,
        TaskState::Done(format!("Decompressed ZIP to {}", out.join("a").display()))
    );
    assert_eq!(tree(out), vec!["a/", "a/a.zip", "a/new.txt"]);
    assert_eq!(fs::read(&input).unwrap(), bytes);
}

#[test]
fn observer_sees_every_stage() {
    let temp_dir = TempDir::new().unwrap();
    let inner = tar_bytes(&[("x.txt", b"x")]);
    let input = temp_dir.path().join("outer.zip");
    fs::write(&input, zip_bytes(&[("inner.tar", &inner)])).unwrap();

    let seen = RefCell::new(Vec::new());
    let observer = |stage: Stage, path: &Path| seen.borrow_mut().push((stage, path.to_path_buf()));
    Engine::default()
        .decompress_observed(&input, temp_dir.path(), &observer)
        .unwrap();

    let outer = temp_dir.path().join("outer");
    let inner = outer.join("inner");
    assert_eq!(
        seen.into_inner(),
        vec![
            (Stage::Extract, outer.clone()),
            (Stage::Clean, outer.clone()),
            (Stage::Unwind, outer),
            (Stage::Extract, inner.clone()),
            (Stage::Clean, inner),
        ]
    );
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn selection_writes_next_to_selected_file() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path().join("downloads");
    fs::create_dir(&folder).unwrap();
    let input = folder.join("bundle.zip");
    fs::write(&input, zip_bytes(&[("a.txt", b"a")])).unwrap();

    let engine = Engine::default();
    let state = engine.decompress_selection(&FixedSelection::new(&input)).unwrap();
    assert!(matches!(state, TaskState::Done(_)));
    assert!(folder.join("bundle/a.txt").is_file());

    let state = engine.compress_selection(&FixedSelection::new(folder.join("bundle"))).unwrap();
    assert!(matches!(state, TaskState::Done(_)));
    assert!(folder.join("bundle.zip").is_file());
    assert!(folder.join("bundle (1).zip").is_file());
}

#[test]
fn empty_selection_does_nothing() {
    let engine = Engine::default();
    assert_eq!(engine.decompress_selection(&FixedSelection::none()), None);
    assert_eq!(engine.compress_selection(&FixedSelection::none()), None);
}
