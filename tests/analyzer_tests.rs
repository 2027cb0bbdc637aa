mod common;

use anyhow::Result;
use common::TestEnv;
use dirsnap::analyzer::Analyzer;
use dirsnap::config::StateFormat;
use dirsnap::fingerprint::{self, DigestCache, Fingerprinter};
use dirsnap::scanner::{EntryScanner, ScanLimits, ScanWarning};
use dirsnap::storage::{
    DirectorySnapshot, EntryFingerprint, EntryMap, FileStateStore, GlobalState, MemoryStateStore,
    StateStore,
};
use rand::seq::SliceRandom;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

fn default_limits() -> ScanLimits {
    ScanLimits::default()
}

#[test]
fn test_second_run_without_changes_is_empty() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("a.txt", "alpha")?;
    env.write("nested/b.txt", "beta")?;

    let analyzer = env.analyzer(default_limits());
    let first = analyzer.analyze(&env.target)?;
    assert_eq!(first.added.len(), 2);

    let second = analyzer.analyze(&env.target)?;
    assert!(second.is_empty());

    let snapshot = analyzer.snapshot(&env.target)?.unwrap();
    assert!(snapshot.entries.values().all(|e| e.version == 1));
    Ok(())
}

#[test]
fn test_new_entry_is_added_with_version_one() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("a.txt", "alpha")?;

    let analyzer = env.analyzer(default_limits());
    analyzer.analyze(&env.target)?;

    env.write("c.txt", "gamma")?;
    let result = analyzer.analyze(&env.target)?;

    let root = env.root();
    assert_eq!(result.added, vec![root.join("c.txt")]);
    assert!(result.changed.is_empty());
    assert!(result.deleted.is_empty());

    let snapshot = analyzer.snapshot(&env.target)?.unwrap();
    assert_eq!(snapshot.entries[&root.join("c.txt")].version, 1);
    Ok(())
}

#[test]
fn test_change_bumps_stored_version() -> Result<()> {
    let env = TestEnv::new()?;
    let path = env.write("a.txt", "new contents")?;
    let root = env.root();
    let key = root.join("a.txt");

    // Seed a previous snapshot in which a.txt was already at version 3
    let mut previous = EntryMap::new();
    previous.insert(key.clone(), {
        let mut entry = EntryFingerprint::new("a.txt", fingerprint::hash_bytes(b"old contents"));
        entry.version = 3;
        entry
    });
    let mut state = GlobalState::new();
    state.insert_snapshot(DirectorySnapshot::new(root.clone(), previous));

    let scanner = EntryScanner::default().with_threads(2);
    let analyzer = Analyzer::new(scanner, MemoryStateStore::with_state(state));
    let result = analyzer.analyze(&env.target)?;

    assert_eq!(result.changed, vec![key.clone()]);
    let snapshot = analyzer.snapshot(&env.target)?.unwrap();
    assert_eq!(snapshot.entries[&key].version, 4);
    assert_eq!(snapshot.entries[&key].digest, fingerprint::hash_file(&path)?);
    Ok(())
}

#[test]
fn test_removed_entry_is_deleted_and_dropped() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("a.txt", "alpha")?;
    env.write("b.txt", "beta")?;

    let analyzer = env.analyzer(default_limits());
    analyzer.analyze(&env.target)?;

    fs::remove_file(env.target.join("b.txt"))?;
    let result = analyzer.analyze(&env.target)?;

    let root = env.root();
    assert_eq!(result.deleted, vec![root.join("b.txt")]);
    let snapshot = analyzer.snapshot(&env.target)?.unwrap();
    assert!(!snapshot.entries.contains_key(&root.join("b.txt")));
    assert!(snapshot.entries.contains_key(&root.join("a.txt")));
    Ok(())
}

#[test]
fn test_nested_change_marks_only_subdirectory() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("top.txt", "top")?;
    env.write("sub/deep/inner.txt", "v1")?;

    let analyzer = env.analyzer(default_limits());
    analyzer.analyze(&env.target)?;

    env.write("sub/deep/inner.txt", "v2")?;
    let result = analyzer.analyze(&env.target)?;

    let root = env.root();
    assert_eq!(result.changed, vec![root.join("sub")]);
    assert!(result.added.is_empty());

    let snapshot = analyzer.snapshot(&env.target)?.unwrap();
    assert_eq!(snapshot.entries[&root.join("sub")].version, 2);
    assert_eq!(snapshot.entries[&root.join("top.txt")].version, 1);
    Ok(())
}

#[test]
fn test_directory_digest_independent_of_creation_order() -> Result<()> {
    let env = TestEnv::new()?;
    let names: Vec<String> = (0..24).map(|i| format!("f{i:02}.txt")).collect();

    let build = |dir: &str, order: &[String]| -> Result<PathBuf> {
        let root = env.path().join(dir);
        for name in order {
            let path = root.join(&name[..2]).join(name);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(&path, name.as_bytes())?;
        }
        Ok(root)
    };

    let mut shuffled = names.clone();
    shuffled.shuffle(&mut rand::rng());

    let sorted_root = build("sorted", &names)?;
    let shuffled_root = build("shuffled", &shuffled)?;

    let fingerprinter = Fingerprinter::default();
    assert_eq!(
        fingerprinter.directory_digest(&sorted_root)?,
        fingerprinter.directory_digest(&shuffled_root)?
    );
    Ok(())
}

#[test]
fn test_oversized_file_is_skipped_and_reported_deleted() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("small.txt", "tiny")?;
    env.write("grows.bin", vec![0u8; 10])?;

    let limits = ScanLimits {
        max_files: 100,
        max_file_size: 64,
    };
    let analyzer = env.analyzer(limits);
    let first = analyzer.analyze(&env.target)?;
    assert_eq!(first.added.len(), 2);

    env.write("grows.bin", vec![0u8; 65])?;
    let analysis = analyzer.analyze_with_warnings(&env.target)?;

    let root = env.root();
    assert_eq!(analysis.result.deleted, vec![root.join("grows.bin")]);
    assert!(matches!(
        analysis.warnings.as_slice(),
        [ScanWarning::Oversized { size: 65, limit: 64, .. }]
    ));
    Ok(())
}

#[test]
fn test_file_count_limit_keeps_first_names() -> Result<()> {
    let env = TestEnv::new()?;
    for i in 0..7 {
        env.write(&format!("file{i}.txt"), format!("{i}"))?;
    }
    env.write("subdir/x.txt", "x")?;

    let limits = ScanLimits {
        max_files: 4,
        max_file_size: 1024,
    };
    let analysis = env.analyzer(limits).analyze_with_warnings(&env.target)?;

    let root = env.root();
    let mut expected: Vec<PathBuf> = (0..4).map(|i| root.join(format!("file{i}.txt"))).collect();
    expected.push(root.join("subdir"));
    assert_eq!(analysis.result.added, expected);

    let truncations: Vec<_> = analysis
        .warnings
        .iter()
        .filter(|w| matches!(w, ScanWarning::Truncated { .. }))
        .collect();
    assert_eq!(truncations.len(), 1);
    Ok(())
}

#[test]
fn test_directories_are_tracked_independently() -> Result<()> {
    let env = TestEnv::new()?;
    let other = env.path().join("other");
    fs::create_dir_all(&other)?;
    env.write("a.txt", "a")?;
    fs::write(other.join("b.txt"), "b")?;

    let analyzer = env.analyzer(default_limits());
    analyzer.analyze(&env.target)?;
    analyzer.analyze(&other)?;

    fs::remove_file(other.join("b.txt"))?;
    let result = analyzer.analyze(&other)?;
    assert_eq!(result.deleted.len(), 1);

    assert!(analyzer.analyze(&env.target)?.is_empty());
    assert_eq!(analyzer.directories()?.len(), 2);
    Ok(())
}

#[test]
fn test_empty_directory() -> Result<()> {
    let env = TestEnv::new()?;
    let analyzer = env.analyzer(default_limits());

    assert!(analyzer.analyze(&env.target)?.is_empty());
    let snapshot = analyzer.snapshot(&env.target)?.unwrap();
    assert!(snapshot.entries.is_empty());
    Ok(())
}

#[test]
fn test_concurrent_analyses_lose_no_updates() -> Result<()> {
    let env = TestEnv::new()?;
    let count = 8;
    let dirs: Vec<PathBuf> = (0..count)
        .map(|i| {
            let dir = env.path().join(format!("dir{i}"));
            fs::create_dir_all(&dir)?;
            fs::write(dir.join("file.txt"), format!("content {i}"))?;
            Ok(dir)
        })
        .collect::<Result<_>>()?;

    let barrier = Arc::new(Barrier::new(count));
    let handles: Vec<_> = dirs
        .iter()
        .cloned()
        .map(|dir| {
            let barrier = Arc::clone(&barrier);
            let state_dir = env.state_dir.clone();
            thread::spawn(move || {
                let scanner = EntryScanner::default().with_threads(1);
                let analyzer =
                    Analyzer::new(scanner, FileStateStore::new(state_dir, StateFormat::Json));
                barrier.wait();
                analyzer.analyze(&dir).map(|result| result.added.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap()?, 1);
    }

    let state = FileStateStore::new(&env.state_dir, StateFormat::Json).load()?;
    assert_eq!(state.len(), count);
    for dir in &dirs {
        assert!(state.snapshot(&fs::canonicalize(dir)?).is_some());
    }
    Ok(())
}

#[test]
fn test_digest_cache_trusts_unchanged_stamp() -> Result<()> {
    let env = TestEnv::new()?;
    let path = env.write("data.txt", "aaaa")?;
    let mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&path)?);

    let cache = Arc::new(DigestCache::new());
    let fingerprinter = Fingerprinter::default().with_cache(Arc::clone(&cache));
    let original = fingerprinter.file_digest(&path)?;
    assert_eq!(cache.len(), 1);

    // Same size and restored mtime: the cached digest is served
    fs::write(&path, "bbbb")?;
    filetime::set_file_mtime(&path, mtime)?;
    assert_eq!(fingerprinter.file_digest(&path)?, original);

    // A different mtime invalidates the entry
    filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(1_000_000, 0))?;
    assert_eq!(fingerprinter.file_digest(&path)?, fingerprint::hash_bytes(b"bbbb"));
    Ok(())
}

#[test]
fn test_digest_cache_persists_through_context() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("a.txt", "alpha")?;

    let mut ctx = env.context()?;
    ctx.config.scan.digest_cache = true;

    Analyzer::from_context(&ctx).analyze(&env.target)?;
    let cache_path = env.state_dir.join(dirsnap::DIGEST_CACHE_FILE);
    assert!(cache_path.exists());
    assert_eq!(DigestCache::load(&cache_path).len(), 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_non_utf8_name_does_not_block_analysis() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let env = TestEnv::new()?;
    env.write("good.txt", "good")?;
    fs::write(env.target.join(OsStr::from_bytes(b"bad\xff.txt")), "bad")?;

    for format in [StateFormat::Json, StateFormat::Binary] {
        let state_dir = env.path().join(format.file_name());
        let analyzer = Analyzer::new(
            EntryScanner::default().with_threads(2),
            FileStateStore::new(&state_dir, format),
        );

        let analysis = analyzer.analyze_with_warnings(&env.target)?;
        assert_eq!(analysis.result.added, vec![env.root().join("good.txt")]);
        assert!(matches!(
            analysis.warnings.as_slice(),
            [ScanWarning::Unsupported { kind: "non-UTF-8 name", .. }]
        ));

        // Later runs keep working against the persisted state
        assert!(analyzer.analyze(&env.target)?.is_empty());
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_inside_subdirectory_is_fingerprinted() -> Result<()> {
    let env = TestEnv::new()?;
    let outside = env.path().join("outside.txt");
    fs::write(&outside, "v1")?;
    fs::create_dir_all(env.target.join("sub"))?;
    std::os::unix::fs::symlink(&outside, env.target.join("sub/link.txt"))?;

    let analyzer = env.analyzer(default_limits());
    analyzer.analyze(&env.target)?;

    fs::write(&outside, "v2 changed")?;
    let analysis = analyzer.analyze_with_warnings(&env.target)?;
    assert_eq!(analysis.result.changed, vec![env.root().join("sub")]);
    assert!(analysis.warnings.is_empty());
    Ok(())
}
