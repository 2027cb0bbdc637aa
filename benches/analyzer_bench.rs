use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dirsnap::analyzer::Analyzer;
use dirsnap::differ::Differ;
use dirsnap::scanner::EntryScanner;
use dirsnap::storage::{EntryFingerprint, EntryMap, MemoryStateStore};
use std::fs;
use std::hint::black_box;
use std::path::PathBuf;
use tempfile::tempdir;

fn entry_map(count: usize, salt: &str) -> EntryMap {
    (0..count)
        .map(|i| {
            let name = format!("file_{i}.txt");
            let digest = if i % 10 == 0 { format!("{salt}{i}") } else { format!("{i}") };
            (PathBuf::from("/bench").join(&name), EntryFingerprint::new(name, digest))
        })
        .collect()
}

fn benchmark_differ(c: &mut Criterion) {
    let mut group = c.benchmark_group("differ");

    for size in [100, 1_000, 10_000] {
        let previous = entry_map(size, "old");
        let current = entry_map(size, "new");
        group.bench_with_input(BenchmarkId::new("compare", size), &size, |b, _| {
            b.iter(|| {
                let mut current = current.clone();
                Differ::compare(black_box(&previous), &mut current)
            });
        });
    }

    group.finish();
}

fn benchmark_analyze(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    for i in 0..100 {
        fs::write(dir.path().join(format!("file_{i}.txt")), vec![b'x'; 4096 + i]).unwrap();
    }
    for i in 0..10 {
        let sub = dir.path().join(format!("sub_{i}"));
        fs::create_dir_all(&sub).unwrap();
        for j in 0..20 {
            fs::write(sub.join(format!("inner_{j}.txt")), format!("{i}-{j}")).unwrap();
        }
    }

    let mut group = c.benchmark_group("analyze");

    for threads in [1, 4] {
        let analyzer = Analyzer::new(
            EntryScanner::default().with_threads(threads),
            MemoryStateStore::new(),
        );
        group.bench_with_input(BenchmarkId::new("100_files_10_dirs", threads), &threads, |b, _| {
            b.iter(|| analyzer.analyze(black_box(dir.path())));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_differ, benchmark_analyze);
criterion_main!(benches);
