use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::{Path, PathBuf};

use smelt::build::{compile_job, link_job, objcopy_jobs, scan_units};
use smelt::manifest::Manifest;

const MOCK_MANIFEST: &str = r#"
[project.firmware]
compiler = "arm-none-eabi-gcc"
flags = ["-mcpu=cortex-m4", "-mthumb", "-O2"]
sources = ["src/main.c", "src/drivers/uart.c", "src/drivers/spi.c"]
includes = ["inc", "lib/cmsis"]
lscripts = ["stm32f407.ld"]
out = "elf"
exports = ["hex", "bin"]
"#;

fn bench_manifest_parse(c: &mut Criterion) {
    c.bench_function("parse_manifest", |b| {
        b.iter(|| {
            let _: Manifest = toml::from_str(black_box(MOCK_MANIFEST)).unwrap();
        })
    });
}

fn bench_command_synthesis(c: &mut Criterion) {
    let flags: Vec<String> = vec!["-mcpu=cortex-m4".into(), "-mthumb".into(), "-O2".into()];
    let includes = vec![PathBuf::from("inc"), PathBuf::from("lib/cmsis")];
    let objects: Vec<PathBuf> = (0..200).map(|i| PathBuf::from(format!("fw/u{i}.o"))).collect();
    let lscripts = vec![PathBuf::from("stm32f407.ld")];

    c.bench_function("synthesize_compile_job", |b| {
        b.iter(|| {
            compile_job(
                black_box("arm-none-eabi-gcc"),
                black_box(Path::new("src/main.c")),
                black_box(Path::new("fw/src/main.o")),
                black_box(&flags),
                black_box(&includes),
            )
        })
    });

    c.bench_function("synthesize_link_job_200_objects", |b| {
        b.iter(|| {
            link_job(
                black_box("arm-none-eabi-gcc"),
                black_box(Path::new("fw/fw.elf")),
                black_box(&flags),
                black_box(&lscripts),
                black_box(&objects),
            )
        })
    });

    c.bench_function("synthesize_objcopy_jobs", |b| {
        let exports = vec!["hex".to_string(), "bin".to_string()];
        b.iter(|| {
            objcopy_jobs(
                black_box("arm-none-eabi-objcopy"),
                black_box("fw.elf"),
                black_box("fw"),
                black_box(&exports),
            )
        })
    });
}

fn bench_staleness_scan(c: &mut Criterion) {
    // a flat project with 100 sources, none of them compiled yet
    let temp_dir = std::env::temp_dir().join("smelt_bench_scan");
    std::fs::create_dir_all(&temp_dir).unwrap();
    let sources: Vec<PathBuf> = (0..100)
        .map(|i| {
            let name = PathBuf::from(format!("u{i}.c"));
            std::fs::write(temp_dir.join(&name), "int x;").unwrap();
            name
        })
        .collect();

    c.bench_function("scan_100_units", |b| {
        b.iter(|| scan_units(black_box(&temp_dir), black_box(Path::new("fw")), black_box(&sources)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_manifest_parse,
    bench_command_synthesis,
    bench_staleness_scan
);
criterion_main!(benches);
