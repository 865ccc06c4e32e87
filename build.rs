fn main() {
    // Host builds (library unit tests) have no ESP-IDF environment to export.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    if std::env::var("CARGO_FEATURE_MAXIM_SPO2").is_ok() {
        // Find the C compiler in the Embuild toolchain directory
        // Typically: .embuild/espressif/tools/riscv32-esp-elf/esp-<VER>/riscv32-esp-elf/bin/riscv32-esp-elf-gcc
        let compiler = find_compiler().unwrap_or_else(|| "riscv32-esp-elf-gcc".into());
        build_maxim(&compiler);
    }
}

fn find_compiler() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;
    // Check local .embuild first, then global ~/.espressif
    let search_dirs = vec![
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").ok()?).join(".embuild"),
        dirs::home_dir().map(|h| h.join(".espressif")).unwrap_or_default(),
    ];

    for root in search_dirs {
        let tools_dir = root.join("espressif/tools/riscv32-esp-elf");
        let Ok(entries) = std::fs::read_dir(&tools_dir) else {
            continue;
        };
        // Versioned directory, e.g. esp-13.2.0_20240530
        for entry in entries.flatten() {
            let candidate = entry.path().join("riscv32-esp-elf/bin/riscv32-esp-elf-gcc");
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Compile the vendor PPG algorithm (`maxim_heart_rate_and_oxygen_saturation`).
/// The sources are not redistributed; drop `algorithm.c` / `algorithm.h` from
/// the Maxim reference design into `maxim_spo2/`.
fn build_maxim(compiler_path: &std::path::Path) {
    use std::path::PathBuf;

    let src_root = PathBuf::from("maxim_spo2");

    let mut build = cc::Build::new();
    build
        .compiler(compiler_path)
        .flag("-O2")
        .include(&src_root);

    let entries = std::fs::read_dir(&src_root).expect("maxim_spo2/ directory is missing");
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "c") {
            build.file(&path);
        }
    }

    build.compile("maxim-spo2");

    println!("cargo:rerun-if-changed=maxim_spo2");
}
