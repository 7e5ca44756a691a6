use std::env;
use std::fs;
use std::path::Path;

fn copy_dir(source: &Path, dest: &Path) {
    fs::create_dir_all(dest)
        .unwrap_or_else(|e| panic!("Failed to create {:?}: {}", dest, e));
    for entry in fs::read_dir(source).expect("Could not read data directory") {
        let entry = entry.expect("Could not read data directory entry");
        let path = entry.path();
        if path.is_file() {
            fs::copy(&path, dest.join(entry.file_name()))
                .unwrap_or_else(|e| panic!("Failed to copy {:?}: {}", path, e));
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");
    println!("cargo:rerun-if-changed=../../data");

    // OUT_DIR is typically target/<profile>/build/backend-xxx/out
    let out_dir = env::var("OUT_DIR").unwrap();
    let profile = env::var("PROFILE").unwrap();
    let target_dir = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .expect("Could not find target profile directory")
        .to_path_buf();

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("Could not find workspace root");

    // config.toml and the sample data are resolved relative to the binary
    let source_config = workspace_root.join("config.toml");
    if source_config.exists() {
        let dest_config = target_dir.join("config.toml");
        fs::copy(&source_config, &dest_config)
            .unwrap_or_else(|e| panic!("Failed to copy config.toml: {}", e));
    } else {
        println!(
            "cargo:warning=config.toml not found at {:?}, using default config",
            source_config
        );
    }

    let source_data = workspace_root.join("data");
    if source_data.is_dir() {
        copy_dir(&source_data, &target_dir.join("data"));
    }
}
