use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Copy runtime files next to the executable
    let Some(target_dir) = target_dir() else {
        println!("cargo:warning=Could not find target directory, skipping resource copy");
        return;
    };
    copy_resources(&target_dir);
    copy_config(&target_dir);
}

/// OUT_DIR is something like target/release/build/auto-spectator-xxx/out;
/// the executable lives three levels up.
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    Path::new(&out_dir).ancestors().nth(3).map(Path::to_path_buf)
}

/// Copies reference histograms so the executable can find them.
fn copy_resources(target_dir: &Path) {
    let resources_src = Path::new("resources");
    if resources_src.exists() {
        copy_dir_recursive(resources_src, &target_dir.join("resources"));
        println!("cargo:rerun-if-changed=resources/");
    }
}

/// Recursively copies a directory and its contents.
fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    if let Ok(entries) = fs::read_dir(src) {
        for entry in entries.flatten() {
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if src_path.is_dir() {
                copy_dir_recursive(&src_path, &dst_path);
            } else {
                let _ = fs::copy(&src_path, &dst_path);
            }
        }
    }
}

/// Copies config.json unless the target already has one, so local edits
/// to the deployed config survive rebuilds.
fn copy_config(target_dir: &Path) {
    let config_src = Path::new("config.json");
    let config_dst = target_dir.join("config.json");

    if config_src.exists() && !config_dst.exists() {
        let _ = fs::copy(config_src, &config_dst);
    }
    println!("cargo:rerun-if-changed=config.json");
}
