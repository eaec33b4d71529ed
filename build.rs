use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Copy sample frames and config to target directory
    copy_frames();
    copy_config();
}

/// Returns the target directory (target/release or target/debug) from OUT_DIR.
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    // OUT_DIR is something like target/release/build/face-enrollment-xxx/out
    Path::new(&out_dir).ancestors().nth(3).map(Path::to_path_buf)
}

/// Copies the sample frame folder so the directory video source has something to replay.
fn copy_frames() {
    let Some(target_dir) = target_dir() else {
        return;
    };

    let frames_src = Path::new("resources/frames");
    let frames_dst = target_dir.join("resources").join("frames");

    if frames_src.exists() {
        copy_dir_recursive(frames_src, &frames_dst);
        println!("cargo:rerun-if-changed=resources/frames/");
    }
}

/// Recursively copies a directory and its contents.
fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    if let Ok(entries) = fs::read_dir(src) {
        for entry in entries.flatten() {
            let src_path = entry.path();
            let Some(file_name) = src_path.file_name() else {
                continue;
            };
            let dst_path = dst.join(file_name);

            if src_path.is_dir() {
                copy_dir_recursive(&src_path, &dst_path);
            } else {
                let _ = fs::copy(&src_path, &dst_path);
            }
        }
    }
}

/// Copies config.json to the target directory.
fn copy_config() {
    let Some(target_dir) = target_dir() else {
        return;
    };

    let config_src = Path::new("config.json");
    let config_dst = target_dir.join("config.json");

    if config_src.exists() {
        let _ = fs::copy(config_src, &config_dst);
        println!("cargo:rerun-if-changed=config.json");
    }
}
