use std::path::{Path, PathBuf};

const MARKER: &str = "assets/blocks.toml";

pub fn resolve_assets_root(cli: Option<PathBuf>) -> PathBuf {
    // CLI flag, then TESSERA_ASSETS, then the first ancestor of CWD, the
    // executable or this crate that holds an assets dir.
    if let Some(p) = cli {
        if p.exists() {
            return p;
        }
        log::warn!("assets root {} does not exist; searching", p.display());
    }
    if let Ok(p) = std::env::var("TESSERA_ASSETS") {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return pb;
        }
    }
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    if let Some(dir) = std::env::current_exe().ok().and_then(|e| e.parent().map(Path::to_path_buf)) {
        candidates.push(dir);
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    for base in candidates {
        for dir in base.ancestors().take(6) {
            if dir.join(MARKER).exists() {
                return dir.to_path_buf();
            }
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn blocks_path(root: &Path) -> PathBuf {
    root.join("assets/blocks.toml")
}

pub fn worldgen_path(root: &Path) -> PathBuf {
    root.join("assets/worldgen.toml")
}
