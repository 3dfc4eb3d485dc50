use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "arcade";

/// `$<xdg_var>`, else `$HOME/<home_fallback>`, else the working directory, joined with the
/// app directory and `file`.
pub fn user_file_path(xdg_var: &str, home_fallback: &[&str], file: &str) -> PathBuf {
    let base = std::env::var_os(xdg_var)
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| {
                let mut p = PathBuf::from(home);
                for part in home_fallback {
                    p.push(part);
                }
                p
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));

    let mut path = base;
    path.push(APP_DIR);
    path.push(file);
    path
}

pub fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Writes through a sibling `.tmp` file so readers never see a half-written file. Falls back
/// to copy when rename fails (e.g. across filesystems).
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

pub fn to_json_bytes<T: serde::Serialize>(value: &T) -> io::Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_contents_and_leaves_no_temp() {
        let dir = std::env::temp_dir().join(format!("arcade-persist-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("data.json");

        atomic_write(&path, b"one").expect("first write");
        atomic_write(&path, b"two").expect("second write");

        assert_eq!(fs::read(&path).expect("read back"), b"two");
        assert!(!path.with_extension("tmp").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
