//! Sample media files on disk

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `len` bytes of a repeating pattern to `dir/name`
pub fn write_sample(dir: &Path, name: &str, len: usize) -> io::Result<PathBuf> {
    write_sample_with(dir, name, len, 0)
}

/// Like [`write_sample`], with a seed so two samples of equal size hash differently
pub fn write_sample_with(dir: &Path, name: &str, len: usize, seed: u8) -> io::Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data: Vec<u8> = (0..len)
        .map(|i| (i % 251) as u8 ^ seed)
        .collect();
    fs::write(&path, data)?;
    Ok(path)
}
