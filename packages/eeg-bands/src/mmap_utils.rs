use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Open a file and map it into memory (read-only)
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)?;
    // The mapping is only read while `file` is not modified by this process.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}
