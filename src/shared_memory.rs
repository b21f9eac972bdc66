//! The shared-memory primitive.
//!
//! A byte-addressable region backed by a file, mapped `MAP_SHARED` so that
//! independent processes opening the same path observe the same physical
//! bytes. This is the one piece of the transport that talks to the kernel;
//! everything above it only ever touches the mapped bytes directly.
//!
//! Uses `memmap2` rather than raw `libc::mmap` calls for the mapping itself,
//! with the create/open protocol and magic-number validation handled here.

use std::fs::{ File, OpenOptions };
use std::path::{ Path, PathBuf };

use memmap2::MmapMut;

use crate::constants::MAX_REGION_SIZE;
use crate::error::{ Result, RingError };

/// A memory-mapped, file-backed byte region shared between processes.
pub struct SharedRegion {
    mmap: MmapMut,
    _file: File,
    path: PathBuf,
}

impl SharedRegion {
    /// Create the backing file at `path`, extend it to `size` bytes
    /// (truncating/zeroing any prior contents), and map it read/write.
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> Result<Self> {
        Self::check_size(size)?;
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(size)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };

        tracing::debug!(path = %path.display(), size, "created shared ring region");
        Ok(Self { mmap, _file: file, path })
    }

    /// Open an existing backing file at `path`.
    ///
    /// If `expected_size` is `Some`, the file's length must match exactly
    /// or this returns [`RingError::ConfigurationMismatch`]. If `None`, the
    /// region is mapped at whatever length the file currently has (used by
    /// variants that infer capacity from file length).
    pub fn open<P: AsRef<Path>>(path: P, expected_size: Option<u64>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(RingError::file_not_found(path.display().to_string()));
        }

        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let actual_len = file.metadata()?.len();

        if let Some(expected) = expected_size {
            if actual_len != expected {
                return Err(RingError::config_mismatch("file_length", expected, actual_len));
            }
        }
        Self::check_size(actual_len)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };
        tracing::debug!(path = %path.display(), size = actual_len, "opened shared ring region");
        Ok(Self { mmap, _file: file, path })
    }

    fn check_size(size: u64) -> Result<()> {
        if size >= MAX_REGION_SIZE {
            return Err(RingError::invalid_argument(format!(
                "region size {size} exceeds maximum of {MAX_REGION_SIZE}"
            )));
        }
        Ok(())
    }

    /// Stable base address of the region, valid until this value is
    /// dropped (or [`SharedRegion::release`] is called).
    #[inline(always)]
    pub fn pointer(&self) -> *mut u8 {
        self.mmap.as_ptr() as *mut u8
    }

    /// Size in bytes of the mapped region.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Plain little-endian `u32` read at `offset`.
    #[inline(always)]
    pub fn get_u32(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.mmap[offset..offset + 4]);
        u32::from_le_bytes(bytes)
    }

    /// Plain little-endian `u32` write at `offset`.
    #[inline(always)]
    pub fn put_u32(&mut self, offset: usize, value: u32) {
        self.mmap[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Plain little-endian `u64` read at `offset`.
    #[inline(always)]
    pub fn get_u64(&self, offset: usize) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.mmap[offset..offset + 8]);
        u64::from_le_bytes(bytes)
    }

    /// Plain little-endian `u64` write at `offset`.
    #[inline(always)]
    pub fn put_u64(&mut self, offset: usize, value: u64) {
        self.mmap[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// A read-only view of `len` bytes starting at `offset`.
    #[inline]
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.mmap[offset..offset + len]
    }

    /// A writable view of `len` bytes starting at `offset`.
    #[inline]
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.mmap[offset..offset + len]
    }

    /// Unmap the region, optionally deleting the backing file.
    ///
    /// Consumes `self`; the mapping is dropped regardless of whether
    /// deletion is requested or succeeds.
    pub fn release(self, delete_file: bool) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        if delete_file {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
