//! The file-backed page backend: pages loaded lazily from an open file and
//! written back to it on eviction or teardown, used for both `mmap` and (once
//! wired, see `DESIGN.md`) demand-paged ELF segments.
//!
//! File-backed pages never occupy a swap slot: a dirty page is written back
//! to the file it came from, never to the swap area (`spec.md` open question
//! (a), recorded in `DESIGN.md`).

use core::{
    ptr::{self, NonNull},
    slice,
};

use ov6_types::fs::RawFd;

use crate::{
    error::KernelError,
    memory::{PAGE_SIZE, VirtAddr, vm_user::UserPageTable},
};

/// Stand-in for an open file handle.
///
/// `crate::file::File` does not exist yet (see `DESIGN.md`'s "Known gaps");
/// this carries just enough to describe a mapping's read/write window. Its
/// `read_at`/`write_at` are wired to a real inode once the `file`/`fs`
/// modules land.
#[derive(Clone, Copy)]
pub struct MmapFile {
    fd: RawFd,
}

impl MmapFile {
    pub const fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    fn read_at(&self, _buf: &mut [u8], _offset: u64) -> Result<usize, KernelError> {
        Err(KernelError::ShortIo)
    }

    fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize, KernelError> {
        Err(KernelError::ShortIo)
    }

    /// Releases this handle. A no-op today: there is no backing refcount to
    /// drop yet, but the call site that must run it exactly once per mapping
    /// (`do_munmap`/`spt_kill`) is already in place.
    pub fn close(self) {}
}

#[derive(Clone, Copy)]
pub struct FileData {
    pub file: MmapFile,
    pub offset: u64,
    pub read_bytes: u32,
    pub zero_bytes: u32,
    pub mmap_base_va: VirtAddr,
    pub mmap_page_count: u32,
}

/// Reads `data.read_bytes` at `data.offset` into `kva`, zeroing the tail.
///
/// The tail-zeroing spec describes is satisfied by construction: every frame
/// handed to this function came from `memory::page::alloc_zeroed_page`, so
/// only a short read needs an explicit zero (of the whole frame, per spec,
/// since a partial read left unknown bytes in the prefix).
pub fn load_into(data: &FileData, kva: NonNull<u8>) -> Result<(), KernelError> {
    let read_bytes = data.read_bytes as usize;
    let buf = unsafe { slice::from_raw_parts_mut(kva.as_ptr(), read_bytes) };
    let n = data.file.read_at(buf, data.offset)?;
    if n < read_bytes {
        unsafe {
            ptr::write_bytes(kva.as_ptr(), 0, PAGE_SIZE);
        }
        return Err(KernelError::ShortIo);
    }
    Ok(())
}

pub fn swap_in(data: &FileData, kva: NonNull<u8>) -> Result<(), KernelError> {
    load_into(data, kva)
}

fn writeback(data: &FileData, kva: NonNull<u8>) -> Result<(), KernelError> {
    let read_bytes = data.read_bytes as usize;
    let buf = unsafe { slice::from_raw_parts(kva.as_ptr(), read_bytes) };
    let n = data.file.write_at(buf, data.offset)?;
    if n < read_bytes {
        return Err(KernelError::ShortIo);
    }
    Ok(())
}

/// Writes the page back if dirty, then clears its mapping. File-backed
/// frames are never sent to the swap area, so success here always means the
/// frame is free for reuse.
pub fn swap_out(
    data: &FileData,
    va: VirtAddr,
    kva: NonNull<u8>,
    pt: &mut UserPageTable,
) -> Result<(), KernelError> {
    if pt.dirty(va)? {
        writeback(data, kva)?;
        pt.clear_dirty(va)?;
    }
    pt.unmap_one(va)?;
    Ok(())
}

/// Writes the page back if resident and dirty, then clears its mapping.
/// Called for both `munmap` and process teardown; the file handle itself is
/// closed once per mapping by the caller, not here.
pub fn destroy(
    data: &FileData,
    va: VirtAddr,
    kva: Option<NonNull<u8>>,
    pt: &mut UserPageTable,
) -> Result<(), KernelError> {
    let Some(kva) = kva else {
        return Ok(());
    };
    if pt.dirty(va)? {
        writeback(data, kva)?;
    }
    pt.unmap_one(va)?;
    Ok(())
}
