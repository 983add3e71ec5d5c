//! `mmap`/`munmap`: installing and tearing down a run of lazily loaded
//! file-backed pages.

use super::{
    VmSpace,
    file_backed::{FileData, MmapFile},
    uninit,
};
use crate::{
    error::KernelError,
    memory::{PAGE_SIZE, PageRound, VirtAddr, layout, vm_user::UserPageTable},
};

/// Maps `length` bytes of `file` starting at `offset` into the range
/// `[addr, addr + round_up(length, PAGE_SIZE))`, as a run of lazily loaded
/// file-backed pages. Nothing is read from `file` until each page first
/// faults in.
///
/// `file` is used as the mapping's own handle directly: there is no open
/// file table yet to `reopen` a second handle from (`DESIGN.md`'s "Known
/// gaps"), so closing the caller's original descriptor while the mapping is
/// still alive is not guarded against here.
pub fn do_mmap(
    vm: &mut VmSpace,
    pt: &mut UserPageTable,
    addr: VirtAddr,
    length: usize,
    writable: bool,
    file: MmapFile,
    offset: u64,
) -> Result<VirtAddr, KernelError> {
    if addr == VirtAddr::MIN || !addr.is_page_aligned() {
        return Err(KernelError::InaccessiblePage(addr));
    }
    if length == 0 {
        return Err(KernelError::InaccessiblePage(addr));
    }

    let page_count = length.page_roundup() / PAGE_SIZE;
    let end = addr.byte_add(page_count * PAGE_SIZE)?;
    if end > layout::USER_STACK_BOTTOM {
        return Err(KernelError::MapConflict);
    }

    for i in 0..page_count {
        let va = addr.byte_add(i * PAGE_SIZE)?;
        if vm.spt.spt_find(va).is_some() {
            return Err(KernelError::MapConflict);
        }
    }

    // No backing file-length query exists yet (same gap noted above), so
    // every page is assumed fully backed by the file except the last,
    // which only covers what `length` asks for.
    for i in 0..page_count {
        let va = addr.byte_add(i * PAGE_SIZE)?;
        let page_offset = i * PAGE_SIZE;
        let read_bytes = length.saturating_sub(page_offset).min(PAGE_SIZE) as u32;
        let zero_bytes = (PAGE_SIZE as u32) - read_bytes;
        let data = FileData {
            file,
            offset: offset + page_offset as u64,
            read_bytes,
            zero_bytes,
            mmap_base_va: addr,
            mmap_page_count: page_count as u32,
        };
        if let Err(e) = vm
            .spt
            .spt_insert(uninit::vm_alloc_page_with_initializer_file(va, writable, data))
        {
            rollback(vm, pt, addr, i);
            return Err(e);
        }
    }

    Ok(addr)
}

fn rollback(vm: &mut VmSpace, pt: &mut UserPageTable, addr: VirtAddr, installed: usize) {
    for i in 0..installed {
        let Ok(va) = addr.byte_add(i * PAGE_SIZE) else {
            break;
        };
        let _ = vm.spt.spt_remove(&mut vm.frames, pt, va);
    }
}

/// Tears down the mapping whose base page is at `addr`, writing back every
/// dirty page and closing the file handle exactly once.
pub fn do_munmap(vm: &mut VmSpace, pt: &mut UserPageTable, addr: VirtAddr) -> Result<(), KernelError> {
    let base_data = *vm
        .spt
        .spt_find(addr)
        .ok_or(KernelError::InvalidUnmap)?
        .file_data()
        .ok_or(KernelError::InvalidUnmap)?;
    if base_data.mmap_base_va != addr {
        return Err(KernelError::InvalidUnmap);
    }

    let mut i = 0usize;
    loop {
        let Ok(va) = addr.byte_add(i * PAGE_SIZE) else {
            break;
        };
        let belongs = vm
            .spt
            .spt_find(va)
            .and_then(super::page::Page::file_data)
            .is_some_and(|data| data.mmap_base_va == addr);
        if !belongs {
            break;
        }
        vm.spt.spt_remove(&mut vm.frames, pt, va)?;
        i += 1;
    }

    base_data.file.close();
    Ok(())
}
