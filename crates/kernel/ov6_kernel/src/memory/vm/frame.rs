//! The frame table: the physical frames a process currently holds resident,
//! in allocation order, which also doubles as the scan order for eviction.
//!
//! Each process owns its own frame table (see `DESIGN.md`'s "frame table
//! scope" decision) rather than sharing one global table, so eviction only
//! ever touches the current process's own frame table, SPT, and page table.

use core::ptr::NonNull;

use arrayvec::ArrayVec;
use ov6_kernel_params::NFRAME;

use super::spt::Spt;
use crate::{
    error::KernelError,
    memory::{VirtAddr, page, vm_user::UserPageTable},
};

struct Frame {
    kva: NonNull<u8>,
    va: VirtAddr,
}

/// Physical frames resident for one address space, oldest allocation first.
pub struct FrameTable {
    frames: ArrayVec<Frame, NFRAME>,
}

impl FrameTable {
    pub const fn new() -> Self {
        Self {
            frames: ArrayVec::new_const(),
        }
    }

    /// Returns the kernel-addressable pointer backing the resident page at
    /// `va`, if any.
    pub fn kva_of(&self, va: VirtAddr) -> Option<NonNull<u8>> {
        self.frames.iter().find(|f| f.va == va).map(|f| f.kva)
    }

    /// Obtains a zeroed physical frame for `va`, evicting a victim of this
    /// table if the table is full or physical memory is exhausted.
    pub fn frame_alloc(
        &mut self,
        va: VirtAddr,
        spt: &mut Spt,
        pt: &mut UserPageTable,
    ) -> Result<NonNull<u8>, KernelError> {
        loop {
            if !self.frames.is_full() {
                match page::alloc_zeroed_page() {
                    Ok(kva) => {
                        self.frames.push(Frame { kva, va });
                        return Ok(kva);
                    }
                    Err(KernelError::NoFreePage) => {}
                    Err(e) => return Err(e),
                }
            }
            self.evict_one(spt, pt)?;
        }
    }

    /// Drops the frame backing `va` without running any page backend logic,
    /// for rollback paths that already know the frame holds nothing worth
    /// preserving.
    pub fn frame_free(&mut self, va: VirtAddr) {
        if let Some(idx) = self.frames.iter().position(|f| f.va == va) {
            let frame = self.frames.remove(idx);
            unsafe {
                page::free_page(frame.kva);
            }
        }
    }

    /// Picks an eviction victim among entries not in `excluded`, by
    /// approximate LRU: clears the accessed bit and skips any frame found
    /// set, for up to two full passes, falling back to the first entry seen.
    fn select_victim(&self, pt: &mut UserPageTable, excluded: &[VirtAddr]) -> Option<VirtAddr> {
        let mut fallback = None;
        for _ in 0..2 {
            for frame in &self.frames {
                if excluded.contains(&frame.va) {
                    continue;
                }
                if fallback.is_none() {
                    fallback = Some(frame.va);
                }
                match pt.accessed(frame.va) {
                    Ok(true) => {
                        let _ = pt.clear_accessed(frame.va);
                    }
                    Ok(false) | Err(_) => return Some(frame.va),
                }
            }
        }
        fallback
    }

    /// Evicts one resident frame of this table: picks a victim, swaps it out
    /// through its page's backend, and releases the physical frame.
    ///
    /// Retries with the failed victim excluded, up to the table size, so a
    /// single anonymous page that can't find a swap slot doesn't block
    /// eviction of everything else.
    pub fn evict_one(&mut self, spt: &mut Spt, pt: &mut UserPageTable) -> Result<(), KernelError> {
        let attempts = self.frames.len().max(1);
        let mut excluded = ArrayVec::<VirtAddr, NFRAME>::new();
        for _ in 0..attempts {
            let Some(va) = self.select_victim(pt, &excluded) else {
                return Err(KernelError::NoFreeFrame);
            };
            let kva = self.kva_of(va).expect("victim must still be resident");
            let page = spt.spt_find_mut(va).expect("resident frame must have an SPT entry");
            match page.swap_out(kva, pt) {
                Ok(()) => {
                    self.frame_free(va);
                    return Ok(());
                }
                Err(KernelError::NoFreeSwapSlot) => {
                    let _ = excluded.try_push(va);
                }
                Err(e) => return Err(e),
            }
        }
        Err(KernelError::NoFreeSwapSlot)
    }
}
