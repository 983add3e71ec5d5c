//! The supplemental page table: per-process bookkeeping for every virtual
//! page that has a backend, resident or not, beyond what the hardware page
//! table itself records.

use arrayvec::ArrayVec;
use ov6_kernel_params::NVMPAGE;

use super::{
    file_backed::FileData,
    frame::FrameTable,
    page::{Page, PageKind, UninitTarget},
};
use crate::{
    error::KernelError,
    memory::{PhysAddr, VirtAddr, vm_user::UserPageTable},
};

/// Every page this process knows about beyond what is mapped right now,
/// keyed by virtual address.
pub struct Spt {
    pages: ArrayVec<Page, NVMPAGE>,
}

impl Spt {
    pub const fn new() -> Self {
        Self {
            pages: ArrayVec::new_const(),
        }
    }

    pub fn spt_find(&self, va: VirtAddr) -> Option<&Page> {
        self.pages.iter().find(|p| p.va() == va)
    }

    pub fn spt_find_mut(&mut self, va: VirtAddr) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.va() == va)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    /// Records a new page, rejecting a virtual address already tracked.
    pub fn spt_insert(&mut self, page: Page) -> Result<(), KernelError> {
        if self.spt_find(page.va()).is_some() {
            return Err(KernelError::PageAlreadyResident(page.va()));
        }
        self.pages
            .try_push(page)
            .map_err(|_| KernelError::NoFreeVmPageEntry)
    }

    /// Removes and tears down the page at `va`: writes it back through its
    /// backend if dirty, clears its mapping if resident, and releases its
    /// frame.
    pub fn spt_remove(
        &mut self,
        frames: &mut FrameTable,
        pt: &mut UserPageTable,
        va: VirtAddr,
    ) -> Result<Page, KernelError> {
        let idx = self
            .pages
            .iter()
            .position(|p| p.va() == va)
            .ok_or(KernelError::VirtualPageNotMapped(va))?;
        let mut page = self.pages.remove(idx);
        let kva = frames.kva_of(va);
        page.destroy(kva, pt)?;
        if kva.is_some() {
            frames.frame_free(va);
        }
        Ok(page)
    }

    /// Tears down every page this process still owns, for process exit.
    /// Keeps going past individual backend failures: there is no one left to
    /// report them to.
    pub fn spt_kill(&mut self, frames: &mut FrameTable, pt: &mut UserPageTable) {
        for page in &mut self.pages {
            let kva = frames.kva_of(page.va());
            let file_data = page.file_data().copied();
            let _: Result<(), KernelError> = page.destroy(kva, pt);
            if kva.is_some() {
                frames.frame_free(page.va());
            }
            if let Some(data) = file_data {
                if page.va() == data.mmap_base_va {
                    data.file.close();
                }
            }
        }
        self.pages.clear();
    }
}

/// Copies every page `src` tracks into `dst`'s own supplemental page table
/// and frame table, for fork.
///
/// An `Uninit` page is copied by value: nothing has materialized yet, so
/// there is nothing to duplicate. A resident or swapped-out anonymous page
/// is deep-copied into a fresh frame in `dst`, read back via the same
/// fault-like path a page fault would use. A file-backed page is copied back
/// to `Uninit`: the child re-faults it from the file independently, so a
/// dirty unwritten page in the parent is not visible to the child (recorded
/// in `DESIGN.md`).
pub fn spt_copy(
    src: &Spt,
    src_frames: &FrameTable,
    dst: &mut Spt,
    dst_frames: &mut FrameTable,
    dst_pt: &mut UserPageTable,
) -> Result<(), KernelError> {
    for page in src.iter() {
        match page.kind() {
            PageKind::Uninit => {
                dst.spt_insert(*page)?;
            }
            PageKind::File => {
                let data: FileData = *page.file_data().expect("File page must carry FileData");
                dst.spt_insert(Page::new_uninit(page.va(), page.writable(), UninitTarget::File(data)))?;
            }
            PageKind::Anon => {
                let dst_kva = dst_frames.frame_alloc(page.va(), dst, dst_pt)?;
                match src_frames.kva_of(page.va()) {
                    Some(src_kva) => unsafe {
                        dst_kva
                            .as_ptr()
                            .copy_from_nonoverlapping(src_kva.as_ptr(), crate::memory::PAGE_SIZE);
                    },
                    None => {
                        let data = page
                            .anon_data()
                            .expect("Anon page must carry AnonData when not resident");
                        super::anon::peek_swapped(data, dst_kva);
                    }
                }
                let pa = PhysAddr::new(dst_kva.addr().get());
                if let Err(e) = dst_pt.map_one(page.va(), pa, page.perm()) {
                    dst_frames.frame_free(page.va());
                    return Err(e);
                }
                dst.spt_insert(Page::new_anon(page.va(), page.writable()))?;
            }
        }
    }
    Ok(())
}

