//! The page descriptor: one supplemental-page-table entry, holding whichever
//! backend currently owns it.
//!
//! Dispatch is a plain `match` on the active variant rather than a vtable.
//! Both compile to the same thing here, so the choice is purely which reads
//! better; a `match` keeps `transmute`'s in-place variant swap straightforward
//! without fighting the borrow checker over a trait object behind `&mut
//! self` (`spec.md` §9).

use core::ptr::NonNull;

use super::{anon::AnonData, file_backed, file_backed::FileData};
use crate::{
    error::KernelError,
    memory::{VirtAddr, page_table::PtEntryFlags, vm_user::UserPageTable},
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Uninit,
    Anon,
    File,
}

/// What an [`Uninit`](PageVariant::Uninit) page will become on its first
/// fault, and whatever it needs to get there.
#[derive(Clone, Copy)]
pub enum UninitTarget {
    Anon,
    File(FileData),
}

#[derive(Clone, Copy)]
enum PageVariant {
    Uninit(UninitTarget),
    Anon(AnonData),
    File(FileData),
}

/// One page of a process's address space: where it lives, whether it is
/// writable, and which backend currently owns its contents.
///
/// `Page` is `Copy`: every variant's payload is plain data describing where
/// contents live, never a handle that owns a resource by itself, so copying
/// one is cheap and safe (used by fork's supplemental-page-table copy).
#[derive(Clone, Copy)]
pub struct Page {
    va: VirtAddr,
    writable: bool,
    variant: PageVariant,
}

impl Page {
    pub fn new_uninit(va: VirtAddr, writable: bool, target: UninitTarget) -> Self {
        Self {
            va,
            writable,
            variant: PageVariant::Uninit(target),
        }
    }

    pub fn new_anon(va: VirtAddr, writable: bool) -> Self {
        Self {
            va,
            writable,
            variant: PageVariant::Anon(AnonData::new()),
        }
    }

    pub fn va(&self) -> VirtAddr {
        self.va
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    /// The page-table permission flags this page should be mapped with.
    pub fn perm(&self) -> PtEntryFlags {
        if self.writable {
            PtEntryFlags::URW
        } else {
            PtEntryFlags::UR
        }
    }

    pub fn kind(&self) -> PageKind {
        match &self.variant {
            PageVariant::Uninit(_) => PageKind::Uninit,
            PageVariant::Anon(_) => PageKind::Anon,
            PageVariant::File(_) => PageKind::File,
        }
    }

    /// The page's file-backed metadata, resident or not, if it has any —
    /// used by `mmap`/`munmap` to identify a mapping's pages.
    pub fn file_data(&self) -> Option<&FileData> {
        match &self.variant {
            PageVariant::File(data) => Some(data),
            PageVariant::Uninit(UninitTarget::File(data)) => Some(data),
            PageVariant::Uninit(UninitTarget::Anon) | PageVariant::Anon(_) => None,
        }
    }

    /// This page's anonymous backend state, if it has materialized one — used
    /// by fork to tell a swapped-out anonymous page from a resident one.
    pub fn anon_data(&self) -> Option<&AnonData> {
        match &self.variant {
            PageVariant::Anon(data) => Some(data),
            PageVariant::Uninit(_) | PageVariant::File(_) => None,
        }
    }

    /// Replaces an `Uninit` page's target with its materialized backend and
    /// loads `kva` with its initial contents: zero for an anonymous target,
    /// the mapped file range for a file-backed one.
    fn transmute(&mut self, kva: NonNull<u8>) -> Result<(), KernelError> {
        let PageVariant::Uninit(target) = &self.variant else {
            unreachable!("transmute is only called on an Uninit page")
        };
        match *target {
            UninitTarget::Anon => {
                self.variant = PageVariant::Anon(AnonData::new());
                super::anon::zero_fill(kva);
                Ok(())
            }
            UninitTarget::File(data) => {
                let result = file_backed::load_into(&data, kva);
                self.variant = PageVariant::File(data);
                result
            }
        }
    }

    /// Fills `kva` with this page's contents, first materializing an
    /// `Uninit` target if the page has never been faulted in before.
    pub fn swap_in(&mut self, kva: NonNull<u8>) -> Result<(), KernelError> {
        if let PageVariant::Uninit(_) = &self.variant {
            self.transmute(kva)?;
        }
        match &mut self.variant {
            PageVariant::Uninit(_) => unreachable!("transmute always replaces the Uninit variant"),
            PageVariant::Anon(data) => super::anon::swap_in(data, kva),
            PageVariant::File(data) => file_backed::swap_in(data, kva),
        }
    }

    /// Writes `kva`'s contents out to this page's backend and clears its
    /// mapping, releasing the frame for reuse.
    pub fn swap_out(&mut self, kva: NonNull<u8>, pt: &mut UserPageTable) -> Result<(), KernelError> {
        match &mut self.variant {
            PageVariant::Uninit(_) => unreachable!("an Uninit page is never resident"),
            PageVariant::Anon(data) => super::anon::swap_out(data, self.va, kva, pt),
            PageVariant::File(data) => file_backed::swap_out(data, self.va, kva, pt),
        }
    }

    /// Releases whatever resource backs this page, resident or not: a
    /// mapping and swap slot for anonymous pages, a writeback and mapping
    /// for file-backed pages, nothing for an untouched `Uninit` page.
    pub fn destroy(&mut self, kva: Option<NonNull<u8>>, pt: &mut UserPageTable) -> Result<(), KernelError> {
        match &mut self.variant {
            PageVariant::Uninit(_) => Ok(()),
            PageVariant::Anon(data) => super::anon::destroy(data, self.va, kva, pt),
            PageVariant::File(data) => file_backed::destroy(data, self.va, kva, pt),
        }
    }
}
