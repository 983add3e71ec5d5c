//! The swap area: a fixed pool of physical pages that anonymous frames spill
//! into when the frame table runs out of room, tracked by a bitmap with one
//! bit per 512-byte sector (eight sectors per page, first-fit over 8-bit
//! runs), matching how a real swap partition would be accounted even though
//! the medium here is a page pool rather than a block device (see
//! `DESIGN.md`).

use core::ptr::{self, NonNull};

use ov6_kernel_params::NSWAP_PAGE;

use super::super::{PAGE_SIZE, page};
use crate::error::KernelError;

pub const SECTOR_SIZE: usize = 512;
pub const SECTORS_PER_PAGE: usize = PAGE_SIZE / SECTOR_SIZE;
const NSECTOR: usize = NSWAP_PAGE * SECTORS_PER_PAGE;
const NWORD: usize = NSECTOR.div_ceil(u64::BITS as usize);

/// A swapped-out page's location, as its first sector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSlot(usize);

/// The swap area's backing store and bitmap.
///
/// Pages are obtained once from `memory::page` at `init()` and never
/// returned; the area shrinks the live frame pool but is never resized.
pub struct SwapArea {
    pages: [Option<NonNull<u8>>; NSWAP_PAGE],
    bitmap: [u64; NWORD],
}

impl SwapArea {
    pub const fn new() -> Self {
        Self {
            pages: [None; NSWAP_PAGE],
            bitmap: [0; NWORD],
        }
    }

    /// Reserves the physical pages backing the swap area.
    ///
    /// Must run once before any `alloc`/`read`/`write` call; a page that
    /// fails to allocate here is simply left out of the pool, shrinking its
    /// effective capacity rather than failing boot.
    pub fn init(&mut self) {
        for slot in &mut self.pages {
            *slot = page::alloc_zeroed_page().ok();
        }
    }

    fn sector_ptr(&self, sector: usize) -> NonNull<u8> {
        let page = self.pages[sector / SECTORS_PER_PAGE].expect("swap page not reserved");
        unsafe { page.add((sector % SECTORS_PER_PAGE) * SECTOR_SIZE) }
    }

    fn is_set(&self, sector: usize) -> bool {
        self.bitmap[sector / 64] & (1 << (sector % 64)) != 0
    }

    fn set(&mut self, sector: usize) {
        self.bitmap[sector / 64] |= 1 << (sector % 64);
    }

    fn clear(&mut self, sector: usize) {
        self.bitmap[sector / 64] &= !(1 << (sector % 64));
    }

    /// Finds and marks the first free run of `SECTORS_PER_PAGE` contiguous
    /// sectors, returning its slot.
    pub fn alloc(&mut self) -> Result<SwapSlot, KernelError> {
        let mut run_start = 0;
        let mut run_len = 0;
        for sector in 0..NSECTOR {
            if self.is_set(sector) {
                run_start = sector + 1;
                run_len = 0;
                continue;
            }
            run_len += 1;
            if run_len == SECTORS_PER_PAGE {
                for s in run_start..run_start + SECTORS_PER_PAGE {
                    self.set(s);
                }
                return Ok(SwapSlot(run_start));
            }
        }
        Err(KernelError::NoFreeSwapSlot)
    }

    /// Releases the `SECTORS_PER_PAGE` sectors of `slot` without touching
    /// their contents.
    pub fn free(&mut self, slot: SwapSlot) {
        for s in slot.0..slot.0 + SECTORS_PER_PAGE {
            self.clear(s);
        }
    }

    /// Reads the page at `slot` into `kva` and frees the slot.
    pub fn read_and_free(&mut self, slot: SwapSlot, kva: NonNull<u8>) {
        self.peek(slot, kva);
        self.free(slot);
    }

    /// Reads the page at `slot` into `kva` without freeing it, for
    /// materializing an independent copy during fork.
    pub fn peek(&self, slot: SwapSlot, kva: NonNull<u8>) {
        for i in 0..SECTORS_PER_PAGE {
            let src = self.sector_ptr(slot.0 + i);
            unsafe {
                ptr::copy_nonoverlapping(src.as_ptr(), kva.as_ptr().add(i * SECTOR_SIZE), SECTOR_SIZE);
            }
        }
    }

    /// Writes the page at `kva` into a newly allocated slot.
    pub fn write(&mut self, kva: NonNull<u8>) -> Result<SwapSlot, KernelError> {
        let slot = self.alloc()?;
        for i in 0..SECTORS_PER_PAGE {
            let dst = self.sector_ptr(slot.0 + i);
            unsafe {
                ptr::copy_nonoverlapping(kva.as_ptr().add(i * SECTOR_SIZE), dst.as_ptr(), SECTOR_SIZE);
            }
        }
        Ok(slot)
    }
}
