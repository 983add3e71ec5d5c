//! Virtual memory beyond what the raw page table tracks: lazily loaded and
//! swappable pages, the frame table that backs them, the swap area they
//! spill into, and the page-fault handler and `mmap`/`munmap` operations
//! built on top of all three.

use once_init::OnceInit;

pub use self::{
    fault::handle_fault,
    file_backed::MmapFile,
    frame::FrameTable,
    mmap::{do_mmap, do_munmap},
    page::{Page, PageKind},
    spt::{Spt, spt_copy},
};
use self::swap::SwapArea;
use crate::sync::SpinLock;

mod anon;
mod fault;
mod file_backed;
mod frame;
mod mmap;
mod page;
mod spt;
mod swap;
mod uninit;

static SWAP_AREA: OnceInit<SpinLock<SwapArea>> = OnceInit::new();

/// Reserves the swap area's backing pages. Must run once during boot, after
/// the physical page allocator is up and before any process can fault.
pub fn init() {
    unsafe {
        SWAP_AREA.init(SpinLock::new(SwapArea::new()));
    }
    SWAP_AREA.get().lock().init();
}

fn swap_area() -> &'static SpinLock<SwapArea> {
    SWAP_AREA.get()
}

/// One process's virtual memory: its supplemental page table and the
/// physical frames currently resident for it.
///
/// Each process owns its own frame table rather than sharing one globally,
/// so eviction only ever touches a single process's own tables (recorded in
/// `DESIGN.md`).
pub struct VmSpace {
    pub spt: Spt,
    pub frames: FrameTable,
}

impl VmSpace {
    pub const fn new() -> Self {
        Self {
            spt: Spt::new(),
            frames: FrameTable::new(),
        }
    }
}
