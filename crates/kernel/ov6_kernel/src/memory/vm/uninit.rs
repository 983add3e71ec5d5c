//! Constructors for pages that have not materialized a backend yet.
//!
//! The actual `Uninit -> Anon`/`Uninit -> File` transition lives on
//! [`Page`](super::page::Page) itself, since it needs to reach into the
//! private variant it holds; this module only builds the page in its
//! starting state.

use super::{
    file_backed::FileData,
    page::{Page, UninitTarget},
};
use crate::memory::VirtAddr;

/// Allocates a lazily zero-filled page at `va`, materialized on first fault.
pub fn vm_alloc_page_with_initializer_anon(va: VirtAddr, writable: bool) -> Page {
    Page::new_uninit(va, writable, UninitTarget::Anon)
}

/// Allocates a page at `va` that loads from `data` on first fault.
pub fn vm_alloc_page_with_initializer_file(va: VirtAddr, writable: bool, data: FileData) -> Page {
    Page::new_uninit(va, writable, UninitTarget::File(data))
}
