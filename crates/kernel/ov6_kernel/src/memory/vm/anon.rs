//! The anonymous page backend: zero-fill-on-demand memory that spills to the
//! swap area under eviction pressure.

use core::ptr::{self, NonNull};

use super::swap::SwapSlot;
use crate::{
    error::KernelError,
    memory::{PAGE_SIZE, VirtAddr, vm_user::UserPageTable},
};

#[derive(Clone, Copy)]
pub struct AnonData {
    swap_slot: Option<SwapSlot>,
}

impl AnonData {
    pub const fn new() -> Self {
        Self { swap_slot: None }
    }
}

/// Fills a freshly allocated anonymous frame: zero, since there is nothing
/// to load yet.
pub fn zero_fill(kva: NonNull<u8>) {
    unsafe {
        ptr::write_bytes(kva.as_ptr(), 0, PAGE_SIZE);
    }
}

/// Materializes `data` into `kva`: zero-fill if never swapped out, otherwise
/// read back from the swap area and release the slot.
pub fn swap_in(data: &mut AnonData, kva: NonNull<u8>) -> Result<(), KernelError> {
    match data.swap_slot.take() {
        None => zero_fill(kva),
        Some(slot) => super::swap_area().lock().read_and_free(slot, kva),
    }
    Ok(())
}

/// Writes `kva`'s contents out to a fresh swap slot and clears the mapping.
/// Leaves `data` unswapped (caller must drop the frame) unless this returns
/// `Ok`.
pub fn swap_out(
    data: &mut AnonData,
    va: VirtAddr,
    kva: NonNull<u8>,
    pt: &mut UserPageTable,
) -> Result<(), KernelError> {
    let slot = super::swap_area().lock().write(kva)?;
    pt.unmap_one(va)?;
    data.swap_slot = Some(slot);
    Ok(())
}

/// Releases whatever resource backs the page: clears the mapping if
/// resident, or frees the swap slot if swapped out. Never fails: there is
/// nothing to write back for an anonymous page being discarded.
pub fn destroy(
    data: &mut AnonData,
    va: VirtAddr,
    kva: Option<NonNull<u8>>,
    pt: &mut UserPageTable,
) -> Result<(), KernelError> {
    if kva.is_some() {
        pt.unmap_one(va)?;
    } else if let Some(slot) = data.swap_slot.take() {
        super::swap_area().lock().free(slot);
    }
    Ok(())
}

/// Reads a swapped-out page's bytes into `kva` without disturbing the
/// original slot, for deep-copying a swapped anonymous page during fork.
pub fn peek_swapped(data: &AnonData, kva: NonNull<u8>) {
    let slot = data.swap_slot.expect("peek_swapped called on a resident page");
    super::swap_area().lock().peek(slot, kva);
}

pub fn is_swapped(data: &AnonData) -> bool {
    data.swap_slot.is_some()
}
