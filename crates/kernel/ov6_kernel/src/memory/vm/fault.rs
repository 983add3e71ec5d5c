//! The page-fault handler: resolves a faulting address against the
//! supplemental page table, growing the stack or loading a backend's
//! contents into a freshly claimed frame as needed.

use ov6_kernel_params::STACK_RESERVED_SIZE;

use super::{VmSpace, page::Page};
use crate::{
    error::KernelError,
    memory::{PAGE_SIZE, PageRound, PhysAddr, VirtAddr, layout, vm_user::UserPageTable},
};

/// Resolves a page fault at `fault_addr`, with `sp` the faulting thread's
/// current stack pointer and `write` whether the access was a store.
///
/// On success, the faulting instruction can simply be retried: `vm` and `pt`
/// now have a resident, correctly permissioned mapping at `fault_addr`.  On
/// failure, the caller's policy is to terminate the process (`spec.md` §7);
/// every error this returns is one such a policy is correct for.
pub fn handle_fault(
    vm: &mut VmSpace,
    pt: &mut UserPageTable,
    fault_addr: VirtAddr,
    sp: VirtAddr,
    write: bool,
) -> Result<(), KernelError> {
    if fault_addr == VirtAddr::MIN {
        return Err(KernelError::VirtualPageNotMapped(fault_addr));
    }

    let page_va = fault_addr.page_rounddown();

    if vm.spt.spt_find(page_va).is_none() {
        if !is_stack_growth(fault_addr, sp) {
            return Err(KernelError::VirtualPageNotMapped(page_va));
        }
        vm.spt.spt_insert(Page::new_anon(page_va, true))?;
        return claim(vm, pt, page_va);
    }

    let page = vm.spt.spt_find(page_va).expect("just checked it is present");
    if write && !page.writable() {
        return Err(KernelError::InaccessiblePage(page_va));
    }

    if vm.frames.kva_of(page_va).is_some() {
        // The hardware already thinks this is mapped, so a fault here means
        // the PTE and frame table disagree about residency.
        return Err(KernelError::PageAlreadyResident(page_va));
    }

    claim(vm, pt, page_va)
}

/// Whether a fault at `fault_addr`, with stack pointer `sp`, should be
/// treated as the stack growing by one page rather than an invalid access.
///
/// The access must land just below `sp` (within a quarter page, to also
/// catch pushes that fault mid-instruction) and within the stack's reserved
/// growth region below its fixed top.
fn is_stack_growth(fault_addr: VirtAddr, sp: VirtAddr) -> bool {
    let low = sp.byte_sub(PAGE_SIZE / 4).unwrap_or(VirtAddr::MIN);
    if fault_addr < low || fault_addr > sp {
        return false;
    }
    let reserved_bottom = layout::USER_STACK_TOP
        .byte_sub(STACK_RESERVED_SIZE)
        .unwrap_or(VirtAddr::MIN);
    fault_addr >= reserved_bottom && fault_addr < layout::USER_STACK_TOP
}

/// Gives the already-tracked, non-resident page at `va` a physical frame and
/// loads its contents into it.
fn claim(vm: &mut VmSpace, pt: &mut UserPageTable, va: VirtAddr) -> Result<(), KernelError> {
    if pt.is_mapped(va) {
        return Err(KernelError::PageAlreadyResident(va));
    }

    let kva = vm.frames.frame_alloc(va, &mut vm.spt, pt)?;
    let page = vm
        .spt
        .spt_find_mut(va)
        .expect("frame_alloc may evict other pages but never the one just inserted");
    let perm = page.perm();

    if let Err(e) = pt.map_one(va, PhysAddr::new(kva.addr().get()), perm) {
        vm.frames.frame_free(va);
        return Err(e);
    }

    if let Err(e) = page.swap_in(kva) {
        let _ = pt.unmap_one(va);
        vm.frames.frame_free(va);
        return Err(e);
    }

    Ok(())
}
