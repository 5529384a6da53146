// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Handoff to the application: interrupt teardown, VTOR and the jump.
//!
//! The application runs in place from XIP flash, so nothing is copied. Clocks
//! are left configured; the application's runtime reconfigures them.

const NVIC_ICER: *mut u32 = 0xE000_E180 as *mut u32;
const NVIC_ICPR: *mut u32 = 0xE000_E280 as *mut u32;
const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;

/// Mask the core, disable and clear every NVIC source, stop SysTick.
pub fn quiesce_interrupts() {
    cortex_m::interrupt::disable();
    unsafe {
        NVIC_ICER.write_volatile(0xFFFF_FFFF);
        NVIC_ICPR.write_volatile(0xFFFF_FFFF);
        SYST_CSR.write_volatile(0);
    }
    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

/// Point VTOR at the application's vector table, load its stack pointer and
/// branch to its reset handler.
///
/// # Safety
/// `quiesce_interrupts` must have run and `initial_sp`/`reset_vector` must
/// come from the table at `vector_base`.
pub unsafe fn start_app(vector_base: u32, initial_sp: u32, reset_vector: u32) -> ! {
    SCB_VTOR.write_volatile(vector_base);
    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    core::arch::asm!(
        "msr msp, {sp}",
        "cpsie i",  // Every NVIC source is off; the runtime expects PRIMASK=0
        "bx {reset}",
        sp = in(reg) initial_sp,
        reset = in(reg) reset_vector,
        options(noreturn)
    );
}
