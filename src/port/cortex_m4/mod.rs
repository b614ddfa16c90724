//! Cortex-M4F port
//!
//! PendSV performs every context switch. Tasks run in thread mode on PSP;
//! handlers run on a dedicated MSP stack. Tasks that touch the FPU get
//! s16-s31 saved as well, keyed off bit 4 of EXC_RETURN.

use core::arch::naked_asm;
use core::ptr::addr_of;

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;

use crate::os::config::CFG_ISR_STK_SIZE;
use crate::os::kernel::CPU_STATE;
use crate::os::task::OsTaskFn;
use crate::os::types::OsStkElement;

/// Handler-mode stack once the scheduler owns the CPU
#[repr(C, align(8))]
struct IsrStack([u32; CFG_ISR_STK_SIZE]);

#[no_mangle]
static mut ISR_STACK: IsrStack = IsrStack([0; CFG_ISR_STK_SIZE]);

/// EXC_RETURN: thread mode, PSP, basic frame
const EXC_RETURN_THREAD_PSP: u32 = 0xFFFF_FFFD;
/// xPSR with only the Thumb bit set
const XPSR_THUMB: u32 = 0x0100_0000;

/// Initial frame as PendSV expects to find it: the software-saved part
/// below the part the hardware unstacks on exception return.
#[repr(C)]
struct TaskFrame {
    r4: u32,
    r5: u32,
    r6: u32,
    r7: u32,
    r8: u32,
    r9: u32,
    r10: u32,
    r11: u32,
    exc_return: u32,
    r0: u32,
    r1: u32,
    r2: u32,
    r3: u32,
    r12: u32,
    lr: u32,
    pc: u32,
    xpsr: u32,
}

/// Program SysTick with `reload` core clocks per tick
pub fn os_cpu_systick_init(reload: u32) {
    let mut p = unsafe { cortex_m::Peripherals::steal() };

    p.SYST.set_reload(reload - 1);
    p.SYST.clear_current();
    p.SYST.set_clock_source(SystClkSource::Core);
    p.SYST.enable_interrupt();
    p.SYST.enable_counter();
}

/// Hand the CPU to the first task. Never returns.
pub unsafe fn os_start_high_rdy() -> ! {
    unsafe {
        let mut scb = cortex_m::Peripherals::steal().SCB;
        scb.set_priority(SystemHandler::PendSV, 0xF0);
        scb.set_priority(SystemHandler::SysTick, 0xF0);

        let msp_top = addr_of!(ISR_STACK) as u32 + core::mem::size_of::<IsrStack>() as u32;
        start_first_task(msp_top)
    }
}

/// Switch MSP to the handler stack, mark "no current task" with PSP = 0
/// and let PendSV load the first context.
#[unsafe(naked)]
unsafe extern "C" fn start_first_task(_msp_top: u32) -> ! {
    naked_asm!(
        "cpsid i",
        "msr msp, r0",
        "movs r1, #0",
        "msr psp, r1",
        "ldr r2, ={cpu_state}",
        "str r1, [r2]",
        // ICSR.PENDSVSET
        "ldr r1, =0xE000ED04",
        "mov r2, #0x10000000",
        "str r2, [r1]",
        "dsb",
        "isb",
        "cpsie i",
        "1:",
        "b 1b",
        cpu_state = sym CPU_STATE,
    );
}

/// Trigger context switch from task level
#[inline(always)]
pub fn os_ctx_sw() {
    cortex_m::peripheral::SCB::set_pendsv();
}

/// Trigger context switch from interrupt level
#[inline(always)]
pub fn os_int_ctx_sw() {
    cortex_m::peripheral::SCB::set_pendsv();
}

/// Lay down the first frame of a task so that PendSV "returns" into
/// `task_fn(arg)`.
pub unsafe fn os_task_stk_init(
    task_fn: OsTaskFn,
    arg: *mut (),
    stack: &mut [OsStkElement],
) -> *mut OsStkElement {
    let words = core::mem::size_of::<TaskFrame>() / 4;
    let top = unsafe { stack.as_mut_ptr().add(stack.len()) };
    // AAPCS wants an 8-byte aligned stack at the task's entry
    let aligned = ((top as usize) & !7) as *mut u32;

    unsafe {
        let frame = aligned.sub(words) as *mut TaskFrame;
        frame.write(TaskFrame {
            r4: 0x0404_0404,
            r5: 0x0505_0505,
            r6: 0x0606_0606,
            r7: 0x0707_0707,
            r8: 0x0808_0808,
            r9: 0x0909_0909,
            r10: 0x1010_1010,
            r11: 0x1111_1111,
            exc_return: EXC_RETURN_THREAD_PSP,
            r0: arg as u32,
            r1: 0,
            r2: 0,
            r3: 0,
            r12: 0,
            lr: os_task_return as usize as u32,
            pc: (task_fn as usize as u32) | 1,
            xpsr: XPSR_THUMB,
        });
        frame as *mut OsStkElement
    }
}

/// PendSV exception handler - performs full context switch
///
/// 1. Save r4-r11 and EXC_RETURN (plus s16-s31 for FPU users) on the
///    outgoing PSP, skipped for the very first switch
/// 2. `tcb_cur = tcb_high_rdy`, `prio_cur = prio_high_rdy`
/// 3. Restore the incoming context and return into it
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "cpsid i",
        "ldr r2, ={cpu_state}",
        "ldr r1, [r2]",
        "cbz r1, 1f",

        "mrs r0, psp",
        "tst lr, #0x10",
        "it eq",
        "vstmdbeq r0!, {{s16-s31}}",
        "stmdb r0!, {{r4-r11, lr}}",
        "str r0, [r1]",

        "1:",
        "ldr r1, [r2, #4]",
        "str r1, [r2]",
        "ldrb r3, [r2, #9]",
        "strb r3, [r2, #8]",

        "ldr r0, [r1]",
        "ldmia r0!, {{r4-r11, lr}}",
        "tst lr, #0x10",
        "it eq",
        "vldmiaeq r0!, {{s16-s31}}",
        "msr psp, r0",

        "dsb",
        "isb",
        "cpsie i",
        "bx lr",
        cpu_state = sym CPU_STATE,
    );
}

/// Tasks never return; park the CPU if one does.
#[no_mangle]
fn os_task_return() -> ! {
    crate::error!("task returned");
    loop {
        cortex_m::asm::wfi();
    }
}
