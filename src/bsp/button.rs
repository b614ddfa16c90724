//! Push button on PA0, routed to EXTI line 0 on the rising edge

use portable_atomic::{AtomicBool, Ordering};

use crate::os::kernel::IsrYield;
use crate::sync::sem::BinarySemaphore;

/// EXTI line the button is routed to
pub const BUTTON_LINE: u8 = 0;

/// Pending register of the external interrupt controller
pub trait ExtiLines {
    fn is_pending(&self, line: u8) -> bool;
    /// Write-one-to-clear
    fn clear_pending(&self, line: u8);
}

/// Where a button edge is delivered from interrupt context
pub trait PressSignal {
    fn signal_from_isr(&self) -> IsrYield;
}

impl PressSignal for BinarySemaphore {
    fn signal_from_isr(&self) -> IsrYield {
        match self.give_from_isr() {
            Ok(hint) => hint,
            Err(e) => {
                crate::error!("button: semaphore give failed ({})", e);
                IsrYield::NONE
            }
        }
    }
}

/// Polled press flag for code running without the kernel
pub struct PressFlag {
    pressed: AtomicBool,
}

impl PressFlag {
    pub const fn new() -> Self {
        PressFlag {
            pressed: AtomicBool::new(false),
        }
    }

    /// Consume a pending press
    pub fn take(&self) -> bool {
        self.pressed.swap(false, Ordering::AcqRel)
    }
}

impl Default for PressFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl PressSignal for PressFlag {
    fn signal_from_isr(&self) -> IsrYield {
        self.pressed.store(true, Ordering::Release);
        IsrYield::NONE
    }
}

/// EXTI0 interrupt body: acknowledge the edge and signal it once.
pub fn on_exti_interrupt<E: ExtiLines, S: PressSignal + ?Sized>(lines: &E, signal: &S) -> IsrYield {
    if !lines.is_pending(BUTTON_LINE) {
        return IsrYield::NONE;
    }
    lines.clear_pending(BUTTON_LINE);
    signal.signal_from_isr()
}


#[cfg(test)]
mod tests {
    use core::ptr::NonNull;

    use super::mock::MockExti;
    use super::*;
    use crate::os::config::CFG_PRIO_IDLE;
    use crate::os::critical::critical_section;
    use crate::os::kernel::test_support::{fresh_kernel, run_as};
    use crate::os::kernel::{os_yield_from_isr, KERNEL, SCHED};
    use crate::os::task::OsTcb;
    use crate::os::types::Timeout;
    use crate::port::take_switch_request;

    /// Park a task of priority `prio` on `sem`
    fn park_on(sem: &BinarySemaphore, tcb: &mut OsTcb, prio: u8) -> NonNull<OsTcb> {
        tcb.prio = prio;
        let ptr = NonNull::from(tcb);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(ptr) });
        run_as(ptr);
        critical_section(|cs| sem.try_take_or_park(cs, Timeout::Forever)).unwrap();
        ptr
    }

    #[test]
    fn edge_preempts_lower_priority_task() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("button").unwrap();

        let mut waiter = OsTcb::new();
        let waiter = park_on(&SEM, &mut waiter, 4);

        let mut idle = OsTcb::new();
        idle.prio = CFG_PRIO_IDLE;
        run_as(NonNull::from(&mut idle));
        take_switch_request();

        let exti = MockExti::default();
        exti.edge(BUTTON_LINE);
        os_yield_from_isr(on_exti_interrupt(&exti, &SEM));

        assert!(take_switch_request());
        assert!(unsafe { waiter.as_ref().is_ready() });

        KERNEL.set_running(false);
    }

    #[test]
    fn edge_does_not_preempt_equal_priority_task() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("button").unwrap();

        let mut waiter = OsTcb::new();
        let waiter = park_on(&SEM, &mut waiter, 4);

        let mut peer = OsTcb::new();
        peer.prio = 4;
        let peer = NonNull::from(&mut peer);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(peer) });
        run_as(peer);
        take_switch_request();

        let exti = MockExti::default();
        exti.edge(BUTTON_LINE);
        os_yield_from_isr(on_exti_interrupt(&exti, &SEM));

        // Woken, but it waits for its turn
        assert!(unsafe { waiter.as_ref().is_ready() });
        assert!(!take_switch_request());

        KERNEL.set_running(false);
    }

    #[test]
    fn edge_gives_semaphore_once_and_clears_line() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("button").unwrap();
        let exti = MockExti::default();

        let _ = on_exti_interrupt(&exti, &SEM);
        assert!(!SEM.is_available());
        assert_eq!(exti.clears.get(), 0);

        exti.edge(BUTTON_LINE);
        let _ = on_exti_interrupt(&exti, &SEM);
        assert_eq!(exti.clears.get(), 1);
        assert!(!exti.is_pending(BUTTON_LINE));
        assert_eq!(SEM.take(Timeout::NoWait), Ok(()));
    }

    #[test]
    fn other_lines_are_left_alone() {
        let exti = MockExti::default();
        let flag = PressFlag::new();
        exti.edge(3);
        let _ = on_exti_interrupt(&exti, &flag);
        assert!(!flag.take());
        assert!(exti.is_pending(3));
    }

    #[test]
    fn press_flag_latches_until_taken() {
        let exti = MockExti::default();
        let flag = PressFlag::new();
        exti.edge(BUTTON_LINE);
        let _ = on_exti_interrupt(&exti, &flag);
        assert!(flag.take());
        assert!(!flag.take());
    }
}
