//! Wait list - tasks parked on one kernel object
//!
//! Ordered by priority, FIFO among equals, so the next give/send always
//! wakes the most urgent waiter.

use core::ptr::NonNull;

use crate::os::task::OsTcb;

#[derive(Debug)]
pub struct WaitList {
    head: Option<NonNull<OsTcb>>,
    tail: Option<NonNull<OsTcb>>,
}

impl WaitList {
    pub const fn new() -> Self {
        WaitList {
            head: None,
            tail: None,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline(always)]
    pub fn head(&self) -> Option<NonNull<OsTcb>> {
        self.head
    }

    /// Insert behind every waiter of equal or higher priority, and record
    /// the list in the TCB so a timeout can find it again.
    ///
    /// # Safety
    /// `tcb` must be valid and on no wait list; `self` must not move while
    /// the task is parked.
    pub unsafe fn insert(&mut self, tcb: NonNull<OsTcb>) {
        let prio = unsafe { tcb.as_ref().prio };

        let mut after: Option<NonNull<OsTcb>> = None;
        let mut before = self.head;
        while let Some(cur) = before {
            let cur_ref = unsafe { cur.as_ref() };
            if prio < cur_ref.prio {
                break;
            }
            after = before;
            before = cur_ref.wait_next_ptr;
        }

        let node = unsafe { &mut *tcb.as_ptr() };
        node.wait_prev_ptr = after;
        node.wait_next_ptr = before;
        node.wait_list = Some(NonNull::from(&mut *self));

        match after {
            Some(p) => unsafe { (*p.as_ptr()).wait_next_ptr = Some(tcb) },
            None => self.head = Some(tcb),
        }
        match before {
            Some(n) => unsafe { (*n.as_ptr()).wait_prev_ptr = Some(tcb) },
            None => self.tail = Some(tcb),
        }
    }

    /// # Safety
    /// `tcb` must be valid and linked into this list.
    pub unsafe fn remove(&mut self, tcb: NonNull<OsTcb>) {
        let node = unsafe { &mut *tcb.as_ptr() };

        match node.wait_prev_ptr {
            Some(prev) => unsafe { (*prev.as_ptr()).wait_next_ptr = node.wait_next_ptr },
            None => self.head = node.wait_next_ptr,
        }
        match node.wait_next_ptr {
            Some(next) => unsafe { (*next.as_ptr()).wait_prev_ptr = node.wait_prev_ptr },
            None => self.tail = node.wait_prev_ptr,
        }

        node.wait_prev_ptr = None;
        node.wait_next_ptr = None;
        node.wait_list = None;
    }

    /// Detach and return the most urgent waiter.
    pub fn pop(&mut self) -> Option<NonNull<OsTcb>> {
        let head = self.head?;
        unsafe { self.remove(head) };
        Some(head)
    }
}

impl Default for WaitList {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for WaitList {}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcb(prio: u8) -> OsTcb {
        let mut t = OsTcb::new();
        t.prio = prio;
        t
    }

    #[test]
    fn wakes_by_priority_then_fifo() {
        let mut low = tcb(9);
        let mut high = tcb(2);
        let mut low2 = tcb(9);
        let (pl, ph, pl2) = (
            NonNull::from(&mut low),
            NonNull::from(&mut high),
            NonNull::from(&mut low2),
        );

        let mut list = WaitList::new();
        unsafe {
            list.insert(pl);
            list.insert(ph);
            list.insert(pl2);
        }

        assert_eq!(list.pop(), Some(ph));
        assert_eq!(list.pop(), Some(pl));
        assert_eq!(list.pop(), Some(pl2));
        assert!(list.is_empty());
        assert!(low.wait_list.is_none());
    }

    #[test]
    fn remove_from_middle() {
        let mut a = tcb(1);
        let mut b = tcb(2);
        let mut c = tcb(3);
        let (pa, pb, pc) = (
            NonNull::from(&mut a),
            NonNull::from(&mut b),
            NonNull::from(&mut c),
        );

        let mut list = WaitList::new();
        unsafe {
            list.insert(pc);
            list.insert(pa);
            list.insert(pb);
            list.remove(pb);
        }
        assert_eq!(list.pop(), Some(pa));
        assert_eq!(list.pop(), Some(pc));
        assert_eq!(list.pop(), None);
    }
}
