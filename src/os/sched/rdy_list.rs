//! Ready list - doubly linked list of TCBs at one priority level
//!
//! Tasks join at the tail and the head is the one that runs, which gives
//! FIFO order and makes round-robin a rotation.

use core::ptr::NonNull;

use crate::os::task::OsTcb;

#[derive(Debug, Clone, Copy)]
pub struct ReadyList {
    head: Option<NonNull<OsTcb>>,
    tail: Option<NonNull<OsTcb>>,
    len: usize,
}

impl ReadyList {
    pub const fn new() -> Self {
        ReadyList {
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn head(&self) -> Option<NonNull<OsTcb>> {
        self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Append `tcb`.
    ///
    /// # Safety
    /// `tcb` must be valid and linked into no ready list.
    pub unsafe fn push_back(&mut self, tcb: NonNull<OsTcb>) {
        let node = unsafe { &mut *tcb.as_ptr() };
        node.next_ptr = None;
        node.prev_ptr = self.tail;

        match self.tail {
            Some(tail) => unsafe { (*tail.as_ptr()).next_ptr = Some(tcb) },
            None => self.head = Some(tcb),
        }
        self.tail = Some(tcb);
        self.len += 1;
    }

    /// Unlink `tcb`.
    ///
    /// # Safety
    /// `tcb` must be valid and linked into this list.
    pub unsafe fn unlink(&mut self, tcb: NonNull<OsTcb>) {
        let node = unsafe { &mut *tcb.as_ptr() };

        match node.prev_ptr {
            Some(prev) => unsafe { (*prev.as_ptr()).next_ptr = node.next_ptr },
            None => self.head = node.next_ptr,
        }
        match node.next_ptr {
            Some(next) => unsafe { (*next.as_ptr()).prev_ptr = node.prev_ptr },
            None => self.tail = node.prev_ptr,
        }

        node.prev_ptr = None;
        node.next_ptr = None;
        self.len = self.len.saturating_sub(1);
    }

    /// Move `tcb` to the back of the line. Returns the new head.
    ///
    /// # Safety
    /// `tcb` must be valid and linked into this list.
    pub unsafe fn rotate(&mut self, tcb: NonNull<OsTcb>) -> Option<NonNull<OsTcb>> {
        if self.len > 1 {
            unsafe {
                self.unlink(tcb);
                self.push_back(tcb);
            }
        }
        self.head
    }
}

impl Default for ReadyList {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: only touched with interrupts masked
unsafe impl Send for ReadyList {}
