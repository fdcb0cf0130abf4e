// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-threaded cooperative task queue.
//!
//! Asynchronous loads post their work here and the application runs it on
//! its event thread, one task per turn.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Queue of deferred tasks, cheap to clone.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` after the tasks already queued.
    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Runs the next task, returns false if the queue was empty.
    pub fn run_one(&self) -> bool {
        // The borrow must end before the task runs since it may post other tasks
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs the tasks queued before this call, returns how many ran.
    ///
    /// Tasks posted meanwhile are kept for the next turn.
    pub fn run_pending(&self) -> usize {
        let pending = self.len();
        for ran in 0..pending {
            if !self.run_one() {
                return ran;
            }
        }
        pending
    }

    /// Runs tasks until the queue is empty, returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_run_pending_keeps_new_tasks() {
        let queue = TaskQueue::new();
        let counter = Rc::new(Cell::new(0));
        {
            let queue2 = queue.clone();
            let counter = counter.clone();
            queue.post(move || {
                counter.set(counter.get() + 1);
                let counter = counter.clone();
                queue2.post(move || counter.set(counter.get() + 10));
            });
        }
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(counter.get(), 1);
        assert!(!queue.is_idle());
        assert_eq!(queue.run_until_idle(), 1);
        assert_eq!(counter.get(), 11);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_tasks_run_in_order() {
        let queue = TaskQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            queue.post(move || order.borrow_mut().push(i));
        }
        queue.run_until_idle();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }
}
