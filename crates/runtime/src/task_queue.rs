//! FIFO queue for callbacks delivered by a single-threaded host.
//!
//! Host callbacks only push; one owner drains the queue and applies the
//! tasks in arrival order, so no callback ever runs re-entrantly inside
//! another.
//!
//! Key properties:
//! - Strict insertion order.
//! - Optional backpressure via a maximum pending length.

use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaskQueueFull {
    pub max_len: usize,
}

#[derive(Debug)]
struct Item<T> {
    id: TaskId,
    payload: T,
}

#[derive(Debug)]
pub struct TaskQueue<T> {
    next_id: u64,
    items: VecDeque<Item<T>>,
    max_len: Option<usize>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            items: VecDeque::new(),
            max_len: None,
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push_back(Item { id, payload });
        id
    }

    pub fn try_push(&mut self, payload: T) -> Result<TaskId, TaskQueueFull> {
        if let Some(max_len) = self.max_len
            && self.items.len() >= max_len
        {
            return Err(TaskQueueFull { max_len });
        }
        Ok(self.push(payload))
    }

    /// Pops the oldest pending task.
    pub fn pop_next(&mut self) -> Option<(TaskId, T)> {
        self.items.pop_front().map(|i| (i.id, i.payload))
    }

    /// Takes every pending task, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).map(|i| i.payload).collect()
    }
}
