//! # Drawing
//!
//! Formatting ends with every element turning itself into drawing tasks:
//! deferred operations against a [`DrawingSurface`], each with a priority.
//! All tasks of a document go into one [`DrawingTaskQueue`], which runs them
//! highest priority first so that pages exist before anything is painted on
//! them and backgrounds end up underneath text and borders. Tasks of equal
//! priority run in the order they were queued.

pub mod surface;
pub mod tasks;

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use crate::error::Result;

pub use surface::{DrawingSurface, FillMode, LineStyle, RecordingSurface, SurfaceCall, TextRun};

/// Queue priorities. Higher runs earlier.
pub mod priority {
    pub const PAGE: i32 = 100;
    pub const BACKGROUND1: i32 = 60;
    pub const BACKGROUND2: i32 = 50;
    pub const BACKGROUND3: i32 = 40;
    pub const FOREGROUND3: i32 = 30;
    pub const FOREGROUND2: i32 = 20;
    pub const FOREGROUND1: i32 = 10;
}

type Operation = Box<dyn FnOnce(&mut dyn DrawingSurface) -> Result<()>>;

pub struct DrawingTask {
    priority: i32,
    operation: Operation,
}

impl DrawingTask {
    pub fn new<F>(priority: i32, operation: F) -> Self
    where
        F: FnOnce(&mut dyn DrawingSurface) -> Result<()> + 'static,
    {
        Self {
            priority,
            operation: Box::new(operation),
        }
    }

    /// A task at the default [`priority::FOREGROUND3`].
    pub fn foreground<F>(operation: F) -> Self
    where
        F: FnOnce(&mut dyn DrawingSurface) -> Result<()> + 'static,
    {
        Self::new(priority::FOREGROUND3, operation)
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Run the operation. Consumes the task, so it can only run once.
    pub fn invoke(self, surface: &mut dyn DrawingSurface) -> Result<()> {
        (self.operation)(surface)
    }
}

impl fmt::Debug for DrawingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingTask")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

struct Entry {
    key: (i32, Reverse<u64>),
    task: DrawingTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Max-priority queue of drawing tasks, stable for equal priorities.
#[derive(Default)]
pub struct DrawingTaskQueue {
    heap: BinaryHeap<Entry>,
    sequence: u64,
}

impl fmt::Debug for DrawingTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingTaskQueue")
            .field("len", &self.heap.len())
            .finish()
    }
}

impl DrawingTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: DrawingTask) {
        let key = (task.priority, Reverse(self.sequence));
        self.sequence += 1;
        self.heap.push(Entry { key, task });
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Run every task against `surface` in priority order. Stops at the
    /// first failing task.
    pub fn drain(mut self, surface: &mut dyn DrawingSurface) -> Result<usize> {
        let mut count = 0;
        while let Some(entry) = self.heap.pop() {
            entry.task.invoke(surface)?;
            count += 1;
        }
        tracing::debug!(tasks = count, "drained drawing queue");
        Ok(count)
    }
}

impl Extend<DrawingTask> for DrawingTaskQueue {
    fn extend<I: IntoIterator<Item = DrawingTask>>(&mut self, tasks: I) {
        for task in tasks {
            self.push(task);
        }
    }
}
