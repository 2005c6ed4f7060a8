//! `stocky-tasks` — per-user to-do items.

pub mod task;

pub use task::{NewTask, Task, TaskPatch, TaskPriority};
