//! Deferred task queue.
//!
//! Resource definitions can postpone work (typically artifact builds) until
//! after the definition phase completes. Tasks are queued during definition,
//! then drained exactly once in registration order. Registering a task after
//! the drain has begun is a hard error; the queue records the offending label
//! so the drain loop can surface it.

use std::collections::VecDeque;

use futures::future::BoxFuture;
use thiserror::Error;

use super::{App, DefinitionError};

/// Boxed deferred task body, invoked with the application during the drain.
pub(crate) type TaskFn =
  Box<dyn for<'a> FnOnce(&'a mut App) -> BoxFuture<'a, Result<(), DefinitionError>> + Send>;

/// A queued task with its diagnostic label.
pub(crate) struct DeferredTask {
  /// Label identifying the task in errors and logs.
  pub label: String,
  /// Task body.
  pub run: TaskFn,
}

/// Errors that can occur while draining deferred tasks.
#[derive(Debug, Error)]
pub enum DeferredError {
  /// A deferred task returned an error.
  #[error("deferred task {label} failed: {source}")]
  TaskFailed {
    /// Label of the failed task.
    label: String,
    /// Error returned by the task.
    #[source]
    source: DefinitionError,
  },

  /// A task was registered after draining began.
  #[error("deferred task {0} was registered after draining began")]
  LateRegistration(String),

  /// The queue was already drained.
  #[error("deferred tasks were already drained")]
  AlreadyDrained,
}

/// Queue lifecycle. Tasks may only be registered while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Open,
  Draining,
  Drained,
}

/// FIFO queue of deferred tasks with a single-drain lifecycle.
pub(crate) struct DeferredQueue {
  tasks: VecDeque<DeferredTask>,
  phase: Phase,
  /// First label registered after draining began, if any.
  late: Option<String>,
}

impl DeferredQueue {
  /// Create an empty open queue.
  pub fn new() -> Self {
    Self {
      tasks: VecDeque::new(),
      phase: Phase::Open,
      late: None,
    }
  }

  /// Register a task.
  ///
  /// While the queue is open the task is appended. Once draining has begun
  /// the task is dropped and its label recorded; the drain loop turns that
  /// record into an error after the currently running task completes.
  pub fn defer(&mut self, label: impl Into<String>, run: TaskFn) {
    let label = label.into();
    if self.phase == Phase::Open {
      self.tasks.push_back(DeferredTask { label, run });
    } else if self.late.is_none() {
      self.late = Some(label);
    }
  }

  /// Transition from open to draining.
  pub fn begin_drain(&mut self) -> Result<(), DeferredError> {
    if self.phase != Phase::Open {
      return Err(DeferredError::AlreadyDrained);
    }
    self.phase = Phase::Draining;
    Ok(())
  }

  /// Take the next task in registration order.
  pub fn next_task(&mut self) -> Option<DeferredTask> {
    self.tasks.pop_front()
  }

  /// Mark the drain complete.
  pub fn finish_drain(&mut self) {
    self.phase = Phase::Drained;
  }

  /// Label of the first late registration, if one occurred.
  pub fn late_label(&self) -> Option<&str> {
    self.late.as_deref()
  }

  /// Number of queued tasks.
  pub fn len(&self) -> usize {
    self.tasks.len()
  }
}
