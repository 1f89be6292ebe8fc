//! Processing tasks and the queue that carries them.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::WorkerError;
use crate::pipeline::ProcessOutcome;

/// A request to process one document.
#[derive(Debug, Clone)]
pub struct ProcessTask {
    pub document_id: String,
    pub force_ocr: bool,
}

impl ProcessTask {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            force_ocr: false,
        }
    }

    pub fn with_force_ocr(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            force_ocr: true,
        }
    }
}

/// What became of a task.
#[derive(Debug)]
pub struct TaskResult {
    pub document_id: String,
    pub success: bool,
    pub skipped: bool,
    pub error: Option<String>,
}

impl TaskResult {
    pub fn from_outcome(
        document_id: String,
        outcome: &Result<ProcessOutcome, crate::pipeline::PipelineError>,
    ) -> Self {
        match outcome {
            Ok(ProcessOutcome::Processed { .. }) => Self {
                document_id,
                success: true,
                skipped: false,
                error: None,
            },
            Ok(ProcessOutcome::Skipped(_)) => Self {
                document_id,
                success: true,
                skipped: true,
                error: None,
            },
            Err(e) => Self {
                document_id,
                success: false,
                skipped: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Bounded task channel decoupling upload handling from processing.
///
/// Both ends are cheaply cloneable; producers `enqueue`, workers `consume`.
#[derive(Clone)]
pub struct TaskQueue {
    sender: Sender<ProcessTask>,
    receiver: Receiver<ProcessTask>,
}

impl TaskQueue {
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    pub fn enqueue(&self, task: ProcessTask) -> Result<(), WorkerError> {
        self.sender.send(task).map_err(|_| WorkerError::ChannelClosed)
    }

    /// Blocks until a task arrives or every producer is gone.
    pub fn consume(&self) -> Option<ProcessTask> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for a task, so workers can poll for shutdown.
    pub fn consume_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ProcessTask, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// A bare consumer end for worker threads. Holding only the receiver
    /// lets dropping the pool's queue disconnect the workers.
    pub(crate) fn consumer(&self) -> Receiver<ProcessTask> {
        self.receiver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_enqueue_consume_order() {
        let queue = TaskQueue::bounded(4);
        queue.enqueue(ProcessTask::new("a")).unwrap();
        queue.enqueue(ProcessTask::with_force_ocr("b")).unwrap();

        let first = queue.consume().unwrap();
        assert_eq!(first.document_id, "a");
        assert!(!first.force_ocr);

        let second = queue.consume().unwrap();
        assert_eq!(second.document_id, "b");
        assert!(second.force_ocr);
    }

    #[test]
    fn test_consume_timeout_when_empty() {
        let queue = TaskQueue::bounded(1);
        let result = queue.consume_timeout(Duration::from_millis(10));
        assert!(matches!(result, Err(RecvTimeoutError::Timeout)));
    }

    #[test]
    fn test_task_result_from_outcomes() {
        let ok: Result<ProcessOutcome, crate::pipeline::PipelineError> =
            Ok(ProcessOutcome::Processed {
                ocr_used: false,
                fields_found: 2,
                fields_missing: 11,
            });
        let result = TaskResult::from_outcome("doc".to_string(), &ok);
        assert!(result.success);
        assert!(!result.skipped);

        let err: Result<ProcessOutcome, crate::pipeline::PipelineError> =
            Err(crate::pipeline::PipelineError::DocumentNotFound("doc".to_string()));
        let result = TaskResult::from_outcome("doc".to_string(), &err);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("doc"));
    }
}
