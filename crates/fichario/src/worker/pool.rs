//! Background worker pool.
//!
//! Each worker thread runs one document at a time; acquisition is CPU and
//! memory heavy, so per-worker concurrency stays at one while multiple
//! workers cover different documents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::pipeline::Pipeline;

use super::task::{ProcessTask, TaskQueue, TaskResult};

pub struct WorkerPool {
    queue: TaskQueue,
    result_receiver: Receiver<TaskResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` workers consuming from a fresh queue.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(pipeline: Arc<Pipeline>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");

        let queue = TaskQueue::bounded(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<TaskResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let task_rx = queue.consumer();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);

            let handle = thread::spawn(move || {
                run_worker(worker_id, task_rx, result_tx, shutdown_flag, worker_pipeline);
            });
            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            queue,
            result_receiver,
            workers,
            shutdown,
        }
    }

    pub fn enqueue(&self, task: ProcessTask) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }
        self.queue.enqueue(task)
    }

    pub fn try_recv_result(&self) -> Option<TaskResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<TaskResult> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Drops the queue producer so workers drain remaining tasks and exit,
    /// then joins them.
    pub fn wait(self) {
        drop(self.queue);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<ProcessTask>,
    result_sender: Sender<TaskResult>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<Pipeline>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match task_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(task) => {
                debug!("Worker {} processing document {}", worker_id, task.document_id);

                let outcome = pipeline.process(&task.document_id, task.force_ocr);
                let result = TaskResult::from_outcome(task.document_id, &outcome);

                if result_sender.send(result).is_err() {
                    error!("Worker {} failed to send result", worker_id);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} task channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
