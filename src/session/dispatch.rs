use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

/// Deferred work for the UI-owning context.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// Marshals callbacks onto the context that owns the UI.
///
/// `post` must never run the task inline; it runs later on the owning context.
pub trait UiDispatcher: Send + Sync {
    fn post(&self, task: UiTask);
}

/// Task queue drained by the thread that owns it.
///
/// Any thread may post; only calls to [`UiQueue::run_pending`] or [`UiQueue::run_for`] execute
/// tasks, on the calling thread.
pub struct UiQueue {
    tx: Sender<UiTask>,
    rx: Receiver<UiTask>,
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Run every task queued so far and return how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for a task, then drain the queue. Returns how many tasks ran.
    pub fn run_for(&self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl UiDispatcher for UiQueue {
    fn post(&self, task: UiTask) {
        // The queue owns a receiver, so the channel cannot be disconnected here.
        let _ = self.tx.send(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_only_when_drained() {
        let q = UiQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            q.post(Box::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(q.pending(), 3);
        assert_eq!(q.run_pending(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tasks_posted_from_other_threads_run_on_the_owner() {
        let q = Arc::new(UiQueue::new());
        let owner = std::thread::current().id();
        let ran_on = Arc::new(std::sync::Mutex::new(None));
        {
            let q = q.clone();
            let ran_on = ran_on.clone();
            std::thread::spawn(move || {
                q.post(Box::new(move || {
                    *ran_on.lock().unwrap() = Some(std::thread::current().id());
                }));
            })
            .join()
            .unwrap();
        }
        assert_eq!(q.run_for(Duration::from_secs(1)), 1);
        assert_eq!(*ran_on.lock().unwrap(), Some(owner));
    }

    #[test]
    fn run_for_times_out_when_idle() {
        let q = UiQueue::new();
        assert_eq!(q.run_for(Duration::from_millis(5)), 0);
    }
}
