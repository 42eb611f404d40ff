//! FIFO hand-off queue between pipeline stages.
//!
//! [`WorkQueue`] connects the dispatcher to the downloaders (jobs) and the
//! downloaders to the processors (raw pages). Consumers take items with a
//! bounded wait so they can re-check their exit condition regularly instead
//! of blocking forever. Every taken item is acknowledged with
//! [`WorkQueue::task_done`]; [`WorkQueue::join`] resolves once every pushed
//! item has been acknowledged.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    /// Pushed but not yet acknowledged.
    unfinished: Mutex<usize>,
    available: Notify,
    drained: Notify,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            unfinished: Mutex::new(0),
            available: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Append an item and wake one waiting consumer.
    pub fn push(&self, item: T) {
        *self.unfinished.lock() += 1;
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Take the oldest item, waiting at most `wait` for one to arrive.
    ///
    /// Returns `None` when the wait elapsed with the queue still empty.
    pub async fn take(&self, wait: Duration) -> Option<T> {
        let deadline = Instant::now() + wait;
        loop {
            let item = self.items.lock().pop_front();
            if item.is_some() {
                return item;
            }
            if timeout_at(deadline, self.available.notified()).await.is_err() {
                // One last look; an item may have landed as the timer fired.
                return self.items.lock().pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Acknowledge one taken item as fully handled.
    pub fn task_done(&self) {
        let mut unfinished = self.unfinished.lock();
        if *unfinished == 0 {
            warn!("task_done called more times than items were pushed");
            return;
        }
        *unfinished -= 1;
        if *unfinished == 0 {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every pushed item has been acknowledged.
    pub async fn join(&self) {
        loop {
            let drained = self.drained.notified();
            tokio::pin!(drained);
            // Register before checking so a notify between the check and
            // the await is not lost.
            drained.as_mut().enable();
            if *self.unfinished.lock() == 0 {
                return;
            }
            drained.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_take_is_fifo() {
        let queue = WorkQueue::new();
        for i in 0..3 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 3);
        for i in 0..3 {
            assert_eq!(queue.take(Duration::from_millis(10)).await, Some(i));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_take_times_out_on_empty_queue() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        let started = std::time::Instant::now();
        assert_eq!(queue.take(Duration::from_millis(30)).await, None);
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_take_wakes_on_push() {
        let queue = Arc::new(WorkQueue::new());
        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.push("page");
        });
        assert_eq!(queue.take(Duration::from_secs(5)).await, Some("page"));
    }

    #[tokio::test]
    async fn test_join_waits_for_acknowledgements() {
        let queue = Arc::new(WorkQueue::new());
        queue.push(1);
        queue.push(2);

        let consumer = Arc::clone(&queue);
        let worker = tokio::spawn(async move {
            while let Some(_item) = consumer.take(Duration::from_millis(10)).await {
                tokio::time::sleep(Duration::from_millis(5)).await;
                consumer.task_done();
            }
        });

        tokio::time::timeout(Duration::from_secs(5), queue.join())
            .await
            .expect("join should resolve once both items are acknowledged");
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_join_on_fresh_queue_returns_immediately() {
        let queue: WorkQueue<u8> = WorkQueue::new();
        tokio::time::timeout(Duration::from_millis(100), queue.join())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_extra_task_done_is_ignored() {
        let queue = WorkQueue::new();
        queue.push(());
        queue.task_done();
        queue.task_done();
        queue.push(());
        // One outstanding item again, so join must not resolve yet.
        let pending = tokio::time::timeout(Duration::from_millis(20), queue.join()).await;
        assert!(pending.is_err());
    }
}
