//! A FIFO channel for grid updates to hand [`TileJob`]s to the fetch worker.

use super::tile_grid::TileJob;
use crate::util::lock;
use anyhow::Context;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Number of jobs sent but not yet completed, shared by both ends of the
/// channel.
#[derive(Default)]
struct Backlog {
    /// Pending job count.
    pending: Mutex<usize>,
    /// Notified whenever the pending count drops to zero.
    idle: Condvar,
    /// Set once the sending side is closed.
    closed: AtomicBool,
}

/// Sending side of the channel, for grid updates to enqueue jobs.
pub struct JobSender {
    tx: Sender<TileJob>,
    backlog: Arc<Backlog>,
}

/// Receiving side of the channel, drained by the fetch worker.
pub struct JobReceiver {
    rx: Receiver<TileJob>,
    backlog: Arc<Backlog>,
}

/// Constructs an unbounded channel to communicate [`TileJob`]s.
pub fn job_channel() -> (JobSender, JobReceiver) {
    let (tx, rx) = channel();
    let backlog_tx = Arc::new(Backlog::default());
    let backlog_rx = backlog_tx.clone();
    (
        JobSender {
            tx,
            backlog: backlog_tx,
        },
        JobReceiver {
            rx,
            backlog: backlog_rx,
        },
    )
}

impl JobSender {
    /// Enqueues the given jobs, preserving their order.
    pub fn send_jobs(&self, jobs: Vec<TileJob>) -> anyhow::Result<()> {
        for job in jobs {
            *lock(&self.backlog.pending) += 1;
            if let Err(e) = self.tx.send(job) {
                self.backlog.complete();
                return Err(e).context("Failed to send tile job on the channel");
            }
        }
        Ok(())
    }

    /// Returns the number of jobs enqueued but not yet completed.
    pub fn pending(&self) -> usize {
        *lock(&self.backlog.pending)
    }

    /// Blocks until all enqueued jobs are completed, or the timeout elapses.
    ///
    /// Returns whether the channel became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut pending = lock(&self.backlog.pending);
        while *pending != 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            pending = match self.backlog.idle.wait_timeout(pending, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }

    /// Closes the channel. The receiving side still yields the jobs in flight,
    /// but reports them as closed so that they can be discarded.
    pub fn close(self) {
        debug!("Closing JobSender with {} pending jobs", self.pending());
        self.backlog.closed.store(true, Ordering::SeqCst);
    }
}

impl JobReceiver {
    /// Blocks until the next job is available, or returns `None` once the
    /// sending side is dropped and all jobs were received.
    pub fn recv(&self) -> Option<TileJob> {
        self.rx.recv().ok()
    }

    /// Marks one received job as completed.
    pub fn complete(&self) {
        self.backlog.complete();
    }

    /// Checks whether the sending side was closed.
    pub fn is_closed(&self) -> bool {
        self.backlog.closed.load(Ordering::SeqCst)
    }
}

impl Backlog {
    /// Decrements the pending count, waking up waiters when it reaches zero.
    fn complete(&self) {
        let mut pending = lock(&self.pending);
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::tile_grid::GridCell;
    use crate::map::tiles::TileIndex;
    use std::thread;

    fn fetch(gx: usize, x: i32) -> TileJob {
        TileJob::Fetch {
            cell: GridCell { gx, gy: 0 },
            index: TileIndex { z: 3, x, y: 1 },
            generation: 1,
        }
    }

    #[test]
    fn job_channel_is_fifo() {
        let (tx, rx) = job_channel();
        let moved = TileJob::Move {
            src: GridCell { gx: 1, gy: 0 },
            dst: GridCell { gx: 0, gy: 0 },
        };
        tx.send_jobs(vec![moved, fetch(0, 1), fetch(1, 2)]).unwrap();
        tx.send_jobs(vec![fetch(2, 3)]).unwrap();
        drop(tx);

        assert_eq!(rx.recv(), Some(moved));
        assert_eq!(rx.recv(), Some(fetch(0, 1)));
        assert_eq!(rx.recv(), Some(fetch(1, 2)));
        assert_eq!(rx.recv(), Some(fetch(2, 3)));
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn job_channel_tracks_pending_jobs() {
        let (tx, rx) = job_channel();
        tx.send_jobs(vec![fetch(0, 1), fetch(1, 2)]).unwrap();
        assert_eq!(tx.pending(), 2);
        assert!(!tx.wait_idle(Duration::from_millis(10)));

        rx.recv().unwrap();
        rx.complete();
        assert_eq!(tx.pending(), 1);
        rx.recv().unwrap();
        rx.complete();
        assert_eq!(tx.pending(), 0);
        assert!(tx.wait_idle(Duration::from_millis(10)));
    }

    #[test]
    fn job_channel_wakes_up_idle_waiters() {
        let (tx, rx) = job_channel();
        tx.send_jobs(vec![fetch(0, 1), fetch(1, 2), fetch(2, 3)]).unwrap();

        let worker = thread::spawn(move || {
            while let Some(_job) = rx.recv() {
                rx.complete();
            }
        });

        assert!(tx.wait_idle(Duration::from_secs(10)));
        drop(tx);
        worker.join().unwrap();
    }

    #[test]
    fn job_channel_close() {
        let (tx, rx) = job_channel();
        tx.send_jobs(vec![fetch(0, 1)]).unwrap();
        assert!(!rx.is_closed());
        tx.close();
        assert!(rx.is_closed());
        // Jobs in flight are still delivered, then the channel ends.
        assert_eq!(rx.recv(), Some(fetch(0, 1)));
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn job_channel_send_after_receiver_dropped() {
        let (tx, rx) = job_channel();
        drop(rx);
        assert!(tx.send_jobs(vec![fetch(0, 1)]).is_err());
        assert_eq!(tx.pending(), 0);
    }
}
