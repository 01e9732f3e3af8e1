use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use common::EntryPath;

/// Exclusive locks over path subtrees.
///
/// A held path blocks every path that is within it or that it is within.
/// Unrelated paths never wait on each other.
#[derive(Debug, Default)]
pub struct PrefixLocks {
    held: Mutex<Vec<EntryPath>>,
    released: Notify,
}

impl PrefixLocks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until none of `paths` overlaps a held path, then hold them all.
    pub async fn acquire(self: &Arc<Self>, paths: Vec<EntryPath>) -> PrefixGuard {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed.
            notified.as_mut().enable();

            {
                let mut held = self.held.lock();
                let blocked = paths
                    .iter()
                    .any(|want| held.iter().any(|have| want.overlaps(have)));
                if !blocked {
                    held.extend(paths.iter().cloned());
                    return PrefixGuard {
                        locks: Arc::clone(self),
                        paths,
                    };
                }
            }

            tracing::trace!(?paths, "waiting for overlapping operation");
            notified.await;
        }
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }
}

#[derive(Debug)]
pub struct PrefixGuard {
    locks: Arc<PrefixLocks>,
    paths: Vec<EntryPath>,
}

impl Drop for PrefixGuard {
    fn drop(&mut self) {
        {
            let mut held = self.locks.held.lock();
            for path in &self.paths {
                if let Some(pos) = held.iter().position(|h| h == path) {
                    held.swap_remove(pos);
                }
            }
        }
        self.locks.released.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn p(s: &str) -> EntryPath {
        EntryPath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_disjoint_paths_do_not_block() {
        let locks = PrefixLocks::new();
        let _a = locks.acquire(vec![p("a")]).await;
        let _ab = tokio::time::timeout(Duration::from_millis(100), locks.acquire(vec![p("ab")]))
            .await
            .expect("sibling with shared text prefix must not block");
        assert_eq!(locks.held_count(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_paths_wait_for_release() {
        let locks = PrefixLocks::new();
        let guard = locks.acquire(vec![p("a")]).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(vec![p("a/deep/file.txt")]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should proceed after release")
            .unwrap();
        assert_eq!(locks.held_count(), 0);
    }
}
