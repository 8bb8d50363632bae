//! Per-thread serialization of version allocation.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per thread id, created on demand.
///
/// Holding the guard across read-plan-commit makes version allocation for a
/// thread strictly sequential within this process.
#[derive(Debug, Default)]
pub struct ThreadLocks {
  inner: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl ThreadLocks {
  pub fn new() -> Self { Self::default() }

  pub async fn lock(&self, thread_id: i64) -> OwnedMutexGuard<()> {
    let slot = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Drop slots nobody is holding or waiting on.
      map.retain(|_, m| Arc::strong_count(m) > 1);
      map.entry(thread_id).or_default().clone()
    };
    slot.lock_owned().await
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_thread_is_exclusive() {
    let locks = Arc::new(ThreadLocks::new());
    let guard = locks.lock(7).await;

    let contender = {
      let locks = locks.clone();
      tokio::spawn(async move {
        let _g = locks.lock(7).await;
      })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!contender.is_finished());

    drop(guard);
    contender.await.unwrap();
  }

  fn slots(locks: &ThreadLocks) -> usize { locks.inner.lock().unwrap().len() }

  #[tokio::test]
  async fn different_threads_do_not_contend() {
    let locks = ThreadLocks::new();
    let _a = locks.lock(1).await;
    let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2))
      .await
      .unwrap();
    assert_eq!(slots(&locks), 2);
  }

  #[tokio::test]
  async fn idle_slots_are_pruned() {
    let locks = ThreadLocks::new();
    drop(locks.lock(1).await);
    drop(locks.lock(2).await);
    // Acquiring prunes idle slots before inserting.
    let _c = locks.lock(3).await;
    assert_eq!(slots(&locks), 1);
  }
}
