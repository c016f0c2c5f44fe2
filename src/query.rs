//! Token-stamped async requests with "latest request wins" semantics.
//!
//! A `Query<T>` is one request lane. Every call to `issue()` spawns the
//! future on the tokio runtime and stamps it with a fresh `RequestToken`.
//! Replies travel back over a channel; only the reply carrying the latest
//! token is handed to the caller, everything else is counted and dropped.
//! Superseded futures are not aborted, their replies are just ignored.
//!
//! # Example
//!
//! ```ignore
//! let mut query = Query::new("orders");
//! query.issue(async move { repo.list_paged(1, 10, &filters).await });
//! query.issue(async move { repo.list_paged(2, 10, &filters).await });
//!
//! // In event loop tick
//! if let Some(result) = query.poll() {
//!     // Only the page 2 reply ever gets here
//! }
//! ```

use color_eyre::Result;
use std::fmt;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::debug;

/// Monotonically increasing stamp on every outbound request of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A reply tagged with the token of the request that produced it
struct Stamped<T> {
  token: RequestToken,
  result: Result<T>,
}

pub struct Query<T> {
  label: &'static str,
  tx: mpsc::UnboundedSender<Stamped<T>>,
  rx: mpsc::UnboundedReceiver<Stamped<T>>,
  latest: RequestToken,
  pending: bool,
  discarded: u64,
}

impl<T: Send + 'static> Query<T> {
  pub fn new(label: &'static str) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      label,
      tx,
      rx,
      latest: RequestToken::default(),
      pending: false,
      discarded: 0,
    }
  }

  /// Spawn `future` as the lane's newest request.
  ///
  /// Any request still in flight becomes stale.
  pub fn issue<Fut>(&mut self, future: Fut) -> RequestToken
  where
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let token = self.bump();
    self.pending = true;

    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the lane may have been dropped
      let _ = tx.send(Stamped { token, result });
    });

    debug!(lane = self.label, token = %token, "request issued");
    token
  }

  /// Make every in-flight request stale without issuing a new one.
  ///
  /// Used when a reply has been produced synchronously.
  pub fn supersede(&mut self) {
    if self.pending {
      debug!(lane = self.label, token = %self.latest, "in-flight request superseded");
    }
    self.bump();
    self.pending = false;
  }

  pub fn is_pending(&self) -> bool {
    self.pending
  }

  #[cfg(test)]
  pub fn latest(&self) -> RequestToken {
    self.latest
  }

  /// Replies dropped because a newer request had been issued.
  #[cfg(test)]
  pub fn discarded(&self) -> u64 {
    self.discarded
  }

  /// Non-blocking: hand back the latest reply if it has arrived.
  pub fn poll(&mut self) -> Option<Result<T>> {
    while let Ok(stamped) = self.rx.try_recv() {
      if let Some(result) = self.accept(stamped) {
        return Some(result);
      }
    }
    None
  }

  /// Wait for the latest reply. Returns `None` when nothing is pending.
  pub async fn settled(&mut self) -> Option<Result<T>> {
    while self.pending {
      let stamped = self.rx.recv().await?;
      if let Some(result) = self.accept(stamped) {
        return Some(result);
      }
    }
    None
  }

  fn bump(&mut self) -> RequestToken {
    self.latest = RequestToken(self.latest.0 + 1);
    self.latest
  }

  fn accept(&mut self, stamped: Stamped<T>) -> Option<Result<T>> {
    if self.pending && stamped.token == self.latest {
      self.pending = false;
      Some(stamped.result)
    } else {
      self.discarded += 1;
      debug!(
        lane = self.label,
        token = %stamped.token,
        latest = %self.latest,
        discarded = self.discarded,
        "stale response discarded"
      );
      None
    }
  }
}

impl<T> fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Query")
      .field("label", &self.label)
      .field("latest", &self.latest)
      .field("pending", &self.pending)
      .field("discarded", &self.discarded)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;
  use std::time::Duration;

  #[tokio::test(start_paused = true)]
  async fn test_query_success() {
    let mut query = Query::new("test");
    assert!(!query.is_pending());

    query.issue(async { Ok(vec![1, 2, 3]) });
    assert!(query.is_pending());

    let result = query.settled().await.unwrap().unwrap();
    assert_eq!(result, vec![1, 2, 3]);
    assert!(!query.is_pending());
  }

  #[tokio::test(start_paused = true)]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new("test");
    query.issue(async { Err(eyre!("Something went wrong")) });

    let err = query.settled().await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Something went wrong");
  }

  #[tokio::test(start_paused = true)]
  async fn test_slow_stale_reply_is_discarded() {
    let mut query = Query::new("test");
    query.issue(async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok(1)
    });
    query.issue(async {
      tokio::time::sleep(Duration::from_millis(10)).await;
      Ok(2)
    });

    assert_eq!(query.settled().await.unwrap().unwrap(), 2);

    // The first reply still arrives, and is dropped
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(query.poll().is_none());
    assert_eq!(query.discarded(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fast_stale_reply_is_discarded() {
    let mut query = Query::new("test");
    query.issue(async { Ok(1) });
    query.issue(async {
      tokio::time::sleep(Duration::from_millis(50)).await;
      Ok(2)
    });

    assert_eq!(query.settled().await.unwrap().unwrap(), 2);
    assert_eq!(query.discarded(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_supersede_drops_in_flight() {
    let mut query = Query::new("test");
    let first = query.issue(async { Ok(1) });
    query.supersede();
    assert!(query.latest() > first);
    assert!(!query.is_pending());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(query.poll().is_none());
    assert_eq!(query.discarded(), 1);
    assert!(query.settled().await.is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_poll_before_reply_is_none() {
    let mut query = Query::new("test");
    query.issue(async {
      tokio::time::sleep(Duration::from_millis(50)).await;
      Ok(42)
    });

    assert!(query.poll().is_none());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(query.poll().unwrap().unwrap(), 42);
  }
}
