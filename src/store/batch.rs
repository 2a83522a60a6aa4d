//! Join-all fold combinator for batched store operations.

use futures::future::join_all;
use std::future::Future;

/// Await every future concurrently and fold the results with `combine`.
///
/// Returns `default` untouched for an empty list. Individual futures encode
/// their own failure in the resolved value (e.g., an insert resolving to 0),
/// so the fold itself never fails and a batch is never aborted mid-way.
pub async fn join_fold<A, R, C, F>(default: A, combine: C, futures: Vec<F>) -> A
where
  C: Fn(A, R) -> A,
  F: Future<Output = R>,
{
  join_all(futures).await.into_iter().fold(default, combine)
}
