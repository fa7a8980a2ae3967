use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// 带取消的有限并发执行，结果顺序与输入一致
///
/// 取消后尚未拿到许可的任务不再启动，对应位置返回`None`；已启动的任务照常执行完毕。
pub async fn do_parallel_with_cancel<F, T>(
    futures: Vec<F>,
    max_concurrent: usize,
    cancel: &CancellationToken,
) -> Vec<Option<T>>
where
    F: Future<Output = T>,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let controlled_futures: Vec<_> = futures
        .into_iter()
        .map(|fut| {
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            async move {
                let _permit = tokio::select! {
                    permit = semaphore.acquire() => permit.ok(),
                    _ = cancel.cancelled() => return None,
                };
                if cancel.is_cancelled() {
                    return None;
                }
                Some(fut.await)
            }
        })
        .collect();

    join_all(controlled_futures).await
}
