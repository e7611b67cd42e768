use std::pin::Pin;

use futures::{Stream, TryStreamExt};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type ItemStream<T> = Pin<Box<dyn Stream<Item = Result<T, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> ItemStream<T>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<T, PipelineError>> + Send + Unpin + 'static;
}

/// Drain a source into memory, stopping at the first error.
pub async fn collect_series<T, S>(source: &S) -> Result<Vec<T>, PipelineError>
where
    T: Send + 'static,
    S: Source<T> + ?Sized,
{
    source.stream().await.try_collect().await
}

/// Feed an in-memory slice through a sink.
pub async fn drain_into<T, K>(sink: &K, items: &[T]) -> Result<(), PipelineError>
where
    T: Clone + Send + 'static,
    K: Sink<T>,
{
    sink.run(futures::stream::iter(items.to_vec().into_iter().map(Ok::<T, PipelineError>)))
        .await
}
