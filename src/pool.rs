use crate::aggregator::ResultAggregator;
use crate::config::RunConfig;
use crate::github::GitHubClient;
use crate::models::ValidationResult;
use crate::retry::{RetryPolicy, check_token};
use crate::token::Token;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Shared pull queue. Each entry is handed out exactly once.
#[derive(Debug)]
pub struct TokenQueue {
    inner: Mutex<VecDeque<(usize, Token)>>,
}

impl TokenQueue {
    pub fn new(tokens: &[Token]) -> Self {
        Self {
            inner: Mutex::new(tokens.iter().cloned().enumerate().collect()),
        }
    }

    pub fn pop(&self) -> Option<(usize, Token)> {
        // A poisoned lock only means another worker panicked mid-pop; the
        // queue itself is still consistent.
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        let queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.is_empty()
    }
}

/// Settings a worker needs, cloned into every task.
#[derive(Debug, Clone)]
struct WorkerContext {
    client: Arc<GitHubClient>,
    queue: Arc<TokenQueue>,
    policy: RetryPolicy,
    delay: Duration,
    mask: bool,
}

/// Checks every token with `config.workers` concurrent tasks and returns the
/// results in input order, one per token.
pub async fn run_pool(
    client: Arc<GitHubClient>,
    tokens: &[Token],
    config: &RunConfig,
) -> Vec<ValidationResult> {
    let labels: Vec<String> = tokens.iter().map(|t| t.display(config.mask)).collect();
    let mut aggregator = ResultAggregator::new(labels, config.min_scopes.clone());
    if tokens.is_empty() {
        return aggregator.finish();
    }

    let context = WorkerContext {
        client,
        queue: Arc::new(TokenQueue::new(tokens)),
        policy: config.retry.clone(),
        delay: config.delay,
        mask: config.mask,
    };
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ValidationResult>();

    let worker_count = config.workers.clamp(1, tokens.len());
    tracing::debug!("Starting {} workers for {} tokens", worker_count, tokens.len());

    let mut workers = JoinSet::new();
    for worker_id in 0..worker_count {
        workers.spawn(run_worker(worker_id, context.clone(), result_tx.clone()));
    }
    // The channel closes once every worker has dropped its sender.
    drop(result_tx);

    let total = aggregator.len();
    while let Some(result) = result_rx.recv().await {
        tracing::info!(
            "[{}/{}] {} -> {}{}",
            aggregator.recorded() + 1,
            total,
            result.token,
            result.status.as_str(),
            result
                .error
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        );
        aggregator.record(result);
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Worker task failed: {}", e);
        }
    }

    aggregator.finish()
}

async fn run_worker(
    worker_id: usize,
    context: WorkerContext,
    results: mpsc::UnboundedSender<ValidationResult>,
) {
    let mut checked = 0usize;
    while let Some((index, token)) = context.queue.pop() {
        let outcome = check_token(&context.client, &token, &context.policy).await;
        let result = ValidationResult::from_outcome(index, token.display(context.mask), outcome);
        if results.send(result).is_err() {
            tracing::warn!("Worker {} stopping: result channel closed", worker_id);
            return;
        }
        checked += 1;

        if !context.delay.is_zero() && !context.queue.is_empty() {
            tokio::time::sleep(context.delay).await;
        }
    }
    tracing::debug!("Worker {} finished after {} tokens", worker_id, checked);
}
