//! Quote Session
//!
//! Recomputes the swap quote whenever the source token, destination token or
//! amount changes. Computations run concurrently, but only the most recently
//! requested one may publish: a slow quote for an old amount never replaces
//! the result for a newer one (last-requested-wins, not last-completed-wins).
//!
//! The generation counter is only touched while holding the watch channel's
//! write lock, so "is this still the latest request?" and "publish" happen
//! atomically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{SwapQuote, SwapQuoter};
use crate::ports::TokenDirectory;

/// What the swap form should currently display
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteState {
    /// Nothing entered yet
    Idle,
    /// A computation is in flight
    Pending,
    Ready(SwapQuote),
    /// Inline quote error (unsupported pair, missing rate, unknown token)
    Failed(String),
}

impl QuoteState {
    pub fn quote(&self) -> Option<&SwapQuote> {
        match self {
            QuoteState::Ready(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QuoteState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

pub struct QuoteSession {
    directory: Arc<dyn TokenDirectory>,
    quoter: SwapQuoter,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<QuoteState>>,
}

impl QuoteSession {
    pub fn new(directory: Arc<dyn TokenDirectory>, quoter: SwapQuoter) -> Self {
        let (state, _) = watch::channel(QuoteState::Idle);
        Self {
            directory,
            quoter,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> QuoteState {
        self.state.borrow().clone()
    }

    /// Number of requests made so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start recomputing for new inputs. The handle resolves to `true` if the
    /// result was published, `false` if a newer request superseded it.
    pub fn request(&self, from: &str, to: &str, amount: &str) -> JoinHandle<bool> {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = QuoteState::Pending;
        });

        let directory = Arc::clone(&self.directory);
        let latest = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let quoter = self.quoter;
        let (from, to, amount) = (from.to_string(), to.to_string(), amount.to_string());

        tokio::spawn(async move {
            let next = compute(directory.as_ref(), quoter, &from, &to, &amount).await;

            let published = state.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *current = next.clone();
                true
            });

            if published {
                tracing::debug!("Quote #{} published: {:?}", generation, next);
            } else {
                tracing::debug!("Quote #{} superseded, discarding", generation);
            }
            published
        })
    }
}

async fn compute(
    directory: &dyn TokenDirectory,
    quoter: SwapQuoter,
    from: &str,
    to: &str,
    amount: &str,
) -> QuoteState {
    if from.is_empty() || to.is_empty() || amount.trim().is_empty() {
        return QuoteState::Idle;
    }

    let from = match directory.resolve(from).await {
        Ok(token) => token,
        Err(e) => return QuoteState::Failed(e.to_string()),
    };
    let to = match directory.resolve(to).await {
        Ok(token) => token,
        Err(e) => return QuoteState::Failed(e.to_string()),
    };

    match quoter.quote(&from, &to, amount) {
        Ok(Some(quote)) => QuoteState::Ready(quote),
        Ok(None) => QuoteState::Idle,
        Err(e) => {
            tracing::warn!("Quote {} -> {} failed: {}", from.identifier, to.identifier, e);
            QuoteState::Failed(e.to_string())
        }
    }
}
