use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

type CallbackFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type EmergencyCallback = Arc<dyn Fn() -> CallbackFuture + Send + Sync>;

/// Sticky emergency state.
///
/// Entry fires every registered callback exactly once per episode; a failing
/// callback is logged and never prevents the rest from running. There is no
/// automatic exit: clearing requires an explicit [`EmergencyHandler::reset`]
/// after operator acknowledgement.
#[derive(Default)]
pub struct EmergencyHandler {
    engaged: AtomicBool,
    activations: AtomicU64,
    callbacks: Mutex<Vec<EmergencyCallback>>,
}

impl EmergencyHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&self, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let callback: EmergencyCallback = Arc::new(move || Box::pin(callback()));
        self.callbacks
            .lock()
            .expect("emergency callbacks lock poisoned")
            .push(callback);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }

    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::SeqCst)
    }

    /// Enter emergency mode. Returns true on the transition that actually
    /// engaged it; repeat calls while engaged are no-ops and fire nothing.
    pub async fn engage(&self) -> bool {
        if self.engaged.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.activations.fetch_add(1, Ordering::SeqCst);
        tracing::error!("EMERGENCY MODE ACTIVATED");

        // Clone the handles out so no lock is held across the awaits.
        let callbacks: Vec<EmergencyCallback> = self
            .callbacks
            .lock()
            .expect("emergency callbacks lock poisoned")
            .clone();

        for callback in callbacks {
            if let Err(e) = callback().await {
                tracing::error!("emergency callback error: {e:#}");
            }
        }
        true
    }

    /// Manual-only exit from emergency mode.
    pub fn reset(&self) {
        if self.engaged.swap(false, Ordering::SeqCst) {
            tracing::info!("emergency mode reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn engages_once_per_episode() {
        let handler = EmergencyHandler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        handler.register(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert!(handler.engage().await);
        assert!(!handler.engage().await);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(handler.activations(), 1);

        handler.reset();
        assert!(!handler.is_engaged());
        assert!(handler.engage().await);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(handler.activations(), 2);
    }

    #[tokio::test]
    async fn failing_callback_does_not_stop_the_rest() {
        let handler = EmergencyHandler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        handler.register(|| async { Err(anyhow::anyhow!("callback exploded")) });
        let counter = fired.clone();
        handler.register(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert!(handler.engage().await);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(handler.is_engaged());
    }

    #[tokio::test]
    async fn reset_without_engagement_is_a_noop() {
        let handler = EmergencyHandler::new();
        handler.reset();
        assert!(!handler.is_engaged());
        assert_eq!(handler.activations(), 0);
    }
}
