//! Lazily loaded panels keyed by view id.
//!
//! A loader is only invoked when its view becomes active. Transient load
//! failures are retried with backoff; once the budget is spent the view
//! shows a placeholder until the user retries it explicitly.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;

use devcore_core::config::RegistryConfig;
use devcore_core::FeatureRegistry;
use devcore_core::PanelState;
use devcore_core::TransitionError;
use devcore_core::ViewId;

use crate::error::LoadError;
use crate::retry::RetryPolicy;

pub const UNAVAILABLE_MESSAGE: &str = "This feature is currently unavailable.";

type Loader<P> = Arc<dyn Fn() -> BoxFuture<'static, Result<P, LoadError>> + Send + Sync>;

#[derive(Debug)]
pub enum Activation<P> {
    Ready(Arc<P>),
    Placeholder { view: ViewId, message: String },
}

impl<P> Activation<P> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn panel(&self) -> Option<&Arc<P>> {
        match self {
            Self::Ready(panel) => Some(panel),
            Self::Placeholder { .. } => None,
        }
    }
}

struct Slot<P> {
    state: PanelState,
    panel: Option<Arc<P>>,
}

impl<P> Default for Slot<P> {
    fn default() -> Self {
        Self {
            state: PanelState::Unloaded,
            panel: None,
        }
    }
}

pub struct ViewRegistry<P> {
    loaders: HashMap<ViewId, Loader<P>>,
    slots: HashMap<ViewId, Slot<P>>,
    active: Option<ViewId>,
    max_attempts: u32,
    backoff: RetryPolicy,
}

impl<P: Send + Sync + 'static> ViewRegistry<P> {
    pub fn new(config: &RegistryConfig) -> Self {
        let max_attempts = config.max_load_attempts.max(1);
        Self {
            loaders: HashMap::new(),
            slots: HashMap::new(),
            active: None,
            max_attempts,
            backoff: RetryPolicy {
                max_retries: max_attempts - 1,
                base_delay: config.retry_delay(),
            },
        }
    }

    pub fn register<F, Fut>(&mut self, view: impl Into<String>, loader: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, LoadError>> + Send + 'static,
    {
        let loader: Loader<P> = Arc::new(move || loader().boxed());
        self.loaders.insert(ViewId::new(view), loader);
    }

    pub fn contains(&self, view: &ViewId) -> bool {
        self.loaders.contains_key(view)
    }

    /// Catalog features with no registered panel.
    pub fn missing_features(&self) -> Vec<&'static str> {
        FeatureRegistry::list()
            .iter()
            .map(|feature| feature.id)
            .filter(|id| !self.loaders.contains_key(&ViewId::from(*id)))
            .collect()
    }

    pub fn state(&self, view: &ViewId) -> PanelState {
        self.slots
            .get(view)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    pub fn active(&self) -> Option<&ViewId> {
        self.active.as_ref()
    }

    /// Makes `view` the active panel, loading it if needed. Never fails:
    /// unknown or broken views resolve to a placeholder.
    pub async fn activate(&mut self, view: &ViewId) -> Activation<P> {
        if self.active.as_ref() != Some(view) {
            if let Some(previous) = self.active.take() {
                self.unload(&previous);
            }
            self.active = Some(view.clone());
        }

        let Some(loader) = self.loaders.get(view).cloned() else {
            tracing::warn!(view = %view, "no panel registered");
            return placeholder(view, &LoadError::UnknownView(view.to_string()));
        };

        let slot = self.slots.entry(view.clone()).or_default();
        if let (PanelState::Ready { .. }, Some(panel)) = (&slot.state, &slot.panel) {
            return Activation::Ready(Arc::clone(panel));
        }
        if let PanelState::Unavailable { last_error, .. } = &slot.state {
            return Activation::Placeholder {
                view: view.clone(),
                message: format!("{UNAVAILABLE_MESSAGE} ({last_error})"),
            };
        }
        // A ready state without a cached panel cannot be reused.
        slot.state.unload();

        match self.load(view, loader).await {
            Ok(activation) => activation,
            Err(err) => {
                tracing::error!(view = %view, error = %err, "panel lifecycle out of sync");
                if let Some(slot) = self.slots.get_mut(view) {
                    *slot = Slot::default();
                }
                Activation::Placeholder {
                    view: view.clone(),
                    message: UNAVAILABLE_MESSAGE.to_string(),
                }
            }
        }
    }

    async fn load(&mut self, view: &ViewId, loader: Loader<P>) -> Result<Activation<P>, TransitionError> {
        loop {
            let attempt = self.slot(view).state.begin_load()?;
            tracing::debug!(view = %view, attempt, "loading panel");

            match loader().await {
                Ok(panel) => {
                    let panel = Arc::new(panel);
                    let slot = self.slot(view);
                    slot.state.load_succeeded()?;
                    slot.panel = Some(Arc::clone(&panel));
                    tracing::debug!(view = %view, attempts = attempt, "panel ready");
                    return Ok(Activation::Ready(panel));
                }
                Err(err) => {
                    let max_attempts = self.max_attempts;
                    let slot = self.slot(view);
                    slot.state.load_failed(err.to_string(), max_attempts)?;
                    if slot.state.is_terminal() {
                        tracing::error!(view = %view, attempts = attempt, error = %err, "panel unavailable");
                        return Ok(placeholder(view, &err));
                    }
                    let delay = self.backoff.delay(attempt - 1);
                    tracing::warn!(
                        view = %view,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "panel load failed, retrying"
                    );
                    sleep_unless_zero(delay).await;
                }
            }
        }
    }

    /// Clears a placeholder so the next activation starts a fresh load cycle.
    pub fn retry(&mut self, view: &ViewId) -> Result<(), TransitionError> {
        self.slot(view).state.retry()
    }

    fn unload(&mut self, view: &ViewId) {
        if let Some(slot) = self.slots.get_mut(view) {
            slot.state.unload();
            if !slot.state.is_ready() {
                slot.panel = None;
            }
        }
    }

    fn slot(&mut self, view: &ViewId) -> &mut Slot<P> {
        self.slots.entry(view.clone()).or_default()
    }
}

fn placeholder<P>(view: &ViewId, error: &LoadError) -> Activation<P> {
    Activation::Placeholder {
        view: view.clone(),
        message: format!("{UNAVAILABLE_MESSAGE} ({error})"),
    }
}

async fn sleep_unless_zero(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Why an isolated panel task produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelFault {
    #[error("{view} failed: {message}")]
    Failed { view: ViewId, message: String },
    #[error("{view} crashed: {message}")]
    Panicked { view: ViewId, message: String },
}

/// Error boundary around one panel's work. Errors and panics are contained
/// and reported; sibling panels keep running.
pub async fn run_isolated<T, E, F>(view: &ViewId, work: F) -> Result<T, PanelFault>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::warn!(view = %view, error = %err, "panel reported an error");
            Err(PanelFault::Failed {
                view: view.clone(),
                message: err.to_string(),
            })
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            tracing::error!(view = %view, message = %message, "panel panicked");
            Err(PanelFault::Panicked {
                view: view.clone(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Panel(&'static str);

    fn config(max_load_attempts: u32) -> RegistryConfig {
        RegistryConfig {
            max_load_attempts,
            retry_delay_ms: 100,
        }
    }

    /// Loader failing `failures` times before succeeding; counts calls.
    fn flaky(
        registry: &mut ViewRegistry<Panel>,
        view: &'static str,
        failures: u32,
    ) -> Arc<AtomicU32> {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        registry.register(view, move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call <= failures {
                    Err(LoadError::Module(format!("chunk {call} missing")))
                } else {
                    Ok(Panel(view))
                }
            }
        });
        calls
    }

    #[tokio::test(start_paused = true)]
    async fn fails_twice_then_ready_after_three_attempts() {
        let mut registry = ViewRegistry::new(&config(3));
        let calls = flaky(&mut registry, "regex-sandbox", 2);
        let view = ViewId::from("regex-sandbox");

        let activation = registry.activate(&view).await;

        assert_eq!(activation.panel().map(|p| p.0), Some("regex-sandbox"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(registry.state(&view), PanelState::Ready { attempts: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_loader_ends_in_placeholder() {
        let mut registry = ViewRegistry::new(&config(3));
        let calls = flaky(&mut registry, "jwt-debugger", u32::MAX);
        let view = ViewId::from("jwt-debugger");

        let activation = registry.activate(&view).await;

        assert!(!activation.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(registry.state(&view).is_terminal());

        // Stays a placeholder without reloading until retried.
        registry.activate(&view).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        registry.retry(&view).expect("retry");
        registry.activate(&view).await;
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn unknown_view_is_placeholder() {
        let mut registry: ViewRegistry<Panel> = ViewRegistry::new(&config(3));
        let activation = registry.activate(&ViewId::from("nope")).await;
        match activation {
            Activation::Placeholder { message, .. } => {
                assert!(message.starts_with(UNAVAILABLE_MESSAGE));
                assert!(message.contains("nope"));
            }
            Activation::Ready(_) => panic!("unknown view loaded"),
        }
    }

    #[tokio::test]
    async fn switching_views_unloads_previous_panel() {
        let mut registry = ViewRegistry::new(&config(3));
        let first_calls = flaky(&mut registry, "sql-formatter", 0);
        flaky(&mut registry, "cron-job-builder", 0);
        let first = ViewId::from("sql-formatter");
        let second = ViewId::from("cron-job-builder");

        registry.activate(&first).await;
        registry.activate(&first).await;
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);

        registry.activate(&second).await;
        assert_eq!(registry.state(&first), PanelState::Unloaded);
        assert!(registry.state(&second).is_ready());
        assert_eq!(registry.active(), Some(&second));

        registry.activate(&first).await;
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reports_unregistered_catalog_features() {
        let mut registry = ViewRegistry::new(&config(3));
        flaky(&mut registry, "ai-command-center", 0);
        let missing = registry.missing_features();
        assert!(!missing.contains(&"ai-command-center"));
        assert!(missing.contains(&"regex-sandbox"));
    }

    #[tokio::test]
    async fn isolated_errors_and_panics_become_faults() {
        let view = ViewId::from("ai-code-explainer");

        let ok = run_isolated(&view, async { Ok::<_, LoadError>(7) }).await;
        assert_eq!(ok, Ok(7));

        let failed = run_isolated(&view, async {
            Err::<(), _>(LoadError::Module("boom".to_string()))
        })
        .await;
        assert!(matches!(failed, Err(PanelFault::Failed { .. })));

        let panicked = run_isolated(&view, async {
            if view.as_str().is_empty() {
                return Ok::<(), LoadError>(());
            }
            panic!("render exploded")
        })
        .await;
        assert_eq!(
            panicked,
            Err(PanelFault::Panicked {
                view: view.clone(),
                message: "render exploded".to_string()
            })
        );
    }
}
