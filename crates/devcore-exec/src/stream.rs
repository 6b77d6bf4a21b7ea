//! Incremental rendering of streamed model output.
//!
//! Each panel owns one [`StreamAggregator`]. Every request takes a fresh id;
//! once a newer request begins (or the panel unmounts) the older sequence
//! stops publishing, so last-request-wins per panel.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::StreamExt;

use crate::contracts::FragmentStream;
use crate::contracts::ModelClient;
use crate::contracts::ModelRequest;
use crate::error::ModelError;

/// One publication to the view: the whole accumulated text so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelUpdate {
    pub request_id: u64,
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed { text: String },
    Failed { text: String, error: String },
    Superseded,
}

impl StreamOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed { text } | Self::Failed { text, .. } => Some(text),
            Self::Superseded => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamAggregator {
    current: Arc<AtomicU64>,
}

/// Ticket for one request. Stale once the aggregator moves on.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    id: u64,
    current: Arc<AtomicU64>,
}

impl RequestGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.id
    }
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding any in flight.
    pub fn begin(&self) -> RequestGuard {
        let id = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        RequestGuard {
            id,
            current: Arc::clone(&self.current),
        }
    }

    /// Unmount hook: every outstanding request becomes stale.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub async fn run<F>(
        &self,
        client: &dyn ModelClient,
        request: &ModelRequest,
        publish: F,
    ) -> StreamOutcome
    where
        F: FnMut(PanelUpdate),
    {
        let guard = self.begin();
        let opened = client.stream(request).await;
        consume(&guard, opened, publish).await
    }
}

pub fn describe_failure(error: &ModelError) -> String {
    format!("An error occurred while communicating with the AI model: {error}")
}

/// Drains `opened` into `publish`. Never returns an error: failures become a
/// single error publication.
pub async fn consume<F>(
    guard: &RequestGuard,
    opened: Result<FragmentStream, ModelError>,
    mut publish: F,
) -> StreamOutcome
where
    F: FnMut(PanelUpdate),
{
    let mut text = String::new();
    let mut fragments = match opened {
        Ok(fragments) => fragments,
        Err(err) => return fail(guard, text, &err, &mut publish),
    };

    while let Some(next) = fragments.next().await {
        if !guard.is_current() {
            tracing::debug!(request_id = guard.id(), "dropping superseded stream");
            return StreamOutcome::Superseded;
        }
        match next {
            Ok(fragment) => {
                text.push_str(&fragment);
                publish(PanelUpdate {
                    request_id: guard.id(),
                    text: text.clone(),
                    is_error: false,
                });
            }
            Err(err) => return fail(guard, text, &err, &mut publish),
        }
    }

    if !guard.is_current() {
        return StreamOutcome::Superseded;
    }
    StreamOutcome::Completed { text }
}

fn fail<F>(guard: &RequestGuard, mut text: String, error: &ModelError, publish: &mut F) -> StreamOutcome
where
    F: FnMut(PanelUpdate),
{
    if !guard.is_current() {
        return StreamOutcome::Superseded;
    }
    tracing::warn!(request_id = guard.id(), error = %error, "model stream failed");
    let message = describe_failure(error);
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(&message);
    publish(PanelUpdate {
        request_id: guard.id(),
        text: text.clone(),
        is_error: true,
    });
    StreamOutcome::Failed {
        text,
        error: error.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::contracts::FunctionDeclaration;
    use crate::contracts::GeneratedImage;
    use crate::contracts::InferenceReply;

    /// Scripted model: `stream` replays fragments, optionally failing to open.
    pub(crate) struct ScriptedModel {
        pub fragments: Vec<Result<String, ModelError>>,
        pub open_error: Option<ModelError>,
        pub structured: Mutex<Vec<Result<serde_json::Value, ModelError>>>,
        pub images: Mutex<Vec<Result<GeneratedImage, ModelError>>>,
        pub inferences: Mutex<Vec<Result<InferenceReply, ModelError>>>,
        pub offered: Mutex<Vec<String>>,
        pub requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        pub(crate) fn streaming(fragments: &[&str]) -> Self {
            Self::with_fragments(fragments.iter().map(|f| Ok(f.to_string())).collect())
        }

        pub(crate) fn with_fragments(fragments: Vec<Result<String, ModelError>>) -> Self {
            Self {
                fragments,
                open_error: None,
                structured: Mutex::new(Vec::new()),
                images: Mutex::new(Vec::new()),
                inferences: Mutex::new(Vec::new()),
                offered: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(err) = self.open_error.clone() {
                return Err(err);
            }
            Ok(stream::iter(self.fragments.clone()).boxed())
        }

        async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self
                .fragments
                .iter()
                .filter_map(|f| f.as_ref().ok().cloned())
                .collect())
        }

        async fn generate_structured(
            &self,
            request: &ModelRequest,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            self.structured.lock().unwrap().remove(0)
        }

        async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, ModelError> {
            self.images.lock().unwrap().remove(0)
        }

        async fn infer(
            &self,
            request: &ModelRequest,
            functions: &[FunctionDeclaration],
        ) -> Result<InferenceReply, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            self.offered
                .lock()
                .unwrap()
                .extend(functions.iter().map(|function| function.name.clone()));
            self.inferences.lock().unwrap().remove(0)
        }
    }

    fn collect(updates: &mut Vec<PanelUpdate>) -> impl FnMut(PanelUpdate) + '_ {
        move |update| updates.push(update)
    }

    #[tokio::test]
    async fn publishes_accumulated_text_per_fragment() {
        let model = ScriptedModel::streaming(&["Hello", ", ", "world"]);
        let aggregator = StreamAggregator::new();
        let mut updates = Vec::new();

        let outcome = aggregator
            .run(&model, &ModelRequest::new("greet"), collect(&mut updates))
            .await;

        let texts: Vec<&str> = updates.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Hello, ", "Hello, world"]);
        assert!(updates.iter().all(|u| !u.is_error));
        assert_eq!(
            outcome,
            StreamOutcome::Completed {
                text: "Hello, world".to_string()
            }
        );
    }

    #[tokio::test]
    async fn open_failure_publishes_exactly_one_error() {
        let mut model = ScriptedModel::streaming(&[]);
        model.open_error = Some(ModelError::Request("offline".to_string()));
        let aggregator = StreamAggregator::new();
        let mut updates = Vec::new();

        let outcome = aggregator
            .run(&model, &ModelRequest::new("x"), collect(&mut updates))
            .await;

        assert_eq!(updates.len(), 1);
        assert!(updates[0].is_error);
        assert_eq!(
            updates[0].text,
            "An error occurred while communicating with the AI model: model request failed: offline"
        );
        assert!(matches!(outcome, StreamOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_partial_text_and_stops() {
        let model = ScriptedModel::with_fragments(vec![
            Ok("partial".to_string()),
            Err(ModelError::Stream("reset".to_string())),
            Ok("never".to_string()),
        ]);
        let aggregator = StreamAggregator::new();
        let mut updates = Vec::new();

        aggregator
            .run(&model, &ModelRequest::new("x"), collect(&mut updates))
            .await;

        assert_eq!(updates.len(), 2);
        assert!(updates[1].is_error);
        assert!(updates[1].text.starts_with("partial\n\nAn error occurred"));
        assert!(!updates.iter().any(|u| u.text.contains("never")));
    }

    #[tokio::test]
    async fn superseded_request_publishes_nothing_further() {
        let aggregator = StreamAggregator::new();
        let first = aggregator.begin();
        let fragments: FragmentStream =
            stream::iter(vec![Ok("stale".to_string()), Ok(" text".to_string())]).boxed();
        let second = aggregator.begin();

        let mut updates = Vec::new();
        let outcome = consume(&first, Ok(fragments), collect(&mut updates)).await;

        assert_eq!(outcome, StreamOutcome::Superseded);
        assert!(updates.is_empty());
        assert!(second.is_current());
        assert!(!first.is_current());
    }

    #[tokio::test]
    async fn invalidate_silences_stale_failure() {
        let aggregator = StreamAggregator::new();
        let guard = aggregator.begin();
        aggregator.invalidate();

        let mut updates = Vec::new();
        let outcome = consume(
            &guard,
            Err(ModelError::Request("late".to_string())),
            collect(&mut updates),
        )
        .await;

        assert_eq!(outcome, StreamOutcome::Superseded);
        assert!(updates.is_empty());
    }
}
