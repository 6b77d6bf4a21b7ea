use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use devcore_core::config::ImageRetryConfig;

use crate::contracts::GeneratedImage;
use crate::contracts::ModelClient;
use crate::error::ExecError;

/// Exponential backoff: the n-th retry waits `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ImageRetryConfig::default())
    }
}

impl From<&ImageRetryConfig> for RetryPolicy {
    fn from(config: &ImageRetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry.min(16)))
    }

    pub fn delays(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|retry| self.delay(retry)).collect()
    }
}

pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, ExecError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                let delay = policy.delay(attempt - 1);
                tracing::warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                tracing::error!(label, attempts = attempt, error = %err, "giving up");
                return Err(ExecError::RetriesExhausted {
                    label: label.to_string(),
                    attempts: attempt,
                    last_error: err.to_string(),
                });
            }
        }
    }
}

pub async fn generate_image_with_retry(
    client: &dyn ModelClient,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<GeneratedImage, ExecError> {
    retry_with_backoff(policy, "image generation", |_| client.generate_image(prompt)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::error::ModelError;
    use crate::stream::tests::ScriptedModel;

    fn image() -> GeneratedImage {
        GeneratedImage {
            mime_type: "image/png".to_string(),
            base64: "iVBOR".to_string(),
        }
    }

    #[test]
    fn default_policy_backs_off_one_two_four_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let model = ScriptedModel::streaming(&[]);
        *model.images.lock().unwrap() = vec![
            Err(ModelError::RateLimited),
            Err(ModelError::RateLimited),
            Ok(image()),
        ];
        let started = Instant::now();

        let result = generate_image_with_retry(&model, "a fox", RetryPolicy::default()).await;

        assert_eq!(result.expect("image"), image());
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_reports_attempts_and_last_failure() {
        let calls = Mutex::new(0u32);
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
        };

        let result: Result<(), ExecError> = retry_with_backoff(policy, "upload", |attempt| {
            *calls.lock().unwrap() += 1;
            async move { Err::<(), _>(format!("boom #{attempt}")) }
        })
        .await;

        assert_eq!(*calls.lock().unwrap(), 3);
        let message = result.expect_err("exhausted").to_string();
        assert_eq!(message, "upload failed after 3 attempts: boom #3");
    }
}
