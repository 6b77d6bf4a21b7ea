use async_trait::async_trait;
use serde::Deserialize;

use devcore_core::config::AuthConfig;
use devcore_core::Action;
use devcore_core::StoreEffect;
use devcore_core::User;

use crate::error::AuthError;
use crate::github::CodeHost;
use crate::reactions::run_effects;
use crate::reactions::SharedStore;

const INVALID_TOKEN_RESPONSE: &str = "Backend failed to retrieve a valid access token.";

/// Trades an OAuth authorization code for an access token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<String, AuthError>;
}

/// Calls the backend proxy that holds the OAuth client secret.
#[derive(Debug, Clone)]
pub struct ProxyTokenExchange {
    client: reqwest::Client,
    url: String,
}

impl ProxyTokenExchange {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_exchange_url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenExchange for ProxyTokenExchange {
    async fn exchange(&self, code: &str) -> Result<String, AuthError> {
        tracing::debug!("token exchange started");
        let response = self
            .client
            .get(&self.url)
            .query(&[("code", code)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }
        parse_token_response(&body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

pub fn parse_token_response(body: &str) -> Result<String, AuthError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|_| AuthError::InvalidTokenResponse(INVALID_TOKEN_RESPONSE.to_string()))?;
    match parsed {
        TokenResponse {
            access_token: Some(token),
            error: None,
            ..
        } if !token.is_empty() => Ok(token),
        TokenResponse {
            error_description, ..
        } => Err(AuthError::InvalidTokenResponse(
            error_description.unwrap_or_else(|| INVALID_TOKEN_RESPONSE.to_string()),
        )),
    }
}

/// Completes the OAuth redirect: code -> token -> profile -> `Login`.
pub async fn handle_callback(
    exchange: &dyn TokenExchange,
    host: &dyn CodeHost,
    store: &SharedStore,
    code: &str,
) -> Result<User, AuthError> {
    let result = async {
        let token = exchange.exchange(code).await?;
        let user = host
            .authenticated_user(&token)
            .await
            .map_err(|err| AuthError::InvalidTokenResponse(err.to_string()))?;
        Ok::<_, AuthError>((user, token))
    }
    .await;

    match result {
        Ok((user, token)) => {
            tracing::info!(login = %user.login, "signed in");
            store.lock().await.dispatch(Action::Login {
                user: user.clone(),
                token,
            });
            Ok(user)
        }
        Err(err) => {
            tracing::error!(error = %err, "authentication failed");
            Err(AuthError::Failed(err.to_string()))
        }
    }
}

/// Validates a hydrated token. An invalid token forces a logout rather than
/// an error; `None` means the session is signed out afterwards. A restored
/// session with a selected repository but no tree loads the tree.
pub async fn restore_session(host: &dyn CodeHost, store: &SharedStore) -> Option<User> {
    let token = {
        let store = store.lock().await;
        store.state().session.token.clone()
    }
    .filter(|token| !token.is_empty())?;

    match host.authenticated_user(&token).await {
        Ok(user) => {
            tracing::info!(login = %user.login, "session restored");
            let pending_tree = {
                let mut store = store.lock().await;
                store.dispatch(Action::Login {
                    user: user.clone(),
                    token,
                });
                let state = store.state();
                match (&state.selected_repo, &state.project_files) {
                    (Some(selection), None) => Some(selection.clone()),
                    _ => None,
                }
            };
            if let Some(selection) = pending_tree {
                run_effects(store, host, vec![StoreEffect::LoadProjectTree(selection)]).await;
            }
            Some(user)
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored token rejected, signing out");
            store.lock().await.dispatch(Action::Logout);
            None
        }
    }
}

pub async fn logout(store: &SharedStore) {
    tracing::info!("signed out");
    store.lock().await.dispatch(Action::Logout);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::github::tests::octocat;
    use crate::github::tests::FakeHost;
    use crate::github::TreeEntry;
    use crate::reactions::shared;
    use devcore_core::AppState;
    use devcore_core::RepoSelection;
    use devcore_core::Store;

    struct FixedExchange(Result<String, AuthError>);

    #[async_trait]
    impl TokenExchange for FixedExchange {
        async fn exchange(&self, _code: &str) -> Result<String, AuthError> {
            self.0.clone()
        }
    }

    #[test]
    fn token_response_variants() {
        assert_eq!(
            parse_token_response(r#"{"access_token":"gho_1","token_type":"bearer"}"#),
            Ok("gho_1".to_string())
        );
        assert_eq!(
            parse_token_response(r#"{"error":"bad_verification_code","error_description":"The code is incorrect."}"#),
            Err(AuthError::InvalidTokenResponse(
                "The code is incorrect.".to_string()
            ))
        );
        assert_eq!(
            parse_token_response("{}"),
            Err(AuthError::InvalidTokenResponse(
                INVALID_TOKEN_RESPONSE.to_string()
            ))
        );
    }

    #[test]
    fn proxy_uses_configured_endpoint() {
        let exchange = ProxyTokenExchange::from_config(&AuthConfig {
            token_exchange_url: "https://auth.example.test/callback".to_string(),
        });
        assert_eq!(exchange.url(), "https://auth.example.test/callback");
    }

    #[test]
    fn exchange_status_error_message() {
        let err = AuthError::Exchange {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(
            AuthError::Failed(err.to_string()).to_string(),
            "Authentication failed: Token exchange failed with status 502: bad gateway"
        );
    }

    #[tokio::test]
    async fn callback_signs_in() {
        let host = FakeHost::with_user("gho_1", octocat());
        let store = shared(Store::default());

        let user = handle_callback(&FixedExchange(Ok("gho_1".to_string())), &host, &store, "c0de")
            .await
            .expect("login");

        assert_eq!(user.login, "octocat");
        let store = store.lock().await;
        assert!(store.state().session.authenticated);
        assert_eq!(store.state().session.token.as_deref(), Some("gho_1"));
    }

    #[tokio::test]
    async fn callback_failure_is_wrapped_and_state_untouched() {
        let host = FakeHost::default();
        let store = shared(Store::default());
        let exchange = FixedExchange(Err(AuthError::InvalidTokenResponse(
            "The code is incorrect.".to_string(),
        )));

        let err = handle_callback(&exchange, &host, &store, "bad")
            .await
            .expect_err("rejected");

        assert_eq!(
            err.to_string(),
            "Authentication failed: The code is incorrect."
        );
        assert_eq!(store.lock().await.state(), &AppState::initial());
    }

    #[tokio::test]
    async fn rejected_stored_token_forces_logout() {
        let host = FakeHost::default();
        let mut hydrated = AppState::initial();
        hydrated.session.token = Some("expired".to_string());
        hydrated.hidden_features.push("jwt-debugger".to_string());
        let store = shared(Store::new(hydrated));

        assert!(restore_session(&host, &store).await.is_none());

        let store = store.lock().await;
        assert_eq!(store.state().session.token, None);
        assert_eq!(store.state().hidden_features, vec!["jwt-debugger".to_string()]);
    }

    #[tokio::test]
    async fn valid_stored_token_restores_user() {
        let host = FakeHost::with_user("t1", octocat());
        let mut hydrated = AppState::initial();
        hydrated.session.token = Some("t1".to_string());
        let store = shared(Store::new(hydrated));

        let user = restore_session(&host, &store).await.expect("restored");

        assert_eq!(user, octocat());
        assert!(store.lock().await.state().is_connected());
    }

    #[tokio::test]
    async fn restored_session_loads_tree_for_hydrated_repo() {
        let mut host = FakeHost::with_user("t1", octocat());
        host.trees.insert(
            "octocat/demo".to_string(),
            vec![TreeEntry::blob("src/main.rs")],
        );
        let mut hydrated = AppState::initial();
        hydrated.session.token = Some("t1".to_string());
        hydrated.selected_repo = Some(RepoSelection::new("octocat", "demo"));
        let store = shared(Store::new(hydrated));

        restore_session(&host, &store).await.expect("restored");

        let files = store.lock().await.state().project_files.clone().expect("tree");
        assert!(files.find("src/main.rs").is_some());
        assert_eq!(
            host.calls.lock().unwrap().clone(),
            vec!["user".to_string(), "tree octocat/demo".to_string()]
        );
    }

    #[tokio::test]
    async fn restored_session_without_repo_skips_tree() {
        let host = FakeHost::with_user("t1", octocat());
        let mut hydrated = AppState::initial();
        hydrated.session.token = Some("t1".to_string());
        let store = shared(Store::new(hydrated));

        restore_session(&host, &store).await.expect("restored");

        assert_eq!(host.calls.lock().unwrap().clone(), vec!["user".to_string()]);
    }

    #[tokio::test]
    async fn no_token_means_no_check() {
        let host = FakeHost::default();
        let store = shared(Store::default());
        assert!(restore_session(&host, &store).await.is_none());
        assert!(host.calls.lock().unwrap().is_empty());
    }
}
