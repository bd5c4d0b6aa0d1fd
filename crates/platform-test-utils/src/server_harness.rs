//! Test server harness for E2E testing
//!
//! Provides `TestPlatformServer` for spawning real platform instances in tests.

use metrics_exporter_prometheus::PrometheusBuilder;
use platform_service::config::Config;
use platform_service::crypto::{KeyManager, MIN_BCRYPT_COST};
use platform_service::routes::{self, AppState};
use platform_service::services::UserStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// A signing key shared by every test in the process.
pub fn shared_key_manager() -> Arc<KeyManager> {
    static KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();
    Arc::clone(KEYS.get_or_init(|| {
        Arc::new(KeyManager::generate().expect("RSA key generation should succeed"))
    }))
}

/// Test harness for spawning the Game Platform in E2E tests.
///
/// The server holds the `test`/`test` development account with a cheap
/// bcrypt cost.
pub struct TestPlatformServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestPlatformServer {
    /// Spawn a server with default configuration and the shared key.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(HashMap::new(), shared_key_manager()).await
    }

    /// Spawn a server with extra environment variables and a specific key.
    pub async fn spawn_with(
        vars: HashMap<String, String>,
        key_manager: Arc<KeyManager>,
    ) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let users = UserStore::development(MIN_BCRYPT_COST)
            .map_err(|e| anyhow::anyhow!("Failed to create users: {}", e))?;

        let state = Arc::new(AppState::with_components(config, key_manager, users));

        // Recorder is built but not installed globally
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = routes::build_routes(Arc::clone(&state), metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the published key set.
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.url())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared application state (sessions, key manager, issuer).
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Log in and return the `PLATFORM_SESS=<id>` cookie pair.
    pub async fn login(
        &self,
        client: &reqwest::Client,
        username: &str,
        password: &str,
    ) -> Result<String, anyhow::Error> {
        let response = client
            .post(format!("{}/player/login", self.url()))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("login failed with status {}", response.status());
        }

        let set_cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .ok_or_else(|| anyhow::anyhow!("login response has no Set-Cookie"))?
            .to_str()?;

        let pair = set_cookie
            .split(';')
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty Set-Cookie"))?;

        Ok(pair.to_string())
    }

    /// Request a game token with the given cookie pair.
    pub async fn issue(
        &self,
        client: &reqwest::Client,
        cookie: &str,
        game_id: &str,
    ) -> Result<String, anyhow::Error> {
        let response = client
            .post(format!("{}/issue", self.url()))
            .header(reqwest::header::COOKIE, cookie)
            .json(&serde_json::json!({ "gameId": game_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("issue failed with status {}", response.status());
        }

        let body: serde_json::Value = response.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("issue response has no token"))
    }
}

impl Drop for TestPlatformServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestPlatformServer::spawn().await?;
        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await?, "OK");

        Ok(())
    }

    #[tokio::test]
    async fn test_login_and_issue_helpers() -> Result<(), anyhow::Error> {
        let server = TestPlatformServer::spawn().await?;
        let client = reqwest::Client::new();

        let cookie = server.login(&client, "test", "test").await?;
        assert!(cookie.starts_with("PLATFORM_SESS="));

        let token = server.issue(&client, &cookie, "game-slots").await?;
        assert_eq!(token.split('.').count(), 3);

        Ok(())
    }
}
