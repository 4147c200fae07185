use crate::config::{ModelParams, ServerConfig};
use crate::simulation::{Category, Snapshot};
use super::{parse_message, parse_snapshot, parse_step, RemoteError, SimulationClient, ADVANCE_ENDPOINT, INIT_ENDPOINT};

/// JSON-over-HTTP client for the remote model server.
#[derive(Debug, Clone)]
pub struct HttpSimulationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSimulationClient {
    pub fn new(config: &ServerConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| RemoteError::Transport {
                endpoint: config.base_url.clone(),
                source,
            })?;

        let mut base_url = config.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn read_body(endpoint: &str, response: reqwest::Response) -> Result<String, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| RemoteError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn get(&self, endpoint: &str) -> Result<String, RemoteError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        Self::read_body(endpoint, response).await
    }
}

impl SimulationClient for HttpSimulationClient {
    async fn initialize(&self, params: &ModelParams) -> Result<String, RemoteError> {
        let response = self
            .client
            .post(self.url(INIT_ENDPOINT))
            .json(params)
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                endpoint: INIT_ENDPOINT.to_string(),
                source,
            })?;

        let body = Self::read_body(INIT_ENDPOINT, response).await?;
        Ok(parse_message(&body))
    }

    async fn advance(&self) -> Result<Option<u64>, RemoteError> {
        let body = self.get(ADVANCE_ENDPOINT).await?;
        parse_step(&body)
    }

    async fn fetch(&self, category: Category) -> Result<Snapshot, RemoteError> {
        let body = self.get(category.endpoint()).await?;
        parse_snapshot(category, &body)
    }

    fn get_name(&self) -> &'static str {
        "HTTP"
    }
}
