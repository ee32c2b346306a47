use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BackendError, SamplingParams, TextBackend};

pub const DEFAULT_MODEL_URL: &str =
    "https://router.huggingface.co/models/mistralai/Ministral-3-3B-Instruct-2512";

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a SamplingParams,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: Option<String>,
}

pub struct HuggingFaceBackend {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl HuggingFaceBackend {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

fn map_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(err.to_string())
    }
}

#[async_trait]
impl TextBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, BackendError> {
        let req = InferenceRequest {
            inputs: prompt,
            parameters: params,
        };
        let res = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(map_transport)?;

        let status = res.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(BackendError::WarmingUp);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let body = res.text().await.map_err(map_transport)?;
        let parsed: Vec<GeneratedText> = serde_json::from_str(&body)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        parsed
            .into_iter()
            .next()
            .and_then(|g| g.generated_text)
            .ok_or_else(|| BackendError::MalformedResponse("no generated_text in body".to_string()))
    }
}
