use crate::config::Config;
use crate::errors::AppError;
use crate::models::AddressLookupResult;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Raw ViaCEP payload. Only the fields this service reads are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViaCepResponse {
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub complemento: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub localidade: String,
    #[serde(default)]
    pub uf: String,
    /// ViaCEP signals an unknown CEP with `"erro": true` (newer versions send `"true"`).
    #[serde(default)]
    pub erro: Value,
}

impl ViaCepResponse {
    /// Whether the payload carries a truthy `erro` flag.
    pub fn is_error(&self) -> bool {
        match &self.erro {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

impl From<ViaCepResponse> for AddressLookupResult {
    fn from(data: ViaCepResponse) -> Self {
        Self {
            street: data.logradouro,
            complement: data.complemento,
            neighborhood: data.bairro,
            city: data.localidade,
            state: data.uf,
        }
    }
}

/// Client for the ViaCEP postal-code lookup service.
#[derive(Clone)]
pub struct PostalLookupClient {
    client: Client,
    base_url: String,
}

impl PostalLookupClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Builds the client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.via_cep_api.clone(),
        }
    }

    /// Looks up `cep` upstream.
    ///
    /// Returns `Ok(None)` when the upstream answers with anything other than
    /// 200 or flags the CEP as unknown. A request that cannot complete at all
    /// is reported the same way, so callers only see a not-found signal.
    pub async fn lookup(&self, cep: &str) -> Result<Option<ViaCepResponse>, AppError> {
        let url = self.lookup_url(cep)?;
        tracing::info!("ViaCEP: looking up CEP {}", cep);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("ViaCEP request for {} failed: {}", cep, e);
                return Ok(None);
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!(
                "ViaCEP returned status {} for CEP {}",
                response.status(),
                cep
            );
            return Ok(None);
        }

        let data: ViaCepResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to parse ViaCEP response for {}: {}", cep, e);
                return Ok(None);
            }
        };

        if data.is_error() {
            tracing::warn!("ViaCEP has no address for CEP {}", cep);
            return Ok(None);
        }

        tracing::debug!("ViaCEP resolved {} to {}/{}", cep, data.localidade, data.uf);
        Ok(Some(data))
    }

    /// `{base_url}/{cep}/json/` with `cep` encoded as a single path segment.
    fn lookup_url(&self, cep: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AppError::InternalError(format!("Invalid ViaCEP base URL {}: {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                AppError::InternalError(format!(
                    "ViaCEP base URL cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(cep)
            .push("json")
            .push("");

        Ok(url)
    }
}
