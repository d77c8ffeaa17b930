// Block-explorer source verification
use async_trait::async_trait;
use log::{error, info};
use serde::Deserialize;

use crate::config::ExplorerSettings;
use crate::error::{DeployError, Result};

const ALREADY_VERIFIED: &str = "already verified";

/// What gets submitted for one deployed contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    pub address: String,
    pub constructor_arguments: Vec<String>,
}

#[async_trait]
pub trait VerificationService {
    async fn submit(&self, request: &VerificationRequest) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    /// The service rejected the request; the reason has been logged
    Failed(String),
}

/// Submit `address` for verification.
///
/// Never fails: an "already verified" answer counts as success and any
/// other failure is logged and reported through the outcome.
pub async fn verify<S>(service: &S, address: &str, args: &[String]) -> VerificationOutcome
where
    S: VerificationService + ?Sized,
{
    info!("Verifying contract {}...", address);
    let request = VerificationRequest {
        address: address.to_string(),
        constructor_arguments: args.to_vec(),
    };

    match service.submit(&request).await {
        Ok(()) => {
            info!("Verified {}", address);
            VerificationOutcome::Verified
        }
        Err(err) => {
            let reason = err.to_string();
            if reason.to_lowercase().contains(ALREADY_VERIFIED) {
                info!("Already verified!");
                VerificationOutcome::AlreadyVerified
            } else {
                error!("Verification of {} failed: {}", address, reason);
                VerificationOutcome::Failed(reason)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl ExplorerResponse {
    fn into_result(self) -> Result<()> {
        if self.status == "1" {
            return Ok(());
        }
        let reason = match self.result {
            serde_json::Value::String(text) if !text.is_empty() => text,
            serde_json::Value::Null => self.message,
            other => other.to_string(),
        };
        Err(DeployError::Verification(reason))
    }
}

/// Etherscan-style verification API client
pub struct ExplorerClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ExplorerClient {
    pub fn new(settings: &ExplorerSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl VerificationService for ExplorerClient {
    async fn submit(&self, request: &VerificationRequest) -> Result<()> {
        let arguments = serde_json::to_string(&request.constructor_arguments)?;
        let form = [
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", request.address.as_str()),
            ("constructorArguments", arguments.as_str()),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self.http.post(&self.api_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployError::Verification(format!("{}: {}", status, body)));
        }

        response.json::<ExplorerResponse>().await?.into_result()
    }
}
