use crate::core::error::{ClientError, TransportError};
use crate::core::models::{DescribeInstancesResponse, FilterParams, Options};
use crate::transport::InstanceInventory;
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

const ACTION: &str = "DescribeInstances";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesRequest<'a> {
    action: &'static str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(flatten)]
    params: &'a FilterParams,
}

/// Inventory gateway spoken to over HTTP with JSON bodies.
///
/// Each query is a POST of the filter parameters, authenticated with the
/// access key and secret as basic credentials.
pub struct HttpInventory {
    endpoint: Url,
    api_version: String,
    region: Option<String>,
    key: String,
    secret: String,
    client: reqwest::Client,
}

impl HttpInventory {
    pub fn new(
        endpoint: &str,
        api_version: impl Into<String>,
        options: &Options,
    ) -> Result<Self, ClientError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| ClientError::InvalidEndpoint(endpoint.to_string()))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("ec2-running/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::from)?;

        Ok(Self {
            endpoint,
            api_version: api_version.into(),
            region: options.region.clone(),
            key: options.key.clone(),
            secret: options.secret.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, params: &'a FilterParams) -> DescribeInstancesRequest<'a> {
        DescribeInstancesRequest {
            action: ACTION,
            version: &self.api_version,
            region: self.region.as_deref(),
            params,
        }
    }
}

#[async_trait]
impl InstanceInventory for HttpInventory {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn describe_instances(
        &self,
        params: &FilterParams,
    ) -> Result<DescribeInstancesResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.key, Some(&self.secret))
            .json(&self.request_body(params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status_code: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::params;
    use crate::Tag;

    fn options() -> Options {
        Options::new("AKIA", "shh").with_region("eu-west-1")
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let result = HttpInventory::new("not a url", "2015-04-15", &options());
        assert!(matches!(result, Err(ClientError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let inventory =
            HttpInventory::new("https://inventory.example.com/", "2015-04-15", &options())
                .unwrap();
        let params = params::build(&[Tag::new("env", "prod")]);

        let body = serde_json::to_value(inventory.request_body(&params)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "Action": "DescribeInstances",
                "Version": "2015-04-15",
                "Region": "eu-west-1",
                "Filters": [
                    { "Name": "instance-state-name", "Values": ["running"] },
                    { "Name": "tag:env", "Values": ["prod"] }
                ]
            })
        );
    }

    #[test]
    fn test_region_omitted_when_unset() {
        let inventory = HttpInventory::new(
            "https://inventory.example.com/",
            "2015-04-15",
            &Options::new("k", "s"),
        )
        .unwrap();
        let params = params::build(&[]);

        let body = serde_json::to_value(inventory.request_body(&params)).unwrap();
        assert!(body.get("Region").is_none());
        assert_eq!(inventory.endpoint().as_str(), "https://inventory.example.com/");
    }
}
