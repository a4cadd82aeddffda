//! HTTP-forwarding event store.
//!
//! Forwards cache writes to the main application's internal API. The main
//! app owns TTL enforcement and persistence; this client only shapes the
//! request and classifies the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::info;

use super::{EventStore, StoreError};

/// Header carrying the shared key for the main app's internal endpoints.
const API_KEY_HEADER: &str = "x-internal-api-key";

/// Event store client backed by the main application's internal API.
#[derive(Clone)]
pub struct HttpEventStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpEventStore {
    /// Create a client for the given base URL.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
            timeout,
        })
    }

    fn entry_url(&self, grant_id: &str, resource_type: &str, resource_id: &str) -> String {
        format!(
            "{}/internal/cache/{}/{}/{}",
            self.base_url, grant_id, resource_type, resource_id
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn upsert_event(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
        fields: &Value,
        ttl_hours: u32,
    ) -> Result<(), StoreError> {
        let url = self.entry_url(grant_id, resource_type, resource_id);
        let body = json!({
            "fields": fields,
            "ttl_hours": ttl_hours,
        });

        let response = self
            .authorize(self.client.put(&url).json(&body).timeout(self.timeout))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                operation: "upsert",
                resource_type: resource_type.to_string(),
                resource_id: resource_id.to_string(),
                status: status.as_u16(),
            });
        }

        info!(
            grant_id = grant_id,
            resource_type = resource_type,
            resource_id = resource_id,
            ttl_hours = ttl_hours,
            "cache_upsert_forwarded"
        );

        Ok(())
    }

    async fn delete_event(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<(), StoreError> {
        let url = self.entry_url(grant_id, resource_type, resource_id);

        let response = self
            .authorize(self.client.delete(&url).timeout(self.timeout))
            .send()
            .await?;

        let status = response.status();
        // 404 means the entry was never cached; that is already the
        // desired end state.
        if !status.is_success() && status.as_u16() != 404 {
            return Err(StoreError::Rejected {
                operation: "delete",
                resource_type: resource_type.to_string(),
                resource_id: resource_id.to_string(),
                status: status.as_u16(),
            });
        }

        info!(
            grant_id = grant_id,
            resource_type = resource_type,
            resource_id = resource_id,
            "cache_delete_forwarded"
        );

        Ok(())
    }
}
