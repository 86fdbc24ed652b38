//! Cloud APIG Client
//!
//! Talks to the managed API gateway control API in the gateway's region.
//! Requests are signed with HMAC-SHA256 over a canonical request string.
//! `APIG_API` gateways report REST APIs; `APIG_AI` gateways report MCP
//! servers with their routing ids.

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use portal_common::{Page, PageRequest};
use serde::Deserialize;
use sha2::Sha256;

use super::{check_status, upstream_from_reqwest, ResourceDiscovery, ResourceItem};
use crate::domain::{
    ApigAiMcpItem, ApigAuthConfig, Gateway, GatewayAuthConfig, GatewayType, RestApiItem,
};
use crate::error::{PortalError, Result};

type HmacSha256 = Hmac<Sha256>;

pub struct ApigDiscovery {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApigListResponse<T> {
    // An explicit default fn keeps serde from demanding `T: Default`.
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApigHttpApi {
    http_api_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApigMcpServer {
    mcp_server_name: String,
    mcp_route_id: String,
    #[serde(default)]
    api_id: Option<String>,
}

impl ApigDiscovery {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn signed_get(
        &self,
        config: &ApigAuthConfig,
        path: &str,
        page: PageRequest,
    ) -> Result<reqwest::Response> {
        let query = format!("pageNumber={}&pageSize={}", page.page, page.size);
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let canonical = format!("GET\n{}\n{}\n{}", path, query, timestamp);

        let mut mac = HmacSha256::new_from_slice(config.secret_key.as_bytes())
            .map_err(|e| PortalError::internal(format!("HMAC key error: {}", e)))?;
        mac.update(canonical.as_bytes());
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        let url = format!("https://apig.{}.aliyuncs.com{}?{}", config.region, path, query);

        self.http
            .get(&url)
            .header("x-acs-accesskey-id", &config.access_key)
            .header("x-acs-timestamp", timestamp)
            .header("x-acs-signature", signature)
            .send()
            .await
            .map_err(|e| upstream_from_reqwest("APIG request", e))
    }
}

#[async_trait]
impl ResourceDiscovery for ApigDiscovery {
    async fn list_resources(
        &self,
        gateway: &Gateway,
        page: PageRequest,
    ) -> Result<Page<ResourceItem>> {
        let config = match &gateway.auth_config {
            GatewayAuthConfig::Apig(c) => c,
            _ => {
                return Err(PortalError::internal(
                    "APIG discovery invoked with non-APIG credentials",
                ))
            }
        };

        match gateway.gateway_type {
            GatewayType::ApigApi => {
                let response = self.signed_get(config, "/v1/http-apis", page).await?;
                check_status("APIG http-apis listing", response.status())?;
                let body: ApigListResponse<ApigHttpApi> = response
                    .json()
                    .await
                    .map_err(|e| upstream_from_reqwest("APIG http-apis decode", e))?;

                let items = body
                    .items
                    .into_iter()
                    .map(|api| {
                        ResourceItem::RestApi(RestApiItem {
                            api_id: api.http_api_id,
                            api_name: api.name,
                        })
                    })
                    .collect();
                Ok(Page::new(items, body.total_count))
            }
            GatewayType::ApigAi => {
                let response = self.signed_get(config, "/v1/mcp-servers", page).await?;
                check_status("APIG mcp-servers listing", response.status())?;
                let body: ApigListResponse<ApigMcpServer> = response
                    .json()
                    .await
                    .map_err(|e| upstream_from_reqwest("APIG mcp-servers decode", e))?;

                let items = body
                    .items
                    .into_iter()
                    .map(|s| {
                        ResourceItem::ApigAiMcp(ApigAiMcpItem {
                            mcp_server_name: s.mcp_server_name,
                            mcp_route_id: s.mcp_route_id,
                            api_id: s.api_id,
                        })
                    })
                    .collect();
                Ok(Page::new(items, body.total_count))
            }
            other => Err(PortalError::internal(format!(
                "APIG discovery invoked for gateway type {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_decodes_for_both_item_shapes() {
        let apis: ApigListResponse<ApigHttpApi> = serde_json::from_str(
            r#"{"items": [{"httpApiId": "api-1", "name": "orders"}], "totalCount": 1}"#,
        )
        .unwrap();
        assert_eq!(apis.items[0].http_api_id, "api-1");
        assert_eq!(apis.total_count, 1);

        let servers: ApigListResponse<ApigMcpServer> = serde_json::from_str(
            r#"{"items": [{"mcpServerName": "svc", "mcpRouteId": "r1"}], "totalCount": 1}"#,
        )
        .unwrap();
        assert_eq!(servers.items[0].mcp_route_id, "r1");
        assert!(servers.items[0].api_id.is_none());
    }

    #[test]
    fn test_list_response_tolerates_missing_fields() {
        let empty: ApigListResponse<ApigHttpApi> = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_count, 0);
    }
}
