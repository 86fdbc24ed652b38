//! ADP AI Gateway Client
//!
//! Lists MCP servers from an ADP AI-gateway instance. Auth is either a
//! seed token sent as a bearer credential or a set of caller-supplied
//! headers, depending on how the gateway was imported.

use async_trait::async_trait;
use portal_common::{Page, PageRequest};
use serde::Deserialize;

use super::{check_status, upstream_from_reqwest, ResourceDiscovery, ResourceItem};
use crate::domain::{AdpAuthType, ApigAiMcpItem, Gateway, GatewayAuthConfig};
use crate::error::{PortalError, Result};

pub struct AdpDiscovery {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdpMcpListResponse {
    #[serde(default)]
    data: Vec<AdpMcpServer>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdpMcpServer {
    mcp_server_name: String,
    mcp_route_id: String,
    #[serde(default)]
    api_id: Option<String>,
}

impl AdpDiscovery {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResourceDiscovery for AdpDiscovery {
    async fn list_resources(
        &self,
        gateway: &Gateway,
        page: PageRequest,
    ) -> Result<Page<ResourceItem>> {
        let config = match &gateway.auth_config {
            GatewayAuthConfig::Adp(c) => c,
            _ => {
                return Err(PortalError::internal(
                    "ADP discovery invoked with non-ADP credentials",
                ))
            }
        };

        let url = format!(
            "{}:{}/v1/mcp-servers",
            config.base_url.trim_end_matches('/'),
            config.port
        );

        let mut request = self.http.get(&url).query(&[
            ("page", page.page.to_string()),
            ("size", page.size.to_string()),
        ]);

        match config.auth_type {
            AdpAuthType::Seed => {
                // Validated at import time; missing seed here is a stored-state bug.
                let seed = config.auth_seed.as_deref().ok_or_else(|| {
                    PortalError::internal("ADP gateway stored without an auth seed")
                })?;
                request = request.bearer_auth(seed);
            }
            AdpAuthType::Header => {
                for header in config.auth_headers.as_deref().unwrap_or(&[]) {
                    request = request.header(&header.key, &header.value);
                }
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| upstream_from_reqwest("ADP mcp-servers listing", e))?;

        check_status("ADP mcp-servers listing", response.status())?;

        let body: AdpMcpListResponse = response
            .json()
            .await
            .map_err(|e| upstream_from_reqwest("ADP mcp-servers decode", e))?;

        let items = body
            .data
            .into_iter()
            .map(|s| {
                ResourceItem::ApigAiMcp(ApigAiMcpItem {
                    mcp_server_name: s.mcp_server_name,
                    mcp_route_id: s.mcp_route_id,
                    api_id: s.api_id,
                })
            })
            .collect();

        Ok(Page::new(items, body.total))
    }
}
