//! Higress Admin Client
//!
//! Lists MCP servers from the Higress console API
//! (`GET /v1/mcpServer?pageNum=&pageSize=`) with basic auth.

use async_trait::async_trait;
use base64::Engine;
use portal_common::{Page, PageRequest};
use serde::Deserialize;

use super::{check_status, upstream_from_reqwest, ResourceDiscovery, ResourceItem};
use crate::domain::{Gateway, GatewayAuthConfig, HigressMcpItem};
use crate::error::{PortalError, Result};

pub struct HigressDiscovery {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HigressPageResponse {
    #[serde(default)]
    data: Vec<HigressMcpConfig>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct HigressMcpConfig {
    name: String,
}

impl HigressDiscovery {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResourceDiscovery for HigressDiscovery {
    async fn list_resources(
        &self,
        gateway: &Gateway,
        page: PageRequest,
    ) -> Result<Page<ResourceItem>> {
        let config = match &gateway.auth_config {
            GatewayAuthConfig::Higress(c) => c,
            _ => {
                return Err(PortalError::internal(
                    "Higress discovery invoked with non-Higress credentials",
                ))
            }
        };

        let url = format!("{}/v1/mcpServer", config.address.trim_end_matches('/'));
        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", config.username, config.password));

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Basic {}", basic))
            .query(&[
                ("pageNum", page.page.to_string()),
                ("pageSize", page.size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| upstream_from_reqwest("Higress mcpServer listing", e))?;

        check_status("Higress mcpServer listing", response.status())?;

        let body: HigressPageResponse = response
            .json()
            .await
            .map_err(|e| upstream_from_reqwest("Higress mcpServer decode", e))?;

        let items = body
            .data
            .into_iter()
            .map(|s| {
                ResourceItem::HigressMcp(HigressMcpItem {
                    mcp_server_name: s.name,
                })
            })
            .collect();

        Ok(Page::new(items, body.total))
    }
}
