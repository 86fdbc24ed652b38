//! Product to Gateway-Resource Linkage
//!
//! A product holds at most one active reference to a concrete gateway
//! resource. The selector shape is an explicit tagged union keyed by the
//! owning gateway's type; a selector is never accepted on field shape alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GatewayType;
use crate::error::{PortalError, Result};

/// Where the linked resource came from. `NACOS` is kept for wire
/// compatibility with registry-sourced refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Gateway,
    Nacos,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "GATEWAY",
            Self::Nacos => "NACOS",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "GATEWAY" => Ok(Self::Gateway),
            "NACOS" => Ok(Self::Nacos),
            other => Err(PortalError::validation(format!(
                "Unknown source type: {}",
                other
            ))),
        }
    }
}

/// A REST API exposed by a cloud APIG gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiItem {
    pub api_id: String,
    pub api_name: String,
}

/// An MCP server exposed by a Higress gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HigressMcpItem {
    pub mcp_server_name: String,
}

/// An MCP server exposed by an AI gateway (APIG_AI / ADP), carrying the
/// extra routing fields those providers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApigAiMcpItem {
    pub mcp_server_name: String,
    pub mcp_route_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
}

/// Which concrete resource on a gateway a product is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceSelector {
    RestApi(RestApiItem),
    ApigAiMcp(ApigAiMcpItem),
    HigressMcp(HigressMcpItem),
}

impl ResourceSelector {
    /// Decode a selector payload for a gateway of the given type. The
    /// gateway type decides the expected variant; a payload that decodes as
    /// some other variant is a validation error, not a coercion.
    pub fn for_gateway_type(gateway_type: GatewayType, raw: serde_json::Value) -> Result<Self> {
        match gateway_type {
            GatewayType::ApigApi => {
                let item: RestApiItem = decode(raw, "RestAPIItem")?;
                if item.api_id.is_empty() {
                    return Err(PortalError::validation("apiId must not be empty"));
                }
                Ok(Self::RestApi(item))
            }
            GatewayType::ApigAi | GatewayType::AdpAiGateway => {
                let item: ApigAiMcpItem = decode(raw, "APIGAIMCPItem")?;
                if item.mcp_server_name.is_empty() || item.mcp_route_id.is_empty() {
                    return Err(PortalError::validation(
                        "mcpServerName and mcpRouteId must not be empty",
                    ));
                }
                Ok(Self::ApigAiMcp(item))
            }
            GatewayType::Higress => {
                let item: HigressMcpItem = decode(raw, "HigressMCPItem")?;
                if item.mcp_server_name.is_empty() {
                    return Err(PortalError::validation("mcpServerName must not be empty"));
                }
                Ok(Self::HigressMcp(item))
            }
        }
    }

    /// Whether this selector variant is the one a gateway of the given type
    /// expects.
    pub fn matches_gateway_type(&self, gateway_type: GatewayType) -> bool {
        matches!(
            (self, gateway_type),
            (Self::RestApi(_), GatewayType::ApigApi)
                | (Self::ApigAiMcp(_), GatewayType::ApigAi)
                | (Self::ApigAiMcp(_), GatewayType::AdpAiGateway)
                | (Self::HigressMcp(_), GatewayType::Higress)
        )
    }

    pub fn from_stored(gateway_type: GatewayType, json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        Self::for_gateway_type(gateway_type, raw)
            .map_err(|e| PortalError::internal(format!("Stored ref config is invalid: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: serde_json::Value, expected: &str) -> Result<T> {
    serde_json::from_value(raw).map_err(|e| {
        PortalError::validation(format!(
            "Resource selector does not match expected {}: {}",
            expected, e
        ))
    })
}

/// The single active binding from a product to a gateway resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResourceRef {
    pub product_id: String,
    pub gateway_id: String,
    pub source_type: SourceType,
    pub resource_selector: ResourceSelector,
    pub created_at: DateTime<Utc>,
}

impl GatewayResourceRef {
    pub fn new(
        product_id: impl Into<String>,
        gateway_id: impl Into<String>,
        resource_selector: ResourceSelector,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            gateway_id: gateway_id.into(),
            source_type: SourceType::Gateway,
            resource_selector,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_keyed_by_gateway_type() {
        // The same payload shape is accepted or rejected depending on the
        // owning gateway's type, never on structure alone.
        let higress_payload = json!({"mcpServerName": "svc-A"});
        assert!(
            ResourceSelector::for_gateway_type(GatewayType::Higress, higress_payload.clone())
                .is_ok()
        );
        let err = ResourceSelector::for_gateway_type(GatewayType::ApigAi, higress_payload)
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));
    }

    #[test]
    fn test_rest_api_selector() {
        let selector = ResourceSelector::for_gateway_type(
            GatewayType::ApigApi,
            json!({"apiId": "api-1", "apiName": "orders"}),
        )
        .unwrap();
        assert!(selector.matches_gateway_type(GatewayType::ApigApi));
        assert!(!selector.matches_gateway_type(GatewayType::Higress));
    }

    #[test]
    fn test_ai_mcp_selector_shared_by_apig_ai_and_adp() {
        let payload = json!({"mcpServerName": "svc", "mcpRouteId": "route-1", "apiId": "api-9"});
        let selector =
            ResourceSelector::for_gateway_type(GatewayType::AdpAiGateway, payload.clone()).unwrap();
        assert!(selector.matches_gateway_type(GatewayType::ApigAi));
        assert!(selector.matches_gateway_type(GatewayType::AdpAiGateway));
        assert!(ResourceSelector::for_gateway_type(GatewayType::ApigAi, payload).is_ok());
    }

    #[test]
    fn test_selector_round_trips_through_storage() {
        let selector = ResourceSelector::for_gateway_type(
            GatewayType::Higress,
            json!({"mcpServerName": "svc-A"}),
        )
        .unwrap();
        let stored = selector.to_json().unwrap();
        let loaded = ResourceSelector::from_stored(GatewayType::Higress, &stored).unwrap();
        assert_eq!(selector, loaded);
    }
}
