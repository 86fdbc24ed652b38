//! Gateway Entities
//!
//! An imported backend traffic-management instance. Each provider type has
//! its own credential shape; credentials are validated at import time and
//! are write-only afterwards (they never appear in responses).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{PortalError, Result};

/// Supported gateway provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayType {
    ApigApi,
    ApigAi,
    AdpAiGateway,
    Higress,
}

impl GatewayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApigApi => "APIG_API",
            Self::ApigAi => "APIG_AI",
            Self::AdpAiGateway => "ADP_AI_GATEWAY",
            Self::Higress => "HIGRESS",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "APIG_API" => Ok(Self::ApigApi),
            "APIG_AI" => Ok(Self::ApigAi),
            "ADP_AI_GATEWAY" => Ok(Self::AdpAiGateway),
            "HIGRESS" => Ok(Self::Higress),
            other => Err(PortalError::validation(format!(
                "Unknown gateway type: {}",
                other
            ))),
        }
    }

    /// Prefix for generated gateway ids, e.g. `higress-…`.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::ApigApi => "apig",
            Self::ApigAi => "apig-ai",
            Self::AdpAiGateway => "adp",
            Self::Higress => "higress",
        }
    }

    /// AI gateways expose MCP servers rather than REST APIs.
    pub fn is_ai_gateway(&self) -> bool {
        matches!(self, Self::ApigAi | Self::AdpAiGateway)
    }
}

impl std::fmt::Display for GatewayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the cloud APIG gateways (`APIG_API` / `APIG_AI`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApigAuthConfig {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Auth mode for the ADP AI gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdpAuthType {
    Seed,
    Header,
}

/// A single custom auth header for the ADP AI gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthHeader {
    pub key: String,
    pub value: String,
}

/// Credentials for `ADP_AI_GATEWAY`.
///
/// `auth_seed` and `auth_headers` are mutually exclusive; validation clears
/// whichever does not match `auth_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdpAuthConfig {
    pub base_url: String,
    pub port: u32,
    pub auth_type: AdpAuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_headers: Option<Vec<AuthHeader>>,
}

/// Credentials for `HIGRESS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HigressAuthConfig {
    pub address: String,
    pub username: String,
    pub password: String,
}

/// Per-type credential variant. The variant is selected by the gateway
/// type, never inferred from which fields happen to be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayAuthConfig {
    Apig(ApigAuthConfig),
    Adp(AdpAuthConfig),
    Higress(HigressAuthConfig),
}

impl GatewayAuthConfig {
    /// Decode and validate a raw credential payload for the given type.
    /// Fails with a validation error before anything is persisted.
    pub fn for_gateway_type(gateway_type: GatewayType, raw: serde_json::Value) -> Result<Self> {
        match gateway_type {
            GatewayType::ApigApi | GatewayType::ApigAi => {
                let config: ApigAuthConfig = decode(raw)?;
                if config.region.is_empty()
                    || config.access_key.is_empty()
                    || config.secret_key.is_empty()
                {
                    return Err(PortalError::validation(
                        "APIG auth config requires region, accessKey and secretKey",
                    ));
                }
                Ok(Self::Apig(config))
            }
            GatewayType::AdpAiGateway => {
                let mut config: AdpAuthConfig = decode(raw)?;
                if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://")
                {
                    return Err(PortalError::validation(
                        "ADP AI gateway baseUrl must start with http:// or https://",
                    ));
                }
                if config.port == 0 || config.port > 65535 {
                    return Err(PortalError::validation(format!(
                        "ADP AI gateway port out of range: {}",
                        config.port
                    )));
                }
                match config.auth_type {
                    AdpAuthType::Seed => {
                        if config.auth_seed.as_deref().unwrap_or("").is_empty() {
                            return Err(PortalError::validation(
                                "authType Seed requires a non-empty authSeed",
                            ));
                        }
                        // Seed and Header credentials are mutually exclusive.
                        config.auth_headers = None;
                    }
                    AdpAuthType::Header => {
                        let headers = config.auth_headers.as_deref().unwrap_or(&[]);
                        if headers.is_empty() {
                            return Err(PortalError::validation(
                                "authType Header requires at least one authHeaders entry",
                            ));
                        }
                        config.auth_seed = None;
                    }
                }
                Ok(Self::Adp(config))
            }
            GatewayType::Higress => {
                let config: HigressAuthConfig = decode(raw)?;
                if config.address.is_empty()
                    || config.username.is_empty()
                    || config.password.is_empty()
                {
                    return Err(PortalError::validation(
                        "Higress auth config requires address, username and password",
                    ));
                }
                Ok(Self::Higress(config))
            }
        }
    }

    /// Re-decode a stored credential blob; the stored shape was validated at
    /// import time, so failures here are internal errors, not user errors.
    pub fn from_stored(gateway_type: GatewayType, json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        Self::for_gateway_type(gateway_type, raw)
            .map_err(|e| PortalError::internal(format!("Stored auth config is invalid: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// A non-secret hint at where the gateway lives, safe to echo back.
    pub fn endpoint_hint(&self) -> String {
        match self {
            Self::Apig(c) => c.region.clone(),
            Self::Adp(c) => format!("{}:{}", c.base_url, c.port),
            Self::Higress(c) => c.address.clone(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: serde_json::Value) -> Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| PortalError::validation(format!("Malformed auth config: {}", e)))
}

/// An imported gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub gateway_id: String,
    pub gateway_type: GatewayType,
    pub auth_config: GatewayAuthConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gateway {
    pub fn new(gateway_type: GatewayType, auth_config: GatewayAuthConfig) -> Self {
        let now = Utc::now();
        Self {
            gateway_id: portal_common::id::gateway_id(gateway_type.id_prefix()),
            gateway_type,
            auth_config,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apig_auth_requires_all_fields() {
        let err = GatewayAuthConfig::for_gateway_type(
            GatewayType::ApigApi,
            json!({"region": "cn-hangzhou", "accessKey": "ak"}),
        )
        .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        let ok = GatewayAuthConfig::for_gateway_type(
            GatewayType::ApigApi,
            json!({"region": "cn-hangzhou", "accessKey": "ak", "secretKey": "sk"}),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_adp_seed_clears_headers() {
        let config = GatewayAuthConfig::for_gateway_type(
            GatewayType::AdpAiGateway,
            json!({
                "baseUrl": "https://adp.internal",
                "port": 8443,
                "authType": "Seed",
                "authSeed": "seed-value",
                "authHeaders": [{"key": "X-Token", "value": "t"}]
            }),
        )
        .unwrap();
        match config {
            GatewayAuthConfig::Adp(c) => {
                assert_eq!(c.auth_seed.as_deref(), Some("seed-value"));
                assert!(c.auth_headers.is_none());
            }
            _ => panic!("expected ADP config"),
        }
    }

    #[test]
    fn test_adp_header_requires_headers() {
        let err = GatewayAuthConfig::for_gateway_type(
            GatewayType::AdpAiGateway,
            json!({
                "baseUrl": "https://adp.internal",
                "port": 8443,
                "authType": "Header"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));
    }

    #[test]
    fn test_adp_rejects_bad_base_url_and_port() {
        let err = GatewayAuthConfig::for_gateway_type(
            GatewayType::AdpAiGateway,
            json!({
                "baseUrl": "adp.internal",
                "port": 8443,
                "authType": "Seed",
                "authSeed": "s"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        let err = GatewayAuthConfig::for_gateway_type(
            GatewayType::AdpAiGateway,
            json!({
                "baseUrl": "https://adp.internal",
                "port": 0,
                "authType": "Seed",
                "authSeed": "s"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));
    }

    #[test]
    fn test_higress_endpoint_hint_hides_credentials() {
        let config = GatewayAuthConfig::for_gateway_type(
            GatewayType::Higress,
            json!({"address": "http://higress:8001", "username": "admin", "password": "pw"}),
        )
        .unwrap();
        let hint = config.endpoint_hint();
        assert_eq!(hint, "http://higress:8001");
        assert!(!hint.contains("pw"));
    }

    #[test]
    fn test_gateway_type_round_trip() {
        for t in [
            GatewayType::ApigApi,
            GatewayType::ApigAi,
            GatewayType::AdpAiGateway,
            GatewayType::Higress,
        ] {
            assert_eq!(GatewayType::parse(t.as_str()).unwrap(), t);
        }
        assert!(GatewayType::parse("NACOS").is_err());
    }
}
