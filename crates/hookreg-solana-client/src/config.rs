//! Client configuration.
//!
//! `ClientConfig` is an explicit, serializable value. The library never reads
//! environment variables; the CLI loads a JSON file and applies flag
//! overrides before handing the result in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::constants::{
    DEFAULT_RPC_URL, DEFAULT_WHIRLPOOLS_CONFIG, REGISTRY_PROGRAM_ID, TOKEN_2022_PROGRAM_ID,
    WHIRLPOOL_PROGRAM_ID,
};
use crate::error::InputError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
    pub programs: ProgramIds,
    pub confirm: ConfirmSettings,
    #[serde(with = "pubkey_string")]
    pub whirlpools_config: Pubkey,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: Commitment::Confirmed,
            programs: ProgramIds::default(),
            confirm: ConfirmSettings::default(),
            whirlpools_config: DEFAULT_WHIRLPOOLS_CONFIG,
        }
    }
}

impl ClientConfig {
    pub fn from_json(s: &str) -> Result<Self, InputError> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| InputError::Other(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.rpc_url.trim().is_empty() {
            return Err(InputError::Other("rpc_url must not be empty".to_string()));
        }
        self.programs.validate()?;
        self.confirm.validate()
    }
}

/// Commitment level used for reads and confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    pub fn to_config(self) -> CommitmentConfig {
        match self {
            Self::Processed => CommitmentConfig::processed(),
            Self::Confirmed => CommitmentConfig::confirmed(),
            Self::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Program ids the client talks to. Overridable for local validators.
///
/// The associated-token program is not listed: its address is fixed and
/// every associated account is derived under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramIds {
    #[serde(with = "pubkey_string")]
    pub registry: Pubkey,
    #[serde(with = "pubkey_string")]
    pub whirlpool: Pubkey,
    /// Token program that owns hooked mints; must be an SPL token program.
    #[serde(with = "pubkey_string")]
    pub token_2022: Pubkey,
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self {
            registry: REGISTRY_PROGRAM_ID,
            whirlpool: WHIRLPOOL_PROGRAM_ID,
            token_2022: TOKEN_2022_PROGRAM_ID,
        }
    }
}

impl ProgramIds {
    pub fn validate(&self) -> Result<(), InputError> {
        spl_token_2022::check_spl_token_program_account(&self.token_2022).map_err(|_| {
            InputError::Other(format!(
                "programs.token_2022 {} is not an SPL token program",
                self.token_2022
            ))
        })
    }
}

/// Confirmation polling bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmSettings {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            poll_interval_ms: 500,
        }
    }
}

impl ConfirmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.timeout_ms == 0 {
            return Err(InputError::Other(
                "confirm.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > self.timeout_ms {
            return Err(InputError::Other(
                "confirm.poll_interval_ms must be in 1..=timeout_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Base58 string (de)serialization for addresses in config files.
pub mod pubkey_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(d)?;
        crate::catalog::parse_pubkey(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ClientConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ClientConfig::from_json(
            r#"{"rpc_url":"http://127.0.0.1:8899","commitment":"processed",
                "programs":{"registry":"11111111111111111111111111111111"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(cfg.commitment, Commitment::Processed);
        assert_eq!(cfg.programs.registry, Pubkey::default());
        assert_eq!(cfg.programs.whirlpool, WHIRLPOOL_PROGRAM_ID);
        assert_eq!(cfg.confirm, ConfirmSettings::default());
    }

    #[test]
    fn addresses_serialize_as_base58() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(
            json["programs"]["registry"],
            serde_json::Value::String(REGISTRY_PROGRAM_ID.to_string())
        );
    }

    #[test]
    fn bad_poll_interval_detected() {
        let cfg = ClientConfig {
            confirm: ConfirmSettings {
                timeout_ms: 100,
                poll_interval_ms: 200,
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn token_program_must_be_spl() {
        let cfg = ClientConfig {
            programs: ProgramIds {
                token_2022: Pubkey::new_unique(),
                ..ProgramIds::default()
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn retired_program_keys_are_ignored() {
        let cfg = ClientConfig::from_json(
            r#"{"programs":{"token":"TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "associated_token":"11111111111111111111111111111111"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.programs, ProgramIds::default());
    }

    #[test]
    fn bad_address_rejected() {
        assert!(ClientConfig::from_json(r#"{"whirlpools_config":"zzz"}"#).is_err());
    }
}
