//! Run configuration: environment-sourced paths and the campaign file.
//!
//! File locations come from the environment; everything that defines the
//! distribution itself (step range, budgets, pool tables, exclusion sets)
//! lives in a JSON campaign file so a run is reproducible from one
//! artifact.

use crate::domain::{Address, Amount, PoolId, PoolRegistry, PoolSpec, Pricing, Timestamp};
use crate::engine::distribution::RewardSchedule;
use crate::engine::ledger::OverdraftPolicy;
use crate::engine::swap_volume::SwapSettings;
use crate::engine::timestamp::StepClock;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

/// Reward token precision: 18-decimal fixed point.
pub const REWARD_TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("failed to parse campaign file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid campaign: {0}")]
    Invalid(String),
}

/// Input/output locations, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Paths {
    pub campaign_config: PathBuf,
    pub event_log: PathBuf,
    pub prices: PathBuf,
    pub swap_log: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Paths {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |key: &str| -> Result<PathBuf, ConfigError> {
            env_map
                .get(key)
                .map(PathBuf::from)
                .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
        };

        Ok(Paths {
            campaign_config: required("CAMPAIGN_CONFIG_PATH")?,
            event_log: required("EVENT_LOG_PATH")?,
            prices: required("PRICES_PATH")?,
            swap_log: env_map.get("SWAP_LOG_PATH").map(PathBuf::from),
            output_dir: env_map
                .get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./out")),
        })
    }
}

/// Raw campaign file shape. Validated into `Campaign` before use.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignFile {
    pub start_step: u64,
    pub end_step: u64,
    /// First step outside the guarded launch window. Set equal to
    /// `start_step` for campaigns without one.
    pub guarded_launch_end_step: u64,
    /// Wall-clock time of `start_step`, unix seconds.
    pub start_timestamp: i64,
    /// Average inter-step duration for timestamp extrapolation, seconds.
    pub average_step_secs: i64,
    /// LP reward budget in whole tokens.
    pub total_reward_tokens: u64,
    pub ledger_mode: LedgerMode,
    pub pools: Vec<PoolEntry>,
    #[serde(default)]
    pub excluded_addresses: Vec<Address>,
    #[serde(default)]
    pub metapools: Vec<MetapoolEntry>,
    #[serde(default)]
    pub swap: Option<SwapEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    pub symbol: String,
    pub lp_token_address: Address,
    /// Oracle asset for valuation; omit (or null) for USD-pegged pools.
    #[serde(default)]
    pub pricing_asset: Option<String>,
    pub asset_decimals: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetapoolEntry {
    pub address: Address,
    /// Symbol of the base pool whose LP tokens this metapool holds.
    pub base_pool: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapEntry {
    /// Swap reward budget in whole tokens.
    pub total_reward_tokens: u64,
    /// Minimum cumulative swap volume in whole USD (strictly greater-than).
    pub min_swap_value_usd: u64,
    #[serde(default)]
    pub blocklist: Vec<Address>,
}

/// Validated campaign, ready for the replay loop.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub registry: PoolRegistry,
    pub schedule: RewardSchedule,
    pub clock: StepClock,
    pub overdraft_policy: OverdraftPolicy,
    /// Staking/auto-compounder contracts filtered out of transfers.
    pub excluded_addresses: HashSet<Address>,
    /// (metapool address, base pool) pairs for TVL deduplication.
    pub metapools: Vec<(Address, PoolId)>,
    /// The metapool addresses alone, for reward exclusion.
    pub metapool_addresses: HashSet<Address>,
    pub swap: Option<SwapSettings>,
}

impl Campaign {
    /// Parse and validate a campaign file.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let file: CampaignFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    pub fn from_file(file: CampaignFile) -> Result<Self, ConfigError> {
        if file.end_step < file.start_step {
            return Err(ConfigError::Invalid(format!(
                "end_step {} precedes start_step {}",
                file.end_step, file.start_step
            )));
        }
        if file.average_step_secs <= 0 {
            return Err(ConfigError::Invalid(
                "average_step_secs must be positive".to_string(),
            ));
        }
        if file.pools.is_empty() {
            return Err(ConfigError::Invalid("no pools configured".to_string()));
        }
        if file.pools.len() > u16::MAX as usize {
            return Err(ConfigError::Invalid("too many pools".to_string()));
        }

        let mut seen_symbols = HashSet::new();
        let mut seen_addresses = HashSet::new();
        let mut specs = Vec::with_capacity(file.pools.len());
        for (index, entry) in file.pools.iter().enumerate() {
            if !seen_symbols.insert(entry.symbol.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pool symbol {}",
                    entry.symbol
                )));
            }
            if !seen_addresses.insert(entry.lp_token_address.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pool address {}",
                    entry.lp_token_address
                )));
            }
            if entry.asset_decimals.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pool {} has an empty asset_decimals table",
                    entry.symbol
                )));
            }
            specs.push(PoolSpec {
                id: PoolId(index as u16),
                symbol: entry.symbol.clone(),
                lp_token: entry.lp_token_address.clone(),
                pricing: match &entry.pricing_asset {
                    Some(asset) => Pricing::Oracle(asset.clone()),
                    None => Pricing::Pegged,
                },
                asset_decimals: entry.asset_decimals.clone(),
            });
        }
        let registry = PoolRegistry::new(specs);

        let mut metapools = Vec::with_capacity(file.metapools.len());
        let mut metapool_addresses = HashSet::new();
        for entry in &file.metapools {
            let base_pool = registry.resolve_symbol(&entry.base_pool).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "metapool {} references unknown base pool {}",
                    entry.address, entry.base_pool
                ))
            })?;
            metapools.push((entry.address.clone(), base_pool));
            metapool_addresses.insert(entry.address.clone());
        }

        let budget = whole_tokens_to_base_units(file.total_reward_tokens);
        let schedule = RewardSchedule::from_budget(
            file.start_step,
            file.end_step,
            file.guarded_launch_end_step,
            budget,
        );
        let clock = StepClock::new(
            file.start_step,
            Timestamp::new(file.start_timestamp),
            file.average_step_secs,
        );

        let swap = file.swap.as_ref().map(|entry| SwapSettings {
            budget: whole_tokens_to_base_units(entry.total_reward_tokens),
            // Whole USD to 2-decimal ticks.
            min_volume_ticks: entry.min_swap_value_usd as u128 * 100,
            blocklist: entry.blocklist.iter().cloned().collect(),
        });

        Ok(Campaign {
            registry,
            schedule,
            clock,
            overdraft_policy: match file.ledger_mode {
                LedgerMode::Strict => OverdraftPolicy::Strict,
                LedgerMode::Lenient => OverdraftPolicy::ClampAndCount,
            },
            excluded_addresses: file.excluded_addresses.into_iter().collect(),
            metapools,
            metapool_addresses,
            swap,
        })
    }
}

fn whole_tokens_to_base_units(tokens: u64) -> Amount {
    // u64 tokens × 10^18 stays far inside 256 bits.
    Amount::from_u64(tokens)
        .checked_mul(Amount::pow10(REWARD_TOKEN_DECIMALS))
        .unwrap_or(Amount::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("CAMPAIGN_CONFIG_PATH".to_string(), "/tmp/campaign.json".to_string());
        map.insert("EVENT_LOG_PATH".to_string(), "/tmp/events.json".to_string());
        map.insert("PRICES_PATH".to_string(), "/tmp/prices.csv".to_string());
        map
    }

    fn campaign_json() -> String {
        r#"{
            "start_step": 10,
            "end_step": 20,
            "guarded_launch_end_step": 13,
            "start_timestamp": 1611072272,
            "average_step_secs": 13,
            "total_reward_tokens": 1400,
            "ledger_mode": "lenient",
            "pools": [
                {
                    "symbol": "BTC",
                    "lp_token_address": "0x4f6a43ad7cba042606decaca730d4ce0a57ac62e",
                    "pricing_asset": "BTC",
                    "asset_decimals": [18, 8, 8, 18]
                },
                {
                    "symbol": "USD",
                    "lp_token_address": "0x3911f80530595fbd01ab1516ab61255d75aeb066",
                    "asset_decimals": [18, 6, 6]
                }
            ],
            "excluded_addresses": ["0x9999999999999999999999999999999999999999"],
            "metapools": [
                {"address": "0x5555555555555555555555555555555555555555", "base_pool": "USD"}
            ],
            "swap": {
                "total_reward_tokens": 500,
                "min_swap_value_usd": 100,
                "blocklist": ["0x8888888888888888888888888888888888888888"]
            }
        }"#
        .to_string()
    }

    #[test]
    fn test_paths_missing_required_env() {
        let mut map = env();
        map.remove("EVENT_LOG_PATH");
        match Paths::from_env_map(map) {
            Err(ConfigError::MissingEnv(key)) => assert_eq!(key, "EVENT_LOG_PATH"),
            other => panic!("expected MissingEnv, got {:?}", other),
        }
    }

    #[test]
    fn test_paths_defaults_output_dir() {
        let paths = Paths::from_env_map(env()).unwrap();
        assert_eq!(paths.output_dir, PathBuf::from("./out"));
        assert!(paths.swap_log.is_none());
    }

    #[test]
    fn test_campaign_parses_and_validates() {
        let campaign = Campaign::from_json(&campaign_json()).unwrap();
        assert_eq!(campaign.registry.len(), 2);
        assert_eq!(campaign.schedule.effective_steps(), 14);
        assert_eq!(
            campaign.schedule.budget,
            Amount::from_base10("1400000000000000000000").unwrap()
        );
        assert_eq!(
            campaign.schedule.tokens_per_step,
            Amount::from_base10("100000000000000000000").unwrap()
        );
        assert_eq!(campaign.overdraft_policy, OverdraftPolicy::ClampAndCount);
        assert_eq!(campaign.metapools.len(), 1);
        let swap = campaign.swap.unwrap();
        assert_eq!(swap.min_volume_ticks, 10_000);
    }

    #[test]
    fn test_campaign_usd_pool_is_pegged() {
        let campaign = Campaign::from_json(&campaign_json()).unwrap();
        let usd = campaign.registry.resolve("USD").unwrap();
        assert_eq!(campaign.registry.spec(usd).pricing, Pricing::Pegged);
    }

    #[test]
    fn test_campaign_rejects_unknown_base_pool() {
        let raw = campaign_json().replace("\"base_pool\": \"USD\"", "\"base_pool\": \"XYZ\"");
        match Campaign::from_json(&raw) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("unknown base pool")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_campaign_rejects_duplicate_symbol() {
        let raw = campaign_json().replace("\"symbol\": \"USD\"", "\"symbol\": \"BTC\"");
        match Campaign::from_json(&raw) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("duplicate pool symbol")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_campaign_rejects_inverted_range() {
        let raw = campaign_json().replace("\"end_step\": 20", "\"end_step\": 5");
        assert!(matches!(Campaign::from_json(&raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_campaign_rejects_bad_ledger_mode() {
        let raw = campaign_json().replace("\"lenient\"", "\"permissive\"");
        assert!(matches!(Campaign::from_json(&raw), Err(ConfigError::Parse(_))));
    }
}
