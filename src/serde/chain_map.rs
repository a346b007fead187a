//! Per-chain maps, keyed in YAML by chain name (`sepolia`) or decimal chain id (`100`).

use alloy::primitives::map::HashMap;
use alloy_chains::Chain;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use std::collections::BTreeMap;

/// Writes named chains by name and others by id, in chain id order.
pub fn serialize<S, V>(map: &HashMap<Chain, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    let ordered: BTreeMap<u64, (String, &V)> =
        map.iter().map(|(chain, v)| (chain.id(), (chain.to_string(), v))).collect();
    serializer.collect_map(ordered.into_values())
}

/// Reads chain keys, rejecting a chain given twice under different keys.
pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<Chain, V>, D::Error>
where
    V: Deserialize<'de>,
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    let mut chains = HashMap::default();
    for (key, value) in raw {
        let chain: Chain =
            key.parse().map_err(|_| D::Error::custom(format!("unknown chain {key}")))?;
        if chains.insert(chain, value).is_some() {
            return Err(D::Error::custom(format!("chain {} configured twice", chain.id())));
        }
    }
    Ok(chains)
}
