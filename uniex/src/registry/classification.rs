use serde::Deserialize;
use smol_str::SmolStr;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
    sync::OnceLock,
};
use tracing::warn;
use uniex_spec::Classification;

/// Priority tier of an exchange for integration and testing order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum PriorityTier {
    Tier1,
    Tier2,
    Tier3,
    Dex,
    Unclassified,
}

impl Display for PriorityTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tier = match self {
            PriorityTier::Tier1 => "tier1",
            PriorityTier::Tier2 => "tier2",
            PriorityTier::Tier3 => "tier3",
            PriorityTier::Dex => "dex",
            PriorityTier::Unclassified => "unclassified",
        };
        write!(f, "{tier}")
    }
}

#[derive(Deserialize)]
struct ClassificationTables {
    all_exchanges: Vec<SmolStr>,
    certified_exchanges: Vec<SmolStr>,
    pro_exchanges: Vec<SmolStr>,
    testnet_exchanges: Vec<SmolStr>,
}

#[derive(Deserialize, Default)]
struct TierTables {
    #[serde(default)]
    tier1: Vec<SmolStr>,
    #[serde(default)]
    tier2: Vec<SmolStr>,
    #[serde(default)]
    tier3: Vec<SmolStr>,
    #[serde(default)]
    dex: Vec<SmolStr>,
}

/// Cross-exchange classification registry, derived once from the two static tables.
///
/// Derived sets partition the universe: `certified_pro = certified ∩ pro`,
/// `pro_only = pro \ certified`, `supported = all \ pro`.
#[derive(Debug, Default)]
pub struct Registry {
    all: BTreeSet<SmolStr>,
    certified_pro: BTreeSet<SmolStr>,
    pro_only: BTreeSet<SmolStr>,
    supported: BTreeSet<SmolStr>,
    testnet: BTreeSet<SmolStr>,
    tiers: BTreeMap<SmolStr, PriorityTier>,
}

const CLASSIFICATION_JSON: &str = include_str!("../../data/classification.json");
const PRIORITY_TIERS_JSON: &str = include_str!("../../data/priority_tiers.json");

fn build() -> Registry {
    let tables = match serde_json::from_str::<ClassificationTables>(CLASSIFICATION_JSON) {
        Ok(tables) => tables,
        Err(error) => {
            warn!(%error, "classification table is malformed; registry is empty");
            return Registry::default();
        }
    };
    let tiers = serde_json::from_str::<TierTables>(PRIORITY_TIERS_JSON).unwrap_or_else(|error| {
        warn!(%error, "priority tier table is malformed; tiers default to unclassified");
        TierTables::default()
    });

    let all: BTreeSet<SmolStr> = tables.all_exchanges.into_iter().collect();
    let certified: BTreeSet<SmolStr> = tables.certified_exchanges.into_iter().collect();
    let pro: BTreeSet<SmolStr> = tables.pro_exchanges.into_iter().collect();

    let certified_pro: BTreeSet<SmolStr> = certified.intersection(&pro).cloned().collect();
    let pro_only: BTreeSet<SmolStr> = pro.difference(&certified).cloned().collect();
    let supported: BTreeSet<SmolStr> = all.difference(&pro).cloned().collect();

    let mut tier_map = BTreeMap::new();
    for (ids, tier) in [
        (tiers.tier1, PriorityTier::Tier1),
        (tiers.tier2, PriorityTier::Tier2),
        (tiers.tier3, PriorityTier::Tier3),
        (tiers.dex, PriorityTier::Dex),
    ] {
        for id in ids {
            tier_map.insert(id, tier);
        }
    }

    Registry {
        all,
        certified_pro,
        pro_only,
        supported,
        testnet: tables.testnet_exchanges.into_iter().collect(),
        tiers: tier_map,
    }
}

/// The process-lifetime registry, built on first use from the embedded tables.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(build)
}

impl Registry {
    pub fn is_known(&self, id: &str) -> bool {
        self.all.contains(id)
    }

    pub fn is_certified_pro(&self, id: &str) -> bool {
        self.certified_pro.contains(id)
    }

    /// Pro flag: certified or not.
    pub fn is_pro(&self, id: &str) -> bool {
        self.certified_pro.contains(id) || self.pro_only.contains(id)
    }

    pub fn is_tier1(&self, id: &str) -> bool {
        self.priority_tier(id) == PriorityTier::Tier1
    }

    pub fn has_testnet(&self, id: &str) -> bool {
        self.testnet.contains(id)
    }

    pub fn classification(&self, id: &str) -> Classification {
        if self.certified_pro.contains(id) {
            Classification::CertifiedPro
        } else if self.pro_only.contains(id) {
            Classification::Pro
        } else {
            Classification::Supported
        }
    }

    pub fn priority_tier(&self, id: &str) -> PriorityTier {
        self.tiers
            .get(id)
            .copied()
            .unwrap_or(PriorityTier::Unclassified)
    }

    pub fn all(&self) -> impl Iterator<Item = &SmolStr> {
        self.all.iter()
    }

    pub fn certified_pro(&self) -> &BTreeSet<SmolStr> {
        &self.certified_pro
    }

    pub fn pro_only(&self) -> &BTreeSet<SmolStr> {
        &self.pro_only
    }

    pub fn supported(&self) -> &BTreeSet<SmolStr> {
        &self.supported
    }

    pub fn counts(&self) -> ClassificationCounts {
        ClassificationCounts {
            certified_pro: self.certified_pro.len(),
            pro_only: self.pro_only.len(),
            supported: self.supported.len(),
            total: self.all.len(),
        }
    }

    /// Tier-1 exchanges carrying the certified pro classification.
    pub fn tier1_certified_pro(&self) -> Vec<SmolStr> {
        self.certified_pro
            .iter()
            .filter(|id| self.is_tier1(id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClassificationCounts {
    pub certified_pro: usize,
    pub pro_only: usize,
    pub supported: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_partition_the_universe() {
        let registry = registry();
        let counts = registry.counts();
        assert_eq!(
            counts.certified_pro + counts.pro_only + counts.supported,
            counts.total
        );

        for id in registry.all() {
            let buckets = [
                registry.certified_pro().contains(id),
                registry.pro_only().contains(id),
                registry.supported().contains(id),
            ];
            assert_eq!(
                buckets.iter().filter(|in_bucket| **in_bucket).count(),
                1,
                "{id} must be in exactly one classification bucket"
            );
        }
    }

    #[test]
    fn test_every_exchange_has_exactly_one_tier() {
        let registry = registry();
        for id in registry.all() {
            // priority_tier is total: unlisted exchanges are Unclassified.
            let _ = registry.priority_tier(id);
        }
        assert_eq!(registry.priority_tier("no_such_exchange"), PriorityTier::Unclassified);
    }

    #[test]
    fn test_certified_pro_is_certified_and_pro() {
        let registry = registry();
        for id in registry.certified_pro() {
            assert!(registry.is_pro(id));
            assert_eq!(registry.classification(id), Classification::CertifiedPro);
        }
    }
}
