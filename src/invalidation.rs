//! Invalidation Policy Module
//!
//! Maps application mutation events to the cache groups they stale out.
//! Data-access code calls [`apply_mutation`] after a successful write to the
//! remote API; the cache never observes the network layer itself.

use futures::future::join_all;
use tracing::debug;

use crate::cache::HybridCache;

// == Invalidation Group ==
/// A namespace of related cache keys purged together.
///
/// Every cache key belongs to exactly one group: its namespace starts with
/// the group prefix, so substring invalidation on the prefix catches every
/// parameterized variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationGroup {
    MenuItems,
    UserProfile,
    Orders,
    Rewards,
    Locations,
}

impl InvalidationGroup {
    /// The key prefix this group owns.
    pub fn prefix(&self) -> &'static str {
        match self {
            InvalidationGroup::MenuItems => "menu_items",
            InvalidationGroup::UserProfile => "user_profile",
            InvalidationGroup::Orders => "orders",
            InvalidationGroup::Rewards => "rewards",
            InvalidationGroup::Locations => "locations",
        }
    }
}

// == Mutation Event ==
/// Application mutation events that stale cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent {
    ProfileUpdated,
    OrderPlaced,
    OrderCancelled,
    MenuChanged,
    RewardRedeemed,
}

impl MutationEvent {
    /// The groups purged when this event fires.
    ///
    /// An order mutation also touches rewards (points accrue per order);
    /// redeeming a reward changes the profile's balance.
    pub fn groups(&self) -> &'static [InvalidationGroup] {
        match self {
            MutationEvent::ProfileUpdated => &[InvalidationGroup::UserProfile],
            MutationEvent::OrderPlaced => {
                &[InvalidationGroup::Orders, InvalidationGroup::Rewards]
            }
            MutationEvent::OrderCancelled => &[InvalidationGroup::Orders],
            MutationEvent::MenuChanged => &[InvalidationGroup::MenuItems],
            MutationEvent::RewardRedeemed => {
                &[InvalidationGroup::Rewards, InvalidationGroup::UserProfile]
            }
        }
    }
}

// == Apply Mutation ==
/// Purges every group mapped to `event`, concurrently.
///
/// Invalidation is advisory cleanup: failures inside a group are already
/// absorbed by the cache, and no group is skipped because another one
/// failed. Never propagates an error.
pub async fn apply_mutation(cache: &HybridCache, event: MutationEvent) {
    let groups = event.groups();

    let removed: usize = join_all(
        groups
            .iter()
            .map(|group| cache.invalidate(group.prefix())),
    )
    .await
    .into_iter()
    .sum();

    debug!(?event, ?groups, removed, "mutation invalidated cached data");
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn cache() -> HybridCache {
        HybridCache::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_every_event_maps_to_groups() {
        let events = [
            MutationEvent::ProfileUpdated,
            MutationEvent::OrderPlaced,
            MutationEvent::OrderCancelled,
            MutationEvent::MenuChanged,
            MutationEvent::RewardRedeemed,
        ];
        for event in events {
            assert!(!event.groups().is_empty());
        }
    }

    #[tokio::test]
    async fn test_order_placed_purges_orders_and_rewards() {
        let cache = cache();
        let ttl = Duration::from_secs(60);

        cache.set("orders?status=open", json!([]), ttl).await.unwrap();
        cache.set("rewards", json!({"points": 10}), ttl).await.unwrap();
        cache.set("menu_items", json!([1]), ttl).await.unwrap();

        apply_mutation(&cache, MutationEvent::OrderPlaced).await;

        assert!(cache.get("orders?status=open").await.is_none());
        assert!(cache.get("rewards").await.is_none());
        assert!(cache.get("menu_items").await.is_some());
    }

    #[tokio::test]
    async fn test_profile_update_leaves_orders() {
        let cache = cache();
        let ttl = Duration::from_secs(60);

        cache.set("user_profile", json!({"name": "a"}), ttl).await.unwrap();
        cache.set("orders", json!([]), ttl).await.unwrap();

        apply_mutation(&cache, MutationEvent::ProfileUpdated).await;

        assert!(cache.get("user_profile").await.is_none());
        assert!(cache.get("orders").await.is_some());
    }

    #[tokio::test]
    async fn test_apply_mutation_on_empty_cache_is_noop() {
        let cache = cache();
        apply_mutation(&cache, MutationEvent::MenuChanged).await;
    }
}
