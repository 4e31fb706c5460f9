//! Watchlist of item names the user wants deal alerts for
//!
//! The list is kept newest-first, deduplicated by case-insensitive name, and
//! mirrored to the local key-value store after every change. It works fully
//! offline; only `refresh_deals` touches the backend.

use crate::error::Result;
use crate::store::{load_json, save_json, KeyValueStore, WATCHLIST_KEY};
use crate::traits::DealApi;
use cartpath_client::{BrandGroup, WatchlistItem, DEFAULT_WATCH_STATUS};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Subtitle shown once a refresh found nothing for an item
pub const NO_DEALS_SUBTITLE: &str = "No deals yet";

/// Locally tracked watchlist
///
/// # Example
///
/// ```rust,ignore
/// use cartpath_sdk::{MemoryStore, WatchlistStore};
/// use std::sync::Arc;
///
/// let watchlist = WatchlistStore::load(Arc::new(MemoryStore::new()));
/// watchlist.save_item("Oat Milk");
/// assert!(watchlist.is_item_saved("oat milk"));
/// ```
pub struct WatchlistStore {
    items: watch::Sender<Vec<WatchlistItem>>,
    store: Arc<dyn KeyValueStore>,
}

impl WatchlistStore {
    /// Restore the persisted list. A missing or corrupt mirror starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items: Vec<WatchlistItem> = load_json(store.as_ref(), WATCHLIST_KEY).unwrap_or_default();
        debug!(count = items.len(), "Loaded watchlist");

        let (items, _) = watch::channel(items);
        Self { items, store }
    }

    /// Snapshot of the current list, newest first
    pub fn items(&self) -> Vec<WatchlistItem> {
        self.items.borrow().clone()
    }

    /// Receive a notification on every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<WatchlistItem>> {
        self.items.subscribe()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Case-insensitive membership test
    pub fn is_item_saved(&self, name: &str) -> bool {
        self.items.borrow().iter().any(|item| item.has_name(name))
    }

    /// Start watching `name`. Returns the new entry, or `None` if an entry
    /// with the same name (ignoring case) already exists.
    pub fn save_item(&self, name: &str) -> Option<WatchlistItem> {
        let mut created = None;
        self.mutate(|items| {
            if items.iter().any(|item| item.has_name(name)) {
                return false;
            }
            let item = WatchlistItem::new(uuid::Uuid::new_v4().to_string(), name);
            items.insert(0, item.clone());
            created = Some(item);
            true
        });

        if let Some(ref item) = created {
            info!(id = %item.id, name, "Watching item");
        }
        created
    }

    /// Replace the labels of one entry. Unknown ids are ignored.
    pub fn update_item_status(
        &self,
        id: &str,
        status: &str,
        subtitle: &str,
        badge: Option<&str>,
    ) -> bool {
        self.mutate(|items| match items.iter_mut().find(|item| item.id == id) {
            Some(item) => set_labels(item, status, subtitle, badge),
            None => false,
        })
    }

    /// Remove the entry with this id
    pub fn remove_item(&self, id: &str) -> bool {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        })
    }

    /// Remove every entry whose name matches, ignoring case
    pub fn remove_item_by_name(&self, name: &str) -> bool {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|item| !item.has_name(name));
            items.len() != before
        })
    }

    /// Combine the local list with items the server knows about.
    ///
    /// Local entries come first and win on a name clash; later server
    /// entries with a name already present are dropped.
    pub fn merged_with(&self, server_items: &[WatchlistItem]) -> Vec<WatchlistItem> {
        let mut merged = self.items();
        for item in server_items {
            if !merged.iter().any(|existing| existing.has_name(&item.name)) {
                merged.push(item.clone());
            }
        }
        merged
    }

    /// Run one deal-refresh cycle for every watched name.
    ///
    /// Returns how many entries had their labels changed. On a failed fetch
    /// nothing changes.
    pub async fn refresh_deals(&self, deals: &dyn DealApi) -> Result<usize> {
        let names: Vec<String> = self.items.borrow().iter().map(|item| item.name.clone()).collect();
        if names.is_empty() {
            return Ok(0);
        }

        let groups = deals.compare_items(&names).await?;
        Ok(self.apply_deal_groups(&groups))
    }

    /// Update entry labels from fetched deal groups
    pub fn apply_deal_groups(&self, groups: &[BrandGroup]) -> usize {
        let mut updated = 0;
        self.mutate(|items| {
            for group in groups {
                let labels = DealLabels::for_group(group);
                for item in items.iter_mut().filter(|item| item.has_name(&group.item_name)) {
                    if set_labels(item, &labels.status, &labels.subtitle, labels.badge.as_deref()) {
                        updated += 1;
                    }
                }
            }
            updated > 0
        });

        debug!(groups = groups.len(), updated, "Applied deal refresh");
        updated
    }

    /// Apply `f` and persist if it reports a change. Mutation and write
    /// happen under the channel's lock, so they never interleave.
    fn mutate(&self, f: impl FnOnce(&mut Vec<WatchlistItem>) -> bool) -> bool {
        let store = &self.store;
        self.items.send_if_modified(|items| {
            let changed = f(items);
            if changed {
                save_json(store.as_ref(), WATCHLIST_KEY, &*items);
            }
            changed
        })
    }
}

fn set_labels(item: &mut WatchlistItem, status: &str, subtitle: &str, badge: Option<&str>) -> bool {
    let badge = badge.map(str::to_string);
    if item.status == status && item.subtitle == subtitle && item.badge == badge {
        return false;
    }
    item.status = status.to_string();
    item.subtitle = subtitle.to_string();
    item.badge = badge;
    true
}

/// Status, subtitle and badge derived from one deal group
#[derive(Debug, Clone, PartialEq)]
struct DealLabels {
    status: String,
    subtitle: String,
    badge: Option<String>,
}

impl DealLabels {
    fn for_group(group: &BrandGroup) -> Self {
        let count = group.options.len();
        if !group.has_deal() || count == 0 {
            return Self {
                status: DEFAULT_WATCH_STATUS.to_string(),
                subtitle: NO_DEALS_SUBTITLE.to_string(),
                badge: None,
            };
        }

        let status = if count == 1 {
            "1 Deal Found".to_string()
        } else {
            format!("{} Deals Found", count)
        };

        let cheapest = group
            .options
            .iter()
            .filter_map(|option| option.price.map(|price| (option, price)))
            .fold(None, |best: Option<(_, f64)>, (option, price)| match best {
                Some((_, best_price)) if best_price <= price => best,
                _ => Some((option, price)),
            });
        let subtitle = match cheapest {
            Some((option, price)) => format!("Best: {} at ${:.2}", option.brand_name, price),
            None => "Deals available".to_string(),
        };

        let badge = group
            .options
            .iter()
            .filter_map(|option| option.discount_percent())
            .max()
            .filter(|percent| *percent > 0)
            .map(|percent| format!("-{}%", percent));

        Self { status, subtitle, badge }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::store::{FailingStore, MemoryStore};
    use async_trait::async_trait;
    use cartpath_client::{BrandItem, DEAL_FOUND, DEFAULT_WATCH_SUBTITLE};

    struct FakeDeals {
        groups: Option<Vec<BrandGroup>>,
    }

    #[async_trait]
    impl DealApi for FakeDeals {
        async fn compare_items(&self, _items: &[String]) -> Result<Vec<BrandGroup>> {
            self.groups
                .clone()
                .ok_or_else(|| SdkError::Network("offline".to_string()))
        }

        async fn scan_deals(&self, _scan_id: &str) -> Result<Vec<BrandGroup>> {
            Ok(Vec::new())
        }
    }

    fn option(id: &str, brand: &str, price: f64, original: f64) -> BrandItem {
        BrandItem {
            id: id.to_string(),
            brand_name: brand.to_string(),
            price: Some(price),
            original_price: Some(original),
            savings: Some(original - price),
            distance: None,
            est_time: None,
            badge: None,
        }
    }

    fn fresh() -> (WatchlistStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        (WatchlistStore::load(kv.clone()), kv)
    }

    #[test]
    fn test_save_item_dedups_ignoring_case() {
        let (watchlist, _) = fresh();

        let first = watchlist.save_item("Oat Milk").unwrap();
        assert!(watchlist.save_item("oat milk").is_none());
        assert!(watchlist.save_item("OAT MILK").is_none());

        let items = watchlist.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], first);
        assert_eq!(items[0].name, "Oat Milk");
    }

    #[test]
    fn test_new_items_go_first_with_defaults() {
        let (watchlist, _) = fresh();
        watchlist.save_item("eggs");
        watchlist.save_item("bread");

        let items = watchlist.items();
        assert_eq!(items[0].name, "bread");
        assert_eq!(items[1].name, "eggs");
        assert_eq!(items[0].status, DEFAULT_WATCH_STATUS);
        assert_eq!(items[0].subtitle, DEFAULT_WATCH_SUBTITLE);
        assert!(items[0].badge.is_none());
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_names_are_not_trimmed() {
        let (watchlist, _) = fresh();
        watchlist.save_item("milk");
        assert!(watchlist.save_item(" milk").is_some());
        assert_eq!(watchlist.len(), 2);
    }

    #[test]
    fn test_update_status_keeps_identity() {
        let (watchlist, _) = fresh();
        let item = watchlist.save_item("coffee").unwrap();

        assert!(watchlist.update_item_status(&item.id, "3 Deals Found", "Best: Acme", Some("-20%")));
        assert!(!watchlist.update_item_status("missing", "x", "y", None));

        let updated = &watchlist.items()[0];
        assert_eq!(updated.id, item.id);
        assert_eq!(updated.name, "coffee");
        assert_eq!(updated.icon_type, item.icon_type);
        assert_eq!(updated.status, "3 Deals Found");
        assert_eq!(updated.badge.as_deref(), Some("-20%"));
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let (watchlist, _) = fresh();
        let item = watchlist.save_item("rice").unwrap();
        watchlist.save_item("beans");

        assert!(watchlist.remove_item(&item.id));
        let after_first = watchlist.items();
        assert!(!watchlist.remove_item(&item.id));
        assert_eq!(watchlist.items(), after_first);
    }

    #[test]
    fn test_remove_by_name_ignores_case() {
        let (watchlist, _) = fresh();
        watchlist.save_item("Greek Yogurt");
        assert!(watchlist.remove_item_by_name("greek yogurt"));
        assert!(!watchlist.is_item_saved("Greek Yogurt"));
    }

    #[test]
    fn test_persists_and_reloads() {
        let (watchlist, kv) = fresh();
        watchlist.save_item("apples");
        watchlist.save_item("pears");

        let reloaded = WatchlistStore::load(kv);
        assert_eq!(reloaded.items(), watchlist.items());
    }

    #[test]
    fn test_corrupt_mirror_loads_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(WATCHLIST_KEY, b"[{\"id\":").unwrap();

        let watchlist = WatchlistStore::load(kv);
        assert!(watchlist.is_empty());
    }

    #[test]
    fn test_failing_store_keeps_memory_authoritative() {
        let watchlist = WatchlistStore::load(Arc::new(FailingStore));
        assert!(watchlist.is_empty());

        let item = watchlist.save_item("milk").unwrap();
        assert!(watchlist.is_item_saved("MILK"));
        assert!(watchlist.update_item_status(&item.id, "1 Deal Found", "Best: Acme at $1.00", None));
        assert_eq!(watchlist.items()[0].status, "1 Deal Found");

        assert!(watchlist.remove_item(&item.id));
        assert!(watchlist.is_empty());
    }

    #[test]
    fn test_merge_prefers_local_entries() {
        let (watchlist, _) = fresh();
        let local = watchlist.save_item("Milk").unwrap();

        let server = vec![
            WatchlistItem::new("s1", "milk"),
            WatchlistItem::new("s2", "Butter"),
            WatchlistItem::new("s3", "BUTTER"),
        ];
        let merged = watchlist.merged_with(&server);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, local.id);
        assert_eq!(merged[1].id, "s2");
    }

    #[test]
    fn test_subscribers_see_changes() {
        let (watchlist, _) = fresh();
        let mut rx = watchlist.subscribe();
        assert!(!rx.has_changed().unwrap());

        watchlist.save_item("tea");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        watchlist.save_item("TEA");
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_refresh_deals_updates_matching_items() {
        let (watchlist, _) = fresh();
        watchlist.save_item("Milk");
        watchlist.save_item("Saffron");

        let deals = FakeDeals {
            groups: Some(vec![
                BrandGroup {
                    item_name: "milk".to_string(),
                    item_details: "1 gal".to_string(),
                    status: DEAL_FOUND.to_string(),
                    options: vec![option("a", "Acme", 4.0, 5.0), option("b", "Dairy Co", 3.5, 3.5)],
                },
                BrandGroup {
                    item_name: "Saffron".to_string(),
                    item_details: String::new(),
                    status: "NO_DEAL".to_string(),
                    options: Vec::new(),
                },
            ]),
        };

        let updated = watchlist.refresh_deals(&deals).await.unwrap();
        assert_eq!(updated, 2);

        let items = watchlist.items();
        let milk = items.iter().find(|i| i.name == "Milk").unwrap();
        assert_eq!(milk.status, "2 Deals Found");
        assert_eq!(milk.subtitle, "Best: Dairy Co at $3.50");
        assert_eq!(milk.badge.as_deref(), Some("-20%"));

        let saffron = items.iter().find(|i| i.name == "Saffron").unwrap();
        assert_eq!(saffron.status, DEFAULT_WATCH_STATUS);
        assert_eq!(saffron.subtitle, NO_DEALS_SUBTITLE);

        let mut rx = watchlist.subscribe();
        rx.borrow_and_update();
        assert_eq!(watchlist.refresh_deals(&deals).await.unwrap(), 0);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_failed_refresh_changes_nothing() {
        let (watchlist, _) = fresh();
        watchlist.save_item("Milk");
        let before = watchlist.items();

        let result = watchlist.refresh_deals(&FakeDeals { groups: None }).await;
        assert!(result.is_err());
        assert_eq!(watchlist.items(), before);
    }
}
