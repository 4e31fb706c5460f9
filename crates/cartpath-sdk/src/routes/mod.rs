//! Plan/route cache
//!
//! The single authoritative in-memory ledger of the user's shopping plans.
//! It is reconciled with the backend and mirrored to the local key-value
//! store for offline continuity.
//!
//! ## Ordering
//!
//! History is most-recent-first: new plans are prepended, and a refresh
//! takes the server's order as-is (the backend returns newest first).
//!
//! ## Single writer
//!
//! Every mutating operation holds the cache's writer lock from start to
//! finish, including the remote round trip. State is only touched after the
//! remote call has resumed, so readers see either the state before the call
//! or the state after it, and dropping an in-flight future changes nothing.
//!
//! ## Plan lifecycle
//!
//! ```text
//! active --complete_plan--> completed
//! active | completed --delete_plan--> (removed)
//! ```

use crate::error::{Result, SdkError};
use crate::store::{load_json, save_json, KeyValueStore, LIFETIME_STATS_KEY, ROUTE_HISTORY_KEY};
use crate::traits::PlanApi;
use cartpath_client::{LifetimeStats, PlanStatus, RouteDetails, RouteHistoryItem};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// In-memory plan history with a local mirror
pub struct RouteCache {
    api: Arc<dyn PlanApi>,
    store: Arc<dyn KeyValueStore>,
    /// Signed-in user, required for server-scoped operations
    user_id: RwLock<Option<String>>,
    history: watch::Sender<Vec<RouteHistoryItem>>,
    stats: watch::Sender<LifetimeStats>,
    writer: Mutex<()>,
}

impl RouteCache {
    /// Create an empty cache. Call `load_cached` to restore the mirror.
    pub fn new(api: Arc<dyn PlanApi>, store: Arc<dyn KeyValueStore>) -> Self {
        let (history, _) = watch::channel(Vec::new());
        let (stats, _) = watch::channel(LifetimeStats::default());

        Self {
            api,
            store,
            user_id: RwLock::new(None),
            history,
            stats,
            writer: Mutex::new(()),
        }
    }

    // ==================== Identity ====================

    pub fn sign_in(&self, user_id: impl Into<String>) {
        if let Ok(mut current) = self.user_id.write() {
            *current = Some(user_id.into());
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut current) = self.user_id.write() {
            *current = None;
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().ok().and_then(|user| user.clone())
    }

    fn require_user(&self, operation: &str) -> Result<String> {
        self.user_id().ok_or_else(|| {
            warn!(operation, "Skipping operation: no authenticated user");
            SdkError::NotAuthenticated
        })
    }

    // ==================== Observation ====================

    /// Snapshot of the plan history, most recent first
    pub fn history(&self) -> Vec<RouteHistoryItem> {
        self.history.borrow().clone()
    }

    pub fn lifetime_stats(&self) -> LifetimeStats {
        self.stats.borrow().clone()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<Vec<RouteHistoryItem>> {
        self.history.subscribe()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<LifetimeStats> {
        self.stats.subscribe()
    }

    pub fn find_plan(&self, id: &str) -> Option<RouteHistoryItem> {
        self.history.borrow().iter().find(|plan| plan.id == id).cloned()
    }

    /// Route of the most recently created plan that is still active
    pub fn last_route(&self) -> Option<RouteDetails> {
        self.history
            .borrow()
            .iter()
            .find(|plan| plan.status == PlanStatus::Active)
            .map(|plan| plan.route.clone())
    }

    pub fn active_plans(&self) -> Vec<RouteHistoryItem> {
        self.plans_with_status(PlanStatus::Active)
    }

    pub fn completed_plans(&self) -> Vec<RouteHistoryItem> {
        self.plans_with_status(PlanStatus::Completed)
    }

    fn plans_with_status(&self, status: PlanStatus) -> Vec<RouteHistoryItem> {
        self.history
            .borrow()
            .iter()
            .filter(|plan| plan.status == status)
            .cloned()
            .collect()
    }

    // ==================== Persistence ====================

    /// Restore history and stats from the local mirror. Missing or corrupt
    /// blobs leave the empty defaults in place.
    pub fn load_cached(&self) {
        if let Some(history) = load_json::<Vec<RouteHistoryItem>>(self.store.as_ref(), ROUTE_HISTORY_KEY) {
            debug!(plans = history.len(), "Restored plan history from local mirror");
            self.history.send_replace(history);
        }
        if let Some(stats) = load_json::<LifetimeStats>(self.store.as_ref(), LIFETIME_STATS_KEY) {
            self.stats.send_replace(stats);
        }
    }

    fn persist_history(&self) {
        save_json(self.store.as_ref(), ROUTE_HISTORY_KEY, &*self.history.borrow());
    }

    fn persist_stats(&self) {
        save_json(self.store.as_ref(), LIFETIME_STATS_KEY, &*self.stats.borrow());
    }

    // ==================== Operations ====================

    /// Replace history and stats with the server's view.
    ///
    /// Plans and stats are fetched concurrently. On any failure the cached
    /// state is kept as-is (stale beats empty) and nothing is persisted.
    pub async fn refresh_history(&self) -> Result<()> {
        let user_id = self.require_user("refresh_history")?;
        let _writer = self.writer.lock().await;

        let (plans, stats) = tokio::try_join!(
            self.api.fetch_plans(&user_id),
            self.api.fetch_stats(&user_id),
        )
        .map_err(|e| {
            warn!(error = %e, "Failed to refresh plan history");
            e
        })?;

        debug!(plans = plans.len(), trips = stats.total_trips, "Refreshed plan history");
        self.history.send_replace(plans);
        self.stats.send_replace(stats);
        self.persist_history();
        self.persist_stats();
        Ok(())
    }

    /// Commit a computed route as a new active plan.
    ///
    /// The plan only appears locally once the server has assigned it an id.
    pub async fn save_route(&self, route: RouteDetails) -> Result<RouteHistoryItem> {
        let user_id = self.require_user("save_route")?;
        let _writer = self.writer.lock().await;

        let id = self.api.create_plan(&user_id, &route).await.map_err(|e| {
            warn!(error = %e, "Failed to save route");
            e
        })?;

        let plan = RouteHistoryItem {
            id,
            route,
            date: Utc::now(),
            status: PlanStatus::Active,
        };

        self.history.send_modify(|history| history.insert(0, plan.clone()));
        self.persist_history();

        info!(plan_id = %plan.id, savings = plan.route.total_savings, "Saved route");
        Ok(plan)
    }

    /// Check or uncheck one item of an active plan, locally only
    pub async fn set_item_checked(&self, plan_id: &str, item_id: &str, checked: bool) -> bool {
        let _writer = self.writer.lock().await;

        let changed = self.history.send_if_modified(|history| {
            let Some(plan) = history
                .iter_mut()
                .find(|plan| plan.id == plan_id && plan.status == PlanStatus::Active)
            else {
                return false;
            };
            match plan.route.find_item_mut(item_id) {
                Some(item) if item.checked != checked => {
                    item.checked = checked;
                    true
                }
                _ => false,
            }
        });

        if changed {
            self.persist_history();
        }
        changed
    }

    /// Finish a trip, keeping only the purchased items.
    ///
    /// Every stop is filtered down to items in `checked_item_ids`, emptied
    /// stops are dropped and the total savings recomputed. The result is
    /// only applied locally after the server accepted it; on failure the
    /// plan is left exactly as it was. Unknown or already completed plans
    /// are a no-op.
    pub async fn complete_plan(&self, id: &str, checked_item_ids: &HashSet<String>) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.complete_locked(id, Some(checked_item_ids)).await
    }

    /// `complete_plan` with the items marked as checked at the moment the
    /// writer lock is acquired
    pub async fn complete_checked(&self, id: &str) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.complete_locked(id, None).await
    }

    /// Body of `complete_plan`; the caller holds the writer lock. `None`
    /// keeps the plan's currently checked items.
    async fn complete_locked(&self, id: &str, keep: Option<&HashSet<String>>) -> Result<()> {
        let Some(plan) = self.find_plan(id) else {
            debug!(plan_id = id, "complete_plan: no such plan");
            return Ok(());
        };
        if plan.status == PlanStatus::Completed {
            debug!(plan_id = id, "complete_plan: already completed");
            return Ok(());
        }

        let mut finalized = plan.route;
        match keep {
            Some(ids) => finalized.retain_items(ids),
            None => {
                let checked = finalized.checked_item_ids();
                finalized.retain_items(&checked);
            }
        }

        self.api
            .update_plan(id, &finalized, PlanStatus::Completed)
            .await
            .map_err(|e| {
                warn!(plan_id = id, error = %e, "Failed to complete plan");
                e
            })?;

        let savings = finalized.total_savings;
        self.history.send_modify(|history| {
            if let Some(plan) = history.iter_mut().find(|plan| plan.id == id) {
                plan.status = PlanStatus::Completed;
                plan.route = finalized;
            }
        });
        self.persist_history();

        info!(plan_id = id, savings, "Completed plan");
        Ok(())
    }

    /// Remove a plan locally right away and delete it on the server in the
    /// background.
    ///
    /// A failed server deletion is logged and does not bring the plan back;
    /// the next `refresh_history` reconciles. Returns the background task,
    /// or `None` if the plan was not in the history.
    pub async fn delete_plan(&self, id: &str) -> Option<JoinHandle<()>> {
        if !self.remove_local(id).await {
            return None;
        }

        let api = Arc::clone(&self.api);
        let plan_id = id.to_string();
        Some(tokio::spawn(async move {
            match api.delete_plan(&plan_id).await {
                Ok(()) => debug!(%plan_id, "Deleted plan on server"),
                Err(e) => error!(%plan_id, error = %e, "Failed to delete plan on server"),
            }
        }))
    }

    /// Like `delete_plan`, but waits for the server and reports its outcome.
    /// The local removal stands either way.
    pub async fn delete_plan_and_wait(&self, id: &str) -> Result<()> {
        if !self.remove_local(id).await {
            return Ok(());
        }
        self.api.delete_plan(id).await
    }

    async fn remove_local(&self, id: &str) -> bool {
        let _writer = self.writer.lock().await;

        let removed = self.history.send_if_modified(|history| {
            let before = history.len();
            history.retain(|plan| plan.id != id);
            history.len() != before
        });

        if removed {
            self.persist_history();
            info!(plan_id = id, "Removed plan");
        }
        removed
    }
}
