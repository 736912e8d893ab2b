use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use chrono::Utc;
use futures_util::StreamExt;
use moka::future::Cache;

use crate::store::{AccountRepository, StoreResult};

/// Expected capacity and false-positive rate.
/// Tune these based on real account counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

const CACHE_CAPACITY: u64 = 500_000;
const CACHE_TTL: Duration = Duration::from_secs(86_400);

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fast "is this email taken" answers for registration and the
/// `email-exists` probe.
///
/// Once warmed up, the cuckoo filter never yields false negatives, so a miss
/// means the email is free without touching the store. The cache holds
/// confirmed answers for recently active accounts. Anything else, and every
/// filter miss before warmup completes, falls through to the store.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    cache: Cache<String, bool>,
    warmed: AtomicBool,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
            warmed: AtomicBool::new(false),
        }
    }

    pub fn is_warmed(&self) -> bool {
        self.warmed.load(Ordering::Acquire)
    }

    /// Check if an email might be taken (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub async fn mark_taken(&self, email: &str) {
        let email = normalize(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
        self.cache.insert(email, true).await;
    }

    pub async fn forget(&self, email: &str) {
        let email = normalize(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&email);
        self.cache.invalidate(&email).await;
    }

    /// Returns whether the email is taken, consulting the store only when
    /// neither the filter nor the cache can answer.
    pub async fn is_taken(&self, email: &str, accounts: &dyn AccountRepository) -> StoreResult<bool> {
        if self.is_warmed() && !self.might_exist(email) {
            return Ok(false);
        }
        let key = normalize(email);
        if let Some(taken) = self.cache.get(&key).await {
            return Ok(taken);
        }
        let taken = accounts.find_by_email(&key).await?.is_some();
        self.cache.insert(key, taken).await;
        Ok(taken)
    }

    /// Loads every stored email into the filter and recently active ones
    /// into the cache, in batches.
    pub async fn warmup(
        &self,
        accounts: &dyn AccountRepository,
        recent_days: i64,
        batch_size: usize,
    ) -> Result<()> {
        let mut batches = futures::stream::iter(accounts.emails().await?).chunks(batch_size);
        let mut total = 0usize;
        while let Some(batch) = batches.next().await {
            let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            for email in &batch {
                filter.add(&normalize(email));
            }
            total += batch.len();
        }

        let since = Utc::now() - chrono::Duration::days(recent_days);
        let recent = accounts.emails_logged_in_since(since).await?;
        let mut batches = futures::stream::iter(recent).chunks(batch_size);
        let mut cached = 0usize;
        while let Some(batch) = batches.next().await {
            let inserts: Vec<_> = batch
                .iter()
                .map(|e| self.cache.insert(normalize(e), true))
                .collect();
            futures::future::join_all(inserts).await;
            cached += batch.len();
        }
        self.warmed.store(true, Ordering::Release);

        tracing::info!(
            total,
            cached,
            "Email index warmup complete (recent window {} days)",
            recent_days
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        account::{AccountStatus, NewAccount},
        role::Role,
    };
    use crate::store::MemoryStore;

    fn account(email: &str) -> NewAccount {
        NewAccount {
            title: None,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: email.into(),
            role: Role::User,
            password_hash: "x".into(),
            status: AccountStatus::Active,
            verification_token: None,
            verified: None,
        }
    }

    #[actix_web::test]
    async fn unknown_email_is_free_without_store_hit() {
        let index = EmailIndex::new();
        let store = MemoryStore::default();
        assert!(!index.is_taken("nobody@example.com", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn existing_email_is_taken_before_warmup() {
        let index = EmailIndex::new();
        let store = MemoryStore::default();
        store.insert(account("early@example.com")).await.unwrap();

        assert!(!index.is_warmed());
        assert!(index.is_taken("early@example.com", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn warmup_loads_existing_emails() {
        let index = EmailIndex::new();
        let store = MemoryStore::default();
        store.insert(account("Grace@Example.com")).await.unwrap();

        index.warmup(&store, 30, 10).await.unwrap();

        assert!(index.is_warmed());
        assert!(index.might_exist("grace@example.com"));
        assert!(index.is_taken("GRACE@example.com", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn forget_frees_the_email() {
        let index = EmailIndex::new();
        let store = MemoryStore::default();
        index.mark_taken("gone@example.com").await;
        assert!(index.might_exist("gone@example.com"));

        index.forget("gone@example.com").await;
        assert!(!index.is_taken("gone@example.com", &store).await.unwrap());
    }
}
