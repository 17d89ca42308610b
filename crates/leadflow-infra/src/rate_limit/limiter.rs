use chrono::{DateTime, Duration as ChronoDuration, Utc};

use leadflow_core::{AppError, ImportLimits};
use leadflow_db::ImportJobStore;

/// Rejects a submission once a tenant+account reached its job or lead quota
#[derive(Debug, Clone, Copy)]
pub struct ImportRateLimiter {
    limits: ImportLimits,
}

impl ImportRateLimiter {
    pub fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ImportLimits {
        self.limits
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = ChronoDuration::from_std(self.limits.window)
            .unwrap_or_else(|_| ChronoDuration::hours(1));
        now - window
    }

    fn window_label(&self) -> String {
        match self.limits.window.as_secs() {
            3600 => "hour".to_string(),
            secs if secs % 60 == 0 => format!("{} minutes", secs / 60),
            secs => format!("{} seconds", secs),
        }
    }

    /// Check the trailing window ending at `now`
    ///
    /// Not atomic with the job insert that follows it; concurrent submissions can both pass.
    #[tracing::instrument(skip(self, store))]
    pub async fn check(
        &self,
        store: &dyn ImportJobStore,
        tenant_id: i64,
        account_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let usage = store
            .import_window_usage(tenant_id, account_id, self.window_start(now))
            .await?;

        if usage.jobs >= self.limits.max_jobs_per_window {
            tracing::warn!(jobs = usage.jobs, "Import job quota reached");
            return Err(AppError::RateLimitExceeded(format!(
                "rate limit exceeded: max {} imports per {} per account",
                self.limits.max_jobs_per_window,
                self.window_label()
            )));
        }

        if usage.leads_created >= self.limits.max_leads_per_window {
            tracing::warn!(leads_created = usage.leads_created, "Import lead quota reached");
            return Err(AppError::RateLimitExceeded(format!(
                "rate limit exceeded: max {} leads per {} per account",
                self.limits.max_leads_per_window,
                self.window_label()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_db::test_helpers::InMemoryStore;

    const TENANT: i64 = 1;
    const ACCOUNT: i64 = 7;

    fn limiter() -> ImportRateLimiter {
        ImportRateLimiter::new(ImportLimits::default())
    }

    fn seed_jobs(store: &InMemoryStore, count: usize, created_each: i64, age_minutes: i64) {
        let now = Utc::now();
        for i in 0..count {
            store.add_import(
                TENANT,
                ACCOUNT,
                &format!("job-{}-{}", age_minutes, i),
                created_each,
                now - ChronoDuration::minutes(age_minutes),
            );
        }
    }

    #[tokio::test]
    async fn test_four_jobs_pass_five_jobs_reject() {
        let store = InMemoryStore::new();
        seed_jobs(&store, 4, 0, 10);
        assert!(limiter().check(&store, TENANT, ACCOUNT, Utc::now()).await.is_ok());

        seed_jobs(&store, 1, 0, 5);
        let err = limiter()
            .check(&store, TENANT, ACCOUNT, Utc::now())
            .await
            .unwrap_err();
        match err {
            AppError::RateLimitExceeded(msg) => {
                assert_eq!(msg, "rate limit exceeded: max 5 imports per hour per account")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lead_sum_rejects_at_limit() {
        let store = InMemoryStore::new();
        seed_jobs(&store, 2, 2499, 10);
        assert!(limiter().check(&store, TENANT, ACCOUNT, Utc::now()).await.is_ok());

        seed_jobs(&store, 1, 2, 5);
        let err = limiter()
            .check(&store, TENANT, ACCOUNT, Utc::now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("max 5000 leads per hour per account"));
    }

    #[tokio::test]
    async fn test_old_and_deleted_jobs_are_ignored() {
        let store = InMemoryStore::new();
        seed_jobs(&store, 5, 1000, 61);
        let id = store.add_import(TENANT, ACCOUNT, "recent", 0, Utc::now()).id;
        store.soft_delete_import(id);
        seed_jobs(&store, 4, 0, 1);

        assert!(limiter().check(&store, TENANT, ACCOUNT, Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_accounts_do_not_count() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store.add_import(TENANT, ACCOUNT + 1, &format!("other-{}", i), 0, now);
        }
        assert!(limiter().check(&store, TENANT, ACCOUNT, now).await.is_ok());
    }
}
