//! Account registry: the in-memory set of accounts plus their table.
//!
//! Records are shared as `Arc<Mutex<AccountRecord>>`. Every refresh of a
//! record, whether spawned on creation or part of a batch, holds that
//! record's lock for the whole scrape, so refreshes of one record never
//! interleave.

use crate::models::AccountRecord;
use crate::scraper::{PageSource, SummonerScraper};
use crate::storage::Repository;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type SharedAccount = Arc<Mutex<AccountRecord>>;

pub struct AccountStore<S: PageSource + 'static> {
    repo: Repository,
    scraper: Arc<SummonerScraper<S>>,
    accounts: Vec<(i64, SharedAccount)>,
}

impl<S: PageSource + 'static> AccountStore<S> {
    pub fn new(repo: Repository, scraper: Arc<SummonerScraper<S>>) -> Self {
        Self {
            repo,
            scraper,
            accounts: Vec::new(),
        }
    }

    /// Build a record, register it, and start fetching its stats.
    ///
    /// The handle is `None` when the display name is empty. An existing
    /// registry entry with the same id is replaced.
    pub fn create(
        &mut self,
        id: i64,
        display_name: impl Into<String>,
        region: impl Into<String>,
        login_username: impl Into<String>,
        login_secret: impl Into<String>,
    ) -> (SharedAccount, Option<JoinHandle<()>>) {
        let record = AccountRecord::new(id, display_name, region, login_username, login_secret);
        let fetch = record.has_display_name();
        let account = self.register(record);

        let handle = fetch.then(|| self.spawn_refresh(Arc::clone(&account)));
        (account, handle)
    }

    fn register(&mut self, record: AccountRecord) -> SharedAccount {
        let id = record.id;
        let account = Arc::new(Mutex::new(record));

        match self.accounts.iter_mut().find(|(known, _)| *known == id) {
            Some(entry) => {
                debug!("Replacing registered account {}", id);
                entry.1 = Arc::clone(&account);
            }
            None => self.accounts.push((id, Arc::clone(&account))),
        }
        account
    }

    fn spawn_refresh(&self, account: SharedAccount) -> JoinHandle<()> {
        let scraper = Arc::clone(&self.scraper);
        tokio::spawn(async move {
            let mut record = account.lock().await;
            let outcome = scraper.refresh(&mut record).await;
            debug!("Account {} refresh: {}", record.id, outcome.label());
        })
    }

    pub fn persist(&self, record: &AccountRecord) -> Result<()> {
        self.repo.save_account(record)
    }

    /// Save `record`, then [`create`](Self::create) it. The row is written
    /// before the fetch task exists.
    pub fn add(&mut self, record: AccountRecord) -> Result<(SharedAccount, Option<JoinHandle<()>>)> {
        self.persist(&record)?;
        Ok(self.create(
            record.id,
            record.display_name,
            record.region,
            record.login_username,
            record.login_secret,
        ))
    }

    /// Overwrite the stored columns of `record` from the table.
    /// Returns `false` when no row exists; `fetched_data` is left alone.
    pub fn reload(&self, record: &mut AccountRecord) -> Result<bool> {
        let Some(stored) = self.repo.load_account(record.id)? else {
            warn!("Account not found: {}", record.id);
            return Ok(false);
        };

        record.display_name = stored.display_name;
        record.region = stored.region;
        record.login_username = stored.login_username;
        record.login_secret = stored.login_secret;
        Ok(true)
    }

    /// Delete the row and drop the record from the registry.
    pub fn remove(&mut self, record: &AccountRecord) -> Result<bool> {
        let deleted = self.repo.delete_account(record.id)?;
        self.accounts.retain(|(id, _)| *id != record.id);
        Ok(deleted)
    }

    /// Register every stored account. Nothing is fetched; follow up with
    /// [`refresh_all`](Self::refresh_all).
    pub fn load_all(&mut self) -> Result<usize> {
        let records = self.repo.load_all_accounts()?;
        let n = records.len();
        for record in records {
            self.register(record);
        }
        info!("{} accounts loaded", n);
        Ok(n)
    }

    /// Batch-scrape every registered account.
    pub async fn refresh_all(&self) -> bool {
        let mut guards = Vec::with_capacity(self.accounts.len());
        for (_, account) in &self.accounts {
            guards.push(account.lock().await);
        }
        self.scraper.scrape_many(&mut guards).await
    }

    pub fn get(&self, id: i64) -> Option<SharedAccount> {
        self.accounts
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, account)| Arc::clone(account))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &SharedAccount> {
        self.accounts.iter().map(|(_, account)| account)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Copies of every registered record, in registry order.
    pub async fn snapshot(&self) -> Vec<AccountRecord> {
        let mut out = Vec::with_capacity(self.accounts.len());
        for account in self.accounts() {
            out.push(account.lock().await.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScrapedStats;
    use crate::scraper::testing::*;

    fn store(pages: StaticPages) -> AccountStore<StaticPages> {
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        AccountStore::new(repo, Arc::new(SummonerScraper::with_source(pages, BASE_URL)))
    }

    fn faker_stats() -> ScrapedStats {
        ScrapedStats {
            level: 512,
            rank: "Challenger".into(),
            games_played: 143,
        }
    }

    #[tokio::test]
    async fn create_fetches_in_the_background() {
        let mut store = store(StaticPages::default().with("kr", "Faker", FAKER));
        let (account, handle) = store.create(1, "Faker", "KR", "hide", "secret");

        handle.expect("display name set").await.unwrap();
        assert_eq!(account.lock().await.fetched_data, Some(faker_stats()));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn create_without_display_name_does_not_fetch() {
        let mut store = store(StaticPages::default());
        let (account, handle) = store.create(2, "", "KR", "smurf", "secret");

        assert!(handle.is_none());
        assert!(account.lock().await.fetched_data.is_none());
        assert_eq!(store.scraper.source().request_count(), 0);
    }

    #[tokio::test]
    async fn create_replaces_entry_with_same_id() {
        let mut store = store(StaticPages::default());
        store.create(1, "", "KR", "a", "b");
        store.create(1, "", "NA1", "c", "d");

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        let account = store.get(1).expect("registered");
        assert_eq!(account.lock().await.region, "NA1");
        assert!(store.get(2).is_none());
    }

    #[tokio::test]
    async fn persist_and_reload_round_trip() {
        let mut store = store(StaticPages::default());
        let (account, _) = store.create(7, "", "EUW1", "caps", "g2");
        store.persist(&*account.lock().await).unwrap();

        let mut fresh = AccountRecord::new(7, "", "", "", "");
        fresh.fetched_data = Some(faker_stats());
        assert!(store.reload(&mut fresh).unwrap());

        let original = account.lock().await.clone();
        assert_eq!(fresh.display_name, original.display_name);
        assert_eq!(fresh.region, original.region);
        assert_eq!(fresh.login_username, original.login_username);
        assert_eq!(fresh.login_secret, original.login_secret);
        assert_eq!(fresh.fetched_data, Some(faker_stats()));
    }

    #[tokio::test]
    async fn add_saves_row_before_fetching() {
        let mut store = store(StaticPages::default().with("kr", "Faker", FAKER));
        let (account, handle) = store
            .add(AccountRecord::new(9, "Faker", "KR", "hide", "secret"))
            .unwrap();

        // fetch task has not run yet on the current-thread runtime
        assert!(account.try_lock().is_ok());
        assert_eq!(store.scraper.source().request_count(), 0);
        let mut stored = AccountRecord::new(9, "", "", "", "");
        assert!(store.reload(&mut stored).unwrap());
        assert_eq!(stored.display_name, "Faker");

        handle.expect("display name set").await.unwrap();
        assert_eq!(account.lock().await.fetched_data, Some(faker_stats()));
    }

    #[tokio::test]
    async fn reload_unknown_id_reports_not_found() {
        let store = store(StaticPages::default());
        let mut record = AccountRecord::new(404, "Ghost", "NA1", "u", "p");

        assert!(!store.reload(&mut record).unwrap());
        assert_eq!(record.display_name, "Ghost");
    }

    #[tokio::test]
    async fn remove_deletes_row_and_registry_entry() {
        let mut store = store(StaticPages::default());
        let (account, _) = store.create(3, "", "KR", "u", "p");
        let record = account.lock().await.clone();
        store.persist(&record).unwrap();

        assert!(store.remove(&record).unwrap());
        assert!(store.is_empty());
        assert!(store.get(3).is_none());
        assert!(!store.reload(&mut record.clone()).unwrap());
    }

    #[tokio::test]
    async fn load_all_then_refresh_all_populates_found_accounts() {
        let mut store = store(
            StaticPages::default()
                .with("kr", "Faker", FAKER)
                .with("euw1", "Ghost", MISSING),
        );
        for record in [
            AccountRecord::new(1, "Faker", "KR", "u1", "p1"),
            AccountRecord::new(2, "Ghost", "EUW1", "u2", "p2"),
            AccountRecord::new(3, "", "NA1", "u3", "p3"),
        ] {
            store.persist(&record).unwrap();
        }

        assert_eq!(store.load_all().unwrap(), 3);
        assert!(store.refresh_all().await);

        let snapshot = store.snapshot().await;
        let found: Vec<i64> = snapshot
            .iter()
            .filter(|a| a.fetched_data.is_some())
            .map(|a| a.id)
            .collect();
        assert_eq!(found, [1]);
    }

    #[tokio::test]
    async fn creation_fetch_and_batch_do_not_interleave() {
        let mut store = store(StaticPages::default().with("kr", "Faker", FAKER));
        let (account, handle) = store.create(1, "Faker", "KR", "u", "p");

        assert!(store.refresh_all().await);
        handle.unwrap().await.unwrap();

        assert_eq!(account.lock().await.fetched_data, Some(faker_stats()));
        assert_eq!(store.scraper.source().request_count(), 2);
    }
}
