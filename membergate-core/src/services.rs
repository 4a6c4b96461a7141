use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use membergate_common::MembergateConfig;

use crate::db::connect_to_db;
use crate::login_guard::{LoginAttemptCache, LoginGuard};
use crate::mail::{Mailer, SmtpMailer};
use crate::two_factor::{EmailTwoFactor, TwoFactorProvider, TwoFactorStore};

#[derive(Clone)]
pub struct Services {
    pub db: Arc<Mutex<DatabaseConnection>>,
    pub config: Arc<Mutex<MembergateConfig>>,
    pub mailer: Arc<dyn Mailer>,
    pub attempt_cache: Arc<LoginAttemptCache>,
    pub login_guard: Arc<LoginGuard>,
    pub two_factor_store: Arc<Mutex<TwoFactorStore>>,
    pub two_factor: Arc<dyn TwoFactorProvider>,
}

impl Services {
    pub async fn new(config: MembergateConfig) -> Result<Self> {
        let db = connect_to_db(&config).await?;
        let db = Arc::new(Mutex::new(db));

        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(&config.store.smtp)?);

        let attempt_cache = Arc::new(LoginAttemptCache::new());
        tokio::spawn({
            let attempt_cache = attempt_cache.clone();
            let session_max_age = config.store.http.session_max_age;
            async move {
                loop {
                    attempt_cache.vacuum(session_max_age).await;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
            }
        });
        let login_guard = Arc::new(LoginGuard::new(attempt_cache.clone()));

        let two_factor_store = Arc::new(Mutex::new(TwoFactorStore::new(
            config.store.accounts.two_factor_code_ttl,
        )));
        tokio::spawn({
            let two_factor_store = two_factor_store.clone();
            async move {
                loop {
                    two_factor_store.lock().await.vacuum();
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
            }
        });

        let two_factor: Arc<dyn TwoFactorProvider> = Arc::new(EmailTwoFactor::new(
            two_factor_store.clone(),
            mailer.clone(),
            config.store.accounts.two_factor_code_ttl,
        ));

        let config = Arc::new(Mutex::new(config));

        Ok(Self {
            db,
            config,
            mailer,
            attempt_cache,
            login_guard,
            two_factor_store,
            two_factor,
        })
    }
}
