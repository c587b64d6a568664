//! The engine context: explicit access to every collaborator.
//!
//! No component reaches for globals; everything the engine talks to (the
//! database, HTTP services, the wallet manager, clocks, randomness) hangs
//! off a [`Context`] that is passed into each component and cheap to clone.

use std::sync::Arc;
use std::time::Duration;

use patron_crypto::PrivacyPass;
use patron_db::Db;
use patron_jobs::{Clock, DelayGenerator, JobStore, Randomizer};
use patron_payments::{
    Environment, EnvironmentConfig, PaymentService, PromotionService, PublisherService, UrlFetcher,
};
use patron_wallet::ExternalWalletManager;

use crate::store::ContributionStore;
use crate::tokens::TokenManager;
use crate::user_prefs::UserPrefs;

/// Client-level engine options.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub environment: Environment,
    /// Time between scheduled contribution rounds.
    pub contribution_interval: Duration,
    /// Whether this client may run auto-contribute at all.
    pub auto_contribute_allowed: bool,
    /// Fallback auto-contribute amount when the user pref is unset.
    pub default_contribution_amount: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            contribution_interval: Duration::from_secs(30 * 24 * 60 * 60),
            auto_contribute_allowed: true,
            default_contribution_amount: 10.0,
        }
    }
}

/// Everything the engine is wired up with at construction time.
pub struct Collaborators {
    pub db: Db,
    pub options: EngineOptions,
    pub fetcher: Arc<dyn UrlFetcher>,
    pub wallet: Arc<ExternalWalletManager>,
    pub randomizer: Arc<dyn Randomizer>,
    pub clock: Arc<dyn Clock>,
}

struct Inner {
    db: Db,
    options: EngineOptions,
    config: EnvironmentConfig,
    jobs: JobStore,
    delays: DelayGenerator,
    randomizer: Arc<dyn Randomizer>,
    clock: Arc<dyn Clock>,
    wallet: Arc<ExternalWalletManager>,
    payment: PaymentService,
    promotion: PromotionService,
    publishers: PublisherService,
    privacy_pass: PrivacyPass,
    tokens: TokenManager,
    store: ContributionStore,
    prefs: UserPrefs,
}

/// Shared handle to the engine's collaborators.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators {
            db,
            options,
            fetcher,
            wallet,
            randomizer,
            clock,
        } = collaborators;

        let config = EnvironmentConfig::for_environment(options.environment);

        Self {
            inner: Arc::new(Inner {
                jobs: JobStore::new(db.clone(), clock.clone()),
                delays: DelayGenerator::new(randomizer.clone()),
                payment: PaymentService::new(fetcher.clone(), config.clone()),
                promotion: PromotionService::new(fetcher.clone(), config.clone()),
                publishers: PublisherService::new(fetcher, config.clone()),
                privacy_pass: PrivacyPass::new(),
                tokens: TokenManager::new(db.clone(), clock.clone()),
                store: ContributionStore::new(db.clone(), clock.clone()),
                prefs: UserPrefs::new(db.clone()),
                db,
                options,
                config,
                randomizer,
                clock,
                wallet,
            }),
        }
    }

    pub fn db(&self) -> &Db {
        &self.inner.db
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.inner.config
    }

    pub fn jobs(&self) -> &JobStore {
        &self.inner.jobs
    }

    pub fn delays(&self) -> &DelayGenerator {
        &self.inner.delays
    }

    pub fn randomizer(&self) -> &dyn Randomizer {
        self.inner.randomizer.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn wallet(&self) -> &ExternalWalletManager {
        &self.inner.wallet
    }

    pub fn payment(&self) -> &PaymentService {
        &self.inner.payment
    }

    pub fn promotion(&self) -> &PromotionService {
        &self.inner.promotion
    }

    pub fn publishers(&self) -> &PublisherService {
        &self.inner.publishers
    }

    pub fn privacy_pass(&self) -> &PrivacyPass {
        &self.inner.privacy_pass
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.inner.tokens
    }

    pub fn store(&self) -> &ContributionStore {
        &self.inner.store
    }

    pub fn user_prefs(&self) -> &UserPrefs {
        &self.inner.prefs
    }
}
