//! The engine facade.

use std::collections::HashMap;

use patron_types::{
    ContributionType, ExternalWallet, PublisherActivity, RecurringContribution, WalletProvider,
};

use crate::context::{Collaborators, Context};
use crate::router;
use crate::scheduler;
use crate::store::PendingContributionRow;
use crate::{auto_contribute, vendor};

/// Public entry points for the contribution engine.
pub struct ContributionEngine {
    ctx: Context,
}

impl ContributionEngine {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            ctx: Context::new(collaborators),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Resume all unfinished jobs and start the scheduler loop.
    pub fn initialize(&self) {
        vendor::initialize(&self.ctx);
        auto_contribute::initialize(&self.ctx);
        scheduler::initialize(&self.ctx);
    }

    /// Send a user-initiated tip.
    pub async fn send_one_time_contribution(&self, publisher_id: &str, amount: f64) -> bool {
        router::send_contribution(&self.ctx, ContributionType::OneTime, publisher_id, amount)
            .await
    }

    /// Record a visit with its dwell time.
    pub fn add_publisher_visit(&self, publisher_id: &str, duration_secs: f64) -> bool {
        self.ctx.store().add_publisher_visit(publisher_id, duration_secs)
    }

    /// Configure (or clear, with zero) a per-cycle contribution.
    pub fn set_recurring_contribution(&self, publisher_id: &str, amount: f64) -> bool {
        self.ctx
            .store()
            .set_recurring_contribution(publisher_id, amount)
    }

    pub fn get_recurring_contributions(&self) -> Vec<RecurringContribution> {
        self.ctx.store().get_recurring_contributions()
    }

    /// Queue a tip for a publisher that cannot receive it yet.
    pub fn save_pending_contribution(&self, publisher_id: &str, amount: f64) -> bool {
        self.ctx
            .store()
            .save_pending_contribution(publisher_id, amount)
    }

    pub fn get_pending_contributions(&self) -> Vec<PendingContributionRow> {
        self.ctx.store().get_pending_contributions()
    }

    pub fn delete_pending_contribution(&self, id: i64) -> bool {
        self.ctx.store().delete_pending_contribution(id)
    }

    pub fn get_publisher_activity(&self) -> Vec<PublisherActivity> {
        self.ctx.store().get_publisher_activity()
    }

    /// Complete a wallet authorization and connect the resulting wallet.
    pub async fn handle_wallet_authorization(
        &self,
        provider: WalletProvider,
        auth_params: &HashMap<String, String>,
    ) -> Option<ExternalWallet> {
        self.ctx
            .wallet()
            .handle_authorization_response(provider, auth_params)
            .await
    }
}
