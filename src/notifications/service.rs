use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, stream};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{self, CacheManager};
use crate::db::models::{Destination, MessageTemplate};
use crate::db::services::{delivery_service, destination_service, template_service};
use crate::db::services::delivery_service::NewDeliveryRecord;
use crate::notifications::models::{
    DestinationOutcome, DispatchReport, SendOutcome, truncate_response,
};
use crate::notifications::senders;

/// Upper bound on sends in flight within one dispatch call.
pub const MAX_CONCURRENT_SENDS: usize = 8;

/// Sends one message to one resolved destination, folding a timeout into a
/// failure outcome. Factored into a named async fn so the dispatch stream's
/// closure has an explicit signature (the boxed trait object trips up
/// higher-ranked lifetime inference when the body is an inline async block).
async fn send_one(
    destination: Destination,
    sender: Box<dyn senders::NotificationSender>,
    message: &str,
    send_timeout: Duration,
) -> (Destination, SendOutcome) {
    let outcome = match tokio::time::timeout(send_timeout, sender.send(message)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            SendOutcome::failure(format!("send timed out after {}s", send_timeout.as_secs()))
        }
    };
    (destination, outcome)
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("destination not found: {0}")]
    UnknownDestination(String),
    #[error("no active destination")]
    NoActiveDestination,
    #[error("unsupported platform type: {0}")]
    UnsupportedPlatform(String),
}

/// Resolves a dispatch request to its candidate destinations, fans the
/// sends out through the adapter registry, and audits every attempt.
pub struct DispatchService {
    pool: PgPool,
    cache: Arc<CacheManager>,
    send_timeout: Duration,
}

impl DispatchService {
    pub fn new(pool: PgPool, cache: Arc<CacheManager>, send_timeout: Duration) -> Self {
        Self {
            pool,
            cache,
            send_timeout,
        }
    }

    /// Sends `message` to one named destination or to all of the account's
    /// active destinations.
    ///
    /// Individual send failures never abort the dispatch: the report holds
    /// one outcome per attempted destination, in destination order, and one
    /// delivery record is written per attempt. The audit write is committed
    /// atomically after all sends, together with the template usage bump
    /// for templated dispatches. Destinations with an unknown platform type
    /// are skipped without a record, as if inactive.
    pub async fn dispatch(
        &self,
        account_id: i32,
        message: &str,
        destination_name: Option<&str>,
        template: Option<&MessageTemplate>,
    ) -> Result<DispatchReport, DispatchError> {
        let destinations =
            destination_service::active_for_account(&self.pool, account_id, destination_name)
                .await?;
        if destinations.is_empty() {
            // A bad name and a fully inactive account are both 404s, but
            // they are distinct situations for the caller diagnosing them.
            return Err(match destination_name {
                Some(name) => DispatchError::UnknownDestination(name.to_string()),
                None => DispatchError::NoActiveDestination,
            });
        }

        let candidates: Vec<(Destination, Box<dyn senders::NotificationSender>)> = destinations
            .into_iter()
            .filter_map(|destination| match senders::resolve(&destination) {
                Some(sender) => Some((destination, sender)),
                None => {
                    warn!(
                        platform_type = %destination.platform_type,
                        destination = %destination.name,
                        "skipping destination with unknown platform type"
                    );
                    None
                }
            })
            .collect();

        let batch_id = Uuid::new_v4().to_string();
        let send_timeout = self.send_timeout;
        let sends: Vec<Pin<Box<dyn Future<Output = (Destination, SendOutcome)> + Send>>> =
            candidates
                .into_iter()
                .map(|(destination, sender)| {
                    Box::pin(send_one(destination, sender, message, send_timeout))
                        as Pin<Box<dyn Future<Output = (Destination, SendOutcome)> + Send>>
                })
                .collect();
        let attempts: Vec<(Destination, SendOutcome)> = stream::iter(sends)
            .buffered(MAX_CONCURRENT_SENDS)
            .collect()
            .await;

        let mut tx = self.pool.begin().await?;
        for (destination, outcome) in &attempts {
            delivery_service::insert_record(
                &mut *tx,
                &record_for(account_id, destination, message, outcome, template, &batch_id),
            )
            .await?;
        }
        if let Some(template) = template {
            template_service::increment_usage(&mut *tx, template.id).await?;
        }
        tx.commit().await?;

        self.cache.delete(&cache::stats_key(account_id));

        let results: Vec<DestinationOutcome> = attempts
            .iter()
            .map(|(destination, outcome)| DestinationOutcome {
                platform: destination.name.clone(),
                success: outcome.success,
                status_code: outcome.status_code,
            })
            .collect();
        info!(
            account_id,
            batch_id = %batch_id,
            attempted = results.len(),
            succeeded = results.iter().filter(|r| r.success).count(),
            "dispatch completed"
        );

        Ok(DispatchReport { batch_id, results })
    }

    /// Sends a canned (or caller-provided) message through one owned
    /// destination and audits the attempt like a regular dispatch.
    pub async fn test_destination(
        &self,
        account_id: i32,
        destination_id: i32,
        message: Option<String>,
    ) -> Result<SendOutcome, DispatchError> {
        let destination = destination_service::get_owned_destination(&self.pool, account_id, destination_id)
            .await?
            .ok_or_else(|| DispatchError::UnknownDestination(destination_id.to_string()))?;
        let sender = senders::resolve(&destination)
            .ok_or_else(|| DispatchError::UnsupportedPlatform(destination.platform_type.clone()))?;

        let text = message
            .unwrap_or_else(|| format!("This is a test message from '{}'.", destination.name));
        let outcome = match tokio::time::timeout(self.send_timeout, sender.send(&text)).await {
            Ok(outcome) => outcome,
            Err(_) => SendOutcome::failure(format!(
                "send timed out after {}s",
                self.send_timeout.as_secs()
            )),
        };

        let batch_id = Uuid::new_v4().to_string();
        delivery_service::insert_record(
            &self.pool,
            &record_for(account_id, &destination, &text, &outcome, None, &batch_id),
        )
        .await?;
        self.cache.delete(&cache::stats_key(account_id));

        Ok(outcome)
    }
}

fn record_for(
    account_id: i32,
    destination: &Destination,
    message: &str,
    outcome: &SendOutcome,
    template: Option<&MessageTemplate>,
    batch_id: &str,
) -> NewDeliveryRecord {
    NewDeliveryRecord {
        account_id,
        destination_id: destination.id,
        message: message.to_string(),
        status: if outcome.success { "success" } else { "failed" }.to_string(),
        response_code: Some(outcome.status_code),
        error_message: (!outcome.success).then(|| truncate_response(&outcome.response)),
        template_id: template.map(|t| t.id),
        batch_id: batch_id.to_string(),
    }
}
