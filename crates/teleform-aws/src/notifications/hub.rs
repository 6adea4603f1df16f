//! Notification hubs: the regions where User Notifications stores its data.
use std::time::Duration;

use snafu::prelude::*;

use super::{NotificationHubSummary, NotificationsApi};
use crate::{
    api::{ApiError, CONFLICT},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, Phase, Resource, Result, WaitSnafu,
};

pub const HUB_ACTIVE: &str = "ACTIVE";
pub const HUB_REGISTERING: &str = "REGISTERING";
pub const HUB_DEREGISTERING: &str = "DEREGISTERING";

const CREATE_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// AWS refuses to deregister the last active hub of an account.
const LAST_HUB_MESSAGE: &str = "Cannot deregister last";

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NotificationHub {
    pub notification_hub_region: String,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NotificationHubOutput {
    pub notification_hub_region: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<NotificationHubSummary> for NotificationHubOutput {
    fn from(hub: NotificationHubSummary) -> Self {
        Self {
            notification_hub_region: hub.region,
            status: hub.status,
            reason: hub.reason,
        }
    }
}

pub async fn find_notification_hub(
    api: &dyn NotificationsApi,
    region: &str,
) -> Result<Option<NotificationHubSummary>, ApiError> {
    let hubs = api.list_notification_hubs().await?;
    Ok(hubs.into_iter().find(|hub| hub.region == region))
}

pub async fn status_notification_hub(
    api: &dyn NotificationsApi,
    region: &str,
) -> Result<Poll<NotificationHubSummary>, ApiError> {
    let hub = find_notification_hub(api, region).await?;
    Ok(Poll::from_found(hub, |hub| hub.status.clone()))
}

impl Resource for NotificationHub {
    const TYPE_NAME: &'static str = "aws_notifications_notification_hub";
    type Provider = dyn NotificationsApi;
    type Output = NotificationHubOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(
            Self::TYPE_NAME,
            "notification_hub_region",
            &self.notification_hub_region,
            2,
            25,
        )
    }

    fn id(output: &Self::Output) -> String {
        output.notification_hub_region.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        NotificationHub {
            notification_hub_region: output.notification_hub_region.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        let region = self.notification_hub_region.as_str();
        log::info!("registering notification hub in '{region}'");
        api.register_notification_hub(region)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: region,
                phase: Phase::Creating,
            })?;
        let hub = StateChange::new(|| status_notification_hub(api, region))
            .pending([HUB_REGISTERING])
            .target([HUB_ACTIVE])
            .reason(|hub: &NotificationHubSummary| hub.reason.clone())
            .timeout(ctx.timeouts.create_or(CREATE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id: region,
                phase: Phase::WaitingForCreation,
            })?;
        let hub = hub.context(crate::NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: region,
        })?;
        Ok(hub.into())
    }

    async fn read(api: &Self::Provider, id: &str, _ctx: &Context) -> Result<Option<Self::Output>> {
        let hub = find_notification_hub(api, id).await.context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Reading,
        })?;
        if hub.is_none() {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
        }
        Ok(hub.map(Into::into))
    }

    async fn update(
        &self,
        api: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
        ctx: &Context,
    ) -> Result<Self::Output> {
        validate::immutable(
            Self::TYPE_NAME,
            "notification_hub_region",
            &previous_local.notification_hub_region,
            &self.notification_hub_region,
        )?;
        Ok(Self::read(api, &previous_remote.notification_hub_region, ctx)
            .await?
            .unwrap_or_else(|| previous_remote.clone()))
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, ctx: &Context) -> Result<()> {
        let region = previous_remote.notification_hub_region.as_str();
        log::info!("deregistering notification hub in '{region}'");
        match api.deregister_notification_hub(region).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_a_message_contains(CONFLICT, LAST_HUB_MESSAGE) => {
                log::warn!("  '{region}' is the last active notification hub, leaving it registered");
                return Ok(());
            }
            Err(e) => {
                return Err(e).context(ApiSnafu {
                    type_name: Self::TYPE_NAME,
                    id: region,
                    phase: Phase::Deleting,
                })
            }
        }
        StateChange::new(|| status_notification_hub(api, region))
            .pending([HUB_DEREGISTERING])
            .target_gone()
            .timeout(ctx.timeouts.delete_or(DELETE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id: region,
                phase: Phase::WaitingForDeletion,
            })?;
        Ok(())
    }
}
