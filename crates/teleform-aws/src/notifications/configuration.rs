//! Notification configurations: named collections of event rules and
//! delivery channels.
use std::time::Duration;

use snafu::prelude::*;

use super::{NotificationConfigurationDetail, NotificationConfigurationInput, NotificationsApi};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    tags::{read_tags, update_tags, Tags},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const CONFIGURATION_DELETING: &str = "DELETING";

const DELETE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

pub const AGGREGATION_DURATIONS: &[&str] = &["LONG", "SHORT", "NONE"];

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NotificationConfiguration {
    pub name: String,
    pub description: String,
    /// One of `LONG`, `SHORT` or `NONE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NotificationConfigurationOutput {
    pub arn: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_duration: Option<String>,
    pub status: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub tags_all: Tags,
}

pub async fn find_notification_configuration(
    api: &dyn NotificationsApi,
    arn: &str,
) -> Result<Option<NotificationConfigurationDetail>, ApiError> {
    not_found_as_none(api.get_notification_configuration(arn).await)
}

pub async fn status_notification_configuration(
    api: &dyn NotificationsApi,
    arn: &str,
) -> Result<Poll<NotificationConfigurationDetail>, ApiError> {
    let config = find_notification_configuration(api, arn).await?;
    Ok(Poll::from_found(config, |config| config.status.clone()))
}

impl NotificationConfiguration {
    fn input(&self, ctx: &Context) -> NotificationConfigurationInput {
        NotificationConfigurationInput {
            name: self.name.clone(),
            description: self.description.clone(),
            aggregation_duration: self.aggregation_duration.clone(),
            tags: ctx.tags.merge(&self.tags),
        }
    }
}

impl Resource for NotificationConfiguration {
    const TYPE_NAME: &'static str = "aws_notifications_notification_configuration";
    type Provider = dyn NotificationsApi;
    type Output = NotificationConfigurationOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "name", &self.name, 1, 64)?;
        validate::check(
            Self::TYPE_NAME,
            self.name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
            format!("name may only contain letters, digits, '_' and '-', got '{}'", self.name),
        )?;
        validate::length_between(Self::TYPE_NAME, "description", &self.description, 0, 256)?;
        if let Some(duration) = &self.aggregation_duration {
            validate::one_of(
                Self::TYPE_NAME,
                "aggregation_duration",
                duration,
                AGGREGATION_DURATIONS,
            )?;
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        output.arn.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        NotificationConfiguration {
            name: output.name.clone(),
            description: output.description.clone(),
            aggregation_duration: output.aggregation_duration.clone(),
            tags: output.tags.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        log::info!("creating notification configuration '{}'", self.name);
        let arn = api
            .create_notification_configuration(&self.input(ctx))
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: &self.name,
                phase: Phase::Creating,
            })?;
        log::info!("  created '{arn}'");
        let mut output = Self::read(api, &arn, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: arn,
        })?;
        ctx.tags
            .keep_configured(&mut output.tags, &output.tags_all, &self.tags);
        Ok(output)
    }

    async fn read(api: &Self::Provider, id: &str, ctx: &Context) -> Result<Option<Self::Output>> {
        let Some(config) = find_notification_configuration(api, id)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::Reading,
            })?
        else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        let (tags, tags_all) = read_tags(api, Self::TYPE_NAME, id, ctx).await?;
        Ok(Some(NotificationConfigurationOutput {
            arn: config.arn,
            name: config.name,
            description: config.description,
            aggregation_duration: config.aggregation_duration,
            status: config.status,
            tags,
            tags_all,
        }))
    }

    async fn update(
        &self,
        api: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
        ctx: &Context,
    ) -> Result<Self::Output> {
        let arn = previous_remote.arn.as_str();
        let input = self.input(ctx);
        if self.name != previous_local.name
            || self.description != previous_local.description
            || self.aggregation_duration != previous_local.aggregation_duration
        {
            log::info!("updating notification configuration '{arn}'");
            api.update_notification_configuration(arn, &input)
                .await
                .context(ApiSnafu {
                    type_name: Self::TYPE_NAME,
                    id: arn,
                    phase: Phase::Updating,
                })?;
        }
        update_tags(api, Self::TYPE_NAME, arn, &previous_remote.tags_all, &input.tags).await?;
        let mut output = Self::read(api, arn, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: arn,
        })?;
        ctx.tags
            .keep_configured(&mut output.tags, &output.tags_all, &self.tags);
        Ok(output)
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, ctx: &Context) -> Result<()> {
        let arn = previous_remote.arn.as_str();
        log::info!("deleting notification configuration '{arn}'");
        ignore_not_found(api.delete_notification_configuration(arn).await).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id: arn,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_notification_configuration(api, arn))
            .pending([CONFIGURATION_DELETING])
            .target_gone()
            .timeout(ctx.timeouts.delete_or(DELETE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id: arn,
                phase: Phase::WaitingForDeletion,
            })?;
        Ok(())
    }
}
