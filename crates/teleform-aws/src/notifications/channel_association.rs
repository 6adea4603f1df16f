//! Associations between a notification configuration and a delivery channel
//! (an AWS Chatbot configuration, a mobile device or an email contact).
use snafu::prelude::*;

use super::NotificationsApi;
use crate::{
    api::{ignore_not_found, ApiError},
    id, validate, ApiSnafu, Context, Phase, Resource, Result,
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelAssociation {
    /// ARN of the channel.
    pub arn: String,
    pub notification_configuration_arn: String,
}

/// The association is fully described by its two ARNs.
pub type ChannelAssociationOutput = ChannelAssociation;

/// Returns `true` if `channel_arn` is associated with the configuration.
///
/// A missing configuration means a missing association.
pub async fn find_channel_association(
    api: &dyn NotificationsApi,
    notification_configuration_arn: &str,
    channel_arn: &str,
) -> Result<bool, ApiError> {
    match api.list_channels(notification_configuration_arn).await {
        Ok(channels) => Ok(channels.iter().any(|c| c == channel_arn)),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

impl Resource for ChannelAssociation {
    const TYPE_NAME: &'static str = "aws_notifications_channel_association";
    type Provider = dyn NotificationsApi;
    type Output = ChannelAssociationOutput;

    fn validate(&self) -> Result<()> {
        validate::arn(Self::TYPE_NAME, "arn", &self.arn)?;
        validate::arn(
            Self::TYPE_NAME,
            "notification_configuration_arn",
            &self.notification_configuration_arn,
        )
    }

    fn id(output: &Self::Output) -> String {
        id::join(
            &[output.notification_configuration_arn.as_str(), output.arn.as_str()],
            id::ARN_PAIR_SEPARATOR,
        )
    }

    fn flatten(output: &Self::Output) -> Self {
        output.clone()
    }

    async fn create(&self, api: &Self::Provider, _ctx: &Context) -> Result<Self::Output> {
        log::info!(
            "associating channel '{}' with '{}'",
            self.arn,
            self.notification_configuration_arn
        );
        api.associate_channel(&self.notification_configuration_arn, &self.arn)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: Self::id(self),
                phase: Phase::Creating,
            })?;
        Ok(self.clone())
    }

    async fn read(api: &Self::Provider, id: &str, _ctx: &Context) -> Result<Option<Self::Output>> {
        let [notification_configuration_arn, arn] = id::split::<2>(id, id::ARN_PAIR_SEPARATOR)?;
        let found = find_channel_association(api, &notification_configuration_arn, &arn)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::Reading,
            })?;
        if !found {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        }
        Ok(Some(ChannelAssociation {
            arn,
            notification_configuration_arn,
        }))
    }

    async fn update(
        &self,
        _api: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
        _ctx: &Context,
    ) -> Result<Self::Output> {
        validate::immutable(Self::TYPE_NAME, "arn", &previous_local.arn, &self.arn)?;
        validate::immutable(
            Self::TYPE_NAME,
            "notification_configuration_arn",
            &previous_local.notification_configuration_arn,
            &self.notification_configuration_arn,
        )?;
        Ok(previous_remote.clone())
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, _ctx: &Context) -> Result<()> {
        log::info!(
            "disassociating channel '{}' from '{}'",
            previous_remote.arn,
            previous_remote.notification_configuration_arn
        );
        ignore_not_found(
            api.disassociate_channel(
                &previous_remote.notification_configuration_arn,
                &previous_remote.arn,
            )
            .await,
        )
        .context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id: Self::id(previous_remote),
            phase: Phase::Deleting,
        })
    }
}
