//! DNSSEC validation for a VPC.
//!
//! Every VPC always has a DNSSEC config; "creating" one enables validation
//! and "deleting" it disables validation again. A config that reads back as
//! `DISABLED` is treated as absent. The config is addressed by its VPC ID.
use std::time::Duration;

use snafu::prelude::*;

use super::{DnssecConfigDetail, Route53ResolverApi};
use crate::{
    api::{ignore_not_found, ApiError},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const DNSSEC_ENABLING: &str = "ENABLING";
pub const DNSSEC_ENABLED: &str = "ENABLED";
pub const DNSSEC_DISABLING: &str = "DISABLING";
pub const DNSSEC_DISABLED: &str = "DISABLED";

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverDnssecConfig {
    /// The VPC to validate DNSSEC signatures in.
    pub resource_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverDnssecConfigOutput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub resource_id: String,
    pub validation_status: String,
}

/// Finds the DNSSEC config of a VPC, whatever its status.
pub async fn find_resolver_dnssec_config(
    api: &dyn Route53ResolverApi,
    resource_id: &str,
) -> Result<Option<DnssecConfigDetail>, ApiError> {
    let configs = api.list_resolver_dnssec_configs().await?;
    Ok(configs
        .into_iter()
        .find(|config| config.resource_id == resource_id))
}

pub async fn status_resolver_dnssec_config(
    api: &dyn Route53ResolverApi,
    resource_id: &str,
) -> Result<Poll<DnssecConfigDetail>, ApiError> {
    let config = find_resolver_dnssec_config(api, resource_id).await?;
    Ok(Poll::from_found(config, |config| config.validation_status.clone()))
}

/// Like [`status_resolver_dnssec_config`], but a VPC that disappeared took
/// its config with it, which reads as disabled.
async fn status_disabling(
    api: &dyn Route53ResolverApi,
    resource_id: &str,
) -> Result<Poll<Option<DnssecConfigDetail>>, ApiError> {
    Ok(match status_resolver_dnssec_config(api, resource_id).await? {
        Poll::NotFound => Poll::found(None, DNSSEC_DISABLED),
        Poll::Found { object, status } => Poll::found(Some(object), status),
    })
}

impl Resource for ResolverDnssecConfig {
    const TYPE_NAME: &'static str = "aws_route53_resolver_dnssec_config";
    type Provider = dyn Route53ResolverApi;
    type Output = ResolverDnssecConfigOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "resource_id", &self.resource_id, 1, 64)
    }

    fn id(output: &Self::Output) -> String {
        output.resource_id.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        ResolverDnssecConfig {
            resource_id: output.resource_id.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        let vpc = self.resource_id.as_str();
        log::info!("enabling DNSSEC validation in '{vpc}'");
        api.update_resolver_dnssec_config(vpc, "ENABLE")
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: vpc,
                phase: Phase::Creating,
            })?;
        StateChange::new(|| status_resolver_dnssec_config(api, vpc))
            .pending([DNSSEC_ENABLING])
            .target([DNSSEC_ENABLED])
            .timeout(ctx.timeouts.create_or(CREATE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id: vpc,
                phase: Phase::WaitingForCreation,
            })?;
        Self::read(api, vpc, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: vpc,
        })
    }

    async fn read(api: &Self::Provider, id: &str, _ctx: &Context) -> Result<Option<Self::Output>> {
        let config = find_resolver_dnssec_config(api, id)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::Reading,
            })?
            .filter(|config| config.validation_status != DNSSEC_DISABLED);
        let Some(config) = config else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        Ok(Some(ResolverDnssecConfigOutput {
            id: config.id,
            owner_id: config.owner_id,
            resource_id: config.resource_id,
            validation_status: config.validation_status,
        }))
    }

    async fn update(
        &self,
        _api: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
        _ctx: &Context,
    ) -> Result<Self::Output> {
        validate::immutable(
            Self::TYPE_NAME,
            "resource_id",
            &previous_local.resource_id,
            &self.resource_id,
        )?;
        Ok(previous_remote.clone())
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, ctx: &Context) -> Result<()> {
        let vpc = previous_remote.resource_id.as_str();
        log::info!("disabling DNSSEC validation in '{vpc}'");
        let disabled = api.update_resolver_dnssec_config(vpc, "DISABLE").await.map(|_| ());
        ignore_not_found(disabled).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id: vpc,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_disabling(api, vpc))
            .pending([DNSSEC_DISABLING])
            .target([DNSSEC_DISABLED])
            .timeout(ctx.timeouts.delete_or(DELETE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id: vpc,
                phase: Phase::WaitingForDeletion,
            })?;
        Ok(())
    }
}
