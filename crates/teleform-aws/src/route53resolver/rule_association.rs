//! Associations of resolver rules with VPCs.
use std::time::Duration;

use snafu::prelude::*;

use super::{RuleAssociationDetail, Route53ResolverApi};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const ASSOCIATION_CREATING: &str = "CREATING";
pub const ASSOCIATION_COMPLETE: &str = "COMPLETE";
pub const ASSOCIATION_DELETING: &str = "DELETING";

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverRuleAssociation {
    pub resolver_rule_id: String,
    pub vpc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverRuleAssociationOutput {
    pub id: String,
    pub resolver_rule_id: String,
    pub vpc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: String,
}

pub async fn find_resolver_rule_association(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Option<RuleAssociationDetail>, ApiError> {
    not_found_as_none(api.get_resolver_rule_association(id).await)
}

pub async fn status_resolver_rule_association(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Poll<RuleAssociationDetail>, ApiError> {
    let association = find_resolver_rule_association(api, id).await?;
    Ok(Poll::from_found(association, |a| a.status.clone()))
}

impl Resource for ResolverRuleAssociation {
    const TYPE_NAME: &'static str = "aws_route53_resolver_rule_association";
    type Provider = dyn Route53ResolverApi;
    type Output = ResolverRuleAssociationOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "resolver_rule_id", &self.resolver_rule_id, 1, 64)?;
        validate::length_between(Self::TYPE_NAME, "vpc_id", &self.vpc_id, 1, 64)?;
        if let Some(name) = &self.name {
            validate::length_between(Self::TYPE_NAME, "name", name, 0, 64)?;
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        output.id.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        ResolverRuleAssociation {
            resolver_rule_id: output.resolver_rule_id.clone(),
            vpc_id: output.vpc_id.clone(),
            name: output.name.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        log::info!(
            "associating resolver rule '{}' with '{}'",
            self.resolver_rule_id,
            self.vpc_id
        );
        let association = api
            .associate_resolver_rule(&self.resolver_rule_id, &self.vpc_id, self.name.as_deref())
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: format!("{}/{}", self.resolver_rule_id, self.vpc_id),
                phase: Phase::Creating,
            })?;
        let id = association.id.as_str();
        StateChange::new(|| status_resolver_rule_association(api, id))
            .pending([ASSOCIATION_CREATING])
            .target([ASSOCIATION_COMPLETE])
            .reason(|a: &RuleAssociationDetail| a.status_message.clone())
            .timeout(ctx.timeouts.create_or(CREATE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::WaitingForCreation,
            })?;
        Self::read(api, id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id,
        })
    }

    async fn read(api: &Self::Provider, id: &str, _ctx: &Context) -> Result<Option<Self::Output>> {
        let association = find_resolver_rule_association(api, id)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::Reading,
            })?;
        let Some(association) = association else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        Ok(Some(ResolverRuleAssociationOutput {
            id: association.id,
            resolver_rule_id: association.resolver_rule_id,
            vpc_id: association.vpc_id,
            name: association.name,
            status: association.status,
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
            "resolver_rule_id",
            &previous_local.resolver_rule_id,
            &self.resolver_rule_id,
        )?;
        validate::immutable(Self::TYPE_NAME, "vpc_id", &previous_local.vpc_id, &self.vpc_id)?;
        validate::immutable(Self::TYPE_NAME, "name", &previous_local.name, &self.name)?;
        Ok(previous_remote.clone())
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, ctx: &Context) -> Result<()> {
        let id = previous_remote.id.as_str();
        log::info!("disassociating resolver rule association '{id}'");
        ignore_not_found(
            api.disassociate_resolver_rule(&previous_remote.resolver_rule_id, &previous_remote.vpc_id)
                .await,
        )
        .context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_resolver_rule_association(api, id))
            .pending([ASSOCIATION_DELETING])
            .target_gone()
            .reason(|a: &RuleAssociationDetail| a.status_message.clone())
            .timeout(ctx.timeouts.delete_or(DELETE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::WaitingForDeletion,
            })?;
        Ok(())
    }
}
