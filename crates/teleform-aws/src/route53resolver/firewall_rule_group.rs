//! DNS Firewall rule groups.
use std::time::Duration;

use snafu::prelude::*;

use super::{
    creator_request_id, FirewallRuleGroupDetail, NamedInput,
    Route53ResolverApi,
};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    tags::{read_tags, update_tags, Tags},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const RULE_GROUP_COMPLETE: &str = "COMPLETE";
pub const RULE_GROUP_DELETING: &str = "DELETING";

const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FirewallRuleGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FirewallRuleGroupOutput {
    pub id: String,
    pub arn: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_status: Option<String>,
    pub status: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub tags_all: Tags,
}

pub async fn find_firewall_rule_group(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Option<FirewallRuleGroupDetail>, ApiError> {
    not_found_as_none(api.get_firewall_rule_group(id).await)
}

pub async fn status_firewall_rule_group(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Poll<FirewallRuleGroupDetail>, ApiError> {
    let group = find_firewall_rule_group(api, id).await?;
    Ok(Poll::from_found(group, |group| group.status.clone()))
}

impl Resource for FirewallRuleGroup {
    const TYPE_NAME: &'static str = "aws_route53_resolver_firewall_rule_group";
    type Provider = dyn Route53ResolverApi;
    type Output = FirewallRuleGroupOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "name", &self.name, 1, 64)
    }

    fn id(output: &Self::Output) -> String {
        output.id.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        FirewallRuleGroup {
            name: output.name.clone(),
            tags: output.tags.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        let input = NamedInput {
            creator_request_id: creator_request_id(),
            name: self.name.clone(),
            tags: ctx.tags.merge(&self.tags),
        };
        log::info!("creating firewall rule group '{}'", self.name);
        let group = api
            .create_firewall_rule_group(&input)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: &self.name,
                phase: Phase::Creating,
            })?;
        log::info!("  created '{}'", group.id);
        let mut output = Self::read(api, &group.id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: group.id,
        })?;
        ctx.tags
            .keep_configured(&mut output.tags, &output.tags_all, &self.tags);
        Ok(output)
    }

    async fn read(api: &Self::Provider, id: &str, ctx: &Context) -> Result<Option<Self::Output>> {
        let Some(group) = find_firewall_rule_group(api, id).await.context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Reading,
        })?
        else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        let (tags, tags_all) = read_tags(api, Self::TYPE_NAME, &group.arn, ctx).await?;
        Ok(Some(FirewallRuleGroupOutput {
            id: group.id,
            arn: group.arn,
            name: group.name,
            owner_id: group.owner_id,
            share_status: group.share_status,
            status: group.status,
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
        validate::immutable(Self::TYPE_NAME, "name", &previous_local.name, &self.name)?;
        let id = previous_remote.id.as_str();
        update_tags(
            api,
            Self::TYPE_NAME,
            &previous_remote.arn,
            &previous_remote.tags_all,
            &ctx.tags.merge(&self.tags),
        )
        .await?;
        let mut output = Self::read(api, id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id,
        })?;
        ctx.tags
            .keep_configured(&mut output.tags, &output.tags_all, &self.tags);
        Ok(output)
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, ctx: &Context) -> Result<()> {
        let id = previous_remote.id.as_str();
        log::info!("deleting firewall rule group '{id}'");
        ignore_not_found(api.delete_firewall_rule_group(id).await).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_firewall_rule_group(api, id))
            .pending([RULE_GROUP_DELETING])
            .target_gone()
            .reason(|group: &FirewallRuleGroupDetail| group.status_message.clone())
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::{fake::script, route53resolver::fake::FakeRoute53Resolver, tags::TagPolicy};

    #[tokio::test(start_paused = true)]
    async fn default_tags_are_not_resource_tags() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context {
            tags: TagPolicy {
                default_tags: [("env".to_string(), "dev".to_string())].into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let group = FirewallRuleGroup {
            name: "egress".into(),
            tags: [("Name".to_string(), "egress".to_string())].into(),
        };
        let out = group.create(&fake, &ctx).await.unwrap();
        assert_eq!(2, out.tags_all.len());
        assert_eq!(group, FirewallRuleGroup::flatten(&out));

        let untagged = FirewallRuleGroup {
            tags: Tags::new(),
            ..group.clone()
        };
        let updated = untagged.update(&fake, &group, &out, &ctx).await.unwrap();
        assert!(updated.tags.is_empty());
        assert_eq!(1, updated.tags_all.len());
        assert_eq!(1, fake.state().calls.count("untag_resource"));
        assert_eq!(0, fake.state().calls.count("tag_resource"));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_tags_equal_to_defaults_are_kept() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context {
            tags: TagPolicy {
                default_tags: [("env".to_string(), "dev".to_string())].into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let group = FirewallRuleGroup {
            name: "egress".into(),
            tags: [("env".to_string(), "dev".to_string())].into(),
        };
        let out = group.create(&fake, &ctx).await.unwrap();
        assert_eq!(group, FirewallRuleGroup::flatten(&out));

        let renamed = FirewallRuleGroup {
            tags: [
                ("env".to_string(), "dev".to_string()),
                ("Name".to_string(), "egress".to_string()),
            ]
            .into(),
            ..group.clone()
        };
        let updated = renamed.update(&fake, &group, &out, &ctx).await.unwrap();
        assert_eq!(renamed, FirewallRuleGroup::flatten(&updated));

        // A bare read can't tell the explicit tag from the default.
        let read = FirewallRuleGroup::read(&fake, &out.id, &ctx).await.unwrap().unwrap();
        assert_eq!(1, read.tags.len());
        assert_eq!(updated.tags_all, read.tags_all);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_with_rules_is_an_error() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = FirewallRuleGroup {
            name: "egress".into(),
            tags: Tags::new(),
        }
        .create(&fake, &ctx)
        .await
        .unwrap();
        fake.state()
            .firewall_rules
            .get_mut(&out.id)
            .unwrap()
            .push(Default::default());

        let err = FirewallRuleGroup::delete(&fake, &out, &ctx).await.unwrap_err();
        assert!(matches!(err, crate::Error::Api { phase: Phase::Deleting, .. }), "{err}");

        fake.state().firewall_rules.get_mut(&out.id).unwrap().clear();
        fake.state().rule_groups.delete_script = script([RULE_GROUP_DELETING]);
        FirewallRuleGroup::delete(&fake, &out, &ctx).await.unwrap();
        assert!(FirewallRuleGroup::read(&fake, &out.id, &ctx).await.unwrap().is_none());
    }
}
