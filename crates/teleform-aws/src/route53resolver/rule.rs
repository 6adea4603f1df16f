//! Resolver rules: which domains are forwarded, and where.
use std::time::Duration;

use snafu::prelude::*;

use super::{
    creator_request_id, ResolverRuleDetail, ResolverRuleInput,
    ResolverRuleUpdate, Route53ResolverApi, TargetAddress,
};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    tags::{read_tags, update_tags, Tags},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const RULE_COMPLETE: &str = "COMPLETE";
pub const RULE_UPDATING: &str = "UPDATING";
pub const RULE_DELETING: &str = "DELETING";
pub const RULE_FAILED: &str = "FAILED";

pub const RULE_TYPES: &[&str] = &["FORWARD", "SYSTEM", "RECURSIVE"];

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverRule {
    pub domain_name: String,
    /// One of `FORWARD`, `SYSTEM` or `RECURSIVE`.
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The outbound endpoint used by `FORWARD` rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_endpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_ips: Vec<TargetAddress>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverRuleOutput {
    pub id: String,
    pub arn: String,
    pub domain_name: String,
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_endpoint_id: Option<String>,
    #[serde(default)]
    pub target_ips: Vec<TargetAddress>,
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

/// AWS reports domain names fully qualified, with a trailing dot.
fn trim_domain(domain: &str) -> String {
    match domain {
        "." => domain.to_owned(),
        _ => domain.trim_end_matches('.').to_owned(),
    }
}

pub async fn find_resolver_rule(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Option<ResolverRuleDetail>, ApiError> {
    not_found_as_none(api.get_resolver_rule(id).await)
}

pub async fn status_resolver_rule(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Poll<ResolverRuleDetail>, ApiError> {
    let rule = find_resolver_rule(api, id).await?;
    Ok(Poll::from_found(rule, |rule| rule.status.clone()))
}

async fn wait_complete(
    api: &dyn Route53ResolverApi,
    id: &str,
    timeout: Duration,
    phase: Phase,
    ctx: &Context,
) -> Result<()> {
    StateChange::new(|| status_resolver_rule(api, id))
        .pending([RULE_UPDATING])
        .target([RULE_COMPLETE])
        .reason(|rule: &ResolverRuleDetail| rule.status_message.clone())
        .timeout(timeout)
        .wait(&ctx.cancel)
        .await
        .context(WaitSnafu {
            type_name: ResolverRule::TYPE_NAME,
            id,
            phase,
        })?;
    Ok(())
}

impl Resource for ResolverRule {
    const TYPE_NAME: &'static str = "aws_route53_resolver_rule";
    type Provider = dyn Route53ResolverApi;
    type Output = ResolverRuleOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "domain_name", &self.domain_name, 1, 256)?;
        validate::one_of(Self::TYPE_NAME, "rule_type", &self.rule_type, RULE_TYPES)?;
        if let Some(name) = &self.name {
            validate::length_between(Self::TYPE_NAME, "name", name, 0, 64)?;
        }
        match self.rule_type.as_str() {
            "FORWARD" => validate::check(
                Self::TYPE_NAME,
                !self.target_ips.is_empty(),
                "target_ips are required for FORWARD rules",
            )?,
            _ => validate::check(
                Self::TYPE_NAME,
                self.target_ips.is_empty(),
                format!("target_ips are not allowed for {} rules", self.rule_type),
            )?,
        }
        for target in &self.target_ips {
            validate::check(
                Self::TYPE_NAME,
                target.ip.is_some() || target.ipv6.is_some(),
                "every target needs an ip or an ipv6 address",
            )?;
            if let Some(ip) = &target.ip {
                validate::ip_address(Self::TYPE_NAME, "target_ips.ip", ip)?;
            }
            if let Some(ipv6) = &target.ipv6 {
                validate::ip_address(Self::TYPE_NAME, "target_ips.ipv6", ipv6)?;
            }
            if let Some(port) = target.port {
                validate::int_between(Self::TYPE_NAME, "target_ips.port", port.into(), 1, 65535)?;
            }
            if let Some(protocol) = &target.protocol {
                validate::one_of(Self::TYPE_NAME, "target_ips.protocol", protocol, super::PROTOCOLS)?;
            }
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        output.id.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        ResolverRule {
            domain_name: output.domain_name.clone(),
            rule_type: output.rule_type.clone(),
            name: output.name.clone(),
            resolver_endpoint_id: output.resolver_endpoint_id.clone(),
            target_ips: output.target_ips.clone(),
            tags: output.tags.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        let input = ResolverRuleInput {
            creator_request_id: creator_request_id(),
            name: self.name.clone(),
            domain_name: self.domain_name.clone(),
            rule_type: self.rule_type.clone(),
            resolver_endpoint_id: self.resolver_endpoint_id.clone(),
            target_ips: self.target_ips.clone(),
            tags: ctx.tags.merge(&self.tags),
        };
        log::info!("creating {} resolver rule for '{}'", self.rule_type, self.domain_name);
        let rule = api.create_resolver_rule(&input).await.context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id: &self.domain_name,
            phase: Phase::Creating,
        })?;
        log::info!("  created '{}'", rule.id);
        wait_complete(
            api,
            &rule.id,
            ctx.timeouts.create_or(CREATE_TIMEOUT),
            Phase::WaitingForCreation,
            ctx,
        )
        .await?;
        let mut output = Self::read(api, &rule.id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: rule.id,
        })?;
        ctx.tags
            .keep_configured(&mut output.tags, &output.tags_all, &self.tags);
        Ok(output)
    }

    async fn read(api: &Self::Provider, id: &str, ctx: &Context) -> Result<Option<Self::Output>> {
        let Some(rule) = find_resolver_rule(api, id).await.context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Reading,
        })?
        else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        let (tags, tags_all) = read_tags(api, Self::TYPE_NAME, &rule.arn, ctx).await?;
        Ok(Some(ResolverRuleOutput {
            id: rule.id,
            arn: rule.arn,
            domain_name: trim_domain(&rule.domain_name),
            rule_type: rule.rule_type,
            name: rule.name,
            resolver_endpoint_id: rule.resolver_endpoint_id,
            target_ips: rule.target_ips,
            owner_id: rule.owner_id,
            share_status: rule.share_status,
            status: rule.status,
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
        validate::immutable(
            Self::TYPE_NAME,
            "domain_name",
            &trim_domain(&previous_local.domain_name),
            &trim_domain(&self.domain_name),
        )?;
        validate::immutable(Self::TYPE_NAME, "rule_type", &previous_local.rule_type, &self.rule_type)?;

        let id = previous_remote.id.as_str();
        if self.name != previous_local.name
            || self.resolver_endpoint_id != previous_local.resolver_endpoint_id
            || self.target_ips != previous_local.target_ips
        {
            log::info!("updating resolver rule '{id}'");
            let update = ResolverRuleUpdate {
                name: self.name.clone(),
                resolver_endpoint_id: self.resolver_endpoint_id.clone(),
                target_ips: (self.target_ips != previous_local.target_ips)
                    .then(|| self.target_ips.clone()),
            };
            api.update_resolver_rule(id, &update).await.context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::Updating,
            })?;
            wait_complete(
                api,
                id,
                ctx.timeouts.update_or(UPDATE_TIMEOUT),
                Phase::WaitingForUpdate,
                ctx,
            )
            .await?;
        }
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
        log::info!("deleting resolver rule '{id}'");
        ignore_not_found(api.delete_resolver_rule(id).await).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_resolver_rule(api, id))
            .pending([RULE_DELETING])
            .target_gone()
            .reason(|rule: &ResolverRuleDetail| rule.status_message.clone())
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
    use crate::{fake::script, route53resolver::fake::FakeRoute53Resolver};

    fn rule() -> ResolverRule {
        ResolverRule {
            domain_name: "corp.example.com".into(),
            rule_type: "FORWARD".into(),
            name: Some("corp".into()),
            resolver_endpoint_id: Some("rslvr-out-1".into()),
            target_ips: vec![TargetAddress {
                ip: Some("192.168.0.2".into()),
                port: Some(53),
                ..Default::default()
            }],
            tags: Tags::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn create_trims_trailing_dot() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = rule().create(&fake, &ctx).await.unwrap();
        assert_eq!("corp.example.com", out.domain_name);
        assert_eq!(RULE_COMPLETE, out.status);
        pretty_assertions::assert_eq!(rule(), ResolverRule::flatten(&out));
    }

    #[tokio::test(start_paused = true)]
    async fn target_change_waits_for_complete() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = rule().create(&fake, &ctx).await.unwrap();
        fake.state().rules.update_script = script([RULE_UPDATING, RULE_UPDATING, RULE_COMPLETE]);

        let mut next = rule();
        next.target_ips.push(TargetAddress {
            ip: Some("192.168.0.3".into()),
            ..Default::default()
        });
        let updated = next.update(&fake, &rule(), &out, &ctx).await.unwrap();
        assert_eq!(2, updated.target_ips.len());
        assert_eq!(RULE_COMPLETE, updated.status);
        // Two reads after create, three polls while updating, one final read.
        assert_eq!(6, fake.state().calls.count("get_resolver_rule"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_update_is_reported() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = rule().create(&fake, &ctx).await.unwrap();
        fake.state().rules.update_script = script([RULE_UPDATING, RULE_FAILED]);

        let mut next = rule();
        next.name = Some("corp-2".into());
        let err = next.update(&fake, &rule(), &out, &ctx).await.unwrap_err();
        assert!(
            matches!(err, crate::Error::Wait { phase: Phase::WaitingForUpdate, .. }),
            "{err}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delete_twice() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = rule().create(&fake, &ctx).await.unwrap();
        fake.state().rules.delete_script = script([RULE_DELETING]);
        ResolverRule::delete(&fake, &out, &ctx).await.unwrap();
        ResolverRule::delete(&fake, &out, &ctx).await.unwrap();
    }

    #[test]
    fn validation() {
        assert!(rule().validate().is_ok());
        let mut bad = rule();
        bad.target_ips.clear();
        assert!(bad.validate().is_err());
        let system = ResolverRule {
            rule_type: "SYSTEM".into(),
            resolver_endpoint_id: None,
            target_ips: vec![],
            ..rule()
        };
        assert!(system.validate().is_ok());
        let mut bad = rule();
        bad.target_ips[0].port = Some(70000);
        assert!(bad.validate().is_err());
    }
}
