//! DNS Firewall rules, which apply an action to the domains of one domain
//! list within a rule group.
//!
//! A rule has no ID of its own: it is addressed by its rule group and domain
//! list, as `groupId:domainListId`.
use snafu::prelude::*;

use super::{creator_request_id, FirewallRuleDetail, Route53ResolverApi};
use crate::{
    api::{ignore_not_found, ApiError},
    id, validate, ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result,
};

pub const FIREWALL_ACTIONS: &[&str] = &["ALLOW", "BLOCK", "ALERT"];
pub const BLOCK_RESPONSES: &[&str] = &["NODATA", "NXDOMAIN", "OVERRIDE"];
pub const BLOCK_OVERRIDE_DNS_TYPES: &[&str] = &["CNAME"];

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FirewallRule {
    pub firewall_rule_group_id: String,
    pub firewall_domain_list_id: String,
    pub name: String,
    /// Rules are evaluated in ascending priority order.
    pub priority: i32,
    /// One of `ALLOW`, `BLOCK` or `ALERT`.
    pub action: String,
    /// Required when `action` is `BLOCK`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_override_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_override_dns_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_override_ttl: Option<i32>,
}

/// A firewall rule is fully described by its desired state.
pub type FirewallRuleOutput = FirewallRule;

impl From<FirewallRuleDetail> for FirewallRule {
    fn from(rule: FirewallRuleDetail) -> Self {
        FirewallRule {
            firewall_rule_group_id: rule.firewall_rule_group_id,
            firewall_domain_list_id: rule.firewall_domain_list_id,
            name: rule.name,
            priority: rule.priority,
            action: rule.action,
            block_response: rule.block_response,
            block_override_domain: rule.block_override_domain,
            block_override_dns_type: rule.block_override_dns_type,
            block_override_ttl: rule.block_override_ttl,
        }
    }
}

impl FirewallRule {
    fn detail(&self) -> FirewallRuleDetail {
        FirewallRuleDetail {
            firewall_rule_group_id: self.firewall_rule_group_id.clone(),
            firewall_domain_list_id: self.firewall_domain_list_id.clone(),
            name: self.name.clone(),
            priority: self.priority,
            action: self.action.clone(),
            block_response: self.block_response.clone(),
            block_override_domain: self.block_override_domain.clone(),
            block_override_dns_type: self.block_override_dns_type.clone(),
            block_override_ttl: self.block_override_ttl,
        }
    }
}

/// Finds the rule for a domain list within a rule group.
///
/// A missing rule group means a missing rule.
pub async fn find_firewall_rule(
    api: &dyn Route53ResolverApi,
    firewall_rule_group_id: &str,
    firewall_domain_list_id: &str,
) -> Result<Option<FirewallRuleDetail>, ApiError> {
    match api.list_firewall_rules(firewall_rule_group_id).await {
        Ok(rules) => Ok(rules
            .into_iter()
            .find(|rule| rule.firewall_domain_list_id == firewall_domain_list_id)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

impl Resource for FirewallRule {
    const TYPE_NAME: &'static str = "aws_route53_resolver_firewall_rule";
    type Provider = dyn Route53ResolverApi;
    type Output = FirewallRuleOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "name", &self.name, 1, 64)?;
        validate::length_between(
            Self::TYPE_NAME,
            "firewall_rule_group_id",
            &self.firewall_rule_group_id,
            1,
            64,
        )?;
        validate::length_between(
            Self::TYPE_NAME,
            "firewall_domain_list_id",
            &self.firewall_domain_list_id,
            1,
            64,
        )?;
        validate::one_of(Self::TYPE_NAME, "action", &self.action, FIREWALL_ACTIONS)?;
        if let Some(response) = &self.block_response {
            validate::one_of(Self::TYPE_NAME, "block_response", response, BLOCK_RESPONSES)?;
        }
        if self.action == "BLOCK" {
            validate::check(
                Self::TYPE_NAME,
                self.block_response.is_some(),
                "block_response is required when action is BLOCK",
            )?;
        }
        if self.block_response.as_deref() == Some("OVERRIDE") {
            validate::check(
                Self::TYPE_NAME,
                self.block_override_domain.is_some()
                    && self.block_override_dns_type.is_some()
                    && self.block_override_ttl.is_some(),
                "OVERRIDE responses need block_override_domain, block_override_dns_type \
                 and block_override_ttl",
            )?;
        }
        if let Some(dns_type) = &self.block_override_dns_type {
            validate::one_of(
                Self::TYPE_NAME,
                "block_override_dns_type",
                dns_type,
                BLOCK_OVERRIDE_DNS_TYPES,
            )?;
        }
        if let Some(ttl) = self.block_override_ttl {
            validate::int_between(Self::TYPE_NAME, "block_override_ttl", ttl.into(), 0, 604_800)?;
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        id::join(
            &[
                output.firewall_rule_group_id.as_str(),
                output.firewall_domain_list_id.as_str(),
            ],
            id::COMPOSITE_SEPARATOR,
        )
    }

    fn flatten(output: &Self::Output) -> Self {
        output.clone()
    }

    async fn create(&self, api: &Self::Provider, _ctx: &Context) -> Result<Self::Output> {
        log::info!(
            "creating firewall rule '{}' in '{}'",
            self.name,
            self.firewall_rule_group_id
        );
        let rule = api
            .create_firewall_rule(&creator_request_id(), &self.detail())
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: Self::id(self),
                phase: Phase::Creating,
            })?;
        Ok(rule.into())
    }

    async fn read(api: &Self::Provider, id: &str, _ctx: &Context) -> Result<Option<Self::Output>> {
        let [group_id, list_id] = id::split::<2>(id, id::COMPOSITE_SEPARATOR)?;
        let rule = find_firewall_rule(api, &group_id, &list_id)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id,
                phase: Phase::Reading,
            })?;
        if rule.is_none() {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
        }
        Ok(rule.map(Into::into))
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
            "firewall_rule_group_id",
            &previous_local.firewall_rule_group_id,
            &self.firewall_rule_group_id,
        )?;
        validate::immutable(
            Self::TYPE_NAME,
            "firewall_domain_list_id",
            &previous_local.firewall_domain_list_id,
            &self.firewall_domain_list_id,
        )?;
        if self == previous_local {
            return Ok(previous_remote.clone());
        }
        let id = Self::id(previous_remote);
        log::info!("updating firewall rule '{id}'");
        api.update_firewall_rule(&self.detail())
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: &id,
                phase: Phase::Updating,
            })?;
        Self::read(api, &id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id,
        })
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, _ctx: &Context) -> Result<()> {
        let id = Self::id(previous_remote);
        log::info!("deleting firewall rule '{id}'");
        ignore_not_found(
            api.delete_firewall_rule(
                &previous_remote.firewall_rule_group_id,
                &previous_remote.firewall_domain_list_id,
            )
            .await,
        )
        .context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Deleting,
        })
    }
}
