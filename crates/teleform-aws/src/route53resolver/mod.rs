//! Route53Resolver infrastructure.
//!
//! Resolver endpoints and rules forward DNS queries between VPCs and other
//! networks, DNS Firewall filters them and DNSSEC validation checks them.
//! Everything here talks to AWS through [`Route53ResolverApi`].
use crate::{
    api::ApiError,
    tags::{TagApi, Tags},
    BoxFuture, Result,
};

mod dnssec_config;
mod endpoint;
#[cfg(test)]
pub(crate) mod fake;
mod firewall_domain_list;
mod firewall_rule;
mod firewall_rule_group;
mod retry;
mod rule;
mod rule_association;
mod sdk;

pub use dnssec_config::*;
pub use endpoint::*;
pub use firewall_domain_list::*;
pub use firewall_rule::*;
pub use firewall_rule_group::*;
pub use retry::LimitExceededIsNotRetryable;
pub use rule::*;
pub use rule_association::*;
pub use sdk::SdkRoute53Resolver;

/// An IP address of a resolver endpoint, as requested.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct IpAddress {
    pub subnet_id: String,
    /// Chosen by AWS from the subnet when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
}

/// An IP address of a resolver endpoint, as assigned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IpAddressDetail {
    pub ip_id: String,
    pub subnet_id: String,
    pub ip: Option<String>,
    pub ipv6: Option<String>,
    pub status: String,
}

impl IpAddressDetail {
    /// Returns `true` if this assigned address satisfies `request`.
    pub fn matches(&self, request: &IpAddress) -> bool {
        self.subnet_id == request.subnet_id
            && request.ip.as_ref().map_or(true, |ip| self.ip.as_ref() == Some(ip))
            && request
                .ipv6
                .as_ref()
                .map_or(true, |ipv6| self.ipv6.as_ref() == Some(ipv6))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverEndpointDetail {
    pub id: String,
    pub arn: String,
    pub name: Option<String>,
    pub direction: String,
    pub security_group_ids: Vec<String>,
    pub host_vpc_id: Option<String>,
    pub ip_address_count: i32,
    pub status: String,
    pub status_message: Option<String>,
    pub resolver_endpoint_type: Option<String>,
    pub protocols: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverEndpointInput {
    pub creator_request_id: String,
    pub name: Option<String>,
    pub direction: String,
    pub security_group_ids: Vec<String>,
    pub ip_addresses: Vec<IpAddress>,
    pub resolver_endpoint_type: Option<String>,
    pub protocols: Vec<String>,
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverEndpointUpdate {
    pub name: Option<String>,
    pub resolver_endpoint_type: Option<String>,
    pub protocols: Vec<String>,
}

/// Where a forwarding rule sends queries.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct TargetAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    /// `Do53`, `DoH` or `DoH-FIPS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverRuleDetail {
    pub id: String,
    pub arn: String,
    pub name: Option<String>,
    pub domain_name: String,
    pub rule_type: String,
    pub resolver_endpoint_id: Option<String>,
    pub target_ips: Vec<TargetAddress>,
    pub owner_id: Option<String>,
    pub share_status: Option<String>,
    pub status: String,
    pub status_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverRuleInput {
    pub creator_request_id: String,
    pub name: Option<String>,
    pub domain_name: String,
    pub rule_type: String,
    pub resolver_endpoint_id: Option<String>,
    pub target_ips: Vec<TargetAddress>,
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolverRuleUpdate {
    pub name: Option<String>,
    pub resolver_endpoint_id: Option<String>,
    pub target_ips: Option<Vec<TargetAddress>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleAssociationDetail {
    pub id: String,
    pub resolver_rule_id: String,
    pub vpc_id: String,
    pub name: Option<String>,
    pub status: String,
    pub status_message: Option<String>,
}

/// Input of the create calls that only take a name and tags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NamedInput {
    pub creator_request_id: String,
    pub name: String,
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FirewallDomainListDetail {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub domain_count: i32,
    pub status: String,
    pub status_message: Option<String>,
    pub managed_owner_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FirewallRuleGroupDetail {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub owner_id: Option<String>,
    pub share_status: Option<String>,
    pub status: String,
    pub status_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FirewallRuleDetail {
    pub firewall_rule_group_id: String,
    pub firewall_domain_list_id: String,
    pub name: String,
    pub priority: i32,
    pub action: String,
    pub block_response: Option<String>,
    pub block_override_domain: Option<String>,
    pub block_override_dns_type: Option<String>,
    pub block_override_ttl: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DnssecConfigDetail {
    pub id: String,
    pub owner_id: Option<String>,
    pub resource_id: String,
    pub validation_status: String,
}

/// The Route53Resolver control plane.
pub trait Route53ResolverApi: TagApi {
    fn create_resolver_endpoint<'a>(
        &'a self,
        input: &'a ResolverEndpointInput,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>>;

    fn get_resolver_endpoint<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>>;

    fn update_resolver_endpoint<'a>(
        &'a self,
        id: &'a str,
        update: &'a ResolverEndpointUpdate,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>>;

    fn delete_resolver_endpoint<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>>;

    fn list_resolver_endpoint_ip_addresses<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<IpAddressDetail>, ApiError>>;

    fn associate_resolver_endpoint_ip_address<'a>(
        &'a self,
        id: &'a str,
        ip: &'a IpAddress,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn disassociate_resolver_endpoint_ip_address<'a>(
        &'a self,
        id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn create_resolver_rule<'a>(
        &'a self,
        input: &'a ResolverRuleInput,
    ) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>>;

    fn get_resolver_rule<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>>;

    fn update_resolver_rule<'a>(
        &'a self,
        id: &'a str,
        update: &'a ResolverRuleUpdate,
    ) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>>;

    fn delete_resolver_rule<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>>;

    fn associate_resolver_rule<'a>(
        &'a self,
        resolver_rule_id: &'a str,
        vpc_id: &'a str,
        name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<RuleAssociationDetail, ApiError>>;

    fn get_resolver_rule_association<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<RuleAssociationDetail, ApiError>>;

    fn disassociate_resolver_rule<'a>(
        &'a self,
        resolver_rule_id: &'a str,
        vpc_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn create_firewall_domain_list<'a>(
        &'a self,
        input: &'a NamedInput,
    ) -> BoxFuture<'a, Result<FirewallDomainListDetail, ApiError>>;

    fn get_firewall_domain_list<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<FirewallDomainListDetail, ApiError>>;

    /// Replaces the domains of a list.
    fn replace_firewall_domains<'a>(
        &'a self,
        id: &'a str,
        domains: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn remove_firewall_domains<'a>(
        &'a self,
        id: &'a str,
        domains: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn list_firewall_domains<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Vec<String>, ApiError>>;

    fn delete_firewall_domain_list<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>>;

    fn create_firewall_rule_group<'a>(
        &'a self,
        input: &'a NamedInput,
    ) -> BoxFuture<'a, Result<FirewallRuleGroupDetail, ApiError>>;

    fn get_firewall_rule_group<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<FirewallRuleGroupDetail, ApiError>>;

    fn delete_firewall_rule_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>>;

    fn create_firewall_rule<'a>(
        &'a self,
        creator_request_id: &'a str,
        rule: &'a FirewallRuleDetail,
    ) -> BoxFuture<'a, Result<FirewallRuleDetail, ApiError>>;

    fn update_firewall_rule<'a>(
        &'a self,
        rule: &'a FirewallRuleDetail,
    ) -> BoxFuture<'a, Result<FirewallRuleDetail, ApiError>>;

    fn delete_firewall_rule<'a>(
        &'a self,
        firewall_rule_group_id: &'a str,
        firewall_domain_list_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn list_firewall_rules<'a>(
        &'a self,
        firewall_rule_group_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FirewallRuleDetail>, ApiError>>;

    /// `validation` is `ENABLE` or `DISABLE`.
    fn update_resolver_dnssec_config<'a>(
        &'a self,
        resource_id: &'a str,
        validation: &'a str,
    ) -> BoxFuture<'a, Result<DnssecConfigDetail, ApiError>>;

    fn list_resolver_dnssec_configs(&self) -> BoxFuture<'_, Result<Vec<DnssecConfigDetail>, ApiError>>;
}

/// A fresh idempotency token for a create call.
pub(crate) fn creator_request_id() -> String {
    format!("tele-aws-{:016x}", rand::random::<u64>())
}
