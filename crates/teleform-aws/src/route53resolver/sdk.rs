//! [`Route53ResolverApi`] backed by `aws-sdk-route53resolver`.
use aws_config::SdkConfig;
use aws_sdk_route53resolver::{
    operation::{
        associate_resolver_endpoint_ip_address::AssociateResolverEndpointIpAddressError,
        associate_resolver_rule::AssociateResolverRuleError,
        create_firewall_domain_list::CreateFirewallDomainListError,
        create_firewall_rule::CreateFirewallRuleError,
        create_firewall_rule_group::CreateFirewallRuleGroupError,
        create_resolver_endpoint::CreateResolverEndpointError,
        create_resolver_rule::CreateResolverRuleError,
    },
    types,
};
use aws_smithy_runtime_api::client::retries::classifiers::SharedRetryClassifier;

use super::*;

pub struct SdkRoute53Resolver {
    client: aws_sdk_route53resolver::Client,
}

impl SdkRoute53Resolver {
    pub fn new(sdk: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_route53resolver::config::Builder::from(sdk);
        if let Some(url) = endpoint_url {
            log::debug!("route53resolver endpoint override: {url}");
            builder.set_endpoint_url(Some(url.to_owned()));
        }

        // One classifier per create operation, since each has its own error type.
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            CreateResolverEndpointError,
        >::new()));
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            AssociateResolverEndpointIpAddressError,
        >::new()));
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            CreateResolverRuleError,
        >::new()));
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            AssociateResolverRuleError,
        >::new()));
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            CreateFirewallDomainListError,
        >::new()));
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            CreateFirewallRuleGroupError,
        >::new()));
        builder.push_retry_classifier(SharedRetryClassifier::new(LimitExceededIsNotRetryable::<
            CreateFirewallRuleError,
        >::new()));

        Self {
            client: aws_sdk_route53resolver::Client::from_conf(builder.build()),
        }
    }
}

fn empty_response(what: &str) -> ApiError {
    ApiError::new("EmptyResponse", format!("response is missing {what}"))
}

fn owned(s: Option<&str>) -> String {
    s.unwrap_or_default().to_owned()
}

fn to_sdk_tags(tags: &Tags) -> Result<Option<Vec<types::Tag>>, ApiError> {
    if tags.is_empty() {
        return Ok(None);
    }
    tags.iter()
        .map(|(k, v)| {
            types::Tag::builder()
                .key(k)
                .value(v)
                .build()
                .map_err(ApiError::from_build)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn endpoint_detail(endpoint: Option<types::ResolverEndpoint>) -> Result<ResolverEndpointDetail, ApiError> {
    let endpoint = endpoint.ok_or_else(|| empty_response("resolver endpoint"))?;
    Ok(ResolverEndpointDetail {
        id: owned(endpoint.id()),
        arn: owned(endpoint.arn()),
        name: endpoint.name().map(str::to_owned),
        direction: endpoint
            .direction()
            .map(|d| d.as_str().to_owned())
            .unwrap_or_default(),
        security_group_ids: endpoint.security_group_ids().to_vec(),
        host_vpc_id: endpoint.host_vpc_id().map(str::to_owned),
        ip_address_count: endpoint.ip_address_count().unwrap_or_default(),
        status: endpoint
            .status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        status_message: endpoint.status_message().map(str::to_owned),
        resolver_endpoint_type: endpoint
            .resolver_endpoint_type()
            .map(|t| t.as_str().to_owned()),
        protocols: endpoint
            .protocols()
            .iter()
            .map(|p| p.as_str().to_owned())
            .collect(),
    })
}

fn to_sdk_target(target: &TargetAddress) -> types::TargetAddress {
    types::TargetAddress::builder()
        .set_ip(target.ip.clone())
        .set_ipv6(target.ipv6.clone())
        .set_port(target.port)
        .set_protocol(target.protocol.as_deref().map(types::Protocol::from))
        .build()
}

fn rule_detail(rule: Option<types::ResolverRule>) -> Result<ResolverRuleDetail, ApiError> {
    let rule = rule.ok_or_else(|| empty_response("resolver rule"))?;
    Ok(ResolverRuleDetail {
        id: owned(rule.id()),
        arn: owned(rule.arn()),
        name: rule.name().map(str::to_owned),
        domain_name: owned(rule.domain_name()),
        rule_type: rule
            .rule_type()
            .map(|t| t.as_str().to_owned())
            .unwrap_or_default(),
        resolver_endpoint_id: rule.resolver_endpoint_id().map(str::to_owned),
        target_ips: rule
            .target_ips()
            .iter()
            .map(|t| TargetAddress {
                ip: t.ip().map(str::to_owned),
                ipv6: t.ipv6().map(str::to_owned),
                port: t.port(),
                protocol: t.protocol().map(|p| p.as_str().to_owned()),
            })
            .collect(),
        owner_id: rule.owner_id().map(str::to_owned),
        share_status: rule.share_status().map(|s| s.as_str().to_owned()),
        status: rule
            .status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        status_message: rule.status_message().map(str::to_owned),
    })
}

fn association_detail(
    association: Option<types::ResolverRuleAssociation>,
) -> Result<RuleAssociationDetail, ApiError> {
    let association = association.ok_or_else(|| empty_response("resolver rule association"))?;
    Ok(RuleAssociationDetail {
        id: owned(association.id()),
        resolver_rule_id: owned(association.resolver_rule_id()),
        vpc_id: owned(association.vpc_id()),
        name: association.name().map(str::to_owned),
        status: association
            .status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        status_message: association.status_message().map(str::to_owned),
    })
}

fn domain_list_detail(
    list: Option<types::FirewallDomainList>,
) -> Result<FirewallDomainListDetail, ApiError> {
    let list = list.ok_or_else(|| empty_response("firewall domain list"))?;
    Ok(FirewallDomainListDetail {
        id: owned(list.id()),
        arn: owned(list.arn()),
        name: owned(list.name()),
        domain_count: list.domain_count().unwrap_or_default(),
        status: list
            .status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        status_message: list.status_message().map(str::to_owned),
        managed_owner_name: list.managed_owner_name().map(str::to_owned),
    })
}

fn rule_group_detail(
    group: Option<types::FirewallRuleGroup>,
) -> Result<FirewallRuleGroupDetail, ApiError> {
    let group = group.ok_or_else(|| empty_response("firewall rule group"))?;
    Ok(FirewallRuleGroupDetail {
        id: owned(group.id()),
        arn: owned(group.arn()),
        name: owned(group.name()),
        owner_id: group.owner_id().map(str::to_owned),
        share_status: group.share_status().map(|s| s.as_str().to_owned()),
        status: group
            .status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        status_message: group.status_message().map(str::to_owned),
    })
}

fn firewall_rule_detail(rule: &types::FirewallRule) -> FirewallRuleDetail {
    FirewallRuleDetail {
        firewall_rule_group_id: owned(rule.firewall_rule_group_id()),
        firewall_domain_list_id: owned(rule.firewall_domain_list_id()),
        name: owned(rule.name()),
        priority: rule.priority().unwrap_or_default(),
        action: rule
            .action()
            .map(|a| a.as_str().to_owned())
            .unwrap_or_default(),
        block_response: rule.block_response().map(|b| b.as_str().to_owned()),
        block_override_domain: rule.block_override_domain().map(str::to_owned),
        block_override_dns_type: rule
            .block_override_dns_type()
            .map(|t| t.as_str().to_owned()),
        block_override_ttl: rule.block_override_ttl(),
    }
}

fn dnssec_detail(config: &types::ResolverDnssecConfig) -> DnssecConfigDetail {
    DnssecConfigDetail {
        id: owned(config.id()),
        owner_id: config.owner_id().map(str::to_owned),
        resource_id: owned(config.resource_id()),
        validation_status: config
            .validation_status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
    }
}

impl Route53ResolverApi for SdkRoute53Resolver {
    fn create_resolver_endpoint<'a>(
        &'a self,
        input: &'a ResolverEndpointInput,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>> {
        Box::pin(async move {
            let ip_addresses = input
                .ip_addresses
                .iter()
                .map(|ip| {
                    types::IpAddressRequest::builder()
                        .subnet_id(&ip.subnet_id)
                        .set_ip(ip.ip.clone())
                        .set_ipv6(ip.ipv6.clone())
                        .build()
                        .map_err(ApiError::from_build)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let out = self
                .client
                .create_resolver_endpoint()
                .creator_request_id(&input.creator_request_id)
                .set_name(input.name.clone())
                .direction(types::ResolverEndpointDirection::from(input.direction.as_str()))
                .set_security_group_ids(Some(input.security_group_ids.clone()))
                .set_ip_addresses(Some(ip_addresses))
                .set_resolver_endpoint_type(
                    input
                        .resolver_endpoint_type
                        .as_deref()
                        .map(types::ResolverEndpointType::from),
                )
                .set_protocols((!input.protocols.is_empty()).then(|| {
                    input
                        .protocols
                        .iter()
                        .map(|p| types::Protocol::from(p.as_str()))
                        .collect()
                }))
                .set_tags(to_sdk_tags(&input.tags)?)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            endpoint_detail(out.resolver_endpoint)
        })
    }

    fn get_resolver_endpoint<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_resolver_endpoint()
                .resolver_endpoint_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            endpoint_detail(out.resolver_endpoint)
        })
    }

    fn update_resolver_endpoint<'a>(
        &'a self,
        id: &'a str,
        update: &'a ResolverEndpointUpdate,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .update_resolver_endpoint()
                .resolver_endpoint_id(id)
                .set_name(update.name.clone())
                .set_resolver_endpoint_type(
                    update
                        .resolver_endpoint_type
                        .as_deref()
                        .map(types::ResolverEndpointType::from),
                )
                .set_protocols((!update.protocols.is_empty()).then(|| {
                    update
                        .protocols
                        .iter()
                        .map(|p| types::Protocol::from(p.as_str()))
                        .collect()
                }))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            endpoint_detail(out.resolver_endpoint)
        })
    }

    fn delete_resolver_endpoint<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_resolver_endpoint()
                .resolver_endpoint_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn list_resolver_endpoint_ip_addresses<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<IpAddressDetail>, ApiError>> {
        Box::pin(async move {
            let mut ips = vec![];
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_resolver_endpoint_ip_addresses()
                    .resolver_endpoint_id(id)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                ips.extend(out.ip_addresses().iter().map(|ip| IpAddressDetail {
                    ip_id: owned(ip.ip_id()),
                    subnet_id: owned(ip.subnet_id()),
                    ip: ip.ip().map(str::to_owned),
                    ipv6: ip.ipv6().map(str::to_owned),
                    status: ip
                        .status()
                        .map(|s| s.as_str().to_owned())
                        .unwrap_or_default(),
                }));
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(ips)
        })
    }

    fn associate_resolver_endpoint_ip_address<'a>(
        &'a self,
        id: &'a str,
        ip: &'a IpAddress,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .associate_resolver_endpoint_ip_address()
                .resolver_endpoint_id(id)
                .ip_address(
                    types::IpAddressUpdate::builder()
                        .subnet_id(&ip.subnet_id)
                        .set_ip(ip.ip.clone())
                        .set_ipv6(ip.ipv6.clone())
                        .build(),
                )
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn disassociate_resolver_endpoint_ip_address<'a>(
        &'a self,
        id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .disassociate_resolver_endpoint_ip_address()
                .resolver_endpoint_id(id)
                .ip_address(types::IpAddressUpdate::builder().ip_id(ip_id).build())
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn create_resolver_rule<'a>(
        &'a self,
        input: &'a ResolverRuleInput,
    ) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .create_resolver_rule()
                .creator_request_id(&input.creator_request_id)
                .set_name(input.name.clone())
                .domain_name(&input.domain_name)
                .rule_type(types::RuleTypeOption::from(input.rule_type.as_str()))
                .set_resolver_endpoint_id(input.resolver_endpoint_id.clone())
                .set_target_ips(
                    (!input.target_ips.is_empty())
                        .then(|| input.target_ips.iter().map(to_sdk_target).collect()),
                )
                .set_tags(to_sdk_tags(&input.tags)?)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            rule_detail(out.resolver_rule)
        })
    }

    fn get_resolver_rule<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_resolver_rule()
                .resolver_rule_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            rule_detail(out.resolver_rule)
        })
    }

    fn update_resolver_rule<'a>(
        &'a self,
        id: &'a str,
        update: &'a ResolverRuleUpdate,
    ) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>> {
        Box::pin(async move {
            let config = types::ResolverRuleConfig::builder()
                .set_name(update.name.clone())
                .set_resolver_endpoint_id(update.resolver_endpoint_id.clone())
                .set_target_ips(
                    update
                        .target_ips
                        .as_ref()
                        .map(|targets| targets.iter().map(to_sdk_target).collect()),
                )
                .build();
            let out = self
                .client
                .update_resolver_rule()
                .resolver_rule_id(id)
                .config(config)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            rule_detail(out.resolver_rule)
        })
    }

    fn delete_resolver_rule<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_resolver_rule()
                .resolver_rule_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn associate_resolver_rule<'a>(
        &'a self,
        resolver_rule_id: &'a str,
        vpc_id: &'a str,
        name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<RuleAssociationDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .associate_resolver_rule()
                .resolver_rule_id(resolver_rule_id)
                .vpc_id(vpc_id)
                .set_name(name.map(str::to_owned))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            association_detail(out.resolver_rule_association)
        })
    }

    fn get_resolver_rule_association<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<RuleAssociationDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_resolver_rule_association()
                .resolver_rule_association_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            association_detail(out.resolver_rule_association)
        })
    }

    fn disassociate_resolver_rule<'a>(
        &'a self,
        resolver_rule_id: &'a str,
        vpc_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .disassociate_resolver_rule()
                .resolver_rule_id(resolver_rule_id)
                .vpc_id(vpc_id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn create_firewall_domain_list<'a>(
        &'a self,
        input: &'a NamedInput,
    ) -> BoxFuture<'a, Result<FirewallDomainListDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .create_firewall_domain_list()
                .creator_request_id(&input.creator_request_id)
                .name(&input.name)
                .set_tags(to_sdk_tags(&input.tags)?)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            domain_list_detail(out.firewall_domain_list)
        })
    }

    fn get_firewall_domain_list<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<FirewallDomainListDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_firewall_domain_list()
                .firewall_domain_list_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            domain_list_detail(out.firewall_domain_list)
        })
    }

    fn replace_firewall_domains<'a>(
        &'a self,
        id: &'a str,
        domains: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .update_firewall_domains()
                .firewall_domain_list_id(id)
                .operation(types::FirewallDomainUpdateOperation::Replace)
                .set_domains(Some(domains.to_vec()))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn remove_firewall_domains<'a>(
        &'a self,
        id: &'a str,
        domains: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .update_firewall_domains()
                .firewall_domain_list_id(id)
                .operation(types::FirewallDomainUpdateOperation::Remove)
                .set_domains(Some(domains.to_vec()))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn list_firewall_domains<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Vec<String>, ApiError>> {
        Box::pin(async move {
            let mut domains = vec![];
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_firewall_domains()
                    .firewall_domain_list_id(id)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                domains.extend(out.domains().iter().cloned());
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(domains)
        })
    }

    fn delete_firewall_domain_list<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_firewall_domain_list()
                .firewall_domain_list_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn create_firewall_rule_group<'a>(
        &'a self,
        input: &'a NamedInput,
    ) -> BoxFuture<'a, Result<FirewallRuleGroupDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .create_firewall_rule_group()
                .creator_request_id(&input.creator_request_id)
                .name(&input.name)
                .set_tags(to_sdk_tags(&input.tags)?)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            rule_group_detail(out.firewall_rule_group)
        })
    }

    fn get_firewall_rule_group<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<FirewallRuleGroupDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_firewall_rule_group()
                .firewall_rule_group_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            rule_group_detail(out.firewall_rule_group)
        })
    }

    fn delete_firewall_rule_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_firewall_rule_group()
                .firewall_rule_group_id(id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn create_firewall_rule<'a>(
        &'a self,
        creator_request_id: &'a str,
        rule: &'a FirewallRuleDetail,
    ) -> BoxFuture<'a, Result<FirewallRuleDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .create_firewall_rule()
                .creator_request_id(creator_request_id)
                .firewall_rule_group_id(&rule.firewall_rule_group_id)
                .firewall_domain_list_id(&rule.firewall_domain_list_id)
                .name(&rule.name)
                .priority(rule.priority)
                .action(types::Action::from(rule.action.as_str()))
                .set_block_response(rule.block_response.as_deref().map(types::BlockResponse::from))
                .set_block_override_domain(rule.block_override_domain.clone())
                .set_block_override_dns_type(
                    rule.block_override_dns_type
                        .as_deref()
                        .map(types::BlockOverrideDnsType::from),
                )
                .set_block_override_ttl(rule.block_override_ttl)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            out.firewall_rule()
                .map(firewall_rule_detail)
                .ok_or_else(|| empty_response("firewall rule"))
        })
    }

    fn update_firewall_rule<'a>(
        &'a self,
        rule: &'a FirewallRuleDetail,
    ) -> BoxFuture<'a, Result<FirewallRuleDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .update_firewall_rule()
                .firewall_rule_group_id(&rule.firewall_rule_group_id)
                .firewall_domain_list_id(&rule.firewall_domain_list_id)
                .name(&rule.name)
                .priority(rule.priority)
                .action(types::Action::from(rule.action.as_str()))
                .set_block_response(rule.block_response.as_deref().map(types::BlockResponse::from))
                .set_block_override_domain(rule.block_override_domain.clone())
                .set_block_override_dns_type(
                    rule.block_override_dns_type
                        .as_deref()
                        .map(types::BlockOverrideDnsType::from),
                )
                .set_block_override_ttl(rule.block_override_ttl)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            out.firewall_rule()
                .map(firewall_rule_detail)
                .ok_or_else(|| empty_response("firewall rule"))
        })
    }

    fn delete_firewall_rule<'a>(
        &'a self,
        firewall_rule_group_id: &'a str,
        firewall_domain_list_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_firewall_rule()
                .firewall_rule_group_id(firewall_rule_group_id)
                .firewall_domain_list_id(firewall_domain_list_id)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn list_firewall_rules<'a>(
        &'a self,
        firewall_rule_group_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FirewallRuleDetail>, ApiError>> {
        Box::pin(async move {
            let mut rules = vec![];
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_firewall_rules()
                    .firewall_rule_group_id(firewall_rule_group_id)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                rules.extend(out.firewall_rules().iter().map(firewall_rule_detail));
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(rules)
        })
    }

    fn update_resolver_dnssec_config<'a>(
        &'a self,
        resource_id: &'a str,
        validation: &'a str,
    ) -> BoxFuture<'a, Result<DnssecConfigDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .update_resolver_dnssec_config()
                .resource_id(resource_id)
                .validation(types::Validation::from(validation))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            out.resolver_dnssec_config()
                .map(dnssec_detail)
                .ok_or_else(|| empty_response("resolver dnssec config"))
        })
    }

    fn list_resolver_dnssec_configs(&self) -> BoxFuture<'_, Result<Vec<DnssecConfigDetail>, ApiError>> {
        Box::pin(async move {
            let mut configs = vec![];
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_resolver_dnssec_configs()
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                configs.extend(out.resolver_dnssec_configs().iter().map(dnssec_detail));
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(configs)
        })
    }
}

impl TagApi for SdkRoute53Resolver {
    fn list_tags_for_resource<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<Tags, ApiError>> {
        Box::pin(async move {
            let mut tags = Tags::new();
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_tags_for_resource()
                    .resource_arn(arn)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                tags.extend(
                    out.tags()
                        .iter()
                        .map(|tag| (tag.key().to_owned(), tag.value().to_owned())),
                );
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(tags)
        })
    }

    fn tag_resource<'a>(&'a self, arn: &'a str, tags: &'a Tags) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .tag_resource()
                .resource_arn(arn)
                .set_tags(to_sdk_tags(tags)?)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn untag_resource<'a>(
        &'a self,
        arn: &'a str,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .untag_resource()
                .resource_arn(arn)
                .set_tag_keys(Some(keys.to_vec()))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }
}
