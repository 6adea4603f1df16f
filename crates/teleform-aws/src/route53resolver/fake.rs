//! In-memory [`Route53ResolverApi`].
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use super::*;
use crate::{
    api::{CONFLICT, RESOURCE_NOT_FOUND},
    fake::{Calls, HasStatus, Table},
};

pub(crate) const ACCOUNT: &str = "123456789012";

macro_rules! has_status {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(impl HasStatus for $ty {
            fn set_status(&mut self, status: &str) {
                self.$field = status.to_owned();
            }
        })*
    };
}

has_status! {
    ResolverEndpointDetail => status,
    ResolverRuleDetail => status,
    RuleAssociationDetail => status,
    FirewallDomainListDetail => status,
    FirewallRuleGroupDetail => status,
    DnssecConfigDetail => validation_status,
}

#[derive(Default)]
pub(crate) struct State {
    pub calls: Calls,
    pub endpoints: Table<ResolverEndpointDetail>,
    pub endpoint_ips: BTreeMap<String, Vec<IpAddressDetail>>,
    pub rules: Table<ResolverRuleDetail>,
    pub associations: Table<RuleAssociationDetail>,
    pub domain_lists: Table<FirewallDomainListDetail>,
    pub domains: BTreeMap<String, Vec<String>>,
    pub rule_groups: Table<FirewallRuleGroupDetail>,
    /// Firewall rules by rule group ID.
    pub firewall_rules: BTreeMap<String, Vec<FirewallRuleDetail>>,
    /// DNSSEC configs by VPC ID.
    pub dnssec: Table<DnssecConfigDetail>,
    pub tags: BTreeMap<String, Tags>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn arn(&self, kind: &str, id: &str) -> String {
        format!("arn:aws:route53resolver:us-east-1:{ACCOUNT}:{kind}/{id}")
    }

    fn assign_ip(&mut self, endpoint_id: &str, request: &IpAddress) -> IpAddressDetail {
        let n = self.next_id();
        let ip = IpAddressDetail {
            ip_id: format!("rni-{n:017x}"),
            subnet_id: request.subnet_id.clone(),
            ip: request.ip.clone().or_else(|| Some(format!("10.0.{}.{}", n / 250, n % 250 + 4))),
            ipv6: request.ipv6.clone(),
            status: "ATTACHED".into(),
        };
        let ips = self.endpoint_ips.entry(endpoint_id.to_owned()).or_default();
        ips.push(ip.clone());
        let count = ips.len() as i32;
        self.endpoints
            .set(endpoint_id, |endpoint| endpoint.ip_address_count = count);
        ip
    }
}

#[derive(Default)]
pub(crate) struct FakeRoute53Resolver {
    state: Mutex<State>,
}

impl FakeRoute53Resolver {
    pub fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with<'a, T: Send + 'a>(
        &'a self,
        op: &str,
        f: impl FnOnce(&mut State) -> Result<T, ApiError>,
    ) -> BoxFuture<'a, Result<T, ApiError>> {
        let mut state = self.state();
        let result = state.calls.call(op).and_then(|()| f(&mut state));
        Box::pin(std::future::ready(result))
    }
}

fn missing(what: &str, id: &str) -> ApiError {
    ApiError::new(RESOURCE_NOT_FOUND, format!("{what} {id} does not exist"))
}

impl Route53ResolverApi for FakeRoute53Resolver {
    fn create_resolver_endpoint<'a>(
        &'a self,
        input: &'a ResolverEndpointInput,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>> {
        self.with("create_resolver_endpoint", |state| {
            let prefix = if input.direction == "INBOUND" { "in" } else { "out" };
            let id = format!("rslvr-{prefix}-{:017x}", state.next_id());
            let arn = state.arn("resolver-endpoint", &id);
            let endpoint = state.endpoints.insert(
                &id,
                ResolverEndpointDetail {
                    id: id.clone(),
                    arn: arn.clone(),
                    name: input.name.clone(),
                    direction: input.direction.clone(),
                    security_group_ids: input.security_group_ids.clone(),
                    host_vpc_id: Some("vpc-0123456789abcdef0".into()),
                    ip_address_count: 0,
                    status: "OPERATIONAL".into(),
                    status_message: None,
                    resolver_endpoint_type: input
                        .resolver_endpoint_type
                        .clone()
                        .or_else(|| Some("IPV4".into())),
                    protocols: if input.protocols.is_empty() {
                        vec!["Do53".into()]
                    } else {
                        input.protocols.clone()
                    },
                },
            );
            for ip in &input.ip_addresses {
                state.assign_ip(&id, ip);
            }
            state.tags.insert(arn, input.tags.clone());
            Ok(ResolverEndpointDetail {
                ip_address_count: input.ip_addresses.len() as i32,
                ..endpoint
            })
        })
    }

    fn get_resolver_endpoint<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>> {
        self.with("get_resolver_endpoint", |state| state.endpoints.get(id))
    }

    fn update_resolver_endpoint<'a>(
        &'a self,
        id: &'a str,
        update: &'a ResolverEndpointUpdate,
    ) -> BoxFuture<'a, Result<ResolverEndpointDetail, ApiError>> {
        self.with("update_resolver_endpoint", |state| {
            state.endpoints.update(id, |endpoint| {
                if update.name.is_some() {
                    endpoint.name = update.name.clone();
                }
                if update.resolver_endpoint_type.is_some() {
                    endpoint.resolver_endpoint_type = update.resolver_endpoint_type.clone();
                }
                if !update.protocols.is_empty() {
                    endpoint.protocols = update.protocols.clone();
                }
            })
        })
    }

    fn delete_resolver_endpoint<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_resolver_endpoint", |state| {
            state.endpoints.remove(id)?;
            state.endpoint_ips.remove(id);
            Ok(())
        })
    }

    fn list_resolver_endpoint_ip_addresses<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<IpAddressDetail>, ApiError>> {
        self.with("list_resolver_endpoint_ip_addresses", |state| {
            if !state.endpoints.contains(id) {
                return Err(missing("resolver endpoint", id));
            }
            Ok(state.endpoint_ips.get(id).cloned().unwrap_or_default())
        })
    }

    fn associate_resolver_endpoint_ip_address<'a>(
        &'a self,
        id: &'a str,
        ip: &'a IpAddress,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("associate_resolver_endpoint_ip_address", |state| {
            state.endpoints.update(id, |_| {})?;
            state.assign_ip(id, ip);
            Ok(())
        })
    }

    fn disassociate_resolver_endpoint_ip_address<'a>(
        &'a self,
        id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("disassociate_resolver_endpoint_ip_address", |state| {
            let ips = state
                .endpoint_ips
                .get_mut(id)
                .ok_or_else(|| missing("resolver endpoint", id))?;
            let before = ips.len();
            ips.retain(|ip| ip.ip_id != ip_id);
            if ips.len() == before {
                return Err(missing("IP address", ip_id));
            }
            let count = ips.len() as i32;
            state.endpoints.update(id, |endpoint| endpoint.ip_address_count = count)?;
            Ok(())
        })
    }

    fn create_resolver_rule<'a>(
        &'a self,
        input: &'a ResolverRuleInput,
    ) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>> {
        self.with("create_resolver_rule", |state| {
            let id = format!("rslvr-rr-{:017x}", state.next_id());
            let arn = state.arn("resolver-rule", &id);
            let rule = state.rules.insert(
                &id,
                ResolverRuleDetail {
                    id: id.clone(),
                    arn: arn.clone(),
                    name: input.name.clone(),
                    domain_name: format!("{}.", input.domain_name.trim_end_matches('.')),
                    rule_type: input.rule_type.clone(),
                    resolver_endpoint_id: input.resolver_endpoint_id.clone(),
                    target_ips: input.target_ips.clone(),
                    owner_id: Some(ACCOUNT.into()),
                    share_status: Some("NOT_SHARED".into()),
                    status: "COMPLETE".into(),
                    status_message: None,
                },
            );
            state.tags.insert(arn, input.tags.clone());
            Ok(rule)
        })
    }

    fn get_resolver_rule<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>> {
        self.with("get_resolver_rule", |state| state.rules.get(id))
    }

    fn update_resolver_rule<'a>(
        &'a self,
        id: &'a str,
        update: &'a ResolverRuleUpdate,
    ) -> BoxFuture<'a, Result<ResolverRuleDetail, ApiError>> {
        self.with("update_resolver_rule", |state| {
            state.rules.update(id, |rule| {
                if update.name.is_some() {
                    rule.name = update.name.clone();
                }
                if update.resolver_endpoint_id.is_some() {
                    rule.resolver_endpoint_id = update.resolver_endpoint_id.clone();
                }
                if let Some(targets) = &update.target_ips {
                    rule.target_ips = targets.clone();
                }
            })
        })
    }

    fn delete_resolver_rule<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_resolver_rule", |state| {
            state.rules.remove(id)?;
            Ok(())
        })
    }

    fn associate_resolver_rule<'a>(
        &'a self,
        resolver_rule_id: &'a str,
        vpc_id: &'a str,
        name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<RuleAssociationDetail, ApiError>> {
        self.with("associate_resolver_rule", |state| {
            if !state.rules.contains(resolver_rule_id) {
                return Err(missing("resolver rule", resolver_rule_id));
            }
            let id = format!("rslvr-rrassoc-{:017x}", state.next_id());
            Ok(state.associations.insert(
                &id,
                RuleAssociationDetail {
                    id: id.clone(),
                    resolver_rule_id: resolver_rule_id.to_owned(),
                    vpc_id: vpc_id.to_owned(),
                    name: name.map(str::to_owned),
                    status: "COMPLETE".into(),
                    status_message: None,
                },
            ))
        })
    }

    fn get_resolver_rule_association<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<RuleAssociationDetail, ApiError>> {
        self.with("get_resolver_rule_association", |state| state.associations.get(id))
    }

    fn disassociate_resolver_rule<'a>(
        &'a self,
        resolver_rule_id: &'a str,
        vpc_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("disassociate_resolver_rule", |state| {
            let id = state
                .associations
                .find_id(|a| a.resolver_rule_id == resolver_rule_id && a.vpc_id == vpc_id)
                .ok_or_else(|| missing("resolver rule association", resolver_rule_id))?;
            state.associations.remove(&id)?;
            Ok(())
        })
    }

    fn create_firewall_domain_list<'a>(
        &'a self,
        input: &'a NamedInput,
    ) -> BoxFuture<'a, Result<FirewallDomainListDetail, ApiError>> {
        self.with("create_firewall_domain_list", |state| {
            let id = format!("rslvr-fdl-{:017x}", state.next_id());
            let arn = state.arn("firewall-domain-list", &id);
            let list = state.domain_lists.insert(
                &id,
                FirewallDomainListDetail {
                    id: id.clone(),
                    arn: arn.clone(),
                    name: input.name.clone(),
                    domain_count: 0,
                    status: "COMPLETE".into(),
                    status_message: None,
                    managed_owner_name: None,
                },
            );
            state.domains.insert(id, vec![]);
            state.tags.insert(arn, input.tags.clone());
            Ok(list)
        })
    }

    fn get_firewall_domain_list<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<FirewallDomainListDetail, ApiError>> {
        self.with("get_firewall_domain_list", |state| state.domain_lists.get(id))
    }

    fn replace_firewall_domains<'a>(
        &'a self,
        id: &'a str,
        domains: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("replace_firewall_domains", |state| {
            state
                .domain_lists
                .update(id, |list| list.domain_count = domains.len() as i32)?;
            state.domains.insert(id.to_owned(), domains.to_vec());
            Ok(())
        })
    }

    fn remove_firewall_domains<'a>(
        &'a self,
        id: &'a str,
        domains: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("remove_firewall_domains", |state| {
            let mut remaining = state.domains.get(id).cloned().unwrap_or_default();
            remaining.retain(|domain| !domains.contains(domain));
            state
                .domain_lists
                .update(id, |list| list.domain_count = remaining.len() as i32)?;
            state.domains.insert(id.to_owned(), remaining);
            Ok(())
        })
    }

    fn list_firewall_domains<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Vec<String>, ApiError>> {
        self.with("list_firewall_domains", |state| {
            if !state.domain_lists.contains(id) {
                return Err(missing("firewall domain list", id));
            }
            Ok(state.domains.get(id).cloned().unwrap_or_default())
        })
    }

    fn delete_firewall_domain_list<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_firewall_domain_list", |state| {
            state.domain_lists.remove(id)?;
            state.domains.remove(id);
            Ok(())
        })
    }

    fn create_firewall_rule_group<'a>(
        &'a self,
        input: &'a NamedInput,
    ) -> BoxFuture<'a, Result<FirewallRuleGroupDetail, ApiError>> {
        self.with("create_firewall_rule_group", |state| {
            let id = format!("rslvr-frg-{:017x}", state.next_id());
            let arn = state.arn("firewall-rule-group", &id);
            let group = state.rule_groups.insert(
                &id,
                FirewallRuleGroupDetail {
                    id: id.clone(),
                    arn: arn.clone(),
                    name: input.name.clone(),
                    owner_id: Some(ACCOUNT.into()),
                    share_status: Some("NOT_SHARED".into()),
                    status: "COMPLETE".into(),
                    status_message: None,
                },
            );
            state.firewall_rules.insert(id, vec![]);
            state.tags.insert(arn, input.tags.clone());
            Ok(group)
        })
    }

    fn get_firewall_rule_group<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<FirewallRuleGroupDetail, ApiError>> {
        self.with("get_firewall_rule_group", |state| state.rule_groups.get(id))
    }

    fn delete_firewall_rule_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_firewall_rule_group", |state| {
            if state.firewall_rules.get(id).is_some_and(|rules| !rules.is_empty()) {
                return Err(ApiError::new(CONFLICT, format!("rule group {id} still has rules")));
            }
            state.rule_groups.remove(id)?;
            state.firewall_rules.remove(id);
            Ok(())
        })
    }

    fn create_firewall_rule<'a>(
        &'a self,
        _creator_request_id: &'a str,
        rule: &'a FirewallRuleDetail,
    ) -> BoxFuture<'a, Result<FirewallRuleDetail, ApiError>> {
        self.with("create_firewall_rule", |state| {
            if !state.domain_lists.contains(&rule.firewall_domain_list_id) {
                return Err(missing("firewall domain list", &rule.firewall_domain_list_id));
            }
            let rules = state
                .firewall_rules
                .get_mut(&rule.firewall_rule_group_id)
                .ok_or_else(|| missing("firewall rule group", &rule.firewall_rule_group_id))?;
            if rules
                .iter()
                .any(|r| r.firewall_domain_list_id == rule.firewall_domain_list_id)
            {
                return Err(ApiError::new(
                    CONFLICT,
                    format!("rule for {} already exists", rule.firewall_domain_list_id),
                ));
            }
            rules.push(rule.clone());
            Ok(rule.clone())
        })
    }

    fn update_firewall_rule<'a>(
        &'a self,
        rule: &'a FirewallRuleDetail,
    ) -> BoxFuture<'a, Result<FirewallRuleDetail, ApiError>> {
        self.with("update_firewall_rule", |state| {
            let existing = state
                .firewall_rules
                .get_mut(&rule.firewall_rule_group_id)
                .and_then(|rules| {
                    rules
                        .iter_mut()
                        .find(|r| r.firewall_domain_list_id == rule.firewall_domain_list_id)
                })
                .ok_or_else(|| missing("firewall rule", &rule.firewall_domain_list_id))?;
            *existing = rule.clone();
            Ok(rule.clone())
        })
    }

    fn delete_firewall_rule<'a>(
        &'a self,
        firewall_rule_group_id: &'a str,
        firewall_domain_list_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_firewall_rule", |state| {
            let rules = state
                .firewall_rules
                .get_mut(firewall_rule_group_id)
                .ok_or_else(|| missing("firewall rule group", firewall_rule_group_id))?;
            let before = rules.len();
            rules.retain(|r| r.firewall_domain_list_id != firewall_domain_list_id);
            if rules.len() == before {
                return Err(missing("firewall rule", firewall_domain_list_id));
            }
            Ok(())
        })
    }

    fn list_firewall_rules<'a>(
        &'a self,
        firewall_rule_group_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FirewallRuleDetail>, ApiError>> {
        self.with("list_firewall_rules", |state| {
            state
                .firewall_rules
                .get(firewall_rule_group_id)
                .cloned()
                .ok_or_else(|| missing("firewall rule group", firewall_rule_group_id))
        })
    }

    fn update_resolver_dnssec_config<'a>(
        &'a self,
        resource_id: &'a str,
        validation: &'a str,
    ) -> BoxFuture<'a, Result<DnssecConfigDetail, ApiError>> {
        self.with("update_resolver_dnssec_config", |state| {
            let status = if validation == "ENABLE" { "ENABLED" } else { "DISABLED" };
            if state.dnssec.contains(resource_id) {
                return state
                    .dnssec
                    .update(resource_id, |config| config.validation_status = status.into());
            }
            if validation != "ENABLE" {
                return Err(missing("resource", resource_id));
            }
            let id = format!("rdsc-{:017x}", state.next_id());
            Ok(state.dnssec.insert(
                resource_id,
                DnssecConfigDetail {
                    id,
                    owner_id: Some(ACCOUNT.into()),
                    resource_id: resource_id.to_owned(),
                    validation_status: status.into(),
                },
            ))
        })
    }

    fn list_resolver_dnssec_configs(&self) -> BoxFuture<'_, Result<Vec<DnssecConfigDetail>, ApiError>> {
        self.with("list_resolver_dnssec_configs", |state| Ok(state.dnssec.list()))
    }
}

impl TagApi for FakeRoute53Resolver {
    fn list_tags_for_resource<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<Tags, ApiError>> {
        self.with("list_tags_for_resource", |state| {
            state
                .tags
                .get(arn)
                .cloned()
                .ok_or_else(|| missing("resource", arn))
        })
    }

    fn tag_resource<'a>(&'a self, arn: &'a str, tags: &'a Tags) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("tag_resource", |state| {
            let existing = state.tags.get_mut(arn).ok_or_else(|| missing("resource", arn))?;
            existing.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        })
    }

    fn untag_resource<'a>(
        &'a self,
        arn: &'a str,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("untag_resource", |state| {
            let existing = state.tags.get_mut(arn).ok_or_else(|| missing("resource", arn))?;
            existing.retain(|k, _| !keys.contains(k));
            Ok(())
        })
    }
}
