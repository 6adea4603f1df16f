//! Resolver endpoints: the network interfaces that carry DNS queries into
//! (inbound) or out of (outbound) a VPC.
use std::time::Duration;

use snafu::prelude::*;

use super::{
    creator_request_id, IpAddress, IpAddressDetail, ResolverEndpointDetail,
    ResolverEndpointInput, ResolverEndpointUpdate, Route53ResolverApi,
};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    tags::{read_tags, update_tags, Tags},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const ENDPOINT_CREATING: &str = "CREATING";
pub const ENDPOINT_OPERATIONAL: &str = "OPERATIONAL";
pub const ENDPOINT_UPDATING: &str = "UPDATING";
pub const ENDPOINT_AUTO_RECOVERING: &str = "AUTO_RECOVERING";
pub const ENDPOINT_DELETING: &str = "DELETING";

pub const ENDPOINT_DIRECTIONS: &[&str] = &["INBOUND", "OUTBOUND", "INBOUND_DELEGATION"];
pub const ENDPOINT_TYPES: &[&str] = &["IPV4", "IPV6", "DUALSTACK"];
pub const PROTOCOLS: &[&str] = &["Do53", "DoH", "DoH-FIPS"];

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// One of `INBOUND`, `OUTBOUND` or `INBOUND_DELEGATION`.
    pub direction: String,
    pub security_group_ids: Vec<String>,
    /// Between 2 and 6 addresses, spread over at least two availability zones.
    pub ip_addresses: Vec<IpAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_endpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolverEndpointOutput {
    pub id: String,
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub direction: String,
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_vpc_id: Option<String>,
    pub ip_addresses: Vec<IpAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_endpoint_type: Option<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub tags_all: Tags,
}

pub async fn find_resolver_endpoint(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Option<ResolverEndpointDetail>, ApiError> {
    not_found_as_none(api.get_resolver_endpoint(id).await)
}

pub async fn status_resolver_endpoint(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Poll<ResolverEndpointDetail>, ApiError> {
    let endpoint = find_resolver_endpoint(api, id).await?;
    Ok(Poll::from_found(endpoint, |endpoint| endpoint.status.clone()))
}

fn sorted<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    items
}

/// `items` minus `other`, counting duplicates.
fn subtract<'a, T: PartialEq>(items: &'a [T], other: &[T]) -> Vec<&'a T> {
    let mut other: Vec<&T> = other.iter().collect();
    items
        .iter()
        .filter(|item| match other.iter().position(|o| o == item) {
            Some(at) => {
                other.remove(at);
                false
            }
            None => true,
        })
        .collect()
}

/// The assigned addresses that none of the `kept` requests claims.
///
/// Requests naming an address claim first, so an auto-assigned request never
/// takes an address someone asked for by name.
fn unclaimed<'a>(assigned: &'a [IpAddressDetail], kept: &[IpAddress]) -> Vec<&'a IpAddressDetail> {
    let mut free: Vec<&IpAddressDetail> = assigned.iter().collect();
    let mut kept: Vec<&IpAddress> = kept.iter().collect();
    kept.sort_by_key(|ip| ip.ip.is_none() as u8 + ip.ipv6.is_none() as u8);
    for request in kept {
        if let Some(at) = free.iter().position(|detail| detail.matches(request)) {
            free.remove(at);
        }
    }
    free
}

/// The assigned addresses as the user would have requested them.
fn requested(ips: &[IpAddressDetail]) -> Vec<IpAddress> {
    sorted(
        &ips.iter()
            .map(|ip| IpAddress {
                subnet_id: ip.subnet_id.clone(),
                ip: ip.ip.clone(),
                ipv6: ip.ipv6.clone(),
            })
            .collect::<Vec<_>>(),
    )
}

async fn wait_operational(
    api: &dyn Route53ResolverApi,
    id: &str,
    pending: &[&str],
    timeout: Duration,
    phase: Phase,
    ctx: &Context,
) -> Result<()> {
    StateChange::new(|| status_resolver_endpoint(api, id))
        .pending(pending.iter().copied())
        .target([ENDPOINT_OPERATIONAL])
        .reason(|endpoint: &ResolverEndpointDetail| endpoint.status_message.clone())
        .timeout(timeout)
        .wait(&ctx.cancel)
        .await
        .context(WaitSnafu {
            type_name: ResolverEndpoint::TYPE_NAME,
            id,
            phase,
        })?;
    Ok(())
}

impl ResolverEndpoint {
    async fn update_ip_addresses(
        &self,
        api: &dyn Route53ResolverApi,
        id: &str,
        previous_local: &Self,
        ctx: &Context,
    ) -> Result<()> {
        let old = sorted(&previous_local.ip_addresses);
        let new = sorted(&self.ip_addresses);
        if old == new {
            return Ok(());
        }
        let api_context = || ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Updating,
        };
        let timeout = ctx.timeouts.update_or(UPDATE_TIMEOUT);

        // Add first so the endpoint never drops below its minimum of two.
        for ip in subtract(&new, &old) {
            log::info!("  associating {ip:?} with resolver endpoint '{id}'");
            api.associate_resolver_endpoint_ip_address(id, ip)
                .await
                .context(api_context())?;
            wait_operational(api, id, &[ENDPOINT_UPDATING], timeout, Phase::WaitingForUpdate, ctx)
                .await?;
        }

        let removed = subtract(&old, &new);
        if removed.is_empty() {
            return Ok(());
        }
        let assigned = api
            .list_resolver_endpoint_ip_addresses(id)
            .await
            .context(api_context())?;
        let mut free = unclaimed(&assigned, &new);
        for ip in removed {
            let Some(at) = free.iter().position(|detail| detail.matches(ip)) else {
                log::warn!("  {ip:?} is no longer assigned to resolver endpoint '{id}'");
                continue;
            };
            let detail = free.remove(at);
            log::info!("  disassociating {} from resolver endpoint '{id}'", detail.ip_id);
            ignore_not_found(
                api.disassociate_resolver_endpoint_ip_address(id, &detail.ip_id)
                    .await,
            )
            .context(api_context())?;
            wait_operational(api, id, &[ENDPOINT_UPDATING], timeout, Phase::WaitingForUpdate, ctx)
                .await?;
        }
        Ok(())
    }
}

impl Resource for ResolverEndpoint {
    const TYPE_NAME: &'static str = "aws_route53_resolver_endpoint";
    type Provider = dyn Route53ResolverApi;
    type Output = ResolverEndpointOutput;

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate::length_between(Self::TYPE_NAME, "name", name, 1, 64)?;
        }
        validate::one_of(Self::TYPE_NAME, "direction", &self.direction, ENDPOINT_DIRECTIONS)?;
        validate::count_between(Self::TYPE_NAME, "security_group_ids", &self.security_group_ids, 1, 64)?;
        validate::count_between(Self::TYPE_NAME, "ip_addresses", &self.ip_addresses, 2, 6)?;
        for ip in &self.ip_addresses {
            validate::length_between(Self::TYPE_NAME, "ip_addresses.subnet_id", &ip.subnet_id, 1, 32)?;
            if let Some(addr) = &ip.ip {
                validate::ip_address(Self::TYPE_NAME, "ip_addresses.ip", addr)?;
            }
            if let Some(addr) = &ip.ipv6 {
                validate::ip_address(Self::TYPE_NAME, "ip_addresses.ipv6", addr)?;
            }
        }
        if let Some(endpoint_type) = &self.resolver_endpoint_type {
            validate::one_of(Self::TYPE_NAME, "resolver_endpoint_type", endpoint_type, ENDPOINT_TYPES)?;
        }
        for protocol in &self.protocols {
            validate::one_of(Self::TYPE_NAME, "protocols", protocol, PROTOCOLS)?;
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        output.id.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        ResolverEndpoint {
            name: output.name.clone(),
            direction: output.direction.clone(),
            security_group_ids: output.security_group_ids.clone(),
            ip_addresses: output.ip_addresses.clone(),
            resolver_endpoint_type: output.resolver_endpoint_type.clone(),
            protocols: output.protocols.clone(),
            tags: output.tags.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        let input = ResolverEndpointInput {
            creator_request_id: creator_request_id(),
            name: self.name.clone(),
            direction: self.direction.clone(),
            security_group_ids: self.security_group_ids.clone(),
            ip_addresses: self.ip_addresses.clone(),
            resolver_endpoint_type: self.resolver_endpoint_type.clone(),
            protocols: self.protocols.clone(),
            tags: ctx.tags.merge(&self.tags),
        };
        log::info!(
            "creating {} resolver endpoint {:?}",
            self.direction,
            self.name.as_deref().unwrap_or_default()
        );
        let endpoint = api
            .create_resolver_endpoint(&input)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: &input.creator_request_id,
                phase: Phase::Creating,
            })?;
        log::info!("  created '{}'", endpoint.id);
        wait_operational(
            api,
            &endpoint.id,
            &[ENDPOINT_CREATING],
            ctx.timeouts.create_or(CREATE_TIMEOUT),
            Phase::WaitingForCreation,
            ctx,
        )
        .await?;
        let mut output = Self::read(api, &endpoint.id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: endpoint.id,
        })?;
        ctx.tags
            .keep_configured(&mut output.tags, &output.tags_all, &self.tags);
        Ok(output)
    }

    async fn read(api: &Self::Provider, id: &str, ctx: &Context) -> Result<Option<Self::Output>> {
        let api_context = || ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Reading,
        };
        let Some(endpoint) = find_resolver_endpoint(api, id).await.context(api_context())? else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        let ips = api
            .list_resolver_endpoint_ip_addresses(id)
            .await
            .context(api_context())?;
        let (tags, tags_all) = read_tags(api, Self::TYPE_NAME, &endpoint.arn, ctx).await?;
        Ok(Some(ResolverEndpointOutput {
            id: endpoint.id,
            arn: endpoint.arn,
            name: endpoint.name,
            direction: endpoint.direction,
            security_group_ids: endpoint.security_group_ids,
            host_vpc_id: endpoint.host_vpc_id,
            ip_addresses: requested(&ips),
            resolver_endpoint_type: endpoint.resolver_endpoint_type,
            protocols: endpoint.protocols,
            status: endpoint.status,
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
        validate::immutable(Self::TYPE_NAME, "direction", &previous_local.direction, &self.direction)?;
        validate::immutable(
            Self::TYPE_NAME,
            "security_group_ids",
            &sorted(&previous_local.security_group_ids),
            &sorted(&self.security_group_ids),
        )?;

        let id = previous_remote.id.as_str();
        if self.name != previous_local.name
            || self.resolver_endpoint_type != previous_local.resolver_endpoint_type
            || self.protocols != previous_local.protocols
        {
            log::info!("updating resolver endpoint '{id}'");
            let update = ResolverEndpointUpdate {
                name: self.name.clone(),
                resolver_endpoint_type: self.resolver_endpoint_type.clone(),
                protocols: self.protocols.clone(),
            };
            api.update_resolver_endpoint(id, &update)
                .await
                .context(ApiSnafu {
                    type_name: Self::TYPE_NAME,
                    id,
                    phase: Phase::Updating,
                })?;
            wait_operational(
                api,
                id,
                &[ENDPOINT_UPDATING, ENDPOINT_AUTO_RECOVERING],
                ctx.timeouts.update_or(UPDATE_TIMEOUT),
                Phase::WaitingForUpdate,
                ctx,
            )
            .await?;
        }

        self.update_ip_addresses(api, id, previous_local, ctx).await?;
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
        log::info!("deleting resolver endpoint '{id}'");
        ignore_not_found(api.delete_resolver_endpoint(id).await).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_resolver_endpoint(api, id))
            .pending([ENDPOINT_DELETING])
            .target_gone()
            .reason(|endpoint: &ResolverEndpointDetail| endpoint.status_message.clone())
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
