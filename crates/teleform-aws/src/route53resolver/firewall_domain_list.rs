//! DNS Firewall domain lists.
use std::time::Duration;

use snafu::prelude::*;

use super::{
    creator_request_id, FirewallDomainListDetail, NamedInput,
    Route53ResolverApi,
};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    tags::{read_tags, update_tags, Tags},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const DOMAIN_LIST_COMPLETE: &str = "COMPLETE";
pub const DOMAIN_LIST_COMPLETE_IMPORT_FAILED: &str = "COMPLETE_IMPORT_FAILED";
pub const DOMAIN_LIST_IMPORTING: &str = "IMPORTING";
pub const DOMAIN_LIST_UPDATING: &str = "UPDATING";
pub const DOMAIN_LIST_DELETING: &str = "DELETING";

const UPDATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FirewallDomainList {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FirewallDomainListOutput {
    pub id: String,
    pub arn: String,
    pub name: String,
    /// Sorted.
    #[serde(default)]
    pub domains: Vec<String>,
    pub domain_count: i32,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_owner_name: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub tags_all: Tags,
}

pub async fn find_firewall_domain_list(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Option<FirewallDomainListDetail>, ApiError> {
    not_found_as_none(api.get_firewall_domain_list(id).await)
}

pub async fn status_firewall_domain_list(
    api: &dyn Route53ResolverApi,
    id: &str,
) -> Result<Poll<FirewallDomainListDetail>, ApiError> {
    let list = find_firewall_domain_list(api, id).await?;
    Ok(Poll::from_found(list, |list| list.status.clone()))
}

fn sorted_domains(domains: &[String]) -> Vec<String> {
    let mut domains = domains.to_vec();
    domains.sort();
    domains.dedup();
    domains
}

/// Sets the domains of list `id` and waits for the import to finish.
///
/// Clearing a list removes the `previous` domains, `REPLACE` takes at least
/// one domain. A list that ends up `COMPLETE_IMPORT_FAILED` is an error
/// carrying the status message.
async fn set_domains(
    api: &dyn Route53ResolverApi,
    id: &str,
    previous: &[String],
    domains: &[String],
    ctx: &Context,
) -> Result<()> {
    let sent = if domains.is_empty() {
        if previous.is_empty() {
            return Ok(());
        }
        log::info!("  removing the {} domains of '{id}'", previous.len());
        api.remove_firewall_domains(id, previous).await
    } else {
        log::info!("  replacing the {} domains of '{id}'", domains.len());
        api.replace_firewall_domains(id, domains).await
    };
    sent.context(ApiSnafu {
        type_name: FirewallDomainList::TYPE_NAME,
        id,
        phase: Phase::Updating,
    })?;
    StateChange::new(|| status_firewall_domain_list(api, id))
        .pending([DOMAIN_LIST_UPDATING, DOMAIN_LIST_IMPORTING])
        .target([DOMAIN_LIST_COMPLETE])
        .reason(|list: &FirewallDomainListDetail| list.status_message.clone())
        .timeout(ctx.timeouts.update_or(UPDATE_TIMEOUT))
        .wait(&ctx.cancel)
        .await
        .context(WaitSnafu {
            type_name: FirewallDomainList::TYPE_NAME,
            id,
            phase: Phase::WaitingForUpdate,
        })?;
    Ok(())
}

impl Resource for FirewallDomainList {
    const TYPE_NAME: &'static str = "aws_route53_resolver_firewall_domain_list";
    type Provider = dyn Route53ResolverApi;
    type Output = FirewallDomainListOutput;

    fn validate(&self) -> Result<()> {
        validate::length_between(Self::TYPE_NAME, "name", &self.name, 1, 64)?;
        for domain in &self.domains {
            validate::length_between(Self::TYPE_NAME, "domains", domain, 1, 255)?;
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        output.id.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        FirewallDomainList {
            name: output.name.clone(),
            domains: output.domains.clone(),
            tags: output.tags.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        let input = NamedInput {
            creator_request_id: creator_request_id(),
            name: self.name.clone(),
            tags: ctx.tags.merge(&self.tags),
        };
        log::info!("creating firewall domain list '{}'", self.name);
        let list = api
            .create_firewall_domain_list(&input)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: &self.name,
                phase: Phase::Creating,
            })?;
        log::info!("  created '{}'", list.id);
        if !self.domains.is_empty() {
            set_domains(api, &list.id, &[], &sorted_domains(&self.domains), ctx).await?;
        }
        let mut output = Self::read(api, &list.id, ctx).await?.context(NotFoundSnafu {
            type_name: Self::TYPE_NAME,
            id: list.id,
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
        let Some(list) = find_firewall_domain_list(api, id)
            .await
            .context(api_context())?
        else {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
            return Ok(None);
        };
        let domains = api.list_firewall_domains(id).await.context(api_context())?;
        let (tags, tags_all) = read_tags(api, Self::TYPE_NAME, &list.arn, ctx).await?;
        Ok(Some(FirewallDomainListOutput {
            id: list.id,
            arn: list.arn,
            name: list.name,
            domains: sorted_domains(&domains),
            domain_count: list.domain_count,
            status: list.status,
            managed_owner_name: list.managed_owner_name,
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
        let domains = sorted_domains(&self.domains);
        if domains != sorted_domains(&previous_local.domains) {
            log::info!("updating firewall domain list '{id}'");
            set_domains(api, id, &previous_remote.domains, &domains, ctx).await?;
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
        log::info!("deleting firewall domain list '{id}'");
        ignore_not_found(api.delete_firewall_domain_list(id).await).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_firewall_domain_list(api, id))
            .pending([DOMAIN_LIST_DELETING])
            .target_gone()
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

    fn list() -> FirewallDomainList {
        FirewallDomainList {
            name: "blocked".into(),
            domains: vec!["bad.example.".into(), "worse.example.".into()],
            tags: [("team".to_string(), "sec".to_string())].into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn create_imports_domains() {
        let fake = FakeRoute53Resolver::default();
        fake.state().domain_lists.update_script =
            script([DOMAIN_LIST_IMPORTING, DOMAIN_LIST_UPDATING, DOMAIN_LIST_COMPLETE]);
        let ctx = Context::default();

        let out = list().create(&fake, &ctx).await.unwrap();
        assert_eq!(2, out.domain_count);
        assert_eq!(DOMAIN_LIST_COMPLETE, out.status);
        pretty_assertions::assert_eq!(list(), FirewallDomainList::flatten(&out));
        assert_eq!(1, fake.state().calls.count("replace_firewall_domains"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_list_skips_import() {
        let fake = FakeRoute53Resolver::default();
        let empty = FirewallDomainList {
            domains: vec![],
            ..list()
        };
        let out = empty.create(&fake, &Context::default()).await.unwrap();
        assert!(out.domains.is_empty());
        assert_eq!(0, fake.state().calls.count("replace_firewall_domains"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_import_carries_status() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = list().create(&fake, &ctx).await.unwrap();
        fake.state().domain_lists.set(&out.id, |list| {
            list.status_message = Some("invalid domain in file".into())
        });
        fake.state().domain_lists.update_script =
            script([DOMAIN_LIST_IMPORTING, DOMAIN_LIST_COMPLETE_IMPORT_FAILED]);

        let mut next = list();
        next.domains.push("*.evil.example.".into());
        let err = next.update(&fake, &list(), &out, &ctx).await.unwrap_err();
        match err {
            crate::Error::Wait {
                source: crate::WaitError::UnexpectedState { state, reason, .. },
                ..
            } => {
                assert_eq!(DOMAIN_LIST_COMPLETE_IMPORT_FAILED, state);
                assert_eq!(Some("invalid domain in file".to_string()), reason);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn same_domains_in_other_order_is_no_change() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = list().create(&fake, &ctx).await.unwrap();
        let mut next = list();
        next.domains.reverse();
        next.update(&fake, &list(), &out, &ctx).await.unwrap();
        assert_eq!(1, fake.state().calls.count("replace_firewall_domains"));
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_domains_removes_them() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = list().create(&fake, &ctx).await.unwrap();
        fake.state().domain_lists.update_script = script([DOMAIN_LIST_UPDATING, DOMAIN_LIST_COMPLETE]);

        let cleared = FirewallDomainList {
            domains: vec![],
            ..list()
        };
        let out = cleared.update(&fake, &list(), &out, &ctx).await.unwrap();
        assert!(out.domains.is_empty());
        assert_eq!(0, out.domain_count);
        assert_eq!(DOMAIN_LIST_COMPLETE, out.status);
        assert_eq!(1, fake.state().calls.count("replace_firewall_domains"));
        assert_eq!(1, fake.state().calls.count("remove_firewall_domains"));

        cleared.update(&fake, &cleared, &out, &ctx).await.unwrap();
        assert_eq!(1, fake.state().calls.count("remove_firewall_domains"));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_waits_for_deleting() {
        let fake = FakeRoute53Resolver::default();
        let ctx = Context::default();
        let out = list().create(&fake, &ctx).await.unwrap();
        fake.state().domain_lists.delete_script = script([DOMAIN_LIST_DELETING]);
        FirewallDomainList::delete(&fake, &out, &ctx).await.unwrap();
        FirewallDomainList::delete(&fake, &out, &ctx).await.unwrap();
        assert!(!fake.state().domain_lists.contains(&out.id));
    }
}
