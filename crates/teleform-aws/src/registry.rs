//! Driving resources by type name.
//!
//! A [`Registry`] maps each `TYPE_NAME` to a type-erased handler that speaks
//! `serde_json::Value` on the outside and a concrete [`Resource`] on the
//! inside. This is what lets the `tele-aws` binary manage any resource from a
//! JSON document.
use std::{collections::BTreeMap, marker::PhantomData, sync::Arc};

use aws_config::SdkConfig;
use snafu::prelude::*;

use crate::{
    notifications::{self, NotificationsApi, SdkNotifications},
    route53resolver::{self, Route53ResolverApi, SdkRoute53Resolver},
    BoxFuture, Context, DeserializeSnafu, ProviderConfig, Provides, Resource, Result, StateRecord,
    UnknownTypeSnafu,
};

/// The vendor API clients shared by every resource.
#[derive(Clone)]
pub struct Clients {
    pub notifications: Arc<dyn NotificationsApi>,
    pub route53resolver: Arc<dyn Route53ResolverApi>,
}

impl Clients {
    pub fn new(
        notifications: Arc<dyn NotificationsApi>,
        route53resolver: Arc<dyn Route53ResolverApi>,
    ) -> Self {
        Self {
            notifications,
            route53resolver,
        }
    }

    /// Builds SDK-backed clients, honoring the endpoint overrides of `config`.
    pub fn from_sdk_config(sdk: &SdkConfig, config: &ProviderConfig) -> Self {
        Self::new(
            Arc::new(SdkNotifications::new(
                sdk,
                config.endpoints.notifications.as_deref(),
            )),
            Arc::new(SdkRoute53Resolver::new(
                sdk,
                config.endpoints.route53resolver.as_deref(),
            )),
        )
    }
}

impl Provides<dyn NotificationsApi> for Clients {
    fn provide(&self) -> &(dyn NotificationsApi + 'static) {
        self.notifications.as_ref()
    }
}

impl Provides<dyn Route53ResolverApi> for Clients {
    fn provide(&self) -> &(dyn Route53ResolverApi + 'static) {
        self.route53resolver.as_ref()
    }
}

/// A resource type with its types erased.
trait Handler<C>: Send + Sync {
    fn validate(&self, local: &serde_json::Value) -> Result<()>;

    fn create<'a>(
        &'a self,
        clients: &'a C,
        local: serde_json::Value,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<StateRecord>>;

    fn read<'a>(
        &'a self,
        clients: &'a C,
        previous: &'a StateRecord,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<Option<StateRecord>>>;

    fn import<'a>(
        &'a self,
        clients: &'a C,
        id: &'a str,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<StateRecord>>;

    fn update<'a>(
        &'a self,
        clients: &'a C,
        previous: &'a StateRecord,
        local: serde_json::Value,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<StateRecord>>;

    fn delete<'a>(
        &'a self,
        clients: &'a C,
        previous: &'a StateRecord,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>>;
}

struct TypedHandler<T>(PhantomData<fn() -> T>);

fn decode<T: Resource>(local: serde_json::Value) -> Result<T> {
    serde_json::from_value(local).context(DeserializeSnafu {
        name: format!("{} definition", T::TYPE_NAME),
    })
}

impl<T, C> Handler<C> for TypedHandler<T>
where
    T: Resource,
    C: Provides<T::Provider> + Send + Sync,
{
    fn validate(&self, local: &serde_json::Value) -> Result<()> {
        decode::<T>(local.clone())?.validate()
    }

    fn create<'a>(
        &'a self,
        clients: &'a C,
        local: serde_json::Value,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<StateRecord>> {
        Box::pin(async move {
            let local = decode::<T>(local)?;
            local.validate()?;
            let output = local.create(clients.provide(), ctx).await?;
            StateRecord::new(&local, &output)
        })
    }

    fn read<'a>(
        &'a self,
        clients: &'a C,
        previous: &'a StateRecord,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<Option<StateRecord>>> {
        Box::pin(async move {
            let local = previous.local::<T>()?;
            match T::read(clients.provide(), &previous.id, ctx).await? {
                Some(output) => Ok(Some(StateRecord::new(&local, &output)?)),
                None => Ok(None),
            }
        })
    }

    fn import<'a>(
        &'a self,
        clients: &'a C,
        id: &'a str,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<StateRecord>> {
        Box::pin(async move {
            let (local, output) = T::import(clients.provide(), id, ctx).await?;
            StateRecord::new(&local, &output)
        })
    }

    fn update<'a>(
        &'a self,
        clients: &'a C,
        previous: &'a StateRecord,
        local: serde_json::Value,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<StateRecord>> {
        Box::pin(async move {
            let local = decode::<T>(local)?;
            let previous_local = previous.local::<T>()?;
            if local == previous_local {
                log::warn!(
                    "skipping {} '{}' update as the local value has not changed",
                    T::TYPE_NAME,
                    previous.id
                );
                return Ok(previous.clone());
            }
            local.validate()?;
            let previous_remote = previous.remote::<T>()?;
            let cmp = pretty_assertions::Comparison::new(&previous_local, &local);
            let change_string = format!("{cmp}")
                .lines()
                .map(|line| format!("  {line}"))
                .collect::<Vec<_>>()
                .join("\n");
            log::info!("updating {} '{}':\n{change_string}", T::TYPE_NAME, previous.id);
            let output = local
                .update(clients.provide(), &previous_local, &previous_remote, ctx)
                .await?;
            StateRecord::new(&local, &output)
        })
    }

    fn delete<'a>(
        &'a self,
        clients: &'a C,
        previous: &'a StateRecord,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let previous_remote = previous.remote::<T>()?;
            T::delete(clients.provide(), &previous_remote, ctx).await?;
            log::info!("  {} '{}' is destroyed", T::TYPE_NAME, previous.id);
            Ok(())
        })
    }
}

/// Resource handlers keyed by type name.
pub struct Registry<C> {
    handlers: BTreeMap<&'static str, Box<dyn Handler<C>>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<C: Send + Sync + 'static> Registry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers resource type `T` under `T::TYPE_NAME`.
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Resource,
        C: Provides<T::Provider>,
    {
        log::trace!("registering {}", T::TYPE_NAME);
        self.handlers
            .insert(T::TYPE_NAME, Box::new(TypedHandler::<T>(PhantomData)));
        self
    }

    /// Names of all registered types, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    fn handler(&self, type_name: &str) -> Result<&dyn Handler<C>> {
        self.handlers
            .get(type_name)
            .map(|handler| handler.as_ref())
            .context(UnknownTypeSnafu { type_name })
    }

    /// Checks a definition without touching the network.
    pub fn validate(&self, type_name: &str, local: &serde_json::Value) -> Result<()> {
        self.handler(type_name)?.validate(local)
    }

    pub async fn create(
        &self,
        clients: &C,
        type_name: &str,
        local: serde_json::Value,
        ctx: &Context,
    ) -> Result<StateRecord> {
        self.handler(type_name)?.create(clients, local, ctx).await
    }

    /// Refreshes the remote state of a record.
    ///
    /// Returns `Ok(None)` if the remote object is gone.
    pub async fn read(
        &self,
        clients: &C,
        previous: &StateRecord,
        ctx: &Context,
    ) -> Result<Option<StateRecord>> {
        self.handler(&previous.type_name)?
            .read(clients, previous, ctx)
            .await
    }

    pub async fn import(
        &self,
        clients: &C,
        type_name: &str,
        id: &str,
        ctx: &Context,
    ) -> Result<StateRecord> {
        self.handler(type_name)?.import(clients, id, ctx).await
    }

    /// Brings a record to a new definition. Unchanged definitions make no
    /// calls at all.
    pub async fn update(
        &self,
        clients: &C,
        previous: &StateRecord,
        local: serde_json::Value,
        ctx: &Context,
    ) -> Result<StateRecord> {
        self.handler(&previous.type_name)?
            .update(clients, previous, local, ctx)
            .await
    }

    pub async fn delete(&self, clients: &C, previous: &StateRecord, ctx: &Context) -> Result<()> {
        self.handler(&previous.type_name)?
            .delete(clients, previous, ctx)
            .await
    }
}

impl<C> Registry<C>
where
    C: Provides<dyn NotificationsApi> + Provides<dyn Route53ResolverApi> + Send + Sync + 'static,
{
    /// A registry of every resource type in this crate.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register::<notifications::NotificationHub>()
            .register::<notifications::NotificationConfiguration>()
            .register::<notifications::EventRule>()
            .register::<notifications::ChannelAssociation>()
            .register::<route53resolver::ResolverEndpoint>()
            .register::<route53resolver::ResolverRule>()
            .register::<route53resolver::ResolverRuleAssociation>()
            .register::<route53resolver::FirewallDomainList>()
            .register::<route53resolver::FirewallRuleGroup>()
            .register::<route53resolver::FirewallRule>()
            .register::<route53resolver::ResolverDnssecConfig>();
        registry
    }
}
