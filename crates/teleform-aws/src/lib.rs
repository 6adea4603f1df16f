//! # Teleform AWS
//!
//! Teleform AWS is a library of declarative infrastructure resources for the
//! AWS "User Notifications" and "Route53Resolver" services. Each resource is a
//! plain Rust struct describing the desired state of a remote object, along
//! with an `Output` struct describing what AWS reports back.
//!
//! ## Concepts
//!
//! - **Local State**: the desired state of a resource, as written in code or
//!   read from a JSON document. Only user-settable attributes live here.
//! - **Remote State**: the observed state of the same object as reported by the
//!   AWS control plane, including computed attributes like ARNs and statuses.
//!
//! Most AWS control planes are eventually consistent. Creating a resolver
//! endpoint returns while the endpoint is still `CREATING`, deleting a
//! notification hub returns while it is still `DEREGISTERING`. Every resource
//! therefore waits on its remote object with the generic waiter in [`wait`]
//! before reporting success.
//!
//! ## Usage
//!
//! Resources can be driven directly through the [`Resource`] trait, or by
//! type name through a [`registry::Registry`], which is what the `tele-aws`
//! command line program does.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Error`], which annotates every vendor or
//! waiter failure with the resource type, its identifier and the lifecycle
//! [`Phase`] it happened in.

use std::{future::Future, pin::Pin};

use snafu::prelude::*;

pub mod api;
pub mod arn;
pub mod config;
#[cfg(test)]
mod fake;
pub mod id;
pub mod notifications;
pub mod registry;
pub mod route53resolver;
pub mod state;
pub mod tags;
pub mod validate;
pub mod wait;

pub use api::ApiError;
pub use config::{ProviderConfig, Timeouts};
pub use registry::{Clients, Registry};
pub use state::StateRecord;
pub use tokio_util::sync::CancellationToken;
pub use wait::{Poll, StateChange, WaitError};

/// Boxed future returned by the object-safe vendor API traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The lifecycle phase an operation was in when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Creating,
    Reading,
    Updating,
    Deleting,
    Tagging,
    Importing,
    WaitingForCreation,
    WaitingForUpdate,
    WaitingForDeletion,
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Creating => "creating",
            Phase::Reading => "reading",
            Phase::Updating => "updating",
            Phase::Deleting => "deleting",
            Phase::Tagging => "tagging",
            Phase::Importing => "importing",
            Phase::WaitingForCreation => "waiting for creation",
            Phase::WaitingForUpdate => "waiting for update",
            Phase::WaitingForDeletion => "waiting for deletion",
        })
    }
}

/// Top-level error enum that encompasses all errors.
#[derive(snafu::Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}:\n{}",
                source.chain()
                    .map(|e| format!("{e}"))
                    .collect::<Vec<_>>()
                    .join("\n -> ")))]
    Tele { source: anyhow::Error },

    #[snafu(display("{type_name} ({id}): {phase}: {source}"))]
    Api {
        type_name: &'static str,
        id: String,
        phase: Phase,
        source: ApiError,
    },

    #[snafu(display("{type_name} ({id}): {phase}: {source}"))]
    Wait {
        type_name: &'static str,
        id: String,
        phase: Phase,
        source: WaitError,
    },

    #[snafu(display("{type_name} ({id}): {phase}: response is missing {what}"))]
    EmptyResult {
        type_name: &'static str,
        id: String,
        phase: Phase,
        what: &'static str,
    },

    #[snafu(display("{type_name} ({id}) not found"))]
    NotFound { type_name: &'static str, id: String },

    #[snafu(display("{type_name}: {message}"))]
    Validation {
        type_name: &'static str,
        message: String,
    },

    #[snafu(display("unexpected format for ID ({id}), expected {expected}"))]
    ImportId { id: String, expected: String },

    #[snafu(display("Unknown resource type '{type_name}'"))]
    UnknownType { type_name: String },

    #[snafu(display("Could not read config file '{path:?}': {source}"))]
    ConfigRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse config: {source}"))]
    ConfigParse { source: toml::de::Error },

    #[snafu(display("Could not serialize '{name}': {source}"))]
    Serialize {
        name: String,
        source: serde_json::Error,
    },

    #[snafu(display("Could not deserialize '{name}': {source}"))]
    Deserialize {
        name: String,
        source: serde_json::Error,
    },

    #[snafu(display("Could not read state file {path:?}: {source}"))]
    ReadFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not write state file {path:?}: {source}"))]
    WriteFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

impl From<anyhow::Error> for Error {
    fn from(source: anyhow::Error) -> Self {
        Error::Tele { source }
    }
}

impl Error {
    /// Returns `true` if the remote object does not exist.
    ///
    /// Destroy checks use this to confirm a resource is really gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Api { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Per-operation context.
///
/// Cancelling `cancel` aborts any wait in progress. `timeouts` override the
/// default wait timeouts of each resource and `tags` carries the provider
/// level tag policy.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub cancel: CancellationToken,
    pub timeouts: Timeouts,
    pub tags: tags::TagPolicy,
}

impl Context {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Default::default()
        }
    }
}

/// Selects the vendor API a resource needs out of a bundle of clients.
pub trait Provides<P: ?Sized> {
    fn provide(&self) -> &P;
}

/// IaC resources.
///
/// Implementors are the desired state of one kind of AWS object. The
/// associated `Output` is the observed state of that object.
pub trait Resource:
    core::fmt::Debug
    + Clone
    + PartialEq
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Name of this resource type, eg `aws_route53_resolver_endpoint`.
    const TYPE_NAME: &'static str;

    /// The vendor API this resource talks to, eg `dyn NotificationsApi`.
    type Provider: ?Sized + Send + Sync;

    /// The remote type of this resource.
    type Output: core::fmt::Debug
        + Clone
        + PartialEq
        + serde::Serialize
        + serde::de::DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Checks the local definition without touching the network.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// The identifier of a remote object, as accepted by [`Resource::read`].
    fn id(output: &Self::Output) -> String;

    /// Maps an observed remote object back into a local definition.
    fn flatten(output: &Self::Output) -> Self;

    /// Creates a new resource on the platform and waits for it to settle.
    fn create(
        &self,
        provider: &Self::Provider,
        ctx: &Context,
    ) -> impl Future<Output = Result<Self::Output>> + Send;

    /// Reads the current state of the resource from the platform.
    ///
    /// Returns `Ok(None)` if the remote object no longer exists.
    fn read(
        provider: &Self::Provider,
        id: &str,
        ctx: &Context,
    ) -> impl Future<Output = Result<Option<Self::Output>>> + Send;

    /// Updates an existing resource on the platform.
    fn update(
        &self,
        provider: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
        ctx: &Context,
    ) -> impl Future<Output = Result<Self::Output>> + Send;

    /// Deletes a resource from the platform.
    ///
    /// Deleting an object that is already gone succeeds.
    fn delete(
        provider: &Self::Provider,
        previous_remote: &Self::Output,
        ctx: &Context,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Imports a pre-existing resource by its identifier.
    fn import(
        provider: &Self::Provider,
        id: &str,
        ctx: &Context,
    ) -> impl Future<Output = Result<(Self, Self::Output)>> + Send {
        async move {
            log::info!("importing {} '{id}'", Self::TYPE_NAME);
            let output = Self::read(provider, id, ctx)
                .await?
                .context(NotFoundSnafu {
                    type_name: Self::TYPE_NAME,
                    id,
                })?;
            Ok((Self::flatten(&output), output))
        }
    }
}
