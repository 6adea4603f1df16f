//! Provider configuration.
//!
//! ```toml
//! region = "us-east-1"
//! profile = "infra"
//! max_retries = 5
//!
//! [endpoints]
//! route53resolver = "http://localhost:4566"
//!
//! [default_tags]
//! team = "dns"
//!
//! [ignore_tags]
//! key_prefixes = ["kubernetes.io/"]
//!
//! [timeouts]
//! create = 900
//! ```
use std::{path::Path, time::Duration};

use aws_config::{retry::RetryConfig, BehaviorVersion, Region, SdkConfig};
use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::{
    tags::{IgnoreTags, TagPolicy, Tags},
    ConfigParseSnafu, ConfigReadSnafu, Context, Result,
};

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

/// Wait timeout overrides, in seconds in the config file.
///
/// Unset values fall back to the defaults of each resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Timeouts {
    #[serde(default, with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub create: Option<Duration>,
    #[serde(default, with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub update: Option<Duration>,
    #[serde(default, with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub delete: Option<Duration>,
}

impl Timeouts {
    pub fn create_or(&self, default: Duration) -> Duration {
        self.create.unwrap_or(default)
    }

    pub fn update_or(&self, default: Duration) -> Duration {
        self.update.unwrap_or(default)
    }

    pub fn delete_or(&self, default: Duration) -> Duration {
        self.delete.unwrap_or(default)
    }
}

/// Per-service endpoint URL overrides.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Endpoints {
    pub notifications: Option<String>,
    pub route53resolver: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub max_retries: Option<u32>,
    pub endpoints: Endpoints,
    pub default_tags: Tags,
    pub ignore_tags: IgnoreTags,
    pub timeouts: Timeouts,
}

impl ProviderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context(ConfigParseSnafu)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading provider config from {path:?}");
        let contents = std::fs::read_to_string(path).context(ConfigReadSnafu { path })?;
        Self::from_toml_str(&contents)
    }

    /// Loads the shared AWS configuration, honoring region, profile and
    /// retry overrides.
    pub async fn sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(retry) = self.retry_config() {
            loader = loader.retry_config(retry);
        }
        loader.load().await
    }

    /// Standard retries allowing `max_retries` attempts after the first.
    pub fn retry_config(&self) -> Option<RetryConfig> {
        self.max_retries
            .map(|retries| RetryConfig::standard().with_max_attempts(retries.saturating_add(1)))
    }

    pub fn tag_policy(&self) -> TagPolicy {
        TagPolicy {
            default_tags: self.default_tags.clone(),
            ignore: self.ignore_tags.clone(),
        }
    }

    /// The operation context for this provider.
    pub fn context(&self, cancel: CancellationToken) -> Context {
        Context {
            cancel,
            timeouts: self.timeouts,
            tags: self.tag_policy(),
        }
    }
}
