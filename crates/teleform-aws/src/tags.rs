//! Resource tags.
//!
//! Resources carry their own `tags`. The provider adds its `default_tags` on
//! top and hides keys it was told to ignore, the result is `tags_all`.
use std::collections::BTreeMap;

use snafu::prelude::*;

use crate::{api::ApiError, ApiSnafu, BoxFuture, Context, Phase, Result};

pub type Tags = BTreeMap<String, String>;

/// Prefix of tags reserved by AWS, never managed here.
pub const AWS_PREFIX: &str = "aws:";

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct IgnoreTags {
    pub keys: Vec<String>,
    pub key_prefixes: Vec<String>,
}

/// Provider level tag settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagPolicy {
    pub default_tags: Tags,
    pub ignore: IgnoreTags,
}

impl TagPolicy {
    pub fn is_ignored(&self, key: &str) -> bool {
        key.starts_with(AWS_PREFIX)
            || self.ignore.keys.iter().any(|k| k == key)
            || self.ignore.key_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    /// The tags to send for a resource: defaults overridden by the
    /// resource's own tags, minus ignored keys.
    pub fn merge(&self, tags: &Tags) -> Tags {
        self.default_tags
            .iter()
            .chain(tags.iter())
            .filter(|(k, _)| !self.is_ignored(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drops ignored keys from tags read back from AWS.
    pub fn remote(&self, tags: Tags) -> Tags {
        tags.into_iter().filter(|(k, _)| !self.is_ignored(k)).collect()
    }

    /// The resource's own tags out of `tags_all`: everything that is not an
    /// unchanged default tag.
    ///
    /// AWS keeps no record of which tags were set on the resource itself, so
    /// a resource tag equal to a default is indistinguishable from the
    /// default here. Callers holding the resource's definition put those
    /// back with [`TagPolicy::keep_configured`], a bare read or import can't.
    pub fn resource_tags(&self, all: &Tags) -> Tags {
        all.iter()
            .filter(|(k, v)| self.default_tags.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Restores the `configured` resource tags that [`TagPolicy::resource_tags`]
    /// folded into the defaults, with their values taken from `all`.
    pub fn keep_configured(&self, tags: &mut Tags, all: &Tags, configured: &Tags) {
        for key in configured.keys() {
            if let Some(value) = all.get(key) {
                tags.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }
}

/// Tagging calls, shared by every service.
pub trait TagApi: Send + Sync {
    fn list_tags_for_resource<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<Tags, ApiError>>;

    fn tag_resource<'a>(&'a self, arn: &'a str, tags: &'a Tags) -> BoxFuture<'a, Result<(), ApiError>>;

    fn untag_resource<'a>(
        &'a self,
        arn: &'a str,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>>;
}

/// Brings the tags of `arn` from `old` to `new`.
pub(crate) async fn update_tags<A: TagApi + ?Sized>(
    api: &A,
    type_name: &'static str,
    arn: &str,
    old: &Tags,
    new: &Tags,
) -> Result<()> {
    let diff = TagDiff::new(old, new);
    if diff.is_empty() {
        return Ok(());
    }
    log::info!("  updating tags of {type_name} '{arn}'");
    let api_context = || ApiSnafu {
        type_name,
        id: arn,
        phase: Phase::Tagging,
    };
    if !diff.remove.is_empty() {
        api.untag_resource(arn, &diff.remove)
            .await
            .context(api_context())?;
    }
    if !diff.set.is_empty() {
        api.tag_resource(arn, &diff.set).await.context(api_context())?;
    }
    Ok(())
}

/// Reads the tags of `arn`, split into the resource's own tags and
/// `tags_all`.
pub(crate) async fn read_tags<A: TagApi + ?Sized>(
    api: &A,
    type_name: &'static str,
    arn: &str,
    ctx: &Context,
) -> Result<(Tags, Tags)> {
    let tags = api.list_tags_for_resource(arn).await.context(ApiSnafu {
        type_name,
        id: arn,
        phase: Phase::Tagging,
    })?;
    let tags_all = ctx.tags.remote(tags);
    Ok((ctx.tags.resource_tags(&tags_all), tags_all))
}

/// Changes needed to turn one set of tags into another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagDiff {
    pub set: Tags,
    pub remove: Vec<String>,
}

impl TagDiff {
    pub fn new(old: &Tags, new: &Tags) -> Self {
        let set = new
            .iter()
            .filter(|(k, v)| old.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let remove = old
            .keys()
            .filter(|k| !new.contains_key(*k))
            .cloned()
            .collect();
        TagDiff { set, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}
