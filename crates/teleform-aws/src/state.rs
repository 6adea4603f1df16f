//! The JSON record of one managed resource.
use snafu::prelude::*;
use tokio::io::AsyncWriteExt;

use crate::{DeserializeSnafu, ReadFileSnafu, Resource, Result, SerializeSnafu, WriteFileSnafu};

/// Local and remote state of a single resource, as stored on disk.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StateRecord {
    /// Resource type, eg `aws_route53_resolver_rule`.
    pub type_name: String,
    /// Remote identifier of the resource.
    pub id: String,
    pub local: serde_json::Value,
    pub remote: serde_json::Value,
}

impl StateRecord {
    pub fn new<T: Resource>(local: &T, remote: &T::Output) -> Result<Self> {
        let id = T::id(remote);
        Ok(Self {
            type_name: T::TYPE_NAME.to_owned(),
            local: serde_json::to_value(local).context(SerializeSnafu {
                name: format!("{} {id} local", T::TYPE_NAME),
            })?,
            remote: serde_json::to_value(remote).context(SerializeSnafu {
                name: format!("{} {id} remote", T::TYPE_NAME),
            })?,
            id,
        })
    }

    /// Decodes the stored local definition.
    pub fn local<T: Resource>(&self) -> Result<T> {
        serde_json::from_value(self.local.clone()).context(DeserializeSnafu {
            name: format!("{} {} local", self.type_name, self.id),
        })
    }

    /// Decodes the stored remote state.
    pub fn remote<T: Resource>(&self) -> Result<T::Output> {
        serde_json::from_value(self.remote.clone()).context(DeserializeSnafu {
            name: format!("{} {} remote", self.type_name, self.id),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context(SerializeSnafu {
            name: format!("{} {}", self.type_name, self.id),
        })
    }

    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!("storing {} '{}' to {path:?}", self.type_name, self.id);
        let contents = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(WriteFileSnafu { path: parent })?;
        }
        let mut file = tokio::fs::File::create(path)
            .await
            .context(WriteFileSnafu { path })?;
        file.write_all(contents.as_bytes())
            .await
            .context(WriteFileSnafu { path })?;
        file.flush().await.context(WriteFileSnafu { path })?;
        Ok(())
    }

    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .context(ReadFileSnafu { path })?;
        serde_json::from_str(&contents).context(DeserializeSnafu {
            name: path.display().to_string(),
        })
    }
}
