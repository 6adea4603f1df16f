//! Amazon Resource Names.
use std::str::FromStr;

use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(display("'{value}' is not a valid ARN"))]
pub struct ParseArnError {
    value: String,
}

/// `arn:partition:service:region:account-id:resource`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl FromStr for Arn {
    type Err = ParseArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(6, ':');
        let mut next = || parts.next().map(str::to_owned);
        let (Some(prefix), Some(partition), Some(service), Some(region), Some(account_id), Some(resource)) =
            (next(), next(), next(), next(), next(), next())
        else {
            return ParseArnSnafu { value: s }.fail();
        };
        ensure!(
            prefix == "arn" && !partition.is_empty() && !service.is_empty() && !resource.is_empty(),
            ParseArnSnafu { value: s }
        );
        Ok(Arn {
            partition,
            service,
            region,
            account_id,
            resource,
        })
    }
}

impl core::fmt::Display for Arn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

pub fn is_arn(s: &str) -> bool {
    s.parse::<Arn>().is_ok()
}
