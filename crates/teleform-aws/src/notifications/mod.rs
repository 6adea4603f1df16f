//! AWS User Notifications infrastructure.
//!
//! All resources in this module talk to AWS through [`NotificationsApi`],
//! implemented by [`SdkNotifications`] on top of `aws-sdk-notifications`.
use std::collections::BTreeMap;

use crate::{
    api::ApiError,
    tags::{TagApi, Tags},
    BoxFuture, Result,
};

mod channel_association;
mod configuration;
mod event_rule;
#[cfg(test)]
pub(crate) mod fake;
mod hub;
mod sdk;

pub use channel_association::*;
pub use configuration::*;
pub use event_rule::*;
pub use hub::*;
pub use sdk::SdkNotifications;

/// A notification hub as reported by `ListNotificationHubs`.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationHubSummary {
    pub region: String,
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationConfigurationDetail {
    pub arn: String,
    pub name: String,
    pub description: String,
    pub aggregation_duration: Option<String>,
    pub status: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationConfigurationInput {
    pub name: String,
    pub description: String,
    pub aggregation_duration: Option<String>,
    pub tags: Tags,
}

/// Status of an event rule in one region.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegionStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventRuleDetail {
    pub arn: String,
    pub notification_configuration_arn: String,
    pub source: String,
    pub event_type: String,
    pub event_pattern: Option<String>,
    pub regions: Vec<String>,
    pub managed_rules: Vec<String>,
    pub status_by_region: BTreeMap<String, RegionStatus>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRuleInput {
    pub notification_configuration_arn: String,
    pub source: String,
    pub event_type: String,
    pub event_pattern: Option<String>,
    pub regions: Vec<String>,
}

/// The AWS User Notifications control plane.
pub trait NotificationsApi: TagApi {
    fn register_notification_hub<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<NotificationHubSummary, ApiError>>;

    fn deregister_notification_hub<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<NotificationHubSummary, ApiError>>;

    fn list_notification_hubs(&self) -> BoxFuture<'_, Result<Vec<NotificationHubSummary>, ApiError>>;

    /// Returns the ARN of the new configuration.
    fn create_notification_configuration<'a>(
        &'a self,
        input: &'a NotificationConfigurationInput,
    ) -> BoxFuture<'a, Result<String, ApiError>>;

    fn get_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
    ) -> BoxFuture<'a, Result<NotificationConfigurationDetail, ApiError>>;

    /// Tags in `input` are ignored, use the tagging calls.
    fn update_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
        input: &'a NotificationConfigurationInput,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn delete_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    /// Returns the ARN of the new rule.
    fn create_event_rule<'a>(
        &'a self,
        input: &'a EventRuleInput,
    ) -> BoxFuture<'a, Result<String, ApiError>>;

    fn get_event_rule<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<EventRuleDetail, ApiError>>;

    fn update_event_rule<'a>(
        &'a self,
        arn: &'a str,
        event_pattern: Option<&'a str>,
        regions: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn delete_event_rule<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<(), ApiError>>;

    fn associate_channel<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
        channel_arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn disassociate_channel<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
        channel_arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    /// ARNs of the channels associated with a configuration.
    fn list_channels<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, ApiError>>;
}
