//! [`NotificationsApi`] backed by `aws-sdk-notifications`.
use std::collections::HashMap;

use aws_config::SdkConfig;
use aws_sdk_notifications::types::{AggregationDuration, NotificationHubStatusSummary};

use super::*;

pub struct SdkNotifications {
    client: aws_sdk_notifications::Client,
}

impl SdkNotifications {
    pub fn new(sdk: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_notifications::config::Builder::from(sdk);
        if let Some(url) = endpoint_url {
            log::debug!("notifications endpoint override: {url}");
            builder.set_endpoint_url(Some(url.to_owned()));
        }
        Self {
            client: aws_sdk_notifications::Client::from_conf(builder.build()),
        }
    }
}

fn hub_summary(region: String, summary: Option<NotificationHubStatusSummary>) -> NotificationHubSummary {
    let (status, reason) = match summary {
        Some(summary) => (
            summary.status().as_str().to_owned(),
            Some(summary.reason().to_string()).filter(|r| !r.is_empty()),
        ),
        None => (String::new(), None),
    };
    NotificationHubSummary {
        region,
        status,
        reason,
    }
}

fn to_hash_map(tags: &Tags) -> HashMap<String, String> {
    tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

impl NotificationsApi for SdkNotifications {
    fn register_notification_hub<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<NotificationHubSummary, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .register_notification_hub()
                .notification_hub_region(region)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(hub_summary(out.notification_hub_region, out.status_summary))
        })
    }

    fn deregister_notification_hub<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<NotificationHubSummary, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .deregister_notification_hub()
                .notification_hub_region(region)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(hub_summary(out.notification_hub_region, out.status_summary))
        })
    }

    fn list_notification_hubs(&self) -> BoxFuture<'_, Result<Vec<NotificationHubSummary>, ApiError>> {
        Box::pin(async move {
            let mut hubs = vec![];
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_notification_hubs()
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                hubs.extend(out.notification_hubs().iter().map(|hub| {
                    hub_summary(
                        hub.notification_hub_region().to_owned(),
                        hub.status_summary().cloned(),
                    )
                }));
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(hubs)
        })
    }

    fn create_notification_configuration<'a>(
        &'a self,
        input: &'a NotificationConfigurationInput,
    ) -> BoxFuture<'a, Result<String, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .create_notification_configuration()
                .name(&input.name)
                .description(&input.description)
                .set_aggregation_duration(
                    input
                        .aggregation_duration
                        .as_deref()
                        .map(AggregationDuration::from),
                )
                .set_tags((!input.tags.is_empty()).then(|| to_hash_map(&input.tags)))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(out.arn)
        })
    }

    fn get_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
    ) -> BoxFuture<'a, Result<NotificationConfigurationDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_notification_configuration()
                .arn(arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(NotificationConfigurationDetail {
                aggregation_duration: out
                    .aggregation_duration()
                    .map(|a| a.as_str().to_owned()),
                status: out.status().as_str().to_owned(),
                arn: out.arn,
                name: out.name,
                description: out.description,
            })
        })
    }

    fn update_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
        input: &'a NotificationConfigurationInput,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .update_notification_configuration()
                .arn(arn)
                .name(&input.name)
                .description(&input.description)
                .set_aggregation_duration(
                    input
                        .aggregation_duration
                        .as_deref()
                        .map(AggregationDuration::from),
                )
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn delete_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_notification_configuration()
                .arn(arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn create_event_rule<'a>(
        &'a self,
        input: &'a EventRuleInput,
    ) -> BoxFuture<'a, Result<String, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .create_event_rule()
                .notification_configuration_arn(&input.notification_configuration_arn)
                .source(&input.source)
                .event_type(&input.event_type)
                .set_event_pattern(input.event_pattern.clone())
                .set_regions(Some(input.regions.clone()))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(out.arn)
        })
    }

    fn get_event_rule<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<EventRuleDetail, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .get_event_rule()
                .arn(arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            let status_by_region = out
                .status_summary_by_region()
                .iter()
                .map(|(region, summary)| {
                    (
                        region.clone(),
                        RegionStatus {
                            status: summary.status().as_str().to_owned(),
                            reason: Some(summary.reason().to_string()).filter(|r| !r.is_empty()),
                        },
                    )
                })
                .collect();
            Ok(EventRuleDetail {
                event_pattern: Some(out.event_pattern().to_owned()).filter(|p| !p.is_empty()),
                regions: out.regions().to_vec(),
                managed_rules: out.managed_rules().to_vec(),
                status_by_region,
                arn: out.arn,
                notification_configuration_arn: out.notification_configuration_arn,
                source: out.source,
                event_type: out.event_type,
            })
        })
    }

    fn update_event_rule<'a>(
        &'a self,
        arn: &'a str,
        event_pattern: Option<&'a str>,
        regions: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .update_event_rule()
                .arn(arn)
                .set_event_pattern(event_pattern.map(str::to_owned))
                .set_regions(Some(regions.to_vec()))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn delete_event_rule<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_event_rule()
                .arn(arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn associate_channel<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
        channel_arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .associate_channel()
                .arn(channel_arn)
                .notification_configuration_arn(notification_configuration_arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn disassociate_channel<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
        channel_arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .disassociate_channel()
                .arn(channel_arn)
                .notification_configuration_arn(notification_configuration_arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn list_channels<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, ApiError>> {
        Box::pin(async move {
            let mut channels = vec![];
            let mut next_token = None;
            loop {
                let out = self
                    .client
                    .list_channels()
                    .notification_configuration_arn(notification_configuration_arn)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(ApiError::from_sdk)?;
                channels.extend(out.channels().iter().cloned());
                next_token = out.next_token;
                if next_token.is_none() {
                    break;
                }
            }
            Ok(channels)
        })
    }
}

impl TagApi for SdkNotifications {
    fn list_tags_for_resource<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<Tags, ApiError>> {
        Box::pin(async move {
            let out = self
                .client
                .list_tags_for_resource()
                .arn(arn)
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(out.tags.unwrap_or_default().into_iter().collect())
        })
    }

    fn tag_resource<'a>(&'a self, arn: &'a str, tags: &'a Tags) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .tag_resource()
                .arn(arn)
                .set_tags(Some(to_hash_map(tags)))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }

    fn untag_resource<'a>(
        &'a self,
        arn: &'a str,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .untag_resource()
                .arn(arn)
                .set_tag_keys(Some(keys.to_vec()))
                .send()
                .await
                .map_err(ApiError::from_sdk)?;
            Ok(())
        })
    }
}
