//! In-memory [`NotificationsApi`].
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard},
};

use super::*;
use crate::{
    api::{CONFLICT, RESOURCE_NOT_FOUND},
    fake::{Calls, HasStatus, Table},
};

pub(crate) const ACCOUNT: &str = "123456789012";

impl HasStatus for NotificationHubSummary {
    fn set_status(&mut self, status: &str) {
        self.status = status.to_owned();
    }
}

impl HasStatus for NotificationConfigurationDetail {
    fn set_status(&mut self, status: &str) {
        self.status = status.to_owned();
    }
}

impl HasStatus for EventRuleDetail {
    fn set_status(&mut self, status: &str) {
        for region in self.status_by_region.values_mut() {
            region.status = status.to_owned();
        }
    }
}

#[derive(Default)]
pub(crate) struct State {
    pub calls: Calls,
    pub hubs: Table<NotificationHubSummary>,
    pub configurations: Table<NotificationConfigurationDetail>,
    pub event_rules: Table<EventRuleDetail>,
    pub channels: BTreeMap<String, BTreeSet<String>>,
    pub tags: BTreeMap<String, Tags>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub(crate) struct FakeNotifications {
    state: Mutex<State>,
}

impl FakeNotifications {
    pub fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with<'a, T: Send + 'a>(
        &'a self,
        op: &str,
        f: impl FnOnce(&mut State) -> Result<T, ApiError>,
    ) -> BoxFuture<'a, Result<T, ApiError>> {
        let mut state = self.state();
        let result = state.calls.call(op).and_then(|()| f(&mut state));
        Box::pin(std::future::ready(result))
    }
}

fn missing(what: &str, id: &str) -> ApiError {
    ApiError::new(RESOURCE_NOT_FOUND, format!("{what} {id} does not exist"))
}

impl NotificationsApi for FakeNotifications {
    fn register_notification_hub<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<NotificationHubSummary, ApiError>> {
        self.with("register_notification_hub", |state| {
            if state.hubs.contains(region) {
                return Err(ApiError::new(CONFLICT, format!("hub in {region} already registered")));
            }
            Ok(state.hubs.insert(
                region,
                NotificationHubSummary {
                    region: region.to_owned(),
                    status: "ACTIVE".into(),
                    reason: None,
                },
            ))
        })
    }

    fn deregister_notification_hub<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<NotificationHubSummary, ApiError>> {
        self.with("deregister_notification_hub", |state| state.hubs.remove(region))
    }

    fn list_notification_hubs(&self) -> BoxFuture<'_, Result<Vec<NotificationHubSummary>, ApiError>> {
        self.with("list_notification_hubs", |state| Ok(state.hubs.list()))
    }

    fn create_notification_configuration<'a>(
        &'a self,
        input: &'a NotificationConfigurationInput,
    ) -> BoxFuture<'a, Result<String, ApiError>> {
        self.with("create_notification_configuration", |state| {
            let arn = format!(
                "arn:aws:notifications::{ACCOUNT}:configuration/{:08}",
                state.next_id()
            );
            state.configurations.insert(
                &arn,
                NotificationConfigurationDetail {
                    arn: arn.clone(),
                    name: input.name.clone(),
                    description: input.description.clone(),
                    aggregation_duration: input.aggregation_duration.clone(),
                    status: "ACTIVE".into(),
                },
            );
            state.tags.insert(arn.clone(), input.tags.clone());
            Ok(arn)
        })
    }

    fn get_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
    ) -> BoxFuture<'a, Result<NotificationConfigurationDetail, ApiError>> {
        self.with("get_notification_configuration", |state| {
            state.configurations.get(arn)
        })
    }

    fn update_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
        input: &'a NotificationConfigurationInput,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("update_notification_configuration", |state| {
            state.configurations.update(arn, |config| {
                config.name = input.name.clone();
                config.description = input.description.clone();
                config.aggregation_duration = input.aggregation_duration.clone();
            })?;
            Ok(())
        })
    }

    fn delete_notification_configuration<'a>(
        &'a self,
        arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_notification_configuration", |state| {
            state.configurations.remove(arn)?;
            state.channels.remove(arn);
            Ok(())
        })
    }

    fn create_event_rule<'a>(
        &'a self,
        input: &'a EventRuleInput,
    ) -> BoxFuture<'a, Result<String, ApiError>> {
        self.with("create_event_rule", |state| {
            if !state.configurations.contains(&input.notification_configuration_arn) {
                return Err(missing("configuration", &input.notification_configuration_arn));
            }
            let arn = format!(
                "{}/rule/{:08}",
                input.notification_configuration_arn,
                state.next_id()
            );
            let status_by_region = input
                .regions
                .iter()
                .map(|region| {
                    (
                        region.clone(),
                        RegionStatus {
                            status: "ACTIVE".into(),
                            reason: None,
                        },
                    )
                })
                .collect();
            state.event_rules.insert(
                &arn,
                EventRuleDetail {
                    arn: arn.clone(),
                    notification_configuration_arn: input.notification_configuration_arn.clone(),
                    source: input.source.clone(),
                    event_type: input.event_type.clone(),
                    event_pattern: input.event_pattern.clone(),
                    regions: input.regions.clone(),
                    managed_rules: vec![format!("{arn}/managed")],
                    status_by_region,
                },
            );
            Ok(arn)
        })
    }

    fn get_event_rule<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<EventRuleDetail, ApiError>> {
        self.with("get_event_rule", |state| state.event_rules.get(arn))
    }

    fn update_event_rule<'a>(
        &'a self,
        arn: &'a str,
        event_pattern: Option<&'a str>,
        regions: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("update_event_rule", |state| {
            state.event_rules.update(arn, |rule| {
                rule.event_pattern = event_pattern.map(str::to_owned);
                rule.regions = regions.to_vec();
                let status = rule
                    .status_by_region
                    .values()
                    .next()
                    .cloned()
                    .unwrap_or_default();
                rule.status_by_region = regions
                    .iter()
                    .map(|region| (region.clone(), status.clone()))
                    .collect();
            })?;
            Ok(())
        })
    }

    fn delete_event_rule<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("delete_event_rule", |state| {
            state.event_rules.remove(arn)?;
            Ok(())
        })
    }

    fn associate_channel<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
        channel_arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("associate_channel", |state| {
            if !state.configurations.contains(notification_configuration_arn) {
                return Err(missing("configuration", notification_configuration_arn));
            }
            state
                .channels
                .entry(notification_configuration_arn.to_owned())
                .or_default()
                .insert(channel_arn.to_owned());
            Ok(())
        })
    }

    fn disassociate_channel<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
        channel_arn: &'a str,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("disassociate_channel", |state| {
            let removed = state
                .channels
                .get_mut(notification_configuration_arn)
                .is_some_and(|channels| channels.remove(channel_arn));
            if removed {
                Ok(())
            } else {
                Err(missing("channel association", channel_arn))
            }
        })
    }

    fn list_channels<'a>(
        &'a self,
        notification_configuration_arn: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, ApiError>> {
        self.with("list_channels", |state| {
            if !state.configurations.contains(notification_configuration_arn) {
                return Err(missing("configuration", notification_configuration_arn));
            }
            Ok(state
                .channels
                .get(notification_configuration_arn)
                .map(|channels| channels.iter().cloned().collect())
                .unwrap_or_default())
        })
    }
}

impl TagApi for FakeNotifications {
    fn list_tags_for_resource<'a>(&'a self, arn: &'a str) -> BoxFuture<'a, Result<Tags, ApiError>> {
        self.with("list_tags_for_resource", |state| {
            state
                .tags
                .get(arn)
                .cloned()
                .ok_or_else(|| missing("resource", arn))
        })
    }

    fn tag_resource<'a>(&'a self, arn: &'a str, tags: &'a Tags) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("tag_resource", |state| {
            let existing = state.tags.get_mut(arn).ok_or_else(|| missing("resource", arn))?;
            existing.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        })
    }

    fn untag_resource<'a>(
        &'a self,
        arn: &'a str,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        self.with("untag_resource", |state| {
            let existing = state.tags.get_mut(arn).ok_or_else(|| missing("resource", arn))?;
            existing.retain(|k, _| !keys.contains(k));
            Ok(())
        })
    }
}
