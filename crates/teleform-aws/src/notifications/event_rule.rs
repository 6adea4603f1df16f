//! Event rules: which events of which regions feed a notification
//! configuration.
use std::{collections::BTreeMap, time::Duration};

use snafu::prelude::*;

use super::{EventRuleDetail, EventRuleInput, NotificationsApi, RegionStatus};
use crate::{
    api::{ignore_not_found, not_found_as_none, ApiError},
    validate,
    wait::{Poll, StateChange},
    ApiSnafu, Context, NotFoundSnafu, Phase, Resource, Result, WaitSnafu,
};

pub const EVENT_RULE_ACTIVE: &str = "ACTIVE";
pub const EVENT_RULE_INACTIVE: &str = "INACTIVE";
pub const EVENT_RULE_CREATING: &str = "CREATING";
pub const EVENT_RULE_UPDATING: &str = "UPDATING";
pub const EVENT_RULE_DELETING: &str = "DELETING";

const CREATE_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

impl EventRuleDetail {
    /// One status for the whole rule.
    ///
    /// A rule is only `ACTIVE` once every region is. Otherwise the most
    /// significant regional status wins: `INACTIVE`, then `DELETING`,
    /// `CREATING` and `UPDATING`. A rule with no regional statuses yet is
    /// still `CREATING`.
    pub fn aggregate_status(&self) -> &str {
        if self.status_by_region.is_empty() {
            return EVENT_RULE_CREATING;
        }
        for status in [
            EVENT_RULE_INACTIVE,
            EVENT_RULE_DELETING,
            EVENT_RULE_CREATING,
            EVENT_RULE_UPDATING,
        ] {
            if self.status_by_region.values().any(|r| r.status == status) {
                return status;
            }
        }
        match self
            .status_by_region
            .values()
            .find(|r| r.status != EVENT_RULE_ACTIVE)
        {
            Some(other) => &other.status,
            None => EVENT_RULE_ACTIVE,
        }
    }

    /// The reason given by the first region that is not active.
    pub fn aggregate_reason(&self) -> Option<String> {
        self.status_by_region
            .iter()
            .find(|(_, r)| r.status != EVENT_RULE_ACTIVE)
            .and_then(|(region, r)| r.reason.as_ref().map(|reason| format!("{region}: {reason}")))
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventRule {
    pub notification_configuration_arn: String,
    /// Event source, eg `aws.ec2`.
    pub source: String,
    /// Event type, eg `EC2 Instance State-change Notification`.
    pub event_type: String,
    /// EventBridge event pattern narrowing the events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<String>,
    pub regions: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventRuleOutput {
    pub arn: String,
    pub notification_configuration_arn: String,
    pub source: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<String>,
    pub regions: Vec<String>,
    #[serde(default)]
    pub managed_rules: Vec<String>,
    #[serde(default)]
    pub status_summary_by_region: BTreeMap<String, RegionStatus>,
}

impl From<EventRuleDetail> for EventRuleOutput {
    fn from(rule: EventRuleDetail) -> Self {
        Self {
            arn: rule.arn,
            notification_configuration_arn: rule.notification_configuration_arn,
            source: rule.source,
            event_type: rule.event_type,
            event_pattern: rule.event_pattern,
            regions: rule.regions,
            managed_rules: rule.managed_rules,
            status_summary_by_region: rule.status_by_region,
        }
    }
}

pub async fn find_event_rule(
    api: &dyn NotificationsApi,
    arn: &str,
) -> Result<Option<EventRuleDetail>, ApiError> {
    not_found_as_none(api.get_event_rule(arn).await)
}

pub async fn status_event_rule(
    api: &dyn NotificationsApi,
    arn: &str,
) -> Result<Poll<EventRuleDetail>, ApiError> {
    let rule = find_event_rule(api, arn).await?;
    Ok(Poll::from_found(rule, |rule| rule.aggregate_status().to_owned()))
}

async fn wait_event_rule_active(
    api: &dyn NotificationsApi,
    arn: &str,
    timeout: Duration,
    ctx: &Context,
    phase: Phase,
) -> Result<EventRuleDetail> {
    let rule = StateChange::new(|| status_event_rule(api, arn))
        .pending([EVENT_RULE_CREATING, EVENT_RULE_UPDATING])
        .target([EVENT_RULE_ACTIVE])
        .reason(EventRuleDetail::aggregate_reason)
        .timeout(timeout)
        .wait(&ctx.cancel)
        .await
        .context(WaitSnafu {
            type_name: EventRule::TYPE_NAME,
            id: arn,
            phase,
        })?;
    rule.context(NotFoundSnafu {
        type_name: EventRule::TYPE_NAME,
        id: arn,
    })
}

impl Resource for EventRule {
    const TYPE_NAME: &'static str = "aws_notifications_event_rule";
    type Provider = dyn NotificationsApi;
    type Output = EventRuleOutput;

    fn validate(&self) -> Result<()> {
        validate::arn(
            Self::TYPE_NAME,
            "notification_configuration_arn",
            &self.notification_configuration_arn,
        )?;
        validate::length_between(Self::TYPE_NAME, "source", &self.source, 1, 36)?;
        validate::length_between(Self::TYPE_NAME, "event_type", &self.event_type, 1, 128)?;
        if let Some(pattern) = &self.event_pattern {
            validate::length_between(Self::TYPE_NAME, "event_pattern", pattern, 0, 4096)?;
        }
        validate::count_between(Self::TYPE_NAME, "regions", &self.regions, 1, 32)?;
        for region in &self.regions {
            validate::length_between(Self::TYPE_NAME, "regions", region, 2, 25)?;
        }
        Ok(())
    }

    fn id(output: &Self::Output) -> String {
        output.arn.clone()
    }

    fn flatten(output: &Self::Output) -> Self {
        EventRule {
            notification_configuration_arn: output.notification_configuration_arn.clone(),
            source: output.source.clone(),
            event_type: output.event_type.clone(),
            event_pattern: output.event_pattern.clone(),
            regions: output.regions.clone(),
        }
    }

    async fn create(&self, api: &Self::Provider, ctx: &Context) -> Result<Self::Output> {
        log::info!(
            "creating event rule for '{}' on {}",
            self.event_type,
            self.notification_configuration_arn
        );
        let input = EventRuleInput {
            notification_configuration_arn: self.notification_configuration_arn.clone(),
            source: self.source.clone(),
            event_type: self.event_type.clone(),
            event_pattern: self.event_pattern.clone(),
            regions: self.regions.clone(),
        };
        let arn = api.create_event_rule(&input).await.context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id: &self.notification_configuration_arn,
            phase: Phase::Creating,
        })?;
        log::info!("  created '{arn}', waiting for all regions to become active");
        let rule = wait_event_rule_active(
            api,
            &arn,
            ctx.timeouts.create_or(CREATE_TIMEOUT),
            ctx,
            Phase::WaitingForCreation,
        )
        .await?;
        Ok(rule.into())
    }

    async fn read(api: &Self::Provider, id: &str, _ctx: &Context) -> Result<Option<Self::Output>> {
        let rule = find_event_rule(api, id).await.context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id,
            phase: Phase::Reading,
        })?;
        if rule.is_none() {
            log::warn!("{} '{id}' not found, removing from state", Self::TYPE_NAME);
        }
        Ok(rule.map(Into::into))
    }

    async fn update(
        &self,
        api: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
        ctx: &Context,
    ) -> Result<Self::Output> {
        for (field, previous, next) in [
            (
                "notification_configuration_arn",
                &previous_local.notification_configuration_arn,
                &self.notification_configuration_arn,
            ),
            ("source", &previous_local.source, &self.source),
            ("event_type", &previous_local.event_type, &self.event_type),
        ] {
            validate::immutable(Self::TYPE_NAME, field, previous, next)?;
        }
        let arn = previous_remote.arn.as_str();
        if self.event_pattern == previous_local.event_pattern && self.regions == previous_local.regions {
            log::info!("event rule '{arn}' is unchanged");
            return Ok(previous_remote.clone());
        }
        log::info!("updating event rule '{arn}'");
        api.update_event_rule(arn, self.event_pattern.as_deref(), &self.regions)
            .await
            .context(ApiSnafu {
                type_name: Self::TYPE_NAME,
                id: arn,
                phase: Phase::Updating,
            })?;
        let rule = wait_event_rule_active(
            api,
            arn,
            ctx.timeouts.update_or(UPDATE_TIMEOUT),
            ctx,
            Phase::WaitingForUpdate,
        )
        .await?;
        Ok(rule.into())
    }

    async fn delete(api: &Self::Provider, previous_remote: &Self::Output, ctx: &Context) -> Result<()> {
        let arn = previous_remote.arn.as_str();
        log::info!("deleting event rule '{arn}'");
        ignore_not_found(api.delete_event_rule(arn).await).context(ApiSnafu {
            type_name: Self::TYPE_NAME,
            id: arn,
            phase: Phase::Deleting,
        })?;
        StateChange::new(|| status_event_rule(api, arn))
            .pending([EVENT_RULE_DELETING])
            .target_gone()
            .reason(EventRuleDetail::aggregate_reason)
            .timeout(ctx.timeouts.delete_or(DELETE_TIMEOUT))
            .wait(&ctx.cancel)
            .await
            .context(WaitSnafu {
                type_name: Self::TYPE_NAME,
                id: arn,
                phase: Phase::WaitingForDeletion,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        fake::script,
        notifications::{fake::FakeNotifications, NotificationConfiguration},
        WaitError,
    };

    async fn setup(fake: &FakeNotifications, ctx: &Context) -> EventRule {
        let config = NotificationConfiguration {
            name: "ec2".into(),
            description: "EC2 state changes".into(),
            ..Default::default()
        }
        .create(fake, ctx)
        .await
        .unwrap();
        EventRule {
            notification_configuration_arn: config.arn,
            source: "aws.ec2".into(),
            event_type: "EC2 Instance State-change Notification".into(),
            event_pattern: None,
            regions: vec!["us-east-1".into(), "us-west-2".into()],
        }
    }

    fn detail(statuses: &[(&str, &str)]) -> EventRuleDetail {
        EventRuleDetail {
            arn: "arn".into(),
            notification_configuration_arn: "arn".into(),
            source: "aws.ec2".into(),
            event_type: "t".into(),
            event_pattern: None,
            regions: vec![],
            managed_rules: vec![],
            status_by_region: statuses
                .iter()
                .map(|(region, status)| {
                    (
                        region.to_string(),
                        RegionStatus {
                            status: status.to_string(),
                            reason: Some(format!("{status} here")),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn aggregate_status() {
        assert_eq!(EVENT_RULE_CREATING, detail(&[]).aggregate_status());
        assert_eq!(
            EVENT_RULE_ACTIVE,
            detail(&[("us-east-1", "ACTIVE"), ("us-west-2", "ACTIVE")]).aggregate_status()
        );
        assert_eq!(
            EVENT_RULE_UPDATING,
            detail(&[("us-east-1", "ACTIVE"), ("us-west-2", "UPDATING")]).aggregate_status()
        );
        let failed = detail(&[("us-east-1", "CREATING"), ("us-west-2", "INACTIVE")]);
        assert_eq!(EVENT_RULE_INACTIVE, failed.aggregate_status());
        assert_eq!(Some("us-east-1: CREATING here".into()), failed.aggregate_reason());
    }

    #[tokio::test(start_paused = true)]
    async fn create_waits_for_every_region() {
        let fake = FakeNotifications::default();
        let ctx = Context::default();
        let rule = setup(&fake, &ctx).await;
        fake.state().event_rules.create_script =
            script([EVENT_RULE_CREATING, EVENT_RULE_CREATING, EVENT_RULE_ACTIVE]);

        let out = rule.create(&fake, &ctx).await.unwrap();
        assert_eq!(3, fake.state().calls.count("get_event_rule"));
        assert_eq!(2, out.status_summary_by_region.len());
        assert_eq!(rule, EventRule::flatten(&out));
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_region_fails_creation() {
        let fake = FakeNotifications::default();
        let ctx = Context::default();
        let rule = setup(&fake, &ctx).await;
        fake.state().event_rules.create_script = script([EVENT_RULE_CREATING, EVENT_RULE_INACTIVE]);

        let err = rule.create(&fake, &ctx).await.unwrap_err();
        assert!(
            matches!(
                &err,
                crate::Error::Wait {
                    phase: Phase::WaitingForCreation,
                    source: WaitError::UnexpectedState { .. },
                    ..
                }
            ),
            "{err}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn update_changes_regions_and_rejects_new_source() {
        let fake = FakeNotifications::default();
        let ctx = Context::default();
        let rule = setup(&fake, &ctx).await;
        let out = rule.create(&fake, &ctx).await.unwrap();

        fake.state().event_rules.update_script = script([EVENT_RULE_UPDATING, EVENT_RULE_ACTIVE]);
        let mut next = rule.clone();
        next.regions = vec!["eu-west-1".into()];
        next.event_pattern = Some(r#"{"detail":{"state":["stopped"]}}"#.into());
        let updated = next.update(&fake, &rule, &out, &ctx).await.unwrap();
        assert_eq!(next, EventRule::flatten(&updated));
        assert_eq!(
            vec!["eu-west-1"],
            updated.status_summary_by_region.keys().collect::<Vec<_>>()
        );

        let mut moved = next.clone();
        moved.source = "aws.s3".into();
        let err = moved.update(&fake, &next, &updated, &ctx).await.unwrap_err();
        assert!(matches!(err, crate::Error::Validation { .. }), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn delete_twice() {
        let fake = FakeNotifications::default();
        let ctx = Context::default();
        let out = setup(&fake, &ctx).await.create(&fake, &ctx).await.unwrap();
        fake.state().event_rules.delete_script = script([EVENT_RULE_DELETING]);
        EventRule::delete(&fake, &out, &ctx).await.unwrap();
        EventRule::delete(&fake, &out, &ctx).await.unwrap();
        assert!(EventRule::read(&fake, &out.arn, &ctx).await.unwrap().is_none());
    }
}
