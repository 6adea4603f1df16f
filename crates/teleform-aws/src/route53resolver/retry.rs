//! Retry classification for the Route53Resolver client.
//!
//! Route53Resolver reports exhausted quotas as `LimitExceededException`,
//! which the SDK treats as throttling. Retrying never helps: the quota is
//! still exhausted on the next attempt.
use std::marker::PhantomData;

use aws_sdk_route53resolver::{
    config::{
        interceptors::InterceptorContext,
        retry::{ClassifyRetry, RetryAction},
    },
    error::ProvideErrorMetadata,
};

use crate::api::LIMIT_EXCEEDED;

/// Forbids retries of `E` errors with code `LimitExceededException`.
#[derive(Debug, Default)]
pub struct LimitExceededIsNotRetryable<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> LimitExceededIsNotRetryable<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> ClassifyRetry for LimitExceededIsNotRetryable<E>
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    fn classify_retry(&self, ctx: &InterceptorContext) -> RetryAction {
        let error = match ctx.output_or_error() {
            Some(Ok(_)) | None => return RetryAction::NoActionIndicated,
            Some(Err(err)) => err,
        };

        let limit_exceeded = error
            .as_operation_error()
            .and_then(|err| err.downcast_ref::<E>())
            .and_then(|err| err.code())
            .is_some_and(|code| code == LIMIT_EXCEEDED);

        if limit_exceeded {
            log::debug!("not retrying {LIMIT_EXCEEDED}");
            RetryAction::RetryForbidden
        } else {
            RetryAction::NoActionIndicated
        }
    }

    fn name(&self) -> &'static str {
        "LimitExceededException Classifier"
    }
}
