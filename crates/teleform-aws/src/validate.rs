//! Local checks on resource definitions, run before any network call.
use snafu::prelude::*;

use crate::{Result, ValidationSnafu};

pub fn length_between(
    type_name: &'static str,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<()> {
    let len = value.chars().count();
    ensure!(
        (min..=max).contains(&len),
        ValidationSnafu {
            type_name,
            message: format!("{field} must be between {min} and {max} characters, got {len}"),
        }
    );
    Ok(())
}

pub fn one_of(type_name: &'static str, field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    ensure!(
        allowed.contains(&value),
        ValidationSnafu {
            type_name,
            message: format!("{field} must be one of {allowed:?}, got '{value}'"),
        }
    );
    Ok(())
}

pub fn arn(type_name: &'static str, field: &str, value: &str) -> Result<()> {
    ensure!(
        crate::arn::is_arn(value),
        ValidationSnafu {
            type_name,
            message: format!("{field} must be an ARN, got '{value}'"),
        }
    );
    Ok(())
}

pub fn int_between(type_name: &'static str, field: &str, value: i64, min: i64, max: i64) -> Result<()> {
    ensure!(
        (min..=max).contains(&value),
        ValidationSnafu {
            type_name,
            message: format!("{field} must be between {min} and {max}, got {value}"),
        }
    );
    Ok(())
}

pub fn count_between<T>(
    type_name: &'static str,
    field: &str,
    values: &[T],
    min: usize,
    max: usize,
) -> Result<()> {
    ensure!(
        (min..=max).contains(&values.len()),
        ValidationSnafu {
            type_name,
            message: format!(
                "{field} must have between {min} and {max} items, got {}",
                values.len()
            ),
        }
    );
    Ok(())
}

pub fn ip_address(type_name: &'static str, field: &str, value: &str) -> Result<()> {
    ensure!(
        value.parse::<std::net::IpAddr>().is_ok(),
        ValidationSnafu {
            type_name,
            message: format!("{field} must be an IP address, got '{value}'"),
        }
    );
    Ok(())
}

/// Fails when an attribute that AWS cannot change in place was changed.
pub fn immutable<T: PartialEq + core::fmt::Debug + ?Sized>(
    type_name: &'static str,
    field: &str,
    previous: &T,
    next: &T,
) -> Result<()> {
    ensure!(
        previous == next,
        ValidationSnafu {
            type_name,
            message: format!(
                "{field} cannot be changed in place ({previous:?} -> {next:?}), \
                 delete and re-create the resource"
            ),
        }
    );
    Ok(())
}

/// A generic check with a custom message.
pub fn check(type_name: &'static str, ok: bool, message: impl Into<String>) -> Result<()> {
    ensure!(
        ok,
        ValidationSnafu {
            type_name,
            message: message.into(),
        }
    );
    Ok(())
}
