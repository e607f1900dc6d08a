//! The convenience registry: handlers for common field types.
//!
//! None of this is engine code. Callers can start from [`registry`] and
//! replace or add handlers, or build a [`Registry`] from scratch.
//!
//! | Type            | Parsers                                        |
//! |-----------------|------------------------------------------------|
//! | `String`        | `nonempty-string`, `possibly-empty-string`, `log-level` |
//! | `bool`          | `empty/nonempty`, `parse-bool`                 |
//! | integers        | `parse-int` (`i32 i64 isize u16 u32 u64 usize`) |
//! | `f32`, `f64`    | `parse-float`                                  |
//! | `Duration`      | `integer-seconds`, `integer-milliseconds`, `parse-duration` |
//! | `Vec<String>`   | `comma-list`, `nonempty-comma-list`            |
//! | `Option<Url>`   | `absolute-URL` (feature `url`)                 |
//!
//! `log-level` accepts `trace debug info warn error` and the numbers `1`-`5`,
//! case-insensitively, plus the aliases `warning`, `fatal`, and `panic`. The
//! text is kept as given.

use std::str::FromStr;
use std::time::Duration;

use crate::handler::{BoxError, Registry, TypeHandler};
use crate::tag::parse_bool;

/// Message used when a value is present but empty where that means "unset".
pub const NOT_SET: &str = "is not set";

/// Every default handler.
pub fn registry() -> Registry {
    let registry = Registry::new()
        .with(string())
        .with(boolean())
        .with(integer::<i32>())
        .with(integer::<i64>())
        .with(integer::<isize>())
        .with(integer::<u16>())
        .with(integer::<u32>())
        .with(integer::<u64>())
        .with(integer::<usize>())
        .with(float::<f32>())
        .with(float::<f64>())
        .with(duration())
        .with(string_list());

    #[cfg(feature = "url")]
    let registry = registry.with(absolute_url());

    registry
}

fn string() -> TypeHandler {
    TypeHandler::of::<String>()
        .parser("nonempty-string", |s: &str| {
            if s.is_empty() {
                Err(BoxError::from(NOT_SET))
            } else {
                Ok(s.to_string())
            }
        })
        .parser("possibly-empty-string", |s: &str| {
            Ok::<_, BoxError>(s.to_string())
        })
        .parser("log-level", |s: &str| {
            if is_log_level(s) {
                Ok(s.to_string())
            } else {
                Err(BoxError::from(format!("not a valid log level: {s:?}")))
            }
        })
        .build()
}

fn is_log_level(s: &str) -> bool {
    const ALIASES: [&str; 3] = ["warning", "fatal", "panic"];
    tracing::Level::from_str(s).is_ok() || ALIASES.iter().any(|a| a.eq_ignore_ascii_case(s))
}

fn boolean() -> TypeHandler {
    TypeHandler::of::<bool>()
        .parser("empty/nonempty", |s: &str| Ok::<_, BoxError>(!s.is_empty()))
        .parser("parse-bool", parse_bool)
        .build()
}

fn integer<T>() -> TypeHandler
where
    T: FromStr<Err = std::num::ParseIntError> + Send + Sync + 'static,
{
    TypeHandler::of::<T>()
        .parser("parse-int", |s: &str| s.parse::<T>())
        .build()
}

fn float<T>() -> TypeHandler
where
    T: FromStr<Err = std::num::ParseFloatError> + Send + Sync + 'static,
{
    TypeHandler::of::<T>()
        .parser("parse-float", |s: &str| s.parse::<T>())
        .build()
}

fn duration() -> TypeHandler {
    TypeHandler::of::<Duration>()
        .parser("integer-seconds", |s: &str| {
            s.parse::<u64>().map(Duration::from_secs)
        })
        .parser("integer-milliseconds", |s: &str| {
            s.parse::<u64>().map(Duration::from_millis)
        })
        .parser("parse-duration", humantime::parse_duration)
        .build()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn string_list() -> TypeHandler {
    TypeHandler::of::<Vec<String>>()
        .parser("comma-list", |s: &str| Ok::<_, BoxError>(split_list(s)))
        .parser("nonempty-comma-list", |s: &str| {
            let items = split_list(s);
            if items.is_empty() {
                Err(BoxError::from(NOT_SET))
            } else {
                Ok(items)
            }
        })
        .build()
}

/// `Option` so that an unresolved field resets to `None`.
#[cfg(feature = "url")]
fn absolute_url() -> TypeHandler {
    use url::Url;

    TypeHandler::of::<Option<Url>>()
        .parser("absolute-URL", |s: &str| {
            // `host:port` parses as scheme `host` with an opaque path; reject it.
            match Url::parse(s) {
                Ok(url) if !url.cannot_be_a_base() => Ok(Some(url)),
                _ => Err(BoxError::from("not an absolute URL")),
            }
        })
        .build()
}
