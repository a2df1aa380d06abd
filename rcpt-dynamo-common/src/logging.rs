use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Targets that make it through the filter installed by [`init`]
const TARGET_PREFIX: &str = "rcpt_dynamo";

#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:tt)+) => {{
        let span = $crate::tracing::span!($level, $span);
        let _enter = span.enter();

        $crate::tracing::event!($level, $($msg)+)
    }};
}

#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:tt)+) => {
        $crate::log!($crate::tracing::Level::$level, "internal", $($msg)+)
    };

    ($($msg:tt)+) => {
        $crate::internal!(level = TRACE, $($msg)+)
    };
}

/// Log on behalf of a plugin, tagging the event with the session id and the
/// plugin's identity
#[macro_export]
macro_rules! plugin {
    (level = $level:ident, $connection:expr, $plugin:expr, $($msg:tt)+) => {
        $crate::log!(
            $crate::tracing::Level::$level,
            "plugin",
            session = $connection.id(),
            plugin = $plugin,
            $($msg)+
        )
    };

    ($connection:expr, $plugin:expr, $($msg:tt)+) => {
        $crate::plugin!(level = TRACE, $connection, $plugin, $($msg)+)
    };
}

fn level() -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    std::env::var("LOG_LEVEL").map_or(default, |level| {
        LevelFilter::from_str(level.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    })
}

/// Install the global subscriber
///
/// The level comes from `LOG_LEVEL`, falling back to TRACE for debug builds
/// and INFO otherwise. Only events from this workspace are emitted.
pub fn init() {
    let result = tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level())
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with(TARGET_PREFIX)
                })),
        )
        .try_init();

    if let Err(err) = result {
        eprintln!("Logging already initialised: {err}");
    }
}
