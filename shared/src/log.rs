use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt::{format, time::ChronoLocal},
    EnvFilter,
};

/// Crates whose worker and coordinator events `verbose` turns up to debug.
const SEARCH_TARGETS: [&str; 2] = ["miner", "shared"];

/// `RUST_LOG` first, info for everything else. `verbose` adds per-worker
/// debug events from the search crates.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let mut filter = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
    if verbose {
        for target in SEARCH_TARGETS {
            if let Ok(directive) = format!("{target}=debug").parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

pub fn init_log(verbose: bool) {
    // worker threads are named, so show them instead of the target
    let format = format::format()
        .with_level(true)
        .with_target(false)
        .with_thread_names(true)
        .with_timer(ChronoLocal::new("[%m-%d %H:%M:%S%.3f]".to_string()))
        .compact();

    tracing_subscriber::fmt().with_env_filter(env_filter(verbose)).event_format(format).init();
}
