use tracing_subscriber::EnvFilter;

/// Map `-v` counts to filter levels; `RUST_LOG` wins when set.
pub fn setup_logging(verbose_level: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let filter_str = match verbose_level {
            0 => "warn,easy_opal=info",
            1 => "info,easy_opal=debug",
            _ => "debug,easy_opal=trace",
        };
        EnvFilter::new(filter_str)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
