use {
    anyhow::Result,
    std::{
        fs::File,
        path::Path,
        sync::Arc,
    },
    tracing::Level,
    tracing_subscriber::{
        fmt::{
            layer,
            writer::MakeWriterExt,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout stays free for the resolved plan.
/// The log file is only created when a path is given.
pub fn setup_logging(
    path: Option<&Path>,
    min_level_file: Option<Level>,
    min_level_console: Option<Level>,
) -> Result<()> {
    let file_layer = match path {
        Some(path) => {
            let log_file = Arc::new(File::create(path)?);
            Some(
                layer()
                    .with_writer(log_file.with_max_level(min_level_file.unwrap_or(Level::INFO)))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        // File writer
        .with(file_layer)
        // Console writer
        .with(
            layer()
                .with_writer(std::io::stderr.with_max_level(min_level_console.unwrap_or(Level::INFO)))
                .compact()
                .pretty()
                .with_line_number(true)
                .with_thread_ids(false)
                .with_target(false),
        )
        // Create and set Subscriber
        .try_init()?;

    Ok(())
}
