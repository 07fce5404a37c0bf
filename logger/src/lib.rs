use colored::Colorize;
use common::env_config::{LogConfig, LogFormat};
use middleware::{logger::LoggerMiddleware, request_id::RequestIdMiddleware};

pub mod middleware {
    pub mod logger;
    pub mod request_id;
}

pub use middleware::request_id::{REQUEST_ID_HEADER, RequestId};

/// Installs the global logger. Stdout gets colors in text format; the
/// optional log file always gets plain lines. A log file that cannot be
/// opened is reported and skipped.
pub fn setup(config: &LogConfig) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .level(config.level)
        .level_for("sqlx::query", log::LevelFilter::Warn)
        .level_for("actix_server", log::LevelFilter::Warn)
        .chain(formatted(config.format, true).chain(std::io::stdout()));

    let mut file_error = None;
    if let Some(path) = &config.file_path {
        match fern::log_file(path) {
            Ok(file) => dispatch = dispatch.chain(formatted(config.format, false).chain(file)),
            Err(err) => file_error = Some((path, err)),
        }
    }

    dispatch.apply()?;

    if let Some((path, err)) = file_error {
        log::warn!(
            "Failed to open log file {}, logging to stdout only: {}",
            path,
            err
        );
    }
    Ok(())
}

fn formatted(format: LogFormat, colorize: bool) -> fern::Dispatch {
    match format {
        LogFormat::Text => fern::Dispatch::new().format(move |out, message, record| {
            let timestamp = chrono::Local::now()
                .format("[%Y-%m-%d %H:%M:%S]")
                .to_string();
            if !colorize {
                return out.finish(format_args!(
                    "{} {} [{}] {}",
                    timestamp,
                    record.level(),
                    record.target(),
                    message
                ));
            }

            let color = match record.level() {
                log::Level::Info => "green",
                log::Level::Warn => "yellow",
                log::Level::Error => "red",
                log::Level::Debug => "magenta",
                log::Level::Trace => "bright black",
            };
            out.finish(format_args!(
                "{} {} [{}] {}",
                timestamp.bright_black(),
                record.level().to_string().color(color),
                record.target().bright_blue(),
                message
            ))
        }),
        LogFormat::Json => fern::Dispatch::new().format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                json_line(
                    &chrono::Utc::now().to_rfc3339(),
                    record.level(),
                    record.target(),
                    &message.to_string()
                )
            ))
        }),
    }
}

fn json_line(timestamp: &str, level: log::Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "ts": timestamp,
        "level": level.to_string(),
        "target": target,
        "message": message,
    })
    .to_string()
}

/// Request logging. The request line carries colors only for colored text
/// output on stdout with no log file.
pub fn middleware(config: &LogConfig) -> LoggerMiddleware {
    LoggerMiddleware::new(config.format == LogFormat::Text && config.file_path.is_none())
}

pub fn request_id_middleware() -> RequestIdMiddleware {
    RequestIdMiddleware::new()
}
