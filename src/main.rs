use std::process::ExitCode;
use std::time::Duration;

use aetheria::app;
use aetheria::config::AppConfig;
use aetheria::error::AppError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Headless run length when `--headless` has no usable value.
const DEFAULT_HEADLESS: Duration = Duration::from_secs(10);

/// `--headless <seconds>` runs the field without a window.
fn headless_duration(args: impl IntoIterator<Item = String>) -> Option<Duration> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--headless" {
            let duration = args
                .next()
                .and_then(|s| s.parse::<f32>().ok())
                .filter(|s| *s > 0.0)
                .and_then(|s| Duration::try_from_secs_f32(s).ok())
                .unwrap_or(DEFAULT_HEADLESS);
            return Some(duration);
        }
    }
    None
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    info!(
        language = config.language.tag(),
        strategy = ?config.connection_strategy,
        "starting Aetheria"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    match headless_duration(std::env::args().skip(1)) {
        Some(duration) => runtime.block_on(app::run_headless(config, duration)),
        None => app::run(config, runtime.handle().clone()),
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_headless_duration_parsing() {
        assert_eq!(headless_duration(args(&[])), None);
        assert_eq!(
            headless_duration(args(&["--headless", "2.5"])),
            Some(Duration::from_millis(2500))
        );
        let unusable = [
            vec!["--headless"],
            vec!["--headless", "-1"],
            vec!["--headless", "nan"],
        ];
        for list in unusable {
            assert_eq!(headless_duration(args(&list)), Some(DEFAULT_HEADLESS));
        }
    }

    #[test]
    fn test_headless_duration_out_of_range_falls_back() {
        for huge in ["1e30", "inf"] {
            let duration = headless_duration(args(&["--headless", huge]));
            assert_eq!(duration, Some(DEFAULT_HEADLESS));
        }
    }
}
