use env_logger::Builder;
use error_chain::ChainedError;
use errors::*;
use std::env;

// Runs are summarised at info; skipped records are only reported at debug.
const DEFAULT_LOG_CONFIG: &str = "info";

fn log_filters(configured: Option<String>) -> String {
    match configured {
        Some(ref log_config) if !log_config.trim().is_empty() => log_config.to_owned(),
        _ => DEFAULT_LOG_CONFIG.to_owned(),
    }
}

pub fn init_logger() -> Result<()> {
    let filters = log_filters(env::var("RUST_LOG").ok());

    Builder::new()
        .parse(&filters)
        .try_init()
        .chain_err(|| "Failed to build env_logger")?;
    Ok(())
}

pub fn output_error<E: ChainedError>(err: &E) {
    error!("{}", err);

    for e in err.iter().skip(1) {
        error!("caused by: {}", e);
    }

    if let Some(backtrace) = err.backtrace() {
        error!("backtrace: {:?}", backtrace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_default() {
        assert_eq!("geogrid=debug", log_filters(Some("geogrid=debug".to_owned())));
    }

    #[test]
    fn default_used_when_unset_or_blank() {
        assert_eq!(DEFAULT_LOG_CONFIG, log_filters(None));
        assert_eq!(DEFAULT_LOG_CONFIG, log_filters(Some("  ".to_owned())));
    }
}
