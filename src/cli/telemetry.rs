use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

fn filter(verbosity_level: Level) -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("hyper_util=error".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("tokio=error".parse()?))
}

/// Initialize logging. Output goes to stderr so command output on stdout
/// stays clean; `RUST_LOG` overrides the verbosity flag.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or a global subscriber
/// is already set
pub fn init(verbosity_level: Option<Level>, json: bool) -> Result<()> {
    let filter = filter(verbosity_level.unwrap_or(Level::ERROR))?;

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(false)
            .with_writer(std::io::stderr);

        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .with_writer(std::io::stderr);

        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_parse() {
        temp_env::with_var("RUST_LOG", None::<&str>, || {
            let filter = filter(Level::DEBUG);
            assert!(filter.is_ok());
            if let Ok(filter) = filter {
                let rendered = filter.to_string();
                assert!(rendered.contains("hyper=error"));
                assert!(rendered.contains("debug"));
            }
        });
    }
}
