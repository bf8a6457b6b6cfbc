use crate::{
    api::{ApiClient, ClientConfig},
    cli::commands::session,
    session::{AuthContext, FileTokenStore, Route, SessionNavigator},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};

const TOKEN_DIR: &str = "optika";
const TOKEN_FILE: &str = "session.json";

/// Connection settings shared by every command.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub api_url: String,
    pub token_file: PathBuf,
    pub timeout: Duration,
}

/// Client wiring for one command: the auth context and the navigator the
/// client reports redirects to.
pub struct Session {
    pub auth: AuthContext,
    pub navigator: Arc<SessionNavigator>,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if no token file was given and the user configuration
    /// directory cannot be determined.
    pub fn new(options: session::Options) -> Result<Self> {
        let token_file = match options.token_file {
            Some(path) => path,
            None => default_token_file()?,
        };

        Ok(Self {
            api_url: options.api_url,
            token_file,
            timeout: options.timeout,
        })
    }

    /// Builds the client and auth context with the navigator placed on `route`.
    ///
    /// # Errors
    /// Returns an error if the API URL is invalid.
    pub fn session(&self, route: Route) -> Result<Session> {
        let navigator = Arc::new(SessionNavigator::new(route.path()));
        let config = ClientConfig::new(&self.api_url).with_timeout(self.timeout);
        let client = ApiClient::new(
            &config,
            Arc::new(FileTokenStore::new(&self.token_file)),
            navigator.clone(),
        )
        .with_context(|| format!("invalid API URL: {}", self.api_url))?;

        Ok(Session {
            auth: AuthContext::new(client),
            navigator,
        })
    }
}

fn default_token_file() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("cannot determine the configuration directory, pass --token-file")?;
    Ok(dir.join(TOKEN_DIR).join(TOKEN_FILE))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::Navigator;

    fn options(token_file: Option<&str>) -> session::Options {
        session::Options {
            api_url: "http://127.0.0.1:8000".to_string(),
            token_file: token_file.map(PathBuf::from),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_global_args_explicit_token_file() {
        let args = GlobalArgs::new(options(Some("/tmp/optika/session.json"))).unwrap();
        assert_eq!(args.token_file, PathBuf::from("/tmp/optika/session.json"));
        assert_eq!(args.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_global_args_default_token_file() {
        if let Ok(args) = GlobalArgs::new(options(None)) {
            assert!(args.token_file.ends_with("optika/session.json"));
        }
    }

    #[test]
    fn test_session_starts_on_route() {
        let args = GlobalArgs::new(options(Some("/tmp/optika-unused/session.json"))).unwrap();
        let session = args.session(Route::AdminLogs).unwrap();
        assert_eq!(session.navigator.current_path(), "/admin/logs");
        assert!(session.auth.snapshot().loading);
        assert_eq!(session.auth.client().base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_session_rejects_bad_url() {
        let mut args = GlobalArgs::new(options(Some("/tmp/optika-unused/session.json"))).unwrap();
        args.api_url = "not a url".to_string();
        assert!(args.session(Route::Home).is_err());
    }
}
