//! Who the diary belongs to, which decides where entries live.

use crate::config::RemoteConfig;

/// The current user, as far as the diary core is concerned.
///
/// Guests keep their diary in local storage only. Authenticated users talk
/// to the remote API with a bearer key; obtaining that key is outside this
/// crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Guest,
    Authenticated { server_url: String, api_key: String },
}

impl Identity {
    /// Authenticated when the remote section has both a server URL and a key.
    pub fn from_config(remote: &RemoteConfig) -> Self {
        match (&remote.server_url, &remote.api_key) {
            (Some(server_url), Some(api_key)) => Identity::Authenticated {
                server_url: server_url.clone(),
                api_key: api_key.clone(),
            },
            _ => Identity::Guest,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }
}
