use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "petwalker";

/// Keychain entry name for the bearer token. A single token is stored per
/// machine account; there is no multi-profile support.
const TOKEN_KEY: &str = "access_token";

/// Durable storage for the bearer token.
///
/// The session manager is the only writer. Implementations must make `get`
/// return `Ok(None)` (not an error) when nothing has been stored, and
/// `delete` must be idempotent.
pub trait CredentialStore {
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, token: &str) -> Result<()>;
    fn delete(&self) -> Result<()>;
}

/// Token storage backed by the OS keychain via the keyring crate.
pub struct KeyringStore {
    entry: Entry,
}

impl KeyringStore {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_KEY)
            .context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn delete(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
