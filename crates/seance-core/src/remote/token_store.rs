//! Bearer token storage in the OS keyring.

use crate::error::RemoteError;

const SERVICE: &str = "seance";
const TOKEN_KEY: &str = "access_token";

pub fn get() -> Result<Option<String>, RemoteError> {
    let entry = keyring::Entry::new(SERVICE, TOKEN_KEY)?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set(token: &str) -> Result<(), RemoteError> {
    let entry = keyring::Entry::new(SERVICE, TOKEN_KEY)?;
    entry.set_password(token)?;
    Ok(())
}

pub fn delete() -> Result<(), RemoteError> {
    let entry = keyring::Entry::new(SERVICE, TOKEN_KEY)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
