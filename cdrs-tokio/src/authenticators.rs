//! Pluggable SASL authentication. A `SaslAuthenticatorProvider` is cheap to clone/share (it's
//! stored on the node config and handed to every connection); it mints a fresh `SaslAuthenticator`
//! per connection since the SASL exchange itself is stateful.

use std::fmt::Debug;

use crate::error;

/// Drives one connection's AUTHENTICATE / AUTH_CHALLENGE / AUTH_SUCCESS exchange.
pub trait SaslAuthenticator: Debug + Send + Sync {
    /// Response to send immediately after the server's AUTHENTICATE.
    fn initial_response(&mut self) -> Vec<u8>;

    /// Response to an AUTH_CHALLENGE token.
    fn evaluate_challenge(&mut self, challenge: Vec<u8>) -> error::Result<Vec<u8>>;

    /// Called with the AUTH_SUCCESS token; an `Err` here fails the connection with `Error::Auth`.
    fn success(&mut self, _token: Vec<u8>) -> error::Result<()> {
        Ok(())
    }
}

/// Factory for `SaslAuthenticator`s, stored per node config.
pub trait SaslAuthenticatorProvider: Debug + Send + Sync {
    /// Authenticator class name to present to the server, if it asks. `None` accepts whatever
    /// the server's AUTHENTICATE body names.
    fn name(&self) -> Option<&str> {
        None
    }

    fn make_authenticator(&self) -> Box<dyn SaslAuthenticator>;
}

/// Used when the cluster has no authenticator configured; fails fast if the server disagrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneAuthenticatorProvider;

impl SaslAuthenticatorProvider for NoneAuthenticatorProvider {
    fn make_authenticator(&self) -> Box<dyn SaslAuthenticator> {
        Box::new(NoneAuthenticator)
    }
}

#[derive(Debug, Default)]
struct NoneAuthenticator;

impl SaslAuthenticator for NoneAuthenticator {
    fn initial_response(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn evaluate_challenge(&mut self, _challenge: Vec<u8>) -> error::Result<Vec<u8>> {
        Err(error::Error::Auth)
    }
}

/// `org.apache.cassandra.auth.PasswordAuthenticator`'s SASL PLAIN mechanism:
/// `\0<username>\0<password>`.
#[derive(Debug, Clone)]
pub struct StaticPasswordAuthenticatorProvider {
    username: String,
    password: String,
}

impl StaticPasswordAuthenticatorProvider {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        StaticPasswordAuthenticatorProvider {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl SaslAuthenticatorProvider for StaticPasswordAuthenticatorProvider {
    fn name(&self) -> Option<&str> {
        Some("org.apache.cassandra.auth.PasswordAuthenticator")
    }

    fn make_authenticator(&self) -> Box<dyn SaslAuthenticator> {
        Box::new(StaticPasswordAuthenticator {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug)]
struct StaticPasswordAuthenticator {
    username: String,
    password: String,
}

impl SaslAuthenticator for StaticPasswordAuthenticator {
    fn initial_response(&mut self) -> Vec<u8> {
        let mut token = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        token.push(0);
        token.extend_from_slice(self.username.as_bytes());
        token.push(0);
        token.extend_from_slice(self.password.as_bytes());
        token
    }

    fn evaluate_challenge(&mut self, _challenge: Vec<u8>) -> error::Result<Vec<u8>> {
        Err(error::Error::Auth)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_initial_response_layout() {
        let mut auth =
            StaticPasswordAuthenticatorProvider::new("alice", "secret").make_authenticator();
        let response = auth.initial_response();
        assert_eq!(response, b"\0alice\0secret");
    }
}
