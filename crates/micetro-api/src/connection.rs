use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Where the suite lives and who to authenticate as.
///
/// Immutable once built. Every request re-sends these credentials as HTTP
/// Basic auth; no session state is kept. `Debug` redacts the password.
#[derive(Debug, Clone)]
pub struct Connection {
    base_url: Url,
    username: String,
    password: SecretString,
}

impl Connection {
    /// Validate `base_url` (e.g. `https://micetro.example.net`) and build a
    /// descriptor.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim())?;
        Ok(Self {
            base_url,
            username: username.into(),
            password,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_password() {
        let conn = Connection::new(
            "https://micetro.example.net",
            "apiuser",
            SecretString::from("hunter2".to_string()),
        )
        .expect("valid connection");

        let rendered = format!("{conn:?}");
        assert!(rendered.contains("apiuser"));
        assert!(!rendered.contains("hunter2"), "{rendered}");
    }

    #[test]
    fn rejects_urls_without_scheme() {
        let err = Connection::new(
            "micetro.example.net",
            "apiuser",
            SecretString::from(String::new()),
        )
        .expect_err("missing scheme");
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
