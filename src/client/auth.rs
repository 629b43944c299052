use base64::Engine;
use eyre::Result;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

/// Elasticsearch authentication
#[derive(Clone)]
pub enum Auth {
    /// Use an API key authentication via headers
    Apikey(String),
    /// Use username and password authentication via Basic Auth headers
    Basic(String, String),
    /// Don't use any authentication
    None,
}

impl Auth {
    /// Pick an auth method from optional credentials; an API key wins over
    /// username and password, and a username without a password is ignored.
    pub fn new(username: Option<String>, password: Option<String>, apikey: Option<String>) -> Self {
        match (username, password, apikey) {
            (_, _, Some(apikey)) => Self::Apikey(apikey),
            (Some(username), Some(password), None) => Self::Basic(username, password),
            _ => Self::None,
        }
    }

    /// Default headers carrying the credentials
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        match self {
            Self::Basic(username, password) => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                let mut value = HeaderValue::from_str(&format!("Basic {}", credentials))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Self::Apikey(apikey) => {
                let mut value = HeaderValue::from_str(&format!("ApiKey {}", apikey))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Self::None => {}
        }
        Ok(headers)
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apikey(_) => write!(f, "Apikey"),
            Self::Basic(username, _) => write!(f, "Basic ({})", username),
            Self::None => write!(f, "None"),
        }
    }
}
