//! Input resolution for the address bar
//!
//! 1. Input with an explicit scheme → navigate as-is
//! 2. Contains a `.` and no whitespace → `https://` + input
//! 3. Anything else → search with the configured provider

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NavigationError;

/// Schemes that never carry an authority (`//`) but are still explicit.
const OPAQUE_SCHEMES: &[&str] = &["about", "data", "mailto", "blob", "view-source", "javascript"];

/// Result of resolving address bar input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResolution {
    /// Navigate to a URL
    Navigate(String),
    /// Search query url built from the provider template
    Search(String),
}

impl InputResolution {
    pub fn url(&self) -> &str {
        match self {
            InputResolution::Navigate(url) | InputResolution::Search(url) => url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            InputResolution::Navigate(url) | InputResolution::Search(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SearchProvider {
    #[default]
    Ecosia,
    Google,
    DuckDuckGo,
    /// Url template with `%s` standing in for the encoded query
    Custom(String),
}

impl SearchProvider {
    pub fn template(&self) -> &str {
        match self {
            SearchProvider::Ecosia => "https://www.ecosia.org/search?q=%s",
            SearchProvider::Google => "https://www.google.com/search?q=%s",
            SearchProvider::DuckDuckGo => "https://duckduckgo.com/?q=%s",
            SearchProvider::Custom(template) => template,
        }
    }

    pub fn query_url(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        self.template().replace("%s", &encoded)
    }

    pub fn display_name(&self) -> &str {
        match self {
            SearchProvider::Ecosia => "Ecosia",
            SearchProvider::Google => "Google",
            SearchProvider::DuckDuckGo => "DuckDuckGo",
            SearchProvider::Custom(_) => "Custom",
        }
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchProvider::Ecosia => f.write_str("ecosia"),
            SearchProvider::Google => f.write_str("google"),
            SearchProvider::DuckDuckGo => f.write_str("duckduckgo"),
            SearchProvider::Custom(template) => f.write_str(template),
        }
    }
}

impl FromStr for SearchProvider {
    type Err = NavigationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "ecosia" => Ok(SearchProvider::Ecosia),
            "google" => Ok(SearchProvider::Google),
            "duckduckgo" | "ddg" => Ok(SearchProvider::DuckDuckGo),
            _ if s.contains("%s") && has_explicit_scheme(s) => {
                Ok(SearchProvider::Custom(s.to_string()))
            }
            _ => Err(NavigationError::UnknownSearchEngine(s.to_string())),
        }
    }
}

impl TryFrom<String> for SearchProvider {
    type Error = NavigationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SearchProvider> for String {
    fn from(provider: SearchProvider) -> Self {
        provider.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputResolver {
    provider: SearchProvider,
}

impl InputResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_provider(provider: SearchProvider) -> Self {
        Self { provider }
    }

    pub fn set_search_provider(&mut self, provider: SearchProvider) {
        self.provider = provider;
    }

    pub fn search_provider(&self) -> &SearchProvider {
        &self.provider
    }

    /// Resolve user input. Returns `None` for blank input.
    pub fn resolve(&self, input: &str) -> Option<InputResolution> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if has_explicit_scheme(input) {
            return Some(InputResolution::Navigate(input.to_string()));
        }

        if input.contains('.') && !input.chars().any(char::is_whitespace) {
            return Some(InputResolution::Navigate(format!("https://{}", input)));
        }

        Some(InputResolution::Search(self.provider.query_url(input)))
    }
}

/// `scheme://...` for any syntactically valid scheme, or `scheme:...` for
/// the opaque schemes a browser accepts without an authority.
///
/// `example.com:8080` is deliberately not treated as having a scheme.
fn has_explicit_scheme(input: &str) -> bool {
    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    };
    if !valid {
        return false;
    }

    rest.starts_with("//") || OPAQUE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
}
