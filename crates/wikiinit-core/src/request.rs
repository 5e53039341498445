//! Synthetic request types
//!
//! A `SyntheticRequest` is the fabricated first request used to bootstrap a
//! wiki's runtime without an actual inbound network request. It is built once
//! per initialization attempt through `SyntheticRequestBuilder` and never
//! mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Ordered mapping of a name to a list of values (parameters, headers)
pub type MultiValueMap = IndexMap<String, Vec<String>>;

/// Action the synthetic request is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    /// Default landing view
    #[default]
    View,
    /// First-run distribution wizard
    Distribution,
}

impl RequestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Distribution => "distribution",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Immutable synthetic request descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticRequest {
    action: RequestAction,
    url: Option<Url>,
    context_path: String,
    parameters: MultiValueMap,
    headers: MultiValueMap,
    cookies: Vec<Cookie>,
    remote_addr: Option<String>,
}

impl SyntheticRequest {
    pub fn builder() -> SyntheticRequestBuilder {
        SyntheticRequestBuilder::default()
    }

    pub fn action(&self) -> RequestAction {
        self.action
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn parameters(&self) -> &MultiValueMap {
        &self.parameters
    }

    /// Values of a parameter, if present
    pub fn parameter(&self, name: &str) -> Option<&[String]> {
        self.parameters.get(name).map(Vec::as_slice)
    }

    pub fn headers(&self) -> &MultiValueMap {
        &self.headers
    }

    /// Values of a header; header names compare case-insensitively
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }
}

/// Builder for `SyntheticRequest`
#[derive(Debug, Clone, Default)]
pub struct SyntheticRequestBuilder {
    action: RequestAction,
    url: Option<Url>,
    context_path: String,
    parameters: MultiValueMap,
    headers: MultiValueMap,
    cookies: Vec<Cookie>,
    remote_addr: Option<String>,
}

impl SyntheticRequestBuilder {
    pub fn action(mut self, action: RequestAction) -> Self {
        self.action = action;
        self
    }

    pub fn url(mut self, url: Option<Url>) -> Self {
        self.url = url;
        self
    }

    pub fn context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    pub fn parameters(mut self, parameters: MultiValueMap) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn headers(mut self, headers: MultiValueMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn remote_addr(mut self, remote_addr: Option<String>) -> Self {
        self.remote_addr = remote_addr;
        self
    }

    pub fn build(self) -> SyntheticRequest {
        SyntheticRequest {
            action: self.action,
            url: self.url,
            context_path: self.context_path,
            parameters: self.parameters,
            headers: self.headers,
            cookies: self.cookies,
            remote_addr: self.remote_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = SyntheticRequest::builder().build();
        assert_eq!(request.action(), RequestAction::View);
        assert!(request.url().is_none());
        assert_eq!(request.context_path(), "");
        assert!(request.parameters().is_empty());
        assert!(request.cookies().is_empty());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = MultiValueMap::new();
        headers.insert(
            "X-Forwarded-Host".to_string(),
            vec!["wiki.example.org".to_string()],
        );

        let request = SyntheticRequest::builder().headers(headers).build();
        assert_eq!(
            request.header("x-forwarded-host"),
            Some(&["wiki.example.org".to_string()][..])
        );
        assert!(request.header("host").is_none());
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&RequestAction::Distribution).unwrap();
        assert_eq!(json, "\"distribution\"");
        assert_eq!(RequestAction::View.to_string(), "view");
    }
}
