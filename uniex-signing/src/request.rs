use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

/// Http method of an endpoint or in-flight request.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "patch")]
    Patch,
    #[serde(alias = "delete")]
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Idempotent methods are safe to retry on transient failures.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Put | Method::Delete)
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Get
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Internal signing input: an un-authenticated request about to be signed.
///
/// `params` is ordered by key so that query-string signing patterns are deterministic.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct Request {
    pub method: Method,
    /// Resource path relative to the exchange API base url, eg/ `/api/v3/order`.
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Serialised request body, where the endpoint carries one.
    #[serde(default)]
    pub body: Option<String>,
}

impl Request {
    pub fn new<S>(method: Method, path: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body<S>(mut self, body: S) -> Self
    where
        S: Into<String>,
    {
        self.body = Some(body.into());
        self
    }

    /// Canonical `key=value&..` query string over the ordered params.
    pub fn query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(&self.params)
    }

    /// Path with the query string appended, or the bare path when there are no params.
    pub fn path_with_query(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let query = self.query_string()?;
        if query.is_empty() {
            Ok(self.path.clone())
        } else {
            Ok(format!("{}?{}", self.path, query))
        }
    }
}

/// Output of a signing pattern: ready to hand to the HTTP collaborator.
///
/// `url` is still relative to the API base url; the facade joins the base on dispatch.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SignedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_deserialize_both_cases() {
        assert_eq!(serde_json::from_str::<Method>(r#""GET""#).unwrap(), Method::Get);
        assert_eq!(serde_json::from_str::<Method>(r#""post""#).unwrap(), Method::Post);
    }

    #[test]
    fn test_query_string_is_key_sorted() {
        let request = Request::new(Method::Get, "/api/v3/ticker")
            .with_param("symbol", "BTCUSDT")
            .with_param("limit", "10");
        assert_eq!(request.query_string().unwrap(), "limit=10&symbol=BTCUSDT");
    }

    #[test]
    fn test_path_with_query() {
        let bare = Request::new(Method::Get, "/time");
        assert_eq!(bare.path_with_query().unwrap(), "/time");

        let with_params = bare.with_param("a", "1");
        assert_eq!(with_params.path_with_query().unwrap(), "/time?a=1");
    }
}
