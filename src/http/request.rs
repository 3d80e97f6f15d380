use std::fmt;

use serde_json::Value;

/// HTTP method for a request. Defaults to `Get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

/// A primitive query-parameter value, stringified before it is appended to
/// the URL.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Everything describing one logical request: method, query parameters,
/// optional JSON body, optional header overrides. Immutable once built; the
/// same descriptor backs every retry of the call.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub method: HttpMethod,
    pub query: Vec<(String, QueryValue)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    pub fn put() -> Self {
        Self::new(HttpMethod::Put)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header override; replaces the default of the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
