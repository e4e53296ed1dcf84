//! Logical request descriptors handed to the dispatcher.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Query parameter carrying the credential; injected by the dispatcher and
/// never part of a cache key.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Read,
    Write,
}

/// Which remote service a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// Profile, media, insights and publishing.
    Resource,
    /// Conversations and direct messages.
    Messaging,
}

impl Host {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Messaging => "messaging",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Cacheable,
    NotCacheable,
}

/// How eagerly remote errors are escalated to the advanced-access category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMatch {
    /// Code 2, "unavailable" or "temporarily".
    #[default]
    Standard,
    /// Additionally "permission" or "access"; used for sending messages.
    Broad,
}

/// Immutable description of one logical remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    host: Host,
    segments: Vec<String>,
    path: String,
    params: BTreeMap<String, String>,
    body: Option<serde_json::Value>,
    cache: CachePolicy,
    permission_match: PermissionMatch,
}

impl ApiRequest {
    /// A cacheable read of the node or edge named by `segments`.
    ///
    /// Each segment is one path component; identifiers are never split or
    /// interpreted, so `/`, `?` or `#` inside an id stay inside that segment.
    #[must_use]
    pub fn read<I, S>(host: Host, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::Read, host, segments, None, CachePolicy::Cacheable)
    }

    /// A write with an optional JSON body; never cached.
    #[must_use]
    pub fn write<I, S>(host: Host, segments: I, body: Option<serde_json::Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::Write, host, segments, body, CachePolicy::NotCacheable)
    }

    fn new<I, S>(
        method: Method,
        host: Host,
        segments: I,
        body: Option<serde_json::Value>,
        cache: CachePolicy,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let path = segments
            .iter()
            .map(|segment| {
                form_urlencoded::byte_serialize(segment.as_bytes()).collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/");
        Self {
            method,
            host,
            segments,
            path,
            params: BTreeMap::new(),
            body,
            cache,
            permission_match: PermissionMatch::Standard,
        }
    }

    /// Add a query parameter. The credential cannot be set this way.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key != ACCESS_TOKEN_PARAM {
            self.params.insert(key, value.into());
        }
        self
    }

    #[must_use]
    pub fn uncached(mut self) -> Self {
        self.cache = CachePolicy::NotCacheable;
        self
    }

    #[must_use]
    pub fn with_permission_match(mut self, permission_match: PermissionMatch) -> Self {
        self.permission_match = permission_match;
        self
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn host(&self) -> Host {
        self.host
    }

    /// Segments joined with `/`, each one percent-encoded.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw path components, unencoded.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn permission_match(&self) -> PermissionMatch {
        self.permission_match
    }

    /// Only reads opt into caching.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::Read && self.cache == CachePolicy::Cacheable
    }

    /// `path?k1=v1&k2=v2` over the parameters in key order, URL-encoded.
    ///
    /// Stable under insertion order and free of the credential.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(
                self.params
                    .iter()
                    .filter(|(key, _)| key.as_str() != ACCESS_TOKEN_PARAM),
            )
            .finish();
        format!("{}?{query}", self.path)
    }
}
