//! Resolution of the tenant(s) a request acts upon.
//!
//! The org ID of a request is carried in the `X-Scope-OrgID` header. A
//! [`SingleResolver`] accepts exactly one tenant, a [`MultiResolver`] accepts
//! several separated by `|`, and a [`StarResolver`] additionally expands a
//! configured admin tenant into every known tenant.

use anyhow::Result;
use async_trait::async_trait;
use hyper::HeaderMap;

mod resolver;
mod star;

pub use resolver::{MultiResolver, SingleResolver};
pub use star::StarResolver;

/// HTTP header carrying the org ID.
pub const ORG_ID_HEADER: &str = "X-Scope-OrgID";

/// Separator between tenants in a multi-tenant org ID.
pub const TENANT_IDS_SEPARATOR: char = '|';

pub const MAX_TENANT_ID_LENGTH: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("no org id")]
    NoTenant,

    #[error("multiple org IDs present")]
    TooManyTenants,

    #[error("invalid tenant ID")]
    InvalidTenantId,

    #[error("tenant ID '{tenant}' contains unsupported character '{character}' at position {pos}")]
    UnsupportedCharacter {
        tenant: String,
        character: char,
        pos: usize,
    },

    #[error("tenant ID is too long: max {} characters", MAX_TENANT_ID_LENGTH)]
    TooLong,
}

/// Per-request identity as seen by the resolvers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    org_id: Option<String>,
}

impl RequestContext {
    pub fn with_org_id(org_id: impl Into<String>) -> Self {
        Self {
            org_id: Some(org_id.into()),
        }
    }

    /// Build the context from request headers. A missing or non UTF-8 header
    /// leaves the org ID unset.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let org_id = headers
            .get(ORG_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self { org_id }
    }

    /// Raw org ID, failing with [`TenantError::NoTenant`] when it's absent
    /// or empty.
    pub fn org_id(&self) -> Result<&str, TenantError> {
        match self.org_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(TenantError::NoTenant),
        }
    }
}

pub trait Resolver: Send + Sync {
    /// Exactly one tenant ID. Fails with [`TenantError::NoTenant`] if the
    /// request has none and [`TenantError::TooManyTenants`] if it has more.
    fn tenant_id(&self, ctx: &RequestContext) -> Result<String, TenantError>;

    /// All tenant IDs of the request, sorted and deduplicated.
    fn tenant_ids(&self, ctx: &RequestContext) -> Result<Vec<String>, TenantError>;
}

/// Source of the full tenant population.
#[async_trait]
pub trait TenantsFetcher: Send + Sync {
    async fn fetch_all_tenants(&self) -> Result<Vec<String>>;
}

/// Resolve a single tenant from request headers.
pub fn tenant_id_from_headers(
    resolver: &dyn Resolver,
    headers: &HeaderMap,
) -> Result<(String, RequestContext), TenantError> {
    let ctx = RequestContext::from_headers(headers);
    let tenant = resolver.tenant_id(&ctx)?;
    Ok((tenant, ctx))
}

/// Whether `id` is `.`/`..` or contains a path separator, and so must never
/// be used to build a storage path.
pub fn contains_unsafe_path_segments(id: &str) -> bool {
    id == "." || id == ".." || id.contains(['/', '\\'])
}

/// Check that `id` can name a tenant directory in object storage.
pub fn validate_tenant_path(id: &str) -> Result<(), TenantError> {
    if id.is_empty() || contains_unsafe_path_segments(id) {
        return Err(TenantError::InvalidTenantId);
    }
    Ok(())
}

/// Validate a tenant ID for use in a multi-tenant org ID.
pub fn validate_tenant_id(id: &str) -> Result<(), TenantError> {
    if id.is_empty() {
        return Err(TenantError::InvalidTenantId);
    }
    if let Some((pos, character)) = id.char_indices().find(|(_, c)| !is_supported_char(*c)) {
        return Err(TenantError::UnsupportedCharacter {
            tenant: id.to_string(),
            character,
            pos,
        });
    }
    if id.len() > MAX_TENANT_ID_LENGTH {
        return Err(TenantError::TooLong);
    }
    if contains_unsafe_path_segments(id) {
        return Err(TenantError::InvalidTenantId);
    }
    Ok(())
}

fn is_supported_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '!' | '-' | '_' | '.' | '*' | '\'' | '(' | ')')
}

/// Sort and deduplicate tenant IDs.
pub fn normalize_tenant_ids(mut ids: Vec<String>) -> Vec<String> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use hyper::header::HeaderValue;

    use super::*;

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            RequestContext::from_headers(&headers).org_id(),
            Err(TenantError::NoTenant)
        );

        headers.insert(ORG_ID_HEADER, HeaderValue::from_static(""));
        assert_eq!(
            RequestContext::from_headers(&headers).org_id(),
            Err(TenantError::NoTenant)
        );

        headers.insert(ORG_ID_HEADER, HeaderValue::from_static("tenant-a|tenant-b"));
        assert_eq!(
            RequestContext::from_headers(&headers).org_id(),
            Ok("tenant-a|tenant-b")
        );
    }

    #[test]
    fn test_tenant_id_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ORG_ID_HEADER, HeaderValue::from_static("tenant-a"));

        let (tenant, ctx) = tenant_id_from_headers(&SingleResolver, &headers).unwrap();
        assert_eq!(tenant, "tenant-a");
        assert_eq!(ctx, RequestContext::with_org_id("tenant-a"));

        let err = tenant_id_from_headers(&SingleResolver, &HeaderMap::new()).unwrap_err();
        assert_eq!(err, TenantError::NoTenant);
    }

    #[test]
    fn test_unsafe_path_segments() {
        for id in [".", "..", "a/b", "a\\b", "/"] {
            assert!(contains_unsafe_path_segments(id), "{}", id);
        }
        for id in ["tenant", "...", ".a", "a.b"] {
            assert!(!contains_unsafe_path_segments(id), "{}", id);
        }
    }

    #[test]
    fn test_validate_tenant_path() {
        assert_eq!(validate_tenant_path("t*2"), Ok(()));
        assert_eq!(validate_tenant_path("a|b"), Ok(()));
        for id in ["", ".", "..", "a/b", "a\\b"] {
            assert_eq!(validate_tenant_path(id), Err(TenantError::InvalidTenantId), "{}", id);
        }
    }

    #[test]
    fn test_validate_tenant_id() {
        assert_eq!(validate_tenant_id("team-A_1.(prod)*!'"), Ok(()));
        assert_eq!(validate_tenant_id(""), Err(TenantError::InvalidTenantId));
        assert_eq!(validate_tenant_id(".."), Err(TenantError::InvalidTenantId));
        assert_eq!(
            validate_tenant_id("a b"),
            Err(TenantError::UnsupportedCharacter {
                tenant: "a b".to_string(),
                character: ' ',
                pos: 1,
            })
        );
        assert!(matches!(
            validate_tenant_id("a/b"),
            Err(TenantError::UnsupportedCharacter { pos: 1, .. })
        ));
        assert_eq!(
            validate_tenant_id(&"a".repeat(MAX_TENANT_ID_LENGTH + 1)),
            Err(TenantError::TooLong)
        );
        assert_eq!(validate_tenant_id(&"a".repeat(MAX_TENANT_ID_LENGTH)), Ok(()));
    }

    #[test]
    fn test_normalize_tenant_ids() {
        let ids = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(normalize_tenant_ids(ids), vec!["a", "b", "c"]);
    }
}
