use super::{
    normalize_tenant_ids,
    validate_tenant_id,
    validate_tenant_path,
    RequestContext,
    Resolver,
    TenantError,
    TENANT_IDS_SEPARATOR,
};

/// Restricts every request to a single tenant. Any character is accepted
/// except for the path-unsafe forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleResolver;

impl Resolver for SingleResolver {
    fn tenant_id(&self, ctx: &RequestContext) -> Result<String, TenantError> {
        let id = ctx.org_id()?;
        validate_tenant_path(id)?;
        Ok(id.to_string())
    }

    fn tenant_ids(&self, ctx: &RequestContext) -> Result<Vec<String>, TenantError> {
        Ok(vec![self.tenant_id(ctx)?])
    }
}

/// Allows requests to name several tenants separated by `|`. Each tenant is
/// held to the restricted character set of [`validate_tenant_id`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiResolver;

impl Resolver for MultiResolver {
    fn tenant_id(&self, ctx: &RequestContext) -> Result<String, TenantError> {
        let mut ids = self.tenant_ids(ctx)?;
        if ids.len() > 1 {
            return Err(TenantError::TooManyTenants);
        }
        ids.pop().ok_or(TenantError::NoTenant)
    }

    fn tenant_ids(&self, ctx: &RequestContext) -> Result<Vec<String>, TenantError> {
        let org_id = ctx.org_id()?;
        let ids = org_id
            .split(TENANT_IDS_SEPARATOR)
            .map(|id| validate_tenant_id(id).map(|_| id.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(normalize_tenant_ids(ids))
    }
}
