use std::time::Duration;

use anyhow::{anyhow, Result};
use blob_store::BlobStorageConfig;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;

use crate::tenant::validate_tenant_id;

/// Prefix of environment variables overriding file configuration, e.g.
/// `TENANT_CATALOG_ADMIN_TENANT`.
const ENV_PREFIX: &str = "TENANT_CATALOG_";

#[serde_inline_default]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCatalogConfig {
    #[serde(default)]
    pub blob_storage: BlobStorageConfig,
    /// Tenant expanded to every known tenant. Wildcard resolution is
    /// disabled when unset.
    #[serde(default)]
    pub admin_tenant: Option<String>,
    /// How often the tenant population behind the admin tenant is reloaded.
    #[serde_inline_default(60u64)]
    pub tenants_refresh_interval_secs: u64,
    /// Discover tenants from `tenant.index.json` instead of listing the
    /// bucket.
    #[serde(default)]
    pub use_tenant_index: bool,
    /// Emit logs as JSON.
    #[serde(default)]
    pub structured_logging: bool,
}

impl Default for TenantCatalogConfig {
    fn default() -> Self {
        TenantCatalogConfig {
            blob_storage: Default::default(),
            admin_tenant: None,
            tenants_refresh_interval_secs: 60,
            use_tenant_index: false,
            structured_logging: false,
        }
    }
}

impl TenantCatalogConfig {
    pub fn from_path(path: &str) -> Result<TenantCatalogConfig> {
        let config: TenantCatalogConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tenants_refresh_interval_secs == 0 {
            return Err(anyhow!("tenants_refresh_interval_secs must be positive"));
        }
        if let Some(admin_tenant) = &self.admin_tenant {
            validate_tenant_id(admin_tenant)
                .map_err(|e| anyhow!("invalid admin tenant '{}': {}", admin_tenant, e))?;
        }
        Ok(())
    }

    pub fn tenants_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.tenants_refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_from_path_with_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
blob_storage:
  path: "s3://tsdb-blocks/prod"
admin_tenant: "__admin__"
"#,
            )?;

            let config = TenantCatalogConfig::from_path("config.yaml").expect("load config");
            assert_eq!(config.blob_storage.path, "s3://tsdb-blocks/prod");
            assert_eq!(config.admin_tenant.as_deref(), Some("__admin__"));
            assert_eq!(config.tenants_refresh_interval(), Duration::from_secs(60));
            assert!(!config.use_tenant_index);
            assert!(!config.structured_logging);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "tenants_refresh_interval_secs: 30\n")?;
            jail.set_env("TENANT_CATALOG_TENANTS_REFRESH_INTERVAL_SECS", "5");
            jail.set_env("TENANT_CATALOG_USE_TENANT_INDEX", "true");

            let config = TenantCatalogConfig::from_path("config.yaml").expect("load config");
            assert_eq!(config.tenants_refresh_interval_secs, 5);
            assert!(config.use_tenant_index);
            Ok(())
        });
    }

    #[test]
    fn test_validate() {
        let config = TenantCatalogConfig {
            tenants_refresh_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TenantCatalogConfig {
            admin_tenant: Some("../etc".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(TenantCatalogConfig::default().validate().is_ok());
    }
}
