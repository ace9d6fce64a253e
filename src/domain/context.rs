use serde::{Deserialize, Serialize};
use std::fmt;

/// Shop credentials sent with every call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCredentials {
    pub shop_id: String,
    pub shop_password: String,
    pub shop_name: Option<String>,
}

impl ShopCredentials {
    pub fn new(
        shop_id: impl Into<String>,
        shop_password: impl Into<String>,
        shop_name: Option<String>,
    ) -> Self {
        Self {
            shop_id: shop_id.into(),
            shop_password: shop_password.into(),
            shop_name,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ShopCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopCredentials")
            .field("shop_id", &self.shop_id)
            .field("shop_password", &"***")
            .field("shop_name", &self.shop_name)
            .finish()
    }
}

/// Test-environment shop. When configured, calls are redirected to the
/// sandbox endpoint with these credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxShop(pub ShopCredentials);

impl SandboxShop {
    pub fn new(
        shop_id: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self(ShopCredentials::new(shop_id, password, Some(name.into())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    #[default]
    Production,
    Sandbox,
}

impl Endpoint {
    pub fn base_url(&self) -> &'static str {
        match self {
            Endpoint::Production => "https://p01.mul-pay.jp/payment/",
            Endpoint::Sandbox => "https://pt01.mul-pay.jp/payment/",
        }
    }
}

/// Endpoint selection plus the shop to act as, built once per operation
/// and handed by value to every call of that operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub endpoint: Endpoint,
    pub shop: ShopCredentials,
}

impl CallContext {
    pub fn production(shop: ShopCredentials) -> Self {
        Self {
            endpoint: Endpoint::Production,
            shop,
        }
    }

    pub fn sandbox(sandbox: SandboxShop) -> Self {
        Self {
            endpoint: Endpoint::Sandbox,
            shop: sandbox.0,
        }
    }

    /// Production context unless a sandbox shop overrides it.
    pub fn resolve(shop: &ShopCredentials, sandbox: Option<&SandboxShop>) -> Self {
        match sandbox {
            Some(sandbox) => Self::sandbox(sandbox.clone()),
            None => Self::production(shop.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_overrides_production() {
        let shop = ShopCredentials::new("prod", "prod-pass", None);
        let sandbox = SandboxShop::new("tshop", "tpass", "Test Shop");

        let ctx = CallContext::resolve(&shop, Some(&sandbox));
        assert_eq!(ctx.endpoint, Endpoint::Sandbox);
        assert_eq!(ctx.shop.shop_id, "tshop");
        assert_eq!(ctx.shop.shop_name.as_deref(), Some("Test Shop"));

        let ctx = CallContext::resolve(&shop, None);
        assert_eq!(ctx.endpoint, Endpoint::Production);
        assert_eq!(ctx.shop, shop);
    }

    #[test]
    fn test_debug_hides_password() {
        let shop = ShopCredentials::new("prod", "secret", None);
        let rendered = format!("{:?}", shop);
        assert!(rendered.contains("prod"));
        assert!(!rendered.contains("secret"));
    }
}
