//! Deployment configuration for the token

use crate::error::{Error, Result};
use crate::logic::StandardLogic;
use crate::proxy::TokenProxy;
use crate::types::{AccountId, CallContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Token deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hard supply cap
    pub cap: u128,

    /// Account that owns the deployed token
    pub owner: String,

    /// Admin registry members seeded at deployment
    pub admins: Vec<String>,

    /// Autoblocker registry members seeded at deployment
    pub autoblockers: Vec<String>,

    /// Whitelist members seeded at deployment
    pub whitelist: Vec<String>,

    /// Whether the whitelist check starts bypassed
    pub whitelist_unlocked: bool,

    /// Whether the blacklist check starts bypassed
    pub blacklist_unlocked: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cap: 400_000_000,
            owner: "deployer".to_string(),
            admins: Vec::new(),
            autoblockers: Vec::new(),
            whitelist: Vec::new(),
            whitelist_unlocked: false,
            blacklist_unlocked: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(owner) = std::env::var("TOKEN_OWNER") {
            config.owner = owner;
        }

        if let Ok(cap) = std::env::var("TOKEN_CAP") {
            config.cap = cap
                .parse()
                .map_err(|e| Error::Config(format!("Invalid TOKEN_CAP: {}", e)))?;
        }

        Ok(config)
    }
}

/// Deploy a proxy with the standard logic unit and seed it from `config`
pub fn deploy(config: &Config) -> Result<TokenProxy> {
    let owner = AccountId::new(&config.owner);
    if owner.is_empty() {
        return Err(Error::EmptyAccount);
    }
    let ctx = CallContext::new(owner.clone());

    let mut proxy = TokenProxy::new(owner);
    let logic = proxy.register_logic(Arc::new(StandardLogic));
    proxy.initialize(&ctx, logic, config.cap)?;

    let admins: Vec<AccountId> = config.admins.iter().map(AccountId::new).collect();
    if !admins.is_empty() {
        proxy.add_list_to_admins(&ctx, &admins)?;
    }

    let autoblockers: Vec<AccountId> = config.autoblockers.iter().map(AccountId::new).collect();
    if !autoblockers.is_empty() {
        proxy.add_list_to_autoblockers(&ctx, &autoblockers)?;
    }

    let whitelist: Vec<AccountId> = config.whitelist.iter().map(AccountId::new).collect();
    if !whitelist.is_empty() {
        proxy.add_list_to_whitelist(&ctx, &whitelist)?;
    }

    if config.whitelist_unlocked {
        proxy.set_whitelist_unlock(&ctx, true)?;
    }
    if config.blacklist_unlocked {
        proxy.set_blacklist_unlock(&ctx, true)?;
    }

    info!(
        cap = config.cap,
        admins = admins.len(),
        whitelist = whitelist.len(),
        "token deployed"
    );
    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cap, 400_000_000);
        assert_eq!(config.owner, "deployer");
        assert!(!config.whitelist_unlocked);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
cap = 1000
owner = "alice"
admins = ["adm1", "adm2"]
autoblockers = []
whitelist = ["alice"]
whitelist_unlocked = false
blacklist_unlocked = true
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.cap, 1000);
        assert_eq!(config.admins.len(), 2);
        assert!(config.blacklist_unlocked);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cap = \"not a number\"").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_deploy_seeds_registries_and_flags() {
        let config = Config {
            cap: 5000,
            owner: "alice".to_string(),
            admins: vec!["adm".to_string()],
            autoblockers: vec!["blocker".to_string()],
            whitelist: vec!["alice".to_string(), "bob".to_string()],
            whitelist_unlocked: false,
            blacklist_unlocked: true,
        };

        let proxy = deploy(&config).unwrap();
        assert_eq!(proxy.cap(), 5000);
        assert_eq!(proxy.owner(), Some(&AccountId::new("alice")));
        assert!(proxy.is_admin(&AccountId::new("adm")));
        assert!(proxy.is_autoblocker(&AccountId::new("blocker")));
        assert!(proxy.is_whitelisted(&AccountId::new("bob")));
        assert!(!proxy.whitelist_unlocked());
        assert!(proxy.blacklist_unlocked());
    }

    #[test]
    fn test_deploy_rejects_empty_owner() {
        let config = Config {
            owner: String::new(),
            ..Config::default()
        };
        assert!(matches!(deploy(&config), Err(Error::EmptyAccount)));
    }
}
