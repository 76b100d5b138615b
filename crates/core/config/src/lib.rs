#[macro_use]
extern crate log;

use std::time::Duration;

use cached::proc_macro::cached;
use config::{Config, Environment, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Dashboard.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Dashboard.toml").exists() {
            builder = builder.add_source(File::new("Dashboard.toml", FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        builder.build().expect("valid Dashboard.toml")
    })
});

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Coalescer {
    pub grace_window_ms: u64,
    pub max_concurrent: usize,
}

impl Coalescer {
    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    /// Zero means no limit
    pub fn max_concurrent(&self) -> Option<usize> {
        (self.max_concurrent > 0).then_some(self.max_concurrent)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_sort_field: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transport {
    pub entitlement_status: u16,
    pub entitlement_code: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub coalescer: Coalescer,
    pub pagination: Pagination,
    pub transport: Transport,
}

impl Settings {
    /// Settings from the bundled defaults only, ignoring local overrides
    pub fn defaults() -> Settings {
        Config::builder()
            .add_source(File::from_str(
                include_str!("../Dashboard.toml"),
                FileFormat::Toml,
            ))
            .build()
            .and_then(|config| config.try_deserialize::<Settings>())
            .expect("bundled Dashboard.toml is valid")
    }
}

pub async fn init() {
    info!("Dashboard configuration: {:?}", config().await);
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read()
        .await
        .try_deserialize::<Settings>()
        .expect("Dashboard configuration matches Settings")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{config, Settings};

    #[test]
    fn bundled_defaults() {
        let settings = Settings::defaults();

        assert_eq!(settings.coalescer.grace_window(), Duration::from_millis(50));
        assert_eq!(settings.coalescer.max_concurrent(), Some(100));
        assert_eq!(settings.pagination.default_page_size, 20);
        assert_eq!(settings.pagination.max_page_size, 100);
        assert_eq!(settings.pagination.default_sort_field, "created_at");
        assert_eq!(settings.transport.entitlement_status, 403);
        assert_eq!(settings.transport.entitlement_code, "PremiumRequired");
    }

    #[test]
    fn zero_disables_concurrency_limit() {
        let mut settings = Settings::defaults();
        settings.coalescer.max_concurrent = 0;

        assert_eq!(settings.coalescer.max_concurrent(), None);
    }

    #[tokio::test]
    async fn it_works() {
        let settings = config().await;
        assert!(settings.pagination.max_page_size >= settings.pagination.default_page_size);
    }
}
