use anyhow::Context;
use haven_config::HavenConfig;
use haven_core::identity::Identity;
use haven_db::service::HavenService;
use haven_geo::OverpassClient;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: HavenService,
    pub config: HavenConfig,
    pub identity: Identity,
    pub geodata: OverpassClient,
}

impl AppContext {
    /// Resolve who is acting, then open the store and the geodata client.
    pub async fn init(config: HavenConfig, user_override: Option<&str>) -> anyhow::Result<Self> {
        super::warn_misnamed_env(&config);

        let identity = config.identity.resolve(user_override)?;
        let service = HavenService::new_local(&config.database.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;
        let geodata = OverpassClient::new(config.geodata.endpoints.clone(), config.geodata.timeout());

        tracing::debug!(user = %identity.user_id, db = %config.database.path, "context ready");
        Ok(Self {
            service,
            config,
            identity,
            geodata,
        })
    }

    /// The acting user's ID.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.identity.user_id
    }
}
