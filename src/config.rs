use ::envconfig::Envconfig;

/// Store configuration, read from the environment once at process start.
#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL", default = "sqlite:echoes.db?mode=rwc")]
    pub database_url: String,

    #[envconfig(from = "DATABASE_MAX_CONNECTIONS", default = "5")]
    pub database_max_connections: u32,
}
