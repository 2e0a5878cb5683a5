use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Runtime configuration, sourced from the environment (with `.env`
/// support via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|h| match h.parse::<IpAddr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!("invalid HOST value {h:?}, falling back to 127.0.0.1");
                    None
                }
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:case_service.db?mode=rwc".to_string());

        Self {
            bind_addr: SocketAddr::new(host, port),
            database_url,
        }
    }
}
