//! Environment-driven server configuration

use std::env;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub game: GameConfig,
    pub log_level: String,
}

/// Game tuning knobs
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Hard cap on room membership
    pub max_players: usize,
    /// Pause between a reveal and the next round
    pub reveal_duration_ms: u64,
    /// Age after which a room that never reached two players is swept
    pub lobby_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            game: GameConfig {
                max_players: env::var("MAX_PLAYERS")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .unwrap_or(8),
                reveal_duration_ms: env::var("REVEAL_DURATION_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .unwrap_or(10000),
                lobby_timeout_ms: env::var("LOBBY_TIMEOUT_MS")
                    .unwrap_or_else(|_| "900000".to_string())
                    .parse()
                    .unwrap_or(900000),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
