use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration read from environment variables.
///
/// `HOST`, `PORT`, `DEVICE`, `MODEL_PATH` and `VOICES_DIR` are all optional;
/// missing values fall back to the defaults the containers ship with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub device: Option<String>,
    pub model_path: PathBuf,
    pub voices_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env(default_port: u16, default_model_path: &str, default_voices_dir: &str) -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| default_port.to_string())
            .parse()
            .expect("PORT must be a number");
        let device = std::env::var("DEVICE").ok().filter(|d| !d.is_empty());
        let model_path = std::env::var("MODEL_PATH")
            .unwrap_or_else(|_| default_model_path.to_string())
            .into();
        let voices_dir = std::env::var("VOICES_DIR")
            .unwrap_or_else(|_| default_voices_dir.to_string())
            .into();

        Self {
            host,
            port,
            device,
            model_path,
            voices_dir,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid address")
    }
}
