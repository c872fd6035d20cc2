use tracing::Level;

pub const LOG_ENV: &str = "OPS_CONSOLE_LOG";

pub fn parse_level(value: Option<&str>) -> Level {
    value
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Installs the fmt subscriber on native builds. The web launcher brings its own.
#[cfg(not(target_arch = "wasm32"))]
pub fn init() {
    let level = parse_level(std::env::var(LOG_ENV).ok().as_deref());
    if tracing_subscriber::fmt().with_max_level(level).with_target(false).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(target_arch = "wasm32")]
pub fn init() {}
