//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pump-timer")]
#[command(about = "Per-device motor countdown timers with external notification")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "PUMP_TIMER_PORT", default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "PUMP_TIMER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// URL that receives `{topic, data}` device updates; updates are only logged when unset
    #[arg(long, env = "PUMP_TIMER_NOTIFY_URL")]
    pub notify_url: Option<String>,

    /// Prefix of notification topics (`<namespace>/<key>`)
    #[arg(long, env = "PUMP_TIMER_TOPIC_NAMESPACE", default_value = "esp32")]
    pub topic_namespace: String,

    /// Timeout of one notification request, in seconds
    #[arg(long, env = "PUMP_TIMER_NOTIFY_TIMEOUT_SECS", default_value = "5")]
    pub notify_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments and environment
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["pump-timer"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.topic_namespace, "esp32");
        assert_eq!(config.notify_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "pump-timer",
            "-p",
            "8080",
            "--notify-url",
            "http://sink/rooms/submit",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.notify_url.as_deref(), Some("http://sink/rooms/submit"));
        assert_eq!(config.log_level(), "debug");
    }
}
