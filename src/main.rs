pub mod config;
pub mod controller;
pub mod protocol;
pub mod session;
pub mod transport;

use crate::config::Config;
use crate::controller::GilrsInput;
use crate::session::Session;
use crate::transport::UdpTransport;
use color_eyre::{eyre::eyre, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    // Config loading logs at INFO until the configured level is known
    let startup_logging = log_format(Level::INFO).finish();
    let config = tracing::subscriber::with_default(startup_logging, Config::load)
        .map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    setup_logging_env(config.log_level());
    info!("Starting padbridge with config: {:?}", config);

    let transport = UdpTransport::connect(&config.transport_settings())
        .await
        .map_err(|e| eyre!("Failed to open transport: {}", e))?;

    let input = GilrsInput::create(config.input_settings())
        .map_err(|e| eyre!("Failed to open gamepad input: {}", e))?;

    let session = Session::create(Box::new(input), transport, config.session_settings());
    let session = match session.handshake().await {
        Ok(session) => session,
        Err(e) => {
            error!("Handshake failed: {}", e);
            return Err(eyre!("Remote injection service is not ready: {}", e));
        }
    };

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    session
        .run(cancel)
        .await
        .map_err(|e| eyre!("Session aborted: {}", e))?;

    info!("Session closed");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

fn setup_logging_env(level: Level) {
    log_format(level).init();
}

fn log_format(level: Level) -> SubscriberBuilder {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn config_loading_is_logged_before_global_subscriber() {
        let path = std::env::temp_dir().join(format!("padbridge-{}.toml", std::process::id()));
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();

        let log = CapturedLog::default();
        let subscriber = log_format(Level::INFO)
            .with_ansi(false)
            .with_writer(log.clone())
            .finish();
        let config = tracing::subscriber::with_default(subscriber, || Config::from_file(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.unwrap().log_level(), Level::WARN);
        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Loading config from"), "{output}");
    }
}
