//! Web server command.

use console::style;

use crate::config::Config;

/// Port used when the bind address names only a host.
const DEFAULT_PORT: u16 = 4000;

/// Start the web server.
pub async fn cmd_serve(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let bind = parse_bind_address(bind.unwrap_or(&config.server.bind));

    println!(
        "{} Starting Ghostflow server at http://{}",
        style("→").cyan(),
        bind
    );
    println!("  Uploads: {}", config.server.upload_dir.display());
    println!("  Press Ctrl+C to stop");

    crate::server::serve(config, &bind).await
}

/// Normalize a bind address that can be:
/// - Just a port: "4000" -> 127.0.0.1:4000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:4000
/// - Host and port: "0.0.0.0:4000" -> 0.0.0.0:4000
fn parse_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }

    if let Some((host, port)) = bind.rsplit_once(':') {
        if port.parse::<u16>().is_ok() {
            return format!("{}:{}", host, port);
        }
    }

    format!("{}:{}", bind, DEFAULT_PORT)
}
