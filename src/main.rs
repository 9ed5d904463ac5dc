use authgate::api;
use authgate::logger::*;
use authgate::server::*;
use authgate::settings::*;
use std::fs;
use std::sync::Arc;
use tokio::signal;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let tls = match (&project_settings.http.cert_path, &project_settings.http.key_path) {
        (Some(cert_path), Some(key_path)) => {
            for path in [cert_path, key_path] {
                if !fs::metadata(path)?.is_file() {
                    return Err(anyhow::anyhow!("TLS file is not a regular file: {:?}", path));
                }
            }
            Some((cert_path.clone(), key_path.clone()))
        }
        _ => None,
    };

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = api::v1::api(server.clone()).with(warp::trace::request());

    let shutdown = async {
        signal::ctrl_c().await.expect("Could not register SIGINT");
        info!("shutdown requested");
    };

    match tls {
        Some((cert_path, key_path)) => {
            let (bound, serving) = warp::serve(api_v1)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, shutdown);
            info!(%bound, "listening (tls)");
            serving.await;
        }
        None => {
            warn!("serving without TLS");
            let (bound, serving) = warp::serve(api_v1).bind_with_graceful_shutdown(address, shutdown);
            info!(%bound, "listening");
            serving.await;
        }
    }

    info!("server stopped");
    Ok(())
}
