use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::core::command_line_args::ServerConfig;
use crate::http::handle_request::{ExtguardState, handle_request_entry};
use crate::logging::syslog::{error, info, trace};

pub async fn bind_listener(bind_ip: &str, port: u16) -> Result<TcpListener, String> {
    let ip = bind_ip.parse::<IpAddr>().map_err(|e| format!("Invalid IP address for binding {}: {}", bind_ip, e))?;
    let addr = SocketAddr::new(ip, port);

    TcpListener::bind(addr).await.map_err(|e| format!("Failed to bind {}: {}", addr, e))
}

/// Accepts connections until the token is cancelled. Connections already
/// being served finish on their own tasks.
pub async fn serve(listener: TcpListener, state: Arc<ExtguardState>, cancellation_token: CancellationToken) {
    let local_addr = listener.local_addr().map(|a| a.to_string()).unwrap_or_else(|_| "<unknown>".to_string());
    trace(format!("Listening on {}", local_addr));

    loop {
        select! {
            _ = cancellation_token.cancelled() => {
                trace(format!("Termination signal received, stopping server on {}", local_addr));
                return;
            },
            result = listener.accept() => {
                match result {
                    Ok((tcp_stream, remote_addr)) => {
                        let remote_ip = remote_addr.ip().to_string();
                        let io = TokioIo::new(tcp_stream);

                        tokio::task::spawn({
                            let state = state.clone();
                            let cancellation_token = cancellation_token.clone();
                            async move {
                                let svc = service_fn(move |req| handle_request_entry(req, state.clone(), remote_ip.clone(), cancellation_token.clone()));
                                if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                                    trace(format!("Error serving connection: {:?}", err));
                                }
                            }
                        });
                    }
                    Err(err) => {
                        error(format!("Failed to accept connection: {:?}", err));
                    }
                }
            }
        };
    }
}

pub async fn start_server(config: &ServerConfig, state: Arc<ExtguardState>, cancellation_token: CancellationToken) -> Result<(), String> {
    let listener = bind_listener(&config.bind_ip, config.port).await?;
    info(format!("Starting extguard server on {}:{}", config.bind_ip, config.port));

    serve(listener, state, cancellation_token).await;
    Ok(())
}
