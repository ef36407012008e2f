use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use socket2::{Domain, Protocol, Socket, Type};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

mod config;
mod handler;
mod http;
mod logger;
mod tls;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // Certificate provisioning is a one-shot, blocking step that completes
    // strictly before the listening socket opens. Any failure here is fatal.
    let acceptor = if cfg.tls.enabled {
        let material = tls::ensure_certificate(&cfg.tls)?;
        Some(TlsAcceptor::from(tls::load_server_config(&material)?))
    } else {
        None
    };

    let listener = create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg));
    logger::log_server_start(&addr, &cfg);

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                if state.cached_access_log.load(Ordering::Relaxed) {
                    logger::log_connection_accepted(&peer_addr);
                }
                match &acceptor {
                    Some(acceptor) => {
                        handle_tls_connection(stream, acceptor.clone(), Arc::clone(&state));
                    }
                    None => handle_connection(stream, Arc::clone(&state)),
                }
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}

/// Serve one TLS connection in a spawned task.
///
/// The TLS profile speaks HTTP/1.1 and HTTP/2 via ALPN and bounds the time
/// spent reading request headers; the whole connection additionally runs
/// under the read/write timeout.
fn handle_tls_connection(stream: TcpStream, acceptor: TlsAcceptor, state: Arc<config::AppState>) {
    tokio::spawn(async move {
        let timeout_duration = connection_timeout(&state);
        let header_read_timeout =
            std::time::Duration::from_secs(state.config.performance.header_read_timeout);
        let keep_alive = state.config.performance.keep_alive_timeout > 0;

        let tls_stream = match acceptor.accept(stream).await {
            Ok(s) => s,
            Err(e) => {
                logger::log_connection_error(&e);
                return;
            }
        };
        let io = TokioIo::new(tls_stream);

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .keep_alive(keep_alive)
            .header_read_timeout(header_read_timeout);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state_clone = Arc::clone(&state);
                async move { handler::handle_request(req, state_clone).await }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection timeout after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }
    });
}

/// Serve one plain HTTP connection in a spawned task.
fn handle_connection(stream: TcpStream, state: Arc<config::AppState>) {
    tokio::spawn(async move {
        let timeout_duration = connection_timeout(&state);
        let keep_alive = state.config.performance.keep_alive_timeout > 0;
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state_clone = Arc::clone(&state);
                async move { handler::handle_request(req, state_clone).await }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection timeout after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }
    });
}

fn connection_timeout(state: &config::AppState) -> std::time::Duration {
    std::time::Duration::from_secs(std::cmp::max(
        state.config.performance.read_timeout,
        state.config.performance.write_timeout,
    ))
}

/// Create a `TcpListener` with SO_REUSEPORT and SO_REUSEADDR enabled.
///
/// Dev servers get restarted constantly; reuse avoids bind failures against
/// sockets lingering in TIME_WAIT.
fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;

    // Non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
