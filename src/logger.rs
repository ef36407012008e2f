use crate::config::Config;
use crate::tls::CertificateMaterial;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    let scheme = if config.tls.enabled { "https" } else { "http" };
    println!("======================================");
    println!("devserve started successfully");
    println!("Serving {} on: {}://{}", config.serve.root, scheme, addr);
    println!("SPA fallback: {}", config.serve.spa);
    println!("CORS: {}", config.serve.cors);
    if let Some(workers) = config.server.workers {
        println!("Worker threads: {workers}");
    }
    println!("Using Tokio runtime for concurrency");
    println!("======================================\n");
}

pub fn log_certificate_ready(material: &CertificateMaterial, reused: bool) {
    let action = if reused { "Reusing" } else { "Generated" };
    println!(
        "[TLS] {} certificate: {}",
        action,
        material.certificate_path.display()
    );
    println!(
        "[TLS] Private key: {}",
        material.private_key_path.display()
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    println!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    println!("[Request] {method} {uri} {version:?}");
}

pub fn log_response(status: u16, size: usize) {
    println!("[Response] Sent {status} ({size} bytes)\n");
}

pub fn log_spa_fallback(path: &str) {
    println!("[SPA] {path} missed on disk, serving index document");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}
