// src/http/server.rs

//! Minimal blocking host that serves registered bundles over HTTP.

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

use crate::http::ResponseDescriptor;
use crate::service::BundleService;

/// Listener bound and ready; call [`BoundServer::run`] to start answering.
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    workers: usize,
}

/// Stops a running [`BoundServer`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<Server>,
    workers: usize,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        info!("http server shutting down");
        for _ in 0..self.workers {
            self.server.unblock();
        }
    }
}

/// Bind the HTTP listener without starting the request loop.
pub fn bind(addr: SocketAddr, workers: usize) -> Result<BoundServer> {
    let server = Server::http(addr).map_err(|e| anyhow!("binding {addr}: {e}"))?;
    let addr = server.server_addr().to_ip().unwrap_or(addr);
    Ok(BoundServer {
        server: Arc::new(server),
        addr,
        workers: workers.max(1),
    })
}

impl BoundServer {
    /// Actual bound address (resolves port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
            workers: self.workers,
        }
    }

    /// Answer requests from `workers` threads until shut down. Blocks.
    pub fn run(self, service: Arc<BundleService>, root: PathBuf) -> Result<()> {
        info!(addr = %self.addr, workers = self.workers, root = ?root, "serving bundles");

        let root = Arc::new(root);
        let handles: Vec<_> = (0..self.workers)
            .map(|i| {
                let server = Arc::clone(&self.server);
                let service = Arc::clone(&service);
                let root = Arc::clone(&root);
                std::thread::Builder::new()
                    .name(format!("bundlekit-http-{i}"))
                    .spawn(move || worker_loop(&server, &service, &root))
            })
            .collect::<std::io::Result<_>>()?;

        for handle in handles {
            if handle.join().is_err() {
                warn!("http worker panicked");
            }
        }
        Ok(())
    }
}

fn worker_loop(server: &Server, service: &BundleService, root: &Path) {
    loop {
        match server.recv() {
            Ok(request) => {
                if let Err(e) = handle_request(request, service, root) {
                    warn!(error = %e, "failed to answer request");
                }
            }
            Err(e) => {
                debug!(error = %e, "http listener closed");
                return;
            }
        }
    }
}

fn handle_request(request: Request, service: &BundleService, root: &Path) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return send_plain(request, 405, "Method Not Allowed");
    }

    let path = request_path(request.url()).to_string();
    let if_none_match = header_value(&request, "If-None-Match");

    match service.handle(&path, if_none_match.as_deref(), root) {
        Ok(Some(descriptor)) => {
            debug!(path = %path, status = descriptor.status, "bundle request");
            send_descriptor(request, descriptor)
        }
        Ok(None) => send_plain(request, 404, "Not Found"),
        Err(e) => {
            // Build failures are logged, never echoed to the client.
            error!(path = %path, error = %e, "bundle build failed");
            send_plain(request, 500, "Internal Server Error")
        }
    }
}

/// Path portion of a request target, without query or fragment.
pub fn request_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| anyhow!("invalid header {name}: {value}"))
}

fn send_descriptor(request: Request, descriptor: ResponseDescriptor) -> Result<()> {
    let mut headers = Vec::with_capacity(descriptor.headers.len() + 1);
    for (name, value) in &descriptor.headers {
        headers.push(header(name, value)?);
    }
    if let Some(content_type) = &descriptor.content_type {
        headers.push(header("Content-Type", content_type)?);
    }

    let len = descriptor.body.len();
    let response = Response::new(
        StatusCode(descriptor.status),
        headers,
        Cursor::new(descriptor.body),
        Some(len),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn send_plain(request: Request, status: u16, body: &str) -> Result<()> {
    let response = Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", "text/plain; charset=utf-8")?);
    request.respond(response)?;
    Ok(())
}
