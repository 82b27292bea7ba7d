// ABOUTME: Static file server for the slide-deck application
// ABOUTME: Serves a deck's assets on a local port for the browser, confined to the asset root

use log::{debug, error, info};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Request, Response, Server, StatusCode};

use crate::errors::{DeckError, Result};

/// Page served for `/`
pub const INDEX_FILE: &str = "index.html";

/// Content type for a file, by extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Map a request target onto a path below `root`.
///
/// The query string is dropped, the path is percent-decoded and `..` segments
/// are resolved lexically; they can pop at most back to the root, never above
/// it. Returns `None` when the target cannot be decoded.
pub fn resolve_asset_path(root: &Path, target: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or("/");
    let decoded = urlencoding::decode(path).ok()?;

    let relative = if decoded == "/" || decoded.is_empty() {
        PathBuf::from(INDEX_FILE)
    } else {
        let mut relative = PathBuf::new();
        for component in Path::new(decoded.as_ref()).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::ParentDir => {
                    relative.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        relative
    };

    Some(root.join(relative))
}

/// A local file server bound to an ephemeral port.
///
/// The accept loop runs on a background thread. Dropping the server unblocks
/// the loop and joins the thread.
pub struct StaticServer {
    server: Arc<Server>,
    port: u16,
    handle: Option<JoinHandle<()>>,
}

impl StaticServer {
    /// Serve `root` on a kernel-assigned port on the loopback interface
    pub fn start(root: &Path) -> Result<Self> {
        Self::bind(root, "127.0.0.1:0")
    }

    /// Serve `root` on a fixed port
    pub fn start_on_port(root: &Path, port: u16) -> Result<Self> {
        Self::bind(root, &format!("127.0.0.1:{}", port))
    }

    fn bind(root: &Path, addr: &str) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| DeckError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;

        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| DeckError::ServerError("Server is not bound to an IP socket".into()))?;

        let server = Arc::new(server);
        let server_thread = server.clone();
        let root = root.to_path_buf();
        info!("Serving {:?} on http://127.0.0.1:{}", root, port);

        let handle = thread::spawn(move || {
            for request in server_thread.incoming_requests() {
                handle_request(&root, request);
            }
            debug!("Static server on port {} stopped", port);
        });

        Ok(Self {
            server,
            port,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL of a file below the root
    pub fn url_for(&self, relative: &str) -> String {
        format!(
            "http://127.0.0.1:{}/{}",
            self.port,
            relative.trim_start_matches('/')
        )
    }

    /// Stop accepting requests and wait for the accept loop to finish
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.server.unblock();
            if handle.join().is_err() {
                error!("Static server thread panicked");
            }
            info!("Static server on port {} closed", self.port);
        }
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_request(root: &Path, request: Request) {
    let file_path = resolve_asset_path(root, request.url());
    debug!("Request for {:?} -> {:?}", request.url(), file_path);

    let Some(file_path) = file_path.filter(|path| path.is_file()) else {
        respond_not_found(request);
        return;
    };

    match fs::read(&file_path) {
        Ok(content) => {
            let response = match Header::from_bytes("Content-Type", content_type(&file_path)) {
                Ok(header) => Response::from_data(content).with_header(header),
                Err(()) => Response::from_data(content),
            };
            if let Err(e) = request.respond(response) {
                error!("Failed to send response: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to read file {:?}: {}", file_path, e);
            respond_not_found(request);
        }
    }
}

fn respond_not_found(request: Request) {
    let response = Response::from_string("Not Found").with_status_code(StatusCode(404));
    if let Err(e) = request.respond(response) {
        error!("Failed to send response: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("style.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("deck.js")), "text/javascript; charset=utf-8");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type(Path::new("font.woff2")), "application/octet-stream");
        assert_eq!(content_type(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn root_maps_to_index() {
        let root = Path::new("/srv/deck");
        assert_eq!(
            resolve_asset_path(root, "/"),
            Some(PathBuf::from("/srv/deck/index.html"))
        );
        assert_eq!(
            resolve_asset_path(root, "/?print=1"),
            Some(PathBuf::from("/srv/deck/index.html"))
        );
    }

    #[test]
    fn traversal_stays_below_root() {
        let root = Path::new("/srv/deck");
        assert_eq!(
            resolve_asset_path(root, "/../../etc/passwd"),
            Some(PathBuf::from("/srv/deck/etc/passwd"))
        );
        assert_eq!(
            resolve_asset_path(root, "/%2e%2e/%2e%2e/etc/passwd"),
            Some(PathBuf::from("/srv/deck/etc/passwd"))
        );
        assert_eq!(
            resolve_asset_path(root, "/slides/../images/./logo.png"),
            Some(PathBuf::from("/srv/deck/images/logo.png"))
        );
    }

    #[test]
    fn percent_encoded_names_are_decoded() {
        let root = Path::new("/srv/deck");
        assert_eq!(
            resolve_asset_path(root, "/images/team%20photo.jpg"),
            Some(PathBuf::from("/srv/deck/images/team photo.jpg"))
        );
    }
}
