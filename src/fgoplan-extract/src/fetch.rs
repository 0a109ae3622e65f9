//! HTTP downloads into the raw cache directory

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::info;

pub struct Fetcher {
    agent: ureq::Agent,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new().build();
        Self { agent }
    }

    fn call(&self, url: &str) -> Result<ureq::Response> {
        match self.agent.get(url).call() {
            Ok(resp) if resp.status() == 200 => Ok(resp),
            Ok(resp) => bail!("Expected {} to return 200, got {}", url, resp.status()),
            Err(ureq::Error::Status(code, _)) => {
                bail!("Expected {} to return 200, got {}", url, code)
            }
            Err(e) => Err(e).with_context(|| format!("Request to {} failed", url)),
        }
    }

    /// Fetch a URL as text.
    pub fn get_string(&self, url: &str) -> Result<String> {
        self.call(url)?
            .into_string()
            .with_context(|| format!("Failed to read response from {}", url))
    }

    /// Stream a URL into `path`, skipping the download if the file already
    /// exists unless `force` is set.
    ///
    /// A partially written file is removed on failure.
    pub fn get_file(&self, url: &str, path: &Path, force: bool) -> Result<()> {
        if !force && path.exists() {
            return Ok(());
        }

        info!("Downloading {} to {}", url, path.display());
        let result = self.call(url).and_then(|resp| {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            io::copy(&mut resp.into_reader(), &mut file)
                .with_context(|| format!("Failed to download {}", url))?;
            Ok(())
        });

        if result.is_err() {
            let _ = fs::remove_file(path);
        }
        result
    }

    /// Download raw bytes.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        io::copy(&mut self.call(url)?.into_reader(), &mut bytes)
            .with_context(|| format!("Failed to download {}", url))?;
        Ok(bytes)
    }
}

/// Parse a cached JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a JSON file in the compact form the dataset uses.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string(value)?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// Serve a single response after `delay`, returning the URL to request.
    fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/info", addr)
    }

    #[test]
    fn test_slow_response_is_awaited() {
        let url = serve_once("200 OK", "{\"JP\":{}}", Duration::from_millis(1500));
        assert_eq!(Fetcher::new().get_string(&url).unwrap(), "{\"JP\":{}}");
    }

    #[test]
    fn test_non_200_is_an_error() {
        let url = serve_once("404 Not Found", "", Duration::ZERO);
        let err = Fetcher::new().get_string(&url).unwrap_err();
        assert_eq!(err.to_string(), format!("Expected {} to return 200, got 404", url));
    }

    #[test]
    fn test_existing_file_is_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        fs::write(&path, "cached").unwrap();

        // An unroutable URL would fail if it were actually requested.
        Fetcher::new()
            .get_file("http://127.0.0.1:9/info", &path, false)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "cached");
    }

    #[test]
    fn test_failed_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");

        assert!(Fetcher::new()
            .get_file("http://127.0.0.1:9/info", &path, true)
            .is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_json_roundtrip_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.json");

        write_json(&path, &json!({"JP": {"hash": "abc"}})).unwrap();
        let value: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(value["JP"]["hash"], "abc");
        assert!(read_json::<serde_json::Value>(&dir.path().join("missing.json")).is_err());
    }
}
