use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use std::path::Path;

/// Prefix of hosted-spreadsheet inputs, which gxtdb does not read.
pub const SHEET_PREFIX: &str = "sheet:";

pub fn is_url(uri: &str) -> bool {
    uri.contains("://")
}

/// The shared blocking HTTP client.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("gxtdb/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build reqwest client")
}

/// Read a local file or fetch a URL as text.
pub fn read_uri(uri: &str) -> Result<String> {
    reject_sheet(uri)?;
    if is_url(uri) {
        let client = http_client()?;
        fetch_text(&client, uri)
    } else {
        std::fs::read_to_string(Path::new(uri)).with_context(|| format!("read {uri}"))
    }
}

pub fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().with_context(|| format!("GET {url}"))?;
    if !resp.status().is_success() {
        let status = resp.status();
        return Err(anyhow!("GET {url} failed with {status}"));
    }
    resp.text().with_context(|| format!("read body of {url}"))
}

/// Fail on `sheet:` inputs.
pub fn reject_sheet(uri: &str) -> Result<()> {
    if uri.starts_with(SHEET_PREFIX) {
        bail!("hosted spreadsheet inputs are not supported: {uri}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn url_detection() {
        assert!(is_url("https://usegalaxy.org/api/tools"));
        assert!(is_url("file:///tmp/x"));
        assert!(!is_url("reports/run.json"));
    }

    #[test]
    fn reads_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "cat1\n").unwrap();
        assert_eq!(read_uri(path.to_str().unwrap()).unwrap(), "cat1\n");
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_uri("/no/such/file.txt").unwrap_err();
        assert!(err.to_string().contains("/no/such/file.txt"));
    }

    #[test]
    fn sheets_are_rejected() {
        let err = read_uri("sheet:1abcDEF").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }
}
