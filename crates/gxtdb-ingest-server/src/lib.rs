use anyhow::{Context, Result, anyhow};
use gxtdb_io::uri::http_client;
use gxtdb_ports::ToolCatalog;
use gxtdb_schema::galaxy::ApiPanelElement;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

/// Tool listing of a live Galaxy server.
#[derive(Clone, Debug)]
pub struct GalaxyCatalog {
    /// Server root, e.g. `https://usegalaxy.org`.
    pub url: String,
    /// Label the server's data is recorded under.
    pub label: String,
    pub api_key: Option<String>,
}

impl GalaxyCatalog {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// `{url}/api/tools?in_panel=..[&key=..]`
    pub fn tools_url(&self, in_panel: bool) -> Result<Url> {
        let base = format!("{}/api/tools", self.url.trim_end_matches('/'));
        let mut url = Url::parse(&base).with_context(|| format!("invalid server url {}", self.url))?;
        url.query_pairs_mut()
            .append_pair("in_panel", if in_panel { "true" } else { "false" });
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, client: &Client, url: Url) -> Result<T> {
        // Keep the API key out of error messages.
        let shown = format!("{}/api/tools", self.url.trim_end_matches('/'));
        let resp = client
            .get(url)
            .send()
            .with_context(|| format!("GET {shown}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("Galaxy API error {status} from {shown}: {body}"));
        }

        resp.json::<T>()
            .with_context(|| format!("parse json from {shown}"))
    }

    fn fetch(&self, in_panel: bool) -> Result<Vec<ApiPanelElement>> {
        let client = http_client()?;
        let url = self.tools_url(in_panel)?;
        info!(server = %self.label, in_panel, "fetching tool listing");
        self.get_json(&client, url)
    }
}

impl ToolCatalog for GalaxyCatalog {
    fn label(&self) -> &str {
        &self.label
    }

    fn tools(&self) -> Result<Vec<ApiPanelElement>> {
        self.fetch(false)
    }

    fn panel(&self) -> Result<Vec<ApiPanelElement>> {
        self.fetch(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_url_without_key() {
        let catalog = GalaxyCatalog::new("https://usegalaxy.org/", "main");
        assert_eq!(
            catalog.tools_url(false).unwrap().as_str(),
            "https://usegalaxy.org/api/tools?in_panel=false"
        );
        assert_eq!(
            catalog.tools_url(true).unwrap().as_str(),
            "https://usegalaxy.org/api/tools?in_panel=true"
        );
    }

    #[test]
    fn tools_url_with_key() {
        let catalog = GalaxyCatalog::new("https://usegalaxy.eu", "eu")
            .with_api_key(Some("s3cr3t".into()));
        assert_eq!(
            catalog.tools_url(true).unwrap().as_str(),
            "https://usegalaxy.eu/api/tools?in_panel=true&key=s3cr3t"
        );
    }

    #[test]
    fn invalid_url_is_an_error() {
        let catalog = GalaxyCatalog::new("not a url", "x");
        assert!(catalog.tools_url(false).is_err());
    }

    #[test]
    fn listing_parses_as_panel_elements() {
        let body = serde_json::json!([
            {"model_class": "ToolSectionLabel", "id": "ngs", "text": "NGS"},
            {"model_class": "ToolSection", "id": "mapping", "name": "Mapping",
             "elems": [{"model_class": "Tool", "id": "bwa", "version": "1"}]}
        ]);
        let parsed: Vec<ApiPanelElement> = serde_json::from_value(body).unwrap();
        assert!(parsed[0].is_label());
        assert_eq!(parsed[1].children()[0].id, "bwa");
    }
}
