//! Async HTTP client for the wiki's content REST API.

use std::time::Duration;

use phanlog_core::report::Table;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::{Error, Result, storage};

// ─── Wire types ──────────────────────────────────────────────────────────────

/// A page fetched with its storage body and version counter.
#[derive(Debug, Clone)]
pub struct Page {
  pub title:   String,
  pub version: i64,
  pub body:    String,
}

#[derive(Deserialize)]
struct PageResponse {
  title:   String,
  version: VersionField,
  body:    BodyField,
}

#[derive(Deserialize)]
struct VersionField {
  number: i64,
}

#[derive(Deserialize)]
struct BodyField {
  storage: StorageField,
}

#[derive(Deserialize)]
struct StorageField {
  value: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Client for the wiki's content REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based. Both
/// operations are single remote calls; failures propagate unmodified and no
/// retry happens here.
#[derive(Clone)]
pub struct WikiClient {
  client:   Client,
  base_url: String,
  token:    String,
}

impl WikiClient {
  pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      token: token.into(),
    })
  }

  fn content_url(&self, page_id: &str) -> String {
    format!(
      "{}/rest/api/content/{page_id}",
      self.base_url.trim_end_matches('/')
    )
  }

  /// `GET /rest/api/content/{page_id}?expand=body.storage,version`
  pub async fn fetch_page(&self, page_id: &str) -> Result<Page> {
    let url = self.content_url(page_id);
    let resp = self
      .client
      .get(&url)
      .bearer_auth(&self.token)
      .query(&[("expand", "body.storage,version")])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status { status: resp.status(), url });
    }

    let page: PageResponse = resp.json().await?;
    Ok(Page {
      title:   page.title,
      version: page.version.number,
      body:    page.body.storage.value,
    })
  }

  /// Fetch the first embedded table on a page.
  pub async fn fetch_table(&self, page_id: &str) -> Result<Table> {
    let page = self.fetch_page(page_id).await?;
    storage::parse_first_table(&page.body)
  }

  /// Replace the page's embedded table with `table`, bumping the page
  /// version. The rest of the page body is left untouched.
  pub async fn publish_table(&self, page_id: &str, table: &Table) -> Result<()> {
    let page = self.fetch_page(page_id).await?;
    let body = storage::splice_table(&page.body, &storage::render_table(table))?;

    let url = self.content_url(page_id);
    let payload = serde_json::json!({
      "id": page_id,
      "type": "page",
      "title": page.title,
      "version": { "number": page.version + 1 },
      "body": {
        "storage": { "value": body, "representation": "storage" }
      }
    });

    let resp = self
      .client
      .put(&url)
      .bearer_auth(&self.token)
      .json(&payload)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status { status: resp.status(), url });
    }

    info!(page_id, version = page.version + 1, "published status table");
    Ok(())
  }
}
