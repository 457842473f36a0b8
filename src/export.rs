use std::collections::HashSet;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};

use crate::db::WebinarRecord;

const BASE_URL: &str = "https://coda.io/apis/v1";

/// Coda caps row inserts per request.
const BATCH_SIZE: usize = 500;

/// Pushes the deduplicated record table into a Coda doc. The destination
/// performs its own dedup on insert; we still pre-filter against its
/// existing links to keep requests small.
pub struct CodaExporter {
    client: reqwest::Client,
    token: String,
    doc_id: String,
    table_id: String,
}

impl CodaExporter {
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("CODA_API_TOKEN").context("CODA_API_TOKEN is not set")?;
        let doc_id = std::env::var("CODA_DOC_ID").context("CODA_DOC_ID is not set")?;
        let table_id = std::env::var("CODA_TABLE_ID").context("CODA_TABLE_ID is not set")?;
        Ok(Self {
            client: reqwest::Client::new(),
            token,
            doc_id,
            table_id,
        })
    }

    fn rows_url(&self) -> String {
        format!(
            "{}/docs/{}/tables/{}/rows",
            BASE_URL, self.doc_id, self.table_id
        )
    }

    /// Links already present in the destination table, matched across the
    /// column names the table might use for the URL.
    async fn existing_links(&self) -> Result<HashSet<String>> {
        let body: serde_json::Value = self
            .client
            .get(self.rows_url())
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut links = HashSet::new();
        for row in body["items"].as_array().map(Vec::as_slice).unwrap_or(&[]) {
            let values = &row["values"];
            for key in ["Link", "link", "URL", "url"] {
                if let Some(link) = values[key].as_str() {
                    links.insert(link.to_string());
                    break;
                }
            }
        }
        Ok(links)
    }

    /// Insert records the table does not already hold. Returns how many
    /// rows were sent.
    pub async fn push(&self, records: &[WebinarRecord]) -> Result<usize> {
        let existing = match self.existing_links().await {
            Ok(links) => links,
            Err(e) => {
                warn!("could not fetch existing Coda rows: {}", e);
                HashSet::new()
            }
        };

        let fresh: Vec<&WebinarRecord> = records
            .iter()
            .filter(|r| !existing.contains(&r.link))
            .collect();
        if fresh.is_empty() {
            info!("Coda table already has every record");
            return Ok(0);
        }

        let mut sent = 0;
        for batch in fresh.chunks(BATCH_SIZE) {
            let rows: Vec<_> = batch
                .iter()
                .map(|r| {
                    json!({
                        "cells": [
                            { "column": "Source", "value": r.source },
                            { "column": "Title", "value": r.title },
                            { "column": "Air Date", "value": r.air_date.as_deref().unwrap_or("") },
                            { "column": "Link", "value": r.link },
                        ]
                    })
                })
                .collect();

            self.client
                .post(self.rows_url())
                .bearer_auth(&self.token)
                .json(&json!({ "rows": rows }))
                .send()
                .await?
                .error_for_status()
                .context("Coda row insert rejected")?;

            sent += batch.len();
            info!("pushed batch of {} rows to Coda", batch.len());
        }
        Ok(sent)
    }
}
