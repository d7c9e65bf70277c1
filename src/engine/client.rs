use super::payload::{decode_analysis, decode_upload, download_error};
use super::{
    report_url, AnalysisBackend, ANALYZE_ROUTE, FILE_FIELD, QUERY_FIELD, UPLOAD_ROUTE,
};
use crate::error::WorkflowError;
use crate::model::{AnalysisReport, SelectedFile, UploadReceipt, WorkflowConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use tracing::debug;

/// `AnalysisBackend` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(cfg: &WorkflowConfig) -> Result<Self> {
        Url::parse(&cfg.base_url).with_context(|| format!("invalid base URL {}", cfg.base_url))?;

        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build http client")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, route: &str) -> Result<Url, WorkflowError> {
        let raw = format!("{}{}", self.base_url, route);
        Url::parse(&raw).map_err(|e| WorkflowError::Transport(format!("invalid URL {raw}: {e}")))
    }

    fn file_part(file: &SelectedFile) -> Result<Part, WorkflowError> {
        Part::stream_with_length(file.bytes.clone(), file.len() as u64)
            .file_name(file.name.clone())
            .mime_str(file.mime_type())
            .map_err(|e| WorkflowError::transport(&e))
    }

    async fn post_form(&self, route: &str, form: Form) -> Result<(StatusCode, Bytes), WorkflowError> {
        let url = self.endpoint(route)?;
        debug!(%url, "POST");
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WorkflowError::transport(&e))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| WorkflowError::transport(&e))?;
        debug!(%status, bytes = body.len(), "response received");
        Ok((status, body))
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadReceipt, WorkflowError> {
        let form = Form::new().part(FILE_FIELD, Self::file_part(file)?);
        let (status, body) = self.post_form(UPLOAD_ROUTE, form).await?;
        decode_upload(status, &body)
    }

    async fn analyze(
        &self,
        file: &SelectedFile,
        query: &str,
    ) -> Result<AnalysisReport, WorkflowError> {
        let form = Form::new()
            .part(FILE_FIELD, Self::file_part(file)?)
            .text(QUERY_FIELD, query.to_string());
        let (status, body) = self.post_form(ANALYZE_ROUTE, form).await?;
        decode_analysis(status, &body)
    }

    async fn download_report(&self, report_path: &str) -> Result<Bytes, WorkflowError> {
        let raw = report_url(&self.base_url, report_path);
        let url = Url::parse(&raw)
            .map_err(|e| WorkflowError::Transport(format!("invalid URL {raw}: {e}")))?;
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WorkflowError::transport(&e))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| WorkflowError::transport(&e))?;
        if !status.is_success() {
            return Err(download_error(status, &body));
        }
        Ok(body)
    }
}

#[cfg(test)]
#[path = "../tests/client_tests.rs"]
mod tests;
