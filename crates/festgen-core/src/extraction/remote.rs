//! HWP extraction through a remote document-conversion service.
//!
//! The file is converted to PDF remotely and the PDF bytes run through the
//! local PDF backend. Needs network access and a conversion credential, and
//! adds the job's latency, but handles layouts the offline parser flattens.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};

use crate::config::ConversionConfig;
use crate::error::{http_error_message, FestgenError};
use crate::extraction::TextExtractionStrategy;
use crate::model::DocumentFormat;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const JOB_DEADLINE: Duration = Duration::from_secs(300);

/// Submit a conversion, wait until it is terminal, return the output bytes.
pub trait DocumentConverter: Send + Sync {
    fn convert(
        &self,
        bytes: &[u8],
        file_name: &str,
        from: &DocumentFormat,
        to: &DocumentFormat,
    ) -> Result<Vec<u8>, FestgenError>;
}

/// HWP strategy that converts to PDF remotely, then extracts the PDF locally.
pub struct RemoteHwpExtractor {
    converter: Box<dyn DocumentConverter>,
    pdf: Box<dyn TextExtractionStrategy>,
}

impl RemoteHwpExtractor {
    pub fn new(converter: Box<dyn DocumentConverter>, pdf: Box<dyn TextExtractionStrategy>) -> Self {
        RemoteHwpExtractor { converter, pdf }
    }
}

impl TextExtractionStrategy for RemoteHwpExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, FestgenError> {
        tracing::info!(size = bytes.len(), "converting hwp to pdf remotely");
        let pdf_bytes = self.converter.convert(
            bytes,
            "document.hwp",
            &DocumentFormat::Hwp,
            &DocumentFormat::Pdf,
        )?;
        tracing::debug!(size = pdf_bytes.len(), "converted pdf received");
        self.pdf.extract_text(&pdf_bytes)
    }

    fn backend_name(&self) -> &str {
        "hwp-remote"
    }
}

/// CloudConvert v2 client: upload, convert and export as one job.
pub struct CloudConvertClient {
    client: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    deadline: Duration,
}

impl CloudConvertClient {
    pub fn new(config: &ConversionConfig) -> Result<Self, FestgenError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FestgenError::Conversion(format!("cannot build HTTP client: {e}")))?;
        Ok(CloudConvertClient {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: POLL_INTERVAL,
            deadline: JOB_DEADLINE,
        })
    }

    /// Override how often `GET /jobs/{id}` is polled and for how long.
    pub fn with_polling(mut self, interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = interval;
        self.deadline = deadline;
        self
    }

    fn create_job(&self, from: &DocumentFormat, to: &DocumentFormat) -> Result<Value, FestgenError> {
        let body = json!({
            "tasks": {
                "import-file": { "operation": "import/upload" },
                "convert-file": {
                    "operation": "convert",
                    "input": "import-file",
                    "input_format": from.extension(),
                    "output_format": to.extension(),
                },
                "export-file": { "operation": "export/url", "input": "convert-file" },
            }
        });
        let resp = self
            .client
            .post(format!("{}/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(transport_error)?;
        check_status(resp)
    }

    fn upload(&self, job: &Value, bytes: &[u8], file_name: &str) -> Result<(), FestgenError> {
        let (url, parameters) = upload_form(job)?;
        let mut form = Form::new();
        for (key, value) in parameters {
            form = form.text(key, value);
        }
        let part = Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        form = form.part("file", part);

        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(FestgenError::Conversion(format!(
                "upload rejected with HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }

    fn wait(&self, job_id: &str) -> Result<Value, FestgenError> {
        let started = Instant::now();
        loop {
            let resp = self
                .client
                .get(format!("{}/jobs/{}", self.base_url, job_id))
                .bearer_auth(&self.api_key)
                .send()
                .map_err(transport_error)?;
            let job = check_status(resp)?;
            match job_state(&job)? {
                JobState::Finished => return Ok(job),
                JobState::Failed(message) => return Err(FestgenError::Conversion(message)),
                JobState::Pending => {}
            }
            if started.elapsed() >= self.deadline {
                return Err(FestgenError::Conversion(format!(
                    "job {job_id} not finished after {}s",
                    self.deadline.as_secs()
                )));
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, FestgenError> {
        let resp = self.client.get(url).send().map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(FestgenError::Conversion(format!(
                "result download failed with HTTP {}",
                resp.status().as_u16()
            )));
        }
        let bytes = resp.bytes().map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

impl DocumentConverter for CloudConvertClient {
    fn convert(
        &self,
        bytes: &[u8],
        file_name: &str,
        from: &DocumentFormat,
        to: &DocumentFormat,
    ) -> Result<Vec<u8>, FestgenError> {
        let job = self.create_job(from, to)?;
        let job_id = field_str(&job, "/data/id")?;
        tracing::debug!(job_id, "conversion job created");

        self.upload(&job, bytes, file_name)?;
        let finished = self.wait(job_id)?;
        let url = export_url(&finished)?;
        self.download(url)
    }
}

#[derive(Debug, PartialEq)]
enum JobState {
    Pending,
    Finished,
    Failed(String),
}

fn job_state(job: &Value) -> Result<JobState, FestgenError> {
    match field_str(job, "/data/status")? {
        "finished" => Ok(JobState::Finished),
        "error" => {
            let message = tasks(job)
                .iter()
                .find(|t| t["status"] == "error")
                .map(|t| {
                    format!(
                        "task '{}' failed: {}",
                        t["name"].as_str().unwrap_or("?"),
                        t["message"].as_str().unwrap_or("no message")
                    )
                })
                .unwrap_or_else(|| "job ended with status 'error'".to_string());
            Ok(JobState::Failed(message))
        }
        _ => Ok(JobState::Pending),
    }
}

fn upload_form(job: &Value) -> Result<(&str, Vec<(String, String)>), FestgenError> {
    let task = find_task(job, "import/upload")?;
    let url = task
        .pointer("/result/form/url")
        .and_then(Value::as_str)
        .ok_or_else(|| FestgenError::Conversion("upload task has no form url".into()))?;
    let parameters = task
        .pointer("/result/form/parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| {
                    let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default();
    Ok((url, parameters))
}

fn export_url(job: &Value) -> Result<&str, FestgenError> {
    find_task(job, "export/url")?
        .pointer("/result/files/0/url")
        .and_then(Value::as_str)
        .ok_or_else(|| FestgenError::Conversion("export task has no result file url".into()))
}

fn tasks(job: &Value) -> &[Value] {
    job.pointer("/data/tasks")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn find_task<'a>(job: &'a Value, operation: &str) -> Result<&'a Value, FestgenError> {
    tasks(job)
        .iter()
        .find(|t| t["operation"] == operation)
        .ok_or_else(|| FestgenError::Conversion(format!("job has no '{operation}' task")))
}

fn field_str<'a>(value: &'a Value, pointer: &str) -> Result<&'a str, FestgenError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| FestgenError::Conversion(format!("response is missing '{pointer}'")))
}

fn transport_error(e: reqwest::Error) -> FestgenError {
    FestgenError::Conversion(format!("conversion service unreachable: {e}"))
}

fn check_status(resp: Response) -> Result<Value, FestgenError> {
    let status = resp.status().as_u16();
    let body = resp.text().map_err(transport_error)?;
    if status >= 400 {
        let message = http_error_message(&body).unwrap_or_else(|| "unknown API error".into());
        return Err(FestgenError::Conversion(format!("HTTP {status}: {message}")));
    }
    serde_json::from_str(&body)
        .map_err(|e| FestgenError::Conversion(format!("unreadable response (HTTP {status}): {e}")))
}
