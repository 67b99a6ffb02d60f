use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::config::GenerationConfig;
use crate::error::{http_error_message, FestgenError};
use crate::generation::{CompletionRequest, CompletionService};

/// Generation calls routinely take one to two minutes on long documents.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// OpenAI chat-completions backend (also works with compatible gateways via
/// `base_url`).
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, FestgenError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FestgenError::GenerationTransport(format!("cannot build HTTP client: {e}")))?;
        Ok(OpenAiClient {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        });
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

impl CompletionService for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, FestgenError> {
        tracing::debug!(
            model = %self.model,
            system_chars = request.system.chars().count(),
            user_chars = request.user.chars().count(),
            "sending completion request"
        );
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .map_err(|e| FestgenError::GenerationTransport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| FestgenError::GenerationTransport(format!("cannot read response body: {e}")))?;
        parse_completion(status, &body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Status first: error bodies from gateways are often HTML or plain text.
fn parse_completion(status: u16, body: &str) -> Result<String, FestgenError> {
    if status >= 400 {
        return Err(api_error(status, body));
    }
    let value: Value = serde_json::from_str(body).map_err(|e| {
        FestgenError::MalformedResponse(format!("response body is not JSON (HTTP {status}): {e}"))
    })?;
    first_choice_content(&value)
}

fn api_error(status: u16, body: &str) -> FestgenError {
    let message = http_error_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        401 | 403 => FestgenError::GenerationAuth(message),
        429 => FestgenError::RateLimited(message),
        _ => FestgenError::GenerationApi { status, message },
    }
}

fn first_choice_content(body: &Value) -> Result<String, FestgenError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FestgenError::MalformedResponse("no message content in first choice".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;

    fn client() -> OpenAiClient {
        OpenAiClient::new(&GenerationConfig {
            api_key: "sk-test".into(),
            model: "gpt-3.5-turbo".into(),
            base_url: "https://api.openai.com/v1/".into(),
        })
        .unwrap()
    }

    #[test]
    fn json_mode_sets_response_format() {
        let request = CompletionRequest {
            system: "sys".into(),
            user: "usr".into(),
            json_response: true,
        };
        let body = client().request_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");

        let plain = CompletionRequest {
            json_response: false,
            ..request
        };
        assert!(client().request_body(&plain).get("response_format").is_none());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        assert_eq!(client().base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn maps_status_codes() {
        let body = json!({ "error": { "message": "Incorrect API key provided" } }).to_string();
        assert!(matches!(api_error(401, &body), FestgenError::GenerationAuth(ref m) if m.contains("Incorrect")));
        assert!(matches!(api_error(429, "{}"), FestgenError::RateLimited(ref m) if m == "HTTP 429"));
        assert!(matches!(
            api_error(500, r#"{"message": "boom"}"#),
            FestgenError::GenerationApi { status: 500, ref message } if message == "boom"
        ));
    }

    #[test]
    fn non_json_error_body_keeps_status_mapping() {
        assert!(matches!(
            parse_completion(429, "Rate limit exceeded"),
            Err(FestgenError::RateLimited(ref m)) if m == "Rate limit exceeded"
        ));
        assert!(matches!(
            parse_completion(401, "<html>Unauthorized</html>"),
            Err(FestgenError::GenerationAuth(_))
        ));
        assert!(matches!(
            parse_completion(502, ""),
            Err(FestgenError::GenerationApi { status: 502, .. })
        ));
        assert!(matches!(
            parse_completion(200, "<html>ok</html>"),
            Err(FestgenError::MalformedResponse(_))
        ));
    }

    fn stub_client(base_url: String) -> OpenAiClient {
        OpenAiClient::new(&GenerationConfig {
            api_key: "sk-test".into(),
            model: "gpt-3.5-turbo".into(),
            base_url,
        })
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "sys".into(),
            user: "제7회 담양 산타 축제".into(),
            json_response: true,
        }
    }

    #[test]
    fn complete_posts_chat_request() {
        let reply = json!({ "choices": [ { "message": { "content": "{\"title\":\"x\"}" } } ] });
        let server = StubServer::bind();
        let base = server.url();
        let requests = server
            .route("POST", "/v1/chat/completions", 200, reply.to_string())
            .start();

        let content = stub_client(format!("{base}/v1")).complete(&request()).unwrap();
        assert_eq!(content, "{\"title\":\"x\"}");

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].header("authorization"), Some("Bearer sk-test"));
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["model"], "gpt-3.5-turbo");
        assert_eq!(sent["messages"][1]["content"], "제7회 담양 산타 축제");
        assert_eq!(sent["response_format"]["type"], "json_object");
    }

    #[test]
    fn complete_reports_plain_text_rate_limit() {
        let server = StubServer::bind();
        let base = server.url();
        server
            .route("POST", "/chat/completions", 429, "Rate limit exceeded")
            .start();

        let err = stub_client(base).complete(&request()).unwrap_err();
        assert!(matches!(err, FestgenError::RateLimited(ref m) if m == "Rate limit exceeded"));
    }

    #[test]
    fn extracts_first_choice() {
        let body = json!({ "choices": [ { "message": { "role": "assistant", "content": "{\"a\":1}" } } ] });
        assert_eq!(first_choice_content(&body).unwrap(), "{\"a\":1}");
        assert!(matches!(
            first_choice_content(&json!({ "choices": [] })),
            Err(FestgenError::MalformedResponse(_))
        ));
    }
}
