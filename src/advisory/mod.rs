//! AI advisory gateway: async client for a Gemini-style generative API.
//!
//! Every request carries the configured bounded timeout and fails with an
//! [`AdvisoryError`] the console maps to one localized fallback line. No call
//! here retries; a failed exchange surfaces once and the session moves on.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::BytesMut;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use crate::config::AdvisoryConfig;
use crate::error::AdvisoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryMode {
    /// Free conversation with the office assistant.
    Conversation,
    /// Statute-aware analysis with web search grounding.
    LegalAnalysis,
}

impl AdvisoryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::LegalAnalysis => "legal-analysis",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "conversation" | "chat" => Some(Self::Conversation),
            "legal-analysis" | "legal" | "analysis" => Some(Self::LegalAnalysis),
            _ => None,
        }
    }

    fn system_instruction(self) -> &'static str {
        match self {
            Self::Conversation => {
                "أنت مساعد مكتب محاماة في دولة الإمارات. أجب بإيجاز وبالعربية الفصحى، \
                 ووضّح عندما تكون المعلومة غير مؤكدة."
            }
            Self::LegalAnalysis => {
                "أنت مستشار قانوني متخصص في تشريعات دولة الإمارات. حلّل المسألة \
                 المعروضة، واذكر النصوص ذات الصلة، وميّز بين الوقائع والرأي القانوني، \
                 واذكر مصادرك."
            }
        }
    }

    fn wants_grounding(self) -> bool {
        matches!(self, Self::LegalAnalysis)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryReply {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct Tool {
    google_search: EmptyConfig,
}

#[derive(Serialize)]
struct EmptyConfig {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

fn generate_request(parts: Vec<Part>, mode: AdvisoryMode) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            role: Some("user"),
            parts,
        }],
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part {
                text: Some(mode.system_instruction().to_string()),
                inline_data: None,
            }],
        }),
        tools: mode.wants_grounding().then(|| {
            vec![Tool {
                google_search: EmptyConfig {},
            }]
        }),
    }
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        inline_data: None,
    }
}

fn text_of(response: &GenerateResponse) -> String {
    let mut text = String::new();
    for candidate in &response.candidates {
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(chunk) = &part.text {
                    text.push_str(chunk);
                }
            }
        }
    }
    text
}

fn reply_from_response(response: GenerateResponse) -> Result<AdvisoryReply, AdvisoryError> {
    let text = text_of(&response);
    if text.trim().is_empty() {
        return Err(AdvisoryError::Empty);
    }

    let mut citations = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for candidate in &response.candidates {
        let Some(metadata) = &candidate.grounding_metadata else {
            continue;
        };
        for chunk in &metadata.grounding_chunks {
            if let Some(web) = &chunk.web
                && let Some(uri) = &web.uri
                && seen.insert(uri.clone())
            {
                citations.push(Citation {
                    title: web.title.clone().unwrap_or_else(|| uri.clone()),
                    url: uri.clone(),
                });
            }
        }
    }

    Ok(AdvisoryReply { text, citations })
}

fn image_from_predictions(
    response: PredictResponse,
) -> Result<Option<ImagePayload>, AdvisoryError> {
    let Some(prediction) = response
        .predictions
        .into_iter()
        .find(|p| p.bytes_base64_encoded.is_some())
    else {
        return Ok(None);
    };
    let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| AdvisoryError::Decode(format!("image payload is not valid base64: {e}")))?;
    Ok(Some(ImagePayload {
        bytes,
        mime: prediction
            .mime_type
            .unwrap_or_else(|| "image/png".to_string()),
    }))
}

/// Find the end of the first complete SSE event (`\n\n` or `\n\r\n`).
fn find_event_end(buffer: &BytesMut) -> Option<(usize, usize)> {
    let bytes = buffer.as_ref();
    for i in 0..bytes.len() {
        if bytes[i] != b'\n' {
            continue;
        }
        if bytes.get(i + 1) == Some(&b'\n') {
            return Some((i, i + 2));
        }
        if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
            return Some((i, i + 3));
        }
    }
    None
}

/// Pull every complete SSE event off the front of `buffer` and return the
/// text deltas they carry. Partial trailing events stay buffered for the
/// next network chunk.
fn drain_sse_events(buffer: &mut BytesMut) -> Vec<String> {
    let mut deltas = Vec::new();
    while let Some((event_end, consumed)) = find_event_end(buffer) {
        let event = buffer.split_to(consumed);
        let raw = String::from_utf8_lossy(&event[..event_end]).into_owned();
        for line in raw.lines() {
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            match serde_json::from_str::<GenerateResponse>(data) {
                Ok(parsed) => {
                    let text = text_of(&parsed);
                    if !text.is_empty() {
                        deltas.push(text);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping undecodable advisory stream event: {}", e);
                }
            }
        }
    }
    deltas
}

pub struct AdvisoryClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    model: String,
    image_model: String,
}

impl AdvisoryClient {
    pub fn new(config: &AdvisoryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    /// False when no API key is configured; every call would return
    /// [`AdvisoryError::Disabled`].
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One full advisory exchange.
    pub async fn advise(
        &self,
        prompt: &str,
        mode: AdvisoryMode,
    ) -> Result<AdvisoryReply, AdvisoryError> {
        let url = self.endpoint(&self.model, "generateContent", &[])?;
        let request = generate_request(vec![text_part(prompt)], mode);
        let response = self.post(url, &request).await?;
        let decoded: GenerateResponse = response.json().await?;
        reply_from_response(decoded)
    }

    /// Streaming advisory exchange. Text deltas arrive in order on the
    /// returned stream; dropping the receiver stops the forwarding task on
    /// its next send, so an abandoned prompt never writes anywhere.
    pub async fn advise_stream(
        &self,
        prompt: &str,
        mode: AdvisoryMode,
    ) -> Result<ReceiverStream<Result<String, AdvisoryError>>, AdvisoryError> {
        let url = self.endpoint(&self.model, "streamGenerateContent", &[("alt", "sse")])?;
        let request = generate_request(vec![text_part(prompt)], mode);
        let response = self.post(url, &request).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let mut upstream = response.bytes_stream();
        tokio::spawn(async move {
            let mut buffer = BytesMut::new();
            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        for delta in drain_sse_events(&mut buffer) {
                            if tx.send(Ok(delta)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(AdvisoryError::Http(e))).await;
                        return;
                    }
                }
            }
        });
        Ok(ReceiverStream::new(rx))
    }

    /// Render a single image; `None` when the service returns no payload.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<Option<ImagePayload>, AdvisoryError> {
        let url = self.endpoint(&self.image_model, "predict", &[])?;
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.to_string(),
            },
        };
        let response = self.post(url, &request).await?;
        let decoded: PredictResponse = response.json().await?;
        image_from_predictions(decoded)
    }

    /// Free-form analysis of an uploaded document.
    pub async fn analyze_document(
        &self,
        bytes: &[u8],
        mime: &str,
    ) -> Result<String, AdvisoryError> {
        let url = self.endpoint(&self.model, "generateContent", &[])?;
        let parts = vec![
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime.to_string(),
                    data: BASE64.encode(bytes),
                }),
            },
            text_part(
                "حلّل هذا المستند القانوني، ولخّص أطرافه وبنوده الأساسية، \
                 وبيّن أي مخاطر أو التزامات واردة فيه.",
            ),
        ];
        let request = generate_request(parts, AdvisoryMode::LegalAnalysis);
        let response = self.post(url, &request).await?;
        let decoded: GenerateResponse = response.json().await?;
        Ok(reply_from_response(decoded)?.text)
    }

    fn endpoint(
        &self,
        model: &str,
        verb: &str,
        extra: &[(&str, &str)],
    ) -> Result<Url, AdvisoryError> {
        let key = self.api_key.as_ref().ok_or(AdvisoryError::Disabled)?;

        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let mut url = base
            .join(&format!("v1beta/models/{model}:{verb}"))
            .map_err(|e| AdvisoryError::Endpoint(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in extra {
                query.append_pair(name, value);
            }
            query.append_pair("key", key.expose_secret());
        }
        Ok(url)
    }

    async fn post<B: Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response, AdvisoryError> {
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use pretty_assertions::assert_eq;

    use super::{
        AdvisoryMode, GenerateResponse, PredictResponse, drain_sse_events, generate_request,
        image_from_predictions, reply_from_response, text_part,
    };
    use crate::error::AdvisoryError;

    fn decode(raw: &str) -> GenerateResponse {
        serde_json::from_str(raw).expect("response json decodes")
    }

    #[test]
    fn reply_concatenates_parts_and_collects_citations() {
        let response = decode(
            r#"{
                "candidates": [{
                    "content": { "parts": [
                        { "text": "الإخلاء يتطلب " },
                        { "text": "إخطاراً مسبقاً." }
                    ]},
                    "groundingMetadata": { "groundingChunks": [
                        { "web": { "uri": "https://example.ae/rent-law", "title": "قانون الإيجار" } },
                        { "web": { "uri": "https://example.ae/rent-law", "title": "مكرر" } },
                        { "web": { "uri": "https://example.ae/decree-33", "title": null } }
                    ]}
                }]
            }"#,
        );

        let reply = reply_from_response(response).expect("non-empty reply");
        assert_eq!(reply.text, "الإخلاء يتطلب إخطاراً مسبقاً.");
        assert_eq!(reply.citations.len(), 2, "duplicate links collapse");
        assert_eq!(reply.citations[0].title, "قانون الإيجار");
        // A missing title falls back to the link itself.
        assert_eq!(reply.citations[1].title, "https://example.ae/decree-33");
    }

    #[test]
    fn empty_candidates_surface_as_an_empty_reply_error() {
        let response = decode(r#"{ "candidates": [] }"#);
        assert!(matches!(
            reply_from_response(response),
            Err(AdvisoryError::Empty)
        ));

        let blank = decode(r#"{ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] }"#);
        assert!(matches!(reply_from_response(blank), Err(AdvisoryError::Empty)));
    }

    #[test]
    fn legal_mode_requests_search_grounding() {
        let legal = generate_request(vec![text_part("سؤال")], AdvisoryMode::LegalAnalysis);
        let json = serde_json::to_value(&legal).expect("request serializes");
        assert!(json.get("systemInstruction").is_some());
        assert!(json["tools"][0].get("google_search").is_some());

        let chat = generate_request(vec![text_part("سؤال")], AdvisoryMode::Conversation);
        let json = serde_json::to_value(&chat).expect("request serializes");
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn sse_buffer_yields_complete_events_and_keeps_partials() {
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(
            concat!(
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"أول\"}]}}]}\n\n",
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" ثان\"}]}}]}\r\n\r\n",
                "data: {\"candidates\":[{\"content\":"
            )
            .as_bytes(),
        );

        let deltas = drain_sse_events(&mut buffer);
        assert_eq!(deltas, vec!["أول".to_string(), " ثان".to_string()]);
        assert!(!buffer.is_empty(), "partial event stays buffered");

        buffer.extend_from_slice("{\"parts\":[{\"text\":\"ثالث\"}]}}]}\n\n".as_bytes());
        assert_eq!(drain_sse_events(&mut buffer), vec!["ثالث".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn done_markers_and_comment_lines_are_ignored() {
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(b": keep-alive\n\ndata: [DONE]\n\n");
        assert!(drain_sse_events(&mut buffer).is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn image_decode_handles_present_and_absent_payloads() {
        let response: PredictResponse = serde_json::from_str(
            r#"{ "predictions": [{ "bytesBase64Encoded": "aGVsbG8=", "mimeType": "image/png" }] }"#,
        )
        .expect("predict json decodes");
        let image = image_from_predictions(response)
            .expect("valid base64")
            .expect("payload present");
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime, "image/png");

        let empty: PredictResponse =
            serde_json::from_str(r#"{ "predictions": [] }"#).expect("predict json decodes");
        assert!(image_from_predictions(empty).expect("no error").is_none());

        let broken: PredictResponse =
            serde_json::from_str(r#"{ "predictions": [{ "bytesBase64Encoded": "!!!" }] }"#)
                .expect("predict json decodes");
        assert!(matches!(
            image_from_predictions(broken),
            Err(AdvisoryError::Decode(_))
        ));
    }

    #[test]
    fn mode_names_parse_loosely() {
        assert_eq!(
            AdvisoryMode::from_name("legal"),
            Some(AdvisoryMode::LegalAnalysis)
        );
        assert_eq!(
            AdvisoryMode::from_name("Chat"),
            Some(AdvisoryMode::Conversation)
        );
        assert_eq!(AdvisoryMode::from_name("picture"), None);
    }
}
