//! Gemini-backed implementation of the [`AiGateway`] trait.
//!
//! Text endpoints use JSON-constrained `generateContent` calls; speech uses
//! the TTS model and wraps the raw PCM answer into a WAV data URI so the
//! browser can play it directly.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ai::{
    AiGateway,
    error::{AiError, AiResult},
    models::{
        FightRequest, FightScript, GlitchEvent, JudgeReply, JudgeReplyRequest, ReportCardDraft,
        ReportCardRequest, SentimentVerdict, SpeechAudio, SpeechRequest, Transcription,
    },
    prompts,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

// The TTS endpoint answers raw 16-bit mono PCM at 24 kHz.
const TTS_SAMPLE_RATE: u32 = 24_000;
const TTS_CHANNELS: u16 = 1;
const TTS_BITS_PER_SAMPLE: u16 = 16;

/// Connection settings for the Gemini endpoints.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Model used for text generation and transcription.
    pub text_model: String,
    /// Model used for speech synthesis.
    pub tts_model: String,
}

impl GeminiConfig {
    /// Read the configuration from the environment. `GEMINI_API_KEY` is
    /// required; the other variables fall back to built-in defaults.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AiError::MissingEnvVar {
                var: "GEMINI_API_KEY",
            })?;
        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            text_model: std::env::var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string()),
            tts_model: std::env::var("GEMINI_TTS_MODEL")
                .unwrap_or_else(|_| DEFAULT_TTS_MODEL.to_string()),
        })
    }
}

/// HTTP client for the Gemini `generateContent` endpoints.
#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: Arc<str>,
    base_url: Arc<str>,
    text_model: Arc<str>,
    tts_model: Arc<str>,
}

impl GeminiGateway {
    /// Build a gateway from connection settings.
    pub fn new(config: GeminiConfig) -> AiResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|source| AiError::ClientBuilder { source })?;
        Ok(Self {
            client,
            api_key: config.api_key.into(),
            base_url: config.base_url.trim_end_matches('/').into(),
            text_model: config.text_model.into(),
            tts_model: config.tts_model.into(),
        })
    }

    async fn generate(
        &self,
        operation: &'static str,
        model: &str,
        request: &GenerateRequest,
    ) -> AiResult<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(operation, model, "calling generative endpoint");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_ref())
            .json(request)
            .send()
            .await
            .map_err(|source| AiError::RequestSend { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::RequestStatus { operation, status });
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|source| AiError::DecodeResponse { operation, source })
    }

    /// Run a JSON-constrained prompt and deserialize the first candidate's
    /// text into `T`.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        parts: Vec<Part>,
    ) -> AiResult<T> {
        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_modalities: None,
                speech_config: None,
            }),
        };
        let model = self.text_model.clone();
        let response = self.generate(operation, &model, &request).await?;
        let text = response
            .first_text()
            .ok_or(AiError::EmptyResponse { operation })?;
        serde_json::from_str(text)
            .map_err(|source| AiError::DeserializePayload { operation, source })
    }
}

impl AiGateway for GeminiGateway {
    fn transcribe(&self, audio_data_uri: String) -> BoxFuture<'static, AiResult<Transcription>> {
        let gateway = self.clone();
        Box::pin(async move {
            let operation = "transcribe";
            let (mime_type, data) = split_data_uri(&audio_data_uri).ok_or_else(|| {
                AiError::Malformed {
                    operation,
                    detail: "audio is not a base64 data URI".to_string(),
                }
            })?;
            gateway
                .generate_json(
                    operation,
                    vec![
                        Part::text(prompts::transcribe()),
                        Part::inline(mime_type, data),
                    ],
                )
                .await
        })
    }

    fn judge_reply(&self, request: JudgeReplyRequest) -> BoxFuture<'static, AiResult<JudgeReply>> {
        let gateway = self.clone();
        Box::pin(async move {
            let prompt = prompts::judge_reply(&request);
            gateway
                .generate_json("judge_reply", vec![Part::text(prompt)])
                .await
        })
    }

    fn analyze_sentiment(&self, text: String) -> BoxFuture<'static, AiResult<SentimentVerdict>> {
        let gateway = self.clone();
        Box::pin(async move {
            gateway
                .generate_json("analyze_sentiment", vec![Part::text(prompts::sentiment(&text))])
                .await
        })
    }

    fn glitch_event(&self) -> BoxFuture<'static, AiResult<GlitchEvent>> {
        let gateway = self.clone();
        Box::pin(async move {
            gateway
                .generate_json("glitch_event", vec![Part::text(prompts::glitch_event())])
                .await
        })
    }

    fn judge_fight(&self, request: FightRequest) -> BoxFuture<'static, AiResult<FightScript>> {
        let gateway = self.clone();
        Box::pin(async move {
            let prompt = prompts::judge_fight(&request.judges);
            gateway
                .generate_json("judge_fight", vec![Part::text(prompt)])
                .await
        })
    }

    fn report_card(
        &self,
        request: ReportCardRequest,
    ) -> BoxFuture<'static, AiResult<ReportCardDraft>> {
        let gateway = self.clone();
        Box::pin(async move {
            let prompt = prompts::report_card(&request);
            gateway
                .generate_json("report_card", vec![Part::text(prompt)])
                .await
        })
    }

    fn synthesize_speech(
        &self,
        request: SpeechRequest,
    ) -> BoxFuture<'static, AiResult<SpeechAudio>> {
        let gateway = self.clone();
        Box::pin(async move {
            let operation = "synthesize_speech";
            let wire_request = GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part::text(request.text)],
                }],
                generation_config: Some(GenerationConfig {
                    response_mime_type: None,
                    response_modalities: Some(vec!["AUDIO".to_string()]),
                    speech_config: Some(SpeechConfig {
                        voice_config: VoiceConfig {
                            prebuilt_voice_config: PrebuiltVoiceConfig {
                                voice_name: request.voice,
                            },
                        },
                    }),
                }),
            };
            let model = gateway.tts_model.clone();
            let response = gateway.generate(operation, &model, &wire_request).await?;
            let payload = response
                .first_inline_data()
                .ok_or(AiError::EmptyResponse { operation })?;
            let pcm = BASE64
                .decode(payload)
                .map_err(|source| AiError::InvalidAudio { operation, source })?;
            let wav = pcm_to_wav(&pcm, TTS_SAMPLE_RATE, TTS_CHANNELS, TTS_BITS_PER_SAMPLE);
            Ok(SpeechAudio {
                audio_data_uri: format!("data:audio/wav;base64,{}", BASE64.encode(wav)),
            })
        })
    }
}

/// Split a `data:<mime>;base64,<data>` URI into its MIME type and payload.
fn split_data_uri(uri: &str) -> Option<(String, String)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime_type, payload) = rest.split_once(";base64,")?;
    if mime_type.is_empty() || payload.is_empty() {
        return None;
    }
    Some((mime_type.to_string(), payload.to_string()))
}

/// Wrap raw PCM samples in a 44-byte WAV header.
fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
    let block_align = channels * bits_per_sample / 8;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline(mime_type: String, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type, data }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(rename = "speechConfig", skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }

    fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.inline_data.as_ref().map(|data| data.data.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<CandidateInlineData>,
}

#[derive(Debug, Deserialize)]
struct CandidateInlineData {
    data: String,
}
