//! Gateway to the generative model endpoints.
//!
//! The [`AiGateway`] trait abstracts every model call the feedback pipeline
//! makes so services can be tested against a stub, with [`gemini`] providing
//! the production implementation.

pub mod error;
pub mod gemini;
pub mod models;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

use futures::future::BoxFuture;

use crate::ai::{
    error::AiResult,
    models::{
        FightRequest, FightScript, GlitchEvent, JudgeReply, JudgeReplyRequest, ReportCardDraft,
        ReportCardRequest, SentimentVerdict, SpeechAudio, SpeechRequest, Transcription,
    },
};

/// Boxed-future facade over the generative endpoints.
///
/// All methods take owned inputs and return `'static` futures so callers can
/// fan out concurrent requests without borrowing the gateway.
pub trait AiGateway: Send + Sync {
    /// Transcribe a recorded pitch. `audio_data_uri` must be a
    /// `data:<mime>;base64,<data>` URI.
    fn transcribe(&self, audio_data_uri: String) -> BoxFuture<'static, AiResult<Transcription>>;

    /// Generate one judge's verdict on a pitch.
    fn judge_reply(&self, request: JudgeReplyRequest) -> BoxFuture<'static, AiResult<JudgeReply>>;

    /// Classify the sentiment of a verdict.
    fn analyze_sentiment(&self, text: String) -> BoxFuture<'static, AiResult<SentimentVerdict>>;

    /// Produce absurd advice for a broken-judge event.
    fn glitch_event(&self) -> BoxFuture<'static, AiResult<GlitchEvent>>;

    /// Script a fight where the panel roasts each other.
    fn judge_fight(&self, request: FightRequest) -> BoxFuture<'static, AiResult<FightScript>>;

    /// Grade the pitch into a report card draft.
    fn report_card(
        &self,
        request: ReportCardRequest,
    ) -> BoxFuture<'static, AiResult<ReportCardDraft>>;

    /// Synthesize speech for a verdict.
    fn synthesize_speech(
        &self,
        request: SpeechRequest,
    ) -> BoxFuture<'static, AiResult<SpeechAudio>>;
}
