//! Scriptable gateway stub for service tests.

use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::ai::{
    AiGateway,
    error::{AiError, AiResult},
    models::{
        FightRequest, FightScript, GlitchEvent, JudgeReply, JudgeReplyRequest, ReportCardDraft,
        ReportCardRequest, Roast, ScoreDraft, SentimentVerdict, SpeechAudio, SpeechRequest,
        Transcription,
    },
};

/// Canned outcome for one stubbed endpoint. `Err` strings surface as
/// [`AiError::Malformed`] so tests can force any endpoint to fail.
pub type Scripted<T> = Result<T, String>;

/// [`AiGateway`] implementation with per-endpoint canned answers and a call
/// log for asserting which endpoints a pipeline touched.
pub struct StubGateway {
    /// Answer for `transcribe`.
    pub transcription: Scripted<Transcription>,
    /// Answer for `judge_reply`.
    pub reply: Scripted<JudgeReply>,
    /// Answer for `analyze_sentiment`.
    pub sentiment: Scripted<SentimentVerdict>,
    /// Answer for `glitch_event`.
    pub glitch: Scripted<GlitchEvent>,
    /// Answer for `judge_fight`.
    pub fight: Scripted<FightScript>,
    /// Answer for `report_card`.
    pub card: Scripted<ReportCardDraft>,
    /// Answer for `synthesize_speech`.
    pub speech: Scripted<SpeechAudio>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            transcription: Ok(Transcription {
                transcription: "We sell artisanal ice to penguins.".to_string(),
            }),
            reply: Ok(JudgeReply {
                judge_response: "Bold. Terrible, but bold.".to_string(),
            }),
            sentiment: Ok(SentimentVerdict {
                sentiment: "negative".to_string(),
            }),
            glitch: Ok(GlitchEvent {
                glitched_advice: "Pivot to selling clouds by the pound.".to_string(),
                reversed_speech: false,
            }),
            fight: Ok(default_fight_script()),
            card: Ok(default_report_card()),
            speech: Ok(SpeechAudio {
                audio_data_uri: "data:audio/wav;base64,UklGRg==".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubGateway {
    /// Endpoints invoked so far, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `endpoint` was invoked.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|name| **name == endpoint)
            .count()
    }

    fn record<T: Clone>(
        &self,
        endpoint: &'static str,
        scripted: &Scripted<T>,
    ) -> BoxFuture<'static, AiResult<T>>
    where
        T: Send + 'static,
    {
        self.calls.lock().unwrap().push(endpoint);
        let outcome = scripted.clone().map_err(|detail| AiError::Malformed {
            operation: endpoint,
            detail,
        });
        Box::pin(async move { outcome })
    }
}

impl AiGateway for StubGateway {
    fn transcribe(&self, _audio_data_uri: String) -> BoxFuture<'static, AiResult<Transcription>> {
        self.record("transcribe", &self.transcription)
    }

    fn judge_reply(&self, _request: JudgeReplyRequest) -> BoxFuture<'static, AiResult<JudgeReply>> {
        self.record("judge_reply", &self.reply)
    }

    fn analyze_sentiment(&self, _text: String) -> BoxFuture<'static, AiResult<SentimentVerdict>> {
        self.record("analyze_sentiment", &self.sentiment)
    }

    fn glitch_event(&self) -> BoxFuture<'static, AiResult<GlitchEvent>> {
        self.record("glitch_event", &self.glitch)
    }

    fn judge_fight(&self, _request: FightRequest) -> BoxFuture<'static, AiResult<FightScript>> {
        self.record("judge_fight", &self.fight)
    }

    fn report_card(
        &self,
        _request: ReportCardRequest,
    ) -> BoxFuture<'static, AiResult<ReportCardDraft>> {
        self.record("report_card", &self.card)
    }

    fn synthesize_speech(
        &self,
        _request: SpeechRequest,
    ) -> BoxFuture<'static, AiResult<SpeechAudio>> {
        self.record("synthesize_speech", &self.speech)
    }
}

/// A well-formed fight script for a four-seat panel.
pub fn default_fight_script() -> FightScript {
    FightScript {
        roasts: (0..4)
            .map(|seat| Roast {
                judge_index: seat,
                target_judge_indices: vec![(seat + 1) % 4],
                roast_text: format!("Judge {seat} has opinions about the next seat."),
            })
            .collect(),
    }
}

/// A well-formed report card draft covering all three categories.
pub fn default_report_card() -> ReportCardDraft {
    ReportCardDraft {
        overall_roast_level: 72,
        feedback_summary: "The judges were not kind, but they were not wrong.".to_string(),
        scores: vec![
            ScoreDraft {
                category: "Originality".to_string(),
                score: 88,
                grade: "A".to_string(),
                reasoning: "Nobody else thought of this, possibly for good reason.".to_string(),
            },
            ScoreDraft {
                category: "Viability".to_string(),
                score: 35,
                grade: "J".to_string(),
                reasoning: "The market for this is one enthusiastic uncle.".to_string(),
            },
            ScoreDraft {
                category: "Clarity".to_string(),
                score: 64,
                grade: "B".to_string(),
                reasoning: "Understandable, once the shouting stopped.".to_string(),
            },
        ],
    }
}
