use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Number of judges sitting on a panel.
pub const PANEL_SIZE: usize = 4;

/// Probability that a single draw opens the pool up to rare judges.
const RARE_POOL_CHANCE: f64 = 0.25;

/// Rarity tier of a judge, driving draw probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JudgeRarity {
    /// Everyday startup critics, always in the draw pool.
    Common,
    /// Seasoned veterans, only in the pool on a lucky draw.
    Rare,
    /// The broken judge; never drawn directly, only substituted in.
    Glitch,
}

/// Persona a judge speaks with. One variant per regular persona plus the
/// glitch persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum JudgePersonality {
    #[serde(rename = "VC Chad")]
    VcChad,
    #[serde(rename = "Philosopher AI")]
    PhilosopherAi,
    #[serde(rename = "TrollBot69")]
    TrollBot69,
    #[serde(rename = "Modern Dadu")]
    ModernDadu,
    #[serde(rename = "Outdated GenZ")]
    OutdatedGenZ,
    #[serde(rename = "Cosmic Coder")]
    CosmicCoder,
    #[serde(rename = "Hype Beast")]
    HypeBeast,
    #[serde(rename = "Broken Judge")]
    BrokenJudge,
}

impl JudgePersonality {
    /// Display form matching the persona name used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgePersonality::VcChad => "VC Chad",
            JudgePersonality::PhilosopherAi => "Philosopher AI",
            JudgePersonality::TrollBot69 => "TrollBot69",
            JudgePersonality::ModernDadu => "Modern Dadu",
            JudgePersonality::OutdatedGenZ => "Outdated GenZ",
            JudgePersonality::CosmicCoder => "Cosmic Coder",
            JudgePersonality::HypeBeast => "Hype Beast",
            JudgePersonality::BrokenJudge => "Broken Judge",
        }
    }

    /// Directive injected into the feedback prompt to keep the response in
    /// character.
    pub fn directive(&self) -> &'static str {
        match self {
            JudgePersonality::VcChad => {
                "Be brutally honest and focused on financial viability."
            }
            JudgePersonality::PhilosopherAi => {
                "Be philosophical and question the deeper meaning of the startup."
            }
            JudgePersonality::TrollBot69 => "Be sarcastic and humorous.",
            JudgePersonality::ModernDadu => "Complain about modern tech.",
            JudgePersonality::OutdatedGenZ => "Use outdated GenZ slang.",
            JudgePersonality::CosmicCoder => {
                "Speak in highly technical, almost divine, programming terms, \
                 viewing the idea as a simple algorithm."
            }
            JudgePersonality::HypeBeast => {
                "Be obsessed with trends, \"drip\", and social media clout."
            }
            JudgePersonality::BrokenJudge => {
                "Emit absurd, corrupted advice with no relation to the pitch."
            }
        }
    }
}

/// Catalog entry describing one judge persona.
///
/// Presentation assets (avatars, 3D models, animations) are owned by the
/// front-end; the backend only tracks identity, persona, rarity, and the
/// voice used for speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Judge {
    /// Unique key for the judge (e.g. `vc-chad`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Persona the judge speaks with.
    pub personality: JudgePersonality,
    /// Draw tier.
    pub rarity: JudgeRarity,
    /// One-liner shown on the judge card.
    pub description: String,
    /// Prebuilt voice used for text-to-speech.
    pub voice: String,
}

/// Errors raised by the draw policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The catalog does not hold enough non-glitch judges for a panel.
    #[error("catalog holds fewer than {PANEL_SIZE} non-glitch judges")]
    InsufficientJudges,
    /// The catalog holds no glitch judge to substitute in.
    #[error("catalog holds no glitch judge")]
    MissingGlitchJudge,
}

/// Immutable judge catalog loaded once at startup.
#[derive(Debug, Clone)]
pub struct JudgeCatalog {
    judges: Vec<Judge>,
}

impl JudgeCatalog {
    /// Wrap a list of judges loaded from configuration.
    pub fn new(judges: Vec<Judge>) -> Self {
        Self { judges }
    }

    /// All judges, in catalog order.
    pub fn all(&self) -> &[Judge] {
        &self.judges
    }

    /// Look up a judge by its identifier.
    pub fn find(&self, id: &str) -> Option<&Judge> {
        self.judges.iter().find(|judge| judge.id == id)
    }

    /// The unique glitch judge substituted in during glitch events.
    pub fn glitch_judge(&self) -> Result<&Judge, SelectionError> {
        self.judges
            .iter()
            .find(|judge| judge.rarity == JudgeRarity::Glitch)
            .ok_or(SelectionError::MissingGlitchJudge)
    }

    fn non_glitch(&self) -> Vec<&Judge> {
        self.judges
            .iter()
            .filter(|judge| judge.rarity != JudgeRarity::Glitch)
            .collect()
    }

    /// Draw a single judge.
    ///
    /// With probability [`RARE_POOL_CHANCE`] the pool is common plus rare
    /// judges, otherwise common only. The excluded id (the judge being
    /// rerolled away from) is removed from the pool. When the filtered pool
    /// ends up empty we widen it step by step: all non-glitch judges minus
    /// the excluded id, then all non-glitch judges. The glitch judge is never
    /// drawn here; it only appears through feedback-time substitution.
    pub fn draw_single<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: Option<&str>,
    ) -> Result<Judge, SelectionError> {
        let include_rare = rng.random_bool(RARE_POOL_CHANCE);

        let pool: Vec<&Judge> = self
            .non_glitch()
            .into_iter()
            .filter(|judge| include_rare || judge.rarity == JudgeRarity::Common)
            .filter(|judge| Some(judge.id.as_str()) != exclude)
            .collect();

        let pool = if pool.is_empty() {
            let widened: Vec<&Judge> = self
                .non_glitch()
                .into_iter()
                .filter(|judge| Some(judge.id.as_str()) != exclude)
                .collect();
            if widened.is_empty() {
                self.non_glitch()
            } else {
                widened
            }
        } else {
            pool
        };

        pool.choose(rng)
            .map(|judge| (*judge).clone())
            .ok_or(SelectionError::InsufficientJudges)
    }

    /// Draw a panel of [`PANEL_SIZE`] distinct non-glitch judges.
    pub fn draw_panel<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<Judge>, SelectionError> {
        let mut pool = self.non_glitch();
        if pool.len() < PANEL_SIZE {
            return Err(SelectionError::InsufficientJudges);
        }

        pool.shuffle(rng);
        Ok(pool.into_iter().take(PANEL_SIZE).cloned().collect())
    }
}
