use serde::{Deserialize, Serialize};

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    #[default]
    Neutral,
}

impl Signal {
    /// Get display label for this direction.
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Neutral => "NEUTRAL",
        }
    }
}

/// Qualitative confidence bucket of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "ALTA")]
    Alta,
    #[serde(rename = "MEDIA")]
    Media,
    #[serde(rename = "BAJA")]
    Baja,
    /// Fixed tier of the single-market scorer.
    #[serde(rename = "BÁSICA")]
    Basica,
}

impl Confidence {
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Alta => "ALTA",
            Confidence::Media => "MEDIA",
            Confidence::Baja => "BAJA",
            Confidence::Basica => "BÁSICA",
        }
    }
}

/// Side of the book a scoring rule adds points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// +1.0 for long, -1.0 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn signal(&self) -> Signal {
        match self {
            Side::Long => Signal::Long,
            Side::Short => Signal::Short,
        }
    }
}

/// Broad market trend used as a reference (Bitcoin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketTrend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// Result of scoring one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    pub signal: Signal,
    /// Points of the winning side, 0 when neutral.
    pub strength: f64,
    pub confidence: Confidence,
    /// Every rule that fired, in evaluation order.
    pub reasoning: Vec<String>,
}

impl SignalResult {
    pub fn neutral(confidence: Confidence, reason: impl Into<String>) -> Self {
        Self {
            signal: Signal::Neutral,
            strength: 0.0,
            confidence,
            reasoning: vec![reason.into()],
        }
    }
}
