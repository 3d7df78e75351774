//! GeoHunt Flavor Text
//!
//! Welcome messages, trivia, briefings and hints are cosmetic. They come from
//! an injected [`FlavorProvider`], and [`FlavorService`] guarantees a static
//! fallback whenever the provider is missing, slow or failing. Gameplay never
//! waits on or fails because of this crate.

pub mod providers;

use async_trait::async_trait;
use geohunt_core::{Category, FlavorError, PlayerId, Treasure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use providers::http::{HttpFlavorConfig, HttpFlavorProvider};

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// What kind of text is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlavorKind {
    Welcome,
    Trivia,
    Briefing,
    Hint,
}

impl FlavorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlavorKind::Welcome => "welcome",
            FlavorKind::Trivia => "trivia",
            FlavorKind::Briefing => "briefing",
            FlavorKind::Hint => "hint",
        }
    }
}

impl fmt::Display for FlavorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs a provider may weave into its text. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorContext {
    pub player_id: Option<PlayerId>,
    pub treasure_name: Option<String>,
    pub category: Option<Category>,
    pub clue: Option<String>,
}

impl FlavorContext {
    pub fn for_player(player_id: PlayerId) -> Self {
        Self {
            player_id: Some(player_id),
            ..Default::default()
        }
    }

    pub fn for_treasure(treasure: &Treasure) -> Self {
        Self {
            player_id: None,
            treasure_name: Some(treasure.name.clone()),
            category: Some(treasure.category),
            clue: Some(treasure.clue.clone()).filter(|c| !c.trim().is_empty()),
        }
    }
}

/// Static text used whenever no provider output is available.
pub fn fallback_text(kind: FlavorKind, context: &FlavorContext) -> String {
    match kind {
        FlavorKind::Welcome => {
            "Welcome to GeoHunt! Walk the campus and scan markers to unlock treasures.".to_string()
        }
        FlavorKind::Trivia => {
            "Every landmark on campus has a story. Unlock this one to hear it.".to_string()
        }
        FlavorKind::Briefing => {
            "Head toward the marker and scan it once you are within range.".to_string()
        }
        FlavorKind::Hint => match &context.clue {
            Some(clue) => clue.clone(),
            None => "Look closely around the landmark for the GeoHunt marker.".to_string(),
        },
    }
}

/// Prompt sent to generative providers.
pub fn build_prompt(kind: FlavorKind, context: &FlavorContext) -> String {
    let place = context.treasure_name.as_deref().unwrap_or("a campus landmark");
    let category = context
        .category
        .map(|c| c.as_db_str())
        .unwrap_or("general");
    match kind {
        FlavorKind::Welcome => "Write a one-sentence, upbeat welcome for a new player of a \
             campus treasure hunt game."
            .to_string(),
        FlavorKind::Trivia => format!(
            "Share one short, fun piece of trivia about {} ({} landmark). Two sentences max.",
            place, category
        ),
        FlavorKind::Briefing => format!(
            "Write a two-sentence mission briefing sending the player to {}.",
            place
        ),
        FlavorKind::Hint => format!(
            "Give a subtle one-sentence hint for finding {}. Original clue: {}. \
             Do not reveal the exact location.",
            place,
            context.clue.as_deref().unwrap_or("none")
        ),
    }
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Source of generated flavor text.
#[async_trait]
pub trait FlavorProvider: Send + Sync {
    /// Generate text of the given kind.
    async fn generate(&self, kind: FlavorKind, context: &FlavorContext)
        -> Result<String, FlavorError>;

    /// Short identifier used in logs.
    fn provider_id(&self) -> &str;
}

/// Deterministic provider built from templates. Never fails.
#[derive(Debug, Clone, Default)]
pub struct StaticFlavorProvider;

#[async_trait]
impl FlavorProvider for StaticFlavorProvider {
    async fn generate(
        &self,
        kind: FlavorKind,
        context: &FlavorContext,
    ) -> Result<String, FlavorError> {
        let text = match (kind, &context.treasure_name) {
            (FlavorKind::Welcome, _) => match &context.player_id {
                Some(player) => format!("Welcome to GeoHunt, {}! Your first treasure awaits.", player),
                None => fallback_text(kind, context),
            },
            (FlavorKind::Trivia, Some(name)) => format!(
                "{} is one of the campus {} landmarks.",
                name,
                context.category.map(|c| c.as_db_str()).unwrap_or("notable")
            ),
            (FlavorKind::Briefing, Some(name)) => {
                format!("Your next target is {}. Get within range and scan the marker.", name)
            }
            (FlavorKind::Hint, Some(name)) => match &context.clue {
                Some(clue) => format!("{}: {}", name, clue),
                None => fallback_text(kind, context),
            },
            _ => fallback_text(kind, context),
        };
        Ok(text)
    }

    fn provider_id(&self) -> &str {
        "static"
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Where a piece of text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlavorSource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorText {
    pub text: String,
    pub source: FlavorSource,
}

/// Constructed once at startup and stateless afterwards.
#[derive(Clone)]
pub struct FlavorService {
    provider: Option<Arc<dyn FlavorProvider>>,
    timeout: Duration,
}

impl FlavorService {
    pub fn new(provider: Arc<dyn FlavorProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    /// A service that always answers with the static fallback.
    pub fn fallback_only() -> Self {
        Self {
            provider: None,
            timeout: Duration::from_secs(0),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Generate text, substituting the fallback on any failure.
    pub async fn generate(&self, kind: FlavorKind, context: &FlavorContext) -> FlavorText {
        match self.try_generate(kind, context).await {
            Ok(text) => FlavorText {
                text,
                source: FlavorSource::Provider,
            },
            Err(FlavorError::ProviderNotConfigured) => FlavorText {
                text: fallback_text(kind, context),
                source: FlavorSource::Fallback,
            },
            Err(err) => {
                tracing::warn!(kind = %kind, error = %err, "flavor provider failed, using fallback");
                FlavorText {
                    text: fallback_text(kind, context),
                    source: FlavorSource::Fallback,
                }
            }
        }
    }

    pub async fn text(&self, kind: FlavorKind, context: &FlavorContext) -> String {
        self.generate(kind, context).await.text
    }

    async fn try_generate(
        &self,
        kind: FlavorKind,
        context: &FlavorContext,
    ) -> Result<String, FlavorError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(FlavorError::ProviderNotConfigured)?;
        let text = tokio::time::timeout(self.timeout, provider.generate(kind, context))
            .await
            .map_err(|_| FlavorError::Timeout {
                provider: provider.provider_id().to_string(),
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        let text = text.trim();
        if text.is_empty() {
            return Err(FlavorError::InvalidResponse {
                provider: provider.provider_id().to_string(),
                reason: "empty text".to_string(),
            });
        }
        Ok(text.to_string())
    }
}

impl fmt::Debug for FlavorService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlavorService")
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.provider_id().to_string()),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
