//! API Request and Response Types
//!
//! Wire shapes for the REST endpoints. Requests implement
//! [`ValidateRequest`] and are rejected before they reach the engine.

use std::collections::BTreeSet;

use geohunt_core::{
    level_for_points, points_to_next_level, validate_treasure_id, Badge, Category, Coordinate,
    PlayerId, PlayerProgress, Points, Timestamp, Treasure, TreasureId, UnlockRecord,
    RULES_VERSION,
};
use geohunt_engine::{ScanRedemption, ScanRejection, UnlockReceipt};
use geohunt_flavor::{FlavorKind, FlavorSource, FlavorText};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ID_LENGTH, MAX_PAYLOAD_LENGTH};
use crate::error::{ApiError, ApiResult};
use crate::validation::{ValidateMaxLength, ValidateNonEmpty, ValidateRange, ValidateRequest};

// ============================================================================
// PROGRESS TYPES
// ============================================================================

/// Player progress with the derived values a client needs to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub player_id: PlayerId,
    /// Unlocks in the order they happened
    pub unlocked_treasures: Vec<UnlockRecord>,
    pub total_points: Points,
    pub level: u64,
    pub points_to_next_level: Points,
    pub badges: BTreeSet<Badge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_text: Option<String>,
    /// Version of the scoring constants the record was computed under
    pub rules_version: u32,
    /// Record version, bumped by every write
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<PlayerProgress> for ProgressResponse {
    fn from(progress: PlayerProgress) -> Self {
        Self {
            points_to_next_level: points_to_next_level(progress.total_points),
            player_id: progress.player_id,
            unlocked_treasures: progress.unlocked_treasures,
            total_points: progress.total_points,
            level: progress.level,
            badges: progress.badges,
            welcome_text: progress.welcome_text,
            rules_version: progress.rules_version,
            version: progress.version,
            created_at: progress.created_at,
            updated_at: progress.updated_at,
        }
    }
}

// ============================================================================
// UNLOCK TYPES
// ============================================================================

/// Request to credit a treasure directly (already verified by the client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub treasure_id: String,
}

impl UnlockRequest {
    pub fn treasure_id(&self) -> TreasureId {
        TreasureId::new(self.treasure_id.as_str())
    }
}

impl ValidateRequest for UnlockRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_treasure_id_field(&self.treasure_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub progress: ProgressResponse,
    /// e.g. "Unlocked Main Library! +100 points"
    pub message: String,
    pub points_awarded: Points,
}

impl From<UnlockReceipt> for UnlockResponse {
    fn from(receipt: UnlockReceipt) -> Self {
        Self {
            progress: receipt.progress.into(),
            message: receipt.message,
            points_awarded: receipt.points_awarded,
        }
    }
}

// ============================================================================
// SCAN TYPES
// ============================================================================

/// A decoded marker plus where the player stood when scanning it.
///
/// Latitude and longitude travel together. Omitting both means the client
/// had no fix, which the engine treats as out of range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub treasure_id: String,
    pub payload: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl ScanRequest {
    pub fn treasure_id(&self) -> TreasureId {
        TreasureId::new(self.treasure_id.as_str())
    }

    pub fn position(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        }
    }
}

impl ValidateRequest for ScanRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_treasure_id_field(&self.treasure_id)?;
        // An empty payload is a malformed scan, not a bad request.
        self.payload.validate_max_length("payload", MAX_PAYLOAD_LENGTH)?;

        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                latitude.validate_range("latitude", -90.0, 90.0)?;
                longitude.validate_range("longitude", -180.0, 180.0)?;
            }
            (None, None) => {}
            (Some(_), None) => return Err(ApiError::missing_field("longitude")),
            (None, Some(_)) => return Err(ApiError::missing_field("latitude")),
        }
        Ok(())
    }
}

/// Result of a scan. Rejections are a normal outcome and come back as 200.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanResponse {
    Unlocked(UnlockResponse),
    Rejected {
        rejection: ScanRejection,
        /// Text the scanner overlay shows before resuming
        message: String,
    },
}

impl From<ScanRedemption> for ScanResponse {
    fn from(redemption: ScanRedemption) -> Self {
        match redemption {
            ScanRedemption::Unlocked(receipt) => ScanResponse::Unlocked(receipt.into()),
            ScanRedemption::Rejected(rejection) => ScanResponse::Rejected {
                message: rejection_message(&rejection),
                rejection,
            },
        }
    }
}

fn rejection_message(rejection: &ScanRejection) -> String {
    match rejection {
        ScanRejection::Mismatch { .. } => {
            "Wrong marker. This code belongs to a different treasure.".to_string()
        }
        ScanRejection::Malformed => "That is not a GeoHunt code.".to_string(),
        ScanRejection::OutOfRange {
            distance_m,
            threshold_m,
        } if distance_m.is_finite() => format!(
            "You are {:.0} m away. Get within {:.0} m to unlock.",
            distance_m, threshold_m
        ),
        ScanRejection::OutOfRange { threshold_m, .. } => format!(
            "No location fix yet. Get within {:.0} m of the treasure to unlock.",
            threshold_m
        ),
    }
}

// ============================================================================
// TREASURE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasureResponse {
    pub id: TreasureId,
    pub name: String,
    pub location: Coordinate,
    pub points: u32,
    pub category: Category,
    pub clue: String,
}

impl From<Treasure> for TreasureResponse {
    fn from(treasure: Treasure) -> Self {
        Self {
            id: treasure.id,
            name: treasure.name,
            location: treasure.location,
            points: treasure.points,
            category: treasure.category,
            clue: treasure.clue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListTreasuresResponse {
    pub treasures: Vec<TreasureResponse>,
    pub total: usize,
    /// Sum of all point values, i.e. a full clear
    pub total_points: Points,
    /// Level reached by a full clear
    pub max_level: u64,
}

impl ListTreasuresResponse {
    pub fn new(treasures: Vec<Treasure>) -> Self {
        let total_points = treasures.iter().map(|t| Points::from(t.points)).sum();
        Self {
            total: treasures.len(),
            total_points,
            max_level: level_for_points(total_points),
            treasures: treasures.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// FLAVOR TYPES
// ============================================================================

/// Query for the flavor endpoint. Defaults to a hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintQuery {
    pub kind: Option<FlavorKind>,
}

impl HintQuery {
    pub fn kind(&self) -> ApiResult<FlavorKind> {
        match self.kind.unwrap_or(FlavorKind::Hint) {
            // Welcome text belongs to the progress record.
            FlavorKind::Welcome => Err(ApiError::invalid_input(
                "kind must be one of: hint, trivia, briefing",
            )),
            kind => Ok(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintResponse {
    pub treasure_id: TreasureId,
    pub kind: FlavorKind,
    pub text: String,
    /// `fallback` when the generator was unavailable
    pub source: FlavorSource,
}

impl HintResponse {
    pub fn new(treasure_id: TreasureId, kind: FlavorKind, flavor: FlavorText) -> Self {
        Self {
            treasure_id,
            kind,
            text: flavor.text,
            source: flavor.source,
        }
    }
}

// ============================================================================
// ADMIN TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub progress: ProgressResponse,
    pub rules_version: u32,
}

impl From<PlayerProgress> for ResetResponse {
    fn from(progress: PlayerProgress) -> Self {
        Self {
            progress: progress.into(),
            rules_version: RULES_VERSION,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn validate_treasure_id_field(raw: &str) -> ApiResult<()> {
    raw.validate_non_empty("treasure_id")?;
    raw.validate_max_length("treasure_id", MAX_ID_LENGTH)?;
    validate_treasure_id(&TreasureId::new(raw))
        .map_err(|e| ApiError::invalid_format("treasure_id", &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;

    fn scan(latitude: Option<f64>, longitude: Option<f64>) -> ScanRequest {
        ScanRequest {
            treasure_id: "library".to_string(),
            payload: "geohunt:library".to_string(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_unlock_request_validation() {
        let ok = UnlockRequest {
            treasure_id: "library".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = UnlockRequest {
            treasure_id: "  ".to_string(),
        };
        assert_eq!(blank.validate().unwrap_err().code, ErrorCode::MissingField);

        let namespaced = UnlockRequest {
            treasure_id: "geohunt:library".to_string(),
        };
        assert_eq!(namespaced.validate().unwrap_err().code, ErrorCode::InvalidFormat);

        let long = UnlockRequest {
            treasure_id: "x".repeat(MAX_ID_LENGTH + 1),
        };
        assert_eq!(long.validate().unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_scan_request_position_pairs() {
        assert!(scan(Some(40.73), Some(-73.99)).validate().is_ok());
        assert!(scan(None, None).validate().is_ok());
        assert_eq!(scan(None, None).position(), None);

        let half = scan(Some(40.73), None).validate().unwrap_err();
        assert_eq!(half.code, ErrorCode::MissingField);
        assert!(half.message.contains("longitude"));

        let out_of_range = scan(Some(91.0), Some(0.0)).validate().unwrap_err();
        assert_eq!(out_of_range.code, ErrorCode::InvalidRange);
    }

    #[test]
    fn test_scan_request_allows_empty_payload() {
        let mut request = scan(None, None);
        request.payload = String::new();
        assert!(request.validate().is_ok());

        request.payload = "x".repeat(MAX_PAYLOAD_LENGTH + 1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_progress_response_derives_next_level() {
        let mut progress = PlayerProgress::new(PlayerId::new("alice"), Utc::now());
        progress.total_points = 330;
        progress.level = level_for_points(330);

        let response = ProgressResponse::from(progress);
        assert_eq!(response.level, 2);
        assert_eq!(response.points_to_next_level, 70);
        assert_eq!(response.rules_version, RULES_VERSION);
    }

    #[test]
    fn test_rejection_messages() {
        let far = ScanResponse::from(ScanRedemption::Rejected(ScanRejection::OutOfRange {
            distance_m: 120.4,
            threshold_m: 50.0,
        }));
        match far {
            ScanResponse::Rejected { message, .. } => {
                assert!(message.contains("120 m"));
                assert!(message.contains("50 m"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        let no_fix = ScanResponse::from(ScanRedemption::Rejected(ScanRejection::OutOfRange {
            distance_m: f64::INFINITY,
            threshold_m: 50.0,
        }));
        match no_fix {
            ScanResponse::Rejected { message, .. } => assert!(message.contains("No location fix")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_response_wire_shape() -> Result<(), serde_json::Error> {
        let response = ScanResponse::from(ScanRedemption::Rejected(ScanRejection::Mismatch {
            scanned: TreasureId::new("stadium"),
        }));
        let json = serde_json::to_value(&response)?;
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["rejection"]["reason"], "mismatch");
        assert_eq!(json["rejection"]["scanned"], "stadium");
        Ok(())
    }

    #[test]
    fn test_hint_query_kind() {
        assert_eq!(HintQuery::default().kind().unwrap(), FlavorKind::Hint);
        let trivia = HintQuery {
            kind: Some(FlavorKind::Trivia),
        };
        assert_eq!(trivia.kind().unwrap(), FlavorKind::Trivia);
        let welcome = HintQuery {
            kind: Some(FlavorKind::Welcome),
        };
        assert!(welcome.kind().is_err());
    }
}
