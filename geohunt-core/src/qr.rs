//! Marker payload format and scan classification.
//!
//! A marker encodes `geohunt:<treasureId>`. The payload is compared
//! literally: no trimming, no case folding.

use crate::entities::validate_treasure_id;
use crate::rules::{QR_NAMESPACE, QR_SEPARATOR};
use crate::TreasureId;
use serde::{Deserialize, Serialize};

/// How a decoded payload relates to the treasure the player selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanClassification {
    /// Payload names the selected treasure.
    Match,
    /// Payload is a game code for a different treasure.
    Mismatch { scanned: TreasureId },
    /// Payload is not a game code at all.
    Malformed,
}

impl ScanClassification {
    pub fn is_match(&self) -> bool {
        matches!(self, ScanClassification::Match)
    }
}

/// Extract the treasure identifier from a payload, if it is a game code.
pub fn parse_payload(payload: &str) -> Option<TreasureId> {
    let id = payload
        .strip_prefix(QR_NAMESPACE)?
        .strip_prefix(QR_SEPARATOR)?;
    let id = TreasureId::new(id);
    validate_treasure_id(&id).ok()?;
    Some(id)
}

pub fn classify(payload: &str, target: &TreasureId) -> ScanClassification {
    match parse_payload(payload) {
        Some(scanned) if &scanned == target => ScanClassification::Match,
        Some(scanned) => ScanClassification::Mismatch { scanned },
        None => ScanClassification::Malformed,
    }
}

/// The string printed on the physical marker.
pub fn encode_payload(treasure_id: &TreasureId) -> String {
    format!("{}{}{}", QR_NAMESPACE, QR_SEPARATOR, treasure_id)
}
