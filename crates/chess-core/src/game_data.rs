use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shakmaty::Move;

/// Seven Tag Roster plus ECO, the headers carried onto every dataset row.
pub const METADATA_HEADERS: [&str; 8] =
    ["Event", "Site", "Date", "Round", "White", "Black", "Result", "ECO"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub eco: String,
}

impl GameMetadata {
    /// Build metadata from a flat header map. Missing headers become empty strings.
    pub fn from_headers(headers: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| headers.get(key).cloned().unwrap_or_default();
        Self {
            event: get("Event"),
            site: get("Site"),
            date: get("Date"),
            round: get("Round"),
            white: get("White"),
            black: get("Black"),
            result: get("Result"),
            eco: get("ECO"),
        }
    }

    /// Flatten back into the header map form.
    pub fn to_headers(&self) -> BTreeMap<String, String> {
        METADATA_HEADERS
            .iter()
            .zip([
                &self.event,
                &self.site,
                &self.date,
                &self.round,
                &self.white,
                &self.black,
                &self.result,
                &self.eco,
            ])
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Stable identifier for a game, built from players, event, date and round.
    pub fn game_id(&self) -> String {
        format!(
            "{}_vs_{}_{}_{}_R{}",
            self.white, self.black, self.event, self.date, self.round
        )
    }
}

#[derive(Debug, Clone)]
pub struct GameData {
    pub metadata: GameMetadata,
    /// Mainline moves from the standard starting position, legal in sequence.
    pub moves: Vec<Move>,
}
