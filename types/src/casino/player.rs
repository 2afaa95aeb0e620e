use super::{GameId, Multiplier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resolved round as shown in the history table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub game: GameId,
    /// Stored as an RFC 3339 string with millisecond precision
    #[serde(rename = "time", with = "iso_time")]
    pub timestamp: DateTime<Utc>,
    pub bet_amount: u64,
    pub multiplier: Multiplier,
    pub profit: i64,
}

/// Lifetime counters; never decrease.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_wagered: u64,
    pub total_won: u64,
    pub games_played: u64,
}

impl Totals {
    pub fn net_profit(&self) -> i64 {
        self.total_won as i64 - self.total_wagered as i64
    }
}

/// Persisted form of the player's statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(flatten)]
    pub totals: Totals,
    #[serde(default)]
    pub profit_history: Vec<i64>,
}

mod iso_time {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Also accepts Unix milliseconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Text(DateTime<Utc>),
            Millis(i64),
        }

        match Stored::deserialize(deserializer)? {
            Stored::Text(time) => Ok(time),
            Stored::Millis(millis) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {millis}"))),
        }
    }
}
