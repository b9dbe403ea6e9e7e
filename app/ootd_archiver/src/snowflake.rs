use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error;
use serde::de::Visitor;

const DISCORD_EPOCH_MILLIS: i64 = 1_420_070_400_000;
const TIMESTAMP_SHIFT: u32 = 22;

/// Discord id, serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl Snowflake {
    /// Smallest id that can be minted at `time`.
    pub fn from_timestamp(time: DateTime<Utc>) -> Self {
        let millis = time.timestamp_millis() - DISCORD_EPOCH_MILLIS;
        Snowflake(u64::try_from(millis).unwrap_or(0) << TIMESTAMP_SHIFT)
    }

    pub fn timestamp(self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.0 >> TIMESTAMP_SHIFT).ok()? + DISCORD_EPOCH_MILLIS;
        DateTime::from_timestamp_millis(millis)
    }

    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl Display for Snowflake {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "a snowflake as string or integer")
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Snowflake(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        value
            .parse()
            .map(Snowflake)
            .map_err(|err| E::custom(format!("invalid snowflake, value={value}, error={err}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::Snowflake;

    #[test]
    fn from_timestamp() {
        let time = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let snowflake = Snowflake::from_timestamp(time);
        assert_eq!(snowflake.timestamp(), Some(time));
        assert!(Snowflake(snowflake.0 - 1).timestamp() < Some(time));

        let before_epoch = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Snowflake::from_timestamp(before_epoch), Snowflake(0));
    }

    #[test]
    fn serde() {
        let snowflake: Snowflake = serde_json::from_str(r#""175928847299117063""#).unwrap();
        assert_eq!(snowflake, Snowflake(175_928_847_299_117_063));
        assert_eq!(serde_json::to_string(&snowflake).unwrap(), r#""175928847299117063""#);

        let snowflake: Snowflake = serde_json::from_str("42").unwrap();
        assert_eq!(snowflake, Snowflake(42));

        let map: HashMap<Snowflake, u32> = serde_json::from_str(r#"{"7":1}"#).unwrap();
        assert_eq!(map.get(&Snowflake(7)), Some(&1));

        assert!(serde_json::from_str::<Snowflake>(r#""general""#).is_err());
    }

    #[test]
    fn mention() {
        assert_eq!(Snowflake(99).mention(), "<#99>");
    }
}
