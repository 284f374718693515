use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three skill domains of the checklist, each with its own item catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sheet {
    Business,
    DataScience,
    DataEngineering,
}

impl Sheet {
    pub const fn ordered() -> [Self; 3] {
        [Self::Business, Self::DataScience, Self::DataEngineering]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::DataScience => "Data Science",
            Self::DataEngineering => "Data Engineering",
        }
    }

    /// Sheet name used by the published workbook.
    pub const fn workbook_name(self) -> &'static str {
        match self {
            Self::Business => "ビジネス力",
            Self::DataScience => "データサイエンス力",
            Self::DataEngineering => "データエンジニアリング力",
        }
    }

    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::DataScience => "data_science",
            Self::DataEngineering => "data_engineering",
        }
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

impl FromStr for Sheet {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|sheet| {
                trimmed.eq_ignore_ascii_case(sheet.file_stem())
                    || trimmed == sheet.workbook_name()
                    || trimmed.eq_ignore_ascii_case(sheet.label())
            })
            .ok_or_else(|| DomainError::UnknownSheet(raw.to_string()))
    }
}

/// Difficulty tier of a checklist item, shown as one to three stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    One,
    Two,
    Three,
}

impl Level {
    pub const fn ordered() -> [Self; 3] {
        [Self::One, Self::Two, Self::Three]
    }

    pub const fn stars(self) -> &'static str {
        match self {
            Self::One => "★",
            Self::Two => "★★",
            Self::Three => "★★★",
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.rank()
    }
}

impl TryFrom<u8> for Level {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(DomainError::InvalidLevel(other.to_string())),
        }
    }
}

impl FromStr for Level {
    type Err = DomainError;

    /// Accepts the star glyphs used by the workbook as well as plain digits.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let invalid = || DomainError::InvalidLevel(raw.to_string());

        if let Ok(rank) = trimmed.parse::<u8>() {
            return Level::try_from(rank).map_err(|_| invalid());
        }

        if trimmed.is_empty() || trimmed.chars().any(|c| c != '★') {
            return Err(invalid());
        }

        u8::try_from(trimmed.chars().count())
            .ok()
            .and_then(|count| Level::try_from(count).ok())
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stars())
    }
}

/// Level choice driving the report views; `All` spans every tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelSelection {
    Only(Level),
    #[default]
    All,
}

impl LevelSelection {
    pub fn includes(self, level: Level) -> bool {
        match self {
            Self::Only(selected) => selected == level,
            Self::All => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Only(level) => level.stars(),
            Self::All => "ALL",
        }
    }
}

impl FromStr for LevelSelection {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        raw.parse().map(Self::Only)
    }
}

impl fmt::Display for LevelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LevelSelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LevelSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Sequence number of an item, unique within its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    /// Spreadsheet exports sometimes render integers as `12.0`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_suffix(".0")
            .filter(|head| !head.is_empty())
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(ItemId)
            .map_err(|_| DomainError::InvalidItemId(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub sheet: Sheet,
    pub category: String,
    pub subcategory: String,
    pub level: Level,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("unknown sheet '{0}'")]
    UnknownSheet(String),
    #[error("invalid skill level '{0}': expected ★ to ★★★ or 1 to 3")]
    InvalidLevel(String),
    #[error("invalid item number '{0}'")]
    InvalidItemId(String),
    #[error("user id must not be empty")]
    EmptyUserId,
}
