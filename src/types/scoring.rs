use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type FinalScore = u64;

/// Category of a scorable workload action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ScoreTag {
    #[serde(rename = "GETRoot")]
    GetRoot,
    #[serde(rename = "GETLogin")]
    GetLogin,
    #[serde(rename = "POSTLogin")]
    PostLogin,
    #[serde(rename = "POSTRoot")]
    PostRoot,
}

impl ScoreTag {
    pub const ALL: [ScoreTag; 4] = [
        ScoreTag::GetRoot,
        ScoreTag::GetLogin,
        ScoreTag::PostLogin,
        ScoreTag::PostRoot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreTag::GetRoot => "GETRoot",
            ScoreTag::GetLogin => "GETLogin",
            ScoreTag::PostLogin => "POSTLogin",
            ScoreTag::PostRoot => "POSTRoot",
        }
    }
}

impl FromStr for ScoreTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown score tag: {s}"))
    }
}

impl fmt::Display for ScoreTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tag multipliers. A tag missing from the table is worth nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<ScoreTag, u32>);

impl WeightTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, tag: ScoreTag, weight: u32) {
        self.0.insert(tag, weight);
    }

    pub fn weight(&self, tag: ScoreTag) -> u32 {
        self.0.get(&tag).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreTag, u32)> + '_ {
        self.0.iter().map(|(tag, weight)| (*tag, *weight))
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.set(ScoreTag::GetRoot, 1);
        table.set(ScoreTag::GetLogin, 1);
        table.set(ScoreTag::PostLogin, 2);
        table.set(ScoreTag::PostRoot, 5);
        table
    }
}

impl FromIterator<(ScoreTag, u32)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (ScoreTag, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a final score was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub addition: u64,
    pub deduction: u64,
    pub score: FinalScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_contest_weights() {
        let table = WeightTable::default();
        assert_eq!(table.weight(ScoreTag::GetRoot), 1);
        assert_eq!(table.weight(ScoreTag::GetLogin), 1);
        assert_eq!(table.weight(ScoreTag::PostLogin), 2);
        assert_eq!(table.weight(ScoreTag::PostRoot), 5);
    }

    #[test]
    fn absent_tag_weighs_zero() {
        let table: WeightTable = [(ScoreTag::GetRoot, 3)].into_iter().collect();
        assert_eq!(table.weight(ScoreTag::PostRoot), 0);
    }

    #[test]
    fn tags_parse_from_display_names() {
        for tag in ScoreTag::ALL {
            assert_eq!(tag.to_string().parse::<ScoreTag>(), Ok(tag));
        }
        assert_eq!("POSTLogin".parse::<ScoreTag>(), Ok(ScoreTag::PostLogin));
    }

    #[test]
    fn unknown_tag_name_is_rejected() {
        assert!("PUTRoot".parse::<ScoreTag>().is_err());
    }
}
