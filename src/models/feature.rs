use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A wishlist item that visitors vote on.
///
/// Features are seeded into the remote store ahead of time and are never
/// deleted by the voting core. The only field the voting flow mutates is
/// `vote_count`; everything else is editorial content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feature {
    /// Stable slug, e.g. `feat_formatter`.
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: FeatureCategory,
    pub vote_count: u32,
    /// Whether the feature has already shipped.
    pub is_live: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The kind of product a feature would become.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Web,
    Extension,
    Mobile,
    Desktop,
    Script,
}

impl FeatureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Extension => "extension",
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::Script => "script",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "web" => Some(Self::Web),
            "extension" => Some(Self::Extension),
            "mobile" => Some(Self::Mobile),
            "desktop" => Some(Self::Desktop),
            "script" => Some(Self::Script),
            _ => None,
        }
    }
}

/// Input for seeding a new feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeatureInput {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: FeatureCategory,
    /// Starting tally. Defaults to 0.
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub is_live: bool,
}

/// Input for updating an existing feature. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFeatureInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<FeatureCategory>,
    pub vote_count: Option<u32>,
    pub is_live: Option<bool>,
}

impl UpdateFeatureInput {
    /// An update that only overwrites the tally.
    pub fn vote_count(count: u32) -> Self {
        Self {
            vote_count: Some(count),
            ..Default::default()
        }
    }
}

/// Sort features for display: most votes first, then oldest first.
///
/// The sort is stable, so features created at the same instant keep their
/// incoming order.
pub fn rank_features(features: &mut [Feature]) {
    features.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then(a.created_at.cmp(&b.created_at))
    });
}
