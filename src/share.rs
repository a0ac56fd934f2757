//! One-time allowance bonus for sharing the site.
//!
//! Whether the visitor actually completed the share cannot be observed, so
//! the bonus is granted as soon as the share action is handed off.

use std::sync::Arc;

use reqwest::Url;

use crate::allowance::AllowanceStore;
use crate::models::ShareGrant;
use crate::storage::{KeyValueStore, LocalStateError};

/// Storage key for the share grant flag.
pub const SHARE_GRANT_KEY: &str = "oryn_has_shared";

/// LINE's share endpoint; the shared URL goes in the `url` query parameter.
const LINE_SHARE_ENDPOINT: &str = "https://social-plugins.line.me/lineit/share";

/// Where the visitor shares to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePlatform {
    Line,
    Copy,
}

impl SharePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Copy => "copy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "line" => Some(Self::Line),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }
}

/// The side effect that performs a share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareAction {
    /// Open a share dialog at this URL.
    OpenLink(String),
    /// Put this text on the clipboard.
    CopyText(String),
}

/// Performs share actions. Fire-and-forget: the result is never trusted.
pub trait ShareTarget: Send + Sync {
    fn perform(&self, action: &ShareAction);
}

/// Result of [`ShareRewardPolicy::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Granted { remaining: u32, action: ShareAction },
    /// The reward was claimed before; nothing was shared or granted.
    AlreadyClaimed { remaining: u32 },
}

/// Grants the share bonus at most once per local store.
pub struct ShareRewardPolicy {
    allowance: AllowanceStore,
    store: Arc<dyn KeyValueStore>,
    target: Arc<dyn ShareTarget>,
    share_url: String,
}

impl ShareRewardPolicy {
    pub fn new(
        allowance: AllowanceStore,
        store: Arc<dyn KeyValueStore>,
        target: Arc<dyn ShareTarget>,
        share_url: impl Into<String>,
    ) -> Self {
        Self {
            allowance,
            store,
            target,
            share_url: share_url.into(),
        }
    }

    /// Whether the one-time reward has been used up.
    pub fn is_claimed(&self) -> bool {
        self.read_grant().granted
    }

    /// Build the share action for `platform`.
    pub fn action_for(&self, platform: SharePlatform) -> ShareAction {
        match platform {
            SharePlatform::Line => {
                let link = Url::parse_with_params(LINE_SHARE_ENDPOINT, &[("url", &self.share_url)])
                    .map(String::from)
                    .unwrap_or_else(|_| self.share_url.clone());
                ShareAction::OpenLink(link)
            }
            SharePlatform::Copy => ShareAction::CopyText(self.share_url.clone()),
        }
    }

    /// Share to `platform` and grant the bonus, unless already claimed.
    pub fn claim(&self, platform: SharePlatform) -> ShareOutcome {
        if self.is_claimed() {
            return ShareOutcome::AlreadyClaimed {
                remaining: self.allowance.get_remaining(),
            };
        }

        let action = self.action_for(platform);
        self.target.perform(&action);

        let remaining = self.allowance.top_up(self.allowance.policy().share_bonus);
        if let Err(e) = self.write_grant(ShareGrant { granted: true }) {
            tracing::warn!("Failed to persist share grant: {}", e);
        }
        tracing::info!(
            "Share reward granted via {}, {} votes left",
            platform.as_str(),
            remaining
        );

        ShareOutcome::Granted { remaining, action }
    }

    fn read_grant(&self) -> ShareGrant {
        let Some(raw) = self.store.get(SHARE_GRANT_KEY) else {
            return ShareGrant::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                "{}",
                LocalStateError::Malformed {
                    key: SHARE_GRANT_KEY.to_string(),
                    reason: e.to_string(),
                }
            );
            ShareGrant::default()
        })
    }

    fn write_grant(&self, grant: ShareGrant) -> Result<(), LocalStateError> {
        self.store
            .set(SHARE_GRANT_KEY, serde_json::to_string(&grant)?)
    }
}
