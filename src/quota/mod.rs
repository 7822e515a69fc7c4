//! Quota source
//!
//! Reads the accounts file kept by the web dashboard: a JSON object keyed
//! by email, each entry holding the remaining and maximum video credits.
//! The file is only ever read here.

pub mod monitor;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::view::usage::{usage_percentage, Tier};

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("failed to read accounts file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("accounts file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("accounts file must be a JSON object keyed by email")]
    Malformed,

    #[error("no account for {0}")]
    UnknownAccount(String),

    #[error("accounts file has no accounts")]
    NoAccounts,

    #[error("accounts file has {0} accounts, pick one with --account")]
    AmbiguousAccount(usize),
}

/// A purchasable credit bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub price: f64,
    pub videos: u64,
}

pub const PLANS: [Plan; 3] = [
    Plan { id: "basic", name: "Basic", price: 24.99, videos: 5 },
    Plan { id: "pro", name: "Pro", price: 49.99, videos: 15 },
    Plan { id: "elite", name: "Elite", price: 99.99, videos: 40 },
];

impl Plan {
    pub fn lookup(id: &str) -> Option<&'static Plan> {
        PLANS.iter().find(|p| p.id == id)
    }
}

/// One entry of the accounts file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Account {
    /// Filled from the object key, not the entry body
    #[serde(skip)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub has_paid: bool,
    #[serde(default)]
    pub videos_left: i64,
    #[serde(default)]
    pub max_credits: i64,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub plan_expiry: Option<String>,
}

/// Parse a plan expiry timestamp. Timestamps without an offset are local time.
pub fn parse_expiry(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Account {
    /// Consumed credits against the credit cap
    pub fn usage(&self) -> Usage {
        self.usage_at(Utc::now())
    }

    pub fn usage_at(&self, now: DateTime<Utc>) -> Usage {
        let total = self.max_credits.max(0) as u64;
        let left = if self.is_expired_at(now) {
            0
        } else {
            self.videos_left.max(0) as u64
        };
        Usage {
            current: total.saturating_sub(left),
            total,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A cancelled plan loses its credits once the expiry date has passed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if !self.cancelled {
            return false;
        }
        match self.plan_expiry.as_deref() {
            Some(raw) => match parse_expiry(raw) {
                Some(expiry) => now > expiry,
                None => {
                    tracing::debug!("Unparsable plan_expiry for {}: {}", self.email, raw);
                    false
                }
            },
            None => false,
        }
    }

    pub fn plan(&self) -> Option<&'static Plan> {
        self.plan_name.as_deref().and_then(Plan::lookup)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.email)
    }
}

/// Inputs of the usage indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub current: u64,
    pub total: u64,
}

impl Usage {
    pub fn percentage(&self) -> f64 {
        usage_percentage(self.current as f64, self.total as f64)
    }

    pub fn tier(&self) -> Tier {
        Tier::from_percentage(self.percentage())
    }

    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.current)
    }
}

pub type Accounts = BTreeMap<String, Account>;

/// Parse the accounts document
pub fn parse_accounts(content: &str) -> Result<Accounts, QuotaError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_object() {
        return Err(QuotaError::Malformed);
    }

    let mut accounts: Accounts = serde_json::from_value(value)?;
    for (email, account) in accounts.iter_mut() {
        account.email = email.clone();
    }
    Ok(accounts)
}

/// Read the accounts file. A missing file means no accounts yet.
pub async fn load_accounts(path: &Path) -> Result<Accounts, QuotaError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Accounts file {} does not exist yet", path.display());
            return Ok(Accounts::new());
        }
        Err(source) => {
            return Err(QuotaError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_accounts(&content)
}

/// Pick the account to display: the named one, or the only one
pub fn select_account<'a>(accounts: &'a Accounts, email: Option<&str>) -> Result<&'a Account, QuotaError> {
    match email {
        Some(email) => accounts
            .get(email)
            .ok_or_else(|| QuotaError::UnknownAccount(email.to_string())),
        None => match accounts.len() {
            0 => Err(QuotaError::NoAccounts),
            1 => Ok(accounts.values().next().ok_or(QuotaError::NoAccounts)?),
            n => Err(QuotaError::AmbiguousAccount(n)),
        },
    }
}

/// Where the usage indicator gets its inputs from
#[derive(Debug, Clone, PartialEq)]
pub enum UsageSource {
    Fixed { current: u64, total: u64 },
    File { path: PathBuf, account: Option<String> },
}

/// Result of reading a usage source
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub usage: Usage,
    pub account: Option<Account>,
}

impl UsageSource {
    pub async fn read(&self) -> Result<Snapshot, QuotaError> {
        match self {
            UsageSource::Fixed { current, total } => Ok(Snapshot {
                usage: Usage { current: *current, total: *total },
                account: None,
            }),
            UsageSource::File { path, account } => {
                let accounts = load_accounts(path).await?;
                let selected = select_account(&accounts, account.as_deref())?;
                Ok(Snapshot {
                    usage: selected.usage(),
                    account: Some(selected.clone()),
                })
            }
        }
    }
}
