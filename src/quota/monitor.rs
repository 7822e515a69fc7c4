//! Quota watch daemon
//!
//! Re-reads the accounts file on an interval and raises a desktop
//! notification whenever an account's usage tier escalates.

use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::interval;

use super::{load_accounts, Accounts, QuotaError};
use crate::config::{effective_config, AppConfig, Overrides};
use crate::view::Tier;

/// Accounts whose tier rose since the previous poll.
///
/// An account seen for the first time only counts when it is already past
/// the safe tier.
pub fn escalations(previous: &HashMap<String, Tier>, accounts: &Accounts) -> Vec<(String, Tier)> {
    accounts
        .values()
        .filter_map(|account| {
            let tier = account.usage().tier();
            let before = previous.get(&account.email).copied().unwrap_or(Tier::Safe);
            (tier > before).then(|| (account.email.clone(), tier))
        })
        .collect()
}

fn tiers(accounts: &Accounts) -> HashMap<String, Tier> {
    accounts
        .values()
        .map(|a| (a.email.clone(), a.usage().tier()))
        .collect()
}

/// Main daemon loop. `overrides` are re-applied after every config reload;
/// an account override restricts the watch to that account.
pub async fn start_monitoring(overrides: Overrides) -> Result<()> {
    let mut config = effective_config(AppConfig::load()?, &overrides);
    let mut check_interval = interval(Duration::from_secs(config.refresh_secs.max(1)));
    let mut last_tiers: HashMap<String, Tier> = HashMap::new();

    tracing::info!(
        "Watching {} every {}s",
        config.accounts_file().display(),
        config.refresh_secs.max(1)
    );

    loop {
        check_interval.tick().await;

        // Reload config to pick up changes
        if let Ok(new_config) = AppConfig::load() {
            config = effective_config(new_config, &overrides);
        }

        let accounts = match poll_accounts(&config, &overrides).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!("Skipping poll: {}", e);
                continue;
            }
        };

        for (email, tier) in escalations(&last_tiers, &accounts) {
            let usage = accounts[&email].usage();
            tracing::info!(
                "{} reached {} usage ({}/{} credits)",
                email, tier, usage.current, usage.total
            );
            if config.notifications {
                notify_escalation(&email, tier, usage.remaining());
            }
        }

        last_tiers = tiers(&accounts);
    }
}

/// Read the watched accounts for one poll
async fn poll_accounts(config: &AppConfig, overrides: &Overrides) -> Result<Accounts, QuotaError> {
    let mut accounts = load_accounts(&config.accounts_file()).await?;
    if let Some(email) = &overrides.account {
        accounts.retain(|k, _| k == email);
    }
    Ok(accounts)
}

fn notify_escalation(email: &str, tier: Tier, remaining: u64) {
    let urgency = match tier {
        Tier::Critical => notify_rust::Urgency::Critical,
        _ => notify_rust::Urgency::Normal,
    };
    let _ = notify_rust::Notification::new()
        .summary("quotabar")
        .body(&format!("{}: {} credits left ({})", email, remaining, tier))
        .icon("dialog-warning")
        .urgency(urgency)
        .show();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::parse_accounts;

    fn accounts(used: i64) -> Accounts {
        parse_accounts(&format!(
            r#"{{"ana@example.com": {{"videos_left": {}, "max_credits": 10}}}}"#,
            10 - used
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_poll_reads_override_after_reload() {
        let dir = std::env::temp_dir().join(format!("quotabar-monitor-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("u.json");
        tokio::fs::write(
            &path,
            r#"{"ana@example.com": {"videos_left": 1, "max_credits": 10},
                "ben@example.com": {"videos_left": 9, "max_credits": 10}}"#,
        )
        .await
        .unwrap();

        let overrides = Overrides {
            accounts_file: Some(path.clone()),
            account: Some("ana@example.com".to_string()),
        };
        // Config freshly reloaded from disk knows nothing about the override
        let config = effective_config(AppConfig::default(), &overrides);
        assert_eq!(config.accounts_file(), path);

        let accounts = poll_accounts(&config, &overrides).await.unwrap();
        assert_eq!(accounts.keys().collect::<Vec<_>>(), vec!["ana@example.com"]);
        assert_eq!(accounts["ana@example.com"].usage().tier(), Tier::Critical);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_first_poll_reports_only_unsafe() {
        assert!(escalations(&HashMap::new(), &accounts(1)).is_empty());
        assert_eq!(
            escalations(&HashMap::new(), &accounts(5)),
            vec![("ana@example.com".to_string(), Tier::Warning)]
        );
    }

    #[test]
    fn test_reports_upward_changes_only() {
        let warning = tiers(&accounts(4));
        assert_eq!(warning["ana@example.com"], Tier::Warning);

        // Same tier again: nothing new
        assert!(escalations(&warning, &accounts(6)).is_empty());
        // Escalation
        assert_eq!(
            escalations(&warning, &accounts(8)),
            vec![("ana@example.com".to_string(), Tier::Critical)]
        );
        // Credits topped up: drop is not reported
        assert!(escalations(&tiers(&accounts(9)), &accounts(2)).is_empty());
    }
}
