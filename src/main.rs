mod app;
mod config;
mod quota;
mod theme;
mod ui;
mod view;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use config::{effective_config, AppConfig, Overrides};
use quota::{Snapshot, UsageSource};

#[derive(Parser, Debug)]
#[command(name = "quotabar")]
#[command(version)]
#[command(about = "Terminal usage bar for credit-based plans")]
struct Args {
    /// Output current usage as JSON (for status bars)
    #[arg(short, long)]
    status: bool,

    /// Watch the accounts file and notify when usage escalates
    #[arg(short, long)]
    daemon: bool,

    /// Account (email) to show
    #[arg(short, long)]
    account: Option<String>,

    /// Accounts file to read instead of the configured one
    #[arg(short = 'f', long)]
    accounts_file: Option<PathBuf>,

    /// Consumed amount; with --total, bypasses the accounts file
    #[arg(long, requires = "total")]
    current: Option<u64>,

    /// Capacity; with --current, bypasses the accounts file
    #[arg(long, requires = "current")]
    total: Option<u64>,
}

impl Args {
    /// Settings that take precedence over the config file
    fn overrides(&self) -> Overrides {
        Overrides {
            accounts_file: self.accounts_file.clone(),
            account: self.account.clone(),
        }
    }

    fn usage_source(&self, config: &AppConfig) -> UsageSource {
        match (self.current, self.total) {
            (Some(current), Some(total)) => UsageSource::Fixed { current, total },
            _ => UsageSource::File {
                path: config.accounts_file(),
                account: config.account.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let overrides = args.overrides();
    let config = effective_config(AppConfig::load().unwrap_or_default(), &overrides);
    let source = args.usage_source(&config);

    if args.status {
        return print_status(&source).await;
    }

    if args.daemon {
        return run_daemon(overrides).await;
    }

    ui::init_theme(theme::Theme::load(config.theme_file.as_deref()));
    run_tui(config, source).await
}

async fn print_status(source: &UsageSource) -> Result<()> {
    let snapshot = source.read().await?;
    println!("{}", serde_json::to_string(&status_json(&snapshot))?);
    Ok(())
}

/// Waybar-compatible status object
fn status_json(snapshot: &Snapshot) -> serde_json::Value {
    let usage = snapshot.usage;
    let tier = usage.tier();

    let mut lines = vec![format!("{}/{} credits used", usage.current, usage.total)];
    if let Some(account) = &snapshot.account {
        lines.insert(0, account.display_name().to_string());
        if let Some(plan) = account.plan() {
            lines.push(format!("Plan: {}", plan.name));
        }
        if account.is_expired() {
            lines.push("Plan expired".to_string());
        }
    }

    serde_json::json!({
        "text": format!("{:.0}%", usage.percentage()),
        "tooltip": lines.join("\n"),
        "class": tier,
        "alt": tier,
        "percentage": usage.percentage(),
        "current": usage.current,
        "total": usage.total,
        "account": snapshot.account.as_ref().map(|a| a.email.clone()),
    })
}

async fn run_daemon(overrides: Overrides) -> Result<()> {
    tracing::info!("Starting quotabar daemon");
    quota::monitor::start_monitoring(overrides).await
}

async fn run_tui(config: AppConfig, source: UsageSource) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, source).await?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if !app.has_overlay() => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh
        let _ = app.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_values_bypass_accounts_file() {
        let args = Args::parse_from(["quotabar", "--current", "3", "--total", "10"]);
        let source = args.usage_source(&AppConfig::default());
        assert_eq!(source, UsageSource::Fixed { current: 3, total: 10 });
    }

    #[test]
    fn test_status_json_clamps_overflow() {
        let snapshot = Snapshot {
            usage: quota::Usage { current: 150, total: 100 },
            account: None,
        };
        let status = status_json(&snapshot);

        assert_eq!(status["class"], "critical");
        assert_eq!(status["alt"], "critical");
        assert_eq!(status["percentage"], 100.0);
        assert_eq!(status["text"], "100%");
        assert_eq!(status["current"], 150);
        assert_eq!(status["total"], 100);
        assert_eq!(status["tooltip"], "150/100 credits used");
        assert!(status["account"].is_null());
    }

    #[test]
    fn test_status_json_names_account_and_plan() {
        let account = quota::Account {
            email: "ana@example.com".to_string(),
            name: Some("Ana".to_string()),
            plan_name: Some("pro".to_string()),
            videos_left: 10,
            max_credits: 15,
            ..Default::default()
        };
        let snapshot = Snapshot {
            usage: account.usage(),
            account: Some(account),
        };
        let status = status_json(&snapshot);

        assert_eq!(status["class"], "warning");
        assert_eq!(status["text"], "33%");
        assert_eq!(status["tooltip"], "Ana\n5/15 credits used\nPlan: Pro");
        assert_eq!(status["account"], "ana@example.com");
    }

    #[test]
    fn test_current_requires_total() {
        assert!(Args::try_parse_from(["quotabar", "--current", "3"]).is_err());
    }

    #[test]
    fn test_overrides_apply_to_file_source() {
        let args = Args::parse_from(["quotabar", "-f", "/tmp/users.json", "-a", "ana@example.com"]);
        let config = effective_config(AppConfig::default(), &args.overrides());

        assert_eq!(
            args.usage_source(&config),
            UsageSource::File {
                path: PathBuf::from("/tmp/users.json"),
                account: Some("ana@example.com".to_string()),
            }
        );
    }
}
