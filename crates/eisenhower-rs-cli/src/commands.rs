//! Subcommand handlers.
//!
//! Handlers print notices instead of failing: only bad arguments and broken
//! config surface as errors.

use crate::app::App;
use crate::cli::{Command, HostsCommand, PageArgs, SettingsCommand, TagArgs};
use crate::session::{PageSession, load_snapshot};
use anyhow::{Context, bail};
use eisenhower_rs_config::{HostAllowList, add_custom_url, remove_custom_url};
use eisenhower_rs_core::{
    MenuItem, MenuOutcome, PageResolver, ResolveMode, Resolution, Resolver, Sweeper, Target,
    validate_ratings,
};
use eisenhower_rs_protocol::{ItemKind, Preset, Request, Response, Settings};
use log::{info, warn};
use serde_json::json;
use std::io::Write;
use std::path::Path;

pub async fn run(app: &App, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Tag(args) => tag(app, args, out).await,
        Command::Untag(page) => untag(app, page, out).await,
        Command::Resolve { page, reading_pane } => resolve(app, page, reading_pane, out).await,
        Command::Apply(page) => apply(app, page, out).await,
        Command::Open { page, id } => open(app, page, id, out).await,
        Command::Matrix => matrix(app, out).await,
        Command::Rename { kind, id, label } => rename(app, kind.into(), id, label, out).await,
        Command::Delete { kind, id } => delete(app, kind.into(), id, out).await,
        Command::Sweep { max_age_days } => sweep(app, max_age_days, out).await,
        Command::Export { output } => export(app, output.as_deref(), out).await,
        Command::Clear => clear(app, out).await,
        Command::Hosts { command } => hosts(app, command, out).await,
        Command::Settings { command } => settings(app, command, out).await,
    }
}

async fn tag(app: &App, args: TagArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let preset = args.preset.map(Preset::from);
    let ratings = match preset {
        Some(preset) => preset.levels(),
        None => validate_ratings(args.importance, args.urgency)
            .context("pass --preset or both --importance and --urgency (1-4)")?,
    };
    let session = PageSession::open(app, &args.page).await?;
    let dispatcher = session.dispatcher();
    let response = match (preset, args.web) {
        (_, true) => {
            let (importance, urgency) = ratings;
            dispatcher
                .handle(Request::CategorizeWebPage {
                    importance,
                    urgency,
                })
                .await
        }
        (Some(preset), false) => {
            let outcome = dispatcher
                .on_menu_click(MenuItem::Preset(preset), &args.page.url)
                .await;
            let MenuOutcome::Reply(response) = outcome else {
                bail!("menu entry did not produce a reply");
            };
            response
        }
        (None, false) => {
            let (importance, urgency) = ratings;
            dispatcher
                .save_from_picker(Some(importance), Some(urgency))
                .await
        }
    };
    report(out, &response)?;
    session.finish(args.page.output.as_deref()).await
}

async fn untag(app: &App, page: PageArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let session = PageSession::open(app, &page).await?;
    let response = session
        .dispatcher()
        .handle(Request::RemoveWebPagePriority {})
        .await;
    report(out, &response)?;
    session.finish(page.output.as_deref()).await
}

async fn resolve(
    app: &App,
    page: PageArgs,
    reading_pane: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let doc = load_snapshot(&page.snapshot, &page.url).await?;
    let settings = app.settings().await;
    let hosts = HostAllowList::new(&app.config().hosts.builtin, &settings.custom_exchange_urls);
    if !hosts.is_allowed(doc.hostname().unwrap_or_default()) {
        let resolver = PageResolver::new(&app.config().locale).context("invalid locale")?;
        match resolver.resolve(&doc) {
            Some(web) => writeln!(out, "web page\t{}\t{}", web.url, web.title)?,
            None => writeln!(out, "⚠️ This page has no address to save")?,
        }
        return Ok(());
    }
    let mode = if reading_pane {
        ResolveMode::PreferReadingPane
    } else {
        ResolveMode::PreferListSelection
    };
    let resolver = Resolver::new(&app.config().locale, app.clock()).context("invalid locale")?;
    match resolver.resolve(&doc, mode) {
        Resolution::Found {
            id,
            subject,
            target,
        } => {
            let source = match target {
                Target::ListItem(_) => "list item",
                Target::ReadingPane(_) => "reading pane",
            };
            writeln!(out, "{source}\t{id}\t{subject}")?;
        }
        Resolution::NotFound => writeln!(out, "⚠️ No open or selected email")?,
    }
    Ok(())
}

async fn apply(app: &App, page: PageArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let session = PageSession::open(app, &page).await?;
    let applied = session.agent().apply_saved_priorities().await;
    writeln!(out, "{applied} saved priorities applied")?;
    session.finish(page.output.as_deref()).await
}

async fn open(app: &App, page: PageArgs, id: String, out: &mut impl Write) -> anyhow::Result<()> {
    let stored = match app.store().get(ItemKind::Email, &id).await {
        Ok(record) => record,
        Err(err) => {
            warn!("stored record unavailable, opening by id only (error={err})");
            None
        }
    };
    let session = PageSession::open(app, &page).await?;
    let response = session
        .dispatcher()
        .handle(Request::OpenEmail {
            email_id: id,
            email_subject: stored.as_ref().map(|record| record.subject.clone()),
            email_timestamp: stored.as_ref().map(|record| record.timestamp.timestamp_millis()),
        })
        .await;
    report(out, &response)?;
    session.finish(page.output.as_deref()).await
}

async fn matrix(app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    match app.offline_dispatcher()?.matrix().await {
        Ok(matrix) => write!(out, "{}", matrix.render_text())?,
        Err(err) => writeln!(out, "❌ {err}")?,
    }
    Ok(())
}

async fn rename(
    app: &App,
    kind: ItemKind,
    id: String,
    label: Option<String>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let response = app
        .offline_dispatcher()?
        .handle(Request::RenameLabel {
            kind,
            id: id.clone(),
            label,
        })
        .await;
    match response {
        Response::Renamed { applied: false, .. } => missing(out, kind, &id)?,
        other => report(out, &other)?,
    }
    Ok(())
}

async fn delete(app: &App, kind: ItemKind, id: String, out: &mut impl Write) -> anyhow::Result<()> {
    let response = app
        .offline_dispatcher()?
        .handle(Request::DeletePriority {
            kind,
            id: id.clone(),
        })
        .await;
    match response {
        Response::Removed { id: None, .. } => missing(out, kind, &id)?,
        other => report(out, &other)?,
    }
    Ok(())
}

async fn sweep(app: &App, max_age_days: Option<u32>, out: &mut impl Write) -> anyhow::Result<()> {
    let mut storage = app.config().storage.clone();
    if let Some(days) = max_age_days {
        if days == 0 {
            bail!("--max-age-days must be positive");
        }
        storage.max_age_days = days;
    }
    let sweeper = Sweeper::from_config(&storage, app.store(), app.clock());
    match sweeper.run_once(app.clock().now()).await {
        Ok(removed) => writeln!(out, "{removed} expired priorities removed")?,
        Err(err) => writeln!(out, "❌ {err}")?,
    }
    Ok(())
}

async fn export(app: &App, output: Option<&Path>, out: &mut impl Write) -> anyhow::Result<()> {
    let (emails, web_links) = match app.offline_dispatcher()?.handle(Request::ExportData {}).await {
        Response::Export { emails, web_links } => (emails, web_links),
        other => return report(out, &other),
    };
    let body = serde_json::to_string_pretty(&json!({
        "emailPriorities": emails,
        "webLinkPriorities": web_links,
    }))?;
    match output {
        Some(path) => {
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("export written (path={})", path.display());
            writeln!(
                out,
                "✅ Exported {} emails and {} web pages",
                emails.len(),
                web_links.len()
            )?;
        }
        None => writeln!(out, "{body}")?,
    }
    Ok(())
}

async fn clear(app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    match app.store().clear().await {
        Ok(()) => writeln!(out, "✅ All priorities cleared")?,
        Err(err) => writeln!(out, "❌ {err}")?,
    }
    Ok(())
}

async fn hosts(app: &App, command: HostsCommand, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        HostsCommand::List => {
            let settings = app.settings().await;
            writeln!(out, "builtin:")?;
            for host in &app.config().hosts.builtin {
                writeln!(out, "  {host}")?;
            }
            writeln!(out, "custom:")?;
            if settings.custom_exchange_urls.is_empty() {
                writeln!(out, "  (none)")?;
            }
            for (index, url) in settings.custom_exchange_urls.iter().enumerate() {
                writeln!(out, "  [{index}] {url}")?;
            }
            Ok(())
        }
        HostsCommand::Add { url } => {
            let Some(mut settings) = load_settings(app, out).await? else {
                return Ok(());
            };
            let added = add_custom_url(&mut settings.custom_exchange_urls, &url)
                .context("cannot add mail host")?;
            save_settings(app, &settings, &format!("✅ Added {added}"), out).await
        }
        HostsCommand::Remove { index } => {
            let Some(mut settings) = load_settings(app, out).await? else {
                return Ok(());
            };
            let Some(removed) = remove_custom_url(&mut settings.custom_exchange_urls, index) else {
                bail!("no custom mail host at index {index}");
            };
            save_settings(app, &settings, &format!("✅ Removed {removed}"), out).await
        }
    }
}

async fn settings(app: &App, command: SettingsCommand, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        SettingsCommand::Show => {
            let settings = app.settings().await;
            writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
            Ok(())
        }
        SettingsCommand::Set {
            auto_categorize,
            exchange_url,
        } => {
            if auto_categorize.is_none() && exchange_url.is_none() {
                bail!("nothing to change, pass --auto-categorize or --exchange-url");
            }
            let Some(mut settings) = load_settings(app, out).await? else {
                return Ok(());
            };
            if let Some(auto_categorize) = auto_categorize {
                settings.auto_categorize = auto_categorize;
            }
            if let Some(exchange_url) = exchange_url {
                settings.exchange_url = exchange_url.trim().to_string();
            }
            save_settings(app, &settings, "✅ Settings saved", out).await
        }
    }
}

async fn load_settings(app: &App, out: &mut impl Write) -> anyhow::Result<Option<Settings>> {
    match app.store().load_settings().await {
        Ok(settings) => Ok(Some(settings)),
        Err(err) => {
            writeln!(out, "❌ {err}")?;
            Ok(None)
        }
    }
}

async fn save_settings(
    app: &App,
    settings: &Settings,
    message: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match app.store().save_settings(settings).await {
        Ok(()) => writeln!(out, "{message}")?,
        Err(err) => writeln!(out, "❌ {err}")?,
    }
    Ok(())
}

fn missing(out: &mut impl Write, kind: ItemKind, id: &str) -> std::io::Result<()> {
    writeln!(out, "⚠️ No stored priority (kind={kind}, id={id})")
}

/// Print the notice of a reply plus what it produced.
fn report(out: &mut impl Write, response: &Response) -> anyhow::Result<()> {
    if let Some(notice) = response.notice() {
        writeln!(out, "{}", notice.message)?;
    }
    match response {
        Response::Categorized {
            record, category, ..
        } => writeln!(
            out,
            "  {} -> {} ({})",
            record.id,
            category.label(),
            record.display_label()
        )?,
        Response::Opened { id } => writeln!(out, "✅ Opened {id}")?,
        Response::Renamed { id, .. } => writeln!(out, "✅ Label updated: {id}")?,
        Response::Failed {
            error,
            notice: None,
        } => writeln!(out, "❌ {error}")?,
        _ => {}
    }
    Ok(())
}
