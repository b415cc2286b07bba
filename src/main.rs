//! 8D Report Assistant
//!
//! Interactive console front-end over the report core:
//! - Field-by-field report editing (D0–D8)
//! - AI drafting of the D4 root cause analysis
//! - Two-phase AI audit of an external report file
//! - HTML / Word / Markdown export and file-backed persistence

use anyhow::{Context, Result};
use chrono::Local;
use std::io::{self, Write};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use eightd_assist::audit::AuditPipeline;
use eightd_assist::export;
use eightd_assist::gateway::AiGateway;
use eightd_assist::report::{ActionRecord, ReportState, SectionKey};
use eightd_assist::session::ReportStore;
use eightd_assist::ReportError;

// ──────────────────────────────────────────────────────────────────────────────
// CONFIGURATION
// ──────────────────────────────────────────────────────────────────────────────

/// Configuration for the assistant
struct AssistantConfig {
    /// Directory holding saved reports
    data_dir: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::var("EIGHTD_DATA_DIR").unwrap_or_else(|_| "reports".to_string()),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    println!("\n{}", "═".repeat(60));
    println!("📋 8D Report Assistant v0.2.0");
    println!("{}", "═".repeat(60));
    println!("Authoring | AI Drafting | External Report Audit | Export");
    println!("{}\n", "═".repeat(60));

    let config = AssistantConfig::default();
    let store = ReportStore::new(&config.data_dir);

    // The gateway is optional at startup: editing and export work without a
    // key, AI commands report the missing configuration inline.
    let gateway = match AiGateway::from_env() {
        Ok(gateway) => {
            println!("🔑 DeepSeek gateway configured");
            Some(gateway)
        }
        Err(e) => {
            println!("⚠️  AI disabled: {e}");
            None
        }
    };

    let mut report = ReportState::new();
    let mut pipeline = AuditPipeline::new();

    println!("\n💡 Type 'help' for commands.\n");

    // Main interaction loop
    loop {
        print!("8d> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c.to_lowercase(), r.trim()),
            None => (line.to_lowercase(), ""),
        };

        let outcome = match command.as_str() {
            "quit" | "exit" | "q" => {
                println!("\n👋 Goodbye!\n");
                break;
            }
            "help" => {
                print_help();
                Ok(())
            }
            "show" => {
                show_report(&report);
                Ok(())
            }
            "new" => {
                report = ReportState::new();
                println!("🆕 Fresh report.");
                Ok(())
            }
            "set" => cmd_set(&mut report, rest),
            "add" => cmd_add(&mut report, rest),
            "done" => cmd_done(&mut report, rest),
            "draft" => cmd_draft(&mut report, gateway.as_ref()).await,
            "audit" => cmd_audit(&mut pipeline, gateway.as_ref(), rest).await,
            "translate" => cmd_translate(&pipeline, gateway.as_ref(), rest).await,
            "export" => cmd_export(&report, rest),
            "save" => cmd_save(&store, &report, rest).await,
            "load" => cmd_load(&store, &mut report, rest).await,
            "list" => match store.list().await {
                Ok(ids) => {
                    println!("💾 Stored reports: {}", ids.join(", "));
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "reset" => {
                pipeline.reset();
                println!("🔄 Audit pipeline back to idle.");
                Ok(())
            }
            _ => Err(ReportError::InputValidation(format!(
                "unknown command '{command}' (try 'help')"
            ))),
        };

        // Every failure is scoped to its command; the in-memory report
        // always survives.
        if let Err(e) = outcome {
            println!("❌ {e}");
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        "\nCommands:\n\
         show                          print the current report\n\
         set <sec>.<field> <value>     e.g. set d2.what Leaking valve\n\
         add <d3|d5> <action> [owner] [YYYY-MM-DD]\n\
         done <d3|d5> <n>              mark action n as done\n\
         draft                         AI-draft the D4 root cause from D2\n\
         audit <file>                  AI audit of an external report text file\n\
         translate <lang>              translate the finished audit\n\
         export <html|docx|md> <path>  write the report to a file\n\
         save <id> / load <id> / list  persistence\n\
         new / reset / quit\n"
    );
}

fn show_report(report: &ReportState) {
    let today = Local::now().date_naive();
    println!("{}", export::render_markdown(report, today));
}

fn cmd_set(report: &mut ReportState, rest: &str) -> Result<(), ReportError> {
    let (target, value) = rest.split_once(' ').unwrap_or((rest, ""));
    let (section, field) = target.split_once('.').ok_or_else(|| {
        ReportError::InputValidation("usage: set <section>.<field> <value>".to_string())
    })?;
    let section: SectionKey = section.parse()?;
    report.set(section, field, value.trim())?;
    println!("✏️  {section}.{field} updated");
    Ok(())
}

fn cmd_add(report: &mut ReportState, rest: &str) -> Result<(), ReportError> {
    let (section, rest) = rest.split_once(' ').ok_or_else(|| {
        ReportError::InputValidation("usage: add <d3|d5> <action> [owner] [YYYY-MM-DD]".to_string())
    })?;
    let section: SectionKey = section.parse()?;

    // A trailing ISO date becomes the due date, the token before it the owner.
    let mut action_text = rest.trim().to_string();
    let mut record = ActionRecord::new("");
    if let Some((head, tail)) = action_text.rsplit_once(' ') {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(tail, "%Y-%m-%d") {
            record.due_date = Some(date);
            action_text = head.to_string();
        }
    }
    if record.due_date.is_some() {
        if let Some((head, tail)) = action_text.rsplit_once(' ') {
            record.owner = tail.to_string();
            action_text = head.to_string();
        }
    }
    if action_text.trim().is_empty() {
        return Err(ReportError::InputValidation(
            "action text is required".to_string(),
        ));
    }
    record.action = action_text.trim().to_string();

    match section {
        SectionKey::D3 => report.d3.push(record),
        SectionKey::D5 => report.d5.push(record),
        other => {
            return Err(ReportError::InputValidation(format!(
                "actions live in d3 or d5, not {other}"
            )))
        }
    }
    println!("➕ action added to {section}");
    Ok(())
}

fn cmd_done(report: &mut ReportState, rest: &str) -> Result<(), ReportError> {
    let (section, index) = rest.split_once(' ').ok_or_else(|| {
        ReportError::InputValidation("usage: done <d3|d5> <n>".to_string())
    })?;
    let section: SectionKey = section.parse()?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| ReportError::InputValidation(format!("'{index}' is not an index")))?;
    let index = index
        .checked_sub(1)
        .ok_or_else(|| ReportError::InputValidation("indexes start at 1".to_string()))?;

    match section {
        SectionKey::D3 => report.d3.mark_done(index)?,
        SectionKey::D5 => report.d5.mark_done(index)?,
        other => {
            return Err(ReportError::InputValidation(format!(
                "actions live in d3 or d5, not {other}"
            )))
        }
    }
    println!("✅ {section} action {} done", index + 1);
    Ok(())
}

async fn cmd_draft(
    report: &mut ReportState,
    gateway: Option<&AiGateway>,
) -> Result<(), ReportError> {
    let gateway = require_gateway(gateway)?;
    println!("🤖 Asking DeepSeek for a root cause analysis...");
    let draft = gateway.draft_root_cause(&report.d2).await?;

    println!("Suggested five-whys path:");
    for (i, why) in draft.five_whys.iter().enumerate() {
        println!("  {}. {}", i + 1, why);
    }
    println!("Occurrence cause: {}", draft.occurrence_cause);
    println!("Escape cause:     {}", draft.escape_cause);

    let merge = report.merge_value(&draft.into_patch())?;
    if !merge.is_clean() {
        println!("⚠️  dropped: {}", merge.dropped.join("; "));
    }
    println!("⚡ Draft merged into D4 (existing answers kept where the draft was empty).");
    Ok(())
}

async fn cmd_audit(
    pipeline: &mut AuditPipeline,
    gateway: Option<&AiGateway>,
    path: &str,
) -> Result<(), ReportError> {
    let gateway = require_gateway(gateway)?;
    if path.is_empty() {
        return Err(ReportError::InputValidation(
            "usage: audit <text-file>".to_string(),
        ));
    }
    let raw_text = std::fs::read_to_string(path)
        .map_err(|e| ReportError::InputValidation(format!("could not read '{path}': {e}")))?;

    println!("🔎 Auditing (extraction, then evaluation)...");
    pipeline.run(gateway, &raw_text).await?;

    if let Some(result) = pipeline.result() {
        println!("\n📑 Extracted report:\n{}", result.summary_markdown());
        println!("🧐 Section scores:");
        for (section, score) in &result.evaluation.sections {
            println!("  {section}: {}/5  {}", score.score, score.comment);
        }
        if !result.dropped_fields.is_empty() {
            println!("⚠️  extraction dropped: {}", result.dropped_fields.join("; "));
        }
        println!("\n{}", result.narrative);
    }
    Ok(())
}

async fn cmd_translate(
    pipeline: &AuditPipeline,
    gateway: Option<&AiGateway>,
    lang: &str,
) -> Result<(), ReportError> {
    let gateway = require_gateway(gateway)?;
    if lang.is_empty() {
        return Err(ReportError::InputValidation(
            "usage: translate <language>".to_string(),
        ));
    }
    let result = pipeline.result().ok_or_else(|| {
        ReportError::InputValidation("no finished audit to translate (run 'audit' first)".to_string())
    })?;

    println!("🌐 Translating audit to {lang}...");
    let translated = result.translate(gateway, lang).await?;
    match translated.structured {
        Some(data) => {
            println!("\n📑 {data}\n\n🧐 {}", translated.narrative);
        }
        None => {
            println!("⚠️  Translation merged both parts:\n{}", translated.narrative);
        }
    }
    Ok(())
}

fn cmd_export(report: &ReportState, rest: &str) -> Result<(), ReportError> {
    let (format, path) = rest.split_once(' ').ok_or_else(|| {
        ReportError::InputValidation("usage: export <html|docx|md> <path>".to_string())
    })?;
    let today = Local::now().date_naive();

    let bytes = match format {
        "html" => export::render_html(report, today).into_bytes(),
        "md" => export::render_markdown(report, today).into_bytes(),
        "docx" => export::render_document(report, today)?,
        other => {
            return Err(ReportError::InputValidation(format!(
                "unknown export format '{other}'"
            )))
        }
    };
    std::fs::write(path.trim(), bytes)
        .map_err(|e| ReportError::Export(format!("could not write '{path}': {e}")))?;
    info!(format, path, "report exported");
    println!("📥 Exported {format} to {path}");
    Ok(())
}

async fn cmd_save(
    store: &ReportStore,
    report: &ReportState,
    id: &str,
) -> Result<(), ReportError> {
    let id = if id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        id.to_string()
    };
    store.save(&id, report).await?;
    println!("💾 Saved as '{id}'");
    Ok(())
}

async fn cmd_load(
    store: &ReportStore,
    report: &mut ReportState,
    id: &str,
) -> Result<(), ReportError> {
    match store.load(id).await? {
        Some(loaded) => {
            *report = loaded;
            println!("📂 Loaded '{id}'");
            Ok(())
        }
        None => Err(ReportError::InputValidation(format!(
            "no stored report named '{id}'"
        ))),
    }
}

fn require_gateway(gateway: Option<&AiGateway>) -> Result<&AiGateway, ReportError> {
    gateway.ok_or_else(|| {
        ReportError::InputValidation(
            "AI gateway not configured; set DEEPSEEK_API_KEY and restart".to_string(),
        )
    })
}
