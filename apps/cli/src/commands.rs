//! # Commands
//!
//! ```text
//! argv ──► Command::parse ──► execute(command, &ctx, &mut stdout)
//!                                  │
//!                                  ├── ctx.db.stacks()   StackRepository
//!                                  ├── ctx.db.shares()   ShareStore
//!                                  └── ctx.roster        normalization + balances
//! ```
//!
//! `import` accepts either a SplitStack stack document (a JSON object, amounts
//! in cents) or the receipt array exported by the browser app (amounts in
//! dollars). Both are normalized and validated before anything is saved.
//!
//! Output is plain text written to `out`; logging goes to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use splitstack_core::{stack_from_web_receipts, BalanceSummary, Receipt, Roster, ShareId, Stack, WebReceipt};
use splitstack_db::{open_shared, publish_stack, Database, DbError};
use tracing::info;

use crate::error::{CliError, CliResult};

pub const USAGE: &str = "\
Usage: splitstack <command>

Commands:
  import <file.json>        Import a stack document or a browser receipt export
  list                      List stacks
  new <name> <YYYY-MM-DD>   Create an empty stack
  show <stack-id>           Show a stack's receipts
  balances <stack-id>       Show who owes whom
  share <stack-id>          Publish completed receipts, print the share id
  shared <share-id>         Show a shared stack
  delete <stack-id>         Delete a stack
  help                      Show this message";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Import { path: PathBuf },
    List,
    New { name: String, date: NaiveDate },
    Show { stack_id: String },
    Balances { stack_id: String },
    Share { stack_id: String },
    Shared { share_id: ShareId },
    Delete { stack_id: String },
    Help,
}

impl Command {
    /// Parses arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> CliResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match (name.as_str(), rest) {
            ("help" | "-h" | "--help", []) => Command::Help,
            ("list", []) => Command::List,
            ("import", [path]) => Command::Import { path: PathBuf::from(path) },
            ("new", [name, date]) => Command::New {
                name: name.clone(),
                date: parse_date(date)?,
            },
            ("show", [id]) => Command::Show { stack_id: id.clone() },
            ("balances", [id]) => Command::Balances { stack_id: id.clone() },
            ("share", [id]) => Command::Share { stack_id: id.clone() },
            ("shared", [id]) => Command::Shared { share_id: ShareId::parse(id)? },
            ("delete", [id]) => Command::Delete { stack_id: id.clone() },
            (
                "help" | "-h" | "--help" | "list" | "import" | "new" | "show" | "balances" | "share"
                | "shared" | "delete",
                _,
            ) => {
                return Err(CliError::usage(format!(
                    "Wrong number of arguments for `{name}`\n\n{USAGE}"
                )))
            }
            _ => return Err(CliError::usage(format!("Unknown command `{name}`\n\n{USAGE}"))),
        };

        Ok(command)
    }
}

fn parse_date(input: &str) -> CliResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| CliError::usage(format!("Invalid date `{input}`: expected YYYY-MM-DD")))
}

/// What commands run against.
#[derive(Debug, Clone)]
pub struct Context {
    pub db: Database,
    pub roster: Roster,
}

// =============================================================================
// Execution
// =============================================================================

pub async fn execute<W: Write>(command: Command, ctx: &Context, out: &mut W) -> CliResult<()> {
    match command {
        Command::Help => writeln!(out, "{USAGE}")?,

        Command::List => {
            let listings = ctx.db.stacks().list().await?;
            if listings.is_empty() {
                writeln!(out, "No stacks.")?;
            }
            for listing in listings {
                match listing.share_id {
                    Some(share_id) => writeln!(
                        out,
                        "{}  {}  {}  [shared {}]",
                        listing.id, listing.stack_date, listing.name, share_id
                    )?,
                    None => writeln!(out, "{}  {}  {}", listing.id, listing.stack_date, listing.name)?,
                }
            }
        }

        Command::Import { path } => {
            let document = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            let stack = parse_import(&path, &document, &ctx.roster)?;
            ctx.db.stacks().save(&stack).await?;

            info!(stack_id = %stack.id(), path = %path.display(), "Imported stack");
            writeln!(
                out,
                "Imported stack {} ({}, {} receipts)",
                stack.id(),
                stack.name(),
                stack.receipts().len()
            )?;
        }

        Command::New { name, date } => {
            let stack = Stack::new(&name, date, &ctx.roster, Utc::now())?;
            ctx.db.stacks().save(&stack).await?;
            writeln!(out, "Created stack {}", stack.id())?;
        }

        Command::Show { stack_id } => {
            let stack = ctx.db.stacks().get(&stack_id, &ctx.roster).await?;
            writeln!(out, "{} ({})", stack.name(), stack.date())?;
            for (index, receipt) in stack.receipts().iter().enumerate() {
                write_receipt(out, index, receipt, &ctx.roster)?;
            }
        }

        Command::Balances { stack_id } => {
            let stack = ctx.db.stacks().get(&stack_id, &ctx.roster).await?;
            writeln!(out, "{} ({})", stack.name(), stack.date())?;
            write_summary(out, stack.summary(&ctx.roster)?.as_ref())?;
        }

        Command::Share { stack_id } => {
            let mut stack = ctx.db.stacks().get(&stack_id, &ctx.roster).await?;
            let share_id = publish_stack(&ctx.db.shares(), &mut stack, Utc::now()).await?;
            ctx.db.stacks().save(&stack).await?;
            writeln!(out, "Share id: {share_id}")?;
        }

        Command::Shared { share_id } => {
            let snapshot = open_shared(&ctx.db.shares(), &share_id, &ctx.roster).await?;
            writeln!(
                out,
                "{} ({}), shared {}",
                snapshot.stack_name,
                snapshot.stack_date,
                snapshot.shared_at.format("%Y-%m-%d %H:%M UTC")
            )?;
            if let Some(local) = ctx.db.stacks().find_by_share_id(&share_id, &ctx.roster).await? {
                writeln!(out, "Published from local stack {}", local.id())?;
            }
            write_summary(out, snapshot.summary(&ctx.roster)?.as_ref())?;
        }

        Command::Delete { stack_id } => {
            if !ctx.db.stacks().delete(&stack_id).await? {
                return Err(DbError::not_found("Stack", &stack_id).into());
            }
            writeln!(out, "Deleted stack {stack_id}")?;
        }
    }

    Ok(())
}

/// Name for a stack built from a browser export: the file name without
/// its extension.
fn import_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| "Imported receipts".to_string())
}

fn parse_import(path: &Path, document: &str, roster: &Roster) -> CliResult<Stack> {
    let now = Utc::now();

    if document.trim_start().starts_with('[') {
        let receipts: Vec<WebReceipt> = serde_json::from_str(document)?;
        return Ok(stack_from_web_receipts(&import_name(path), receipts, roster, now)?);
    }

    let mut stack: Stack = serde_json::from_str(document)?;
    stack.normalize(roster, now);
    stack.validate()?;
    Ok(stack)
}

// =============================================================================
// Rendering
// =============================================================================

fn write_receipt<W: Write>(out: &mut W, index: usize, receipt: &Receipt, roster: &Roster) -> CliResult<()> {
    let subject = if receipt.subject().is_empty() {
        "(untitled)"
    } else {
        receipt.subject()
    };
    let state = if receipt.is_completed() { "completed" } else { "draft" };
    writeln!(out, "\n#{} {}  [{}]  total {}", index + 1, subject, state, receipt.total()?)?;

    if let Some(payer) = receipt.payer() {
        writeln!(out, "  paid by {}", payer.display_name())?;
    }

    for participant in roster.iter().filter(|p| receipt.is_active(p)) {
        if receipt.is_completed() {
            let paid = if receipt.settled().contains(participant) { "  (paid)" } else { "" };
            writeln!(
                out,
                "  {:<12} {:>10}{}",
                participant.display_name(),
                receipt.split_for(participant).to_string(),
                paid
            )?;
        } else {
            writeln!(
                out,
                "  {:<12} {:>10}",
                participant.display_name(),
                receipt.participant_total(participant)?.to_string()
            )?;
        }
    }

    if receipt.is_completed() {
        let status = receipt.payment_status();
        if status.total > 0 {
            writeln!(out, "  payments: {}/{}", status.paid, status.total)?;
        }
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, summary: Option<&BalanceSummary>) -> CliResult<()> {
    let Some(summary) = summary else {
        writeln!(out, "No completed receipts.")?;
        return Ok(());
    };

    writeln!(out, "Completed receipts: {}", summary.completed_count)?;
    if summary.is_all_settled() {
        writeln!(out, "All settled up.")?;
        return Ok(());
    }

    writeln!(out, "\nBalances:")?;
    for participant in &summary.participating {
        let balance = summary.balances.get(participant).copied().unwrap_or_default();
        writeln!(out, "  {:<12} {:>10}", participant.display_name(), balance.to_string())?;
    }

    writeln!(out, "\nDebts:")?;
    for debt in &summary.debts {
        writeln!(
            out,
            "  {} owes {} {}",
            debt.from.display_name(),
            debt.to.display_name(),
            debt.amount
        )?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
