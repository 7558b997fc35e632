use std::{io::Write, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::{
    common::{
        config::Config,
        error::AppError,
        event::LedgerCommand,
        money::{Money, format_currency_short},
    },
    domain::{
        party::PartyId,
        transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch, TxKind},
    },
    io::{memory::MemoryStore, store::LedgerStore, writer},
    worker::{
        cache::LedgerCache,
        processor::{Outcome, Processor},
        session::LedgerSession,
    },
};

#[derive(Parser, Debug)]
#[command(name = "debt_ledger", version, about = "Track informal debts with the people around you")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Ledger data file (overrides the config)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Party management
    Party {
        #[command(subcommand)]
        action: PartyAction,
    },
    /// Transaction operations
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },
    /// Consolidated balance of every party
    Balances {
        /// Write a CSV report instead of a table
        #[arg(long)]
        csv: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PartyAction {
    /// Add a party
    Add { name: String },
    /// Rename a party
    Rename { id: PartyId, name: String },
    /// Remove a party whose balance is settled
    Remove { id: PartyId },
    /// List parties with their balances
    List,
}

#[derive(Subcommand, Debug)]
pub enum TxAction {
    /// Record a transaction against a party
    Add {
        party: PartyId,
        amount: Money,
        /// `owed` (they owe you) or `owe` (you owe them)
        kind: TxKind,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a transaction
    Update {
        id: TransactionId,
        #[arg(long)]
        amount: Option<Money>,
        #[arg(long)]
        kind: Option<TxKind>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// An empty string clears the description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a transaction
    Delete { id: TransactionId },
    /// Show a party's transactions, newest first
    List { party: PartyId },
}

/// Opens the data file, runs one command against a fresh session and closes
/// the session again.
pub async fn run<W: Write>(cli: Cli, config: Config, out: &mut W) -> Result<(), AppError> {
    let data_file = cli.data.unwrap_or_else(|| config.data_file.clone());
    let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::open(&data_file).await?);
    let session = LedgerSession::start(store, config.rename_delay()).await?;

    let result = execute(session.cache(), cli.command, out).await;
    for failure in session.close().await {
        warn!(party = %failure.party, name = %failure.name, error = %failure.error, "rename not applied");
    }
    result
}

async fn execute<W: Write>(
    cache: &LedgerCache,
    command: Commands,
    out: &mut W,
) -> Result<(), AppError> {
    let command = match command {
        Commands::Party { action } => match action {
            PartyAction::Add { name } => LedgerCommand::AddParty { name },
            PartyAction::Rename { id, name } => LedgerCommand::RenameParty { party: id, name },
            PartyAction::Remove { id } => LedgerCommand::RemoveParty { party: id },
            PartyAction::List => return list_parties(cache, out).await,
        },
        Commands::Tx { action } => match action {
            TxAction::Add {
                party,
                amount,
                kind,
                date,
                description,
            } => {
                let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                let mut new = NewTransaction::new(party, date, amount, kind);
                if let Some(description) = description {
                    new = new.with_description(description);
                }
                LedgerCommand::AddTransaction(new)
            }
            TxAction::Update {
                id,
                amount,
                kind,
                date,
                description,
            } => LedgerCommand::UpdateTransaction {
                tx: id,
                patch: TransactionPatch {
                    date,
                    amount,
                    kind,
                    description,
                },
            },
            TxAction::Delete { id } => LedgerCommand::DeleteTransaction { tx: id },
            TxAction::List { party } => return list_statement(cache, party, out).await,
        },
        Commands::Balances { csv: true } => {
            let parties = cache.parties().await;
            let balances = cache.consolidated().await;
            writer::write_balances(&mut *out, &parties, &balances)?;
            return Ok(());
        }
        Commands::Balances { csv: false } => return list_parties(cache, out).await,
    };

    let mut processor = Processor::new();
    match processor.process(cache, command).await? {
        Outcome::Party(party) => writeln!(out, "party {} {}", party.id, party.name)?,
        Outcome::PartyRemoved(id) => writeln!(out, "removed party {id}")?,
        Outcome::Transaction(tx) => writeln!(out, "{}", describe(&tx))?,
        Outcome::TransactionDeleted(id) => writeln!(out, "deleted transaction {id}")?,
    }
    Ok(())
}

async fn list_parties<W: Write>(cache: &LedgerCache, out: &mut W) -> Result<(), AppError> {
    let parties = cache.parties().await;
    if parties.is_empty() {
        writeln!(out, "no parties yet")?;
        return Ok(());
    }
    let balances = cache.consolidated().await;
    for party in &parties {
        let balance = balances.get(&party.id).copied().unwrap_or_default();
        writeln!(out, "{}  {:<20} {}", party.id, party.name, signed(balance))?;
    }
    let totals = cache.totals().await;
    writeln!(
        out,
        "owed {}  owe {}  net {}",
        totals.owed, totals.owe, totals.net
    )?;
    Ok(())
}

async fn list_statement<W: Write>(
    cache: &LedgerCache,
    party: PartyId,
    out: &mut W,
) -> Result<(), AppError> {
    let Some(found) = cache.party(party).await else {
        return Err(crate::common::error::LedgerError::not_found("party", party).into());
    };
    writeln!(out, "{}  total {}", found.name, format_currency_short(cache.balance(party).await))?;
    let statement = cache.statement(party).await;
    if statement.is_empty() {
        writeln!(out, "no transactions yet")?;
    }
    for tx in &statement {
        writeln!(out, "{}", describe(tx))?;
    }
    Ok(())
}

fn signed(balance: Money) -> String {
    if balance.is_negative() {
        balance.to_string()
    } else {
        format!("+{balance}")
    }
}

fn describe(tx: &Transaction) -> String {
    let mut line = format!(
        "{} {} {}{}",
        tx.id,
        tx.date,
        if tx.kind == TxKind::Owed { "+" } else { "-" },
        format_currency_short(tx.amount)
    );
    if let Some(description) = &tx.description {
        line.push(' ');
        line.push_str(description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_args(data: &std::path::Path, args: &[&str]) -> Result<String, AppError> {
        let mut argv = vec!["debt_ledger", "--data"];
        let data = data.to_string_lossy().to_string();
        argv.push(&data);
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("valid arguments");

        let mut out = Vec::new();
        run(cli, Config::default(), &mut out).await?;
        Ok(String::from_utf8(out).expect("utf-8 output"))
    }

    #[tokio::test]
    async fn add_party_then_transaction_then_balances() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("ledger.json");

        let added = run_args(&data, &["party", "add", "Alice"]).await.unwrap();
        let id = added.split_whitespace().nth(1).unwrap().to_string();

        run_args(&data, &["tx", "add", &id, "2500", "owed", "--date", "2024-01-01"])
            .await
            .unwrap();
        let report = run_args(&data, &["balances", "--csv"]).await.unwrap();
        let removal = run_args(&data, &["party", "remove", &id]).await;

        assert_eq!(
            report.lines().nth(1).unwrap(),
            format!("{id},Alice,2500.00,2.5 K")
        );
        assert!(matches!(
            removal,
            Err(AppError::Ledger(crate::common::error::LedgerError::BalanceNotZero { .. }))
        ));
    }

    #[tokio::test]
    async fn statement_lists_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("ledger.json");
        let added = run_args(&data, &["party", "add", "Bo"]).await.unwrap();
        let id = added.split_whitespace().nth(1).unwrap().to_string();
        run_args(&data, &["tx", "add", &id, "10", "owe", "--date", "2024-01-01"])
            .await
            .unwrap();
        run_args(&data, &["tx", "add", &id, "30", "owed", "--date", "2024-02-01", "--description", "tickets"])
            .await
            .unwrap();

        let listing = run_args(&data, &["tx", "list", &id]).await.unwrap();

        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "Bo  total 20");
        assert!(lines[1].ends_with("2024-02-01 +30 tickets"));
        assert!(lines[2].ends_with("2024-01-01 -10"));
    }
}
