use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    common::error::StoreError,
    domain::{ledger::Ledger, party::Party, transaction::Transaction},
};

#[derive(Serialize)]
/// On-disk layout: `{"parties": [...], "transactions": [...]}`.
struct SnapshotRef<'a> {
    parties: &'a [Party],
    transactions: &'a [Transaction],
}

#[derive(Deserialize, Default)]
struct SnapshotOwned {
    #[serde(default)]
    parties: Vec<Party>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// Reads a snapshot file. A missing file is an empty ledger.
pub async fn read(path: &Path) -> Result<Ledger, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Ledger::new()),
        Err(e) => return Err(transport(path, e)),
    };
    let snapshot: SnapshotOwned = serde_json::from_slice(&bytes).map_err(|e| {
        StoreError::Transport(format!("corrupt snapshot {}: {e}", path.display()))
    })?;
    let ledger = Ledger::from_parts(snapshot.parties, snapshot.transactions);
    if ledger.volume().is_none() {
        return Err(StoreError::Transport(format!(
            "corrupt snapshot {}: amounts overflow the ledger total",
            path.display()
        )));
    }
    Ok(ledger)
}

/// Writes the ledger next to `path` and renames it into place.
pub async fn write(path: &Path, ledger: &Ledger) -> Result<(), StoreError> {
    let snapshot = SnapshotRef {
        parties: ledger.parties(),
        transactions: ledger.transactions(),
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| StoreError::Transport(format!("encode snapshot: {e}")))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| transport(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| transport(path, e))
}

fn transport(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Transport(format!("{}: {e}", path.display()))
}
