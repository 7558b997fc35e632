//! debt_ledger: balances of informal debts with counterparties, kept in a
//! cache that stays consistent with an authoritative store.

pub mod app;

pub mod common {
    pub mod config;
    pub mod error;
    pub mod event;
    pub mod money;
}

pub mod domain {
    pub mod balance;
    pub mod ledger;
    pub mod party;
    pub mod transaction;
}

pub mod io {
    pub mod memory;
    pub mod snapshot;
    pub mod store;
    pub mod writer;
}

pub mod worker {
    pub mod cache;
    pub mod debounce;
    pub mod processor;
    pub mod session;

    pub mod handlers {
        pub mod party;
        pub mod transaction;
    }
}
