use closedloop::io;
use closedloop::types::{MemoryLedger, PaymentSystem, EMISSION_ACCOUNT_ID};
use rust_decimal::Decimal;
use std::{fs::File, io::BufReader};
use tracing_subscriber::EnvFilter;

const FIRST_ACCOUNT: &str = "BY12345678901234567890123456";
const SECOND_ACCOUNT: &str = "BY98765432109876543210987654";

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut ledger = MemoryLedger::new();
    for id in [FIRST_ACCOUNT, SECOND_ACCOUNT] {
        ledger
            .open_account(id)
            .unwrap_or_else(|err| panic!("Couldn't open account {id}: {err}"));
    }
    println!("Initial accounts info: {}", accounts_info(&ledger));

    ledger
        .emit_money(Decimal::from(1000))
        .unwrap_or_else(|err| panic!("Failed to emit money: {err}"));
    println!("After emission: {}", accounts_info(&ledger));

    match std::env::args().nth(1) {
        Some(requests_filename) => {
            let requests_file = File::open(&requests_filename).unwrap_or_else(|err| {
                panic!("Couldn't open transfer requests at {requests_filename}: {err}")
            });
            let mut requests_reader = BufReader::new(requests_file);
            let summary = io::load_transfer_requests(&mut requests_reader, &mut ledger)
                .unwrap_or_else(|err| panic!("Failed to load transfer requests: {err}"));
            tracing::info!(
                applied = summary.applied,
                rejected = summary.rejected,
                "loaded transfer requests"
            );
        }
        None => {
            let request = format!(
                r#"{{"from":"{EMISSION_ACCOUNT_ID}","to":"{FIRST_ACCOUNT}","amount":500}}"#
            );
            if let Err(err) = ledger.transfer_money_from_request(&request) {
                tracing::warn!(error = %err, "transfer rejected");
            }
        }
    }
    println!("After transfer: {}", accounts_info(&ledger));

    let mut stdout = std::io::stdout().lock();
    io::write_accounts_to_csv(&mut stdout, &ledger)
        .unwrap_or_else(|err| panic!("Failed to write accounts to CSV: {err}"));
}

fn accounts_info(ledger: &MemoryLedger) -> String {
    ledger
        .accounts_info()
        .unwrap_or_else(|err| panic!("Failed to encode accounts info: {err}"))
}
