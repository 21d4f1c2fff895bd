//! Walk through the main leave flows against in-memory collaborators

use chrono::NaiveDate;
use leave_core::{
    LeaveCategory, LeaveConfig, LeaveLedger, LeaveRequest, LeaveStatus, MemoryBalanceSource,
    MemorySubmitter,
};
use tracing_subscriber::EnvFilter;

fn print_balances(ledger: &LeaveLedger<MemoryBalanceSource, MemorySubmitter>) {
    for (category, days) in ledger.balances().iter() {
        println!("  {:<18} {:>3} days", category.label(), days);
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leave_core=debug")),
        )
        .init();

    let config = LeaveConfig::default();
    let source = MemoryBalanceSource::new(config.balance_sheet()?);
    let submitter = MemorySubmitter::new();
    let mut ledger = LeaveLedger::with_config(source, submitter.clone(), &config)?;

    println!("Opening balances");
    ledger.load_balances().await?;
    print_balances(&ledger);

    // Friday morning, before any of the leave below starts
    let now = NaiveDate::from_ymd_opt(2024, 3, 8)
        .and_then(|d| d.and_hms_opt(8, 30, 0))
        .ok_or("invalid timestamp")?;
    let monday = NaiveDate::from_ymd_opt(2024, 3, 11).ok_or("invalid date")?;
    let wednesday = NaiveDate::from_ymd_opt(2024, 3, 13).ok_or("invalid date")?;
    let friday = NaiveDate::from_ymd_opt(2024, 3, 15).ok_or("invalid date")?;

    println!("1. Apply for three days of earned leave");
    let applied = ledger
        .apply_leave(LeaveCategory::Earned, monday, wednesday, "Family visit", now)
        .await?;
    println!("  {} -> {} days, {:?}", applied.id, applied.duration, applied.status);
    print_balances(&ledger);

    println!("2. Preview switching it to five days of casual leave");
    let mut casual = LeaveRequest::new(
        applied.id.clone(),
        LeaveCategory::Casual.label().to_string(),
        monday,
        friday,
        5,
        applied.reason.clone(),
    );
    casual.status = LeaveStatus::Pending;
    let preview = ledger.preview_update(&applied.id, &casual)?;
    for entry in &preview.impact.entries {
        println!("  {:?} {} {} days", entry.entry_type, entry.category, entry.days);
    }
    println!("  {}", preview.validation.message());
    println!();

    println!("3. Submit the change, but the server rejects it");
    submitter.fail_next();
    match ledger.update_leave(&applied.id, casual.clone(), now).await {
        Ok(_) => println!("  unexpectedly accepted"),
        Err(err) => println!("  {err}; balances rolled back"),
    }
    print_balances(&ledger);

    println!("4. Retry the change");
    ledger.update_leave(&applied.id, casual, now).await?;
    print_balances(&ledger);

    println!("5. Cancel Friday only");
    let plan = ledger.cancel_dates(&applied.id, &[friday], now).await?;
    if let Some(remaining) = plan.remaining() {
        println!(
            "  remaining {} days, {} to {}",
            remaining.duration, remaining.start_date, remaining.end_date
        );
    }
    print_balances(&ledger);

    println!("6. Ask for more casual leave than is left");
    let check = ledger.validate_form("Casual Leave", 12);
    println!("  {}", check.message());

    println!("\n{} submissions sent downstream", submitter.submissions().len());
    Ok(())
}
