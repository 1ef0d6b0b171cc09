use crate::cli::open_session;
use crate::error::Result;
use crate::models::UNCATEGORIZED;

pub fn run() -> Result<()> {
    let (session, settings) = open_session()?;
    let paths = session.paths();

    println!("Data dir:      {}", settings.data_dir);
    println!("Rules:         {}", paths.rules.display());
    println!("Transactions:  {}", paths.transactions.display());
    println!("Currency:      {}", settings.currency);

    let txns = session.transactions();
    let debits = session.debit_view().len();
    let credits = session.credits().len();
    let uncategorized = txns.iter().filter(|t| t.category == UNCATEGORIZED).count();

    println!();
    println!("Categories:    {}", session.rules().categories().len());
    println!("Keywords:      {}", session.rules().keyword_count());
    println!("Transactions:  {}", txns.len());
    println!("  Debits:      {debits}");
    println!("  Credits:     {credits}");
    println!("Uncategorized: {uncategorized}");
    Ok(())
}
