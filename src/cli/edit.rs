use crate::cleaner::parse_date;
use crate::cli::open_session;
use crate::cli::review::print_reconciliation;
use crate::error::{PennyError, Result};

pub fn run(date: &str, details: Option<&str>, category: &str) -> Result<()> {
    let (mut session, settings) = open_session()?;
    let date = parse_date(date, &settings.date_formats)
        .ok_or_else(|| PennyError::Other(format!("Unrecognized date: {date}")))?;
    let details = details.filter(|d| !d.trim().is_empty());
    let result = session.edit_matching(date, details, category)?;
    print_reconciliation(&result);
    Ok(())
}
