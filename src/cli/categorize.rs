use crate::cli::open_session;
use crate::error::Result;

pub fn run() -> Result<()> {
    let (mut session, _) = open_session()?;
    let result = session.categorize()?;
    println!(
        "{} categorized, {} uncategorized",
        result.categorized, result.uncategorized
    );
    Ok(())
}
