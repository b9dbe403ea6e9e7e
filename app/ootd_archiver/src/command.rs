const ARCHIVE: &str = "archive";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Archive {
        month: String,
        year: String,
        reaction: Option<String>,
    },
    /// `archive` without its required arguments.
    Usage,
    Ignored,
}

pub fn parse(prefix: &str, content: &str) -> Command {
    let Some(rest) = content.trim_start().strip_prefix(prefix) else {
        return Command::Ignored;
    };
    let mut words = rest.split_whitespace();
    if !rest.starts_with(ARCHIVE) || words.next() != Some(ARCHIVE) {
        return Command::Ignored;
    }
    match (words.next(), words.next()) {
        (Some(month), Some(year)) => Command::Archive {
            month: month.to_owned(),
            year: year.to_owned(),
            reaction: words.next().map(str::to_owned),
        },
        _ => Command::Usage,
    }
}

pub fn usage(prefix: &str) -> String {
    format!(
        "Usage:\n\
         `{prefix}archive <month> <year> [reaction]`\n\
         - `<month>`: 1-12 or month name (e.g., 2 or February)\n\
         - `<year>`: full year (e.g., 2026)\n\
         Example: `{prefix}archive 2 2026` or `{prefix}archive February 2026`"
    )
}
