use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

static MIGRATION_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*db[/\\]migrate[/\\]\d{14}_[^/\\]*\.rb$").expect("migration path pattern")
});

static VERSION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{14})_").expect("migration version pattern"));

/// True for `.../db/migrate/<14 digits>_<name>.rb`.
pub fn is_migration_file(path: &Path) -> bool {
    match path.to_str() {
        Some(text) if !text.is_empty() => MIGRATION_PATH.is_match(text),
        _ => false,
    }
}

/// The 14-digit timestamp leading the file name, e.g. `20230101000000`.
pub fn extract_version(path: &Path) -> Option<String> {
    let name = path.to_str()?.rsplit(['/', '\\']).next()?;
    VERSION_PREFIX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|version| version.as_str().to_string())
}
