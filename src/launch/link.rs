use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;

static GAME_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"games/(\d+)").expect("static regex"));

/// Pulls the numeric place id out of a game page link.
pub fn extract_place_id(link: &str) -> Result<String, AppError> {
    GAME_ID
        .captures(link.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::InvalidGameLink(format!("no 'games/<id>' in '{}'", link.trim())))
}

/// `<scheme>://experience?placeId=<id>` for a game page link.
pub fn deep_link(scheme: &str, link: &str) -> Result<String, AppError> {
    let id = extract_place_id(link)?;
    Ok(format!("{}://experience?placeId={}", scheme, id))
}
