use crate::domain::MILLION;

/// Renders a milestone in millions: `24.0M`, or `1.5M` for a hand-edited
/// target that is not a whole million.
pub fn format_milestone(milestone: u64) -> String {
    let whole = milestone / MILLION;
    let fraction = milestone % MILLION;
    if fraction == 0 {
        return format!("{whole}.0M");
    }
    let digits = format!("{fraction:06}");
    format!("{whole}.{}M", digits.trim_end_matches('0'))
}

/// Hashtag form of a display name: all spaces removed
fn name_tag(name: &str) -> String {
    name.replace(' ', "")
}

/// Hashtag form of a handle: leading `@` removed
fn handle_tag(handle: &str) -> &str {
    handle.trim_start_matches('@')
}

/// Composes the single announcement for every milestone a channel crossed in one check.
///
/// The display-name hashtag is only added when it differs, ignoring case,
/// from the handle hashtag.
pub fn compose(name: &str, handle: &str, milestones: &[u64]) -> String {
    let milestones_str = milestones
        .iter()
        .map(|m| format_milestone(*m))
        .collect::<Vec<_>>()
        .join(", ");

    let handle_tag = handle_tag(handle);
    let name_tag = name_tag(name);

    let mut text = format!("{name} passed {milestones_str} subscribers on YouTube! #{handle_tag}");
    if name_tag.to_lowercase() != handle_tag.to_lowercase() {
        text.push_str(&format!(" #{name_tag}"));
    }
    text.push_str(" #YouTube");
    text
}
