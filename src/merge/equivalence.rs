use crate::model::News;
use crate::util::trim_trailing_slash;

/// Decides whether two news representations denote the same logical article.
///
/// This is a weaker relation than equality: it matches fetched content
/// against persisted content, so it must stay total and consistent across
/// millions of calls. The precedence is strict and load-bearing:
///
/// 1. GUID, normalized by trimming one trailing slash. Equal GUIDs match
///    regardless of any other field. Different GUIDs that are both permalinks
///    (absent flags count as permalink-like) rule the pair out; a
///    non-permalink GUID on either side falls through.
/// 2. Links, when both are present, decide definitively.
/// 3. Items from different owner feeds never match past this point.
/// 4. Equal titles within the same feed are the last-resort weak signal.
///
/// Reordering these steps changes merge outcomes for real-world malformed
/// feeds (duplicate titles, missing GUIDs); the order is covered by
/// regression tests.
pub fn is_equivalent(a: &News, b: &News) -> bool {
    // Step 1: GUID is authoritative when both sides carry one
    if let (Some(guid_a), Some(guid_b)) = (&a.guid, &b.guid) {
        if guid_a.normalized_value() == guid_b.normalized_value() {
            return true;
        }
        if guid_a.is_permalink() && guid_b.is_permalink() {
            return false;
        }
        // Differing non-permalink GUIDs carry no signal either way
    }

    // Step 2: link decides when both sides have one
    if let (Some(link_a), Some(link_b)) = (&a.link, &b.link) {
        return trim_trailing_slash(link_a) == trim_trailing_slash(link_b);
    }

    // Step 3: title comparison is only meaningful within one feed
    if a.feed_link != b.feed_link {
        return false;
    }

    // Step 4: same-feed title match
    if let (Some(title_a), Some(title_b)) = (&a.title, &b.title) {
        if title_a == title_b {
            return true;
        }
    }

    false
}
