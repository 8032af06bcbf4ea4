use crate::models::{HumourTag, Preferences, User};

/// Gender predicate of the feed
///
/// Without a preference everyone passes. With one, the candidate needs a
/// recorded gender equal to it, ignoring case.
#[inline]
pub fn matches_gender(candidate: &User, preferences: &Preferences) -> bool {
    let Some(wanted) = preferences.gender() else {
        return true;
    };

    candidate
        .profile
        .gender()
        .is_some_and(|gender| gender.to_lowercase() == wanted.to_lowercase())
}

/// Age predicate of the feed
///
/// Only applies when both bounds are set. Bounds are inclusive and candidates
/// without a recorded age are dropped.
#[inline]
pub fn matches_age_range(candidate: &User, preferences: &Preferences) -> bool {
    let Some((min, max)) = preferences.age_range() else {
        return true;
    };

    candidate
        .profile
        .age
        .is_some_and(|age| (min..=max).contains(&age))
}

#[inline]
pub fn matches_preferences(candidate: &User, preferences: &Preferences) -> bool {
    matches_gender(candidate, preferences) && matches_age_range(candidate, preferences)
}

/// Humour tags of the candidate that the requester is looking for
pub fn shared_humour_tags(candidate: &User, preferences: &Preferences) -> Vec<HumourTag> {
    candidate
        .profile
        .humour_tags
        .intersection(&preferences.humour_tags)
        .cloned()
        .collect()
}
