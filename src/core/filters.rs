use crate::models::{Event, UserPreferences};

/// Check if an event passes the user's category and location filters
///
/// An empty filter list on either axis matches everything on that axis.
#[inline]
pub fn matches_preferences(event: &Event, preferences: &UserPreferences) -> bool {
    // Check category preference
    if !preferences.categories.is_empty()
        && !preferences.categories.contains(&event.category) {
        return false;
    }

    // Check location preference
    if !preferences.locations.is_empty()
        && !preferences.locations.contains(&event.location) {
        return false;
    }

    true
}
