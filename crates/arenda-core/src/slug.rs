//! # Slug Assignment
//!
//! Deterministic, collision-resolving URL identifiers for catalog entities.
//!
//! ## How Assignment Works
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  assign_slug("Chairs", is_taken)                                  │
//! │       │                                                           │
//! │       ▼                                                           │
//! │  slugify → "chairs"                                               │
//! │       │                                                           │
//! │       ├── "chairs" free?    → adopt it                            │
//! │       ├── "chairs-1" free?  → adopt it                            │
//! │       ├── "chairs-2" free?  → adopt it                            │
//! │       │   ... up to MAX_SLUG_ATTEMPTS ...                         │
//! │       └── all taken → "chairs-3f9a21bc" (randomized suffix)       │
//! │                                                                   │
//! │  The is_taken lookup must exclude the entity's own record, so     │
//! │  renaming back to one's own slug is a no-op, not a collision.     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter is bounded: a pathological number of same-named siblings
//! falls through to a randomized suffix instead of looping, and the
//! store's UNIQUE constraint backstops the residual race.

use uuid::Uuid;

use crate::error::ValidationError;
use crate::MAX_SLUG_ATTEMPTS;

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes a display name to a URL-safe base token.
///
/// Lowercases, keeps alphanumerics, maps separator runs to single
/// hyphens, drops everything else, trims hyphens from both ends.
///
/// ## Example
/// ```rust
/// use arenda_core::slug::slugify;
///
/// assert_eq!(slugify("Folding Chair"), "folding-chair");
/// assert_eq!(slugify("  Tents & Marquees  "), "tents-marquees");
/// ```
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            // Separators and punctuation collapse into one hyphen.
            pending_hyphen = true;
        }
    }

    out
}

// =============================================================================
// Assignment
// =============================================================================

/// Assigns a unique slug for `name`.
///
/// `is_taken` answers whether a candidate slug is already used by
/// *another* record of the same entity type; the caller excludes the
/// entity's own current row. Call this only for new records or when the
/// name actually changed; stable slugs are not regenerated on unrelated
/// edits.
///
/// ## Errors
/// Rejects names that are empty (or normalize to nothing) before any
/// candidate is tried.
pub fn assign_slug<F>(name: &str, mut is_taken: F) -> Result<String, ValidationError>
where
    F: FnMut(&str) -> bool,
{
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    let base = slugify(name);
    if base.is_empty() {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "normalizes to an empty slug".to_string(),
        });
    }

    if !is_taken(&base) {
        return Ok(base);
    }

    for n in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{base}-{n}");
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    // Counter exhausted. A random suffix breaks the pathological run;
    // the store's UNIQUE constraint catches the (negligible) collision.
    Ok(randomized_slug(&base))
}

/// A slug candidate with a randomized 8-hex suffix.
///
/// Used as the bounded-counter fallback and by the store layer to retry
/// once after losing a concurrent-create race on the UNIQUE constraint.
pub fn randomized_slug(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{base}-{}", &suffix[..8])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Chairs"), "chairs");
        assert_eq!(slugify("Folding Chair"), "folding-chair");
        assert_eq!(slugify("  Tents & Marquees  "), "tents-marquees");
        assert_eq!(slugify("Table--Round"), "table-round");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_assign_first_use_adopts_base() {
        let taken: HashSet<String> = HashSet::new();
        let slug = assign_slug("Chairs", |s| taken.contains(s)).unwrap();
        assert_eq!(slug, "chairs");
    }

    #[test]
    fn test_assign_collision_appends_counter() {
        let taken: HashSet<String> = ["chairs".to_string()].into_iter().collect();
        let slug = assign_slug("Chairs", |s| taken.contains(s)).unwrap();
        assert_eq!(slug, "chairs-1");

        let taken: HashSet<String> = ["chairs".to_string(), "chairs-1".to_string()]
            .into_iter()
            .collect();
        let slug = assign_slug("Chairs", |s| taken.contains(s)).unwrap();
        assert_eq!(slug, "chairs-2");
    }

    #[test]
    fn test_rename_back_to_own_slug_is_not_a_collision() {
        // The caller's lookup excludes the entity's own row, so the base
        // reads as free even though this entity already uses it.
        let other_slugs: HashSet<String> = ["tables".to_string()].into_iter().collect();
        let slug = assign_slug("Chairs", |s| other_slugs.contains(s)).unwrap();
        assert_eq!(slug, "chairs");
    }

    #[test]
    fn test_empty_and_unsluggable_names_rejected() {
        assert!(assign_slug("", |_| false).is_err());
        assert!(assign_slug("   ", |_| false).is_err());
        assert!(assign_slug("!!!", |_| false).is_err());
    }

    #[test]
    fn test_counter_is_bounded() {
        // Everything taken: the loop must terminate with a randomized
        // suffix instead of spinning.
        let mut calls = 0usize;
        let slug = assign_slug("Chairs", |_| {
            calls += 1;
            true
        })
        .unwrap();

        assert!(calls <= MAX_SLUG_ATTEMPTS + 1);
        assert!(slug.starts_with("chairs-"));
        assert_eq!(slug.len(), "chairs-".len() + 8);
    }
}
