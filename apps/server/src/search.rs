//! Listing search: case-insensitive substring predicates over the static
//! catalog. The handler puts a fixed delay in front of it to mimic a slow
//! "AI search" backend.

use serde::Deserialize;
use std::time::Duration;

use crate::booking::{ServiceDescriptor, VisitType};
use crate::catalog::Listing;

/// Default artificial latency before search results are returned.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(1500);

/// Every present predicate must hold.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchQuery {
    /// Free text matched against name, specialty, location and tags.
    pub q: Option<String>,
    pub location: Option<String>,
    pub specialty: Option<String>,
    pub max_fee: Option<i64>,
    pub min_rating: Option<f32>,
    pub visit_type: Option<VisitType>,
    #[serde(default)]
    pub available_only: bool,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `None` and blank strings match everything.
fn text_matches(value: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(n) => contains_ci(value, n),
    }
}

impl SearchQuery {
    pub fn matches(&self, listing: &Listing) -> bool {
        let free_text = match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                contains_ci(listing.name(), q)
                    || contains_ci(listing.specialty(), q)
                    || contains_ci(listing.location(), q)
                    || listing.tags().iter().any(|t| contains_ci(t, q))
            }
        };

        free_text
            && text_matches(listing.location(), self.location.as_deref())
            && text_matches(listing.specialty(), self.specialty.as_deref())
            && self.max_fee.map_or(true, |max| listing.base_fee() <= max)
            && self.min_rating.map_or(true, |min| listing.rating() >= min)
            && self
                .visit_type
                .map_or(true, |vt| listing.visit_types().contains(&vt))
            && (!self.available_only || listing.available())
    }
}

/// Filter listings, preserving catalog order.
pub fn filter_listings(listings: Vec<Listing>, query: &SearchQuery) -> Vec<Listing> {
    let total = listings.len();
    let matched: Vec<Listing> = listings.into_iter().filter(|l| query.matches(l)).collect();
    tracing::debug!("search matched {}/{} listings", matched.len(), total);
    matched
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::FlowKind;
    use crate::catalog::listings;

    fn ids(found: &[Listing]) -> Vec<&str> {
        found.iter().map(|l| l.id()).collect()
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let all = listings(FlowKind::DoctorConsultation);
        let n = all.len();
        assert_eq!(filter_listings(all, &SearchQuery::default()).len(), n);
    }

    #[test]
    fn test_free_text_is_case_insensitive() {
        let query = SearchQuery {
            q: Some("CARDIO".into()),
            ..Default::default()
        };
        let found = filter_listings(listings(FlowKind::DoctorConsultation), &query);
        assert_eq!(ids(&found), vec!["doc-1"]);
    }

    #[test]
    fn test_free_text_matches_tags() {
        let query = SearchQuery {
            q: Some("first aid".into()),
            ..Default::default()
        };
        let found = filter_listings(listings(FlowKind::Childcare), &query);
        assert_eq!(ids(&found), vec!["nanny-1", "nanny-3"]);
    }

    #[test]
    fn test_predicates_combine() {
        let query = SearchQuery {
            location: Some("bengaluru".into()),
            max_fee: Some(1400),
            ..Default::default()
        };
        let found = filter_listings(listings(FlowKind::NurseVisit), &query);
        assert_eq!(ids(&found), vec!["nurse-2"]);
    }

    #[test]
    fn test_available_only_hides_unavailable() {
        let query = SearchQuery {
            available_only: true,
            ..Default::default()
        };
        let found = filter_listings(listings(FlowKind::DoctorConsultation), &query);
        assert!(!ids(&found).contains(&"doc-4"));
    }

    #[test]
    fn test_visit_type_and_rating() {
        let query = SearchQuery {
            visit_type: Some(VisitType::Video),
            min_rating: Some(4.7),
            ..Default::default()
        };
        let found = filter_listings(listings(FlowKind::DoctorConsultation), &query);
        assert_eq!(ids(&found), vec!["doc-1", "doc-3"]);
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let query = SearchQuery {
            q: Some("   ".into()),
            specialty: Some(String::new()),
            ..Default::default()
        };
        let found = filter_listings(listings(FlowKind::Emergency), &query);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let query = SearchQuery {
            q: Some("veterinary".into()),
            ..Default::default()
        };
        assert!(filter_listings(listings(FlowKind::Emergency), &query).is_empty());
    }
}
