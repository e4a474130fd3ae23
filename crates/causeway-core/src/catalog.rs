use std::collections::{HashMap, HashSet};

use causeway_shared::CauseDto;
use tracing::{debug, info, warn};

use crate::api::CategoryApi;
use crate::credentials::{TokenStore, bearer_token};
use crate::error::TaggingResult;
use crate::model::{Cause, CauseGroup, GroupedCatalog};

/// Partition a flat cause feed by classification.
///
/// Group order and the order of causes inside a group both follow first
/// appearance in `feed`. Repeated ids and repeated (trimmed) names keep
/// their first occurrence, so every name maps to exactly one id.
pub fn group(feed: &[CauseDto]) -> GroupedCatalog {
    let mut groups: Vec<CauseGroup> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    let mut seen_ids: HashSet<u64> = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for dto in feed {
        if !seen_ids.insert(dto.id) {
            warn!(id = dto.id, name = %dto.name, "dropping duplicate cause id in feed");
            continue;
        }

        let cause = Cause::from_dto(dto);
        if !seen_names.insert(cause.name.clone()) {
            warn!(id = cause.id, name = %cause.name, "dropping duplicate cause name in feed");
            continue;
        }

        let idx = *index_by_name
            .entry(cause.classification.clone())
            .or_insert_with(|| {
                groups.push(CauseGroup {
                    name: cause.classification.clone(),
                    causes: vec![],
                });
                groups.len() - 1
            });
        groups[idx].causes.push(cause);
    }

    GroupedCatalog { groups }
}

/// Reads the cause catalog once per call.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    authenticated: bool,
}

impl CatalogLoader {
    pub fn new(authenticated: bool) -> Self {
        Self { authenticated }
    }

    #[tracing::instrument(skip(self, api, tokens), fields(authenticated = self.authenticated))]
    pub async fn load<A>(&self, api: &A, tokens: &dyn TokenStore) -> TaggingResult<Vec<CauseDto>>
    where
        A: CategoryApi + ?Sized,
    {
        let token = if self.authenticated {
            Some(bearer_token(tokens)?)
        } else {
            None
        };

        let feed = api.fetch_categories(token.as_deref()).await?;
        info!(count = feed.len(), "loaded cause catalog");
        debug!(ids = ?feed.iter().map(|dto| dto.id).collect::<Vec<_>>(), "catalog ids");
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNCLASSIFIED;

    fn feed() -> Vec<CauseDto> {
        vec![
            CauseDto::new(1, "Beach Cleanup", Some("Environment")),
            CauseDto::new(2, "Food Drive", Some("Community")),
            CauseDto::new(3, "Tree Planting", Some("Environment")),
        ]
    }

    #[test]
    fn groups_in_first_seen_order() {
        let catalog = group(&feed());

        assert_eq!(catalog.group_names(), vec!["Environment", "Community"]);
        let environment = catalog.group("Environment").expect("environment group");
        let names: Vec<&str> = environment.causes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Beach Cleanup", "Tree Planting"]);
        let community = catalog.group("Community").expect("community group");
        assert_eq!(community.causes.len(), 1);
        assert_eq!(community.causes[0].name, "Food Drive");
    }

    #[test]
    fn grouping_is_repeatable() {
        let input = feed();
        assert_eq!(group(&input), group(&input));
    }

    #[test]
    fn causes_without_classification_are_unclassified() {
        let input = vec![
            CauseDto::new(9, "Mentoring", None),
            CauseDto::new(1, "Beach Cleanup", Some("Environment")),
            CauseDto::new(10, "Blood Drive", None),
        ];
        let catalog = group(&input);

        assert_eq!(catalog.group_names(), vec![UNCLASSIFIED, "Environment"]);
        let unclassified = catalog.group(UNCLASSIFIED).expect("unclassified group");
        let ids: Vec<u64> = unclassified.causes.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![9, 10]);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let input = vec![
            CauseDto::new(1, "Beach Cleanup", Some("Environment")),
            CauseDto::new(1, "Beach Cleanup (old)", Some("Legacy")),
        ];
        let catalog = group(&input);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.group_names(), vec!["Environment"]);
    }

    #[test]
    fn duplicate_names_keep_first_occurrence() {
        let input = vec![
            CauseDto::new(2, "Food Drive", Some("Community")),
            CauseDto::new(5, " Food Drive ", Some("Health")),
            CauseDto::new(6, "Blood Drive", Some("Health")),
        ];
        let catalog = group(&input);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find_by_name("Food Drive").map(|c| c.id), Some(2));
        assert!(catalog.find_by_id(5).is_none());
        let health = catalog.group("Health").expect("health group");
        assert_eq!(health.causes.len(), 1);
        assert_eq!(health.causes[0].id, 6);
    }

    #[test]
    fn empty_feed_yields_empty_catalog() {
        assert!(group(&[]).is_empty());
    }
}
