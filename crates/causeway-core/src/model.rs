use causeway_shared::CauseDto;
use serde::{Deserialize, Serialize};

pub const UNCLASSIFIED: &str = "Unclassified";

/// A taggable cause, immutable for the lifetime of a screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Cause {
    pub id: u64,
    pub name: String,
    pub classification: String,
}

impl Cause {
    pub fn new(id: u64, name: impl Into<String>, classification: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            classification: classification.into(),
        }
    }

    /// Only the first listed classification counts. A missing or blank one
    /// lands the cause in [`UNCLASSIFIED`].
    pub fn from_dto(dto: &CauseDto) -> Self {
        let classification = dto
            .classifications
            .first()
            .map(|entry| entry.classification.trim())
            .filter(|label| !label.is_empty())
            .unwrap_or(UNCLASSIFIED);

        Self::new(dto.id, dto.name.trim(), classification)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CauseGroup {
    pub name: String,
    pub causes: Vec<Cause>,
}

/// Causes partitioned by classification, groups in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupedCatalog {
    pub groups: Vec<CauseGroup>,
}

impl GroupedCatalog {
    pub fn group(&self, name: &str) -> Option<&CauseGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn causes(&self) -> impl Iterator<Item = &Cause> {
        self.groups.iter().flat_map(|group| group.causes.iter())
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Cause> {
        self.causes().find(|cause| cause.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Cause> {
        self.causes().find(|cause| cause.name == name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.causes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_classification_falls_back_to_unclassified() {
        let dto = CauseDto::new(4, "  Tutoring ", Some("   "));
        let cause = Cause::from_dto(&dto);
        assert_eq!(cause.name, "Tutoring");
        assert_eq!(cause.classification, UNCLASSIFIED);
    }

    #[test]
    fn only_first_classification_is_used() {
        let mut dto = CauseDto::new(5, "Park Restoration", Some("Environment"));
        dto.classifications.push(causeway_shared::ClassificationDto {
            classification: "Community".to_string(),
        });
        assert_eq!(Cause::from_dto(&dto).classification, "Environment");
    }
}
