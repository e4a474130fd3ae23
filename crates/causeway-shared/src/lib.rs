use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ClassificationDto {
  pub classification: String
}

/// One record of the category feed as
/// served by `GET /missions/categories/`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct CauseDto {
  pub id:              u64,
  pub name:            String,
  #[serde(default)]
  pub classifications:
    Vec<ClassificationDto>
}

impl CauseDto {
  pub fn new(
    id: u64,
    name: impl Into<String>,
    classification: Option<&str>
  ) -> Self {
    Self {
      id,
      name: name.into(),
      classifications: classification
        .map(|label| {
          vec![ClassificationDto {
            classification: label
              .to_string()
          }]
        })
        .unwrap_or_default()
    }
  }
}

/// Body of `PUT /missions/categories/user/`.
/// The server replaces the stored set with
/// this one.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct CategoriesUpdate {
  pub categories: Vec<u64>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub enum ScreenName {
  CompleteProfile,
  CreatePost
}

impl ScreenName {
  pub fn as_str(&self) -> &'static str {
    match self {
      | ScreenName::CompleteProfile => {
        "CompleteProfile"
      }
      | ScreenName::CreatePost => {
        "CreatePost"
      }
    }
  }
}

/// Carried from the onboarding cause
/// step to the next onboarding screen.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct OnboardingPayload {
  pub categories: Vec<u64>,
  #[serde(default)]
  pub draft:      BTreeMap<String, String>
}

/// Handed back to the post composer after
/// the user tags a post.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct PostDraftPayload {
  pub categories:     Vec<u64>,
  pub category_names: Vec<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(tag = "kind", content = "data")]
pub enum NavigationPayload {
  Onboarding(OnboardingPayload),
  PostDraft(PostDraftPayload)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cause_feed_decodes_with_and_without_classifications()
   {
    let raw = r#"[
      {"id":1,"name":"Beach Cleanup","classifications":[{"classification":"Environment"}]},
      {"id":7,"name":"Mentoring"}
    ]"#;
    let causes: Vec<CauseDto> =
      serde_json::from_str(raw)
        .expect("decode feed");

    assert_eq!(causes.len(), 2);
    assert_eq!(
      causes[0],
      CauseDto::new(
        1,
        "Beach Cleanup",
        Some("Environment")
      )
    );
    assert!(
      causes[1]
        .classifications
        .is_empty()
    );
  }

  #[test]
  fn categories_update_uses_categories_key()
  {
    let body = CategoriesUpdate {
      categories: vec![1, 3]
    };
    let json = serde_json::to_string(
      &body
    )
    .expect("encode body");
    assert_eq!(
      json,
      r#"{"categories":[1,3]}"#
    );
  }

  #[test]
  fn navigation_payload_is_tagged_by_kind()
  {
    let payload =
      NavigationPayload::PostDraft(
        PostDraftPayload {
          categories:     vec![2],
          category_names: vec![
            "Food Drive".to_string(),
          ]
        }
      );
    let value = serde_json::to_value(
      &payload
    )
    .expect("encode payload");
    assert_eq!(
      value["kind"],
      "PostDraft"
    );
    assert_eq!(
      value["data"]["categories"][0],
      2
    );
  }
}
