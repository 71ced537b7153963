use serde::{Deserialize, Serialize};

/// Image listing entry as reported to Shipyard
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Image {
    pub id: String,
    pub created: i64,
    #[serde(deserialize_with = "null_as_empty")]
    pub repo_tags: Vec<String>,
    pub size: i64,
    pub virtual_size: i64,
}

// Docker reports untagged images with `"RepoTags": null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
