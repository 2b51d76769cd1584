use crate::model::NewSection;
use crate::repo::{SectionRepository, StoreResult};

/// (title, icon, color, description)
const DEFAULT_SECTIONS: [(&str, &str, &str, &str); 5] = [
    (
        "Community Action",
        "Heart",
        "#004E98",
        "Housing Justice & Community Building",
    ),
    (
        "Events",
        "Users",
        "#FF6700",
        "Texas Toku Taisen & Cultural Events",
    ),
    (
        "Media",
        "Camera",
        "#3A6EA5",
        "Video Production & Content Creation",
    ),
    (
        "Art & Illustration",
        "PenTool",
        "#FF6700",
        "Digital Art & Traditional Illustrations",
    ),
    ("Development", "Code", "#004E98", "Software & Web Solutions"),
];

pub fn default_sections() -> Vec<NewSection> {
    DEFAULT_SECTIONS
        .iter()
        .zip(1..)
        .map(|(&(title, icon, color, description), order_index)| NewSection {
            title: title.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            description: description.to_string(),
            order_index,
        })
        .collect()
}

/// Insert the default sections when the table is empty. Returns how many
/// sections were inserted.
pub async fn seed_default_sections(sections: &dyn SectionRepository) -> StoreResult<usize> {
    let existing = sections.list().await?;
    if !existing.is_empty() {
        tracing::debug!(count = existing.len(), "sections already present, skipping seed");
        return Ok(0);
    }

    let defaults = default_sections();
    let count = defaults.len();
    for section in defaults {
        sections.insert(section).await?;
    }
    tracing::info!(count, "seeded default sections");
    Ok(count)
}
