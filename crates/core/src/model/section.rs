use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level portfolio category. Maps to the `sections` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub icon: String,
    pub color: String,
    pub description: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Section {
    /// Icon to render; names outside the icon set fall back to the default.
    pub fn display_icon(&self) -> SectionIcon {
        SectionIcon::parse(&self.icon).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    pub title: String,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order_index: i32,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}

/// The fixed icon set sections may reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionIcon {
    #[default]
    Heart,
    Users,
    Camera,
    Code,
    PenTool,
}

impl SectionIcon {
    pub const ALL: [SectionIcon; 5] = [
        SectionIcon::Heart,
        SectionIcon::Users,
        SectionIcon::Camera,
        SectionIcon::Code,
        SectionIcon::PenTool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionIcon::Heart => "Heart",
            SectionIcon::Users => "Users",
            SectionIcon::Camera => "Camera",
            SectionIcon::Code => "Code",
            SectionIcon::PenTool => "PenTool",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_names_round_trip() {
        for icon in SectionIcon::ALL {
            assert_eq!(SectionIcon::parse(icon.as_str()), Some(icon));
        }
        assert_eq!(SectionIcon::parse("heart"), None);
    }

    #[test]
    fn unknown_icon_displays_as_default() {
        let now = Utc::now();
        let section = Section {
            id: Uuid::new_v4(),
            title: "Music".into(),
            icon: "Guitar".into(),
            color: "#000000".into(),
            description: String::new(),
            order_index: 0,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(section.display_icon(), SectionIcon::Heart);
    }
}
