//! Field validation for sections and sub-items.

use thiserror::Error;

use super::section::{NewSection, SectionIcon, SectionPatch};
use super::sub_item::{NewSubItem, SubItemPatch};

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("title cannot be longer than {} characters", MAX_TITLE_LEN)]
    TitleTooLong,
    #[error("unknown icon: {0}")]
    UnknownIcon(String),
    #[error("color must be a #RRGGBB hex value, got {0:?}")]
    InvalidColor(String),
}

pub fn validate_title(title: &str) -> Result<(), FieldError> {
    if title.trim().is_empty() {
        return Err(FieldError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(FieldError::TitleTooLong);
    }
    Ok(())
}

pub fn validate_icon(icon: &str) -> Result<(), FieldError> {
    match SectionIcon::parse(icon) {
        Some(_) => Ok(()),
        None => Err(FieldError::UnknownIcon(icon.to_string())),
    }
}

pub fn validate_color(color: &str) -> Result<(), FieldError> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(FieldError::InvalidColor(color.to_string()))
    }
}

pub fn validate_new_section(section: &NewSection) -> Result<(), FieldError> {
    validate_title(&section.title)?;
    validate_icon(&section.icon)?;
    validate_color(&section.color)
}

pub fn validate_section_patch(patch: &SectionPatch) -> Result<(), FieldError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(icon) = &patch.icon {
        validate_icon(icon)?;
    }
    if let Some(color) = &patch.color {
        validate_color(color)?;
    }
    Ok(())
}

pub fn validate_new_sub_item(item: &NewSubItem) -> Result<(), FieldError> {
    validate_title(&item.title)
}

pub fn validate_sub_item_patch(patch: &SubItemPatch) -> Result<(), FieldError> {
    match &patch.title {
        Some(title) => validate_title(title),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, icon: &str, color: &str) -> NewSection {
        NewSection {
            title: title.into(),
            icon: icon.into(),
            color: color.into(),
            description: String::new(),
            order_index: 1,
        }
    }

    #[test]
    fn accepts_well_formed_section() {
        assert_eq!(validate_new_section(&section("Events", "Users", "#FF6700")), Ok(()));
    }

    #[test]
    fn rejects_blank_title() {
        assert_eq!(
            validate_new_section(&section("   ", "Users", "#FF6700")),
            Err(FieldError::EmptyTitle)
        );
    }

    #[test]
    fn rejects_overlong_title() {
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(validate_title(&title), Err(FieldError::TitleTooLong));
    }

    #[test]
    fn rejects_unknown_icon_and_bad_color() {
        assert_eq!(
            validate_new_section(&section("Events", "Rocket", "#FF6700")),
            Err(FieldError::UnknownIcon("Rocket".into()))
        );
        assert!(matches!(
            validate_color("FF6700"),
            Err(FieldError::InvalidColor(_))
        ));
        assert!(matches!(
            validate_color("#FF67"),
            Err(FieldError::InvalidColor(_))
        ));
    }

    #[test]
    fn patch_only_checks_present_fields() {
        assert_eq!(validate_section_patch(&SectionPatch::default()), Ok(()));
        let patch = SubItemPatch {
            title: Some(String::new()),
            ..SubItemPatch::default()
        };
        assert_eq!(validate_sub_item_patch(&patch), Err(FieldError::EmptyTitle));
    }
}
