//! Reduces a group to the one type and date that place all of its members.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::Category;
use crate::grouping::Group;

/// Type and date shared by every member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupVerdict {
    pub resolved_type: Category,
    pub resolved_date: NaiveDate,
}

/// Resolves a group's type and date.
///
/// - Type: the first member, in discovery order, whose coarse type is image,
///   audio or video decides. Groups with no such member are `Other`.
/// - Date: the earliest `captured_at`, falling back per member to
///   `modified_at`, as a UTC calendar date.
///
/// # Errors
///
/// `OrganizeError::EmptyGroup` if the group has no members.
pub fn reduce(group: &Group) -> OrganizeResult<GroupVerdict> {
    let earliest = group
        .members
        .iter()
        .map(|member| member.effective_time())
        .min()
        .ok_or_else(|| OrganizeError::EmptyGroup(group.key.clone()))?;

    let resolved_type = group
        .members
        .iter()
        .filter_map(|member| member.coarse_type)
        .find(Category::is_media)
        .unwrap_or(Category::Other);

    Ok(GroupVerdict {
        resolved_type,
        resolved_date: earliest.date_naive(),
    })
}
