//! Groups descriptors that share a group key.

use std::collections::BTreeMap;

use crate::file_info::FileDescriptor;

/// Files sharing one group key, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub members: Vec<FileDescriptor>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Collects descriptors into groups keyed by `group_key`.
///
/// Member order inside a group follows input order, which the reducer relies
/// on for type precedence.
pub fn group_descriptors(descriptors: Vec<FileDescriptor>) -> BTreeMap<String, Group> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for descriptor in descriptors {
        groups
            .entry(descriptor.group_key.clone())
            .or_insert_with_key(|key| Group {
                key: key.clone(),
                members: Vec::new(),
            })
            .members
            .push(descriptor);
    }
    groups
}
