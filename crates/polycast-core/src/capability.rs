// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static per-platform capability descriptors and the operations they gate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::types::ContentType;

/// What an adapter instance is allowed to do and the limits it enforces.
///
/// Built once from static platform knowledge and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub can_post: bool,
    pub can_comment: bool,
    pub can_share: bool,
    pub can_delete: bool,
    pub can_edit: bool,
    pub can_like: bool,
    pub can_follow: bool,
    pub can_message: bool,
    pub can_mention: bool,

    pub supports_webhooks: bool,
    pub supports_analytics: bool,
    pub supports_scheduling: bool,
    pub supports_polls: bool,

    pub content_types: BTreeSet<ContentType>,
    /// Maximum body length in characters.
    pub max_content_length: usize,
    /// Maximum size of a single media attachment in bytes. `None` means no
    /// media limit is published.
    pub max_media_size: Option<u64>,
}

impl CapabilityDescriptor {
    /// Whether the capability flag behind `operation` is set.
    pub fn allows(&self, operation: Operation) -> bool {
        match operation {
            Operation::Post => self.can_post,
            Operation::Comment => self.can_comment,
            Operation::Share => self.can_share,
            Operation::Delete => self.can_delete,
            Operation::Like | Operation::Unlike => self.can_like,
            Operation::Follow | Operation::Unfollow => self.can_follow,
        }
    }

    pub fn supports_content_type(&self, content_type: ContentType) -> bool {
        self.content_types.contains(&content_type)
    }

    /// Operations this descriptor allows, in declaration order.
    pub fn allowed_operations(&self) -> Vec<Operation> {
        use strum::IntoEnumIterator;
        Operation::iter().filter(|op| self.allows(*op)).collect()
    }
}

/// A write operation routed through the adapter pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Post,
    Comment,
    Share,
    Delete,
    Like,
    Unlike,
    Follow,
    Unfollow,
}

impl Operation {
    /// Name of the capability flag that gates this operation.
    pub fn capability_flag(self) -> &'static str {
        match self {
            Operation::Post => "can_post",
            Operation::Comment => "can_comment",
            Operation::Share => "can_share",
            Operation::Delete => "can_delete",
            Operation::Like | Operation::Unlike => "can_like",
            Operation::Follow | Operation::Unfollow => "can_follow",
        }
    }

    /// Operations that carry user-authored content and run content validation.
    pub fn produces_content(self) -> bool {
        matches!(self, Operation::Post | Operation::Comment | Operation::Share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strum::IntoEnumIterator;

    #[test]
    fn default_descriptor_allows_nothing() {
        let caps = CapabilityDescriptor::default();
        for op in Operation::iter() {
            assert!(!caps.allows(op), "{op} should be denied");
        }
        assert!(caps.allowed_operations().is_empty());
    }

    #[test]
    fn unlike_and_unfollow_share_flags() {
        let caps = CapabilityDescriptor {
            can_like: true,
            ..CapabilityDescriptor::default()
        };
        assert!(caps.allows(Operation::Like));
        assert!(caps.allows(Operation::Unlike));
        assert!(!caps.allows(Operation::Follow));
        assert!(!caps.allows(Operation::Unfollow));
    }

    #[test]
    fn descriptor_serializes_flags() {
        let caps = CapabilityDescriptor {
            can_post: true,
            content_types: [ContentType::Text].into_iter().collect(),
            max_content_length: 280,
            ..CapabilityDescriptor::default()
        };
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json["can_post"], true);
        assert_eq!(json["content_types"][0], "text");
        assert_eq!(json["max_content_length"], 280);
    }

    proptest! {
        #[test]
        fn allows_matches_flag_table(
            post in any::<bool>(),
            comment in any::<bool>(),
            share in any::<bool>(),
            delete in any::<bool>(),
            like in any::<bool>(),
            follow in any::<bool>(),
        ) {
            let caps = CapabilityDescriptor {
                can_post: post,
                can_comment: comment,
                can_share: share,
                can_delete: delete,
                can_like: like,
                can_follow: follow,
                ..CapabilityDescriptor::default()
            };
            let json = serde_json::to_value(&caps).unwrap();
            for op in Operation::iter() {
                prop_assert_eq!(caps.allows(op), json[op.capability_flag()] == true);
            }
        }
    }
}
