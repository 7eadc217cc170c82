// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic content checks run before any platform-specific validation.

use polycast_core::{CapabilityDescriptor, ContentItem, PolycastError};
use tracing::debug;

/// Check `content` against the descriptor's limits.
///
/// Structural problems (nothing to publish, media without a URL) are
/// `Err(Validation)`. Limit violations return `Ok(false)`.
pub fn check_content(
    capabilities: &CapabilityDescriptor,
    content: &ContentItem,
) -> Result<bool, PolycastError> {
    if content.body.trim().is_empty() && content.media.is_empty() {
        return Err(PolycastError::Validation(
            "content must have a body or at least one media item".to_string(),
        ));
    }
    if let Some(index) = content.media.iter().position(|m| m.url.trim().is_empty()) {
        return Err(PolycastError::Validation(format!(
            "media item {index} has no url"
        )));
    }

    let length = content.body_len();
    if length > capabilities.max_content_length {
        debug!(
            length,
            max = capabilities.max_content_length,
            "content exceeds maximum length"
        );
        return Ok(false);
    }

    if !capabilities.supports_content_type(content.content_type) {
        debug!(content_type = %content.content_type, "content type not supported");
        return Ok(false);
    }

    for media in &content.media {
        if !capabilities.supports_content_type(media.media_type) {
            debug!(media_type = %media.media_type, "media type not supported");
            return Ok(false);
        }
        if let (Some(size), Some(max)) = (media.size, capabilities.max_media_size) {
            if size > max {
                debug!(size, max, url = %media.url, "media exceeds maximum size");
                return Ok(false);
            }
        }
    }

    Ok(true)
}
