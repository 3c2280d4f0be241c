//! Image and hyperlink transfer

use store::{relative_target, resolve_target, Relationship, TargetMode, DOCUMENT_PART};

use crate::error::Result;
use crate::source::PreparedSource;
use crate::state::MergeState;

const MEDIA_DIR: &str = "word/media";
const IMAGE_STEM: &str = "image";

/// Next free `N` for `word/media/imageN.<any extension>`
fn next_image_number(state: &MergeState) -> u32 {
    let prefix = format!("{}/{}", MEDIA_DIR, IMAGE_STEM);
    state
        .target
        .part_names()
        .filter_map(|name| name.strip_prefix(prefix.as_str()))
        .filter_map(|rest| rest.split_once('.'))
        .filter_map(|(n, _)| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

/// Copy an image under a fresh name, or a linked image's relationship as is
///
/// Returns the new part name for embedded images.
pub(crate) fn transfer_image(
    state: &mut MergeState,
    source: &PreparedSource,
    relationship: &Relationship,
) -> Result<Option<String>> {
    if relationship.target_mode == TargetMode::External {
        state.document_rels.insert(relationship.clone())?;
        return Ok(None);
    }

    let source_part = resolve_target(DOCUMENT_PART, &relationship.target);
    let bytes = source.package.read_bytes(&source_part)?;
    let extension = source_part
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    let new_part = format!(
        "{}/{}{}.{}",
        MEDIA_DIR,
        IMAGE_STEM,
        next_image_number(state),
        extension
    );
    state.target.write_bytes(&new_part, bytes);
    match source.content_types.get_content_type(&source_part) {
        Some(content_type) if state.content_types.default_for(&extension).is_none() => {
            state.content_types.add_default(&extension, content_type);
        }
        _ => {}
    }
    state.document_rels.insert(Relationship::new(
        relationship.id.clone(),
        &relationship.rel_type,
        &relative_target(DOCUMENT_PART, &new_part),
        TargetMode::Internal,
    ))?;

    tracing::debug!("Image {} -> {}", source_part, new_part);
    Ok(Some(new_part))
}

/// Carry a hyperlink relationship over under its shifted id
pub(crate) fn transfer_hyperlink(state: &mut MergeState, relationship: &Relationship) -> Result<()> {
    state.document_rels.insert(relationship.clone())?;
    tracing::debug!("Hyperlink {} -> {}", relationship.id, relationship.target);
    Ok(())
}
