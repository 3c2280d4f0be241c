//! Chart transfer
//!
//! A chart reaches the body through a document relationship and owns a
//! private `.rels` part that points at exactly one embedding (the workbook
//! or OLE object holding its data) and optionally at style, color and
//! theme override parts. Everything is copied under fresh part numbers; the
//! chart keeps its private relationship ids, only their targets change.

use store::{
    content_type_values, relationship_types, relative_target, resolve_target, Relationship,
    Relationships, TargetMode, DOCUMENT_PART,
};

use crate::error::{FoldError, Result};
use crate::ids::{ChartSeq, EmbeddingKind, EmbeddingSeq};
use crate::source::PreparedSource;
use crate::state::MergeState;

/// Auxiliary chart parts: relationship type, directory and name stem
const AUXILIARY_PARTS: &[(&str, &str, &str)] = &[
    (relationship_types::CHART_STYLE, "word/charts", "style"),
    (relationship_types::CHART_COLOR_STYLE, "word/charts", "colors"),
    (relationship_types::THEME_OVERRIDE, "word/theme", "themeOverride"),
];

/// Where one chart went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartTransfer {
    pub relationship_id: String,
    pub chart: ChartSeq,
    pub chart_part: String,
    pub embedding: EmbeddingSeq,
    pub embedding_part: String,
}

/// Copy the chart behind a shifted document relationship into the target
pub(crate) fn transfer_chart(
    state: &mut MergeState,
    source: &PreparedSource,
    relationship: &Relationship,
) -> Result<ChartTransfer> {
    let source_chart = resolve_target(DOCUMENT_PART, &relationship.target);
    let chart_bytes = source.package.read_bytes(&source_chart)?;
    let chart_rels = source.package.relationships(&source_chart)?;

    let mut embeddings = Vec::new();
    let mut auxiliary = Vec::new();
    for rel in chart_rels.all() {
        if let Some(kind) = EmbeddingKind::from_relationship_type(&rel.rel_type) {
            embeddings.push((rel, kind));
        } else if let Some(&(_, dir, stem)) =
            AUXILIARY_PARTS.iter().find(|(t, _, _)| *t == rel.rel_type)
        {
            auxiliary.push((rel, dir, stem));
        } else {
            return Err(unsupported(
                &source_chart,
                format!("relationship {} of type {}", rel.id, rel.rel_type),
            ));
        }
    }
    let (embedding_rel, kind) = match embeddings.as_slice() {
        [single] => *single,
        others => {
            return Err(unsupported(
                &source_chart,
                format!("{} embeddings, expected exactly one", others.len()),
            ))
        }
    };
    if embedding_rel.target_mode == TargetMode::External {
        return Err(unsupported(&source_chart, "embedding is an external link".to_string()));
    }

    let chart = ChartSeq::next_in(&state.target);
    let chart_part = chart.part_name();
    let mut new_rels = Relationships::new();

    // Embedding
    let source_embedding = resolve_target(&source_chart, &embedding_rel.target);
    let embedding_bytes = source.package.read_bytes(&source_embedding)?;
    let embedding = EmbeddingSeq::next_in(&state.target, kind);
    let embedding_part = embedding.part_name(kind);
    state.target.write_bytes(&embedding_part, embedding_bytes);
    state
        .content_types
        .add_default(kind.extension(), kind.content_type());
    new_rels.insert(Relationship::new(
        embedding_rel.id.clone(),
        &embedding_rel.rel_type,
        &relative_target(&chart_part, &embedding_part),
        TargetMode::Internal,
    ))?;

    // Style, colors, theme override
    for (rel, dir, stem) in auxiliary {
        let source_part = resolve_target(&source_chart, &rel.target);
        let bytes = source.package.read_bytes(&source_part)?;
        let extension = source_part.rsplit_once('.').map(|(_, e)| e).unwrap_or("xml");
        let seq = state.target.next_sequence(dir, stem, extension);
        let new_part = format!("{}/{}{}.{}", dir, stem, seq, extension);
        state.target.write_bytes(&new_part, bytes);
        if let Some(content_type) = source.content_types.get_content_type(&source_part) {
            state.content_types.add_override(&new_part, content_type);
        }
        new_rels.insert(Relationship::new(
            rel.id.clone(),
            &rel.rel_type,
            &relative_target(&chart_part, &new_part),
            TargetMode::Internal,
        ))?;
    }

    state.target.write_bytes(&chart_part, chart_bytes);
    state.target.set_relationships(&chart_part, &new_rels);
    state
        .content_types
        .add_override(&chart_part, content_type_values::CHART);
    state.document_rels.insert(Relationship::new(
        relationship.id.clone(),
        relationship_types::CHART,
        &relative_target(DOCUMENT_PART, &chart_part),
        TargetMode::Internal,
    ))?;

    tracing::debug!(
        "Chart {} -> {} with {}",
        source_chart,
        chart_part,
        embedding_part
    );
    Ok(ChartTransfer {
        relationship_id: relationship.id.clone(),
        chart,
        chart_part,
        embedding,
        embedding_part,
    })
}

fn unsupported(chart: &str, reason: String) -> FoldError {
    FoldError::UnsupportedChartShape {
        chart: chart.to_string(),
        reason,
    }
}
