//! Console report for an export run

use std::io::{self, Write};
use std::path::Path;

use crate::export::VisualizationDocument;

/// Write node/edge counts, the output path, and the entity-type distribution
pub fn write_export_summary<W: Write>(
    doc: &VisualizationDocument,
    output_path: &Path,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "Nodes: {}", doc.stats.total_nodes)?;
    writeln!(writer, "Edges: {}", doc.stats.total_edges)?;
    writeln!(writer)?;
    writeln!(writer, "Exported to {}", output_path.display())?;

    let distribution = doc.stats.entity_type_distribution();
    if distribution.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(writer, "Entity Type Distribution:")?;
    let width = distribution
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, count) in distribution {
        writeln!(writer, "  {:<width$}  {}", name, count, width = width)?;
    }

    Ok(())
}
