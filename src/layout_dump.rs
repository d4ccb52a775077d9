use crate::layout::{ChartData, ChartKind, ChartLayout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Aggregates and geometry of every rendered chart, for debugging and
/// regression comparison.
#[derive(Debug, Serialize)]
pub struct LayoutDump<'a> {
    pub charts: Vec<ChartDump<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChartDump<'a> {
    pub chart: &'static str,
    pub width: f32,
    pub height: f32,
    pub data: &'a ChartData,
    /// `None` when the container was too small to lay out.
    pub layout: Option<&'a ChartLayout>,
}

impl<'a> LayoutDump<'a> {
    pub fn from_charts(charts: &'a [(ChartKind, ChartData, Option<ChartLayout>)]) -> Self {
        let charts = charts
            .iter()
            .map(|(kind, data, layout)| {
                let size = layout.as_ref().map(ChartLayout::size).unwrap_or_default();
                ChartDump {
                    chart: kind.name(),
                    width: size.width,
                    height: size.height,
                    data,
                    layout: layout.as_ref(),
                }
            })
            .collect();
        LayoutDump { charts }
    }
}

pub fn write_layout_dump(
    path: &Path,
    charts: &[(ChartKind, ChartData, Option<ChartLayout>)],
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_charts(charts);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
