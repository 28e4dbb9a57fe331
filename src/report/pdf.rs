//! PDF rendering of the cohort summary.
//!
//! Uses the builtin PDF fonts only, so text is folded to ASCII before it is
//! placed. Charts are drawn as text bars in a monospace font.

use chrono::Utc;
use printpdf::*;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::pipeline::processing::filter::ExclusionStats;
use crate::pipeline::processing::merge::MergeStats;
use crate::pipeline::RunInfo;
use crate::report::summary::{CohortSummary, Proportion};
use crate::report::text::{exclusion_lines, merge_lines, summary_lines};
use crate::report::format_pct;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM: Mm = Mm(15.0);
const LEFT: Mm = Mm(15.0);
const BAR_WIDTH: usize = 40;

/// What the report header says about where the numbers came from
pub struct ReportContext<'a> {
    pub source: &'a Path,
    pub run: Option<&'a RunInfo>,
    pub merge: Option<&'a MergeStats>,
    pub exclusions: Option<&'a ExclusionStats>,
}

fn pdf_error(what: &str, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Report(format!("PDF {} error: {}", what, e))
}

/// Builtin fonts cover Latin-1 at best; keep the output plain ASCII
fn ascii(text: &str) -> String {
    text.replace('±', "+/-")
        .chars()
        .map(|c| match c {
            'á' | 'à' => 'a',
            'é' | 'è' => 'e',
            'í' => 'i',
            'ó' | 'ò' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' => 'U',
            'Ñ' => 'N',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// `####....  42.0%` scaled to [`BAR_WIDTH`]
pub fn text_bar(p: &Proportion) -> String {
    let filled = p
        .pct()
        .map(|pct| ((pct / 100.0) * BAR_WIDTH as f64).round() as usize)
        .unwrap_or(0)
        .min(BAR_WIDTH);
    format!(
        "{}{} {:>6}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        format_pct(p.pct())
    )
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
}

enum Face {
    Regular,
    Bold,
    Mono,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_error("font", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_error("font", e))?;
        let mono = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| pdf_error("font", e))?;
        Ok(Self {
            doc,
            layer,
            y: TOP,
            regular,
            bold,
            mono,
        })
    }

    fn text(&mut self, text: &str, size: f32, face: Face, advance: f32) {
        if self.y < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
        let font = match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Mono => &self.mono,
        };
        self.layer.use_text(ascii(text), size, LEFT, self.y, font);
        self.y -= Mm(advance);
    }

    fn heading(&mut self, text: &str) {
        self.y -= Mm(3.0);
        self.text(text, 11.0, Face::Bold, 6.0);
    }

    fn mono(&mut self, text: &str) {
        self.text(text, 8.0, Face::Mono, 4.0);
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(|e| pdf_error("save", e))?;
        buf.into_inner().map_err(|e| pdf_error("buffer", e))
    }
}

/// Render the summary, merge and exclusion counters and outcome charts.
pub fn render_pdf(summary: &CohortSummary, context: &ReportContext<'_>) -> Result<Vec<u8>> {
    let title = "Telephone CPR cohort report";
    let mut page = PageWriter::new(title)?;

    page.text(title, 16.0, Face::Bold, 8.0);
    page.text(
        &format!("Generated {}", Utc::now().format("%Y-%m-%d %H:%M UTC")),
        9.0,
        Face::Regular,
        4.5,
    );
    page.text(
        &format!("Input: {}", context.source.display()),
        9.0,
        Face::Regular,
        4.5,
    );
    if let Some(run) = context.run {
        page.text(&format!("Run: {}", run.run_id), 9.0, Face::Regular, 4.5);
        page.text(
            &format!("Input SHA-256: {}", run.input_sha256),
            8.0,
            Face::Mono,
            4.5,
        );
    }

    if let Some(stats) = context.merge {
        page.heading("Unit merge");
        for line in merge_lines(stats) {
            page.mono(&line);
        }
    }
    if let Some(stats) = context.exclusions {
        page.heading("Exclusions");
        for line in exclusion_lines(stats) {
            page.mono(&line);
        }
    }

    page.heading("Summary");
    for line in summary_lines(summary) {
        page.mono(&line);
    }

    if !summary.is_empty() {
        page.heading("Outcomes");
        page.mono(&format!("{:<16} {}", "ROSC", text_bar(&summary.rosc)));
        page.mono(&format!("{:<16} {}", "7-day survival", text_bar(&summary.survival)));

        page.heading("ROSC by telephone CPR");
        for stratum in &summary.by_telephone_cpr {
            page.mono(&format!("{:<24} {}", stratum.label, text_bar(&stratum.rosc)));
        }

        page.heading("CPC distribution");
        for entry in &summary.cpc_distribution {
            page.mono(&format!("CPC {:<12} {}", entry.cpc, text_bar(&entry.cases)));
        }
    }

    page.finish()
}
