//! PDF report writer (A4, builtin Helvetica)

use anyhow::Result;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};

use super::{format_number, format_timestamp, Report};
use crate::data::Series;
use crate::security::sanitize_input;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BOTTOM: f32 = 25.0;
const ROW_HEIGHT: f32 = 7.0;
const LABEL_COLUMN: f32 = 30.0;

const ACCENT: (f32, f32, f32) = (59.0 / 255.0, 130.0 / 255.0, 246.0 / 255.0);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const GRAY: (f32, f32, f32) = (0.5, 0.5, 0.5);

/// Writes top to bottom, starting a new page when the cursor reaches the bottom margin
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed >= BOTTOM {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    fn color(&self, (r, g, b): (f32, f32, f32)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn text_at(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    /// Write one line at the left margin and move down by `advance`
    fn line(&mut self, text: &str, size: f32, bold: bool, advance: f32) {
        self.ensure_space(advance);
        self.text_at(text, size, MARGIN, bold);
        self.y -= advance;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(self) -> Result<Vec<u8>> {
        Ok(self.doc.save_to_bytes()?)
    }
}

pub(super) fn write(report: &Report) -> Result<Vec<u8>> {
    let dataset = report.dataset;
    let mut pdf = PageWriter::new("Analytics Dashboard Report")?;

    pdf.color(ACCENT);
    pdf.line(
        &sanitize_input("Analytics Dashboard Report"),
        20.0,
        true,
        12.0,
    );

    pdf.color(BLACK);
    pdf.line(
        &format!(
            "Period: {} | Metric: {}",
            dataset.period.display_name(),
            sanitize_input(&report.metric.label)
        ),
        14.0,
        false,
        10.0,
    );

    for text in [
        format!("Data Type: {}", dataset.data_type.name()),
        format!("Export Date: {}", format_timestamp(report.generated_at)),
        format!("Total Records: {}", format_number(dataset.record_count() as f64)),
    ] {
        pdf.line(&text, 11.0, false, 6.0);
    }
    pdf.gap(4.0);

    pdf.color(ACCENT);
    pdf.line("Summary Statistics", 14.0, true, 8.0);
    pdf.color(BLACK);
    for series in &dataset.series {
        let total: f64 = series.values.iter().sum();
        pdf.line(
            &format!("Total {}: {}", series.label, money(series, total)),
            11.0,
            false,
            6.0,
        );
    }
    pdf.gap(4.0);

    write_table(&mut pdf, report);

    if let Some(summary) = &report.summary {
        pdf.gap(6.0);
        pdf.color(ACCENT);
        pdf.line("Statistics", 14.0, true, 8.0);
        pdf.color(BLACK);

        let metric = report.metric;
        for text in [
            format!("- Average Value: {}", money(metric, summary.average)),
            format!("- Maximum Value: {}", money(metric, summary.maximum)),
            format!("- Minimum Value: {}", money(metric, summary.minimum)),
            format!("- Data Points: {}", summary.data_points),
        ] {
            pdf.line(&text, 10.0, false, 6.0);
        }
    }

    // Footer sits inside the bottom margin, below any content
    pdf.y = 12.0;
    pdf.color(GRAY);
    pdf.text_at("Report generated by dashboard-api", 8.0, MARGIN, false);

    pdf.finish()
}

fn write_table(pdf: &mut PageWriter, report: &Report) {
    let dataset = report.dataset;
    let headers = dataset.headers();
    let value_columns = dataset.series.len().max(1) as f32;
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN - LABEL_COLUMN) / value_columns;
    let column_x = |col: usize| {
        if col == 0 {
            MARGIN
        } else {
            MARGIN + LABEL_COLUMN + column_width * (col - 1) as f32
        }
    };

    let write_header = |pdf: &mut PageWriter| {
        pdf.ensure_space(ROW_HEIGHT * 2.0);
        pdf.color(ACCENT);
        for (col, name) in headers.iter().enumerate() {
            pdf.text_at(name, 10.0, column_x(col), true);
        }
        pdf.y -= ROW_HEIGHT;
        pdf.color(BLACK);
    };

    write_header(pdf);
    for row in dataset.rows() {
        let pages_before = pdf.pages;
        pdf.ensure_space(ROW_HEIGHT);
        if pdf.pages != pages_before {
            write_header(pdf);
        }

        pdf.text_at(&row.label, 10.0, column_x(0), false);
        for (index, value) in row.values.iter().enumerate() {
            let cell = money(&dataset.series[index], *value);
            pdf.text_at(&cell, 10.0, column_x(index + 1), false);
        }
        pdf.y -= ROW_HEIGHT;
    }
}

/// Rand-denominated series ("Revenue (R)") get an `R` prefix
fn money(series: &Series, value: f64) -> String {
    if series.label.ends_with("(R)") {
        format!("R{}", format_number(value))
    } else {
        format_number(value)
    }
}
