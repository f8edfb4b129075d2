use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;
use serde::Serialize;

use crate::config::Company;
use crate::error::{ReportError, Result};
use crate::report::ReportDocument;

/// Embedded Typst template for report generation
/// Uses a placeholder that gets replaced with the actual JSON file path
const REPORT_TEMPLATE: &str = r##"// Shipment report template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: data.paper,
  margin: (top: 1.3in, bottom: 0.9in, left: 0.35in, right: 0.35in),
  header: [
    #set text(size: 10pt, weight: "bold", fill: gray.darken(25%))
    #grid(
      columns: (1fr, 1fr, 1fr),
      align: (left, center, right),
      [#data.company.name],
      [#data.title],
      [#data.generated_date],
    )
    #v(3pt)
    #line(length: 100%, stroke: 0.5pt + gray)
    #if data.company.logo != none {
      v(4pt)
      image(data.company.logo, height: 28pt)
    }
  ],
  footer: [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(3pt)
    #set text(size: 8pt, fill: gray)
    #grid(
      columns: (1fr, auto),
      align: (left, right),
      [#data.company.name - #data.company.address],
      [Page #context counter(page).display()],
    )
  ],
)

#set text(font: "Helvetica", size: 9pt)

#let row-fill(row) = if row.fill == none { none } else { luma(row.fill) }

#let cell-body(row, i) = {
  let value = row.cells.at(i, default: "")
  if row.bold { strong(value) } else { value }
}

// Rows arrive with their styling resolved: role, bold, fill, centered
// and an optional column span. Spanned rows merge from span.from to
// span.to into a single cell.
#let row-cells(row) = {
  let alignment = if row.centered { center } else { left }
  if row.span == none {
    range(row.cells.len()).map(i => table.cell(
      fill: row-fill(row),
      align: alignment,
      cell-body(row, i),
    ))
  } else {
    let merged = row.span.to - row.span.from + 1
    range(row.span.from).map(i => table.cell(
      fill: row-fill(row),
      align: alignment,
      cell-body(row, i),
    )) + (table.cell(
      colspan: merged,
      fill: row-fill(row),
      align: alignment,
      cell-body(row, row.span.from),
    ),)
  }
}

#let section-table(section) = {
  let header-rows = section.rows.filter(r => r.role == "header")
  let body-rows = section.rows.filter(r => r.role != "header")
  table(
    columns: (2fr,) + (1fr,) * (data.columns.len() - 1),
    stroke: 0.4pt + gray,
    inset: 4pt,
    table.header(
      repeat: section.repeat_header_row,
      ..header-rows.map(row-cells).flatten(),
    ),
    ..body-rows.map(row-cells).flatten(),
  )
}

#for section in data.sections {
  if section.heading != none {
    v(2pt)
    text(weight: "bold", size: 10pt, section.heading)
    v(6pt)
  }
  section-table(section)
  v(1pt * data.section_spacing_pt)
}
"##;

#[derive(Serialize)]
struct RenderView<'a> {
    company: CompanyView<'a>,
    paper: &'a str,
    generated_date: String,
    #[serde(flatten)]
    document: &'a ReportDocument,
}

#[derive(Serialize)]
struct CompanyView<'a> {
    name: &'a str,
    address: &'a str,
    logo: Option<String>,
}

/// Render the document model to PDF bytes using the Typst CLI. The
/// template owns page geometry, header/footer furniture and pagination;
/// the document model only describes rows.
pub fn render_pdf(document: &ReportDocument, company: &Company, paper: &str) -> Result<Vec<u8>> {
    // Check if typst is available
    let typst_check = Command::new("typst").arg("--version").output();

    if typst_check.is_err() {
        return Err(ReportError::TypstNotFound);
    }

    // Create temp directory for template
    let temp_dir = std::env::temp_dir().join("shipforms");
    fs::create_dir_all(&temp_dir)?;

    // Typst resolves paths inside --root only; stage the logo next to
    // the data file when one is configured.
    let logo = stage_logo(company.logo.as_deref(), &temp_dir);

    let view = RenderView {
        company: CompanyView {
            name: &company.name,
            address: &company.address,
            logo,
        },
        paper,
        generated_date: chrono::Local::now().format("%d %B %Y").to_string(),
        document,
    };

    // Serialize report data to JSON
    let json_data =
        serde_json::to_string(&view).map_err(|e| ReportError::PdfGeneration(e.to_string()))?;

    // Write JSON to temp file
    let json_path = temp_dir.join("data.json");
    fs::write(&json_path, &json_data)?;

    // Write template with relative JSON path (data.json is in same directory)
    let template_content = REPORT_TEMPLATE.replace("DATA_JSON_PATH", "data.json");
    let template_path = temp_dir.join("report.typ");
    fs::write(&template_path, &template_content)?;

    let pdf_path = temp_dir.join("report.pdf");

    // Run typst compile with root set to temp directory
    let output = Command::new("typst")
        .args([
            "compile",
            "--root",
            temp_dir.to_str().unwrap(),
            template_path.to_str().unwrap(),
            pdf_path.to_str().unwrap(),
        ])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReportError::PdfGeneration(stderr.to_string()));
    }

    let bytes = fs::read(&pdf_path)?;
    debug!("rendered '{}': {} bytes", document.title, bytes.len());

    // Clean up temp files
    let _ = fs::remove_file(&template_path);
    let _ = fs::remove_file(&json_path);
    let _ = fs::remove_file(&pdf_path);

    Ok(bytes)
}

fn stage_logo(configured: Option<&str>, temp_dir: &Path) -> Option<String> {
    let source = crate::config::expand_path(configured?);
    if !source.is_file() {
        return None;
    }
    let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("png");
    let staged_name = format!("logo.{ext}");
    fs::copy(&source, temp_dir.join(&staged_name)).ok()?;
    Some(staged_name)
}
