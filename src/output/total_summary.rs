// ==============================================================================
// output/total_summary.rs - Goulphar total.summary Writer
// ==============================================================================
// Description: Writes merged results as tab text or as a SpreadsheetML workbook
// Created: 2025-11-08
// Modified: 2026-01-17
// Version: 1.2.0
// ==============================================================================
// The spreadsheet backend writes an Excel 2003 XML workbook (SpreadsheetML)
// holding the same table as the tab backend, one worksheet named after the
// BioAssay.
// ==============================================================================

use csv::QuoteStyle;
use std::io::Write;
use std::sync::Arc;

use crate::formats::TOTAL_SUMMARY_LAYOUT;
use crate::models::BioAssay;
use crate::translator::Translator;

use super::table::{CellValue, Table};
use super::{BioAssayWriter, WriteError};

/// Maximum length of an Excel worksheet name
const MAX_SHEET_NAME: usize = 31;

/// Writer for Goulphar total.summary files
pub struct TotalSummaryWriter<W> {
    output: W,
    all_fields: bool,
    xsl: bool,
    translator: Option<Arc<dyn Translator>>,
}

impl<W: Write> TotalSummaryWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            all_fields: false,
            xsl: false,
            translator: None,
        }
    }

    pub fn is_xsl_backend(&self) -> bool {
        self.xsl
    }

    fn write_spreadsheet(&mut self, table: &Table<'_>, sheet: &str) -> Result<(), WriteError> {
        let out = &mut self.output;
        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(out, "<?mso-application progid=\"Excel.Sheet\"?>")?;
        writeln!(
            out,
            "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" \
             xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">"
        )?;
        writeln!(out, " <Worksheet ss:Name=\"{}\">", escape_xml(&sheet_name(sheet)))?;
        writeln!(out, "  <Table>")?;

        writeln!(out, "   <Row>")?;
        for header in table.headers() {
            writeln!(out, "    <Cell><Data ss:Type=\"String\">{}</Data></Cell>", escape_xml(header))?;
        }
        writeln!(out, "   </Row>")?;

        for row in 0..table.rows() {
            writeln!(out, "   <Row>")?;
            for column in 0..table.headers().len() {
                match table.value(column, row) {
                    CellValue::Int(v) => {
                        writeln!(out, "    <Cell><Data ss:Type=\"Number\">{}</Data></Cell>", v)?
                    }
                    CellValue::Double(v) if v.is_finite() => {
                        writeln!(out, "    <Cell><Data ss:Type=\"Number\">{}</Data></Cell>", v)?
                    }
                    CellValue::Double(_) => writeln!(out, "    <Cell/>")?,
                    CellValue::Text(v) => writeln!(
                        out,
                        "    <Cell><Data ss:Type=\"String\">{}</Data></Cell>",
                        escape_xml(&v)
                    )?,
                }
            }
            writeln!(out, "   </Row>")?;
        }

        writeln!(out, "  </Table>")?;
        writeln!(out, " </Worksheet>")?;
        writeln!(out, "</Workbook>")?;
        out.flush()?;
        Ok(())
    }
}

impl<W: Write> BioAssayWriter for TotalSummaryWriter<W> {
    fn add_all_fields_to_write(&mut self) {
        self.all_fields = true;
    }

    fn set_translator(&mut self, translator: Arc<dyn Translator>) {
        self.translator = Some(translator);
    }

    fn enable_xsl_backend(&mut self) {
        self.xsl = true;
    }

    fn write(mut self: Box<Self>, bioassay: &BioAssay) -> Result<(), WriteError> {
        let mut table = Table::new(bioassay, &TOTAL_SUMMARY_LAYOUT, self.all_fields);
        if let Some(translator) = &self.translator {
            table.add_translation(bioassay, translator.as_ref());
        }

        if self.xsl {
            self.write_spreadsheet(&table, bioassay.name())
        } else {
            table.write_tsv(&mut self.output, QuoteStyle::Necessary)
        }
    }
}

/// Worksheet name accepted by Excel: no []:*?/\ and at most 31 characters
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();

    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field;
    use crate::translator::MultiColumnTranslator;

    fn sample() -> BioAssay {
        let mut ba = BioAssay::with_name("run1/total.summary");
        ba.set_strings(field::ID, vec!["g1".into(), "g<2>".into()]).unwrap();
        ba.set_doubles(field::M, vec![0.5, f64::NAN]).unwrap();
        ba.set_doubles(field::A, vec![10.5, 9.75]).unwrap();
        ba.set_ints("n", vec![3, 1]).unwrap();
        ba
    }

    #[test]
    fn test_write_tab_backend() {
        let mut out = Vec::new();
        let writer: Box<dyn BioAssayWriter + '_> = Box::new(TotalSummaryWriter::new(&mut out));
        writer.write(&sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Name\tmedianMnorm\tmedianA\tn\ng1\t0.5\t10.5\t3\ng<2>\tNA\t9.75\t1\n"
        );
    }

    #[test]
    fn test_write_spreadsheet_backend() {
        let mut out = Vec::new();
        let mut writer: Box<dyn BioAssayWriter + '_> = Box::new(TotalSummaryWriter::new(&mut out));
        writer.enable_xsl_backend();
        writer.write(&sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(text.contains("<Worksheet ss:Name=\"run1_total.summary\">"));
        assert!(text.contains("<Data ss:Type=\"String\">medianMnorm</Data>"));
        assert!(text.contains("<Data ss:Type=\"String\">g&lt;2&gt;</Data>"));
        assert!(text.contains("<Data ss:Type=\"Number\">10.5</Data>"));
        assert!(text.contains("<Cell/>"));
        assert!(text.trim_end().ends_with("</Workbook>"));
    }

    #[test]
    fn test_translator_columns_appended() {
        let mut translator = MultiColumnTranslator::new(vec!["ID".into(), "Gene".into()]).unwrap();
        translator.add_row(vec!["g1".into(), "ACT1".into()]);

        let mut out = Vec::new();
        let mut writer: Box<dyn BioAssayWriter + '_> = Box::new(TotalSummaryWriter::new(&mut out));
        writer.set_translator(Arc::new(translator));
        writer.write(&sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name\tmedianMnorm\tmedianA\tn\tGene");
        assert_eq!(lines[1], "g1\t0.5\t10.5\t3\tACT1");
    }

    #[test]
    fn test_sheet_name_sanitized() {
        assert_eq!(sheet_name("a[b]:c*d?e/f\\g"), "a_b__c_d_e_f_g");
        assert_eq!(sheet_name(""), "Sheet1");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }
}
