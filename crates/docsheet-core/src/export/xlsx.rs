//! Minimal Office Open XML (`.xlsx`) writer.
//!
//! Produces a zip package with one worksheet part per sheet. Every cell is an
//! inline string, so no shared-string table is needed.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::DocsheetError;
use crate::export::{Sheet, Workbook};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Longest text Excel accepts in a single cell.
const MAX_CELL_CHARS: usize = 32_767;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Serialize `workbook` into the bytes of an `.xlsx` file.
pub fn write_workbook(workbook: &Workbook) -> Result<Vec<u8>, DocsheetError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut add = |name: &str, data: &[u8]| -> Result<(), DocsheetError> {
        zip.start_file(name, options).map_err(export_error)?;
        zip.write_all(data)?;
        Ok(())
    };

    add("[Content_Types].xml", content_types(workbook.sheets.len()).as_bytes())?;
    add("_rels/.rels", ROOT_RELS.as_bytes())?;
    add("xl/workbook.xml", &workbook_xml(workbook)?)?;
    add("xl/_rels/workbook.xml.rels", &workbook_rels(workbook.sheets.len())?)?;
    add("xl/styles.xml", STYLES.as_bytes())?;
    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        add(&format!("xl/worksheets/sheet{}.xml", idx + 1), &sheet_xml(sheet)?)?;
    }

    let cursor = zip.finish().map_err(export_error)?;
    Ok(cursor.into_inner())
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn workbook_xml(workbook: &Workbook) -> Result<Vec<u8>, DocsheetError> {
    let mut w = xml_writer()?;
    start(&mut w, BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]))?;
    start(&mut w, BytesStart::new("sheets"))?;
    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        let id = (idx + 1).to_string();
        let rel = format!("rId{id}");
        let tag = BytesStart::new("sheet").with_attributes([
            ("name", sheet.name.as_str()),
            ("sheetId", id.as_str()),
            ("r:id", rel.as_str()),
        ]);
        w.write_event(Event::Empty(tag)).map_err(export_error)?;
    }
    end(&mut w, "sheets")?;
    end(&mut w, "workbook")?;
    Ok(w.into_inner())
}

fn workbook_rels(sheet_count: usize) -> Result<Vec<u8>, DocsheetError> {
    let mut w = xml_writer()?;
    start(&mut w, BytesStart::new("Relationships").with_attributes([("xmlns", NS_PKG_REL)]))?;
    for n in 1..=sheet_count {
        let id = format!("rId{n}");
        let target = format!("worksheets/sheet{n}.xml");
        relationship(&mut w, &id, REL_WORKSHEET, &target)?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    relationship(&mut w, &styles_id, REL_STYLES, "styles.xml")?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

fn relationship(
    w: &mut Writer<Vec<u8>>,
    id: &str,
    kind: &str,
    target: &str,
) -> Result<(), DocsheetError> {
    let tag = BytesStart::new("Relationship").with_attributes([
        ("Id", id),
        ("Type", kind),
        ("Target", target),
    ]);
    w.write_event(Event::Empty(tag)).map_err(export_error)
}

fn sheet_xml(sheet: &Sheet) -> Result<Vec<u8>, DocsheetError> {
    let mut w = xml_writer()?;
    start(&mut w, BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)]))?;
    start(&mut w, BytesStart::new("sheetData"))?;

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let row_number = (row_idx + 1).to_string();
        start(&mut w, BytesStart::new("row").with_attributes([("r", row_number.as_str())]))?;

        for (col_idx, value) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(col_idx), row_number);
            if value.chars().count() > MAX_CELL_CHARS {
                warn!(
                    sheet = %sheet.name,
                    cell = %reference,
                    "cell text exceeds the spreadsheet limit and may be truncated by readers"
                );
            }

            start(
                &mut w,
                BytesStart::new("c").with_attributes([("r", reference.as_str()), ("t", "inlineStr")]),
            )?;
            start(&mut w, BytesStart::new("is"))?;
            start(&mut w, BytesStart::new("t").with_attributes([("xml:space", "preserve")]))?;
            let text = escape_ooxml(value);
            w.write_event(Event::Text(BytesText::new(&text)))
                .map_err(export_error)?;
            end(&mut w, "t")?;
            end(&mut w, "is")?;
            end(&mut w, "c")?;
        }

        end(&mut w, "row")?;
    }

    end(&mut w, "sheetData")?;
    end(&mut w, "worksheet")?;
    Ok(w.into_inner())
}

fn xml_writer() -> Result<Writer<Vec<u8>>, DocsheetError> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(export_error)?;
    Ok(w)
}

fn start(w: &mut Writer<Vec<u8>>, tag: BytesStart<'_>) -> Result<(), DocsheetError> {
    w.write_event(Event::Start(tag)).map_err(export_error)
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), DocsheetError> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(export_error)
}

fn export_error(e: impl std::fmt::Display) -> DocsheetError {
    DocsheetError::Export(e.to_string())
}

/// Spreadsheet column letters for a 0-based index: A..Z, AA..AZ, ...
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Encode characters XML 1.0 cannot carry as `_xHHHH_`, and protect literal
/// `_xHHHH_` sequences so readers do not decode them.
fn escape_ooxml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.char_indices() {
        match c {
            '\t' | '\n' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                out.push_str(&format!("_x{:04X}_", c as u32));
            }
            '_' if is_escape_sequence(&value[i..]) => out.push_str("_x005F_"),
            c => out.push(c),
        }
    }
    out
}

fn is_escape_sequence(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[0] == b'_'
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}
