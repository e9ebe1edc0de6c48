//! OOXML plumbing: reading and patching the core-properties part, and
//! extracting the payload the fingerprinter cares about.
//!
//! Patching works on the XML event stream so every untouched node survives
//! byte-for-byte semantics. Synthesized elements are written with their full
//! prefixed name; a post-condition re-parse asserts the prefixed element is
//! actually present, guarding against the classic fragment-synthesis mistake
//! of dropping the namespace prefix.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ImprintError, Result};

/// Archive path of the core-properties part.
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

/// Root element of the core-properties part.
pub const CORE_PROPERTIES_TAG: &str = "cp:coreProperties";
/// Primary identifier slot.
pub const DESCRIPTION_TAG: &str = "dc:description";
/// Redundant explicit-digest slot.
pub const KEYWORDS_TAG: &str = "cp:keywords";
/// Author field.
pub const CREATOR_TAG: &str = "dc:creator";
/// Creation timestamp field.
pub const CREATED_TAG: &str = "dcterms:created";
/// Last-modified timestamp field.
pub const MODIFIED_TAG: &str = "dcterms:modified";

fn local_part(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

fn has_local_name(start: &BytesStart<'_>, local: &str) -> bool {
    start.name().local_name().as_ref() == local.as_bytes()
}

fn end_has_local_name(end: &BytesEnd<'_>, local: &str) -> bool {
    end.name().local_name().as_ref() == local.as_bytes()
}

/// Read the text content of the first element whose local name matches
/// `qualified`'s local part. `None` when the element is absent; an empty
/// string when present but empty.
pub fn element_text(xml: &str, qualified: &str) -> Result<Option<String>> {
    let local = local_part(qualified);
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) if has_local_name(&e, local) => {
                let mut text = String::new();
                loop {
                    match reader.read_event()? {
                        Event::Text(t) => text.push_str(&t.unescape()?),
                        Event::CData(c) => {
                            text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                        }
                        Event::End(end) if end_has_local_name(&end, local) => {
                            return Ok(Some(text))
                        }
                        Event::Eof => {
                            return Err(ImprintError::XmlSynthesis(format!(
                                "unclosed element <{qualified}>"
                            )))
                        }
                        _ => {}
                    }
                }
            }
            Event::Empty(e) if has_local_name(&e, local) => return Ok(Some(String::new())),
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Overwrite the text of the element named `qualified`, synthesizing the
/// element under the core-properties root when absent.
///
/// Post-condition: the returned document contains `<qualified>` with the
/// given text, prefix intact.
pub fn set_element_text(xml: &str, qualified: &str, value: &str) -> Result<String> {
    let local = local_part(qualified);
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut replaced = false;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) if has_local_name(&e, local) => {
                writer.write_event(Event::Start(e))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                // Drop the element's previous content up to its end tag.
                loop {
                    match reader.read_event()? {
                        Event::End(end) if end_has_local_name(&end, local) => {
                            writer.write_event(Event::End(end))?;
                            break;
                        }
                        Event::Eof => {
                            return Err(ImprintError::XmlSynthesis(format!(
                                "unclosed element <{qualified}>"
                            )))
                        }
                        _ => {}
                    }
                }
                replaced = true;
            }
            Event::Empty(e) if has_local_name(&e, local) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                writer.write_event(Event::Start(e))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
                replaced = true;
            }
            Event::End(e) if !replaced && end_has_local_name(&e, local_part(CORE_PROPERTIES_TAG)) => {
                writer.write_event(Event::Start(BytesStart::new(qualified)))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                writer.write_event(Event::End(BytesEnd::new(qualified)))?;
                writer.write_event(Event::End(e))?;
                replaced = true;
            }
            event => writer.write_event(event)?,
        }
    }

    if !replaced {
        return Err(ImprintError::XmlSynthesis(format!(
            "no <{}> root to attach <{qualified}> to",
            CORE_PROPERTIES_TAG
        )));
    }

    let patched = String::from_utf8(writer.into_inner()).map_err(|e| {
        ImprintError::XmlSynthesis(format!("patched core properties are not UTF-8: {e}"))
    })?;

    // The prefixed element must exist verbatim in the output.
    if !patched.contains(&format!("<{qualified}")) {
        return Err(ImprintError::XmlSynthesis(format!(
            "synthesized element lost its prefix: <{qualified}> missing after patch"
        )));
    }

    Ok(patched)
}

/// Concatenated contents of every `<w:t>` text run in a word-processing part.
pub fn text_runs(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if has_local_name(&e, "t") => in_run = true,
            Event::End(e) if end_has_local_name(&e, "t") => in_run = false,
            Event::Text(t) if in_run => out.push_str(&t.unescape()?),
            Event::CData(c) if in_run => out.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

/// The serialized `<sheetData>` element of a worksheet part, attributes
/// included. Cell coordinates live in attributes, so they matter.
pub fn sheet_data(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) => {
                if depth > 0 {
                    if has_local_name(e, "sheetData") {
                        depth += 1;
                    }
                    writer.write_event(event.borrow())?;
                } else if has_local_name(e, "sheetData") {
                    depth = 1;
                    writer.write_event(event.borrow())?;
                }
            }
            Event::End(e) => {
                if depth > 0 {
                    writer.write_event(event.borrow())?;
                    if end_has_local_name(e, "sheetData") {
                        depth -= 1;
                    }
                }
            }
            Event::Empty(e) => {
                if depth > 0 || has_local_name(e, "sheetData") {
                    writer.write_event(event.borrow())?;
                }
            }
            _ => {
                if depth > 0 {
                    writer.write_event(event.borrow())?;
                }
            }
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| ImprintError::XmlSynthesis(format!("sheet data is not UTF-8: {e}")))
}
