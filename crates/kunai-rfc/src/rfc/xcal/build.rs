use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{GEO_FIELDS, REQUEST_STATUS_FIELDS, parameter_value_type};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::{
    Component, ICalendar, Parameter, Property, ValueType, names,
    value::{parse_recur, to_extended, until_type},
};
use kunai_core::constants::XCAL_NAMESPACE;

type XmlWriter = Writer<Vec<u8>>;

/// Serializes a calendar as a complete xCal document.
///
/// ## Errors
/// Returns an error if the XML writer fails.
pub fn serialize(ical: &ICalendar) -> RfcResult<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("icalendar");
    root.push_attribute(("xmlns", XCAL_NAMESPACE));
    writer.write_event(Event::Start(root))?;
    write_component(&mut writer, &ical.root)?;
    close(&mut writer, "icalendar")?;

    into_string(writer)
}

/// Serializes one component as an xCal fragment without declaration or namespace.
///
/// ## Errors
/// Returns an error if the XML writer fails.
pub fn serialize_component(component: &Component) -> RfcResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_component(&mut writer, component)?;
    into_string(writer)
}

fn into_string(writer: XmlWriter) -> RfcResult<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| RfcError::XmlError(format!("writer produced invalid UTF-8: {e}")))
}

fn open(writer: &mut XmlWriter, name: &str) -> RfcResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close(writer: &mut XmlWriter, name: &str) -> RfcResult<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> RfcResult<()> {
    open(writer, name)?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    close(writer, name)
}

fn write_component(writer: &mut XmlWriter, component: &Component) -> RfcResult<()> {
    let name = component.name.to_ascii_lowercase();
    open(writer, &name)?;

    if !component.properties.is_empty() {
        open(writer, "properties")?;
        for prop in &component.properties {
            write_property(writer, prop)?;
        }
        close(writer, "properties")?;
    }

    if !component.children.is_empty() {
        open(writer, "components")?;
        for child in &component.children {
            write_component(writer, child)?;
        }
        close(writer, "components")?;
    }

    close(writer, &name)
}

fn write_property(writer: &mut XmlWriter, prop: &Property) -> RfcResult<()> {
    let name = prop.name.to_ascii_lowercase();
    open(writer, &name)?;

    let params: Vec<&Parameter> = prop.params.iter().filter(|p| p.name != "VALUE").collect();
    if !params.is_empty() {
        open(writer, "parameters")?;
        for param in params {
            let param_name = param.name.to_ascii_lowercase();
            let value_element = parameter_value_type(&param.name);
            open(writer, &param_name)?;
            for value in &param.values {
                text_element(writer, value_element, value)?;
            }
            close(writer, &param_name)?;
        }
        close(writer, "parameters")?;
    }

    if prop.name.eq_ignore_ascii_case(names::GEO) {
        for (field, value) in GEO_FIELDS.iter().zip(&prop.values) {
            text_element(writer, field, value)?;
        }
    } else if prop.name.eq_ignore_ascii_case(names::REQUEST_STATUS) {
        for (field, value) in REQUEST_STATUS_FIELDS.iter().zip(&prop.values) {
            text_element(writer, field, value)?;
        }
    } else {
        for value in &prop.values {
            write_value(writer, prop.value_type, value)?;
        }
    }

    close(writer, &name)
}

fn write_value(writer: &mut XmlWriter, value_type: ValueType, value: &str) -> RfcResult<()> {
    let element = value_type.wire_name();
    match value_type {
        ValueType::Recur => {
            open(writer, element)?;
            for (key, raw) in parse_recur(value) {
                if key == "until" {
                    text_element(writer, &key, &to_extended(until_type(&raw), &raw))?;
                } else {
                    for item in raw.split(',') {
                        text_element(writer, &key, item)?;
                    }
                }
            }
            close(writer, element)
        }
        ValueType::Period => {
            let extended = to_extended(ValueType::Period, value);
            open(writer, element)?;
            match extended.split_once('/') {
                Some((start, end)) => {
                    text_element(writer, "start", start)?;
                    let end_element = if end.starts_with(['P', '+', '-']) {
                        "duration"
                    } else {
                        "end"
                    };
                    text_element(writer, end_element, end)?;
                }
                None => text_element(writer, "start", &extended)?,
            }
            close(writer, element)
        }
        ValueType::Boolean => text_element(writer, element, &value.to_ascii_lowercase()),
        _ => text_element(writer, element, &to_extended(value_type, value)),
    }
}
