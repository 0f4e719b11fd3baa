use quick_xml::Reader;
use quick_xml::events::Event;

use super::{GEO_FIELDS, REQUEST_STATUS_FIELDS};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::{
    Component, ComponentKind, ICalendar, Parameter, Property, ValueType, names,
    value::{format_recur, to_basic, until_type},
};

/// Element tree with namespace prefixes stripped and names lowercased.
#[derive(Debug, Default)]
struct Node {
    name: String,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }
}

/// Parses an xCal document.
///
/// Both `<icalendar><vcalendar>…` and a bare `<vcalendar>` root are accepted.
///
/// ## Errors
/// Returns an error if the XML is malformed or holds no `vcalendar` element.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &[u8]) -> RfcResult<ICalendar> {
    let root = read_tree(input)?;

    let calendar = match root.name.as_str() {
        "vcalendar" => &root,
        "icalendar" => root
            .child("vcalendar")
            .ok_or_else(|| RfcError::XCalError("icalendar holds no vcalendar".to_string()))?,
        other => {
            return Err(RfcError::XCalError(format!(
                "unexpected root element <{other}>"
            )));
        }
    };

    let root = component_from_node(calendar);
    if root.kind != Some(ComponentKind::Calendar) {
        return Err(RfcError::XCalError("expected vcalendar".to_string()));
    }
    Ok(ICalendar { root })
}

fn read_tree(input: &[u8]) -> RfcResult<Node> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(Node {
                    name: std::str::from_utf8(e.local_name().as_ref())?.to_ascii_lowercase(),
                    ..Node::default()
                });
            }
            Event::Empty(e) => {
                let node = Node {
                    name: std::str::from_utf8(e.local_name().as_ref())?.to_ascii_lowercase(),
                    ..Node::default()
                };
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| RfcError::XmlError("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, node);
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&reader.decoder().decode(e.as_ref())?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(std::str::from_utf8(e.as_ref())?);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    if let Some(ch) = e.resolve_char_ref()? {
                        current.text.push(ch);
                    } else {
                        let entity = reader.decoder().decode(e.as_ref())?;
                        let resolved = quick_xml::escape::resolve_predefined_entity(&entity)
                            .ok_or_else(|| {
                                RfcError::XmlError(format!("unknown entity &{entity};"))
                            })?;
                        current.text.push_str(resolved);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(RfcError::XmlError("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| RfcError::XmlError("document has no root element".to_string()))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn component_from_node(node: &Node) -> Component {
    let mut component = Component::named(&node.name);

    if let Some(properties) = node.child("properties") {
        component
            .properties
            .extend(properties.children.iter().map(property_from_node));
    }
    if let Some(components) = node.child("components") {
        component
            .children
            .extend(components.children.iter().map(component_from_node));
    }

    component
}

fn property_from_node(node: &Node) -> Property {
    let name = node.name.to_ascii_uppercase();

    let mut prop = if name == names::GEO {
        structured(&name, ValueType::Float, node, &GEO_FIELDS)
    } else if name == names::REQUEST_STATUS {
        structured(&name, ValueType::Text, node, &REQUEST_STATUS_FIELDS)
    } else {
        let value_nodes: Vec<&Node> = node
            .children
            .iter()
            .filter(|c| c.name != "parameters")
            .collect();
        let value_type = value_nodes.first().map_or_else(
            || ValueType::default_for(&name),
            |first| ValueType::from_param(&first.name),
        );
        let values = value_nodes
            .iter()
            .map(|value| value_from_node(value_type, value))
            .collect();
        Property::new(name, value_type, values)
    };

    if let Some(parameters) = node.child("parameters") {
        for param in &parameters.children {
            let values = if param.children.is_empty() {
                vec![param.text.clone()]
            } else {
                param.children.iter().map(|v| v.text.clone()).collect()
            };
            prop.params.push(Parameter::with_values(&param.name, values));
        }
    }

    prop.mark_explicit_type();
    prop
}

fn structured(name: &str, value_type: ValueType, node: &Node, fields: &[&str]) -> Property {
    let values = fields
        .iter()
        .map_while(|field| node.child_text(field).map(str::to_string))
        .collect();
    Property::new(name, value_type, values)
}

fn value_from_node(value_type: ValueType, node: &Node) -> String {
    match value_type {
        ValueType::Recur => {
            let mut parts: Vec<(String, String)> = Vec::new();
            for part in &node.children {
                let text = part.text.trim();
                let text = if part.name == "until" {
                    to_basic(until_type(text), text)
                } else {
                    text.to_string()
                };
                match parts.iter_mut().find(|(key, _)| *key == part.name) {
                    Some((_, existing)) => {
                        existing.push(',');
                        existing.push_str(&text);
                    }
                    None => parts.push((part.name.clone(), text)),
                }
            }
            format_recur(&parts)
        }
        ValueType::Period => {
            let start = node.child_text("start").unwrap_or_default();
            let end = node
                .child_text("end")
                .or_else(|| node.child_text("duration"));
            let period = match end {
                Some(end) => format!("{start}/{end}"),
                None => start.to_string(),
            };
            to_basic(ValueType::Period, &period)
        }
        ValueType::Text | ValueType::Unknown => node.text.clone(),
        ValueType::Boolean => node.text.trim().to_ascii_uppercase(),
        other => to_basic(other, node.text.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::xcal::serialize;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<icalendar xmlns="urn:ietf:params:xml:ns:icalendar-2.0">
  <vcalendar>
    <properties>
      <version><text>2.0</text></version>
      <prodid><text>-//T//T//EN</text></prodid>
    </properties>
    <components>
      <vevent>
        <properties>
          <uid><text> abc </text></uid>
          <summary><text>R&amp;D review</text></summary>
          <dtstart>
            <parameters><tzid><text>Europe/Berlin</text></tzid></parameters>
            <date-time>2026-01-23T12:00:00</date-time>
          </dtstart>
          <rrule><recur><freq>WEEKLY</freq><byday>MO</byday><byday>TU</byday></recur></rrule>
          <geo><latitude>1.5</latitude><longitude>-2.25</longitude></geo>
        </properties>
      </vevent>
    </components>
  </vcalendar>
</icalendar>"#;

    #[test_log::test]
    fn parse_document() {
        let ical = parse(DOCUMENT.as_bytes()).unwrap();
        assert_eq!(ical.version(), Some("2.0"));

        let event = &ical.components()[0];
        assert_eq!(event.uid(), Some(" abc "));
        assert_eq!(event.summary(), Some("R&D review"));

        let dtstart = event.get_property("DTSTART").unwrap();
        assert_eq!(dtstart.value(), Some("20260123T120000"));
        assert_eq!(dtstart.tzid(), Some("Europe/Berlin"));
        assert_eq!(
            event.get_property("RRULE").unwrap().value(),
            Some("FREQ=WEEKLY;BYDAY=MO,TU")
        );
        assert_eq!(event.get_property("GEO").unwrap().values, ["1.5", "-2.25"]);
    }

    #[test]
    fn prefixed_names_are_accepted() {
        let doc = br#"<x:icalendar xmlns:x="urn:ietf:params:xml:ns:icalendar-2.0"><x:vcalendar><x:components><x:vtodo><x:properties><x:uid><x:text>t</x:text></x:uid></x:properties></x:vtodo></x:components></x:vcalendar></x:icalendar>"#;
        let ical = parse(doc).unwrap();
        assert_eq!(ical.components()[0].uid(), Some("t"));
    }

    #[test]
    fn serialize_then_parse_is_lossless() {
        let ical = parse(DOCUMENT.as_bytes()).unwrap();
        let again = parse(serialize(&ical).unwrap().as_bytes()).unwrap();
        assert_eq!(again, ical);
    }

    #[test]
    fn malformed_xml_is_rejected() {
        assert!(matches!(
            parse(b"<icalendar><vcalendar></icalendar>"),
            Err(RfcError::XmlError(_))
        ));
        assert!(matches!(
            parse(b"<vevent/>"),
            Err(RfcError::XCalError(_))
        ));
    }
}
