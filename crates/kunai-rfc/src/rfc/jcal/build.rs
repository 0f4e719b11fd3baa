use serde_json::{Map, Number, Value, json};

use crate::rfc::ical::core::{
    Component, ICalendar, Property, ValueType, names,
    value::{is_numeric_recur_part, parse_recur, to_extended, until_type},
};

/// Serializes a calendar to jCal text.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    to_json(ical).to_string()
}

/// Serializes one component to jCal text.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    component_to_json(component).to_string()
}

/// Converts a calendar to a jCal JSON node.
#[must_use]
pub fn to_json(ical: &ICalendar) -> Value {
    component_to_json(&ical.root)
}

/// Converts a component (and its children) to a jCal JSON node.
#[must_use]
pub fn component_to_json(component: &Component) -> Value {
    let properties: Vec<Value> = component.properties.iter().map(property_to_json).collect();
    let children: Vec<Value> = component.children.iter().map(component_to_json).collect();
    json!([component.name.to_ascii_lowercase(), properties, children])
}

fn property_to_json(prop: &Property) -> Value {
    let mut params = Map::new();
    for param in prop.params.iter().filter(|p| p.name != "VALUE") {
        let value = match param.values.as_slice() {
            [single] => Value::String(single.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };
        params.insert(param.name.to_ascii_lowercase(), value);
    }

    let mut items = vec![
        Value::String(prop.name.to_ascii_lowercase()),
        Value::Object(params),
        Value::String(prop.value_type.wire_name().to_string()),
    ];

    if prop.is_structured() {
        let fields = prop
            .values
            .iter()
            .map(|v| {
                if prop.name.eq_ignore_ascii_case(names::GEO) {
                    float_value(v)
                } else {
                    Value::String(v.clone())
                }
            })
            .collect();
        items.push(Value::Array(fields));
    } else {
        items.extend(prop.values.iter().map(|v| value_to_json(prop.value_type, v)));
    }

    Value::Array(items)
}

fn value_to_json(value_type: ValueType, value: &str) -> Value {
    match value_type {
        ValueType::Boolean => Value::Bool(value.eq_ignore_ascii_case("TRUE")),
        ValueType::Integer => integer_value(value),
        ValueType::Float => float_value(value),
        ValueType::Recur => recur_to_json(value),
        _ => Value::String(to_extended(value_type, value)),
    }
}

fn integer_value(value: &str) -> Value {
    value
        .parse::<i64>()
        .map_or_else(|_| Value::String(value.to_string()), Value::from)
}

fn float_value(value: &str) -> Value {
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(value.to_string()), Value::Number)
}

fn recur_to_json(value: &str) -> Value {
    let mut rule = Map::new();
    for (key, raw) in parse_recur(value) {
        let node = if key == "until" {
            Value::String(to_extended(until_type(&raw), &raw))
        } else {
            let numeric = is_numeric_recur_part(&key);
            let mut items: Vec<Value> = raw
                .split(',')
                .map(|item| {
                    if numeric {
                        integer_value(item)
                    } else {
                        Value::String(item.to_string())
                    }
                })
                .collect();
            if items.len() == 1 {
                items.remove(0)
            } else {
                Value::Array(items)
            }
        };
        rule.insert(key, node);
    }
    Value::Object(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::Parameter;

    #[test]
    fn property_shapes() {
        let dtstart = Property::single("DTSTART", "20260123T120000")
            .with_param(Parameter::tzid("Europe/Berlin"));
        assert_eq!(
            property_to_json(&dtstart),
            json!(["dtstart", {"tzid": "Europe/Berlin"}, "date-time", "2026-01-23T12:00:00"])
        );

        let sequence = Property::single("SEQUENCE", "2");
        assert_eq!(property_to_json(&sequence), json!(["sequence", {}, "integer", 2]));

        let geo = Property::new("GEO", ValueType::Float, vec!["1.5".into(), "-2.25".into()]);
        assert_eq!(property_to_json(&geo), json!(["geo", {}, "float", [1.5, -2.25]]));
    }

    #[test]
    fn value_parameter_is_folded_into_type() {
        let date = Property::new("DTSTART", ValueType::Date, vec!["20260101".into()])
            .with_param(Parameter::value_type("DATE"));
        assert_eq!(
            property_to_json(&date),
            json!(["dtstart", {}, "date", "2026-01-01"])
        );
    }

    #[test]
    fn recur_becomes_object() {
        assert_eq!(
            recur_to_json("FREQ=WEEKLY;BYDAY=MO,TU;COUNT=10;UNTIL=20261231T000000Z"),
            json!({
                "freq": "WEEKLY",
                "byday": ["MO", "TU"],
                "count": 10,
                "until": "2026-12-31T00:00:00Z"
            })
        );
    }

    #[test]
    fn component_nesting() {
        let mut event = Component::event().with_property(Property::text("UID", "abc"));
        event.add_child(Component::named("VALARM"));
        assert_eq!(
            component_to_json(&event),
            json!(["vevent", [["uid", {}, "text", "abc"]], [["valarm", [], []]]])
        );
    }
}
