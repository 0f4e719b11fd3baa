use serde_json::Value;

use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::{
    Component, ComponentKind, ICalendar, Parameter, Property, ValueType,
    value::{format_recur, to_basic, until_type},
};

/// Parses a jCal document.
///
/// ## Errors
/// Returns an error if the input is not JSON or not a jCal `vcalendar`.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &[u8]) -> RfcResult<ICalendar> {
    let value: Value = serde_json::from_slice(input)?;
    from_json(&value)
}

/// Converts a jCal JSON node into a calendar.
///
/// ## Errors
/// Returns an error if the node is not a well-formed `vcalendar` component.
pub fn from_json(value: &Value) -> RfcResult<ICalendar> {
    let root = component_from_json(value)?;
    if root.kind != Some(ComponentKind::Calendar) {
        return Err(RfcError::JCalError(format!(
            "expected vcalendar root, got {}",
            root.name.to_ascii_lowercase()
        )));
    }
    Ok(ICalendar { root })
}

/// Converts a jCal component node.
///
/// ## Errors
/// Returns an error if the node is not a `[name, [properties], [components]]` triple.
pub fn component_from_json(value: &Value) -> RfcResult<Component> {
    let Some([name, properties, children]) = value.as_array().map(Vec::as_slice) else {
        return Err(RfcError::JCalError(
            "component must be a three element array".to_string(),
        ));
    };

    let name = name
        .as_str()
        .ok_or_else(|| RfcError::JCalError("component name must be a string".to_string()))?;
    let mut component = Component::named(name);

    for prop in as_array(properties, "component properties")? {
        component.properties.push(property_from_json(prop)?);
    }
    for child in as_array(children, "sub-components")? {
        component.children.push(component_from_json(child)?);
    }

    Ok(component)
}

fn as_array<'a>(value: &'a Value, what: &str) -> RfcResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| RfcError::JCalError(format!("{what} must be an array")))
}

fn property_from_json(value: &Value) -> RfcResult<Property> {
    let items = as_array(value, "property")?;
    let [name, params, value_type, values @ ..] = items.as_slice() else {
        return Err(RfcError::JCalError(
            "property needs a name, parameters and a type".to_string(),
        ));
    };

    let name = name
        .as_str()
        .ok_or_else(|| RfcError::JCalError("property name must be a string".to_string()))?
        .to_ascii_uppercase();
    let value_type = ValueType::from_param(value_type.as_str().ok_or_else(|| {
        RfcError::JCalError(format!("type of property {name} must be a string"))
    })?);

    let mut prop = Property::new(name, value_type, Vec::new());

    let params = params.as_object().ok_or_else(|| {
        RfcError::JCalError(format!("parameters of property {} must be an object", prop.name))
    })?;
    for (param_name, param_value) in params {
        let values = match param_value {
            Value::Array(items) => items.iter().map(scalar_text).collect::<RfcResult<_>>()?,
            other => vec![scalar_text(other)?],
        };
        prop.params.push(Parameter::with_values(param_name, values));
    }

    prop.mark_explicit_type();

    for value in values {
        match value {
            Value::Array(fields) => {
                for field in fields {
                    prop.values.push(scalar_text(field)?);
                }
            }
            Value::Object(_) if value_type == ValueType::Recur => {
                prop.values.push(recur_from_json(value)?);
            }
            other => prop.values.push(to_basic(value_type, &scalar_text(other)?)),
        }
    }

    Ok(prop)
}

/// Renders a JSON scalar in iCalendar text form.
fn scalar_text(value: &Value) -> RfcResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        other => Err(RfcError::JCalError(format!("expected a scalar value, got {other}"))),
    }
}

fn recur_from_json(value: &Value) -> RfcResult<String> {
    let Some(rule) = value.as_object() else {
        return Err(RfcError::JCalError("recur value must be an object".to_string()));
    };

    let mut parts = Vec::with_capacity(rule.len());
    // FREQ conventionally leads the rule
    let ordered = rule
        .iter()
        .filter(|(key, _)| key.as_str() == "freq")
        .chain(rule.iter().filter(|(key, _)| key.as_str() != "freq"));

    for (key, part) in ordered {
        let text = match part {
            Value::Array(items) => items
                .iter()
                .map(scalar_text)
                .collect::<RfcResult<Vec<_>>>()?
                .join(","),
            other => scalar_text(other)?,
        };
        let text = if key == "until" {
            to_basic(until_type(&text), &text)
        } else {
            text
        };
        parts.push((key.clone(), text));
    }

    Ok(format_recur(&parts))
}
