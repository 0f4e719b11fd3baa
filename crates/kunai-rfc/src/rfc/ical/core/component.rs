//! iCalendar component types (RFC 5545 §3.4-3.6).

use super::{Property, names};

/// Component kind for iCalendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR wrapper component.
    Calendar,
    /// VEVENT component.
    Event,
    /// VTODO component.
    Todo,
    /// VJOURNAL component.
    Journal,
    /// VFREEBUSY component.
    FreeBusy,
    /// VTIMEZONE component.
    Timezone,
    /// VALARM component (nested within VEVENT/VTODO).
    Alarm,
    /// STANDARD sub-component of VTIMEZONE.
    Standard,
    /// DAYLIGHT sub-component of VTIMEZONE.
    Daylight,
    /// Unknown/X-component.
    Unknown,
}

impl ComponentKind {
    /// Returns the string name for this component kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Unknown => "X-UNKNOWN",
        }
    }

    /// Parses a component kind from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Unknown,
        }
    }

    /// Returns whether this is a schedulable component (VEVENT, VTODO, VJOURNAL).
    #[must_use]
    pub const fn is_schedulable(self) -> bool {
        matches!(self, Self::Event | Self::Todo | Self::Journal)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Date-bearing properties that may reference a time zone through `TZID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeProperty {
    DtStart,
    DtEnd,
    Due,
    RDate,
    ExDate,
}

impl TimeProperty {
    pub const ALL: [Self; 5] = [
        Self::DtStart,
        Self::DtEnd,
        Self::Due,
        Self::RDate,
        Self::ExDate,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DtStart => names::DTSTART,
            Self::DtEnd => names::DTEND,
            Self::Due => names::DUE,
            Self::RDate => names::RDATE,
            Self::ExDate => names::EXDATE,
        }
    }
}

/// An iCalendar component.
///
/// Components can contain properties and nested sub-components.
/// For example, a VCALENDAR contains VEVENTs, which may contain VALARMs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    /// Component type/name.
    pub kind: Option<ComponentKind>,
    /// Original component name (preserved for X-components).
    pub name: String,
    /// Properties in order of appearance.
    pub properties: Vec<Property>,
    /// Nested sub-components.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates a new component with the given kind.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind: Some(kind),
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a component from its name, keeping the name for X-components.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        let kind = ComponentKind::parse(&name);
        Self {
            kind: Some(kind),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a VCALENDAR component.
    #[must_use]
    pub fn calendar() -> Self {
        Self::new(ComponentKind::Calendar)
    }

    /// Creates a VEVENT component.
    #[must_use]
    pub fn event() -> Self {
        Self::new(ComponentKind::Event)
    }

    /// Creates a VTODO component.
    #[must_use]
    pub fn todo() -> Self {
        Self::new(ComponentKind::Todo)
    }

    /// Creates a VTIMEZONE component.
    #[must_use]
    pub fn timezone() -> Self {
        Self::new(ComponentKind::Timezone)
    }

    /// Adds a property to this component.
    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, prop: Property) -> Self {
        self.properties.push(prop);
        self
    }

    /// Adds a child component.
    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    /// Replaces every property named like `prop` with `prop`.
    ///
    /// The replacement takes the position of the first removed property, or
    /// goes last when there was none.
    pub fn set_property(&mut self, prop: Property) {
        let position = self.properties.iter().position(|p| p.name == prop.name);
        self.remove_properties(&prop.name);
        match position {
            Some(index) => self.properties.insert(index, prop),
            None => self.properties.push(prop),
        }
    }

    /// Removes all properties with the given name, returning how many were removed.
    pub fn remove_properties(&mut self, name: &str) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| !p.name.eq_ignore_ascii_case(name));
        before - self.properties.len()
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns all properties with the given name.
    #[must_use]
    pub fn get_properties(&self, name: &str) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// Returns whether a property with the given name is present.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    /// Returns the UID property value if present.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.get_property(names::UID)?.value()
    }

    /// Returns the TZID property value if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_property(names::TZID)?.value()
    }

    /// Returns the value identifying this component within its kind:
    /// `TZID` for time zones, `UID` otherwise.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        if self.kind == Some(ComponentKind::Timezone) {
            self.tzid()
        } else {
            self.uid()
        }
    }

    /// Returns whether this component overrides one recurrence instance.
    #[must_use]
    pub fn is_recurrence_instance(&self) -> bool {
        self.has_property(names::RECURRENCE_ID)
    }

    /// Returns the SUMMARY property value if present.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_property(names::SUMMARY)?.value()
    }

    /// Returns the given date-bearing property if present.
    #[must_use]
    pub fn time_property(&self, which: TimeProperty) -> Option<&Property> {
        self.get_property(which.name())
    }

    /// ## Summary
    /// Returns the distinct `TZID` parameters on this component's date-bearing
    /// properties, in order of first appearance.
    #[must_use]
    pub fn referenced_tzids(&self) -> Vec<&str> {
        let mut tzids: Vec<&str> = Vec::new();
        for which in TimeProperty::ALL {
            for prop in self.get_properties(which.name()) {
                if let Some(tzid) = prop.tzid()
                    && !tzids.contains(&tzid)
                {
                    tzids.push(tzid);
                }
            }
        }
        tzids
    }

    /// Returns children of a specific kind.
    #[must_use]
    pub fn children_of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children
            .iter()
            .filter(|c| c.kind == Some(kind))
            .collect()
    }
}

/// Top-level iCalendar object.
///
/// This is a convenience wrapper around a VCALENDAR component
/// with helper methods for common operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ICalendar {
    /// The root VCALENDAR component.
    pub root: Component,
}

impl ICalendar {
    /// Creates a new empty iCalendar with required properties.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let mut root = Component::calendar();
        root.add_property(Property::text(names::VERSION, "2.0"));
        root.add_property(Property::text(names::PRODID, prodid));
        Self { root }
    }

    /// Creates a calendar without any calendar-level properties.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            root: Component::calendar(),
        }
    }

    /// Returns the PRODID value.
    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.header(names::PRODID)
    }

    /// Returns the VERSION value.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.header(names::VERSION)
    }

    /// Returns a calendar-level property value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.root.get_property(name)?.value()
    }

    /// Sets a calendar-level property, replacing any previous value.
    pub fn set_header(&mut self, prop: Property) {
        self.root.set_property(prop);
    }

    /// Returns all sub-components in document order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.root.children
    }

    /// ## Summary
    /// Returns the base components: everything but time zones and
    /// recurrence-instance overrides.
    #[must_use]
    pub fn base_components(&self) -> Vec<&Component> {
        self.root
            .children
            .iter()
            .filter(|c| c.kind != Some(ComponentKind::Timezone) && !c.is_recurrence_instance())
            .collect()
    }

    /// Returns every non-time-zone component carrying the given UID.
    #[must_use]
    pub fn components_by_uid(&self, uid: &str) -> Vec<&Component> {
        self.root
            .children
            .iter()
            .filter(|c| c.kind != Some(ComponentKind::Timezone) && c.uid() == Some(uid))
            .collect()
    }

    /// Appends a sub-component.
    pub fn add_component(&mut self, component: Component) {
        self.root.add_child(component);
    }

    /// Returns all VEVENT components.
    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Event)
    }

    /// Returns all VTIMEZONE components.
    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Timezone)
    }

    /// Returns all unique UIDs in this calendar.
    #[must_use]
    pub fn uids(&self) -> Vec<&str> {
        let mut uids: Vec<&str> = self.root.children.iter().filter_map(|c| c.uid()).collect();
        uids.sort_unstable();
        uids.dedup();
        uids
    }
}

impl Default for ICalendar {
    fn default() -> Self {
        Self::new(kunai_core::constants::EXPORT_PRODID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::Parameter;

    fn event(uid: &str) -> Component {
        Component::event().with_property(Property::text(names::UID, uid))
    }

    #[test]
    fn component_kind_parse() {
        assert_eq!(ComponentKind::parse("VEVENT"), ComponentKind::Event);
        assert_eq!(ComponentKind::parse("vtodo"), ComponentKind::Todo);
        assert_eq!(ComponentKind::parse("X-CUSTOM"), ComponentKind::Unknown);
    }

    #[test]
    fn icalendar_new() {
        let ical = ICalendar::new("-//Test//Test//EN");
        assert_eq!(ical.version(), Some("2.0"));
        assert_eq!(ical.prodid(), Some("-//Test//Test//EN"));
    }

    #[test]
    fn base_components_skip_timezones_and_overrides() {
        let mut ical = ICalendar::default();
        ical.add_component(Component::timezone().with_property(Property::text("TZID", "X")));
        ical.add_component(event("a"));
        ical.add_component(
            event("a").with_property(Property::single("RECURRENCE-ID", "20260101T100000Z")),
        );
        ical.add_component(event("b"));

        let base: Vec<_> = ical.base_components().iter().filter_map(|c| c.uid()).collect();
        assert_eq!(base, vec!["a", "b"]);
        assert_eq!(ical.components_by_uid("a").len(), 2);
        assert_eq!(ical.uids(), vec!["a", "b"]);
    }

    #[test]
    fn referenced_tzids_are_distinct() {
        let component = event("a")
            .with_property(
                Property::single("DTSTART", "20260101T100000").with_param(Parameter::tzid("Berlin")),
            )
            .with_property(
                Property::single("DTEND", "20260101T110000").with_param(Parameter::tzid("Berlin")),
            )
            .with_property(
                Property::single("EXDATE", "20260108T100000").with_param(Parameter::tzid("Paris")),
            )
            .with_property(
                Property::single("LAST-MODIFIED", "20260101T100000")
                    .with_param(Parameter::tzid("Ignored")),
            );

        assert_eq!(component.referenced_tzids(), vec!["Berlin", "Paris"]);
        assert!(component.time_property(TimeProperty::Due).is_none());
    }

    #[test]
    fn set_header_replaces_in_place() {
        let mut ical = ICalendar::new("-//A//A//EN");
        ical.set_header(Property::text("PRODID", "-//B//B//EN"));
        assert_eq!(ical.prodid(), Some("-//B//B//EN"));
        assert_eq!(ical.root.properties[1].name, "PRODID");
    }
}
