//! Result of a structural indexing pass.

use std::collections::HashMap;

use kunai_rfc::rfc::ical::core::ComponentKind;

/// Component kinds tracked by the indexers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentKind {
    Event,
    Todo,
    Journal,
    TimeZone,
    /// Calendar-level properties outside any sub-component.
    CalendarRoot,
}

impl FragmentKind {
    /// Kinds assembled into objects, in assembly order.
    pub const OBJECTS: [Self; 3] = [Self::Event, Self::Todo, Self::Journal];

    /// Maps a component name (`VEVENT`, `vtodo`, ...) to a tracked kind.
    #[must_use]
    pub fn from_component_name(name: &str) -> Option<Self> {
        match ComponentKind::parse(name) {
            ComponentKind::Event => Some(Self::Event),
            ComponentKind::Todo => Some(Self::Todo),
            ComponentKind::Journal => Some(Self::Journal),
            ComponentKind::Timezone => Some(Self::TimeZone),
            _ => None,
        }
    }

    /// Returns the property carrying the identifier of this kind.
    #[must_use]
    pub const fn identifier_property(self) -> Option<&'static str> {
        match self {
            Self::Event | Self::Todo | Self::Journal => Some("UID"),
            Self::TimeZone => Some("TZID"),
            Self::CalendarRoot => None,
        }
    }

    #[must_use]
    pub const fn component_name(self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::TimeZone => "VTIMEZONE",
            Self::CalendarRoot => "VCALENDAR",
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.component_name())
    }
}

/// One physical occurrence of a component in a source. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFragment {
    pub kind: FragmentKind,
    pub identifier: Option<String>,
    pub start: u64,
    pub end: u64,
    /// Slash-joined ancestor element names; XML sources only.
    pub path: Option<String>,
}

impl ComponentFragment {
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Key of a fragment group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Identified(String),
    /// Fragment without identifier; numbered in order of appearance.
    Anonymous(usize),
}

impl GroupKey {
    /// Returns the identifier, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Identified(id) => Some(id),
            Self::Anonymous(_) => None,
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identified(id) => f.write_str(id),
            Self::Anonymous(n) => write!(f, "anonymous-{n}"),
        }
    }
}

/// Groups of every kind, each list in first-seen order.
pub type GroupMap<T> = HashMap<FragmentKind, Vec<Group<T>>>;

/// Fragments sharing a kind and identifier, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<T> {
    pub key: GroupKey,
    pub members: Vec<T>,
}

/// ## Summary
/// Kind → identifier → ordered fragments, plus the calendar-level section.
///
/// Groups keep the order in which their identifier was first seen. The
/// indexers build a structure through the crate-private mutators; callers
/// only read it or hand it to an assembler.
///
/// `T` is [`ComponentFragment`] for byte-range sources and an already
/// parsed component for JSON sources.
#[derive(Debug, Clone)]
pub struct Structure<T = ComponentFragment> {
    groups: GroupMap<T>,
    positions: HashMap<(FragmentKind, String), usize>,
    anonymous: usize,
    root_lines: Vec<String>,
    root: Option<T>,
}

impl<T> Default for Structure<T> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
            positions: HashMap::new(),
            anonymous: 0,
            root_lines: Vec::new(),
            root: None,
        }
    }
}

impl<T> Structure<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the groups of a kind in first-seen order.
    #[must_use]
    pub fn groups(&self, kind: FragmentKind) -> &[Group<T>] {
        self.groups.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Returns the fragments recorded under an identifier.
    #[must_use]
    pub fn fragments(&self, kind: FragmentKind, identifier: &str) -> Option<&[T]> {
        let position = *self.positions.get(&(kind, identifier.to_string()))?;
        self.groups
            .get(&kind)
            .and_then(|groups| groups.get(position))
            .map(|group| group.members.as_slice())
    }

    /// Returns the raw calendar-level lines of a text source.
    #[must_use]
    pub fn root_lines(&self) -> &[String] {
        &self.root_lines
    }

    /// Returns the calendar-level fragment of an XML or JSON source.
    #[must_use]
    pub const fn root(&self) -> Option<&T> {
        self.root.as_ref()
    }

    /// Total number of fragments across all kinds.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.groups
            .values()
            .flatten()
            .map(|group| group.members.len())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    /// Splits the structure into its groups and calendar-level section.
    #[must_use]
    pub fn into_parts(self) -> (GroupMap<T>, Vec<String>, Option<T>) {
        (self.groups, self.root_lines, self.root)
    }

    /// Records a fragment. Anonymous fragments each open their own group.
    pub(crate) fn push(&mut self, kind: FragmentKind, identifier: Option<String>, fragment: T) {
        let groups = self.groups.entry(kind).or_default();
        match identifier {
            Some(id) => match self.positions.get(&(kind, id.clone())) {
                Some(&position) => groups[position].members.push(fragment),
                None => {
                    self.positions.insert((kind, id.clone()), groups.len());
                    groups.push(Group {
                        key: GroupKey::Identified(id),
                        members: vec![fragment],
                    });
                }
            },
            None => {
                self.anonymous += 1;
                groups.push(Group {
                    key: GroupKey::Anonymous(self.anonymous),
                    members: vec![fragment],
                });
            }
        }
    }

    pub(crate) fn push_root_line(&mut self, line: String) {
        self.root_lines.push(line);
    }

    pub(crate) fn set_root(&mut self, root: T) {
        self.root = Some(root);
    }
}
