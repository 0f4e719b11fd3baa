/// Product identifier written into every exported calendar.
pub const EXPORT_PRODID: &str = "-//IDN nextcloud.com//Calendar App//EN";

/// iCalendar version written into every exported calendar.
pub const CALENDAR_VERSION: &str = "2.0";

/// XML namespace of the xCal encoding (RFC 6321).
pub const XCAL_NAMESPACE: &str = "urn:ietf:params:xml:ns:icalendar-2.0";

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

// Plain-text envelope
pub const TEXT_EXPORT_PROLOGUE: &str = const_str::concat!(
    "BEGIN:VCALENDAR\n",
    "VERSION:",
    CALENDAR_VERSION,
    "\n",
    "PRODID:",
    EXPORT_PRODID,
    "\n"
);
pub const TEXT_EXPORT_EPILOGUE: &str = "END:VCALENDAR\n";

// JSON envelope
pub const JSON_EXPORT_PROLOGUE: &str = const_str::concat!(
    r#"["vcalendar",[["version",{},"text",""#,
    CALENDAR_VERSION,
    r#""],["prodid",{},"text",""#,
    EXPORT_PRODID,
    r#""]],["#
);
pub const JSON_EXPORT_EPILOGUE: &str = "]]";

// XML envelope
pub const XML_CALENDAR_OPEN: &str = const_str::concat!(
    XML_DECLARATION,
    r#"<icalendar xmlns=""#,
    XCAL_NAMESPACE,
    r#""><vcalendar>"#
);
pub const XML_EXPORT_PROLOGUE: &str = const_str::concat!(
    XML_CALENDAR_OPEN,
    "<properties><version><text>",
    CALENDAR_VERSION,
    "</text></version><prodid><text>",
    EXPORT_PRODID,
    "</text></prodid></properties><components>"
);
pub const XML_EXPORT_EPILOGUE: &str = "</components></vcalendar></icalendar>";

/// Opening of the XML envelope used to re-parse extracted fragments.
pub const XML_IMPORT_PREFIX: &str = const_str::concat!(XML_CALENDAR_OPEN, "<components>");
pub const XML_IMPORT_SUFFIX: &str = XML_EXPORT_EPILOGUE;

/// Outcome bucket for documents without any base component.
pub const NO_BASE_COMPONENT_KEY: &str = "nbct";
/// Outcome bucket for documents mixing base component types.
pub const MIXED_BASE_COMPONENT_KEY: &str = "mbct";
/// Outcome bucket for documents whose base component has no UID.
pub const MISSING_UID_KEY: &str = "noid";
