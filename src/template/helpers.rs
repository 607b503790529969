//! Helper functions available to webhook templates.
//!
//! All helpers are pure. Values produced by the snapshot are plain JSON, so
//! timestamps arrive as RFC 3339 strings.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, PathAndJson, RenderContext, RenderError,
    RenderErrorReason, ScopedJson, handlebars_helper,
};
use serde_json::Value as Json;

/// Template function names that map to handlebars built-ins.
const BUILTINS: [(&str, &str); 10] = [
    ("eq", "eq"),
    ("ne", "ne"),
    ("lt", "lt"),
    ("le", "lte"),
    ("gt", "gt"),
    ("ge", "gte"),
    ("and", "and"),
    ("or", "or"),
    ("not", "not"),
    ("len", "len"),
];

/// Helpers registered by [`register`], callable from templates by name.
const CUSTOM: [&str; 16] = [
    "upper",
    "lower",
    "trim",
    "truncate",
    "json",
    "jsonEscape",
    "formatTime",
    "unixTime",
    "default",
    "statusCode",
    "colorHex",
    "print",
    "printf",
    "println",
    "urlquery",
    "index",
];

/// Resolves a template function name to its registered helper name.
pub(super) fn lookup(name: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(template, _)| *template == name)
        .map(|(_, helper)| *helper)
        .or_else(|| CUSTOM.iter().find(|helper| **helper == name).copied())
}

handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());
handlebars_helper!(trim: |s: str| s.trim());
handlebars_helper!(truncate: |max: u64, s: str| {
    truncate_text(s, usize::try_from(max).unwrap_or(usize::MAX))
});
handlebars_helper!(json: |value: Json| serde_json::to_string(value).unwrap_or_default());
handlebars_helper!(json_escape: |s: str| escape_json(s));
handlebars_helper!(format_time: |layout: str, time: str| format_timestamp(layout, time));
handlebars_helper!(unix_time: |time: str| unix_seconds(time));
handlebars_helper!(default_value: |fallback: Json, value: Json| {
    if is_blank(value) { fallback.clone() } else { value.clone() }
});
handlebars_helper!(status_code: |data: Json| Outcome::of(data).code());
handlebars_helper!(color_hex: |data: Json| Outcome::of(data).color());
handlebars_helper!(print: |*args| sprint(&args));
handlebars_helper!(println: |*args| sprintln(&args));
handlebars_helper!(printf: |format: str, *args| sprintf(format, &args[1..]));
handlebars_helper!(urlquery: |*args| query_escape(&sprint(&args)));
handlebars_helper!(literal: |value: Json| value.clone());

/// `index collection key...`, failing the render on a bad key.
struct Index;

impl HelperDef for Index {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let mut params = h.params().iter().map(PathAndJson::value);
        let collection = params
            .next()
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("index", 0))?;
        let keys: Vec<&Json> = params.collect();

        index_value(collection, &keys)
            .map(|value| ScopedJson::Derived(value.clone()))
            .map_err(|reason| RenderErrorReason::Other(reason).into())
    }
}

/// Registers every template helper on `registry`.
pub(super) fn register(registry: &mut Handlebars<'_>) {
    registry.register_helper("upper", Box::new(upper));
    registry.register_helper("lower", Box::new(lower));
    registry.register_helper("trim", Box::new(trim));
    registry.register_helper("truncate", Box::new(truncate));
    registry.register_helper("json", Box::new(json));
    registry.register_helper("jsonEscape", Box::new(json_escape));
    registry.register_helper("formatTime", Box::new(format_time));
    registry.register_helper("unixTime", Box::new(unix_time));
    registry.register_helper("default", Box::new(default_value));
    registry.register_helper("statusCode", Box::new(status_code));
    registry.register_helper("colorHex", Box::new(color_hex));
    registry.register_helper("print", Box::new(print));
    registry.register_helper("printf", Box::new(printf));
    registry.register_helper("println", Box::new(println));
    registry.register_helper("urlquery", Box::new(urlquery));
    registry.register_helper("index", Box::new(Index));
    // Internal: outputs a literal, which handlebars cannot do on its own.
    registry.register_helper("literal", Box::new(literal));
}

/// Cuts `s` to at most `max` characters.
///
/// Cut text ends in `...` (counted in `max`); with `max <= 3` the text is
/// cut without a marker.
#[must_use]
pub fn truncate_text(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }

    let mut cut: String = s.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

/// JSON string escaping without the surrounding quotes.
#[must_use]
pub fn escape_json(s: &str) -> String {
    let quoted = Json::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// How one reference-time token is written.
#[derive(Clone, Copy)]
enum Chunk {
    /// A chrono format item
    Item(&'static str),
    /// Zone name: `UTC` at offset zero, the numeric offset otherwise
    Zone,
    /// `Z` at offset zero, the given offset item otherwise
    UtcOr(&'static str),
}

/// Reference-time tokens, longest first where one is a prefix of another.
const LAYOUT_CHUNKS: [(&str, Chunk); 30] = [
    ("January", Chunk::Item("%B")),
    ("Jan", Chunk::Item("%b")),
    ("Monday", Chunk::Item("%A")),
    ("Mon", Chunk::Item("%a")),
    ("MST", Chunk::Zone),
    ("2006", Chunk::Item("%Y")),
    ("Z07:00", Chunk::UtcOr("%:z")),
    ("Z0700", Chunk::UtcOr("%z")),
    ("Z07", Chunk::UtcOr("%:::z")),
    ("-07:00", Chunk::Item("%:z")),
    ("-0700", Chunk::Item("%z")),
    ("-07", Chunk::Item("%:::z")),
    (".000000000", Chunk::Item("%.9f")),
    (".000000", Chunk::Item("%.6f")),
    (".000", Chunk::Item("%.3f")),
    ("15", Chunk::Item("%H")),
    ("01", Chunk::Item("%m")),
    ("02", Chunk::Item("%d")),
    ("03", Chunk::Item("%I")),
    ("04", Chunk::Item("%M")),
    ("05", Chunk::Item("%S")),
    ("06", Chunk::Item("%y")),
    ("_2", Chunk::Item("%e")),
    ("PM", Chunk::Item("%p")),
    ("pm", Chunk::Item("%P")),
    ("1", Chunk::Item("%-m")),
    ("2", Chunk::Item("%-d")),
    ("3", Chunk::Item("%-I")),
    ("4", Chunk::Item("%-M")),
    ("5", Chunk::Item("%-S")),
];

/// Formats an RFC 3339 timestamp with a reference-time layout.
///
/// Layouts spell out how the reference time `Mon Jan 2 15:04:05 MST 2006`
/// would be written, e.g. `2006-01-02 15:04` or `Jan _2 3:04PM`. Text that
/// is not a reference token is copied as is. Input that is not a timestamp
/// yields the input unchanged.
#[must_use]
pub fn format_timestamp(layout: &str, timestamp: &str) -> String {
    let Ok(time) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };

    let mut out = String::new();
    let mut rest = layout;
    while let Some(c) = rest.chars().next() {
        match LAYOUT_CHUNKS.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, chunk)) => {
                write_chunk(&mut out, &time, *chunk);
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

fn write_chunk(out: &mut String, time: &DateTime<FixedOffset>, chunk: Chunk) {
    let utc = time.offset().local_minus_utc() == 0;
    let item = match chunk {
        Chunk::Item(item) => item,
        Chunk::Zone if utc => "UTC",
        Chunk::Zone => "%z",
        Chunk::UtcOr(_) if utc => "Z",
        Chunk::UtcOr(item) => item,
    };
    let _ = write!(out, "{}", time.format(item));
}

/// Seconds since the Unix epoch of an RFC 3339 timestamp, or 0.
#[must_use]
pub fn unix_seconds(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp).map_or(0, |time| time.timestamp())
}

/// Operands joined the way `print` joins them: a space goes between two
/// operands only when neither is a string.
#[must_use]
pub fn sprint(args: &[&Json]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !arg.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        out.push_str(&plain(arg));
    }
    out
}

/// Operands separated by spaces, with a trailing newline.
#[must_use]
pub fn sprintln(args: &[&Json]) -> String {
    let mut out = args.iter().map(|arg| plain(arg)).collect::<Vec<_>>().join(" ");
    out.push('\n');
    out
}

/// A minimal `printf`: verbs `%s %v %d %q %t %f %x` and `%%`, without
/// flags or widths.
///
/// A verb with no operand left prints `%!v(MISSING)`, a verb that does not
/// fit its operand prints `%!v(operand)`, and unused operands are listed in
/// a trailing `%!(EXTRA ...)`.
#[must_use]
pub fn sprintf(format: &str, args: &[&Json]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => out.push_str("%!(NOVERB)"),
            Some('%') => out.push('%'),
            Some(verb) => match args.next() {
                Some(arg) => out.push_str(&format_verb(verb, arg)),
                None => {
                    let _ = write!(out, "%!{verb}(MISSING)");
                }
            },
        }
    }

    let extra: Vec<String> = args.map(|arg| plain(arg)).collect();
    if !extra.is_empty() {
        let _ = write!(out, "%!(EXTRA {})", extra.join(", "));
    }
    out
}

fn format_verb(verb: char, arg: &Json) -> String {
    let formatted = match (verb, arg) {
        ('s' | 'v', _) => Some(plain(arg)),
        ('q', Json::String(_)) => Some(arg.to_string()),
        ('t', Json::Bool(b)) => Some(b.to_string()),
        ('d', Json::Number(n)) => n
            .as_i64()
            .map(|v| v.to_string())
            .or_else(|| n.as_u64().map(|v| v.to_string())),
        ('x', Json::Number(n)) => n.as_u64().map(|v| format!("{v:x}")),
        ('x', Json::String(s)) => Some(s.bytes().map(|b| format!("{b:02x}")).collect()),
        ('f', Json::Number(n)) => n.as_f64().map(|v| format!("{v:.6}")),
        _ => None,
    };
    formatted.unwrap_or_else(|| format!("%!{verb}({})", plain(arg)))
}

/// Form encoding for a URL query component: spaces become `+`.
#[must_use]
pub fn query_escape(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

static NULL: Json = Json::Null;

/// Looks up each key in turn: array positions by number, object fields by
/// name. A missing object field is null.
///
/// # Errors
///
/// Returns a message for an out-of-range position, a key of the wrong
/// type, or indexing into a scalar.
pub fn index_value<'a>(collection: &'a Json, keys: &[&Json]) -> Result<&'a Json, String> {
    let mut item = collection;
    for key in keys {
        item = match (item, key) {
            (Json::Array(items), Json::Number(n)) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| items.get(i))
                .ok_or_else(|| format!("index out of range: {n}"))?,
            (Json::Object(fields), Json::String(name)) => fields.get(name).unwrap_or(&NULL),
            (Json::Null, _) => return Err("index of nil".to_string()),
            (Json::Array(_) | Json::Object(_), _) => {
                return Err(format!("cannot index with {key}"));
            }
            _ => return Err(format!("cannot index into {item}")),
        };
    }
    Ok(item)
}

/// Operand text as `print` writes it: strings bare, null as `<nil>`,
/// anything else as JSON.
fn plain(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => "<nil>".to_string(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Three-way job status as seen by `statusCode` and `colorHex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
    Skipped,
}

impl Outcome {
    fn of(data: &Json) -> Self {
        let flag = |key: &str| data.get(key).and_then(Json::as_bool).unwrap_or(false);
        if flag("Skipped") {
            Self::Skipped
        } else if flag("Failed") {
            Self::Failure
        } else {
            Self::Success
        }
    }

    const fn code(self) -> u64 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Skipped => 2,
        }
    }

    const fn color(self) -> &'static str {
        match self {
            Self::Success => "#00FF00",
            Self::Failure => "#FF0000",
            Self::Skipped => "#FFA500",
        }
    }
}
