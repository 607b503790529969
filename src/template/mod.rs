//! Template rendering for webhook URLs, headers, and bodies.
//!
//! Templates use `{{.Field}}` actions over an execution snapshot, with
//! conditionals, pipelines, and a fixed set of helpers:
//!
//! | Helper | Result |
//! |--------|--------|
//! | `upper s`, `lower s`, `trim s` | case / whitespace |
//! | `truncate n s` | at most `n` characters, cut text ends in `...` |
//! | `json v` | `v` as JSON text |
//! | `jsonEscape s` | `s` escaped for a JSON string, no quotes |
//! | `formatTime layout t` | timestamp in a reference-time layout (`2006-01-02 15:04`) |
//! | `unixTime t` | epoch seconds |
//! | `default fallback v` | `fallback` when `v` is empty |
//! | `statusCode .` | 0 success, 1 failure, 2 skipped |
//! | `colorHex .` | green, red, orange for the same three states |
//! | `print a...`, `println a...` | operands as text |
//! | `printf format a...` | `%s %v %d %q %t %f %x` formatting |
//! | `urlquery a...` | operands form-encoded for a URL query |
//! | `index c k...` | array element or object field |
//!
//! Comparison and logic: `eq ne lt le gt ge and or not len`.

mod error;
mod helpers;
mod render;
mod syntax;


pub use error::{SyntaxError, TemplateError};
pub use helpers::{escape_json, format_timestamp, truncate_text, unix_seconds};
pub use render::Renderer;
pub use syntax::translate;
