//! Caption template expansion
//!
//! A template is literal text interleaved with `&`-directives:
//!
//! | directive | expands to            |
//! |-----------|-----------------------|
//! | `&y`      | year, 4 digits        |
//! | `&M`      | month, 2 digits       |
//! | `&d`      | day, 2 digits         |
//! | `&h`      | hour, 2 digits        |
//! | `&m`      | minute, 2 digits      |
//! | `&s`      | second, 2 digits      |
//! | `&f`      | millisecond, 3 digits |
//! | `&&`      | a literal `&`         |
//!
//! Any other character after `&` is copied through together with the `&`.
//! A lone `&` at the end of the template is copied as-is.

use crate::TimeValue;
use std::fmt::Write;

/// Escape marker that introduces a directive
pub const ESCAPE: char = '&';

/// Template used when nothing else has been configured
pub const DEFAULT_TEMPLATE: &str = "&h:&m:&s.&f";

/// Expands `template` against the time snapshot `t`
pub fn format_caption(template: &str, t: &TimeValue) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch != ESCAPE {
            out.push(ch);
            continue;
        }

        let Some(directive) = chars.next() else {
            out.push(ESCAPE);
            break;
        };

        // Writing into a String cannot fail.
        let _ = match directive {
            '&' => {
                out.push(ESCAPE);
                Ok(())
            }
            'y' => write!(out, "{:04}", t.year),
            'M' => write!(out, "{:02}", t.month),
            'd' => write!(out, "{:02}", t.day),
            'h' => write!(out, "{:02}", t.hour),
            'm' => write!(out, "{:02}", t.minute),
            's' => write!(out, "{:02}", t.second),
            'f' => write!(out, "{:03}", t.millisecond),
            other => {
                out.push(ESCAPE);
                out.push(other);
                Ok(())
            }
        };
    }

    out
}
