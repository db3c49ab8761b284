//! Minimal property-list (XML plist) emission.
//!
//! Only the writing direction is needed, over the JSON value model already
//! used for structural documents. Output is stable: object keys are emitted
//! in sorted order by the underlying map.

use serde_json::Value;

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
<plist version=\"1.0\">\n";

/// Render a complete plist document for `value`.
pub fn to_plist_document(value: &Value) -> String {
    let mut out = String::from(HEADER);
    write_value(&mut out, value, "");
    out.push_str("</plist>\n");
    out
}

fn write_value(out: &mut String, value: &Value, indent: &str) {
    match value {
        Value::Null => {
            out.push_str(indent);
            out.push_str("<null/>\n");
        }
        Value::Bool(b) => {
            out.push_str(indent);
            out.push_str(if *b { "<true/>\n" } else { "<false/>\n" });
        }
        // Numbers truncate to integers; atlas geometry is integral and the
        // consumers of these descriptors expect <integer> nodes.
        Value::Number(n) => {
            let truncated = n.as_f64().map(|v| v as i64).unwrap_or(0);
            out.push_str(indent);
            out.push_str(&format!("<integer>{}</integer>\n", truncated));
        }
        Value::String(s) => {
            out.push_str(indent);
            out.push_str(&format!("<string>{}</string>\n", escape_xml(s)));
        }
        Value::Array(items) => {
            out.push_str(indent);
            out.push_str("<array>\n");
            let nested = format!("{}  ", indent);
            for item in items {
                write_value(out, item, &nested);
            }
            out.push_str(indent);
            out.push_str("</array>\n");
        }
        Value::Object(map) => {
            out.push_str(indent);
            out.push_str("<dict>\n");
            let nested = format!("{}  ", indent);
            for (key, item) in map {
                out.push_str(&format!("{}  <key>{}</key>\n", indent, escape_xml(key)));
                write_value(out, item, &nested);
            }
            out.push_str(indent);
            out.push_str("</dict>\n");
        }
    }
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
