use crate::config::TranslationTable;
use crate::transform::ListenerRegistry;

const INDENT: &str = "    ";

/// Render the `attributeChangedCallback` dispatcher and the `observedAttributes`
/// accessor for the collected listeners.
///
/// Each listener becomes one `case` in discovery order. A repeated attribute name gets
/// a second case that the `switch` never reaches.
pub fn render_dispatcher(registry: &ListenerRegistry, table: &TranslationTable) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "attributeChangedCallback(attr, {}, {}) {{\n",
        table.old_value_name, table.new_value_name
    ));
    out.push_str(&format!("{}switch(attr) {{\n", INDENT));

    for listener in registry.iter() {
        out.push_str(&format!("{}case \"{}\":\n", INDENT.repeat(2), listener.attribute));
        if !listener.body.is_empty() {
            out.push_str(&format!("{}{}\n", INDENT.repeat(3), listener.body));
        }
        out.push_str(&format!("{}break;\n", INDENT.repeat(3)));
    }

    out.push_str(&format!("{}}}\n", INDENT));
    out.push_str("}\n");
    out.push_str(&render_observed_attributes(registry));
    out
}

/// `static get observedAttributes() { return [...]; }` for the collected listeners
fn render_observed_attributes(registry: &ListenerRegistry) -> String {
    let names: Vec<String> = registry
        .observed_attributes()
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect();
    format!("static get observedAttributes() {{ return [{}]; }}\n", names.join(", "))
}
