use super::{Pass, TranslateWarning, TranslationMetadata};
use crate::config::{TranslationTable, is_identifier};
use crate::error::{ErrorKind, TranslateError};
use crate::generate::render_dispatcher;
use crate::scanner::{
    CallMarker, OffsetMap, Rewriter, call_block, extra_argument, find_call, invocation_end, skip_string,
};
use crate::transform::metadata::{AttributeListener, ListenerRegistry};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref ATTRIBUTE_LITERAL: Regex =
        Regex::new(r#""\s*([A-Za-z0-9_-]+)\s*"|'\s*([A-Za-z0-9_-]+)\s*'|`\s*([A-Za-z0-9_-]+)\s*`"#).unwrap();
    static ref PARAM_LIST: Regex = Regex::new(r"\(([^()]*)\)").unwrap();
    static ref ARROW_PARAM: Regex = Regex::new(r"([A-Za-z_$][A-Za-z0-9_$]*)\s*=>").unwrap();
}

/// Lifts `addChangeListener(...)` calls out of the script and appends the generated
/// `attributeChangedCallback` dispatcher and `observedAttributes` accessor
pub struct ChangeListenerPass;

impl Pass for ChangeListenerPass {
    fn name(&self) -> &'static str {
        "change-listeners"
    }

    fn run(
        &self,
        script: &str,
        table: &TranslationTable,
        metadata: &mut TranslationMetadata,
    ) -> Result<(String, OffsetMap), TranslateError> {
        let ListenerExtraction {
            script: mut output,
            mut map,
            listeners,
        } = extract_listeners(script, table)?;

        if !listeners.is_empty() {
            let dispatcher = render_dispatcher(&listeners, table);
            map.push_generated(output.len(), script.len(), dispatcher.len());
            output.push_str(&dispatcher);
        }
        metadata.warnings.extend(
            listeners
                .duplicate_attributes()
                .into_iter()
                .map(|attribute| TranslateWarning::DuplicateAttribute { attribute }),
        );
        metadata.listeners = listeners;

        Ok((output, map))
    }
}

/// Outcome of listener extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerExtraction {
    /// Script with every listener invocation removed
    pub script: String,
    /// Map from `script` back to the extractor's input
    pub map: OffsetMap,
    pub listeners: ListenerRegistry,
}

/// Remove every listener invocation from `script`, collecting them in discovery order.
///
/// The script is consumed left to right exactly once: text between invocations is
/// copied to the output and each invocation (with its closing `)` and `;`) is dropped.
pub fn extract_listeners(script: &str, table: &TranslationTable) -> Result<ListenerExtraction, TranslateError> {
    let mut rewriter = Rewriter::new(script);
    let mut registry = ListenerRegistry::new();
    let mut cursor = 0;

    while let Some(call) = find_call(script, cursor, &table.listener_token, cursor > 0) {
        let (listener, end) = parse_listener(script, call, table)?;
        debug!(
            attribute = %listener.attribute,
            old = ?listener.old_value_param,
            new = ?listener.new_value_param,
            "extracted change listener"
        );

        rewriter.copy(cursor..call.start);
        registry.push(listener);
        cursor = end;
    }

    rewriter.copy(cursor..script.len());
    let (output, map) = rewriter.finish();
    Ok(ListenerExtraction {
        script: output,
        map,
        listeners: registry,
    })
}

/// Parse one invocation, returning the listener and the offset where the invocation ends
fn parse_listener(
    script: &str,
    call: CallMarker,
    table: &TranslationTable,
) -> Result<(AttributeListener, usize), TranslateError> {
    let token = &table.listener_token;
    let Some(block) = call_block(script, call)? else {
        return Err(TranslateError::new(
            ErrorKind::MalformedListener,
            format!("`{}` has no inline handler block", token),
        )
        .at(script, call.start)
        .with_help(format!("Write the handler inline: {}(\"attr\", (oldValue, newValue) => {{ ... }})", token)));
    };

    if let Some(extra) = extra_argument(script, block.end) {
        return Err(TranslateError::new(
            ErrorKind::MalformedListener,
            format!("`{}` takes no arguments after its handler block", token),
        )
        .at(script, extra)
        .with_help("Remove the trailing arguments; the handler block must be the last argument"));
    }

    let args_start = call.paren + 1;
    let head = &script[args_start..block.open];
    let Some(literal) = ATTRIBUTE_LITERAL.captures(head) else {
        return Err(TranslateError::new(
            ErrorKind::MalformedListener,
            format!("`{}` is missing a quoted attribute name", token),
        )
        .at(script, args_start)
        .with_help("Attribute names may contain letters, digits, `_` and `-`"));
    };
    let attribute = (1..=3)
        .find_map(|i| literal.get(i))
        .map_or_else(String::new, |m| m.as_str().to_string());
    let params_start = literal.get(0).map_or(0, |m| m.end());

    let Some(params) = parse_params(&head[params_start..]) else {
        return Err(TranslateError::new(
            ErrorKind::MalformedListener,
            format!("Cannot read the handler parameters of the \"{}\" listener", attribute),
        )
        .at(script, args_start + params_start)
        .with_help("Use plain identifiers: (oldValue, newValue) => { ... } or value => { ... }"));
    };

    // A lone parameter receives the new value
    let (old_value_param, new_value_param) = match params.as_slice() {
        [] => (None, None),
        [only] => (None, Some(only.clone())),
        [old, new, ..] => (Some(old.clone()), Some(new.clone())),
    };

    let mut renames = Vec::new();
    if let Some(param) = &old_value_param {
        renames.push((param.as_str(), table.old_value_name.as_str()));
    }
    if let Some(param) = &new_value_param {
        renames.push((param.as_str(), table.new_value_name.as_str()));
    }
    renames.retain(|(from, to)| from != to);

    let body = rename_identifiers(block.body(script).trim(), &renames);
    let listener = AttributeListener {
        attribute,
        body,
        old_value_param,
        new_value_param,
    };

    Ok((listener, invocation_end(script, block.end)))
}

/// Parameter names between the attribute literal and the handler block.
///
/// Accepts `(a, b)`, `function name(a, b)`, `a =>` and an empty list. Returns `None`
/// when a parenthesised list holds anything but identifiers.
fn parse_params(text: &str) -> Option<Vec<String>> {
    if let Some(caps) = PARAM_LIST.captures(text) {
        return caps[1]
            .split(',')
            .map(str::trim)
            .filter(|param| !param.is_empty())
            .map(|param| is_identifier(param).then(|| param.to_string()))
            .collect();
    }
    if let Some(caps) = ARROW_PARAM.captures(text) {
        return Some(vec![caps[1].to_string()]);
    }
    Some(Vec::new())
}

#[derive(Debug, Clone, Copy)]
enum Context {
    Code { depth: usize },
    Template,
}

/// Rename whole identifiers in `body`, all pairs in a single pass.
///
/// Text inside quotes and template literal text is left alone, while `${...}`
/// substitutions are renamed. Property names after `.` and object keys (`{ name: ... }`)
/// are not variables and keep their spelling; spread (`...name`) is renamed. Shorthand
/// properties (`{ name }`) are renamed like any other reference, which renames the key.
pub fn rename_identifiers(body: &str, renames: &[(&str, &str)]) -> String {
    if renames.is_empty() {
        return body.to_string();
    }

    let bytes = body.as_bytes();
    let mut output = String::with_capacity(body.len());
    let mut stack = vec![Context::Code { depth: 0 }];
    let mut kept = 0;
    let mut i = 0;

    while i < bytes.len() {
        let top = stack.len() - 1;
        let b = bytes[i];

        match stack[top] {
            Context::Template => match b {
                b'\\' => i += 2,
                b'`' => {
                    stack.pop();
                    i += 1;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    stack.push(Context::Code { depth: 0 });
                    i += 2;
                }
                _ => i += 1,
            },
            Context::Code { depth } => match b {
                b'"' | b'\'' => i = skip_string(bytes, i),
                b'`' => {
                    stack.push(Context::Template);
                    i += 1;
                }
                b'{' => {
                    stack[top] = Context::Code { depth: depth + 1 };
                    i += 1;
                }
                b'}' => {
                    if depth == 0 && top > 0 {
                        stack.pop();
                    } else {
                        stack[top] = Context::Code { depth: depth.saturating_sub(1) };
                    }
                    i += 1;
                }
                b'0'..=b'9' => {
                    i += bytes[i..]
                        .iter()
                        .take_while(|c| is_ident_byte(**c) || **c == b'.')
                        .count();
                }
                _ if is_ident_byte(b) => {
                    let end = i + bytes[i..].iter().take_while(|c| is_ident_byte(**c)).count();
                    let word = &body[i..end];
                    let is_property = i > 0 && bytes[i - 1] == b'.' && !(i >= 3 && &bytes[i - 3..i] == b"...");

                    if !is_property && !is_object_key(body, i, end) {
                        if let Some((_, to)) = renames.iter().find(|(from, _)| *from == word) {
                            output.push_str(&body[kept..i]);
                            output.push_str(to);
                            kept = end;
                        }
                    }
                    i = end;
                }
                _ => i += 1,
            },
        }
    }

    output.push_str(&body[kept..]);
    output
}

/// `name` in `{ name: ...` or `, name: ...`. A ternary branch (`? name :`) or a
/// `case name:` label is a reference.
fn is_object_key(body: &str, start: usize, end: usize) -> bool {
    body[end..].trim_start().starts_with(':')
        && matches!(body[..start].trim_end().as_bytes().last().copied(), Some(b'{' | b','))
}

// Non-ASCII bytes count as identifier bytes so multi-byte characters are never split
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(script: &str) -> (String, ListenerRegistry) {
        let extraction = extract_listeners(script, &TranslationTable::default()).unwrap();
        (extraction.script, extraction.listeners)
    }

    fn first(registry: &ListenerRegistry) -> &AttributeListener {
        registry.iter().next().unwrap()
    }

    #[test]
    fn test_two_params() {
        let (rest, registry) = extract(r#"addChangeListener("x", (o,n) => { doThing(o,n); })"#);
        assert_eq!(rest, "");
        let listener = first(&registry);
        assert_eq!(listener.attribute, "x");
        assert_eq!(listener.body, "doThing(oldValue,newValue);");
        assert_eq!(listener.old_value_param.as_deref(), Some("o"));
        assert_eq!(listener.new_value_param.as_deref(), Some("n"));
    }

    #[test]
    fn test_single_bare_param_is_new_value() {
        let (_, registry) = extract(r#"addChangeListener("color", c => {apply(c);})"#);
        let listener = first(&registry);
        assert_eq!(listener.body, "apply(newValue);");
        assert_eq!(listener.old_value_param, None);
    }

    #[test]
    fn test_no_params() {
        let (_, registry) = extract("addChangeListener('size', () => { resize(); });");
        assert_eq!(first(&registry).body, "resize();");
        assert_eq!(first(&registry).new_value_param, None);
    }

    #[test]
    fn test_function_expression() {
        let (_, registry) = extract("addChangeListener(`mode`, function (prev, next) { log(prev, next); })");
        let listener = first(&registry);
        assert_eq!(listener.attribute, "mode");
        assert_eq!(listener.body, "log(oldValue, newValue);");
    }

    #[test]
    fn test_attribute_is_trimmed() {
        let (_, registry) = extract(r#"addChangeListener(" data-id ", v => { x(v); })"#);
        assert_eq!(first(&registry).attribute, "data-id");
    }

    #[test]
    fn test_invocation_removed_with_trailing_tokens() {
        let script = "a();\naddChangeListener(\"x\", v => { f(v); }) ;\nb();";
        let (rest, _) = extract(script);
        assert_eq!(rest, "a();\n\nb();");
    }

    #[test]
    fn test_multiple_in_order() {
        let script = "addChangeListener(\"a\", v => {A(v)}) addChangeListener(\"b\", v => {B(v)})";
        let (rest, registry) = extract(script);
        assert_eq!(rest, " ");
        assert_eq!(registry.observed_attributes(), vec!["a", "b"]);
    }

    #[test]
    fn test_adjacent_after_removal() {
        let script = "addChangeListener(\"a\", v => {A(v)})addChangeListener(\"b\", v => {B(v)})";
        let (rest, registry) = extract(script);
        assert_eq!(rest, "");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicates_kept() {
        let script = "addChangeListener(\"c\", v => {one(v)})\naddChangeListener(\"c\", v => {two(v)})";
        let (_, registry) = extract(script);
        assert_eq!(registry.observed_attributes(), vec!["c", "c"]);
        assert_eq!(registry.duplicate_attributes(), vec!["c"]);
    }

    #[test]
    fn test_nested_braces_in_body() {
        let script = r#"addChangeListener("x", (o, n) => { if (n) { set("}", n); } })"#;
        let (rest, registry) = extract(script);
        assert_eq!(rest, "");
        assert_eq!(first(&registry).body, r#"if (newValue) { set("}", newValue); }"#);
    }

    #[test]
    fn test_glued_token_untouched() {
        let (rest, registry) = extract("this.addChangeListener(\"x\", v => {})");
        assert!(registry.is_empty());
        assert_eq!(rest, "this.addChangeListener(\"x\", v => {})");
    }

    #[test]
    fn test_missing_attribute_is_error() {
        let err = extract_listeners("addChangeListener(name, v => { f(v); })", &TranslationTable::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedListener);
        assert!(err.message.contains("quoted attribute name"));
    }

    #[test]
    fn test_missing_block_is_error() {
        let err = extract_listeners("addChangeListener(\"x\", handler);\nfoo() { bar(); }", &TranslationTable::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedListener);
        assert_eq!(err.position.map(|p| p.line), Some(0));
    }

    #[test]
    fn test_bad_params_is_error() {
        let err = extract_listeners("addChangeListener(\"x\", (a, b = 1) => { f(a); })", &TranslationTable::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedListener);
    }

    #[test]
    fn test_unbalanced_body_is_block_error() {
        let err = extract_listeners("addChangeListener(\"x\", v => { f(v);", &TranslationTable::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedBlock);
    }

    #[test]
    fn test_arguments_after_handler_is_error() {
        let script = "addChangeListener(\"a\", n => { send(n); }, { once: true })\nm() {}";
        let err = extract_listeners(script, &TranslationTable::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedListener);
        assert_eq!(err.position.map(|p| p.col), Some(script.find("{ once").unwrap()));
    }

    #[test]
    fn test_trailing_comma_after_handler() {
        let (rest, registry) = extract("addChangeListener(\"a\", v => { f(v); },\n);\nm() {}");
        assert_eq!(rest, "\nm() {}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_map_skips_removed_listener() {
        let script = "addChangeListener(\"a\", v => {})\nm() {}";
        let extraction = extract_listeners(script, &TranslationTable::default()).unwrap();
        assert_eq!(extraction.script, "\nm() {}");
        assert_eq!(extraction.map.to_input(1), script.find("m()").unwrap());
    }

    #[test]
    fn test_rename_keeps_object_keys() {
        let renamed = rename_identifiers("send({ n: n, m: 1, k: c ? n : 0 }); switch (x) { case n: break; }", &[("n", "v")]);
        assert_eq!(renamed, "send({ n: v, m: 1, k: c ? v : 0 }); switch (x) { case v: break; }");
    }

    #[test]
    fn test_rename_shorthand_property() {
        assert_eq!(rename_identifiers("send({ n })", &[("n", "v")]), "send({ v })");
    }

    #[test]
    fn test_rename_whole_identifiers_only() {
        let renamed = rename_identifiers("n + nn + n1 + _n + $n + n", &[("n", "newValue")]);
        assert_eq!(renamed, "newValue + nn + n1 + _n + $n + newValue");
    }

    #[test]
    fn test_rename_is_simultaneous() {
        let renamed = rename_identifiers("f(newValue, oldValue)", &[("newValue", "oldValue"), ("oldValue", "newValue")]);
        assert_eq!(renamed, "f(oldValue, newValue)");
    }

    #[test]
    fn test_rename_skips_strings_and_properties() {
        let renamed = rename_identifiers(r#"el.n = n; log("n", 'n'); x = {...n}"#, &[("n", "v")]);
        assert_eq!(renamed, r#"el.n = v; log("n", 'n'); x = {...v}"#);
    }

    #[test]
    fn test_rename_template_substitutions() {
        let renamed = rename_identifiers("t = `n is ${n + `${n}`} {n}`; 1e5", &[("n", "v"), ("e5", "x")]);
        assert_eq!(renamed, "t = `n is ${v + `${v}`} {n}`; 1e5");
    }
}
