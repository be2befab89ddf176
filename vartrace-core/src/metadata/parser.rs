//! `.meta` file parser

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{Intent, MetadataSection, MetadataTable, VariableRecord};

static BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*([^\[\]]*?)\s*\]$").expect("block header pattern"));

static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)$").expect("property pattern")
});

static STANDARD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("standard name pattern"));

const TABLE_PROPERTIES: &str = "ccpp-table-properties";
const ARG_TABLE: &str = "ccpp-arg-table";

/// Parse failure with the 1-based line it occurred on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Which block the following properties belong to
enum Block {
    None,
    Table,
    Section,
    Variable,
}

/// Property bags collected before validation
struct PendingVariable {
    line: usize,
    local_name: String,
    props: BTreeMap<String, String>,
}

struct PendingSection {
    line: usize,
    props: BTreeMap<String, String>,
    variables: Vec<PendingVariable>,
}

struct PendingTable {
    line: usize,
    props: BTreeMap<String, String>,
    sections: Vec<PendingSection>,
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Parse the contents of a `.meta` file into its tables
pub fn parse_metadata(content: &str) -> ParseResult<Vec<MetadataTable>> {
    let mut tables: Vec<PendingTable> = vec![];
    let mut block = Block::None;

    for (idx, raw) in strip_bom(content).lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(caps) = BLOCK_HEADER.captures(line) {
            let header = &caps[1];
            match header {
                TABLE_PROPERTIES => {
                    tables.push(PendingTable {
                        line: line_no,
                        props: BTreeMap::new(),
                        sections: vec![],
                    });
                    block = Block::Table;
                }
                ARG_TABLE => {
                    let table = tables.last_mut().ok_or_else(|| {
                        ParseError::new(line_no, "[ccpp-arg-table] before any [ccpp-table-properties]")
                    })?;
                    table.sections.push(PendingSection {
                        line: line_no,
                        props: BTreeMap::new(),
                        variables: vec![],
                    });
                    block = Block::Section;
                }
                local_name if local_name.starts_with("ccpp-") => {
                    return Err(ParseError::new(
                        line_no,
                        format!("unknown block [{}]", local_name),
                    ));
                }
                local_name => {
                    if local_name.is_empty() || local_name.contains(char::is_whitespace) {
                        return Err(ParseError::new(
                            line_no,
                            format!("invalid variable name '[{}]'", local_name),
                        ));
                    }
                    let section = tables
                        .last_mut()
                        .and_then(|t| t.sections.last_mut())
                        .ok_or_else(|| {
                            ParseError::new(
                                line_no,
                                format!("variable '{}' outside of a [ccpp-arg-table]", local_name),
                            )
                        })?;
                    section.variables.push(PendingVariable {
                        line: line_no,
                        local_name: local_name.to_string(),
                        props: BTreeMap::new(),
                    });
                    block = Block::Variable;
                }
            }
            continue;
        }

        let props = match block {
            Block::None => {
                return Err(ParseError::new(
                    line_no,
                    format!("'{}' outside of any block", line),
                ))
            }
            Block::Table => tables.last_mut().map(|t| &mut t.props),
            Block::Section => tables
                .last_mut()
                .and_then(|t| t.sections.last_mut())
                .map(|s| &mut s.props),
            Block::Variable => tables
                .last_mut()
                .and_then(|t| t.sections.last_mut())
                .and_then(|s| s.variables.last_mut())
                .map(|v| &mut v.props),
        }
        .ok_or_else(|| ParseError::new(line_no, "property without an enclosing block"))?;

        for item in line.split('|') {
            let item = item.trim();
            let caps = PROPERTY
                .captures(item)
                .ok_or_else(|| ParseError::new(line_no, format!("malformed line '{}'", item)))?;
            let key = caps[1].to_ascii_lowercase();
            if props.insert(key.clone(), caps[2].trim().to_string()).is_some() {
                return Err(ParseError::new(line_no, format!("duplicate property '{}'", key)));
            }
        }
    }

    tables.into_iter().map(finish_table).collect()
}

fn finish_table(table: PendingTable) -> ParseResult<MetadataTable> {
    let mut props = table.props;
    let name = take_required(&mut props, "name", table.line, "[ccpp-table-properties]")?;
    let table_type = take_required(&mut props, "type", table.line, "[ccpp-table-properties]")?;
    let dependencies = props
        .remove("dependencies")
        .map(|deps| split_list(&deps))
        .unwrap_or_default();

    let sections = table
        .sections
        .into_iter()
        .map(|section| finish_section(section, &table_type))
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(MetadataTable {
        name,
        table_type,
        dependencies,
        sections,
    })
}

fn finish_section(section: PendingSection, table_type: &str) -> ParseResult<MetadataSection> {
    let mut props = section.props;
    let title = take_required(&mut props, "name", section.line, "[ccpp-arg-table]")?;
    let section_type = props
        .remove("type")
        .unwrap_or_else(|| table_type.to_string());
    let is_scheme = section_type == "scheme";

    let mut variables: Vec<VariableRecord> = Vec::with_capacity(section.variables.len());
    for pending in section.variables {
        if variables.iter().any(|v| v.local_name == pending.local_name) {
            return Err(ParseError::new(
                pending.line,
                format!("duplicate variable '{}' in section '{}'", pending.local_name, title),
            ));
        }
        variables.push(finish_variable(pending, is_scheme)?);
    }

    Ok(MetadataSection {
        title,
        section_type,
        variables,
    })
}

fn finish_variable(pending: PendingVariable, is_scheme: bool) -> ParseResult<VariableRecord> {
    let line = pending.line;
    let mut props = pending.props;
    let context = format!("variable '{}'", pending.local_name);

    let standard_name = take_required(&mut props, "standard_name", line, &context)?;
    if !STANDARD_NAME.is_match(&standard_name) {
        return Err(ParseError::new(
            line,
            format!("invalid standard_name '{}' for {}", standard_name, context),
        ));
    }

    let intent = match props.remove("intent") {
        Some(value) => Some(
            value
                .parse::<Intent>()
                .map_err(|reason| ParseError::new(line, format!("{} for {}", reason, context)))?,
        ),
        None if is_scheme => {
            return Err(ParseError::new(
                line,
                format!("{} in a scheme section has no intent", context),
            ))
        }
        None => None,
    };

    let optional = match props.remove("optional") {
        Some(value) => parse_bool(&value)
            .ok_or_else(|| ParseError::new(line, format!("invalid optional '{}' for {}", value, context)))?,
        None => false,
    };

    Ok(VariableRecord {
        local_name: pending.local_name,
        standard_name,
        long_name: props.remove("long_name"),
        units: props.remove("units"),
        dimensions: props
            .remove("dimensions")
            .map(|dims| split_list(&dims))
            .unwrap_or_default(),
        var_type: props.remove("type"),
        kind: props.remove("kind"),
        intent,
        optional,
        extra: props,
    })
}

fn take_required(
    props: &mut BTreeMap<String, String>,
    key: &str,
    line: usize,
    context: &str,
) -> ParseResult<String> {
    match props.remove(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ParseError::new(line, format!("{} is missing '{}'", context, key))),
    }
}

/// `(a, b)` / `a, b` / `()` into an ordered list
fn split_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | ".true." => Some(true),
        "false" | "f" | ".false." => Some(false),
        _ => None,
    }
}

/// Names of the `type = scheme` tables declared in a `.meta` file
///
/// Only looks at `[ccpp-table-properties]` blocks and does not validate the
/// rest of the file.
pub fn find_scheme_names(content: &str) -> Vec<String> {
    let mut schemes = vec![];
    let mut in_table = false;
    let mut name: Option<String> = None;
    let mut is_scheme = false;

    let mut flush = |name: &mut Option<String>, is_scheme: &mut bool| {
        if let Some(n) = name.take() {
            if *is_scheme {
                schemes.push(n);
            }
        }
        *is_scheme = false;
    };

    for raw in strip_bom(content).lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(caps) = BLOCK_HEADER.captures(line) {
            if in_table {
                flush(&mut name, &mut is_scheme);
            }
            in_table = &caps[1] == TABLE_PROPERTIES;
            continue;
        }
        if !in_table {
            continue;
        }
        for item in line.split('|') {
            if let Some(caps) = PROPERTY.captures(item.trim()) {
                match caps[1].to_ascii_lowercase().as_str() {
                    "name" => name = Some(caps[2].trim().to_string()),
                    "type" => is_scheme = caps[2].trim() == "scheme",
                    _ => {}
                }
            }
        }
    }
    if in_table {
        flush(&mut name, &mut is_scheme);
    }

    schemes
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"
########################################################################
[ccpp-table-properties]
  name = scheme_a
  type = scheme
  dependencies = machine.F, physcons.F90

########################################################################
[ccpp-arg-table]
  name = scheme_a_init
  type = scheme
[ errmsg ]
  standard_name = ccpp_error_message
  long_name = error message for error handling in CCPP
  units = none
  dimensions = ()
  type = character | kind = len=*
  intent = out

########################################################################
[ccpp-arg-table]
  name = scheme_a_run
  type = scheme
[ im ]
  standard_name = horizontal_loop_extent
  units = count
  dimensions = ()
  type = integer
  intent = in
[ ps ]
  standard_name = surface_pressure
  long_name = surface pressure
  units = Pa
  dimensions = (horizontal_loop_extent)
  type = real
  kind = kind_phys
  intent = inout
  optional = False
  active = (flag_for_surface)
"#;

    #[test]
    fn test_parse_tables_and_sections() {
        let tables = parse_metadata(META).unwrap();
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.name, "scheme_a");
        assert!(table.is_scheme());
        assert_eq!(table.dependencies, vec!["machine.F", "physcons.F90"]);

        let titles: Vec<&str> = table.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["scheme_a_init", "scheme_a_run"]);
    }

    #[test]
    fn test_parse_variable_properties() {
        let tables = parse_metadata(META).unwrap();
        let run = &tables[0].sections()[1];
        let names: Vec<&str> = run
            .variable_list()
            .iter()
            .map(|v| v.standard_name.as_str())
            .collect();
        assert_eq!(names, vec!["horizontal_loop_extent", "surface_pressure"]);

        let ps = &run.variable_list()[1];
        assert_eq!(ps.local_name, "ps");
        assert_eq!(ps.units.as_deref(), Some("Pa"));
        assert_eq!(ps.dimensions, vec!["horizontal_loop_extent"]);
        assert_eq!(ps.var_type.as_deref(), Some("real"));
        assert_eq!(ps.kind.as_deref(), Some("kind_phys"));
        assert_eq!(ps.intent, Some(Intent::InOut));
        assert!(!ps.optional);
        assert_eq!(ps.extra.get("active").map(String::as_str), Some("(flag_for_surface)"));

        let errmsg = &tables[0].sections()[0].variable_list()[0];
        assert_eq!(errmsg.kind.as_deref(), Some("len=*"));
        assert!(errmsg.dimensions.is_empty());
    }

    #[test]
    fn test_host_tables_do_not_need_intent() {
        let meta = r#"
[ccpp-table-properties]
  name = host_data
  type = module
[ccpp-arg-table]
  name = host_data
  type = module
[ ps ]
  standard_name = surface_pressure
  units = Pa
"#;
        let tables = parse_metadata(meta).unwrap();
        assert_eq!(tables[0].sections()[0].variable_list()[0].intent, None);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let cases: [(&str, usize); 7] = [
            ("  name = orphan\n", 1),
            ("[ccpp-arg-table]\n  name = x\n", 1),
            ("[ccpp-table-properties]\n  name = s\n  type = scheme\n[ im ]\n", 4),
            (
                "[ccpp-table-properties]\n  name = s\n  type = scheme\n[ccpp-arg-table]\n  name = s_run\n[ im ]\n  units = count\n  intent = in\n",
                6,
            ),
            (
                "[ccpp-table-properties]\n  name = s\n  type = scheme\n[ccpp-arg-table]\n  name = s_run\n[ im ]\n  standard_name = loop_extent\n",
                6,
            ),
            (
                "[ccpp-table-properties]\n  name = s\n  type = scheme\n[ccpp-arg-table]\n  name = s_run\n[ im ]\n  standard_name = x\n  intent = sideways\n",
                6,
            ),
            ("[ccpp-table-properties]\n  name = s\n  this is not a property\n", 3),
        ];

        for (meta, line) in cases {
            let err = parse_metadata(meta).unwrap_err();
            assert_eq!(err.line, line, "unexpected line for {:?}: {}", meta, err.reason);
        }
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let meta = r#"
[ccpp-table-properties]
  name = s
  type = scheme
[ccpp-arg-table]
  name = s_run
  type = scheme
[ im ]
  standard_name = horizontal_loop_extent
  intent = in
[ im ]
  standard_name = horizontal_dimension
  intent = in
"#;
        let err = parse_metadata(meta).unwrap_err();
        assert!(err.reason.contains("duplicate variable 'im'"));
    }

    #[test]
    fn test_find_scheme_names() {
        let meta = r#"
[ccpp-table-properties]
  name = scheme_a
  type = scheme
[ccpp-arg-table]
  name = scheme_a_run
  type = scheme
[ccpp-table-properties]
  name = scheme_a_ddt
  type = ddt
[ccpp-table-properties]
  type = scheme | name = scheme_b
"#;
        assert_eq!(find_scheme_names(meta), vec!["scheme_a", "scheme_b"]);
        assert!(find_scheme_names("# nothing here\n").is_empty());
    }

    #[test]
    fn test_leading_byte_order_mark_is_ignored() {
        let meta = "\u{feff}[ccpp-table-properties]\n  name = scheme_a\n  type = scheme\n[ccpp-arg-table]\n  name = scheme_a_run\n  type = scheme\n";
        let tables = parse_metadata(meta).unwrap();
        assert_eq!(tables[0].name, "scheme_a");
        assert_eq!(find_scheme_names(meta), vec!["scheme_a"]);
    }
}
