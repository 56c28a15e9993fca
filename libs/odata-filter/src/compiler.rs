//! Filter tree to parameterized SQL.
//!
//! Every literal is bound as a named parameter (`<prefix>p<N>`); only the
//! keyword `NULL` is written into the SQL text. Parameter numbering starts
//! at 1 for every compilation.

use odata_csdl::EdmFamily;
use odata_geo::{STORAGE_SRID, transform_wkt};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::{debug, warn};

use crate::ast::{FilterNode, FunctionCall, LogicalOperator};
use crate::catalog::{FunctionCatalog, FunctionMapping, WildcardPosition};
use crate::error::{CompileError, FilterError};
use crate::literal::{
    SqlValue, is_literal, is_null, is_quoted, is_wkt_literal, literal_fits, parse_literal_value,
    unquote,
};
use crate::mapping::PropertyMap;
use crate::options::FilterOptions;
use crate::parser::{parse_filter, strip_filter_prefix};
use crate::validator::recovered_argument;

/// Meters in one degree at the equator; converts `distance(.., 'm')`
/// thresholds into degrees.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOperator {
    /// Map an operator keyword, ignoring case.
    ///
    /// # Errors
    /// [`CompileError::UnknownOperator`] for anything outside
    /// `eq ne gt ge lt le`.
    pub fn from_token(token: &str) -> Result<Self, CompileError> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "ge" => Ok(Self::Ge),
            "lt" => Ok(Self::Lt),
            "le" => Ok(Self::Le),
            _ => Err(CompileError::UnknownOperator(token.to_owned())),
        }
    }

    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

/// Bound parameters in the order they were created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters(Vec<(String, SqlValue)>);

impl Parameters {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Insert or overwrite `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: SqlValue) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<SqlValue> {
        let index = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(index).1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, SqlValue)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a (String, SqlValue);
    type IntoIter = std::slice::Iter<'a, (String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Compiled predicate. `sql` is `None` for an empty filter.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SqlResult {
    pub sql: Option<String>,
    pub parameters: Parameters,
}

impl SqlResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A rendered piece of SQL. Parameters and `NULL` stay recognisable so
/// comparisons can rewrite them.
enum Fragment {
    Null,
    Param(String),
    Sql(String),
}

impl Fragment {
    fn sql(&self) -> &str {
        match self {
            Fragment::Null => "NULL",
            Fragment::Param(s) | Fragment::Sql(s) => s,
        }
    }

    fn into_sql(self) -> String {
        match self {
            Fragment::Null => "NULL".to_owned(),
            Fragment::Param(s) | Fragment::Sql(s) => s,
        }
    }
}

pub struct SqlCompiler<'a> {
    properties: &'a PropertyMap,
    functions: &'a FunctionCatalog,
    options: FilterOptions,
}

impl<'a> SqlCompiler<'a> {
    #[must_use]
    pub fn new(properties: &'a PropertyMap, functions: &'a FunctionCatalog) -> Self {
        Self {
            properties,
            functions,
            options: FilterOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Compile a tree into SQL plus its bound parameters.
    ///
    /// The tree is not checked against a schema here; run
    /// [`crate::FilterValidator`] first for that.
    ///
    /// # Errors
    /// Unmapped properties, unknown functions or operators, argument count
    /// mismatches, `NULL` with an ordering operator, and IN-list entries that
    /// are not literals of the property's type.
    pub fn compile(&self, tree: &FilterNode) -> Result<SqlResult, CompileError> {
        let mut run = Compilation {
            compiler: self,
            parameters: Parameters::default(),
            counter: 0,
        };
        let sql = run.node(tree)?.into_sql();
        debug!(sql = %sql, parameters = run.parameters.len(), "filter compiled");
        Ok(SqlResult {
            sql: Some(sql),
            parameters: run.parameters,
        })
    }

    /// Parse and compile `filter` without schema validation. Blank input
    /// compiles to [`SqlResult::empty`].
    ///
    /// # Errors
    /// [`FilterError::Syntax`] or [`FilterError::Compile`].
    pub fn compile_str(&self, filter: &str) -> Result<SqlResult, FilterError> {
        let body = strip_filter_prefix(filter);
        if body.trim().is_empty() {
            return Ok(SqlResult::empty());
        }
        let tree = parse_filter(body)?;
        Ok(self.compile(&tree)?)
    }
}

/// State of one compile call.
struct Compilation<'c, 'a> {
    compiler: &'c SqlCompiler<'a>,
    parameters: Parameters,
    counter: usize,
}

impl Compilation<'_, '_> {
    fn bind(&mut self, value: SqlValue) -> Fragment {
        self.counter += 1;
        let name = format!("{}p{}", self.compiler.options.parameter_prefix, self.counter);
        self.parameters.insert(name.clone(), value);
        Fragment::Param(name)
    }

    fn node(&mut self, node: &FilterNode) -> Result<Fragment, CompileError> {
        match node {
            FilterNode::Primary(text) => self.primary(text),
            FilterNode::Function(call) => Ok(Fragment::Sql(self.call(call)?.sql)),
            FilterNode::Not(inner) => {
                let inner = self.node(inner)?;
                Ok(Fragment::Sql(format!("NOT ({})", inner.sql())))
            }
            FilterNode::Group(inner) => {
                let inner = self.node(inner)?;
                Ok(Fragment::Sql(format!("({})", inner.sql())))
            }
            FilterNode::Comparison { op, left, right } => self.comparison(op, left, right),
            FilterNode::Logical { op, left, right } => self.logical(*op, left, right),
            FilterNode::In { left, values } => self.in_list(left, values),
        }
    }

    fn primary(&mut self, text: &str) -> Result<Fragment, CompileError> {
        if is_null(text) {
            return Ok(Fragment::Null);
        }
        if is_literal(text) {
            return Ok(self.literal(text));
        }
        self.compiler
            .properties
            .get(text)
            .map(|m| Fragment::Sql(m.filter_sql().to_owned()))
            .ok_or_else(|| CompileError::UnknownProperty(text.to_owned()))
    }

    fn literal(&mut self, text: &str) -> Fragment {
        if is_quoted(text) && is_wkt_literal(text) {
            let wkt = unquote(text);
            let source = self.compiler.options.source_srid;
            let value = match transform_wkt(source, STORAGE_SRID, &wkt) {
                Ok(rewritten) => rewritten,
                Err(e) => {
                    warn!(error = %e, srid = source, "binding spatial literal untransformed");
                    wkt
                }
            };
            return self.bind(SqlValue::String(value));
        }
        self.bind(parse_literal_value(text))
    }

    fn call(&mut self, call: &FunctionCall) -> Result<CompiledCall, CompileError> {
        let compiler = self.compiler;
        let mapping = compiler
            .functions
            .get(&call.name)
            .ok_or_else(|| CompileError::UnknownFunction(call.name.clone()))?;

        let mut args = call
            .args
            .iter()
            .enumerate()
            .map(|(index, arg)| self.argument(mapping, index, arg))
            .collect::<Result<Vec<_>, _>>()?;

        if args.is_empty()
            && mapping.arity() == 1
            && let Some(inner) = recovered_argument(call).filter(|inner| is_quoted(inner))
        {
            let literal = self.argument_literal(mapping, 0, inner);
            args.push(literal);
        }

        if args.len() != mapping.arity() {
            return Err(CompileError::ArgumentCount {
                function: call.name.clone(),
                expected: mapping.arity(),
                actual: args.len(),
            });
        }

        if mapping.wildcard_position.is_some() && args.len() > 1 {
            args[1] = self.wildcard(mapping, std::mem::replace(&mut args[1], Fragment::Null));
        }

        let template = mapping
            .sql_template
            .replace("@srid", &STORAGE_SRID.to_string());
        let rendered = render_template(&template, &args);
        let sql = if mapping.returns_boolean() {
            format!("(({rendered}) = 1)")
        } else {
            rendered
        };
        Ok(CompiledCall {
            sql,
            is_distance: mapping.is_distance(),
            args,
        })
    }

    fn argument(
        &mut self,
        mapping: &FunctionMapping,
        index: usize,
        arg: &FilterNode,
    ) -> Result<Fragment, CompileError> {
        match arg {
            FilterNode::Primary(text) if is_quoted(text) => {
                Ok(self.argument_literal(mapping, index, text))
            }
            _ => self.node(arg),
        }
    }

    /// Quoted text in a string-typed slot is bound as written, without
    /// spatial reprojection.
    fn argument_literal(
        &mut self,
        mapping: &FunctionMapping,
        index: usize,
        text: &str,
    ) -> Fragment {
        if mapping.argument_family(index) == EdmFamily::String {
            return self.bind(parse_literal_value(text));
        }
        self.literal(text)
    }

    /// Apply the mapping's wildcard to a pattern argument. Bound values are
    /// rewritten in place; anything else is concatenated in SQL.
    fn wildcard(&mut self, mapping: &FunctionMapping, arg: Fragment) -> Fragment {
        if let Fragment::Param(name) = &arg
            && let Some(value) = self.parameters.get(name)
        {
            let pattern = mapping.apply_wildcard(&value.to_string());
            self.parameters.insert(name.clone(), SqlValue::String(pattern));
            return arg;
        }
        let symbol = mapping
            .wildcard_symbol
            .as_deref()
            .unwrap_or("%")
            .replace('\'', "''");
        let sql = arg.sql();
        Fragment::Sql(match mapping.wildcard_position {
            Some(WildcardPosition::Right) => format!("{sql} || '{symbol}'"),
            Some(WildcardPosition::Left) => format!("'{symbol}' || {sql}"),
            Some(WildcardPosition::Both) => format!("'{symbol}' || {sql} || '{symbol}'"),
            None => sql.to_owned(),
        })
    }

    fn comparison(
        &mut self,
        op: &str,
        left: &FilterNode,
        right: &FilterNode,
    ) -> Result<Fragment, CompileError> {
        let (lhs, distance_unit) = match unwrap_groups(left) {
            FilterNode::Function(call) => {
                let compiled = self.call(call)?;
                let unit = compiled.distance_unit();
                (Fragment::Sql(compiled.sql), unit)
            }
            _ => (self.node(left)?, None),
        };
        let mut rhs = self.node(right)?;

        if let Some(unit_param) = distance_unit {
            rhs = self.normalize_distance(&unit_param, rhs);
        }

        let operator = ComparisonOperator::from_token(op)?;
        let null_side = match (&lhs, &rhs) {
            (_, Fragment::Null) => Some(&lhs),
            (Fragment::Null, _) => Some(&rhs),
            _ => None,
        };
        if let Some(operand) = null_side {
            let sql = operand.sql();
            return match operator {
                ComparisonOperator::Eq => Ok(Fragment::Sql(format!("{sql} IS NULL"))),
                ComparisonOperator::Ne => Ok(Fragment::Sql(format!("{sql} IS NOT NULL"))),
                _ => Err(CompileError::NullComparison(op.to_owned())),
            };
        }

        Ok(Fragment::Sql(format!(
            "{} {} {}",
            lhs.sql(),
            operator.sql(),
            rhs.sql()
        )))
    }

    /// Drop the unit parameter of a `distance` call and express the
    /// threshold in degrees.
    fn normalize_distance(&mut self, unit_param: &str, threshold: Fragment) -> Fragment {
        let unit = self
            .parameters
            .remove(unit_param)
            .map(|v| v.to_string())
            .unwrap_or_default();
        if !unit.eq_ignore_ascii_case("m") {
            return threshold;
        }
        match &threshold {
            Fragment::Param(name) => {
                if let Some(meters) = self.parameters.get(name).and_then(SqlValue::as_f64) {
                    self.parameters
                        .insert(name.clone(), SqlValue::Double(meters / METERS_PER_DEGREE));
                }
                threshold
            }
            Fragment::Sql(sql) => Fragment::Sql(format!("({sql} / {METERS_PER_DEGREE:.1})")),
            Fragment::Null => threshold,
        }
    }

    fn logical(
        &mut self,
        op: LogicalOperator,
        left: &FilterNode,
        right: &FilterNode,
    ) -> Result<Fragment, CompileError> {
        let lhs = self.node(left)?;
        let rhs = self.node(right)?;
        let wrap = |node: &FilterNode, fragment: &Fragment| {
            if node.is_logical() {
                format!("({})", fragment.sql())
            } else {
                fragment.sql().to_owned()
            }
        };
        Ok(Fragment::Sql(format!(
            "{} {} {}",
            wrap(left, &lhs),
            op.sql(),
            wrap(right, &rhs)
        )))
    }

    fn in_list(&mut self, left: &FilterNode, values: &[String]) -> Result<Fragment, CompileError> {
        let lhs = self.node(left)?;
        let declared = match left {
            FilterNode::Primary(path) => self.compiler.properties.get(path).map(|m| m.kind()),
            _ => None,
        };

        let mut names = Vec::with_capacity(values.len());
        for value in values {
            if !is_literal(value) {
                return Err(CompileError::NotALiteral(value.clone()));
            }
            if let Some(kind) = declared
                && !literal_fits(kind, value)
            {
                return Err(CompileError::InTypeMismatch {
                    value: unquote(value),
                    path: left.to_string(),
                });
            }
            names.push(self.bind(parse_literal_value(value)).into_sql());
        }
        Ok(Fragment::Sql(format!("{} IN ({})", lhs.sql(), names.join(","))))
    }
}

struct CompiledCall {
    sql: String,
    is_distance: bool,
    args: Vec<Fragment>,
}

impl CompiledCall {
    /// Name of the parameter bound to the unit argument of a distance call.
    fn distance_unit(&self) -> Option<String> {
        if !self.is_distance {
            return None;
        }
        match self.args.get(1) {
            Some(Fragment::Param(name)) => Some(name.clone()),
            _ => None,
        }
    }
}

fn unwrap_groups(mut node: &FilterNode) -> &FilterNode {
    while let FilterNode::Group(inner) = node {
        node = inner;
    }
    node
}

/// Substitute `{n}` placeholders with the rendered arguments. Placeholders
/// without a matching argument are left as written.
fn render_template(template: &str, args: &[Fragment]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let arg = after[..close].trim().parse::<usize>().ok()?;
            Some((args.get(arg)?.sql(), close))
        });
        if let Some((sql, close)) = substituted {
            out.push_str(sql);
            rest = &after[close + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn operator_table() {
        assert_eq!(ComparisonOperator::from_token("eq").unwrap().sql(), "=");
        assert_eq!(ComparisonOperator::from_token("NE").unwrap().sql(), "<>");
        assert_eq!(ComparisonOperator::from_token("ge").unwrap().sql(), ">=");
        assert_eq!(ComparisonOperator::from_token("le").unwrap().sql(), "<=");
        assert_eq!(
            ComparisonOperator::from_token("has").unwrap_err().to_string(),
            "Unknown operator 'has'."
        );
    }

    #[test]
    fn templates_substitute_positions() {
        let args = [
            Fragment::Sql("geom".to_owned()),
            Fragment::Param("@p1".to_owned()),
        ];
        assert_eq!(
            render_template("ST_Distance({0}, ST_GeomFromText({1}, 4258)) {2}", &args),
            "ST_Distance(geom, ST_GeomFromText(@p1, 4258)) {2}"
        );
        assert_eq!(render_template("NOW()", &[]), "NOW()");
        assert_eq!(render_template("{x} {", &[]), "{x} {");
    }

    #[test]
    fn parameters_keep_insertion_order() {
        let mut params = Parameters::default();
        params.insert("@p1", SqlValue::Int(1));
        params.insert("@p2", SqlValue::from("a"));
        params.insert("@p1", SqlValue::Int(3));

        assert_eq!(params.get("@p1"), Some(&SqlValue::Int(3)));
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"{"@p1":3,"@p2":"a"}"#
        );
        assert_eq!(params.remove("@p1"), Some(SqlValue::Int(3)));
        assert!(!params.contains("@p1"));
        assert_eq!(params.len(), 1);
    }
}
