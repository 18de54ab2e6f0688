use crate::{
    db::{
        predicate::{BooleanOp, ComparePredicate, CompareOp, Operand, Predicate},
        sql::{CompileError, Dialect},
    },
    key::{KeyPath, KeyRef},
    model::EntityModel,
    value::Value,
};

/// Alias of the root table in every statement.
pub const ROOT_ALIAS: &str = "t0";

///
/// Join
/// One `LEFT JOIN` registered for a relation-path prefix.
///

#[derive(Clone, Debug)]
pub struct Join {
    path: Vec<KeyRef>,
    alias: String,
    table: &'static str,
    on: String,
}

impl Join {
    /// Relation hops leading to this join, root first.
    #[must_use]
    pub fn path(&self) -> &[KeyRef] {
        &self.path
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

///
/// JoinSet
///
/// Insertion-ordered joins, one per distinct relation path. Aliases are
/// `t1`, `t2`, ... in registration order.
///

#[derive(Clone, Debug, Default)]
pub struct JoinSet {
    joins: Vec<Join>,
}

impl JoinSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter()
    }

    /// Alias for the table reached through `prefix`, joining as needed.
    fn alias_for(
        &mut self,
        dialect: &dyn Dialect,
        prefix: &[KeyRef],
    ) -> Result<String, CompileError> {
        let Some((&hop, parent)) = prefix.split_last() else {
            return Ok(ROOT_ALIAS.to_string());
        };
        if let Some(join) = self.joins.iter().find(|join| join.path == prefix) {
            return Ok(join.alias.clone());
        }

        let parent_alias = self.alias_for(dialect, parent)?;
        let field = hop.field();
        let Some(target) = field.foreign_target() else {
            return Err(CompileError::InvalidJoinPath {
                entity: hop.model().name,
                key: field.name,
            });
        };
        if !field.persistent {
            return Err(CompileError::NonPersistentKey {
                entity: hop.model().name,
                key: field.name,
            });
        }

        let alias = format!("t{}", self.joins.len() + 1);
        let on = format!(
            "{alias}.{} = {parent_alias}.{}",
            dialect.quote_ident(target.primary_key_field().column),
            dialect.quote_ident(field.column),
        );
        self.joins.push(Join {
            path: prefix.to_vec(),
            alias: alias.clone(),
            table: target.table,
            on,
        });

        Ok(alias)
    }

    /// ` LEFT JOIN ...` clauses, each with a leading space.
    #[must_use]
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        self.joins
            .iter()
            .map(|join| {
                format!(
                    " LEFT JOIN {} {} ON {}",
                    dialect.quote_ident(join.table),
                    join.alias,
                    join.on
                )
            })
            .collect()
    }
}

///
/// CompiledPredicate
///

#[derive(Clone, Debug)]
pub struct CompiledPredicate {
    pub condition: String,
    pub params: Vec<Value>,
    pub joins: JoinSet,
}

/// Compile one predicate against `root` in isolation.
pub fn compile(
    predicate: &Predicate,
    root: &'static EntityModel,
    dialect: &dyn Dialect,
) -> Result<CompiledPredicate, CompileError> {
    let mut compiler = SqlCompiler::new(root, dialect);
    let condition = compiler.condition(predicate)?;
    let (params, joins) = compiler.finish();

    Ok(CompiledPredicate {
        condition,
        params,
        joins,
    })
}

///
/// SqlCompiler
///
/// Walks predicates and key paths for one statement, sharing a single
/// join set between the WHERE clause, ORDER BY and the projection.
/// Parameters are collected in placeholder order.
///

pub struct SqlCompiler<'d> {
    root: &'static EntityModel,
    dialect: &'d dyn Dialect,
    joins: JoinSet,
    params: Vec<Value>,
}

impl<'d> SqlCompiler<'d> {
    #[must_use]
    pub fn new(root: &'static EntityModel, dialect: &'d dyn Dialect) -> Self {
        Self {
            root,
            dialect,
            joins: JoinSet::default(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    #[must_use]
    pub const fn joins(&self) -> &JoinSet {
        &self.joins
    }

    pub fn finish(self) -> (Vec<Value>, JoinSet) {
        (self.params, self.joins)
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    /// Qualified column for a key path, registering joins for its prefix.
    pub fn column(&mut self, path: &KeyPath) -> Result<String, CompileError> {
        if !path.root().same_as(self.root) {
            return Err(CompileError::RootMismatch {
                expected: self.root.name,
                found: path.root().name,
            });
        }
        if let Some(hop) = path.first_broken_hop() {
            let hop = path.hops()[hop];
            return Err(CompileError::InvalidJoinPath {
                entity: hop.model().name,
                key: hop.name(),
            });
        }

        let hops = path.hops();
        let alias = self.joins.alias_for(self.dialect, &hops[..hops.len() - 1])?;
        let leaf = path.leaf();
        let field = leaf.field();
        if !field.persistent {
            return Err(CompileError::NonPersistentKey {
                entity: leaf.model().name,
                key: field.name,
            });
        }

        Ok(format!("{alias}.{}", self.quote(field.column)))
    }

    /// Render a predicate as a condition, binding its literals.
    pub fn condition(&mut self, predicate: &Predicate) -> Result<String, CompileError> {
        let sql = match predicate {
            Predicate::Compare(cmp) => self.compare(cmp)?,
            Predicate::Fixed(value) => self.dialect.fixed(*value).to_string(),
            Predicate::RawSql(raw) => {
                if let Some(value) = raw.value() {
                    self.params.push(value.clone());
                }
                raw.fragment().to_string()
            }
            Predicate::Binary { left, op, right } => {
                let left = self.condition(left)?;
                let right = self.condition(right)?;
                match op {
                    BooleanOp::And => format!("({left}) AND ({right})"),
                    BooleanOp::Or => format!("({left}) OR ({right})"),
                    BooleanOp::Xor => format!("({left}) <> ({right})"),
                    BooleanOp::Nand => format!("NOT (({left}) AND ({right}))"),
                    BooleanOp::Nor => format!("NOT (({left}) OR ({right}))"),
                    BooleanOp::Equiv => format!("({left}) = ({right})"),
                }
            }
            Predicate::Not(inner) => format!("NOT ({})", self.condition(inner)?),
        };

        Ok(sql)
    }

    fn compare(&mut self, cmp: &ComparePredicate) -> Result<String, CompileError> {
        let column = self.column(cmp.key())?;
        match cmp.operand() {
            Operand::Value(value) => Ok(self.compare_value(cmp, &column, value)),
            Operand::Key(other) => {
                let other = self.column(other)?;
                self.compare_columns(cmp, &column, &other)
            }
        }
    }

    fn bind(&mut self, value: Value) -> &'static str {
        self.params.push(value);
        "?"
    }

    fn compare_value(&mut self, cmp: &ComparePredicate, column: &str, value: &Value) -> String {
        let op = cmp.op();
        match (op, value) {
            (CompareOp::Eq, Value::Null) => format!("{column} IS NULL"),
            (CompareOp::Ne, Value::Null) => format!("{column} IS NOT NULL"),
            // ordering and text matching against null are never satisfied
            (_, Value::Null) => self.dialect.fixed(false).to_string(),

            // null items never match, and SQL would turn NOT IN unknown
            (CompareOp::In | CompareOp::NotIn, Value::List(items))
                if items.iter().all(Value::is_null) =>
            {
                self.dialect.fixed(op == CompareOp::NotIn).to_string()
            }
            (CompareOp::In | CompareOp::NotIn, Value::List(items)) => {
                let placeholders = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| self.bind(item.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!("{column} IN ({placeholders})");
                if op == CompareOp::NotIn {
                    format!("NOT ({sql})")
                } else {
                    sql
                }
            }

            (CompareOp::Regexp | CompareOp::NotRegexp, _) => {
                let source = cmp
                    .pattern()
                    .map_or_else(|| value.to_string(), |pattern| pattern.as_str().to_string());
                let placeholder = self.bind(Value::Text(format!("^(?:{source})$")));
                self.dialect
                    .regexp(column, placeholder, op == CompareOp::NotRegexp)
            }

            (CompareOp::EqualsCi, Value::Text(text)) => {
                let placeholder = self.bind(Value::Text(text.to_lowercase()));
                format!("LOWER({column}) = {placeholder}")
            }
            (op, Value::Text(text)) if op.is_text_match() => {
                let text = if op.is_case_insensitive() {
                    text.to_lowercase()
                } else {
                    text.clone()
                };
                let pattern = like_pattern(op, &escape_like(&text));
                let placeholder = self.bind(Value::Text(pattern));
                let target = if op.is_case_insensitive() {
                    format!("LOWER({column})")
                } else {
                    column.to_string()
                };
                format!("{target} LIKE {placeholder} ESCAPE '\\'")
            }

            (op, value) => {
                let placeholder = self.bind(value.clone());
                format!("{column} {} {placeholder}", comparison(op))
            }
        }
    }

    fn compare_columns(
        &self,
        cmp: &ComparePredicate,
        column: &str,
        other: &str,
    ) -> Result<String, CompileError> {
        let op = cmp.op();
        let sql = match op {
            CompareOp::In | CompareOp::NotIn | CompareOp::Regexp | CompareOp::NotRegexp => {
                return Err(CompileError::UnsupportedOperand {
                    key: cmp.key().to_string(),
                    op,
                });
            }
            CompareOp::EqualsCi => format!("LOWER({column}) = LOWER({other})"),
            op if op.is_text_match() => {
                let (target, other) = if op.is_case_insensitive() {
                    (format!("LOWER({column})"), format!("LOWER({other})"))
                } else {
                    (column.to_string(), other.to_string())
                };
                let other = escape_like_column(&other);
                let pattern = match op {
                    CompareOp::Starts | CompareOp::StartsCi => {
                        self.dialect.concat(&[other.as_str(), "'%'"])
                    }
                    CompareOp::Ends | CompareOp::EndsCi => {
                        self.dialect.concat(&["'%'", other.as_str()])
                    }
                    _ => self.dialect.concat(&["'%'", other.as_str(), "'%'"]),
                };
                format!("{target} LIKE {pattern} ESCAPE '{COLUMN_ESCAPE}'")
            }
            op => format!("{column} {} {other}", comparison(op)),
        };

        Ok(sql)
    }
}

const fn comparison(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        _ => "=",
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}

/// Escape character for patterns built from another column. Not a
/// backslash, so the literal reads the same in every dialect.
const COLUMN_ESCAPE: char = '!';

/// SQL expression escaping LIKE metacharacters in a column value.
fn escape_like_column(expr: &str) -> String {
    let e = COLUMN_ESCAPE;

    format!("REPLACE(REPLACE(REPLACE({expr}, '{e}', '{e}{e}'), '%', '{e}%'), '_', '{e}_')")
}

fn like_pattern(op: CompareOp, escaped: &str) -> String {
    match op {
        CompareOp::Starts | CompareOp::StartsCi => format!("{escaped}%"),
        CompareOp::Ends | CompareOp::EndsCi => format!("%{escaped}"),
        _ => format!("%{escaped}%"),
    }
}
