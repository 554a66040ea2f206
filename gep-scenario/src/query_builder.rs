//! Composition of the scenario aggregate queries.
//!
//! Queries are assembled from typed fragments ([`Column`], [`Expr`],
//! [`Predicate`], [`Select`]) and rendered once at the end. Column names
//! come from the model schema and are validated as identifiers before they
//! reach SQL text; every user-supplied value is bound through [`Params`].
//!
//! Year-dependent measures live in year-suffixed columns: population in
//! 2030 is `Pop2030`, the electrification code in 2025 is `ElecCode2025`.

use crate::filters::FilterRequest;
use crate::model_schema::Model;
use crate::{Result, ScenarioError};
use gep_db::{quote_ident, Params, QueryExecutor, Row};
use rusqlite::types::Value;

pub const SCENARIOS_TABLE: &str = "scenarios";

/// Category code for "not applicable / unknown"; never reported as a category.
pub const NOT_APPLICABLE_CODE: i64 = 99;

/// Storage column of the administrative boundary name. Clients send its
/// option values with `+` in place of spaces.
pub const ADMIN_BOUNDARY_COLUMN: &str = "Admin1";

pub mod fields {
    pub const SCENARIO_ID: &str = "scenarioId";
    pub const FEATURE_ID: &str = "featureId";
    pub const POP: &str = "Pop";
    pub const POP_CONNECTED: &str = "PopConnected";
    pub const ELEC_STATUS: &str = "ElecStatusIn";
    pub const ELEC_CODE: &str = "ElecCode";
    pub const FINAL_ELEC_CODE: &str = "FinalElecCode";
    pub const INVESTMENT_COST: &str = "InvestmentCost";
    pub const NEW_CAPACITY: &str = "NewCapacity";
}

/// `field` suffixed with `year`, or `field` unchanged without a year.
pub fn year_field(field: &str, year: Option<i64>) -> String {
    match year {
        Some(year) => format!("{}{}", field, year),
        None => field.to_string(),
    }
}

/// A column name that has been checked to be a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column(String);

impl Column {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        quote_ident(&name)?;
        Ok(Self(name))
    }

    /// The year-suffixed column for `field` in `year`.
    pub fn at(field: &str, year: i64) -> Result<Self> {
        Self::new(year_field(field, Some(year)))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn to_sql(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

/// Select-list expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Col(Column),
    /// `(a * b * ...)`
    Product(Vec<Expr>),
    /// `(a + b + ...)`
    Add(Vec<Expr>),
    Sum(Box<Expr>),
    /// `total(e)`: like `sum` but `0.0` over no rows.
    Total(Box<Expr>),
    Max(Box<Expr>),
    /// `coalesce(e, 0)`
    ZeroIfNull(Box<Expr>),
    /// `count(*)`
    CountRows,
    /// Scalar sub-select, rendered in parentheses.
    Subquery(Box<Select>),
}

impl Expr {
    pub fn col(column: &Column) -> Self {
        Expr::Col(column.clone())
    }

    pub fn product(a: &Column, b: &Column) -> Self {
        Expr::Product(vec![Expr::col(a), Expr::col(b)])
    }

    pub fn sum(expr: Expr) -> Self {
        Expr::Sum(Box::new(expr))
    }

    pub fn total(expr: Expr) -> Self {
        Expr::Total(Box::new(expr))
    }

    pub fn to_sql(&self) -> String {
        match self {
            Expr::Col(c) => c.to_sql(),
            Expr::Product(items) => join_parenthesized(items, " * ", "1"),
            Expr::Add(items) => join_parenthesized(items, " + ", "0"),
            Expr::Sum(e) => format!("sum({})", e.to_sql()),
            Expr::Total(e) => format!("total({})", e.to_sql()),
            Expr::Max(e) => format!("max({})", e.to_sql()),
            Expr::ZeroIfNull(e) => format!("coalesce({}, 0)", e.to_sql()),
            Expr::CountRows => "count(*)".to_string(),
            Expr::Subquery(select) => format!("({})", select.to_sql()),
        }
    }
}

fn join_parenthesized(items: &[Expr], sep: &str, empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = items.iter().map(Expr::to_sql).collect();
    format!("({})", parts.join(sep))
}

/// WHERE-clause predicate. Parameter names are given without the `:`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Column, String),
    AtLeast(Column, String),
    AtMost(Column, String),
    In(Column, Vec<String>),
    /// Comparison against a fixed code, never a user value.
    NotCode(Column, i64),
}

impl Predicate {
    pub fn to_sql(&self) -> String {
        match self {
            Predicate::Eq(c, p) => format!("{} = :{}", c.to_sql(), p),
            Predicate::AtLeast(c, p) => format!("{} >= :{}", c.to_sql(), p),
            Predicate::AtMost(c, p) => format!("{} <= :{}", c.to_sql(), p),
            Predicate::In(c, ps) => {
                let placeholders: Vec<String> = ps.iter().map(|p| format!(":{}", p)).collect();
                format!("{} IN ({})", c.to_sql(), placeholders.join(", "))
            }
            Predicate::NotCode(c, code) => format!("{} <> {}", c.to_sql(), code),
        }
    }
}

/// Predicates plus the parameters they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub predicates: Vec<Predicate>,
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub expr: Expr,
    pub alias: &'static str,
}

/// A SELECT over the scenarios table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub fields: Vec<Field>,
    pub predicates: Vec<Predicate>,
    pub group_by: Option<Column>,
    pub order_by: Option<Column>,
}

impl Select {
    pub fn field(mut self, expr: Expr, alias: &'static str) -> Self {
        self.fields.push(Field { expr, alias });
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: &[Predicate]) -> Self {
        self.predicates.extend_from_slice(predicates);
        self
    }

    pub fn group_by(mut self, column: &Column) -> Self {
        self.group_by = Some(column.clone());
        self
    }

    pub fn order_by(mut self, column: &Column) -> Self {
        self.order_by = Some(column.clone());
        self
    }

    pub fn to_sql(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} AS {}", f.expr.to_sql(), f.alias))
            .collect();
        let mut sql = format!("SELECT {} FROM {}", fields.join(", "), SCENARIOS_TABLE);
        if !self.predicates.is_empty() {
            let predicates: Vec<String> = self.predicates.iter().map(Predicate::to_sql).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        if let Some(group) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group.to_sql());
        }
        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.to_sql());
            sql.push_str(" ASC");
        }
        sql
    }
}

/// Rendered SQL and the parameters to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub name: &'static str,
    pub sql: String,
    pub params: Params,
}

impl Query {
    pub fn run<E: QueryExecutor>(&self, exec: &E) -> Result<Vec<Row>> {
        let rows = exec.execute(&self.sql, &self.params)?;
        log::info!("[GEP] query: {} returned {} rows", self.name, rows.len());
        Ok(rows)
    }

    pub fn run_one<E: QueryExecutor>(&self, exec: &E) -> Result<Row> {
        let row = exec.execute_one(&self.sql, &self.params)?;
        log::info!("[GEP] query: {} returned 1 row", self.name);
        Ok(row)
    }
}

/// The three reporting horizons of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Base,
    Intermediate,
    Final,
}

/// Cumulative investment to the last of `years`: the sum over those years
/// of `InvestmentCost_y * ElecStatusIn_y`, each year gated by that year's
/// connection status. A year with a NULL cell adds nothing rather than
/// voiding the other years of the row.
pub fn investment_cost_expr(years: &[i64]) -> Result<Expr> {
    years
        .iter()
        .map(|&y| {
            Ok(Expr::ZeroIfNull(Box::new(Expr::product(
                &Column::at(fields::INVESTMENT_COST, y)?,
                &Column::at(fields::ELEC_STATUS, y)?,
            ))))
        })
        .collect::<Result<Vec<_>>>()
        .map(Expr::Add)
}

/// Predicates selecting a scenario's rows that pass every filter.
///
/// Timestep-scoped filter columns are suffixed with `year`. Parameter names
/// are the column name plus `min`, `max` or `options<n>`.
pub fn build_where(
    model: &Model,
    scenario_id: &str,
    year: i64,
    filters: &[FilterRequest],
) -> Result<WhereClause> {
    let mut clause = WhereClause::default();
    clause.predicates.push(Predicate::Eq(
        Column::new(fields::SCENARIO_ID)?,
        fields::SCENARIO_ID.to_string(),
    ));
    clause
        .params
        .bind(fields::SCENARIO_ID, scenario_id.to_string());

    for filter in filters {
        filter.validate()?;
        let definition = model.filter(&filter.key).ok_or_else(|| {
            ScenarioError::InvalidFilter(format!(
                "unknown filter key {:?} for model {}",
                filter.key, model.id
            ))
        })?;
        let name = if definition.timestep {
            year_field(definition.column(), Some(year))
        } else {
            definition.column().to_string()
        };
        let column = Column::new(name.clone()).map_err(|_| {
            ScenarioError::InvalidFilter(format!(
                "filter {:?} maps to invalid column {:?}",
                filter.key, name
            ))
        })?;

        if let Some(min) = filter.min {
            let param = fresh_name(&clause.params, &format!("{}min", name), "");
            clause.params.bind(&param, min);
            clause.predicates.push(Predicate::AtLeast(column.clone(), param));
        }
        if let Some(max) = filter.max {
            let param = fresh_name(&clause.params, &format!("{}max", name), "");
            clause.params.bind(&param, max);
            clause.predicates.push(Predicate::AtMost(column.clone(), param));
        }
        if let Some(options) = filter.options() {
            let admin = definition.column().eq_ignore_ascii_case(ADMIN_BOUNDARY_COLUMN);
            let prefix = fresh_name(&clause.params, &format!("{}options", name), "0");
            let mut params = Vec::with_capacity(options.len());
            for (i, option) in options.iter().enumerate() {
                let value = if admin {
                    Value::Text(option.replace('+', " "))
                } else {
                    option_value(option)
                };
                let param = format!("{}{}", prefix, i);
                clause.params.bind(&param, value);
                params.push(param);
            }
            clause.predicates.push(Predicate::In(column, params));
        }
    }
    Ok(clause)
}

/// `base`, or `base_2`, `base_3`, ... if `base + suffix` is already bound.
fn fresh_name(params: &Params, base: &str, suffix: &str) -> String {
    if params.get(&format!("{}{}", base, suffix)).is_none() {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| params.get(&format!("{}{}", candidate, suffix)).is_none())
        .unwrap_or_else(|| base.to_string())
}

/// Option values bind with the type they look like, so `2` matches an
/// INTEGER category column and `Coast` a TEXT one.
fn option_value(option: &str) -> Value {
    let trimmed = option.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = trimmed.parse::<f64>() {
        Value::Real(f)
    } else {
        Value::Text(option.to_string())
    }
}

/// Every query a scenario summary needs, for one model, year and filter set.
#[derive(Debug, Clone)]
pub struct ScenarioQueries {
    base_year: i64,
    intermediate_year: i64,
    final_year: i64,
    year: i64,
    included_years: Vec<i64>,
    clause: WhereClause,
}

impl ScenarioQueries {
    /// Resolve the target year (first timestep by default) and the filters.
    pub fn new(
        model: &Model,
        scenario_id: &str,
        year: Option<i64>,
        filters: &[FilterRequest],
    ) -> Result<Self> {
        let year = model.resolve_year(year, model.intermediate_year())?;
        let intermediate_year = model.intermediate_year().unwrap_or(year);
        let final_year = model.final_year().unwrap_or(year);
        let included_years = model.timesteps.iter().copied().filter(|&y| y <= year).collect();
        let clause = build_where(model, scenario_id, year, filters)?;
        Ok(Self {
            base_year: model.base_year,
            intermediate_year,
            final_year,
            year,
            included_years,
            clause,
        })
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    /// Timesteps up to and including the target year, ascending.
    pub fn included_years(&self) -> &[i64] {
        &self.included_years
    }

    pub fn where_clause(&self) -> &WhereClause {
        &self.clause
    }

    fn query(&self, name: &'static str, select: Select) -> Query {
        Query {
            name,
            sql: select.to_sql(),
            params: self.clause.params.clone(),
        }
    }

    /// Flat totals plus the scenario-wide highest feature id and row count.
    ///
    /// Totals are `0` over an empty selection. `maxFeatureId` and
    /// `featureCount` ignore the filters so the feature array keeps the
    /// same length whatever is filtered out.
    pub fn summary(&self) -> Result<Query> {
        let scenario_only = |expr: Expr, alias: &'static str| -> Result<Expr> {
            let select = Select::default()
                .field(expr, alias)
                .filter(Predicate::Eq(
                    Column::new(fields::SCENARIO_ID)?,
                    fields::SCENARIO_ID.to_string(),
                ));
            Ok(Expr::Subquery(Box::new(select)))
        };
        let max_feature = scenario_only(
            Expr::Max(Box::new(Expr::col(&Column::new(fields::FEATURE_ID)?))),
            "maxFeatureId",
        )?;
        let feature_count = scenario_only(Expr::CountRows, "featureCount")?;

        let select = Select::default()
            .field(Expr::total(Expr::col(&Column::at(fields::POP, self.base_year)?)), "popBaseYear")
            .field(
                Expr::total(Expr::col(&Column::at(fields::POP, self.intermediate_year)?)),
                "popIntermediateYear",
            )
            .field(Expr::total(Expr::col(&Column::at(fields::POP, self.final_year)?)), "popFinalYear")
            .field(Expr::total(investment_cost_expr(&self.included_years)?), "investmentCost")
            .field(
                Expr::total(Expr::col(&Column::at(fields::NEW_CAPACITY, self.year)?)),
                "newCapacity",
            )
            .field(max_feature, "maxFeatureId")
            .field(feature_count, "featureCount")
            .filters(&self.clause.predicates);
        Ok(self.query("scenario_summary", select))
    }

    /// Connected population per electrification code at one horizon.
    ///
    /// Columns: `category`, `popConnected`.
    pub fn category_breakdown(&self, horizon: Horizon) -> Result<Query> {
        let (name, year) = match horizon {
            Horizon::Base => ("breakdown_base_year", self.base_year),
            Horizon::Intermediate => ("breakdown_intermediate_year", self.intermediate_year),
            Horizon::Final => ("breakdown_final_year", self.final_year),
        };
        let category = Column::at(fields::ELEC_CODE, year)?;
        let connected = match horizon {
            Horizon::Base => Expr::col(&Column::at(fields::POP_CONNECTED, year)?),
            _ => Expr::product(
                &Column::at(fields::POP, year)?,
                &Column::at(fields::ELEC_STATUS, year)?,
            ),
        };
        let select = Select::default()
            .field(Expr::col(&category), "category")
            .field(Expr::sum(connected), "popConnected")
            .filters(&self.clause.predicates)
            .filter(Predicate::NotCode(category.clone(), NOT_APPLICABLE_CODE))
            .group_by(&category);
        Ok(self.query(name, select))
    }

    /// One query per included timestep: that year's investment and new
    /// capacity, grouped by the target year's final electrification code.
    ///
    /// Columns: `category`, `investmentCost`, `newCapacity`.
    pub fn investment_breakdowns(&self) -> Result<Vec<(i64, Query)>> {
        let category = Column::at(fields::FINAL_ELEC_CODE, self.year)?;
        self.included_years
            .iter()
            .map(|&y| {
                let select = Select::default()
                    .field(Expr::col(&category), "category")
                    .field(Expr::sum(investment_cost_expr(&[y])?), "investmentCost")
                    .field(
                        Expr::sum(Expr::col(&Column::at(fields::NEW_CAPACITY, y)?)),
                        "newCapacity",
                    )
                    .filters(&self.clause.predicates)
                    .filter(Predicate::NotCode(category.clone(), NOT_APPLICABLE_CODE))
                    .group_by(&category);
                Ok((y, self.query("breakdown_investment", select)))
            })
            .collect()
    }

    /// `(id, tech)` per matching feature, ascending by id.
    pub fn feature_types(&self) -> Result<Query> {
        let feature_id = Column::new(fields::FEATURE_ID)?;
        let select = Select::default()
            .field(Expr::col(&feature_id), "id")
            .field(Expr::col(&Column::at(fields::FINAL_ELEC_CODE, self.year)?), "tech")
            .filters(&self.clause.predicates)
            .order_by(&feature_id);
        Ok(self.query("feature_types", select))
    }
}

/// Investment, new capacity and connected population of one feature.
///
/// Columns: `investmentCost`, `newCapacity`, `peopleConnected`.
pub fn feature_query(scenario_id: &str, feature_id: i64, year: i64) -> Result<Query> {
    let select = Select::default()
        .field(Expr::col(&Column::at(fields::INVESTMENT_COST, year)?), "investmentCost")
        .field(Expr::col(&Column::at(fields::NEW_CAPACITY, year)?), "newCapacity")
        .field(
            Expr::product(
                &Column::at(fields::POP, year)?,
                &Column::at(fields::ELEC_STATUS, year)?,
            ),
            "peopleConnected",
        )
        .filter(Predicate::Eq(
            Column::new(fields::SCENARIO_ID)?,
            fields::SCENARIO_ID.to_string(),
        ))
        .filter(Predicate::Eq(
            Column::new(fields::FEATURE_ID)?,
            fields::FEATURE_ID.to_string(),
        ));
    let mut params = Params::new();
    params.bind(fields::SCENARIO_ID, scenario_id.to_string());
    params.bind(fields::FEATURE_ID, feature_id);
    Ok(Query {
        name: "feature",
        sql: select.to_sql(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_schema::FilterDefinition;

    fn definition(key: &str, column: Option<&str>, timestep: bool) -> FilterDefinition {
        FilterDefinition {
            key: key.to_string(),
            column: column.map(str::to_string),
            timestep,
            extra: Default::default(),
        }
    }

    fn model() -> Model {
        Model::new(
            "onsset-ke".into(),
            2020,
            vec![2025, 2030],
            vec![
                definition("Pop", None, true),
                definition("Region", Some("Admin1"), false),
                definition("GridDist", None, false),
                definition("Broken", Some("Grid Dist"), false),
            ],
            Vec::new(),
        )
    }

    fn filter(key: &str, min: Option<f64>, max: Option<f64>, options: Option<&[&str]>) -> FilterRequest {
        FilterRequest {
            key: key.into(),
            min,
            max,
            options: options.map(|o| o.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn year_field_suffixes() {
        assert_eq!(year_field("Pop", Some(2030)), "Pop2030");
        assert_eq!(year_field("Pop", None), "Pop");
    }

    #[test]
    fn investment_expression_adds_gated_products() {
        let expr = investment_cost_expr(&[2025, 2030]).unwrap();
        assert_eq!(
            Expr::sum(expr).to_sql(),
            "sum((coalesce((\"InvestmentCost2025\" * \"ElecStatusIn2025\"), 0) + \
             coalesce((\"InvestmentCost2030\" * \"ElecStatusIn2030\"), 0)))"
        );
    }

    #[test]
    fn min_and_max_both_bound() {
        let clause = build_where(
            &model(),
            "onsset-ke-1",
            2030,
            &[filter("Pop", Some(10.0), Some(500.0), None)],
        )
        .unwrap();
        let sql: Vec<String> = clause.predicates.iter().map(Predicate::to_sql).collect();
        assert_eq!(
            sql,
            vec![
                "\"scenarioId\" = :scenarioId",
                "\"Pop2030\" >= :Pop2030min",
                "\"Pop2030\" <= :Pop2030max",
            ]
        );
        assert_eq!(clause.params.get("Pop2030min"), Some(&Value::Real(10.0)));
        assert_eq!(clause.params.get("Pop2030max"), Some(&Value::Real(500.0)));
    }

    #[test]
    fn parameter_names_are_distinct_across_filters() {
        let clause = build_where(
            &model(),
            "onsset-ke-1",
            2025,
            &[
                filter("Pop", Some(1.0), Some(2.0), None),
                filter("GridDist", Some(3.0), Some(4.0), None),
                filter("Pop", Some(5.0), None, None),
                filter("Region", None, None, Some(&["Coast"][..])),
            ],
        )
        .unwrap();
        let names: Vec<&str> = clause.params.names().collect();
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(names.len(), unique.len(), "{names:?}");
        assert_eq!(names.len(), 7);
        assert_eq!(clause.params.get("Pop2025min_2"), Some(&Value::Real(5.0)));
    }

    #[test]
    fn options_bind_one_parameter_each() {
        let clause = build_where(
            &model(),
            "onsset-ke-1",
            2025,
            &[filter("Region", None, None, Some(&["Rift+Valley", "Coast"][..]))],
        )
        .unwrap();
        assert_eq!(
            clause.predicates[1].to_sql(),
            "\"Admin1\" IN (:Admin1options0, :Admin1options1)"
        );
        assert_eq!(
            clause.params.get("Admin1options0"),
            Some(&Value::Text("Rift Valley".into()))
        );
    }

    #[test]
    fn numeric_options_bind_as_numbers() {
        assert_eq!(option_value("2"), Value::Integer(2));
        assert_eq!(option_value("2.5"), Value::Real(2.5));
        assert_eq!(option_value("Coast"), Value::Text("Coast".into()));
    }

    #[test]
    fn unknown_filter_key_is_rejected() {
        let err = build_where(
            &model(),
            "onsset-ke-1",
            2025,
            &[filter("Elevation", Some(1.0), None, None)],
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidFilter(_)));
    }

    #[test]
    fn filter_without_value_is_rejected() {
        let err = build_where(&model(), "onsset-ke-1", 2025, &[filter("Pop", None, None, None)])
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidFilter(_)));
    }

    #[test]
    fn filter_with_unsafe_column_is_rejected() {
        let err = build_where(
            &model(),
            "onsset-ke-1",
            2025,
            &[filter("Broken", Some(1.0), None, None)],
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidFilter(_)));
    }

    #[test]
    fn user_values_never_reach_sql_text() {
        let queries = ScenarioQueries::new(
            &model(),
            "x' OR 1=1 --",
            None,
            &[filter("Region", None, None, Some(&["'; DROP TABLE models; --"][..]))],
        )
        .unwrap();
        let sql = queries.summary().unwrap().sql;
        assert!(!sql.contains("DROP"));
        assert!(!sql.contains("OR 1=1"));
    }

    #[test]
    fn year_defaults_to_first_timestep() {
        let queries = ScenarioQueries::new(&model(), "onsset-ke-1", None, &[]).unwrap();
        assert_eq!(queries.year(), 2025);
        assert_eq!(queries.included_years(), &[2025]);

        let queries = ScenarioQueries::new(&model(), "onsset-ke-1", Some(2030), &[]).unwrap();
        assert_eq!(queries.included_years(), &[2025, 2030]);

        let err = ScenarioQueries::new(&model(), "onsset-ke-1", Some(2040), &[]).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidParameter(_)));
    }

    #[test]
    fn summary_query_shape() {
        let queries = ScenarioQueries::new(&model(), "onsset-ke-1", Some(2030), &[]).unwrap();
        let query = queries.summary().unwrap();
        assert_eq!(
            query.sql,
            "SELECT total(\"Pop2020\") AS popBaseYear, total(\"Pop2025\") AS popIntermediateYear, \
             total(\"Pop2030\") AS popFinalYear, \
             total((coalesce((\"InvestmentCost2025\" * \"ElecStatusIn2025\"), 0) + \
             coalesce((\"InvestmentCost2030\" * \"ElecStatusIn2030\"), 0))) AS investmentCost, \
             total(\"NewCapacity2030\") AS newCapacity, \
             (SELECT max(\"featureId\") AS maxFeatureId FROM scenarios WHERE \"scenarioId\" = :scenarioId) AS maxFeatureId, \
             (SELECT count(*) AS featureCount FROM scenarios WHERE \"scenarioId\" = :scenarioId) AS featureCount \
             FROM scenarios WHERE \"scenarioId\" = :scenarioId"
        );
        assert_eq!(query.params.len(), 1);
    }

    #[test]
    fn breakdowns_exclude_not_applicable_code() {
        let queries = ScenarioQueries::new(&model(), "onsset-ke-1", None, &[]).unwrap();
        let base = queries.category_breakdown(Horizon::Base).unwrap();
        assert_eq!(
            base.sql,
            "SELECT \"ElecCode2020\" AS category, sum(\"PopConnected2020\") AS popConnected \
             FROM scenarios WHERE \"scenarioId\" = :scenarioId AND \"ElecCode2020\" <> 99 \
             GROUP BY \"ElecCode2020\""
        );
        let fin = queries.category_breakdown(Horizon::Final).unwrap();
        assert!(fin.sql.contains("sum((\"Pop2030\" * \"ElecStatusIn2030\")) AS popConnected"));
        assert!(fin.sql.contains("\"ElecCode2030\" <> 99"));
    }

    #[test]
    fn investment_breakdowns_per_included_year() {
        let queries = ScenarioQueries::new(&model(), "onsset-ke-1", Some(2030), &[]).unwrap();
        let breakdowns = queries.investment_breakdowns().unwrap();
        let years: Vec<i64> = breakdowns.iter().map(|(y, _)| *y).collect();
        assert_eq!(years, vec![2025, 2030]);
        for (_, query) in &breakdowns {
            assert!(query.sql.contains("GROUP BY \"FinalElecCode2030\""));
            assert!(query.sql.contains("\"FinalElecCode2030\" <> 99"));
        }
        assert!(breakdowns[0].1.sql.contains("sum(\"NewCapacity2025\")"));
    }

    #[test]
    fn feature_types_ordered_by_id() {
        let queries = ScenarioQueries::new(&model(), "onsset-ke-1", None, &[]).unwrap();
        let sql = queries.feature_types().unwrap().sql;
        assert!(sql.starts_with("SELECT \"featureId\" AS id, \"FinalElecCode2025\" AS tech"));
        assert!(sql.ends_with("ORDER BY \"featureId\" ASC"));
    }

    #[test]
    fn feature_query_binds_ids() {
        let query = feature_query("onsset-ke-1", 4, 2030).unwrap();
        assert!(query.sql.contains("\"featureId\" = :featureId"));
        assert_eq!(query.params.get("featureId"), Some(&Value::Integer(4)));
    }
}
