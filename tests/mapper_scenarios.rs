//! End-to-end mapper behavior against the recording executor.
//!
//! Every test goes through the public `Mapper` API only; the executor
//! captures the compiled statements and replays canned rows.

use std::sync::Arc;

use chrono::NaiveDate;
use dbmapper::test_helpers::RecordingExecutor;
use dbmapper::{
    Dialect, Direction, Entity, Filter, FilterValue, Join, JoinType, Mapper, MapperDefinition, MapperError,
    Operator, Record, Row, Sort, Statement,
};
use fake::faker::name::en::Name;
use fake::Fake;
use sea_query::Value;

fn widget() -> Record {
    Record::builder()
        .property("Id", Value::Int(None))
        .property("Name", Value::String(None))
        .property("Price", Value::Double(None))
        .property("OrderCount", Value::BigInt(None))
        .property("LaunchedOn", Value::String(None))
        .required("Name")
        .build()
}

fn plain_definition() -> MapperDefinition {
    MapperDefinition::new("widgets", "Id")
        .property("Id", ("id", "integer"))
        .property("Name", "name")
}

fn full_definition() -> MapperDefinition {
    MapperDefinition::new("widgets", "Id")
        .property("Id", ("id", "integer"))
        .property("Name", "name")
        .property("Price", ("price", "float"))
        .property("LaunchedOn", ("launched_on", "date"))
        .property("OrderCount", ("COUNT(orders.id)", "integer"))
        .join(Join::new(JoinType::Left, "orders", "orders.widget_id = widgets.id").unwrap())
}

fn mapper(definition: &MapperDefinition, executor: &Arc<RecordingExecutor>) -> Mapper<Record> {
    Mapper::new(definition, widget(), executor.clone()).unwrap()
}

fn param(statement: &Statement, name: &str) -> Value {
    statement
        .params
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("no parameter {name} in {}", statement.sql))
}

#[test]
fn get_one_by_id_selects_by_id_column() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&plain_definition(), &executor);

    assert!(widgets.get_one_by_id(5).unwrap().is_none());

    let statement = executor.last_statement().unwrap();
    assert_eq!(
        statement.sql,
        "SELECT widgets.id AS Id, widgets.name AS Name FROM widgets WHERE widgets.id = :id"
    );
    assert_eq!(statement.params.len(), 1);
    assert_eq!(param(&statement, "id"), Value::Int(Some(5)));
}

#[test]
fn between_binds_min_and_max() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&full_definition(), &executor);

    let filter = Filter::new("Price", Operator::Between, [10, 20]).unwrap();
    widgets.get_set(&[filter], &[], 1, 0).unwrap();

    let statement = executor.last_statement().unwrap();
    assert!(statement
        .sql
        .contains("WHERE widgets.price BETWEEN :Price_min AND :Price_max"));
    assert_eq!(param(&statement, "Price_min"), Value::Int(Some(10)));
    assert_eq!(param(&statement, "Price_max"), Value::Int(Some(20)));
}

#[test]
fn aggregate_filter_goes_to_having_with_group_by() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&full_definition(), &executor);

    let filter = Filter::new("OrderCount", Operator::Gt, 5).unwrap();
    widgets.get_set(&[filter], &[], 1, 0).unwrap();

    let sql = executor.last_statement().unwrap().sql;
    assert!(sql.ends_with(
        "GROUP BY widgets.id, widgets.name, widgets.price, widgets.launched_on HAVING OrderCount > :OrderCount"
    ));
    assert!(!sql.contains("WHERE"));
}

#[test]
fn save_inserts_writeable_columns_and_backfills_id() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.set_last_insert_id(41);
    let widgets = mapper(&full_definition(), &executor);

    let name: String = Name().fake();
    let price: f64 = (1.0..500.0).fake();
    let mut entity = widgets.get_new();
    entity.set("Id", Value::Int(Some(0))).unwrap();
    entity.set("Name", Value::from(name.clone())).unwrap();
    entity.set("Price", Value::Double(Some(price))).unwrap();
    entity.set("OrderCount", Value::BigInt(Some(9))).unwrap();

    widgets.save(&mut entity).unwrap();

    let insert = executor.last_statement().unwrap();
    assert_eq!(
        insert.sql,
        "INSERT INTO widgets (name, price, launched_on) VALUES (:name, :price, :launched_on)"
    );
    assert_eq!(param(&insert, "name"), Value::from(name));
    assert_eq!(entity.get("Id"), Some(Value::Int(Some(41))));
    assert!(!entity.is_dirty());
}

#[test]
fn save_then_get_one_by_id_round_trips() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.set_last_insert_id(7);
    let widgets = mapper(&full_definition(), &executor);

    let mut entity = widgets.get_new();
    entity.set("Name", Value::from(Name().fake::<String>())).unwrap();
    entity.set("Price", Value::Double(Some((1.0..100.0).fake()))).unwrap();
    widgets.save(&mut entity).unwrap();

    // Echo the inserted row back the way the database would alias it
    let insert = executor.last_statement().unwrap();
    executor.push_rows(vec![Row::new()
        .with("Id", 7)
        .with("Name", param(&insert, "name"))
        .with("Price", param(&insert, "price"))
        .with("OrderCount", Value::BigInt(Some(0)))]);

    let loaded = widgets.get_one_by_id(7).unwrap().unwrap();
    for property in ["Id", "Name", "Price"] {
        assert_eq!(loaded.get(property), entity.get(property), "{property}");
    }
}

#[test]
fn generated_id_keeps_the_declared_integer_variant() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.set_last_insert_id(Value::BigInt(Some(41)));
    let widgets = mapper(&plain_definition(), &executor);

    let mut entity = widgets.get_new();
    entity.set("Name", Value::from(Name().fake::<String>())).unwrap();
    widgets.save(&mut entity).unwrap();
    assert_eq!(entity.get("Id"), Some(Value::Int(Some(41))));

    executor.push_rows(vec![Row::new().with("Id", 41).with("Name", entity.get("Name").unwrap())]);
    let loaded = widgets.get_one_by_id(entity.get("Id").unwrap()).unwrap().unwrap();
    assert_eq!(loaded.get("Id"), entity.get("Id"));
    assert_eq!(loaded, entity);
}

#[test]
fn entity_only_property_filters_in_having() {
    let executor = Arc::new(RecordingExecutor::new());
    let scored = Record::builder()
        .property("Id", Value::Int(None))
        .property("Name", Value::String(None))
        .property("Score", Value::Int(None))
        .build();
    let widgets = Mapper::new(&plain_definition(), scored, executor.clone()).unwrap();
    let score = Filter::new("Score", Operator::Gte, 3).unwrap();

    widgets.get_set(&[score.clone()], &[], 1, 0).unwrap();
    let select = executor.last_statement().unwrap();
    assert!(select.sql.ends_with("FROM widgets HAVING Score >= :Score"));
    assert_eq!(param(&select, "Score"), Value::Int(Some(3)));

    widgets.count(&[score.clone()]).unwrap();
    assert!(executor
        .last_statement()
        .unwrap()
        .sql
        .ends_with("FROM widgets HAVING Score >= :Score) counted"));

    executor.clear();
    assert!(matches!(widgets.delete_one_where(&[score]), Err(MapperError::Query(_))));
    let undeclared = Filter::new("Colour", Operator::Eq, "red").unwrap();
    assert!(matches!(widgets.get_set(&[undeclared], &[], 1, 0), Err(MapperError::Query(_))));
    assert!(executor.statements().is_empty());
}

#[test]
fn save_updates_only_modified_properties() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.push_rows(vec![Row::new().with("Id", 3).with("Name", "bolt").with("Price", 2.5)]);
    let widgets = mapper(&full_definition(), &executor);

    let mut entity = widgets.get_one_by_id(3).unwrap().unwrap();
    entity.set("Price", Value::Double(Some(3.0))).unwrap();
    widgets.save(&mut entity).unwrap();

    let update = executor.last_statement().unwrap();
    assert_eq!(update.sql, "UPDATE widgets SET price = :price WHERE id = :id");
    assert_eq!(param(&update, "id"), Value::Int(Some(3)));
}

#[test]
fn temporal_values_are_formatted_for_the_dialect() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&full_definition(), &executor).with_dialect(Dialect::mysql());

    let mut entity = widgets.get_new();
    entity.set("Name", Value::from("bolt")).unwrap();
    entity
        .set("LaunchedOn", Value::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        .unwrap();
    widgets.save(&mut entity).unwrap();

    let insert = executor.last_statement().unwrap();
    assert_eq!(param(&insert, "launched_on"), Value::from("2024-03-01"));
}

#[test]
fn sql_server_pagination_synthesizes_order_by() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&plain_definition(), &executor).with_dialect(Dialect::sql_server());

    widgets.get_set(&[], &[], 2, 10).unwrap();

    let sql = executor.last_statement().unwrap().sql;
    assert!(sql.ends_with("FROM [widgets] ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY"));
}

#[test]
fn oracle_pagination_wraps_ordered_query() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&plain_definition(), &executor).with_dialect(Dialect::oracle());

    widgets
        .get_set(&[], &[Sort::new("Name", Direction::Asc).unwrap()], 3, 5)
        .unwrap();

    let sql = executor.last_statement().unwrap().sql;
    assert!(sql.starts_with("SELECT * FROM (SELECT paged_.*, ROWNUM AS rownum_ FROM (SELECT \"widgets\".\"id\""));
    assert!(sql.ends_with("ORDER BY \"widgets\".\"name\" ASC) paged_ WHERE ROWNUM <= 15) WHERE rownum_ > 10"));
}

#[test]
fn get_page_uses_default_page_size() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&plain_definition(), &executor);
    widgets.get_page(&[], &[], 2).unwrap();
    assert!(executor.last_statement().unwrap().sql.ends_with("LIMIT 25 OFFSET 25"));

    let widgets = widgets.with_default_page_size(5);
    widgets.get_page(&[], &[], 3).unwrap();
    assert!(executor.last_statement().unwrap().sql.ends_with("LIMIT 5 OFFSET 10"));
}

#[test]
fn delete_where_on_unknown_property_runs_nothing() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&full_definition(), &executor);

    let filter = Filter::new("Colour", Operator::Eq, "red").unwrap();
    let err = widgets.delete_one_where(&[filter]).unwrap_err();

    assert!(matches!(err, MapperError::Query(_)));
    assert!(err.is_pre_execution());
    assert!(executor.statements().is_empty());
}

#[test]
fn delete_where_filters_own_columns() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.push_affected(2);
    let widgets = mapper(&full_definition(), &executor);

    let filter = Filter::new("Name", Operator::In, ["bolt", "nut"]).unwrap();
    assert_eq!(widgets.delete_one_where(&[filter]).unwrap(), 2);

    let statement = executor.last_statement().unwrap();
    assert_eq!(statement.sql, "DELETE FROM widgets WHERE widgets.name IN (:Name_0, :Name_1)");

    let aggregate = Filter::new("OrderCount", Operator::Gt, 1).unwrap();
    assert!(matches!(widgets.delete_one_where(&[aggregate]), Err(MapperError::Query(_))));
    assert!(matches!(widgets.delete_one_where(&[]), Err(MapperError::InvalidArgument(_))));
}

#[test]
fn base_select_is_stable_between_compilations() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&full_definition(), &executor);
    let filters = [Filter::new("Name", Operator::IsNot, FilterValue::Null).unwrap()];

    let first = widgets.compile_select(&filters, &[], 1, 10).unwrap();
    let second = widgets.compile_select(&filters, &[], 1, 10).unwrap();
    assert_eq!(first, second);
    assert_eq!(widgets.base_select(), widgets.base_select());
}

#[test]
fn unknown_sorts_are_ignored_but_unknown_filters_fail() {
    let executor = Arc::new(RecordingExecutor::new());
    let widgets = mapper(&plain_definition(), &executor);

    let sorted = widgets
        .compile_select(&[], &[Sort::new("Colour", Direction::Desc).unwrap()], 1, 0)
        .unwrap();
    assert!(!sorted.sql.contains("ORDER BY"));

    let filter = Filter::new("Colour", Operator::Eq, "red").unwrap();
    assert!(matches!(widgets.get_set(&[filter], &[], 1, 0), Err(MapperError::Query(_))));
    assert!(matches!(widgets.get_set(&[], &[], 0, 10), Err(MapperError::InvalidArgument(_))));
}

#[test]
fn count_reports_total() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.push_rows(vec![Row::new().with("total", Value::BigInt(Some(12)))]);
    let widgets = mapper(&full_definition(), &executor);

    let filter = Filter::new("Price", Operator::Lt, 10.0).unwrap();
    assert_eq!(widgets.count(&[filter]).unwrap(), 12);

    let sql = executor.last_statement().unwrap().sql;
    assert!(sql.starts_with("SELECT COUNT(*) AS total FROM (SELECT"));
    assert!(sql.ends_with(") counted"));
}

#[test]
fn delete_entity_uses_its_id() {
    let executor = Arc::new(RecordingExecutor::new());
    executor.push_rows(vec![Row::new().with("Id", 11).with("Name", "bolt")]);
    let widgets = mapper(&plain_definition(), &executor);

    let entity = widgets.get_one_by_id(11).unwrap().unwrap();
    assert_eq!(widgets.delete(entity).unwrap(), 1);
    assert_eq!(
        executor.last_statement().unwrap().sql,
        "DELETE FROM widgets WHERE id = :id"
    );
}
