use schemectl_testkit::{TestResult, load_test_cases_from_str, run_diff_test};

/// A realistic multi-table migration: a new `refunds` table referencing
/// `orders`, a widened `orders.total` column, and a dropped legacy
/// `orders.notes` column.
const MANIFEST: &str = r#"
add_refunds_table_and_widen_total:
  current:
    provider: postgresql
    database_name: billing
    analyzed_at: "2026-01-01T00:00:00Z"
    tables:
      - name: orders
        schema_namespace: public
        columns:
          - name: id
            data_type: { category: Integer }
            native_type: int4
            nullable: false
            primary_key: true
            identity: true
          - name: total
            data_type: { category: Decimal, precision: 8, scale: 2 }
            native_type: numeric(8,2)
            nullable: false
            primary_key: false
            identity: false
          - name: notes
            data_type: { category: Text }
            native_type: text
            nullable: true
            primary_key: false
            identity: false
        indexes: []
        constraints: []
    views: []
    indexes: []
    constraints: []
    procedures: []
    functions: []
  desired:
    provider: postgresql
    database_name: billing
    analyzed_at: "2026-01-02T00:00:00Z"
    tables:
      - name: orders
        schema_namespace: public
        columns:
          - name: id
            data_type: { category: Integer }
            native_type: int4
            nullable: false
            primary_key: true
            identity: true
          - name: total
            data_type: { category: Decimal, precision: 12, scale: 2 }
            native_type: numeric(12,2)
            nullable: false
            primary_key: false
            identity: false
        indexes: []
        constraints: []
      - name: refunds
        schema_namespace: public
        columns:
          - name: id
            data_type: { category: Integer }
            native_type: int4
            nullable: false
            primary_key: true
            identity: true
          - name: order_id
            data_type: { category: Integer }
            native_type: int4
            nullable: false
            primary_key: false
            identity: false
        indexes: []
        constraints: []
    views: []
    indexes: []
    constraints:
      - name: fk_refunds_order
        kind: ForeignKey
        table: refunds
        columns: [order_id]
        referenced_table: orders
        referenced_columns: [id]
        on_delete: Restrict
        on_update: NoAction
        check_expression: null
    procedures: []
    functions: []
  expected_changes:
    - operation: Create
      object_kind: Table
      qualified_name: refunds
    - operation: Alter
      object_kind: Column
      qualified_name: orders.total
    - operation: Alter
      object_kind: Column
      qualified_name: orders.notes
    - operation: Create
      object_kind: Constraint
      qualified_name: refunds.fk_refunds_order
  expected_change_count: 4
"#;

#[test]
fn a_multi_table_migration_produces_every_expected_change_in_one_pass() {
    let cases = load_test_cases_from_str(MANIFEST).expect("manifest should parse");
    let case = cases.get("add_refunds_table_and_widen_total").expect("named fixture present");
    assert_eq!(run_diff_test(case, "postgresql"), TestResult::Passed);
}
