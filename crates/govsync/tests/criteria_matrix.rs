use govsync::entity::{
    Comparator, Comparison, Criteria, CriteriaError, CriteriaKey, CriteriaLevel2, CriteriaNode,
    MembershipCriteria,
};
use govsync::Value;
use proptest::prelude::*;
use serde_json::json;

fn read(json: serde_json::Value) -> Result<MembershipCriteria, CriteriaError> {
    MembershipCriteria::from_canonical(&Value::from_json(&json))
}

#[test]
fn department_and_account_status_roundtrip_unchanged() {
    let json = json!({
        "operation": "AND",
        "children": [
            {"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "department"}, "stringValue": "Eng"},
            {"operation": "EQUALS", "key": {"type": "ACCOUNT", "property": "status", "sourceId": "src1"}, "stringValue": "active"}
        ]
    });
    let criteria = read(json.clone()).unwrap();
    assert_eq!(
        criteria,
        Criteria::and(vec![
            Comparison::equals(CriteriaKey::identity("department"), "Eng").into(),
            Comparison::equals(CriteriaKey::account("status", "src1").unwrap(), "active").into(),
        ])
    );
    assert_eq!(criteria.to_canonical().to_json(), json);
}

#[test]
fn three_levels_are_accepted() {
    let json = json!({
        "operation": "OR",
        "children": [
            {"operation": "AND", "children": [
                {"operation": "STARTS_WITH", "key": {"type": "IDENTITY", "property": "title"}, "stringValue": "Sr"},
                {"operation": "NOT_EQUALS", "key": {"type": "ENTITLEMENT", "property": "group", "sourceId": "ad"}, "stringValue": "x"}
            ]},
            {"operation": "ENDS_WITH", "key": {"type": "IDENTITY", "property": "email"}, "stringValue": "@corp"}
        ]
    });
    let criteria = read(json.clone()).unwrap();
    assert_eq!(criteria.to_canonical().to_json(), json);
}

#[test]
fn single_comparison_is_a_valid_root() {
    let criteria = read(json!({
        "operation": "CONTAINS", "key": {"type": "IDENTITY", "property": "cn"}, "stringValue": "ops"
    }))
    .unwrap();
    assert!(matches!(criteria, Criteria::Leaf(Comparison { operation: Comparator::Contains, .. })));
}

#[test]
fn null_fields_read_as_absent() {
    let criteria = read(json!({
        "operation": "AND", "key": null, "stringValue": null,
        "children": [{"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a", "sourceId": null},
                      "stringValue": "x", "children": null}]
    }))
    .unwrap();
    assert_eq!(
        criteria,
        Criteria::and(vec![Comparison::equals(CriteriaKey::identity("a"), "x").into()])
    );
}

#[test]
fn malformed_trees_are_rejected_with_location() {
    let leaf = json!({"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a"}, "stringValue": "x"});
    let cases: [(serde_json::Value, &str, fn(&CriteriaError) -> bool); 10] = [
        (json!([]), "", |e| matches!(e, CriteriaError::NotAnObject { .. })),
        (
            json!({"operation": "XOR", "children": [leaf.clone()]}),
            "",
            |e| matches!(e, CriteriaError::UnknownValue { field: "operation", .. }),
        ),
        (
            json!({"operation": "AND", "children": []}),
            "",
            |e| matches!(e, CriteriaError::EmptyComposite { .. }),
        ),
        (
            json!({"operation": "OR", "stringValue": "x", "children": [leaf.clone()]}),
            "",
            |e| matches!(e, CriteriaError::CompositeWithLeafField { field: "stringValue", .. }),
        ),
        (
            json!({"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a"}, "stringValue": "x", "children": [leaf.clone()]}),
            "",
            |e| matches!(e, CriteriaError::LeafWithChildren { .. }),
        ),
        (
            json!({"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a"}}),
            "",
            |e| matches!(e, CriteriaError::Missing { field: "stringValue", .. }),
        ),
        (
            json!({"operation": "AND", "children": [
                {"operation": "EQUALS", "key": {"type": "ACCOUNT", "property": "a", "sourceId": ""}, "stringValue": "x"}
            ]}),
            "/children/0",
            |e| matches!(e, CriteriaError::MissingSourceId { .. }),
        ),
        (
            json!({"operation": "AND", "children": [
                {"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a", "sourceId": "s"}, "stringValue": "x"}
            ]}),
            "/children/0",
            |e| matches!(e, CriteriaError::ForbiddenSourceId { .. }),
        ),
        (
            json!({"operation": "AND", "children": [{"operation": "OR", "children": [
                {"operation": "AND", "children": [leaf.clone()]}
            ]}]}),
            "/children/0/children/0",
            |e| matches!(e, CriteriaError::TooDeep { .. }),
        ),
        (
            json!({"operation": "AND", "children": [leaf.clone(), {"operation": "EQUALS", "key": "a", "stringValue": "x"}]}),
            "/children/1",
            |e| matches!(e, CriteriaError::WrongType { field: "key", .. }),
        ),
    ];

    for (json, location, expected) in cases {
        let err = read(json.clone()).expect_err("malformed");
        assert!(expected(&err), "{json}: {err:?}");
        let message = err.to_string();
        assert!(
            message.starts_with(&format!("criteria node at {location}")),
            "{json}: {message}"
        );
    }
}

#[test]
fn lower_levels_refuse_deeper_trees() {
    let two_levels = Value::from_json(&json!({"operation": "AND", "children": [
        {"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a"}, "stringValue": "x"}
    ]}));
    assert!(CriteriaLevel2::from_canonical(&two_levels).is_ok());
    assert!(matches!(
        Comparison::from_canonical(&two_levels),
        Err(CriteriaError::TooDeep { .. })
    ));
}

#[test]
fn serde_goes_through_the_canonical_form() {
    let criteria: MembershipCriteria = serde_json::from_value(json!({
        "operation": "OR",
        "children": [{"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a"}, "stringValue": "x"}]
    }))
    .unwrap();
    assert_eq!(
        serde_json::to_value(&criteria).unwrap(),
        criteria.to_canonical().to_json()
    );

    let err = serde_json::from_value::<MembershipCriteria>(json!({"operation": "OR", "children": []}))
        .unwrap_err();
    assert!(err.to_string().contains("needs at least one child"), "{err}");
}

// ── Properties ────────────────────────────────────────────────────────────

fn arb_key() -> impl Strategy<Value = CriteriaKey> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(CriteriaKey::identity),
        ("[a-z]{1,6}", "[a-z0-9]{1,4}").prop_map(|(p, s)| CriteriaKey::account(p, s).unwrap()),
        ("[a-z]{1,6}", "[a-z0-9]{1,4}").prop_map(|(p, s)| CriteriaKey::entitlement(p, s).unwrap()),
    ]
}

fn arb_comparison() -> impl Strategy<Value = Comparison> {
    let comparator = prop::sample::select(Comparator::ALL.to_vec());
    (comparator, arb_key(), ".{0,8}").prop_map(|(op, key, value)| Comparison::new(op, key, value))
}

fn arb_level2() -> impl Strategy<Value = CriteriaLevel2> {
    prop_oneof![
        arb_comparison().prop_map(Criteria::Leaf),
        (any::<bool>(), prop::collection::vec(arb_comparison(), 1..4)).prop_map(|(and, c)| {
            if and {
                Criteria::and(c)
            } else {
                Criteria::or(c)
            }
        }),
    ]
}

fn arb_criteria() -> impl Strategy<Value = MembershipCriteria> {
    prop_oneof![
        arb_comparison().prop_map(Criteria::Leaf),
        (any::<bool>(), prop::collection::vec(arb_level2(), 1..4)).prop_map(|(and, c)| {
            if and {
                Criteria::and(c)
            } else {
                Criteria::or(c)
            }
        }),
    ]
}

proptest! {
    #[test]
    fn canonical_form_roundtrips(criteria in arb_criteria()) {
        let canonical = criteria.to_canonical();
        prop_assert_eq!(MembershipCriteria::from_canonical(&canonical).unwrap(), criteria);
    }

    #[test]
    fn json_form_roundtrips(criteria in arb_criteria()) {
        let json = criteria.to_canonical().to_json();
        let back = MembershipCriteria::from_canonical(&Value::from_json(&json)).unwrap();
        prop_assert_eq!(back.to_canonical().to_json(), json);
    }

    #[test]
    fn nesting_one_level_deeper_is_rejected(inner in arb_criteria()) {
        let wrapped = json!({
            "operation": "AND",
            "children": [{"operation": "OR", "children": [inner.to_canonical().to_json()]}]
        });
        let is_leaf = matches!(inner, Criteria::Leaf(_));
        prop_assert_eq!(read(wrapped).is_ok(), is_leaf);
    }
}
