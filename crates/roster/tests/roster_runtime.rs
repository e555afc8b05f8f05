//! End-to-end behavior of the roster runtime on the shipped schema.

use chrono::NaiveDate;
use roster::{
    ContractSession, EndDateState, IntegrityError, Member, Record, RecordError, Roster,
    SelectedService, Value,
};
use roster_config::ConfigError;
use roster_ids::{MemberId, ServiceId};
use roster_schema::{SettingType, Term, TypedValue};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn roster() -> Roster {
    Roster::in_memory().unwrap()
}

fn insert_price(roster: &Roster, gross: f64) -> i64 {
    roster
        .records()
        .insert("price", Record::new().with("gross_amount", gross))
        .unwrap()
}

fn insert_service(roster: &Roster, price_id: i64, term: Term) -> i64 {
    roster
        .records()
        .insert(
            "service",
            Record::new()
                .with("name", format!("{} plan", term))
                .with("price_id", price_id)
                .with("term", term),
        )
        .unwrap()
}

fn insert_member(roster: &Roster, extra: Record) -> i64 {
    let mut record = Record::new().with("name", "Muster").with("first_name", "Max");
    for (field, value) in extra.iter() {
        record.set(field, value.clone());
    }
    roster.records().insert("member", record).unwrap()
}

#[test]
fn test_settings_are_seeded_once_from_schema() {
    let roster = roster();
    assert_eq!(roster.config().len(), 10);
    assert_eq!(
        roster
            .config()
            .resolve_indirect("vat_active_key", SettingType::Number)
            .unwrap(),
        TypedValue::Number(19.0)
    );
    assert!(matches!(
        roster.config().set("db_version", TypedValue::Number(2.0)),
        Err(ConfigError::ReadOnlySetting { .. })
    ));
}

#[test]
fn test_net_amount_follows_active_rate() {
    let roster = roster();
    let price = insert_price(&roster, 119.0);
    let today = date(2026, 1, 1);

    let net = roster.computed("price", price, today).unwrap()["net_amount"].clone();
    match net {
        Some(Value::Real(n)) => assert!((n * 1.19 - 119.0).abs() < 1e-9),
        other => panic!("unexpected {:?}", other),
    }

    roster
        .config()
        .set("vat_active_key", TypedValue::String("vat_reduced".into()))
        .unwrap();
    let net = roster.computed("price", price, today).unwrap()["net_amount"].clone();
    match net {
        Some(Value::Real(n)) => assert!((n * 1.07 - 119.0).abs() < 1e-9),
        other => panic!("unexpected {:?}", other),
    }

    // Never stored.
    assert!(roster.records().get("price", price).unwrap().get("net_amount").is_null());
}

#[test]
fn test_age_is_absent_without_birth_date() {
    let roster = roster();
    let without = insert_member(&roster, Record::new());
    let with = insert_member(&roster, Record::new().with("birth_date", date(1990, 5, 1)));
    let today = date(2026, 10, 19);

    assert_eq!(roster.computed("member", without, today).unwrap()["age"], None);
    assert_eq!(
        roster.computed("member", with, today).unwrap()["age"],
        Some(Value::Integer(36))
    );
}

#[test]
fn test_deleting_note_clears_exactly_its_references() {
    let roster = roster();
    let records = roster.records();
    let note = records.insert("note", Record::new().with("title", "Shared")).unwrap();
    let other = records.insert("note", Record::new().with("title", "Other")).unwrap();

    let price = records
        .insert("price", Record::new().with("gross_amount", 10.0).with("note_id", note))
        .unwrap();
    let service = insert_service(&roster, price, Term::Monthly);
    records.update_field("service", service, "note_id", note).unwrap();
    let m1 = insert_member(&roster, Record::new().with("note_id", note));
    let m2 = insert_member(&roster, Record::new().with("note_id", other));

    let plan = records.delete("note", note).unwrap();
    assert_eq!(plan.cleared_count(), 3);

    assert!(records.get("price", price).unwrap().get("note_id").is_null());
    assert!(records.get("service", service).unwrap().get("note_id").is_null());
    assert!(records.get("member", m1).unwrap().get("note_id").is_null());
    assert_eq!(records.get("member", m2).unwrap().get("note_id"), &Value::Integer(other));
    assert_eq!(records.count("note").unwrap(), 1);
}

#[test]
fn test_deleting_referenced_price_is_refused_without_changes() {
    let roster = roster();
    let records = roster.records();
    let note = records.insert("note", Record::new().with("title", "n")).unwrap();
    let price = records
        .insert("price", Record::new().with("gross_amount", 30.0).with("note_id", note))
        .unwrap();
    let service = insert_service(&roster, price, Term::Yearly);

    let before_price = records.get("price", price).unwrap();
    let before_service = records.get("service", service).unwrap();

    match records.delete("price", price) {
        Err(RecordError::Integrity(IntegrityError::Restricted { table, id, .. })) => {
            assert_eq!((table.as_str(), id), ("price", price));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(records.get("price", price).unwrap(), before_price);
    assert_eq!(records.get("service", service).unwrap(), before_service);

    // Once the service is gone the price can go too.
    records.delete("service", service).unwrap();
    records.delete("price", price).unwrap();
}

#[test]
fn test_deleting_service_clears_member_subscription() {
    let roster = roster();
    let price = insert_price(&roster, 49.0);
    let service = insert_service(&roster, price, Term::Quarterly);
    let member = insert_member(&roster, Record::new().with("service_id", service));

    roster.records().delete("service", service).unwrap();
    let member: Member = roster.records().load(member).unwrap();
    assert_eq!(member.service_id, None);
}

#[test]
fn test_contract_dialog_round_trip() {
    let roster = roster();
    let price = insert_price(&roster, 39.0);
    let monthly = ServiceId::new(insert_service(&roster, price, Term::Monthly)).unwrap();
    let yearly = ServiceId::new(insert_service(&roster, price, Term::Yearly)).unwrap();
    let member_id = MemberId::new(insert_member(&roster, Record::new())).unwrap();

    let mut session = ContractSession::new_contract(date(2026, 1, 15));
    session
        .select_service(Some(SelectedService {
            id: monthly,
            term: Term::Monthly,
        }))
        .unwrap();
    assert_eq!(session.end_date(), Some(date(2026, 2, 14)));
    roster.save_contract(member_id, &session.submit()).unwrap();

    // Reopen: state starts clean with the stored values.
    let mut session = roster.edit_contract(member_id).unwrap();
    assert_eq!(session.state(), EndDateState::Clean);
    assert_eq!(session.service().map(|s| s.term), Some(Term::Monthly));
    assert_eq!(session.end_date(), Some(date(2026, 2, 14)));

    session.set_end_date(Some(date(2026, 3, 31)));
    session.set_booking_date(Some(date(2026, 1, 2)));
    assert_eq!(session.end_date(), Some(date(2026, 3, 31)));

    session
        .select_service(Some(SelectedService {
            id: yearly,
            term: Term::Yearly,
        }))
        .unwrap();
    assert_eq!(session.end_date(), Some(date(2027, 1, 14)));
    assert_eq!(session.state(), EndDateState::Computed);

    roster.save_contract(member_id, &session.submit()).unwrap();
    let member: Member = roster.records().load(member_id.get()).unwrap();
    assert_eq!(member.service_id, Some(yearly));
    assert_eq!(member.contract_booking_date, Some(date(2026, 1, 2)));
    assert_eq!(member.contract_end_date, Some(date(2027, 1, 14)));
}

#[test]
fn test_discarded_session_leaves_row_untouched() {
    let roster = roster();
    let member_id = MemberId::new(insert_member(
        &roster,
        Record::new().with("contract_end_date", date(2026, 12, 31)),
    ))
    .unwrap();

    let mut session = roster.edit_contract(member_id).unwrap();
    session.set_end_date(None);
    session.discard();

    let member: Member = roster.records().load(member_id.get()).unwrap();
    assert_eq!(member.contract_end_date, Some(date(2026, 12, 31)));
}

#[test]
fn test_file_backed_settings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    {
        let roster = Roster::open(roster_schema::Schema::builtin().unwrap(), &path).unwrap();
        roster.config().set_text("vat_standard", "21").unwrap();
    }

    let roster = Roster::open(roster_schema::Schema::builtin().unwrap(), &path).unwrap();
    assert_eq!(roster.config().get("vat_standard").unwrap(), TypedValue::Number(21.0));
    assert_eq!(roster.config().len(), 10);
}
