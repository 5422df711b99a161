//! Tests for typed entity mapping.

use chrono::{DateTime, TimeZone, Utc};

use crate::entity::{
    from_bag, to_bag, EntityError, EntityReader, PropertyBag, PropertyValue, TableEntity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Tier {
    #[default]
    Free,
    Gold,
}

impl std::str::FromStr for Tier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(Tier::Free),
            "Gold" => Ok(Tier::Gold),
            _ => Err(()),
        }
    }
}

impl Tier {
    fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Gold => "Gold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Customer {
    region: String,
    id: String,
    name: String,
    age: i32,
    balance: f64,
    active: bool,
    joined: Option<DateTime<Utc>>,
    avatar: Vec<u8>,
    referrals: Option<i64>,
    tier: Tier,
    timestamp: Option<DateTime<Utc>>,
    etag: Option<String>,
}

impl TableEntity for Customer {
    fn partition_key(&self) -> &str {
        &self.region
    }

    fn row_key(&self) -> &str {
        &self.id
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    fn write_properties(&self, bag: &mut PropertyBag) {
        bag.insert("Name", &self.name);
        bag.insert("Age", self.age);
        bag.insert("Balance", self.balance);
        bag.insert("Active", self.active);
        bag.insert_opt("Joined", self.joined);
        bag.insert("Avatar", self.avatar.clone());
        bag.insert_opt("Referrals", self.referrals);
        bag.insert("Tier", self.tier.as_str());
    }

    fn read_properties(r: &EntityReader<'_>) -> Result<Self, EntityError> {
        Ok(Self {
            region: r.partition_key(),
            id: r.row_key(),
            name: r.get("Name")?,
            age: r.get("Age")?,
            balance: r.get("Balance")?,
            active: r.get("Active")?,
            joined: r.get_opt("Joined")?,
            avatar: r.get("Avatar")?,
            referrals: r.get_opt("Referrals")?,
            tier: r.parse_enum("Tier")?,
            timestamp: r.timestamp(),
            etag: r.etag(),
        })
    }
}

fn sample() -> Customer {
    Customer {
        region: "emea".into(),
        id: "c-001".into(),
        name: "Ada".into(),
        age: 36,
        balance: 1024.5,
        active: true,
        joined: Some(Utc.with_ymd_and_hms(2021, 6, 1, 9, 30, 0).unwrap()),
        avatar: vec![0xde, 0xad, 0xbe, 0xef],
        referrals: Some(12),
        tier: Tier::Gold,
        timestamp: None,
        etag: Some("W/\"1\"".into()),
    }
}

#[test]
fn record_roundtrips_through_bag() {
    let c = sample();
    let bag = to_bag(&c);
    assert_eq!(bag.partition_key(), "emea");
    assert_eq!(bag.row_key(), "c-001");
    assert_eq!(bag.etag(), Some("W/\"1\""));
    let back: Customer = from_bag(&bag).unwrap();
    assert_eq!(back, c);
}

#[test]
fn none_fields_are_not_written() {
    let c = Customer {
        joined: None,
        referrals: None,
        ..sample()
    };
    let bag = to_bag(&c);
    assert!(!bag.contains("Joined"));
    assert!(!bag.contains("Referrals"));
    let back: Customer = from_bag(&bag).unwrap();
    assert_eq!(back.referrals, None);
}

#[test]
fn absent_properties_leave_defaults() {
    let bag = PropertyBag::new("p", "r");
    let c: Customer = from_bag(&bag).unwrap();
    assert_eq!(c.region, "p");
    assert_eq!(c.age, 0);
    assert_eq!(c.tier, Tier::Free);
    assert!(c.joined.is_none());
}

#[test]
fn mismatched_types_are_converted() {
    let mut bag = PropertyBag::new("p", "r");
    bag.insert("Age", PropertyValue::Int64(40));
    bag.insert("Balance", "12.25");
    bag.insert("Active", "true");
    bag.insert("Referrals", PropertyValue::Int32(3));
    let c: Customer = from_bag(&bag).unwrap();
    assert_eq!(c.age, 40);
    assert_eq!(c.balance, 12.25);
    assert!(c.active);
    assert_eq!(c.referrals, Some(3));
}

#[test]
fn failed_conversion_names_the_field() {
    let mut bag = PropertyBag::new("p", "r");
    bag.insert("Age", PropertyValue::Int64(i64::from(i32::MAX) + 1));
    match from_bag::<Customer>(&bag) {
        Err(EntityError::Conversion {
            field,
            expected,
            found,
        }) => {
            assert_eq!(field, "Age");
            assert_eq!(expected, "Edm.Int32");
            assert_eq!(found, "Edm.Int64");
        }
        other => panic!("expected conversion error, got {other:?}"),
    }
}

#[test]
fn unknown_enum_value_is_an_error() {
    let mut bag = PropertyBag::new("p", "r");
    bag.insert("Tier", "Platinum");
    let err = from_bag::<Customer>(&bag).unwrap_err();
    assert!(matches!(err, EntityError::Conversion { ref field, .. } if field == "Tier"));
}

#[test]
fn metadata_flows_back_from_the_store() {
    let mut bag = to_bag(&sample());
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    bag.set_timestamp(Some(ts));
    bag.set_etag(Some("W/\"2\"".into()));
    let c: Customer = from_bag(&bag).unwrap();
    assert_eq!(c.timestamp, Some(ts));
    assert_eq!(c.etag.as_deref(), Some("W/\"2\""));
}
