use shoplist_core::db::{open_db, open_db_in_memory};
use shoplist_core::transfer::{
    LocationRecord, ShoppingItemRecord, ITEMS_FILE_NAME, LOCATIONS_FILE_NAME,
};
use shoplist_core::{
    export_snapshot, import_snapshot, is_store_unseeded, read_snapshot_dir, write_snapshot_dir,
    ItemFields, ItemService, LocationColor, LocationFields, LocationService, Snapshot,
    SqliteLocationRepository, SqliteShoppingItemRepository, TransferError, UNKNOWN_LOCATION_NAME,
    UNKNOWN_LOCATION_VISITATION_ORDER,
};

fn location_record(name: &str, visitation_order: i32) -> LocationRecord {
    LocationRecord {
        name: name.to_string(),
        visitation_order,
        red: 0.25,
        green: 0.5,
        blue: 0.75,
        opacity: 1.0,
    }
}

fn item_record(name: &str, on_list: bool, location_name: &str) -> ShoppingItemRecord {
    ShoppingItemRecord {
        name: name.to_string(),
        quantity: 2,
        on_list,
        location_name: location_name.to_string(),
    }
}

#[test]
fn fresh_store_is_unseeded_even_with_unknown_location() {
    let conn = open_db_in_memory().unwrap();
    assert!(is_store_unseeded(&conn).unwrap());

    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    locations.unknown_location().unwrap();
    assert!(is_store_unseeded(&conn).unwrap());

    locations
        .create_location(&LocationFields {
            name: "Market".to_string(),
            ..LocationFields::default()
        })
        .unwrap();
    assert!(!is_store_unseeded(&conn).unwrap());
}

#[test]
fn import_creates_locations_and_resolves_items_by_name() {
    let conn = open_db_in_memory().unwrap();
    let snapshot = Snapshot {
        locations: vec![location_record("Market", 10), location_record("Bakery", 20)],
        items: vec![
            item_record("Milk", true, "market"),
            item_record("Rolls", false, "Bakery"),
            item_record("Stamps", true, "Post Office"),
        ],
    };

    let summary = import_snapshot(&conn, &snapshot).unwrap();
    assert_eq!(summary.locations_created, 2);
    assert_eq!(summary.items_created, 3);
    assert_eq!(summary.items_unresolved, 1);

    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let market = locations.find_location_by_name("Market").unwrap().unwrap();
    let at_market = items.list_items_at_location(market.uuid).unwrap();
    assert_eq!(at_market.len(), 1);
    assert_eq!(at_market[0].name, "Milk");
    assert_eq!(at_market[0].visitation_order, 10);

    let unknown = locations.unknown_location().unwrap();
    let stamps = items.list_items_at_location(unknown.uuid).unwrap();
    assert_eq!(stamps.len(), 1);
    assert_eq!(stamps[0].visitation_order, UNKNOWN_LOCATION_VISITATION_ORDER);
}

#[test]
fn import_skips_existing_names_and_updates_unknown_location() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let existing = locations
        .create_location(&LocationFields {
            name: "Market".to_string(),
            visitation_order: 5,
            color: LocationColor::default(),
        })
        .unwrap();

    let snapshot = Snapshot {
        locations: vec![
            location_record("MARKET", 40),
            location_record("Somewhere", UNKNOWN_LOCATION_VISITATION_ORDER),
        ],
        items: Vec::new(),
    };
    let summary = import_snapshot(&conn, &snapshot).unwrap();

    assert_eq!(summary.locations_created, 0);
    assert_eq!(summary.locations_skipped, 1);
    assert!(summary.unknown_location_updated);
    assert_eq!(
        locations.get_location(existing.uuid).unwrap().unwrap().visitation_order,
        5
    );

    let all = locations.list_locations().unwrap();
    assert_eq!(all.len(), 2);
    let unknown = locations.unknown_location().unwrap();
    assert_eq!(unknown.name, "Somewhere");
    assert_eq!(unknown.color, LocationColor::new(0.25, 0.5, 0.75, 1.0));
}

#[test]
fn invalid_record_rolls_back_the_whole_import() {
    let conn = open_db_in_memory().unwrap();
    let snapshot = Snapshot {
        locations: vec![location_record("Market", 10), location_record("Attic", 500)],
        items: Vec::new(),
    };

    let err = import_snapshot(&conn, &snapshot).unwrap_err();
    assert!(matches!(
        err,
        TransferError::InvalidRecord {
            kind: "location",
            ..
        }
    ));

    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    assert!(locations.find_location_by_name("Market").unwrap().is_none());
}

#[test]
fn dump_and_seed_roundtrip_through_directory() {
    let dir = tempfile::tempdir().unwrap();
    let source = open_db(dir.path().join("source.sqlite3")).unwrap();
    {
        let locations = LocationService::new(SqliteLocationRepository::try_new(&source).unwrap());
        let items = ItemService::new(SqliteShoppingItemRepository::try_new(&source).unwrap());
        let market = locations
            .create_location(&LocationFields {
                name: "Market".to_string(),
                visitation_order: 10,
                color: LocationColor::new(1.0, 0.0, 0.0, 1.0),
            })
            .unwrap();
        items
            .create_item(&ItemFields {
                name: "Milk".to_string(),
                quantity: 2,
                on_list: true,
                location_uuid: Some(market.uuid),
            })
            .unwrap();
        items
            .create_item(&ItemFields {
                name: "Batteries".to_string(),
                on_list: false,
                ..ItemFields::default()
            })
            .unwrap();
    }

    let dump_dir = dir.path().join("dump");
    let exported = export_snapshot(&source).unwrap();
    write_snapshot_dir(&dump_dir, &exported).unwrap();
    assert!(dump_dir.join(LOCATIONS_FILE_NAME).is_file());
    assert!(dump_dir.join(ITEMS_FILE_NAME).is_file());

    let raw = std::fs::read_to_string(dump_dir.join(ITEMS_FILE_NAME)).unwrap();
    let documents: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(documents[0]["name"], "Batteries");
    assert_eq!(documents[0]["locationName"], UNKNOWN_LOCATION_NAME);
    assert_eq!(documents[1]["onList"], true);

    let target = open_db_in_memory().unwrap();
    let seed = read_snapshot_dir(&dump_dir).unwrap();
    assert_eq!(seed, exported);
    import_snapshot(&target, &seed).unwrap();
    assert_eq!(export_snapshot(&target).unwrap(), exported);
}

#[test]
fn shared_location_names_merge_into_the_first_on_reimport() {
    let source = open_db_in_memory().unwrap();
    {
        let locations = LocationService::new(SqliteLocationRepository::try_new(&source).unwrap());
        let items = ItemService::new(SqliteShoppingItemRepository::try_new(&source).unwrap());
        for (name, visitation_order, item_name) in [("Market", 10, "Milk"), ("market", 20, "Eggs")]
        {
            let location = locations
                .create_location(&LocationFields {
                    name: name.to_string(),
                    visitation_order,
                    ..LocationFields::default()
                })
                .unwrap();
            items
                .create_item(&ItemFields {
                    name: item_name.to_string(),
                    location_uuid: Some(location.uuid),
                    ..ItemFields::default()
                })
                .unwrap();
        }
    }

    let exported = export_snapshot(&source).unwrap();
    let shared = exported
        .locations
        .iter()
        .filter(|record| record.name.eq_ignore_ascii_case("market"))
        .count();
    assert_eq!(shared, 2);

    let target = open_db_in_memory().unwrap();
    let summary = import_snapshot(&target, &exported).unwrap();
    assert_eq!(summary.locations_created, 1);
    assert_eq!(summary.locations_skipped, 1);
    assert_eq!(summary.items_created, 2);
    assert_eq!(summary.items_unresolved, 0);

    let locations = LocationService::new(SqliteLocationRepository::try_new(&target).unwrap());
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&target).unwrap());
    let market = locations.find_location_by_name("MARKET").unwrap().unwrap();
    assert_eq!(market.name, "Market");
    assert_eq!(market.visitation_order, 10);
    let merged: Vec<String> = items
        .list_items_at_location(market.uuid)
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(merged, vec!["Eggs".to_string(), "Milk".to_string()]);
}

#[test]
fn missing_documents_read_as_empty_and_malformed_ones_fail() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(read_snapshot_dir(dir.path()).unwrap(), Snapshot::default());

    std::fs::write(dir.path().join(LOCATIONS_FILE_NAME), "{ not json").unwrap();
    assert!(matches!(
        read_snapshot_dir(dir.path()),
        Err(TransferError::Json { .. })
    ));
}
