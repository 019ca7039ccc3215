use rusqlite::Connection;
use shoplist_core::db::open_db_in_memory;
use shoplist_core::{
    ItemFields, ItemService, LocationColor, LocationFields, LocationService,
    SqliteLocationRepository, SqliteShoppingItemRepository,
};

fn services(
    conn: &Connection,
) -> (
    LocationService<SqliteLocationRepository<'_>>,
    ItemService<SqliteShoppingItemRepository<'_>>,
) {
    (
        LocationService::new(SqliteLocationRepository::try_new(conn).unwrap()),
        ItemService::new(SqliteShoppingItemRepository::try_new(conn).unwrap()),
    )
}

fn location(name: &str, visitation_order: i32) -> LocationFields {
    LocationFields {
        name: name.to_string(),
        visitation_order,
        color: LocationColor::new(0.3, 0.6, 0.9, 1.0),
    }
}

#[test]
fn market_milk_scenario() {
    let conn = open_db_in_memory().unwrap();
    let (locations, items) = services(&conn);

    let market = locations.create_location(&location("Market", 10)).unwrap();
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            quantity: 2,
            on_list: true,
            location_uuid: Some(market.uuid),
        })
        .unwrap();

    let on_list = items.list_on_list().unwrap();
    assert_eq!(on_list.len(), 1);
    assert_eq!(on_list[0].uuid, milk.uuid);
    assert_eq!(on_list[0].visitation_order, 10);

    let update = locations
        .update_location(market.uuid, &location("Market", 30))
        .unwrap();
    assert_eq!(update.items_resynced, 1);
    assert_eq!(items.get_item(milk.uuid).unwrap().unwrap().visitation_order, 30);

    items.set_on_list(milk.uuid, false).unwrap();
    let purchased = items.list_purchased().unwrap();
    assert_eq!(purchased.len(), 1);
    assert_eq!(purchased[0].uuid, milk.uuid);
    assert!(items.list_on_list().unwrap().is_empty());
}

#[test]
fn location_update_cascades_to_every_item_in_both_partitions() {
    let conn = open_db_in_memory().unwrap();
    let (locations, items) = services(&conn);

    let market = locations.create_location(&location("Market", 10)).unwrap();
    let bakery = locations.create_location(&location("Bakery", 20)).unwrap();
    for (name, on_list, at) in [
        ("Milk", true, market.uuid),
        ("Eggs", false, market.uuid),
        ("Butter", true, market.uuid),
        ("Rolls", true, bakery.uuid),
    ] {
        items
            .create_item(&ItemFields {
                name: name.to_string(),
                on_list,
                location_uuid: Some(at),
                ..ItemFields::default()
            })
            .unwrap();
    }

    let update = locations
        .update_location(market.uuid, &location("Market", 64))
        .unwrap();
    assert_eq!(update.items_resynced, 3);

    let at_market = items.list_items_at_location(market.uuid).unwrap();
    assert_eq!(at_market.len(), 3);
    assert!(at_market.iter().all(|item| item.visitation_order == 64));

    let at_bakery = items.list_items_at_location(bakery.uuid).unwrap();
    assert!(at_bakery.iter().all(|item| item.visitation_order == 20));
}

#[test]
fn moving_an_item_changes_set_membership_and_order() {
    let conn = open_db_in_memory().unwrap();
    let (locations, items) = services(&conn);

    let market = locations.create_location(&location("Market", 10)).unwrap();
    let bakery = locations.create_location(&location("Bakery", 20)).unwrap();
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            location_uuid: Some(market.uuid),
            ..ItemFields::default()
        })
        .unwrap();

    let mut fields = ItemFields::from(&milk);
    fields.location_uuid = Some(bakery.uuid);
    let moved = items.update_item(milk.uuid, &fields).unwrap();

    assert_eq!(moved.visitation_order, bakery.visitation_order);
    assert!(items
        .list_items_at_location(bakery.uuid)
        .unwrap()
        .iter()
        .any(|item| item.uuid == milk.uuid));
    assert!(items
        .list_items_at_location(market.uuid)
        .unwrap()
        .iter()
        .all(|item| item.uuid != milk.uuid));
}

#[test]
fn moved_item_follows_later_updates_of_its_new_location_only() {
    let conn = open_db_in_memory().unwrap();
    let (locations, items) = services(&conn);

    let market = locations.create_location(&location("Market", 10)).unwrap();
    let bakery = locations.create_location(&location("Bakery", 20)).unwrap();
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            location_uuid: Some(market.uuid),
            ..ItemFields::default()
        })
        .unwrap();
    let mut fields = ItemFields::from(&milk);
    fields.location_uuid = Some(bakery.uuid);
    items.update_item(milk.uuid, &fields).unwrap();

    let market_update = locations
        .update_location(market.uuid, &location("Market", 90))
        .unwrap();
    assert_eq!(market_update.items_resynced, 0);
    assert_eq!(items.get_item(milk.uuid).unwrap().unwrap().visitation_order, 20);

    locations
        .update_location(bakery.uuid, &location("Bakery", 2))
        .unwrap();
    assert_eq!(items.get_item(milk.uuid).unwrap().unwrap().visitation_order, 2);
}

#[test]
fn deleting_an_item_shrinks_its_location_set_by_one() {
    let conn = open_db_in_memory().unwrap();
    let (locations, items) = services(&conn);

    let market = locations.create_location(&location("Market", 10)).unwrap();
    let mut created = Vec::new();
    for (name, on_list) in [("Milk", true), ("Eggs", false), ("Bread", true)] {
        created.push(
            items
                .create_item(&ItemFields {
                    name: name.to_string(),
                    on_list,
                    location_uuid: Some(market.uuid),
                    ..ItemFields::default()
                })
                .unwrap(),
        );
    }

    let before = items.list_items_at_location(market.uuid).unwrap().len();
    let eggs = &created[1];
    items.delete_item(eggs.uuid).unwrap();

    assert_eq!(
        items.list_items_at_location(market.uuid).unwrap().len(),
        before - 1
    );
    assert!(items
        .list_on_list()
        .unwrap()
        .iter()
        .chain(items.list_purchased().unwrap().iter())
        .all(|item| item.uuid != eggs.uuid));
}
