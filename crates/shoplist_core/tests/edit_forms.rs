use shoplist_core::db::open_db_in_memory;
use shoplist_core::{
    FormError, FormPhase, ItemFields, ItemForm, ItemFormOptions, ItemService, LocationColor,
    LocationFields, LocationForm, LocationService, Projection, SqliteLocationRepository,
    SqliteShoppingItemRepository, UNKNOWN_LOCATION_VISITATION_ORDER,
};

#[test]
fn new_location_form_starts_with_defaults_and_requires_a_name() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());

    let mut form = LocationForm::new();
    assert!(!form.can_commit());
    assert!(form.load(None));
    assert_eq!(form.phase(), FormPhase::Editing);
    assert_eq!(form.draft(), &LocationFields::default());
    assert_eq!(form.draft().visitation_order, 50);
    assert!(form.shows_visitation_order());
    assert!(!form.can_delete());
    assert!(!form.can_commit());
    assert!(matches!(form.commit(&locations), Err(FormError::CannotCommit)));

    form.draft_mut().name = "Market".to_string();
    assert!(form.can_commit());
    let outcome = form.commit(&locations).unwrap();
    assert_eq!(outcome.record.name, "Market");
    assert_eq!(outcome.refresh, vec![Projection::Locations]);
    assert_eq!(form.phase(), FormPhase::Closing);
    assert!(matches!(
        form.commit(&locations),
        Err(FormError::SessionClosed)
    ));
}

#[test]
fn load_does_not_clobber_edits() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let market = locations
        .create_location(&LocationFields {
            name: "Market".to_string(),
            visitation_order: 10,
            color: LocationColor::default(),
        })
        .unwrap();

    let mut form = LocationForm::new();
    assert!(form.load(Some(&market)));
    form.draft_mut().name = "Farmers Market".to_string();
    assert!(!form.load(Some(&market)));
    assert_eq!(form.draft().name, "Farmers Market");
}

#[test]
fn cancelled_location_edit_leaves_store_untouched() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let market = locations
        .create_location(&LocationFields {
            name: "Market".to_string(),
            visitation_order: 10,
            color: LocationColor::default(),
        })
        .unwrap();

    let mut form = LocationForm::new();
    form.load(Some(&market));
    form.draft_mut().visitation_order = 99;
    form.cancel();

    let outcome = form.finish_dismiss(&locations).unwrap();
    assert!(!outcome.deleted);
    assert!(outcome.refresh.is_empty());
    assert_eq!(locations.get_location(market.uuid).unwrap(), Some(market));
}

#[test]
fn location_commit_with_items_refreshes_item_lists() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());
    let market = locations
        .create_location(&LocationFields {
            name: "Market".to_string(),
            visitation_order: 10,
            color: LocationColor::default(),
        })
        .unwrap();
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            location_uuid: Some(market.uuid),
            ..ItemFields::default()
        })
        .unwrap();

    let mut form = LocationForm::new();
    form.load(Some(&market));
    form.draft_mut().visitation_order = 30;
    let outcome = form.commit(&locations).unwrap();

    assert_eq!(
        outcome.refresh,
        vec![
            Projection::ShoppingList,
            Projection::Purchased,
            Projection::Locations
        ]
    );
    assert_eq!(items.get_item(milk.uuid).unwrap().unwrap().visitation_order, 30);
}

#[test]
fn unknown_location_form_hides_order_and_refuses_deletion() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let unknown = locations.unknown_location().unwrap();

    let mut form = LocationForm::new();
    form.load(Some(&unknown));
    assert!(!form.shows_visitation_order());
    assert!(!form.can_delete());
    assert!(matches!(
        form.request_delete(),
        Err(FormError::DeletionNotAllowed)
    ));

    form.draft_mut().name = "Elsewhere".to_string();
    form.draft_mut().visitation_order = 3;
    let outcome = form.commit(&locations).unwrap();
    assert_eq!(outcome.record.name, "Elsewhere");
    assert_eq!(
        outcome.record.visitation_order,
        UNKNOWN_LOCATION_VISITATION_ORDER
    );
}

#[test]
fn location_deletion_runs_only_after_dismiss() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());
    let market = locations
        .create_location(&LocationFields {
            name: "Market".to_string(),
            visitation_order: 10,
            color: LocationColor::default(),
        })
        .unwrap();
    items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            location_uuid: Some(market.uuid),
            ..ItemFields::default()
        })
        .unwrap();

    let mut form = LocationForm::new();
    form.load(Some(&market));
    assert!(form.can_delete());
    assert_eq!(form.request_delete().unwrap(), market.uuid);
    assert_eq!(form.phase(), FormPhase::Closing);
    assert!(locations.get_location(market.uuid).unwrap().is_some());

    let outcome = form.finish_dismiss(&locations).unwrap();
    assert!(outcome.deleted);
    assert_eq!(
        outcome.refresh,
        vec![
            Projection::ShoppingList,
            Projection::Purchased,
            Projection::Locations
        ]
    );
    assert_eq!(form.phase(), FormPhase::Closed);
    assert!(locations.get_location(market.uuid).unwrap().is_none());
}

#[test]
fn new_item_form_uses_partition_option_and_defaults_to_unknown_location() {
    let conn = open_db_in_memory().unwrap();
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());

    let mut form = ItemForm::new(ItemFormOptions {
        allows_deletion: true,
        add_to_shopping_list: false,
    });
    form.load(None);
    assert_eq!(form.draft().quantity, 1);
    assert!(!form.draft().on_list);
    assert_eq!(form.draft().location_uuid, None);

    form.draft_mut().name = "Coffee".to_string();
    let outcome = form.commit(&items).unwrap();
    assert_eq!(
        outcome.refresh,
        vec![Projection::Purchased, Projection::Locations]
    );
    assert_eq!(
        outcome.record.location_uuid,
        locations.unknown_location().unwrap().uuid
    );
    assert_eq!(items.list_purchased().unwrap(), vec![outcome.record]);
}

#[test]
fn item_edit_refreshes_old_and_new_partitions() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            ..ItemFields::default()
        })
        .unwrap();

    let mut form = ItemForm::new(ItemFormOptions::default());
    form.load(Some(&milk));
    assert_eq!(form.editing(), Some(milk.uuid));
    form.draft_mut().on_list = false;
    form.draft_mut().quantity = 4;
    let outcome = form.commit(&items).unwrap();

    assert_eq!(
        outcome.refresh,
        vec![Projection::ShoppingList, Projection::Purchased]
    );
    assert_eq!(outcome.record.quantity, 4);
    assert!(outcome.record.is_purchased());
}

#[test]
fn item_form_without_deletion_rejects_delete_requests() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            ..ItemFields::default()
        })
        .unwrap();

    let mut form = ItemForm::new(ItemFormOptions {
        allows_deletion: false,
        add_to_shopping_list: true,
    });
    form.load(Some(&milk));
    assert!(!form.can_delete());
    assert!(matches!(
        form.request_delete(),
        Err(FormError::DeletionNotAllowed)
    ));
    assert_eq!(form.phase(), FormPhase::Editing);
}

#[test]
fn item_deletion_is_deferred_until_dismiss() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteShoppingItemRepository::try_new(&conn).unwrap());
    let milk = items
        .create_item(&ItemFields {
            name: "Milk".to_string(),
            ..ItemFields::default()
        })
        .unwrap();

    let mut form = ItemForm::new(ItemFormOptions::default());
    form.load(Some(&milk));
    form.request_delete().unwrap();
    assert!(items.get_item(milk.uuid).unwrap().is_some());
    assert!(matches!(form.commit(&items), Err(FormError::SessionClosed)));

    let outcome = form.finish_dismiss(&items).unwrap();
    assert!(outcome.deleted);
    assert_eq!(
        outcome.refresh,
        vec![Projection::ShoppingList, Projection::Locations]
    );
    assert!(items.get_item(milk.uuid).unwrap().is_none());

    let again = form.finish_dismiss(&items).unwrap();
    assert!(!again.deleted);
}
