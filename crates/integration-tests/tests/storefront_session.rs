//! End-to-end shopping sessions: browse, cart, wishlist and checkout.

#![allow(clippy::unwrap_used)]

use emerald_core::Price;
use emerald_integration_tests::{
    builtin_session, complete_shipping, pid, signed_in_session, small_catalog, valid_payment,
};
use emerald_storefront::checkout::CheckoutStep;
use emerald_storefront::error::CheckoutField;
use emerald_storefront::filter::{FilterSpec, SortKey};
use emerald_storefront::{Session, StorefrontError};

fn cart_of_fifty() -> Session {
    let mut session = Session::new(small_catalog().unwrap());
    session.add_to_cart(pid(1)).unwrap();
    session.add_to_cart(pid(1)).unwrap();
    session.add_to_cart(pid(2)).unwrap();
    session
}

#[test]
fn test_cart_totals_and_counts() {
    let mut session = cart_of_fifty();
    assert_eq!(session.cart().total(), Price::from_cents(5000));
    assert_eq!(session.cart().item_count(), 3);

    session.set_quantity(pid(1), 0).unwrap();
    assert!(!session.cart().contains(pid(1)));
    assert_eq!(session.cart().total(), Price::from_cents(3000));

    assert!(session.remove_from_cart(pid(2)));
    assert!(session.cart().is_empty());
    assert_eq!(session.cart().total(), Price::ZERO);
}

#[test]
fn test_rejected_operations_leave_cart_unchanged() {
    let mut session = cart_of_fifty();
    let before = session.cart().snapshot();

    assert!(matches!(
        session.add_to_cart(pid(99)),
        Err(StorefrontError::NotFound(_))
    ));
    assert!(matches!(
        session.set_quantity(pid(1), -3),
        Err(StorefrontError::InvalidQuantity(-3))
    ));
    // Absent lines are ignored.
    session.set_quantity(pid(3), 4).unwrap();

    assert_eq!(session.cart().snapshot(), before);
}

#[test]
fn test_wishlist_toggle_is_an_involution() {
    let mut session = builtin_session();
    assert!(session.toggle_wishlist(pid(5)));
    assert!(session.toggle_wishlist(pid(2)));
    assert!(!session.toggle_wishlist(pid(5)));
    assert!(session.toggle_wishlist(pid(5)));

    let names: Vec<&str> = session
        .wishlist_products()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names.len(), 2);
    assert_eq!(session.wishlist().ids(), vec![pid(2), pid(5)]);
}

#[test]
fn test_browse_search_is_case_insensitive() {
    let session = builtin_session();
    let spec = FilterSpec::default().with_query("WIRELESS");
    let found = session.browse(&spec, SortKey::PriceAscending);
    assert_eq!(found.len(), 4);
    assert!(found.windows(2).all(|w| match w {
        [a, b] => a.price <= b.price,
        _ => true,
    }));
}

#[test]
fn test_checkout_requires_items() {
    let mut session = Session::new(small_catalog().unwrap());
    assert!(matches!(
        session.begin_checkout(),
        Err(StorefrontError::InvalidState(_))
    ));
    assert!(session.checkout().is_none());
}

#[test]
fn test_missing_shipping_field_keeps_step() {
    let mut session = cart_of_fifty();
    session.begin_checkout().unwrap();

    let mut form = complete_shipping();
    form.city = "   ".to_string();
    let Err(StorefrontError::Validation(errors)) = session.submit_shipping(&form) else {
        panic!("expected a validation error");
    };
    assert_eq!(errors.missing_fields().collect::<Vec<_>>(), vec![CheckoutField::City]);
    assert_eq!(session.checkout().unwrap().step(), CheckoutStep::Shipping);
}

#[test]
fn test_order_summary_is_frozen_at_checkout() {
    let mut session = cart_of_fifty();
    session.begin_checkout().unwrap();
    session.add_to_cart(pid(3)).unwrap();

    assert_eq!(session.cart().total(), Price::from_cents(5550));
    assert_eq!(
        session.order_summary().unwrap().total(),
        Price::from_cents(5000)
    );
}

#[test]
fn test_sale_items_check_out_at_sale_price() {
    let mut session = Session::new(small_catalog().unwrap());
    // 30.00 at 30% off is 21.00
    session.add_sale_item(pid(2), 30).unwrap();
    session.add_to_cart(pid(1)).unwrap();
    session.begin_checkout().unwrap();
    session.submit_shipping(&complete_shipping()).unwrap();
    let placed = session.submit_payment(&valid_payment()).unwrap();
    assert_eq!(placed.order.total(), Price::from_cents(3100));

    assert!(matches!(
        session.begin_checkout(),
        Err(StorefrontError::InvalidState(_))
    ));
    assert_eq!(
        session.finish_checkout().unwrap().reference,
        placed.reference
    );
}

#[test]
fn test_full_checkout_as_signed_in_customer() {
    let mut session = signed_in_session(small_catalog().unwrap()).unwrap();
    session.add_to_cart(pid(2)).unwrap();
    session.add_to_cart(pid(3)).unwrap();

    let mut form = session.begin_checkout().unwrap();
    assert_eq!(form.first_name, "Grace");
    assert_eq!(form.email, "grace@example.com");
    let filled = complete_shipping();
    form.address = filled.address;
    form.city = filled.city;
    form.state = filled.state;
    form.zip_code = filled.zip_code;

    session.submit_shipping(&form).unwrap();
    assert_eq!(session.checkout().unwrap().step(), CheckoutStep::Payment);

    session.submit_payment(&valid_payment()).unwrap();
    let confirmation = session.finish_checkout().unwrap();

    assert_eq!(confirmation.order.total(), Price::from_cents(3550));
    assert_eq!(confirmation.shipping.full_name(), "Grace Hopper");
    assert_eq!(confirmation.payment.last_four, "4242");
    assert!(session.cart().is_empty());
    assert!(session.checkout().is_none());
}
