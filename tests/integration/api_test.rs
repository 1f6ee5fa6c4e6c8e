//! Integration tests for list fetching and product classification
use serde::Deserialize;
use serde_json::json;

use alacena::expiration::{self, ExpirationStatus};
use alacena::navigation::DETAILS_SCREEN;
use alacena::AlacenaError;

use crate::test_harness::{fresh_token, now, product_json, TestEnvironment};

#[tokio::test]
async fn test_products_are_classified_against_reference_time() {
    let mut env = TestEnvironment::new().await;
    let access = fresh_token("ana");
    env.sign_in(&access, "refresh-1").await;

    let products = env
        .mock_products(
            &access,
            json!([
                product_json("p-1", "Yogur", "dairy", "2025-08-23"),
                product_json("p-2", "Atún", "canned_food", "2025-08-24"),
                product_json("p-3", "Arroz", "grain", "2025-08-27"),
                product_json("p-4", "Pan", "snack", "no es fecha"),
            ]),
            1,
        )
        .await;

    let listed = env.api.products().await.unwrap();
    assert_eq!(listed.len(), 4);

    let statuses: Vec<_> = listed
        .iter()
        .filter_map(|p| p.status(now()).ok())
        .collect();
    assert_eq!(
        statuses,
        vec![
            ExpirationStatus::Critical,
            ExpirationStatus::Priority,
            ExpirationStatus::Stable
        ]
    );
    assert_eq!(listed[1].formatted_expiration().unwrap(), "24/08/2025");
    assert_eq!(listed[1].unit_label(), "latas");

    let tally = expiration::tally(&listed, now());
    assert_eq!(tally.total(), 3);
    assert_eq!(tally.as_bars(), [1, 1, 1]);

    products.assert_async().await;
}

#[derive(Debug, Deserialize, PartialEq)]
struct Shelf {
    id: u32,
    name: String,
}

#[tokio::test]
async fn test_fetch_list_of_arbitrary_route() {
    let mut env = TestEnvironment::new().await;
    let access = fresh_token("ana");
    env.sign_in(&access, "refresh-1").await;

    let shelves = env
        .server
        .mock("GET", "/api/shelves/")
        .match_header("authorization", format!("Bearer {access}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "results": [{ "id": 1, "name": "Despensa" }] }).to_string())
        .create_async()
        .await;

    let listed: Vec<Shelf> = env.api.fetch_list("/api/shelves/").await.unwrap();
    assert_eq!(
        listed,
        vec![Shelf {
            id: 1,
            name: "Despensa".to_string()
        }]
    );

    shelves.assert_async().await;
}

#[tokio::test]
async fn test_fetch_list_server_error_is_returned() {
    let mut env = TestEnvironment::new().await;
    env.sign_in(&fresh_token("ana"), "refresh-1").await;

    let products = env
        .server
        .mock("GET", "/api/products/")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "msg": "Error interno" }).to_string())
        .create_async()
        .await;

    let err = env.api.products().await.unwrap_err();
    assert_eq!(
        err,
        AlacenaError::Api {
            status: 500,
            message: "Error interno".to_string()
        }
    );
    // Service errors leave the session alone
    assert!(env.stored("access").await.is_some());
    assert!(env.navigator.calls().is_empty());

    products.assert_async().await;
}

#[tokio::test]
async fn test_containers_are_listed() {
    let mut env = TestEnvironment::new().await;
    let access = fresh_token("ana");
    env.sign_in(&access, "refresh-1").await;

    let containers = env
        .server
        .mock("GET", "/api/containers/")
        .match_header("authorization", format!("Bearer {access}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [{
                    "id": 7,
                    "name": "Refrigerador",
                    "is_active": true,
                    "last_opened": "2025-08-21T08:30:00Z",
                    "temperature": 4.5,
                    "labels": ["Estable", "Prioritario", "Crítico"],
                    "data": [[3, 1, 0], [2, 0, 1], [0, 1, 0]]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let listed = env.api.containers().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].totals(), [5, 2, 1]);

    containers.assert_async().await;
}

#[tokio::test]
async fn test_open_product_pushes_details() {
    let env = TestEnvironment::new().await;
    let product: alacena::Product =
        serde_json::from_value(product_json("p-9", "Mermelada", "jar", "2025-09-01")).unwrap();

    env.api.open_product(&product);

    let calls = env.navigator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, DETAILS_SCREEN);
    assert_eq!(calls[0].1.as_ref().unwrap()["item"]["name"], "Mermelada");
}
