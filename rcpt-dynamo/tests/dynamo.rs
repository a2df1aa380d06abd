#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use std::sync::Arc;

use aws_sdk_dynamodb::{
    Client,
    operation::get_item::{GetItemError, GetItemInput, GetItemOutput},
    types::{AttributeValue, error::ProvisionedThroughputExceededException},
};
use aws_smithy_mocks::{mock, mock_client};
use pretty_assertions::assert_eq;
use rcpt_dynamo::{
    Decision, Deferral, GetItem, Item, KeyValueStore, PLUGIN, lookup::dynamo::DynamoStore,
};
use rcpt_dynamo_common::{Connection, ResultRecord, TransportError};
use support::{CapturedLogs, HASH_KEY, TABLE, gate, params};

fn request(key: &str) -> GetItem {
    GetItem {
        table_name: Arc::from(TABLE),
        key_name: Arc::from(HASH_KEY),
        key: key.to_string(),
        projection: Arc::from(HASH_KEY),
    }
}

/// A point read on the hash key, projecting the key itself through `#k`
fn is_point_read(input: &GetItemInput, key: &str) -> bool {
    input.table_name() == Some(TABLE)
        && input.key().and_then(|keys| keys.get(HASH_KEY))
            == Some(&AttributeValue::S(key.to_string()))
        && input.key().is_some_and(|keys| keys.len() == 1)
        && input.projection_expression() == Some("#k")
        && input
            .expression_attribute_names()
            .and_then(|names| names.get("#k"))
            .map(String::as_str)
            == Some(HASH_KEY)
}

#[tokio::test]
async fn found_item_returns_its_key() {
    let rule = mock!(Client::get_item)
        .match_requests(|input| is_point_read(input, "a@b.c"))
        .then_output(|| {
            GetItemOutput::builder()
                .item(HASH_KEY, AttributeValue::S("a@b.c".to_string()))
                .build()
        });
    let store = DynamoStore::new(&mock_client!(aws_sdk_dynamodb, [&rule]));

    let item = store.get(&request("a@b.c")).await.unwrap();

    assert_eq!(
        item,
        Some(Item {
            key: "a@b.c".to_string()
        })
    );
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn missing_item_is_none() {
    let rule = mock!(Client::get_item)
        .match_requests(|input| is_point_read(input, "nobody@b.c"))
        .then_output(|| GetItemOutput::builder().build());
    let store = DynamoStore::new(&mock_client!(aws_sdk_dynamodb, [&rule]));

    assert_eq!(store.get(&request("nobody@b.c")).await.unwrap(), None);
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn reserved_word_key_goes_through_the_placeholder() {
    let rule = mock!(Client::get_item)
        .match_requests(|input| {
            input.key().is_some_and(|keys| keys.contains_key("name"))
                && input.projection_expression() == Some("#k")
                && input
                    .expression_attribute_names()
                    .and_then(|names| names.get("#k"))
                    .is_some_and(|name| name == "name")
        })
        .then_output(|| GetItemOutput::builder().build());
    let store = DynamoStore::new(&mock_client!(aws_sdk_dynamodb, [&rule]));

    let request = GetItem {
        key_name: Arc::from("name"),
        projection: Arc::from("name"),
        ..request("a@b.c")
    };

    assert_eq!(store.get(&request).await.unwrap(), None);
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn throttled_read_is_attempted_once() {
    let rule = mock!(Client::get_item).then_error(|| {
        GetItemError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder()
                .message("slow down")
                .build(),
        )
    });
    let store = DynamoStore::new(&mock_client!(aws_sdk_dynamodb, [&rule]));

    let err = store.get(&request("a@b.c")).await.unwrap_err();

    assert_eq!(
        err,
        TransportError::new("ProvisionedThroughputExceededException: slow down")
    );
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn service_error_is_recorded_by_its_description() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let rule = mock!(Client::get_item).then_error(|| {
        GetItemError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder()
                .message("slow down")
                .build(),
        )
    });
    let store = DynamoStore::new(&mock_client!(aws_sdk_dynamodb, [&rule]));
    let gate = gate(Arc::new(store));

    let connection = Connection::new("test-session");
    connection.begin_transaction();

    let decision = gate
        .rcpt(&connection, &params("a@b.c"))
        .await
        .unwrap();

    let details = "ProvisionedThroughputExceededException: slow down";
    assert_eq!(
        decision,
        Decision::Defer(Deferral::LookupFailed(TransportError::new(details)))
    );
    assert_eq!(
        connection.transaction().unwrap().results.get(PLUGIN),
        vec![ResultRecord::Error(details.to_string())]
    );

    let error = logs.lines_at("ERROR");
    assert_eq!(error.len(), 1);
    assert!(error[0].contains(&format!(
        "Rejecting rcpt 'a@b.c', dynamo query error: '{details}'"
    )));
}
